//! Rendering surfaces for formatted chat markup.
//!
//! SYSTEM CONTEXT
//! ==============
//! The formatter emits a tiny markup vocabulary: `<strong>`, `<br>`, `<a>`
//! and five entities. The terminal surface maps that onto ANSI sequences;
//! the HTML surface drops it into the widget page as-is.
//!
//! `terminal_text` withholds an unfinished tag or entity at the end of its
//! input, so rendering a growing reveal buffer only ever appends output.

use std::fmt::Write;

use crate::conversation::Message;
use crate::format::escape_markup;
use crate::session::ChatSession;

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_UNDERLINE: &str = "\x1b[4m";
const ANSI_RESET: &str = "\x1b[0m";

const WIDGET_TITLE: &str = "I'm a robot Portfolio, get to know Me!";
const AVATAR: &str = "\u{1F916}";

// =============================================================================
// TERMINAL
// =============================================================================

/// Render formatter markup for an ANSI terminal.
#[must_use]
pub fn terminal_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(pos) = rest.find(['<', '&']) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        if rest.starts_with('<') {
            let Some(end) = rest.find('>') else {
                return out;
            };
            out.push_str(tag_to_ansi(&rest[1..end]));
            rest = &rest[end + 1..];
        } else {
            let Some(end) = rest.find(';') else {
                return out;
            };
            match decode_entity(&rest[1..end]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &rest[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &rest[1..];
                }
            }
        }
    }
    out.push_str(rest);
    out
}

fn tag_to_ansi(tag: &str) -> &'static str {
    let name = tag.split_whitespace().next().unwrap_or_default();
    match name {
        "strong" => ANSI_BOLD,
        "a" => ANSI_UNDERLINE,
        "/strong" | "/a" => ANSI_RESET,
        "br" | "br/" => "\n",
        _ => "",
    }
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "#39" => Some('\''),
        _ => None,
    }
}

// =============================================================================
// HTML WIDGET
// =============================================================================

/// Render the whole chat widget as a standalone HTML page.
///
/// User prompts are escaped; assistant responses are formatter output and
/// are inserted verbatim.
#[must_use]
pub fn widget_html(session: &ChatSession) -> String {
    let mut html = String::new();
    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_markup(session.persona().name()));
    html.push_str("</head>\n<body>\n<div class=\"chat\">\n");
    let _ = writeln!(
        html,
        "<div class=\"chat__header\"><span class=\"chat__avatar\">{AVATAR}</span>{}</div>",
        escape_markup(WIDGET_TITLE)
    );
    html.push_str("<div class=\"chat__messages\">\n");
    for message in session.messages() {
        push_bubble(&mut html, message);
    }
    if session.is_typing() {
        let _ = writeln!(
            html,
            "<div class=\"chat__row chat__row--assistant chat__row--typing\"><span class=\"chat__avatar\">{AVATAR}</span>\
             <div class=\"chat__bubble\">{}</div></div>",
            complete_prefix(session.reveal_buffer())
        );
    }
    html.push_str("</div>\n</div>\n</body>\n</html>\n");
    html
}

/// Cut an unfinished trailing tag or entity off a partially revealed reply.
fn complete_prefix(markup: &str) -> &str {
    let mut prefix = markup;
    if let Some(lt) = prefix.rfind('<') {
        if !prefix[lt..].contains('>') {
            prefix = &prefix[..lt];
        }
    }
    if let Some(amp) = prefix.rfind('&') {
        if !prefix[amp..].contains(';') {
            prefix = &prefix[..amp];
        }
    }
    prefix
}

fn push_bubble(html: &mut String, message: &Message) {
    if message.is_user() {
        let _ = writeln!(
            html,
            "<div class=\"chat__row chat__row--user\"><div class=\"chat__bubble\">{}</div></div>",
            escape_markup(message.prompt())
        );
    } else {
        let _ = writeln!(
            html,
            "<div class=\"chat__row chat__row--assistant\"><span class=\"chat__avatar\">{AVATAR}</span>\
             <div class=\"chat__bubble\">{}</div></div>",
            message.response()
        );
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
