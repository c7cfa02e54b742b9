//! Terminal driver — one chat session over stdin/stdout.
//!
//! DESIGN
//! ======
//! A single task owns the session and multiplexes three event sources with
//! `tokio::select!`: the next input line, the in-flight completion request,
//! and the reveal ticker. Input is not read while a reply is outstanding,
//! mirroring a disabled send button; lines typed meanwhile wait in the
//! reader. The ticker exists only while a reply is revealing and is dropped
//! on commit, reset, and exit.
//!
//! End of input lets the current reply finish. `/quit` or the shutdown
//! signal end the session at once, dropping any uncommitted reply.

use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::Interval;
use tracing::info;

use crate::llm::{CompletionBackend, LlmError, Reply, request_reply};
use crate::render::terminal_text;
use crate::reveal::{Tick, reveal_ticker};
use crate::session::{ChatSession, Received, SessionError};

const ASSISTANT_PREFIX: &str = "\u{1F916} ";
const INPUT_PROMPT: &str = "> ";
const ANSI_RESET: &str = "\x1b[0m";

type PendingFuture = Pin<Box<dyn Future<Output = (u64, Result<Reply, LlmError>)> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Reset,
    Say(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "/quit" | "/exit" => Self::Quit,
            "/reset" => Self::Reset,
            _ => Self::Say(line),
        }
    }
}

/// Drive `session` until input ends, `/quit`, or `shutdown` resolves.
///
/// # Errors
///
/// Returns an I/O error if reading input or writing output fails.
pub async fn run<R, W, S>(
    session: &mut ChatSession,
    backend: Arc<dyn CompletionBackend>,
    reveal_interval: Duration,
    input: R,
    out: &mut W,
    shutdown: S,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    S: Future<Output = ()>,
{
    let mut lines = input.lines();
    let mut input_open = true;
    let mut pending: Option<PendingFuture> = None;
    let mut ticker: Option<Interval> = None;
    let mut shown = String::new();
    tokio::pin!(shutdown);

    print_transcript(out, session)?;
    write_prompt(out)?;

    loop {
        if !input_open && !session.is_typing() {
            break;
        }

        tokio::select! {
            () = &mut shutdown => {
                info!("terminal: shutdown requested");
                break;
            }

            line = lines.next_line(), if input_open && !session.is_typing() => {
                let Some(line) = line? else {
                    input_open = false;
                    continue;
                };
                match Command::parse(line.trim_end_matches('\r')) {
                    Command::Quit => break,
                    Command::Reset => {
                        pending = None;
                        ticker = None;
                        shown.clear();
                        session.reset();
                        print_transcript(out, session)?;
                        write_prompt(out)?;
                    }
                    Command::Say(text) => match session.submit(text) {
                        Ok(reply) => {
                            let persona = session.persona();
                            let backend = Arc::clone(&backend);
                            pending = Some(Box::pin(async move {
                                let outcome = request_reply(backend.as_ref(), &persona, &reply.text).await;
                                (reply.turn, outcome)
                            }));
                        }
                        Err(SessionError::EmptyInput) => write_prompt(out)?,
                        Err(e @ SessionError::ReplyPending) => {
                            writeln!(out, "({e})")?;
                            write_prompt(out)?;
                        }
                    },
                }
            }

            (turn, outcome) = next_outcome(&mut pending) => {
                pending = None;
                match session.receive(turn, outcome) {
                    Received::Revealing => {
                        ticker = Some(reveal_ticker(reveal_interval));
                        shown.clear();
                        write!(out, "{ASSISTANT_PREFIX}")?;
                        out.flush()?;
                    }
                    Received::Failed | Received::Committed => {
                        if let Some(message) = session.messages().last() {
                            print_assistant(out, message.response())?;
                        }
                        write_prompt(out)?;
                    }
                    Received::Stale => {}
                }
            }

            () = next_tick(&mut ticker) => {
                match session.tick() {
                    Tick::Advanced(_) => {
                        let rendered = terminal_text(session.reveal_buffer());
                        write_delta(out, &shown, &rendered)?;
                        shown = rendered;
                    }
                    Tick::Complete(full) => {
                        write_delta(out, &shown, &terminal_text(&full))?;
                        writeln!(out, "{ANSI_RESET}")?;
                        ticker = None;
                        shown.clear();
                        write_prompt(out)?;
                    }
                    Tick::Idle => ticker = None,
                }
            }
        }
    }

    writeln!(out)?;
    out.flush()
}

async fn next_outcome(pending: &mut Option<PendingFuture>) -> (u64, Result<Reply, LlmError>) {
    match pending {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn write_delta<W: Write>(out: &mut W, shown: &str, rendered: &str) -> std::io::Result<()> {
    match rendered.strip_prefix(shown) {
        Some(delta) => write!(out, "{delta}")?,
        None => write!(out, "\n{ASSISTANT_PREFIX}{rendered}")?,
    }
    out.flush()
}

fn print_transcript<W: Write>(out: &mut W, session: &ChatSession) -> std::io::Result<()> {
    for message in session.messages() {
        if message.is_user() {
            writeln!(out, "{INPUT_PROMPT}{}", message.prompt())?;
        } else {
            print_assistant(out, message.response())?;
        }
    }
    Ok(())
}

fn print_assistant<W: Write>(out: &mut W, markup: &str) -> std::io::Result<()> {
    writeln!(out, "{ASSISTANT_PREFIX}{}{ANSI_RESET}", terminal_text(markup))
}

fn write_prompt<W: Write>(out: &mut W) -> std::io::Result<()> {
    write!(out, "{INPUT_PROMPT}")?;
    out.flush()
}

#[cfg(test)]
#[path = "terminal_test.rs"]
mod tests;
