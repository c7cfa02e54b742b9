use std::sync::Mutex;

use serde_json::json;

use super::*;
use crate::llm::{CompletionBackend, CompletionRequest, request_reply};

// =========================================================================
// MockBackend
// =========================================================================

struct MockBackend {
    responses: Mutex<Vec<Result<String, LlmError>>>,
}

impl MockBackend {
    fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self { responses: Mutex::new(responses) }
    }
}

#[async_trait::async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() { Ok("done".into()) } else { responses.remove(0) }
    }
}

fn session() -> ChatSession {
    let persona = Persona::from_profile(json!({ "name": "Ada Example" }), None).unwrap();
    ChatSession::new(persona, Formatter::with_default_allowlist().unwrap())
}

async fn send(session: &mut ChatSession, backend: &MockBackend, input: &str) -> Received {
    let pending = session.submit(input).unwrap();
    let persona = session.persona();
    let outcome = request_reply(backend, &persona, &pending.text).await;
    session.receive(pending.turn, outcome)
}

fn run_reveal(session: &mut ChatSession) -> usize {
    let mut commits = 0;
    for _ in 0..10_000 {
        match session.tick() {
            Tick::Idle => break,
            Tick::Advanced(_) => {}
            Tick::Complete(_) => commits += 1,
        }
    }
    commits
}

// =========================================================================
// construction / submit
// =========================================================================

#[test]
fn new_session_is_seeded_with_escaped_greeting() {
    let s = session();
    assert_eq!(s.messages().len(), 1);
    assert!(!s.messages()[0].is_user());
    assert!(s.messages()[0].response().starts_with("Hi, I&#39;m Ada Example."));
    assert!(!s.is_typing());
}

#[test]
fn submit_appends_user_message_and_marks_typing() {
    let mut s = session();
    let pending = s.submit("Tell me about your projects").unwrap();
    assert_eq!(pending, PendingReply { turn: 1, text: "Tell me about your projects".into() });
    assert_eq!(s.messages().len(), 2);
    assert!(s.messages()[1].is_user());
    assert!(s.is_typing());
}

#[test]
fn blank_submit_is_rejected() {
    let mut s = session();
    assert_eq!(s.submit("   "), Err(SessionError::EmptyInput));
    assert_eq!(s.messages().len(), 1);
    assert!(!s.is_typing());
}

#[test]
fn second_submit_while_awaiting_is_rejected() {
    let mut s = session();
    s.submit("first").unwrap();
    assert_eq!(s.submit("second"), Err(SessionError::ReplyPending));
    assert_eq!(s.messages().len(), 2);
}

#[test]
fn submit_while_revealing_is_rejected() {
    let mut s = session();
    let pending = s.submit("first").unwrap();
    s.receive(pending.turn, Ok(Reply::Text("a long answer".into())));
    s.tick();
    assert_eq!(s.submit("second"), Err(SessionError::ReplyPending));
}

// =========================================================================
// scenarios
// =========================================================================

#[tokio::test]
async fn projects_scenario_reveals_then_commits_formatted_reply() {
    let mut s = session();
    let backend = MockBackend::new(vec![Ok("**Project A** is great. It uses React.".into())]);

    assert_eq!(send(&mut s, &backend, "Tell me about your projects").await, Received::Revealing);
    assert!(s.is_typing());
    assert_eq!(s.messages().len(), 2);

    let expected = "<strong>Project A</strong> is great.<br><br>It uses React.";
    let mut last_len = 0;
    let mut commits = 0;
    loop {
        match s.tick() {
            Tick::Advanced(_) => {
                let len = s.reveal_buffer().len();
                assert!(len > last_len && len <= expected.len());
                assert!(expected.starts_with(s.reveal_buffer()));
                last_len = len;
            }
            Tick::Complete(full) => {
                assert_eq!(full, expected);
                commits += 1;
            }
            Tick::Idle => break,
        }
    }

    assert_eq!(commits, 1);
    assert_eq!(s.messages().len(), 3);
    assert_eq!(s.messages()[2].response(), expected);
    assert!(!s.messages()[2].is_user());
    assert_eq!(s.reveal_buffer(), "");
    assert!(!s.is_typing());
}

#[tokio::test]
async fn http_500_commits_single_error_message() {
    let mut s = session();
    let backend = MockBackend::new(vec![Err(LlmError::ApiResponse { status: 500, body: "boom".into() })]);

    assert_eq!(send(&mut s, &backend, "hello").await, Received::Failed);
    assert_eq!(s.messages().len(), 3);
    assert_eq!(s.messages()[2].response(), TRANSPORT_ERROR_MESSAGE);
    assert!(!s.messages()[2].is_user());
    assert!(!s.is_typing());
    assert_eq!(s.tick(), Tick::Idle);
    assert_eq!(s.messages().len(), 3);
}

#[tokio::test]
async fn empty_completion_reveals_fallback() {
    let mut s = session();
    let backend = MockBackend::new(vec![Ok(String::new())]);

    send(&mut s, &backend, "What's the weather?").await;
    assert_eq!(run_reveal(&mut s), 1);
    assert_eq!(s.messages().last().unwrap().response(), "I can only answer questions related to Ada Example.");
}

#[tokio::test]
async fn session_accepts_next_prompt_after_commit() {
    let mut s = session();
    let backend = MockBackend::new(vec![Ok("One.".into()), Ok("Two.".into())]);

    send(&mut s, &backend, "first").await;
    run_reveal(&mut s);
    send(&mut s, &backend, "second").await;
    run_reveal(&mut s);

    let texts: Vec<&str> = s.messages().iter().skip(1).map(|m| if m.is_user() { m.prompt() } else { m.response() }).collect();
    assert_eq!(texts, vec!["first", "One.", "second", "Two."]);
}

#[test]
fn structured_reply_is_revealed_unformatted() {
    let mut s = session();
    let pending = s.submit("hi").unwrap();
    s.receive(pending.turn, Ok(Reply::Structured(json!([1, 2]))));
    run_reveal(&mut s);
    assert_eq!(s.messages().last().unwrap().response(), "[1,2]");
}

#[test]
fn reply_arriving_during_a_running_reveal_is_committed_whole() {
    let mut s = session();
    let pending = s.submit("hi").unwrap();
    s.reveal.start("earlier reply").unwrap();

    assert_eq!(s.receive(pending.turn, Ok(Reply::Text("**Late** one".into()))), Received::Committed);
    assert_eq!(s.messages().len(), 3);
    assert_eq!(s.messages()[2].response(), "<strong>Late</strong> one");
    assert!(!s.messages()[2].is_user());
    assert!(s.is_revealing());
}

// =========================================================================
// reset
// =========================================================================

#[test]
fn reset_yields_greeting_only() {
    let mut s = session();
    let pending = s.submit("hi").unwrap();
    s.receive(pending.turn, Ok(Reply::Text("answer".into())));
    run_reveal(&mut s);
    s.reset();
    assert_eq!(s.messages().len(), 1);
    assert!(!s.messages()[0].is_user());
    assert!(s.messages()[0].response().starts_with("Hi, I&#39;m Ada Example."));
}

#[test]
fn reset_mid_reveal_drops_pending_commit() {
    let mut s = session();
    let pending = s.submit("hi").unwrap();
    s.receive(pending.turn, Ok(Reply::Text("answer".into())));
    s.tick();
    s.reset();
    assert!(!s.is_typing());
    assert_eq!(s.reveal_buffer(), "");
    assert_eq!(s.tick(), Tick::Idle);
    assert_eq!(s.messages().len(), 1);
}

#[test]
fn reply_for_abandoned_turn_is_ignored() {
    let mut s = session();
    let pending = s.submit("hi").unwrap();
    s.reset();
    assert_eq!(s.receive(pending.turn, Ok(Reply::Text("late".into()))), Received::Stale);
    assert!(!s.is_revealing());
    assert_eq!(s.messages().len(), 1);

    let next = s.submit("again").unwrap();
    assert_eq!(next.turn, pending.turn + 1);
    assert_eq!(s.receive(pending.turn, Err(LlmError::ApiRequest("late".into()))), Received::Stale);
    assert!(s.is_typing());
}

#[test]
fn session_error_codes() {
    assert_eq!(SessionError::EmptyInput.error_code(), "E_EMPTY_INPUT");
    assert_eq!(SessionError::ReplyPending.error_code(), "E_REPLY_PENDING");
    assert!(SessionError::ReplyPending.retryable());
    assert!(!SessionError::EmptyInput.retryable());
}
