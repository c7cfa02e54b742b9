use std::sync::Mutex;

use serde_json::json;

use super::*;
use crate::format::Formatter;
use crate::llm::CompletionRequest;
use crate::persona::Persona;
use crate::reveal::DEFAULT_REVEAL_INTERVAL;

struct MockBackend {
    responses: Mutex<Vec<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    fn new(responses: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self { responses: Mutex::new(responses), prompts: Mutex::new(Vec::new()) })
    }
}

#[async_trait::async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(request.messages[1].content.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() { Ok("done".into()) } else { responses.remove(0) }
    }
}

fn session() -> ChatSession {
    let persona = Persona::from_profile(json!({ "name": "Ada Example" }), None).unwrap();
    ChatSession::new(persona, Formatter::with_default_allowlist().unwrap())
}

async fn drive(session: &mut ChatSession, backend: Arc<MockBackend>, input: &str) -> String {
    let mut out = Vec::new();
    run(session, backend, DEFAULT_REVEAL_INTERVAL, input.as_bytes(), &mut out, std::future::pending())
        .await
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn command_parse() {
    assert_eq!(Command::parse("/quit"), Command::Quit);
    assert_eq!(Command::parse("  /exit "), Command::Quit);
    assert_eq!(Command::parse("/reset"), Command::Reset);
    assert_eq!(Command::parse("/help me"), Command::Say("/help me"));
}

#[tokio::test(start_paused = true)]
async fn reply_is_revealed_and_committed_before_input_ends() {
    let backend = MockBackend::new(vec![Ok("**Project A** is great. It uses React.".into())]);
    let mut s = session();

    let out = drive(&mut s, backend, "Tell me about your projects\n").await;

    assert!(out.starts_with("\u{1F916} Hi, I'm Ada Example."));
    assert!(out.contains("\u{1F916} \x1b[1mProject A\x1b[0m is great.\n\nIt uses React.\x1b[0m\n"));
    assert_eq!(s.messages().len(), 3);
    assert_eq!(s.messages()[2].response(), "<strong>Project A</strong> is great.<br><br>It uses React.");
    assert!(!s.is_typing());
}

#[tokio::test(start_paused = true)]
async fn transport_failure_prints_error_message() {
    let backend = MockBackend::new(vec![Err(LlmError::ApiResponse { status: 500, body: String::new() })]);
    let mut s = session();

    let out = drive(&mut s, backend, "hello\n").await;

    assert!(out.contains("\u{1F916} Error fetching chat response"));
    assert_eq!(s.messages().len(), 3);
    assert!(!s.is_typing());
}

#[tokio::test(start_paused = true)]
async fn lines_wait_while_a_reply_is_outstanding() {
    let backend = MockBackend::new(vec![Ok("One.".into()), Ok("Two.".into())]);
    let mut s = session();

    drive(&mut s, backend.clone(), "first\nsecond\n").await;

    assert_eq!(*backend.prompts.lock().unwrap(), vec!["first".to_owned(), "second".to_owned()]);
    let texts: Vec<&str> = s.messages().iter().skip(1).map(|m| if m.is_user() { m.prompt() } else { m.response() }).collect();
    assert_eq!(texts, vec!["first", "One.", "second", "Two."]);
}

#[tokio::test(start_paused = true)]
async fn blank_lines_are_not_sent() {
    let backend = MockBackend::new(vec![]);
    let mut s = session();

    drive(&mut s, backend.clone(), "\n   \n").await;

    assert!(backend.prompts.lock().unwrap().is_empty());
    assert_eq!(s.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn reset_command_reseeds_greeting() {
    let backend = MockBackend::new(vec![Ok("Sure.".into())]);
    let mut s = session();

    let out = drive(&mut s, backend, "hi\n/reset\n").await;

    assert_eq!(s.messages().len(), 1);
    assert_eq!(out.matches("Hi, I'm Ada Example.").count(), 2);
}

#[tokio::test(start_paused = true)]
async fn quit_stops_reading_input() {
    let backend = MockBackend::new(vec![]);
    let mut s = session();

    drive(&mut s, backend.clone(), "/quit\nnever sent\n").await;

    assert!(backend.prompts.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_drops_uncommitted_reply() {
    let backend = MockBackend::new(vec![Ok("a reply that takes a while to type".into())]);
    let mut s = session();
    let mut out = Vec::new();

    let shutdown = tokio::time::sleep(DEFAULT_REVEAL_INTERVAL * 5);
    run(&mut s, backend, DEFAULT_REVEAL_INTERVAL, "hi\n".as_bytes(), &mut out, shutdown)
        .await
        .unwrap();

    assert!(s.is_revealing());
    assert_eq!(s.messages().len(), 2);
}
