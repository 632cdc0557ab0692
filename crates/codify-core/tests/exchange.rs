use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use codify_core::{
    ChatEntry, ChatRole, CompletionService, ExchangeController, ExchangeError, GeminiClient,
    RemoteCallError, Submission,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_PATH: &str = "/api/v1/ai/gemini";

async fn mock_reply(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Echoes the message back and counts calls.
struct EchoService {
    calls: AtomicUsize,
    fail_on: Option<usize>,
}

impl EchoService {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0), fail_on: None }
    }
}

#[async_trait]
impl CompletionService for EchoService {
    async fn complete(&self, message: &str) -> Result<String, RemoteCallError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(call) {
            return Err(RemoteCallError::MissingResponse);
        }
        Ok(format!("echo: {message}"))
    }
}

#[tokio::test]
async fn successful_exchange_appends_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "message": "Hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": { "response": "Hi there!", "message": "ok" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&server.uri());
    let mut controller = ExchangeController::new();

    let replied = controller.submit(&client, "Hello").await.unwrap();

    assert!(replied);
    assert_eq!(
        controller.conversation().entries(),
        &[ChatEntry::user("Hello"), ChatEntry::assistant("Hi there!")]
    );
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn server_error_leaves_only_user_entry() {
    let server = MockServer::start().await;
    mock_reply(&server, 500, json!({ "error": "boom" })).await;

    let client = GeminiClient::new(&server.uri());
    let mut controller = ExchangeController::new();

    let err = controller.submit(&client, "Hello").await.unwrap_err();

    assert!(matches!(
        err,
        ExchangeError::RemoteCall(RemoteCallError::Status(status)) if status.as_u16() == 500
    ));
    assert_eq!(err.notice(), "Something went wrong!");
    assert_eq!(controller.conversation().entries(), &[ChatEntry::user("Hello")]);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn malformed_body_is_a_remote_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&server.uri());
    let mut controller = ExchangeController::new();

    let err = controller.submit(&client, "Hello").await.unwrap_err();

    assert!(matches!(err, ExchangeError::RemoteCall(RemoteCallError::MalformedBody(_))));
    assert_eq!(controller.conversation().len(), 1);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn missing_response_field_is_a_remote_failure() {
    let server = MockServer::start().await;
    mock_reply(&server, 200, json!({ "product": { "message": "ok" } })).await;

    let client = GeminiClient::new(&server.uri());
    let mut controller = ExchangeController::new();

    let err = controller.submit(&client, "Hello").await.unwrap_err();

    assert!(matches!(err, ExchangeError::RemoteCall(RemoteCallError::MissingResponse)));
    assert_eq!(controller.conversation().len(), 1);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
    // Nothing listens on port 9 (discard) in the test environment
    let client = GeminiClient::new("http://127.0.0.1:9");
    let mut controller = ExchangeController::new();

    let err = controller.submit(&client, "Hello").await.unwrap_err();

    assert!(matches!(err, ExchangeError::RemoteCall(RemoteCallError::Transport(_))));
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn blank_input_never_reaches_the_network() {
    let server = MockServer::start().await;
    mock_reply(&server, 200, json!({ "product": { "response": "unused" } })).await;

    let client = GeminiClient::new(&server.uri());
    let mut controller = ExchangeController::new();

    for input in ["", "   "] {
        let err = controller.submit(&client, input).await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidInput));
    }

    assert!(controller.conversation().is_empty());
    assert!(!controller.is_busy());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn submission_while_pending_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "product": { "response": "late", "message": "ok" } }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let client = GeminiClient::new(&server.uri());
    let mut controller = ExchangeController::new();

    let Submission::Dispatched(pending) = controller.begin("A").unwrap() else {
        panic!("first submission should dispatch");
    };
    let message = pending.message().to_string();
    let call = tokio::spawn({
        let client = client.clone();
        async move { client.complete(&message).await }
    });

    assert!(matches!(controller.begin("B").unwrap(), Submission::Rejected));
    assert_eq!(controller.conversation().entries(), &[ChatEntry::user("A")]);

    let outcome = call.await.unwrap();
    controller.finish(pending, outcome).unwrap();

    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(
        controller.conversation().entries(),
        &[ChatEntry::user("A"), ChatEntry::assistant("late")]
    );
}

#[tokio::test]
async fn successful_submissions_alternate_roles() {
    let service = EchoService::new();
    let mut controller = ExchangeController::new();

    for text in ["one", "two", "three"] {
        assert!(controller.submit(&service, text).await.unwrap());
    }

    let roles: Vec<ChatRole> = controller.conversation().entries().iter().map(ChatEntry::role).collect();
    assert_eq!(
        roles,
        vec![
            ChatRole::User,
            ChatRole::Assistant,
            ChatRole::User,
            ChatRole::Assistant,
            ChatRole::User,
            ChatRole::Assistant,
        ]
    );
    assert_eq!(controller.conversation().entries()[3].text(), "echo: two");
}

#[tokio::test]
async fn conversation_never_shrinks() {
    let service = EchoService { calls: AtomicUsize::new(0), fail_on: Some(1) };
    let mut controller = ExchangeController::new();
    let mut last_len = 0;

    for text in ["first", "", "second", "   ", "third"] {
        let _ = controller.submit(&service, text).await;
        let len = controller.conversation().len();
        assert!(len >= last_len);
        last_len = len;
        assert!(!controller.is_busy());
    }

    // "second" failed, so it has no reply
    assert_eq!(last_len, 5);
    assert_eq!(service.calls.load(Ordering::SeqCst), 3);
}
