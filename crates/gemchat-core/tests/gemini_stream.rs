use gemchat_core::conversation::Role;
use gemchat_core::ingest::{SubmitOutcome, submit};
use gemchat_core::providers::gemini::{GeminiClient, GeminiConfig};
use gemchat_core::session::{ChatSession, STREAM_FAILURE_NOTICE};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create an SSE response from `data:` payloads.
fn sse_response(payloads: &[&str]) -> ResponseTemplate {
    let body: String = payloads.iter().map(|p| format!("data: {p}\n\n")).collect();
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

fn text_chunk(text: &str) -> String {
    format!(r#"{{"candidates":[{{"content":{{"role":"model","parts":[{{"text":"{text}"}}]}}}}]}}"#)
}

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new(GeminiConfig {
        api_key: "test-api-key".to_string(),
        base_url: server.uri(),
        model: "gemini-2.5-flash".to_string(),
        max_output_tokens: None,
    })
}

#[tokio::test]
async fn test_streamed_reply_lands_in_conversation() {
    let server = MockServer::start().await;
    let chunks = [text_chunk("Hel"), text_chunk("lo, "), text_chunk("world")];
    let chunk_refs: Vec<&str> = chunks.iter().map(String::as_str).collect();

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:streamGenerateContent"))
        .and(header("x-goog-api-key", "test-api-key"))
        .and(body_partial_json(serde_json::json!({
            "systemInstruction": { "parts": [{ "text": "Be brief." }] }
        })))
        .respond_with(sse_response(&chunk_refs))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = ChatSession::new(Some("Be brief.".to_string()));
    let mut snapshots = Vec::new();

    let outcome = submit(&mut session, &client, "hi", |s| {
        snapshots.push(s.conversation().last().map(|m| m.content.clone()));
    })
    .await;

    assert_eq!(outcome, SubmitOutcome::Succeeded);
    let last = session.conversation().last().unwrap();
    assert_eq!(last.role, Role::Model);
    assert_eq!(last.content, "Hello, world");
    assert_eq!(
        snapshots.last().cloned().flatten().as_deref(),
        Some("Hello, world")
    );
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_http_error_appends_failure_notice() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#,
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = ChatSession::new(None);

    let outcome = submit(&mut session, &client, "hi", |_| {}).await;

    assert_eq!(outcome, SubmitOutcome::Failed);
    let roles: Vec<Role> = session
        .conversation()
        .messages()
        .iter()
        .map(|m| m.role)
        .collect();
    assert_eq!(roles, vec![Role::User, Role::Error]);
    assert_eq!(
        session.conversation().last().unwrap().content,
        STREAM_FAILURE_NOTICE
    );
}

#[tokio::test]
async fn test_midstream_api_error_discards_partial_reply() {
    let server = MockServer::start().await;
    let first = text_chunk("Par");
    let error = r#"{"error":{"code":503,"message":"overloaded","status":"UNAVAILABLE"}}"#;

    Mock::given(method("POST"))
        .respond_with(sse_response(&[first.as_str(), error]))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = ChatSession::new(None);

    let outcome = submit(&mut session, &client, "hi", |_| {}).await;

    assert_eq!(outcome, SubmitOutcome::Failed);
    assert!(
        session
            .conversation()
            .messages()
            .iter()
            .all(|m| m.role != Role::Model)
    );
    assert_eq!(session.conversation().last().unwrap().role, Role::Error);
}

#[tokio::test]
async fn test_follow_up_sends_prior_exchange() {
    let server = MockServer::start().await;
    let reply = text_chunk("first answer");

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "one" }] },
                { "role": "model", "parts": [{ "text": "first answer" }] },
                { "role": "user", "parts": [{ "text": "two" }] }
            ]
        })))
        .respond_with(sse_response(&[text_chunk("second answer").as_str()]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(sse_response(&[reply.as_str()]))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = ChatSession::new(None);

    submit(&mut session, &client, "one", |_| {}).await;
    let outcome = submit(&mut session, &client, "two", |_| {}).await;

    assert_eq!(outcome, SubmitOutcome::Succeeded);
    assert_eq!(
        session.conversation().last().unwrap().content,
        "second answer"
    );
}
