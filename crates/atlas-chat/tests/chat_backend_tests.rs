//! End-to-end chat session tests against a mock HTTP backend.

use std::time::Duration;

use atlas_api::{ApiClient, NO_REPLY_FALLBACK};
use atlas_chat::{ChatRole, ChatSession, Delivery, ERROR_REPLY};
use atlas_config::AtlasConfig;
use serde_json::json;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

async fn client_for(server: &MockServer) -> anyhow::Result<ApiClient> {
    let config = AtlasConfig {
        request_timeout_secs: 5,
        ..AtlasConfig::default()
    }
    .with_backend_url(server.uri());
    Ok(ApiClient::from_config(&config)?)
}

#[tokio::test]
async fn test_reply_appends_exactly_two_messages() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/nucleus/chat"))
        .and(matchers::body_json(json!({"message": "How is engine 2?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "X"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await?;
    let mut session = ChatSession::new();
    let before = session.len();

    session.send(&client, "How is engine 2?").await?;

    let added: Vec<_> = session.messages().skip(before).collect();
    assert_eq!(added.len(), 2);
    assert_eq!(added[0].role, ChatRole::User);
    assert_eq!(added[0].content, "How is engine 2?");
    assert_eq!(added[1].role, ChatRole::Assistant);
    assert_eq!(added[1].content, "X");
    assert!(added[0].timestamp <= added[1].timestamp);
    assert!(!session.is_pending());
    Ok(())
}

#[tokio::test]
async fn test_server_error_appends_fallback() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/nucleus/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let client = client_for(&server).await?;
    let mut session = ChatSession::new();
    let reply = session.send(&client, "hello").await?;
    assert_eq!(reply.content, ERROR_REPLY);

    assert!(!session.is_pending());
    assert_eq!(session.len(), 3);
    assert_eq!(session.entries()[1].delivery, Delivery::Failed);
    Ok(())
}

#[tokio::test]
async fn test_empty_response_uses_no_reply_text() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/nucleus/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": ""})))
        .mount(&server)
        .await;

    let client = client_for(&server).await?;
    let mut session = ChatSession::new();
    let reply = session.send(&client, "anything").await?;
    assert_eq!(reply.content, NO_REPLY_FALLBACK);
    assert_eq!(session.entries()[1].delivery, Delivery::Resolved);
    Ok(())
}

#[tokio::test]
async fn test_timeout_appends_fallback() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/nucleus/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "too late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri(), Duration::from_millis(200))?;
    let mut session = ChatSession::new();
    let reply = session.send(&client, "ping").await?;
    assert_eq!(reply.content, ERROR_REPLY);
    Ok(())
}
