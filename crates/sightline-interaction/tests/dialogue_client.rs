use std::time::Duration;

use serde_json::json;
use sightline_core::SessionId;
use sightline_core::dialogue::{BotConfig, RecognizeTextRequest};
use sightline_core::exchange::Exchange;
use sightline_interaction::HttpDialogueRuntime;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(text: &str) -> RecognizeTextRequest {
    let bot = BotConfig {
        bot_id: "WOMBAT".to_string(),
        bot_alias_id: "TSTALIASID".to_string(),
        locale_id: "en_US".to_string(),
    };
    RecognizeTextRequest::new(&bot, &SessionId::from("session-1700000000000-abc123xyz"), text)
}

#[tokio::test]
async fn test_fragments_returned_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recognize-text"))
        .and(body_partial_json(json!({
            "botId": "WOMBAT",
            "sessionId": "session-1700000000000-abc123xyz",
            "text": "Do you stock drills?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                { "content": "Yes!", "contentType": "PlainText" },
                { "content": "", "contentType": "PlainText" },
                { "content": "Aisle 4.", "contentType": "PlainText" }
            ],
            "sessionState": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let runtime = HttpDialogueRuntime::new(
        format!("{}/recognize-text", server.uri()),
        Duration::from_secs(5),
    );
    let response = runtime
        .exchange(request("Do you stock drills?"))
        .await
        .expect("should succeed");

    let contents: Vec<Option<&str>> = response
        .messages
        .iter()
        .map(|m| m.non_empty_content())
        .collect();
    assert_eq!(contents, vec![Some("Yes!"), None, Some("Aisle 4.")]);
}

#[tokio::test]
async fn test_service_error_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Invalid Bot Configuration: No alias found"
        })))
        .mount(&server)
        .await;

    let runtime = HttpDialogueRuntime::new(server.uri(), Duration::from_secs(5));
    let err = runtime.exchange(request("hello")).await.unwrap_err();

    assert_eq!(err.status_code(), Some(400));
    assert_eq!(err.to_string(), "Invalid Bot Configuration: No alias found");
}

#[tokio::test]
async fn test_slow_runtime_times_out_naming_dialogue_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "messages": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let runtime = HttpDialogueRuntime::new(server.uri(), Duration::from_secs(1));
    let err = runtime.exchange(request("hello")).await.unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert_eq!(
        err.to_string(),
        "Request timed out after 1 seconds. The dialogue service may be slow or unavailable."
    );
}

#[tokio::test]
async fn test_unreachable_runtime_is_connection_failure() {
    // Reserve a port, then close it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let runtime = HttpDialogueRuntime::new(
        format!("http://127.0.0.1:{port}/recognize-text"),
        Duration::from_secs(5),
    );
    let err = runtime.exchange(request("hello")).await.unwrap_err();

    assert!(err.is_connection(), "expected connection failure, got {err:?}");
    assert!(err.to_string().starts_with("Dialogue runtime request failed"));
}
