use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pdf_chatter::config::OllamaConfig;
use pdf_chatter::providers::{OllamaResponder, ResponseGenerator, RetrievedPage};

fn page(b64: &str) -> RetrievedPage {
    RetrievedPage {
        doc_id: 0,
        page_num: 1,
        score: 12.5,
        base64: Some(b64.to_string()),
        image_path: None,
    }
}

fn responder(server: &MockServer, max_images: usize) -> OllamaResponder {
    let cfg = OllamaConfig {
        host: server.uri(),
        model: "llava:test".to_string(),
    };
    OllamaResponder::new(cfg, max_images).expect("responder")
}

#[tokio::test]
async fn test_generate_response_sends_images_and_parses_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llava:test",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llava:test",
            "message": {"role": "assistant", "content": "The report covers Q1."},
            "done": true,
            "prompt_eval_count": 812,
            "eval_count": 14
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pages = vec![page("AAA="), page("BBB="), page("CCC=")];
    let response = responder(&server, 2)
        .generate_response(&pages, "What is the summary?", "S1")
        .await
        .expect("response");

    assert_eq!(response.text, "The report covers Q1.");
    assert_eq!(response.metadata.model.as_deref(), Some("llava:test"));
    assert_eq!(response.metadata.prompt_tokens, 812);
    assert_eq!(response.metadata.completion_tokens, 14);
    assert_eq!(response.metadata.pages_used, 2);

    let requests = server.received_requests().await.expect("recorded requests");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let message = &body["messages"][0];
    assert_eq!(message["role"], "user");
    assert_eq!(message["images"], json!(["AAA=", "BBB="]));
    assert!(message["content"]
        .as_str()
        .unwrap()
        .contains("What is the summary?"));
}

#[tokio::test]
async fn test_generate_response_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
        .mount(&server)
        .await;

    let err = responder(&server, 3)
        .generate_response(&[page("AAA=")], "hello", "S1")
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("500"), "{}", message);
    assert!(message.contains("model not found"), "{}", message);
}

#[tokio::test]
async fn test_generate_response_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = responder(&server, 3)
        .generate_response(&[], "hello", "S1")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to parse Ollama response"));
}
