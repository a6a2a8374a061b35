// Unit tests for the Ollama client

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use intervo_core::traits::{GenerationOptions, NarrativeGenerator};

use crate::{clean_response, OllamaClient};

#[tokio::test]
async fn generate_sends_sampling_options_and_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama3.2:latest",
            "stream": false,
            "options": {"temperature": 0.7, "num_predict": 200}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "What interests you about backend work?"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::with_config(server.uri(), "llama3.2:latest").unwrap();
    let text = client
        .generate("Ask one opening question.", &GenerationOptions::default())
        .await
        .unwrap();
    assert_eq!(text, "What interests you about backend work?");
}

#[tokio::test]
async fn generate_scrubs_model_chatter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Here's a possible question: How does async I/O work? [smiles warmly]\nNote: adjust difficulty as needed."
        })))
        .mount(&server)
        .await;

    let client = OllamaClient::with_config(server.uri(), "m").unwrap();
    let text = client
        .generate("prompt", &GenerationOptions::default())
        .await
        .unwrap();
    assert_eq!(text, "How does async I/O work?");
}

#[tokio::test]
async fn http_error_surfaces_as_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let client = OllamaClient::with_config(server.uri(), "m").unwrap();
    let err = client
        .generate("prompt", &GenerationOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, intervo_core::EngineError::Generation(_)));
    assert!(err.to_string().contains("500"));
}

#[test]
fn clean_response_strips_preambles_brackets_and_notes() {
    assert_eq!(
        clean_response("Sure! Here is the question: Tell me about REST."),
        "Tell me about REST."
    );
    assert_eq!(
        clean_response("Certainly, here's one: Tell me about REST."),
        "Tell me about REST."
    );
    assert_eq!(clean_response("[pauses] What is a closure? [nods]"), "What is a closure?");
    assert_eq!(
        clean_response("What is a mutex?\nNote: this targets seniors.\nnote: second line."),
        "What is a mutex?"
    );
}

#[test]
fn clean_response_collapses_blank_runs_and_trims() {
    assert_eq!(clean_response("a\n\n\n\n\nb"), "a\n\nb");
    assert_eq!(clean_response("  padded  "), "padded");
    assert_eq!(clean_response(""), "");
}
