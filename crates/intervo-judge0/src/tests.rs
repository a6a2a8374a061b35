// Unit tests for the Judge0 client

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use intervo_core::traits::SandboxRunner;
use intervo_core::Language;

use crate::{language_id, Judge0Client};

fn client_for(server: &MockServer, api_key: Option<&str>) -> Judge0Client {
    Judge0Client::with_config(
        server.uri(),
        api_key.map(|k| k.to_string()),
        "judge0-ce.p.rapidapi.com",
    )
    .unwrap()
}

#[test]
fn language_id_table_matches_judge0() {
    assert_eq!(language_id(Language::Javascript), 63);
    assert_eq!(language_id(Language::Python), 71);
    assert_eq!(language_id(Language::Typescript), 74);
    assert_eq!(language_id(Language::Rust), 73);
    assert_eq!(language_id(Language::Csharp), 51);
}

#[tokio::test]
async fn run_submission_decodes_accepted_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submissions"))
        .and(query_param("base64_encoded", "true"))
        .and(query_param("wait", "true"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "status": {"id": 3, "description": "Accepted"},
            "stdout": BASE64.encode("[0, 1]\n"),
            "stderr": null,
            "compile_output": null,
            "time": "0.012",
            "memory": 3456
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let verdict = client
        .run_submission("print(solve())", Language::Python, "[2,7,11,15]\n9")
        .await
        .unwrap();

    assert!(verdict.is_accepted());
    assert_eq!(verdict.stdout, "[0, 1]\n");
    assert_eq!(verdict.stderr, "");
    assert_eq!(verdict.time_secs, Some(0.012));
    assert_eq!(verdict.memory_kb, Some(3456));
}

#[tokio::test]
async fn rapidapi_headers_sent_only_with_a_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submissions"))
        .and(header("X-RapidAPI-Key", "secret"))
        .and(header("X-RapidAPI-Host", "judge0-ce.p.rapidapi.com"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "status": {"id": 3, "description": "Accepted"},
            "stdout": null,
            "stderr": null,
            "compile_output": null,
            "time": null,
            "memory": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("secret"));
    let verdict = client
        .run_submission("code", Language::Javascript, "")
        .await
        .unwrap();
    assert_eq!(verdict.stdout, "");
    assert_eq!(verdict.time_secs, None);
}

#[tokio::test]
async fn base64_with_embedded_newlines_decodes() {
    // Judge0 wraps long base64 payloads at 76 columns
    let long_output = "x".repeat(200);
    let mut wrapped = BASE64.encode(&long_output);
    wrapped.insert(76, '\n');

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submissions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "status": {"id": 3, "description": "Accepted"},
            "stdout": wrapped,
            "stderr": null,
            "compile_output": null,
            "time": "0.5",
            "memory": 1000
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let verdict = client
        .run_submission("code", Language::Python, "")
        .await
        .unwrap();
    assert_eq!(verdict.stdout, long_output);
}

#[tokio::test]
async fn http_error_surfaces_as_sandbox_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submissions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = SandboxRunner::submit(&client, "code", Language::Python, "")
        .await
        .unwrap_err();
    assert!(matches!(err, intervo_core::EngineError::Sandbox(_)));
    assert!(err.to_string().contains("429"));
}

#[tokio::test]
async fn non_accepted_status_is_reported_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submissions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "status": {"id": 6, "description": "Compilation Error"},
            "stdout": null,
            "stderr": null,
            "compile_output": BASE64.encode("error: expected ';'"),
            "time": null,
            "memory": null
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let verdict = client
        .run_submission("broken code", Language::C, "")
        .await
        .unwrap();
    assert!(!verdict.is_accepted());
    assert_eq!(verdict.status_id, 6);
    assert!(verdict.compile_output.contains("expected ';'"));
}
