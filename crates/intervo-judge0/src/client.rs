// Judge0 client implementation
//
// Implements the SandboxRunner trait from intervo-core against the
// Judge0 CE API. One submission per test case, `wait=true` so the
// verdict comes back in a single blocking round trip bounded by the
// client timeout.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use std::time::Duration;

use intervo_core::traits::{SandboxRunner, SandboxVerdict};
use intervo_core::{EngineError, Language};

use crate::types::{SubmissionRequest, SubmissionResponse};

const DEFAULT_API_URL: &str = "https://judge0-ce.p.rapidapi.com";
const DEFAULT_API_HOST: &str = "judge0-ce.p.rapidapi.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CPU_TIME_LIMIT_SECS: u32 = 5;
const MEMORY_LIMIT_KB: u32 = 128_000;

/// Judge0 numeric identifier for a supported language.
/// The engine validates tags before this mapping is consulted, so
/// every `Language` variant has an entry.
pub fn language_id(language: Language) -> u32 {
    match language {
        Language::Javascript => 63, // Node.js
        Language::Typescript => 74,
        Language::Python => 71, // Python 3
        Language::Java => 62,
        Language::Cpp => 54, // C++ (GCC 9.2.0)
        Language::C => 50,   // C (GCC 9.2.0)
        Language::Go => 60,
        Language::Rust => 73,
        Language::Ruby => 72,
        Language::Php => 68,
        Language::Csharp => 51,
    }
}

/// Judge0 sandbox-execution client
#[derive(Debug, Clone)]
pub struct Judge0Client {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_host: String,
}

impl Judge0Client {
    /// Build from environment: JUDGE0_API_URL, JUDGE0_API_KEY,
    /// JUDGE0_API_HOST. Without a key the client targets a
    /// self-hosted instance and sends no RapidAPI headers.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("JUDGE0_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_key = std::env::var("JUDGE0_API_KEY").ok().filter(|k| !k.is_empty());
        let api_host =
            std::env::var("JUDGE0_API_HOST").unwrap_or_else(|_| DEFAULT_API_HOST.to_string());
        Self::with_config(base_url, api_key, api_host)
    }

    pub fn with_config(
        base_url: impl Into<String>,
        api_key: Option<String>,
        api_host: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build Judge0 HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
            api_host: api_host.into(),
        })
    }

    /// Run one program with stdin and wait for its verdict
    pub async fn run_submission(
        &self,
        code: &str,
        language: Language,
        stdin: &str,
    ) -> Result<SandboxVerdict> {
        let request = SubmissionRequest {
            source_code: BASE64.encode(code),
            language_id: language_id(language),
            stdin: BASE64.encode(stdin),
            cpu_time_limit: CPU_TIME_LIMIT_SECS,
            memory_limit: MEMORY_LIMIT_KB,
        };

        let url = format!("{}/submissions?base64_encoded=true&wait=true", self.base_url);
        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder
                .header("X-RapidAPI-Key", key)
                .header("X-RapidAPI-Host", &self.api_host);
        }

        let response = builder
            .send()
            .await
            .context("Failed to send Judge0 submission")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Judge0 submission failed with status {}: {}",
                status,
                error_text
            );
        }

        let body: SubmissionResponse = response
            .json()
            .await
            .context("Failed to parse Judge0 response")?;

        tracing::debug!(
            status_id = body.status.id,
            status = %body.status.description,
            "judge0 verdict received"
        );

        Ok(SandboxVerdict {
            status_id: body.status.id,
            status_description: body.status.description,
            stdout: decode_field(body.stdout.as_deref())?,
            stderr: decode_field(body.stderr.as_deref())?,
            compile_output: decode_field(body.compile_output.as_deref())?,
            time_secs: body.time.as_deref().and_then(|t| t.parse::<f64>().ok()),
            memory_kb: body.memory,
        })
    }
}

/// Decode an optional base64 field. Judge0 wraps long payloads with
/// newlines, which the strict decoder rejects, so whitespace is
/// stripped first.
fn decode_field(value: Option<&str>) -> Result<String> {
    let Some(encoded) = value else {
        return Ok(String::new());
    };
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .context("Judge0 field was not valid base64")?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[async_trait]
impl SandboxRunner for Judge0Client {
    async fn submit(
        &self,
        code: &str,
        language: Language,
        stdin: &str,
    ) -> intervo_core::Result<SandboxVerdict> {
        self.run_submission(code, language, stdin)
            .await
            .map_err(|e| EngineError::sandbox(e.to_string()))
    }
}
