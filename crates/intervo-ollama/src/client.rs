// Ollama client implementation
//
// Implements the NarrativeGenerator trait from intervo-core against a
// local Ollama server. Generation is non-streaming; one prompt in, one
// completed response out. Model chatter (preambles, stage directions,
// trailing notes) is scrubbed before the text reaches the engine.

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

use intervo_core::traits::{GenerationOptions, NarrativeGenerator};
use intervo_core::EngineError;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2:latest";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Debug, Serialize)]
struct SamplingOptions {
    temperature: f64,
    num_predict: u32,
    top_p: f64,
    repeat_penalty: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama text-generation client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Build from environment: OLLAMA_URL and OLLAMA_MODEL.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::with_config(base_url, model)
    }

    pub fn with_config(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build Ollama HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate_raw(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: SamplingOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
                top_p: 0.9,
                repeat_penalty: 1.1,
            },
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send Ollama generation request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama request failed with status {}: {}", status, error_text);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        tracing::debug!(model = %self.model, chars = body.response.len(), "ollama response received");
        Ok(clean_response(&body.response))
    }
}

/// Strip model chatter so only the interviewer-voice text survives:
/// "Here's a question..." preambles, [bracketed stage directions],
/// and trailing "Note:" commentary.
pub fn clean_response(raw: &str) -> String {
    static PREAMBLE: OnceLock<Regex> = OnceLock::new();
    static BRACKETS: OnceLock<Regex> = OnceLock::new();
    static NOTES: OnceLock<Regex> = OnceLock::new();
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();

    let preamble = PREAMBLE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(here'?s|sure[,!]?|certainly[,!]?|of course[,!]?)[^\n]*?:\s*")
            .unwrap()
    });
    let brackets = BRACKETS.get_or_init(|| Regex::new(r"\[[^\]]*\]").unwrap());
    let notes = NOTES.get_or_init(|| Regex::new(r"(?im)^note:.*$").unwrap());
    let blank_runs = BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").unwrap());

    let text = preamble.replace(raw, "");
    let text = brackets.replace_all(&text, "");
    let text = notes.replace_all(&text, "");
    let text = blank_runs.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[async_trait]
impl NarrativeGenerator for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> intervo_core::Result<String> {
        self.generate_raw(prompt, options)
            .await
            .map_err(|e| EngineError::generation(e.to_string()))
    }
}
