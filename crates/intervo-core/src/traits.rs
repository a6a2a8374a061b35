// Collaborator seams for the orchestration engine
//
// The engine never talks to Judge0 or a text-generation service
// directly; it goes through these traits so the client crates (and
// test stubs) are pluggable. Timeouts live inside the implementations;
// from the engine's perspective every call is synchronous and either
// succeeds or fails, and a failure triggers a deterministic fallback.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::Language;

/// Judge0 status id for "Accepted" (program ran to normal completion)
pub const SANDBOX_STATUS_ACCEPTED: i32 = 3;

/// Outcome of one sandbox execution
#[derive(Debug, Clone)]
pub struct SandboxVerdict {
    pub status_id: i32,
    pub status_description: String,
    pub stdout: String,
    pub stderr: String,
    pub compile_output: String,
    /// Wall time in seconds, when the sandbox reported one
    pub time_secs: Option<f64>,
    /// Peak memory in kilobytes, when the sandbox reported one
    pub memory_kb: Option<i64>,
}

impl SandboxVerdict {
    /// True when the program ran to normal completion
    pub fn is_accepted(&self) -> bool {
        self.status_id == SANDBOX_STATUS_ACCEPTED
    }
}

/// External service that executes untrusted code
#[async_trait]
pub trait SandboxRunner: Send + Sync {
    /// Submit one program with stdin and block for its verdict
    async fn submit(&self, code: &str, language: Language, stdin: &str)
        -> Result<SandboxVerdict>;
}

/// Sampling options for one generation call
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 200,
        }
    }
}

/// External text-generation service producing questions, transitions,
/// challenges, and narrative feedback. Fire-and-forget with a single
/// blocking response; no streaming.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;
}
