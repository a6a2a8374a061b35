// Judge0 wire types

use serde::{Deserialize, Serialize};

/// Submission payload for POST /submissions
#[derive(Debug, Serialize)]
pub struct SubmissionRequest {
    /// Base64-encoded program source
    pub source_code: String,
    pub language_id: u32,
    /// Base64-encoded stdin
    pub stdin: String,
    pub cpu_time_limit: u32,
    pub memory_limit: u32,
}

/// Status object Judge0 attaches to every submission result
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionStatus {
    pub id: i32,
    pub description: String,
}

/// Result body for a waited submission
#[derive(Debug, Deserialize)]
pub struct SubmissionResponse {
    pub status: SubmissionStatus,
    /// Base64-encoded, possibly absent
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    /// Wall time in seconds, serialized as a decimal string
    pub time: Option<String>,
    /// Peak memory in kilobytes
    pub memory: Option<i64>,
}
