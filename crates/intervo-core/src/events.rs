// Outbound event shapes
//
// These are the only two event shapes the engine produces for its
// transport layer. Field names are camelCase on the wire, matching
// what the client UI consumes.

use serde::{Deserialize, Serialize};

use crate::challenge::CodingChallenge;
use crate::eval::ExecutionReport;
use crate::report::Report;
use crate::session::Stage;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// The next interviewer message pushed to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct InterviewerEvent {
    pub message: String,
    pub stage: Stage,
    pub requires_coding: bool,
    /// Set exactly once, when the machine enters the coding stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_data: Option<CodingChallenge>,
    /// Present when a code submission was just evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionReport>,
    pub is_final: bool,
}

impl InterviewerEvent {
    /// A plain conversational event for the given stage
    pub fn message(text: impl Into<String>, stage: Stage) -> Self {
        Self {
            message: text.into(),
            stage,
            requires_coding: false,
            problem_data: None,
            execution: None,
            is_final: false,
        }
    }
}

/// The final graded report pushed to the client at session end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReportEvent {
    pub report: Report,
}

/// What one `advance()` call produced: always an interviewer event,
/// plus the final report when the session just terminated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AdvanceOutput {
    pub event: InterviewerEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
}

impl AdvanceOutput {
    pub fn event(event: InterviewerEvent) -> Self {
        Self {
            event,
            report: None,
        }
    }
}
