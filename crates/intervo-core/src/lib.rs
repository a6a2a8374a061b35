// Interview Orchestration Engine
//
// This crate implements the per-session interview flow: a stage state
// machine, a code-evaluation pipeline over an external sandbox, a
// deterministic scoring engine, and a report builder.
//
// Key design decisions:
// - Uses traits (SandboxRunner, NarrativeGenerator) for pluggable collaborators
// - Session `stage` is the single source of truth; stages advance strictly forward
// - Collaborator failures substitute deterministic fallback content,
//   never a hard failure to the candidate
// - Sessions live in an in-memory store with a narrow create/get/update/delete contract
// - Only two outbound event shapes: InterviewerEvent and ReportEvent

// Domain entity types
pub mod challenge;
pub mod session;

pub mod error;
pub mod eval;
pub mod events;
pub mod report;
pub mod scoring;
pub mod stage;
pub mod store;
pub mod traits;

// Re-exports for convenience
pub use challenge::{
    fallback_challenge, ChallengeExample, CodingChallenge, RoleCategory, RoleProfile, TestCase,
};
pub use error::{EngineError, Result};
pub use eval::{evaluate, ExecutionReport, TestCaseResult};
pub use events::{AdvanceOutput, InterviewerEvent, ReportEvent};
pub use report::{build as build_report, ConversationHighlight, Report, ReportDuration};
pub use scoring::{score, Recommendation, Scores};
pub use session::{CodeSubmission, Language, Session, Speaker, Stage, Turn, TurnKind};
pub use stage::{CandidateInput, StageMachine};
pub use store::SessionStore;
pub use traits::{
    GenerationOptions, NarrativeGenerator, SandboxRunner, SandboxVerdict, SANDBOX_STATUS_ACCEPTED,
};
