// Session domain types
//
// These types represent one candidate's interview: the stage state
// machine position, the append-only conversation log, and the most
// recent code submission. Used by both the API and the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::challenge::CodingChallenge;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Interview stage. Stages advance strictly forward; no stage is
/// revisited and `Wrapup` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Greeting,
    Introduction,
    Technical1,
    Technical2,
    Technical3,
    Coding,
    Explanation,
    Wrapup,
}

impl Stage {
    /// The next stage in the fixed order, or `None` at the terminal stage
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Greeting => Some(Stage::Introduction),
            Stage::Introduction => Some(Stage::Technical1),
            Stage::Technical1 => Some(Stage::Technical2),
            Stage::Technical2 => Some(Stage::Technical3),
            Stage::Technical3 => Some(Stage::Coding),
            Stage::Coding => Some(Stage::Explanation),
            Stage::Explanation => Some(Stage::Wrapup),
            Stage::Wrapup => None,
        }
    }

    /// A terminated session accepts no further candidate input
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Wrapup)
    }

    /// True at or past the coding stage
    pub fn reached_coding(&self) -> bool {
        *self >= Stage::Coding
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Greeting => "greeting",
            Stage::Introduction => "introduction",
            Stage::Technical1 => "technical_1",
            Stage::Technical2 => "technical_2",
            Stage::Technical3 => "technical_3",
            Stage::Coding => "coding",
            Stage::Explanation => "explanation",
            Stage::Wrapup => "wrapup",
        };
        write!(f, "{}", s)
    }
}

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Interviewer,
    Candidate,
}

/// Discriminator for the turn's origin channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Voice,
    Coding,
    System,
}

/// One utterance in the conversation log. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TurnKind>,
}

impl Turn {
    pub fn candidate(text: impl Into<String>, stage: Stage, kind: TurnKind) -> Self {
        Self {
            speaker: Speaker::Candidate,
            text: text.into(),
            timestamp: Utc::now(),
            stage: Some(stage),
            kind: Some(kind),
        }
    }

    pub fn interviewer(text: impl Into<String>, stage: Stage, kind: TurnKind) -> Self {
        Self {
            speaker: Speaker::Interviewer,
            text: text.into(),
            timestamp: Utc::now(),
            stage: Some(stage),
            kind: Some(kind),
        }
    }
}

/// Languages the sandbox collaborator accepts. Parsing validates a
/// submission's tag before any sandbox call is made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Typescript,
    Python,
    Java,
    Cpp,
    C,
    Go,
    Rust,
    Ruby,
    Php,
    Csharp,
}

impl Language {
    /// Parse a client-supplied language tag (case-insensitive).
    /// Unknown tags are rejected before reaching the sandbox.
    pub fn parse(tag: &str) -> crate::error::Result<Language> {
        match tag.to_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::Javascript),
            "typescript" | "ts" => Ok(Language::Typescript),
            "python" | "python3" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "cpp" | "c++" => Ok(Language::Cpp),
            "c" => Ok(Language::C),
            "go" => Ok(Language::Go),
            "rust" => Ok(Language::Rust),
            "ruby" => Ok(Language::Ruby),
            "php" => Ok(Language::Php),
            "csharp" | "c#" => Ok(Language::Csharp),
            _ => Err(crate::error::EngineError::UnsupportedLanguage(
                tag.to_string(),
            )),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Csharp => "csharp",
        };
        write!(f, "{}", s)
    }
}

/// The most recent code artifact submitted during the coding stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CodeSubmission {
    pub code: String,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Session - the mutable record of one interview.
///
/// Owned exclusively by the session store; mutated by at most one
/// in-flight `advance()` at a time (the transport serializes events
/// per session). `stage` is the single source of truth for progress;
/// it is never re-derived from conversation length.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Session {
    pub id: Uuid,
    pub role: String,
    pub candidate_name: String,
    pub stage: Stage,
    pub question_index: u32,
    pub max_questions: u32,
    pub conversation_history: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_data: Option<CodingChallenge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_submission: Option<CodeSubmission>,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Session {
    /// All candidate turns, in order
    pub fn candidate_turns(&self) -> impl Iterator<Item = &Turn> {
        self.conversation_history
            .iter()
            .filter(|t| t.speaker == Speaker::Candidate)
    }

    /// Average candidate answer length in characters, 0.0 with no answers
    pub fn avg_answer_length(&self) -> f64 {
        let lengths: Vec<usize> = self.candidate_turns().map(|t| t.text.len()).collect();
        if lengths.is_empty() {
            return 0.0;
        }
        lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
    }

    /// Whether any candidate answer signaled uncertainty
    pub fn candidate_uncertain(&self) -> bool {
        self.candidate_turns().any(|t| {
            let lower = t.text.to_lowercase();
            lower.contains("don't know") || lower.contains("not sure")
        })
    }
}
