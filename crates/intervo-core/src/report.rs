// Report builder
//
// Combines scoring output, narrative feedback from the text-generation
// collaborator, and conversation highlights into the final report.
// The report is assembled exactly once per session and never mutated
// afterward; the conversation history it carries is a frozen copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::eval::ExecutionReport;
use crate::scoring::{score, Recommendation, Scores};
use crate::session::{Session, Turn};
use crate::traits::{GenerationOptions, NarrativeGenerator};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Character budget for one conversation highlight
const HIGHLIGHT_BUDGET: usize = 150;
/// Character budget per turn in the narrative prompt
const PROMPT_TURN_BUDGET: usize = 100;
/// How many trailing turns the narrative prompt sees
const PROMPT_TAIL: usize = 6;

/// Interview duration in several client-friendly shapes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReportDuration {
    pub total_ms: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub formatted: String,
}

impl ReportDuration {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> ReportDuration {
        let total_ms = (end - start).num_milliseconds().max(0);
        let minutes = total_ms / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        ReportDuration {
            total_ms,
            minutes,
            seconds,
            formatted: format!("{}m {}s", minutes, seconds),
        }
    }
}

/// One quoted moment from the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ConversationHighlight {
    pub stage: String,
    pub response: String,
}

/// Final graded interview report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: String,
    pub candidate_name: String,
    pub role: String,
    pub date: DateTime<Utc>,
    pub duration: ReportDuration,
    pub overall_score: u32,
    pub technical_score: u32,
    pub coding_score: u32,
    pub communication_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_results: Option<ExecutionReport>,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub conversation_highlights: Vec<ConversationHighlight>,
    pub recommendation: Recommendation,
    /// Frozen copy of the conversation at report time
    pub conversation_history: Vec<Turn>,
}

/// Assemble the report for a finished session.
///
/// The narrative collaborator is asked for a feedback paragraph; on
/// failure or timeout a deterministic templated sentence substitutes,
/// so report building never blocks on the collaborator.
pub async fn build(
    generator: &dyn NarrativeGenerator,
    session: &Session,
    execution: Option<&ExecutionReport>,
) -> Report {
    let now = Utc::now();
    let duration = ReportDuration::between(session.start_time, session.end_time.unwrap_or(now));
    let scores = score(session, execution);
    let feedback = narrative_feedback(generator, session, &scores, &duration).await;

    Report {
        report_id: format!("REPORT-{}", now.timestamp_millis()),
        candidate_name: session.candidate_name.clone(),
        role: session.role.clone(),
        date: now,
        duration,
        overall_score: scores.overall,
        technical_score: scores.technical,
        coding_score: scores.coding,
        communication_score: scores.communication,
        code_results: execution.cloned(),
        feedback,
        strengths: scores.strengths,
        improvements: scores.improvements,
        conversation_highlights: highlights(session),
        recommendation: Recommendation::for_score(scores.overall),
        conversation_history: session.conversation_history.clone(),
    }
}

async fn narrative_feedback(
    generator: &dyn NarrativeGenerator,
    session: &Session,
    scores: &Scores,
    duration: &ReportDuration,
) -> String {
    let tail = session
        .conversation_history
        .iter()
        .rev()
        .take(PROMPT_TAIL)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|turn| {
            format!(
                "{}: {}",
                match turn.speaker {
                    crate::session::Speaker::Candidate => "Candidate",
                    crate::session::Speaker::Interviewer => "Interviewer",
                },
                truncate(&turn.text, PROMPT_TURN_BUDGET)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "You are an expert technical interviewer providing feedback for a {} interview.\n\n\
         Candidate: {}\n\
         Duration: {}\n\
         Overall Score: {}/100\n\n\
         Conversation Summary:\n{}\n\n\
         Provide a professional, encouraging 3-4 sentence summary of the candidate's performance.\n\
         Focus on: overall impression, one key strength, one area for growth, and encouragement.\n\
         Be specific, constructive, and professional.",
        session.role, session.candidate_name, duration.formatted, scores.overall, tail
    );

    let options = GenerationOptions {
        temperature: 0.7,
        max_tokens: 200,
    };
    match generator.generate(&prompt, &options).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) | Err(_) => {
            tracing::warn!(session_id = %session.id, "narrative feedback unavailable, using fallback");
            format!(
                "{} demonstrated solid technical understanding during the interview. With a score \
                 of {}/100, they showed good potential. Continue practicing and refining your \
                 skills to excel in future interviews.",
                session.candidate_name, scores.overall
            )
        }
    }
}

/// First, middle, and last candidate turns, each truncated
fn highlights(session: &Session) -> Vec<ConversationHighlight> {
    let responses: Vec<&Turn> = session.candidate_turns().collect();
    let mut highlights = Vec::new();

    if let Some(first) = responses.first() {
        highlights.push(ConversationHighlight {
            stage: "Introduction".to_string(),
            response: truncate(&first.text, HIGHLIGHT_BUDGET),
        });
    }
    if responses.len() > 1 {
        let middle = responses[responses.len() / 2];
        highlights.push(ConversationHighlight {
            stage: "Technical Discussion".to_string(),
            response: truncate(&middle.text, HIGHLIGHT_BUDGET),
        });
    }
    if responses.len() > 2 {
        let last = responses[responses.len() - 1];
        highlights.push(ConversationHighlight {
            stage: "Final Response".to_string(),
            response: truncate(&last.text, HIGHLIGHT_BUDGET),
        });
    }
    highlights
}

fn truncate(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(budget).collect();
        truncated.push_str("...");
        truncated
    }
}
