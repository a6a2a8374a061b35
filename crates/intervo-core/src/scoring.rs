// Scoring engine
//
// Derives technical/coding/communication sub-scores and a weighted
// overall score from a session plus optional execution results. Pure
// over its inputs: scoring the same immutable session twice yields
// identical scores.

use serde::{Deserialize, Serialize};

use crate::eval::ExecutionReport;
use crate::session::Session;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

const TECHNICAL_BASE: f64 = 70.0;
const COMMUNICATION_BASE: f64 = 75.0;
const CODING_DEFAULT: u32 = 60;
const FAST_EXECUTION_CUTOFF_MS: f64 = 1000.0;

/// Sub-scores and rule-derived feedback lists, all clamped to [0,100]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    pub technical: u32,
    pub coding: u32,
    pub communication: u32,
    pub overall: u32,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

/// Hiring recommendation tier, a pure step function of the overall score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub decision: String,
    pub level: String,
    pub message: String,
}

impl Recommendation {
    pub fn for_score(overall: u32) -> Recommendation {
        if overall >= 85 {
            Recommendation {
                decision: "Strongly Recommend".to_string(),
                level: "excellent".to_string(),
                message: "Exceptional candidate with strong technical skills and communication abilities.".to_string(),
            }
        } else if overall >= 70 {
            Recommendation {
                decision: "Recommend".to_string(),
                level: "good".to_string(),
                message: "Solid candidate with good technical foundation and potential for growth.".to_string(),
            }
        } else if overall >= 55 {
            Recommendation {
                decision: "Consider".to_string(),
                level: "average".to_string(),
                message: "Shows potential but may need additional training or experience.".to_string(),
            }
        } else {
            Recommendation {
                decision: "Not Recommended".to_string(),
                level: "needs-improvement".to_string(),
                message: "Candidate would benefit from more preparation and practice.".to_string(),
            }
        }
    }
}

/// Score a session against its optional execution results
pub fn score(session: &Session, execution: Option<&ExecutionReport>) -> Scores {
    let technical = technical_score(session);
    let coding = coding_score(execution);
    let communication = communication_score(session);
    let overall =
        (0.4 * technical as f64 + 0.4 * coding as f64 + 0.2 * communication as f64).round() as u32;

    Scores {
        technical,
        coding,
        communication,
        overall,
        strengths: strengths(session, execution, technical, coding, communication),
        improvements: improvements(session, execution, technical, coding, communication),
    }
}

fn clamp(value: f64) -> u32 {
    value.round().clamp(0.0, 100.0) as u32
}

fn technical_score(session: &Session) -> u32 {
    if session.candidate_turns().next().is_none() {
        return 0;
    }

    let mut score = TECHNICAL_BASE;
    if session.question_index >= session.max_questions {
        score += 10.0;
    }
    if session.candidate_uncertain() {
        score -= 10.0;
    }
    // Two independent length bonuses, cumulative
    let avg = session.avg_answer_length();
    if avg > 50.0 {
        score += 10.0;
    }
    if avg > 100.0 {
        score += 10.0;
    }
    clamp(score)
}

fn coding_score(execution: Option<&ExecutionReport>) -> u32 {
    let Some(report) = execution else {
        return CODING_DEFAULT;
    };

    let pass_rate = if report.total_tests == 0 {
        0.0
    } else {
        report.passed as f64 / report.total_tests as f64 * 100.0
    };
    let mut score = pass_rate * 0.7;
    if report.all_passed {
        score += 20.0;
    }
    if matches!(report.avg_execution_time_ms, Some(t) if t < FAST_EXECUTION_CUTOFF_MS) {
        score += 10.0;
    }
    clamp(score)
}

fn communication_score(session: &Session) -> u32 {
    let turns = session.candidate_turns().count();
    if turns == 0 {
        return 0;
    }

    let mut score = COMMUNICATION_BASE;
    let avg = session.avg_answer_length();
    if avg > 30.0 && avg < 200.0 {
        score += 15.0;
    }
    if avg < 20.0 {
        score -= 10.0;
    }
    if avg > 300.0 {
        score -= 5.0;
    }
    if turns >= 3 {
        score += 10.0;
    }
    clamp(score)
}

fn strengths(
    session: &Session,
    execution: Option<&ExecutionReport>,
    technical: u32,
    coding: u32,
    communication: u32,
) -> Vec<String> {
    let mut list = Vec::new();
    if technical >= 80 {
        list.push("Strong technical knowledge and understanding of core concepts".to_string());
    }
    if coding >= 80 {
        list.push("Excellent problem-solving and coding skills".to_string());
    }
    if communication >= 80 {
        list.push("Clear and effective communication".to_string());
    }
    if matches!(execution, Some(r) if r.all_passed) {
        list.push("All test cases passed - demonstrates attention to detail".to_string());
    }
    if session.question_index >= session.max_questions {
        list.push("Completed all interview questions".to_string());
    }
    if session.avg_answer_length() > 100.0 {
        list.push("Provides detailed and thoughtful responses".to_string());
    }
    if list.is_empty() {
        list.push("Shows potential and willingness to learn".to_string());
    }
    list
}

fn improvements(
    session: &Session,
    execution: Option<&ExecutionReport>,
    technical: u32,
    coding: u32,
    communication: u32,
) -> Vec<String> {
    let mut list = Vec::new();
    if technical < 70 {
        list.push("Review fundamental concepts and technical knowledge".to_string());
    }
    if coding < 70 {
        list.push("Practice more coding problems and algorithm challenges".to_string());
    }
    if communication < 70 {
        list.push("Work on articulating thoughts more clearly and concisely".to_string());
    }
    if matches!(execution, Some(r) if !r.all_passed) {
        list.push("Focus on edge cases and thorough testing of solutions".to_string());
    }
    if session.candidate_uncertain() {
        list.push("Build confidence by practicing common interview questions".to_string());
    }
    if session.avg_answer_length() < 30.0 {
        list.push("Provide more detailed explanations and examples".to_string());
    }
    if list.is_empty() {
        list.push("Continue practicing to maintain strong performance".to_string());
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::TestCaseResult;
    use crate::session::{Stage, Turn, TurnKind};
    use chrono::Utc;
    use uuid::Uuid;

    fn session_with_answers(answers: &[&str]) -> Session {
        let mut session = Session {
            id: Uuid::now_v7(),
            role: "frontend".into(),
            candidate_name: "Ada".into(),
            stage: Stage::Explanation,
            question_index: 3,
            max_questions: 3,
            conversation_history: Vec::new(),
            problem_data: None,
            code_submission: None,
            start_time: Utc::now(),
            end_time: None,
        };
        for text in answers {
            session.conversation_history.push(Turn::candidate(
                *text,
                Stage::Technical1,
                TurnKind::Voice,
            ));
        }
        session
    }

    fn report(passed: u32, total: u32, avg_time_ms: Option<f64>) -> ExecutionReport {
        let results = (1..=total)
            .map(|n| TestCaseResult {
                test_number: n,
                input: String::new(),
                expected: String::new(),
                actual: String::new(),
                passed: n <= passed,
                execution_time_ms: avg_time_ms,
                memory_kb: None,
                status: "Accepted".into(),
                stderr: String::new(),
                compile_output: String::new(),
            })
            .collect::<Vec<_>>();
        ExecutionReport {
            total_tests: total,
            passed,
            failed: total - passed,
            all_passed: total > 0 && passed == total,
            avg_execution_time_ms: avg_time_ms,
            avg_memory_kb: None,
            results,
        }
    }

    #[test]
    fn communication_short_answers_over_four_turns() {
        // avg length 10 over 4 turns: 75 - 10 (short) + 10 (>=3 turns) = 75
        let session = session_with_answers(&["aaaaaaaaaa"; 4]);
        let scores = score(&session, None);
        assert_eq!(scores.communication, 75);
    }

    #[test]
    fn coding_all_passed_and_fast_caps_at_100() {
        // 0.7 * 100 + 20 + 10 = 100, clamped
        let session = session_with_answers(&["a decent answer with some length to it"]);
        let scores = score(&session, Some(&report(5, 5, Some(400.0))));
        assert_eq!(scores.coding, 100);
    }

    #[test]
    fn coding_without_execution_report_uses_neutral_default() {
        let session = session_with_answers(&["hello"]);
        let scores = score(&session, None);
        assert_eq!(scores.coding, 60);
    }

    #[test]
    fn coding_partial_pass_without_bonuses() {
        // 3/5 passed, slow: 0.7 * 60 = 42
        let scores = score(
            &session_with_answers(&["answer"]),
            Some(&report(3, 5, Some(2000.0))),
        );
        assert_eq!(scores.coding, 42);
    }

    #[test]
    fn technical_bonuses_accumulate() {
        // base 70 + all questions 10 + len>50 10 + len>100 10 = 100
        let long = "x".repeat(150);
        let session = session_with_answers(&[long.as_str(), long.as_str()]);
        let scores = score(&session, None);
        assert_eq!(scores.technical, 100);
    }

    #[test]
    fn technical_uncertainty_penalty() {
        let mut session = session_with_answers(&["I'm not sure, honestly"]);
        session.question_index = 1;
        let scores = score(&session, None);
        // base 70 - 10 uncertainty, avg length 22 (no bonus)
        assert_eq!(scores.technical, 60);
    }

    #[test]
    fn no_candidate_turns_scores_zero() {
        let session = session_with_answers(&[]);
        let scores = score(&session, None);
        assert_eq!(scores.technical, 0);
        assert_eq!(scores.communication, 0);
    }

    #[test]
    fn scoring_is_idempotent() {
        let session = session_with_answers(&["a fairly detailed answer about rendering", "short"]);
        let execution = report(2, 3, Some(120.0));
        let first = score(&session, Some(&execution));
        let second = score(&session, Some(&execution));
        assert_eq!(first, second);
    }

    #[test]
    fn recommendation_boundaries() {
        assert_eq!(Recommendation::for_score(85).decision, "Strongly Recommend");
        assert_eq!(Recommendation::for_score(84).decision, "Recommend");
        assert_eq!(Recommendation::for_score(70).decision, "Recommend");
        assert_eq!(Recommendation::for_score(69).decision, "Consider");
        assert_eq!(Recommendation::for_score(55).decision, "Consider");
        assert_eq!(Recommendation::for_score(54).decision, "Not Recommended");
    }

    #[test]
    fn strengths_fall_back_to_single_encouragement() {
        // One middling answer, no execution report: no strength rule fires
        let mut session = session_with_answers(&["an answer of modest len"]);
        session.question_index = 1;
        let scores = score(&session, None);
        assert_eq!(
            scores.strengths,
            vec!["Shows potential and willingness to learn".to_string()]
        );
    }

    #[test]
    fn improvements_fall_back_to_single_continuation() {
        // Everything scores well: no improvement rule fires
        let answer = "a".repeat(60);
        let session = session_with_answers(&[answer.as_str(), answer.as_str(), answer.as_str()]);
        let scores = score(&session, Some(&report(5, 5, Some(100.0))));
        assert_eq!(
            scores.improvements,
            vec!["Continue practicing to maintain strong performance".to_string()]
        );
    }
}
