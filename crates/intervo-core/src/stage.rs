// Interview stage machine
//
// Advances a session through the fixed stage order in response to
// candidate input or a code submission. `stage` on the session is the
// single source of truth; each transition is a function of (current
// stage, input) plus collaborator responses. Collaborator failures
// substitute deterministic fallback content so the machine always
// produces an event and never blocks indefinitely.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::challenge::{fallback_challenge, CodingChallenge, RoleCategory, RoleProfile};
use crate::error::{EngineError, Result};
use crate::eval::{evaluate, ExecutionReport};
use crate::events::{AdvanceOutput, InterviewerEvent};
use crate::report;
use crate::session::{CodeSubmission, Language, Session, Stage, Turn, TurnKind};
use crate::store::SessionStore;
use crate::traits::{GenerationOptions, NarrativeGenerator, SandboxRunner};

const WRAPUP_ACK: &str = "Thank you for your time! The interview is now complete.";
const NOT_READY_PROMPT: &str =
    "No worries, let me know when you're ready. Just say 'I'm ready' when you want to begin.";
const UNCLEAR_PROMPT: &str =
    "I didn't catch that. Are you ready to begin the interview? Please say yes or no.";
const EXPLANATION_PROMPT: &str = "Nice work! Your code has been submitted. \
     Could you explain your approach and its time complexity?";
const CODING_TRANSITION_FALLBACK: &str = "Great! Thanks for that answer. Now let's do a \
     coding task. I'm opening the coding environment for you.";
const CLOSING_FALLBACK: &str = "That concludes your interview. You demonstrated solid \
     technical understanding today. Thank you for your time!";

/// Candidate input accepted by `advance()`
#[derive(Debug, Clone)]
pub enum CandidateInput {
    /// Free text (voice or typed answer)
    Text(String),
    /// Structured code submission, only valid during the coding stage
    Code {
        code: String,
        language: String,
        explanation: Option<String>,
    },
}

enum Readiness {
    Affirmative,
    Negative,
    Unclear,
}

/// Per-session interview orchestrator over pluggable collaborators
pub struct StageMachine {
    store: Arc<SessionStore>,
    generator: Arc<dyn NarrativeGenerator>,
    sandbox: Arc<dyn SandboxRunner>,
}

impl StageMachine {
    pub fn new(
        store: Arc<SessionStore>,
        generator: Arc<dyn NarrativeGenerator>,
        sandbox: Arc<dyn SandboxRunner>,
    ) -> Self {
        Self {
            store,
            generator,
            sandbox,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Create a session and produce the opening greeting
    pub fn start(&self, role: &str, candidate_name: &str) -> (Session, InterviewerEvent) {
        let mut session = self.store.create(role, candidate_name);
        let profile = RoleProfile::for_category(RoleCategory::from_role(role));
        let greeting = format!(
            "Hello {}! I'm your AI interviewer. Welcome to your {} interview session. \
             We'll discuss your background, a few technical concepts, and do one coding \
             challenge. Are you ready to begin?",
            candidate_name, profile.name
        );
        session.conversation_history.push(Turn::interviewer(
            greeting.clone(),
            Stage::Greeting,
            TurnKind::Voice,
        ));
        // Session was just created, the write-back cannot miss
        let _ = self.store.update(session.clone());
        tracing::info!(session_id = %session.id, role, "interview started");
        (session, InterviewerEvent::message(greeting, Stage::Greeting))
    }

    /// Process one candidate event for the session.
    ///
    /// Fails only on session-not-found, an unsupported language tag,
    /// or an input kind the current stage does not accept; in those
    /// cases the session is left untouched.
    pub async fn advance(&self, session_id: Uuid, input: CandidateInput) -> Result<AdvanceOutput> {
        let session = self.store.get(session_id)?;
        tracing::debug!(session_id = %session.id, stage = %session.stage, "advancing session");

        match session.stage {
            Stage::Greeting => self.handle_greeting(session, input),
            Stage::Introduction | Stage::Technical1 | Stage::Technical2 => {
                self.handle_question(session, input).await
            }
            Stage::Technical3 => self.handle_coding_entry(session, input).await,
            Stage::Coding => self.handle_code_submission(session, input).await,
            Stage::Explanation => self.handle_explanation(session, input).await,
            // Terminal: fixed acknowledgment, no state change
            Stage::Wrapup => {
                let mut event = InterviewerEvent::message(WRAPUP_ACK, Stage::Wrapup);
                event.is_final = true;
                Ok(AdvanceOutput::event(event))
            }
        }
    }

    fn handle_greeting(
        &self,
        mut session: Session,
        input: CandidateInput,
    ) -> Result<AdvanceOutput> {
        let text = expect_text(input)?;
        session.conversation_history.push(Turn::candidate(
            text.clone(),
            Stage::Greeting,
            TurnKind::Voice,
        ));

        let event = match classify_readiness(&text) {
            Readiness::Affirmative => {
                session.stage = Stage::Introduction;
                let profile = RoleProfile::for_category(RoleCategory::from_role(&session.role));
                let question = format!(
                    "Great! Let's start with a quick introduction. Could you briefly introduce \
                     yourself and tell me about your experience with {} technologies?",
                    profile.skills.join(", ")
                );
                session.conversation_history.push(Turn::interviewer(
                    question.clone(),
                    Stage::Introduction,
                    TurnKind::Voice,
                ));
                InterviewerEvent::message(question, Stage::Introduction)
            }
            // The only stage with a retry loop
            Readiness::Negative => InterviewerEvent::message(NOT_READY_PROMPT, Stage::Greeting),
            Readiness::Unclear => InterviewerEvent::message(UNCLEAR_PROMPT, Stage::Greeting),
        };

        self.store.update(session)?;
        Ok(AdvanceOutput::event(event))
    }

    async fn handle_question(
        &self,
        mut session: Session,
        input: CandidateInput,
    ) -> Result<AdvanceOutput> {
        let text = expect_text(input)?;
        session.conversation_history.push(Turn::candidate(
            text.clone(),
            session.stage,
            TurnKind::Voice,
        ));

        // Unconditional advance; the emitted question belongs to the new stage
        let next_stage = session.stage.next().expect("non-terminal stage");
        session.stage = next_stage;
        session.question_index += 1;

        let question = self.next_question(&session, &text).await;
        session.conversation_history.push(Turn::interviewer(
            question.clone(),
            next_stage,
            TurnKind::Voice,
        ));
        self.store.update(session)?;
        Ok(AdvanceOutput::event(InterviewerEvent::message(
            question, next_stage,
        )))
    }

    async fn handle_coding_entry(
        &self,
        mut session: Session,
        input: CandidateInput,
    ) -> Result<AdvanceOutput> {
        let text = expect_text(input)?;
        session.conversation_history.push(Turn::candidate(
            text.clone(),
            Stage::Technical3,
            TurnKind::Voice,
        ));

        session.stage = Stage::Coding;
        let transition = self.coding_transition(&session, &text).await;
        let challenge = self.coding_challenge(&session).await;
        let message = format!("{}\n\n{}", transition, challenge.description);

        session.problem_data = Some(challenge.clone());
        session.conversation_history.push(Turn::interviewer(
            message.clone(),
            Stage::Coding,
            TurnKind::Coding,
        ));
        self.store.update(session)?;

        // The single point where requires_coding is signaled
        let mut event = InterviewerEvent::message(message, Stage::Coding);
        event.requires_coding = true;
        event.problem_data = Some(challenge);
        Ok(AdvanceOutput::event(event))
    }

    async fn handle_code_submission(
        &self,
        mut session: Session,
        input: CandidateInput,
    ) -> Result<AdvanceOutput> {
        let (code, language_tag, explanation) = match input {
            CandidateInput::Code {
                code,
                language,
                explanation,
            } => (code, language, explanation),
            CandidateInput::Text(_) => {
                return Err(EngineError::input(
                    "the coding stage expects a code submission, not free text",
                ))
            }
        };
        // Rejected before any sandbox call; stage unchanged
        let language = Language::parse(&language_tag)?;

        let test_cases = session
            .problem_data
            .as_ref()
            .map(|p| p.test_cases.clone())
            .unwrap_or_default();
        let execution: Option<ExecutionReport> = if test_cases.is_empty() {
            tracing::info!(session_id = %session.id, "no test cases, skipping evaluation");
            None
        } else {
            Some(evaluate(self.sandbox.as_ref(), &code, language, &test_cases).await)
        };

        session.code_submission = Some(CodeSubmission {
            code,
            language,
            explanation,
            submitted_at: Utc::now(),
        });
        session.stage = Stage::Explanation;
        session.conversation_history.push(Turn::interviewer(
            EXPLANATION_PROMPT,
            Stage::Explanation,
            TurnKind::Voice,
        ));
        self.store.update(session.clone())?;
        if let Some(report) = &execution {
            self.store.store_execution(session.id, report.clone());
        }

        let mut event = InterviewerEvent::message(EXPLANATION_PROMPT, Stage::Explanation);
        event.execution = execution;
        Ok(AdvanceOutput::event(event))
    }

    async fn handle_explanation(
        &self,
        mut session: Session,
        input: CandidateInput,
    ) -> Result<AdvanceOutput> {
        let text = expect_text(input)?;
        session.conversation_history.push(Turn::candidate(
            text,
            Stage::Explanation,
            TurnKind::Voice,
        ));
        session.stage = Stage::Wrapup;
        session.end_time = Some(Utc::now());

        let execution = self.store.execution(session.id);
        let report = report::build(self.generator.as_ref(), &session, execution.as_ref()).await;
        self.store.store_report(session.id, report.clone());

        let closing = self.closing_message(&session).await;
        session.conversation_history.push(Turn::interviewer(
            closing.clone(),
            Stage::Wrapup,
            TurnKind::Voice,
        ));
        self.store.update(session.clone())?;
        tracing::info!(
            session_id = %session.id,
            overall = report.overall_score,
            "interview complete"
        );

        let mut event = InterviewerEvent::message(closing, Stage::Wrapup);
        event.is_final = true;
        Ok(AdvanceOutput {
            event,
            report: Some(report),
        })
    }

    /// Next technical (or introductory follow-up) question, generated
    /// with a scripted per-role fallback
    async fn next_question(&self, session: &Session, last_answer: &str) -> String {
        let profile = RoleProfile::for_category(RoleCategory::from_role(&session.role));
        let depth = match session.question_index {
            1 => "an introductory follow-up about their background and experience level",
            2 => "a deep technical question about concepts, tools, or best practices for the role",
            _ => "an advanced technical question testing real expertise: scalability, debugging \
                  scenarios, or design trade-offs",
        };
        let context = session
            .conversation_history
            .iter()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .map(|t| format!("{:?}: {}", t.speaker, t.text))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "You are a professional technical interviewer conducting a {} interview with {}. \
             Seed: {:x}\n\nPrevious conversation:\n{}\n\nCandidate's latest response: \"{}\"\n\n\
             This is question {} of {}. Acknowledge their answer in one sentence, then ask {}. \
             Two to three sentences total. Speak directly as the interviewer with no \
             meta-commentary.",
            session.role,
            session.candidate_name,
            rand::random::<u32>(),
            context,
            last_answer,
            session.question_index,
            session.max_questions,
            depth,
        );
        let options = GenerationOptions {
            temperature: 0.85,
            max_tokens: 120,
        };
        match self.generator.generate(&prompt, &options).await {
            Ok(question) if !question.trim().is_empty() => question.trim().to_string(),
            Ok(_) | Err(_) => {
                tracing::warn!(session_id = %session.id, "question generation unavailable, using scripted question");
                profile.scripted_question(session.question_index).to_string()
            }
        }
    }

    async fn coding_transition(&self, session: &Session, last_answer: &str) -> String {
        let prompt = format!(
            "You are a professional technical interviewer conducting a {} interview with {}.\n\
             The candidate just answered: \"{}\"\n\nAcknowledge their answer in one sentence and \
             say you are moving to a coding task and opening the coding environment. Do not \
             describe the coding problem itself. Two to three sentences, spoken directly as the \
             interviewer.",
            session.role, session.candidate_name, last_answer
        );
        let options = GenerationOptions {
            temperature: 0.8,
            max_tokens: 80,
        };
        match self.generator.generate(&prompt, &options).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) | Err(_) => CODING_TRANSITION_FALLBACK.to_string(),
        }
    }

    /// Generate a coding challenge, falling back to the built-in
    /// challenge for the role category on any failure
    async fn coding_challenge(&self, session: &Session) -> CodingChallenge {
        let category = RoleCategory::from_role(&session.role);
        let prompt = format!(
            "You are a technical interviewer for a {} position. Generate a coding challenge \
             appropriate for this role as a single JSON object with keys: title, description, \
             difficulty, examples (input/output/explanation), constraints, and testCases \
             (input/expected). No text outside the JSON. Make it practical and \
             interview-appropriate. Random seed: {:x}",
            session.role,
            rand::random::<u32>(),
        );
        let options = GenerationOptions {
            temperature: 0.85,
            max_tokens: 300,
        };
        let generated = match self.generator.generate(&prompt, &options).await {
            Ok(text) => CodingChallenge::from_generated(&text),
            Err(e) => Err(e),
        };
        match generated {
            // A generated challenge without test cases cannot drive the
            // evaluation pipeline; treat it like a parse failure
            Ok(challenge) if !challenge.test_cases.is_empty() => challenge,
            Ok(_) | Err(_) => {
                tracing::warn!(session_id = %session.id, "challenge generation unavailable, using built-in challenge");
                fallback_challenge(category)
            }
        }
    }

    async fn closing_message(&self, session: &Session) -> String {
        let prompt = format!(
            "You are an AI interviewer concluding a {} interview with {}. Provide a brief, \
             professional wrap-up of two to three sentences: thank the candidate, mention one \
             strength you observed, and be encouraging.",
            session.role, session.candidate_name
        );
        let options = GenerationOptions {
            temperature: 0.7,
            max_tokens: 150,
        };
        match self.generator.generate(&prompt, &options).await {
            Ok(text) if !text.trim().is_empty() => {
                format!("That concludes your interview. {}", text.trim())
            }
            Ok(_) | Err(_) => CLOSING_FALLBACK.to_string(),
        }
    }
}

fn expect_text(input: CandidateInput) -> Result<String> {
    match input {
        CandidateInput::Text(text) => Ok(text),
        CandidateInput::Code { .. } => Err(EngineError::input(
            "this stage expects a spoken or typed answer, not a code submission",
        )),
    }
}

/// Case-insensitive substring classification of the greeting answer.
/// "not ready" must be checked before the affirmative markers since it
/// contains "ready".
fn classify_readiness(text: &str) -> Readiness {
    let lower = text.to_lowercase();
    if lower.contains("not ready") {
        return Readiness::Negative;
    }
    if lower.contains("yes") || lower.contains("ready") || lower.contains("sure") {
        return Readiness::Affirmative;
    }
    if lower.split_whitespace().any(|w| w == "no") {
        return Readiness::Negative;
    }
    Readiness::Unclear
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{SandboxVerdict, SANDBOX_STATUS_ACCEPTED};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Generator that always fails, forcing every deterministic fallback
    struct DownGenerator;

    #[async_trait]
    impl NarrativeGenerator for DownGenerator {
        async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            Err(EngineError::generation("unreachable"))
        }
    }

    /// Sandbox that echoes the expected output of the frontend fallback
    /// challenge and counts submissions
    struct CountingSandbox {
        calls: AtomicU32,
    }

    impl CountingSandbox {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl SandboxRunner for CountingSandbox {
        async fn submit(
            &self,
            _code: &str,
            _language: Language,
            _stdin: &str,
        ) -> Result<SandboxVerdict> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SandboxVerdict {
                status_id: SANDBOX_STATUS_ACCEPTED,
                status_description: "Accepted".to_string(),
                stdout: "[]".to_string(),
                stderr: String::new(),
                compile_output: String::new(),
                time_secs: Some(0.05),
                memory_kb: Some(2048),
            })
        }
    }

    fn machine() -> (StageMachine, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::new());
        let machine = StageMachine::new(
            store.clone(),
            Arc::new(DownGenerator),
            Arc::new(CountingSandbox::new()),
        );
        (machine, store)
    }

    fn text(s: &str) -> CandidateInput {
        CandidateInput::Text(s.to_string())
    }

    fn code(lang: &str) -> CandidateInput {
        CandidateInput::Code {
            code: "function filterAdults(users) { return []; }".to_string(),
            language: lang.to_string(),
            explanation: None,
        }
    }

    #[tokio::test]
    async fn greeting_retry_loop_then_advance() {
        let (machine, store) = machine();
        let (session, event) = machine.start("frontend", "Ada");
        assert_eq!(event.stage, Stage::Greeting);
        assert!(event.message.contains("Ada"));

        // Negative and unclear inputs keep the session in greeting
        let out = machine.advance(session.id, text("not ready yet")).await.unwrap();
        assert_eq!(out.event.stage, Stage::Greeting);
        let out = machine.advance(session.id, text("hmm what")).await.unwrap();
        assert_eq!(out.event.stage, Stage::Greeting);
        assert_eq!(store.get(session.id).unwrap().stage, Stage::Greeting);

        let out = machine.advance(session.id, text("yes, I'm ready")).await.unwrap();
        assert_eq!(out.event.stage, Stage::Introduction);
        assert_eq!(store.get(session.id).unwrap().stage, Stage::Introduction);
    }

    #[tokio::test]
    async fn unclear_no_inside_a_word_does_not_count_as_negative() {
        let (machine, session_store) = machine();
        let (session, _) = machine.start("frontend", "Ada");
        let out = machine
            .advance(session.id, text("I know nothing about this"))
            .await
            .unwrap();
        // "know"/"nothing" must not classify as negative or affirmative
        assert_eq!(out.event.message, UNCLEAR_PROMPT);
        assert_eq!(session_store.get(session.id).unwrap().stage, Stage::Greeting);
    }

    #[tokio::test]
    async fn full_interview_walkthrough() {
        let (machine, store) = machine();
        let (session, _) = machine.start("frontend", "Ada");
        let id = session.id;

        machine.advance(id, text("yes")).await.unwrap();
        let q1 = machine.advance(id, text("I build React apps")).await.unwrap();
        assert_eq!(q1.event.stage, Stage::Technical1);
        // Generator is down: scripted question substitutes
        assert!(q1.event.message.contains("var, let, and const"));

        let q2 = machine.advance(id, text("var is function scoped")).await.unwrap();
        assert_eq!(q2.event.stage, Stage::Technical2);
        let q3 = machine.advance(id, text("hooks manage state")).await.unwrap();
        assert_eq!(q3.event.stage, Stage::Technical3);
        assert_eq!(store.get(id).unwrap().question_index, 3);

        // Scenario: question bound reached, next answer enters coding
        let coding = machine.advance(id, text("I think it's O(n)")).await.unwrap();
        assert_eq!(coding.event.stage, Stage::Coding);
        assert!(coding.event.requires_coding);
        assert!(coding.event.problem_data.is_some());
        let stored = store.get(id).unwrap();
        assert!(stored.problem_data.is_some());

        let explained = machine.advance(id, code("javascript")).await.unwrap();
        assert_eq!(explained.event.stage, Stage::Explanation);
        assert!(explained.event.execution.is_some());
        assert!(store.get(id).unwrap().code_submission.is_some());

        let done = machine.advance(id, text("I filtered then sorted")).await.unwrap();
        assert_eq!(done.event.stage, Stage::Wrapup);
        assert!(done.event.is_final);
        let report = done.report.expect("final report");
        assert_eq!(report.candidate_name, "Ada");
        assert!(store.report(id).is_some());
        assert!(store.get(id).unwrap().end_time.is_some());

        // Terminal stage: fixed acknowledgment, no state change
        let after = machine.advance(id, text("thanks!")).await.unwrap();
        assert_eq!(after.event.message, WRAPUP_ACK);
        assert!(after.report.is_none());
        assert_eq!(store.get(id).unwrap().stage, Stage::Wrapup);
    }

    #[tokio::test]
    async fn stages_only_move_forward() {
        let (machine, store) = machine();
        let (session, _) = machine.start("backend", "Lin");
        let id = session.id;
        let inputs = [
            "ready",
            "intro answer",
            "first answer",
            "second answer",
            "third answer",
        ];
        let mut last = store.get(id).unwrap().stage;
        for input in inputs {
            machine.advance(id, text(input)).await.unwrap();
            let current = store.get(id).unwrap().stage;
            assert!(current >= last, "stage went backwards");
            last = current;
        }
        assert_eq!(last, Stage::Coding);
    }

    #[tokio::test]
    async fn empty_test_cases_skip_evaluation() {
        let (machine, store) = machine();
        let (session, _) = machine.start("frontend", "Ada");
        let id = session.id;
        for input in ["yes", "a", "b", "c", "d"] {
            machine.advance(id, text(input)).await.unwrap();
        }
        // Strip the fallback challenge's test cases
        let mut s = store.get(id).unwrap();
        s.problem_data.as_mut().unwrap().test_cases.clear();
        store.update(s).unwrap();

        let sandbox = Arc::new(CountingSandbox::new());
        let machine = StageMachine::new(store.clone(), Arc::new(DownGenerator), sandbox.clone());
        let out = machine.advance(id, code("python")).await.unwrap();
        assert!(out.event.execution.is_none());
        assert_eq!(sandbox.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.get(id).unwrap().stage, Stage::Explanation);
    }

    #[tokio::test]
    async fn unsupported_language_leaves_stage_unchanged() {
        let (machine, store) = machine();
        let (session, _) = machine.start("frontend", "Ada");
        let id = session.id;
        for input in ["yes", "a", "b", "c", "d"] {
            machine.advance(id, text(input)).await.unwrap();
        }
        let err = machine.advance(id, code("cobol")).await.unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedLanguage(_)));
        let s = store.get(id).unwrap();
        assert_eq!(s.stage, Stage::Coding);
        assert!(s.code_submission.is_none());
    }

    #[tokio::test]
    async fn mismatched_input_kind_is_rejected() {
        let (machine, _) = machine();
        let (session, _) = machine.start("frontend", "Ada");
        let err = machine.advance(session.id, code("python")).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_session_is_not_created_on_advance() {
        let (machine, store) = machine();
        let id = Uuid::now_v7();
        let err = machine.advance(id, text("yes")).await.unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound(_)));
        assert!(store.is_empty());
    }
}
