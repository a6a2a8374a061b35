// In-memory session store
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// Sessions live only in process memory; they are created on interview
// start and destroyed on explicit termination or transport disconnect.
// The underlying map is never exposed to callers.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::eval::ExecutionReport;
use crate::report::Report;
use crate::session::{Session, Stage};

/// Process-wide registry of active interview sessions
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    /// Evaluation outcome from the coding stage, consumed at scoring time
    executions: RwLock<HashMap<Uuid, ExecutionReport>>,
    /// Final reports are retained past wrap-up so a client can re-fetch them
    reports: RwLock<HashMap<Uuid, Report>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session at the greeting stage
    pub fn create(&self, role: impl Into<String>, candidate_name: impl Into<String>) -> Session {
        let session = Session {
            id: Uuid::now_v7(),
            role: role.into(),
            candidate_name: candidate_name.into(),
            stage: Stage::Greeting,
            question_index: 0,
            max_questions: 3,
            conversation_history: Vec::new(),
            problem_data: None,
            code_submission: None,
            start_time: Utc::now(),
            end_time: None,
        };
        self.sessions.write().insert(session.id, session.clone());
        session
    }

    /// Fetch a session by id. Never silently creates one.
    pub fn get(&self, id: Uuid) -> Result<Session> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(EngineError::SessionNotFound(id))
    }

    /// Write back a mutated session
    pub fn update(&self, session: Session) -> Result<()> {
        let mut sessions = self.sessions.write();
        if !sessions.contains_key(&session.id) {
            return Err(EngineError::SessionNotFound(session.id));
        }
        sessions.insert(session.id, session);
        Ok(())
    }

    /// Remove a session; returns false when it did not exist
    pub fn delete(&self, id: Uuid) -> bool {
        self.executions.write().remove(&id);
        self.reports.write().remove(&id);
        self.sessions.write().remove(&id).is_some()
    }

    /// Retain the coding-stage evaluation outcome for scoring
    pub fn store_execution(&self, session_id: Uuid, execution: ExecutionReport) {
        self.executions.write().insert(session_id, execution);
    }

    /// Fetch the coding-stage evaluation outcome, if any
    pub fn execution(&self, session_id: Uuid) -> Option<ExecutionReport> {
        self.executions.read().get(&session_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Retain the final report for a terminated session
    pub fn store_report(&self, session_id: Uuid, report: Report) {
        self.reports.write().insert(session_id, report);
    }

    /// Fetch the final report, if the session has produced one
    pub fn report(&self, session_id: Uuid) -> Option<Report> {
        self.reports.read().get(&session_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_get_roundtrip() {
        let store = SessionStore::new();
        let session = store.create("frontend", "Ada");
        let fetched = store.get(session.id).unwrap();
        assert_eq!(fetched.candidate_name, "Ada");
        assert_eq!(fetched.stage, Stage::Greeting);
        assert_eq!(fetched.question_index, 0);
        assert_eq!(fetched.max_questions, 3);
        assert!(fetched.end_time.is_none());
    }

    #[test]
    fn get_unknown_session_is_a_distinct_error() {
        let store = SessionStore::new();
        let id = Uuid::now_v7();
        let err = store.get(id).unwrap_err();
        assert!(matches!(err, EngineError::SessionNotFound(e) if e == id));
        // Lookup must never create a session as a side effect
        assert!(store.is_empty());
    }

    #[test]
    fn update_unknown_session_fails() {
        let store = SessionStore::new();
        let other = SessionStore::new();
        let session = other.create("backend", "Lin");
        assert!(matches!(
            store.update(session),
            Err(EngineError::SessionNotFound(_))
        ));
    }

    #[test]
    fn delete_removes_session_and_report() {
        let store = SessionStore::new();
        let session = store.create("frontend", "Ada");
        assert!(store.delete(session.id));
        assert!(!store.delete(session.id));
        assert!(store.get(session.id).is_err());
    }

    #[test]
    fn sessions_are_independent() {
        let store = SessionStore::new();
        let a = store.create("frontend", "Ada");
        let b = store.create("backend", "Lin");
        let mut mutated = store.get(a.id).unwrap();
        mutated.stage = Stage::Introduction;
        store.update(mutated).unwrap();
        assert_eq!(store.get(a.id).unwrap().stage, Stage::Introduction);
        assert_eq!(store.get(b.id).unwrap().stage, Stage::Greeting);
    }
}
