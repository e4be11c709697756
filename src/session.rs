//! Per-session question/answer history.

use std::collections::HashMap;

use time::OffsetDateTime;

use crate::models::SessionId;

/// The questions asked in one session and the answers they received.
///
/// The two sequences are index aligned and only ever grow together, so
/// `questions.len() == answers.len()` holds at all times.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    started_at: OffsetDateTime,
    questions: Vec<String>,
    answers: Vec<String>,
}

impl Session {
    /// Creates an empty session.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            started_at: OffsetDateTime::now_utc(),
            questions: Vec::new(),
            answers: Vec::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn started_at(&self) -> OffsetDateTime {
        self.started_at
    }

    /// Appends one answered question to the history.
    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.questions.push(question.into());
        self.answers.push(answer.into());
    }

    /// Returns every `(question, answer)` pair in the order they were recorded.
    ///
    /// # Examples
    ///
    /// ```
    /// use evsearch::models::SessionId;
    /// use evsearch::session::Session;
    ///
    /// let mut session = Session::new(SessionId::new(1));
    /// session.record("Q1", "A1");
    /// session.record("Q2", "A2");
    ///
    /// assert_eq!(session.all(), vec![("Q1", "A1"), ("Q2", "A2")]);
    /// ```
    pub fn all(&self) -> Vec<(&str, &str)> {
        self.questions
            .iter()
            .zip(&self.answers)
            .map(|(q, a)| (q.as_str(), a.as_str()))
            .collect()
    }

    /// Number of recorded question/answer pairs.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Holds every live session, keyed by its identifier.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    next_id: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new empty session and returns its identifier.
    pub fn open(&mut self) -> SessionId {
        self.next_id += 1;
        let id = SessionId::new(self.next_id);
        self.sessions.insert(id, Session::new(id));
        tracing::debug!(session = %id, "session opened");
        id
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// Returns the session for `id`, starting an empty one if it was closed or never opened.
    pub fn get_or_open(&mut self, id: SessionId) -> &mut Session {
        self.next_id = self.next_id.max(id.get());
        self.sessions.entry(id).or_insert_with(|| Session::new(id))
    }

    /// Ends a session, dropping its history.
    pub fn close(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_empty() {
        let session = Session::new(SessionId::new(1));
        assert!(session.is_empty());
        assert_eq!(session.len(), 0);
        assert!(session.all().is_empty());
    }

    #[test]
    fn record_preserves_call_order() {
        let mut session = Session::new(SessionId::new(1));
        let pairs: Vec<(String, String)> = (0..25)
            .map(|i| (format!("question {i}"), format!("answer {i}")))
            .collect();

        for (q, a) in &pairs {
            session.record(q.as_str(), a.as_str());
        }

        let all = session.all();
        assert_eq!(all.len(), pairs.len());
        for (i, (q, a)) in pairs.iter().enumerate() {
            assert_eq!(all[i], (q.as_str(), a.as_str()));
        }
    }

    #[test]
    fn duplicate_questions_are_kept() {
        let mut session = Session::new(SessionId::new(1));
        session.record("same", "first");
        session.record("same", "second");

        assert_eq!(session.all(), vec![("same", "first"), ("same", "second")]);
    }

    #[test]
    fn store_issues_distinct_ids() {
        let mut store = SessionStore::new();
        let a = store.open();
        let b = store.open();

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(a).unwrap().id(), a);
    }

    #[test]
    fn sessions_do_not_share_history() {
        let mut store = SessionStore::new();
        let a = store.open();
        let b = store.open();

        store.get_mut(a).unwrap().record("Q1", "A1");

        assert_eq!(store.get(a).unwrap().len(), 1);
        assert!(store.get(b).unwrap().is_empty());
    }

    #[test]
    fn closed_session_is_gone() {
        let mut store = SessionStore::new();
        let id = store.open();
        store.get_mut(id).unwrap().record("Q", "A");

        let closed = store.close(id).unwrap();
        assert_eq!(closed.len(), 1);
        assert!(store.get(id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn get_or_open_restarts_closed_session_empty() {
        let mut store = SessionStore::new();
        let id = store.open();
        store.get_or_open(id).record("Q", "A");
        assert_eq!(store.get(id).unwrap().len(), 1);

        store.close(id);
        assert!(store.get_or_open(id).is_empty());

        let next = store.open();
        assert_ne!(next, id);
    }
}
