use crate::keywords::KeywordFrequency;
use crate::models::SessionId;
use crate::service::{AskService, Submission};
use crate::session::{Session, SessionStore};
use time::OffsetDateTime;

/// Application state for the TUI.
///
/// Holds the question being typed, the latest result and the session whose
/// history is shown.
#[derive(Debug)]
pub struct App {
    /// Question input buffer
    input: String,
    /// Currently focused panel
    focus: Focus,
    status: Status,
    /// Latest answer, cleared when a submission fails
    answer: Option<String>,
    /// Keyword frequencies of `answer`
    keywords: Vec<KeywordFrequency>,
    /// Warning or error from the latest submission
    notice: Option<Notice>,
    /// Scroll offset for the answer panel
    answer_scroll: u16,
    /// Scroll offset for the history panel
    history_scroll: u16,
    sessions: SessionStore,
    session_id: SessionId,
}

/// Panel focus state for keyboard navigation.
///
/// Determines which panel receives keyboard input and how keys are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Question input is focused (typing edits the question, Enter asks)
    Input,
    /// Answer panel is focused (j/k scroll)
    Answer,
    /// History panel is focused (j/k scroll)
    History,
}

/// Whether a question is currently being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Thinking,
}

/// Message shown in the banner below the panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Warning(m) | Notice::Error(m) => m,
        }
    }
}

impl App {
    /// Creates a new App with an empty session.
    ///
    /// # Examples
    ///
    /// ```
    /// use evsearch::tui::{App, Focus};
    ///
    /// let app = App::new();
    /// assert_eq!(app.focus(), Focus::Input);
    /// assert!(app.answer().is_none());
    /// assert!(app.history().is_empty());
    /// ```
    pub fn new() -> Self {
        let mut sessions = SessionStore::new();
        let session_id = sessions.open();
        Self {
            input: String::new(),
            focus: Focus::Input,
            status: Status::Idle,
            answer: None,
            keywords: Vec::new(),
            notice: None,
            answer_scroll: 0,
            history_scroll: 0,
            sessions,
            session_id,
        }
    }

    /// Returns the question input buffer.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns the current focus state.
    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn keywords(&self) -> &[KeywordFrequency] {
        &self.keywords
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// When the current session was opened.
    pub fn session_started_at(&self) -> Option<OffsetDateTime> {
        self.sessions
            .get(self.session_id)
            .map(Session::started_at)
    }

    /// Question/answer pairs of the current session, oldest first.
    pub fn history(&self) -> Vec<(&str, &str)> {
        self.sessions
            .get(self.session_id)
            .map(Session::all)
            .unwrap_or_default()
    }

    pub fn answer_scroll(&self) -> u16 {
        self.answer_scroll
    }

    pub fn history_scroll(&self) -> u16 {
        self.history_scroll
    }

    /// Adds a character to the question input.
    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    /// Removes the last character from the question input.
    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    /// Cycles focus to the next panel in Tab order.
    ///
    /// Order: `Input` -> `Answer` -> `History` -> `Input`
    ///
    /// # Examples
    ///
    /// ```
    /// use evsearch::tui::{App, Focus};
    ///
    /// let mut app = App::new();
    /// app.next_focus();
    /// assert_eq!(app.focus(), Focus::Answer);
    /// app.next_focus();
    /// assert_eq!(app.focus(), Focus::History);
    /// app.next_focus();
    /// assert_eq!(app.focus(), Focus::Input);
    /// ```
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Answer,
            Focus::Answer => Focus::History,
            Focus::History => Focus::Input,
        };
    }

    /// Cycles focus to the previous panel in reverse Tab order.
    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::History,
            Focus::Answer => Focus::Input,
            Focus::History => Focus::Answer,
        };
    }

    /// Returns focus to the question input (Esc key behavior).
    pub fn reset_focus(&mut self) {
        self.focus = Focus::Input;
    }

    /// Scrolls the focused panel down by the specified amount.
    pub fn scroll_down(&mut self, amount: u16) {
        match self.focus {
            Focus::Answer => self.answer_scroll = self.answer_scroll.saturating_add(amount),
            Focus::History => self.history_scroll = self.history_scroll.saturating_add(amount),
            Focus::Input => {}
        }
    }

    /// Scrolls the focused panel up by the specified amount.
    pub fn scroll_up(&mut self, amount: u16) {
        match self.focus {
            Focus::Answer => self.answer_scroll = self.answer_scroll.saturating_sub(amount),
            Focus::History => self.history_scroll = self.history_scroll.saturating_sub(amount),
            Focus::Input => {}
        }
    }

    /// Marks the app as waiting on the model so the next frame shows progress.
    pub fn begin_thinking(&mut self) {
        self.status = Status::Thinking;
    }

    /// Asks the current input through `service` and applies the outcome.
    ///
    /// A successful answer replaces the result panels and clears the input.
    /// A failed or empty question clears them and shows a notice instead; the
    /// typed question is kept so it can be retried.
    pub fn submit(&mut self, service: &AskService) -> Submission {
        let question = self.input.clone();
        let session = self.sessions.get_or_open(self.session_id);
        let outcome = service.submit(session, &question);

        self.status = Status::Idle;
        self.answer_scroll = 0;
        match &outcome {
            Submission::Answered { answer, keywords } => {
                self.answer = Some(answer.clone());
                self.keywords = keywords.clone();
                self.notice = None;
                self.input.clear();
            }
            Submission::Invalid => {
                self.answer = None;
                self.keywords.clear();
                self.notice = outcome.user_message().map(Notice::Warning);
            }
            Submission::Failed(_) => {
                self.answer = None;
                self.keywords.clear();
                self.notice = outcome.user_message().map(Notice::Error);
            }
        }
        outcome
    }

    /// Ends the session, dropping its history.
    pub fn end_session(&mut self) -> Option<Session> {
        self.sessions.close(self.session_id)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answerer::{AnswerAssembler, GenerationError};

    struct Fixed(&'static str);

    impl AnswerAssembler for Fixed {
        fn answer(&self, _question: &str) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl AnswerAssembler for Failing {
        fn answer(&self, _question: &str) -> Result<String, GenerationError> {
            Err(GenerationError::EmptyIndex)
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.push_char(c);
        }
    }

    #[test]
    fn app_initializes_with_default_state() {
        let app = App::new();
        assert_eq!(app.input(), "");
        assert_eq!(app.focus(), Focus::Input);
        assert_eq!(app.status(), Status::Idle);
        assert!(app.keywords().is_empty());
        assert!(app.notice().is_none());
    }

    #[test]
    fn focus_cycles_in_reverse_tab_order() {
        let mut app = App::new();
        app.prev_focus();
        assert_eq!(app.focus(), Focus::History);
        app.prev_focus();
        assert_eq!(app.focus(), Focus::Answer);
        app.prev_focus();
        assert_eq!(app.focus(), Focus::Input);
    }

    #[test]
    fn input_editing() {
        let mut app = App::new();
        type_text(&mut app, "range?");
        app.pop_char();
        assert_eq!(app.input(), "range");

        let mut empty = App::new();
        empty.pop_char();
        assert_eq!(empty.input(), "");
    }

    #[test]
    fn scrolling_applies_to_focused_panel_only() {
        let mut app = App::new();
        app.scroll_down(3);
        assert_eq!(app.answer_scroll(), 0);

        app.next_focus();
        app.scroll_down(3);
        app.scroll_up(1);
        assert_eq!(app.answer_scroll(), 2);

        app.next_focus();
        app.scroll_up(5);
        assert_eq!(app.history_scroll(), 0);
        app.scroll_down(1);
        assert_eq!(app.history_scroll(), 1);
        assert_eq!(app.answer_scroll(), 2);
    }

    #[test]
    fn successful_submit_updates_panels_and_history() {
        let service = AskService::new(Box::new(Fixed("cat dog cat")));
        let mut app = App::new();
        type_text(&mut app, "Q1");
        app.begin_thinking();
        assert_eq!(app.status(), Status::Thinking);

        assert!(app.submit(&service).is_answered());

        assert_eq!(app.status(), Status::Idle);
        assert_eq!(app.answer(), Some("cat dog cat"));
        assert_eq!(app.keywords()[0].keyword, "cat");
        assert_eq!(app.history(), vec![("Q1", "cat dog cat")]);
        assert_eq!(app.input(), "");
    }

    #[test]
    fn failed_submit_shows_error_and_keeps_history() {
        let good = AskService::new(Box::new(Fixed("fine")));
        let bad = AskService::new(Box::new(Failing));
        let mut app = App::new();

        type_text(&mut app, "first");
        app.submit(&good);
        type_text(&mut app, "second");
        app.submit(&bad);

        assert!(app.answer().is_none());
        assert!(app.keywords().is_empty());
        assert_eq!(app.input(), "second");
        assert_eq!(app.history(), vec![("first", "fine")]);
        match app.notice() {
            Some(Notice::Error(message)) => assert!(message.starts_with("Error: ")),
            other => panic!("expected error notice, got {other:?}"),
        }
    }

    #[test]
    fn empty_submit_shows_warning() {
        let service = AskService::new(Box::new(Fixed("unused")));
        let mut app = App::new();
        type_text(&mut app, "   ");

        assert_eq!(app.submit(&service), Submission::Invalid);
        assert_eq!(
            app.notice(),
            Some(&Notice::Warning("Please provide a question.".to_string()))
        );
        assert!(app.history().is_empty());
    }

    #[test]
    fn successful_submit_clears_previous_notice() {
        let service = AskService::new(Box::new(Fixed("ok")));
        let mut app = App::new();
        app.submit(&service);
        assert!(app.notice().is_some());

        type_text(&mut app, "again");
        app.submit(&service);
        assert!(app.notice().is_none());
    }

    #[test]
    fn ending_session_drops_history() {
        let service = AskService::new(Box::new(Fixed("a")));
        let mut app = App::new();
        type_text(&mut app, "q");
        app.submit(&service);

        let ended = app.end_session().unwrap();
        assert_eq!(ended.len(), 1);
        assert!(app.history().is_empty());
    }
}
