use tracing::{info, warn};

use crate::answerer::AnswerAssembler;
use crate::keywords::{KeywordFrequency, summarize};
use crate::session::Session;

#[cfg(test)]
mod tests;

/// Shown when the user asks without typing anything.
pub const EMPTY_QUESTION_MESSAGE: &str = "Please provide a question.";

/// Outcome of one submitted question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The assembler answered and the pair was recorded in the session.
    Answered {
        answer: String,
        keywords: Vec<KeywordFrequency>,
    },
    /// The question was empty or whitespace; nothing was asked.
    Invalid,
    /// Generation failed with the given message; the session is unchanged.
    Failed(String),
}

impl Submission {
    /// The text shown to the user when the submission did not produce an answer.
    ///
    /// # Examples
    ///
    /// ```
    /// use evsearch::service::Submission;
    ///
    /// assert_eq!(
    ///     Submission::Failed("connection refused".into()).user_message().as_deref(),
    ///     Some("Error: connection refused")
    /// );
    /// assert_eq!(
    ///     Submission::Invalid.user_message().as_deref(),
    ///     Some("Please provide a question.")
    /// );
    /// ```
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Answered { .. } => None,
            Self::Invalid => Some(EMPTY_QUESTION_MESSAGE.to_string()),
            Self::Failed(message) => Some(format!("Error: {message}")),
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }
}

/// Service layer turning submitted questions into answers.
///
/// AskService owns the answer assembler and is UI-independent, so the TUI and
/// the `ask` command drive exactly the same flow. Session state is passed in
/// on every call rather than held here.
pub struct AskService {
    assembler: Box<dyn AnswerAssembler>,
}

impl AskService {
    /// Creates a new AskService around the given assembler.
    pub fn new(assembler: Box<dyn AnswerAssembler>) -> Self {
        Self { assembler }
    }

    /// Validates `question`, asks the assembler and records a successful answer.
    ///
    /// An empty or whitespace-only question is rejected before the assembler is
    /// invoked. The session grows by exactly one pair on success and is left
    /// untouched otherwise. The question is recorded as typed.
    pub fn submit(&self, session: &mut Session, question: &str) -> Submission {
        if question.trim().is_empty() {
            return Submission::Invalid;
        }

        match self.assembler.answer(question) {
            Ok(answer) => {
                let keywords = summarize(&answer);
                session.record(question, answer.as_str());
                info!(
                    session = %session.id(),
                    history = session.len(),
                    keywords = keywords.len(),
                    "question answered"
                );
                Submission::Answered { answer, keywords }
            }
            Err(e) => {
                warn!(session = %session.id(), error = %e, "question failed");
                Submission::Failed(e.to_string())
            }
        }
    }
}
