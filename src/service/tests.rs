use super::*;
use crate::answerer::GenerationError;
use crate::models::SessionId;
use crate::ollama::OllamaError;
use std::cell::Cell;
use std::rc::Rc;

/// Returns a fixed answer and counts how often it was asked.
struct FixedAssembler {
    answer: String,
    calls: Rc<Cell<usize>>,
}

impl FixedAssembler {
    fn new(answer: &str) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Self {
                answer: answer.to_string(),
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }
}

impl AnswerAssembler for FixedAssembler {
    fn answer(&self, _question: &str) -> Result<String, GenerationError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.answer.clone())
    }
}

struct FailingAssembler;

impl AnswerAssembler for FailingAssembler {
    fn answer(&self, _question: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Inference(OllamaError::Api {
            message: "model 'llama2' not found".to_string(),
        }))
    }
}

/// Echoes the question back as the answer.
struct EchoAssembler;

impl AnswerAssembler for EchoAssembler {
    fn answer(&self, question: &str) -> Result<String, GenerationError> {
        Ok(format!("you asked {question}"))
    }
}

fn session() -> Session {
    Session::new(SessionId::new(1))
}

#[test]
fn answered_question_is_recorded_with_keywords() {
    let (assembler, calls) = FixedAssembler::new("cat dog cat");
    let service = AskService::new(Box::new(assembler));
    let mut session = session();

    let outcome = service.submit(&mut session, "Q1");

    assert_eq!(calls.get(), 1);
    assert_eq!(session.all(), vec![("Q1", "cat dog cat")]);
    match outcome {
        Submission::Answered { answer, keywords } => {
            assert_eq!(answer, "cat dog cat");
            assert_eq!(keywords[0].keyword, "cat");
            assert_eq!(keywords[0].count, 2);
            assert_eq!(keywords[1].keyword, "dog");
            assert_eq!(keywords[1].count, 1);
        }
        other => panic!("expected an answer, got {other:?}"),
    }
}

#[test]
fn failing_assembler_yields_one_error_and_leaves_session_unchanged() {
    let service = AskService::new(Box::new(FailingAssembler));
    let mut session = session();
    session.record("earlier", "kept");

    let outcome = service.submit(&mut session, "What is the range?");

    assert_eq!(
        outcome,
        Submission::Failed(
            "generation failed: Ollama API error: model 'llama2' not found".to_string()
        )
    );
    assert_eq!(
        outcome.user_message().unwrap(),
        "Error: generation failed: Ollama API error: model 'llama2' not found"
    );
    assert_eq!(session.all(), vec![("earlier", "kept")]);
}

#[test]
fn empty_question_never_reaches_the_assembler() {
    let (assembler, calls) = FixedAssembler::new("unused");
    let service = AskService::new(Box::new(assembler));
    let mut session = session();

    for question in ["", "   ", "\n\t"] {
        let outcome = service.submit(&mut session, question);
        assert_eq!(outcome, Submission::Invalid);
        assert_eq!(outcome.user_message().unwrap(), EMPTY_QUESTION_MESSAGE);
    }

    assert_eq!(calls.get(), 0);
    assert!(session.is_empty());
}

#[test]
fn history_grows_in_submission_order() {
    let service = AskService::new(Box::new(EchoAssembler));
    let mut session = session();

    for q in ["first", "second", "third"] {
        assert!(service.submit(&mut session, q).is_answered());
    }

    assert_eq!(
        session.all(),
        vec![
            ("first", "you asked first"),
            ("second", "you asked second"),
            ("third", "you asked third"),
        ]
    );
}

#[test]
fn failure_between_answers_does_not_shift_history() {
    let echo = AskService::new(Box::new(EchoAssembler));
    let failing = AskService::new(Box::new(FailingAssembler));
    let mut session = session();

    echo.submit(&mut session, "a");
    failing.submit(&mut session, "b");
    echo.submit(&mut session, "c");

    assert_eq!(session.len(), 2);
    assert_eq!(session.all()[1], ("c", "you asked c"));
}

#[test]
fn answered_submission_has_no_user_message() {
    let outcome = Submission::Answered {
        answer: "ok".to_string(),
        keywords: Vec::new(),
    };
    assert!(outcome.user_message().is_none());
    assert!(outcome.is_answered());
    assert!(!Submission::Invalid.is_answered());
}

#[test]
fn empty_answer_is_still_recorded() {
    let (assembler, _) = FixedAssembler::new("");
    let service = AskService::new(Box::new(assembler));
    let mut session = session();

    match service.submit(&mut session, "Q") {
        Submission::Answered { keywords, .. } => assert!(keywords.is_empty()),
        other => panic!("expected an answer, got {other:?}"),
    }
    assert_eq!(session.all(), vec![("Q", "")]);
}
