//! End-to-end question flow through the public library API.
//!
//! Builds an on-disk index with `ingest_file`, reopens it read-only and asks
//! questions through `AskService`, with a mock standing in for Ollama. Nothing
//! here depends on the CLI or the terminal.

use std::path::Path;
use std::sync::{Arc, Mutex};

use evsearch::ingest::ingest_file;
use evsearch::ollama::{OllamaClientTrait, OllamaError};
use evsearch::{
    AskService, RetrievalQa, RetrievalSettings, Session, SessionId, SessionStore,
    SimilarityMetric, Submission, VectorIndex,
};
use tempfile::tempdir;

const TOPICS: [&str; 4] = ["battery", "charging", "range", "price"];

/// Embeds by topic-word counts and answers with a canned reply.
struct TopicOllama {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl TopicOllama {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl OllamaClientTrait for TopicOllama {
    fn generate(&self, _model: &str, prompt: &str) -> Result<String, OllamaError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .map_err(|message| OllamaError::Api { message })
    }

    fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>, OllamaError> {
        let text = text.to_lowercase();
        Ok(TOPICS
            .iter()
            .map(|topic| text.matches(topic).count() as f32)
            .collect())
    }
}

fn build_index(dir: &Path, client: &dyn OllamaClientTrait) -> std::path::PathBuf {
    let doc = dir.join("ev_facts.txt");
    std::fs::write(
        &doc,
        format!(
            "{}\n\n{}\n\n{}",
            "Battery chemistry matters. A battery loses capacity as the battery ages. "
                .repeat(8),
            "Charging at home is cheapest. Fast charging networks make charging on trips easy. "
                .repeat(8),
            "Price parity with petrol cars is near. The price of a pack keeps falling. "
                .repeat(8),
        ),
    )
    .unwrap();

    let index_path = dir.join("index.db");
    let mut index = VectorIndex::open(&index_path).unwrap();
    let stored = ingest_file(client, "embed", &mut index, &doc).unwrap();
    assert_eq!(stored, 3, "each topic paragraph becomes its own chunk");
    index_path
}

fn settings(top_k: usize) -> RetrievalSettings {
    RetrievalSettings {
        chat_model: "chat".to_string(),
        embed_model: "embed".to_string(),
        top_k,
        metric: SimilarityMetric::Cosine,
    }
}

#[test]
fn question_is_answered_from_the_most_similar_chunk() {
    let dir = tempdir().unwrap();
    let client = TopicOllama::replying("Charge at home overnight for the lowest cost.");
    let index_path = build_index(dir.path(), client.as_ref());

    let index = VectorIndex::open_read_only(&index_path).unwrap();
    let qa = RetrievalQa::new(client.clone(), index, settings(1));
    let service = AskService::new(Box::new(qa));
    let mut session = Session::new(SessionId::new(1));

    let outcome = service.submit(&mut session, "Where is charging cheapest?");

    match outcome {
        Submission::Answered { answer, keywords } => {
            assert_eq!(answer, "Charge at home overnight for the lowest cost.");
            assert_eq!(keywords.len(), 8);
            assert!(keywords.iter().all(|k| k.count == 1));
        }
        other => panic!("expected an answer, got {other:?}"),
    }

    let prompt = client.last_prompt();
    assert!(prompt.contains("Question: Where is charging cheapest?"));
    assert!(prompt.contains("Fast charging networks"));
    assert!(!prompt.contains("Battery chemistry"));
    assert_eq!(
        session.all(),
        vec![(
            "Where is charging cheapest?",
            "Charge at home overnight for the lowest cost."
        )]
    );
}

#[test]
fn sessions_keep_separate_histories() {
    let dir = tempdir().unwrap();
    let client = TopicOllama::replying("price price falls");
    let index_path = build_index(dir.path(), client.as_ref());

    let qa = RetrievalQa::new(
        client,
        VectorIndex::open_read_only(&index_path).unwrap(),
        settings(2),
    );
    let service = AskService::new(Box::new(qa));

    let mut store = SessionStore::new();
    let first = store.open();
    let second = store.open();

    service.submit(store.get_or_open(first), "What about price?");
    service.submit(store.get_or_open(first), "And the battery?");
    service.submit(store.get_or_open(second), "Range?");

    assert_eq!(store.get(first).unwrap().len(), 2);
    assert_eq!(store.get(second).unwrap().all()[0].0, "Range?");
}

#[test]
fn model_failure_leaves_session_untouched() {
    let dir = tempdir().unwrap();
    let client = TopicOllama::failing("model 'chat' not found, try pulling it first");
    let index_path = build_index(dir.path(), client.as_ref());

    let qa = RetrievalQa::new(
        client,
        VectorIndex::open_read_only(&index_path).unwrap(),
        settings(4),
    );
    let service = AskService::new(Box::new(qa));
    let mut session = Session::new(SessionId::new(7));

    let outcome = service.submit(&mut session, "What is the range?");

    let message = outcome.user_message().unwrap();
    assert!(message.starts_with("Error: "));
    assert!(message.contains("try pulling it first"));
    assert!(session.is_empty());
}

#[test]
fn empty_index_is_reported_not_answered() {
    let dir = tempdir().unwrap();
    let index_path = dir.path().join("index.db");
    VectorIndex::open(&index_path).unwrap();

    let client = TopicOllama::replying("unused");
    let qa = RetrievalQa::new(
        client.clone(),
        VectorIndex::open_read_only(&index_path).unwrap(),
        settings(4),
    );
    let service = AskService::new(Box::new(qa));
    let mut session = Session::new(SessionId::new(1));

    match service.submit(&mut session, "anything?") {
        Submission::Failed(message) => assert!(message.contains("empty")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(client.prompts.lock().unwrap().is_empty());
}
