use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;
use threadqa::config::AppConfig;
use threadqa::embeddings::EmbeddingCapability;
use threadqa::interaction_log::InteractionLogger;
use threadqa::llm::Completion;
use threadqa::llm::CompletionCapability;
use threadqa::llm::CompletionRequest;
use threadqa::llm::FinishReason;
use threadqa::noise::NoisePolicy;
use threadqa::rag::synthesizer::is_error_marker;
use threadqa::Post;
use threadqa::Result;
use threadqa::ThreadQa;
use threadqa::ThreadQaError;

const DIMS: usize = 256;

/// Hashed bag-of-words embedder; can be switched into a failing mode
struct BagOfWordsEmbedder {
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl BagOfWordsEmbedder {
    fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIMS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            // FNV-1a
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in token.to_lowercase().bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            v[(hash % DIMS as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingCapability for BagOfWordsEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ThreadQaError::EmbeddingServiceError(
                "429 quota exceeded".to_string(),
            ));
        }
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }
}

/// Completer that answers or fails on demand and records every request
struct ScriptedCompleter {
    fail: AtomicBool,
    finish_reason: Mutex<FinishReason>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompleter {
    fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            finish_reason: Mutex::new(FinishReason::Stop),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionCapability for ScriptedCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ThreadQaError::CompletionServiceError(
                "connection reset".to_string(),
            ));
        }
        Ok(Completion {
            text: "Scripted answer.".to_string(),
            finish_reason: self.finish_reason.lock().unwrap().clone(),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct Harness {
    _dir: TempDir,
    config: AppConfig,
    embedder: Arc<BagOfWordsEmbedder>,
    completer: Arc<ScriptedCompleter>,
    qa: ThreadQa,
}

impl Harness {
    fn with_config(mut config: AppConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        config.interaction_log.path = dir.path().join("logs/qa_log.jsonl");
        let embedder = Arc::new(BagOfWordsEmbedder::new());
        let completer = Arc::new(ScriptedCompleter::new());
        let qa = ThreadQa::new(&config, embedder.clone(), completer.clone()).unwrap();
        Self {
            _dir: dir,
            config,
            embedder,
            completer,
            qa,
        }
    }

    fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    fn log_lines(&self) -> Vec<serde_json::Value> {
        match std::fs::read_to_string(self.config.interaction_log_path()) {
            Ok(raw) => raw
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn greeting_posts() -> Vec<Post> {
    vec![Post::new("1", "a", "hello"), Post::new("2", "b", "world")]
}

fn laptop_thread() -> Vec<Post> {
    let mut posts = Vec::new();
    for i in 0..12 {
        posts.push(Post::new(
            format!("{}", 1_700_000_000 + i * 2),
            "alice",
            "my thinkpad laptop keyboard is great and the laptop battery lasts long",
        ));
        posts.push(Post::new(
            format!("{}", 1_700_000_001 + i * 2),
            "bob",
            "sourdough bread recipe needs more flour water and salt",
        ));
    }
    posts
}

#[tokio::test]
async fn test_ask_before_ingest_is_not_ready() {
    let h = Harness::new();
    assert!(!h.qa.is_ready());
    assert!(matches!(
        h.qa.ask("anything?").await,
        Err(ThreadQaError::NotReady)
    ));
    assert!(matches!(
        h.qa.ask_full_thread("anything?").await,
        Err(ThreadQaError::NotReady)
    ));
    // Nothing was answered, so nothing was logged
    assert!(h.log_lines().is_empty());
    assert!(h.completer.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_single_chunk_thread() {
    let mut config = AppConfig::default();
    config.chunking.chunk_size = 100;
    let mut h = Harness::with_config(config);

    let chunks = h.qa.ingest(greeting_posts(), false).await.unwrap();
    assert_eq!(chunks, 1);

    let response = h.qa.ask("greeting?").await.unwrap();
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].text, "[1] a: hello\n[2] b: world");
    assert_eq!(response.answer, "Scripted answer.");
    assert!((response.confidence - 0.9).abs() < f32::EPSILON);
    assert!(!response.failed);

    let lines = h.log_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["question"], "greeting?");
    assert_eq!(lines[0]["failed"], false);
}

#[tokio::test]
async fn test_retrieval_prefers_relevant_chunks() {
    let mut config = AppConfig::default();
    config.chunking.chunk_size = 120;
    config.chunking.overlap = 10;
    let mut h = Harness::with_config(config);

    h.qa.ingest(laptop_thread(), false).await.unwrap();
    let response = h.qa.ask("which laptop keyboard is great").await.unwrap();

    assert_eq!(response.sources.len(), 4);
    assert!(response.sources[0].text.contains("laptop"));

    let request = h.completer.requests.lock().unwrap().last().cloned().unwrap();
    assert!(request.messages[1].content.contains(&response.sources[0].text));
}

#[tokio::test]
async fn test_embedding_is_batched() {
    let mut config = AppConfig::default();
    config.chunking.chunk_size = 50;
    config.chunking.overlap = 5;
    config.embeddings.batch_size = 3;
    let mut h = Harness::with_config(config);

    let chunks = h.qa.ingest(laptop_thread(), false).await.unwrap();
    assert_eq!(
        h.embedder.calls.load(Ordering::SeqCst),
        chunks.div_ceil(3)
    );
}

#[tokio::test]
async fn test_completion_failure_is_data() {
    let mut h = Harness::new();
    h.qa.ingest(laptop_thread(), false).await.unwrap();
    h.completer.fail.store(true, Ordering::SeqCst);

    let response = h.qa.ask("laptop?").await.unwrap();
    assert!(response.failed);
    assert_eq!(response.confidence, 0.0);
    assert!(is_error_marker(&response.answer));
    assert!(response.answer.contains("connection reset"));
    assert!(!response.sources.is_empty());

    let lines = h.log_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["failed"], true);
    assert_eq!(lines[0]["confidence"], 0.0);
}

#[tokio::test]
async fn test_question_embedding_failure_is_data() {
    let mut h = Harness::new();
    h.qa.ingest(laptop_thread(), false).await.unwrap();
    h.embedder.fail.store(true, Ordering::SeqCst);

    let response = h.qa.ask("laptop?").await.unwrap();
    assert!(response.failed);
    assert_eq!(response.confidence, 0.0);
    assert!(is_error_marker(&response.answer));
    assert!(response.answer.contains("429 quota exceeded"));
    assert!(response.sources.is_empty());
    // Retrieval failed, so the completer was never asked
    assert!(h.completer.requests.lock().unwrap().is_empty());

    let lines = h.log_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["question"], "laptop?");
    assert_eq!(lines[0]["failed"], true);

    // The session keeps working once the service recovers
    h.embedder.fail.store(false, Ordering::SeqCst);
    assert!(!h.qa.ask("laptop?").await.unwrap().failed);
    assert_eq!(h.log_lines().len(), 2);
}

#[tokio::test]
async fn test_truncated_answer_medium_confidence() {
    let mut h = Harness::new();
    h.qa.ingest(greeting_posts(), false).await.unwrap();
    *h.completer.finish_reason.lock().unwrap() = FinishReason::Length;

    let response = h.qa.ask("greeting?").await.unwrap();
    assert!((response.confidence - 0.5).abs() < f32::EPSILON);
    assert!(!response.failed);
}

#[tokio::test]
async fn test_every_answer_logged_once() {
    let mut h = Harness::new();
    h.qa.ingest(laptop_thread(), false).await.unwrap();

    h.qa.ask("first").await.unwrap();
    h.completer.fail.store(true, Ordering::SeqCst);
    h.qa.ask("second").await.unwrap();
    h.completer.fail.store(false, Ordering::SeqCst);
    h.qa.ask_full_thread("third").await.unwrap();

    let records = InteractionLogger::new(h.config.interaction_log_path())
        .read_records()
        .unwrap();
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.failed, is_error_marker(&record.answer));
        assert!((0.0..=1.0).contains(&record.confidence));
        if record.failed {
            assert_eq!(record.confidence, 0.0);
        }
    }
    assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn test_rebuild_replaces_index() {
    let mut config = AppConfig::default();
    config.chunking.chunk_size = 40;
    config.chunking.overlap = 5;
    let mut h = Harness::with_config(config);

    let big = h.qa.ingest(laptop_thread(), false).await.unwrap();
    let small = h.qa.ingest(greeting_posts(), false).await.unwrap();
    assert!(big > small);
    assert_eq!(h.qa.chunk_count(), small);

    // Same input twice gives the same count, not double
    let again = h.qa.ingest(greeting_posts(), false).await.unwrap();
    assert_eq!(again, small);
    assert_eq!(h.qa.posts().len(), 2);
}

#[tokio::test]
async fn test_failed_rebuild_keeps_previous_index() {
    let mut h = Harness::new();
    let first = h.qa.ingest(laptop_thread(), false).await.unwrap();

    h.embedder.fail.store(true, Ordering::SeqCst);
    let result = h.qa.ingest(greeting_posts(), false).await;
    assert!(matches!(
        result,
        Err(ThreadQaError::EmbeddingServiceError(_))
    ));
    assert!(h.qa.is_ready());
    assert_eq!(h.qa.chunk_count(), first);
    assert_eq!(h.qa.posts().len(), laptop_thread().len());

    h.embedder.fail.store(false, Ordering::SeqCst);
    assert!(h.qa.ask("laptop?").await.is_ok());
}

#[tokio::test]
async fn test_failed_first_build_stays_uninitialized() {
    let mut h = Harness::new();
    h.embedder.fail.store(true, Ordering::SeqCst);

    assert!(h.qa.ingest(laptop_thread(), false).await.is_err());
    assert!(!h.qa.is_ready());
    assert!(matches!(h.qa.ask("q").await, Err(ThreadQaError::NotReady)));
}

#[tokio::test]
async fn test_ingest_source_errors() {
    let mut h = Harness::new();

    let missing = h.qa.ingest_source("/no/such/thread.json", false).await;
    assert!(matches!(missing, Err(ThreadQaError::SourceUnavailable(_))));

    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"[{"timestamp":"1","author":"a"}]"#).unwrap();
    let malformed = h.qa.ingest_source(&bad, false).await;
    assert!(matches!(malformed, Err(ThreadQaError::MalformedData(_))));
    assert!(!h.qa.is_ready());

    let good = dir.path().join("thread.json");
    std::fs::write(&good, serde_json::to_string(&greeting_posts()).unwrap()).unwrap();
    assert_eq!(h.qa.ingest_source(&good, false).await.unwrap(), 1);
}

#[tokio::test]
async fn test_noisy_ingest_full_drop_gives_empty_index() {
    let mut config = AppConfig::default();
    config.noise = NoisePolicy::ShuffleDrop {
        shuffle: true,
        drop_rate: 1.0,
        seed: Some(3),
    };
    let mut h = Harness::with_config(config);

    assert_eq!(h.qa.ingest(laptop_thread(), true).await.unwrap(), 0);
    assert!(h.qa.is_ready());
    assert!(matches!(
        h.qa.ask("laptop?").await,
        Err(ThreadQaError::EmptyIndex)
    ));
}

#[tokio::test]
async fn test_noisy_ingest_is_seeded() {
    let mut config = AppConfig::default();
    config.noise = NoisePolicy::ShuffleDrop {
        shuffle: true,
        drop_rate: 0.3,
        seed: Some(42),
    };
    let mut a = Harness::with_config(config.clone());
    let mut b = Harness::with_config(config);

    a.qa.ingest(laptop_thread(), true).await.unwrap();
    b.qa.ingest(laptop_thread(), true).await.unwrap();
    assert_eq!(a.qa.posts(), b.qa.posts());
    assert!(a.qa.posts().len() <= laptop_thread().len());
}

#[tokio::test]
async fn test_clean_ingest_ignores_noise_policy() {
    let mut config = AppConfig::default();
    config.noise = NoisePolicy::ShuffleDrop {
        shuffle: true,
        drop_rate: 1.0,
        seed: None,
    };
    let mut h = Harness::with_config(config);
    h.qa.ingest(laptop_thread(), false).await.unwrap();
    assert_eq!(h.qa.posts(), laptop_thread().as_slice());
}

#[tokio::test]
async fn test_full_thread_mode() {
    let mut h = Harness::new();
    h.qa.ingest(greeting_posts(), false).await.unwrap();

    let response = h.qa.ask_full_thread("who spoke?").await.unwrap();
    assert!(response.sources.is_empty());
    assert!(!response.failed);

    let request = h.completer.requests.lock().unwrap().last().cloned().unwrap();
    assert!(request.messages[1]
        .content
        .contains("Thread:\n[1] a: hello\n[2] b: world"));
}

#[tokio::test]
async fn test_speaker_summary_follows_index() {
    let mut h = Harness::new();
    assert!(h.qa.speaker_summary().is_none());

    h.qa.ingest(
        vec![
            Post::new("1", "a", "m1"),
            Post::new("2", "a", "m2"),
            Post::new("3", "b", "m3"),
        ],
        false,
    )
    .await
    .unwrap();

    let summary = h.qa.speaker_summary().unwrap();
    assert_eq!(summary.get("a"), Some("m1, m2"));
    assert_eq!(summary.get("b"), Some("m3"));
}

#[tokio::test]
async fn test_sample_thread() {
    let mut h = Harness::new();
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/sample_thread.json");
    assert!(h.qa.ingest_source(path, false).await.unwrap() > 1);

    let posts = h.qa.posts();
    assert_eq!(posts.len(), 9);
    assert!(posts[3].is_deleted_author());
    assert_eq!(posts[4].timestamp, "1700000410");
    assert_eq!(threadqa::media::image_links(posts).len(), 1);

    let response = h.qa.ask("Which laptop has good Linux support?").await.unwrap();
    assert_eq!(response.sources.len(), 4);
}

#[test]
fn test_invalid_chunking_config_rejected() {
    let mut config = AppConfig::default();
    config.chunking.overlap = 300;
    let result = ThreadQa::new(
        &config,
        Arc::new(BagOfWordsEmbedder::new()),
        Arc::new(ScriptedCompleter::new()),
    );
    assert!(matches!(result, Err(ThreadQaError::InvalidConfig(_))));
}
