//! Complete QA pipeline: Ingest -> Chunk -> Index, then Retrieve -> Generate

use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::chunking::chunk_posts;
use crate::chunking::render_thread;
use crate::config::AppConfig;
use crate::embeddings::EmbeddingCapability;
use crate::embeddings::EmbeddingClient;
use crate::errors::Result;
use crate::errors::ThreadQaError;
use crate::index::VectorIndex;
use crate::llm::CompletionCapability;
use crate::llm::LlmClient;
use crate::models::Post;
use crate::models::QaResponse;
use crate::noise::NoisePolicy;
use crate::rag::AnswerSynthesizer;
use crate::speakers::summarize_speakers;
use crate::speakers::SpeakerSummary;
use crate::store::load_posts;

/// Index plus the posts it was built from
struct ReadyState {
    index: VectorIndex,
    posts: Vec<Post>,
}

enum PipelineState {
    Uninitialized,
    Ready(ReadyState),
}

/// Question answering over one thread at a time.
///
/// `ingest` moves the pipeline to ready; `ask` is valid only once ready.
/// A failed `ingest` leaves the previous state untouched.
pub struct ThreadQa {
    embedder: Arc<dyn EmbeddingCapability>,
    synthesizer: AnswerSynthesizer,
    noise: NoisePolicy,
    rng: StdRng,
    chunk_size: usize,
    overlap: usize,
    top_k: usize,
    batch_size: usize,
    state: PipelineState,
}

impl ThreadQa {
    /// Create a pipeline from validated config and the two capabilities
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingCapability>,
        completer: Arc<dyn CompletionCapability>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            embedder,
            synthesizer: AnswerSynthesizer::from_app_config(config, completer),
            noise: config.noise.clone(),
            rng: config.noise.rng(),
            chunk_size: config.chunk_size(),
            overlap: config.chunk_overlap(),
            top_k: config.top_k(),
            batch_size: config.embeddings.batch_size,
            state: PipelineState::Uninitialized,
        })
    }

    /// Create a pipeline backed by the configured HTTP services
    ///
    /// # Errors
    /// - Invalid configuration values
    /// - HTTP client build errors
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let embedder = Arc::new(EmbeddingClient::from_app_config(config)?);
        let completer = Arc::new(LlmClient::from_app_config(config)?);
        Self::new(config, embedder, completer)
    }

    /// Build the index from `posts`, replacing any previous one.
    ///
    /// With `noisy`, the configured noise policy runs first. Returns the
    /// number of indexed chunks.
    pub async fn ingest(&mut self, posts: Vec<Post>, noisy: bool) -> Result<usize> {
        let posts = if noisy {
            let noisy_posts = self.noise.apply(&posts, &mut self.rng);
            info!(
                "Noise simulation kept {} of {} posts",
                noisy_posts.len(),
                posts.len()
            );
            noisy_posts
        } else {
            posts
        };

        let chunks = chunk_posts(&posts, self.chunk_size, self.overlap)?;
        debug!(
            "Chunked {} posts into {} chunks (size={}, overlap={})",
            posts.len(),
            chunks.len(),
            self.chunk_size,
            self.overlap
        );

        let index = VectorIndex::build(chunks, self.embedder.as_ref(), self.batch_size).await?;
        let chunk_count = index.len();

        // Swap only after a complete build
        self.state = PipelineState::Ready(ReadyState { index, posts });
        info!("Pipeline ready with {} chunks", chunk_count);

        Ok(chunk_count)
    }

    /// Load posts from a JSON file and ingest them
    pub async fn ingest_source<P: AsRef<Path>>(&mut self, path: P, noisy: bool) -> Result<usize> {
        let posts = load_posts(path)?;
        self.ingest(posts, noisy).await
    }

    /// Retrieve the closest chunks and synthesize an answer.
    ///
    /// # Errors
    /// - `NotReady` before the first successful `ingest`
    /// - `EmptyIndex` when the ingested thread produced no chunks
    ///
    /// Service failures are not errors. When the question cannot be embedded
    /// or the completion fails, the response has `failed` set, zero
    /// confidence and an error marker as the answer, and is logged.
    pub async fn ask(&self, question: &str) -> Result<QaResponse> {
        let ready = self.ready()?;
        info!("Processing question: {}", question);

        let sources = match ready
            .index
            .query(question, self.top_k, self.embedder.as_ref())
            .await
        {
            Ok(sources) => sources,
            Err(e) if e.is_workflow_error() => return Err(e),
            Err(e) => {
                warn!("Retrieval failed: {}", e);
                let synthesized = self.synthesizer.fail_with(question, &e);
                return Ok(QaResponse {
                    answer: synthesized.answer,
                    confidence: synthesized.confidence,
                    failed: synthesized.failed,
                    sources: Vec::new(),
                });
            }
        };
        debug!("Retrieved {} chunks", sources.len());

        let synthesized = self.synthesizer.answer(&sources, question).await;

        Ok(QaResponse {
            answer: synthesized.answer,
            confidence: synthesized.confidence,
            failed: synthesized.failed,
            sources,
        })
    }

    /// Answer from the whole rendered thread, without retrieval
    pub async fn ask_full_thread(&self, question: &str) -> Result<QaResponse> {
        let ready = self.ready()?;
        info!("Processing question over full thread: {}", question);

        let context = render_thread(&ready.posts);
        let synthesized = self.synthesizer.answer_with_context(&context, question).await;

        Ok(QaResponse {
            answer: synthesized.answer,
            confidence: synthesized.confidence,
            failed: synthesized.failed,
            sources: Vec::new(),
        })
    }

    /// Speaker preview of the posts behind the current index
    pub fn speaker_summary(&self) -> Option<SpeakerSummary> {
        match &self.state {
            PipelineState::Ready(ready) => Some(summarize_speakers(&ready.posts)),
            PipelineState::Uninitialized => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, PipelineState::Ready(_))
    }

    /// Chunks in the current index (0 before the first ingest)
    pub fn chunk_count(&self) -> usize {
        match &self.state {
            PipelineState::Ready(ready) => ready.index.len(),
            PipelineState::Uninitialized => 0,
        }
    }

    /// Posts behind the current index, after any noise
    pub fn posts(&self) -> &[Post] {
        match &self.state {
            PipelineState::Ready(ready) => &ready.posts,
            PipelineState::Uninitialized => &[],
        }
    }

    pub fn synthesizer(&self) -> &AnswerSynthesizer {
        &self.synthesizer
    }

    fn ready(&self) -> Result<&ReadyState> {
        match &self.state {
            PipelineState::Ready(ready) => Ok(ready),
            PipelineState::Uninitialized => Err(ThreadQaError::NotReady),
        }
    }
}
