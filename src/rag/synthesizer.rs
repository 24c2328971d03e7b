//! Answer synthesis: prompt the completion capability, score the result,
//! and log the interaction.
//!
//! Completion failures never escape as errors. They come back as a
//! [`SynthesizedAnswer`] with `failed = true`, zero confidence and an
//! `[Error: ...]` marker in place of the answer. A successful completion that
//! happens to start with the marker prefix is escaped with a leading `\`, so
//! the marker appears in an answer exactly when `failed` is set.

use std::fmt::Display;
use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::interaction_log::InteractionLogger;
use crate::llm::CompletionCapability;
use crate::models::Chunk;
use crate::models::InteractionRecord;
use crate::rag::prompts::build_request;
use crate::rag::ConfidencePolicy;
use crate::rag::ContextAssembler;

const ERROR_MARKER_PREFIX: &str = "[Error: ";

/// Outcome of one synthesis call
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAnswer {
    pub answer: String,
    /// In `[0, 1]`; always `0.0` when `failed`
    pub confidence: f32,
    pub failed: bool,
    /// Whether the interaction record reached the log
    pub logged: bool,
}

/// Answer text substituted for a failed completion
pub fn error_marker(detail: impl Display) -> String {
    format!("{ERROR_MARKER_PREFIX}{detail}]")
}

/// True when `answer` is an error marker produced by [`error_marker`]
pub fn is_error_marker(answer: &str) -> bool {
    answer.starts_with(ERROR_MARKER_PREFIX)
}

/// Completion text that cannot be mistaken for an error marker
fn escape_completion(text: String) -> String {
    if is_error_marker(&text) {
        format!("\\{text}")
    } else {
        text
    }
}

pub struct AnswerSynthesizer {
    completer: Arc<dyn CompletionCapability>,
    logger: InteractionLogger,
    confidence: ConfidencePolicy,
    assembler: ContextAssembler,
    temperature: f32,
    max_tokens: usize,
}

impl AnswerSynthesizer {
    pub fn new(
        completer: Arc<dyn CompletionCapability>,
        logger: InteractionLogger,
        confidence: ConfidencePolicy,
        temperature: f32,
        max_tokens: usize,
    ) -> Self {
        Self {
            completer,
            logger,
            confidence,
            assembler: ContextAssembler::default(),
            temperature,
            max_tokens,
        }
    }

    /// Synthesizer using the `[llm]`, `[confidence]`, `[retrieval]` and
    /// `[interaction_log]` sections
    pub fn from_app_config(config: &AppConfig, completer: Arc<dyn CompletionCapability>) -> Self {
        let assembler = match config.retrieval.max_context_length {
            Some(max) => ContextAssembler::new(max),
            None => ContextAssembler::unbounded(),
        };
        Self::new(
            completer,
            InteractionLogger::new(config.interaction_log_path()),
            config.confidence.clone(),
            config.llm.temperature,
            config.llm.max_tokens,
        )
        .with_assembler(assembler)
    }

    /// Replace the context assembler
    #[must_use]
    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Answer from retrieved chunks
    pub async fn answer(&self, chunks: &[Chunk], question: &str) -> SynthesizedAnswer {
        let context = self.assembler.assemble(chunks);
        debug!(
            "Assembled {} chunks into {} bytes of context",
            chunks.len(),
            context.len()
        );
        self.answer_with_context(&context, question).await
    }

    /// Answer from an already assembled context, e.g. the full rendered thread
    pub async fn answer_with_context(&self, context: &str, question: &str) -> SynthesizedAnswer {
        let request = build_request(context, question, self.temperature, self.max_tokens);
        debug!(
            "Requesting completion from {} (temperature={}, max_tokens={})",
            self.completer.model_name(),
            request.temperature,
            request.max_tokens
        );

        let completion = match self.completer.complete(&request).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!("Completion failed: {}", e);
                return self.fail_with(question, &e);
            }
        };

        let confidence = self.confidence.score(&completion.finish_reason);
        info!(
            "Completion finished ({:?}), confidence {:.2}",
            completion.finish_reason, confidence
        );
        let answer = escape_completion(completion.text);
        let logged = self.record(question, &answer, confidence, false);

        SynthesizedAnswer {
            answer,
            confidence,
            failed: false,
            logged,
        }
    }

    /// Failed answer for `question` without calling the completer, e.g. when
    /// retrieval could not run. Logged like any other answer.
    pub fn fail_with(&self, question: &str, detail: impl Display) -> SynthesizedAnswer {
        let answer = error_marker(detail);
        let logged = self.record(question, &answer, 0.0, true);
        SynthesizedAnswer {
            answer,
            confidence: 0.0,
            failed: true,
            logged,
        }
    }

    /// Best-effort append to the interaction log
    fn record(&self, question: &str, answer: &str, confidence: f32, failed: bool) -> bool {
        let record = InteractionRecord::new(question, answer, confidence, failed);
        match self.logger.log(&record) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Failed to write interaction log {}: {}",
                    self.logger.path().display(),
                    e
                );
                false
            }
        }
    }

    pub fn logger(&self) -> &InteractionLogger {
        &self.logger
    }
}
