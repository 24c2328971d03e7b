//! RAG (Retrieval-Augmented Generation) module
//!
//! This module provides end-to-end question answering over a thread:
//! - Index build from posts (optional noise, chunking, embedding)
//! - Semantic retrieval of the closest chunks
//! - Context assembly and answer generation with a confidence signal
//! - Interaction logging of every answer
//!
//! # Examples
//!
//! ```rust,no_run
//! use threadqa::config::AppConfig;
//! use threadqa::rag::ThreadQa;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let mut qa = ThreadQa::from_config(&config)?;
//!
//!     qa.ingest_source("data/sample_thread.json", false).await?;
//!     let response = qa.ask("Which laptop did people recommend?").await?;
//!     println!("Answer: {}", response.answer);
//!     println!("Sources: {} chunks", response.sources.len());
//!
//!     Ok(())
//! }
//! ```

pub mod confidence;
pub mod context;
pub mod pipeline;
pub mod prompts;
pub mod synthesizer;

pub use confidence::ConfidencePolicy;
pub use context::ContextAssembler;
pub use pipeline::ThreadQa;
pub use synthesizer::AnswerSynthesizer;
pub use synthesizer::SynthesizedAnswer;
