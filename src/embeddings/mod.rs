//! Embeddings capability
//!
//! The pipeline only sees the [`EmbeddingCapability`] trait. Production code
//! plugs in [`EmbeddingClient`], which talks to:
//! - OpenAI (text-embedding-ada-002, text-embedding-3-small, etc.)
//! - Ollama (local models)
//!
//! Tests substitute an in-process implementation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use threadqa::config::AppConfig;
//! use threadqa::embeddings::EmbeddingCapability;
//! use threadqa::embeddings::EmbeddingClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let client = EmbeddingClient::from_app_config(&config)?;
//!
//!     let embedding = client.embed("Hello, world!").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;

use async_trait::async_trait;

pub use client::EmbeddingClient;

use crate::errors::Result;
use crate::errors::ThreadQaError;

/// Text-to-vector capability used at build and query time
#[async_trait]
pub trait EmbeddingCapability: Send + Sync {
    /// One vector per input text, in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ThreadQaError::EmbeddingServiceError("No embedding in response".to_string())
            })
    }

    /// Model identifier, for diagnostics
    fn model_name(&self) -> &str;
}
