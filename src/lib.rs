pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod index;
pub mod interaction_log;
pub mod llm;
pub mod logging;
pub mod media;
pub mod models;
pub mod noise;
pub mod rag;
pub mod speakers;
pub mod store;


pub use config::AppConfig;
pub use errors::*;
pub use models::Post;
pub use models::QaResponse;
pub use rag::ThreadQa;
