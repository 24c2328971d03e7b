//! Context assembly from retrieved chunks

use crate::models::Chunk;

/// Separator between retrieved chunks in the prompt
const CHUNK_SEPARATOR: &str = "\n\n";

/// Assembler for creating prompt context from chunks
pub struct ContextAssembler {
    max_context_length: Option<usize>,
}

impl ContextAssembler {
    /// Create an assembler that stops adding chunks past `max_context_length` bytes
    #[must_use]
    pub const fn new(max_context_length: usize) -> Self {
        Self {
            max_context_length: Some(max_context_length),
        }
    }

    /// Create an assembler that keeps every chunk
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_context_length: None,
        }
    }

    /// Join chunk texts in retrieval order.
    ///
    /// The first chunk is always kept, even if it alone exceeds the limit.
    #[must_use]
    pub fn assemble(&self, chunks: &[Chunk]) -> String {
        let mut context = String::new();

        for chunk in chunks {
            let added = if context.is_empty() {
                chunk.text.len()
            } else {
                CHUNK_SEPARATOR.len() + chunk.text.len()
            };
            if let Some(max) = self.max_context_length {
                if !context.is_empty() && context.len() + added > max {
                    break;
                }
            }
            if !context.is_empty() {
                context.push_str(CHUNK_SEPARATOR);
            }
            context.push_str(&chunk.text);
        }

        context
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::unbounded()
    }
}
