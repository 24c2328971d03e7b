//! Confidence heuristics derived from a completion's termination signal

use serde::Deserialize;
use serde::Serialize;

use crate::errors::Result;
use crate::errors::ThreadQaError;
use crate::llm::FinishReason;

/// Strategy turning a successful completion into a confidence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfidencePolicy {
    /// `stop` for a natural stop, `other` for truncation, filtering, etc.
    FinishReason {
        #[serde(default = "default_stop_confidence")]
        stop: f32,
        #[serde(default = "default_other_confidence")]
        other: f32,
    },
    /// Same score for every successful answer
    Fixed { value: f32 },
}

fn default_stop_confidence() -> f32 {
    0.9
}

fn default_other_confidence() -> f32 {
    0.5
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self::FinishReason {
            stop: default_stop_confidence(),
            other: default_other_confidence(),
        }
    }
}

impl ConfidencePolicy {
    pub fn validate(&self) -> Result<()> {
        let values = match self {
            Self::FinishReason { stop, other } => vec![*stop, *other],
            Self::Fixed { value } => vec![*value],
        };
        for value in &values {
            if !(0.0..=1.0).contains(value) {
                return Err(ThreadQaError::InvalidConfig(format!(
                    "confidence {value} is outside [0, 1]"
                )));
            }
        }
        Ok(())
    }

    /// Score in `[0, 1]` for a successful completion
    #[must_use]
    pub fn score(&self, finish_reason: &FinishReason) -> f32 {
        let raw = match self {
            Self::FinishReason { stop, other } => match finish_reason {
                FinishReason::Stop => *stop,
                _ => *other,
            },
            Self::Fixed { value } => *value,
        };
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, 1.0)
        }
    }
}
