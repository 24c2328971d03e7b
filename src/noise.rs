//! Noise simulation: emulate out-of-order and incomplete thread capture
//!
//! Shuffling and dropping are independent. Randomness is always supplied by
//! the caller, so a seeded [`StdRng`] gives reproducible output.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::Result;
use crate::errors::ThreadQaError;
use crate::models::Post;

/// Noise strategy applied by the pipeline when ingesting with `noisy = true`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoisePolicy {
    /// Leave posts untouched
    None,
    /// Optionally permute, then keep each post with probability `1 - drop_rate`
    ShuffleDrop {
        #[serde(default = "default_shuffle")]
        shuffle: bool,
        #[serde(default = "default_drop_rate")]
        drop_rate: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
}

fn default_shuffle() -> bool {
    true
}

fn default_drop_rate() -> f64 {
    0.1
}

impl Default for NoisePolicy {
    fn default() -> Self {
        Self::ShuffleDrop {
            shuffle: default_shuffle(),
            drop_rate: default_drop_rate(),
            seed: None,
        }
    }
}

impl NoisePolicy {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::None => Ok(()),
            Self::ShuffleDrop { drop_rate, .. } => {
                if (0.0..=1.0).contains(drop_rate) {
                    Ok(())
                } else {
                    Err(ThreadQaError::InvalidConfig(format!(
                        "drop_rate {drop_rate} is outside [0, 1]"
                    )))
                }
            }
        }
    }

    /// Build the random source for this policy: seeded when a seed is set
    #[must_use]
    pub fn rng(&self) -> StdRng {
        match self {
            Self::ShuffleDrop {
                seed: Some(seed), ..
            } => StdRng::seed_from_u64(*seed),
            _ => StdRng::from_entropy(),
        }
    }

    /// Apply the policy using the supplied random source
    pub fn apply<R: Rng>(&self, posts: &[Post], rng: &mut R) -> Vec<Post> {
        match self {
            Self::None => posts.to_vec(),
            Self::ShuffleDrop {
                shuffle, drop_rate, ..
            } => apply_noise(posts, *shuffle, *drop_rate, rng),
        }
    }
}

/// Permute (when `shuffle`) and subsample posts.
///
/// Each post survives independently with probability `1 - drop_rate`.
/// `drop_rate` is clamped into `[0, 1]`; the input slice is never mutated.
pub fn apply_noise<R: Rng>(
    posts: &[Post],
    shuffle: bool,
    drop_rate: f64,
    rng: &mut R,
) -> Vec<Post> {
    let drop_rate = drop_rate.clamp(0.0, 1.0);
    let mut noisy = posts.to_vec();

    if shuffle {
        noisy.shuffle(rng);
    }

    if drop_rate > 0.0 {
        // gen::<f64>() is in [0, 1), so drop_rate == 1.0 drops everything
        noisy.retain(|_| rng.gen::<f64>() >= drop_rate);
    }

    noisy
}
