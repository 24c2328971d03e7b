//! Speaker attribution: who said what, for display only

use std::collections::HashMap;
use std::fmt;

use crate::models::Post;

/// Messages shown per author before truncating
const MESSAGES_PER_SPEAKER: usize = 2;

/// Per-author preview, ordered by each author's first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerSummary {
    entries: Vec<(String, String)>,
}

impl SpeakerSummary {
    /// Preview for an author, if they posted
    pub fn get(&self, author: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == author)
            .map(|(_, preview)| preview.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(author, preview)| (author.as_str(), preview.as_str()))
    }
}

impl fmt::Display for SpeakerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (author, preview)) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{author}: {preview}")?;
        }
        Ok(())
    }
}

/// Group posts by exact author string
pub fn summarize_speakers(posts: &[Post]) -> SpeakerSummary {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&str>> = HashMap::new();

    for post in posts {
        grouped
            .entry(post.author.as_str())
            .or_insert_with(|| {
                order.push(post.author.as_str());
                Vec::new()
            })
            .push(post.message.as_str());
    }

    let entries = order
        .into_iter()
        .map(|author| {
            let messages = &grouped[author];
            let shown = messages
                .iter()
                .take(MESSAGES_PER_SPEAKER)
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            let ellipsis = if messages.len() > MESSAGES_PER_SPEAKER {
                "..."
            } else {
                ""
            };
            (author.to_string(), format!("{shown}{ellipsis}"))
        })
        .collect();

    SpeakerSummary { entries }
}
