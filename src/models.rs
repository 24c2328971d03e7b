use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

/// Author recorded for deleted or unknown accounts
pub const DELETED_AUTHOR: &str = "[deleted]";

/// One timestamped, attributed unit of thread text (submission or comment)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "string_or_number")]
    pub timestamp: String,
    #[serde(deserialize_with = "author_or_deleted")]
    pub author: String,
    pub message: String,
}

impl Post {
    pub fn new(
        timestamp: impl Into<String>,
        author: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            author: author.into(),
            message: message.into(),
        }
    }

    /// Single-line form used for chunking and prompting
    #[must_use]
    pub fn render(&self) -> String {
        format!("[{}] {}: {}", self.timestamp, self.author, self.message)
    }

    /// True for the sentinels scrapers emit for removed accounts
    #[must_use]
    pub fn is_deleted_author(&self) -> bool {
        matches!(self.author.as_str(), DELETED_AUTHOR | "None" | "")
    }
}

/// Scrapers emit `created_utc` either as a string or as a float
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}

fn author_or_deleted<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| DELETED_AUTHOR.to_string()))
}

/// A contiguous slice of the rendered thread used as a retrieval unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Index of the post in which this chunk starts
    pub source_index: usize,
    /// Character offset of the first character in the rendered thread
    pub offset: usize,
}

/// A chunk paired with its similarity to a query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// One question/answer event, serialized as a single line of JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub answer: String,
    pub confidence: f32,
    pub failed: bool,
}

impl InteractionRecord {
    /// Record stamped with the current UTC time
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        confidence: f32,
        failed: bool,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            question: question.into(),
            answer: answer.into(),
            confidence,
            failed,
        }
    }
}

/// Result of `ThreadQa::ask`
#[derive(Debug, Clone, PartialEq)]
pub struct QaResponse {
    pub answer: String,
    pub confidence: f32,
    pub failed: bool,
    pub sources: Vec<Chunk>,
}

impl QaResponse {
    /// Get a formatted string representation
    #[must_use]
    pub fn format(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Answer:\n{}\n\n", self.answer));
        output.push_str(&format!(
            "Confidence: {:.2}    Failed: {}\n",
            self.confidence, self.failed
        ));
        if !self.sources.is_empty() {
            output.push_str(&format!("\nSources ({} chunks):\n", self.sources.len()));
            for (idx, source) in self.sources.iter().enumerate() {
                output.push_str(&format!(
                    "  {}. (post #{}) {}\n",
                    idx + 1,
                    source.source_index,
                    source.text.replace('\n', " ")
                ));
            }
        }
        output
    }
}
