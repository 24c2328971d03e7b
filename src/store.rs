//! Post store adapter: loads a thread dump into the in-memory post model

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use tracing::debug;
use tracing::info;

use crate::errors::Result;
use crate::errors::ThreadQaError;
use crate::models::Post;

/// Load posts from a JSON file containing an array of
/// `{timestamp, author, message}` objects
pub fn load_posts<P: AsRef<Path>>(path: P) -> Result<Vec<Post>> {
    let path = path.as_ref();
    debug!("Loading posts from {}", path.display());

    let file = File::open(path).map_err(|e| {
        ThreadQaError::SourceUnavailable(format!("cannot open {}: {e}", path.display()))
    })?;
    let posts = load_posts_from_reader(BufReader::new(file))?;

    info!("Loaded {} posts from {}", posts.len(), path.display());
    Ok(posts)
}

/// Load posts from any reader
pub fn load_posts_from_reader<R: Read>(reader: R) -> Result<Vec<Post>> {
    serde_json::from_reader(reader).map_err(classify_json_error)
}

/// Parse posts from an in-memory JSON document
pub fn parse_posts(json: &str) -> Result<Vec<Post>> {
    serde_json::from_str(json).map_err(classify_json_error)
}

fn classify_json_error(err: serde_json::Error) -> ThreadQaError {
    if err.is_io() {
        ThreadQaError::SourceUnavailable(err.to_string())
    } else {
        ThreadQaError::MalformedData(err.to_string())
    }
}
