//! Sliding-window text chunker.
//!
//! Posts are rendered to `"[timestamp] author: message"` lines, joined with
//! `\n`, and sliced into windows of `chunk_size` characters. Consecutive
//! windows share `overlap` characters, so removing the first `overlap`
//! characters of every chunk after the first rebuilds the thread exactly.
//!
//! Sizes count Unicode scalar values, not bytes, so a window never splits a
//! multi-byte character.
//!
//! # Example
//!
//! ```rust
//! use threadqa::chunking::chunk_posts;
//! use threadqa::models::Post;
//!
//! let posts = vec![Post::new("1", "a", "hello"), Post::new("2", "b", "world")];
//! let chunks = chunk_posts(&posts, 100, 20).unwrap();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].text, "[1] a: hello\n[2] b: world");
//! ```

use crate::errors::Result;
use crate::errors::ThreadQaError;
use crate::models::Chunk;
use crate::models::Post;

/// Render every post on its own line
pub fn render_thread(posts: &[Post]) -> String {
    posts
        .iter()
        .map(Post::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split the rendered thread into overlapping windows.
///
/// A trailing window shorter than `chunk_size` is kept. Empty input yields
/// no chunks.
pub fn chunk_posts(posts: &[Post], chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(ThreadQaError::InvalidConfig(
            "chunk_size must be greater than 0".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(ThreadQaError::InvalidConfig(format!(
            "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
        )));
    }

    let mut chars: Vec<char> = Vec::new();
    // Character offset at which each post's line begins
    let mut line_starts: Vec<usize> = Vec::with_capacity(posts.len());
    for (idx, post) in posts.iter().enumerate() {
        if idx > 0 {
            chars.push('\n');
        }
        line_starts.push(chars.len());
        chars.extend(post.render().chars());
    }

    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(Chunk {
            text: chars[start..end].iter().collect(),
            source_index: post_at(&line_starts, start),
            offset: start,
        });
        if end == chars.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

/// Rebuild the rendered thread from chunks produced with `overlap`
pub fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
    let mut text = String::new();
    for (idx, chunk) in chunks.iter().enumerate() {
        if idx == 0 {
            text.push_str(&chunk.text);
        } else {
            text.extend(chunk.text.chars().skip(overlap));
        }
    }
    text
}

/// Index of the post whose line contains character `offset`.
/// A separator newline belongs to the line it terminates.
fn post_at(line_starts: &[usize], offset: usize) -> usize {
    line_starts
        .partition_point(|&start| start <= offset)
        .saturating_sub(1)
}
