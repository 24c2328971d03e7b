//! Image-link detection in posts.
//!
//! Links are only found, never fetched or analysed.

use crate::models::Post;

const IMAGE_MARKERS: [&str; 5] = ["imgur.com", ".jpg", ".jpeg", ".png", ".gif"];

/// Messages that reference an image host or image file
pub fn image_links(posts: &[Post]) -> Vec<&str> {
    posts
        .iter()
        .filter(|post| {
            let lower = post.message.to_lowercase();
            IMAGE_MARKERS.iter().any(|marker| lower.contains(marker))
        })
        .map(|post| post.message.as_str())
        .collect()
}
