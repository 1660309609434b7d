//! Text formatting shared by the page view models.

use chrono::{DateTime, Utc};

/// Characters of post content shown on a collapsed card.
pub const SNIPPET_CHARS: usize = 150;

/// Collapsed preview of `content`: the first [`SNIPPET_CHARS`] characters
/// followed by "..." when there is more.
pub fn snippet(content: &str) -> String {
    match content.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Whether [`snippet`] shortens `content`.
pub fn is_truncated(content: &str) -> bool {
    content.chars().nth(SNIPPET_CHARS).is_some()
}

/// `Month D, YYYY`, or "N/A" when unknown.
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(
        || "N/A".to_string(),
        |date| date.format("%B %-d, %Y").to_string(),
    )
}

/// `n/max` character counter.
pub fn char_count(text: &str, max: usize) -> String {
    format!("{}/{max}", text.chars().count())
}
