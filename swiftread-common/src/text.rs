//! Text utilities
//!
//! Whitespace tokenization is the single definition of "word" across the
//! library store, the import pipeline and the playback engine.

use uuid::Uuid;

/// Split raw text into words on runs of whitespace
pub fn tokenize(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Collapse all whitespace runs into single spaces and trim the ends
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string to at most `max` characters (not bytes)
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Generate a fresh short identifier (8 hex chars from a UUIDv4)
pub fn short_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}
