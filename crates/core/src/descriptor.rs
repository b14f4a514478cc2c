//! Canonical request descriptors.
//!
//! Every cached computation is keyed by `fingerprint(descriptor)`, so these
//! strings must stay stable across releases or existing caches go cold.

/// One search query at a given result limit.
pub fn search(query: &str, limit: usize) -> String {
    format!("search:{query}:{limit}")
}

/// Summary of a search query's findings.
pub fn search_summary(query: &str, length: &str, markdown: bool) -> String {
    format!("search:{query}:{length}:{markdown}")
}

/// Summary of a single web page.
pub fn url(url: &str, length: &str, markdown: bool, search: bool) -> String {
    format!("url:{url}:{length}:{markdown}:{search}")
}

/// Generated follow-up queries for some context text.
pub fn queries(context: &str, purpose: &str) -> String {
    format!("queries:{}:{purpose}", prefix(context, 200))
}

/// Outline derived from a summary.
pub fn outline(summary: &str, markdown: bool) -> String {
    format!("outline:{}:{markdown}", prefix(summary, 200))
}

/// Answer to a question asked inside a session.
pub fn qa(question: &str, summary: &str) -> String {
    format!("qa:{question}:{}", prefix(summary, 100))
}

/// First `max` characters of `s`, never splitting a code point.
fn prefix(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
