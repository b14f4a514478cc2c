//! Helpers around model prompts that do not need a model.

/// Words and phrases that suggest a question needs fresh web results.
const SEARCH_TRIGGERS: &[&str] = &[
    "current",
    "latest",
    "recent",
    "today",
    "now",
    "update",
    "what happened",
    "news",
    "compare",
    "vs",
    "versus",
    "price",
    "cost",
    "how much",
    "where",
    "when",
    "who",
    "statistics",
    "data",
    "numbers",
    "research",
    "study",
];

/// Shortest generated line still treated as a query.
const MIN_QUERY_LEN: usize = 6;

/// Split model output into search queries, one per line.
///
/// Lines are trimmed; anything of five characters or fewer is noise.
pub fn parse_generated_queries(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() >= MIN_QUERY_LEN)
        .map(str::to_string)
        .collect()
}

/// Whether a follow-up question should be answered with web results.
///
/// Plain substring match, so "now" also fires on "know".
pub fn should_enhance_with_search(question: &str) -> bool {
    let lower = question.to_lowercase();
    SEARCH_TRIGGERS.iter().any(|t| lower.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generated_queries() {
        let text = "  rust tokio semaphore  \n\nok\nshort\n  latest rust release notes\n";
        assert_eq!(parse_generated_queries(text), vec!["rust tokio semaphore", "latest rust release notes"]);
    }

    #[test]
    fn test_parse_generated_queries_empty() {
        assert!(parse_generated_queries("").is_empty());
        assert!(parse_generated_queries("\n  \n").is_empty());
    }

    #[test]
    fn test_should_enhance_triggers() {
        assert!(should_enhance_with_search("What is the LATEST version?"));
        assert!(should_enhance_with_search("compare rust vs go"));
        assert!(should_enhance_with_search("How much does it cost?"));
    }

    #[test]
    fn test_should_enhance_plain_question() {
        assert!(!should_enhance_with_search("Explain the main argument"));
        assert!(!should_enhance_with_search(""));
    }
}
