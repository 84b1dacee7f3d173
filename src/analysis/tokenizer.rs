// =============================================================================
// tokenizer.rs — THE WORD GRINDER
// =============================================================================
//
// Everything downstream — intent, category, sentiment, quality — eats the
// output of this module. The rules are deliberately dumb and deliberately
// stable:
//
//   1. Lowercase everything.
//   2. Delete every character that isn't alphanumeric, underscore, or
//      whitespace. Deleted, not replaced — "don't" becomes "dont", which
//      is wrong in English class and exactly right here, because the
//      fingerprint of a keyword must not depend on apostrophe fashion.
//   3. Split on whitespace.
//
// Keyword ranking is frequency, descending, with ties broken by first
// appearance in the token stream. That tie-break matters: it's what makes
// the whole pipeline reproducible, so we count into a HashMap but keep a
// separate first-seen Vec and do a STABLE sort over it. An unordered
// iteration here would shuffle tied keywords per run and quietly change
// every downstream score.
// =============================================================================

use std::collections::HashMap;

/// At most this many keywords come out, no matter how long the page is.
pub const MAX_KEYWORDS: usize = 20;

/// Tokens this short carry no signal. "the", "a", "of" — gone before the
/// stop list even gets a look.
const MIN_TOKEN_LEN: usize = 4;

/// The ~30 function words that survive the length filter but still say
/// nothing about what a page is about.
const STOP_WORDS: &[&str] = &[
    "this", "that", "these", "those", "with", "from", "have", "been", "were",
    "will", "would", "could", "should", "about", "their", "there", "which",
    "when", "what", "your", "yours", "them", "then", "than", "they", "some",
    "more", "most", "other", "into", "over", "also", "just",
];

/// Lowercase + strip punctuation + join title and content into one string.
/// This is the "normalized text" every scorer operates on. Recomputed per
/// request, never cached — it's cheaper than the cache would be.
pub fn normalize(title: &str, content: &str) -> String {
    let combined = format!("{} {}", title, content);
    combined
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

/// Split normalized text into its token stream. Zero-copy — the scorers
/// that want tokens borrow them straight out of the normalized string.
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split_whitespace()
}

/// Word count of the normalized text. The quality scorer wants this
/// BEFORE the length/stop-word filters, so it gets its own accessor.
pub fn word_count(normalized: &str) -> usize {
    tokens(normalized).count()
}

/// Extract the top salient terms from normalized text.
///
/// Filters out short tokens and stop words, counts frequency, and returns
/// at most [`MAX_KEYWORDS`] tokens sorted by descending count. Ties keep
/// the order the tokens first appeared in the text — `sort_by` is stable
/// and the candidate list is built in first-seen order, so equal counts
/// never reorder.
///
/// Empty input yields an empty list, not an error. A blank page is a
/// boring page, not a broken one.
pub fn extract_keywords(normalized: &str) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for token in tokens(normalized) {
        if token.chars().count() < MIN_TOKEN_LEN || STOP_WORDS.contains(&token) {
            continue;
        }
        let count = counts.entry(token).or_insert(0);
        if *count == 0 {
            first_seen.push(token);
        }
        *count += 1;
    }

    // first_seen already carries the tie-break order; the stable sort
    // only moves tokens with strictly different counts.
    let mut ranked: Vec<(&str, usize)> = first_seen
        .into_iter()
        .map(|t| (t, counts[t]))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(t, _)| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("Hello, World!", "it's GREAT."), "hello world its great");
    }

    #[test]
    fn test_empty_input_yields_empty_keywords() {
        assert_eq!(extract_keywords(&normalize("", "")), Vec::<String>::new());
    }

    #[test]
    fn test_short_tokens_and_stop_words_are_dropped() {
        let keywords = extract_keywords(&normalize("", "the cat sat with this laptop"));
        assert_eq!(keywords, vec!["laptop"]);
    }

    #[test]
    fn test_frequency_ordering() {
        let text = normalize("", "apple banana apple cherry apple banana");
        assert_eq!(extract_keywords(&text), vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn test_ties_break_by_first_appearance() {
        let text = normalize("", "zebra yacht zebra yacht walrus walrus");
        // All counts equal 2 — order must match first appearance, not
        // alphabet or hash order.
        assert_eq!(extract_keywords(&text), vec!["zebra", "yacht", "walrus"]);
    }

    #[test]
    fn test_keyword_cap_and_uniqueness() {
        let mut words = Vec::new();
        for i in 0..50 {
            // Repeat each word a different number of times so the ranking
            // is fully determined.
            for _ in 0..=(50 - i) {
                words.push(format!("word{i:02}x"));
            }
        }
        let text = normalize("", &words.join(" "));
        let keywords = extract_keywords(&text);
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(keywords[0], "word00x");
        let mut unique = keywords.clone();
        unique.dedup();
        assert_eq!(unique.len(), keywords.len());
    }

    #[test]
    fn test_word_count_counts_everything_including_stop_words() {
        assert_eq!(word_count(&normalize("a title", "the cat sat")), 5);
    }
}
