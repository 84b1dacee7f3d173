// =============================================================================
// sentiment.rs — THE MOOD RING
// =============================================================================
//
// Lexicon sentiment, two automatons, three labels. Count the happy words,
// count the sad words, whichever pile is taller wins, and a tie — including
// the very common zero-zero tie — is neutral. No model, no embeddings,
// no nuance. A popup does not need to know the page is wistful.
// =============================================================================

use aho_corasick::AhoCorasick;
use std::sync::LazyLock;

use crate::models::Sentiment;

static POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "love", "amazing", "wonderful", "happy",
    "fantastic", "awesome", "perfect",
];

static NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "hate", "horrible", "worst", "poor",
    "disappointing", "broken", "useless",
];

static POSITIVE_AUTOMATON: LazyLock<AhoCorasick> = LazyLock::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(POSITIVE_WORDS)
        .expect("positive lexicon failed to compile")
});

static NEGATIVE_AUTOMATON: LazyLock<AhoCorasick> = LazyLock::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(NEGATIVE_WORDS)
        .expect("negative lexicon failed to compile")
});

/// Label normalized text positive, negative, or neutral by comparing
/// substring-occurrence counts of the two lexicons.
pub fn analyze_sentiment(normalized: &str) -> Sentiment {
    let positive_hits = POSITIVE_AUTOMATON.find_overlapping_iter(normalized).count();
    let negative_hits = NEGATIVE_AUTOMATON.find_overlapping_iter(normalized).count();

    if positive_hits > negative_hits {
        Sentiment::Positive
    } else if negative_hits > positive_hits {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}
