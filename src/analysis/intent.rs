// =============================================================================
// intent.rs — THE BUYING-INTENT DETECTOR
// =============================================================================
//
// This module is where we do the actual "is this reader about to spend
// money?" determination. And we do it FAST, with the same machinery an
// antivirus scanner uses to find malware signatures: an Aho-Corasick
// automaton that matches every intent term simultaneously in a single
// pass over the text. We're using antivirus-grade technology to detect
// people comparison-shopping for headphones. Let that sink in.
//
// One deliberate quirk, inherited and kept ON PURPOSE: matches are raw
// SUBSTRING occurrences, not word-boundary hits. "deal" matches inside
// "ordeal". Correcting it would silently shift every stored score, so the
// overlapping iterator below reproduces exact per-term substring counts.
// =============================================================================

use aho_corasick::AhoCorasick;
use std::sync::LazyLock;
use tracing::debug;

/// The weighted intent lexicon. Terms that practically ARE a purchase
/// ("buy", "purchase") weigh ten; research-phase terms taper down to
/// four; the long tail of commerce vocabulary defaults to one.
static INTENT_LEXICON: &[(&str, u32)] = &[
    ("buy", 10),
    ("purchase", 10),
    ("best", 8),
    ("deal", 8),
    ("discount", 7),
    ("review", 7),
    ("recommend", 6),
    ("compare", 6),
    ("vs", 5),
    ("guide", 4),
    // Weight-1 background noise of commerce. Individually weak,
    // collectively a signal.
    ("cheap", 1),
    ("price", 1),
    ("sale", 1),
    ("shop", 1),
    ("order", 1),
    ("coupon", 1),
    ("affordable", 1),
    ("worth", 1),
];

/// Accumulated weighted score is squashed into [0,1] by dividing by this.
const SCORE_CEILING: f64 = 100.0;

/// Product-type words that turn the token before them into a mention:
/// "gaming laptop", "wireless headphones".
static PRODUCT_TYPES: &[&str] = &[
    "phone", "laptop", "camera", "headphones", "watch", "tablet", "speaker",
];

/// Brand words that turn the token after them into a mention:
/// "sony wh1000", "nike pegasus".
static BRANDS: &[&str] = &["iphone", "samsung", "apple", "sony", "nike", "adidas"];

/// The intent automaton. Built once, used forever. Matches all lexicon
/// terms in one pass; `m.pattern()` indexes back into INTENT_LEXICON for
/// the weight.
static INTENT_AUTOMATON: LazyLock<AhoCorasick> = LazyLock::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(INTENT_LEXICON.iter().map(|(term, _)| *term))
        .expect("intent lexicon failed to compile into an automaton")
});

/// Score how commercially motivated a page reads, in [0,1].
///
/// Every substring occurrence of every lexicon term contributes its
/// weight; the raw sum is divided by 100 and capped at 1.0. The
/// overlapping iterator is load-bearing: leftmost-first matching would
/// drop occurrences where two terms overlap in the text, and the counts
/// would stop being "independent substring counts per term".
pub fn score_intent(normalized: &str) -> f64 {
    if normalized.is_empty() {
        return 0.0;
    }

    let mut raw_score: u64 = 0;
    for m in INTENT_AUTOMATON.find_overlapping_iter(normalized) {
        raw_score += u64::from(INTENT_LEXICON[m.pattern().as_usize()].1);
    }

    let score = (raw_score as f64 / SCORE_CEILING).min(1.0);

    debug!(
        raw_score = raw_score,
        score = format!("{:.3}", score),
        "intent scan complete"
    );

    score
}

/// Scan for literal product mentions.
///
/// Three independent patterns:
///   (a) `<word>` followed by a product-type word — over normalized tokens
///   (b) a brand word followed by `<word>` — over normalized tokens
///   (c) `$` immediately followed by digits — over the RAW text, because
///       normalization strips the dollar sign before anyone can see it
///
/// Results are de-duplicated and keep first-seen order.
pub fn scan_product_mentions(normalized: &str, raw: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    let mut push_unique = |m: String| {
        if !mentions.contains(&m) {
            mentions.push(m);
        }
    };

    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    for pair in tokens.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        if PRODUCT_TYPES.contains(&second) {
            push_unique(format!("{first} {second}"));
        }
        if BRANDS.contains(&first) {
            push_unique(format!("{first} {second}"));
        }
    }

    // Dollar amounts, straight off the raw bytes. '$' and digits are
    // single-byte UTF-8, so byte slicing here can't split a code point.
    let bytes = raw.as_bytes();
    for dollar_at in memchr::memchr_iter(b'$', bytes) {
        let digits_end = bytes[dollar_at + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits_end > 0 {
            push_unique(raw[dollar_at..dollar_at + 1 + digits_end].to_string());
        }
    }

    mentions
}
