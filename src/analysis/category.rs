// =============================================================================
// category.rs — THE TOPIC SORTING HAT
// =============================================================================
//
// Eight fixed categories, one automaton each, the category with the most
// keyword hits wins. No TF-IDF, no embeddings — count substring
// occurrences of every category keyword over the full text and compare
// totals.
//
// Two rules are contractual, not stylistic:
//   - A challenger replaces the leader only on a STRICT greater-than.
//     Ties keep the earlier-declared category, so declaration order below
//     is part of the scoring behavior. Do not alphabetize this table.
//   - All-zero totals mean "general", the category of pages about nothing
//     in particular.
// =============================================================================

use aho_corasick::AhoCorasick;
use std::sync::LazyLock;
use tracing::debug;

/// Fallback label when no category keyword appears at all.
pub const GENERAL: &str = "general";

/// Category table, in tie-break priority order.
static CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "technology",
        &[
            "laptop", "phone", "computer", "software", "gadget", "tech",
            "smartphone", "android", "processor", "camera",
        ],
    ),
    (
        "health",
        &[
            "fitness", "workout", "vitamin", "wellness", "doctor", "diet",
            "exercise", "nutrition", "medicine",
        ],
    ),
    (
        "fashion",
        &[
            "dress", "shoes", "clothing", "style", "outfit", "jeans",
            "jacket", "wardrobe", "sneaker",
        ],
    ),
    (
        "home",
        &[
            "furniture", "kitchen", "decor", "garden", "mattress", "bedroom",
            "appliance", "cleaning",
        ],
    ),
    (
        "travel",
        &[
            "flight", "hotel", "vacation", "destination", "luggage",
            "airline", "itinerary", "resort",
        ],
    ),
    (
        "food",
        &[
            "recipe", "restaurant", "cooking", "ingredients", "meal",
            "baking", "snack", "flavor",
        ],
    ),
    (
        "finance",
        &[
            "investing", "budget", "savings", "credit", "mortgage", "loan",
            "banking", "retirement",
        ],
    ),
    (
        "education",
        &[
            "course", "learning", "tutorial", "student", "teacher", "lesson",
            "textbook", "degree",
        ],
    ),
];

/// One automaton per category, built once in declaration order.
static CATEGORY_AUTOMATONS: LazyLock<Vec<(&'static str, AhoCorasick)>> = LazyLock::new(|| {
    CATEGORY_KEYWORDS
        .iter()
        .map(|(name, keywords)| {
            let automaton = AhoCorasick::builder()
                .ascii_case_insensitive(true)
                .build(*keywords)
                .unwrap_or_else(|_| panic!("category '{name}' keywords failed to compile"));
            (*name, automaton)
        })
        .collect()
});

/// Assign the single best-matching topical category to normalized text.
///
/// Substring semantics throughout — "budget" inside "budgeting" counts,
/// same as every other scorer in this pipeline. Overlapping iteration
/// keeps per-keyword counts independent of each other.
pub fn categorize(normalized: &str) -> String {
    let mut best: &str = GENERAL;
    let mut best_hits: usize = 0;

    for (name, automaton) in CATEGORY_AUTOMATONS.iter() {
        let hits = automaton.find_overlapping_iter(normalized).count();
        // Strict > — ties keep the earlier-declared category.
        if hits > best_hits {
            best = name;
            best_hits = hits;
        }
    }

    debug!(category = best, hits = best_hits, "category scan complete");
    best.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tokenizer::normalize;

    #[test]
    fn test_no_category_keywords_falls_back_to_general() {
        assert_eq!(categorize(&normalize("", "rain fell on the quiet pier")), GENERAL);
    }

    #[test]
    fn test_empty_text_is_general() {
        assert_eq!(categorize(""), GENERAL);
    }

    #[test]
    fn test_clear_winner() {
        let text = normalize("", "this laptop has a fast processor and great software");
        assert_eq!(categorize(&text), "technology");
    }

    #[test]
    fn test_tie_keeps_first_declared_category() {
        // One technology hit ("laptop"), one finance hit ("budget").
        // technology is declared first, so a tie stays with it.
        let text = normalize("", "a laptop on a budget");
        assert_eq!(categorize(&text), "technology");
    }

    #[test]
    fn test_later_category_wins_on_strict_majority() {
        let text = normalize("", "recipe for a meal with secret ingredients");
        assert_eq!(categorize(&text), "food");
    }

    #[test]
    fn test_substring_hits_count() {
        // "budgeting" contains "budget" — substring semantics are the contract.
        let text = normalize("", "budgeting budgeting budgeting");
        assert_eq!(categorize(&text), "finance");
    }
}
