// =============================================================================
// recommender.rs — THE PRODUCT MATCHMAKER
// =============================================================================
//
// Given the keywords and category a page earned, and the catalog products
// the account is allowed to promote, pick the five most plausible things
// to put in front of the reader.
//
// Scoring is a transparent three-term sum, by design — when an account
// manager asks "why did the sock page recommend a blender", the answer
// has to fit in one sentence:
//
//   2 points per keyword found in the product's name+description
//   5 points if the page category appears inside the product category
//   0.1 points per percent of commission (yes, commission is a tiebreaker;
//       no, it never outruns an actual keyword match)
//
// The sort is stable, so equal scores keep catalog order, which keeps
// the whole ranking reproducible run to run.
// =============================================================================

use tracing::debug;

use crate::models::{ProductCandidate, RankedRecommendation, MAX_RECOMMENDATIONS};

/// Weight for each keyword that appears in the product text.
const KEYWORD_MATCH_WEIGHT: f64 = 2.0;
/// Flat bonus when the page category is a substring of the product category.
const CATEGORY_MATCH_BONUS: f64 = 5.0;
/// Multiplier applied to the product's commission percentage.
const COMMISSION_WEIGHT: f64 = 0.1;

/// Rank catalog candidates against a page's extracted signals.
///
/// Candidates with zero keyword overlap are filtered out entirely — a
/// category match alone does not earn a popup slot. An empty result is a
/// perfectly normal answer meaning "nothing to show", and callers must
/// treat it that way rather than as a failure.
pub fn recommend(
    keywords: &[String],
    page_category: &str,
    candidates: &[ProductCandidate],
) -> Vec<RankedRecommendation> {
    let mut ranked: Vec<RankedRecommendation> = candidates
        .iter()
        .filter_map(|candidate| {
            let haystack = format!("{} {}", candidate.name, candidate.description).to_lowercase();

            let keyword_matches = keywords
                .iter()
                .filter(|k| haystack.contains(k.to_lowercase().as_str()))
                .count();

            // The filter gate: no keyword overlap, no slot.
            if keyword_matches == 0 {
                return None;
            }

            let category_bonus = if candidate
                .category
                .to_lowercase()
                .contains(&page_category.to_lowercase())
            {
                CATEGORY_MATCH_BONUS
            } else {
                0.0
            };

            let relevance_score = KEYWORD_MATCH_WEIGHT * keyword_matches as f64
                + category_bonus
                + COMMISSION_WEIGHT * candidate.commission_rate;

            Some(RankedRecommendation {
                product: candidate.clone(),
                relevance_score,
            })
        })
        .collect();

    // Stable sort: equal scores preserve catalog order.
    ranked.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(MAX_RECOMMENDATIONS);

    debug!(
        candidates = candidates.len(),
        recommended = ranked.len(),
        "recommendation ranking complete"
    );

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, description: &str, category: &str, rate: f64) -> ProductCandidate {
        ProductCandidate {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            category: category.into(),
            commission_rate: rate,
        }
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_scenario_d_no_overlap_returns_empty() {
        let candidates = vec![product("p1", "Cast Iron Pan", "A pan for cooking", "home", 8.0)];
        assert!(recommend(&kw(&["laptop", "processor"]), "technology", &candidates).is_empty());
    }

    #[test]
    fn test_keyword_overlap_is_case_insensitive() {
        let candidates = vec![product("p1", "UltraBook LAPTOP Pro", "Fast and light", "technology", 0.0)];
        let ranked = recommend(&kw(&["laptop"]), "general", &candidates);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].relevance_score, 2.0);
    }

    #[test]
    fn test_score_composition() {
        // 2 keyword matches (laptop, gaming) + category bonus + 0.1 * 10
        let candidates = vec![product(
            "p1",
            "Gaming Laptop",
            "A gaming laptop with a big fan",
            "technology",
            10.0,
        )];
        let ranked = recommend(&kw(&["laptop", "gaming", "quiet"]), "technology", &candidates);
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].relevance_score - (2.0 * 2.0 + 5.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_category_bonus_is_substring_based() {
        let candidates = vec![
            product("a", "Laptop Sleeve", "laptop sleeve", "consumer-technology-accessories", 0.0),
            product("b", "Laptop Sticker", "laptop sticker", "stationery", 0.0),
        ];
        let ranked = recommend(&kw(&["laptop"]), "technology", &candidates);
        assert_eq!(ranked[0].product.id, "a");
        assert_eq!(ranked[0].relevance_score, 7.0);
        assert_eq!(ranked[1].relevance_score, 2.0);
    }

    #[test]
    fn test_cap_at_five() {
        let candidates: Vec<ProductCandidate> = (0..9)
            .map(|i| product(&format!("p{i}"), "laptop thing", "a laptop", "technology", i as f64))
            .collect();
        let ranked = recommend(&kw(&["laptop"]), "technology", &candidates);
        assert_eq!(ranked.len(), MAX_RECOMMENDATIONS);
        // Highest commission first — it's the only differing term here.
        assert_eq!(ranked[0].product.id, "p8");
    }

    #[test]
    fn test_sorted_non_increasing_and_stable_on_ties() {
        let candidates = vec![
            product("first", "laptop", "laptop", "x", 1.0),
            product("second", "laptop", "laptop", "x", 1.0),
            product("third", "laptop laptop", "laptop", "x", 0.0),
        ];
        let ranked = recommend(&kw(&["laptop"]), "general", &candidates);
        for pair in ranked.windows(2) {
            assert!(pair[0].relevance_score >= pair[1].relevance_score);
        }
        // "first" and "second" tie at 2.1 — catalog order must survive.
        let tie_ids: Vec<&str> = ranked
            .iter()
            .filter(|r| (r.relevance_score - 2.1).abs() < 1e-9)
            .map(|r| r.product.id.as_str())
            .collect();
        assert_eq!(tie_ids, vec!["first", "second"]);
    }

    #[test]
    fn test_empty_catalog_is_fine() {
        assert!(recommend(&kw(&["laptop"]), "technology", &[]).is_empty());
    }
}
