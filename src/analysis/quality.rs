// =============================================================================
// quality.rs — THE CONTENT QUALITY SCORER
// =============================================================================
//
// Two halves, fifty points each:
//   length:  min(words / 1000, 1) * 50  — a thousand words is a "full" page
//   density: min((keywords / words) * 1000, 50) — salient-term concentration
//
// Zero words means zero everywhere, including the density guard, because
// dividing by an empty page is how NaN gets into a database.
// =============================================================================

/// Words considered a "full-length" page for the length half.
const FULL_LENGTH_WORDS: f64 = 1000.0;

/// Blend word count and keyword-list length into an integer 0..=100.
pub fn score_quality(word_count: usize, keyword_count: usize) -> u8 {
    let length_score = (word_count as f64 / FULL_LENGTH_WORDS).min(1.0) * 50.0;

    let density_score = if word_count == 0 {
        0.0
    } else {
        ((keyword_count as f64 / word_count as f64) * 1000.0).min(50.0)
    };

    // Both halves are bounded at 50, so the rounded sum stays in 0..=100.
    (length_score + density_score).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_page_scores_zero() {
        assert_eq!(score_quality(0, 0), 0);
    }

    #[test]
    fn test_zero_words_guards_density() {
        // Nonsense input (keywords without words) must not divide by zero.
        assert_eq!(score_quality(0, 5), 0);
    }

    #[test]
    fn test_length_half_saturates_at_a_thousand_words() {
        assert_eq!(score_quality(1000, 0), 50);
        assert_eq!(score_quality(50_000, 0), 50);
    }

    #[test]
    fn test_density_half_saturates() {
        // 20 keywords over 100 words: density = 200, capped at 50.
        // length = 100/1000 * 50 = 5.
        assert_eq!(score_quality(100, 20), 55);
    }

    #[test]
    fn test_mid_range_blend() {
        // 500 words, 10 keywords: length = 25, density = 20 -> 45.
        assert_eq!(score_quality(500, 10), 45);
    }

    #[test]
    fn test_bounds_hold_for_everything() {
        for words in [0usize, 1, 3, 999, 1000, 10_000] {
            for keywords in [0usize, 1, 20] {
                let score = score_quality(words, keywords);
                assert!(score <= 100);
            }
        }
    }
}
