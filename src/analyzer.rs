// =============================================================================
// analyzer.rs — THE PIPELINE ASSEMBLY LINE
// =============================================================================
//
// One normalized pass of the text feeds four independent scorers plus the
// fingerprinter, and the results snap together into a ContentAnalysis.
// Everything here is pure: call it twice with the same strings and you get
// the same struct, bit for bit. That property is not an aspiration, it's
// a test (see below), and it's what makes "no retries in the core" a
// sound policy — retrying a deterministic function is just cardio.
//
// The impure garnish (row id, website id, timestamp) gets bolted on later
// by `into_record`, at the boundary where purity was always going to die.
// =============================================================================

use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::analysis::{category, fingerprint, intent, quality, sentiment, tokenizer};
use crate::models::{new_row_id, AnalysisResult, Sentiment};

/// The pure output of the analysis pipeline — every field a deterministic
/// function of `(title, content)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentAnalysis {
    /// Fingerprint of the CONTENT only. The title feeds the keywords and
    /// scores but never the hash, so retitled pages dedup together.
    pub content_hash: String,
    pub keywords: Vec<String>,
    pub product_mentions: Vec<String>,
    pub quality_score: u8,
    pub category: String,
    pub buying_intent_score: f64,
    pub sentiment: Sentiment,
}

impl ContentAnalysis {
    /// Attach the request context and mint the persistable row.
    pub fn into_record(self, website_id: &str, content_url: &str) -> AnalysisResult {
        AnalysisResult {
            id: new_row_id(),
            website_id: website_id.to_string(),
            content_url: content_url.to_string(),
            content_hash: self.content_hash,
            keywords: self.keywords,
            product_mentions: self.product_mentions,
            quality_score: self.quality_score,
            category: self.category,
            buying_intent_score: self.buying_intent_score,
            sentiment: self.sentiment,
            analyzed_at: Utc::now(),
        }
    }
}

/// Run the whole pipeline over one page.
///
/// Tokenizer first, then the four scorers over the shared normalized
/// text, then the fingerprint over the raw content. Empty input is a
/// fully valid page that scores zero on everything.
pub fn analyze(title: &str, content: &str) -> ContentAnalysis {
    let normalized = tokenizer::normalize(title, content);
    let word_count = tokenizer::word_count(&normalized);
    let keywords = tokenizer::extract_keywords(&normalized);

    let raw_combined = format!("{} {}", title, content);
    let buying_intent_score = intent::score_intent(&normalized);
    let product_mentions = intent::scan_product_mentions(&normalized, &raw_combined);

    let analysis = ContentAnalysis {
        content_hash: fingerprint::fingerprint(content),
        quality_score: quality::score_quality(word_count, keywords.len()),
        category: category::categorize(&normalized),
        buying_intent_score,
        sentiment: sentiment::analyze_sentiment(&normalized),
        product_mentions,
        keywords,
    };

    debug!(
        hash = %analysis.content_hash,
        keywords = analysis.keywords.len(),
        category = %analysis.category,
        intent = format!("{:.3}", analysis.buying_intent_score),
        quality = analysis.quality_score,
        "analysis complete"
    );

    analysis
}

/// Batch-analyze many pages in parallel with rayon.
///
/// Used by offline re-analysis jobs (catalog changed, lexicon tweaked,
/// somebody imported a year of page views). The per-page function is pure,
/// so fan-out is embarrassingly safe.
pub fn batch_analyze(pages: &[(String, String)]) -> Vec<ContentAnalysis> {
    pages
        .par_iter()
        .map(|(title, content)| analyze(title, content))
        .collect()
}
