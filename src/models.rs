// =============================================================================
// models.rs — THE SACRED DATA STRUCTURES OF CONSUMER DESIRE
// =============================================================================
//
// These structs represent the fundamental building blocks of our content
// intelligence system. Each field has been carefully chosen to capture every
// conceivable signal that a reader is about to click "add to cart."
//
// Is it overkill to have a buying-intent score on a blog post about socks?
// Yes. Do we care? Absolutely not.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Buying-intent scores above this line mean a popup is worth showing.
/// Below it, the reader is just reading. Let them read.
pub const HIGH_INTENT_THRESHOLD: f64 = 0.6;

/// We never show more than five recommendations. Six would be a bazaar.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// The inbound page-view beacon, exactly as the embed script sends it.
/// `integration_key` and `content` are the only required fields — everything
/// else is optional garnish from whatever browser fired the beacon.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub integration_key: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A registered website as the Website Registry hands it to us.
/// The registry is owned by the dashboard side of the house; we only
/// ever read these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Website {
    pub id: String,
    /// The account that owns this website. Catalog queries are scoped to it.
    pub account_id: String,
    pub status: WebsiteStatus,
}

/// A website is either paying us or it isn't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebsiteStatus {
    Active,
    Inactive,
}

impl fmt::Display for WebsiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebsiteStatus::Active => write!(f, "active"),
            WebsiteStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Coarse sentiment label. Three buckets is all the nuance a popup needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

/// The main deliverable. One of these gets minted per analyzed page and
/// persisted as a single row in the Record Store, keyed for dedup by
/// `(website_id, content_hash)`. Immutable after creation — analysis is
/// a pure function of the text, so there is nothing to update.
///
/// Is having eleven fields on a "we read your blog post" struct overkill?
/// The answer is no. We could easily justify thirty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// A UUID v4 for this specific row. Because even a sock review
    /// deserves to feel unique and special.
    pub id: String,

    /// Which registered website the page belongs to.
    pub website_id: String,

    /// The page URL as reported by the beacon. Not validated beyond
    /// "it's a string" — browsers lie about weirder things.
    pub content_url: String,

    /// Deterministic base-36 fingerprint of the raw content. Same bytes,
    /// same hash, every time. NOT a security token — it's a coat-check
    /// ticket, and a forgeable one at that.
    pub content_hash: String,

    /// Top salient terms, at most twenty, ordered by descending frequency
    /// with ties broken by first appearance in the text.
    pub keywords: Vec<String>,

    /// Literal product-looking phrases we spotted: "gaming laptop",
    /// "sony headphones", "$499". First-seen order, de-duplicated.
    pub product_mentions: Vec<String>,

    /// Blended length + keyword-density score, 0..=100.
    pub quality_score: u8,

    /// One of the eight fixed categories, or "general" when the page
    /// matched none of them.
    pub category: String,

    /// Heuristic [0,1] estimate that the reader is in shopping mode.
    /// 1.0 = "they have the credit card out"
    /// 0.5 = "comparison-shopping, probably"
    /// 0.0 = "this is a poem about autumn"
    pub buying_intent_score: f64,

    pub sentiment: Sentiment,

    /// When OUR engine analyzed the page. The page itself has no opinion.
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Whether this page crossed the popup line.
    pub fn has_high_intent(&self) -> bool {
        self.buying_intent_score > HIGH_INTENT_THRESHOLD
    }

    /// Idempotency key for the dedup engine and the Record Store.
    /// One row per `(website, content fingerprint)` — re-analyzing the
    /// same page produces the same row, so storing it twice would be
    /// a waste of everyone's time.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}", self.website_id, self.content_hash)
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} — {} (intent: {:.1}%, quality: {}, {})",
            self.id,
            self.content_url,
            self.category,
            self.buying_intent_score * 100.0,
            self.quality_score,
            self.sentiment,
        )
    }
}

/// An affiliate product as the Product Catalog hands it to us.
/// Already scoped to the requesting website's owning account — the
/// catalog does the tenancy math, we just rank what it returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCandidate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Percentage, e.g. 12.5. Yes, commission nudges the ranking.
    /// We are an affiliate company. This surprises no one.
    pub commission_rate: f64,
}

/// A catalog product plus the score that earned it a slot.
/// Lists of these are always ordered descending by `relevance_score`
/// and capped at [`MAX_RECOMMENDATIONS`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRecommendation {
    #[serde(flatten)]
    pub product: ProductCandidate,
    pub relevance_score: f64,
}

/// What the beacon gets back on success.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeResponse {
    pub success: bool,
    pub analysis: AnalysisResult,
    pub recommendations: Vec<RankedRecommendation>,
    /// `buying_intent_score > 0.6`. The popup-trigger decision lives
    /// downstream; we just hand it the verdict.
    pub should_create_popup: bool,
}

impl IntakeResponse {
    pub fn new(analysis: AnalysisResult, recommendations: Vec<RankedRecommendation>) -> Self {
        let should_create_popup = analysis.has_high_intent();
        Self {
            success: true,
            analysis,
            recommendations,
            should_create_popup,
        }
    }
}

/// Mint a fresh row id. Pulled into a helper so the handler doesn't
/// sprinkle `Uuid::new_v4` calls around.
pub fn new_row_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_analysis() -> AnalysisResult {
        AnalysisResult {
            id: new_row_id(),
            website_id: "site_1".into(),
            content_url: "https://example.com/post".into(),
            content_hash: "k3j2a9".into(),
            keywords: vec![],
            product_mentions: vec![],
            quality_score: 0,
            category: "general".into(),
            buying_intent_score: 0.0,
            sentiment: Sentiment::Neutral,
            analyzed_at: Utc::now(),
        }
    }

    #[test]
    fn test_dedup_key_combines_website_and_hash() {
        assert_eq!(blank_analysis().dedup_key(), "site_1:k3j2a9");
    }

    #[test]
    fn test_high_intent_is_strictly_above_threshold() {
        let mut analysis = blank_analysis();
        analysis.buying_intent_score = 0.6;
        assert!(!analysis.has_high_intent());
        analysis.buying_intent_score = 0.61;
        assert!(analysis.has_high_intent());
    }

    #[test]
    fn test_page_view_request_deserializes_camel_case() {
        let req: PageViewRequest = serde_json::from_str(
            r#"{"url":"https://a.com","title":"t","content":"c","integrationKey":"key","userId":"u1"}"#,
        )
        .unwrap();
        assert_eq!(req.integration_key, "key");
        assert_eq!(req.user_id.as_deref(), Some("u1"));
        assert_eq!(req.session_id, None);
    }

    #[test]
    fn test_ranked_recommendation_flattens_product_fields() {
        let rec = RankedRecommendation {
            product: ProductCandidate {
                id: "p1".into(),
                name: "Budget Laptop".into(),
                description: "A laptop".into(),
                category: "technology".into(),
                commission_rate: 10.0,
            },
            relevance_score: 7.5,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["name"], "Budget Laptop");
        assert_eq!(json["relevanceScore"], 7.5);
    }
}
