// =============================================================================
// record_store.rs — THE REDIS-BACKED ANALYSIS LEDGER
// =============================================================================
//
// One analysis row per (website, content hash), stored as JSON at a
// deterministic key, plus a sorted-set index scored by analysis timestamp
// so the dashboard can render "recent analyses" without a key scan.
//
// Writes are idempotent on purpose: SETting the same key with the same
// page's analysis twice leaves the world exactly as it was, which is the
// whole point of keying rows by content fingerprint.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::collaborators::RecordStore;
use crate::config::Config;
use crate::models::AnalysisResult;

pub struct RedisRecordStore {
    con: ConnectionManager,
    records_key_prefix: String,
    records_index_key: String,
}

impl RedisRecordStore {
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str())
            .context("invalid redis URL for record store")?;
        let con = ConnectionManager::new(client)
            .await
            .context("failed to connect record store to redis")?;

        info!(
            prefix = %config.records_key_prefix,
            index = %config.records_index_key,
            "record store connected"
        );

        Ok(Self {
            con,
            records_key_prefix: config.records_key_prefix.clone(),
            records_index_key: config.records_index_key.clone(),
        })
    }

    fn record_key(&self, website_id: &str, content_hash: &str) -> String {
        format!("{}:{}:{}", self.records_key_prefix, website_id, content_hash)
    }
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    async fn find(&self, website_id: &str, content_hash: &str) -> Result<Option<AnalysisResult>> {
        let mut con = self.con.clone();
        let key = self.record_key(website_id, content_hash);
        let raw: Option<String> = con.get(&key).await.context("record store GET failed")?;

        match raw {
            None => Ok(None),
            Some(json) => {
                let record: AnalysisResult = serde_json::from_str(&json)
                    .context("stored analysis row failed to parse")?;
                Ok(Some(record))
            }
        }
    }

    async fn insert(&self, record: &AnalysisResult) -> Result<()> {
        let mut con = self.con.clone();
        let key = self.record_key(&record.website_id, &record.content_hash);
        let json = serde_json::to_string(record).context("failed to serialize analysis row")?;

        let _: () = con
            .set(&key, &json)
            .await
            .context("record store SET failed")?;

        // Index by timestamp so "recent analyses" is a ZRANGE, not a SCAN.
        let score = record.analyzed_at.timestamp() as f64;
        let _: () = con
            .zadd(&self.records_index_key, &key, score)
            .await
            .context("record store ZADD failed")?;

        debug!(key = %key, row_id = %record.id, "analysis row persisted");
        Ok(())
    }
}
