// =============================================================================
// registry.rs — THE REDIS-BACKED WEBSITE REGISTRY CLIENT
// =============================================================================
//
// The dashboard monolith owns the websites table. Rather than hand this
// engine database credentials (no), the dashboard mirrors every website
// into a Redis hash keyed by integration key, and we HGET our way to an
// auth decision. One round trip, no SQL, no shared schema.
//
// Field layout, written by the dashboard:
//   HSET aff_intel:websites <integration_key> '{"id":..,"account_id":..,"status":..}'
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::collaborators::WebsiteRegistry;
use crate::config::Config;
use crate::models::Website;

pub struct RedisWebsiteRegistry {
    con: ConnectionManager,
    websites_key: String,
}

impl RedisWebsiteRegistry {
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str())
            .context("invalid redis URL for website registry")?;
        let con = ConnectionManager::new(client)
            .await
            .context("failed to connect website registry to redis")?;

        info!(
            websites_key = %config.websites_hash_key,
            "website registry connected"
        );

        Ok(Self {
            con,
            websites_key: config.websites_hash_key.clone(),
        })
    }
}

#[async_trait]
impl WebsiteRegistry for RedisWebsiteRegistry {
    async fn resolve(&self, integration_key: &str) -> Result<Option<Website>> {
        let mut con = self.con.clone();
        let raw: Option<String> = con
            .hget(&self.websites_key, integration_key)
            .await
            .context("registry HGET failed")?;

        let Some(raw) = raw else {
            debug!("integration key not found in registry");
            return Ok(None);
        };

        let website: Website = serde_json::from_str(&raw)
            .context("registry returned a website row we couldn't parse")?;
        Ok(Some(website))
    }
}
