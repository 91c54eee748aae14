//! Persistent store of raw Open-Meteo bodies, one per mountain and fetch date

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use fjall::Keyspace;
use serde::{Deserialize, Serialize};
use tokio::task;
use tracing::debug;

use crate::models::Mountain;

#[derive(Serialize, Deserialize)]
struct CachedForecast {
    body: String,
    /// Unix timestamp in milliseconds
    expires_at: i64,
}

/// Forecast bodies keyed by [`Mountain::cache_key`]
#[derive(Clone)]
pub struct ForecastCache {
    store: Keyspace,
}

fn read_entry(store: Keyspace, key: String) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key.into_bytes())?.map(|v| v.to_vec()))
}

fn entry_key(mountain: &Mountain, date: NaiveDate) -> String {
    mountain.cache_key(&date.to_string())
}

impl ForecastCache {
    /// Open (or create) the cache database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = fjall::Database::builder(path)
            .open()
            .with_context(|| format!("Failed to open forecast cache at {}", path.display()))?;
        let store = db.keyspace("forecasts", fjall::KeyspaceCreateOptions::default)?;
        Ok(Self { store })
    }

    /// Keep `body` as the forecast of `mountain` fetched on `date` for `ttl`
    #[tracing::instrument(
        level = "debug",
        skip(self, mountain, body),
        fields(mountain = %mountain.name())
    )]
    pub async fn store_forecast(
        &self,
        mountain: &Mountain,
        date: NaiveDate,
        body: String,
        ttl: Duration,
    ) -> Result<()> {
        let expires_at = Utc::now()
            .checked_add_signed(chrono::Duration::from_std(ttl)?)
            .context("Forecast TTL overflows the clock")?
            .timestamp_millis();
        let bytes = postcard::to_stdvec(&CachedForecast { body, expires_at })?;

        let store = self.store.clone();
        let key = entry_key(mountain, date);
        task::spawn_blocking(move || store.insert(key.into_bytes(), bytes)).await??;
        Ok(())
    }

    /// Fresh body for `mountain` on `date`, if any. Expired entries are evicted.
    #[tracing::instrument(
        level = "debug",
        skip(self, mountain),
        fields(mountain = %mountain.name())
    )]
    pub async fn load_forecast(
        &self,
        mountain: &Mountain,
        date: NaiveDate,
    ) -> Result<Option<String>> {
        let store = self.store.clone();
        let key = entry_key(mountain, date);
        let Some(bytes) = task::spawn_blocking(move || read_entry(store, key)).await?? else {
            debug!("No cached forecast");
            return Ok(None);
        };

        let entry: CachedForecast = postcard::from_bytes(&bytes)?;
        if Utc::now().timestamp_millis() < entry.expires_at {
            debug!("Cached forecast still fresh");
            Ok(Some(entry.body))
        } else {
            debug!("Cached forecast expired");
            self.evict(mountain, date).await?;
            Ok(None)
        }
    }

    pub async fn evict(&self, mountain: &Mountain, date: NaiveDate) -> Result<()> {
        let store = self.store.clone();
        let key = entry_key(mountain, date);
        task::spawn_blocking(move || store.remove(key.into_bytes())).await??;
        Ok(())
    }
}
