//! On-disk copy of the last catalog downloaded from a URL.
//!
//! A fresh copy saves the download at startup. An expired copy is kept
//! around as a fallback for when the download itself fails.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::CatalogError;
use super::snapshot::CatalogDocument;

/// Default cache TTL: 24 hours.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// What is written to the cache file.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// Unix timestamp (seconds) of the download.
    saved_at: i64,
    /// URL the document came from.
    source: String,
    document: CatalogDocument,
}

/// Configuration for the catalog disk cache.
#[derive(Debug, Clone)]
pub struct CatalogCacheConfig {
    /// Path to the cache file.
    pub path: PathBuf,
    /// How long a cached document counts as fresh.
    pub ttl: Duration,
}

impl CatalogCacheConfig {
    /// Cache at `path` with the default TTL (24 hours).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for CatalogCacheConfig {
    fn default() -> Self {
        Self::new("catalog_cache.json")
    }
}

/// Outcome of looking up the cache.
#[derive(Debug)]
pub enum CacheLookup {
    /// Valid document younger than the TTL.
    Fresh(CatalogDocument),
    /// Valid document past its TTL.
    Stale(CatalogDocument),
    /// Nothing usable for this source.
    Miss,
}

/// Disk cache for a remote catalog document.
///
/// Only documents that pass [`CatalogDocument::validate`] are written or
/// returned, so a hit can always be built into a snapshot.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    config: CatalogCacheConfig,
}

impl CatalogCache {
    pub fn new(config: CatalogCacheConfig) -> Self {
        Self { config }
    }

    /// Look up the document cached for `source`.
    ///
    /// A missing, unreadable or invalid file, or one written for another
    /// source, is a miss.
    pub async fn lookup(&self, source: &str) -> CacheLookup {
        let contents = match tokio::fs::read_to_string(&self.config.path).await {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %self.config.path.display(), error = %e, "no catalog cache");
                return CacheLookup::Miss;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %self.config.path.display(), error = %e, "unreadable catalog cache");
                return CacheLookup::Miss;
            }
        };

        if entry.source != source {
            debug!(cached = %entry.source, source, "catalog cache is for another source");
            return CacheLookup::Miss;
        }

        if let Err(e) = entry.document.validate() {
            warn!(path = %self.config.path.display(), error = %e, "invalid catalog cache");
            return CacheLookup::Miss;
        }

        let age_secs = Utc::now().timestamp().saturating_sub(entry.saved_at);
        if age_secs < 0 || age_secs as u64 >= self.config.ttl.as_secs() {
            CacheLookup::Stale(entry.document)
        } else {
            CacheLookup::Fresh(entry.document)
        }
    }

    /// Save a document downloaded from `source`.
    ///
    /// The entry is written to a temporary file next to the cache and then
    /// renamed over it, so readers never see a partial file.
    pub async fn save(&self, source: &str, document: &CatalogDocument) -> Result<(), CatalogError> {
        document.validate()?;

        let entry = CacheEntry {
            saved_at: Utc::now().timestamp(),
            source: source.to_string(),
            document: document.clone(),
        };
        let json = serde_json::to_string(&entry).map_err(|e| CatalogError::Cache {
            message: format!("failed to serialize cache: {e}"),
        })?;

        let path = &self.config.path;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CatalogError::Cache {
                    message: format!("failed to create cache directory: {e}"),
                })?;
        }

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, json)
            .await
            .map_err(|e| CatalogError::Cache {
                message: format!("failed to write cache file: {e}"),
            })?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| CatalogError::Cache {
                message: format!("failed to replace cache file: {e}"),
            })?;

        debug!(path = %path.display(), stations = document.stations.len(), "saved catalog cache");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }
}
