//! Catalog document loading from a local file or a URL.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::cache::{CacheLookup, CatalogCache, CatalogCacheConfig};
use super::error::CatalogError;
use super::snapshot::CatalogDocument;

/// Default request timeout for remote catalogs.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the catalog document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Url(String),
}

impl CatalogSource {
    /// Treat `http://` and `https://` locations as URLs, anything else as a path.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            CatalogSource::Url(location.to_string())
        } else {
            CatalogSource::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::File(path) => write!(f, "{}", path.display()),
            CatalogSource::Url(url) => f.write_str(url),
        }
    }
}

/// Configuration for the catalog loader.
#[derive(Debug, Clone)]
pub struct CatalogLoaderConfig {
    pub source: CatalogSource,
    /// Request timeout in seconds for URL sources
    pub timeout_secs: u64,
    /// Disk cache for URL sources
    pub cache: Option<CatalogCacheConfig>,
}

impl CatalogLoaderConfig {
    pub fn new(source: CatalogSource) -> Self {
        Self {
            source,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache: None,
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Cache downloaded documents on disk.
    pub fn with_cache(mut self, cache: CatalogCacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }
}

/// Loads catalog documents from the configured source.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    http: reqwest::Client,
    source: CatalogSource,
    cache: Option<CatalogCache>,
}

impl CatalogLoader {
    pub fn new(config: CatalogLoaderConfig) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            source: config.source,
            cache: config.cache.map(CatalogCache::new),
        })
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// Load the document, preferring a fresh disk cache for URL sources.
    ///
    /// If the download fails and the cache holds an expired copy for the same
    /// URL, that copy is used instead.
    pub async fn load(&self) -> Result<CatalogDocument, CatalogError> {
        let (CatalogSource::Url(url), Some(cache)) = (&self.source, &self.cache) else {
            return self.fetch().await;
        };

        let stale = match cache.lookup(url).await {
            CacheLookup::Fresh(document) => {
                info!(
                    cache = %cache.path().display(),
                    stations = document.stations.len(),
                    "loaded catalog from disk cache"
                );
                return Ok(document);
            }
            CacheLookup::Stale(document) => Some(document),
            CacheLookup::Miss => None,
        };

        match (self.fetch().await, stale) {
            (Ok(document), _) => Ok(document),
            (Err(e), Some(document)) => {
                warn!(
                    error = %e,
                    cache = %cache.path().display(),
                    "catalog download failed, using expired disk cache"
                );
                Ok(document)
            }
            (Err(e), None) => Err(e),
        }
    }

    /// Load the document from the source itself, bypassing the cache.
    pub async fn fetch(&self) -> Result<CatalogDocument, CatalogError> {
        match &self.source {
            CatalogSource::File(path) => read_file(path).await,
            CatalogSource::Url(url) => {
                let document = self.fetch_url(url).await?;
                if let Some(cache) = &self.cache
                    && let Err(e) = cache.save(url, &document).await
                {
                    warn!(error = %e, "failed to write catalog cache");
                }
                Ok(document)
            }
        }
    }

    async fn fetch_url(&self, url: &str) -> Result<CatalogDocument, CatalogError> {
        debug!(%url, "fetching catalog");
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        CatalogDocument::from_json(&body)
    }
}

async fn read_file(path: &Path) -> Result<CatalogDocument, CatalogError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    CatalogDocument::from_json(&json)
}
