//! Server configuration from `TRAIN_SEARCH_*` environment variables.
//!
//! | variable                          | default               |
//! |-----------------------------------|-----------------------|
//! | `TRAIN_SEARCH_CATALOG`            | `data/catalog.json`   |
//! | `TRAIN_SEARCH_CATALOG_CACHE`      | unset (no disk cache) |
//! | `TRAIN_SEARCH_FETCH_TIMEOUT_SECS` | `30`                  |
//! | `TRAIN_SEARCH_BIND`               | `127.0.0.1:3000`      |
//! | `TRAIN_SEARCH_REFRESH_SECS`       | `86400` (`0` = never) |
//! | `TRAIN_SEARCH_MAX_DISTANCE_KM`    | `600`                 |
//! | `TRAIN_SEARCH_BOX_DEGREES`        | `0.5`                 |
//! | `TRAIN_SEARCH_SLOT_STARTS`        | `00:00,08:00,12:00,16:00,20:00` |
//! | `TRAIN_SEARCH_CATALOG_TIMEOUT_MS` | `2000`                |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::{CatalogCacheConfig, CatalogLoaderConfig, CatalogSource};
use crate::search::{SearchConfig, SlotTable};

const DEFAULT_CATALOG: &str = "data/catalog.json";
const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REFRESH_SECS: u64 = 24 * 60 * 60;

/// Error from reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl ConfigError {
    fn new(var: &'static str, value: &str, reason: impl ToString) -> Self {
        Self {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog: CatalogSource,
    pub catalog_cache: Option<PathBuf>,
    pub fetch_timeout_secs: u64,
    pub bind: SocketAddr,
    /// `None` disables periodic refresh.
    pub refresh_interval: Option<Duration>,
    pub search: SearchConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let catalog = CatalogSource::parse(
            get("TRAIN_SEARCH_CATALOG")
                .as_deref()
                .unwrap_or(DEFAULT_CATALOG),
        );
        let catalog_cache = get("TRAIN_SEARCH_CATALOG_CACHE").map(PathBuf::from);

        let fetch_timeout_secs = parse_or(
            "TRAIN_SEARCH_FETCH_TIMEOUT_SECS",
            get("TRAIN_SEARCH_FETCH_TIMEOUT_SECS"),
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?;

        let bind_value = get("TRAIN_SEARCH_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_value
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::new("TRAIN_SEARCH_BIND", &bind_value, e))?;

        let refresh_secs = parse_or(
            "TRAIN_SEARCH_REFRESH_SECS",
            get("TRAIN_SEARCH_REFRESH_SECS"),
            DEFAULT_REFRESH_SECS,
        )?;
        let refresh_interval = (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs));

        let defaults = SearchConfig::default();
        let mut search = defaults.clone();

        if let Some(value) = get("TRAIN_SEARCH_MAX_DISTANCE_KM") {
            search = search.with_acceptable_distance_km(non_negative(
                "TRAIN_SEARCH_MAX_DISTANCE_KM",
                &value,
            )?);
        }

        if let Some(value) = get("TRAIN_SEARCH_BOX_DEGREES") {
            search = search.with_box_half_degrees(non_negative("TRAIN_SEARCH_BOX_DEGREES", &value)?);
        }

        if let Some(value) = get("TRAIN_SEARCH_SLOT_STARTS") {
            let slots = SlotTable::parse(&value)
                .map_err(|e| ConfigError::new("TRAIN_SEARCH_SLOT_STARTS", &value, e))?;
            search = search.with_slots(slots);
        }

        let timeout_ms = parse_or(
            "TRAIN_SEARCH_CATALOG_TIMEOUT_MS",
            get("TRAIN_SEARCH_CATALOG_TIMEOUT_MS"),
            defaults.catalog_timeout.as_millis() as u64,
        )?;
        if timeout_ms == 0 {
            return Err(ConfigError::new(
                "TRAIN_SEARCH_CATALOG_TIMEOUT_MS",
                "0",
                "must be positive",
            ));
        }
        search = search.with_catalog_timeout(Duration::from_millis(timeout_ms));

        Ok(Self {
            catalog,
            catalog_cache,
            fetch_timeout_secs,
            bind,
            refresh_interval,
            search,
        })
    }

    /// Loader settings for the configured catalog source.
    pub fn loader_config(&self) -> CatalogLoaderConfig {
        let config = CatalogLoaderConfig::new(self.catalog.clone())
            .with_timeout_secs(self.fetch_timeout_secs);
        match &self.catalog_cache {
            Some(path) => config.with_cache(CatalogCacheConfig::new(path.clone())),
            None => config,
        }
    }
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::new(var, &value, e)),
        None => Ok(default),
    }
}

fn non_negative(var: &'static str, value: &str) -> Result<f64, ConfigError> {
    let parsed: f64 = parse_or(var, Some(value.to_string()), 0.0)?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(ConfigError::new(var, value, "must be a non-negative number"));
    }
    Ok(parsed)
}
