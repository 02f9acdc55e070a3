//! Catalog error types.

/// Errors that can occur while loading or reading the station/train catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// HTTP request for a remote catalog failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote catalog server returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Reading a local catalog file failed
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// Failed to parse the catalog document
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// The document parsed but breaks a catalog invariant
    #[error("invalid catalog: {message}")]
    Invalid { message: String },

    /// Disk cache operation failed
    #[error("cache error: {message}")]
    Cache { message: String },

    /// Refresh requested on a catalog with no source to reload from
    #[error("catalog has no source configured")]
    NoSource,
}

impl CatalogError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CatalogError::Invalid {
            message: message.into(),
        }
    }
}
