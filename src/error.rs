//! Error kinds shared by the retrieval core and its sources.

use std::path::PathBuf;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while retrieving an inventory.
///
/// Only [`Error::Fetch`] makes the retrieval core fall back to a cached
/// snapshot; every other kind reaches the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote resource location could not be determined
    #[error("{0}")]
    Discovery(String),

    /// Network, HTTP status, auth, rate-limit or timeout failure
    #[error("{context}")]
    Fetch {
        context: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Malformed inventory or cache content
    #[error("{0}")]
    Parse(String),

    /// The cache file could not be persisted
    #[error("failed to write cache file {}", path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Subject identifiers end up in file paths, so they are restricted
    #[error("invalid subject '{0}': {1}")]
    InvalidSubject(String, &'static str),

    /// A file-matching glob that does not compile
    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// A fetch failure with no underlying transport error (e.g. a bad status)
    pub fn fetch(context: impl Into<String>) -> Self {
        Self::Fetch {
            context: context.into(),
            source: None,
        }
    }

    /// A fetch failure caused by the HTTP client
    pub fn fetch_with(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            context: context.into(),
            source: Some(source),
        }
    }

    /// Whether this failure should trigger the cache fallback path
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}
