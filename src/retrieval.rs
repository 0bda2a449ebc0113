//! Cache-backed retrieval core.
//!
//! [`Retriever::retrieve`] serves one complete snapshot per call from exactly
//! one place: the cache, a fresh remote fetch, or (when the fetch fails) the
//! cache as a stale fallback. The policy is written once here and shared by
//! every [`RemoteSource`].

use crate::cache::CacheStorage;
use crate::cache::storage::validate_subject;
use crate::error::Result;
use crate::table::{Record, Table};
use serde::de::DeserializeOwned;
use std::fmt;

/// Something that can list every record for a subject from a remote host
pub trait RemoteSource {
    type Record: Record + DeserializeOwned;

    /// Cache namespace, one directory per source
    fn namespace(&self) -> &str;

    /// Fetch the complete record set for `subject`.
    ///
    /// Transport, status, auth and rate-limit failures must be reported as
    /// [`crate::Error::Fetch`] for the fallback path to apply.
    fn fetch_all(&self, subject: &str) -> Result<Vec<Self::Record>>;
}

impl<S: RemoteSource + ?Sized> RemoteSource for &S {
    type Record = S::Record;

    fn namespace(&self) -> &str {
        (**self).namespace()
    }

    fn fetch_all(&self, subject: &str) -> Result<Vec<Self::Record>> {
        (**self).fetch_all(subject)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieveOptions {
    /// When false the cache is neither read, written nor used as fallback
    pub use_cache: bool,
    /// Skip the cache-first read; fallback still applies
    pub force_refresh: bool,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
        }
    }
}

/// Where a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Remote,
    /// Served from cache because the remote fetch failed
    StaleCache,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Cache => write!(f, "cache"),
            Origin::Remote => write!(f, "remote"),
            Origin::StaleCache => write!(f, "stale-cache"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot<R> {
    pub table: Table<R>,
    pub origin: Origin,
}

impl<R> Snapshot<R> {
    pub fn is_stale(&self) -> bool {
        self.origin == Origin::StaleCache
    }
}

/// Applies the cache-then-remote-then-fallback policy over a source
#[derive(Debug, Clone)]
pub struct Retriever<S> {
    source: S,
    cache: Option<CacheStorage>,
}

impl<S: RemoteSource> Retriever<S> {
    /// Retriever backed by a cache
    pub fn new(source: S, cache: CacheStorage) -> Self {
        Self {
            source,
            cache: Some(cache),
        }
    }

    /// Retriever that always goes to the remote source
    pub fn uncached(source: S) -> Self {
        Self {
            source,
            cache: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> Option<&CacheStorage> {
        self.cache.as_ref()
    }

    /// Produce a snapshot for `subject`
    pub fn retrieve(&self, subject: &str, options: RetrieveOptions) -> Result<Snapshot<S::Record>> {
        validate_subject(subject)?;

        let namespace = self.source.namespace();
        let cache = self.cache.as_ref().filter(|_| options.use_cache);

        if !options.force_refresh {
            if let Some(records) = cache.and_then(|c| c.read(namespace, subject)) {
                tracing::info!(namespace, subject, origin = %Origin::Cache, "serving cached snapshot");
                return Ok(snapshot(records, Origin::Cache));
            }
        }

        tracing::info!(namespace, subject, "fetching from remote source");
        match self.source.fetch_all(subject) {
            Ok(records) => {
                if let Some(cache) = cache {
                    if let Err(e) = cache.write(namespace, subject, &records) {
                        tracing::warn!(namespace, subject, error = %e, "failed to persist snapshot");
                    }
                }
                tracing::info!(
                    namespace,
                    subject,
                    origin = %Origin::Remote,
                    records = records.len(),
                    "fetched snapshot"
                );
                Ok(snapshot(records, Origin::Remote))
            }
            Err(err) if err.is_fetch() => {
                match cache.and_then(|c| c.read(namespace, subject)) {
                    Some(records) => {
                        tracing::warn!(
                            namespace,
                            subject,
                            origin = %Origin::StaleCache,
                            error = %err,
                            "remote fetch failed, serving cached snapshot which may be stale"
                        );
                        Ok(snapshot(records, Origin::StaleCache))
                    }
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }
}

fn snapshot<R: Record>(records: Vec<R>, origin: Origin) -> Snapshot<R> {
    Snapshot {
        table: Table::new(records),
        origin,
    }
}
