//! # Docs Module
//!
//! Documentation symbol inventories (`objects.inv`) for Python packages.
//!
//! - [`discovery`] - finds the inventory URL from PyPI metadata
//! - [`objects_inv`] - decodes Sphinx inventory files
//! - [`compare`] - diffs two inventories

pub mod compare;
pub mod discovery;
pub mod objects_inv;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::InventoryRecord;
use crate::retrieval::{RemoteSource, Retriever};

pub use compare::compare_inventories;

/// Cache namespace for documentation inventories
pub const NAMESPACE: &str = "docs";

/// Fetches and decodes a package's documentation inventory
#[derive(Debug, Clone)]
pub struct DocsSource {
    client: reqwest::blocking::Client,
    pypi_url: String,
    docs_url: Option<String>,
}

impl DocsSource {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            pypi_url: config.pypi_url.clone(),
            docs_url: None,
        })
    }

    /// Skip PyPI discovery and read the inventory under this documentation URL
    pub fn with_docs_url(mut self, docs_url: Option<String>) -> Self {
        self.docs_url = docs_url.map(|url| discovery::inventory_url_for(&url));
        self
    }

    /// Inventory records are never cached, so the retriever has no store
    pub fn inventory(config: &Config, docs_url: Option<String>) -> Result<Retriever<Self>> {
        Ok(Retriever::uncached(Self::new(config)?.with_docs_url(docs_url)))
    }

    /// Download and decode the inventory at `url`
    pub fn fetch_url(&self, url: &str) -> Result<Vec<InventoryRecord>> {
        let raw = self.download(url)?;
        let records = objects_inv::parse(&raw, url)?;
        tracing::info!(url, records = records.len(), "decoded inventory");
        Ok(records)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(url, "downloading inventory");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::fetch_with(format!("Failed to retrieve objects.inv at {url}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(format!(
                "Failed to retrieve objects.inv at {url}: HTTP {status}"
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| Error::fetch_with(format!("Failed to read objects.inv at {url}"), e))?;
        Ok(bytes.to_vec())
    }
}

impl RemoteSource for DocsSource {
    type Record = InventoryRecord;

    fn namespace(&self) -> &str {
        NAMESPACE
    }

    fn fetch_all(&self, package: &str) -> Result<Vec<InventoryRecord>> {
        let url = match &self.docs_url {
            Some(url) => url.clone(),
            None => discovery::discover_inventory_url(&self.client, &self.pypi_url, package)?,
        };
        self.fetch_url(&url)
    }
}
