//! Locating a package's `objects.inv` from its PyPI metadata.

use crate::docs::objects_inv::INVENTORY_FILE;
use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde_json::Value;

/// `project_urls` keys that point at documentation, matched case-insensitively
const DOC_URL_KEYS: &[&str] = &["documentation", "docs", "documentation url", "doc"];

/// Hosts whose pages are Sphinx builds
const SPHINX_HOSTS: &[&str] = &["readthedocs.io", "readthedocs.org", "readthedocs-hosted.com"];

/// Fetch `<pypi_url>/<package>/json` and derive the inventory URL
pub fn discover_inventory_url(
    client: &reqwest::blocking::Client,
    pypi_url: &str,
    package: &str,
) -> Result<String> {
    let url = format!("{pypi_url}/{package}/json");
    tracing::debug!(package, url = %url, "looking up PyPI metadata");

    let response = client
        .get(&url)
        .send()
        .map_err(|e| Error::fetch_with(format!("Could not fetch PyPI metadata for {package}"), e))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(Error::Discovery(format!("Package {package} not found on PyPI")));
    }
    if !status.is_success() {
        return Err(Error::fetch(format!(
            "Could not fetch PyPI metadata for {package}: HTTP {status}"
        )));
    }

    let body = response
        .bytes()
        .map_err(|e| Error::fetch_with(format!("Could not read PyPI metadata for {package}"), e))?;
    let metadata: Value = serde_json::from_slice(&body)
        .map_err(|e| Error::Parse(format!("Invalid PyPI metadata for {package}: {e}")))?;

    let inventory_url = inventory_url_from_metadata(package, &metadata)?;
    tracing::info!(package, inventory_url = %inventory_url, "discovered inventory");
    Ok(inventory_url)
}

/// Pick the documentation URL out of PyPI JSON metadata
pub fn inventory_url_from_metadata(package: &str, metadata: &Value) -> Result<String> {
    let info = &metadata["info"];
    let project_urls: Vec<(&str, &str)> = info["project_urls"]
        .as_object()
        .map(|urls| {
            urls.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.as_str(), v)))
                .collect()
        })
        .unwrap_or_default();

    let labelled = DOC_URL_KEYS.iter().find_map(|key| {
        project_urls
            .iter()
            .find(|(label, _)| label.trim().eq_ignore_ascii_case(key))
            .map(|(_, url)| *url)
    });

    let doc_url = labelled
        .or_else(|| non_empty(&info["docs_url"]))
        .or_else(|| {
            project_urls
                .iter()
                .map(|(_, url)| *url)
                .chain(non_empty(&info["home_page"]))
                .find(|url| is_sphinx_host(url))
        })
        .ok_or_else(|| {
            Error::Discovery(format!(
                "No documentation URL found in PyPI metadata for {package}"
            ))
        })?;

    Ok(inventory_url_for(doc_url))
}

/// Append `objects.inv` to a documentation root URL
pub fn inventory_url_for(doc_url: &str) -> String {
    let doc_url = doc_url.trim();
    if doc_url.ends_with(INVENTORY_FILE) {
        return doc_url.to_string();
    }
    format!("{}/{INVENTORY_FILE}", doc_url.trim_end_matches('/'))
}

fn non_empty(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn is_sphinx_host(url: &str) -> bool {
    SPHINX_HOSTS.iter().any(|host| url.contains(host))
}
