//! Explicit configuration handed to every source at construction.
//!
//! Nothing below the CLI reads the environment; credentials and locations
//! arrive here and are passed down.

use crate::cache::constants::{APP_DIR, FALLBACK_CACHE_ROOT};
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout applied to every remote request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_PYPI_URL: &str = "https://pypi.org/pypi";

#[derive(Debug, Clone)]
pub struct Config {
    pub cache_dir: PathBuf,
    pub github_token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
    pub github_api_url: String,
    pub pypi_url: String,
}

impl Config {
    /// Create a configuration rooted at `cache_dir`, or at the platform cache
    /// directory when none is given
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        let cache_dir = match cache_dir {
            Some(dir) => dir,
            None => default_cache_dir(),
        };

        Self {
            cache_dir,
            github_token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format_user_agent(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            pypi_url: DEFAULT_PYPI_URL.to_string(),
        }
    }

    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_pypi_url(mut self, url: impl Into<String>) -> Self {
        self.pypi_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the blocking HTTP client shared by a source
    pub fn http_client(&self) -> Result<reqwest::blocking::Client> {
        tracing::debug!(
            user_agent = %self.user_agent,
            timeout_secs = self.timeout.as_secs(),
            "creating HTTP client"
        );

        reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| Error::fetch_with("failed to create HTTP client", e))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None)
    }
}

fn default_cache_dir() -> PathBuf {
    match dirs::cache_dir() {
        Some(dir) => dir.join(APP_DIR),
        None => std::env::temp_dir().join(FALLBACK_CACHE_ROOT),
    }
}

/// Format the user-agent string sent with every request
fn format_user_agent() -> String {
    user_agent_for(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_REPOSITORY"),
    )
}

fn user_agent_for(name: &str, version: &str, repository: &str) -> String {
    if repository.is_empty() {
        format!("{name}/{version}")
    } else {
        format!("{name}/{version} ({repository})")
    }
}
