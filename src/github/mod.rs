//! # GitHub Module
//!
//! Repository listings and file trees from the GitHub REST API.

use crate::cache::CacheStorage;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::RepositoryRecord;
use crate::retrieval::{RemoteSource, Retriever};
use crate::tree::{EntryKind, TreeEntry, TreeSource};
use reqwest::StatusCode;
use reqwest::blocking::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Cache namespace for repository listings
pub const NAMESPACE: &str = "github";

const PER_PAGE: usize = 100;
const API_VERSION: &str = "2022-11-28";
const ACCEPT: &str = "application/vnd.github+json";

/// Repository as returned by `GET /users/{user}/repos`
#[derive(Debug, Deserialize)]
struct ApiRepository {
    name: String,
    default_branch: Option<String>,
    description: Option<String>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    open_issues_count: u64,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    size: u64,
}

impl From<ApiRepository> for RepositoryRecord {
    fn from(repo: ApiRepository) -> Self {
        Self {
            name: repo.name,
            default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
            description: repo.description.unwrap_or_default(),
            archived: repo.archived,
            is_fork: repo.fork,
            issues: repo.open_issues_count,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            size: repo.size,
        }
    }
}

/// Response of `GET /repos/{owner}/{repo}/git/trees/{ref}`
#[derive(Debug, Deserialize)]
struct ApiTree {
    #[serde(default)]
    tree: Vec<ApiTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct ApiTreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: Option<u64>,
}

impl From<ApiTreeEntry> for TreeEntry {
    fn from(entry: ApiTreeEntry) -> Self {
        let kind = match entry.kind.as_str() {
            "tree" => EntryKind::Directory,
            "commit" => EntryKind::Submodule,
            _ => EntryKind::File,
        };
        Self {
            path: entry.path,
            kind,
            size: entry.size.unwrap_or(0),
        }
    }
}

/// Error body GitHub sends with non-success statuses
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Client for the parts of the GitHub API this crate reads
#[derive(Debug, Clone)]
pub struct GitHubSource {
    client: reqwest::blocking::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubSource {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            api_url: config.github_api_url.clone(),
            token: config.github_token.clone(),
        })
    }

    /// Repository listing retriever backed by the configured cache
    pub fn inventory(config: &Config) -> Result<Retriever<Self>> {
        Ok(Retriever::new(
            Self::new(config)?,
            CacheStorage::new(&config.cache_dir),
        ))
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, url: &str, what: &str) -> Result<Response> {
        tracing::debug!(url, "GitHub API request");
        self.get(url)
            .send()
            .map_err(|e| Error::fetch_with(format!("Failed to fetch {what}"), e))
    }

    /// Read the whole body first so a stalled or dropped transfer stays a
    /// fetch failure; only malformed JSON is a parse error
    fn parse<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let body = response
            .bytes()
            .map_err(|e| Error::fetch_with(format!("Failed to read {what}"), e))?;
        serde_json::from_slice(&body)
            .map_err(|e| Error::Parse(format!("Invalid GitHub response for {what}: {e}")))
    }

    /// Fetch one page of a user's repositories
    fn repositories_page(&self, user: &str, page: usize) -> Result<Vec<RepositoryRecord>> {
        let url = format!(
            "{}/users/{user}/repos?per_page={PER_PAGE}&page={page}",
            self.api_url
        );
        let what = format!("repositories for {user}");
        let response = self.send(&url, &what)?;
        let response = check_status(response, &what)?;
        let repos: Vec<ApiRepository> = Self::parse(response, &what)?;
        Ok(repos.into_iter().map(RepositoryRecord::from).collect())
    }
}

impl RemoteSource for GitHubSource {
    type Record = RepositoryRecord;

    fn namespace(&self) -> &str {
        NAMESPACE
    }

    fn fetch_all(&self, user: &str) -> Result<Vec<RepositoryRecord>> {
        let mut records = Vec::new();
        for page in 1.. {
            let batch = self.repositories_page(user, page)?;
            let done = batch.len() < PER_PAGE;
            records.extend(batch);
            if done {
                break;
            }
        }
        tracing::info!(user, repositories = records.len(), "listed repositories");
        Ok(records)
    }
}

impl TreeSource for GitHubSource {
    fn list_tree(&self, owner: &str, repo: &str, branch: &str, recursive: bool) -> Result<Vec<TreeEntry>> {
        let mut url = format!("{}/repos/{owner}/{repo}/git/trees/{branch}", self.api_url);
        if recursive {
            url.push_str("?recursive=1");
        }
        let what = format!("file tree of {owner}/{repo}@{branch}");
        let response = self.send(&url, &what)?;

        // empty repositories have no tree to list
        if response.status() == StatusCode::CONFLICT {
            tracing::debug!(owner, repo, "repository is empty");
            return Ok(Vec::new());
        }

        let response = check_status(response, &what)?;
        let tree: ApiTree = Self::parse(response, &what)?;
        if tree.truncated {
            tracing::warn!(owner, repo, "GitHub truncated the file tree; some paths are missing");
        }
        Ok(tree.tree.into_iter().map(TreeEntry::from).collect())
    }
}

/// Turn non-success statuses into fetch errors carrying GitHub's message
fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let rate_limited = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");
    let message = response
        .json::<ApiError>()
        .map(|e| e.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown error").to_string());

    Err(Error::fetch(status_message(status, rate_limited, what, &message)))
}

fn status_message(status: StatusCode, rate_limited: bool, what: &str, message: &str) -> String {
    if rate_limited || status == StatusCode::TOO_MANY_REQUESTS {
        format!("GitHub API rate limit exceeded while fetching {what}; set GITHUB_TOKEN to raise the limit")
    } else if status == StatusCode::UNAUTHORIZED {
        format!("GitHub rejected the token while fetching {what}: {message}")
    } else {
        format!("Failed to fetch {what}: HTTP {status}: {message}")
    }
}
