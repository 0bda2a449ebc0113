//! Flat record shapes produced by the sources.

use crate::table::Record;
use serde::{Deserialize, Serialize};

/// One symbol from a documentation `objects.inv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// e.g. `py:class`
    pub domain_role: String,
    pub fullname: String,
    /// Frequently `-`, meaning "same as fullname"
    pub display_name: String,
    pub project_name: String,
    pub project_version: String,
    pub uri: String,
}

impl Record for InventoryRecord {
    const COLUMNS: &'static [&'static str] = &[
        "domain_role",
        "fullname",
        "display_name",
        "project_name",
        "project_version",
        "uri",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.domain_role.clone(),
            self.fullname.clone(),
            self.display_name.clone(),
            self.project_name.clone(),
            self.project_version.clone(),
            self.uri.clone(),
        ]
    }
}

/// Metadata for one repository owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub default_branch: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub is_fork: bool,
    #[serde(default)]
    pub issues: u64,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub forks: u64,
    /// Size in kilobytes, as reported by the host
    #[serde(default)]
    pub size: u64,
}

impl Record for RepositoryRecord {
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "default_branch",
        "description",
        "archived",
        "is_fork",
        "issues",
        "stars",
        "forks",
        "size",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.default_branch.clone(),
            self.description.clone(),
            self.archived.to_string(),
            self.is_fork.to_string(),
            self.issues.to_string(),
            self.stars.to_string(),
            self.forks.to_string(),
            self.size.to_string(),
        ]
    }
}

/// A path matched inside a repository's default branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub repository_name: String,
    pub file_path: String,
    pub is_directory: bool,
    pub file_size_bytes: u64,
}

impl Record for FileEntry {
    const COLUMNS: &'static [&'static str] = &[
        "repository_name",
        "file_path",
        "is_directory",
        "file_size_bytes",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.repository_name.clone(),
            self.file_path.clone(),
            self.is_directory.to_string(),
            self.file_size_bytes.to_string(),
        ]
    }
}

/// Whether a symbol appeared or disappeared between two inventories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// One row of an inventory comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryChange {
    pub change: ChangeKind,
    pub domain_role: String,
    pub fullname: String,
}

impl Record for InventoryChange {
    const COLUMNS: &'static [&'static str] = &["change", "domain_role", "fullname"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.change.to_string(),
            self.domain_role.clone(),
            self.fullname.clone(),
        ]
    }
}
