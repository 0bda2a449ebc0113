//! Lazy file listing across a user's repositories.
//!
//! The walker consumes a repository snapshot and asks a [`TreeSource`] for
//! one repository tree at a time; nothing here is cached.

use crate::error::{Error, Result};
use crate::models::{FileEntry, RepositoryRecord};
use globset::{GlobBuilder, GlobMatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// A gitlink to another repository
    Submodule,
}

/// One path in a repository tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    /// Zero for directories and submodules
    pub size: u64,
}

/// Filesystem-like listing of a repository at a branch
pub trait TreeSource {
    /// List entries under the root of `branch`; everything below it when
    /// `recursive`, otherwise the top level only
    fn list_tree(&self, owner: &str, repo: &str, branch: &str, recursive: bool) -> Result<Vec<TreeEntry>>;
}

impl<T: TreeSource + ?Sized> TreeSource for &T {
    fn list_tree(&self, owner: &str, repo: &str, branch: &str, recursive: bool) -> Result<Vec<TreeEntry>> {
        (**self).list_tree(owner, repo, branch, recursive)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Glob matched against the path inside the repository
    pub pattern: String,
    /// Files larger than this many bytes are skipped
    pub max_size: Option<u64>,
    pub recursive: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            pattern: "**".to_string(),
            max_size: None,
            recursive: true,
        }
    }
}

pub struct TreeWalker<T> {
    source: T,
    owner: String,
    matcher: GlobMatcher,
    options: WalkOptions,
}

impl<T: TreeSource> TreeWalker<T> {
    pub fn new(source: T, owner: impl Into<String>, options: WalkOptions) -> Result<Self> {
        let matcher = GlobBuilder::new(&options.pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::InvalidPattern {
                pattern: options.pattern.clone(),
                reason: e.kind().to_string(),
            })?
            .compile_matcher();

        Ok(Self {
            source,
            owner: owner.into(),
            matcher,
            options,
        })
    }

    /// Iterate matching entries across `repos`, fetching each tree only when
    /// the previous repository is exhausted
    pub fn walk<'w, 'r>(&'w self, repos: &'r [RepositoryRecord]) -> FileWalk<'w, 'r, T> {
        FileWalk {
            walker: self,
            repos: repos.iter(),
            pending: Vec::new().into_iter(),
        }
    }

    fn list_repository(&self, repo: &RepositoryRecord) -> Result<Vec<FileEntry>> {
        let entries = self.source.list_tree(
            &self.owner,
            &repo.name,
            &repo.default_branch,
            self.options.recursive,
        )?;

        let matched: Vec<FileEntry> = entries
            .into_iter()
            .filter(|entry| self.keep(entry))
            .map(|entry| FileEntry {
                repository_name: repo.name.clone(),
                is_directory: entry.kind == EntryKind::Directory,
                file_size_bytes: entry.size,
                file_path: entry.path,
            })
            .collect();

        tracing::debug!(repository = %repo.name, matched = matched.len(), "walked repository");
        Ok(matched)
    }

    fn keep(&self, entry: &TreeEntry) -> bool {
        if entry.kind == EntryKind::Submodule {
            return false;
        }
        if !self.options.recursive && entry.path.contains('/') {
            return false;
        }
        if let Some(max) = self.options.max_size {
            if entry.kind == EntryKind::File && entry.size > max {
                tracing::trace!(path = %entry.path, size = entry.size, "skipping large file");
                return false;
            }
        }
        self.matcher.is_match(&entry.path)
    }
}

/// Iterator returned by [`TreeWalker::walk`]
pub struct FileWalk<'w, 'r, T> {
    walker: &'w TreeWalker<T>,
    repos: std::slice::Iter<'r, RepositoryRecord>,
    pending: std::vec::IntoIter<FileEntry>,
}

impl<T: TreeSource> Iterator for FileWalk<'_, '_, T> {
    type Item = Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.pending.next() {
                return Some(Ok(entry));
            }
            let repo = self.repos.next()?;
            match self.walker.list_repository(repo) {
                Ok(entries) => self.pending = entries.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
