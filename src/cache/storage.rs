use crate::cache::constants::{SNAPSHOT_EXTENSION, TEMP_EXTENSION};
use crate::error::{Error, Result};
use crate::table::Record;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Manages the file system storage for cached snapshots
#[derive(Debug, Clone)]
pub struct CacheStorage {
    cache_dir: PathBuf,
}

/// Summary of one cached subject
#[derive(Debug, Clone, Serialize)]
pub struct CachedSubject {
    pub namespace: String,
    pub subject: String,
    pub records: usize,
    pub size_bytes: u64,
    pub cached_at: chrono::DateTime<chrono::Utc>,
}

impl Record for CachedSubject {
    const COLUMNS: &'static [&'static str] =
        &["namespace", "subject", "records", "size_bytes", "cached_at"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.namespace.clone(),
            self.subject.clone(),
            self.records.to_string(),
            self.size_bytes.to_string(),
            self.cached_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ]
    }
}

/// Validate that a subject is safe for use in file paths
pub fn validate_subject(subject: &str) -> Result<()> {
    let invalid = |reason| Err(Error::InvalidSubject(subject.to_string(), reason));

    if subject.is_empty() {
        return invalid("must not be empty");
    }
    if subject.contains("..") || subject.contains('/') || subject.contains('\\') {
        return invalid("contains path separators or traversal sequences");
    }
    if subject.starts_with('.') {
        return invalid("must not start with '.'");
    }
    if !subject
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return invalid("only alphanumerics, '-', '_' and '.' are allowed");
    }

    Ok(())
}

impl CacheStorage {
    /// Create a storage rooted at `cache_dir`; nothing is created until the
    /// first write
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Directory holding every snapshot of one source
    pub fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.cache_dir.join(namespace)
    }

    /// Snapshot path for a subject
    pub fn path_for(&self, namespace: &str, subject: &str) -> Result<PathBuf> {
        validate_subject(subject)?;
        Ok(self
            .namespace_dir(namespace)
            .join(format!("{subject}.{SNAPSHOT_EXTENSION}")))
    }

    /// Check if a snapshot file exists for a subject
    pub fn exists(&self, namespace: &str, subject: &str) -> bool {
        self.path_for(namespace, subject)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Load a snapshot.
    ///
    /// Missing, unreadable and corrupt files are all reported as `None`.
    pub fn read<R: DeserializeOwned>(&self, namespace: &str, subject: &str) -> Option<Vec<R>> {
        let path = match self.path_for(namespace, subject) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(namespace, subject, error = %e, "not reading cache");
                return None;
            }
        };

        if !path.is_file() {
            tracing::debug!(namespace, subject, path = %path.display(), "no cache file");
            return None;
        }

        match read_lines(&path) {
            Ok(records) => {
                tracing::debug!(
                    namespace,
                    subject,
                    records = records.len(),
                    "loaded cache file"
                );
                Some(records)
            }
            Err(e) => {
                tracing::debug!(
                    namespace,
                    subject,
                    path = %path.display(),
                    error = %e,
                    "ignoring unreadable cache file"
                );
                None
            }
        }
    }

    /// Persist a snapshot, replacing any previous one.
    ///
    /// Records are written to a temporary sibling first and renamed into
    /// place.
    pub fn write<R: Serialize>(&self, namespace: &str, subject: &str, records: &[R]) -> Result<()> {
        let path = self.path_for(namespace, subject)?;
        let temp_path = path.with_extension(TEMP_EXTENSION);

        let cache_write = |source: std::io::Error| Error::CacheWrite {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(cache_write)?;
        }

        let written = write_lines(&temp_path, records).and_then(|()| fs::rename(&temp_path, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(cache_write(e));
        }

        tracing::debug!(
            namespace,
            subject,
            records = records.len(),
            path = %path.display(),
            "wrote cache file"
        );
        Ok(())
    }

    /// Remove a subject's snapshot; returns whether anything was removed
    pub fn remove(&self, namespace: &str, subject: &str) -> Result<bool> {
        let path = self.path_for(namespace, subject)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        Ok(true)
    }

    /// List every cached subject in a namespace, sorted by subject
    pub fn list(&self, namespace: &str) -> Result<Vec<CachedSubject>> {
        let dir = self.namespace_dir(namespace);
        let mut cached = Vec::new();

        if !dir.exists() {
            return Ok(cached);
        }

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(subject) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let metadata = entry.metadata()?;
            let cached_at = metadata
                .modified()
                .map(chrono::DateTime::<chrono::Utc>::from)
                .unwrap_or_else(|_| chrono::Utc::now());
            let records = fs::read_to_string(&path)
                .map(|text| text.lines().filter(|l| !l.trim().is_empty()).count())
                .unwrap_or(0);

            cached.push(CachedSubject {
                namespace: namespace.to_string(),
                subject: subject.to_string(),
                records,
                size_bytes: metadata.len(),
                cached_at,
            });
        }

        cached.sort_by(|a, b| a.subject.cmp(&b.subject));
        Ok(cached)
    }
}

fn read_lines<R: DeserializeOwned>(path: &Path) -> std::io::Result<Vec<R>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

fn write_lines<R: Serialize>(path: &Path, records: &[R]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryRecord;
    use tempfile::TempDir;

    fn repo(name: &str, stars: u64) -> RepositoryRecord {
        RepositoryRecord {
            name: name.to_string(),
            default_branch: "main".to_string(),
            description: String::new(),
            archived: false,
            is_fork: false,
            issues: 0,
            stars,
            forks: 0,
            size: 10,
        }
    }

    #[test]
    fn write_then_read_returns_same_records() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp_dir.path());
        let records = vec![repo("a", 1), repo("b", 2)];

        storage.write("github", "alice", &records).unwrap();
        let loaded: Vec<RepositoryRecord> = storage.read("github", "alice").unwrap();

        assert_eq!(loaded, records);
        assert!(storage.exists("github", "alice"));
    }

    #[test]
    fn snapshot_is_one_json_object_per_line() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp_dir.path());
        storage
            .write("github", "alice", &[repo("a", 1), repo("b", 2)])
            .unwrap();

        let path = storage.path_for("github", "alice").unwrap();
        assert_eq!(path, temp_dir.path().join("github").join("alice.jsonl"));
        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(r#"{"name":"a""#));
    }

    #[test]
    fn missing_file_reads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp_dir.path());
        assert!(storage.read::<RepositoryRecord>("github", "nobody").is_none());
    }

    #[test]
    fn corrupt_file_reads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp_dir.path());
        storage.write("github", "alice", &[repo("a", 1)]).unwrap();

        let path = storage.path_for("github", "alice").unwrap();
        let mut text = fs::read_to_string(&path).unwrap();
        text.push_str("{not json\n");
        fs::write(&path, text).unwrap();

        assert!(storage.read::<RepositoryRecord>("github", "alice").is_none());
    }

    #[test]
    fn overwrite_replaces_previous_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp_dir.path());
        storage.write("github", "alice", &[repo("old", 1)]).unwrap();
        storage.write("github", "alice", &[repo("new", 2)]).unwrap();

        let loaded: Vec<RepositoryRecord> = storage.read("github", "alice").unwrap();
        assert_eq!(loaded, vec![repo("new", 2)]);
        assert!(!temp_dir.path().join("github").join("alice.jsonl.tmp").exists());
    }

    #[test]
    fn write_failure_is_a_cache_write_error() {
        let temp_dir = TempDir::new().unwrap();
        // a regular file where the namespace directory should go
        fs::write(temp_dir.path().join("github"), "in the way").unwrap();
        let storage = CacheStorage::new(temp_dir.path());

        let err = storage.write("github", "alice", &[repo("a", 1)]).unwrap_err();
        assert!(matches!(err, Error::CacheWrite { .. }));
    }

    #[test]
    fn rejects_path_like_subjects() {
        for bad in ["", "../etc", "a/b", "a\\b", ".hidden", "we ird"] {
            assert!(validate_subject(bad).is_err(), "{bad:?} should be rejected");
        }
        for good in ["alice", "my-user", "sphinx_rtd", "zope.interface"] {
            assert!(validate_subject(good).is_ok(), "{good:?} should be accepted");
        }
    }

    #[test]
    fn remove_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp_dir.path());
        storage.write("github", "bob", &[repo("a", 1)]).unwrap();
        storage
            .write("github", "alice", &[repo("a", 1), repo("b", 1)])
            .unwrap();

        let listed = storage.list("github").unwrap();
        let subjects: Vec<_> = listed.iter().map(|c| c.subject.as_str()).collect();
        assert_eq!(subjects, ["alice", "bob"]);
        assert_eq!(listed[0].records, 2);

        assert!(storage.remove("github", "bob").unwrap());
        assert!(!storage.remove("github", "bob").unwrap());
        assert_eq!(storage.list("github").unwrap().len(), 1);
        assert!(storage.list("docs").unwrap().is_empty());
    }
}
