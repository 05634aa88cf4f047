use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Which of the two artifact directories a summary belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Daily,
    Weekly,
}

impl SummaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryKind::Daily => "daily",
            SummaryKind::Weekly => "weekly",
        }
    }
}

/// A stored summary: its key plus the file it lives in
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    pub key: String,
    pub path: PathBuf,
}

/// File-backed summary repository.
///
/// One plain-text file per key (`{key}.txt`) under a per-kind root
/// directory. Daily keys are `YYYY-MM-DD`, weekly keys `YYYY-Www`.
/// `save` overwrites only when explicitly invoked; there is no implicit
/// versioning.
#[derive(Debug, Clone)]
pub struct SummaryStore {
    daily_dir: PathBuf,
    weekly_dir: PathBuf,
}

impl SummaryStore {
    pub fn new(daily_dir: impl Into<PathBuf>, weekly_dir: impl Into<PathBuf>) -> Self {
        Self {
            daily_dir: daily_dir.into(),
            weekly_dir: weekly_dir.into(),
        }
    }

    fn dir(&self, kind: SummaryKind) -> &Path {
        match kind {
            SummaryKind::Daily => &self.daily_dir,
            SummaryKind::Weekly => &self.weekly_dir,
        }
    }

    fn file_path(&self, kind: SummaryKind, key: &str) -> PathBuf {
        self.dir(kind).join(format!("{key}.txt"))
    }

    /// Write a summary, creating the directory if needed.
    pub fn save(&self, kind: SummaryKind, key: &str, content: &str) -> Result<PathBuf> {
        let dir = self.dir(kind);
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create summary directory: {}", dir.display()))?;

        let path = self.file_path(kind, key);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write summary: {}", path.display()))?;

        debug!(key, path = %path.display(), "Saved summary");

        Ok(path)
    }

    pub fn read(&self, kind: SummaryKind, key: &str) -> Result<Option<String>> {
        let path = self.file_path(kind, key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read summary: {}", path.display()))?;

        Ok(Some(content))
    }

    pub fn exists(&self, kind: SummaryKind, key: &str) -> bool {
        self.file_path(kind, key).exists()
    }

    /// List stored summaries of one kind, newest first by modification
    /// time, truncated to `limit`.
    pub fn list_recent(&self, kind: SummaryKind, limit: usize) -> Result<Vec<SummaryEntry>> {
        let dir = self.dir(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to list summaries: {}", dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            else {
                continue;
            };
            let modified = entry.metadata()?.modified()?;
            entries.push((modified, SummaryEntry { key, path }));
        }

        entries.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(entries
            .into_iter()
            .take(limit)
            .map(|(_, entry)| entry)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store(dir: &Path) -> SummaryStore {
        SummaryStore::new(dir.join("daily"), dir.join("weekly"))
    }

    #[test]
    fn test_save_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let content = "Date: 2024-06-04\nFixed the parser.\n";
        store
            .save(SummaryKind::Daily, "2024-06-04", content)
            .unwrap();

        let loaded = store.read(SummaryKind::Daily, "2024-06-04").unwrap();
        assert_eq!(loaded.as_deref(), Some(content));
    }

    #[test]
    fn test_read_absent_key() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        assert!(store.read(SummaryKind::Weekly, "2024-W23").unwrap().is_none());
        assert!(!store.exists(SummaryKind::Weekly, "2024-W23"));
    }

    #[test]
    fn test_explicit_overwrite() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        store.save(SummaryKind::Weekly, "2024-W23", "first").unwrap();
        store.save(SummaryKind::Weekly, "2024-W23", "second").unwrap();

        let loaded = store.read(SummaryKind::Weekly, "2024-W23").unwrap();
        assert_eq!(loaded.as_deref(), Some("second"));
    }

    #[test]
    fn test_kinds_are_separate() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        store.save(SummaryKind::Daily, "2024-06-04", "daily").unwrap();

        assert!(store.exists(SummaryKind::Daily, "2024-06-04"));
        assert!(!store.exists(SummaryKind::Weekly, "2024-06-04"));
    }

    #[test]
    fn test_list_recent_newest_first() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        store.save(SummaryKind::Daily, "2024-06-03", "a").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        store.save(SummaryKind::Daily, "2024-06-04", "b").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        store.save(SummaryKind::Daily, "2024-06-05", "c").unwrap();

        let entries = store.list_recent(SummaryKind::Daily, 2).unwrap();
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-06-05", "2024-06-04"]);
    }

    #[test]
    fn test_list_recent_missing_dir() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        assert!(store.list_recent(SummaryKind::Weekly, 5).unwrap().is_empty());
    }
}
