use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};

/// Number of previous queries remembered.
pub const MAX_RECENT_SEARCHES: usize = 8;

/// Most-recent-first list of past query strings, persisted as JSON.
pub struct RecentSearches {
    entries: RwLock<Vec<String>>,
    persist_path: PathBuf,
}

impl RecentSearches {
    pub fn open_or_create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut entries: Vec<String> = if path.exists() {
            let data = std::fs::read_to_string(path).context("Failed to read recent searches")?;
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            Vec::new()
        };
        entries.truncate(MAX_RECENT_SEARCHES);

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path: path.to_path_buf(),
        })
    }

    /// Put `query` at the front, dropping any earlier copy and anything past the cap.
    pub fn record(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        let mut entries = self.entries.write();
        entries.retain(|q| q != query);
        entries.insert(0, query.to_string());
        entries.truncate(MAX_RECENT_SEARCHES);
        self.persist(&entries);
    }

    pub fn list(&self) -> Vec<String> {
        self.entries.read().clone()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        self.persist(&entries);
    }

    /// Atomic write via temp file + rename. Callers hold the write lock, so
    /// writers never share the temp file. Failures are logged, not returned.
    fn persist(&self, entries: &[String]) {
        match serde_json::to_string_pretty(entries) {
            Ok(data) => {
                let tmp_path = self.persist_path.with_extension("json.tmp");
                if let Err(e) = std::fs::write(&tmp_path, &data)
                    .and_then(|()| std::fs::rename(&tmp_path, &self.persist_path))
                {
                    tracing::warn!("Failed to persist recent searches: {e}");
                }
            }
            Err(e) => tracing::warn!("Failed to serialize recent searches: {e}"),
        }
    }
}
