// src/seen.rs
//! Durable seen-set: identifiers that were already notified, with the time of
//! the first notification.
//!
//! Loaded once at startup. `mark_seen` only touches memory; `flush` writes the
//! whole set to `<file>.tmp` and renames it over the previous copy, so a crash
//! mid-write leaves the last good file in place. Entries are never removed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{fs, io::AsyncWriteExt};

pub const DEFAULT_SEEN_PATH: &str = "data/seen_jobs.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("serializing seen-set: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("writing seen-set to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// On-disk shape. The list variant is the older format without timestamps.
#[derive(Debug, Deserialize)]
struct SeenFile {
    #[serde(default)]
    seen: SeenEntries,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeenEntries {
    Map(BTreeMap<String, DateTime<Utc>>),
    List(Vec<String>),
}

impl Default for SeenEntries {
    fn default() -> Self {
        SeenEntries::Map(BTreeMap::new())
    }
}

#[derive(Serialize)]
struct SeenFileRef<'a> {
    seen: &'a BTreeMap<String, DateTime<Utc>>,
}

#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    entries: BTreeMap<String, DateTime<Utc>>,
    dirty: bool,
}

impl SeenStore {
    /// An empty store that will persist to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Read the durable copy. A missing, unreadable or corrupt file yields an
    /// empty store (logged), never an error.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self::empty(path.clone());

        let content = match fs::read_to_string(&path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no seen-set yet; starting empty");
                return store;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "seen-set unreadable; starting empty");
                return store;
            }
        };

        match serde_json::from_str::<SeenFile>(&content) {
            Ok(file) => {
                store.entries = match file.seen {
                    SeenEntries::Map(m) => m,
                    SeenEntries::List(ids) => {
                        let now = Utc::now();
                        ids.into_iter().map(|id| (id, now)).collect()
                    }
                };
                tracing::info!(path = %path.display(), count = store.entries.len(), "seen-set loaded");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "seen-set corrupt; starting empty");
            }
        }
        store
    }

    pub fn has(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Record `identifier` in memory. The first timestamp wins.
    pub fn mark_seen(&mut self, identifier: &str, now: DateTime<Utc>) {
        if !self.entries.contains_key(identifier) {
            self.entries.insert(identifier.to_string(), now);
            self.dirty = true;
        }
    }

    pub fn first_seen(&self, identifier: &str) -> Option<DateTime<Utc>> {
        self.entries.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unflushed changes pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persist the whole set (write temp file, fsync, rename). On error the
    /// in-memory set stays dirty so the next flush retries it.
    pub async fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }

        let body = serde_json::to_vec_pretty(&SeenFileRef {
            seen: &self.entries,
        })?;
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(io_err(dir))?;
        }

        let tmp = tmp_path(&self.path);
        let mut f = fs::File::create(&tmp).await.map_err(io_err(tmp.as_path()))?;
        f.write_all(&body).await.map_err(io_err(tmp.as_path()))?;
        f.sync_all().await.map_err(io_err(tmp.as_path()))?;
        drop(f);

        fs::rename(&tmp, &self.path)
            .await
            .map_err(io_err(self.path.as_path()))?;

        self.dirty = false;
        tracing::debug!(path = %self.path.display(), count = self.entries.len(), "seen-set flushed");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "seen".into());
    name.push(".tmp");
    path.with_file_name(name)
}
