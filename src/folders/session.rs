//! Session-scoped key/value storage for view state.
//!
//! Values are JSON strings under keys namespaced by page id
//! (`folderView-<page>`, `sortConfig-<page>`, ...). Persistence is best
//! effort: write failures are logged and otherwise ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// Minimal string store, shaped like a browser's `sessionStorage`.
pub trait SessionStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    /// Drop every key.
    fn clear(&mut self);
}

/// Keys used by one page.
#[derive(Debug, Clone)]
pub struct PageKeys {
    pub view_mode: String,
    pub expanded: String,
    pub current_folder: String,
    pub selected_folder: String,
    pub sort_config: String,
}

impl PageKeys {
    pub fn new(page_id: &str) -> Self {
        Self {
            view_mode: format!("folderView-{}", page_id),
            expanded: format!("expandedFolders-{}", page_id),
            current_folder: format!("currentFolder-{}", page_id),
            selected_folder: format!("selectedFolder-{}", page_id),
            sort_config: format!("sortConfig-{}", page_id),
        }
    }
}

/// Read and decode a JSON value; missing or malformed values give `None`.
pub fn read_json<T: DeserializeOwned>(store: &dyn SessionStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "ignoring unreadable session value");
            None
        }
    }
}

/// Encode and store a JSON value.
pub fn write_json<T: Serialize>(store: &mut dyn SessionStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, raw),
        Err(e) => warn!(key, error = %e, "failed to encode session value"),
    }
}

// ── In-memory store ──────────────────────────────────────────────────────────

#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemorySession {
    entries: BTreeMap<String, String>,
}

#[cfg(test)]
impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert for seeding state.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

// ── File-backed store ────────────────────────────────────────────────────────

/// A JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileSession {
    /// Open (or start) the session file at `path`. A missing file is an empty
    /// session; an unreadable one is logged and discarded.
    pub fn open(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "discarding corrupt session file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) {
        if let Err(e) = self.try_flush() {
            warn!(path = %self.path.display(), error = %e, "failed to write session file");
        }
    }

    fn try_flush(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)
    }
}

impl SessionStore for FileSession {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        if self.entries.get(key) == Some(&value) {
            return;
        }
        self.entries.insert(key.to_string(), value);
        self.flush();
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.flush();
    }
}
