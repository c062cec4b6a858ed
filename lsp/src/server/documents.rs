use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use dashmap::DashMap;
use ropey::Rope;
use tokio::sync::broadcast;
use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};
use tracing::debug;

use robotls_core::imports::DocumentSource;

use super::text::apply_incremental_change_rope;
use super::utils::{path_to_uri, uri_to_path};

type CacheEntry = Arc<dyn Any + Send + Sync>;

/// Text of one document known to the server, open in the editor or loaded
/// from disk for workspace diagnostics.
pub(crate) struct TextDocument {
    pub(crate) path: PathBuf,
    /// Client version; `None` for documents the client never opened.
    pub(crate) version: Option<i32>,
    /// Bumped on every text change, open or not.
    pub(crate) revision: u64,
    pub(crate) text: Rope,
    pub(crate) opened: bool,
    cache: HashMap<TypeId, CacheEntry>,
    /// Values cached for the previous text; handed to the next build.
    stale: HashMap<TypeId, CacheEntry>,
}

impl TextDocument {
    fn new(path: PathBuf, version: Option<i32>, text: &str) -> Self {
        Self {
            path,
            version,
            revision: 0,
            text: Rope::from_str(text),
            opened: false,
            cache: HashMap::new(),
            stale: HashMap::new(),
        }
    }

    fn text_changed(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        if !self.cache.is_empty() {
            self.stale = std::mem::take(&mut self.cache);
        }
    }
}

/// Point-in-time copy of a document.
#[derive(Debug, Clone)]
pub(crate) struct DocumentSnapshot {
    pub(crate) uri: Url,
    pub(crate) path: PathBuf,
    pub(crate) version: Option<i32>,
    pub(crate) revision: u64,
    pub(crate) text: Rope,
    pub(crate) opened: bool,
}

/// Every document the server tracks, keyed by URI.
pub(crate) struct DocumentStore {
    documents: DashMap<Url, TextDocument>,
    invalidated: broadcast::Sender<Url>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    pub(crate) fn new() -> Self {
        let (invalidated, _) = broadcast::channel(256);
        Self {
            documents: DashMap::new(),
            invalidated,
        }
    }

    /// Fires once per edit or explicit invalidation with the affected URI.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Url> {
        self.invalidated.subscribe()
    }

    fn notify(&self, uri: &Url) {
        let _ = self.invalidated.send(uri.clone());
    }

    pub(crate) fn open(&self, uri: &Url, version: i32, text: &str) {
        {
            let mut entry = self
                .documents
                .entry(uri.clone())
                .or_insert_with(|| TextDocument::new(uri_to_path(uri), Some(version), text));
            entry.version = Some(version);
            entry.text = Rope::from_str(text);
            entry.opened = true;
            entry.text_changed();
        }
        debug!("opened {} at version {}", uri, version);
        self.notify(uri);
    }

    /// Apply a `didChange` batch in order. Unknown documents are ignored.
    pub(crate) fn change(&self, uri: &Url, version: i32, changes: Vec<TextDocumentContentChangeEvent>) -> bool {
        {
            let Some(mut entry) = self.documents.get_mut(uri) else {
                return false;
            };
            entry.version = Some(version);
            for change in &changes {
                apply_incremental_change_rope(&mut entry.text, change);
            }
            entry.text_changed();
        }
        self.notify(uri);
        true
    }

    /// Mark a document closed. Files still on disk stay known with their
    /// saved text; anything else is forgotten.
    pub(crate) fn close(&self, uri: &Url) {
        let path = uri_to_path(uri);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                if let Some(mut entry) = self.documents.get_mut(uri) {
                    entry.opened = false;
                    entry.version = None;
                    entry.text = Rope::from_str(&text);
                    entry.text_changed();
                }
            }
            Err(_) => {
                self.documents.remove(uri);
            }
        }
        self.notify(uri);
    }

    /// Track a file from disk unless the editor owns its text.
    pub(crate) fn load_from_disk(&self, path: &Path) -> anyhow::Result<Url> {
        let uri = path_to_uri(path).with_context(|| format!("no URI for '{}'", path.display()))?;
        if self.is_open(&uri) {
            return Ok(uri);
        }
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path.display()))?;
        {
            let mut entry = self
                .documents
                .entry(uri.clone())
                .or_insert_with(|| TextDocument::new(path.to_path_buf(), None, ""));
            entry.text = Rope::from_str(&text);
            entry.text_changed();
        }
        self.notify(&uri);
        Ok(uri)
    }

    pub(crate) fn remove(&self, uri: &Url) -> bool {
        let removed = self.documents.remove(uri).is_some();
        if removed {
            self.notify(uri);
        }
        removed
    }

    pub(crate) fn contains(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    pub(crate) fn is_open(&self, uri: &Url) -> bool {
        self.documents.get(uri).map(|d| d.opened).unwrap_or(false)
    }

    pub(crate) fn revision(&self, uri: &Url) -> Option<u64> {
        self.documents.get(uri).map(|d| d.revision)
    }

    pub(crate) fn snapshot(&self, uri: &Url) -> Option<DocumentSnapshot> {
        self.documents.get(uri).map(|d| DocumentSnapshot {
            uri: uri.clone(),
            path: d.path.clone(),
            version: d.version,
            revision: d.revision,
            text: d.text.clone(),
            opened: d.opened,
        })
    }

    pub(crate) fn rope(&self, uri: &Url) -> Option<Rope> {
        self.documents.get(uri).map(|d| d.text.clone())
    }

    pub(crate) fn uris(&self) -> Vec<Url> {
        self.documents.iter().map(|e| e.key().clone()).collect()
    }

    /// Known documents the editor does not have open, with their revision.
    pub(crate) fn closed_documents(&self) -> Vec<(Url, u64)> {
        self.documents
            .iter()
            .filter(|e| !e.opened)
            .map(|e| (e.key().clone(), e.revision))
            .collect()
    }

    pub(crate) fn uri_for_path(&self, path: &Path) -> Option<Url> {
        self.documents
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.key().clone())
    }

    /// Value attached to the current text of `uri`, built on first use.
    ///
    /// `build` runs outside the document lock and receives the value cached
    /// for the previous text, if any. A result built for a text that changed
    /// meanwhile is returned but not stored.
    pub(crate) fn get_cache<T, F>(&self, uri: &Url, build: F) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce(&DocumentSnapshot, Option<Arc<T>>) -> T,
    {
        if let Some(cached) = self.cached::<T>(uri) {
            return Some(cached);
        }
        let snapshot = self.snapshot(uri)?;
        let previous = self
            .documents
            .get(uri)
            .and_then(|d| d.stale.get(&TypeId::of::<T>()).cloned())
            .and_then(|v| v.downcast::<T>().ok());
        let value = Arc::new(build(&snapshot, previous));
        if let Some(mut entry) = self.documents.get_mut(uri) {
            if entry.revision == snapshot.revision {
                let key = TypeId::of::<T>();
                let stored = entry.cache.entry(key).or_insert_with(|| value.clone() as CacheEntry).clone();
                entry.stale.remove(&key);
                return stored.downcast::<T>().ok();
            }
        }
        Some(value)
    }

    /// Cached value for the current text, without building one.
    pub(crate) fn cached<T: Any + Send + Sync>(&self, uri: &Url) -> Option<Arc<T>> {
        self.documents
            .get(uri)
            .and_then(|d| d.cache.get(&TypeId::of::<T>()).cloned())
            .and_then(|v| v.downcast::<T>().ok())
    }

    /// Drop every cached value of `uri`, including those kept for reuse.
    pub(crate) fn invalidate(&self, uri: &Url) {
        if let Some(mut entry) = self.documents.get_mut(uri) {
            entry.cache.clear();
            entry.stale.clear();
        }
        self.notify(uri);
    }

    pub(crate) fn invalidate_all(&self) {
        for mut entry in self.documents.iter_mut() {
            entry.cache.clear();
            entry.stale.clear();
        }
    }
}

impl DocumentSource for DocumentStore {
    fn text(&self, path: &Path) -> Option<String> {
        self.documents
            .iter()
            .find(|e| e.opened && e.path == path)
            .map(|e| e.text.to_string())
    }
}
