//! On-disk cache of library docs built from Python sources and spec files.
//!
//! Layout: `index.json` maps a key digest to a blob file holding the doc as
//! JSON. A schema change wipes the directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::library::LibraryDoc;

pub const CACHE_SCHEMA_VERSION: u32 = 1;
const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    blob: String,
    source: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheIndex {
    schema_version: u32,
    entries: BTreeMap<String, CacheEntry>,
}

#[derive(Debug)]
pub struct DocCache {
    dir: PathBuf,
    index: Mutex<CacheIndex>,
}

fn hex_digest(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{b:02x}")).collect()
}

/// Modification stamp of a source file; `None` if it cannot be read.
fn source_stamp(source: &Path) -> Option<String> {
    let meta = fs::metadata(source).ok()?;
    let modified = meta.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
    Some(format!("{}.{}:{}", modified.as_secs(), modified.subsec_nanos(), meta.len()))
}

impl DocCache {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("creating cache directory {}", dir.display()))?;
        let index_path = dir.join(INDEX_FILE);
        let index = match fs::read_to_string(&index_path) {
            Ok(text) => match serde_json::from_str::<CacheIndex>(&text) {
                Ok(index) if index.schema_version == CACHE_SCHEMA_VERSION => index,
                _ => {
                    debug!("discarding doc cache in {}", dir.display());
                    fs::remove_dir_all(dir).ok();
                    fs::create_dir_all(dir)?;
                    CacheIndex {
                        schema_version: CACHE_SCHEMA_VERSION,
                        entries: BTreeMap::new(),
                    }
                }
            },
            Err(_) => CacheIndex {
                schema_version: CACHE_SCHEMA_VERSION,
                entries: BTreeMap::new(),
            },
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            index: Mutex::new(index),
        })
    }

    fn key(import_name: &str, args: &[String], source: &Path) -> Option<String> {
        let stamp = source_stamp(source)?;
        let text = format!("{}|{}|{}|{}", import_name, args.join("\u{1f}"), source.display(), stamp);
        Some(hex_digest(text.as_bytes()))
    }

    pub fn get(&self, import_name: &str, args: &[String], source: &Path) -> Option<LibraryDoc> {
        let key = Self::key(import_name, args, source)?;
        let blob = {
            let index = self.index.lock().ok()?;
            index.entries.get(&key)?.blob.clone()
        };
        let text = fs::read_to_string(self.dir.join(&blob)).ok()?;
        match serde_json::from_str(&text) {
            Ok(doc) => {
                debug!("doc cache hit for '{}'", import_name);
                Some(doc)
            }
            Err(err) => {
                warn!("corrupt doc cache blob {}: {}", blob, err);
                None
            }
        }
    }

    pub fn put(&self, import_name: &str, args: &[String], source: &Path, doc: &LibraryDoc) -> Result<()> {
        let Some(key) = Self::key(import_name, args, source) else {
            return Ok(());
        };
        let blob = format!("{key}.json");
        fs::write(self.dir.join(&blob), serde_json::to_vec(doc)?)?;
        let mut index = self
            .index
            .lock()
            .map_err(|_| anyhow::anyhow!("doc cache index lock poisoned"))?;
        index.entries.insert(
            key,
            CacheEntry {
                blob,
                source: source.to_path_buf(),
            },
        );
        self.save(&index)
    }

    /// Drop every entry built from `source`.
    pub fn remove_source(&self, source: &Path) -> Result<()> {
        let mut index = self
            .index
            .lock()
            .map_err(|_| anyhow::anyhow!("doc cache index lock poisoned"))?;
        let stale: Vec<String> = index
            .entries
            .iter()
            .filter(|(_, e)| e.source == source)
            .map(|(k, _)| k.clone())
            .collect();
        if stale.is_empty() {
            return Ok(());
        }
        for key in stale {
            if let Some(entry) = index.entries.remove(&key) {
                fs::remove_file(self.dir.join(entry.blob)).ok();
            }
        }
        self.save(&index)
    }

    fn save(&self, index: &CacheIndex) -> Result<()> {
        let tmp = self.dir.join(format!("{INDEX_FILE}.tmp"));
        fs::write(&tmp, serde_json::to_vec_pretty(index)?)?;
        fs::rename(&tmp, self.dir.join(INDEX_FILE))?;
        Ok(())
    }
}
