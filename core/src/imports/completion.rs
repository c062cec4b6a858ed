//! Completion of library, resource and variables import names.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::manager::ImportsManager;
use super::ImportKind;
use crate::library::{RESOURCE_EXTENSIONS, VARIABLES_EXTENSIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Module,
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCompletion {
    pub label: String,
    pub kind: CompletionKind,
    pub detail: Option<String>,
}

impl ImportCompletion {
    fn new(label: impl Into<String>, kind: CompletionKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
        }
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name == "__pycache__"
}

/// Directory part of a typed path prefix, e.g. `res/sub/` for `res/sub/fi`.
fn prefix_dir(prefix: &str) -> &str {
    match prefix.rfind(['/', '\\']) {
        Some(idx) => &prefix[..=idx],
        None => "",
    }
}

/// Entries of `dir`, sorted by name, without hidden files.
fn list_dir(dir: &Path) -> Vec<(String, PathBuf, bool)> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            if is_hidden(&name) {
                return None;
            }
            let is_dir = entry.file_type().is_dir();
            Some((name, entry.into_path(), is_dir))
        })
        .collect()
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn complete_paths(prefix: &str, base_dir: &Path, extensions: &[&str]) -> Vec<ImportCompletion> {
    let dir_part = prefix_dir(prefix);
    let dir = if Path::new(dir_part).is_absolute() {
        PathBuf::from(dir_part)
    } else {
        base_dir.join(dir_part)
    };
    list_dir(&dir)
        .into_iter()
        .filter_map(|(name, path, is_dir)| {
            if is_dir {
                Some(ImportCompletion::new(format!("{dir_part}{name}/"), CompletionKind::Folder))
            } else if has_extension(&path, extensions) {
                Some(ImportCompletion::new(format!("{dir_part}{name}"), CompletionKind::File))
            } else {
                None
            }
        })
        .collect()
}

impl ImportsManager {
    /// Candidate import names for a partially typed `prefix`.
    pub fn complete_import(&self, kind: ImportKind, prefix: &str, base_dir: &Path) -> Vec<ImportCompletion> {
        match kind {
            ImportKind::Resource => complete_paths(prefix, base_dir, RESOURCE_EXTENSIONS),
            ImportKind::Variables => complete_paths(prefix, base_dir, VARIABLES_EXTENSIONS),
            ImportKind::Library if prefix.contains(['/', '\\']) => complete_paths(prefix, base_dir, &["py"]),
            ImportKind::Library => self.complete_modules(prefix, base_dir),
        }
    }

    fn complete_modules(&self, prefix: &str, base_dir: &Path) -> Vec<ImportCompletion> {
        let mut out: Vec<ImportCompletion> = Vec::new();
        let package = match prefix.rfind('.') {
            Some(idx) => &prefix[..=idx],
            None => "",
        };
        if package.is_empty() {
            for name in self.registry().library_names() {
                if self.registry().is_ignored(&name) {
                    continue;
                }
                let mut item = ImportCompletion::new(name, CompletionKind::Module);
                item.detail = Some("Standard library".to_string());
                out.push(item);
            }
        }

        let config = self.config();
        let package_path: PathBuf = package.split('.').filter(|p| !p.is_empty()).collect();
        let mut dirs: Vec<PathBuf> = config.python_path.clone();
        dirs.push(config.working_dir.clone());
        dirs.push(base_dir.to_path_buf());
        dirs.dedup();
        for dir in dirs {
            for (name, path, is_dir) in list_dir(&dir.join(&package_path)) {
                let module = if is_dir {
                    path.join("__init__.py").is_file().then_some(name)
                } else if let Some(stem) = name.strip_suffix(".libspec.json") {
                    Some(stem.to_string())
                } else {
                    name.strip_suffix(".py").filter(|s| *s != "__init__").map(str::to_string)
                };
                let Some(module) = module else { continue };
                let label = format!("{package}{module}");
                if out.iter().any(|c| c.label == label) {
                    continue;
                }
                out.push(ImportCompletion::new(label, CompletionKind::Module));
            }
        }
        out
    }
}
