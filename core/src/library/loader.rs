//! Turning import names into library docs.
//!
//! Failures are reported inside the returned doc (`errors`) wherever a doc
//! can be produced; lookups that must fail the import return
//! [`LoaderError`].

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::args::validate_arguments;
use super::doc::{KeywordDoc, LibraryDoc, LibraryError, LibraryType};
use super::libspec::library_doc_from_spec;
use super::python::library_doc_from_source;
use super::registry::LibraryRegistry;
use super::resource::library_doc_from_model;
use super::variables_file::variables_doc_from_source;
use crate::model::{parse_with_source, File};
use crate::variables::{replace_string, VariableError, VariableLookup};

pub const RESOURCE_EXTENSIONS: &[&str] = &["resource", "robot", "txt", "tsv", "rst", "rest"];
pub const VARIABLES_EXTENSIONS: &[&str] = &["py", "yaml", "yml", "json"];
const SPEC_SUFFIXES: &[&str] = &[".libspec.json", ".libspec", ".json"];

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("{kind} '{name}' does not exist.")]
    NotFound { kind: &'static str, name: String },
    #[error("Importing library '{0}' failed: ModuleNotFoundError: No module named '{0}'")]
    ModuleNotFound(String),
    #[error("Invalid resource file extension '.{0}'. Supported extensions are '.resource', '.robot', '.txt', '.tsv', '.rst' and '.rest'.")]
    InvalidExtension(String),
    #[error(transparent)]
    Variable(#[from] VariableError),
    #[error("Reading '{path}' failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoaderError {
    pub fn code(&self) -> &'static str {
        match self {
            LoaderError::NotFound { .. } | LoaderError::InvalidExtension(_) => "DataError",
            LoaderError::ModuleNotFound(_) => "ModuleNotFoundError",
            LoaderError::Variable(e) => e.code(),
            LoaderError::Io { .. } => "OSError",
        }
    }
}

/// Everything a load needs besides the import itself.
pub struct LoadContext<'a> {
    /// Directory of the importing file.
    pub base_dir: &'a Path,
    pub working_dir: &'a Path,
    pub python_path: &'a [PathBuf],
    /// Resolvable variables used to expand import names.
    pub variables: &'a dyn VariableLookup,
    pub registry: &'a LibraryRegistry,
}

/// Outcome of locating a library import.
#[derive(Debug, Clone)]
pub enum LibraryLookup {
    Ignored,
    Failed(Arc<LibraryDoc>),
    Found { resolved: String, source: LibrarySource },
}

/// Where a library import points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LibrarySource {
    Std(String),
    Python {
        path: PathBuf,
        module: String,
        class: Option<String>,
    },
    Spec(PathBuf),
}

impl LibrarySource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            LibrarySource::Std(_) => None,
            LibrarySource::Python { path, .. } | LibrarySource::Spec(path) => Some(path),
        }
    }
}

/// Remove `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn read(path: &Path) -> Result<String, LoaderError> {
    std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_path_like(name: &str) -> bool {
    name.contains('/') || name.contains('\\') || Path::new(name).extension().is_some_and(|e| e == "py")
}

impl LoadContext<'_> {
    /// Expand variables in an import name.
    pub fn replace(&self, name: &str) -> Result<String, LoaderError> {
        Ok(replace_string(name, self.variables)?)
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.python_path.to_vec();
        dirs.push(self.working_dir.to_path_buf());
        dirs.push(self.base_dir.to_path_buf());
        dirs.dedup();
        dirs
    }

    /// Locate a file by absolute path, relative to the importing file, or
    /// relative to a search directory.
    pub fn find_file(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.exists().then(|| normalize_path(path));
        }
        std::iter::once(self.base_dir.to_path_buf())
            .chain(self.python_path.iter().cloned())
            .chain(std::iter::once(self.working_dir.to_path_buf()))
            .map(|dir| normalize_path(&dir.join(path)))
            .find(|candidate| candidate.exists())
    }

    /// Resolve a library import name (already expanded) to its source.
    pub fn find_library(&self, name: &str) -> Result<LibrarySource, LoaderError> {
        if self.registry.contains(name) {
            return Ok(LibrarySource::Std(name.to_string()));
        }
        if SPEC_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            return self
                .find_file(name)
                .map(LibrarySource::Spec)
                .ok_or_else(|| LoaderError::ModuleNotFound(name.to_string()));
        }
        if is_path_like(name) {
            let trimmed = name.trim_end_matches(['/', '\\']);
            let found = self.find_file(trimmed).ok_or_else(|| LoaderError::ModuleNotFound(name.to_string()))?;
            let (path, module) = if found.is_dir() {
                let module = found.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
                (found.join("__init__.py"), module)
            } else {
                let module = found.file_stem().and_then(|n| n.to_str()).unwrap_or_default().to_string();
                (found, module)
            };
            return Ok(LibrarySource::Python {
                path,
                module,
                class: None,
            });
        }

        let parts: Vec<&str> = name.split('.').collect();
        for dir in self.search_dirs() {
            for suffix in SPEC_SUFFIXES {
                let spec = dir.join(format!("{name}{suffix}"));
                if spec.is_file() {
                    return Ok(LibrarySource::Spec(normalize_path(&spec)));
                }
            }
            let module_path: PathBuf = parts.iter().collect();
            let module = parts.last().copied().unwrap_or(name).to_string();
            for candidate in [dir.join(&module_path).with_extension("py"), dir.join(&module_path).join("__init__.py")] {
                if candidate.is_file() {
                    return Ok(LibrarySource::Python {
                        path: normalize_path(&candidate),
                        module,
                        class: None,
                    });
                }
            }
            if let Some((class, module_parts)) = parts.split_last().filter(|(_, rest)| !rest.is_empty()) {
                let module_path: PathBuf = module_parts.iter().collect();
                let module = module_parts.last().copied().unwrap_or_default().to_string();
                for candidate in [dir.join(&module_path).with_extension("py"), dir.join(&module_path).join("__init__.py")]
                {
                    if candidate.is_file() {
                        return Ok(LibrarySource::Python {
                            path: normalize_path(&candidate),
                            module,
                            class: Some(class.to_string()),
                        });
                    }
                }
            }
        }
        Err(LoaderError::ModuleNotFound(name.to_string()))
    }

    /// Expand and locate a library import without loading it.
    pub fn lookup_library(&self, name: &str) -> LibraryLookup {
        let resolved = match self.replace(name) {
            Ok(resolved) => resolved,
            Err(err) => return LibraryLookup::Failed(failed_library(name, &err)),
        };
        if self.registry.is_ignored(&resolved) {
            debug!("ignoring import of library '{}'", resolved);
            return LibraryLookup::Ignored;
        }
        match self.find_library(&resolved) {
            Ok(source) => LibraryLookup::Found { resolved, source },
            Err(err) => LibraryLookup::Failed(failed_library(&resolved, &err)),
        }
    }

    /// Build the doc for a located library. Init arguments are not checked.
    pub fn read_library(&self, resolved: &str, source: &LibrarySource) -> Option<Arc<LibraryDoc>> {
        debug!("loading library '{}' from {:?}", resolved, source);
        let doc = match source {
            LibrarySource::Std(std_name) => self.registry.library_doc(std_name)?,
            LibrarySource::Spec(path) => Arc::new(match read(path) {
                Ok(text) => library_doc_from_spec(&text, path, None),
                Err(err) => LibraryDoc::failed(resolved, LibraryType::Library, io_error(err, path)),
            }),
            LibrarySource::Python { path, module, class } => {
                let libname = match class {
                    Some(class) => format!("{module}.{class}"),
                    None if is_path_like(resolved) => module.clone(),
                    None => resolved.to_string(),
                };
                Arc::new(match read(path) {
                    Ok(text) => library_doc_from_source(&libname, module, class.as_deref(), &text, path),
                    Err(err) => LibraryDoc::failed(libname, LibraryType::Library, io_error(err, path)),
                })
            }
        };
        Some(doc)
    }

    /// Load a library. `None` means the import is silently ignored.
    pub fn load_library(&self, name: &str, args: &[String]) -> Option<Arc<LibraryDoc>> {
        match self.lookup_library(name) {
            LibraryLookup::Ignored => None,
            LibraryLookup::Failed(doc) => Some(doc),
            LibraryLookup::Found { resolved, source } => {
                let doc = self.read_library(&resolved, &source)?;
                Some(self.check_init_arguments(doc, args))
            }
        }
    }

    /// Library arguments are checked against `__init__` the same way keyword
    /// arguments are checked against a keyword.
    pub fn check_init_arguments(&self, doc: Arc<LibraryDoc>, args: &[String]) -> Arc<LibraryDoc> {
        if doc.is_dynamic || doc.has_errors() || (args.is_empty() && doc.inits.is_empty()) {
            return doc;
        }
        let init = doc
            .inits
            .iter()
            .next()
            .map(|kw| (**kw).clone())
            .unwrap_or_else(|| KeywordDoc::new("__init__", doc.name.clone(), LibraryType::Library));
        let expanded: Vec<String> = args
            .iter()
            .map(|a| crate::variables::replace_string_lossy(a, self.variables))
            .collect();
        let refs: Vec<&str> = expanded.iter().map(String::as_str).collect();
        match validate_arguments(&init, &refs) {
            Ok(()) => doc,
            Err(err) => {
                let message = err
                    .message
                    .replace(&format!("Keyword '{}'", init.full_name()), &format!("Library '{}'", doc.name));
                let mut failed = (*doc).clone();
                failed.errors.push(LibraryError::new(message, err.code()));
                Arc::new(failed.finish())
            }
        }
    }

    /// Resolve a resource import to an existing file.
    pub fn find_resource(&self, name: &str) -> Result<PathBuf, LoaderError> {
        let resolved = self.replace(name)?;
        let extension = Path::new(&resolved)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !RESOURCE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(LoaderError::InvalidExtension(extension));
        }
        self.find_file(&resolved).filter(|p| p.is_file()).ok_or(LoaderError::NotFound {
            kind: "Resource file",
            name: resolved,
        })
    }

    /// Resolve a variables import to an existing file or Python module.
    pub fn find_variables(&self, name: &str) -> Result<PathBuf, LoaderError> {
        let resolved = self.replace(name)?;
        if let Some(found) = self.find_file(&resolved).filter(|p| p.is_file()) {
            return Ok(found);
        }
        if !is_path_like(&resolved) && Path::new(&resolved).extension().is_none() {
            let module_path: PathBuf = resolved.split('.').collect();
            for dir in self.search_dirs() {
                let candidate = dir.join(&module_path).with_extension("py");
                if candidate.is_file() {
                    return Ok(normalize_path(&candidate));
                }
            }
        }
        Err(LoaderError::NotFound {
            kind: "Variable file",
            name: resolved,
        })
    }
}

fn failed_library(name: &str, err: &LoaderError) -> Arc<LibraryDoc> {
    Arc::new(LibraryDoc::failed(
        name,
        LibraryType::Library,
        LibraryError::new(err.to_string(), err.code()),
    ))
}

fn io_error(err: LoaderError, path: &Path) -> LibraryError {
    LibraryError::new(err.to_string(), err.code()).at(path, None)
}

/// Parse a resource file into its model and doc.
pub fn load_resource(path: &Path) -> Result<(File, LibraryDoc), LoaderError> {
    let text = read(path)?;
    Ok(resource_from_text(path, &text))
}

/// Parse resource text that may not be saved to disk yet.
pub fn resource_from_text(path: &Path, text: &str) -> (File, LibraryDoc) {
    let file = parse_with_source(text, Some(path.to_path_buf()));
    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let doc = library_doc_from_model(&file, name, Some(path), LibraryType::Resource);
    (file, doc)
}

/// Load a variables file at `path`.
pub fn load_variables(path: &Path, name: &str) -> LibraryDoc {
    match read(path) {
        Ok(text) => variables_doc_from_source(name, &text, path),
        Err(err) => LibraryDoc::failed(name, LibraryType::Variables, io_error(err, path)),
    }
}
