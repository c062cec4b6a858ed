use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use indexmap::IndexMap;

use super::doc::{ArgumentSpec, KeywordDoc, KeywordStore, LibraryDoc, LibraryScope, LibraryType};
use super::python::parse_parameters;

/// Version reported by packaged libraries that do not set their own.
pub const STD_LIBRARY_VERSION: &str = "7.0";

/// Central registry of the packaged standard libraries.
///
/// The stdlib crate fills it through `register_stdlib_libraries`; the loader
/// consults it before looking at the filesystem.
#[derive(Debug, Default)]
pub struct LibraryRegistry {
    libraries: IndexMap<String, Box<dyn StdLibrary>>,
    docs: Mutex<HashMap<String, Arc<LibraryDoc>>>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a library under its own name. Disabled libraries are kept
    /// out of lookups.
    pub fn register_library(&mut self, library: Box<dyn StdLibrary>) -> Result<()> {
        let name = library.name().to_string();
        if self.libraries.contains_key(&name) {
            return Err(anyhow!("Library '{}' is already registered", name));
        }
        library.init()?;
        self.libraries.insert(name, library);
        Ok(())
    }

    pub fn get_library(&self, name: &str) -> Option<&dyn StdLibrary> {
        self.libraries
            .get(name)
            .filter(|l| l.enabled())
            .map(|boxed| boxed.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_library(name).is_some()
    }

    pub fn library_names(&self) -> Vec<String> {
        self.libraries
            .values()
            .filter(|l| l.enabled())
            .map(|l| l.name().to_string())
            .collect()
    }

    /// Imported without error and without a doc.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.get_library(name).map(|l| l.ignored()).unwrap_or(false)
    }

    /// Build (once) the doc of a registered library.
    pub fn library_doc(&self, name: &str) -> Option<Arc<LibraryDoc>> {
        let library = self.get_library(name)?;
        if let Ok(cache) = self.docs.lock() {
            if let Some(doc) = cache.get(name) {
                return Some(doc.clone());
            }
        }
        let doc = Arc::new(library.library_doc());
        if let Ok(mut cache) = self.docs.lock() {
            cache.insert(name.to_string(), doc.clone());
        }
        Some(doc)
    }
}

/// One packaged library.
///
/// Implementors describe their keywords; the registry turns them into a
/// [`LibraryDoc`] on first use.
pub trait StdLibrary: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        STD_LIBRARY_VERSION
    }

    fn description(&self) -> &str {
        ""
    }

    fn enabled(&self) -> bool {
        true
    }

    fn scope(&self) -> LibraryScope {
        LibraryScope::Global
    }

    /// Importing this library is a no-op rather than an error.
    fn ignored(&self) -> bool {
        false
    }

    fn keywords(&self) -> Vec<KeywordDoc>;

    fn inits(&self) -> Vec<KeywordDoc> {
        Vec::new()
    }

    /// Called once when registered.
    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn library_doc(&self) -> LibraryDoc {
        let mut doc = LibraryDoc::new(self.name(), LibraryType::Library);
        doc.version = self.version().to_string();
        doc.doc = self.description().to_string();
        doc.scope = self.scope();
        doc.keywords = KeywordStore::new(self.keywords());
        doc.inits = KeywordStore::new(self.inits());
        doc.finish()
    }
}

/// Argument specs written the way they appear in a Python signature, e.g.
/// `["name", "*values", "level=INFO", "**config"]`.
pub fn signature(args: &[&str]) -> Vec<ArgumentSpec> {
    parse_parameters(&args.join(", "), false)
}

/// Shorthand used by packaged libraries to declare a keyword.
pub fn keyword(libname: &str, name: &str, args: &[&str], doc: &str) -> KeywordDoc {
    KeywordDoc::new(name, libname, LibraryType::Library)
        .with_args(signature(args))
        .with_doc(doc)
}
