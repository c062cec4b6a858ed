//! Fixtures shared by the unit tests of the namespace, finder and analyzer.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::imports::{ImportsConfig, ImportsManager};
use crate::library::{keyword, KeywordDoc, LibraryRegistry, StdLibrary};
use crate::model::parse_with_source;
use crate::namespace::{DocumentType, Namespace, NamespaceOptions};

/// A small BuiltIn with the keywords the analysis treats specially.
#[derive(Debug)]
pub(crate) struct MiniBuiltIn;

impl StdLibrary for MiniBuiltIn {
    fn name(&self) -> &str {
        "BuiltIn"
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        let kw = |name: &str, args: &[&str], doc: &str| keyword("BuiltIn", name, args, doc);
        vec![
            kw("Log", &["message", "level=INFO", "html=False"], "Logs the given message."),
            kw("No Operation", &[], "Does absolutely nothing."),
            kw("Run Keyword", &["name", "*args"], "Executes the given keyword."),
            kw("Run Keyword If", &["condition", "name", "*args"], "Runs the keyword if condition is true."),
            kw("Run Keywords", &["*keywords"], "Executes all the given keywords."),
            kw("Set Test Variable", &["name", "*values"], "Makes a variable available in the test."),
            kw("Set Variable", &["*values"], "Returns the given values."),
            kw("Evaluate", &["expression", "modules=None", "namespace=None"], "Evaluates the expression."),
            kw("Should Be Equal", &["first", "second", "msg=None"], "Fails if objects are unequal."),
            kw("Old Log", &["message"], "*DEPRECATED* Use Log instead."),
        ]
    }
}

pub(crate) fn registry() -> LibraryRegistry {
    let mut registry = LibraryRegistry::new();
    registry
        .register_library(Box::new(MiniBuiltIn))
        .expect("BuiltIn registers");
    registry
}

/// Temporary workspace with files written on demand.
pub(crate) struct Workspace {
    pub dir: tempfile::TempDir,
    pub manager: Arc<ImportsManager>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_registry(registry())
    }

    pub fn with_registry(registry: LibraryRegistry) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = ImportsConfig {
            working_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let manager = Arc::new(ImportsManager::new(config, Arc::new(registry)));
        Self { dir, manager }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, text: &str) -> PathBuf {
        let path = self.root().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(&path, text).expect("write file");
        path
    }

    pub fn namespace(&self, name: &str, text: &str) -> Namespace {
        self.namespace_with(name, text, NamespaceOptions::default())
    }

    pub fn namespace_with(&self, name: &str, text: &str, options: NamespaceOptions) -> Namespace {
        let path = self.write(name, text);
        let model = Arc::new(parse_with_source(text, Some(path.clone())));
        let document_type = DocumentType::from_path(&path);
        Namespace::new(self.manager.clone(), model, path, document_type, options)
    }
}
