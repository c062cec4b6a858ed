//! Server fixtures for unit tests: a document store and analysis over a
//! temporary directory, with the packaged libraries registered.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use tower_lsp::lsp_types::Url;

use robotls_core::imports::{DocumentSource, ImportsConfig, ImportsManager};

use crate::server::analysis::Analysis;
use crate::server::documents::DocumentStore;

pub(crate) struct Fixture {
    pub dir: TempDir,
    pub documents: Arc<DocumentStore>,
    pub manager: Arc<ImportsManager>,
    pub analysis: Arc<Analysis>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = Arc::new(robotls_stdlib::stdlib_registry().expect("stdlib registers"));
        let documents = Arc::new(DocumentStore::new());
        let manager = Arc::new(ImportsManager::new(
            ImportsConfig {
                working_dir: dir.path().to_path_buf(),
                ..ImportsConfig::default()
            },
            registry,
        ));
        manager.set_document_source(documents.clone() as Arc<dyn DocumentSource>);
        let analysis = Arc::new(Analysis::new(documents.clone(), manager.clone()));
        Self {
            dir,
            documents,
            manager,
            analysis,
        }
    }

    pub fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    pub fn uri(&self, name: &str) -> Url {
        Url::from_file_path(self.path(name)).expect("file uri")
    }

    pub fn write(&self, name: &str, text: &str) -> Url {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(&path, text).expect("write file");
        self.uri(name)
    }

    /// Open `name` in the editor with `text`, without touching the disk.
    pub fn open(&self, name: &str, version: i32, text: &str) -> Url {
        let uri = self.uri(name);
        self.documents.open(&uri, version, text);
        uri
    }
}
