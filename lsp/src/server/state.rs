use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tower_lsp::lsp_types::WorkspaceFolder;
use tower_lsp::Client;

use robotls_core::imports::{DocumentSource, ImportsConfig, ImportsManager};
use robotls_core::library::LibraryRegistry;

use super::analysis::Analysis;
use super::config::ServerConfig;
use super::documents::DocumentStore;
use super::scheduler::{DiagnosticsScheduler, SchedulerSettings};
use super::utils::uri_to_path;

/// Primary LSP server state shared across handlers.
pub(crate) struct RobotLanguageServer {
    pub(crate) client: Client,
    pub(crate) documents: Arc<DocumentStore>,
    pub(crate) manager: Arc<ImportsManager>,
    pub(crate) analysis: Arc<Analysis>,
    pub(crate) scheduler: Arc<DiagnosticsScheduler>,
    pub(crate) config: Mutex<ServerConfig>,
    pub(crate) workspace_folders: Mutex<Vec<WorkspaceFolder>>,
    /// Workspace roots given on the command line, used when the client sends none.
    pub(crate) default_roots: Vec<PathBuf>,
}

impl RobotLanguageServer {
    pub(crate) fn new(client: Client, registry: Arc<LibraryRegistry>, default_roots: Vec<PathBuf>) -> Self {
        let documents = Arc::new(DocumentStore::new());
        let manager = Arc::new(ImportsManager::new(ImportsConfig::default(), registry));
        manager.set_document_source(documents.clone() as Arc<dyn DocumentSource>);
        let analysis = Arc::new(Analysis::new(documents.clone(), manager.clone()));
        let scheduler = Arc::new(DiagnosticsScheduler::new(
            analysis.clone(),
            Arc::new(client.clone()),
            SchedulerSettings::default(),
        ));
        Self {
            client,
            documents,
            manager,
            analysis,
            scheduler,
            config: Mutex::new(ServerConfig::default()),
            workspace_folders: Mutex::new(Vec::new()),
            default_roots,
        }
    }

    pub(crate) fn config(&self) -> ServerConfig {
        self.config.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Local directories of the workspace folders.
    pub(crate) fn roots(&self) -> Vec<PathBuf> {
        let folders = self.workspace_folders.lock().unwrap_or_else(PoisonError::into_inner);
        if folders.is_empty() {
            return self.default_roots.clone();
        }
        folders.iter().map(|f| uri_to_path(&f.uri)).collect()
    }

    /// Base directory for imports: the first workspace folder.
    pub(crate) fn root_dir(&self) -> PathBuf {
        self.roots()
            .into_iter()
            .next()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default()
    }
}
