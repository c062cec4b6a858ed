use std::path::{Path, PathBuf};

use tokio::task;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::LanguageServer;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use robotls_core::cancel::Cancelled;

use super::analysis::Analysis;
use super::config::DiagnosticsMode;
use super::state::RobotLanguageServer;
use super::utils::{diagnostics_result_id, glob_to_regex, uri_to_path};

const ROBOT_EXTENSIONS: &[&str] = &["robot", "resource"];
const WATCHED_FILES: &str = "**/*.{robot,resource,py,json,yaml,yml,libspec}";

fn server_cancelled(message: &str) -> Error {
    Error {
        code: ErrorCode::ServerError(-32802),
        message: message.to_string().into(),
        data: None,
    }
}

fn is_robot_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ROBOT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Robot files under `roots`, skipping hidden directories and anything
/// matching an exclude glob relative to its root.
pub(crate) fn scan_workspace(roots: &[PathBuf], exclude_patterns: &[String]) -> Vec<PathBuf> {
    let excludes: Vec<_> = exclude_patterns.iter().filter_map(|p| glob_to_regex(p)).collect();
    let mut files = Vec::new();
    for root in roots {
        let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|entry| {
            let hidden = entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.');
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let relative = relative.to_string_lossy().replace('\\', "/");
            !hidden && !excludes.iter().any(|re| re.is_match(&relative))
        });
        for entry in walker.filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_robot_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    files
}

impl RobotLanguageServer {
    async fn blocking<T, F>(&self, f: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&Analysis) -> Option<T> + Send + 'static,
    {
        let analysis = self.analysis.clone();
        match task::spawn_blocking(move || f(&analysis)).await {
            Ok(value) => value,
            Err(err) => {
                warn!("request task failed: {}", err);
                None
            }
        }
    }

    fn pull_supported(&self) -> bool {
        self.scheduler.settings().pull_supported
    }

    async fn load_workspace(&self) {
        let roots = self.roots();
        let excludes = self.config().exclude_patterns;
        let files = task::spawn_blocking(move || scan_workspace(&roots, &excludes))
            .await
            .unwrap_or_default();
        let mut loaded = 0usize;
        for path in files {
            match self.documents.load_from_disk(&path) {
                Ok(_) => loaded += 1,
                Err(err) => debug!("skipping {}: {:#}", path.display(), err),
            }
        }
        info!("loaded {} workspace documents", loaded);
    }

    async fn register_file_watchers(&self) {
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: vec![FileSystemWatcher {
                glob_pattern: GlobPattern::String(WATCHED_FILES.to_string()),
                kind: None,
            }],
        };
        let registration = Registration {
            id: "robotls/watchedFiles".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(options).ok(),
        };
        if let Err(err) = self.client.register_capability(vec![registration]).await {
            debug!("file watcher registration rejected: {}", err);
        }
    }

    /// Text of `path` changed outside the namespace that imported it.
    fn invalidate_path(&self, path: &Path) {
        if self.manager.invalidate(path) {
            debug!("dropped cached docs of {}", path.display());
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for RobotLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("robotls initializing with root {:?}", params.root_uri);

        let mut folders = params.workspace_folders.clone().unwrap_or_default();
        if folders.is_empty() {
            if let Some(root) = params.root_uri.clone() {
                folders.push(WorkspaceFolder {
                    name: root.path().to_string(),
                    uri: root,
                });
            }
        }
        *self.workspace_folders.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = folders;

        let capabilities = &params.capabilities;
        let refresh_supported = capabilities
            .workspace
            .as_ref()
            .and_then(|w| w.diagnostic.as_ref())
            .and_then(|d| d.refresh_support)
            .unwrap_or(false);
        let pull_supported = capabilities
            .text_document
            .as_ref()
            .and_then(|t| t.diagnostic.as_ref())
            .is_some();
        self.scheduler.update_settings(|s| {
            s.refresh_supported = refresh_supported;
            s.pull_supported = pull_supported;
        });
        debug!(
            "client diagnostics: pull={} refresh={}",
            pull_supported, refresh_supported
        );

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::INCREMENTAL),
                    will_save: None,
                    will_save_wait_until: None,
                    save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                })),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_highlight_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                code_lens_provider: Some(CodeLensOptions {
                    resolve_provider: Some(false),
                }),
                inlay_hint_provider: Some(OneOf::Right(InlayHintServerCapabilities::Options(InlayHintOptions {
                    work_done_progress_options: Default::default(),
                    resolve_provider: Some(false),
                }))),
                diagnostic_provider: Some(DiagnosticServerCapabilities::Options(DiagnosticOptions {
                    identifier: Some("robotls".to_string()),
                    inter_file_dependencies: true,
                    workspace_diagnostics: true,
                    work_done_progress_options: Default::default(),
                })),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "robotls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("robotls initialized");
        let _ = self.client.log_message(MessageType::INFO, "robotls started").await;
        self.load_config().await;
        self.register_file_watchers().await;
        self.load_workspace().await;
        self.scheduler.start();
    }

    async fn shutdown(&self) -> Result<()> {
        info!("robotls shutting down");
        self.scheduler.stop();
        Ok(())
    }

    async fn did_change_configuration(&self, _params: DidChangeConfigurationParams) {
        self.load_config().await;
        self.scheduler.force_refresh_all();
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        {
            let mut folders = self.workspace_folders.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            folders.retain(|f| !params.event.removed.iter().any(|r| r.uri == f.uri));
            folders.extend(params.event.added.iter().cloned());
        }
        self.load_workspace().await;
        self.scheduler.force_refresh_all();
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let mut structure_changed = false;
        for change in params.changes {
            let path = uri_to_path(&change.uri);
            self.invalidate_path(&path);
            if change.typ != FileChangeType::CHANGED {
                structure_changed = true;
            }
            if !is_robot_file(&path) || self.documents.is_open(&change.uri) {
                continue;
            }
            if change.typ == FileChangeType::DELETED {
                self.documents.remove(&change.uri);
                self.scheduler.close(&change.uri).await;
            } else if let Err(err) = self.documents.load_from_disk(&path) {
                debug!("could not reload {}: {:#}", path.display(), err);
            }
        }
        if structure_changed {
            self.documents.invalidate_all();
            self.scheduler.force_refresh_all();
        }
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents
            .open(&uri, params.text_document.version, &params.text_document.text);
        self.invalidate_path(&uri_to_path(&uri));
        if !self.pull_supported() {
            self.scheduler.schedule(uri, true);
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if !self
            .documents
            .change(&uri, params.text_document.version, params.content_changes)
        {
            warn!("change for unknown document {}", uri);
            return;
        }
        self.invalidate_path(&uri_to_path(&uri));
        if !self.pull_supported() {
            self.scheduler.schedule(uri, true);
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        self.invalidate_path(&uri_to_path(&uri));
        if !self.pull_supported() {
            self.scheduler.schedule(uri, true);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.close(&uri);
        self.invalidate_path(&uri_to_path(&uri));
        self.scheduler.close(&uri).await;
    }

    async fn diagnostic(&self, params: DocumentDiagnosticParams) -> Result<DocumentDiagnosticReportResult> {
        let uri = params.text_document.uri;
        let report = match self.scheduler.pull(&uri).await {
            Ok(Some(report)) => report,
            Ok(None) => return Err(server_cancelled("document is not known")),
            Err(Cancelled) => return Err(server_cancelled("diagnostics were cancelled")),
        };
        let result_id = diagnostics_result_id(report.version, &report.items);
        if params.previous_result_id.as_deref() == Some(result_id.as_str()) {
            return Ok(DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Unchanged(
                RelatedUnchangedDocumentDiagnosticReport {
                    related_documents: None,
                    unchanged_document_diagnostic_report: UnchangedDocumentDiagnosticReport { result_id },
                },
            )));
        }
        Ok(DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Full(
            RelatedFullDocumentDiagnosticReport {
                related_documents: None,
                full_document_diagnostic_report: FullDocumentDiagnosticReport {
                    result_id: Some(result_id),
                    items: report.items,
                },
            },
        )))
    }

    async fn workspace_diagnostic(&self, params: WorkspaceDiagnosticParams) -> Result<WorkspaceDiagnosticReportResult> {
        let mut items = Vec::new();
        if self.config().diagnostic_mode == DiagnosticsMode::Workspace {
            for (uri, _) in self.documents.closed_documents() {
                let report = match self.scheduler.pull(&uri).await {
                    Ok(Some(report)) => report,
                    Ok(None) => continue,
                    Err(Cancelled) => return Err(server_cancelled("workspace diagnostics were cancelled")),
                };
                let result_id = diagnostics_result_id(report.version, &report.items);
                let unchanged = params
                    .previous_result_ids
                    .iter()
                    .any(|p| p.uri == uri && p.value == result_id);
                let version = report.version.map(i64::from);
                items.push(if unchanged {
                    WorkspaceDocumentDiagnosticReport::Unchanged(WorkspaceUnchangedDocumentDiagnosticReport {
                        uri,
                        version,
                        unchanged_document_diagnostic_report: UnchangedDocumentDiagnosticReport { result_id },
                    })
                } else {
                    WorkspaceDocumentDiagnosticReport::Full(WorkspaceFullDocumentDiagnosticReport {
                        uri,
                        version,
                        full_document_diagnostic_report: FullDocumentDiagnosticReport {
                            result_id: Some(result_id),
                            items: report.items,
                        },
                    })
                });
                task::yield_now().await;
            }
        }
        Ok(WorkspaceDiagnosticReportResult::Report(WorkspaceDiagnosticReport { items }))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        Ok(self.blocking(move |a| a.hover(&uri, position)).await)
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let locations = self.blocking(move |a| a.definition(&uri, position)).await;
        Ok(locations.and_then(|mut locations| match locations.len() {
            0 => None,
            1 => locations.pop().map(GotoDefinitionResponse::Scalar),
            _ => Some(GotoDefinitionResponse::Array(locations)),
        }))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;
        let locations = self
            .blocking(move |a| a.references(&uri, position, include_declaration))
            .await;
        Ok(locations.filter(|l| !l.is_empty()))
    }

    async fn document_highlight(&self, params: DocumentHighlightParams) -> Result<Option<Vec<DocumentHighlight>>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let highlights = self.blocking(move |a| a.highlights(&uri, position)).await;
        Ok(highlights.filter(|h| !h.is_empty()))
    }

    async fn document_symbol(&self, params: DocumentSymbolParams) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let symbols = self.blocking(move |a| a.document_symbols(&uri)).await;
        Ok(symbols.map(DocumentSymbolResponse::Nested))
    }

    async fn code_lens(&self, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        if !self.config().references_code_lens {
            return Ok(None);
        }
        let uri = params.text_document.uri;
        Ok(self.blocking(move |a| a.code_lens(&uri)).await)
    }

    async fn inlay_hint(&self, params: InlayHintParams) -> Result<Option<Vec<InlayHint>>> {
        let config = self.config();
        let options = super::inlay_hints::InlayHintOptions {
            parameter_names: config.inlay_parameter_names,
            namespaces: config.inlay_namespaces,
        };
        if !options.parameter_names && !options.namespaces {
            return Ok(None);
        }
        let uri = params.text_document.uri;
        let range = params.range;
        let hints = self.blocking(move |a| a.inlay_hints(&uri, range, options)).await;
        Ok(hints.filter(|h| !h.is_empty()))
    }
}
