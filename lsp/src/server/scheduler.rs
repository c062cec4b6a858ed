use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use dashmap::{DashMap, DashSet};
use tokio::sync::{broadcast, Mutex as AsyncMutex, Notify, Semaphore};
use tokio::task;
use tokio::time::{sleep, Duration};
use tower_lsp::lsp_types::request::{WorkDoneProgressCreate, WorkspaceDiagnosticRefresh};
use tower_lsp::lsp_types::{
    notification, Diagnostic, NumberOrString, ProgressParams, ProgressParamsValue, Url, WorkDoneProgress,
    WorkDoneProgressBegin, WorkDoneProgressCreateParams, WorkDoneProgressEnd, WorkDoneProgressReport,
};
use tower_lsp::Client;
use tracing::{debug, warn};

use robotls_core::cancel::{CancellationToken, Cancelled};
use robotls_core::imports::ImportsEvent;

use super::analysis::{Analysis, DocumentDiagnostics};
use super::config::{DiagnosticsMode, ProgressMode, ServerConfig};
use super::utils::uri_to_path;

pub(crate) const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(750);
const IDLE_TICK: Duration = Duration::from_secs(1);
const REFRESH_DEBOUNCE: Duration = Duration::from_millis(500);
const WORKSPACE_PROGRESS_TOKEN: &str = "robotls/workspaceDiagnostics";

/// Where finished diagnostics go.
#[tower_lsp::async_trait]
pub(crate) trait DiagnosticsSink: Send + Sync + 'static {
    async fn publish(&self, uri: Url, version: Option<i32>, diagnostics: Vec<Diagnostic>);

    /// Ask the client to pull diagnostics again.
    async fn refresh(&self);

    async fn create_progress(&self, token: &NumberOrString) -> bool;

    async fn progress(&self, token: &NumberOrString, value: WorkDoneProgress);
}

#[tower_lsp::async_trait]
impl DiagnosticsSink for Client {
    async fn publish(&self, uri: Url, version: Option<i32>, diagnostics: Vec<Diagnostic>) {
        self.publish_diagnostics(uri, diagnostics, version).await;
    }

    async fn refresh(&self) {
        if let Err(err) = self.send_request::<WorkspaceDiagnosticRefresh>(()).await {
            debug!("diagnostic refresh rejected: {}", err);
        }
    }

    async fn create_progress(&self, token: &NumberOrString) -> bool {
        self.send_request::<WorkDoneProgressCreate>(WorkDoneProgressCreateParams { token: token.clone() })
            .await
            .is_ok()
    }

    async fn progress(&self, token: &NumberOrString, value: WorkDoneProgress) {
        self.send_notification::<notification::Progress>(ProgressParams {
            token: token.clone(),
            value: ProgressParamsValue::WorkDone(value),
        })
        .await;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SchedulerSettings {
    pub(crate) debounce: Duration,
    pub(crate) mode: DiagnosticsMode,
    pub(crate) progress: ProgressMode,
    /// Client handles `workspace/diagnostic/refresh`.
    pub(crate) refresh_supported: bool,
    /// Client pulls document diagnostics itself.
    pub(crate) pull_supported: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            mode: DiagnosticsMode::default(),
            progress: ProgressMode::default(),
            refresh_supported: false,
            pull_supported: false,
        }
    }
}

struct DocumentTask {
    id: u64,
    cancel: CancellationToken,
}

/// Runs document analyses off the protocol loop and publishes their results.
///
/// Each document has at most one task; scheduling a new one cancels the
/// previous. Results computed for an outdated revision are dropped.
pub(crate) struct DiagnosticsScheduler {
    analysis: Arc<Analysis>,
    sink: Arc<dyn DiagnosticsSink>,
    settings: RwLock<SchedulerSettings>,
    limiter: Mutex<Arc<Semaphore>>,
    permits: AtomicU64,
    tasks: DashMap<Url, DocumentTask>,
    next_task: AtomicU64,
    /// Revision each document was last analysed at.
    analysed: DashMap<Url, u64>,
    forced: DashSet<Url>,
    publish_lock: AsyncMutex<()>,
    wake: Notify,
    refresh_pending: AtomicBool,
    stopped: CancellationToken,
}

impl DiagnosticsScheduler {
    pub(crate) fn new(analysis: Arc<Analysis>, sink: Arc<dyn DiagnosticsSink>, settings: SchedulerSettings) -> Self {
        Self {
            analysis,
            sink,
            settings: RwLock::new(settings),
            limiter: Mutex::new(Arc::new(Semaphore::new(2))),
            permits: AtomicU64::new(2),
            tasks: DashMap::new(),
            next_task: AtomicU64::new(0),
            analysed: DashMap::new(),
            forced: DashSet::new(),
            publish_lock: AsyncMutex::new(()),
            wake: Notify::new(),
            refresh_pending: AtomicBool::new(false),
            stopped: CancellationToken::new(),
        }
    }

    pub(crate) fn settings(&self) -> SchedulerSettings {
        self.settings.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn update_settings(&self, update: impl FnOnce(&mut SchedulerSettings)) {
        let mut guard = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut guard);
    }

    pub(crate) fn configure(&self, config: &ServerConfig) {
        self.update_settings(|s| {
            s.mode = config.diagnostic_mode;
            s.progress = config.progress_mode;
        });
        let permits = config.max_concurrent.max(1) as u64;
        if self.permits.swap(permits, Ordering::SeqCst) != permits {
            *self.limiter.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(Semaphore::new(permits as usize));
            debug!("diagnostics limited to {} concurrent analyses", permits);
        }
        self.wake.notify_one();
    }

    fn limiter(&self) -> Arc<Semaphore> {
        self.limiter.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Start the workspace loop and the import change listener.
    pub(crate) fn start(self: &Arc<Self>) {
        let this = self.clone();
        tokio::spawn(async move { this.workspace_loop().await });
        let this = self.clone();
        let events = self.analysis.manager().subscribe();
        tokio::spawn(async move { this.watch_imports(events).await });
        let this = self.clone();
        let edits = self.analysis.documents().subscribe();
        tokio::spawn(async move { this.watch_documents(edits).await });
    }

    pub(crate) fn stop(&self) {
        self.stopped.cancel();
        for task in self.tasks.iter() {
            task.cancel.cancel();
        }
        self.tasks.clear();
        self.wake.notify_waiters();
    }

    /// Register a new task for `uri`, cancelling the one in flight.
    fn begin_task(&self, uri: &Url) -> (u64, CancellationToken) {
        let cancel = CancellationToken::new();
        let id = self.next_task.fetch_add(1, Ordering::Relaxed);
        let task = DocumentTask {
            id,
            cancel: cancel.clone(),
        };
        if let Some(previous) = self.tasks.insert(uri.clone(), task) {
            previous.cancel.cancel();
            debug!("cancelled diagnostics task {} of {}", previous.id, uri);
        }
        (id, cancel)
    }

    fn end_task(&self, uri: &Url, id: u64) {
        self.tasks.remove_if(uri, |_, task| task.id == id);
    }

    /// Analyse `uri` after the debounce delay and publish the result.
    pub(crate) fn schedule(self: &Arc<Self>, uri: Url, debounce: bool) {
        let settings = self.settings();
        if settings.mode == DiagnosticsMode::Off || self.stopped.is_cancelled() {
            return;
        }
        let (id, cancel) = self.begin_task(&uri);
        let delay = if debounce { settings.debounce } else { Duration::ZERO };
        let this = self.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            this.run_task(uri, id, cancel).await;
        });
    }

    async fn compute(&self, uri: &Url, cancel: &CancellationToken) -> Result<Option<DocumentDiagnostics>, Cancelled> {
        cancel.check()?;
        let limiter = self.limiter();
        let Ok(_permit) = limiter.acquire_owned().await else {
            return Err(Cancelled);
        };
        cancel.check()?;
        let analysis = self.analysis.clone();
        let task_uri = uri.clone();
        let task_cancel = cancel.clone();
        match task::spawn_blocking(move || analysis.diagnostics(&task_uri, &task_cancel)).await {
            Ok(result) => result,
            Err(err) => {
                warn!("diagnostics of {} failed: {}", uri, err);
                Ok(None)
            }
        }
    }

    async fn run_task(&self, uri: Url, id: u64, cancel: CancellationToken) {
        let report = match self.compute(&uri, &cancel).await {
            Ok(Some(report)) => report,
            Ok(None) => {
                self.end_task(&uri, id);
                return;
            }
            Err(Cancelled) => {
                debug!("diagnostics task {} of {} cancelled", id, uri);
                return;
            }
        };
        self.publish(&uri, id, &cancel, report).await;
    }

    /// Publish unless the task was cancelled or the text moved on meanwhile.
    async fn publish(&self, uri: &Url, id: u64, cancel: &CancellationToken, report: DocumentDiagnostics) -> bool {
        let _guard = self.publish_lock.lock().await;
        if cancel.is_cancelled() {
            return false;
        }
        self.end_task(uri, id);
        if self.analysis.documents().revision(uri) != Some(report.revision) {
            debug!("dropping diagnostics of {} for outdated revision {}", uri, report.revision);
            return false;
        }
        self.analysed.insert(uri.clone(), report.revision);
        self.sink.publish(uri.clone(), report.version, report.items).await;
        true
    }

    /// Forget a closed document; its diagnostics are cleared unless the
    /// workspace is analysed as a whole.
    pub(crate) async fn close(&self, uri: &Url) {
        if let Some((_, task)) = self.tasks.remove(uri) {
            task.cancel.cancel();
        }
        if self.settings().mode == DiagnosticsMode::Workspace && self.analysis.documents().contains(uri) {
            self.forced.insert(uri.clone());
            self.wake.notify_one();
            return;
        }
        self.analysed.remove(uri);
        let _guard = self.publish_lock.lock().await;
        self.sink.publish(uri.clone(), None, Vec::new()).await;
    }

    /// Diagnostics for a `textDocument/diagnostic` request, computed now.
    pub(crate) async fn pull(&self, uri: &Url) -> Result<Option<DocumentDiagnostics>, Cancelled> {
        if !self.analysis.documents().contains(uri) {
            return Ok(None);
        }
        let (id, cancel) = self.begin_task(uri);
        let report = self.compute(uri, &cancel).await;
        self.end_task(uri, id);
        if let Ok(Some(report)) = &report {
            self.analysed.insert(uri.clone(), report.revision);
        }
        report
    }

    /// Debounced `workspace/diagnostic/refresh`.
    pub(crate) fn refresh(self: &Arc<Self>) {
        if !self.settings().refresh_supported || self.refresh_pending.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            sleep(REFRESH_DEBOUNCE).await;
            this.refresh_pending.store(false, Ordering::SeqCst);
            this.sink.refresh().await;
        });
    }

    pub(crate) fn force_refresh_all(self: &Arc<Self>) {
        self.analysed.clear();
        let documents = self.analysis.documents();
        for uri in documents.uris() {
            self.forced.insert(uri.clone());
            if documents.is_open(&uri) && !self.settings().pull_supported {
                self.schedule(uri, true);
            }
        }
        self.wake.notify_one();
        self.refresh();
    }

    pub(crate) fn force_refresh_document(self: &Arc<Self>, uri: &Url) {
        self.forced.insert(uri.clone());
        self.wake.notify_one();
        if self.analysis.documents().is_open(uri) {
            if self.settings().pull_supported {
                self.refresh();
            } else {
                self.schedule(uri.clone(), true);
            }
        }
    }

    /// Closed documents that changed since their last analysis.
    fn pending_workspace_documents(&self) -> Vec<Url> {
        if self.settings().mode != DiagnosticsMode::Workspace {
            return Vec::new();
        }
        self.analysis
            .documents()
            .closed_documents()
            .into_iter()
            .filter(|(uri, revision)| {
                self.forced.contains(uri) || self.analysed.get(uri).map(|r| *r) != Some(*revision)
            })
            .map(|(uri, _)| uri)
            .collect()
    }

    async fn workspace_loop(self: Arc<Self>) {
        debug!("workspace diagnostics loop started");
        while !self.stopped.is_cancelled() {
            let pending = self.pending_workspace_documents();
            if pending.is_empty() {
                tokio::select! {
                    _ = self.wake.notified() => {}
                    _ = sleep(IDLE_TICK) => {}
                }
                continue;
            }
            self.analyse_workspace(pending).await;
        }
        debug!("workspace diagnostics loop stopped");
    }

    async fn analyse_workspace(&self, pending: Vec<Url>) {
        let progress = self.settings().progress;
        let token = NumberOrString::String(WORKSPACE_PROGRESS_TOKEN.to_string());
        let reporting = progress != ProgressMode::Off && self.sink.create_progress(&token).await;
        if reporting {
            self.sink
                .progress(
                    &token,
                    WorkDoneProgress::Begin(WorkDoneProgressBegin {
                        title: "Analysing workspace".to_string(),
                        cancellable: Some(false),
                        message: None,
                        percentage: Some(0),
                    }),
                )
                .await;
        }
        let root = self.analysis.manager().config().working_dir;
        let total = pending.len();
        for (index, uri) in pending.into_iter().enumerate() {
            if self.stopped.is_cancelled() || self.settings().mode != DiagnosticsMode::Workspace {
                break;
            }
            self.forced.remove(&uri);
            if self.analysis.documents().is_open(&uri) {
                continue;
            }
            if reporting {
                let message = match progress {
                    ProgressMode::Detailed => {
                        let path = uri_to_path(&uri);
                        Some(path.strip_prefix(&root).unwrap_or(&path).display().to_string())
                    }
                    _ => Some(format!("{}/{}", index + 1, total)),
                };
                self.sink
                    .progress(
                        &token,
                        WorkDoneProgress::Report(WorkDoneProgressReport {
                            cancellable: Some(false),
                            message,
                            percentage: Some((index * 100 / total.max(1)) as u32),
                        }),
                    )
                    .await;
            }
            let (id, cancel) = self.begin_task(&uri);
            match self.compute(&uri, &cancel).await {
                Ok(Some(report)) if !report.opened => {
                    self.publish(&uri, id, &cancel, report).await;
                }
                Ok(_) => self.end_task(&uri, id),
                Err(Cancelled) => debug!("workspace diagnostics of {} cancelled", uri),
            }
            task::yield_now().await;
        }
        if reporting {
            self.sink
                .progress(
                    &token,
                    WorkDoneProgress::End(WorkDoneProgressEnd {
                        message: Some(format!("{} documents analysed", total)),
                    }),
                )
                .await;
        }
    }

    /// Wake the workspace loop whenever a document's text changes.
    async fn watch_documents(self: Arc<Self>, mut edits: broadcast::Receiver<Url>) {
        loop {
            match edits.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
            if self.stopped.is_cancelled() {
                break;
            }
            self.wake.notify_one();
        }
    }

    /// Rebuild the namespaces that reached a doc the imports manager dropped.
    async fn watch_imports(self: Arc<Self>, mut events: broadcast::Receiver<ImportsEvent>) {
        loop {
            let docs = match events.recv().await {
                Ok(ImportsEvent::LibrariesChanged(docs))
                | Ok(ImportsEvent::ResourcesChanged(docs))
                | Ok(ImportsEvent::VariablesChanged(docs)) => docs,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("missed {} import change events, rebuilding every namespace", skipped);
                    self.analysis.documents().invalidate_all();
                    self.force_refresh_all();
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if self.stopped.is_cancelled() {
                break;
            }
            let invalidated = self.analysis.invalidate_dependents(&docs);
            debug!("{} changed docs invalidated {} namespaces", docs.len(), invalidated.len());
            for uri in invalidated {
                self.force_refresh_document(&uri);
            }
        }
    }
}
