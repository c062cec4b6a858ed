#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::sync::Notify;
    use tower_lsp::lsp_types::{
        Diagnostic, NumberOrString, TextDocumentContentChangeEvent, Url, WorkDoneProgress,
    };

    use robotls_core::imports::ImportsEvent;

    use crate::server::config::{DiagnosticsMode, ProgressMode};
    use crate::server::scheduler::{DiagnosticsScheduler, DiagnosticsSink, SchedulerSettings};
    use crate::test_support::Fixture;

    #[derive(Debug, Clone)]
    struct Published {
        uri: Url,
        version: Option<i32>,
        diagnostics: Vec<Diagnostic>,
    }

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<Published>>,
        progress: Mutex<Vec<&'static str>>,
        arrived: Notify,
    }

    impl RecordingSink {
        fn published(&self) -> Vec<Published> {
            self.published.lock().expect("sink lock").clone()
        }

        async fn wait_for(&self, count: usize) -> Vec<Published> {
            let wait = async {
                loop {
                    let notified = self.arrived.notified();
                    let published = self.published();
                    if published.len() >= count {
                        return published;
                    }
                    notified.await;
                }
            };
            tokio::time::timeout(Duration::from_secs(10), wait)
                .await
                .expect("diagnostics were published in time")
        }
    }

    #[tower_lsp::async_trait]
    impl DiagnosticsSink for RecordingSink {
        async fn publish(&self, uri: Url, version: Option<i32>, diagnostics: Vec<Diagnostic>) {
            self.published.lock().expect("sink lock").push(Published {
                uri,
                version,
                diagnostics,
            });
            self.arrived.notify_waiters();
        }

        async fn refresh(&self) {}

        async fn create_progress(&self, _token: &NumberOrString) -> bool {
            true
        }

        async fn progress(&self, _token: &NumberOrString, value: WorkDoneProgress) {
            let kind = match value {
                WorkDoneProgress::Begin(_) => "begin",
                WorkDoneProgress::Report(_) => "report",
                WorkDoneProgress::End(_) => "end",
            };
            self.progress.lock().expect("sink lock").push(kind);
        }
    }

    fn scheduler(fx: &Fixture, settings: SchedulerSettings) -> (Arc<DiagnosticsScheduler>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let scheduler = Arc::new(DiagnosticsScheduler::new(
            fx.analysis.clone(),
            sink.clone() as Arc<dyn DiagnosticsSink>,
            settings,
        ));
        (scheduler, sink)
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics
            .iter()
            .filter_map(|d| match &d.code {
                Some(NumberOrString::String(code)) => Some(code.clone()),
                _ => None,
            })
            .collect()
    }

    const CLEAN: &str = "*** Test Cases ***\nCase\n    Log    hello\n";
    const UNKNOWN_VARIABLE: &str = "*** Test Cases ***\nCase\n    Log    ${unknown_var}\n";

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn edits_in_quick_succession_publish_once() {
        let fx = Fixture::new();
        let (scheduler, sink) = scheduler(
            &fx,
            SchedulerSettings {
                debounce: Duration::from_millis(300),
                ..SchedulerSettings::default()
            },
        );

        let uri = fx.open("suite.robot", 1, CLEAN);
        scheduler.schedule(uri.clone(), true);
        tokio::time::sleep(Duration::from_millis(100)).await;
        fx.documents.change(
            &uri,
            2,
            vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: UNKNOWN_VARIABLE.to_string(),
            }],
        );
        scheduler.schedule(uri.clone(), true);

        let published = sink.wait_for(1).await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        let published_later = sink.published();
        assert_eq!(published_later.len(), 1, "{:?}", published_later);
        assert_eq!(published[0].uri, uri);
        assert_eq!(published[0].version, Some(2));
        assert_eq!(codes(&published[0].diagnostics), vec!["VariableNotFound".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn nothing_is_published_when_diagnostics_are_off() {
        let fx = Fixture::new();
        let (scheduler, sink) = scheduler(
            &fx,
            SchedulerSettings {
                debounce: Duration::ZERO,
                mode: DiagnosticsMode::Off,
                ..SchedulerSettings::default()
            },
        );
        let uri = fx.open("suite.robot", 1, UNKNOWN_VARIABLE);
        scheduler.schedule(uri, false);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(sink.published().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn closing_an_unsaved_document_clears_its_diagnostics() {
        let fx = Fixture::new();
        let (scheduler, sink) = scheduler(&fx, SchedulerSettings::default());
        let uri = fx.open("scratch.robot", 1, UNKNOWN_VARIABLE);
        fx.documents.close(&uri);
        scheduler.close(&uri).await;

        let published = sink.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].uri, uri);
        assert_eq!(published[0].version, None);
        assert!(published[0].diagnostics.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pulled_diagnostics_reflect_the_current_text() {
        let fx = Fixture::new();
        let (scheduler, sink) = scheduler(&fx, SchedulerSettings::default());
        assert!(scheduler.pull(&fx.uri("unknown.robot")).await.expect("not cancelled").is_none());

        let uri = fx.open("suite.robot", 3, UNKNOWN_VARIABLE);
        let report = scheduler.pull(&uri).await.expect("not cancelled").expect("known document");
        assert_eq!(report.version, Some(3));
        assert!(report.opened);
        assert_eq!(codes(&report.items), vec!["VariableNotFound".to_string()]);
        assert!(sink.published().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn edited_resources_rebuild_their_importers() {
        let fx = Fixture::new();
        let resource = fx.path("common.resource");
        fx.write("common.resource", "*** Keywords ***\nGreet\n    Log    hi\n");
        let uri = fx.open(
            "suite.robot",
            1,
            "*** Settings ***\nResource    common.resource\n\n*** Test Cases ***\nCase\n    Greet\n",
        );
        let (scheduler, _sink) = scheduler(&fx, SchedulerSettings::default());

        let before = scheduler.pull(&uri).await.expect("not cancelled").expect("known document");
        assert!(!codes(&before.items).contains(&"KeywordNotFound".to_string()));

        let mut events = fx.manager.subscribe();
        fx.write("common.resource", "*** Keywords ***\nWelcome\n    Log    hi\n");
        assert!(fx.manager.invalidate(&resource));
        let docs = match events.try_recv().expect("change event") {
            ImportsEvent::ResourcesChanged(docs) => docs,
            other => panic!("unexpected event {:?}", other),
        };
        assert_eq!(fx.analysis.invalidate_dependents(&docs), vec![uri.clone()]);

        let after = scheduler.pull(&uri).await.expect("not cancelled").expect("known document");
        assert!(codes(&after.items).contains(&"KeywordNotFound".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn workspace_mode_reports_closed_documents() {
        let fx = Fixture::new();
        fx.write("closed.robot", UNKNOWN_VARIABLE);
        let uri = fx.documents.load_from_disk(&fx.path("closed.robot")).expect("loads");
        let (scheduler, sink) = scheduler(
            &fx,
            SchedulerSettings {
                mode: DiagnosticsMode::Workspace,
                progress: ProgressMode::Simple,
                ..SchedulerSettings::default()
            },
        );
        scheduler.start();

        let published = sink.wait_for(1).await;
        scheduler.stop();
        assert_eq!(published[0].uri, uri);
        assert_eq!(published[0].version, None);
        assert_eq!(codes(&published[0].diagnostics), vec!["VariableNotFound".to_string()]);

        // Give the loop a moment to report the end of the pass.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let progress = sink.progress.lock().expect("sink lock").clone();
        assert_eq!(progress.first(), Some(&"begin"));
        assert_eq!(progress.last(), Some(&"end"));
    }
}
