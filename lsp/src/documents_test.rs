#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ropey::Rope;
    use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent};

    use robotls_core::imports::DocumentSource;
    use robotls_core::token::Position as CorePosition;

    use crate::server::text::{to_core_position, to_lsp_position};
    use crate::test_support::Fixture;

    fn edit(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range::new(Position::new(start.0, start.1), Position::new(end.0, end.1))),
            range_length: None,
            text: text.to_string(),
        }
    }

    fn replace(text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn columns_convert_between_utf16_and_scalars() {
        let text = Rope::from_str("Log    😀 ${x}\nplain\n");
        // The emoji is one scalar but two UTF-16 units.
        let after_emoji = to_core_position(&text, Position::new(0, 9));
        assert_eq!(after_emoji, CorePosition::new(0, 8));
        assert_eq!(to_lsp_position(&text, CorePosition::new(0, 9)), Position::new(0, 10));
        assert_eq!(to_lsp_position(&text, CorePosition::new(1, 3)), Position::new(1, 3));
        assert_eq!(to_core_position(&text, Position::new(1, 3)), CorePosition::new(1, 3));
    }

    #[test]
    fn incremental_edits_match_full_replacement() {
        let fx = Fixture::new();
        let incremental = fx.open("a.robot", 1, "*** Test Cases ***\nCase\n    Log    one\n");
        let full = fx.open("b.robot", 1, "*** Test Cases ***\nCase\n    Log    one\n");

        let changed = fx.documents.change(
            &incremental,
            2,
            vec![edit((2, 11), (2, 14), "two"), edit((2, 4), (2, 4), "😀")],
        );
        assert!(changed);
        fx.documents
            .change(&full, 2, vec![replace("*** Test Cases ***\nCase\n    😀Log    two\n")]);

        assert_eq!(
            fx.documents.rope(&incremental).map(|r| r.to_string()),
            fx.documents.rope(&full).map(|r| r.to_string())
        );
        let snapshot = fx.documents.snapshot(&incremental).expect("known document");
        assert_eq!(snapshot.version, Some(2));
        assert!(snapshot.opened);
    }

    #[test]
    fn changes_to_unknown_documents_are_ignored() {
        let fx = Fixture::new();
        let uri = fx.uri("never-opened.robot");
        assert!(!fx.documents.change(&uri, 3, vec![replace("x")]));
        assert!(fx.documents.snapshot(&uri).is_none());
    }

    #[test]
    fn cache_is_built_once_per_text_and_sees_the_previous_value() {
        let fx = Fixture::new();
        let uri = fx.open("a.robot", 1, "one");
        let builds = AtomicUsize::new(0);
        let build = |snapshot: &crate::server::documents::DocumentSnapshot, previous: Option<std::sync::Arc<String>>| {
            builds.fetch_add(1, Ordering::SeqCst);
            match previous {
                Some(previous) => format!("{} -> {}", previous, snapshot.text),
                None => snapshot.text.to_string(),
            }
        };

        let first = fx.documents.get_cache::<String, _>(&uri, build).expect("value");
        let again = fx.documents.get_cache::<String, _>(&uri, build).expect("value");
        assert_eq!(*first, "one");
        assert!(std::sync::Arc::ptr_eq(&first, &again));
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        fx.documents.change(&uri, 2, vec![replace("two")]);
        assert!(fx.documents.cached::<String>(&uri).is_none());
        let second = fx.documents.get_cache::<String, _>(&uri, build).expect("value");
        assert_eq!(*second, "one -> two");
        assert_eq!(builds.load(Ordering::SeqCst), 2);

        fx.documents.invalidate(&uri);
        let rebuilt = fx.documents.get_cache::<String, _>(&uri, build).expect("value");
        assert_eq!(*rebuilt, "two");
    }

    #[test]
    fn every_edit_is_announced_once() {
        let fx = Fixture::new();
        let mut events = fx.documents.subscribe();
        let uri = fx.open("a.robot", 1, "one");
        fx.documents.change(&uri, 2, vec![edit((0, 3), (0, 3), "!")]);
        fx.documents.change(&uri, 3, vec![edit((0, 0), (0, 0), "x"), edit((0, 0), (0, 0), "y")]);

        let mut seen = Vec::new();
        while let Ok(announced) = events.try_recv() {
            seen.push(announced);
        }
        assert_eq!(seen, vec![uri.clone(), uri.clone(), uri]);
    }

    #[test]
    fn closing_keeps_files_that_exist_on_disk() {
        let fx = Fixture::new();
        let saved = fx.write("saved.robot", "on disk\n");
        fx.documents.open(&saved, 4, "unsaved edits\n");
        let scratch = fx.open("scratch.robot", 1, "scratch\n");

        fx.documents.close(&saved);
        fx.documents.close(&scratch);

        let snapshot = fx.documents.snapshot(&saved).expect("still known");
        assert!(!snapshot.opened);
        assert_eq!(snapshot.version, None);
        assert_eq!(snapshot.text.to_string(), "on disk\n");
        assert!(!fx.documents.contains(&scratch));
        assert_eq!(fx.documents.closed_documents().len(), 1);
    }

    #[test]
    fn only_open_documents_shadow_the_disk() {
        let fx = Fixture::new();
        let loaded = fx.write("loaded.robot", "from disk\n");
        let path = fx.path("loaded.robot");
        assert_eq!(fx.documents.load_from_disk(&path).expect("loads"), loaded);
        assert_eq!(fx.documents.text(&path), None);

        fx.documents.open(&loaded, 1, "from editor\n");
        assert_eq!(fx.documents.text(&path).as_deref(), Some("from editor\n"));

        // Loading again must not clobber the editor's text.
        fx.documents.load_from_disk(&path).expect("loads");
        assert_eq!(fx.documents.text(&path).as_deref(), Some("from editor\n"));
    }
}
