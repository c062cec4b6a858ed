#[cfg(test)]
mod tests {
    use tower_lsp::lsp_types::{DocumentHighlightKind, HoverContents, Position};

    use crate::test_support::Fixture;

    const SUITE: &str = "*** Variables ***
${GREETING}    hello

*** Test Cases ***
Case
    Greet    ${GREETING}
    Greet    world

*** Keywords ***
Greet
    [Arguments]    ${name}
    Log    ${name}
";

    fn hover_text(fx: &Fixture, line: u32, character: u32) -> String {
        let uri = fx.uri("suite.robot");
        let hover = fx
            .analysis
            .hover(&uri, Position::new(line, character))
            .expect("something to hover");
        match hover.contents {
            HoverContents::Markup(markup) => markup.value,
            other => panic!("unexpected hover {:?}", other),
        }
    }

    #[test]
    fn hover_shows_keyword_documentation() {
        let fx = Fixture::new();
        fx.open("suite.robot", 1, SUITE);
        let text = hover_text(&fx, 11, 5);
        assert!(text.contains("Log"), "{}", text);
        assert!(text.contains("Logs the given message"), "{}", text);
    }

    #[test]
    fn hover_shows_variable_value() {
        let fx = Fixture::new();
        fx.open("suite.robot", 1, SUITE);
        let text = hover_text(&fx, 5, 16);
        assert!(text.contains("${GREETING}"), "{}", text);
        assert!(text.contains("hello"), "{}", text);
    }

    #[test]
    fn definition_of_a_call_is_its_keyword() {
        let fx = Fixture::new();
        let uri = fx.open("suite.robot", 1, SUITE);
        let locations = fx.analysis.definition(&uri, Position::new(5, 5)).expect("definition");
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].uri, uri);
        assert_eq!(locations[0].range.start.line, 9);
    }

    #[test]
    fn definition_follows_resource_imports() {
        let fx = Fixture::new();
        let resource = fx.write("common.resource", "*** Keywords ***\nShared Step\n    Log    shared\n");
        let uri = fx.open(
            "suite.robot",
            1,
            "*** Settings ***\nResource    common.resource\n\n*** Test Cases ***\nCase\n    Shared Step\n",
        );
        let locations = fx.analysis.definition(&uri, Position::new(5, 6)).expect("definition");
        assert_eq!(locations[0].uri, resource);
        assert_eq!(locations[0].range.start.line, 1);
    }

    #[test]
    fn references_list_every_call() {
        let fx = Fixture::new();
        let uri = fx.open("suite.robot", 1, SUITE);
        let without = fx.analysis.references(&uri, Position::new(5, 5), false).expect("references");
        let lines: Vec<u32> = without.iter().map(|l| l.range.start.line).collect();
        assert_eq!(lines, vec![5, 6]);

        let with = fx.analysis.references(&uri, Position::new(9, 2), true).expect("references");
        assert_eq!(with.len(), 3);
        assert_eq!(with[0].range.start.line, 9);
    }

    #[test]
    fn highlights_mark_the_declaration_as_write() {
        let fx = Fixture::new();
        let uri = fx.open("suite.robot", 1, SUITE);
        let highlights = fx.analysis.highlights(&uri, Position::new(6, 6)).expect("highlights");
        assert_eq!(highlights.len(), 3);
        assert_eq!(highlights[0].kind, Some(DocumentHighlightKind::WRITE));
        assert_eq!(highlights[0].range.start.line, 9);
        assert!(highlights[1..]
            .iter()
            .all(|h| h.kind == Some(DocumentHighlightKind::READ)));
    }

    #[test]
    fn code_lens_counts_references() {
        let fx = Fixture::new();
        let uri = fx.open("suite.robot", 1, SUITE);
        let lenses = fx.analysis.code_lens(&uri).expect("lenses");
        assert_eq!(lenses.len(), 1);
        let command = lenses[0].command.as_ref().expect("command");
        assert_eq!(command.title, "2 references");
        assert_eq!(command.command, "editor.action.showReferences");
    }

    #[test]
    fn symbols_follow_the_sections() {
        let fx = Fixture::new();
        let uri = fx.open("suite.robot", 1, SUITE);
        let symbols = fx.analysis.document_symbols(&uri).expect("symbols");
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Variables", "Test Cases", "Keywords"]);
        let children = |index: usize| -> Vec<String> {
            symbols[index]
                .children
                .as_ref()
                .map(|c| c.iter().map(|s| s.name.clone()).collect())
                .unwrap_or_default()
        };
        assert_eq!(children(0), vec!["${GREETING}".to_string()]);
        assert_eq!(children(1), vec!["Case".to_string()]);
        assert_eq!(children(2), vec!["Greet".to_string()]);
    }

    #[test]
    fn unknown_documents_have_no_answers() {
        let fx = Fixture::new();
        let uri = fx.uri("missing.robot");
        assert!(fx.analysis.hover(&uri, Position::new(0, 0)).is_none());
        assert!(fx.analysis.document_symbols(&uri).is_none());
    }
}
