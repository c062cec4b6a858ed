#[cfg(test)]
mod inlay_hint_tests {
    use tower_lsp::lsp_types::{InlayHint, InlayHintKind, InlayHintLabel, Position, Range};

    use crate::server::inlay_hints::InlayHintOptions;
    use crate::test_support::Fixture;

    const SUITE: &str = "*** Test Cases ***\n\
Case\n    Should Be Equal    a    b\n    Should Be Equal    a    second=b\n    Log    hi\n    BuiltIn.Log    hi\n";

    fn lines(start: u32, end: u32) -> Range {
        Range::new(Position::new(start, 0), Position::new(end, 200))
    }

    fn labels(hints: &[InlayHint]) -> Vec<(u32, u32, String)> {
        hints
            .iter()
            .map(|h| {
                let label = match &h.label {
                    InlayHintLabel::String(s) => s.clone(),
                    _ => String::new(),
                };
                (h.position.line, h.position.character, label)
            })
            .collect()
    }

    fn hints(range: Range, options: InlayHintOptions) -> Vec<InlayHint> {
        let fx = Fixture::new();
        let uri = fx.open("suite.robot", 1, SUITE);
        fx.analysis.inlay_hints(&uri, range, options).expect("known document")
    }

    const PARAMETERS: InlayHintOptions = InlayHintOptions {
        parameter_names: true,
        namespaces: false,
    };

    #[test]
    fn positional_arguments_get_parameter_names() {
        let hints = hints(lines(2, 2), PARAMETERS);
        assert_eq!(
            labels(&hints),
            vec![(2, 23, "first=".to_string()), (2, 28, "second=".to_string())]
        );
        assert!(hints.iter().all(|h| h.kind == Some(InlayHintKind::PARAMETER)));
    }

    #[test]
    fn named_argument_ends_the_hints() {
        let hints = hints(lines(3, 3), PARAMETERS);
        assert_eq!(labels(&hints), vec![(3, 23, "first=".to_string())]);
    }

    #[test]
    fn only_calls_inside_the_range_are_hinted() {
        let hints = hints(lines(4, 4), PARAMETERS);
        assert_eq!(labels(&hints), vec![(4, 11, "message=".to_string())]);
    }

    #[test]
    fn unqualified_calls_get_their_library_name() {
        let options = InlayHintOptions {
            parameter_names: false,
            namespaces: true,
        };
        let hints = hints(lines(4, 5), options);
        // The qualified call on line 5 needs no prefix.
        assert_eq!(labels(&hints), vec![(4, 4, "BuiltIn.".to_string())]);
        assert_eq!(hints[0].kind, Some(InlayHintKind::TYPE));
    }

    #[test]
    fn disabled_hints_produce_nothing() {
        let options = InlayHintOptions {
            parameter_names: false,
            namespaces: false,
        };
        assert!(hints(lines(0, 10), options).is_empty());
    }
}
