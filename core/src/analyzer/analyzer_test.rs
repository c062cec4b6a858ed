#[cfg(test)]
mod tests {
    use crate::cancel::CancellationToken;
    use crate::diagnostics::{codes, Diagnostic, DiagnosticTag, Severity};
    use crate::matcher::normalize_namespace;
    use crate::namespace::{EntryRef, Namespace, NamespaceOptions};
    use crate::test_support::Workspace;
    use crate::token::{Position, Range};

    fn range(line: u32, start: u32, end: u32) -> Range {
        Range::new(Position::new(line, start), Position::new(line, end))
    }

    fn diagnostics(namespace: &Namespace) -> Vec<Diagnostic> {
        namespace.diagnostics(&CancellationToken::new()).unwrap()
    }

    fn with_code<'a>(diagnostics: &'a [Diagnostic], code: &str) -> Vec<&'a Diagnostic> {
        diagnostics.iter().filter(|d| d.code == code).collect()
    }

    fn referenced_names(namespace: &Namespace) -> Vec<String> {
        let result = namespace.analyze(&CancellationToken::new()).unwrap();
        result.keyword_references.keys().map(|k| k.name.clone()).collect()
    }

    #[test]
    fn undefined_variable_is_reported_at_its_range() {
        let ws = Workspace::new();
        let ns = ws.namespace("first.robot", "*** Test Cases ***\nFirst\n    Log    ${undefined}\n");
        let found = diagnostics(&ns);
        assert_eq!(found.len(), 1, "{found:?}");
        assert_eq!(found[0].code, codes::VARIABLE_NOT_FOUND);
        assert_eq!(found[0].severity, Severity::Error);
        assert_eq!(found[0].message, "Variable '${undefined}' not found.");
        assert_eq!(found[0].range, range(2, 11, 23));
    }

    #[test]
    fn missing_keyword_and_reserved_words() {
        let ws = Workspace::new();
        let ns = ws.namespace("missing.robot", "*** Test Cases ***\nT\n    Missing\n    for    x\n");
        let found = diagnostics(&ns);
        let missing = with_code(&found, codes::KEYWORD_NOT_FOUND);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].message, "No keyword with name 'Missing' found.");
        assert_eq!(missing[0].range, range(2, 4, 11));
        let reserved = with_code(&found, codes::RESERVED_KEYWORD);
        assert_eq!(reserved[0].message, "'for' is a reserved keyword.");
    }

    #[test]
    fn local_assignments_are_visible_afterwards() {
        let ws = Workspace::new();
        let ns = ws.namespace(
            "assign.robot",
            "*** Test Cases ***\nT\n    Log    ${later}\n    ${later}=    Set Variable    1\n    Log    ${later}\n    Set Test Variable    ${shared}    2\n    Log    ${shared}\n",
        );
        let all_diagnostics = diagnostics(&ns);
        let found = with_code(&all_diagnostics, codes::VARIABLE_NOT_FOUND);
        assert_eq!(found.len(), 1, "{found:?}");
        assert_eq!(found[0].range.start.line, 2);
    }

    #[test]
    fn run_keyword_arguments_reference_inner_keywords() {
        let ws = Workspace::new();
        let ns = ws.namespace(
            "run.robot",
            "*** Test Cases ***\nT\n    Run Keyword If    ${TRUE}    Log    yes    ELSE    No Operation\n    Run Keywords    Log    a    AND    Nope\n",
        );
        let names = referenced_names(&ns);
        for expected in ["Run Keyword If", "Log", "No Operation", "Run Keywords"] {
            assert!(names.iter().any(|n| n == expected), "{expected} missing from {names:?}");
        }
        let all_diagnostics = diagnostics(&ns);
        let missing = with_code(&all_diagnostics, codes::KEYWORD_NOT_FOUND);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].message, "No keyword with name 'Nope' found.");
    }

    #[test]
    fn argument_count_is_checked() {
        let ws = Workspace::new();
        let ns = ws.namespace("args.robot", "*** Test Cases ***\nT\n    Log\n    No Operation    extra\n");
        let all_diagnostics = diagnostics(&ns);
        let found = with_code(&all_diagnostics, "ArgumentError");
        assert_eq!(found.len(), 2, "{found:?}");
        assert_eq!(found[0].range, range(2, 4, 7));
    }

    #[test]
    fn owner_prefix_and_named_arguments_have_own_references() {
        let ws = Workspace::new();
        let ns = ws.namespace("owner.robot", "*** Test Cases ***\nT\n    BuiltIn.Log    hi    level=DEBUG\n");
        let source = ns.source().to_path_buf();
        let result = ns.analyze(&CancellationToken::new()).unwrap();
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

        let (kw, name_range) = result.keyword_at(&source, Position::new(2, 13)).unwrap();
        assert_eq!(kw.name, "Log");
        assert_eq!(name_range, range(2, 12, 15));

        let (entry, owner_range) = result.namespace_at(&source, Position::new(2, 5)).unwrap();
        assert_eq!(entry, EntryRef::Library(normalize_namespace("BuiltIn")));
        assert_eq!(owner_range, range(2, 4, 11));

        let (argument, arg_range) = result.argument_at(&source, Position::new(2, 27)).unwrap();
        assert_eq!(argument.name, "level");
        assert_eq!(arg_range, range(2, 25, 30));
    }

    #[test]
    fn custom_library_wins_over_standard_one() {
        let ws = Workspace::new();
        ws.write("mylib.py", "def log(message):\n    pass\n");
        let ns = ws.namespace("custom.robot", "*** Settings ***\nLibrary    mylib\n\n*** Test Cases ***\nT\n    Log    hi\n");
        let found = diagnostics(&ns);
        let conflicts = with_code(&found, codes::CONFLICTING_LIBRARY_KEYWORDS);
        assert_eq!(conflicts.len(), 1, "{found:?}");
        assert_eq!(conflicts[0].severity, Severity::Warning);
        assert!(conflicts[0]
            .message
            .starts_with("Keyword 'Log' found both from a custom library 'mylib' and a standard library 'BuiltIn'."));
        let resolved = ns.find_keyword("Log").unwrap();
        assert_eq!(resolved.libname, "mylib");
    }

    #[test]
    fn most_specific_embedded_keyword_wins() {
        let ws = Workspace::new();
        let ns = ws.namespace(
            "embedded.robot",
            "*** Test Cases ***\nT\n    Do it quickly\n    Say Hello\n\n*** Keywords ***\nDo ${a}\n    No Operation\n\nDo ${a} quickly\n    No Operation\n\nSay ${x}\n    No Operation\n\n${y} Hello\n    No Operation\n",
        );
        let names = referenced_names(&ns);
        assert!(names.iter().any(|n| n == "Do ${a} quickly"), "{names:?}");
        assert!(!names.iter().any(|n| n == "Do ${a}"), "{names:?}");
        let all_diagnostics = diagnostics(&ns);
        let errors = with_code(&all_diagnostics, codes::KEYWORD_ERROR);
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .starts_with("Multiple keywords matching name 'Say Hello' found:"));
        assert_eq!(errors[0].range.start.line, 3);
    }

    #[test]
    fn deprecated_keyword_is_hinted() {
        let ws = Workspace::new();
        let ns = ws.namespace("old.robot", "*** Test Cases ***\nT\n    Old Log    x\n");
        let all_diagnostics = diagnostics(&ns);
        let found = with_code(&all_diagnostics, codes::DEPRECATED_KEYWORD);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Hint);
        assert_eq!(found[0].message, "Keyword 'BuiltIn.Old Log' is deprecated. Use Log instead.");
        assert_eq!(found[0].tags, vec![DiagnosticTag::Deprecated]);
    }

    #[test]
    fn code_after_return_is_unreachable() {
        let ws = Workspace::new();
        let ns = ws.namespace(
            "unreachable.robot",
            "*** Keywords ***\nStop Early\n    RETURN\n    # fine\n    Log    never\n",
        );
        let all_diagnostics = diagnostics(&ns);
        let found = with_code(&all_diagnostics, codes::CODE_UNREACHABLE);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].range.start.line, 4);
        assert_eq!(found[0].tags, vec![DiagnosticTag::Unnecessary]);
    }

    #[test]
    fn unused_keywords_and_variables_when_enabled() {
        let ws = Workspace::new();
        let options = NamespaceOptions {
            find_unused: true,
            ..Default::default()
        };
        let ns = ws.namespace_with(
            "unused.robot",
            "*** Test Cases ***\nT\n    Helper\n\n*** Keywords ***\nHelper\n    ${used}=    Set Variable    1\n    ${unused}=    Set Variable    2\n    ${_ignored}=    Set Variable    3\n    Log    ${used}\n\nNever Called\n    No Operation\n",
            options,
        );
        let found = diagnostics(&ns);
        let variables = with_code(&found, codes::VARIABLE_NOT_USED);
        assert_eq!(variables.len(), 1, "{variables:?}");
        assert!(variables[0].message.contains("${unused}"));
        let keywords = with_code(&found, codes::KEYWORD_NOT_USED);
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].message, "Keyword 'Never Called' is not used.");
    }

    #[test]
    fn ignore_comment_suppresses_line() {
        let ws = Workspace::new();
        let ns = ws.namespace(
            "ignored.robot",
            "*** Test Cases ***\nT\n    Log    ${nope}    # robotcode: ignore\n    Log    ${nope}\n",
        );
        let found = diagnostics(&ns);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].range.start.line, 3);
    }

    #[test]
    fn expression_variables_are_checked() {
        let ws = Workspace::new();
        let ns = ws.namespace(
            "expr.robot",
            "*** Test Cases ***\nT\n    ${x}=    Set Variable    1\n    IF    $x > 0\n        Log    '$notvar'\n    END\n    Evaluate    $x + $y\n",
        );
        let all_diagnostics = diagnostics(&ns);
        let found = with_code(&all_diagnostics, codes::VARIABLE_NOT_FOUND);
        assert_eq!(found.len(), 1, "{found:?}");
        assert_eq!(found[0].message, "Variable '$y' not found.");
        assert_eq!(found[0].range, range(6, 21, 23));
    }

    #[test]
    fn deprecated_settings_follow_robot_version() {
        let ws = Workspace::new();
        let text = "*** Settings ***\nForce Tags    smoke\n\n*** Keywords ***\nK\n    [Return]    1\n";
        let current = ws.namespace("settings.robot", text);
        let found = diagnostics(&current);
        assert_eq!(with_code(&found, codes::DEPRECATED_FORCE_TAG).len(), 1);
        assert_eq!(with_code(&found, codes::DEPRECATED_RETURN_SETTING).len(), 1);

        let options = NamespaceOptions {
            robot_version: (5, 0),
            ..Default::default()
        };
        let old = ws.namespace_with("settings_old.robot", text, options);
        assert!(diagnostics(&old).is_empty());
    }

    #[test]
    fn cancelled_analysis_is_not_cached() {
        let ws = Workspace::new();
        let ns = ws.namespace("cancel.robot", "*** Test Cases ***\nT\n    Log    hi\n");
        let token = CancellationToken::new();
        token.cancel();
        assert!(ns.analyze(&token).is_err());
        assert!(ns.cached_analysis().is_none());
        assert!(ns.analyze(&CancellationToken::new()).is_ok());
        assert!(ns.cached_analysis().is_some());
    }
}
