#[cfg(test)]
mod tests {
    use crate::cancel::CancellationToken;
    use crate::diagnostics::{codes, Diagnostic, Severity};
    use crate::namespace::{EntryRef, Namespace};
    use crate::test_support::Workspace;
    use crate::token::{Position, Range};

    fn diagnostics(namespace: &Namespace) -> Vec<Diagnostic> {
        namespace.diagnostics(&CancellationToken::new()).unwrap()
    }

    fn codes_of(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn builtin_is_imported_by_default() {
        let ws = Workspace::new();
        let ns = ws.namespace("plain.robot", "*** Test Cases ***\nT\n    No Operation\n");
        let libraries = ns.get_libraries();
        assert_eq!(libraries.len(), 1);
        assert_eq!(libraries[0].name, "BuiltIn");
        assert!(libraries[0].import.is_none());
        assert_eq!(ns.find_keyword("log").unwrap().libname, "BuiltIn");
        assert!(diagnostics(&ns).is_empty());
    }

    #[test]
    fn resource_keywords_and_variables_are_visible() {
        let ws = Workspace::new();
        ws.write(
            "common.resource",
            "*** Variables ***\n${GREETING}    hello\n\n*** Keywords ***\nGreet\n    Log    ${GREETING}\n",
        );
        let ns = ws.namespace(
            "suite.robot",
            "*** Settings ***\nResource    common.resource\n\n*** Test Cases ***\nT\n    Greet\n    Log    ${GREETING}\n",
        );
        assert!(diagnostics(&ns).is_empty(), "{:?}", diagnostics(&ns));
        let kw = ns.find_keyword("greet").unwrap();
        assert_eq!(kw.libname, "common");
        assert_eq!(ns.library_doc_of(&kw).unwrap().name, "common");
        assert!(ns.get_keywords().iter().any(|k| k.name == "Greet"));

        let result = ns.analyze(&CancellationToken::new()).unwrap();
        let (entry, _) = result.namespace_at(ns.source(), Position::new(1, 14)).unwrap();
        assert_eq!(entry, EntryRef::Resource(ws.root().join("common.resource")));
    }

    #[test]
    fn own_variables_take_precedence() {
        let ws = Workspace::new();
        ws.write("vars.resource", "*** Variables ***\n${WHO}    resource\n${ONLY_THERE}    x\n");
        let ns = ws.namespace(
            "prec.robot",
            "*** Settings ***\nResource    vars.resource\n\n*** Variables ***\n${WHO}    own\n",
        );
        let who = ns.find_variable("${who}", None, None).unwrap();
        assert_eq!(who.source.as_deref(), Some(ns.source()));
        let only = ns.find_variable("${ONLY THERE}", None, None).unwrap();
        assert_eq!(only.source, Some(ws.root().join("vars.resource")));
        assert!(ns.find_variable("${CURDIR}", None, None).is_some());
        assert!(ns.find_variable("${nothing}", None, None).is_none());
    }

    #[test]
    fn two_file_cycle_is_possible_circular_import() {
        let ws = Workspace::new();
        ws.write("b.resource", "*** Settings ***\nResource    a.resource\n");
        let ns = ws.namespace(
            "a.resource",
            "*** Settings ***\nResource    b.resource\n\n*** Keywords ***\nK\n    No Operation\n",
        );
        let found = diagnostics(&ns);
        assert_eq!(codes_of(&found), vec![codes::POSSIBLE_CIRCULAR_IMPORT]);
        assert_eq!(found[0].severity, Severity::Information);
        assert_eq!(found[0].range.start.line, 1);
        assert_eq!(found[0].related[0].location.source, ws.root().join("b.resource"));
        assert_eq!(found[0].related[0].message, "'a.resource' is also imported here.");
    }

    #[test]
    fn three_file_cycle_is_reported_on_the_top_import() {
        let ws = Workspace::new();
        ws.write("b.resource", "*** Settings ***\nResource    c.resource\n");
        ws.write("c.resource", "*** Settings ***\nResource    a.resource\n");
        let ns = ws.namespace(
            "a.resource",
            "*** Settings ***\nResource    b.resource\n\n*** Keywords ***\nK\n    No Operation\n",
        );
        let found = diagnostics(&ns);
        assert_eq!(codes_of(&found), vec![codes::POSSIBLE_CIRCULAR_IMPORT]);
        assert_eq!(found[0].range.start.line, 1);
        assert_eq!(found[0].related[0].location.source, ws.root().join("c.resource"));
        assert_eq!(ns.get_resources().len(), 2);
    }

    #[test]
    fn self_import_is_recursive() {
        let ws = Workspace::new();
        let ns = ws.namespace(
            "self.resource",
            "*** Settings ***\nResource    self.resource\n\n*** Keywords ***\nK\n    No Operation\n",
        );
        let found = diagnostics(&ns);
        assert_eq!(codes_of(&found), vec![codes::RECURSIVE_IMPORT]);
        assert_eq!(found[0].severity, Severity::Error);
    }

    #[test]
    fn duplicate_empty_and_missing_resources() {
        let ws = Workspace::new();
        ws.write("empty.resource", "*** Keywords ***\n");
        let ns = ws.namespace(
            "dups.robot",
            "*** Settings ***\nResource    empty.resource\nResource    empty.resource\nResource    missing.resource\nLibrary\n",
        );
        let found = diagnostics(&ns);
        let by_line = |line: u32| found.iter().filter(move |d| d.range.start.line == line).collect::<Vec<_>>();

        assert_eq!(by_line(1)[0].code, codes::RESOURCE_EMPTY);
        let duplicate = by_line(2);
        assert_eq!(duplicate[0].code, codes::RESOURCE_ALREADY_IMPORTED);
        assert_eq!(duplicate[0].message, "Resource 'empty.resource' already imported.");
        assert_eq!(duplicate[0].related[0].location.range.start.line, 1);
        assert!(by_line(3)[0].message.starts_with("Resource file '"));
        assert_eq!(by_line(4)[0].code, codes::IMPORT_REQUIRES_VALUE);
        assert_eq!(by_line(4)[0].message, "Library setting requires value.");
    }

    #[test]
    fn library_with_alias_and_duplicate() {
        let ws = Workspace::new();
        ws.write("helpers.py", "def helper_keyword():\n    pass\n");
        let ns = ws.namespace(
            "libs.robot",
            "*** Settings ***\nLibrary    helpers    AS    H\nLibrary    helpers    AS    H\n\n*** Test Cases ***\nT\n    H.Helper Keyword\n",
        );
        let found = diagnostics(&ns);
        assert_eq!(codes_of(&found), vec![codes::LIBRARY_ALREADY_IMPORTED]);
        assert_eq!(found[0].message, "Library 'H' already imported.");
        assert_eq!(ns.find_keyword("H.Helper Keyword").unwrap().name, "Helper Keyword");
    }

    #[test]
    fn ignore_comment_covers_its_statement() {
        let ws = Workspace::new();
        let ns = ws.namespace(
            "ignore.robot",
            "*** Test Cases ***\nT\n    Log    x    # robotcode: ignore\n    Log    y\n",
        );
        let line = |l: u32| Range::new(Position::new(l, 4), Position::new(l, 7));
        assert!(ns.should_ignore(line(2)));
        assert!(!ns.should_ignore(line(3)));
    }

    #[test]
    fn ignore_comment_covers_ranges_spanning_its_line() {
        let ws = Workspace::new();
        let ns = ws.namespace(
            "span.robot",
            "*** Test Cases ***\nT\n    Log    x\n    Log    y    # robotcode: ignore\n",
        );
        let span = |from: u32, to: u32| Range::new(Position::new(from, 0), Position::new(to, 5));
        assert!(ns.should_ignore(span(3, 3)));
        assert!(ns.should_ignore(span(2, 3)));
        assert!(!ns.should_ignore(span(1, 2)));
    }

    #[test]
    fn importing_builtin_again_is_reported_and_skipped() {
        let ws = Workspace::new();
        let ns = ws.namespace("bi.robot", "*** Settings ***\nLibrary    BuiltIn\n");
        let found = diagnostics(&ns);
        assert_eq!(codes_of(&found), vec![codes::LIBRARY_OVERRIDES_BUILTIN]);
        assert_eq!(found[0].severity, Severity::Information);
        assert_eq!(found[0].range.start, Position::new(1, 11));
        let libraries = ns.get_libraries();
        assert_eq!(libraries.len(), 1);
        assert!(libraries[0].import.is_none());
    }

    #[test]
    fn unknown_variable_in_import_name_is_reported_once() {
        let ws = Workspace::new();
        let ns = ws.namespace(
            "vars.robot",
            "*** Settings ***\nLibrary    ${UNKNOWN}/lib.py\nResource    ${MISSING}/common.resource\n",
        );
        let found = diagnostics(&ns);
        assert_eq!(
            codes_of(&found),
            vec![codes::VARIABLE_NOT_FOUND, codes::VARIABLE_NOT_FOUND],
            "{:?}",
            found
        );
        assert_eq!(found[0].range, Range::new(Position::new(1, 11), Position::new(1, 21)));
        assert_eq!(found[1].range.start, Position::new(2, 12));
    }

    #[test]
    fn aliased_builtin_is_a_separate_library() {
        let ws = Workspace::new();
        let ns = ws.namespace("alias.robot", "*** Settings ***\nLibrary    BuiltIn    AS    Base\n");
        assert!(!codes_of(&diagnostics(&ns)).contains(&codes::LIBRARY_OVERRIDES_BUILTIN));
        assert_eq!(ns.get_libraries().len(), 2);
    }

    #[test]
    fn unchanged_imports_are_adopted() {
        let ws = Workspace::new();
        ws.write("r.resource", "*** Keywords ***\nR\n    No Operation\n");
        let first = ws.namespace("adopt.robot", "*** Settings ***\nResource    r.resource\n");
        first.ensure_initialized(&CancellationToken::new()).unwrap();

        let edited = ws.namespace(
            "adopt.robot",
            "*** Settings ***\nResource    r.resource\n\n*** Test Cases ***\nT\n    R\n",
        );
        assert!(edited.adopt_imports_from(&first));
        assert!(edited.is_initialized());

        let changed = ws.namespace("adopt.robot", "*** Settings ***\nLibrary    Collections\n");
        assert!(!changed.adopt_imports_from(&first));
        assert!(!changed.is_initialized());
    }

    #[test]
    fn cancelled_initialization_leaves_no_state() {
        let ws = Workspace::new();
        let ns = ws.namespace("cancel.robot", "*** Test Cases ***\nT\n    No Operation\n");
        let token = CancellationToken::new();
        token.cancel();
        assert!(ns.ensure_initialized(&token).is_err());
        assert!(!ns.is_initialized());
        assert!(ns.ensure_initialized(&CancellationToken::new()).is_ok());
        assert!(ns.is_initialized());
    }

    #[test]
    fn depends_on_reachable_docs() {
        let ws = Workspace::new();
        ws.write("dep.resource", "*** Keywords ***\nD\n    No Operation\n");
        let ns = ws.namespace("dep.robot", "*** Settings ***\nResource    dep.resource\n");
        let imports = ns.ensure_initialized(&CancellationToken::new()).unwrap();
        let doc = imports.resources.values().next().unwrap().doc.clone();
        assert!(ns.depends_on(&[doc]));
        let other = ws.namespace("other.robot", "*** Test Cases ***\nT\n    No Operation\n");
        let builtin_only = other.imports();
        let builtin = builtin_only.libraries.values().next().unwrap().doc.clone();
        assert!(ns.depends_on(&[builtin]));
    }
}
