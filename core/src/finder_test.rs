#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::diagnostics::codes;
    use crate::namespace::NamespaceOptions;
    use crate::test_support::Workspace;

    fn two_libraries(ws: &Workspace) {
        ws.write("alpha.py", "def shared():\n    pass\n");
        ws.write("beta.py", "def shared():\n    pass\n");
    }

    const IMPORTS: &str = "*** Settings ***\nLibrary    alpha\nLibrary    beta\n";

    #[test]
    fn ambiguous_library_keywords_need_full_name() {
        let ws = Workspace::new();
        two_libraries(&ws);
        let ns = ws.namespace("ambiguous.robot", IMPORTS);
        let finder = ns.finder();
        let result = finder.find_keyword("Shared");
        assert!(result.keyword.is_none());
        assert_eq!(result.diagnostics[0].code, codes::KEYWORD_ERROR);
        assert_eq!(
            result.diagnostics[0].message,
            "Multiple keywords with name 'Shared' found. Give the full name of the keyword you want to use:\n    alpha.Shared\n    beta.Shared"
        );

        let explicit = finder.find_keyword("beta.shared");
        assert_eq!(explicit.keyword.as_ref().unwrap().libname, "beta");
        assert_eq!(explicit.owner.as_deref(), Some("beta"));
    }

    #[test]
    fn search_order_picks_the_first_listed_owner() {
        let ws = Workspace::new();
        two_libraries(&ws);
        let options = NamespaceOptions {
            search_order: vec!["Beta".to_string()],
            ..Default::default()
        };
        let ns = ws.namespace_with("ordered.robot", IMPORTS, options);
        let result = ns.finder().find_keyword("Shared");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.keyword.as_ref().unwrap().libname, "beta");
    }

    #[test]
    fn own_keywords_then_resources_then_libraries() {
        let ws = Workspace::new();
        ws.write("r.resource", "*** Keywords ***\nLog\n    [Arguments]    ${m}\n    No Operation\nMine\n    No Operation\n");
        let ns = ws.namespace(
            "order.robot",
            "*** Settings ***\nResource    r.resource\n\n*** Keywords ***\nMine\n    No Operation\n",
        );
        let finder = ns.finder();
        let mine = finder.find_keyword("mine");
        assert_eq!(mine.keyword.as_ref().unwrap().source.as_deref(), Some(ns.source()));
        let log = finder.find_keyword("Log");
        assert!(log.diagnostics.is_empty());
        assert_eq!(log.keyword.as_ref().unwrap().libname, "r");
    }

    #[test]
    fn public_resource_keyword_beats_private_one() {
        let ws = Workspace::new();
        ws.write("hidden.resource", "*** Keywords ***\nHelper\n    [Tags]    robot:private\n    No Operation\n");
        ws.write("open.resource", "*** Keywords ***\nHelper\n    No Operation\n");
        let ns = ws.namespace(
            "private.robot",
            "*** Settings ***\nResource    hidden.resource\nResource    open.resource\n",
        );
        let result = ns.finder().find_keyword("Helper");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.keyword.as_ref().unwrap().libname, "open");
    }

    #[test]
    fn bdd_prefixes_are_stripped() {
        let ws = Workspace::new();
        let ns = ws.namespace("bdd.robot", "*** Test Cases ***\nT\n    No Operation\n");
        let finder = ns.finder();
        let result = finder.find_keyword("Given no operation");
        assert_eq!(result.keyword.as_ref().unwrap().name, "No Operation");
        assert_eq!(result.bdd_prefix_len, 6);
        assert!(finder.find_keyword("Perhaps no operation").keyword.is_none());
    }

    #[test]
    fn bdd_prefix_length_counts_from_the_stripped_word() {
        let ws = Workspace::new();
        let ns = ws.namespace(
            "repeat.robot",
            "*** Test Cases ***\nT\n    Given Given Step\n\n*** Keywords ***\nGiven Step\n    No Operation\n",
        );
        let finder = ns.finder();
        let repeated = finder.find_keyword("Given Given Step");
        assert_eq!(repeated.keyword.as_ref().unwrap().name, "Given Step");
        assert_eq!(repeated.bdd_prefix_len, 6);
        let spaced = finder.find_keyword("When   Given Step");
        assert_eq!(spaced.bdd_prefix_len, 7);
    }

    #[test]
    fn empty_names_and_memoised_results() {
        let ws = Workspace::new();
        let ns = ws.namespace("memo.robot", "*** Test Cases ***\nT\n    No Operation\n");
        let finder = ns.finder();
        let empty = finder.find_keyword("");
        assert_eq!(empty.diagnostics[0].message, "Keyword name cannot be empty.");
        let first = finder.find_keyword("Log");
        let second = finder.find_keyword("Log");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
