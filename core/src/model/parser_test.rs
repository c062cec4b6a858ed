#[cfg(test)]
mod tests {
    use crate::model::{parse, BlockKind, Node, SectionKind, StatementKind};
    use crate::token::TokenType;

    #[test]
    fn parses_sections_and_items() {
        let file = parse(
            "*** Settings ***\nLibrary    Collections\n\n*** Test Cases ***\nFirst\n    Log    hi\nSecond\n    No Operation\n\n*** Keywords ***\nHelper\n    [Arguments]    ${a}\n    Log    ${a}\n",
        );
        assert_eq!(file.sections.len(), 3);
        let names: Vec<_> = file.test_cases().filter_map(|b| b.name()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        let kw = file.keywords().next().unwrap();
        assert_eq!(kw.name(), Some("Helper"));
        let args = kw.find_setting(StatementKind::Arguments).unwrap();
        assert_eq!(args.values(TokenType::Argument), vec!["${a}"]);
    }

    #[test]
    fn library_import_with_alias() {
        let file = parse("*** Settings ***\nLibrary    Remote    http://x    AS    R1\nLibrary    Other    WITH NAME    O\n");
        let imports: Vec<_> = file.settings().collect();
        assert_eq!(imports[0].kind, StatementKind::LibraryImport);
        assert_eq!(imports[0].get_value(TokenType::Name), Some("Remote"));
        assert_eq!(imports[0].values(TokenType::Argument), vec!["http://x"]);
        assert_eq!(imports[0].alias_token().map(|t| t.value.as_str()), Some("R1"));
        assert_eq!(imports[1].alias_token().map(|t| t.value.as_str()), Some("O"));
    }

    #[test]
    fn unknown_setting_and_header_are_errors() {
        let file = parse("*** Setings ***\nFoo\n*** Settings ***\nLibary    X\n");
        let header = file.sections[0].header.as_ref().unwrap();
        assert!(!header.errors.is_empty());
        let bad = file.settings().next().unwrap();
        assert_eq!(bad.kind, StatementKind::Error);
        assert_eq!(bad.errors[0], "Non-existing setting 'Libary'.");
    }

    #[test]
    fn continuation_lines_join_into_one_statement() {
        let file = parse("*** Test Cases ***\nT\n    Log Many    a\n    ...    b    c\n");
        let test = file.test_cases().next().unwrap();
        let call = test.statements().find(|s| s.kind == StatementKind::KeywordCall).unwrap();
        assert_eq!(call.values(TokenType::Argument), vec!["a", "b", "c"]);
        assert_eq!(call.end_lineno(), 4);
    }

    #[test]
    fn assignments_precede_keyword() {
        let file = parse("*** Test Cases ***\nT\n    ${a}    ${b}=    Get Two\n");
        let test = file.test_cases().next().unwrap();
        let call = test.statements().find(|s| s.kind == StatementKind::KeywordCall).unwrap();
        assert_eq!(call.values(TokenType::Assign), vec!["${a}", "${b}="]);
        assert_eq!(call.get_value(TokenType::Keyword), Some("Get Two"));
    }

    #[test]
    fn nested_control_structures() {
        let text = "*** Test Cases ***\nT\n    FOR    ${i}    IN RANGE    3\n        IF    ${i} == 1\n            Log    one\n        ELSE IF    ${i} == 2\n            Log    two\n        ELSE\n            Log    other\n        END\n    END\n    TRY\n        Fail    x\n    EXCEPT    x    AS    ${err}\n        Log    ${err}\n    FINALLY\n        Log    done\n    END\n";
        let file = parse(text);
        let test = file.test_cases().next().unwrap();
        let blocks: Vec<_> = test.blocks().collect();
        assert_eq!(blocks.len(), 2);
        let for_block = blocks[0];
        assert_eq!(for_block.kind, BlockKind::For);
        assert!(for_block.end.is_some());
        let header = for_block.header.as_ref().unwrap();
        assert_eq!(header.values(TokenType::Variable), vec!["${i}"]);
        assert_eq!(header.get_value(TokenType::ForSeparator), Some("IN RANGE"));

        let if_block = for_block.blocks().next().unwrap();
        assert_eq!(if_block.kind, BlockKind::If);
        assert_eq!(if_block.branches.len(), 2);
        assert!(if_block.end.is_some());

        let try_block = blocks[1];
        assert_eq!(try_block.kind, BlockKind::Try);
        assert_eq!(try_block.branches.len(), 2);
        let except = try_block.branches[0].header.as_ref().unwrap();
        assert_eq!(except.get_value(TokenType::Variable), Some("${err}"));
    }

    #[test]
    fn unclosed_block_reports_error() {
        let file = parse("*** Keywords ***\nK\n    FOR    ${x}    IN    a    b\n        Log    ${x}\n");
        let kw = file.keywords().next().unwrap();
        let for_block = kw.blocks().next().unwrap();
        assert_eq!(for_block.errors, vec!["FOR loop must have closing END.".to_string()]);
    }

    #[test]
    fn stray_end_is_error() {
        let file = parse("*** Keywords ***\nK\n    END\n");
        let kw = file.keywords().next().unwrap();
        let stmt = kw.statements().next().unwrap();
        assert_eq!(stmt.kind, StatementKind::Error);
    }

    #[test]
    fn inline_if_with_assignment() {
        let file = parse("*** Test Cases ***\nT\n    ${x}    IF    $cond    Set Variable    a    ELSE    Set Variable    b\n");
        let test = file.test_cases().next().unwrap();
        let block = test.blocks().next().unwrap();
        let header = block.header.as_ref().unwrap();
        assert_eq!(header.kind, StatementKind::InlineIfHeader);
        assert_eq!(header.values(TokenType::Assign), vec!["${x}"]);
        assert_eq!(block.branches.len(), 1);
        assert!(block.end.is_none());
        match &block.body[0] {
            Node::Statement(s) => assert_eq!(s.get_value(TokenType::Keyword), Some("Set Variable")),
            Node::Block(_) => panic!("expected a keyword call"),
        }
    }

    #[test]
    fn var_statement_options() {
        let file = parse("*** Test Cases ***\nT\n    VAR    ${name}    value    scope=SUITE\n");
        let test = file.test_cases().next().unwrap();
        let var = test.statements().find(|s| s.kind == StatementKind::Var).unwrap();
        assert_eq!(var.get_value(TokenType::Variable), Some("${name}"));
        assert_eq!(var.values(TokenType::Option), vec!["scope=SUITE"]);
        assert_eq!(var.values(TokenType::Argument), vec!["value"]);
    }

    #[test]
    fn template_turns_calls_into_rows() {
        let file = parse("*** Settings ***\nTest Template    Check\n*** Test Cases ***\nT\n    a    b\nU\n    [Template]    NONE\n    Log    x\n");
        let mut tests = file.test_cases();
        let t = tests.next().unwrap();
        let row = t.statements().next().unwrap();
        assert_eq!(row.kind, StatementKind::TemplateArguments);
        assert_eq!(row.values(TokenType::Argument), vec!["a", "b"]);
        let u = tests.next().unwrap();
        assert!(u.statements().any(|s| s.kind == StatementKind::KeywordCall));
    }

    #[test]
    fn misplaced_item_settings() {
        let file = parse("*** Test Cases ***\nT\n    [Arguments]    ${a}\n*** Keywords ***\nK\n    [Template]    X\n    [Return]    1\n");
        let t = file.test_cases().next().unwrap();
        assert!(!t.statements().next().unwrap().errors.is_empty());
        let k = file.keywords().next().unwrap();
        let mut statements = k.statements();
        assert!(!statements.next().unwrap().errors.is_empty());
        assert!(statements.next().unwrap().errors.is_empty());
    }

    #[test]
    fn only_comment_section() {
        let file = parse("*** Comments ***\nanything    goes here\n");
        assert!(file.has_section(SectionKind::Comments));
        assert_eq!(file.test_cases().count(), 0);
    }

    #[test]
    fn empty_document() {
        let file = parse("");
        assert!(file.sections.is_empty());
    }

    #[test]
    fn variables_section() {
        let file = parse("*** Variables ***\n${A}    1\n@{L} =    a    b\nbad    1\n");
        let vars: Vec<_> = file.variable_statements().collect();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[1].get_value(TokenType::Variable), Some("@{L}"));
        let section = file.sections_of(SectionKind::Variables).next().unwrap();
        assert!(section.statements().any(|s| s.kind == StatementKind::Error));
    }
}
