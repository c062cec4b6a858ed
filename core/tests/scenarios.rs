use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use robotls_core::cancel::CancellationToken;
use robotls_core::diagnostics::{codes, Diagnostic, Severity};
use robotls_core::imports::{ImportsConfig, ImportsManager};
use robotls_core::library::{keyword, KeywordDoc, LibraryRegistry, StdLibrary};
use robotls_core::model::parse_with_source;
use robotls_core::namespace::{DocumentType, Namespace, NamespaceOptions};
use robotls_core::token::{Position, Range};

#[derive(Debug)]
struct BuiltIn;

impl StdLibrary for BuiltIn {
    fn name(&self) -> &str {
        "BuiltIn"
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        vec![
            keyword("BuiltIn", "Log", &["message", "level=INFO"], "Logs the given message."),
            keyword("BuiltIn", "No Operation", &[], ""),
            keyword("BuiltIn", "Run Keyword If", &["condition", "name", "*args"], ""),
        ]
    }
}

struct Suite {
    dir: tempfile::TempDir,
    manager: Arc<ImportsManager>,
}

impl Suite {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = LibraryRegistry::new();
        registry.register_library(Box::new(BuiltIn)).unwrap();
        let config = ImportsConfig {
            working_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let manager = Arc::new(ImportsManager::new(config, Arc::new(registry)));
        Self { dir, manager }
    }

    fn write(&self, name: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn open(&self, name: &str, text: &str) -> Namespace {
        let path = self.write(name, text);
        let model = Arc::new(parse_with_source(text, Some(path.clone())));
        Namespace::new(
            self.manager.clone(),
            model,
            path.clone(),
            DocumentType::from_path(&path),
            NamespaceOptions::default(),
        )
    }
}

fn diagnostics(ns: &Namespace) -> Vec<Diagnostic> {
    ns.diagnostics(&CancellationToken::new()).unwrap()
}

#[test]
fn undefined_variable() {
    let suite = Suite::new();
    let ns = suite.open("t.robot", "*** Test Cases ***\nExample\n    Log    ${unknown_var}\n");
    let found = diagnostics(&ns);
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(found[0].range, Range::new(Position::new(2, 11), Position::new(2, 25)));
    assert_eq!(found[0].severity, Severity::Error);
    assert_eq!(found[0].code, codes::VARIABLE_NOT_FOUND);
    assert_eq!(found[0].message, "Variable '${unknown_var}' not found.");
}

#[test]
fn resource_cycle_is_reported_once() {
    let suite = Suite::new();
    suite.write("b.resource", "*** Settings ***\nResource    a.resource\n");
    let ns = suite.open("a.resource", "*** Settings ***\nResource    b.resource\n");
    let found = diagnostics(&ns);
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(found[0].code, codes::POSSIBLE_CIRCULAR_IMPORT);
    assert_eq!(found[0].severity, Severity::Information);
    assert_eq!(found[0].range.start.line, 1);
    let related = &found[0].related[0];
    assert_eq!(related.location.source, suite.dir.path().join("b.resource"));
    assert_eq!(related.location.range.start.line, 1);
}

#[test]
fn conflicting_implicit_keyword() {
    let suite = Suite::new();
    suite.write("L1.py", "def open_browser(url):\n    pass\n");
    suite.write("L2.py", "def open_browser(url):\n    pass\n");
    let ns = suite.open(
        "browsers.robot",
        "*** Settings ***\nLibrary    L1\nLibrary    L2\n\n*** Test Cases ***\nT\n    Open Browser    x\n    L1.Open Browser    x\n",
    );
    let found = diagnostics(&ns);
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(found[0].code, codes::KEYWORD_ERROR);
    assert_eq!(found[0].range.start.line, 6);
    assert!(found[0].message.contains("    L1.Open Browser\n    L2.Open Browser"));
}

#[test]
fn embedded_argument_specificity() {
    let suite = Suite::new();
    let ns = suite.open(
        "login.robot",
        "*** Test Cases ***\nT\n    User \"admin\" logs in\n    User \"alice\" logs in\n\n*** Keywords ***\nUser \"${name}\" logs in\n    Log    ${name}\n\nUser \"admin\" logs in\n    No Operation\n",
    );
    assert!(diagnostics(&ns).is_empty());
    let result = ns.analyze(&CancellationToken::new()).unwrap();

    let admin = result.keyword_at(ns.source(), Position::new(2, 6)).unwrap().0;
    assert_eq!(admin.range.start.line, 9);
    assert_eq!(result.keyword_references_of(&admin).len(), 1);

    let alice = result.keyword_at(ns.source(), Position::new(3, 6)).unwrap().0;
    assert_eq!(alice.range.start.line, 6);
    assert_eq!(result.keyword_references_of(&alice).len(), 1);
}

#[test]
fn run_keyword_chain() {
    let suite = Suite::new();
    let ns = suite.open(
        "chain.robot",
        "*** Variables ***\n${cond}    ${TRUE}\n\n*** Test Cases ***\nT\n    Run Keyword If    ${cond}    Log    hi    ELSE    Log    bye\n",
    );
    assert!(diagnostics(&ns).is_empty());
    let result = ns.analyze(&CancellationToken::new()).unwrap();
    let count = |name: &str| {
        result
            .keyword_references
            .iter()
            .filter(|(kw, _)| kw.name == name && kw.libname == "BuiltIn")
            .map(|(_, locations)| locations.len())
            .sum::<usize>()
    };
    assert_eq!(count("Log"), 2);
    assert_eq!(count("Run Keyword If"), 1);
}
