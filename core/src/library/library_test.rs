#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::{json, Value};

    use crate::library::python::{library_doc_from_source, logical_lines, parse_literal, printable_name};
    use crate::library::*;
    use crate::matcher::VariableMatcher;
    use crate::model::parse_with_source;
    use crate::variables::VariableLookup;

    const MY_LIB: &str = r#""""Module doc."""
from robot.api.deco import keyword, not_keyword

ROBOT_LIBRARY_SCOPE = 'GLOBAL'
__version__ = '1.2'


class MyLib:
    """Library doc.

    More text.
    """

    def __init__(self, host, port=8080):
        self._host = host

    def open_connection(self, timeout: float = 1.5, *, retries=3):
        """Opens it.

        Tags: net, slow
        """
        pass

    @keyword('Send ${count} Messages')
    def send(self, count):
        pass

    @not_keyword
    def helper(self):
        pass

    def _private(self):
        pass

    @staticmethod
    def static_kw(a, /, b, *args, **kwargs) -> str:
        return a
"#;

    #[derive(Debug)]
    struct Fake {
        ignored: bool,
    }

    impl StdLibrary for Fake {
        fn name(&self) -> &str {
            if self.ignored {
                "Ignored"
            } else {
                "Fake"
            }
        }

        fn ignored(&self) -> bool {
            self.ignored
        }

        fn keywords(&self) -> Vec<KeywordDoc> {
            vec![keyword(self.name(), "Do It", &["value", "*rest"], "Does it.")]
        }
    }

    fn registry() -> LibraryRegistry {
        let mut registry = LibraryRegistry::new();
        registry.register_library(Box::new(Fake { ignored: false })).unwrap();
        registry.register_library(Box::new(Fake { ignored: true })).unwrap();
        registry
    }

    fn no_variables(_: &VariableMatcher) -> Option<Value> {
        None
    }

    #[test]
    fn python_class_library() {
        let doc = library_doc_from_source("MyLib", "MyLib", None, MY_LIB, Path::new("/libs/MyLib.py"));
        assert!(doc.errors.is_empty(), "{:?}", doc.errors);
        assert_eq!(doc.scope, LibraryScope::Global);
        assert_eq!(doc.version, "1.2");
        assert_eq!(doc.doc, "Library doc.\n\nMore text.");

        let names: Vec<&str> = doc.keywords.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["Open Connection", "Send ${count} Messages", "Static Kw"]);

        let open = doc.keywords.get("open connection").unwrap();
        assert_eq!(open.doc, "Opens it.");
        assert_eq!(open.tags, vec!["net", "slow"]);
        let kinds: Vec<ArgumentKind> = open.args.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![ArgumentKind::PositionalOrNamed, ArgumentKind::NamedOnlyMarker, ArgumentKind::NamedOnly]
        );
        assert_eq!(open.args[0].types, vec!["float"]);
        assert_eq!(open.args[0].default.as_deref(), Some("1.5"));
        assert_eq!(open.range.start.line, 16);
        assert_eq!(open.parent_digest, doc.digest);

        let send = doc.keywords.get("Send 5 Messages").unwrap();
        assert!(send.is_embedded());

        let stat = doc.keywords.get("Static Kw").unwrap();
        let kinds: Vec<ArgumentKind> = stat.args.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ArgumentKind::PositionalOnly,
                ArgumentKind::PositionalOnlyMarker,
                ArgumentKind::PositionalOrNamed,
                ArgumentKind::VarPositional,
                ArgumentKind::VarNamed,
            ]
        );
        assert_eq!(stat.return_type.as_deref(), Some("str"));

        let init = doc.inits.iter().next().unwrap();
        assert!(init.is_initializer);
        assert_eq!(init.args.len(), 2);
        assert_eq!(init.args[1].default.as_deref(), Some("8080"));
    }

    #[test]
    fn module_functions_and_auto_keywords() {
        let src = "ROBOT_AUTO_KEYWORDS = False\n\nfrom robot.api.deco import keyword\n\n\n@keyword(name='Custom Name', tags=['a', 'b'])\ndef first(x):\n    pass\n\n\ndef second():\n    pass\n";
        let doc = library_doc_from_source("mod", "mod", None, src, Path::new("/libs/mod.py"));
        let names: Vec<&str> = doc.keywords.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["Custom Name"]);
        assert_eq!(doc.keywords.iter().next().unwrap().tags, vec!["a", "b"]);
    }

    #[test]
    fn syntax_errors_carry_line_numbers() {
        let doc = library_doc_from_source("broken", "broken", None, "x = 1\ndef broken(:\n    pass\n", Path::new("/b.py"));
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(doc.errors[0].type_name, "SyntaxError");
        assert_eq!(doc.errors[0].line_no, Some(2));

        let err = logical_lines("x = 'abc\n").unwrap_err();
        assert_eq!(err.line_no, Some(1));
    }

    #[test]
    fn missing_class_in_module() {
        let doc = library_doc_from_source("mod.Nope", "mod", Some("Nope"), "def f():\n    pass\n", Path::new("/mod.py"));
        assert!(doc.has_errors());
        assert!(doc.errors[0].message.contains("does not contain 'Nope'"));
    }

    #[test]
    fn python_literals() {
        assert_eq!(
            parse_literal("{'a': [1, 2.5, None], 'b': (True,)}"),
            Some(json!({"a": [1, 2.5, null], "b": [true]}))
        );
        assert_eq!(parse_literal("'a' \"b\""), Some(json!("ab")));
        assert_eq!(parse_literal("-0x10"), Some(json!(-16)));
        assert_eq!(parse_literal("r'\\d+'"), Some(json!("\\d+")));
        assert_eq!(parse_literal("compute()"), None);
    }

    #[test]
    fn printable_names() {
        assert_eq!(printable_name("open_connection"), "Open Connection");
        assert_eq!(printable_name("getHTTPResponse"), "Get HTTP Response");
        assert_eq!(printable_name("_x"), "X");
    }

    #[test]
    fn libspec_documents() {
        let text = r#"{
            "name": "Remote Lib", "doc": "d", "version": "2.0", "type": "LIBRARY", "scope": "SUITE",
            "docFormat": "ROBOT", "source": "/x/lib.py", "lineno": 3, "inits": [],
            "keywords": [{
                "name": "Do Thing",
                "args": [
                    {"name": "a", "kind": "POSITIONAL_OR_NAMED", "types": ["int"], "defaultValue": null},
                    {"name": "rest", "kind": "VAR_POSITIONAL", "types": [], "defaultValue": null}
                ],
                "doc": "*DEPRECATED* Use other.", "tags": ["x"], "lineno": 10
            }],
            "typedocs": [{"type": "Enum", "name": "Color", "doc": "", "members": [{"name": "RED", "value": "1"}]}]
        }"#;
        let doc = library_doc_from_spec(text, Path::new("/x/lib.libspec.json"), None);
        assert!(doc.errors.is_empty());
        assert_eq!(doc.scope, LibraryScope::Suite);
        let kw = doc.keywords.get("do thing").unwrap();
        assert_eq!(kw.source.as_deref(), Some(Path::new("/x/lib.py")));
        assert_eq!(kw.range.start.line, 9);
        assert_eq!(kw.args[1].kind, ArgumentKind::VarPositional);
        assert_eq!(kw.deprecation_message().as_deref(), Some("Use other."));
        assert_eq!(doc.types[0].members, vec!["RED"]);

        let bad = library_doc_from_spec("{", Path::new("/x/bad.json"), None);
        assert_eq!(bad.errors[0].type_name, "DataError");
    }

    const RESOURCE: &str = "\
*** Settings ***
Documentation    Shared stuff.
Keyword Tags    shared

*** Variables ***
${HOST}    localhost
@{USERS}    a    b
${URL}    http://${HOST}

*** Keywords ***
Login As ${user}
    [Arguments]    ${password}
    Log    ${user}

Connect
    [Documentation]    Connects.
    [Arguments]    ${host}    ${port}=80    @{rest}    ${flag}    &{opts}
    [Tags]    net
    No Operation

Connect
    No Operation
";

    #[test]
    fn resource_doc_from_model() {
        let path = Path::new("/res/common.resource");
        let file = parse_with_source(RESOURCE, Some(path.to_path_buf()));
        let doc = library_doc_from_model(&file, "common", Some(path), LibraryType::Resource);
        assert!(doc.errors.is_empty());
        assert_eq!(doc.doc, "Shared stuff.");
        assert_eq!(doc.keywords.len(), 3);

        let login = doc.keywords.iter().next().unwrap();
        assert!(login.is_embedded());
        assert!(login.has_normal_and_embedded_args);
        assert_eq!(login.range.start.line, 10);

        let connects = doc.keywords.get_all("connect");
        assert_eq!(connects.len(), 2);
        let first = &connects[0];
        assert!(!first.is_error_handler);
        assert_eq!(first.doc, "Connects.");
        assert_eq!(first.tags, vec!["shared", "net"]);
        let kinds: Vec<ArgumentKind> = first.args.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ArgumentKind::PositionalOrNamed,
                ArgumentKind::PositionalOrNamed,
                ArgumentKind::VarPositional,
                ArgumentKind::NamedOnly,
                ArgumentKind::VarNamed,
            ]
        );
        assert_eq!(first.args[1].default.as_deref(), Some("80"));
        assert!(connects[1].is_error_handler);

        let vars: Vec<&str> = doc.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(vars, vec!["${HOST}", "@{USERS}", "${URL}"]);
        assert!(doc.variables[0].resolvable);
        assert_eq!(doc.variables[1].value, Some(json!(["a", "b"])));
        assert!(doc.variables[2].has_value);
        assert!(!doc.variables[2].resolvable);
    }

    #[test]
    fn resource_with_test_cases_is_invalid() {
        let path = Path::new("/res/bad.resource");
        let file = parse_with_source("*** Test Cases ***\nT\n    Log    x\n", Some(path.to_path_buf()));
        let doc = library_doc_from_model(&file, "bad", Some(path), LibraryType::Resource);
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(doc.errors[0].line_no, Some(1));
    }

    #[test]
    fn variables_files() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("vars.yaml");
        std::fs::write(&yaml, "name: value\nnumbers:\n  - 1\n  - 2\n").unwrap();
        let doc = load_variables(&yaml, "vars.yaml");
        assert!(doc.errors.is_empty());
        assert_eq!(doc.library_type, LibraryType::Variables);
        let numbers = doc.variables.iter().find(|v| v.name == "${numbers}").unwrap();
        assert_eq!(numbers.value, Some(json!([1, 2])));
        assert_eq!(numbers.range.start.line, 1);

        let py = dir.path().join("vars.py");
        std::fs::write(
            &py,
            "HOST = \"localhost\"\nPORT = 8080\nLIST__USERS = [\"a\", \"b\"]\n_private = 1\ncomputed = compute()\n",
        )
        .unwrap();
        let doc = load_variables(&py, "vars.py");
        let names: Vec<&str> = doc.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["${HOST}", "${PORT}", "${USERS}", "${computed}"]);
        assert_eq!(doc.variables[2].value, Some(json!(["a", "b"])));
        assert!(!doc.variables[3].has_value);

        let json_file = dir.path().join("list.json");
        std::fs::write(&json_file, "[1, 2]").unwrap();
        let doc = load_variables(&json_file, "list.json");
        assert_eq!(doc.errors[0].message, "JSON variable file must be a mapping, got list.");

        let bad = dir.path().join("bad.py");
        std::fs::write(&bad, "LIST__X = 1\n").unwrap();
        let doc = load_variables(&bad, "bad.py");
        assert_eq!(doc.errors[0].line_no, Some(1));
    }

    #[test]
    fn resolving_resources_and_variables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("common.resource"), RESOURCE).unwrap();
        let registry = registry();
        let lookup = no_variables;
        let ctx = LoadContext {
            base_dir: dir.path(),
            working_dir: dir.path(),
            python_path: &[],
            variables: &lookup,
            registry: &registry,
        };
        let found = ctx.find_resource("common.resource").unwrap();
        assert_eq!(found, normalize_path(&dir.path().join("common.resource")));
        let (_, doc) = load_resource(&found).unwrap();
        assert_eq!(doc.name, "common");

        let missing = ctx.find_resource("missing.resource").unwrap_err();
        assert_eq!(missing.to_string(), "Resource file 'missing.resource' does not exist.");
        assert_eq!(missing.code(), "DataError");
        assert!(matches!(ctx.find_resource("x.py"), Err(LoaderError::InvalidExtension(_))));
        assert!(matches!(ctx.find_variables("nope.yaml"), Err(LoaderError::NotFound { .. })));
    }

    #[test]
    fn loading_libraries() {
        let dir = tempfile::tempdir().unwrap();
        let libs = dir.path().join("libs");
        std::fs::create_dir_all(libs.join("pkg")).unwrap();
        std::fs::write(libs.join("MyLib.py"), MY_LIB).unwrap();
        std::fs::write(libs.join("pkg").join("mod.py"), "class Klass:\n    def run(self):\n        pass\n").unwrap();

        let registry = registry();
        let python_path = vec![libs.clone()];
        let libs_dir = libs.to_string_lossy().into_owned();
        let lookup = move |m: &VariableMatcher| -> Option<Value> {
            (m.normalized_name == "libs").then(|| Value::String(libs_dir.clone()))
        };
        let ctx = LoadContext {
            base_dir: dir.path(),
            working_dir: dir.path(),
            python_path: &python_path,
            variables: &lookup as &dyn VariableLookup,
            registry: &registry,
        };

        let fake = ctx.load_library("Fake", &[]).unwrap();
        assert_eq!(fake.keywords.len(), 1);
        assert!(ctx.load_library("Ignored", &[]).is_none());

        let mylib = ctx.load_library("MyLib", &["example.com".to_string()]).unwrap();
        assert!(mylib.errors.is_empty(), "{:?}", mylib.errors);
        assert_eq!(mylib.keywords.len(), 3);

        let by_path = ctx.load_library("${LIBS}/MyLib.py", &["h".to_string()]).unwrap();
        assert_eq!(by_path.name, "MyLib");
        assert!(by_path.errors.is_empty());

        let too_many = ctx
            .load_library("MyLib", &["a".to_string(), "b".to_string(), "c".to_string()])
            .unwrap();
        assert_eq!(too_many.errors[0].message, "Library 'MyLib' expected 1 to 2 arguments, got 3.");

        let klass = ctx.load_library("pkg.mod.Klass", &[]).unwrap();
        assert_eq!(klass.name, "mod.Klass");
        assert!(klass.keywords.get("Run").is_some());

        let missing = ctx.load_library("NoSuchLib", &[]).unwrap();
        assert_eq!(missing.errors[0].type_name, "ModuleNotFoundError");

        let unresolved = ctx.load_library("${nope}/x.py", &[]).unwrap();
        assert_eq!(unresolved.errors[0].type_name, "VariableNotFound");
    }

    #[test]
    fn registry_rejects_duplicates() {
        let mut registry = registry();
        assert!(registry.register_library(Box::new(Fake { ignored: false })).is_err());
        assert_eq!(registry.library_names(), vec!["Fake", "Ignored"]);
        let first = registry.library_doc("Fake").unwrap();
        let second = registry.library_doc("Fake").unwrap();
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        let kw = first.keywords.get("do it").unwrap();
        assert_eq!(kw.args[1].kind, ArgumentKind::VarPositional);
    }

    fn kw(args: &[&str]) -> KeywordDoc {
        KeywordDoc::new("Kw", "Lib", LibraryType::Library).with_args(signature(args))
    }

    #[test]
    fn argument_validation() {
        let k = kw(&["a", "b=1"]);
        assert!(validate_arguments(&k, &["x"]).is_ok());
        assert_eq!(
            validate_arguments(&k, &[]).unwrap_err().to_string(),
            "Keyword 'Lib.Kw' expected 1 to 2 arguments, got 0."
        );
        assert_eq!(
            validate_arguments(&k, &["x", "y", "z"]).unwrap_err().to_string(),
            "Keyword 'Lib.Kw' expected 1 to 2 arguments, got 3."
        );
        assert!(validate_arguments(&k, &["x", "c=1"]).is_ok());
        assert_eq!(
            validate_arguments(&k, &["b=2", "x"]).unwrap_err().to_string(),
            "Keyword 'Lib.Kw' got positional argument after named arguments."
        );
        assert!(validate_arguments(&k, &["@{items}"]).is_ok());

        let named_only = kw(&["*", "key"]);
        assert_eq!(
            validate_arguments(&named_only, &[]).unwrap_err().to_string(),
            "Keyword 'Lib.Kw' missing named-only argument 'key'."
        );
        assert!(validate_arguments(&named_only, &["key=v"]).is_ok());

        let (arg, len) = named_argument(&k, "b=5").unwrap();
        assert_eq!(arg.name, "b");
        assert_eq!(len, 1);
        assert_eq!(split_from_equals("${a=b}=c"), Some(("${a=b}".to_string(), "c".to_string())));
        assert_eq!(split_from_equals("a\\=b"), None);
    }

    #[test]
    fn deprecation_contract() {
        assert_eq!(deprecation_message("*DEPRECATED* Use X."), Some("Use X.".to_string()));
        assert_eq!(deprecation_message("  *DEPRECATED in 7.0.*\nmore"), Some("in 7.0.".to_string()));
        assert_eq!(deprecation_message("*DEPRECATED*"), Some(String::new()));
        assert_eq!(deprecation_message("Not *DEPRECATED*"), None);
        assert_eq!(deprecation_message("*deprecated*"), None);
    }
}
