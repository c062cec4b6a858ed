#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use indexmap::IndexMap;

    use crate::imports::{
        CompletionKind, DocumentSource, ImportKind, ImportsConfig, ImportsEvent, ImportsManager,
    };
    use crate::library::{keyword, KeywordDoc, LibraryRegistry, StdLibrary};
    use crate::variables::{VariableDefinition, VariableType};
    use crate::token::Range;

    #[derive(Debug)]
    struct Greeter;

    impl StdLibrary for Greeter {
        fn name(&self) -> &str {
            "Greeter"
        }

        fn keywords(&self) -> Vec<KeywordDoc> {
            vec![keyword("Greeter", "Greet", &["name"], "Greets.")]
        }
    }

    fn manager(root: &Path) -> ImportsManager {
        let mut registry = LibraryRegistry::new();
        registry.register_library(Box::new(Greeter)).unwrap();
        let config = ImportsConfig {
            working_dir: root.to_path_buf(),
            ..Default::default()
        };
        ImportsManager::new(config, Arc::new(registry))
    }

    #[test]
    fn library_docs_are_shared() {
        let dir = tempfile::tempdir().unwrap();
        let imports = manager(dir.path());
        let a = imports.get_library("Greeter", &[], None, dir.path(), &[]).unwrap();
        let b = imports.get_library("Greeter", &[], None, &dir.path().join("sub"), &[]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.keywords.get("greet").is_some());
    }

    #[test]
    fn concurrent_imports_load_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shared.py"), "def hello_world():\n    pass\n").unwrap();
        let imports = Arc::new(manager(dir.path()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let imports = imports.clone();
                let base = dir.path().to_path_buf();
                std::thread::spawn(move || imports.get_library("shared", &[], None, &base, &[]).unwrap())
            })
            .collect();
        let docs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(docs.iter().all(|d| Arc::ptr_eq(d, &docs[0])));
        assert!(docs[0].keywords.get("Hello World").is_some());
    }

    #[test]
    fn invalidation_reloads_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("mylib.py");
        fs::write(&lib, "def first():\n    pass\n").unwrap();
        let imports = manager(dir.path());
        let mut events = imports.subscribe();

        let before = imports.get_library("mylib", &[], None, dir.path(), &[]).unwrap();
        assert!(before.keywords.get("First").is_some());

        fs::write(&lib, "def second():\n    pass\n").unwrap();
        assert!(imports.invalidate(&lib));
        match events.try_recv().unwrap() {
            ImportsEvent::LibrariesChanged(docs) => assert_eq!(docs[0].name, "mylib"),
            other => panic!("unexpected event {other:?}"),
        }

        let after = imports.get_library("mylib", &[], None, dir.path(), &[]).unwrap();
        assert!(after.keywords.get("Second").is_some());
        assert!(!imports.invalidate(&dir.path().join("unrelated.py")));
    }

    #[test]
    fn missing_module_is_retried_after_creation() {
        let dir = tempfile::tempdir().unwrap();
        let imports = manager(dir.path());
        let missing = imports.get_library("later", &[], None, dir.path(), &[]).unwrap();
        assert_eq!(missing.errors[0].type_name, "ModuleNotFoundError");

        let lib = dir.path().join("later.py");
        fs::write(&lib, "def now_here():\n    pass\n").unwrap();
        imports.invalidate(&lib);
        let found = imports.get_library("later", &[], None, dir.path(), &[]).unwrap();
        assert!(!found.has_errors());
    }

    #[test]
    fn import_names_expand_variables() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("libs")).unwrap();
        fs::write(dir.path().join("libs").join("tools.py"), "def tool():\n    pass\n").unwrap();
        let imports = manager(dir.path());
        let libs = Arc::new(
            VariableDefinition::new("${LIBS}", VariableType::Variable, Range::zero(), None)
                .with_value(serde_json::Value::String(dir.path().join("libs").to_string_lossy().into_owned())),
        );
        let doc = imports
            .get_library("${LIBS}/tools.py", &[], None, dir.path(), &[libs])
            .unwrap();
        assert_eq!(doc.name, "tools");
        assert!(!doc.has_errors());

        let unresolved = imports.get_library("${NOPE}/tools.py", &[], None, dir.path(), &[]).unwrap();
        assert_eq!(unresolved.errors[0].message, "Variable '${NOPE}' not found.");
    }

    struct Unsaved;

    impl DocumentSource for Unsaved {
        fn text(&self, path: &Path) -> Option<String> {
            path.ends_with("open.resource")
                .then(|| "*** Keywords ***\nUnsaved Keyword\n    No Operation\n".to_string())
        }
    }

    #[test]
    fn resources_prefer_open_documents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("open.resource"), "*** Keywords ***\nSaved Keyword\n    No Operation\n").unwrap();
        let imports = manager(dir.path());
        imports.set_document_source(Arc::new(Unsaved));

        let path = imports.find_resource("open.resource", dir.path(), &[]).unwrap();
        let loaded = imports.get_resource(&path).unwrap();
        assert!(loaded.doc.keywords.get("Unsaved Keyword").is_some());
        assert!(Arc::ptr_eq(&loaded, &imports.get_resource(&path).unwrap()));

        let err = imports.find_resource("missing.resource", dir.path(), &[]).unwrap_err();
        assert_eq!(err.code, "DataError");
        assert!(err.message.starts_with("Resource file '"));
    }

    #[test]
    fn command_line_variables() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vars.yaml"), "FROM_FILE: yes\n").unwrap();
        let mut variables = IndexMap::new();
        variables.insert("NAME".to_string(), "value".to_string());
        variables.insert("${OTHER}".to_string(), "x".to_string());
        let config = ImportsConfig {
            working_dir: dir.path().to_path_buf(),
            variables,
            variable_files: vec!["vars.yaml".to_string()],
            ..Default::default()
        };
        let imports = ImportsManager::new(config, Arc::new(LibraryRegistry::new()));
        let vars = imports.get_command_line_variables();
        let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["${NAME}", "${OTHER}", "${FROM_FILE}"]);
        assert!(vars.iter().all(|v| v.kind == VariableType::CommandLineVariable));
        assert_eq!(
            imports.resolve_variable("${name}", &vars).unwrap(),
            serde_json::Value::String("value".to_string())
        );
    }

    #[test]
    fn docs_persist_in_cache_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join(".cache");
        fs::write(dir.path().join("cached.py"), "def from_disk():\n    pass\n").unwrap();
        let config = ImportsConfig {
            working_dir: dir.path().to_path_buf(),
            cache_dir: Some(cache.clone()),
            ..Default::default()
        };

        let first = ImportsManager::new(config.clone(), Arc::new(LibraryRegistry::new()));
        let doc = first.get_library("cached", &[], None, dir.path(), &[]).unwrap();
        let index = fs::read_to_string(cache.join("index.json")).unwrap();
        assert!(index.contains("\"schema_version\": 1"));

        let second = ImportsManager::new(config, Arc::new(LibraryRegistry::new()));
        let again = second.get_library("cached", &[], None, dir.path(), &[]).unwrap();
        assert_eq!(doc.digest, again.digest);
        assert_eq!(again.keywords.get("From Disk").unwrap().parent_digest, doc.digest);
    }

    #[test]
    fn import_completion() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("res")).unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("res").join("common.resource"), "").unwrap();
        fs::write(dir.path().join("res").join("notes.md"), "").unwrap();
        fs::write(dir.path().join("pkg").join("__init__.py"), "").unwrap();
        fs::write(dir.path().join("pkg").join("inner.py"), "").unwrap();
        fs::write(dir.path().join("tool.py"), "").unwrap();
        let imports = manager(dir.path());

        let resources = imports.complete_import(ImportKind::Resource, "res/co", dir.path());
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].label, "res/common.resource");
        assert_eq!(resources[0].kind, CompletionKind::File);

        let modules = imports.complete_import(ImportKind::Library, "", dir.path());
        let labels: Vec<&str> = modules.iter().map(|c| c.label.as_str()).collect();
        assert!(labels.contains(&"Greeter"));
        assert!(labels.contains(&"pkg"));
        assert!(labels.contains(&"tool"));
        assert!(!labels.contains(&"res"));

        let inner = imports.complete_import(ImportKind::Library, "pkg.", dir.path());
        assert_eq!(inner.iter().map(|c| c.label.as_str()).collect::<Vec<_>>(), vec!["pkg.inner"]);
    }
}
