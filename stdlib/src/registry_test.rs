#[cfg(test)]
mod tests {
    use anyhow::Result;
    use robotls_core::library::{LibraryRegistry, LibraryScope, StdLibrary};

    use crate::{builtin::BuiltInLibrary, register_stdlib_libraries, stdlib_registry};

    #[test]
    fn every_packaged_library_is_registered() -> Result<()> {
        let registry = stdlib_registry()?;
        for name in [
            "BuiltIn",
            "Collections",
            "String",
            "OperatingSystem",
            "DateTime",
            "Process",
            "XML",
            "Telnet",
            "Dialogs",
            "Screenshot",
            "Easter",
        ] {
            let doc = registry.library_doc(name).expect(name);
            assert!(!doc.keywords.is_empty(), "{name} has keywords");
            assert!(doc.errors.is_empty(), "{name}: {:?}", doc.errors);
        }
        Ok(())
    }

    #[test]
    fn registering_twice_fails() -> Result<()> {
        let mut registry = LibraryRegistry::new();
        register_stdlib_libraries(&mut registry)?;
        assert!(registry.register_library(Box::new(BuiltInLibrary::new())).is_err());
        Ok(())
    }

    #[test]
    fn reserved_is_ignored_and_has_no_doc_keywords() -> Result<()> {
        let registry = stdlib_registry()?;
        assert!(registry.is_ignored("Reserved"));
        assert!(!registry.is_ignored("BuiltIn"));
        assert!(registry.get_library("reserved").is_none());
        Ok(())
    }

    #[test]
    fn suite_scoped_libraries_carry_initializers() -> Result<()> {
        let registry = stdlib_registry()?;
        let telnet = registry.get_library("Telnet").expect("Telnet");
        assert_eq!(telnet.scope(), LibraryScope::Suite);
        let doc = registry.library_doc("Telnet").expect("Telnet doc");
        let init = doc.inits.iter().next().expect("init");
        assert!(init.is_initializer);
        assert!(init.args.iter().any(|a| a.name == "prompt_is_regexp"));

        let xml = registry.library_doc("XML").expect("XML doc");
        assert_eq!(xml.inits.iter().count(), 1);
        Ok(())
    }

    #[test]
    fn docs_are_built_once() -> Result<()> {
        let registry = stdlib_registry()?;
        let first = registry.library_doc("Collections").expect("doc");
        let second = registry.library_doc("Collections").expect("doc");
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        Ok(())
    }

    #[test]
    fn keyword_names_are_unique_per_library() -> Result<()> {
        let registry = stdlib_registry()?;
        for name in registry.library_names() {
            let Some(library) = registry.get_library(&name) else { continue };
            let mut names: Vec<String> = library.keywords().iter().map(|k| k.name.to_lowercase()).collect();
            let total = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), total, "duplicate keyword in {name}");
        }
        Ok(())
    }
}
