#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use anyhow::Result;
    use robotls_core::cancel::CancellationToken;
    use robotls_core::imports::{ImportsConfig, ImportsManager};
    use robotls_core::model::parse_with_source;
    use robotls_core::namespace::{DocumentType, Namespace, NamespaceOptions};

    use crate::stdlib_registry;

    fn namespace(dir: &tempfile::TempDir, text: &str) -> Result<Namespace> {
        let config = ImportsConfig {
            working_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let manager = Arc::new(ImportsManager::new(config, Arc::new(stdlib_registry()?)));
        let path = dir.path().join("strings.robot");
        fs::write(&path, text)?;
        let model = Arc::new(parse_with_source(text, Some(path.clone())));
        Ok(Namespace::new(manager, model, path.clone(), DocumentType::from_path(&path), NamespaceOptions::default()))
    }

    #[test]
    fn string_keywords_need_the_import() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let body = "*** Test Cases ***\nT\n    ${up}    Convert To Upper Case    abc\n    Log    ${up}\n";
        let without = namespace(&dir, body)?;
        let found = without.diagnostics(&CancellationToken::new()).unwrap_or_default();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "No keyword with name 'Convert To Upper Case' found.");

        let with = namespace(&dir, &format!("*** Settings ***\nLibrary    String\n\n{body}"))?;
        let found = with.diagnostics(&CancellationToken::new()).unwrap_or_default();
        assert!(found.is_empty(), "{found:?}");
        assert_eq!(with.find_keyword("String.Get Line Count").map(|k| k.libname.clone()), Some("String".to_string()));
        Ok(())
    }

    #[test]
    fn named_arguments_of_library_keywords() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let ns = namespace(
            &dir,
            "*** Settings ***\nLibrary    String\n\n*** Test Cases ***\nT\n    ${s}    Strip String    ${SPACE}x    mode=left\n    Log    ${s}\n",
        )?;
        let result = ns.analyze(&CancellationToken::new())?;
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let (arg, range) = result
            .argument_references
            .iter()
            .flat_map(|(arg, locations)| locations.iter().map(move |l| (arg, l.range)))
            .next()
            .expect("named argument reference");
        assert_eq!(arg.name, "mode");
        assert_eq!(arg.keyword.name, "Strip String");
        assert_eq!(range.start.line, 5);
        Ok(())
    }
}
