#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use anyhow::Result;
    use robotls_core::cancel::CancellationToken;
    use robotls_core::diagnostics::{codes, Diagnostic, DiagnosticTag};
    use robotls_core::imports::{ImportsConfig, ImportsManager};
    use robotls_core::model::parse_with_source;
    use robotls_core::namespace::{DocumentType, Namespace, NamespaceOptions};

    use crate::stdlib_registry;

    fn check(dir: &tempfile::TempDir, text: &str) -> Result<Vec<Diagnostic>> {
        let config = ImportsConfig {
            working_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let manager = Arc::new(ImportsManager::new(config, Arc::new(stdlib_registry()?)));
        let path = dir.path().join("suite.robot");
        fs::write(&path, text)?;
        let model = Arc::new(parse_with_source(text, Some(path.clone())));
        let namespace = Namespace::new(manager, model, path.clone(), DocumentType::from_path(&path), NamespaceOptions::default());
        Ok(namespace.diagnostics(&CancellationToken::new()).unwrap_or_default())
    }

    #[test]
    fn common_builtin_usage_is_clean() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let found = check(
            &dir,
            "*** Test Cases ***\nT\n    ${x}    Set Variable    1\n    Should Be Equal As Integers    ${x}    1\n    Log Many    a    b    c\n    Run Keyword And Ignore Error    Fail    boom\n    Sleep    1s\n",
        )?;
        assert!(found.is_empty(), "{found:?}");
        Ok(())
    }

    #[test]
    fn deprecated_builtin_keyword_is_hinted() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let found = check(&dir, "*** Test Cases ***\nT\n    Run Keyword Unless    ${TRUE}    No Operation\n")?;
        let hint = found.iter().find(|d| d.code == codes::DEPRECATED_KEYWORD).expect("deprecation hint");
        assert_eq!(hint.message, "Keyword 'BuiltIn.Run Keyword Unless' is deprecated. Use IF instead.");
        assert!(hint.tags.contains(&DiagnosticTag::Deprecated));
        Ok(())
    }

    #[test]
    fn too_many_arguments_to_builtin() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let found = check(&dir, "*** Test Cases ***\nT\n    No Operation    extra\n")?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "ArgumentError");
        assert_eq!(found[0].range.start.line, 2);
        Ok(())
    }

    #[test]
    fn run_keyword_arguments_are_checked() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let found = check(&dir, "*** Test Cases ***\nT\n    Run Keyword    Does Not Exist\n")?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, codes::KEYWORD_NOT_FOUND);
        assert_eq!(found[0].range.start.character, 19);
        Ok(())
    }
}
