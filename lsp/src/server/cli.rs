use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use robotls_core::cancel::CancellationToken;
use robotls_core::diagnostics::Severity;
use robotls_core::imports::{ImportsConfig, ImportsManager};
use robotls_core::library::LibraryRegistry;
use robotls_core::model::parse_with_source;
use robotls_core::namespace::{DocumentType, Namespace, NamespaceOptions};

pub(crate) const DEFAULT_PORT: u16 = 6610;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum Transport {
    /// Protocol on stdin/stdout.
    #[default]
    Stdio,
    /// Listen on `--bind:--port` and serve the first client.
    Tcp,
    /// Connect to a client listening on `--bind:--port`.
    Socket,
    /// Connect to the named pipe or unix socket `--pipe-name`.
    Pipe,
}

#[derive(Debug, Parser)]
#[command(
    name = "robotls",
    author,
    version,
    about = "Language server for keyword-driven test suites",
    long_about = None
)]
pub(crate) struct CliArgs {
    /// Transport used to talk to the client
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    pub(crate) mode: Transport,

    /// Port for the tcp and socket transports
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub(crate) port: u16,

    /// Address for the tcp and socket transports
    #[arg(long, default_value = "127.0.0.1")]
    pub(crate) bind: String,

    /// Pipe name for the pipe transport
    #[arg(long, value_name = "NAME")]
    pub(crate) pipe_name: Option<String>,

    /// Analyse one file (relative path) and print its diagnostics as JSON
    #[arg(long, value_name = "FILE")]
    pub(crate) analyze: Option<String>,

    /// With --analyze: print only errors as `Line L:C: message`
    #[arg(long, requires = "analyze")]
    pub(crate) errors_only: bool,

    /// Log filter, overrides RUST_LOG
    #[arg(long, value_name = "FILTER")]
    pub(crate) log_level: Option<String>,

    /// Workspace folders used when the client sends none
    #[arg(value_name = "PATH")]
    pub(crate) paths: Vec<PathBuf>,
}

pub(crate) fn analyze_file(path: &str, errors_only: bool, registry: Arc<LibraryRegistry>) -> anyhow::Result<String> {
    let content = read_file_content(path)?;
    let working_dir = std::env::current_dir().context("Failed to determine working directory")?;
    let source = working_dir.join(path);

    let manager = Arc::new(ImportsManager::new(
        ImportsConfig {
            working_dir,
            ..ImportsConfig::default()
        },
        registry,
    ));
    let model = Arc::new(parse_with_source(&content, Some(source.clone())));
    let namespace = Namespace::new(
        manager,
        model,
        source.clone(),
        DocumentType::from_path(&source),
        NamespaceOptions::default(),
    );
    let cancel = CancellationToken::new();
    let diagnostics = namespace.diagnostics(&cancel)?;

    if errors_only {
        let errors: Vec<String> = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| {
                format!(
                    "Line {}:{}: {}",
                    d.range.start.line + 1,
                    d.range.start.character + 1,
                    d.message
                )
            })
            .collect();
        if errors.is_empty() {
            return Ok("No errors found".to_string());
        }
        return Ok(errors.join("\n"));
    }

    let analysis = namespace.analyze(&cancel)?;
    let imports = namespace.imports();
    let keywords: Vec<String> = namespace
        .get_library_doc()
        .keywords
        .iter()
        .map(|k| k.name.clone())
        .collect();
    let references: Vec<serde_json::Value> = analysis
        .keyword_references
        .iter()
        .map(|(keyword, locations)| {
            serde_json::json!({
                "keyword": keyword.full_name(),
                "count": locations.len(),
            })
        })
        .collect();
    let output = serde_json::json!({
        "source": path,
        "diagnostics": diagnostics,
        "libraries": imports.libraries.values().map(|l| l.name.clone()).collect::<Vec<_>>(),
        "resources": imports.resources.keys().collect::<Vec<_>>(),
        "keywords": keywords,
        "keyword_references": references,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

pub(crate) fn is_safe_path(path: &str) -> bool {
    let path = Path::new(path);

    if path.as_os_str().is_empty() {
        return false;
    }
    if path.is_absolute() {
        return false;
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return false;
    }

    let s = path.to_string_lossy();
    let suspicious = ['\0', '\n', '\r', '\t'];
    if s.chars().any(|c| suspicious.contains(&c)) {
        return false;
    }
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        if bytes[1] == b':' {
            return false;
        }
    }
    true
}

pub(crate) fn read_file_content(path: &str) -> anyhow::Result<String> {
    if !is_safe_path(path) {
        return Err(anyhow::anyhow!("Unsafe file path: {}", path));
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path))
}
