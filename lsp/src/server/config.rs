use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use tower_lsp::lsp_types::ConfigurationItem;
use tracing::{debug, warn};

use robotls_core::imports::ImportsConfig;
use robotls_core::namespace::{NamespaceOptions, DEFAULT_BDD_PREFIXES};

use super::state::RobotLanguageServer;
use super::utils::compute_content_hash;

pub(crate) const CONFIG_SECTION: &str = "robotls";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum DiagnosticsMode {
    Off,
    Workspace,
    #[default]
    OpenFilesOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum ProgressMode {
    Off,
    #[default]
    Simple,
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum CacheLocation {
    #[default]
    WorkspaceStorage,
    WorkspaceFolder,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ServerConfig {
    pub(crate) exclude_patterns: Vec<String>,
    pub(crate) diagnostic_mode: DiagnosticsMode,
    pub(crate) progress_mode: ProgressMode,
    pub(crate) references_code_lens: bool,
    pub(crate) find_unused_references: bool,
    pub(crate) cache_location: CacheLocation,
    pub(crate) search_order: Vec<String>,
    pub(crate) max_concurrent: usize,
    pub(crate) inlay_parameter_names: bool,
    pub(crate) inlay_namespaces: bool,
    pub(crate) python_path: Vec<String>,
    pub(crate) variables: IndexMap<String, String>,
    pub(crate) variable_files: Vec<String>,
    pub(crate) bdd_prefixes: Vec<String>,
    pub(crate) robot_version: (u32, u32),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            diagnostic_mode: DiagnosticsMode::default(),
            progress_mode: ProgressMode::default(),
            references_code_lens: false,
            find_unused_references: false,
            cache_location: CacheLocation::default(),
            search_order: Vec::new(),
            max_concurrent: 2,
            inlay_parameter_names: true,
            inlay_namespaces: false,
            python_path: Vec::new(),
            variables: IndexMap::new(),
            variable_files: Vec::new(),
            bdd_prefixes: DEFAULT_BDD_PREFIXES.iter().map(|p| p.to_string()).collect(),
            robot_version: (7, 0),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RobotlsConfigSection {
    #[serde(default)]
    workspace: WorkspaceSection,
    #[serde(default)]
    analysis: AnalysisSection,
    #[serde(default)]
    inlay_hints: InlayHintsSection,
    #[serde(default)]
    robot: RobotSection,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WorkspaceSection {
    #[serde(default)]
    exclude_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AnalysisSection {
    #[serde(default)]
    diagnostic_mode: Option<DiagnosticsMode>,
    #[serde(default)]
    progress_mode: Option<ProgressMode>,
    #[serde(default)]
    references_code_lens: Option<bool>,
    #[serde(default)]
    find_unused_references: Option<bool>,
    #[serde(default)]
    cache: CacheSection,
    #[serde(default)]
    search_order: Option<Vec<String>>,
    #[serde(default)]
    max_concurrent: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CacheSection {
    #[serde(default)]
    save_location: Option<CacheLocation>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct InlayHintsSection {
    #[serde(default)]
    parameter_names: Option<bool>,
    #[serde(default)]
    namespaces: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RobotSection {
    #[serde(default)]
    python_path: Option<Vec<String>>,
    #[serde(default)]
    variables: Option<IndexMap<String, String>>,
    #[serde(default)]
    variable_files: Option<Vec<String>>,
    #[serde(default)]
    bdd_prefixes: Option<Vec<String>>,
    #[serde(default)]
    version: Option<String>,
}

/// `"6.1.1"` -> `(6, 1)`. Unparsable parts count as zero.
pub(crate) fn parse_version(value: &str) -> Option<(u32, u32)> {
    let mut parts = value.trim().split('.');
    let major = parts.next()?.trim().parse().ok()?;
    let minor = parts.next().and_then(|m| m.trim().parse().ok()).unwrap_or(0);
    Some((major, minor))
}

impl ServerConfig {
    pub(crate) fn from_section(section: RobotlsConfigSection) -> Self {
        let defaults = Self::default();
        let analysis = section.analysis;
        let robot = section.robot;
        Self {
            exclude_patterns: section.workspace.exclude_patterns.unwrap_or(defaults.exclude_patterns),
            diagnostic_mode: analysis.diagnostic_mode.unwrap_or(defaults.diagnostic_mode),
            progress_mode: analysis.progress_mode.unwrap_or(defaults.progress_mode),
            references_code_lens: analysis.references_code_lens.unwrap_or(defaults.references_code_lens),
            find_unused_references: analysis.find_unused_references.unwrap_or(defaults.find_unused_references),
            cache_location: analysis.cache.save_location.unwrap_or(defaults.cache_location),
            search_order: analysis.search_order.unwrap_or(defaults.search_order),
            max_concurrent: analysis
                .max_concurrent
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_concurrent),
            inlay_parameter_names: section.inlay_hints.parameter_names.unwrap_or(defaults.inlay_parameter_names),
            inlay_namespaces: section.inlay_hints.namespaces.unwrap_or(defaults.inlay_namespaces),
            python_path: robot.python_path.unwrap_or(defaults.python_path),
            variables: robot.variables.unwrap_or(defaults.variables),
            variable_files: robot.variable_files.unwrap_or(defaults.variable_files),
            bdd_prefixes: robot
                .bdd_prefixes
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.bdd_prefixes),
            robot_version: robot
                .version
                .as_deref()
                .and_then(parse_version)
                .unwrap_or(defaults.robot_version),
        }
    }

    pub(crate) fn namespace_options(&self) -> NamespaceOptions {
        NamespaceOptions {
            search_order: self.search_order.clone(),
            bdd_prefixes: self.bdd_prefixes.clone(),
            robot_version: self.robot_version,
            find_unused: self.find_unused_references,
        }
    }

    /// Import settings for a workspace rooted at `root`. Relative python
    /// paths are taken from the root.
    pub(crate) fn imports_config(&self, root: &Path) -> ImportsConfig {
        let cache_dir = match self.cache_location {
            CacheLocation::WorkspaceFolder => root.join(".robotls").join("cache"),
            CacheLocation::WorkspaceStorage => std::env::temp_dir()
                .join("robotls")
                .join(format!("{:016x}", compute_content_hash(&root.to_string_lossy()))),
        };
        ImportsConfig {
            working_dir: root.to_path_buf(),
            python_path: self
                .python_path
                .iter()
                .map(|p| {
                    let path = PathBuf::from(p);
                    if path.is_absolute() {
                        path
                    } else {
                        root.join(path)
                    }
                })
                .collect(),
            variables: self.variables.clone(),
            variable_files: self.variable_files.clone(),
            cache_dir: Some(cache_dir),
        }
    }

    /// Settings that change how imports resolve; editing them drops every
    /// cached library doc.
    fn same_imports(&self, other: &ServerConfig) -> bool {
        self.python_path == other.python_path
            && self.variables == other.variables
            && self.variable_files == other.variable_files
            && self.cache_location == other.cache_location
    }
}

impl RobotLanguageServer {
    pub(crate) async fn load_config(&self) {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some(CONFIG_SECTION.to_string()),
        }];

        let section = match self.client.configuration(items).await {
            Ok(values) => values
                .into_iter()
                .next()
                .filter(|v| !v.is_null())
                .map(serde_json::from_value::<RobotlsConfigSection>),
            Err(err) => {
                debug!("client returned no configuration: {}", err);
                None
            }
        };
        let config = match section {
            Some(Ok(section)) => ServerConfig::from_section(section),
            Some(Err(err)) => {
                warn!("invalid '{}' configuration: {}", CONFIG_SECTION, err);
                return;
            }
            None => ServerConfig::default(),
        };
        self.apply_config(config);
    }

    pub(crate) fn apply_config(&self, config: ServerConfig) {
        let previous = {
            let mut guard = self.config.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            std::mem::replace(&mut *guard, config.clone())
        };
        if !config.same_imports(&previous) || self.manager.config().cache_dir.is_none() {
            let root = self.root_dir();
            self.manager.set_config(config.imports_config(&root));
        }
        self.analysis.set_options(config.namespace_options());
        self.scheduler.configure(&config);
        debug!("configuration applied: {:?}", config);
    }
}
