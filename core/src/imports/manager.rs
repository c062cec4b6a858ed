use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use rustc_hash::{FxHashMap, FxHasher};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::cache::DocCache;
use crate::library::{
    load_resource, load_variables, normalize_path, resource_from_text, LibraryDoc, LibraryLookup, LibraryRegistry,
    LibrarySource, LoadContext, LoaderError,
};
use crate::matcher::{normalize, VariableMatcher};
use crate::model::File;
use crate::token::Range;
use crate::variables::search::is_variable;
use crate::variables::{replace_scalar, VariableDefinition, VariableError, VariableType};

/// Settings shared by every import.
#[derive(Debug, Clone, Default)]
pub struct ImportsConfig {
    pub working_dir: PathBuf,
    pub python_path: Vec<PathBuf>,
    /// `--variable NAME:value` pairs.
    pub variables: IndexMap<String, String>,
    /// `--variablefile` entries.
    pub variable_files: Vec<String>,
    pub cache_dir: Option<PathBuf>,
}

/// Broadcast after cached docs were dropped.
#[derive(Debug, Clone)]
pub enum ImportsEvent {
    LibrariesChanged(Vec<Arc<LibraryDoc>>),
    ResourcesChanged(Vec<Arc<LibraryDoc>>),
    VariablesChanged(Vec<Arc<LibraryDoc>>),
}

/// A failed resource or variables lookup, shared between every importer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ImportFailure {
    pub message: String,
    pub code: String,
}

impl From<LoaderError> for ImportFailure {
    fn from(err: LoaderError) -> Self {
        Self {
            message: err.to_string(),
            code: err.code().to_string(),
        }
    }
}

/// Unsaved editor contents take precedence over files on disk.
pub trait DocumentSource: Send + Sync {
    fn text(&self, path: &Path) -> Option<String>;
}

#[derive(Debug)]
pub struct LoadedResource {
    pub path: PathBuf,
    pub model: Arc<File>,
    pub doc: Arc<LibraryDoc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LibraryKey {
    name: String,
    args: Vec<String>,
    alias: Option<String>,
    base_dir: Option<PathBuf>,
    variables_hash: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VariablesKey {
    path: PathBuf,
    args: Vec<String>,
}

type Slot<T> = Arc<OnceCell<T>>;
type LibrarySlot = Slot<Option<Arc<LibraryDoc>>>;
type ResourceSlot = Slot<Result<Arc<LoadedResource>, ImportFailure>>;
type VariablesSlot = Slot<Arc<LibraryDoc>>;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Fetch or create the slot for `key`. Callers initialise it outside the map
/// lock, so concurrent requests for one key wait on the same load.
fn slot<K: Eq + Hash + Clone, T>(map: &RwLock<FxHashMap<K, Slot<T>>>, key: &K) -> Slot<T> {
    if let Some(slot) = read(map).get(key) {
        return slot.clone();
    }
    write(map).entry(key.clone()).or_default().clone()
}

/// Lookup over the resolvable definitions of a variable snapshot.
pub fn variable_lookup(variables: &[Arc<VariableDefinition>]) -> impl Fn(&VariableMatcher) -> Option<Value> + '_ {
    move |matcher: &VariableMatcher| {
        variables
            .iter()
            .find(|d| d.resolvable && d.matcher() == *matcher)
            .and_then(|d| d.value.clone())
    }
}

fn contains_variables(text: &str) -> bool {
    text.contains("{")
}

fn snapshot_hash(variables: &[Arc<VariableDefinition>]) -> u64 {
    let mut hasher = FxHasher::default();
    for def in variables.iter().filter(|d| d.resolvable) {
        def.normalized_name().hash(&mut hasher);
        def.value_as_string().hash(&mut hasher);
    }
    hasher.finish()
}

/// Process-wide cache of imported docs, shared by every namespace.
pub struct ImportsManager {
    config: RwLock<ImportsConfig>,
    registry: Arc<LibraryRegistry>,
    libraries: RwLock<FxHashMap<LibraryKey, LibrarySlot>>,
    resources: RwLock<FxHashMap<PathBuf, ResourceSlot>>,
    variables: RwLock<FxHashMap<VariablesKey, VariablesSlot>>,
    command_line: RwLock<Option<Arc<Vec<Arc<VariableDefinition>>>>>,
    documents: RwLock<Option<Arc<dyn DocumentSource>>>,
    disk_cache: RwLock<Option<Arc<DocCache>>>,
    events: broadcast::Sender<ImportsEvent>,
}

impl std::fmt::Debug for ImportsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportsManager")
            .field("config", &*read(&self.config))
            .field("libraries", &read(&self.libraries).len())
            .field("resources", &read(&self.resources).len())
            .field("variables", &read(&self.variables).len())
            .finish()
    }
}

impl ImportsManager {
    pub fn new(config: ImportsConfig, registry: Arc<LibraryRegistry>) -> Self {
        let (events, _) = broadcast::channel(64);
        let manager = Self {
            config: RwLock::new(ImportsConfig::default()),
            registry,
            libraries: RwLock::default(),
            resources: RwLock::default(),
            variables: RwLock::default(),
            command_line: RwLock::new(None),
            documents: RwLock::new(None),
            disk_cache: RwLock::new(None),
            events,
        };
        manager.set_config(config);
        manager
    }

    pub fn config(&self) -> ImportsConfig {
        read(&self.config).clone()
    }

    pub fn registry(&self) -> &LibraryRegistry {
        &self.registry
    }

    /// Replace the configuration and drop every cached doc.
    pub fn set_config(&self, config: ImportsConfig) {
        let cache = config.cache_dir.as_deref().and_then(|dir| match DocCache::open(dir) {
            Ok(cache) => Some(Arc::new(cache)),
            Err(err) => {
                warn!("doc cache disabled: {:#}", err);
                None
            }
        });
        *write(&self.disk_cache) = cache;
        *write(&self.config) = config;
        self.clear();
    }

    pub fn set_document_source(&self, documents: Arc<dyn DocumentSource>) {
        *write(&self.documents) = Some(documents);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ImportsEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ImportsEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn clear(&self) {
        write(&self.libraries).clear();
        write(&self.resources).clear();
        write(&self.variables).clear();
        *write(&self.command_line) = None;
    }

    fn context<'a>(
        &'a self,
        config: &'a ImportsConfig,
        base_dir: &'a Path,
        lookup: &'a dyn crate::variables::VariableLookup,
    ) -> LoadContext<'a> {
        LoadContext {
            base_dir,
            working_dir: &config.working_dir,
            python_path: &config.python_path,
            variables: lookup,
            registry: &self.registry,
        }
    }

    /// Doc of a library import; `None` when the library is ignored.
    pub fn get_library(
        &self,
        name: &str,
        args: &[String],
        alias: Option<&str>,
        base_dir: &Path,
        variables: &[Arc<VariableDefinition>],
    ) -> Option<Arc<LibraryDoc>> {
        let uses_variables = contains_variables(name) || args.iter().any(|a| contains_variables(a));
        let key = LibraryKey {
            name: normalize(name),
            args: args.to_vec(),
            alias: alias.map(str::to_string),
            base_dir: (!self.registry.contains(name)).then(|| base_dir.to_path_buf()),
            variables_hash: if uses_variables { snapshot_hash(variables) } else { 0 },
        };
        let slot = slot(&self.libraries, &key);
        slot.get_or_init(|| self.load_library(name, args, base_dir, variables)).clone()
    }

    fn load_library(
        &self,
        name: &str,
        args: &[String],
        base_dir: &Path,
        variables: &[Arc<VariableDefinition>],
    ) -> Option<Arc<LibraryDoc>> {
        let started = Instant::now();
        let config = self.config();
        let lookup = variable_lookup(variables);
        let ctx = self.context(&config, base_dir, &lookup);
        let doc = match ctx.lookup_library(name) {
            LibraryLookup::Ignored => return None,
            LibraryLookup::Failed(doc) => doc,
            LibraryLookup::Found { resolved, source } => {
                let doc = self.read_library_cached(&ctx, &resolved, &source, args)?;
                ctx.check_init_arguments(doc, args)
            }
        };
        info!(
            "loaded library '{}' ({} keywords, {} errors) in {:?}",
            doc.name,
            doc.keywords.len(),
            doc.errors.len(),
            started.elapsed()
        );
        Some(doc)
    }

    fn read_library_cached(
        &self,
        ctx: &LoadContext<'_>,
        resolved: &str,
        source: &LibrarySource,
        args: &[String],
    ) -> Option<Arc<LibraryDoc>> {
        let cache = read(&self.disk_cache).clone();
        let (Some(cache), Some(path)) = (cache, source.path()) else {
            return ctx.read_library(resolved, source);
        };
        if let Some(doc) = cache.get(resolved, args, path) {
            return Some(Arc::new(doc));
        }
        let doc = ctx.read_library(resolved, source)?;
        if let Err(err) = cache.put(resolved, args, path, &doc) {
            warn!("caching doc of '{}' failed: {:#}", resolved, err);
        }
        Some(doc)
    }

    pub fn find_resource(
        &self,
        name: &str,
        base_dir: &Path,
        variables: &[Arc<VariableDefinition>],
    ) -> Result<PathBuf, ImportFailure> {
        let config = self.config();
        let lookup = variable_lookup(variables);
        Ok(self.context(&config, base_dir, &lookup).find_resource(name)?)
    }

    pub fn get_resource(&self, path: &Path) -> Result<Arc<LoadedResource>, ImportFailure> {
        let path = normalize_path(path);
        let slot = slot(&self.resources, &path);
        slot.get_or_init(|| self.load_resource(&path)).clone()
    }

    fn load_resource(&self, path: &Path) -> Result<Arc<LoadedResource>, ImportFailure> {
        let documents = read(&self.documents).clone();
        let (model, doc) = match documents.and_then(|d| d.text(path)) {
            Some(text) => resource_from_text(path, &text),
            None => load_resource(path)?,
        };
        debug!("loaded resource {} ({} keywords)", path.display(), doc.keywords.len());
        Ok(Arc::new(LoadedResource {
            path: path.to_path_buf(),
            model: Arc::new(model),
            doc: Arc::new(doc),
        }))
    }

    pub fn find_variables(
        &self,
        name: &str,
        base_dir: &Path,
        variables: &[Arc<VariableDefinition>],
    ) -> Result<PathBuf, ImportFailure> {
        let config = self.config();
        let lookup = variable_lookup(variables);
        Ok(self.context(&config, base_dir, &lookup).find_variables(name)?)
    }

    pub fn get_variables(&self, path: &Path, args: &[String]) -> Arc<LibraryDoc> {
        let key = VariablesKey {
            path: normalize_path(path),
            args: args.to_vec(),
        };
        let slot = slot(&self.variables, &key);
        slot.get_or_init(|| {
            let name = key.path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            Arc::new(load_variables(&key.path, name))
        })
        .clone()
    }

    /// `--variable` and `--variablefile` definitions, computed once per
    /// configuration.
    pub fn get_command_line_variables(&self) -> Arc<Vec<Arc<VariableDefinition>>> {
        if let Some(vars) = read(&self.command_line).clone() {
            return vars;
        }
        let config = self.config();
        let mut out = Vec::new();
        for (name, value) in &config.variables {
            let name = if is_variable(name) { name.clone() } else { format!("${{{name}}}") };
            let def = VariableDefinition::new(name, VariableType::CommandLineVariable, Range::zero(), None)
                .with_value(Value::String(value.clone()));
            out.push(Arc::new(def));
        }
        for file in &config.variable_files {
            let path = normalize_path(&config.working_dir.join(file));
            let doc = self.get_variables(&path, &[]);
            for var in &doc.variables {
                let mut def = (**var).clone();
                def.kind = VariableType::CommandLineVariable;
                out.push(Arc::new(def));
            }
        }
        let out = Arc::new(out);
        *write(&self.command_line) = Some(out.clone());
        out
    }

    /// Evaluate a variable expression against a snapshot.
    pub fn resolve_variable(
        &self,
        name: &str,
        variables: &[Arc<VariableDefinition>],
    ) -> Result<Value, VariableError> {
        replace_scalar(name, &variable_lookup(variables))
    }

    /// Drop cached docs built from `path`, broadcasting what was dropped.
    /// Returns whether anything was invalidated.
    pub fn invalidate(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let retry_failed = matches!(extension.as_str(), "py" | "json" | "libspec");

        if let Some(cache) = read(&self.disk_cache).clone() {
            if let Err(err) = cache.remove_source(&path) {
                warn!("doc cache cleanup failed: {:#}", err);
            }
        }

        let mut libraries = Vec::new();
        write(&self.libraries).retain(|_, slot| match slot.get() {
            Some(Some(doc)) => {
                let stale = doc.source.as_deref() == Some(path.as_path())
                    || (retry_failed && doc.source.is_none() && doc.has_errors());
                if stale {
                    libraries.push(doc.clone());
                }
                !stale
            }
            _ => true,
        });

        let mut resources = Vec::new();
        if let Some(slot) = write(&self.resources).remove(&path) {
            if let Some(Ok(loaded)) = slot.get() {
                resources.push(loaded.doc.clone());
            }
        }

        let mut variables = Vec::new();
        write(&self.variables).retain(|key, slot| {
            if key.path != path {
                return true;
            }
            if let Some(doc) = slot.get() {
                variables.push(doc.clone());
            }
            false
        });
        if !variables.is_empty() {
            *write(&self.command_line) = None;
        }

        let changed = !(libraries.is_empty() && resources.is_empty() && variables.is_empty());
        if !libraries.is_empty() {
            debug!("invalidated {} library docs for {}", libraries.len(), path.display());
            self.emit(ImportsEvent::LibrariesChanged(libraries));
        }
        if !resources.is_empty() {
            self.emit(ImportsEvent::ResourcesChanged(resources));
        }
        if !variables.is_empty() {
            self.emit(ImportsEvent::VariablesChanged(variables));
        }
        changed
    }
}
