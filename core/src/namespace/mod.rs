//! Per-document view of imports, keywords and variables.
//!
//! A [`Namespace`] is built for one version of one document. Import
//! resolution, the document's own keyword doc and the analysis are each
//! computed once under their own lock; a cancelled computation leaves
//! nothing behind.

mod entries;
mod resolver;
mod scope;

#[cfg(test)]
mod namespace_test;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use indexmap::IndexSet;
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::analyzer::{AnalysisResult, Analyzer};
use crate::cancel::{CancellationToken, Cancelled};
use crate::diagnostics::Diagnostic;
use crate::finder::KeywordFinder;
use crate::imports::ImportsManager;
use crate::library::{library_doc_from_model, variable_section_definitions, KeywordDoc, LibraryDoc, LibraryType};
use crate::model::{Block, File, SectionKind};
use crate::token::{Position, Range, TokenType};
use crate::variables::{builtin_variables, curdir_variable, BlockScope, VariableDefinition};

pub use entries::{
    collect_imports, EntryRef, Import, LibraryEntry, NamespaceImports, ResourceEntry, VariablesEntry,
};
pub use scope::{VariableScope, VariableTable};

static IGNORE_COMMENT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^#\s*robotcode\s*:\s*ignore\b").ok());

pub const DEFAULT_BDD_PREFIXES: &[&str] = &["Given", "When", "Then", "And", "But"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    General,
    Resource,
    Init,
}

impl DocumentType {
    pub fn from_path(path: &Path) -> Self {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if stem == "__init__" {
            DocumentType::Init
        } else if extension == "resource" {
            DocumentType::Resource
        } else {
            DocumentType::General
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceOptions {
    /// Library and resource names tried first for ambiguous keywords.
    pub search_order: Vec<String>,
    pub bdd_prefixes: Vec<String>,
    /// Robot Framework version the analysis targets.
    pub robot_version: (u32, u32),
    /// Report keywords and local variables that are never used.
    pub find_unused: bool,
}

impl Default for NamespaceOptions {
    fn default() -> Self {
        Self {
            search_order: Vec::new(),
            bdd_prefixes: DEFAULT_BDD_PREFIXES.iter().map(|p| p.to_string()).collect(),
            robot_version: (7, 0),
            find_unused: false,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Namespace {
    source: PathBuf,
    document_type: DocumentType,
    model: Arc<File>,
    imports_manager: Arc<ImportsManager>,
    options: NamespaceOptions,
    imports: Mutex<Option<Arc<NamespaceImports>>>,
    library_doc: Mutex<Option<Arc<LibraryDoc>>>,
    analysis: Mutex<Option<Arc<AnalysisResult>>>,
    finder: Mutex<Option<Arc<KeywordFinder>>>,
    global_variables: Mutex<Option<Arc<VariableTable>>>,
    own_variables: OnceCell<Vec<Arc<VariableDefinition>>>,
    ignored_lines: OnceCell<FxHashSet<u32>>,
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("source", &self.source)
            .field("document_type", &self.document_type)
            .finish()
    }
}

impl Namespace {
    pub fn new(
        imports_manager: Arc<ImportsManager>,
        model: Arc<File>,
        source: impl Into<PathBuf>,
        document_type: DocumentType,
        options: NamespaceOptions,
    ) -> Self {
        Self {
            source: source.into(),
            document_type,
            model,
            imports_manager,
            options,
            imports: Mutex::new(None),
            library_doc: Mutex::new(None),
            analysis: Mutex::new(None),
            finder: Mutex::new(None),
            global_variables: Mutex::new(None),
            own_variables: OnceCell::new(),
            ignored_lines: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn model(&self) -> &File {
        &self.model
    }

    pub fn imports_manager(&self) -> &ImportsManager {
        &self.imports_manager
    }

    pub fn options(&self) -> &NamespaceOptions {
        &self.options
    }

    fn base_dir(&self) -> PathBuf {
        self.source.parent().map(Path::to_path_buf).unwrap_or_default()
    }

    /// Resolve imports once. Nothing is stored when cancelled.
    pub fn ensure_initialized(&self, cancel: &CancellationToken) -> Result<Arc<NamespaceImports>, Cancelled> {
        let mut guard = lock(&self.imports);
        if let Some(imports) = guard.as_ref() {
            return Ok(imports.clone());
        }
        let started = Instant::now();
        let resolved = Arc::new(resolver::ImportResolver::new(self, cancel).run()?);
        debug!(
            "initialized namespace for {} ({} libraries, {} resources) in {:?}",
            self.source.display(),
            resolved.libraries.len(),
            resolved.resources.len(),
            started.elapsed()
        );
        *guard = Some(resolved.clone());
        Ok(resolved)
    }

    /// Resolved imports, initializing without a cancel request if needed.
    pub fn imports(&self) -> Arc<NamespaceImports> {
        self.ensure_initialized(&CancellationToken::new()).unwrap_or_default()
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.imports).is_some()
    }

    /// Take over the resolved imports of an earlier version of this document
    /// when its imports did not change.
    pub fn adopt_imports_from(&self, previous: &Namespace) -> bool {
        let Some(resolved) = lock(&previous.imports).clone() else {
            return false;
        };
        if resolved.imports != collect_imports(&self.model, &self.source) {
            return false;
        }
        *lock(&self.imports) = Some(resolved);
        true
    }

    /// Whether one of `docs` was reachable from this namespace.
    pub fn depends_on(&self, docs: &[Arc<LibraryDoc>]) -> bool {
        match lock(&self.imports).as_ref() {
            Some(imports) => imports.depends_on(docs.iter().map(|d| d.digest.as_str())),
            None => false,
        }
    }

    /// Doc of the document's own keywords and variables.
    pub fn get_library_doc(&self) -> Arc<LibraryDoc> {
        let mut guard = lock(&self.library_doc);
        if let Some(doc) = guard.as_ref() {
            return doc.clone();
        }
        let name = self.source.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let libtype = match self.document_type {
            DocumentType::Resource => LibraryType::Resource,
            DocumentType::General | DocumentType::Init => LibraryType::Library,
        };
        let doc = Arc::new(library_doc_from_model(&self.model, name, Some(&self.source), libtype));
        *guard = Some(doc.clone());
        doc
    }

    pub fn own_variables(&self) -> &[Arc<VariableDefinition>] {
        self.own_variables
            .get_or_init(|| variable_section_definitions(&self.model, Some(&self.source)))
    }

    pub fn builtin_variables(&self) -> Vec<Arc<VariableDefinition>> {
        let mut out = builtin_variables(&self.imports_manager.config().working_dir);
        out.push(curdir_variable(&self.base_dir()));
        out
    }

    /// Document-wide variables in precedence order: own `*** Variables ***`,
    /// imported resources, variables files, command line, builtins.
    pub fn global_variables(&self) -> Arc<VariableTable> {
        let mut guard = lock(&self.global_variables);
        if let Some(table) = guard.as_ref() {
            return table.clone();
        }
        let imports = self.imports();
        let mut table = VariableTable::new();
        scope::extend_table(&mut table, self.own_variables());
        for entry in imports.resources.values() {
            scope::extend_table(&mut table, &entry.doc.variables);
        }
        for entry in imports.variables.values() {
            scope::extend_table(&mut table, entry.variables());
        }
        scope::extend_table(&mut table, self.imports_manager.get_command_line_variables().iter());
        scope::extend_table(&mut table, &self.builtin_variables());
        let table = Arc::new(table);
        *guard = Some(table.clone());
        table
    }

    /// Variables visible at `position` inside `block` (a test case or
    /// keyword), or document-wide ones without a block.
    pub fn variable_scope(&self, block: Option<&Block>, position: Option<Position>) -> VariableScope {
        let local = block
            .map(|b| BlockScope::collect(b, position, Some(&self.source)))
            .unwrap_or_default();
        VariableScope::new(local, self.global_variables())
    }

    pub fn get_variable_matchers(&self, block: Option<&Block>, position: Option<Position>) -> VariableTable {
        self.variable_scope(block, position).to_table()
    }

    pub fn find_variable(
        &self,
        name: &str,
        block: Option<&Block>,
        position: Option<Position>,
    ) -> Option<Arc<VariableDefinition>> {
        self.variable_scope(block, position).find_name(name)
    }

    /// Definitions with a value that may be substituted.
    pub fn resolvable_variables(&self, block: Option<&Block>, position: Option<Position>) -> Vec<Arc<VariableDefinition>> {
        self.get_variable_matchers(block, position)
            .into_values()
            .filter(|d| d.resolvable && d.has_value)
            .collect()
    }

    pub fn get_libraries(&self) -> Vec<LibraryEntry> {
        self.imports().libraries.values().cloned().collect()
    }

    pub fn get_resources(&self) -> Vec<ResourceEntry> {
        self.imports().resources.values().cloned().collect()
    }

    pub fn get_imported_variables(&self) -> Vec<VariablesEntry> {
        self.imports().variables.values().cloned().collect()
    }

    /// Every keyword callable from this document.
    pub fn get_keywords(&self) -> Vec<Arc<KeywordDoc>> {
        let imports = self.imports();
        let mut out: IndexSet<Arc<KeywordDoc>> = IndexSet::new();
        out.extend(self.get_library_doc().keywords.iter().cloned());
        for entry in imports.resources.values() {
            out.extend(entry.doc.keywords.iter().cloned());
        }
        for entry in imports.libraries.values() {
            out.extend(entry.doc.keywords.iter().cloned());
        }
        out.into_iter().collect()
    }

    /// Doc that owns `keyword`.
    pub fn library_doc_of(&self, keyword: &KeywordDoc) -> Option<Arc<LibraryDoc>> {
        let own = self.get_library_doc();
        if own.digest == keyword.parent_digest {
            return Some(own);
        }
        let imports = self.imports();
        imports
            .libraries
            .values()
            .map(|e| &e.doc)
            .chain(imports.resources.values().map(|e| &e.doc))
            .find(|d| d.digest == keyword.parent_digest)
            .cloned()
    }

    pub fn search_order(&self) -> &[String] {
        &self.options.search_order
    }

    pub fn finder(&self) -> Arc<KeywordFinder> {
        let mut guard = lock(&self.finder);
        if let Some(finder) = guard.as_ref() {
            return finder.clone();
        }
        let finder = Arc::new(KeywordFinder::new(
            self.get_library_doc(),
            self.imports(),
            self.source.clone(),
            self.options.search_order.clone(),
            self.options.bdd_prefixes.clone(),
        ));
        *guard = Some(finder.clone());
        finder
    }

    pub fn find_keyword(&self, name: &str) -> Option<Arc<KeywordDoc>> {
        self.finder().find_keyword(name).keyword.clone()
    }

    /// Analyse once. A cancelled run is discarded.
    pub fn analyze(&self, cancel: &CancellationToken) -> Result<Arc<AnalysisResult>, Cancelled> {
        let imports = self.ensure_initialized(cancel)?;
        let mut guard = lock(&self.analysis);
        if let Some(result) = guard.as_ref() {
            return Ok(result.clone());
        }
        let started = Instant::now();
        let result = Arc::new(Analyzer::new(self, imports, cancel).run()?);
        debug!(
            "analyzed {} ({} diagnostics) in {:?}",
            self.source.display(),
            result.diagnostics.len(),
            started.elapsed()
        );
        *guard = Some(result.clone());
        Ok(result)
    }

    /// Analysis if it already finished, without starting one.
    pub fn cached_analysis(&self) -> Option<Arc<AnalysisResult>> {
        lock(&self.analysis).clone()
    }

    /// Import and analysis diagnostics, minus ignored lines, in document
    /// order.
    pub fn diagnostics(&self, cancel: &CancellationToken) -> Result<Vec<Diagnostic>, Cancelled> {
        let imports = self.ensure_initialized(cancel)?;
        let analysis = self.analyze(cancel)?;
        let mut out: Vec<Diagnostic> = self
            .own_doc_diagnostics()
            .into_iter()
            .chain(imports.diagnostics.iter().cloned())
            .chain(analysis.diagnostics.iter().cloned())
            .filter(|d| !self.should_ignore(d.range))
            .collect();
        out.sort_by_key(|d| d.range.start);
        Ok(out)
    }

    fn own_doc_diagnostics(&self) -> Vec<Diagnostic> {
        let doc = self.get_library_doc();
        doc.errors
            .iter()
            .filter(|e| e.source.as_deref() == Some(self.source.as_path()))
            .map(|error| {
                let line = error.line_no.unwrap_or(1).saturating_sub(1);
                let range = self
                    .model
                    .sections
                    .iter()
                    .filter_map(|s| s.header.as_ref())
                    .find(|h| h.lineno().saturating_sub(1) == line)
                    .map(|h| h.range())
                    .unwrap_or_else(|| Range::new(Position::new(line, 0), Position::new(line, 0)));
                Diagnostic::error(range, &error.type_name, &error.message)
            })
            .collect()
    }

    fn ignored_lines(&self) -> &FxHashSet<u32> {
        self.ignored_lines.get_or_init(|| {
            let mut lines = FxHashSet::default();
            let Some(pattern) = IGNORE_COMMENT.as_ref() else {
                return lines;
            };
            let mut stack: Vec<&Block> = self.model.sections.iter().collect();
            while let Some(block) = stack.pop() {
                let statements = block
                    .header
                    .iter()
                    .chain(block.statements())
                    .chain(block.end.iter());
                for statement in statements {
                    let ignored = statement
                        .tokens
                        .iter()
                        .filter(|t| t.kind == TokenType::Comment)
                        .any(|t| pattern.is_match(t.value.trim()));
                    if ignored {
                        lines.extend(statement.lineno().saturating_sub(1)..statement.end_lineno());
                    }
                }
                stack.extend(block.blocks());
                stack.extend(block.branches.iter());
            }
            lines
        })
    }

    /// Whether any line of `range` carries a `# robotcode: ignore` comment.
    pub fn should_ignore(&self, range: Range) -> bool {
        let lines = self.ignored_lines();
        (range.start.line..=range.end.line).any(|line| lines.contains(&line))
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.model.has_section(kind)
    }
}
