use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, Location};
use crate::imports::ImportKind;
use crate::library::LibraryDoc;
use crate::model::{walk_block, walk_file, Block, BlockKind, File, SectionKind, Statement, StatementKind, Visitor};
use crate::token::{Range, TokenType};
use crate::variables::VariableDefinition;

/// One `Library`, `Resource` or `Variables` setting.
///
/// Equality is structural, including ranges, so that a namespace can reuse
/// the resolved imports of a previous version of the same document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Import {
    pub kind: ImportKind,
    pub name: Option<String>,
    /// Range of the name, or of the setting itself when the name is missing.
    pub name_range: Range,
    pub args: Vec<String>,
    pub alias: Option<String>,
    pub alias_range: Option<Range>,
    pub range: Range,
    pub source: PathBuf,
}

impl Import {
    pub fn from_statement(statement: &Statement, source: &Path) -> Option<Self> {
        let kind = match statement.kind {
            StatementKind::LibraryImport => ImportKind::Library,
            StatementKind::ResourceImport => ImportKind::Resource,
            StatementKind::VariablesImport => ImportKind::Variables,
            _ => return None,
        };
        let name_token = statement.get_token(TokenType::Name);
        let alias_token = statement.alias_token();
        Some(Self {
            kind,
            name: name_token.map(|t| t.value.clone()),
            name_range: name_token
                .or_else(|| statement.tokens.first())
                .map(|t| t.range())
                .unwrap_or_else(|| statement.range()),
            args: statement.values(TokenType::Argument).into_iter().map(str::to_string).collect(),
            alias: alias_token.map(|t| t.value.clone()),
            alias_range: alias_token.map(|t| t.range()),
            range: statement.range(),
            source: source.to_path_buf(),
        })
    }

    pub fn location(&self) -> Location {
        Location::new(&self.source, self.range)
    }
}

struct ImportCollector<'a> {
    source: &'a Path,
    in_settings: bool,
    imports: Vec<Import>,
}

impl Visitor for ImportCollector<'_> {
    fn visit_block(&mut self, block: &Block) {
        if let BlockKind::Section(kind) = block.kind {
            self.in_settings = kind == SectionKind::Settings;
            if !self.in_settings {
                return;
            }
        }
        walk_block(self, block);
    }

    fn visit_statement(&mut self, statement: &Statement) {
        if !self.in_settings {
            return;
        }
        if let Some(import) = Import::from_statement(statement, self.source) {
            self.imports.push(import);
        }
    }
}

/// Imports of `file` in document order.
pub fn collect_imports(file: &File, source: &Path) -> Vec<Import> {
    let mut collector = ImportCollector {
        source,
        in_settings: false,
        imports: Vec::new(),
    };
    walk_file(&mut collector, file);
    collector.imports
}

#[derive(Debug, Clone)]
pub struct LibraryEntry {
    /// Alias if given, library name otherwise.
    pub name: String,
    pub import_name: String,
    pub args: Vec<String>,
    pub alias: Option<String>,
    pub doc: Arc<LibraryDoc>,
    /// `None` for libraries imported by default.
    pub import: Option<Import>,
    /// Packaged standard library.
    pub is_standard: bool,
}

#[derive(Debug, Clone)]
pub struct ResourceEntry {
    pub name: String,
    pub import_name: String,
    pub path: PathBuf,
    pub doc: Arc<LibraryDoc>,
    pub model: Arc<File>,
    pub import: Option<Import>,
    /// Imports declared inside the resource.
    pub imports: Vec<Import>,
}

#[derive(Debug, Clone)]
pub struct VariablesEntry {
    pub name: String,
    pub import_name: String,
    pub args: Vec<String>,
    pub path: PathBuf,
    pub doc: Arc<LibraryDoc>,
    pub import: Option<Import>,
}

impl VariablesEntry {
    pub fn variables(&self) -> &[Arc<VariableDefinition>] {
        &self.doc.variables
    }
}

/// Key of an imported entry, used for namespace references.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryRef {
    Library(String),
    Resource(PathBuf),
    Variables(PathBuf),
}

/// Resolved imports of one document, including everything reachable
/// through imported resources.
#[derive(Debug, Clone, Default)]
pub struct NamespaceImports {
    /// Top-level imports in document order.
    pub imports: Vec<Import>,
    /// Keyed by the normalized entry name.
    pub libraries: IndexMap<String, LibraryEntry>,
    pub resources: IndexMap<PathBuf, ResourceEntry>,
    pub variables: IndexMap<PathBuf, VariablesEntry>,
    /// Entry each top-level import resolved to.
    pub import_entries: IndexMap<Import, EntryRef>,
    pub diagnostics: Vec<Diagnostic>,
}

impl NamespaceImports {
    pub fn entry_for(&self, import: &Import) -> Option<&EntryRef> {
        self.import_entries.get(import)
    }

    pub fn library_doc_of(&self, entry: &EntryRef) -> Option<&Arc<LibraryDoc>> {
        match entry {
            EntryRef::Library(key) => self.libraries.get(key).map(|e| &e.doc),
            EntryRef::Resource(path) => self.resources.get(path).map(|e| &e.doc),
            EntryRef::Variables(path) => self.variables.get(path).map(|e| &e.doc),
        }
    }

    /// Whether any doc reachable from this namespace has one of `digests`.
    pub fn depends_on<'a>(&self, mut digests: impl Iterator<Item = &'a str>) -> bool {
        digests.any(|digest| {
            self.libraries.values().any(|e| e.doc.digest == digest)
                || self.resources.values().any(|e| e.doc.digest == digest)
                || self.variables.values().any(|e| e.doc.digest == digest)
        })
    }
}
