use std::path::Path;
use std::sync::{Arc, RwLock};

use ropey::Rope;
use tower_lsp::lsp_types::{
    CodeLens, Command, Diagnostic, DiagnosticRelatedInformation, DiagnosticSeverity, DiagnosticTag, DocumentHighlight,
    DocumentHighlightKind, DocumentSymbol, Hover, HoverContents, InlayHint, Location, MarkupContent, MarkupKind, NumberOrString,
    Position, Range, SymbolKind, Url,
};
use tracing::debug;

use robotls_core::analyzer::AnalysisResult;
use robotls_core::cancel::{CancellationToken, Cancelled};
use robotls_core::diagnostics::{self as core_diag, Location as CoreLocation};
use robotls_core::imports::ImportsManager;
use robotls_core::library::KeywordDoc;
use robotls_core::model::{parse_with_source, Block, BlockKind, SectionKind, StatementKind};
use robotls_core::namespace::{DocumentType, EntryRef, Namespace, NamespaceOptions};
use robotls_core::token::{Position as CorePosition, Range as CoreRange};
use robotls_core::variables::VariableDefinition;

use super::documents::DocumentStore;
use super::inlay_hints::{compute_inlay_hints, InlayHintOptions};
use super::text::{to_core_position, to_lsp_range};
use super::utils::path_to_uri;

/// Namespace of one document revision together with the text it was built from.
pub(crate) struct DocumentAnalysis {
    pub(crate) revision: u64,
    pub(crate) version: Option<i32>,
    pub(crate) opened: bool,
    pub(crate) text: Rope,
    pub(crate) namespace: Namespace,
}

/// Diagnostics of one document revision, already in protocol form.
#[derive(Debug, Clone)]
pub(crate) struct DocumentDiagnostics {
    pub(crate) version: Option<i32>,
    pub(crate) revision: u64,
    pub(crate) opened: bool,
    pub(crate) items: Vec<Diagnostic>,
}

/// Something a cursor can point at.
enum Target {
    Keyword(Arc<KeywordDoc>),
    Variable(Arc<VariableDefinition>),
}

pub(crate) struct Analysis {
    documents: Arc<DocumentStore>,
    manager: Arc<ImportsManager>,
    options: RwLock<NamespaceOptions>,
}

impl Analysis {
    pub(crate) fn new(documents: Arc<DocumentStore>, manager: Arc<ImportsManager>) -> Self {
        Self {
            documents,
            manager,
            options: RwLock::new(NamespaceOptions::default()),
        }
    }

    pub(crate) fn documents(&self) -> &Arc<DocumentStore> {
        &self.documents
    }

    pub(crate) fn manager(&self) -> &Arc<ImportsManager> {
        &self.manager
    }

    fn options(&self) -> NamespaceOptions {
        self.options
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Replace the namespace options; every namespace is rebuilt on next use
    /// when they changed.
    pub(crate) fn set_options(&self, options: NamespaceOptions) -> bool {
        {
            let mut guard = self.options.write().unwrap_or_else(std::sync::PoisonError::into_inner);
            if *guard == options {
                return false;
            }
            *guard = options;
        }
        self.documents.invalidate_all();
        true
    }

    /// Namespace of the current text of `uri`. Imports resolved for the
    /// previous text are reused when the import statements did not change.
    pub(crate) fn document(&self, uri: &Url) -> Option<Arc<DocumentAnalysis>> {
        let options = self.options();
        self.documents.get_cache::<DocumentAnalysis, _>(uri, |snapshot, previous| {
            let text = snapshot.text.to_string();
            let model = Arc::new(parse_with_source(&text, Some(snapshot.path.clone())));
            let namespace = Namespace::new(
                self.manager.clone(),
                model,
                snapshot.path.clone(),
                DocumentType::from_path(&snapshot.path),
                options,
            );
            if let Some(previous) = previous {
                if namespace.adopt_imports_from(&previous.namespace) {
                    debug!("reusing imports of {} at revision {}", snapshot.uri, snapshot.revision);
                }
            }
            DocumentAnalysis {
                revision: snapshot.revision,
                version: snapshot.version,
                opened: snapshot.opened,
                text: snapshot.text.clone(),
                namespace,
            }
        })
    }

    /// Drop the namespaces whose imports reach one of the given docs.
    pub(crate) fn invalidate_dependents(&self, docs: &[Arc<robotls_core::library::LibraryDoc>]) -> Vec<Url> {
        let mut invalidated = Vec::new();
        for uri in self.documents.uris() {
            let Some(document) = self.documents.cached::<DocumentAnalysis>(&uri) else {
                continue;
            };
            if document.namespace.depends_on(docs) {
                self.documents.invalidate(&uri);
                invalidated.push(uri);
            }
        }
        invalidated
    }

    pub(crate) fn diagnostics(
        &self,
        uri: &Url,
        cancel: &CancellationToken,
    ) -> Result<Option<DocumentDiagnostics>, Cancelled> {
        let Some(document) = self.document(uri) else {
            return Ok(None);
        };
        let items = document.namespace.diagnostics(cancel)?;
        cancel.check()?;
        let items = items
            .iter()
            .map(|d| self.to_lsp_diagnostic(&document.text, d))
            .collect();
        Ok(Some(DocumentDiagnostics {
            version: document.version,
            revision: document.revision,
            opened: document.opened,
            items,
        }))
    }

    fn to_lsp_diagnostic(&self, text: &Rope, diagnostic: &core_diag::Diagnostic) -> Diagnostic {
        let related: Vec<DiagnosticRelatedInformation> = diagnostic
            .related
            .iter()
            .filter_map(|r| {
                Some(DiagnosticRelatedInformation {
                    location: self.to_lsp_location(&r.location)?,
                    message: r.message.clone(),
                })
            })
            .collect();
        let tags: Vec<DiagnosticTag> = diagnostic
            .tags
            .iter()
            .map(|t| match t {
                core_diag::DiagnosticTag::Unnecessary => DiagnosticTag::UNNECESSARY,
                core_diag::DiagnosticTag::Deprecated => DiagnosticTag::DEPRECATED,
            })
            .collect();
        Diagnostic {
            range: to_lsp_range(text, diagnostic.range),
            severity: Some(match diagnostic.severity {
                core_diag::Severity::Error => DiagnosticSeverity::ERROR,
                core_diag::Severity::Warning => DiagnosticSeverity::WARNING,
                core_diag::Severity::Information => DiagnosticSeverity::INFORMATION,
                core_diag::Severity::Hint => DiagnosticSeverity::HINT,
            }),
            code: Some(NumberOrString::String(diagnostic.code.clone())),
            code_description: None,
            source: Some(diagnostic.source.clone()),
            message: diagnostic.message.clone(),
            related_information: (!related.is_empty()).then_some(related),
            tags: (!tags.is_empty()).then_some(tags),
            data: None,
        }
    }

    /// Text used for column conversion of a range in `path`.
    fn rope_for(&self, path: &Path) -> Option<Rope> {
        if let Some(uri) = self.documents.uri_for_path(path) {
            return self.documents.rope(&uri);
        }
        std::fs::read_to_string(path).ok().map(|t| Rope::from_str(&t))
    }

    pub(crate) fn to_lsp_location(&self, location: &CoreLocation) -> Option<Location> {
        let uri = path_to_uri(&location.source)?;
        let range = match self.rope_for(&location.source) {
            Some(text) => to_lsp_range(&text, location.range),
            None => core_to_lsp_range(location.range),
        };
        Some(Location::new(uri, range))
    }

    fn analyze(&self, document: &DocumentAnalysis) -> Option<Arc<AnalysisResult>> {
        document.namespace.analyze(&CancellationToken::new()).ok()
    }

    /// Analysis of `uri` with the cursor converted to core columns.
    fn at(&self, uri: &Url, position: Position) -> Option<(Arc<DocumentAnalysis>, Arc<AnalysisResult>, CorePosition)> {
        let document = self.document(uri)?;
        let result = self.analyze(&document)?;
        let position = to_core_position(&document.text, position);
        Some((document, result, position))
    }

    fn target_at(&self, document: &DocumentAnalysis, result: &AnalysisResult, position: CorePosition) -> Option<Target> {
        let source = document.namespace.source();
        if let Some((keyword, _)) = result.keyword_at(source, position) {
            return Some(Target::Keyword(keyword));
        }
        if let Some((variable, _)) = result.variable_at(source, position) {
            return Some(Target::Variable(variable));
        }
        let own = document.namespace.get_library_doc();
        if let Some(keyword) = own.keywords.iter().find(|k| k.range.contains(position)) {
            return Some(Target::Keyword(keyword.clone()));
        }
        document
            .namespace
            .own_variables()
            .iter()
            .find(|v| v.range.contains(position))
            .cloned()
            .map(Target::Variable)
    }

    pub(crate) fn definition(&self, uri: &Url, position: Position) -> Option<Vec<Location>> {
        let (document, result, position) = self.at(uri, position)?;
        let source = document.namespace.source();
        if let Some((argument, _)) = result.argument_at(source, position) {
            let spec = argument.keyword.argument(&argument.name)?;
            let location = CoreLocation::new(argument.keyword.source.clone()?, spec.range?);
            return self.to_lsp_location(&location).map(|l| vec![l]);
        }
        if let Some((entry, _)) = result.namespace_at(source, position) {
            let imports = document.namespace.imports();
            let doc = imports.library_doc_of(&entry)?;
            let path = match &entry {
                EntryRef::Library(_) => doc.source.clone()?,
                EntryRef::Resource(path) | EntryRef::Variables(path) => path.clone(),
            };
            let line = doc.line_range.map(|(start, _)| start.saturating_sub(1)).unwrap_or(0);
            let range = CoreRange::new(CorePosition::new(line, 0), CorePosition::new(line, 0));
            return self.to_lsp_location(&CoreLocation::new(path, range)).map(|l| vec![l]);
        }
        let location = match self.target_at(&document, &result, position)? {
            Target::Keyword(keyword) => CoreLocation::new(keyword.source.clone()?, keyword.range),
            Target::Variable(variable) => CoreLocation::new(variable.source.clone()?, variable.range),
        };
        self.to_lsp_location(&location).map(|l| vec![l])
    }

    pub(crate) fn hover(&self, uri: &Url, position: Position) -> Option<Hover> {
        let (document, result, core_position) = self.at(uri, position)?;
        let source = document.namespace.source();
        let (value, range) = if let Some((keyword, range)) = result.keyword_at(source, core_position) {
            (keyword_markdown(&keyword), range)
        } else if let Some((variable, range)) = result.variable_at(source, core_position) {
            (variable_markdown(&variable), range)
        } else if let Some((argument, range)) = result.argument_at(source, core_position) {
            let spec = argument.keyword.argument(&argument.name)?;
            (
                format!("```\n{}\n```\n\nArgument of `{}`", spec.signature(), argument.keyword.full_name()),
                range,
            )
        } else if let Some((entry, range)) = result.namespace_at(source, core_position) {
            let imports = document.namespace.imports();
            let doc = imports.library_doc_of(&entry)?;
            let mut value = format!("**{}**", doc.name);
            if !doc.version.is_empty() {
                value.push_str(&format!(" {}", doc.version));
            }
            if !doc.doc.is_empty() {
                value.push_str("\n\n");
                value.push_str(&doc.doc);
            }
            (value, range)
        } else {
            return None;
        };
        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: Some(to_lsp_range(&document.text, range)),
        })
    }

    /// Locations referencing `target` in every known document.
    fn collect_references(&self, target: &Target, only: Option<&Url>) -> Vec<CoreLocation> {
        let uris = match only {
            Some(uri) => vec![uri.clone()],
            None => self.documents.uris(),
        };
        let mut locations = Vec::new();
        for uri in uris {
            let Some(document) = self.document(&uri) else {
                continue;
            };
            let Some(result) = self.analyze(&document) else {
                continue;
            };
            match target {
                Target::Keyword(keyword) => {
                    for (candidate, found) in &result.keyword_references {
                        if same_keyword(candidate, keyword) {
                            locations.extend(found.iter().cloned());
                        }
                    }
                }
                Target::Variable(variable) => {
                    for (candidate, found) in result
                        .variable_references
                        .iter()
                        .chain(result.local_variable_assignments.iter())
                    {
                        if same_variable(candidate, variable) {
                            locations.extend(found.iter().cloned());
                        }
                    }
                }
            }
        }
        locations.sort();
        locations.dedup();
        locations
    }

    fn declaration_of(target: &Target) -> Option<CoreLocation> {
        match target {
            Target::Keyword(k) => Some(CoreLocation::new(k.source.clone()?, k.range)),
            Target::Variable(v) => Some(CoreLocation::new(v.source.clone()?, v.range)),
        }
    }

    pub(crate) fn references(&self, uri: &Url, position: Position, include_declaration: bool) -> Option<Vec<Location>> {
        let (document, result, position) = self.at(uri, position)?;
        let target = self.target_at(&document, &result, position)?;
        let mut locations = self.collect_references(&target, None);
        if include_declaration {
            if let Some(declaration) = Self::declaration_of(&target) {
                if !locations.contains(&declaration) {
                    locations.insert(0, declaration);
                }
            }
        }
        Some(locations.iter().filter_map(|l| self.to_lsp_location(l)).collect())
    }

    pub(crate) fn highlights(&self, uri: &Url, position: Position) -> Option<Vec<DocumentHighlight>> {
        let (document, result, position) = self.at(uri, position)?;
        let target = self.target_at(&document, &result, position)?;
        let source = document.namespace.source();
        let mut highlights: Vec<DocumentHighlight> = self
            .collect_references(&target, Some(uri))
            .into_iter()
            .filter(|l| l.source == source)
            .map(|l| DocumentHighlight {
                range: to_lsp_range(&document.text, l.range),
                kind: Some(DocumentHighlightKind::READ),
            })
            .collect();
        if let Some(declaration) = Self::declaration_of(&target).filter(|d| d.source == source) {
            highlights.insert(
                0,
                DocumentHighlight {
                    range: to_lsp_range(&document.text, declaration.range),
                    kind: Some(DocumentHighlightKind::WRITE),
                },
            );
        }
        Some(highlights)
    }

    pub(crate) fn inlay_hints(&self, uri: &Url, range: Range, options: InlayHintOptions) -> Option<Vec<InlayHint>> {
        let document = self.document(uri)?;
        let result = self.analyze(&document)?;
        Some(compute_inlay_hints(&document, &result, range, options))
    }

    /// One lens per keyword defined in `uri` with its workspace reference count.
    pub(crate) fn code_lens(&self, uri: &Url) -> Option<Vec<CodeLens>> {
        let document = self.document(uri)?;
        let own = document.namespace.get_library_doc();
        let mut lenses = Vec::new();
        for keyword in own.keywords.iter() {
            let locations: Vec<Location> = self
                .collect_references(&Target::Keyword(keyword.clone()), None)
                .iter()
                .filter_map(|l| self.to_lsp_location(l))
                .collect();
            let range = to_lsp_range(&document.text, keyword.range);
            let title = match locations.len() {
                1 => "1 reference".to_string(),
                n => format!("{} references", n),
            };
            lenses.push(CodeLens {
                range,
                command: Some(Command {
                    title,
                    command: "editor.action.showReferences".to_string(),
                    arguments: Some(vec![
                        serde_json::json!(uri),
                        serde_json::json!(range.start),
                        serde_json::json!(locations),
                    ]),
                }),
                data: None,
            });
        }
        Some(lenses)
    }

    /// Sections with their test cases, keywords and variables.
    #[allow(deprecated)]
    pub(crate) fn document_symbols(&self, uri: &Url) -> Option<Vec<DocumentSymbol>> {
        let document = self.document(uri)?;
        let text = &document.text;
        let model = document.namespace.model();
        let mut symbols = Vec::new();
        for section in &model.sections {
            let BlockKind::Section(kind) = section.kind else {
                continue;
            };
            let name = match kind {
                SectionKind::Settings => "Settings",
                SectionKind::Variables => "Variables",
                SectionKind::TestCases => "Test Cases",
                SectionKind::Tasks => "Tasks",
                SectionKind::Keywords => "Keywords",
                SectionKind::Comments | SectionKind::Implicit | SectionKind::Invalid => continue,
            };
            let mut children = Vec::new();
            match kind {
                SectionKind::Variables => {
                    for statement in section.statements().filter(|s| s.kind == StatementKind::Variable) {
                        let Some(token) = statement.name_token() else {
                            continue;
                        };
                        children.push(DocumentSymbol {
                            name: token.value.trim_end_matches('=').trim_end().to_string(),
                            detail: None,
                            kind: SymbolKind::VARIABLE,
                            tags: None,
                            deprecated: None,
                            range: to_lsp_range(text, statement.range()),
                            selection_range: to_lsp_range(text, token.range()),
                            children: None,
                        });
                    }
                }
                SectionKind::TestCases | SectionKind::Tasks | SectionKind::Keywords => {
                    let symbol_kind = if kind == SectionKind::Keywords {
                        SymbolKind::FUNCTION
                    } else {
                        SymbolKind::METHOD
                    };
                    for block in section.blocks() {
                        if let Some(symbol) = block_symbol(text, block, symbol_kind) {
                            children.push(symbol);
                        }
                    }
                }
                _ => {}
            }
            let range = to_lsp_range(text, section.range());
            let selection_range = section
                .header
                .as_ref()
                .map(|h| to_lsp_range(text, h.range()))
                .unwrap_or(range);
            symbols.push(DocumentSymbol {
                name: name.to_string(),
                detail: None,
                kind: SymbolKind::NAMESPACE,
                tags: None,
                deprecated: None,
                range,
                selection_range,
                children: Some(children),
            });
        }
        Some(symbols)
    }
}

#[allow(deprecated)]
fn block_symbol(text: &Rope, block: &Block, kind: SymbolKind) -> Option<DocumentSymbol> {
    let header = block.header.as_ref()?;
    let name_token = header.name_token()?;
    Some(DocumentSymbol {
        name: name_token.value.clone(),
        detail: None,
        kind,
        tags: None,
        deprecated: None,
        range: to_lsp_range(text, block.range()),
        selection_range: to_lsp_range(text, name_token.range()),
        children: None,
    })
}

fn core_to_lsp_range(range: CoreRange) -> Range {
    Range::new(
        Position::new(range.start.line, range.start.character),
        Position::new(range.end.line, range.end.character),
    )
}

fn same_keyword(a: &KeywordDoc, b: &KeywordDoc) -> bool {
    a.name == b.name && a.source == b.source && a.range == b.range
}

fn same_variable(a: &VariableDefinition, b: &VariableDefinition) -> bool {
    a.name == b.name && a.source == b.source && a.range == b.range
}

pub(crate) fn keyword_markdown(keyword: &KeywordDoc) -> String {
    let mut value = format!("```\n{}\n```", keyword.signature());
    if let Some(message) = keyword.deprecation_message() {
        value.push_str(&format!("\n\n**Deprecated**: {}", message));
    }
    if !keyword.doc.is_empty() {
        value.push_str("\n\n");
        value.push_str(&keyword.doc);
    }
    value
}

fn variable_markdown(variable: &VariableDefinition) -> String {
    let mut value = format!("({}) `{}`", variable.kind.label(), variable.name);
    if let Some(current) = variable.value_as_string() {
        value.push_str(&format!(" = `{}`", current));
    }
    value
}
