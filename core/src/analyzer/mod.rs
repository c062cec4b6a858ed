//! Single pass over a parsed document producing diagnostics and the
//! reference maps feature endpoints read.
//!
//! Statements are dispatched through a table keyed by [`StatementKind`];
//! keyword calls and their nested run-keyword invocations live in `calls`,
//! variable references in `references`.

mod calls;
mod references;
mod result;

#[cfg(test)]
mod analyzer_test;

use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cancel::{CancellationToken, Cancelled};
use crate::diagnostics::{codes, Diagnostic, DiagnosticTag, Location};
use crate::finder::KeywordFinder;
use crate::imports::ImportKind;
use crate::library::LibraryDoc;
use crate::model::{Block, BlockKind, Node, Statement, StatementKind};
use crate::namespace::{DocumentType, Import, Namespace, NamespaceImports, VariableScope, VariableTable};
use crate::token::{Position, Range, TokenType};
use crate::variables::BlockScope;

pub use result::{AnalysisResult, ArgumentRef};

type Handler = fn(&mut Analyzer<'_>, &Statement);

static HANDLERS: Lazy<FxHashMap<StatementKind, Handler>> = Lazy::new(|| {
    let mut table: FxHashMap<StatementKind, Handler> = FxHashMap::default();
    table.insert(StatementKind::LibraryImport, |a, s| a.visit_import(s));
    table.insert(StatementKind::ResourceImport, |a, s| a.visit_import(s));
    table.insert(StatementKind::VariablesImport, |a, s| a.visit_import(s));
    table.insert(StatementKind::KeywordCall, |a, s| a.visit_keyword_call(s));
    for kind in [
        StatementKind::SuiteSetup,
        StatementKind::SuiteTeardown,
        StatementKind::TestSetup,
        StatementKind::TestTeardown,
        StatementKind::Setup,
        StatementKind::Teardown,
    ] {
        table.insert(kind, |a, s| a.visit_fixture(s));
    }
    table.insert(StatementKind::TestTemplate, |a, s| a.visit_template(s));
    table.insert(StatementKind::Template, |a, s| a.visit_template(s));
    table.insert(StatementKind::ForceTags, |a, s| a.visit_force_tags(s));
    table.insert(StatementKind::DefaultTags, |a, s| a.visit_force_tags(s));
    table.insert(StatementKind::Tags, |a, s| a.visit_tags(s));
    table.insert(StatementKind::TestTags, |a, s| a.visit_tags(s));
    table.insert(StatementKind::ReturnSetting, |a, s| a.visit_return_setting(s));
    table.insert(StatementKind::Var, |a, s| a.visit_var(s));
    table.insert(StatementKind::Variable, |a, s| a.visit_variable(s));
    table.insert(StatementKind::KeywordName, |a, s| a.visit_keyword_name(s));
    table.insert(StatementKind::TestCaseName, |a, s| a.visit_test_case_name(s));
    table.insert(StatementKind::Arguments, |a, s| a.visit_arguments(s));
    table.insert(StatementKind::IfHeader, |a, s| a.visit_condition(s));
    table.insert(StatementKind::ElseIfHeader, |a, s| a.visit_condition(s));
    table.insert(StatementKind::WhileHeader, |a, s| a.visit_condition(s));
    table.insert(StatementKind::InlineIfHeader, |a, s| a.visit_inline_if(s));
    table.insert(StatementKind::ForHeader, |a, s| a.visit_loop_variables(s));
    table.insert(StatementKind::ExceptHeader, |a, s| a.visit_loop_variables(s));
    table
});

pub struct Analyzer<'a> {
    namespace: &'a Namespace,
    imports: Arc<NamespaceImports>,
    cancel: &'a CancellationToken,
    finder: Arc<KeywordFinder>,
    own_doc: Arc<LibraryDoc>,
    global: Arc<VariableTable>,
    source: PathBuf,
    /// Test case or keyword being walked.
    block: Option<&'a Block>,
    /// Normalised names of variables read inside the current block.
    block_reads: FxHashSet<String>,
    result: AnalysisResult,
}

impl<'a> Analyzer<'a> {
    pub fn new(namespace: &'a Namespace, imports: Arc<NamespaceImports>, cancel: &'a CancellationToken) -> Self {
        Self {
            namespace,
            imports,
            cancel,
            finder: namespace.finder(),
            own_doc: namespace.get_library_doc(),
            global: namespace.global_variables(),
            source: namespace.source().to_path_buf(),
            block: None,
            block_reads: FxHashSet::default(),
            result: AnalysisResult::default(),
        }
    }

    pub fn run(mut self) -> Result<AnalysisResult, Cancelled> {
        let namespace = self.namespace;
        for section in &namespace.model().sections {
            self.visit_block(section)?;
        }
        if namespace.options().find_unused && namespace.document_type() == DocumentType::General {
            self.report_unused_keywords();
        }
        self.result.diagnostics.retain(|d| !namespace.should_ignore(d.range));
        Ok(self.result)
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        self.result.diagnostics.push(diagnostic);
    }

    fn location(&self, range: Range) -> Location {
        Location::new(&self.source, range)
    }

    fn version_at_least(&self, major: u32, minor: u32) -> bool {
        self.namespace.options().robot_version >= (major, minor)
    }

    /// Variables visible before `position`.
    fn scope_at(&self, position: Position) -> VariableScope {
        let local = self
            .block
            .map(|b| BlockScope::collect(b, Some(position), Some(&self.source)))
            .unwrap_or_default();
        VariableScope::new(local, self.global.clone())
    }

    fn scope_before(&self, statement: &Statement) -> VariableScope {
        self.scope_at(Position::new(statement.lineno().saturating_sub(1), 0))
    }

    fn visit_block(&mut self, block: &'a Block) -> Result<(), Cancelled> {
        match block.kind {
            BlockKind::TestCase | BlockKind::Keyword => {
                let previous = self.block.replace(block);
                self.block_reads.clear();
                self.visit_body(block)?;
                if self.namespace.options().find_unused {
                    self.report_unused_variables(block);
                }
                self.block = previous;
                Ok(())
            }
            _ => self.visit_body(block),
        }
    }

    fn visit_body(&mut self, block: &'a Block) -> Result<(), Cancelled> {
        if let Some(header) = &block.header {
            self.visit_statement(header)?;
        }
        let anchor = block.header.as_ref().map(Statement::range).unwrap_or_else(|| block.range());
        for error in &block.errors {
            self.push(Diagnostic::error(anchor, codes::MODEL_ERROR, error));
        }
        let mut unreachable = false;
        for node in &block.body {
            let is_comment = matches!(node, Node::Statement(s) if s.kind == StatementKind::Comment);
            if unreachable && !is_comment {
                self.push(
                    Diagnostic::hint(node.range(), codes::CODE_UNREACHABLE, "Code is unreachable.")
                        .with_tag(DiagnosticTag::Unnecessary),
                );
            }
            match node {
                Node::Statement(statement) => {
                    self.visit_statement(statement)?;
                    if matches!(
                        statement.kind,
                        StatementKind::Return | StatementKind::Break | StatementKind::Continue
                    ) {
                        unreachable = true;
                    }
                }
                Node::Block(child) => self.visit_block(child)?,
            }
        }
        for branch in &block.branches {
            self.visit_block(branch)?;
        }
        if let Some(end) = &block.end {
            self.visit_statement(end)?;
        }
        Ok(())
    }

    fn visit_statement(&mut self, statement: &Statement) -> Result<(), Cancelled> {
        self.cancel.check()?;
        self.report_model_errors(statement);
        self.check_statement_variables(statement);
        if let Some(handler) = HANDLERS.get(&statement.kind) {
            handler(self, statement);
        }
        Ok(())
    }

    fn report_model_errors(&mut self, statement: &Statement) {
        for error in &statement.errors {
            self.push(Diagnostic::error(statement.range(), codes::MODEL_ERROR, error));
        }
        for token in &statement.tokens {
            if let Some(error) = &token.error {
                self.push(Diagnostic::error(token.range(), codes::MODEL_ERROR, error));
            }
        }
    }

    fn visit_import(&mut self, statement: &Statement) {
        let Some(import) = Import::from_statement(statement, &self.source) else {
            return;
        };
        if import.name.is_none() {
            let kind = match import.kind {
                ImportKind::Library => "Library",
                ImportKind::Resource => "Resource",
                ImportKind::Variables => "Variables",
            };
            self.push(Diagnostic::error(
                statement.range(),
                codes::IMPORT_REQUIRES_VALUE,
                format!("{kind} setting requires value."),
            ));
            return;
        }
        if let Some(entry) = self.imports.entry_for(&import).cloned() {
            let location = self.location(import.name_range);
            self.result.namespace_references.entry(entry).or_default().push(location);
        }
    }

    fn visit_fixture(&mut self, statement: &Statement) {
        let Some(name) = statement.get_token(TokenType::Name) else { return };
        if name.value.eq_ignore_ascii_case("none") {
            return;
        }
        let args: Vec<_> = statement.get_tokens(TokenType::Argument).collect();
        let scope = self.scope_before(statement);
        self.analyze_call(name, &args, &scope, true, 0);
    }

    fn visit_template(&mut self, statement: &Statement) {
        let Some(name) = statement.get_token(TokenType::Name) else { return };
        if name.value.eq_ignore_ascii_case("none") {
            return;
        }
        let scope = self.scope_before(statement);
        self.analyze_call(name, &[], &scope, false, 0);
    }

    fn visit_force_tags(&mut self, statement: &Statement) {
        if !self.version_at_least(6, 0) {
            return;
        }
        let Some(setting) = statement.tokens.first() else { return };
        let replacement = if statement.kind == StatementKind::ForceTags {
            "Test Tags"
        } else {
            "[Tags]"
        };
        self.push(
            Diagnostic::hint(
                setting.range(),
                codes::DEPRECATED_FORCE_TAG,
                format!("'{}' is deprecated, use '{replacement}' instead.", setting.value),
            )
            .with_tag(DiagnosticTag::Deprecated),
        );
    }

    fn visit_tags(&mut self, statement: &Statement) {
        if !self.version_at_least(7, 0) {
            return;
        }
        let setting = statement.tokens.first().map(|t| t.value.clone()).unwrap_or_default();
        for token in statement.get_tokens(TokenType::Argument) {
            if token.value.starts_with('-') {
                self.push(Diagnostic::warning(
                    token.range(),
                    codes::DEPRECATED_HYPHEN_TAG,
                    format!(
                        "Tags starting with a hyphen in '{setting}' are deprecated. Escape '{tag}' like '\\{tag}' to use the literal value.",
                        tag = token.value
                    ),
                ));
            }
        }
    }

    fn visit_return_setting(&mut self, statement: &Statement) {
        if !self.version_at_least(7, 0) {
            return;
        }
        let range = statement.tokens.first().map(|t| t.range()).unwrap_or_else(|| statement.range());
        self.push(
            Diagnostic::warning(
                range,
                codes::DEPRECATED_RETURN_SETTING,
                "The '[Return]' setting is deprecated. Use the 'RETURN' statement instead.",
            )
            .with_tag(DiagnosticTag::Deprecated),
        );
    }

    fn visit_keyword_name(&mut self, statement: &Statement) {
        let Some(token) = statement.get_token(TokenType::KeywordName) else { return };
        if token.value.trim().is_empty() {
            self.push(Diagnostic::error(
                statement.range(),
                codes::KEYWORD_NAME_EMPTY,
                "Keyword name cannot be empty.",
            ));
            return;
        }
        if self.version_at_least(6, 1) {
            return;
        }
        let line = token.lineno.saturating_sub(1);
        let mixed = self
            .own_doc
            .keywords
            .iter()
            .any(|kw| kw.range.start.line == line && kw.has_normal_and_embedded_args);
        if mixed {
            self.push(Diagnostic::error(
                token.range(),
                codes::KEYWORD_CONTAINS_NORMAL_AND_EMBEDDED_ARGUMENTS,
                "Keyword cannot have both normal and embedded arguments.",
            ));
        }
    }

    fn visit_test_case_name(&mut self, statement: &Statement) {
        let empty = statement
            .get_token(TokenType::TestCaseName)
            .map(|t| t.value.trim().is_empty())
            .unwrap_or(true);
        if empty {
            self.push(Diagnostic::error(
                statement.range(),
                codes::TEST_CASE_NAME_EMPTY,
                "Test case name cannot be empty.",
            ));
        }
    }

    fn report_unused_keywords(&mut self) {
        let own = self.own_doc.clone();
        for kw in own.keywords.iter() {
            if kw.is_error_handler || self.result.keyword_references.contains_key(kw) {
                continue;
            }
            self.push(
                Diagnostic::hint(kw.range, codes::KEYWORD_NOT_USED, format!("Keyword '{}' is not used.", kw.name))
                    .with_tag(DiagnosticTag::Unnecessary),
            );
        }
    }
}
