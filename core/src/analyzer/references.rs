//! Variable reads, assignments and unused-variable reporting.

use rustc_hash::FxHashSet;

use super::Analyzer;
use crate::diagnostics::{codes, Diagnostic, DiagnosticTag, Severity};
use crate::matcher::VariableMatcher;
use crate::model::{Block, Statement, StatementKind};
use crate::namespace::VariableScope;
use crate::token::{Position, Range, Token, TokenType};
use crate::variables::search::find_variables;
use crate::variables::{
    number_value, set_variable_keyword, split_argument_definition, var_scope, BlockScope, VariableType, VAR_SCOPES,
};

fn range_on(lineno: u32, col: u32, len: usize) -> Range {
    let line = lineno.saturating_sub(1);
    Range::new(Position::new(line, col), Position::new(line, col + len as u32))
}

/// `$name` occurrences in a Python-like expression, outside string
/// literals, with their char offsets.
fn expression_variables(text: &str) -> Vec<(usize, String)> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut quote: Option<char> = None;
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) if c == '\\' => i += 1,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '$' && (i == 0 || chars[i - 1] != '\\') => {
                let start = i;
                let mut end = i + 1;
                if chars.get(end).is_some_and(|c| c.is_alphabetic() || *c == '_') {
                    while chars.get(end).is_some_and(|c| c.is_alphanumeric() || *c == '_') {
                        end += 1;
                    }
                    out.push((start, chars[start + 1..end].iter().collect()));
                    i = end;
                    continue;
                }
            }
            None => {}
        }
        i += 1;
    }
    out
}

impl<'a> Analyzer<'a> {
    /// Whether `token` of `statement` is read rather than defined.
    fn reads_variables(statement: &Statement, index: usize, token: &Token) -> bool {
        if !token.kind.can_contain_variables() {
            return false;
        }
        match (statement.kind, token.kind) {
            (_, TokenType::Assign) => false,
            (
                StatementKind::Var | StatementKind::ForHeader | StatementKind::ExceptHeader | StatementKind::Variable,
                TokenType::Variable,
            ) => false,
            (StatementKind::Template | StatementKind::TestTemplate, TokenType::Name) => false,
            (StatementKind::KeywordCall, TokenType::Argument) => {
                let is_set_variable = statement
                    .get_value(TokenType::Keyword)
                    .and_then(set_variable_keyword)
                    .is_some();
                let first_argument = statement.tokens.iter().position(|t| t.kind == TokenType::Argument);
                !(is_set_variable && first_argument == Some(index))
            }
            _ => true,
        }
    }

    pub(super) fn check_statement_variables(&mut self, statement: &Statement) {
        let severity = match statement.kind {
            StatementKind::Arguments | StatementKind::KeywordName | StatementKind::Comment | StatementKind::Error => {
                return
            }
            StatementKind::Documentation | StatementKind::Metadata | StatementKind::TestCaseName => Severity::Hint,
            _ => Severity::Error,
        };
        let mut scope: Option<VariableScope> = None;
        for (index, token) in statement.tokens.iter().enumerate() {
            if !token.value.contains(['$', '@', '&', '%']) || !Self::reads_variables(statement, index, token) {
                continue;
            }
            let scope = scope.get_or_insert_with(|| self.scope_before(statement));
            self.check_token(token, scope, severity);
        }
    }

    pub(super) fn check_token(&mut self, token: &Token, scope: &VariableScope, severity: Severity) {
        for sub in token.tokenize_variables() {
            if sub.kind == TokenType::Variable {
                self.check_variable(&sub.value, sub.lineno, sub.col_offset, scope, severity);
            }
        }
    }

    /// Resolve one variable occurrence `text` starting at `col` and record
    /// the read, or report it as missing.
    pub(super) fn check_variable(&mut self, text: &str, lineno: u32, col: u32, scope: &VariableScope, severity: Severity) {
        let Some(matcher) = VariableMatcher::new(text) else { return };
        let name_len = matcher.name.chars().count();

        // Variables used inside `[item]` access.
        let rest: String = text.chars().skip(name_len).collect();
        for inner in find_variables(&rest) {
            let inner_text: String = rest.chars().skip(inner.start).take(inner.end - inner.start).collect();
            self.check_variable(&inner_text, lineno, col + (name_len + inner.start) as u32, scope, severity);
        }

        let base = matcher.base.trim();
        if base.is_empty() || number_value(base).is_some() || (base.starts_with('{') && base.ends_with('}')) {
            return;
        }
        let nested = find_variables(&matcher.base);
        if !nested.is_empty() {
            for inner in nested {
                let inner_text: String = matcher
                    .base
                    .chars()
                    .skip(inner.start)
                    .take(inner.end - inner.start)
                    .collect();
                self.check_variable(&inner_text, lineno, col + 2 + inner.start as u32, scope, severity);
            }
            return;
        }

        let range = range_on(lineno, col, name_len);
        if matcher.is_environment() {
            if scope.find_name(&matcher.name).is_none() {
                self.push(Diagnostic::warning(
                    range,
                    codes::ENVIRONMENT_VARIABLE_NOT_FOUND,
                    format!("Environment variable '%{{{}}}' not found.", matcher.base),
                ));
            }
            return;
        }
        match scope.find_name(&matcher.name) {
            Some(def) => {
                self.block_reads.insert(def.normalized_name());
                let location = self.location(range);
                self.result.variable_references.entry(def).or_default().push(location);
            }
            None => self.push(Diagnostic::new(
                range,
                severity,
                codes::VARIABLE_NOT_FOUND,
                format!("Variable '{}' not found.", matcher.name),
            )),
        }
    }

    /// `$name` references inside an expression argument.
    pub(super) fn check_expression(&mut self, token: &Token, scope: &VariableScope) {
        for (offset, name) in expression_variables(&token.value) {
            let range = range_on(token.lineno, token.col_offset + offset as u32, name.chars().count() + 1);
            match scope.find_name(&format!("${{{name}}}")) {
                Some(def) => {
                    self.block_reads.insert(def.normalized_name());
                    let location = self.location(range);
                    self.result.variable_references.entry(def).or_default().push(location);
                }
                None => self.push(Diagnostic::error(
                    range,
                    codes::VARIABLE_NOT_FOUND,
                    format!("Variable '${name}' not found."),
                )),
            }
        }
    }

    /// Record the local definitions `tokens` of `statement` create.
    pub(super) fn record_definitions(&mut self, statement: &Statement, tokens: &[&Token]) {
        let Some(block) = self.block else { return };
        if tokens.is_empty() {
            return;
        }
        let after = Position::new(statement.end_lineno(), 0);
        let defs = BlockScope::collect(block, Some(after), Some(&self.source));
        for token in tokens {
            let start = token.range().start;
            if let Some(def) = defs.iter().find(|d| d.range.start == start) {
                let location = self.location(def.range);
                self.result
                    .local_variable_assignments
                    .entry(def.clone())
                    .or_default()
                    .push(location);
            }
        }
    }

    pub(super) fn visit_var(&mut self, statement: &Statement) {
        if let Some(scope) = var_scope(statement) {
            if !VAR_SCOPES.contains(&scope.as_str()) {
                let range = statement
                    .get_tokens(TokenType::Option)
                    .filter(|t| t.value.starts_with("scope="))
                    .last()
                    .map(|t| t.range())
                    .unwrap_or_else(|| statement.range());
                self.push(Diagnostic::error(
                    range,
                    codes::INCORRECT_USE,
                    format!(
                        "VAR option 'scope' does not accept value '{scope}'. Valid values are {}.",
                        VAR_SCOPES.join(", ")
                    ),
                ));
            }
        }
        let tokens: Vec<&Token> = statement.get_tokens(TokenType::Variable).collect();
        self.record_definitions(statement, &tokens);
    }

    pub(super) fn visit_loop_variables(&mut self, statement: &Statement) {
        let tokens: Vec<&Token> = statement.get_tokens(TokenType::Variable).collect();
        self.record_definitions(statement, &tokens);
    }

    pub(super) fn visit_condition(&mut self, statement: &Statement) {
        let scope = self.scope_before(statement);
        for token in statement.get_tokens(TokenType::Argument) {
            self.check_expression(token, &scope);
        }
    }

    pub(super) fn visit_inline_if(&mut self, statement: &Statement) {
        self.visit_condition(statement);
        let tokens: Vec<&Token> = statement.get_tokens(TokenType::Assign).collect();
        self.record_definitions(statement, &tokens);
    }

    /// Default values may use earlier arguments.
    pub(super) fn visit_arguments(&mut self, statement: &Statement) {
        for token in statement.get_tokens(TokenType::Argument) {
            let Some((name, Some(default))) = split_argument_definition(&token.value) else {
                continue;
            };
            if !default.contains(['$', '@', '&', '%']) {
                continue;
            }
            let col = token.col_offset + name.chars().count() as u32 + 1;
            let default_token = Token::new(TokenType::Argument, default, token.lineno, col);
            let scope = self.scope_at(token.range().start);
            self.check_token(&default_token, &scope, Severity::Error);
        }
        let tokens: Vec<&Token> = statement.get_tokens(TokenType::Argument).collect();
        self.record_definitions(statement, &tokens);
    }

    /// Entries of the `*** Variables ***` section. A command line variable
    /// of the same name overrides the entry and is referenced here.
    pub(super) fn visit_variable(&mut self, statement: &Statement) {
        let Some(token) = statement.get_token(TokenType::Variable) else { return };
        let start = token.range().start;
        let Some(own) = self
            .namespace
            .own_variables()
            .iter()
            .find(|d| d.range.start == start)
            .cloned()
        else {
            return;
        };
        let matcher = own.matcher();
        let overriding = self
            .namespace
            .imports_manager()
            .get_command_line_variables()
            .iter()
            .find(|d| d.matcher() == matcher)
            .cloned();
        if let Some(command_line) = overriding {
            let location = self.location(own.range);
            self.result
                .variable_references
                .entry(command_line)
                .or_default()
                .push(location);
        }
    }

    pub(super) fn report_unused_variables(&mut self, block: &Block) {
        let defs = BlockScope::collect(block, None, Some(&self.source));
        let mut seen = FxHashSet::default();
        for def in defs {
            if def.kind != VariableType::LocalVariable || !seen.insert(def.range) {
                continue;
            }
            let private = def.name.chars().nth(2) == Some('_');
            if private || self.block_reads.contains(&def.normalized_name()) {
                continue;
            }
            self.push(
                Diagnostic::hint(
                    def.range,
                    codes::VARIABLE_NOT_USED,
                    format!("Variable '{}' is not used.", def.name),
                )
                .with_tag(DiagnosticTag::Unnecessary),
            );
        }
    }
}
