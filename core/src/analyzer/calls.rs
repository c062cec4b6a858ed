//! Keyword calls, fixtures, templates and the keywords nested inside
//! run-keyword arguments.

use std::sync::Arc;

use super::{Analyzer, ArgumentRef};
use crate::diagnostics::{codes, Diagnostic, DiagnosticTag, Location, Severity};
use crate::library::{named_argument, validate_arguments, KeywordDoc, BUILTIN_LIBRARY_NAME};
use crate::matcher::{normalize, normalize_namespace, VariableMatcher};
use crate::model::Statement;
use crate::namespace::{EntryRef, VariableScope};
use crate::token::{Position, Range, Token, TokenType};
use crate::variables::search::{find_variables, strip_assign_mark};
use crate::variables::{replace_string, set_variable_keyword};

/// Control words that are not keywords when written in lower or mixed case.
const RESERVED_WORDS: &[&str] = &[
    "for", "end", "if", "elseif", "else", "while", "try", "except", "finally", "return", "break", "continue", "var",
];

/// BuiltIn keywords whose first argument is an expression.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "evaluate",
    "shouldbetrue",
    "shouldnotbetrue",
    "skipif",
    "passexecutionif",
    "continueforloopif",
    "exitforloopif",
    "returnfromkeywordif",
    "setvariableif",
];

const MAX_RUN_KEYWORD_DEPTH: usize = 16;

fn sub_range(token: &Token, skip: usize, len: usize) -> Range {
    let line = token.lineno.saturating_sub(1);
    let start = token.col_offset + skip as u32;
    Range::new(Position::new(line, start), Position::new(line, start + len as u32))
}

impl<'a> Analyzer<'a> {
    pub(super) fn visit_keyword_call(&mut self, statement: &Statement) {
        let scope = self.scope_before(statement);
        for token in statement.get_tokens(TokenType::Assign) {
            let target = strip_assign_mark(&token.value);
            if VariableMatcher::new(target).is_some_and(|m| !m.items.is_empty()) {
                self.check_variable(target, token.lineno, token.col_offset, &scope, Severity::Error);
            }
        }
        let Some(keyword) = statement.get_token(TokenType::Keyword) else {
            self.push(Diagnostic::error(
                statement.range(),
                codes::KEYWORD_ERROR,
                "Keyword name cannot be empty.",
            ));
            return;
        };
        let args: Vec<&Token> = statement.get_tokens(TokenType::Argument).collect();
        self.analyze_call(keyword, &args, &scope, true, 0);

        let mut defined: Vec<&Token> = statement.get_tokens(TokenType::Assign).collect();
        if set_variable_keyword(&keyword.value).is_some() {
            defined.extend(args.first().copied());
        }
        self.record_definitions(statement, &defined);
    }

    /// Resolve the call `name` with `args`, record references and report
    /// problems on the name token.
    pub(super) fn analyze_call(
        &mut self,
        name: &Token,
        args: &[&Token],
        scope: &VariableScope,
        validate: bool,
        depth: usize,
    ) -> Option<Arc<KeywordDoc>> {
        let mut result = self.finder.find_keyword(&name.value);
        let mut substituted = false;
        if result.keyword.is_none() && !find_variables(&name.value).is_empty() {
            let lookup = |m: &VariableMatcher| scope.lookup(m);
            // Names built from unknown values cannot be checked.
            let replaced = replace_string(&name.value, &lookup).ok()?;
            result = self.finder.find_keyword(&replaced);
            substituted = true;
        }

        let name_range = name.range();
        let Some(kw) = result.keyword.clone() else {
            if RESERVED_WORDS.contains(&normalize(&name.value).as_str()) {
                self.push(Diagnostic::error(
                    name_range,
                    codes::RESERVED_KEYWORD,
                    format!("'{}' is a reserved keyword.", name.value),
                ));
            } else {
                for d in &result.diagnostics {
                    self.push(Diagnostic::new(name_range, d.severity, d.code, &d.message));
                }
            }
            return None;
        };
        for d in &result.diagnostics {
            self.push(Diagnostic::new(name_range, d.severity, d.code, &d.message));
        }

        let reference_range = if substituted {
            name_range
        } else {
            let total = name.value.chars().count();
            let mut skip = result.bdd_prefix_len;
            if let Some(owner) = &result.owner {
                let owner_len = owner.chars().count();
                if let Some(entry) = self.owner_entry(owner) {
                    let location = self.location(sub_range(name, skip, owner_len));
                    self.result.namespace_references.entry(entry).or_default().push(location);
                }
                skip += owner_len + 1;
            }
            sub_range(name, skip, total.saturating_sub(skip))
        };
        let location = self.location(reference_range);
        self.result.keyword_references.entry(kw.clone()).or_default().push(location);

        self.check_keyword_usage(&kw, name_range);

        if validate && !kw.is_error_handler {
            let values: Vec<&str> = args.iter().map(|t| t.value.as_str()).collect();
            if let Err(err) = validate_arguments(&kw, &values) {
                self.push(Diagnostic::error(name_range, err.code(), err.message));
            }
        }
        if !kw.is_any_run_keyword() {
            for arg in args {
                if let Some((spec, len)) = named_argument(&kw, &arg.value) {
                    let key = ArgumentRef {
                        keyword: kw.clone(),
                        name: spec.name.clone(),
                    };
                    let location = self.location(sub_range(arg, 0, len));
                    self.result.argument_references.entry(key).or_default().push(location);
                }
            }
        }

        if kw.libname == BUILTIN_LIBRARY_NAME && EXPRESSION_KEYWORDS.contains(&normalize(&kw.name).as_str()) {
            if let Some(expression) = args.first() {
                self.check_expression(expression, scope);
            }
        }
        if kw.is_any_run_keyword() && depth < MAX_RUN_KEYWORD_DEPTH {
            self.analyze_run_keyword(&kw, args, scope, depth + 1);
        }
        Some(kw)
    }

    fn owner_entry(&self, owner: &str) -> Option<EntryRef> {
        let key = normalize_namespace(owner);
        if self.imports.libraries.contains_key(&key) {
            return Some(EntryRef::Library(key));
        }
        self.imports
            .resources
            .values()
            .find(|e| normalize_namespace(&e.name) == key)
            .map(|e| EntryRef::Resource(e.path.clone()))
    }

    fn check_keyword_usage(&mut self, kw: &KeywordDoc, range: Range) {
        if let Some(message) = kw.deprecation_message() {
            let suffix = if message.is_empty() { String::new() } else { format!(" {message}") };
            self.push(
                Diagnostic::hint(
                    range,
                    codes::DEPRECATED_KEYWORD,
                    format!("Keyword '{}' is deprecated.{suffix}", kw.full_name()),
                )
                .with_tag(DiagnosticTag::Deprecated),
            );
        }
        if kw.is_private() && kw.source.as_deref() != Some(self.source.as_path()) {
            self.push(Diagnostic::warning(
                range,
                codes::PRIVATE_KEYWORD,
                format!(
                    "Keyword '{}' is private and should only be called by keywords in the same file.",
                    kw.full_name()
                ),
            ));
        }
        if kw.is_error_handler {
            let message = kw
                .error_handler_message
                .clone()
                .unwrap_or_else(|| format!("Keyword '{}' could not be created.", kw.name));
            self.push(Diagnostic::error(range, codes::KEYWORD_ERROR, message));
        } else if !kw.errors.is_empty() {
            let mut diagnostic = Diagnostic::error(
                range,
                codes::KEYWORD_CONTAINS_ERRORS,
                format!("Keyword '{}' contains errors.", kw.name),
            );
            if let Some(source) = &kw.source {
                for error in &kw.errors {
                    diagnostic = diagnostic.with_related(Location::new(source, kw.range), error);
                }
            }
            self.push(diagnostic);
        }
    }

    fn analyze_run_keyword(&mut self, kw: &KeywordDoc, args: &[&Token], scope: &VariableScope, depth: usize) {
        if kw.is_run_keyword_if() {
            self.analyze_run_keyword_if(args, scope, depth);
            return;
        }
        if kw.is_run_keywords() {
            self.analyze_run_keywords(args, scope, depth);
            return;
        }
        let index = if kw.is_run_keyword() {
            0
        } else if let Some(conditions) = kw.run_keyword_condition_count() {
            conditions
        } else if let Some(processed) = kw.args_to_process {
            processed.saturating_sub(1)
        } else {
            return;
        };
        if let Some((inner, inner_args)) = args.get(index..).and_then(<[&Token]>::split_first) {
            self.analyze_call(inner, inner_args, scope, true, depth);
        }
    }

    /// `condition  keyword  args  [ELSE IF  condition  keyword  args]  [ELSE  keyword  args]`
    fn analyze_run_keyword_if(&mut self, args: &[&Token], scope: &VariableScope, depth: usize) {
        let Some((condition, mut rest)) = args.split_first() else { return };
        self.check_expression(condition, scope);
        loop {
            let end = rest
                .iter()
                .position(|t| t.value == "ELSE" || t.value == "ELSE IF")
                .unwrap_or(rest.len());
            let (branch, remaining) = rest.split_at(end);
            if let Some((inner, inner_args)) = branch.split_first() {
                self.analyze_call(inner, inner_args, scope, true, depth);
            }
            let Some((marker, after)) = remaining.split_first() else { break };
            rest = after;
            if marker.value == "ELSE IF" {
                let Some((condition, after_condition)) = rest.split_first() else { break };
                self.check_expression(condition, scope);
                rest = after_condition;
            }
        }
    }

    /// Keywords separated by `AND`, or one keyword per argument without
    /// separators.
    fn analyze_run_keywords(&mut self, args: &[&Token], scope: &VariableScope, depth: usize) {
        if args.iter().any(|t| t.value == "AND") {
            for segment in args.split(|t| t.value == "AND") {
                if let Some((inner, inner_args)) = segment.split_first() {
                    self.analyze_call(inner, inner_args, scope, true, depth);
                }
            }
        } else {
            for inner in args {
                self.analyze_call(inner, &[], scope, true, depth);
            }
        }
    }
}
