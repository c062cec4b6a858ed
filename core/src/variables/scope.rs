//! Block-local variable definitions of a test case or keyword.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use super::search::{find_variables, search_variable, strip_assign_mark};
use super::{VariableDefinition, VariableType};
use crate::matcher::normalize;
use crate::model::{Block, BlockKind, Node, Statement, StatementKind};
use crate::token::{Position, Range, Token, TokenType};

const SET_VARIABLE_KEYWORDS: &[(&str, VariableType)] = &[
    ("setlocalvariable", VariableType::LocalVariable),
    ("settestvariable", VariableType::Variable),
    ("settaskvariable", VariableType::Variable),
    ("setsuitevariable", VariableType::Variable),
    ("setglobalvariable", VariableType::Variable),
];

/// Scopes accepted by `VAR    ...    scope=`.
pub const VAR_SCOPES: &[&str] = &["LOCAL", "TEST", "TASK", "SUITE", "SUITES", "GLOBAL"];

/// Variable type a `Set ... Variable` keyword call defines, if it is one.
pub fn set_variable_keyword(keyword: &str) -> Option<VariableType> {
    let normalized = normalize(keyword);
    let bare = normalized.strip_prefix("builtin.").unwrap_or(&normalized);
    SET_VARIABLE_KEYWORDS
        .iter()
        .find(|(name, _)| *name == bare)
        .map(|(_, kind)| *kind)
}

/// Name written as `${x}`, `\${x}` or `$x` in a `Set ... Variable` call.
pub fn set_variable_name(arg: &str) -> Option<String> {
    let arg = arg.strip_prefix('\\').unwrap_or(arg);
    let chars: Vec<char> = arg.chars().collect();
    if let Some(m) = search_variable(&chars) {
        if m.start == 0 && m.end == chars.len() {
            return Some(m.name());
        }
        return None;
    }
    let mut it = arg.chars();
    let sigil = it.next()?;
    let rest: String = it.collect();
    if matches!(sigil, '$' | '@' | '&') && !rest.is_empty() && !rest.contains(['{', '}', ' ']) {
        return Some(format!("{sigil}{{{rest}}}"));
    }
    None
}

/// Value of the `scope=` option of a `VAR` statement, uppercased.
pub fn var_scope(statement: &Statement) -> Option<String> {
    statement
        .get_tokens(TokenType::Option)
        .filter_map(|t| t.value.strip_prefix("scope="))
        .last()
        .map(|s| s.trim().to_uppercase())
}

/// Splits an `[Arguments]` cell like `${b}=default` into its name part and
/// default value.
pub fn split_argument_definition(value: &str) -> Option<(String, Option<String>)> {
    let chars: Vec<char> = value.chars().collect();
    let m = search_variable(&chars)?;
    if m.start != 0 {
        return None;
    }
    let name: String = chars[..m.end].iter().collect();
    let rest: String = chars[m.end..].iter().collect();
    match rest.strip_prefix('=') {
        Some(default) => Some((name, Some(default.to_string()))),
        None if rest.is_empty() => Some((name, None)),
        None => None,
    }
}

/// Argument names embedded in a keyword name, with their ranges.
pub fn embedded_argument_definitions(token: &Token, source: Option<&Path>) -> Vec<VariableDefinition> {
    find_variables(&token.value)
        .into_iter()
        .filter(|m| m.identifier == '$')
        .map(|m| {
            let base = m.base.split_once(':').map(|(n, _)| n).unwrap_or(&m.base);
            let range = Range::new(
                Position::new(token.lineno - 1, token.col_offset + m.start as u32),
                Position::new(token.lineno - 1, token.col_offset + m.end as u32),
            );
            VariableDefinition::new(format!("${{{base}}}"), VariableType::Argument, range, source.map(Path::to_path_buf))
        })
        .collect()
}

fn token_range_prefix(token: &Token, len: usize) -> Range {
    let line = token.lineno - 1;
    Range::new(
        Position::new(line, token.col_offset),
        Position::new(line, token.col_offset + len as u32),
    )
}

/// Argument definitions of an `[Arguments]` statement. With a position on
/// that statement only arguments ending before it are returned.
pub fn argument_definitions(
    statement: &Statement,
    position: Option<Position>,
    source: Option<&Path>,
) -> Vec<VariableDefinition> {
    let mut out = Vec::new();
    let inside = position.filter(|p| statement.range().contains(*p));
    for token in statement.get_tokens(TokenType::Argument) {
        if let Some(pos) = inside {
            if token.range().end > pos {
                break;
            }
        }
        let Some((name, default)) = split_argument_definition(&token.value) else {
            continue;
        };
        // `@{}` marks the start of named-only arguments.
        if name.len() <= 3 {
            continue;
        }
        let range = token_range_prefix(token, name.chars().count());
        let mut def = VariableDefinition::new(name, VariableType::Argument, range, source.map(Path::to_path_buf));
        if let Some(default) = default {
            def = def.with_unresolvable_value(Value::String(default));
        }
        out.push(def);
    }
    out
}

/// Collects definitions in one test case or keyword.
pub struct BlockScope {
    source: Option<PathBuf>,
    position: Option<Position>,
    defs: Vec<VariableDefinition>,
}

impl BlockScope {
    /// Definitions visible at `position` (all definitions with `None`), most
    /// recent first.
    pub fn collect(block: &Block, position: Option<Position>, source: Option<&Path>) -> Vec<Arc<VariableDefinition>> {
        let mut scope = BlockScope {
            source: source.map(Path::to_path_buf),
            position,
            defs: Vec::new(),
        };
        if block.kind == BlockKind::Keyword {
            if let Some(name) = block.header.as_ref().and_then(|h| h.get_token(TokenType::KeywordName)) {
                scope.defs.extend(embedded_argument_definitions(name, source));
            }
        }
        scope.walk(&block.body);
        scope.defs.into_iter().rev().map(Arc::new).collect()
    }

    fn before(&self, statement: &Statement) -> bool {
        match self.position {
            Some(pos) => statement.end_lineno() <= pos.line,
            None => true,
        }
    }

    fn walk(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::Statement(statement) => self.statement(statement),
                Node::Block(block) => {
                    if let Some(header) = &block.header {
                        self.statement(header);
                    }
                    self.walk(&block.body);
                    for branch in &block.branches {
                        if let Some(header) = &branch.header {
                            self.statement(header);
                        }
                        self.walk(&branch.body);
                    }
                }
            }
        }
    }

    fn local(&mut self, token: &Token, kind: VariableType) {
        let name = strip_assign_mark(&token.value);
        let chars: Vec<char> = name.chars().collect();
        let Some(m) = search_variable(&chars) else { return };
        // `${x}[key]=` assigns into an existing variable.
        if m.start != 0 || !m.items.is_empty() {
            return;
        }
        let def = VariableDefinition::new(
            m.name(),
            kind,
            token_range_prefix(token, m.end),
            self.source.clone(),
        );
        self.defs.push(def);
    }

    fn statement(&mut self, statement: &Statement) {
        if statement.kind == StatementKind::Arguments {
            let defs = argument_definitions(statement, self.position, self.source.as_deref());
            self.defs.extend(defs);
            return;
        }
        if !self.before(statement) {
            return;
        }
        match statement.kind {
            StatementKind::KeywordCall => {
                for token in statement.get_tokens(TokenType::Assign) {
                    self.local(token, VariableType::LocalVariable);
                }
                self.set_variable_call(statement);
            }
            StatementKind::InlineIfHeader => {
                for token in statement.get_tokens(TokenType::Assign) {
                    self.local(token, VariableType::LocalVariable);
                }
            }
            StatementKind::ForHeader | StatementKind::ExceptHeader => {
                for token in statement.get_tokens(TokenType::Variable) {
                    self.local(token, VariableType::LocalVariable);
                }
            }
            StatementKind::Var => {
                let Some(token) = statement.get_token(TokenType::Variable) else { return };
                let kind = match var_scope(statement).as_deref() {
                    None | Some("LOCAL") => VariableType::LocalVariable,
                    Some(_) => VariableType::Variable,
                };
                let before = self.defs.len();
                self.local(token, kind);
                let values = statement.values(TokenType::Argument);
                if let Some(def) = self.defs.get_mut(before) {
                    let value = match def.identifier() {
                        '@' => Value::Array(values.iter().map(|v| Value::String(v.to_string())).collect()),
                        '&' => Value::Object(
                            values
                                .iter()
                                .filter_map(|v| v.split_once('='))
                                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                                .collect(),
                        ),
                        _ => Value::String(values.join(" ")),
                    };
                    *def = def.clone().with_unresolvable_value(value);
                }
            }
            _ => {}
        }
    }

    fn set_variable_call(&mut self, statement: &Statement) {
        let Some(keyword) = statement.get_value(TokenType::Keyword) else { return };
        let Some(kind) = set_variable_keyword(keyword) else { return };
        let Some(arg) = statement.get_token(TokenType::Argument) else { return };
        let Some(name) = set_variable_name(&arg.value) else { return };
        let def = VariableDefinition::new(name, kind, arg.range(), self.source.clone());
        self.defs.push(def);
    }
}
