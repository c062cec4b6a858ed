//! Library docs for files written in the language itself: resource files
//! and the own keywords of a suite.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use super::doc::{ArgumentKind, ArgumentSpec, KeywordDoc, KeywordStore, LibraryDoc, LibraryError, LibraryType};
use crate::matcher::{normalize, EmbeddedArguments};
use crate::model::{Block, File, Node, SectionKind, Statement, StatementKind};
use crate::token::{Position, Range, TokenType};
use crate::variables::search::{find_variables, search_variable};
use crate::variables::{split_argument_definition, VariableDefinition, VariableType};

/// Documentation text of a `Documentation` statement; cells on one line are
/// joined with a space, continuation lines with a newline.
pub fn documentation_text(statement: &Statement) -> String {
    let mut out = String::new();
    let mut last_line = None;
    for token in statement.get_tokens(TokenType::Argument) {
        match last_line {
            Some(line) if line != token.lineno => out.push('\n'),
            Some(_) => out.push(' '),
            None => {}
        }
        out.push_str(&token.value);
        last_line = Some(token.lineno);
    }
    out
}

fn arguments_spec(statement: &Statement) -> Vec<ArgumentSpec> {
    let mut out = Vec::new();
    let mut named_only = false;
    for token in statement.get_tokens(TokenType::Argument) {
        let Some((name, default)) = split_argument_definition(&token.value) else {
            continue;
        };
        let chars: Vec<char> = name.chars().collect();
        let Some(m) = search_variable(&chars) else { continue };
        let kind = match m.identifier {
            '@' if m.base.is_empty() => {
                named_only = true;
                ArgumentKind::NamedOnlyMarker
            }
            '@' => {
                named_only = true;
                ArgumentKind::VarPositional
            }
            '&' => ArgumentKind::VarNamed,
            _ if named_only => ArgumentKind::NamedOnly,
            _ => ArgumentKind::PositionalOrNamed,
        };
        let display = if kind == ArgumentKind::NamedOnlyMarker { "@{}".to_string() } else { m.base.clone() };
        let mut spec = ArgumentSpec::new(display, kind);
        if let Some(default) = default {
            spec = spec.with_default(default);
        }
        let line = token.lineno.saturating_sub(1);
        spec.range = Some(Range::new(
            Position::new(line, token.col_offset),
            Position::new(line, token.col_offset + name.chars().count() as u32),
        ));
        out.push(spec);
    }
    out
}

fn collect_errors(nodes: &[Node], out: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::Statement(s) => statement_errors(s, out),
            Node::Block(b) => block_errors(b, out),
        }
    }
}

fn statement_errors(statement: &Statement, out: &mut Vec<String>) {
    out.extend(statement.errors.iter().cloned());
    out.extend(statement.tokens.iter().filter_map(|t| t.error.clone()));
}

fn block_errors(block: &Block, out: &mut Vec<String>) {
    if let Some(header) = &block.header {
        statement_errors(header, out);
    }
    out.extend(block.errors.iter().cloned());
    collect_errors(&block.body, out);
    for branch in &block.branches {
        block_errors(branch, out);
    }
}

fn keyword_doc(block: &Block, libname: &str, source: Option<&Path>, keyword_tags: &[String]) -> Option<KeywordDoc> {
    let header = block.header.as_ref()?;
    let name_token = header.get_token(TokenType::KeywordName)?;
    let arguments = block.find_setting(StatementKind::Arguments);
    let doc = block
        .find_setting(StatementKind::Documentation)
        .map(documentation_text)
        .unwrap_or_default();
    let mut tags: Vec<String> = keyword_tags.to_vec();
    if let Some(stmt) = block.find_setting(StatementKind::Tags) {
        tags.extend(stmt.values(TokenType::Argument).into_iter().map(str::to_string));
    }

    let mut kw = KeywordDoc::new(name_token.value.clone(), libname, LibraryType::Resource)
        .with_args(arguments.map(arguments_spec).unwrap_or_default())
        .with_doc(doc)
        .with_tags(tags)
        .with_source(source.map(Path::to_path_buf), name_token.lineno.saturating_sub(1));
    kw.range = name_token.range();

    let mut errors = Vec::new();
    block_errors(block, &mut errors);
    kw.errors = errors;

    if let Some(Err(message)) = EmbeddedArguments::from_name(&name_token.value) {
        kw.is_error_handler = true;
        kw.error_handler_message = Some(message);
    }
    let has_embedded = find_variables(&name_token.value).iter().any(|m| m.identifier == '$');
    kw.has_normal_and_embedded_args =
        has_embedded && arguments.map(|a| a.get_token(TokenType::Argument).is_some()).unwrap_or(false);
    Some(kw)
}

/// Definitions of the `*** Variables ***` section.
///
/// Values that contain other variables are recorded but not resolvable.
pub fn variable_section_definitions(file: &File, source: Option<&Path>) -> Vec<Arc<VariableDefinition>> {
    file.variable_statements()
        .filter(|s| s.errors.is_empty())
        .filter_map(|statement| {
            let token = statement.get_token(TokenType::Variable)?;
            let chars: Vec<char> = token.value.chars().collect();
            let m = search_variable(&chars)?;
            let values = statement.values(TokenType::Argument);
            let value = match m.identifier {
                '@' => Value::Array(values.iter().map(|v| Value::String(v.to_string())).collect()),
                '&' => Value::Object(
                    values
                        .iter()
                        .filter_map(|v| super::args::split_from_equals(v))
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect(),
                ),
                _ => Value::String(scalar_value(&values)),
            };
            let def = VariableDefinition::new(
                token.value.clone(),
                VariableType::Variable,
                token.range(),
                source.map(Path::to_path_buf),
            );
            let has_references = values.iter().any(|v| !find_variables(v).is_empty());
            Some(Arc::new(if has_references {
                def.with_unresolvable_value(value)
            } else {
                def.with_value(value)
            }))
        })
        .collect()
}

/// Scalar values join their cells with a space, or with the separator given
/// as `separator=...` in the first cell.
fn scalar_value(values: &[&str]) -> String {
    match values.split_first() {
        Some((first, rest)) if first.starts_with("separator=") => {
            rest.join(first.trim_start_matches("separator="))
        }
        _ => values.join(" "),
    }
}

/// Build a doc of `file`'s own keywords and variables.
pub fn library_doc_from_model(file: &File, name: &str, source: Option<&Path>, libtype: LibraryType) -> LibraryDoc {
    let mut doc = LibraryDoc::new(name, libtype);
    doc.source = source.map(Path::to_path_buf);
    doc.doc = file
        .settings()
        .find(|s| s.kind == StatementKind::Documentation)
        .map(documentation_text)
        .unwrap_or_default();

    let keyword_tags: Vec<String> = file
        .settings()
        .filter(|s| s.kind == StatementKind::KeywordTags)
        .flat_map(|s| s.values(TokenType::Argument))
        .map(str::to_string)
        .collect();

    let mut keywords: Vec<KeywordDoc> = Vec::new();
    for block in file.keywords() {
        let Some(mut kw) = keyword_doc(block, name, source, &keyword_tags) else {
            continue;
        };
        let duplicate = !kw.is_embedded()
            && keywords
                .iter()
                .any(|k| !k.is_embedded() && normalize(&k.name) == normalize(&kw.name));
        if duplicate {
            kw.is_error_handler = true;
            kw.error_handler_message = Some("Keyword with same name defined multiple times.".to_string());
        }
        keywords.push(kw);
    }
    doc.keywords = KeywordStore::new(keywords);
    doc.variables = variable_section_definitions(file, source);
    let end = file
        .sections
        .last()
        .map(|s| s.range().end.line + 1)
        .unwrap_or(0);
    doc.line_range = Some((0, end));

    if libtype == LibraryType::Resource && (file.has_section(SectionKind::TestCases) || file.has_section(SectionKind::Tasks)) {
        let line = file
            .sections
            .iter()
            .find(|s| {
                matches!(
                    s.kind,
                    crate::model::BlockKind::Section(SectionKind::TestCases | SectionKind::Tasks)
                )
            })
            .map(|s| s.range().start.line + 1);
        let mut error = LibraryError::new("Resource file with 'Test Cases' section is invalid.", "DataError");
        if let Some(source) = source {
            error = error.at(source, line);
        }
        doc.errors.push(error);
    }
    doc.finish()
}
