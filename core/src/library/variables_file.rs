//! Variables files: YAML, JSON and Python modules with literal assignments.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::doc::{LibraryDoc, LibraryError, LibraryType};
use super::python::{parse_literal, PythonModule};
use crate::token::{Position, Range};
use crate::variables::{VariableDefinition, VariableType};

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().map(Value::from).unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        serde_yaml::Value::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let key = match yaml_to_json(k) {
                        Value::String(s) => s,
                        other => crate::variables::value_to_string(&other),
                    };
                    (key, yaml_to_json(v))
                })
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Line of the first `key:` / `"key":` at the start of a line.
fn key_line(text: &str, key: &str) -> u32 {
    let quoted = format!("\"{key}\"");
    text.lines()
        .position(|line| {
            let trimmed = line.trim_start();
            let rest = trimmed
                .strip_prefix(key)
                .or_else(|| trimmed.strip_prefix(quoted.as_str()));
            rest.map(|r| r.trim_start().starts_with(':')).unwrap_or(false)
        })
        .unwrap_or(0) as u32
}

fn definition(name: &str, line: u32, source: &Path, value: Option<Value>) -> Arc<VariableDefinition> {
    let col = name.chars().count() as u32;
    let range = Range::new(Position::new(line, 0), Position::new(line, col));
    let def = VariableDefinition::new(
        format!("${{{name}}}"),
        VariableType::ImportedVariable,
        range,
        Some(source.to_path_buf()),
    );
    Arc::new(match value {
        Some(v) => def.with_value(v),
        None => def,
    })
}

fn from_mapping(map: Map<String, Value>, text: &str, source: &Path) -> Vec<Arc<VariableDefinition>> {
    map.into_iter()
        .map(|(name, value)| {
            let line = key_line(text, &name);
            definition(&name, line, source, Some(value))
        })
        .collect()
}

fn mapping_error(kind: &str, got: &Value, source: &Path) -> LibraryError {
    let type_name = match got {
        Value::Array(_) => "list",
        Value::String(_) => "string",
        Value::Null => "None",
        _ => "scalar",
    };
    LibraryError::new(format!("{kind} variable file must be a mapping, got {type_name}."), "DataError").at(source, None)
}

fn python_variables(text: &str, source: &Path) -> Result<(Vec<Arc<VariableDefinition>>, bool), LibraryError> {
    let module = PythonModule::parse(text).map_err(|e| {
        let line = e.line_no;
        e.at(source, line)
    })?;
    let dynamic = module.has_function("get_variables") || module.has_function("getVariables");
    let mut out = Vec::new();
    for (name, value, line) in module.module_assignments() {
        if name.starts_with('_') {
            continue;
        }
        let value = parse_literal(value);
        let (name, value) = if let Some(rest) = name.strip_prefix("LIST__") {
            match value {
                Some(Value::Array(items)) => (rest, Some(Value::Array(items))),
                _ => {
                    return Err(LibraryError::new(
                        format!("Invalid variable 'LIST__{rest}': Expected a list-like value."),
                        "DataError",
                    )
                    .at(source, Some(line)))
                }
            }
        } else if let Some(rest) = name.strip_prefix("DICT__") {
            match value {
                Some(Value::Object(map)) => (rest, Some(Value::Object(map))),
                _ => {
                    return Err(LibraryError::new(
                        format!("Invalid variable 'DICT__{rest}': Expected a dictionary-like value."),
                        "DataError",
                    )
                    .at(source, Some(line)))
                }
            }
        } else {
            (name, value)
        };
        out.push(definition(name, line.saturating_sub(1), source, value));
    }
    Ok((out, dynamic))
}

/// Load a variables file. `name` is the import name used for the doc.
pub fn variables_doc_from_source(name: &str, text: &str, source: &Path) -> LibraryDoc {
    let extension = source
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let loaded: Result<(Vec<Arc<VariableDefinition>>, bool), LibraryError> = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str::<serde_yaml::Value>(text)
            .map_err(|e| {
                let line = e.location().map(|l| l.line() as u32);
                LibraryError::new(e.to_string(), "YAMLError").at(source, line)
            })
            .and_then(|v| match yaml_to_json(v) {
                Value::Object(map) => Ok((from_mapping(map, text, source), false)),
                other => Err(mapping_error("YAML", &other, source)),
            }),
        "json" => serde_json::from_str::<Value>(text)
            .map_err(|e| LibraryError::new(e.to_string(), "JSONDecodeError").at(source, Some(e.line() as u32)))
            .and_then(|v| match v {
                Value::Object(map) => Ok((from_mapping(map, text, source), false)),
                other => Err(mapping_error("JSON", &other, source)),
            }),
        _ => python_variables(text, source),
    };

    let mut doc = LibraryDoc::new(name, LibraryType::Variables);
    doc.source = Some(source.to_path_buf());
    match loaded {
        Ok((variables, dynamic)) => {
            doc.variables = variables;
            doc.is_dynamic = dynamic;
        }
        Err(error) => doc.errors.push(error),
    }
    doc.finish()
}
