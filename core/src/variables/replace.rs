//! Substitution of variable occurrences using known values.
//!
//! Only plain lookups, item access, environment variables and number
//! literals are evaluated; inline Python expressions and extended attribute
//! access are reported as unresolvable.

use serde_json::Value;
use thiserror::Error;

use super::builtin::number_value;
use super::definition::value_to_string;
use super::search::{search_variable, split_variables, VariableMatch};
use crate::matcher::VariableMatcher;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
    #[error("Variable '{0}' not found.")]
    NotFound(String),
    #[error("Environment variable '{0}' not found.")]
    EnvironmentNotFound(String),
    #[error("Resolving variable '{name}' failed: {reason}")]
    Unresolvable { name: String, reason: String },
}

impl VariableError {
    pub fn code(&self) -> &'static str {
        match self {
            VariableError::NotFound(_) => "VariableNotFound",
            VariableError::EnvironmentNotFound(_) => "EnvironmentVariableNotFound",
            VariableError::Unresolvable { .. } => "VariableError",
        }
    }
}

/// Look up the value bound to a variable name.
pub trait VariableLookup {
    fn lookup(&self, matcher: &VariableMatcher) -> Option<Value>;
}

impl<F> VariableLookup for F
where
    F: Fn(&VariableMatcher) -> Option<Value>,
{
    fn lookup(&self, matcher: &VariableMatcher) -> Option<Value> {
        self(matcher)
    }
}

/// Replace every occurrence in `text`, producing a string.
pub fn replace_string(text: &str, lookup: &dyn VariableLookup) -> Result<String, VariableError> {
    let mut out = String::with_capacity(text.len());
    for (fragment, occurrence) in split_variables(text) {
        match occurrence {
            Some(m) => out.push_str(&value_to_string(&resolve_match(&m, lookup)?)),
            None => out.push_str(&fragment),
        }
    }
    Ok(out)
}

/// Replace `text`; if it is exactly one variable the value keeps its type.
pub fn replace_scalar(text: &str, lookup: &dyn VariableLookup) -> Result<Value, VariableError> {
    let chars: Vec<char> = text.chars().collect();
    if let Some(m) = search_variable(&chars) {
        if m.start == 0 && m.end == chars.len() {
            return resolve_match(&m, lookup);
        }
    }
    replace_string(text, lookup).map(Value::String)
}

/// Like [`replace_string`] but leaves unresolvable occurrences in place.
pub fn replace_string_lossy(text: &str, lookup: &dyn VariableLookup) -> String {
    let mut out = String::with_capacity(text.len());
    for (fragment, occurrence) in split_variables(text) {
        match occurrence.map(|m| resolve_match(&m, lookup)) {
            Some(Ok(value)) => out.push_str(&value_to_string(&value)),
            _ => out.push_str(&fragment),
        }
    }
    out
}

fn resolve_match(m: &VariableMatch, lookup: &dyn VariableLookup) -> Result<Value, VariableError> {
    // Nested names like `${a_${b}}` resolve the inner part first.
    let base = if m.base.contains('{') && !m.base.starts_with('{') {
        replace_string(&m.base, lookup)?
    } else {
        m.base.clone()
    };

    if m.identifier == '%' {
        let (name, default) = match base.split_once('=') {
            Some((n, d)) => (n.to_string(), Some(d.to_string())),
            None => (base.clone(), None),
        };
        return match std::env::var(&name) {
            Ok(value) => Ok(Value::String(value)),
            Err(_) => match default {
                Some(d) => replace_string(&d, lookup).map(Value::String),
                None => Err(VariableError::EnvironmentNotFound(format!("%{{{name}}}"))),
            },
        };
    }

    let name = format!("{}{{{}}}", m.identifier, base);
    let value = lookup_base(&name, &base, m.identifier, lookup)?;
    apply_items(&name, value, &m.items, lookup)
}

fn lookup_base(name: &str, base: &str, identifier: char, lookup: &dyn VariableLookup) -> Result<Value, VariableError> {
    if let Some(value) = VariableMatcher::new(name).and_then(|matcher| lookup.lookup(&matcher)) {
        return Ok(value);
    }
    if identifier == '$' {
        if let Some(value) = number_value(base) {
            return Ok(value);
        }
    }
    if base.starts_with('{') && base.ends_with('}') {
        return Err(VariableError::Unresolvable {
            name: name.to_string(),
            reason: "inline expressions are not evaluated".to_string(),
        });
    }
    Err(VariableError::NotFound(name.to_string()))
}

fn apply_items(
    name: &str,
    mut value: Value,
    items: &[String],
    lookup: &dyn VariableLookup,
) -> Result<Value, VariableError> {
    for item in items {
        let key = replace_string(item, lookup)?;
        value = match value {
            Value::Array(list) => {
                let idx: i64 = key.trim().parse().map_err(|_| VariableError::Unresolvable {
                    name: name.to_string(),
                    reason: format!("list index '{key}' is not an integer"),
                })?;
                let len = list.len() as i64;
                let idx = if idx < 0 { len + idx } else { idx };
                list.into_iter()
                    .nth(usize::try_from(idx).unwrap_or(usize::MAX))
                    .ok_or_else(|| VariableError::Unresolvable {
                        name: name.to_string(),
                        reason: format!("list index '{key}' out of range"),
                    })?
            }
            Value::Object(mut map) => map.remove(&key).ok_or_else(|| VariableError::Unresolvable {
                name: name.to_string(),
                reason: format!("dictionary has no key '{key}'"),
            })?,
            _ => {
                return Err(VariableError::Unresolvable {
                    name: name.to_string(),
                    reason: "value is not subscriptable".to_string(),
                })
            }
        };
    }
    Ok(value)
}
