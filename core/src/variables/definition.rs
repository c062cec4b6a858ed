use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::matcher::VariableMatcher;
use crate::token::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableType {
    Variable,
    LocalVariable,
    Argument,
    ImportedVariable,
    CommandLineVariable,
    EnvironmentVariable,
    BuiltinVariable,
}

impl VariableType {
    pub fn label(self) -> &'static str {
        match self {
            VariableType::Variable => "Variable",
            VariableType::LocalVariable => "Local Variable",
            VariableType::Argument => "Argument",
            VariableType::ImportedVariable => "Imported Variable",
            VariableType::CommandLineVariable => "Command Line Variable",
            VariableType::EnvironmentVariable => "Environment Variable",
            VariableType::BuiltinVariable => "Builtin Variable",
        }
    }
}

/// A place where a variable gets its value.
///
/// Identity is the name, kind, source and range; the value never takes part
/// so that definitions rebuilt from the same model compare equal.
#[derive(Clone, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    pub kind: VariableType,
    /// Range of the name token.
    pub range: Range,
    pub source: Option<PathBuf>,
    pub value: Option<Value>,
    pub has_value: bool,
    /// Whether `value` may be substituted into import names and arguments.
    pub resolvable: bool,
    #[serde(skip)]
    matcher: Option<VariableMatcher>,
}

impl VariableDefinition {
    pub fn new(name: impl Into<String>, kind: VariableType, range: Range, source: Option<PathBuf>) -> Self {
        let name = name.into();
        let matcher = VariableMatcher::new(&name).unwrap_or_else(|| VariableMatcher::literal(&name));
        let name = if matcher.items.is_empty() { name } else { matcher.name.clone() };
        Self {
            name,
            kind,
            range,
            source,
            value: None,
            has_value: false,
            resolvable: false,
            matcher: Some(matcher),
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self.has_value = true;
        self.resolvable = true;
        self
    }

    /// A value known syntactically but not safe to substitute, e.g. a value
    /// that itself refers to local variables.
    pub fn with_unresolvable_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self.has_value = true;
        self.resolvable = false;
        self
    }

    pub fn matcher(&self) -> VariableMatcher {
        match &self.matcher {
            Some(m) => m.clone(),
            None => VariableMatcher::new(&self.name).unwrap_or_else(|| VariableMatcher::literal(&self.name)),
        }
    }

    pub fn normalized_name(&self) -> String {
        self.matcher().normalized_name
    }

    pub fn identifier(&self) -> char {
        self.name.chars().next().unwrap_or('$')
    }

    /// Value rendered for hovers and string substitution.
    pub fn value_as_string(&self) -> Option<String> {
        self.value.as_ref().map(value_to_string)
    }
}

/// String form of a value the way it is substituted into a cell.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(repr).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map.iter().map(|(k, v)| format!("'{}': {}", k, repr(v))).collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

fn repr(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => value_to_string(other),
    }
}

impl PartialEq for VariableDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind && self.range == other.range && self.source == other.source
    }
}

impl Eq for VariableDefinition {}

impl Hash for VariableDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.kind.hash(state);
        self.range.hash(state);
        self.source.hash(state);
    }
}

impl fmt::Debug for VariableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("range", &self.range)
            .field("source", &self.source)
            .field("value", &self.value)
            .finish()
    }
}
