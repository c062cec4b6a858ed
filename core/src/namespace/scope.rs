use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::matcher::VariableMatcher;
use crate::token::Range;
use crate::variables::{VariableDefinition, VariableType};

/// `${obj.attr}` or `${x + 1}`: everything before the first operator.
static EXTENDED_BASE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(.+?)\s*[^\s\w].*$").ok());

pub type VariableTable = IndexMap<VariableMatcher, Arc<VariableDefinition>>;

/// Variables visible at one place of a document: block-local definitions
/// first, then the document-wide table.
#[derive(Debug, Clone)]
pub struct VariableScope {
    local: Vec<Arc<VariableDefinition>>,
    global: Arc<VariableTable>,
}

impl VariableScope {
    pub fn new(local: Vec<Arc<VariableDefinition>>, global: Arc<VariableTable>) -> Self {
        Self { local, global }
    }

    pub fn find(&self, matcher: &VariableMatcher) -> Option<Arc<VariableDefinition>> {
        self.local
            .iter()
            .find(|d| d.matcher() == *matcher)
            .or_else(|| self.global.get(matcher))
            .cloned()
    }

    /// Definition a variable reference such as `${x}`, `@{list}[0]`,
    /// `${obj.attr}` or `%{HOME}` resolves to.
    pub fn find_name(&self, name: &str) -> Option<Arc<VariableDefinition>> {
        let matcher = VariableMatcher::new(name)?;
        if matcher.is_environment() {
            return environment_variable(&matcher);
        }
        if let Some(found) = self.find(&matcher) {
            return Some(found);
        }
        let base = EXTENDED_BASE
            .as_ref()?
            .captures(&matcher.base)?
            .get(1)?
            .as_str()
            .to_string();
        let extended = VariableMatcher::new(&format!("{}{{{}}}", matcher.identifier, base))?;
        self.find(&extended)
    }

    /// Every visible definition, nearest first, shadowed ones removed.
    pub fn to_table(&self) -> VariableTable {
        let mut table = VariableTable::with_capacity(self.local.len() + self.global.len());
        for def in &self.local {
            table.entry(def.matcher()).or_insert_with(|| def.clone());
        }
        for (matcher, def) in self.global.iter() {
            table.entry(matcher.clone()).or_insert_with(|| def.clone());
        }
        table
    }

    pub fn lookup(&self, matcher: &VariableMatcher) -> Option<Value> {
        self.find(matcher)
            .filter(|d| d.resolvable)
            .and_then(|d| d.value.clone())
    }
}

fn environment_variable(matcher: &VariableMatcher) -> Option<Arc<VariableDefinition>> {
    let name = format!("%{{{}}}", matcher.base);
    let def = VariableDefinition::new(name, VariableType::EnvironmentVariable, Range::zero(), None);
    match std::env::var(&matcher.base) {
        Ok(value) => Some(Arc::new(def.with_value(Value::String(value)))),
        Err(_) => matcher
            .default_value
            .as_ref()
            .map(|default| Arc::new(def.with_value(Value::String(default.clone())))),
    }
}

/// Insert definitions keeping the first definition of each name.
pub(super) fn extend_table<'a>(table: &mut VariableTable, defs: impl IntoIterator<Item = &'a Arc<VariableDefinition>>) {
    for def in defs {
        table.entry(def.matcher()).or_insert_with(|| def.clone());
    }
}
