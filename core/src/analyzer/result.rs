use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, Location};
use crate::library::KeywordDoc;
use crate::namespace::EntryRef;
use crate::token::{Position, Range};
use crate::variables::VariableDefinition;

/// A named parameter of a keyword, referenced as `name=value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgumentRef {
    pub keyword: Arc<KeywordDoc>,
    pub name: String,
}

/// Everything one analysis pass found. Immutable once returned.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Call sites per keyword, in document order.
    pub keyword_references: IndexMap<Arc<KeywordDoc>, Vec<Location>>,
    /// Read sites per variable definition.
    pub variable_references: IndexMap<Arc<VariableDefinition>, Vec<Location>>,
    /// Assignment sites of block-local variables.
    pub local_variable_assignments: IndexMap<Arc<VariableDefinition>, Vec<Location>>,
    /// Import names and `Owner.` prefixes per imported entry.
    pub namespace_references: IndexMap<EntryRef, Vec<Location>>,
    pub argument_references: IndexMap<ArgumentRef, Vec<Location>>,
}

fn find_at<'a, K>(
    map: &'a IndexMap<K, Vec<Location>>,
    source: &Path,
    position: Position,
) -> Option<(&'a K, Range)> {
    map.iter().find_map(|(key, locations)| {
        locations
            .iter()
            .find(|l| l.source == source && l.range.contains(position))
            .map(|l| (key, l.range))
    })
}

impl AnalysisResult {
    /// Keyword called at `position`, with the range of the call name.
    pub fn keyword_at(&self, source: &Path, position: Position) -> Option<(Arc<KeywordDoc>, Range)> {
        find_at(&self.keyword_references, source, position).map(|(k, r)| (k.clone(), r))
    }

    /// Variable read or assigned at `position`.
    pub fn variable_at(&self, source: &Path, position: Position) -> Option<(Arc<VariableDefinition>, Range)> {
        find_at(&self.variable_references, source, position)
            .or_else(|| find_at(&self.local_variable_assignments, source, position))
            .map(|(v, r)| (v.clone(), r))
    }

    pub fn namespace_at(&self, source: &Path, position: Position) -> Option<(EntryRef, Range)> {
        find_at(&self.namespace_references, source, position).map(|(e, r)| (e.clone(), r))
    }

    pub fn argument_at(&self, source: &Path, position: Position) -> Option<(ArgumentRef, Range)> {
        find_at(&self.argument_references, source, position).map(|(a, r)| (a.clone(), r))
    }

    pub fn keyword_references_of(&self, keyword: &KeywordDoc) -> &[Location] {
        self.keyword_references
            .get(keyword)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn variable_references_of(&self, variable: &VariableDefinition) -> &[Location] {
        self.variable_references
            .get(variable)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
