//! Shared import cache: library, resource and variables docs keyed by how
//! they were imported.

mod cache;
mod completion;
mod manager;

#[cfg(test)]
mod imports_test;

use std::fmt;

pub use cache::{DocCache, CACHE_SCHEMA_VERSION};
pub use completion::{CompletionKind, ImportCompletion};
pub use manager::{
    variable_lookup, DocumentSource, ImportFailure, ImportsConfig, ImportsEvent, ImportsManager, LoadedResource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    Library,
    Resource,
    Variables,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImportKind::Library => "Library",
            ImportKind::Resource => "Resource",
            ImportKind::Variables => "Variables",
        })
    }
}
