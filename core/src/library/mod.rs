//! Library, resource and variables-file docs and their loaders.

mod args;
mod doc;
mod libspec;
mod loader;
pub mod python;
mod registry;
mod resource;
mod variables_file;

#[cfg(test)]
mod library_test;

pub use args::{named_argument, resolve_named, split_from_equals, validate_arguments, ArgumentError, ResolvedArguments};
pub use doc::{
    deprecation_message, ArgumentKind, ArgumentSpec, KeywordDoc, KeywordStore, LibraryDoc, LibraryError, LibraryScope,
    LibraryType, SourceEntity, TypeDoc, BUILTIN_LIBRARY_NAME, DEFAULT_LIBRARIES, RESERVED_LIBRARY_NAME,
};
pub use libspec::library_doc_from_spec;
pub use loader::{
    load_resource, load_variables, normalize_path, resource_from_text, LibraryLookup, LibrarySource, LoadContext, LoaderError, RESOURCE_EXTENSIONS,
    VARIABLES_EXTENSIONS,
};
pub use registry::{keyword, signature, LibraryRegistry, StdLibrary, STD_LIBRARY_VERSION};
pub use resource::{documentation_text, library_doc_from_model, variable_section_definitions};
pub use variables_file::variables_doc_from_source;
