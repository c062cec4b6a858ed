pub mod builtin;
pub mod collections;
pub mod datetime;
pub mod dialogs;
pub mod easter;
pub mod os;
pub mod process;
pub mod screenshot;
pub mod string;
pub mod telnet;
pub mod xml;

#[cfg(test)]
mod builtin_test;
#[cfg(test)]
mod registry_test;
#[cfg(test)]
mod string_test;

use anyhow::Result;
use robotls_core::library::{keyword, KeywordDoc, LibraryRegistry};
use tracing::debug;

/// Keyword table entry: name, Python-style signature, documentation.
pub(crate) type KeywordSpec = (&'static str, &'static [&'static str], &'static str);

/// Register all packaged libraries with the given registry
pub fn register_stdlib_libraries(registry: &mut LibraryRegistry) -> Result<()> {
    registry.register_library(Box::new(builtin::BuiltInLibrary::new()))?;
    registry.register_library(Box::new(collections::CollectionsLibrary::new()))?;
    registry.register_library(Box::new(string::StringLibrary::new()))?;
    registry.register_library(Box::new(os::OperatingSystemLibrary::new()))?;
    registry.register_library(Box::new(datetime::DateTimeLibrary::new()))?;
    registry.register_library(Box::new(process::ProcessLibrary::new()))?;
    registry.register_library(Box::new(xml::XmlLibrary::new()))?;
    registry.register_library(Box::new(telnet::TelnetLibrary::new()))?;
    registry.register_library(Box::new(dialogs::DialogsLibrary::new()))?;
    registry.register_library(Box::new(screenshot::ScreenshotLibrary::new()))?;
    registry.register_library(Box::new(easter::EasterLibrary::new()))?;

    // Importable but carrying no keywords of their own
    registry.register_library(Box::new(easter::ReservedLibrary))?;
    debug!("registered {} packaged libraries", registry.library_names().len());
    Ok(())
}

/// A registry with every packaged library.
pub fn stdlib_registry() -> Result<LibraryRegistry> {
    let mut registry = LibraryRegistry::new();
    register_stdlib_libraries(&mut registry)?;
    Ok(registry)
}

pub(crate) fn keywords_from_table(libname: &str, table: &[KeywordSpec]) -> Vec<KeywordDoc> {
    table
        .iter()
        .map(|(name, args, doc)| keyword(libname, name, args, doc))
        .collect()
}

/// The `__init__` of a library taking import arguments.
pub(crate) fn initializer(libname: &str, args: &[&str], doc: &str) -> KeywordDoc {
    let mut init = keyword(libname, "__init__", args, doc);
    init.is_initializer = true;
    init
}
