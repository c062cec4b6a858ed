//! Resolution of a document's imports, following imported resources
//! depth-first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::entries::{collect_imports, EntryRef, Import, LibraryEntry, NamespaceImports, ResourceEntry, VariablesEntry};
use super::Namespace;
use crate::cancel::{CancellationToken, Cancelled};
use crate::diagnostics::{codes, Diagnostic, Location};
use crate::imports::{ImportKind, ImportsManager};
use crate::library::{LibraryDoc, DEFAULT_LIBRARIES};
use crate::matcher::normalize_namespace;
use crate::token::{Position, Range};
use crate::variables::{curdir_variable, VariableDefinition};

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(super) struct ImportResolver<'a> {
    namespace: &'a Namespace,
    imports: &'a ImportsManager,
    cancel: &'a CancellationToken,
    state: NamespaceImports,
    /// Variables of imported resources and variables files, in import order.
    imported_variables: Vec<Arc<VariableDefinition>>,
}

impl<'a> ImportResolver<'a> {
    pub(super) fn new(namespace: &'a Namespace, cancel: &'a CancellationToken) -> Self {
        Self {
            namespace,
            imports: namespace.imports_manager(),
            cancel,
            state: NamespaceImports::default(),
            imported_variables: Vec::new(),
        }
    }

    pub(super) fn run(mut self) -> Result<NamespaceImports, Cancelled> {
        self.cancel.check()?;
        let source = self.namespace.source().to_path_buf();
        let base_dir = source.parent().map(Path::to_path_buf).unwrap_or_default();

        for name in DEFAULT_LIBRARIES {
            let snapshot = self.snapshot(&base_dir);
            if let Some(doc) = self.imports.get_library(name, &[], None, &base_dir, &snapshot) {
                let entry = LibraryEntry {
                    name: doc.name.clone(),
                    import_name: name.to_string(),
                    args: Vec::new(),
                    alias: None,
                    is_standard: self.imports.registry().contains(name),
                    doc,
                    import: None,
                };
                self.state.libraries.insert(normalize_namespace(name), entry);
            }
        }

        let imports = collect_imports(self.namespace.model(), &source);
        self.import_all(&imports, &base_dir, None)?;
        self.state.imports = imports;
        Ok(self.state)
    }

    /// Resolvable variables usable in import names of a file in `base_dir`.
    fn snapshot(&self, base_dir: &Path) -> Vec<Arc<VariableDefinition>> {
        let mut out = vec![curdir_variable(base_dir)];
        out.extend(self.namespace.own_variables().iter().cloned());
        out.extend(self.imported_variables.iter().cloned());
        out.extend(self.imports.get_command_line_variables().iter().cloned());
        out.extend(self.namespace.builtin_variables());
        out
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        self.state.diagnostics.push(diagnostic);
    }

    fn import_all(&mut self, imports: &[Import], base_dir: &Path, parent: Option<&Import>) -> Result<(), Cancelled> {
        for import in imports {
            self.cancel.check()?;
            if import.name.is_none() {
                continue;
            }
            match import.kind {
                ImportKind::Library => self.import_library(import, base_dir, parent),
                ImportKind::Resource => self.import_resource(import, base_dir, parent)?,
                ImportKind::Variables => self.import_variables(import, base_dir, parent),
            }
        }
        Ok(())
    }

    /// Unknown variables in an import name are reported by the analysis at
    /// the variable itself.
    fn push_import_failure(&mut self, import: &Import, code: &str, message: &str) {
        if code == codes::VARIABLE_NOT_FOUND || code == codes::ENVIRONMENT_VARIABLE_NOT_FOUND {
            debug!("import '{}' names an unknown variable: {}", import.name.as_deref().unwrap_or_default(), message);
            return;
        }
        self.push(Diagnostic::error(import.name_range, code, message));
    }

    fn report_doc_errors(&mut self, import: &Import, doc: &LibraryDoc) {
        for error in &doc.errors {
            if error.type_name == codes::VARIABLE_NOT_FOUND || error.type_name == codes::ENVIRONMENT_VARIABLE_NOT_FOUND {
                continue;
            }
            let mut diagnostic = Diagnostic::error(import.name_range, &error.type_name, &error.message);
            if let (Some(source), Some(line)) = (&error.source, error.line_no) {
                let pos = Position::new(line.saturating_sub(1), 0);
                diagnostic = diagnostic.with_related(Location::new(source, Range::new(pos, pos)), &error.message);
            }
            self.push(diagnostic);
        }
    }

    fn import_library(&mut self, import: &Import, base_dir: &Path, parent: Option<&Import>) {
        let Some(name) = import.name.as_deref() else { return };
        let top = parent.is_none();
        let snapshot = self.snapshot(base_dir);
        let Some(doc) = self
            .imports
            .get_library(name, &import.args, import.alias.as_deref(), base_dir, &snapshot)
        else {
            return;
        };
        let entry_name = import.alias.clone().unwrap_or_else(|| doc.name.clone());
        let key = normalize_namespace(&entry_name);

        if let Some(existing) = self.state.libraries.get(&key) {
            if top {
                if existing.import.is_none() {
                    let same_digest = existing.doc.digest == doc.digest;
                    self.push(Diagnostic::information(
                        import.name_range,
                        codes::LIBRARY_OVERRIDES_BUILTIN,
                        format!(
                            "Library '{entry_name}' overrides the library imported by default and is ignored. Use an alias to import it."
                        ),
                    ));
                    if same_digest {
                        self.state.import_entries.insert(import.clone(), EntryRef::Library(key));
                    }
                    return;
                }
                let message = if existing.args == import.args {
                    format!("Library '{entry_name}' already imported.")
                } else {
                    format!("Library '{entry_name}' already imported with different arguments.")
                };
                let mut diagnostic = Diagnostic::information(import.name_range, codes::LIBRARY_ALREADY_IMPORTED, message);
                if let Some(previous) = &existing.import {
                    diagnostic = diagnostic.with_related(previous.location(), "Already imported here.");
                }
                self.push(diagnostic);
                self.state.import_entries.insert(import.clone(), EntryRef::Library(key));
            }
            return;
        }

        if top {
            if doc.has_errors() {
                self.report_doc_errors(import, &doc);
            } else if doc.keywords.is_empty() && !doc.is_dynamic {
                self.push(Diagnostic::warning(
                    import.name_range,
                    codes::LIBRARY_CONTAINS_NO_KEYWORDS,
                    "Imported library contains no keywords.",
                ));
            }
            self.state.import_entries.insert(import.clone(), EntryRef::Library(key.clone()));
        }
        let entry = LibraryEntry {
            name: entry_name,
            import_name: name.to_string(),
            args: import.args.clone(),
            alias: import.alias.clone(),
            is_standard: self.imports.registry().contains(&doc.name) && doc.source.is_none(),
            doc,
            import: Some(import.clone()),
        };
        self.state.libraries.insert(key, entry);
    }

    fn import_resource(&mut self, import: &Import, base_dir: &Path, parent: Option<&Import>) -> Result<(), Cancelled> {
        let Some(name) = import.name.as_deref() else { return Ok(()) };
        let top = parent.is_none();
        let snapshot = self.snapshot(base_dir);
        let path = match self.imports.find_resource(name, base_dir, &snapshot) {
            Ok(path) => path,
            Err(failure) => {
                if top {
                    self.push_import_failure(import, &failure.code, &failure.message);
                }
                return Ok(());
            }
        };

        if path == self.namespace.source() {
            match parent {
                Some(outer) => self.push(
                    Diagnostic::information(outer.name_range, codes::POSSIBLE_CIRCULAR_IMPORT, "Possible circular import.")
                        .with_related(
                            import.location(),
                            format!("'{}' is also imported here.", file_name(self.namespace.source())),
                        ),
                ),
                None => self.push(Diagnostic::error(
                    import.name_range,
                    codes::RECURSIVE_IMPORT,
                    "Recursive resource import.",
                )),
            }
            return Ok(());
        }

        if let Some(existing) = self.state.resources.get(&path) {
            if top {
                let previous = existing
                    .import
                    .as_ref()
                    .filter(|i| i.source == self.namespace.source())
                    .map(Import::location);
                if let Some(previous) = previous {
                    self.push(
                        Diagnostic::information(
                            import.name_range,
                            codes::RESOURCE_ALREADY_IMPORTED,
                            format!("Resource '{}' already imported.", file_name(&path)),
                        )
                        .with_related(previous, "Already imported here."),
                    );
                }
                self.state.import_entries.insert(import.clone(), EntryRef::Resource(path));
            }
            return Ok(());
        }

        let loaded = match self.imports.get_resource(&path) {
            Ok(loaded) => loaded,
            Err(failure) => {
                if top {
                    self.push_import_failure(import, &failure.code, &failure.message);
                }
                return Ok(());
            }
        };
        let nested = collect_imports(&loaded.model, &path);

        if top {
            self.check_resource(import, &loaded.doc, nested.is_empty());
            self.state.import_entries.insert(import.clone(), EntryRef::Resource(path.clone()));
        }

        self.imported_variables.extend(loaded.doc.variables.iter().cloned());
        self.state.resources.insert(
            path.clone(),
            ResourceEntry {
                name: file_stem(&path),
                import_name: name.to_string(),
                path: path.clone(),
                doc: loaded.doc.clone(),
                model: loaded.model.clone(),
                import: Some(import.clone()),
                imports: nested.clone(),
            },
        );
        debug!("imported resource {} ({} nested imports)", path.display(), nested.len());

        let nested_base: PathBuf = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.import_all(&nested, &nested_base, Some(parent.unwrap_or(import)))
    }

    fn check_resource(&mut self, import: &Import, doc: &LibraryDoc, no_imports: bool) {
        if doc.has_errors() {
            self.report_doc_errors(import, doc);
        } else if doc.keywords.iter().any(|kw| !kw.errors.is_empty()) {
            let mut diagnostic = Diagnostic::error(
                import.name_range,
                codes::IMPORT_CONTAINS_ERRORS,
                "Import definition contains errors.",
            );
            for kw in doc.keywords.iter() {
                let Some(source) = &kw.source else { continue };
                for error in &kw.errors {
                    diagnostic = diagnostic.with_related(Location::new(source, kw.range), error);
                }
            }
            self.push(diagnostic);
        }
        if doc.keywords.is_empty() && doc.variables.is_empty() && no_imports {
            self.push(Diagnostic::warning(
                import.name_range,
                codes::RESOURCE_EMPTY,
                "Imported resource file is empty.",
            ));
        }
    }

    fn import_variables(&mut self, import: &Import, base_dir: &Path, parent: Option<&Import>) {
        let Some(name) = import.name.as_deref() else { return };
        let top = parent.is_none();
        let snapshot = self.snapshot(base_dir);
        let path = match self.imports.find_variables(name, base_dir, &snapshot) {
            Ok(path) => path,
            Err(failure) => {
                if top {
                    self.push_import_failure(import, &failure.code, &failure.message);
                }
                return;
            }
        };

        if let Some(existing) = self.state.variables.get(&path) {
            if top {
                let mut diagnostic = Diagnostic::information(
                    import.name_range,
                    codes::VARIABLES_ALREADY_IMPORTED,
                    format!("Variables '{}' already imported.", file_name(&path)),
                );
                if let Some(previous) = &existing.import {
                    diagnostic = diagnostic.with_related(previous.location(), "Already imported here.");
                }
                self.push(diagnostic);
                self.state.import_entries.insert(import.clone(), EntryRef::Variables(path));
            }
            return;
        }

        let doc = self.imports.get_variables(&path, &import.args);
        if top {
            if doc.has_errors() {
                self.report_doc_errors(import, &doc);
            }
            self.state.import_entries.insert(import.clone(), EntryRef::Variables(path.clone()));
        }
        self.imported_variables.extend(doc.variables.iter().cloned());
        self.state.variables.insert(
            path.clone(),
            VariablesEntry {
                name: file_stem(&path),
                import_name: name.to_string(),
                args: import.args.clone(),
                path,
                doc,
                import: Some(import.clone()),
            },
        );
    }
}
