//! Libdoc JSON specs (`libdoc --format json`).

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::doc::{
    ArgumentKind, ArgumentSpec, KeywordDoc, KeywordStore, LibraryDoc, LibraryError, LibraryScope, LibraryType,
    TypeDoc,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Spec {
    name: String,
    #[serde(default)]
    doc: String,
    #[serde(default)]
    version: String,
    #[serde(default, rename = "type")]
    library_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    doc_format: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    lineno: Option<u32>,
    #[serde(default)]
    inits: Vec<SpecKeyword>,
    #[serde(default)]
    keywords: Vec<SpecKeyword>,
    #[serde(default)]
    typedocs: Vec<SpecType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpecKeyword {
    name: String,
    #[serde(default)]
    args: Vec<SpecArgument>,
    #[serde(default)]
    doc: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    lineno: Option<u32>,
    #[serde(default)]
    return_type: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpecArgument {
    name: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    type_info: Option<Value>,
    #[serde(default)]
    default_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpecType {
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    doc: String,
    #[serde(default)]
    members: Vec<Value>,
}

fn argument_kind(kind: Option<&str>) -> ArgumentKind {
    match kind.unwrap_or("POSITIONAL_OR_NAMED") {
        "POSITIONAL_ONLY" => ArgumentKind::PositionalOnly,
        "POSITIONAL_ONLY_MARKER" => ArgumentKind::PositionalOnlyMarker,
        "VAR_POSITIONAL" => ArgumentKind::VarPositional,
        "NAMED_ONLY_MARKER" => ArgumentKind::NamedOnlyMarker,
        "NAMED_ONLY" => ArgumentKind::NamedOnly,
        "VAR_NAMED" => ArgumentKind::VarNamed,
        _ => ArgumentKind::PositionalOrNamed,
    }
}

fn type_names(arg: &SpecArgument) -> Vec<String> {
    if !arg.types.is_empty() {
        return arg.types.clone();
    }
    // Newer specs nest types as `{"name": "Union", "nested": [...]}`.
    fn walk(info: &Value, out: &mut Vec<String>) {
        let nested = info.get("nested").and_then(Value::as_array);
        match (info.get("name").and_then(Value::as_str), nested) {
            (Some("Union"), Some(items)) => items.iter().for_each(|i| walk(i, out)),
            (Some(name), _) => out.push(name.to_string()),
            _ => {}
        }
    }
    let mut out = Vec::new();
    if let Some(info) = &arg.type_info {
        walk(info, &mut out);
    }
    out
}

fn keyword(kw: SpecKeyword, libname: &str, libtype: LibraryType, fallback: Option<&Path>) -> KeywordDoc {
    let args = kw
        .args
        .iter()
        .map(|a| {
            let mut spec = ArgumentSpec::new(a.name.clone(), argument_kind(a.kind.as_deref())).with_types(type_names(a));
            if let Some(d) = &a.default_value {
                spec = spec.with_default(d.clone());
            }
            spec
        })
        .collect();
    let source = kw.source.map(Into::into).or_else(|| fallback.map(Path::to_path_buf));
    let mut doc = KeywordDoc::new(kw.name, libname, libtype)
        .with_args(args)
        .with_doc(kw.doc)
        .with_tags(kw.tags)
        .with_source(source, kw.lineno.unwrap_or(1).saturating_sub(1));
    doc.return_type = kw.return_type.and_then(|r| match r {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    });
    doc
}

/// Parse a libdoc JSON document. `path` is the spec file itself.
pub fn library_doc_from_spec(text: &str, path: &Path, alias: Option<&str>) -> LibraryDoc {
    let spec: Spec = match serde_json::from_str(text) {
        Ok(spec) => spec,
        Err(err) => {
            let name = alias.unwrap_or_else(|| path.file_stem().and_then(|s| s.to_str()).unwrap_or(""));
            return LibraryDoc::failed(
                name,
                LibraryType::Library,
                LibraryError::new(format!("Invalid libdoc spec: {err}"), "DataError")
                    .at(path, Some(err.line() as u32)),
            );
        }
    };
    let name = alias.map(str::to_string).unwrap_or(spec.name);
    let libtype = match spec.library_type.as_deref() {
        Some("RESOURCE") => LibraryType::Resource,
        _ => LibraryType::Library,
    };
    let source = spec.source.map(std::path::PathBuf::from);
    let fallback = source.as_deref().or(Some(path));

    let mut doc = LibraryDoc::new(name.clone(), libtype);
    doc.doc = spec.doc;
    doc.version = spec.version;
    doc.scope = spec.scope.map(|s| LibraryScope::parse(&s)).unwrap_or_default();
    doc.doc_format = spec.doc_format.unwrap_or_else(|| "ROBOT".to_string());
    doc.line_range = spec.lineno.map(|l| (l, l));
    doc.keywords = KeywordStore::new(
        spec.keywords
            .into_iter()
            .map(|k| keyword(k, &name, libtype, fallback))
            .collect(),
    );
    doc.inits = KeywordStore::new(
        spec.inits
            .into_iter()
            .map(|k| {
                let mut kw = keyword(k, &name, libtype, fallback);
                kw.is_initializer = true;
                kw
            })
            .collect(),
    );
    doc.types = spec
        .typedocs
        .into_iter()
        .map(|t| TypeDoc {
            name: t.name,
            kind: t.kind,
            doc: t.doc,
            members: t
                .members
                .iter()
                .filter_map(|m| m.get("name").and_then(Value::as_str).map(str::to_string))
                .collect(),
        })
        .collect();
    doc.source = source.or_else(|| Some(path.to_path_buf()));
    doc.finish()
}
