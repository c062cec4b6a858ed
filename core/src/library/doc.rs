use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::matcher::{normalize, KeywordMatcher};
use crate::token::{Position, Range};
use crate::variables::VariableDefinition;

pub const BUILTIN_LIBRARY_NAME: &str = "BuiltIn";
pub const RESERVED_LIBRARY_NAME: &str = "Reserved";

/// Libraries imported into every namespace.
pub const DEFAULT_LIBRARIES: &[&str] = &[BUILTIN_LIBRARY_NAME];

const RUN_KEYWORD_NAMES: &[&str] = &[
    "Run Keyword",
    "Run Keyword And Continue On Failure",
    "Run Keyword And Ignore Error",
    "Run Keyword And Return",
    "Run Keyword And Return Status",
    "Run Keyword And Warn On Failure",
    "Run Keyword If All Tests Passed",
    "Run Keyword If Any Tests Failed",
    "Run Keyword If Test Failed",
    "Run Keyword If Test Passed",
    "Run Keyword If Timeout Occurred",
];

const RUN_KEYWORD_WITH_CONDITION_NAMES: &[(&str, usize)] = &[
    ("Run Keyword And Expect Error", 1),
    ("Run Keyword And Return If", 1),
    ("Run Keyword Unless", 1),
    ("Repeat Keyword", 1),
    ("Wait Until Keyword Succeeds", 2),
];

const RUN_KEYWORD_IF_NAME: &str = "Run Keyword If";
const RUN_KEYWORDS_NAME: &str = "Run Keywords";

static DEPRECATED_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\*DEPRECATED[^\n]*?\*").ok());

/// `Some(message)` if `doc` starts with a `*DEPRECATED ...*` marker. The
/// message is the marker's text after `DEPRECATED` followed by the rest of
/// the first line.
pub fn deprecation_message(doc: &str) -> Option<String> {
    let trimmed = doc.trim_start();
    let m = DEPRECATED_PATTERN.as_ref()?.find(trimmed)?;
    let inner = trimmed[1..m.end() - 1].trim_start_matches("DEPRECATED").trim();
    let rest = trimmed[m.end()..].lines().next().unwrap_or("").trim();
    let message = match (inner.is_empty(), rest.is_empty()) {
        (false, false) => format!("{inner} {rest}"),
        (false, true) => inner.to_string(),
        _ => rest.to_string(),
    };
    Some(message)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LibraryType {
    Library,
    Resource,
    Variables,
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LibraryType::Library => "LIBRARY",
            LibraryType::Resource => "RESOURCE",
            LibraryType::Variables => "VARIABLES",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LibraryScope {
    Global,
    Suite,
    #[default]
    Test,
}

impl LibraryScope {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "GLOBAL" => LibraryScope::Global,
            "SUITE" | "TESTSUITE" => LibraryScope::Suite,
            _ => LibraryScope::Test,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArgumentKind {
    PositionalOnly,
    /// The `/` separator.
    PositionalOnlyMarker,
    PositionalOrNamed,
    VarPositional,
    /// The bare `*` separator.
    NamedOnlyMarker,
    NamedOnly,
    VarNamed,
}

impl ArgumentKind {
    pub fn is_marker(self) -> bool {
        matches!(self, ArgumentKind::PositionalOnlyMarker | ArgumentKind::NamedOnlyMarker)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    pub kind: ArgumentKind,
    pub default: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    /// Where the argument is declared, for resource keywords.
    #[serde(default)]
    pub range: Option<Range>,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, kind: ArgumentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            types: Vec::new(),
            range: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_types(mut self, types: Vec<String>) -> Self {
        self.types = types;
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
            && matches!(
                self.kind,
                ArgumentKind::PositionalOnly | ArgumentKind::PositionalOrNamed | ArgumentKind::NamedOnly
            )
    }

    /// `name: type = default` style rendering used in hovers and hints.
    pub fn signature(&self) -> String {
        let prefix = match self.kind {
            ArgumentKind::VarPositional => "*",
            ArgumentKind::VarNamed => "**",
            ArgumentKind::PositionalOnlyMarker => return "/".to_string(),
            ArgumentKind::NamedOnlyMarker => return "*".to_string(),
            _ => "",
        };
        let mut out = format!("{prefix}{}", self.name);
        if !self.types.is_empty() {
            out.push_str(": ");
            out.push_str(&self.types.join(" | "));
        }
        if let Some(default) = &self.default {
            out.push_str(if self.types.is_empty() { "=" } else { " = " });
            out.push_str(default);
        }
        out
    }
}

/// A failure while loading a library, resource or variables file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryError {
    pub message: String,
    pub type_name: String,
    pub source: Option<PathBuf>,
    pub line_no: Option<u32>,
    #[serde(default)]
    pub traceback: Vec<SourceEntity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceEntity {
    pub source: PathBuf,
    pub line_no: u32,
    pub name: String,
}

impl LibraryError {
    pub fn new(message: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            type_name: type_name.into(),
            source: None,
            line_no: None,
            traceback: Vec::new(),
        }
    }

    pub fn at(mut self, source: impl Into<PathBuf>, line_no: Option<u32>) -> Self {
        let source = source.into();
        if let Some(line) = line_no {
            self.traceback.push(SourceEntity {
                source: source.clone(),
                line_no: line,
                name: "<module>".to_string(),
            });
        }
        self.source = Some(source);
        self.line_no = line_no;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDoc {
    pub name: String,
    pub kind: String,
    pub doc: String,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct KeywordDoc {
    pub name: String,
    pub args: Vec<ArgumentSpec>,
    pub doc: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: Option<PathBuf>,
    /// Range of the keyword's name where it is defined.
    pub range: Range,
    pub libname: String,
    pub libtype: LibraryType,
    /// Digest of the owning [`LibraryDoc`], resolved through the imports
    /// manager when the parent is needed.
    #[serde(default)]
    pub parent_digest: String,
    #[serde(default)]
    pub is_error_handler: bool,
    #[serde(default)]
    pub error_handler_message: Option<String>,
    #[serde(default)]
    pub is_initializer: bool,
    #[serde(default)]
    pub is_registered_run_keyword: bool,
    #[serde(default)]
    pub args_to_process: Option<usize>,
    #[serde(default)]
    pub return_type: Option<String>,
    /// Parse errors inside a resource keyword's body.
    #[serde(default)]
    pub errors: Vec<String>,
    /// `[Arguments]` present next to embedded arguments.
    #[serde(default)]
    pub has_normal_and_embedded_args: bool,
    #[serde(skip)]
    matcher: OnceCell<KeywordMatcher>,
}

impl KeywordDoc {
    pub fn new(name: impl Into<String>, libname: impl Into<String>, libtype: LibraryType) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            doc: String::new(),
            tags: Vec::new(),
            source: None,
            range: Range::zero(),
            libname: libname.into(),
            libtype,
            parent_digest: String::new(),
            is_error_handler: false,
            error_handler_message: None,
            is_initializer: false,
            is_registered_run_keyword: false,
            args_to_process: None,
            return_type: None,
            errors: Vec::new(),
            has_normal_and_embedded_args: false,
            matcher: OnceCell::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<ArgumentSpec>) -> Self {
        self.args = args;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_source(mut self, source: Option<PathBuf>, line: u32) -> Self {
        self.source = source;
        let col = self.name.chars().count() as u32;
        self.range = Range::new(Position::new(line, 0), Position::new(line, col));
        self
    }

    pub fn matcher(&self) -> &KeywordMatcher {
        self.matcher.get_or_init(|| KeywordMatcher::new(self.name.clone()))
    }

    pub fn is_embedded(&self) -> bool {
        self.matcher().is_embedded()
    }

    pub fn deprecation_message(&self) -> Option<String> {
        deprecation_message(&self.doc)
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecation_message().is_some()
    }

    pub fn is_private(&self) -> bool {
        self.tags.iter().any(|t| normalize(t) == "robot:private")
    }

    /// `Library.Keyword`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.libname, self.name)
    }

    pub fn short_doc(&self) -> &str {
        self.doc.split("\n\n").next().unwrap_or("").trim()
    }

    /// `Name(arg, arg=default, *varargs)`.
    pub fn signature(&self) -> String {
        let args: Vec<String> = self.args.iter().map(ArgumentSpec::signature).collect();
        let mut out = format!("{}({})", self.name, args.join(", "));
        if let Some(ret) = &self.return_type {
            out.push_str(" -> ");
            out.push_str(ret);
        }
        out
    }

    fn is_builtin(&self) -> bool {
        self.libname == BUILTIN_LIBRARY_NAME
    }

    fn builtin_named(&self, names: &[&str]) -> bool {
        self.is_builtin() && names.iter().any(|n| normalize(n) == normalize(&self.name))
    }

    pub fn is_run_keyword(&self) -> bool {
        self.builtin_named(RUN_KEYWORD_NAMES)
    }

    /// Number of leading condition arguments before the inner keyword.
    pub fn run_keyword_condition_count(&self) -> Option<usize> {
        if !self.is_builtin() {
            return None;
        }
        RUN_KEYWORD_WITH_CONDITION_NAMES
            .iter()
            .find(|(n, _)| normalize(n) == normalize(&self.name))
            .map(|(_, c)| *c)
    }

    pub fn is_run_keyword_if(&self) -> bool {
        self.builtin_named(&[RUN_KEYWORD_IF_NAME])
    }

    pub fn is_run_keywords(&self) -> bool {
        self.builtin_named(&[RUN_KEYWORDS_NAME])
    }

    /// Any keyword whose arguments contain further keyword calls.
    pub fn is_any_run_keyword(&self) -> bool {
        self.is_registered_run_keyword
            || self.is_run_keyword()
            || self.run_keyword_condition_count().is_some()
            || self.is_run_keyword_if()
            || self.is_run_keywords()
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentSpec> {
        let wanted = normalize(name);
        self.args
            .iter()
            .find(|a| !a.kind.is_marker() && normalize(&a.name) == wanted)
    }
}

impl PartialEq for KeywordDoc {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.source == other.source
            && self.range == other.range
            && self.libname == other.libname
            && self.parent_digest == other.parent_digest
    }
}

impl Eq for KeywordDoc {}

impl Hash for KeywordDoc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.source.hash(state);
        self.range.hash(state);
        self.libname.hash(state);
        self.parent_digest.hash(state);
    }
}

impl fmt::Debug for KeywordDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordDoc")
            .field("name", &self.name)
            .field("libname", &self.libname)
            .field("source", &self.source)
            .field("range", &self.range)
            .finish()
    }
}

/// Keywords of one library in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordStore {
    keywords: Vec<Arc<KeywordDoc>>,
}

impl KeywordStore {
    pub fn new(keywords: Vec<KeywordDoc>) -> Self {
        Self {
            keywords: keywords.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<KeywordDoc>> {
        self.keywords.iter()
    }

    /// All keywords whose matcher accepts `name`.
    pub fn get_all(&self, name: &str) -> Vec<Arc<KeywordDoc>> {
        self.keywords
            .iter()
            .filter(|k| k.matcher().matches(name))
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<KeywordDoc>> {
        let mut all = self.get_all(name);
        if all.len() == 1 {
            all.pop()
        } else {
            None
        }
    }

    fn rebind(&mut self, digest: &str, libname: &str, libtype: LibraryType) {
        for kw in self.keywords.iter_mut() {
            let kw = Arc::make_mut(kw);
            kw.parent_digest = digest.to_string();
            kw.libname = libname.to_string();
            kw.libtype = libtype;
        }
    }
}

/// A loaded library, resource file or variables file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDoc {
    pub name: String,
    pub source: Option<PathBuf>,
    pub library_type: LibraryType,
    pub scope: LibraryScope,
    pub version: String,
    pub doc: String,
    pub doc_format: String,
    /// Line range of the library's own definition, if known.
    pub line_range: Option<(u32, u32)>,
    pub keywords: KeywordStore,
    pub inits: KeywordStore,
    pub types: Vec<TypeDoc>,
    pub errors: Vec<LibraryError>,
    /// Variables of a variables file or resource file.
    #[serde(default)]
    pub variables: Vec<Arc<VariableDefinition>>,
    #[serde(default)]
    pub has_listener: bool,
    /// Keyword names come from `get_keyword_names` and cannot be listed
    /// without running the library.
    #[serde(default)]
    pub is_dynamic: bool,
    pub digest: String,
}

impl LibraryDoc {
    pub fn new(name: impl Into<String>, library_type: LibraryType) -> Self {
        Self {
            name: name.into(),
            source: None,
            library_type,
            scope: LibraryScope::default(),
            version: String::new(),
            doc: String::new(),
            doc_format: "ROBOT".to_string(),
            line_range: None,
            keywords: KeywordStore::default(),
            inits: KeywordStore::default(),
            types: Vec::new(),
            errors: Vec::new(),
            variables: Vec::new(),
            has_listener: false,
            is_dynamic: false,
            digest: String::new(),
        }
    }

    /// A doc that only carries a load error.
    pub fn failed(name: impl Into<String>, library_type: LibraryType, error: LibraryError) -> Self {
        let mut doc = Self::new(name, library_type);
        doc.source = error.source.clone();
        doc.errors.push(error);
        doc.finish()
    }

    /// Compute the digest and point every keyword back at this doc.
    pub fn finish(mut self) -> Self {
        self.digest = self.compute_digest();
        let (digest, name, ty) = (self.digest.clone(), self.name.clone(), self.library_type);
        self.keywords.rebind(&digest, &name, ty);
        self.inits.rebind(&digest, &name, ty);
        self
    }

    fn compute_digest(&self) -> String {
        let mut hasher = Sha256::new();
        let (start, end) = self.line_range.unwrap_or((0, 0));
        let source = self
            .source
            .as_ref()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        hasher.update(
            format!(
                "{}|{}|{}-{}|{}|{}|{:?}|{}",
                self.name, source, start, end, self.version, self.library_type, self.scope, self.doc_format
            )
            .as_bytes(),
        );
        // Keyword names keep docs of the same file distinct across edits.
        for kw in self.keywords.iter() {
            hasher.update(kw.name.as_bytes());
            hasher.update(format!("{:?}", kw.range).as_bytes());
        }
        for err in &self.errors {
            hasher.update(err.message.as_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
