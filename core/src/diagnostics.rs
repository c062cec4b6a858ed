//! Diagnostics produced by import resolution and analysis.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::token::Range;

/// Source name attached to every diagnostic.
pub const DIAGNOSTICS_SOURCE: &str = "robotls";

/// Diagnostic codes.
pub mod codes {
    pub const MODEL_ERROR: &str = "ModelError";

    pub const LIBRARY_CONTAINS_NO_KEYWORDS: &str = "LibraryContainsNoKeywords";
    pub const IMPORT_CONTAINS_ERRORS: &str = "ImportContainsErrors";
    pub const RECURSIVE_IMPORT: &str = "RecursiveImport";
    pub const RESOURCE_EMPTY: &str = "ResourceEmpty";
    pub const RESOURCE_ALREADY_IMPORTED: &str = "ResourceAlreadyImported";
    pub const VARIABLES_ALREADY_IMPORTED: &str = "VariablesAlreadyImported";
    pub const LIBRARY_ALREADY_IMPORTED: &str = "LibraryAlreadyImported";
    pub const LIBRARY_OVERRIDES_BUILTIN: &str = "LibraryOverridesBuiltIn";
    pub const IMPORT_REQUIRES_VALUE: &str = "ImportRequiresValue";
    pub const POSSIBLE_CIRCULAR_IMPORT: &str = "PossibleCircularImport";

    pub const KEYWORD_NOT_FOUND: &str = "KeywordNotFound";
    pub const KEYWORD_ERROR: &str = "KeywordError";
    pub const CONFLICTING_LIBRARY_KEYWORDS: &str = "ConflictingLibraryKeywords";
    pub const VARIABLE_NOT_FOUND: &str = "VariableNotFound";
    pub const ENVIRONMENT_VARIABLE_NOT_FOUND: &str = "EnvironmentVariableNotFound";

    pub const DEPRECATED_KEYWORD: &str = "DeprecatedKeyword";
    pub const PRIVATE_KEYWORD: &str = "PrivateKeyword";
    pub const RESERVED_KEYWORD: &str = "ReservedKeyword";
    pub const KEYWORD_CONTAINS_ERRORS: &str = "KeywordContainsErrors";
    pub const DEPRECATED_FORCE_TAG: &str = "DeprecatedForceTag";
    pub const DEPRECATED_HYPHEN_TAG: &str = "DeprecatedHyphenTag";
    pub const DEPRECATED_RETURN_SETTING: &str = "DeprecatedReturnSetting";
    pub const CODE_UNREACHABLE: &str = "CodeUnreachable";
    pub const KEYWORD_NAME_EMPTY: &str = "KeywordNameEmpty";
    pub const TEST_CASE_NAME_EMPTY: &str = "TestCaseNameEmpty";
    pub const KEYWORD_CONTAINS_NORMAL_AND_EMBEDDED_ARGUMENTS: &str = "KeywordContainsNormalAndEmbbededArguments";
    pub const INCORRECT_USE: &str = "IncorrectUse";

    pub const KEYWORD_NOT_USED: &str = "KeywordNotUsed";
    pub const VARIABLE_NOT_USED: &str = "VariableNotUsed";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticTag {
    Unnecessary,
    Deprecated,
}

/// A range in some file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub source: PathBuf,
    pub range: Range,
}

impl Location {
    pub fn new(source: impl Into<PathBuf>, range: Range) -> Self {
        Self {
            source: source.into(),
            range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelatedInformation {
    pub location: Location,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<DiagnosticTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedInformation>,
}

impl Diagnostic {
    pub fn new(range: Range, severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            range,
            severity,
            code: code.into(),
            message: message.into(),
            source: DIAGNOSTICS_SOURCE.to_string(),
            tags: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn error(range: Range, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(range, Severity::Error, code, message)
    }

    pub fn warning(range: Range, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(range, Severity::Warning, code, message)
    }

    pub fn information(range: Range, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(range, Severity::Information, code, message)
    }

    pub fn hint(range: Range, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(range, Severity::Hint, code, message)
    }

    pub fn with_tag(mut self, tag: DiagnosticTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_related(mut self, location: Location, message: impl Into<String>) -> Self {
        self.related.push(RelatedInformation {
            location,
            message: message.into(),
        });
        self
    }
}
