//! Name normalisation and the keyword / variable matchers.

use std::fmt;
use std::hash::{Hash, Hasher};

use once_cell::sync::OnceCell;
use regex::{Regex, RegexBuilder};

use crate::variables::search::{find_variables, search_variable, strip_assign_mark};

/// Lowercase and drop whitespace and underscores.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Like [`normalize`], but also folds path separators so that owners written
/// as paths compare equal on every platform.
pub fn normalize_namespace(name: &str) -> String {
    normalize(&name.replace('\\', "/"))
}

/// Compiled form of a keyword name with `${arg}` placeholders.
#[derive(Debug, Clone)]
pub struct EmbeddedArguments {
    pub names: Vec<String>,
    regex: Regex,
}

impl EmbeddedArguments {
    /// Build the anchored pattern for `name`, or `None` if the name has no
    /// placeholders. Invalid custom patterns yield an error message.
    pub fn from_name(name: &str) -> Option<Result<Self, String>> {
        let occurrences: Vec<_> = find_variables(name)
            .into_iter()
            .filter(|m| m.identifier == '$' && m.items.is_empty())
            .collect();
        if occurrences.is_empty() {
            return None;
        }

        let chars: Vec<char> = name.chars().collect();
        let mut pattern = String::from("^");
        let mut names = Vec::with_capacity(occurrences.len());
        let mut last = 0usize;
        for m in &occurrences {
            let literal: String = chars[last..m.start].iter().collect();
            pattern.push_str(&regex::escape(&literal));
            let (arg_name, custom) = match m.base.split_once(':') {
                Some((n, p)) => (n.trim().to_string(), Some(p.to_string())),
                None => (m.base.trim().to_string(), None),
            };
            pattern.push('(');
            pattern.push_str(custom.as_deref().unwrap_or(".*"));
            pattern.push(')');
            names.push(arg_name);
            last = m.end;
        }
        let tail: String = chars[last..].iter().collect();
        pattern.push_str(&regex::escape(&tail));
        pattern.push('$');

        Some(
            RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map(|regex| Self { names, regex })
                .map_err(|e| format!("Compiling embedded arguments regexp failed: {e}")),
        )
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Captured argument values for `text`, if it matches.
    pub fn match_arguments(&self, text: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(text)?;
        Some(
            (1..caps.len())
                .map(|i| caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
        )
    }
}

/// Matches call-site names against a keyword (or namespace) name.
pub struct KeywordMatcher {
    name: String,
    can_have_embedded: bool,
    is_namespace: bool,
    normalized_name: OnceCell<String>,
    embedded: OnceCell<Option<EmbeddedArguments>>,
}

impl KeywordMatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, true, false)
    }

    pub fn namespace(name: impl Into<String>) -> Self {
        Self::with_options(name, false, true)
    }

    pub fn with_options(name: impl Into<String>, can_have_embedded: bool, is_namespace: bool) -> Self {
        Self {
            name: name.into(),
            can_have_embedded,
            is_namespace,
            normalized_name: OnceCell::new(),
            embedded: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalized_name(&self) -> &str {
        self.normalized_name.get_or_init(|| {
            if self.is_namespace {
                normalize_namespace(&self.name)
            } else {
                normalize(&self.name)
            }
        })
    }

    pub fn embedded_arguments(&self) -> Option<&EmbeddedArguments> {
        self.embedded
            .get_or_init(|| {
                if !self.can_have_embedded || self.is_namespace {
                    return None;
                }
                match EmbeddedArguments::from_name(&self.name)? {
                    Ok(embedded) => Some(embedded),
                    Err(err) => {
                        tracing::debug!("keyword '{}': {}", self.name, err);
                        None
                    }
                }
            })
            .as_ref()
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded_arguments().is_some()
    }

    /// Match a literal call-site name.
    pub fn matches(&self, text: &str) -> bool {
        match self.embedded_arguments() {
            Some(embedded) => embedded.is_match(text),
            None => {
                let normalized = if self.is_namespace {
                    normalize_namespace(text)
                } else {
                    normalize(text)
                };
                normalized == self.normalized_name()
            }
        }
    }
}

impl Clone for KeywordMatcher {
    fn clone(&self) -> Self {
        Self::with_options(self.name.clone(), self.can_have_embedded, self.is_namespace)
    }
}

impl fmt::Debug for KeywordMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordMatcher")
            .field("name", &self.name)
            .field("is_namespace", &self.is_namespace)
            .finish()
    }
}

impl PartialEq for KeywordMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self.embedded_arguments(), other.embedded_arguments()) {
            (Some(embedded), None) => embedded.is_match(&other.name),
            (None, Some(embedded)) => embedded.is_match(&self.name),
            (Some(_), Some(_)) => self.normalized_name() == other.normalized_name(),
            (None, None) => self.normalized_name() == other.normalized_name(),
        }
    }
}

impl Eq for KeywordMatcher {}

impl Hash for KeywordMatcher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.embedded_arguments() {
            Some(embedded) => {
                self.name.hash(state);
                embedded.names.len().hash(state);
            }
            None => self.normalized_name().hash(state),
        }
    }
}

/// Normalised identity of a variable name such as `${Foo Bar}` or `@{x}=`.
#[derive(Debug, Clone)]
pub struct VariableMatcher {
    pub name: String,
    pub identifier: char,
    pub base: String,
    pub items: Vec<String>,
    pub normalized_name: String,
    /// `%{NAME=default}` default value.
    pub default_value: Option<String>,
}

impl VariableMatcher {
    /// `None` when `name` is not a single variable.
    pub fn new(name: &str) -> Option<Self> {
        let stripped = strip_assign_mark(name);
        let chars: Vec<char> = stripped.chars().collect();
        let m = search_variable(&chars)?;
        if m.start != 0 || m.end != chars.len() {
            return None;
        }
        let (base, default_value) = if m.identifier == '%' {
            let (n, d) = m.environment_parts();
            (n.to_string(), d.map(str::to_string))
        } else {
            (m.base.clone(), None)
        };
        Some(Self {
            name: m.name(),
            identifier: m.identifier,
            normalized_name: normalize(&base),
            base,
            items: m.items.clone(),
            default_value,
        })
    }

    /// Matcher for a name that is not valid variable syntax; compares by the
    /// whole text.
    pub fn literal(name: &str) -> Self {
        let identifier = name.chars().next().unwrap_or('$');
        Self {
            name: name.to_string(),
            identifier,
            base: name.to_string(),
            items: Vec::new(),
            normalized_name: normalize(name),
            default_value: None,
        }
    }

    pub fn is_environment(&self) -> bool {
        self.identifier == '%'
    }

    pub fn matches(&self, name: &str) -> bool {
        VariableMatcher::new(name)
            .map(|other| other == *self)
            .unwrap_or(false)
    }
}

impl PartialEq for VariableMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_name == other.normalized_name
    }
}

impl Eq for VariableMatcher {}

impl Hash for VariableMatcher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized_name.hash(state);
    }
}
