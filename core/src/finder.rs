//! Keyword lookup with Robot Framework's precedence rules.
//!
//! Order: the document itself, `Owner.Keyword` names, imported resources,
//! imported libraries, and finally the name without a BDD prefix. Ties are
//! broken by exact-over-embedded matching, then the search order, then
//! custom-over-standard libraries.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashMap;

use crate::diagnostics::{codes, Severity};
use crate::library::{KeywordDoc, LibraryDoc};
use crate::matcher::{normalize, KeywordMatcher};
use crate::namespace::NamespaceImports;

/// A problem found while looking up a keyword name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderDiagnostic {
    pub message: String,
    pub severity: Severity,
    pub code: &'static str,
}

impl FinderDiagnostic {
    fn error(code: &'static str, message: String) -> Self {
        Self {
            message,
            severity: Severity::Error,
            code,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindResult {
    pub keyword: Option<Arc<KeywordDoc>>,
    pub diagnostics: Vec<FinderDiagnostic>,
    /// Number of leading characters (prefix plus space) of a stripped BDD
    /// prefix.
    pub bdd_prefix_len: usize,
    /// Explicit owner name when found as `Owner.Keyword`.
    pub owner: Option<String>,
}

/// Candidate keyword and the name of the import it came from; `None` for
/// the document's own keywords.
type Candidate = (Option<Owner>, Arc<KeywordDoc>);

#[derive(Debug, Clone)]
struct Owner {
    name: String,
    is_standard: bool,
}

/// Stops the search after a conflict was reported.
struct SearchCancelled;

pub struct KeywordFinder {
    self_doc: Arc<LibraryDoc>,
    imports: Arc<NamespaceImports>,
    source: PathBuf,
    search_order: Vec<String>,
    bdd_prefixes: Vec<String>,
    cache: Mutex<FxHashMap<(String, bool), Arc<FindResult>>>,
}

impl std::fmt::Debug for KeywordFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordFinder").field("source", &self.source).finish()
    }
}

impl KeywordFinder {
    pub fn new(
        self_doc: Arc<LibraryDoc>,
        imports: Arc<NamespaceImports>,
        source: PathBuf,
        search_order: Vec<String>,
        bdd_prefixes: Vec<String>,
    ) -> Self {
        Self {
            self_doc,
            imports,
            source,
            search_order,
            bdd_prefixes,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn find_keyword(&self, name: &str) -> Arc<FindResult> {
        self.find_keyword_with(name, true)
    }

    /// Memoised per name and BDD handling.
    pub fn find_keyword_with(&self, name: &str, handle_bdd: bool) -> Arc<FindResult> {
        let key = (name.to_string(), handle_bdd);
        if let Some(hit) = self.cache.lock().unwrap_or_else(PoisonError::into_inner).get(&key) {
            return hit.clone();
        }
        let result = Arc::new(self.search(name, handle_bdd));
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, result.clone());
        result
    }

    fn search(&self, name: &str, handle_bdd: bool) -> FindResult {
        let mut result = FindResult::default();
        if name.trim().is_empty() {
            result.diagnostics.push(FinderDiagnostic::error(
                codes::KEYWORD_ERROR,
                "Keyword name cannot be empty.".to_string(),
            ));
            return result;
        }
        match self.find(name, handle_bdd, &mut result) {
            Ok(Some(keyword)) => result.keyword = Some(keyword),
            Ok(None) => result.diagnostics.push(FinderDiagnostic::error(
                codes::KEYWORD_NOT_FOUND,
                format!("No keyword with name '{name}' found."),
            )),
            Err(SearchCancelled) => {}
        }
        result
    }

    fn find(
        &self,
        name: &str,
        handle_bdd: bool,
        result: &mut FindResult,
    ) -> Result<Option<Arc<KeywordDoc>>, SearchCancelled> {
        if let Some(found) = self.from_self(name, result)? {
            return Ok(Some(found));
        }
        if name.contains('.') {
            if let Some(found) = self.explicit(name, result)? {
                return Ok(Some(found));
            }
        }
        if let Some(found) = self.from_resources(name, result)? {
            return Ok(Some(found));
        }
        if let Some(found) = self.from_libraries(name, result)? {
            return Ok(Some(found));
        }
        if handle_bdd {
            return self.bdd_style(name, result);
        }
        Ok(None)
    }

    fn from_self(&self, name: &str, result: &mut FindResult) -> Result<Option<Arc<KeywordDoc>>, SearchCancelled> {
        let mut found: Vec<Candidate> = self
            .self_doc
            .keywords
            .get_all(name)
            .into_iter()
            .map(|kw| (None, kw))
            .collect();
        if found.len() > 1 {
            found = select_best_matches(found);
        }
        if found.len() > 1 {
            // Duplicates in one file resolve to the error-handling definition.
            if let Some(idx) = found.iter().position(|(_, kw)| kw.is_error_handler) {
                return Ok(Some(found.swap_remove(idx).1));
            }
            result.diagnostics.push(multiple_found(name, &found, false));
            return Err(SearchCancelled);
        }
        Ok(found.pop().map(|(_, kw)| kw))
    }

    fn owners(&self) -> impl Iterator<Item = (Owner, &Arc<LibraryDoc>)> {
        let libraries = self.imports.libraries.values().map(|e| {
            (
                Owner {
                    name: e.name.clone(),
                    is_standard: e.is_standard,
                },
                &e.doc,
            )
        });
        let resources = self.imports.resources.values().map(|e| {
            (
                Owner {
                    name: e.name.clone(),
                    is_standard: false,
                },
                &e.doc,
            )
        });
        libraries.chain(resources)
    }

    fn explicit(&self, name: &str, result: &mut FindResult) -> Result<Option<Arc<KeywordDoc>>, SearchCancelled> {
        let mut found: Vec<Candidate> = Vec::new();
        let mut owner_name = None;
        // Every split of `a.b.c` into owner and keyword, longest owner first.
        let dots: Vec<usize> = name.match_indices('.').map(|(i, _)| i).collect();
        for &idx in dots.iter().rev() {
            let (owner, kw_name) = (&name[..idx], &name[idx + 1..]);
            if kw_name.is_empty() {
                continue;
            }
            let owner_matcher = KeywordMatcher::namespace(owner);
            for (candidate_owner, doc) in self.owners() {
                if !owner_matcher.matches(&candidate_owner.name) {
                    continue;
                }
                for kw in doc.keywords.get_all(kw_name) {
                    owner_name.get_or_insert_with(|| owner.to_string());
                    found.push((Some(candidate_owner.clone()), kw));
                }
            }
        }
        if found.len() > 1 {
            found = select_best_matches(found);
        }
        if found.len() > 1 {
            result.diagnostics.push(multiple_found(name, &found, false));
            return Err(SearchCancelled);
        }
        result.owner = owner_name;
        Ok(found.pop().map(|(_, kw)| kw))
    }

    fn from_resources(&self, name: &str, result: &mut FindResult) -> Result<Option<Arc<KeywordDoc>>, SearchCancelled> {
        let mut found: Vec<Candidate> = Vec::new();
        for entry in self.imports.resources.values() {
            for kw in entry.doc.keywords.get_all(name) {
                let owner = Owner {
                    name: entry.name.clone(),
                    is_standard: false,
                };
                found.push((Some(owner), kw));
            }
        }
        if found.len() > 1 {
            found = self.prioritize_same_file_or_public(found);
        }
        if found.len() > 1 {
            found = select_best_matches(found);
        }
        if found.len() > 1 {
            found = self.apply_search_order(found);
        }
        if found.len() > 1 {
            result.diagnostics.push(multiple_found(name, &found, true));
            return Err(SearchCancelled);
        }
        Ok(found.pop().map(|(_, kw)| kw))
    }

    fn from_libraries(&self, name: &str, result: &mut FindResult) -> Result<Option<Arc<KeywordDoc>>, SearchCancelled> {
        let mut found: Vec<Candidate> = Vec::new();
        for entry in self.imports.libraries.values() {
            for kw in entry.doc.keywords.get_all(name) {
                let owner = Owner {
                    name: entry.name.clone(),
                    is_standard: entry.is_standard,
                };
                found.push((Some(owner), kw));
            }
        }
        if found.len() > 1 {
            found = select_best_matches(found);
        }
        if found.len() > 1 {
            found = self.apply_search_order(found);
        }
        if found.len() == 2 {
            found = prefer_custom_library(found, result);
        }
        if found.len() > 1 {
            result.diagnostics.push(multiple_found(name, &found, true));
            return Err(SearchCancelled);
        }
        Ok(found.pop().map(|(_, kw)| kw))
    }

    fn bdd_style(&self, name: &str, result: &mut FindResult) -> Result<Option<Arc<KeywordDoc>>, SearchCancelled> {
        let words = word_offsets(name);
        let parts: Vec<&str> = words.iter().map(|(_, word)| *word).collect();
        if parts.len() < 2 {
            return Ok(None);
        }
        let prefixes: Vec<String> = self.bdd_prefixes.iter().map(|p| normalize(p)).collect();
        for split in (1..parts.len()).rev() {
            let prefix = normalize(&parts[..split].join(" "));
            if !prefixes.contains(&prefix) {
                continue;
            }
            let rest = parts[split..].join(" ");
            let start = words[split].0;
            if let Some(found) = self.find(&rest, false, result)? {
                result.bdd_prefix_len = name[..start].chars().count();
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn prioritize_same_file_or_public(&self, found: Vec<Candidate>) -> Vec<Candidate> {
        let same_file: Vec<Candidate> = found
            .iter()
            .filter(|(_, kw)| kw.source.as_deref() == Some(self.source.as_path()))
            .cloned()
            .collect();
        if !same_file.is_empty() {
            return same_file;
        }
        let public: Vec<Candidate> = found.iter().filter(|(_, kw)| !kw.is_private()).cloned().collect();
        if public.is_empty() {
            found
        } else {
            public
        }
    }

    fn apply_search_order(&self, found: Vec<Candidate>) -> Vec<Candidate> {
        for libname in &self.search_order {
            let matcher = KeywordMatcher::namespace(libname.as_str());
            if let Some(hit) = found
                .iter()
                .find(|(owner, _)| owner.as_ref().is_some_and(|o| matcher.matches(&o.name)))
            {
                return vec![hit.clone()];
            }
        }
        found
    }
}

/// Exact names beat embedded-argument patterns; among embedded patterns the
/// more specific ones win.
fn select_best_matches(found: Vec<Candidate>) -> Vec<Candidate> {
    let normal: Vec<Candidate> = found.iter().filter(|(_, kw)| !kw.is_embedded()).cloned().collect();
    if !normal.is_empty() {
        return normal;
    }
    let best: Vec<Candidate> = found
        .iter()
        .filter(|candidate| !is_worse_match_than_others(candidate, &found))
        .cloned()
        .collect();
    if best.is_empty() {
        found
    } else {
        best
    }
}

fn is_worse_match_than_others(candidate: &Candidate, alternatives: &[Candidate]) -> bool {
    alternatives.iter().any(|other| {
        !Arc::ptr_eq(&candidate.1, &other.1)
            && is_better_match(&other.1, &candidate.1)
            && !is_better_match(&candidate.1, &other.1)
    })
}

/// `candidate` is more specific if `other`'s pattern accepts its name but
/// not the other way around.
fn is_better_match(candidate: &KeywordDoc, other: &KeywordDoc) -> bool {
    let other_accepts = other
        .matcher()
        .embedded_arguments()
        .is_some_and(|e| e.is_match(&candidate.name));
    let candidate_accepts = candidate
        .matcher()
        .embedded_arguments()
        .is_some_and(|e| e.is_match(&other.name));
    other_accepts && !candidate_accepts
}

fn prefer_custom_library(found: Vec<Candidate>, result: &mut FindResult) -> Vec<Candidate> {
    let is_standard = |c: &Candidate| c.0.as_ref().is_some_and(|o| o.is_standard);
    let (standard, custom) = match (is_standard(&found[0]), is_standard(&found[1])) {
        (true, false) => (&found[0], &found[1]),
        (false, true) => (&found[1], &found[0]),
        _ => return found,
    };
    let owner_name = |c: &Candidate| c.0.as_ref().map(|o| o.name.clone()).unwrap_or_default();
    result.diagnostics.push(FinderDiagnostic {
        message: format!(
            "Keyword '{kw}' found both from a custom library '{custom_lib}' and a standard library '{std_lib}'. \
             The custom keyword is used. To select explicitly, and to get rid of this warning, use either \
             '{custom_lib}.{custom_kw}' or '{std_lib}.{kw}'.",
            kw = standard.1.name,
            custom_kw = custom.1.name,
            custom_lib = owner_name(custom),
            std_lib = owner_name(standard),
        ),
        severity: Severity::Warning,
        code: codes::CONFLICTING_LIBRARY_KEYWORDS,
    });
    vec![custom.clone()]
}

fn multiple_found(name: &str, found: &[Candidate], implicit: bool) -> FinderDiagnostic {
    let mut message = if found.iter().any(|(_, kw)| kw.is_embedded()) {
        format!("Multiple keywords matching name '{name}' found")
    } else if implicit {
        format!("Multiple keywords with name '{name}' found. Give the full name of the keyword you want to use")
    } else {
        format!("Multiple keywords with name '{name}' found")
    };
    let mut names: Vec<String> = found
        .iter()
        .map(|(owner, kw)| match owner {
            Some(owner) => format!("{}.{}", owner.name, kw.name),
            None => kw.name.clone(),
        })
        .collect();
    names.sort();
    message.push(':');
    for n in names {
        message.push_str("\n    ");
        message.push_str(&n);
    }
    FinderDiagnostic::error(codes::KEYWORD_ERROR, message)
}

/// Byte offset and text of every whitespace-separated word of `name`.
fn word_offsets(name: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (index, c) in name.char_indices() {
        if c.is_whitespace() {
            if let Some(from) = start.take() {
                words.push((from, &name[from..index]));
            }
        } else if start.is_none() {
            start = Some(index);
        }
    }
    if let Some(from) = start {
        words.push((from, &name[from..]));
    }
    words
}
