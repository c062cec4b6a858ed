use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use regex::Regex;
use tower_lsp::lsp_types::{Diagnostic, Url};
use twox_hash::XxHash64;

pub(crate) fn compute_content_hash(content: &str) -> u64 {
    let mut hasher = XxHash64::default();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Result id of a pull diagnostics report; changes whenever the version or
/// the reported items change.
pub(crate) fn diagnostics_result_id(version: Option<i32>, items: &[Diagnostic]) -> String {
    let mut hasher = XxHash64::default();
    version.hash(&mut hasher);
    for item in items {
        serde_json::to_string(item).unwrap_or_default().hash(&mut hasher);
    }
    format!("{:016x}", hasher.finish())
}

/// Local path behind a `file:` URI. Other schemes map to their path so that
/// untitled documents still get a stable source.
pub(crate) fn uri_to_path(uri: &Url) -> PathBuf {
    uri.to_file_path().unwrap_or_else(|_| PathBuf::from(uri.path()))
}

pub(crate) fn path_to_uri(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}

/// Translate a workspace exclude glob (`**`, `*`, `?`) into an anchored regex.
pub(crate) fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut out = String::from("^");
    let mut chars = pattern.trim_start_matches("./").chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out).ok()
}
