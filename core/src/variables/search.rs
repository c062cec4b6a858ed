//! Syntactic search for variable occurrences.
//!
//! Works on char slices so that every offset it returns is a UTF-32 column
//! relative to the searched text.

/// One `${name}`-style occurrence, with optional `[item]` accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableMatch {
    pub start: usize,
    pub end: usize,
    pub identifier: char,
    /// Text between the braces, unmodified.
    pub base: String,
    pub items: Vec<String>,
}

impl VariableMatch {
    /// `${base}` without item access.
    pub fn name(&self) -> String {
        format!("{}{{{}}}", self.identifier, self.base)
    }

    pub fn is_environment(&self) -> bool {
        self.identifier == '%'
    }

    /// For `%{NAME=default}` returns `("NAME", Some("default"))`.
    pub fn environment_parts(&self) -> (&str, Option<&str>) {
        match self.base.split_once('=') {
            Some((name, default)) => (name, Some(default)),
            None => (self.base.as_str(), None),
        }
    }
}

fn is_identifier(c: char) -> bool {
    matches!(c, '$' | '@' | '&' | '%')
}

fn is_escaped(chars: &[char], idx: usize) -> bool {
    let mut backslashes = 0;
    let mut i = idx;
    while i > 0 && chars[i - 1] == '\\' {
        backslashes += 1;
        i -= 1;
    }
    backslashes % 2 == 1
}

/// Index of the brace that closes the one at `open`, honouring nesting.
fn find_closing(chars: &[char], open: usize, open_ch: char, close_ch: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        let c = chars[i];
        if c == open_ch && !is_escaped(chars, i) {
            depth += 1;
        } else if c == close_ch && !is_escaped(chars, i) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Find the first complete variable occurrence in `chars`.
pub fn search_variable(chars: &[char]) -> Option<VariableMatch> {
    let mut i = 0usize;
    while i + 1 < chars.len() {
        let c = chars[i];
        if is_identifier(c) && chars[i + 1] == '{' && !is_escaped(chars, i) {
            if let Some(close) = find_closing(chars, i + 1, '{', '}') {
                let base: String = chars[i + 2..close].iter().collect();
                let mut end = close + 1;
                let mut items = Vec::new();
                if c != '%' {
                    while end < chars.len() && chars[end] == '[' {
                        match find_closing(chars, end, '[', ']') {
                            Some(item_close) => {
                                items.push(chars[end + 1..item_close].iter().collect());
                                end = item_close + 1;
                            }
                            None => break,
                        }
                    }
                }
                return Some(VariableMatch {
                    start: i,
                    end,
                    identifier: c,
                    base,
                    items,
                });
            }
            // Unclosed: nothing further in the text can be a variable that
            // starts here, keep scanning after it.
        }
        i += 1;
    }
    None
}

/// Every occurrence in `text`, with offsets relative to `text`.
pub fn find_variables(text: &str) -> Vec<VariableMatch> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut offset = 0usize;
    while let Some(mut m) = search_variable(&chars[offset..]) {
        m.start += offset;
        m.end += offset;
        offset = m.end;
        out.push(m);
    }
    out
}

/// Whether the whole string is exactly one variable.
pub fn is_variable(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    matches!(search_variable(&chars), Some(m) if m.start == 0 && m.end == chars.len())
}

pub fn is_scalar_variable(text: &str) -> bool {
    text.starts_with('$') && is_variable(text)
}

/// Strip the optional trailing `=` (and the space before it) of an assignment target.
pub fn strip_assign_mark(text: &str) -> &str {
    match text.strip_suffix('=') {
        Some(rest) => rest.trim_end(),
        None => text,
    }
}

/// Assignment targets are `${x}`, `@{x}`, `&{x}` optionally followed by `=`.
/// Item assignment (`${x}[key]=`) is accepted for scalars.
pub fn is_assign(text: &str, allow_items: bool) -> bool {
    let stripped = strip_assign_mark(text);
    let chars: Vec<char> = stripped.chars().collect();
    match search_variable(&chars) {
        Some(m) if m.start == 0 && m.end == chars.len() => {
            if m.identifier == '%' || m.base.trim().is_empty() {
                return false;
            }
            m.items.is_empty() || (allow_items && m.identifier == '$')
        }
        _ => false,
    }
}

/// Split text like `${a} and ${b}` into literal and variable fragments.
/// Literal fragments are returned with `None`, occurrences with `Some`.
pub fn split_variables(text: &str) -> Vec<(String, Option<VariableMatch>)> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut last = 0usize;
    for m in find_variables(text) {
        if m.start > last {
            out.push((chars[last..m.start].iter().collect(), None));
        }
        out.push((chars[m.start..m.end].iter().collect(), Some(m.clone())));
        last = m.end;
    }
    if last < chars.len() {
        out.push((chars[last..].iter().collect(), None));
    }
    out
}
