//! Static reader for Python library and variables sources.
//!
//! Nothing is executed. The reader splits the source into logical lines,
//! finds `def` / `class` statements with their decorators and docstrings,
//! and evaluates literal expressions for module constants.

use std::path::Path;

use serde_json::{Map, Value};

use super::doc::{
    ArgumentKind, ArgumentSpec, KeywordDoc, KeywordStore, LibraryDoc, LibraryError, LibraryScope, LibraryType,
};

/// One logical source line with its one-based starting line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub lineno: u32,
    pub indent: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single(char),
    Triple(char),
}

/// Split `source` into logical lines, dropping comments and blank lines.
pub fn logical_lines(source: &str) -> Result<Vec<LogicalLine>, LibraryError> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut start_line = 1u32;
    let mut line = 1u32;
    let mut indent = 0usize;
    let mut at_line_start = true;
    let mut depth = 0i32;
    let mut quote: Option<Quote> = None;
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0usize;

    let flush = |current: &mut String, out: &mut Vec<LogicalLine>, start_line: u32, indent: usize| {
        let text = current.trim().to_string();
        if !text.is_empty() {
            out.push(LogicalLine {
                lineno: start_line,
                indent,
                text,
            });
        }
        current.clear();
    };

    while i < chars.len() {
        let c = chars[i];
        if at_line_start && quote.is_none() && depth == 0 && current.is_empty() {
            let mut width = 0usize;
            while i < chars.len() && (chars[i] == ' ' || chars[i] == '\t') {
                width += if chars[i] == '\t' { 8 - width % 8 } else { 1 };
                i += 1;
            }
            indent = width;
            start_line = line;
            at_line_start = false;
            continue;
        }
        match quote {
            Some(q) => {
                current.push(c);
                if c == '\\' {
                    if let Some(&next) = chars.get(i + 1) {
                        current.push(next);
                        if next == '\n' {
                            line += 1;
                        }
                        i += 2;
                        continue;
                    }
                }
                match q {
                    Quote::Triple(ch) if c == ch && chars.get(i + 1) == Some(&ch) && chars.get(i + 2) == Some(&ch) => {
                        current.push(ch);
                        current.push(ch);
                        i += 3;
                        quote = None;
                        continue;
                    }
                    Quote::Single(ch) if c == ch => quote = None,
                    Quote::Single(_) if c == '\n' => {
                        return Err(LibraryError::new("EOL while scanning string literal", "SyntaxError")
                            .with_line(line));
                    }
                    _ => {}
                }
                if c == '\n' {
                    line += 1;
                }
                i += 1;
            }
            None => {
                match c {
                    '#' => {
                        while i < chars.len() && chars[i] != '\n' {
                            i += 1;
                        }
                        continue;
                    }
                    '\'' | '"' => {
                        if chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                            current.push_str(&c.to_string().repeat(3));
                            quote = Some(Quote::Triple(c));
                            i += 3;
                            continue;
                        }
                        quote = Some(Quote::Single(c));
                        current.push(c);
                    }
                    '(' | '[' | '{' => {
                        depth += 1;
                        current.push(c);
                    }
                    ')' | ']' | '}' => {
                        depth -= 1;
                        if depth < 0 {
                            return Err(LibraryError::new(format!("unmatched '{c}'"), "SyntaxError").with_line(line));
                        }
                        current.push(c);
                    }
                    '\\' if chars.get(i + 1) == Some(&'\n') => {
                        current.push(' ');
                        line += 1;
                        i += 2;
                        continue;
                    }
                    '\n' => {
                        line += 1;
                        if depth == 0 {
                            flush(&mut current, &mut out, start_line, indent);
                            at_line_start = true;
                        } else {
                            current.push(' ');
                        }
                    }
                    '\r' => {}
                    _ => current.push(c),
                }
                i += 1;
            }
        }
    }
    if quote.is_some() {
        return Err(
            LibraryError::new("EOF while scanning triple-quoted string literal", "SyntaxError").with_line(start_line)
        );
    }
    if depth > 0 {
        return Err(LibraryError::new("unexpected EOF while parsing", "SyntaxError").with_line(start_line));
    }
    flush(&mut current, &mut out, start_line, indent);
    Ok(out)
}

impl LibraryError {
    fn with_line(mut self, line: u32) -> Self {
        self.line_no = Some(line);
        self
    }
}

/// Split at top-level occurrences of `sep`, outside brackets and strings.
pub fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in text.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            c if c == sep && depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// Python literal evaluation for the subset used in constants.
pub fn parse_literal(text: &str) -> Option<Value> {
    let chars: Vec<char> = text.chars().collect();
    let mut parser = LiteralParser { chars: &chars, pos: 0 };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos == chars.len() {
        Some(value)
    } else {
        None
    }
}

struct LiteralParser<'a> {
    chars: &'a [char],
    pos: usize,
}

impl LiteralParser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().map(char::is_whitespace).unwrap_or(false) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Option<Value> {
        self.skip_ws();
        let c = self.peek()?;
        match c {
            '[' => self.sequence('[', ']'),
            '(' => self.sequence('(', ')'),
            '{' => self.mapping(),
            '-' | '+' | '0'..='9' | '.' => self.number(),
            _ if self.at_string_start() => self.strings(),
            _ => self.name(),
        }
    }

    fn at_string_start(&self) -> bool {
        let mut i = self.pos;
        while let Some(c) = self.chars.get(i) {
            if matches!(c.to_ascii_lowercase(), 'r' | 'u' | 'b' | 'f') && i - self.pos < 2 {
                i += 1;
                continue;
            }
            return *c == '\'' || *c == '"';
        }
        false
    }

    fn strings(&mut self) -> Option<Value> {
        let mut out = String::new();
        loop {
            self.skip_ws();
            if !self.at_string_start() {
                break;
            }
            let mut raw = false;
            while let Some(c) = self.peek() {
                if c == '\'' || c == '"' {
                    break;
                }
                if c.eq_ignore_ascii_case(&'r') {
                    raw = true;
                }
                self.pos += 1;
            }
            let q = self.peek()?;
            let triple = self.chars.get(self.pos + 1) == Some(&q) && self.chars.get(self.pos + 2) == Some(&q);
            self.pos += if triple { 3 } else { 1 };
            let body_start = self.pos;
            loop {
                let c = self.peek()?;
                if c == '\\' {
                    self.pos += 2;
                    continue;
                }
                if c == q {
                    if !triple {
                        break;
                    }
                    if self.chars.get(self.pos + 1) == Some(&q) && self.chars.get(self.pos + 2) == Some(&q) {
                        break;
                    }
                }
                self.pos += 1;
            }
            let body: String = self.chars[body_start..self.pos].iter().collect();
            self.pos += if triple { 3 } else { 1 };
            out.push_str(&if raw { body } else { unescape(&body) });
        }
        Some(Value::String(out))
    }

    fn number(&mut self) -> Option<Value> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+') {
                // A sign only belongs to the number at the start or after an exponent.
                if matches!(c, '-' | '+') && self.pos != start {
                    let prev = self.chars[self.pos - 1].to_ascii_lowercase();
                    if prev != 'e' {
                        break;
                    }
                }
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        crate::variables::number_value(&text)
    }

    fn name(&mut self) -> Option<Value> {
        let start = self.pos;
        while self.peek().map(|c| c.is_alphanumeric() || c == '_').unwrap_or(false) {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" => Some(Value::Bool(true)),
            "False" => Some(Value::Bool(false)),
            "None" => Some(Value::Null),
            _ => None,
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Option<Value> {
        if !self.eat(open) {
            return None;
        }
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                break;
            }
            items.push(self.value()?);
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                break;
            }
            return None;
        }
        Some(Value::Array(items))
    }

    fn mapping(&mut self) -> Option<Value> {
        if !self.eat('{') {
            return None;
        }
        let mut map = Map::new();
        let mut set_items = Vec::new();
        loop {
            if self.eat('}') {
                break;
            }
            let key = self.value()?;
            if self.eat(':') {
                let value = self.value()?;
                let key = match key {
                    Value::String(s) => s,
                    other => crate::variables::value_to_string(&other),
                };
                map.insert(key, value);
            } else {
                set_items.push(key);
            }
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                break;
            }
            return None;
        }
        if !set_items.is_empty() && map.is_empty() {
            return Some(Value::Array(set_items));
        }
        Some(Value::Object(map))
    }
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// `inspect.cleandoc` equivalent.
pub fn clean_doc(doc: &str) -> String {
    let lines: Vec<&str> = doc.lines().collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };
    let margin = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out: Vec<String> = vec![first.trim().to_string()];
    out.extend(rest.iter().map(|l| l.get(margin..).unwrap_or_else(|| l.trim()).trim_end().to_string()));
    while out.first().map(|l| l.is_empty()).unwrap_or(false) {
        out.remove(0);
    }
    while out.last().map(|l| l.is_empty()).unwrap_or(false) {
        out.pop();
    }
    out.join("\n")
}

fn docstring(line: Option<&LogicalLine>, parent_indent: usize) -> Option<String> {
    let line = line?;
    if line.indent <= parent_indent {
        return None;
    }
    match parse_literal(&line.text)? {
        Value::String(s) => Some(clean_doc(&s)),
        _ => None,
    }
}

/// `open_browser` / `openBrowser` -> `Open Browser`.
pub fn printable_name(code_name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    for part in code_name.split('_').filter(|p| !p.is_empty()) {
        let chars: Vec<char> = part.chars().collect();
        let mut word = String::new();
        for (i, c) in chars.iter().enumerate() {
            let split = i > 0
                && c.is_uppercase()
                && (chars[i - 1].is_lowercase()
                    || chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false) && chars[i - 1].is_uppercase());
            if split && !word.is_empty() {
                words.push(std::mem::take(&mut word));
            }
            word.push(*c);
        }
        if !word.is_empty() {
            words.push(word);
        }
    }
    words
        .into_iter()
        .map(|w| {
            let mut cs = w.chars();
            match cs.next() {
                Some(f) => f.to_uppercase().chain(cs).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
struct Decorator {
    name: String,
    args: Option<String>,
}

impl Decorator {
    fn parse(text: &str) -> Self {
        let body = text.trim_start_matches('@').trim();
        match body.find('(') {
            Some(idx) => Self {
                name: body[..idx].trim().rsplit('.').next().unwrap_or("").to_string(),
                args: Some(body[idx + 1..body.len().saturating_sub(1)].to_string()),
            },
            None => Self {
                name: body.rsplit('.').next().unwrap_or("").to_string(),
                args: None,
            },
        }
    }

    /// Positional and named arguments of the decorator call.
    fn arguments(&self) -> (Vec<String>, Vec<(String, String)>) {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        let Some(args) = &self.args else {
            return (positional, named);
        };
        for part in split_top_level(args, ',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match split_top_level(part, '=').as_slice() {
                [name, value] if is_identifier(name.trim()) => {
                    named.push((name.trim().to_string(), value.trim().to_string()))
                }
                _ => positional.push(part.to_string()),
            }
        }
        (positional, named)
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_') && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[derive(Debug, Clone)]
struct FunctionDef {
    name: String,
    params: String,
    returns: Option<String>,
    decorators: Vec<Decorator>,
    doc: Option<String>,
    lineno: u32,
}

impl FunctionDef {
    fn decorator(&self, name: &str) -> Option<&Decorator> {
        self.decorators.iter().find(|d| d.name == name)
    }
}

#[derive(Debug, Clone, Default)]
struct Scope {
    functions: Vec<FunctionDef>,
    assignments: Vec<(String, String, u32)>,
}

impl Scope {
    fn constant(&self, name: &str) -> Option<&str> {
        self.assignments
            .iter()
            .rev()
            .find(|(n, _, _)| n == name)
            .map(|(_, v, _)| v.as_str())
    }

    fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
struct ClassDef {
    name: String,
    decorators: Vec<Decorator>,
    doc: Option<String>,
    lineno: u32,
    end_lineno: u32,
    body: Scope,
}

/// Statically read module structure.
#[derive(Debug, Clone, Default)]
pub struct PythonModule {
    doc: Option<String>,
    module: Scope,
    classes: Vec<ClassDef>,
    calls: Vec<(String, u32)>,
    end_lineno: u32,
}

fn parse_def(text: &str) -> Option<(String, String, Option<String>)> {
    let rest = text.strip_prefix("async ").unwrap_or(text).strip_prefix("def ")?;
    let open = rest.find('(')?;
    let name = rest[..open].trim().to_string();
    let mut depth = 0i32;
    let mut close = None;
    for (i, c) in rest[open..].char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close?;
    let params = rest[open + 1..close].to_string();
    let tail = rest[close + 1..].trim();
    let returns = tail
        .strip_prefix("->")
        .and_then(|r| r.rsplit_once(':').map(|(t, _)| t.trim().trim_matches(['\'', '"']).to_string()));
    Some((name, params, returns))
}

fn parse_class(text: &str) -> Option<String> {
    let rest = text.strip_prefix("class ")?;
    let end = rest.find(['(', ':']).unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

fn parse_assignment(text: &str) -> Option<(String, String)> {
    let parts = split_top_level(text, '=');
    if parts.len() != 2 {
        return None;
    }
    let target = parts[0].trim();
    let target = target.split(':').next().unwrap_or(target).trim();
    let target = target.strip_prefix("self.").unwrap_or(target);
    if !is_identifier(target) {
        return None;
    }
    Some((target.to_string(), parts[1].trim().to_string()))
}

impl PythonModule {
    pub fn parse(source: &str) -> Result<Self, LibraryError> {
        let lines = logical_lines(source)?;
        let mut module = PythonModule {
            end_lineno: source.lines().count() as u32,
            ..Default::default()
        };
        if let Some(first) = lines.first().filter(|l| l.indent == 0) {
            if let Some(Value::String(s)) = parse_literal(&first.text) {
                module.doc = Some(clean_doc(&s));
            }
        }

        let mut pending: Vec<Decorator> = Vec::new();
        let mut i = 0usize;
        while i < lines.len() {
            let line = &lines[i];
            if line.indent != 0 {
                i += 1;
                continue;
            }
            if line.text.starts_with('@') {
                pending.push(Decorator::parse(&line.text));
                i += 1;
                continue;
            }
            if let Some((name, params, returns)) = parse_def(&line.text) {
                module.module.functions.push(FunctionDef {
                    name,
                    params,
                    returns,
                    decorators: std::mem::take(&mut pending),
                    doc: docstring(lines.get(i + 1), 0),
                    lineno: line.lineno,
                });
            } else if let Some(name) = parse_class(&line.text) {
                let body_end = lines[i + 1..]
                    .iter()
                    .position(|l| l.indent == 0)
                    .map(|p| i + 1 + p)
                    .unwrap_or(lines.len());
                let body = &lines[i + 1..body_end];
                let end_lineno = lines.get(body_end).map(|l| l.lineno.saturating_sub(1)).unwrap_or(module.end_lineno);
                module.classes.push(ClassDef {
                    name,
                    decorators: std::mem::take(&mut pending),
                    doc: docstring(body.first(), 0),
                    lineno: line.lineno,
                    end_lineno,
                    body: parse_class_body(body),
                });
                i = body_end;
                continue;
            } else {
                pending.clear();
                if let Some((name, value)) = parse_assignment(&line.text) {
                    module.module.assignments.push((name, value, line.lineno));
                } else if line.text.contains('(') {
                    module.calls.push((line.text.clone(), line.lineno));
                }
            }
            i += 1;
        }
        Ok(module)
    }

    /// Top-level `NAME = literal` assignments in source order.
    pub fn module_assignments(&self) -> impl Iterator<Item = (&str, &str, u32)> {
        self.module
            .assignments
            .iter()
            .map(|(n, v, l)| (n.as_str(), v.as_str(), *l))
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.module.function(name).is_some()
    }
}

fn parse_class_body(body: &[LogicalLine]) -> Scope {
    let mut scope = Scope::default();
    let Some(indent) = body.first().map(|l| l.indent) else {
        return scope;
    };
    let mut pending = Vec::new();
    for (i, line) in body.iter().enumerate() {
        if line.indent != indent {
            // Listener registration inside `__init__`.
            if line.text.starts_with("self.ROBOT_LIBRARY_LISTENER") {
                if let Some((name, value)) = parse_assignment(&line.text) {
                    scope.assignments.push((name, value, line.lineno));
                }
            }
            continue;
        }
        if line.text.starts_with('@') {
            pending.push(Decorator::parse(&line.text));
            continue;
        }
        if let Some((name, params, returns)) = parse_def(&line.text) {
            scope.functions.push(FunctionDef {
                name,
                params,
                returns,
                decorators: std::mem::take(&mut pending),
                doc: docstring(body.get(i + 1), indent),
                lineno: line.lineno,
            });
            continue;
        }
        pending.clear();
        if let Some((name, value)) = parse_assignment(&line.text) {
            scope.assignments.push((name, value, line.lineno));
        }
    }
    scope
}

fn strip_annotation_quotes(text: &str) -> String {
    text.trim().trim_matches(['\'', '"']).to_string()
}

fn split_types(annotation: &str) -> Vec<String> {
    let annotation = strip_annotation_quotes(annotation);
    if annotation.is_empty() {
        return Vec::new();
    }
    split_top_level(&annotation, '|')
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Argument specs of a Python parameter list, without `self`.
pub fn parse_parameters(params: &str, skip_first: bool) -> Vec<ArgumentSpec> {
    let mut raw: Vec<String> = split_top_level(params, ',')
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if skip_first && !raw.is_empty() && !raw[0].starts_with('*') {
        raw.remove(0);
    }

    let has_slash = raw.iter().any(|p| p == "/");
    let mut before_slash = has_slash;
    let mut named_only = false;
    let mut out = Vec::new();
    for p in raw {
        if p == "/" {
            before_slash = false;
            out.push(ArgumentSpec::new("/", ArgumentKind::PositionalOnlyMarker));
            continue;
        }
        if p == "*" {
            named_only = true;
            out.push(ArgumentSpec::new("*", ArgumentKind::NamedOnlyMarker));
            continue;
        }
        let (kind, body) = if let Some(rest) = p.strip_prefix("**") {
            (ArgumentKind::VarNamed, rest.to_string())
        } else if let Some(rest) = p.strip_prefix('*') {
            named_only = true;
            (ArgumentKind::VarPositional, rest.to_string())
        } else if named_only {
            (ArgumentKind::NamedOnly, p.clone())
        } else if before_slash {
            (ArgumentKind::PositionalOnly, p.clone())
        } else {
            (ArgumentKind::PositionalOrNamed, p.clone())
        };

        let (head, default) = match split_default(&body) {
            Some((h, d)) => (h, Some(d)),
            None => (body.clone(), None),
        };
        let (name, types) = match head.split_once(':') {
            Some((n, t)) => (n.trim().to_string(), split_types(t)),
            None => (head.trim().to_string(), Vec::new()),
        };
        let mut spec = ArgumentSpec::new(name, kind).with_types(types);
        if let Some(default) = default {
            spec = spec.with_default(display_default(&default));
        }
        out.push(spec);
    }
    out
}

/// Split `name: T = default` at the assignment `=`, ignoring `==`, `<=` and
/// similar inside the annotation.
fn split_default(param: &str) -> Option<(String, String)> {
    let parts = split_top_level(param, '=');
    if parts.len() < 2 {
        return None;
    }
    let head = parts[0].clone();
    let default = parts[1..].join("=");
    if head.ends_with(['<', '>', '!']) || default.starts_with('=') {
        return None;
    }
    Some((head.trim().to_string(), default.trim().to_string()))
}

fn display_default(default: &str) -> String {
    match parse_literal(default) {
        Some(Value::String(s)) => s,
        Some(Value::Null) => "None".to_string(),
        Some(other) => crate::variables::value_to_string(&other),
        None => default.to_string(),
    }
}

fn literal_string(text: &str) -> Option<String> {
    match parse_literal(text)? {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(if b { "True" } else { "False" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn literal_strings(text: &str) -> Vec<String> {
    match parse_literal(text) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn tags_from_doc(doc: &str) -> (String, Vec<String>) {
    let mut lines: Vec<&str> = doc.lines().collect();
    if let Some(last) = lines.last() {
        if let Some(rest) = last.trim().strip_prefix("Tags:") {
            let tags = rest.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect();
            lines.pop();
            return (lines.join("\n").trim_end().to_string(), tags);
        }
    }
    (doc.to_string(), Vec::new())
}

struct KeywordSource<'a> {
    scope: &'a Scope,
    is_class: bool,
    auto_keywords: bool,
}

fn collect_keywords(src: KeywordSource<'_>, libname: &str, path: &Path) -> Vec<KeywordDoc> {
    let mut out = Vec::new();
    for f in &src.scope.functions {
        if f.decorator("not_keyword").is_some() || f.decorator("property").is_some() {
            continue;
        }
        let explicit = f.decorator("keyword");
        if explicit.is_none() && (!src.auto_keywords || f.name.starts_with('_')) {
            continue;
        }
        if f.name == "get_keyword_names" || f.name == "run_keyword" {
            continue;
        }
        let mut name = printable_name(&f.name);
        let mut tags = Vec::new();
        if let Some(deco) = explicit {
            let (positional, named) = deco.arguments();
            if let Some(n) = positional.first().and_then(|p| literal_string(p)) {
                name = n;
            }
            for (key, value) in named {
                match key.as_str() {
                    "name" => {
                        if let Some(n) = literal_string(&value) {
                            name = n;
                        }
                    }
                    "tags" => tags = literal_strings(&value),
                    _ => {}
                }
            }
        }
        let skip_first = src.is_class && f.decorator("staticmethod").is_none();
        let (doc, doc_tags) = tags_from_doc(f.doc.as_deref().unwrap_or(""));
        tags.extend(doc_tags);
        let mut kw = KeywordDoc::new(name, libname, LibraryType::Library)
            .with_args(parse_parameters(&f.params, skip_first))
            .with_doc(doc)
            .with_tags(tags)
            .with_source(Some(path.to_path_buf()), f.lineno.saturating_sub(1));
        kw.return_type = f.returns.clone().filter(|r| r != "None");
        out.push(kw);
    }
    out
}

fn registered_run_keywords(module: &PythonModule) -> Vec<(String, usize)> {
    module
        .calls
        .iter()
        .filter(|(text, _)| text.contains("register_run_keyword("))
        .filter_map(|(text, _)| {
            let start = text.find("register_run_keyword(")? + "register_run_keyword(".len();
            let inner = text[start..].trim_end().strip_suffix(')')?;
            let args = split_top_level(inner, ',');
            let name = literal_string(args.get(1)?.trim())?;
            let count = args
                .get(2)
                .and_then(|a| parse_literal(a.trim()))
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as usize;
            Some((name, count))
        })
        .collect()
}

/// Build a library doc from a Python source.
///
/// `class_name` selects a class inside the module; otherwise a class named
/// like the module wins over module-level functions.
pub fn library_doc_from_source(
    libname: &str,
    module_name: &str,
    class_name: Option<&str>,
    source: &str,
    path: &Path,
) -> LibraryDoc {
    let module = match PythonModule::parse(source) {
        Ok(m) => m,
        Err(err) => {
            let line = err.line_no;
            return LibraryDoc::failed(libname, LibraryType::Library, err.at(path, line));
        }
    };

    let wanted_class = class_name.unwrap_or(module_name);
    let class = module.classes.iter().find(|c| c.name == wanted_class);
    let mut doc = LibraryDoc::new(libname, LibraryType::Library);
    doc.source = Some(path.to_path_buf());

    if class_name.is_some() && class.is_none() {
        doc.errors.push(
            LibraryError::new(
                format!("Module '{module_name}' does not contain '{wanted_class}'."),
                "DataError",
            )
            .at(path, None),
        );
        return doc.finish();
    }

    let (scope, decorators, class_doc, is_class) = match class {
        Some(c) => (&c.body, c.decorators.as_slice(), c.doc.clone(), true),
        None => (&module.module, &[][..], module.doc.clone(), false),
    };

    let library_deco = decorators.iter().find(|d| d.name == "library");
    let mut auto_keywords = scope
        .constant("ROBOT_AUTO_KEYWORDS")
        .or_else(|| module.module.constant("ROBOT_AUTO_KEYWORDS"))
        .map(|v| v.trim() != "False")
        .unwrap_or(true);
    let mut scope_value = scope
        .constant("ROBOT_LIBRARY_SCOPE")
        .or_else(|| module.module.constant("ROBOT_LIBRARY_SCOPE"))
        .and_then(literal_string);
    let mut version = scope
        .constant("ROBOT_LIBRARY_VERSION")
        .or_else(|| module.module.constant("ROBOT_LIBRARY_VERSION"))
        .or_else(|| module.module.constant("__version__"))
        .and_then(literal_string);
    let mut doc_format = scope
        .constant("ROBOT_LIBRARY_DOC_FORMAT")
        .or_else(|| module.module.constant("ROBOT_LIBRARY_DOC_FORMAT"))
        .and_then(literal_string);
    if let Some(deco) = library_deco {
        auto_keywords = false;
        for (key, value) in deco.arguments().1 {
            match key.as_str() {
                "auto_keywords" => auto_keywords = value.trim() == "True",
                "scope" => scope_value = literal_string(&value),
                "version" => version = literal_string(&value),
                "doc_format" => doc_format = literal_string(&value),
                _ => {}
            }
        }
    }

    doc.scope = scope_value.map(|s| LibraryScope::parse(&s)).unwrap_or_default();
    doc.version = version.unwrap_or_default();
    doc.doc_format = doc_format.map(|f| f.to_uppercase()).unwrap_or_else(|| "ROBOT".to_string());
    doc.doc = class_doc.unwrap_or_default();
    doc.has_listener = scope.constant("ROBOT_LIBRARY_LISTENER").is_some()
        || module.module.constant("ROBOT_LIBRARY_LISTENER").is_some();
    doc.is_dynamic = scope.function("get_keyword_names").is_some() && scope.function("run_keyword").is_some();
    doc.line_range = match class {
        Some(c) => Some((c.lineno, c.end_lineno)),
        None => Some((1, module.end_lineno)),
    };

    let mut keywords = if doc.is_dynamic {
        Vec::new()
    } else {
        collect_keywords(
            KeywordSource {
                scope,
                is_class,
                auto_keywords,
            },
            libname,
            path,
        )
    };
    for (name, count) in registered_run_keywords(&module) {
        for kw in keywords.iter_mut().filter(|k| k.matcher().matches(&name)) {
            kw.is_registered_run_keyword = true;
            kw.args_to_process = Some(count);
        }
    }

    if let Some(init) = scope.function("__init__").filter(|_| is_class) {
        let mut kw = KeywordDoc::new("__init__", libname, LibraryType::Library)
            .with_args(parse_parameters(&init.params, true))
            .with_doc(init.doc.clone().unwrap_or_default())
            .with_source(Some(path.to_path_buf()), init.lineno.saturating_sub(1));
        kw.is_initializer = true;
        doc.inits = KeywordStore::new(vec![kw]);
    }
    doc.keywords = KeywordStore::new(keywords);
    doc.finish()
}
