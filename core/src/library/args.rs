//! Binding of call-site arguments against a keyword's argument spec.

use thiserror::Error;

use super::doc::{ArgumentKind, ArgumentSpec, KeywordDoc};
use crate::variables::search::find_variables;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ArgumentError {
    pub message: String,
}

impl ArgumentError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn code(&self) -> &'static str {
        "ArgumentError"
    }
}

/// Split `name=value` at the first unescaped `=` outside a variable.
pub fn split_from_equals(value: &str) -> Option<(String, String)> {
    if !value.contains('=') {
        return None;
    }
    let chars: Vec<char> = value.chars().collect();
    let variables = find_variables(value);
    let mut i = 0usize;
    while i < chars.len() {
        if let Some(m) = variables.iter().find(|m| m.start == i) {
            i = m.end;
            continue;
        }
        match chars[i] {
            '\\' => i += 2,
            '=' => {
                if i == 0 {
                    return None;
                }
                let name: String = chars[..i].iter().collect();
                let rest: String = chars[i + 1..].iter().collect();
                return Some((name, rest));
            }
            _ => i += 1,
        }
    }
    None
}

fn is_list_variable(value: &str) -> bool {
    value.starts_with("@{") && value.ends_with('}')
}

fn is_dict_variable(value: &str) -> bool {
    value.starts_with("&{") && value.ends_with('}')
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// `'a', 'b' and 'c'`
fn seq2str(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("'{i}'")).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
    }
}

struct Spec<'a> {
    name: String,
    positional_only: Vec<&'a ArgumentSpec>,
    positional_or_named: Vec<&'a ArgumentSpec>,
    var_positional: bool,
    named_only: Vec<&'a ArgumentSpec>,
    var_named: bool,
}

impl<'a> Spec<'a> {
    fn from_keyword(kw: &'a KeywordDoc) -> Self {
        let of = |kind: ArgumentKind| kw.args.iter().filter(move |a| a.kind == kind);
        Self {
            name: kw.full_name(),
            positional_only: of(ArgumentKind::PositionalOnly).collect(),
            positional_or_named: of(ArgumentKind::PositionalOrNamed).collect(),
            var_positional: of(ArgumentKind::VarPositional).next().is_some(),
            named_only: of(ArgumentKind::NamedOnly).collect(),
            var_named: of(ArgumentKind::VarNamed).next().is_some(),
        }
    }

    fn positional(&self) -> impl Iterator<Item = &&'a ArgumentSpec> {
        self.positional_only.iter().chain(self.positional_or_named.iter())
    }

    fn minargs(&self) -> usize {
        self.positional().filter(|a| a.default.is_none()).count()
    }

    fn maxargs(&self) -> Option<usize> {
        if self.var_positional {
            None
        } else {
            Some(self.positional().count())
        }
    }

    fn accepts_named(&self, name: &str) -> bool {
        self.positional_or_named.iter().chain(self.named_only.iter()).any(|a| a.name == name)
    }

    fn wrong_count(&self, count: usize) -> ArgumentError {
        let min = self.minargs();
        let mut expected = match self.maxargs() {
            Some(max) if max == min => format!("{min} argument{}", plural(min)),
            Some(max) => format!("{min} to {max} arguments"),
            None => format!("at least {min} argument{}", plural(min)),
        };
        if self.var_named || !self.named_only.is_empty() {
            expected = expected.replace("argument", "non-named argument");
        }
        ArgumentError::new(format!("Keyword '{}' expected {}, got {}.", self.name, expected, count))
    }
}

/// Call arguments split into positional values and `(name, value)` pairs.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResolvedArguments {
    pub positional: Vec<String>,
    pub named: Vec<(String, String)>,
}

pub fn resolve_named(kw: &KeywordDoc, args: &[&str]) -> Result<ResolvedArguments, ArgumentError> {
    let spec = Spec::from_keyword(kw);
    let known_positional = spec.positional_only.len().min(args.len());
    let mut resolved = ResolvedArguments {
        positional: args[..known_positional].iter().map(|a| a.to_string()).collect(),
        named: Vec::new(),
    };
    for arg in &args[known_positional..] {
        if is_dict_variable(arg) {
            resolved.named.push((arg.to_string(), String::new()));
            continue;
        }
        let named = split_from_equals(arg)
            .filter(|(name, _)| !resolved.named.is_empty() || spec.var_named || spec.accepts_named(name));
        match named {
            Some(pair) => resolved.named.push(pair),
            None if !resolved.named.is_empty() => {
                return Err(ArgumentError::new(format!(
                    "Keyword '{}' got positional argument after named arguments.",
                    spec.name
                )))
            }
            None => resolved.positional.push(arg.to_string()),
        }
    }
    Ok(resolved)
}

/// Check `args` the way a dry run would: list and dictionary variables
/// make the counts unknowable, so they skip the count checks.
pub fn validate_arguments(kw: &KeywordDoc, args: &[&str]) -> Result<(), ArgumentError> {
    let spec = Spec::from_keyword(kw);
    let resolved = resolve_named(kw, args)?;
    if resolved.positional.iter().any(|a| is_list_variable(a)) || resolved.named.iter().any(|(n, _)| is_dict_variable(n))
    {
        return Ok(());
    }
    let named: Vec<&str> = resolved.named.iter().map(|(n, _)| n.as_str()).collect();
    let positional: Vec<&&ArgumentSpec> = spec.positional().collect();

    for arg in positional.iter().take(resolved.positional.len()) {
        if named.contains(&arg.name.as_str()) && !spec.var_named {
            return Err(ArgumentError::new(format!(
                "Keyword '{}' got multiple values for argument '{}'.",
                spec.name, arg.name
            )));
        }
    }

    let mut positional_as_named: Vec<String> = spec
        .positional_only
        .iter()
        .filter(|a| named.contains(&a.name.as_str()))
        .map(|a| a.name.clone())
        .collect();
    if !spec.var_named && !positional_as_named.is_empty() {
        positional_as_named.sort();
        return Err(ArgumentError::new(format!(
            "Keyword '{}' does not accept argument{} {} as named argument{}.",
            spec.name,
            plural(positional_as_named.len()),
            seq2str(&positional_as_named),
            plural(positional_as_named.len())
        )));
    }

    let named_positionals = named
        .iter()
        .filter(|n| spec.positional_or_named.iter().any(|a| a.name == **n))
        .count();
    let count = resolved.positional.len() + named_positionals;
    let in_range = count >= spec.minargs() && spec.maxargs().map(|max| count <= max).unwrap_or(true);
    if !in_range {
        return Err(spec.wrong_count(count));
    }

    for arg in positional.iter().skip(resolved.positional.len()).take(spec.minargs().saturating_sub(resolved.positional.len())) {
        if arg.default.is_none() && !named.contains(&arg.name.as_str()) {
            return Err(ArgumentError::new(format!(
                "Keyword '{}' missing value for argument '{}'.",
                spec.name, arg.name
            )));
        }
    }

    let mut missing: Vec<String> = spec
        .named_only
        .iter()
        .filter(|a| a.default.is_none() && !named.contains(&a.name.as_str()))
        .map(|a| a.name.clone())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(ArgumentError::new(format!(
            "Keyword '{}' missing named-only argument{} {}.",
            spec.name,
            plural(missing.len()),
            seq2str(&missing)
        )));
    }

    if !spec.var_named {
        let mut extra: Vec<String> = named
            .iter()
            .filter(|n| !spec.accepts_named(n))
            .map(|n| n.to_string())
            .collect();
        if !extra.is_empty() {
            extra.sort();
            extra.dedup();
            return Err(ArgumentError::new(format!(
                "Keyword '{}' got unexpected named argument{} {}.",
                spec.name,
                plural(extra.len()),
                seq2str(&extra)
            )));
        }
    }
    Ok(())
}

/// The argument a `name=value` call argument binds to, if any.
pub fn named_argument<'a>(kw: &'a KeywordDoc, value: &str) -> Option<(&'a ArgumentSpec, usize)> {
    let (name, _) = split_from_equals(value)?;
    let arg = kw.args.iter().find(|a| {
        a.name == name && matches!(a.kind, ArgumentKind::PositionalOrNamed | ArgumentKind::NamedOnly)
    })?;
    Some((arg, name.chars().count()))
}
