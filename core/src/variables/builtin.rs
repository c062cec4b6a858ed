use std::path::{Path, MAIN_SEPARATOR};
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;

use super::{VariableDefinition, VariableType};
use crate::token::Range;

const PATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Names that exist during execution but whose value is only known then.
const RUNTIME_ONLY: &[&str] = &[
    "${TEST_NAME}",
    "@{TEST_TAGS}",
    "${TEST_DOCUMENTATION}",
    "${TEST_STATUS}",
    "${TEST_MESSAGE}",
    "${PREV_TEST_NAME}",
    "${PREV_TEST_STATUS}",
    "${PREV_TEST_MESSAGE}",
    "${SUITE_NAME}",
    "${SUITE_SOURCE}",
    "${SUITE_DOCUMENTATION}",
    "&{SUITE_METADATA}",
    "${SUITE_STATUS}",
    "${SUITE_MESSAGE}",
    "${KEYWORD_STATUS}",
    "${KEYWORD_MESSAGE}",
    "${LOG_LEVEL}",
    "${OUTPUT_FILE}",
    "${LOG_FILE}",
    "${REPORT_FILE}",
    "${DEBUG_FILE}",
    "${OUTPUT_DIR}",
    "${OPTIONS}",
];

fn builtin(name: &str, value: Option<Value>) -> Arc<VariableDefinition> {
    let def = VariableDefinition::new(name, VariableType::BuiltinVariable, Range::zero(), None);
    Arc::new(match value {
        Some(v) => def.with_value(v),
        None => def,
    })
}

static STATIC_BUILTINS: Lazy<Vec<Arc<VariableDefinition>>> = Lazy::new(|| {
    let temp = std::env::temp_dir().to_string_lossy().into_owned();
    let mut out = vec![
        builtin("${TEMPDIR}", Some(Value::String(temp))),
        builtin("${/}", Some(Value::String(MAIN_SEPARATOR.to_string()))),
        builtin("${:}", Some(Value::String(PATH_SEPARATOR.to_string()))),
        builtin("${\\n}", Some(Value::String("\n".to_string()))),
        builtin("${SPACE}", Some(Value::String(" ".to_string()))),
        builtin("${True}", Some(Value::Bool(true))),
        builtin("${False}", Some(Value::Bool(false))),
        builtin("${None}", Some(Value::Null)),
        builtin("${null}", Some(Value::Null)),
        builtin("${EMPTY}", Some(Value::String(String::new()))),
        builtin("@{EMPTY}", Some(Value::Array(Vec::new()))),
        builtin("&{EMPTY}", Some(Value::Object(Default::default()))),
    ];
    out.extend(RUNTIME_ONLY.iter().map(|name| builtin(name, None)));
    out
});

/// Builtin variables for a run started in `working_dir`.
///
/// `${CURDIR}` is not included: it is substituted per file by the parser
/// context, not looked up.
pub fn builtin_variables(working_dir: &Path) -> Vec<Arc<VariableDefinition>> {
    let mut out = Vec::with_capacity(STATIC_BUILTINS.len() + 1);
    out.push(builtin(
        "${EXECDIR}",
        Some(Value::String(working_dir.to_string_lossy().into_owned())),
    ));
    out.extend(STATIC_BUILTINS.iter().cloned());
    out
}

/// `${CURDIR}` for a file in `dir`.
pub fn curdir_variable(dir: &Path) -> Arc<VariableDefinition> {
    builtin("${CURDIR}", Some(Value::String(dir.to_string_lossy().into_owned())))
}

/// Number literals such as `${42}`, `${0x1F}`, `${1e3}` or `${0b101}`.
pub fn number_value(base: &str) -> Option<Value> {
    let text = base.trim().replace('_', "");
    if text.is_empty() {
        return None;
    }
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, text.clone()),
    };
    let radix = match digits.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let parsed = i64::from_str_radix(&digits[2..], radix).ok()?;
        return Some(Value::from(if negative { -parsed } else { parsed }));
    }
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::from(int));
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}
