mod lexer;
#[cfg(test)]
mod lexer_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::variables::search::{search_variable, VariableMatch};

pub use lexer::{split_lines, Cell, Line};

/// Zero-based line and UTF-32 column.
///
/// All positions inside the core count Unicode scalar values; the server
/// converts to UTF-16 only when talking to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub const fn zero() -> Self {
        Self {
            start: Position::new(0, 0),
            end: Position::new(0, 0),
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Half-open containment, used when mapping a cursor to a token.
    pub fn contains_exclusive(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn extend(&self, other: &Range) -> Range {
        Range::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Token categories produced by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    SettingHeader,
    VariableHeader,
    TestCaseHeader,
    TaskHeader,
    KeywordHeader,
    CommentHeader,
    InvalidHeader,

    TestCaseName,
    KeywordName,

    Documentation,
    Metadata,
    SuiteSetup,
    SuiteTeardown,
    TestSetup,
    TestTeardown,
    TestTemplate,
    TestTimeout,
    ForceTags,
    DefaultTags,
    TestTags,
    KeywordTags,
    Library,
    Resource,
    Variables,
    Setup,
    Teardown,
    Template,
    Timeout,
    Tags,
    Arguments,
    ReturnSetting,

    Name,
    Variable,
    Argument,
    Assign,
    Keyword,
    WithName,
    Option,

    For,
    ForSeparator,
    End,
    If,
    InlineIf,
    ElseIf,
    Else,
    Try,
    Except,
    Finally,
    As,
    While,
    Return,
    Continue,
    Break,
    Var,

    Comment,
    Error,
}

impl TokenType {
    /// Token kinds whose value may contain `${...}` references that the
    /// analyzer resolves.
    pub fn can_contain_variables(self) -> bool {
        matches!(
            self,
            TokenType::Name
                | TokenType::Argument
                | TokenType::Keyword
                | TokenType::Assign
                | TokenType::Variable
                | TokenType::Option
                | TokenType::TestCaseName
                | TokenType::KeywordName
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenType,
    pub value: String,
    /// One-based line number.
    pub lineno: u32,
    /// UTF-32 column where the token starts.
    pub col_offset: u32,
    pub end_col_offset: u32,
    pub error: Option<String>,
}

impl Token {
    pub fn new(kind: TokenType, value: impl Into<String>, lineno: u32, col_offset: u32) -> Self {
        let value = value.into();
        let end_col_offset = col_offset + value.chars().count() as u32;
        Self {
            kind,
            value,
            lineno,
            col_offset,
            end_col_offset,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn range(&self) -> Range {
        let line = self.lineno.saturating_sub(1);
        Range::new(
            Position::new(line, self.col_offset),
            Position::new(line, self.end_col_offset),
        )
    }

    /// Split the token around every variable occurrence.
    ///
    /// Literal fragments keep the token's own kind; each `${...}`, `@{...}`,
    /// `&{...}` or `%{...}` becomes a `Variable` token positioned at the
    /// occurrence. Tokens whose kind never carries variables are returned
    /// unchanged.
    pub fn tokenize_variables(&self) -> Vec<Token> {
        if !self.kind.can_contain_variables() || self.error.is_some() {
            return vec![self.clone()];
        }
        let mut out = Vec::new();
        let chars: Vec<char> = self.value.chars().collect();
        let mut offset = 0usize;
        let mut rest: &[char] = &chars;
        while let Some(found) = search_variable(rest) {
            let VariableMatch { start, end, .. } = found;
            if start > 0 {
                out.push(self.sub_token(self.kind, &rest[..start], offset));
            }
            out.push(self.sub_token(TokenType::Variable, &rest[start..end], offset + start));
            offset += end;
            rest = &rest[end..];
        }
        if out.is_empty() {
            return vec![self.clone()];
        }
        if !rest.is_empty() {
            out.push(self.sub_token(self.kind, rest, offset));
        }
        out
    }

    fn sub_token(&self, kind: TokenType, chars: &[char], offset: usize) -> Token {
        let value: String = chars.iter().collect();
        Token::new(kind, value, self.lineno, self.col_offset + offset as u32)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})@{}:{}", self.kind, self.value, self.lineno, self.col_offset)
    }
}
