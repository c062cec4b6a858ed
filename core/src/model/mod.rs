//! Parsed representation of a suite, resource or init file.

mod parser;
#[cfg(test)]
mod parser_test;
mod visitor;

use std::path::PathBuf;

use crate::token::{Position, Range, Token, TokenType};

pub use parser::{parse, parse_with_source};
pub use visitor::{walk_block, walk_file, Visitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    SectionHeader,
    Comment,
    Error,

    LibraryImport,
    ResourceImport,
    VariablesImport,
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

    Variable,

    TestCaseName,
    KeywordName,

    Setup,
    Teardown,
    Template,
    Timeout,
    Tags,
    Arguments,
    ReturnSetting,

    KeywordCall,
    TemplateArguments,

    ForHeader,
    IfHeader,
    InlineIfHeader,
    ElseIfHeader,
    ElseHeader,
    TryHeader,
    ExceptHeader,
    FinallyHeader,
    WhileHeader,
    End,
    Return,
    Break,
    Continue,
    Var,
}

impl StatementKind {
    pub fn is_fixture(self) -> bool {
        matches!(
            self,
            StatementKind::SuiteSetup
                | StatementKind::SuiteTeardown
                | StatementKind::TestSetup
                | StatementKind::TestTeardown
                | StatementKind::Setup
                | StatementKind::Teardown
        )
    }

    pub fn is_import(self) -> bool {
        matches!(
            self,
            StatementKind::LibraryImport | StatementKind::ResourceImport | StatementKind::VariablesImport
        )
    }

    pub fn is_tags(self) -> bool {
        matches!(
            self,
            StatementKind::ForceTags
                | StatementKind::DefaultTags
                | StatementKind::TestTags
                | StatementKind::KeywordTags
                | StatementKind::Tags
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub tokens: Vec<Token>,
    /// Parse errors that are not tied to a single token.
    pub errors: Vec<String>,
}

impl Statement {
    pub fn new(kind: StatementKind, tokens: Vec<Token>) -> Self {
        Self {
            kind,
            tokens,
            errors: Vec::new(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    /// One-based line of the first token.
    pub fn lineno(&self) -> u32 {
        self.tokens.first().map(|t| t.lineno).unwrap_or(1)
    }

    pub fn end_lineno(&self) -> u32 {
        self.tokens.iter().map(|t| t.lineno).max().unwrap_or(1)
    }

    pub fn range(&self) -> Range {
        let Some(first) = self.tokens.iter().find(|t| t.kind != TokenType::Comment).or(self.tokens.first()) else {
            return Range::zero();
        };
        let mut range = first.range();
        for token in self.tokens.iter().filter(|t| t.kind != TokenType::Comment) {
            range = range.extend(&token.range());
        }
        range
    }

    pub fn get_token(&self, kind: TokenType) -> Option<&Token> {
        self.tokens.iter().find(|t| t.kind == kind)
    }

    pub fn get_tokens(&self, kind: TokenType) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(move |t| t.kind == kind)
    }

    pub fn get_value(&self, kind: TokenType) -> Option<&str> {
        self.get_token(kind).map(|t| t.value.as_str())
    }

    pub fn values(&self, kind: TokenType) -> Vec<&str> {
        self.get_tokens(kind).map(|t| t.value.as_str()).collect()
    }

    /// First token carrying the name of the thing the statement refers to:
    /// the keyword of a call, the import name, the variable of a `VAR`.
    pub fn name_token(&self) -> Option<&Token> {
        match self.kind {
            StatementKind::KeywordCall => self.get_token(TokenType::Keyword),
            StatementKind::Variable | StatementKind::Var => self.get_token(TokenType::Variable),
            StatementKind::TestCaseName => self.get_token(TokenType::TestCaseName),
            StatementKind::KeywordName => self.get_token(TokenType::KeywordName),
            _ => self.get_token(TokenType::Name),
        }
    }

    pub fn arguments(&self) -> Vec<&Token> {
        self.get_tokens(TokenType::Argument).collect()
    }

    /// Import alias after `AS` / `WITH NAME`.
    pub fn alias_token(&self) -> Option<&Token> {
        let idx = self.tokens.iter().position(|t| t.kind == TokenType::WithName)?;
        self.tokens[idx + 1..].iter().find(|t| t.kind == TokenType::Name)
    }

    pub fn comment_tokens(&self) -> impl Iterator<Item = &Token> {
        self.get_tokens(TokenType::Comment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Settings,
    Variables,
    TestCases,
    Tasks,
    Keywords,
    Comments,
    /// Data before the first header, ignored like a comment section.
    Implicit,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Section(SectionKind),
    TestCase,
    Keyword,
    For,
    If,
    /// `ELSE IF` / `ELSE` branch of an `If` block.
    IfBranch,
    Try,
    /// `EXCEPT` / `ELSE` / `FINALLY` branch of a `Try` block.
    TryBranch,
    While,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Statement(Statement),
    Block(Block),
}

impl Node {
    pub fn range(&self) -> Range {
        match self {
            Node::Statement(s) => s.range(),
            Node::Block(b) => b.range(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub header: Option<Statement>,
    pub body: Vec<Node>,
    pub branches: Vec<Block>,
    pub end: Option<Statement>,
    pub errors: Vec<String>,
}

impl Block {
    pub fn new(kind: BlockKind, header: Option<Statement>) -> Self {
        Self {
            kind,
            header,
            body: Vec::new(),
            branches: Vec::new(),
            end: None,
            errors: Vec::new(),
        }
    }

    /// Name of a test case or keyword block.
    pub fn name(&self) -> Option<&str> {
        self.header.as_ref().and_then(|h| h.name_token()).map(|t| t.value.as_str())
    }

    pub fn range(&self) -> Range {
        let mut range: Option<Range> = self.header.as_ref().map(|h| h.range());
        let mut merge = |r: Range| {
            range = Some(match range {
                Some(current) => current.extend(&r),
                None => r,
            });
        };
        for node in &self.body {
            merge(node.range());
        }
        for branch in &self.branches {
            merge(branch.range());
        }
        if let Some(end) = &self.end {
            merge(end.range());
        }
        range.unwrap_or_else(Range::zero)
    }

    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.body.iter().filter_map(|n| match n {
            Node::Statement(s) => Some(s),
            Node::Block(_) => None,
        })
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.body.iter().filter_map(|n| match n {
            Node::Block(b) => Some(b),
            Node::Statement(_) => None,
        })
    }

    pub fn find_setting(&self, kind: StatementKind) -> Option<&Statement> {
        self.statements().find(|s| s.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct File {
    pub source: Option<PathBuf>,
    pub sections: Vec<Block>,
}

impl File {
    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &Block> {
        self.sections.iter().filter(move |s| s.kind == BlockKind::Section(kind))
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.sections_of(kind).next().is_some()
    }

    /// Test case and task blocks in file order.
    pub fn test_cases(&self) -> impl Iterator<Item = &Block> {
        self.sections
            .iter()
            .filter(|s| {
                matches!(
                    s.kind,
                    BlockKind::Section(SectionKind::TestCases) | BlockKind::Section(SectionKind::Tasks)
                )
            })
            .flat_map(|s| s.blocks())
    }

    pub fn keywords(&self) -> impl Iterator<Item = &Block> {
        self.sections_of(SectionKind::Keywords).flat_map(|s| s.blocks())
    }

    pub fn settings(&self) -> impl Iterator<Item = &Statement> {
        self.sections_of(SectionKind::Settings).flat_map(|s| s.statements())
    }

    pub fn variable_statements(&self) -> impl Iterator<Item = &Statement> {
        self.sections_of(SectionKind::Variables)
            .flat_map(|s| s.statements())
            .filter(|s| s.kind == StatementKind::Variable)
    }

    /// Innermost test case or keyword block containing `pos`.
    pub fn block_at(&self, pos: Position) -> Option<&Block> {
        self.test_cases()
            .chain(self.keywords())
            .find(|b| b.range().start.line <= pos.line && pos.line <= b.range().end.line)
    }
}
