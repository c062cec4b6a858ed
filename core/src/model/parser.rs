//! Builds the block/statement model from split lines.

use std::path::PathBuf;

use super::{Block, BlockKind, File, Node, SectionKind, Statement, StatementKind};
use crate::token::{split_lines, Line, Token, TokenType};
use crate::variables::search::{is_assign, strip_assign_mark};

#[derive(Debug, Clone)]
struct RawCell {
    value: String,
    lineno: u32,
    col: u32,
}

impl RawCell {
    fn token(&self, kind: TokenType) -> Token {
        Token::new(kind, self.value.clone(), self.lineno, self.col)
    }
}

/// A statement's worth of cells after `...` continuation lines are joined.
#[derive(Debug, Default)]
struct LogicalLine {
    indented: bool,
    header: bool,
    cells: Vec<RawCell>,
    comments: Vec<Token>,
}

fn raw_cells(line: &Line) -> Vec<RawCell> {
    line.cells
        .iter()
        .map(|c| RawCell {
            value: c.value.clone(),
            lineno: line.lineno,
            col: c.col,
        })
        .collect()
}

fn comment_token(line: &Line) -> Option<Token> {
    line.comment
        .as_ref()
        .map(|c| Token::new(TokenType::Comment, c.value.clone(), line.lineno, c.col))
}

fn is_header_line(line: &Line) -> bool {
    !line.indented && line.cells.first().map(|c| c.value.starts_with('*')).unwrap_or(false)
}

fn logical_lines(text: &str) -> Vec<LogicalLine> {
    let mut out: Vec<LogicalLine> = Vec::new();
    for line in split_lines(text) {
        if line.is_empty() {
            continue;
        }
        if line.is_continuation() {
            if let Some(prev) = out.last_mut().filter(|p| !p.header && !p.cells.is_empty()) {
                prev.cells.extend(raw_cells(&line).into_iter().skip(1));
                prev.comments.extend(comment_token(&line));
                continue;
            }
        }
        out.push(LogicalLine {
            indented: line.indented,
            header: is_header_line(&line),
            cells: raw_cells(&line),
            comments: comment_token(&line).into_iter().collect(),
        });
    }
    out
}

pub fn parse(text: &str) -> File {
    parse_with_source(text, None)
}

pub fn parse_with_source(text: &str, source: Option<PathBuf>) -> File {
    let mut parser = FileParser::default();
    for line in logical_lines(text) {
        parser.feed(line);
    }
    let mut file = parser.finish();
    file.source = source;
    apply_templates(&mut file);
    file
}

#[derive(Default)]
struct FileParser {
    sections: Vec<Block>,
    section: Option<Block>,
    item: Option<ItemBuilder>,
}

impl FileParser {
    fn section_kind(&self) -> SectionKind {
        match self.section.as_ref().map(|s| s.kind) {
            Some(BlockKind::Section(kind)) => kind,
            _ => SectionKind::Implicit,
        }
    }

    fn feed(&mut self, line: LogicalLine) {
        if line.header {
            self.close_section();
            self.section = Some(parse_header(line));
            return;
        }
        if self.section.is_none() {
            let header = None;
            self.section = Some(Block::new(BlockKind::Section(SectionKind::Implicit), header));
        }

        let kind = self.section_kind();
        match kind {
            SectionKind::Settings => {
                let statement = parse_setting(line);
                self.push_section_node(Node::Statement(statement));
            }
            SectionKind::Variables => {
                let statement = parse_variable(line);
                self.push_section_node(Node::Statement(statement));
            }
            SectionKind::TestCases | SectionKind::Tasks | SectionKind::Keywords => {
                self.feed_item_line(line, kind == SectionKind::Keywords);
            }
            SectionKind::Comments | SectionKind::Implicit | SectionKind::Invalid => {
                let statement = comment_statement(line);
                self.push_section_node(Node::Statement(statement));
            }
        }
    }

    fn feed_item_line(&mut self, mut line: LogicalLine, is_keyword: bool) {
        if line.cells.is_empty() {
            let statement = comment_statement(line);
            match self.item.as_mut() {
                Some(item) => item.push(statement),
                None => self.push_section_node(Node::Statement(statement)),
            }
            return;
        }

        if !line.indented {
            self.close_item();
            let name_cell = line.cells.remove(0);
            let (kind, token_kind) = if is_keyword {
                (StatementKind::KeywordName, TokenType::KeywordName)
            } else {
                (StatementKind::TestCaseName, TokenType::TestCaseName)
            };
            let mut tokens = vec![name_cell.token(token_kind)];
            if line.cells.is_empty() {
                tokens.append(&mut line.comments);
            }
            let header = Statement::new(kind, tokens);
            let block_kind = if is_keyword { BlockKind::Keyword } else { BlockKind::TestCase };
            let mut item = ItemBuilder::new(Block::new(block_kind, Some(header)), is_keyword);
            if !line.cells.is_empty() {
                item.push_line(line);
            }
            self.item = Some(item);
            return;
        }

        match self.item.as_mut() {
            Some(item) => item.push_line(line),
            None => {
                let statement = error_statement(line, "Statement is not inside a test case or keyword.");
                self.push_section_node(Node::Statement(statement));
            }
        }
    }

    fn push_section_node(&mut self, node: Node) {
        if let Some(section) = self.section.as_mut() {
            section.body.push(node);
        }
    }

    fn close_item(&mut self) {
        if let Some(item) = self.item.take() {
            let block = item.finish();
            self.push_section_node(Node::Block(block));
        }
    }

    fn close_section(&mut self) {
        self.close_item();
        if let Some(section) = self.section.take() {
            self.sections.push(section);
        }
    }

    fn finish(mut self) -> File {
        self.close_section();
        File {
            source: None,
            sections: self.sections,
        }
    }
}

fn parse_header(line: LogicalLine) -> Block {
    let cell = &line.cells[0];
    let name: String = cell.value.trim_matches(|c: char| c == '*' || c.is_whitespace()).to_string();
    let normalized = name.to_lowercase();
    let (section, token_kind) = match normalized.as_str() {
        "settings" | "setting" => (SectionKind::Settings, TokenType::SettingHeader),
        "variables" | "variable" => (SectionKind::Variables, TokenType::VariableHeader),
        "test cases" | "test case" => (SectionKind::TestCases, TokenType::TestCaseHeader),
        "tasks" | "task" => (SectionKind::Tasks, TokenType::TaskHeader),
        "keywords" | "keyword" => (SectionKind::Keywords, TokenType::KeywordHeader),
        "comments" | "comment" => (SectionKind::Comments, TokenType::CommentHeader),
        _ => (SectionKind::Invalid, TokenType::InvalidHeader),
    };
    let mut tokens = vec![cell.token(token_kind)];
    tokens.extend(line.comments);
    let mut header = Statement::new(StatementKind::SectionHeader, tokens);
    if section == SectionKind::Invalid {
        header = header.with_error(format!(
            "Unrecognized section header '{}'. Valid sections: 'Settings', 'Variables', 'Test Cases', 'Tasks', 'Keywords' and 'Comments'.",
            cell.value
        ));
    }
    Block::new(BlockKind::Section(section), Some(header))
}

fn comment_statement(line: LogicalLine) -> Statement {
    let mut tokens: Vec<Token> = line.cells.iter().map(|c| c.token(TokenType::Comment)).collect();
    tokens.extend(line.comments);
    Statement::new(StatementKind::Comment, tokens)
}

fn error_statement(line: LogicalLine, message: &str) -> Statement {
    let mut tokens: Vec<Token> = line.cells.iter().map(|c| c.token(TokenType::Error)).collect();
    tokens.extend(line.comments);
    Statement::new(StatementKind::Error, tokens).with_error(message)
}

fn normalize_setting(value: &str) -> String {
    value
        .trim_end_matches(':')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn parse_setting(line: LogicalLine) -> Statement {
    let LogicalLine { cells, comments, .. } = line;
    let Some(first) = cells.first() else {
        return Statement::new(StatementKind::Comment, comments);
    };
    let rest = &cells[1..];
    let setting = normalize_setting(&first.value);

    let mut statement = match setting.as_str() {
        "library" => import_statement(StatementKind::LibraryImport, TokenType::Library, first, rest, true),
        "resource" => {
            let mut s = import_statement(StatementKind::ResourceImport, TokenType::Resource, first, rest, false);
            if rest.len() > 1 {
                s = s.with_error("Setting 'Resource' accepts only one value.");
            }
            s
        }
        "variables" => import_statement(StatementKind::VariablesImport, TokenType::Variables, first, rest, false),
        "documentation" => simple(StatementKind::Documentation, TokenType::Documentation, first, rest),
        "metadata" => named(StatementKind::Metadata, TokenType::Metadata, first, rest),
        "suite setup" => named(StatementKind::SuiteSetup, TokenType::SuiteSetup, first, rest),
        "suite teardown" => named(StatementKind::SuiteTeardown, TokenType::SuiteTeardown, first, rest),
        "test setup" | "task setup" => named(StatementKind::TestSetup, TokenType::TestSetup, first, rest),
        "test teardown" | "task teardown" => named(StatementKind::TestTeardown, TokenType::TestTeardown, first, rest),
        "test template" | "task template" => named(StatementKind::TestTemplate, TokenType::TestTemplate, first, rest),
        "test timeout" | "task timeout" => simple(StatementKind::TestTimeout, TokenType::TestTimeout, first, rest),
        "force tags" => simple(StatementKind::ForceTags, TokenType::ForceTags, first, rest),
        "default tags" => simple(StatementKind::DefaultTags, TokenType::DefaultTags, first, rest),
        "test tags" | "task tags" => simple(StatementKind::TestTags, TokenType::TestTags, first, rest),
        "keyword tags" => simple(StatementKind::KeywordTags, TokenType::KeywordTags, first, rest),
        _ => {
            let tokens = cells.iter().map(|c| c.token(TokenType::Error)).collect();
            Statement::new(StatementKind::Error, tokens)
                .with_error(format!("Non-existing setting '{}'.", first.value))
        }
    };
    statement.tokens.extend(comments);
    statement
}

fn simple(kind: StatementKind, token_kind: TokenType, first: &RawCell, rest: &[RawCell]) -> Statement {
    let mut tokens = vec![first.token(token_kind)];
    tokens.extend(rest.iter().map(|c| c.token(TokenType::Argument)));
    Statement::new(kind, tokens)
}

/// `Setting    Name    arg    arg`
fn named(kind: StatementKind, token_kind: TokenType, first: &RawCell, rest: &[RawCell]) -> Statement {
    let mut tokens = vec![first.token(token_kind)];
    if let Some((name, args)) = rest.split_first() {
        tokens.push(name.token(TokenType::Name));
        tokens.extend(args.iter().map(|c| c.token(TokenType::Argument)));
    }
    Statement::new(kind, tokens)
}

fn import_statement(
    kind: StatementKind,
    token_kind: TokenType,
    first: &RawCell,
    rest: &[RawCell],
    allow_alias: bool,
) -> Statement {
    let mut tokens = vec![first.token(token_kind)];
    let Some((name, args)) = rest.split_first() else {
        return Statement::new(kind, tokens);
    };
    tokens.push(name.token(TokenType::Name));
    let mut iter = args.iter();
    while let Some(cell) = iter.next() {
        if allow_alias && (cell.value == "AS" || cell.value == "WITH NAME") {
            tokens.push(cell.token(TokenType::WithName));
            if let Some(alias) = iter.next() {
                tokens.push(alias.token(TokenType::Name));
            }
            tokens.extend(iter.by_ref().map(|c| c.token(TokenType::Error)));
            break;
        }
        tokens.push(cell.token(TokenType::Argument));
    }
    Statement::new(kind, tokens)
}

fn parse_variable(line: LogicalLine) -> Statement {
    let LogicalLine { cells, comments, .. } = line;
    let Some(first) = cells.first() else {
        return Statement::new(StatementKind::Comment, comments);
    };
    let mut statement = if is_assign(&first.value, false) {
        let name = strip_assign_mark(&first.value).to_string();
        let mut tokens = vec![Token::new(TokenType::Variable, name, first.lineno, first.col)];
        tokens.extend(cells[1..].iter().map(|c| c.token(TokenType::Argument)));
        Statement::new(StatementKind::Variable, tokens)
    } else {
        let tokens = cells.iter().map(|c| c.token(TokenType::Error)).collect();
        Statement::new(StatementKind::Error, tokens).with_error(format!("Invalid variable name '{}'.", first.value))
    };
    statement.tokens.extend(comments);
    statement
}

/// Accumulates the body of one test case or keyword, tracking open control
/// structures on a stack.
struct ItemBuilder {
    block: Block,
    stack: Vec<Block>,
    is_keyword: bool,
}

impl ItemBuilder {
    fn new(block: Block, is_keyword: bool) -> Self {
        Self {
            block,
            stack: Vec::new(),
            is_keyword,
        }
    }

    fn push_line(&mut self, line: LogicalLine) {
        let is_keyword = self.is_keyword;
        match classify_body_line(line, is_keyword) {
            Classified::Statement(statement) => self.push(statement),
            Classified::InlineIf(block) => self.push_node(Node::Block(block)),
        }
    }

    fn push_node(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(top) => top.body.push(node),
            None => self.block.body.push(node),
        }
    }

    fn top_kind(&self) -> Option<BlockKind> {
        self.stack.last().map(|b| b.kind)
    }

    /// Pop an open branch into its parent's branch list.
    fn fold_branch(&mut self) {
        if matches!(self.top_kind(), Some(BlockKind::IfBranch | BlockKind::TryBranch)) {
            if let Some(branch) = self.stack.pop() {
                if let Some(parent) = self.stack.last_mut() {
                    parent.branches.push(branch);
                }
            }
        }
    }

    /// Kind of the innermost open compound block, skipping branches.
    fn open_compound(&self) -> Option<BlockKind> {
        self.stack
            .iter()
            .rev()
            .map(|b| b.kind)
            .find(|k| !matches!(k, BlockKind::IfBranch | BlockKind::TryBranch))
    }

    fn push(&mut self, statement: Statement) {
        match statement.kind {
            StatementKind::ForHeader => self.stack.push(Block::new(BlockKind::For, Some(statement))),
            StatementKind::WhileHeader => self.stack.push(Block::new(BlockKind::While, Some(statement))),
            StatementKind::IfHeader => self.stack.push(Block::new(BlockKind::If, Some(statement))),
            StatementKind::TryHeader => self.stack.push(Block::new(BlockKind::Try, Some(statement))),
            StatementKind::ElseIfHeader | StatementKind::ElseHeader
                if self.open_compound() == Some(BlockKind::If) =>
            {
                self.fold_branch();
                self.stack.push(Block::new(BlockKind::IfBranch, Some(statement)));
            }
            StatementKind::ElseHeader | StatementKind::ExceptHeader | StatementKind::FinallyHeader
                if self.open_compound() == Some(BlockKind::Try) =>
            {
                self.fold_branch();
                self.stack.push(Block::new(BlockKind::TryBranch, Some(statement)));
            }
            StatementKind::ElseIfHeader
            | StatementKind::ElseHeader
            | StatementKind::ExceptHeader
            | StatementKind::FinallyHeader => {
                let marker = statement.tokens.first().map(|t| t.value.clone()).unwrap_or_default();
                let statement = Statement {
                    kind: StatementKind::Error,
                    ..statement
                }
                .with_error(format!("{marker} is not allowed in this context."));
                self.push_node(Node::Statement(statement));
            }
            StatementKind::End => {
                self.fold_branch();
                match self.stack.pop() {
                    Some(mut block) => {
                        block.end = Some(statement);
                        self.push_node(Node::Block(block));
                    }
                    None => {
                        let statement = Statement {
                            kind: StatementKind::Error,
                            ..statement
                        }
                        .with_error("END is not allowed in this context.");
                        self.push_node(Node::Statement(statement));
                    }
                }
            }
            _ => self.push_node(Node::Statement(statement)),
        }
    }

    fn finish(mut self) -> Block {
        while !self.stack.is_empty() {
            self.fold_branch();
            if let Some(mut block) = self.stack.pop() {
                let what = match block.kind {
                    BlockKind::For => "FOR loop",
                    BlockKind::While => "WHILE loop",
                    BlockKind::If => "IF",
                    BlockKind::Try => "TRY",
                    _ => "Block",
                };
                block.errors.push(format!("{what} must have closing END."));
                self.push_node(Node::Block(block));
            }
        }
        self.block
    }
}

enum Classified {
    Statement(Statement),
    InlineIf(Block),
}

fn control_marker(value: &str) -> Option<&'static str> {
    match value {
        "FOR" => Some("FOR"),
        "WHILE" => Some("WHILE"),
        "IF" => Some("IF"),
        "ELSE IF" => Some("ELSE IF"),
        "ELSE" => Some("ELSE"),
        "TRY" => Some("TRY"),
        "EXCEPT" => Some("EXCEPT"),
        "FINALLY" => Some("FINALLY"),
        "END" => Some("END"),
        "RETURN" => Some("RETURN"),
        "BREAK" => Some("BREAK"),
        "CONTINUE" => Some("CONTINUE"),
        "VAR" => Some("VAR"),
        _ => None,
    }
}

fn classify_body_line(line: LogicalLine, is_keyword: bool) -> Classified {
    let LogicalLine { cells, comments, .. } = line;
    let mut classified = classify_cells(&cells, is_keyword);
    match &mut classified {
        Classified::Statement(statement) => statement.tokens.extend(comments),
        Classified::InlineIf(block) => {
            if let Some(header) = block.header.as_mut() {
                header.tokens.extend(comments);
            }
        }
    }
    classified
}

fn classify_cells(cells: &[RawCell], is_keyword: bool) -> Classified {
    let first = &cells[0];
    let value = first.value.as_str();

    if value.starts_with('[') && value.ends_with(']') && value.len() > 1 {
        return Classified::Statement(parse_item_setting(cells, is_keyword));
    }

    let assign_count = cells.iter().take_while(|c| is_assign(&c.value, true)).count();
    if assign_count > 0 && cells.get(assign_count).map(|c| c.value == "IF").unwrap_or(false) {
        return Classified::InlineIf(parse_inline_if(cells, assign_count, is_keyword));
    }

    match control_marker(value) {
        Some("FOR") => Classified::Statement(parse_for_header(cells)),
        Some("WHILE") => Classified::Statement(parse_condition_header(
            StatementKind::WhileHeader,
            TokenType::While,
            cells,
            "WHILE loop must have a condition.",
        )),
        Some("IF") if cells.len() > 2 => Classified::InlineIf(parse_inline_if(cells, 0, is_keyword)),
        Some("IF") => Classified::Statement(parse_condition_header(
            StatementKind::IfHeader,
            TokenType::If,
            cells,
            "IF must have a condition.",
        )),
        Some("ELSE IF") => Classified::Statement(parse_condition_header(
            StatementKind::ElseIfHeader,
            TokenType::ElseIf,
            cells,
            "ELSE IF must have a condition.",
        )),
        Some("ELSE") => Classified::Statement(marker_only(StatementKind::ElseHeader, TokenType::Else, cells)),
        Some("TRY") => Classified::Statement(marker_only(StatementKind::TryHeader, TokenType::Try, cells)),
        Some("EXCEPT") => Classified::Statement(parse_except(cells)),
        Some("FINALLY") => Classified::Statement(marker_only(StatementKind::FinallyHeader, TokenType::Finally, cells)),
        Some("END") => Classified::Statement(marker_only(StatementKind::End, TokenType::End, cells)),
        Some("BREAK") => Classified::Statement(marker_only(StatementKind::Break, TokenType::Break, cells)),
        Some("CONTINUE") => Classified::Statement(marker_only(StatementKind::Continue, TokenType::Continue, cells)),
        Some("RETURN") => {
            let mut tokens = vec![first.token(TokenType::Return)];
            tokens.extend(cells[1..].iter().map(|c| c.token(TokenType::Argument)));
            Classified::Statement(Statement::new(StatementKind::Return, tokens))
        }
        Some("VAR") => Classified::Statement(parse_var(cells)),
        _ => Classified::Statement(parse_keyword_call(cells, assign_count)),
    }
}

fn marker_only(kind: StatementKind, token_kind: TokenType, cells: &[RawCell]) -> Statement {
    let mut tokens = vec![cells[0].token(token_kind)];
    tokens.extend(cells[1..].iter().map(|c| c.token(TokenType::Error)));
    let mut statement = Statement::new(kind, tokens);
    if cells.len() > 1 {
        statement = statement.with_error(format!("{} does not accept arguments.", cells[0].value));
    }
    statement
}

fn parse_condition_header(kind: StatementKind, token_kind: TokenType, cells: &[RawCell], missing: &str) -> Statement {
    let mut tokens = vec![cells[0].token(token_kind)];
    let mut iter = cells[1..].iter();
    if let Some(condition) = iter.next() {
        tokens.push(condition.token(TokenType::Argument));
    }
    for cell in iter {
        let kind = if cell.value.contains('=') { TokenType::Option } else { TokenType::Error };
        tokens.push(cell.token(kind));
    }
    let mut statement = Statement::new(kind, tokens);
    if cells.len() < 2 {
        statement = statement.with_error(missing);
    }
    statement
}

fn for_separator(value: &str) -> bool {
    let collapsed: String = value.split_whitespace().collect::<Vec<_>>().join(" ");
    matches!(collapsed.as_str(), "IN" | "IN RANGE" | "IN ENUMERATE" | "IN ZIP")
}

fn parse_for_header(cells: &[RawCell]) -> Statement {
    let mut tokens = vec![cells[0].token(TokenType::For)];
    let mut errors = Vec::new();
    let separator_idx = cells.iter().position(|c| for_separator(&c.value));
    let var_end = separator_idx.unwrap_or(cells.len());
    for cell in &cells[1..var_end] {
        tokens.push(cell.token(TokenType::Variable));
    }
    if var_end <= 1 {
        errors.push("FOR loop has no loop variables.".to_string());
    }
    match separator_idx {
        Some(idx) => {
            let separator = &cells[idx];
            tokens.push(separator.token(TokenType::ForSeparator));
            let allows_options = separator.value != "IN" && separator.value != "IN RANGE";
            for cell in &cells[idx + 1..] {
                let is_option = allows_options
                    && ["start=", "mode=", "fill="].iter().any(|p| cell.value.starts_with(p));
                tokens.push(cell.token(if is_option { TokenType::Option } else { TokenType::Argument }));
            }
            if idx + 1 >= cells.len() {
                errors.push("FOR loop has no loop values.".to_string());
            }
        }
        None => errors.push("FOR loop has no 'IN' or other valid separator.".to_string()),
    }
    let mut statement = Statement::new(StatementKind::ForHeader, tokens);
    statement.errors = errors;
    statement
}

fn parse_except(cells: &[RawCell]) -> Statement {
    let mut tokens = vec![cells[0].token(TokenType::Except)];
    let mut iter = cells[1..].iter();
    while let Some(cell) = iter.next() {
        if cell.value == "AS" {
            tokens.push(cell.token(TokenType::As));
            if let Some(var) = iter.next() {
                tokens.push(var.token(TokenType::Variable));
            }
            tokens.extend(iter.by_ref().map(|c| c.token(TokenType::Error)));
            break;
        }
        let kind = if cell.value.starts_with("type=") {
            TokenType::Option
        } else {
            TokenType::Argument
        };
        tokens.push(cell.token(kind));
    }
    Statement::new(StatementKind::ExceptHeader, tokens)
}

fn parse_var(cells: &[RawCell]) -> Statement {
    let mut tokens = vec![cells[0].token(TokenType::Var)];
    let Some(name) = cells.get(1) else {
        return Statement::new(StatementKind::Var, tokens).with_error("VAR requires a variable name.");
    };
    let name_value = strip_assign_mark(&name.value).to_string();
    let mut errors = Vec::new();
    if !is_assign(&name.value, false) {
        errors.push(format!("Invalid variable name '{}'.", name.value));
    }
    tokens.push(Token::new(TokenType::Variable, name_value, name.lineno, name.col));
    for cell in &cells[2..] {
        let is_option = cell.value.starts_with("scope=") || cell.value.starts_with("separator=");
        tokens.push(cell.token(if is_option { TokenType::Option } else { TokenType::Argument }));
    }
    let mut statement = Statement::new(StatementKind::Var, tokens);
    statement.errors = errors;
    statement
}

fn parse_keyword_call(cells: &[RawCell], assign_count: usize) -> Statement {
    let mut tokens: Vec<Token> = cells[..assign_count].iter().map(|c| c.token(TokenType::Assign)).collect();
    let rest = &cells[assign_count..];
    match rest.split_first() {
        Some((keyword, args)) => {
            tokens.push(keyword.token(TokenType::Keyword));
            tokens.extend(args.iter().map(|c| c.token(TokenType::Argument)));
            Statement::new(StatementKind::KeywordCall, tokens)
        }
        None => Statement::new(StatementKind::KeywordCall, tokens),
    }
}

fn parse_inline_if(cells: &[RawCell], assign_count: usize, is_keyword: bool) -> Block {
    let mut header_tokens: Vec<Token> = cells[..assign_count].iter().map(|c| c.token(TokenType::Assign)).collect();
    let if_cell = &cells[assign_count];
    header_tokens.push(if_cell.token(TokenType::InlineIf));
    let mut idx = assign_count + 1;
    if let Some(condition) = cells.get(idx) {
        header_tokens.push(condition.token(TokenType::Argument));
        idx += 1;
    }

    // Split the remaining cells into branches at ELSE IF / ELSE.
    let mut segments: Vec<(Option<&RawCell>, Vec<RawCell>)> = vec![(None, Vec::new())];
    for cell in &cells[idx..] {
        if cell.value == "ELSE IF" || cell.value == "ELSE" {
            segments.push((Some(cell), Vec::new()));
        } else if let Some(last) = segments.last_mut() {
            last.1.push(cell.clone());
        }
    }

    let mut header = Statement::new(StatementKind::InlineIfHeader, header_tokens);
    let mut block_errors = Vec::new();
    let mut branches = Vec::new();
    let mut body = Vec::new();
    for (n, (marker, segment)) in segments.into_iter().enumerate() {
        if n == 0 {
            if segment.is_empty() {
                block_errors.push("Inline IF branches cannot be empty.".to_string());
            } else {
                body.push(inline_branch_node(&segment, is_keyword));
            }
            continue;
        }
        let Some(marker) = marker else { continue };
        let mut branch_cells = segment;
        let branch_header = if marker.value == "ELSE IF" {
            let mut tokens = vec![marker.token(TokenType::ElseIf)];
            if !branch_cells.is_empty() {
                tokens.push(branch_cells.remove(0).token(TokenType::Argument));
            }
            Statement::new(StatementKind::ElseIfHeader, tokens)
        } else {
            Statement::new(StatementKind::ElseHeader, vec![marker.token(TokenType::Else)])
        };
        let mut branch = Block::new(BlockKind::IfBranch, Some(branch_header));
        if branch_cells.is_empty() {
            branch.errors.push("Inline IF branches cannot be empty.".to_string());
        } else {
            branch.body.push(inline_branch_node(&branch_cells, is_keyword));
        }
        branches.push(branch);
    }
    if header.tokens.iter().all(|t| t.kind != TokenType::Argument) {
        header = header.with_error("IF must have a condition.");
    }

    let mut block = Block::new(BlockKind::If, Some(header));
    block.body = body;
    block.branches = branches;
    block.errors = block_errors;
    block
}

fn inline_branch_node(cells: &[RawCell], is_keyword: bool) -> Node {
    match classify_cells(cells, is_keyword) {
        Classified::Statement(statement) => Node::Statement(statement),
        Classified::InlineIf(block) => Node::Block(block),
    }
}

fn parse_item_setting(cells: &[RawCell], is_keyword: bool) -> Statement {
    let first = &cells[0];
    let rest = &cells[1..];
    let inner = normalize_setting(first.value.trim_start_matches('[').trim_end_matches(']'));
    let statement = match inner.as_str() {
        "documentation" => simple(StatementKind::Documentation, TokenType::Documentation, first, rest),
        "tags" => simple(StatementKind::Tags, TokenType::Tags, first, rest),
        "setup" => named(StatementKind::Setup, TokenType::Setup, first, rest),
        "teardown" => named(StatementKind::Teardown, TokenType::Teardown, first, rest),
        "timeout" => simple(StatementKind::Timeout, TokenType::Timeout, first, rest),
        "template" => named(StatementKind::Template, TokenType::Template, first, rest),
        "arguments" => simple(StatementKind::Arguments, TokenType::Arguments, first, rest),
        "return" => simple(StatementKind::ReturnSetting, TokenType::ReturnSetting, first, rest),
        _ => {
            let tokens = cells.iter().map(|c| c.token(TokenType::Error)).collect();
            return Statement::new(StatementKind::Error, tokens)
                .with_error(format!("Non-existing setting '{}'.", first.value));
        }
    };

    let misplaced = match statement.kind {
        StatementKind::Arguments | StatementKind::ReturnSetting if !is_keyword => Some("tests or tasks"),
        StatementKind::Setup | StatementKind::Template if is_keyword => Some("keywords"),
        _ => None,
    };
    match misplaced {
        Some(context) => statement.with_error(format!(
            "Setting '{}' is not allowed with {}.",
            first.value.trim_start_matches('[').trim_end_matches(']'),
            context
        )),
        None => statement,
    }
}

/// Template bodies consist of argument rows rather than keyword calls.
fn apply_templates(file: &mut File) {
    let suite_template: Option<String> = file
        .settings()
        .find(|s| s.kind == StatementKind::TestTemplate)
        .and_then(|s| s.get_value(TokenType::Name))
        .map(str::to_string);

    for section in file.sections.iter_mut() {
        if !matches!(
            section.kind,
            BlockKind::Section(SectionKind::TestCases) | BlockKind::Section(SectionKind::Tasks)
        ) {
            continue;
        }
        for node in section.body.iter_mut() {
            let Node::Block(test) = node else { continue };
            let own = test
                .find_setting(StatementKind::Template)
                .map(|s| s.get_value(TokenType::Name).unwrap_or("").to_string());
            let template = match own {
                Some(value) if value.is_empty() || value.eq_ignore_ascii_case("NONE") => None,
                Some(value) => Some(value),
                None => suite_template.clone(),
            };
            if template.is_some() {
                convert_to_template_rows(&mut test.body);
            }
        }
    }
}

fn convert_to_template_rows(body: &mut [Node]) {
    for node in body.iter_mut() {
        match node {
            Node::Statement(statement) if statement.kind == StatementKind::KeywordCall => {
                statement.kind = StatementKind::TemplateArguments;
                for token in statement.tokens.iter_mut() {
                    if matches!(token.kind, TokenType::Assign | TokenType::Keyword) {
                        token.kind = TokenType::Argument;
                    }
                }
            }
            Node::Block(block) => {
                convert_to_template_rows(&mut block.body);
                for branch in block.branches.iter_mut() {
                    convert_to_template_rows(&mut branch.body);
                }
            }
            Node::Statement(_) => {}
        }
    }
}
