#[cfg(test)]
mod tests {
    use crate::token::{split_lines, Token, TokenType};

    fn values(text: &str) -> Vec<Vec<String>> {
        split_lines(text)
            .into_iter()
            .map(|l| l.cells.into_iter().map(|c| c.value).collect())
            .collect()
    }

    #[test]
    fn splits_on_two_spaces_and_tabs() {
        let lines = split_lines("Log    hello world\tsecond");
        let cells = &lines[0].cells;
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].value, "Log");
        assert_eq!(cells[1].value, "hello world");
        assert_eq!(cells[1].col, 7);
        assert_eq!(cells[2].value, "second");
        assert!(!lines[0].indented);
    }

    #[test]
    fn indentation_and_continuation() {
        let lines = split_lines("    Log    a\n    ...    b\r\n");
        assert!(lines[0].indented);
        assert!(lines[1].is_continuation());
        assert_eq!(values("    ...    b")[0], vec!["...", "b"]);
    }

    #[test]
    fn trailing_comment_is_separated() {
        let lines = split_lines("    Log    x    # robotcode: ignore");
        assert_eq!(lines[0].cells.len(), 2);
        let comment = lines[0].comment.as_ref().unwrap();
        assert_eq!(comment.value, "# robotcode: ignore");
        assert_eq!(comment.col, 16);
    }

    #[test]
    fn pipe_separated_lines() {
        let lines = split_lines("| Example | Log | hi |\n|  | Log | there |");
        assert_eq!(values("| Example | Log | hi |")[0], vec!["Example", "Log", "hi"]);
        assert!(!lines[0].indented);
        assert!(lines[1].indented);
        assert_eq!(lines[1].cells[0].value, "Log");
    }

    #[test]
    fn multibyte_columns_count_scalars() {
        let lines = split_lines("Log    äöü    😀x");
        assert_eq!(lines[0].cells[1].col, 7);
        assert_eq!(lines[0].cells[2].col, 14);
        assert_eq!(lines[0].cells[2].end_col, 16);
    }

    #[test]
    fn tokenize_variables_splits_around_occurrences() {
        let token = Token::new(TokenType::Argument, "Hello ${name}, you are @{list}[0]!", 3, 4);
        let parts = token.tokenize_variables();
        let kinds: Vec<TokenType> = parts.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::Argument,
                TokenType::Variable,
                TokenType::Argument,
                TokenType::Variable,
                TokenType::Argument
            ]
        );
        assert_eq!(parts[1].value, "${name}");
        assert_eq!(parts[1].col_offset, 10);
        assert_eq!(parts[3].value, "@{list}[0]");
        assert_eq!(parts[4].value, "!");
    }

    #[test]
    fn tokenize_variables_keeps_plain_tokens() {
        let token = Token::new(TokenType::Argument, "plain", 1, 0);
        assert_eq!(token.tokenize_variables(), vec![token.clone()]);
        let comment = Token::new(TokenType::Comment, "# ${x}", 1, 0);
        assert_eq!(comment.tokenize_variables().len(), 1);
    }
}
