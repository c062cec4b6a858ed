use tower_lsp::lsp_types::{InlayHint, InlayHintKind, InlayHintLabel, Range};

use robotls_core::analyzer::AnalysisResult;
use robotls_core::library::{named_argument, ArgumentKind};
use robotls_core::model::{Block, Node, Statement, StatementKind};
use robotls_core::token::TokenType;

use super::analysis::DocumentAnalysis;
use super::text::to_lsp_position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InlayHintOptions {
    pub(crate) parameter_names: bool,
    pub(crate) namespaces: bool,
}

fn collect_calls<'a>(block: &'a Block, out: &mut Vec<&'a Statement>) {
    for node in &block.body {
        match node {
            Node::Statement(s) if s.kind == StatementKind::KeywordCall => out.push(s),
            Node::Statement(_) => {}
            Node::Block(b) => collect_calls(b, out),
        }
    }
    for branch in &block.branches {
        collect_calls(branch, out);
    }
}

fn hint(position: tower_lsp::lsp_types::Position, label: String, kind: InlayHintKind) -> InlayHint {
    InlayHint {
        position,
        label: InlayHintLabel::String(label),
        kind: Some(kind),
        text_edits: None,
        tooltip: None,
        padding_left: None,
        padding_right: None,
        data: None,
    }
}

/// Parameter names before positional arguments and library names before
/// unqualified keyword calls, for calls on the lines of `range`.
pub(crate) fn compute_inlay_hints(
    document: &DocumentAnalysis,
    result: &AnalysisResult,
    range: Range,
    options: InlayHintOptions,
) -> Vec<InlayHint> {
    let mut calls = Vec::new();
    for section in &document.namespace.model().sections {
        collect_calls(section, &mut calls);
    }

    let source = document.namespace.source();
    let mut hints = Vec::new();
    for call in calls {
        let line = call.lineno().saturating_sub(1);
        if line < range.start.line || line > range.end.line {
            continue;
        }
        let Some(name) = call.get_token(TokenType::Keyword) else {
            continue;
        };
        let Some((keyword, called)) = result.keyword_at(source, name.range().end) else {
            continue;
        };

        if options.namespaces && !keyword.libname.is_empty() && keyword.source.as_deref() != Some(source) {
            let prefix = format!("{}.", keyword.libname.to_lowercase());
            if !name.value.to_lowercase().contains(&prefix) {
                hints.push(hint(
                    to_lsp_position(&document.text, called.start),
                    format!("{}.", keyword.libname),
                    InlayHintKind::TYPE,
                ));
            }
        }

        if !options.parameter_names || keyword.is_any_run_keyword() {
            continue;
        }
        let mut positional = keyword.args.iter().filter(|a| {
            matches!(
                a.kind,
                ArgumentKind::PositionalOnly | ArgumentKind::PositionalOrNamed | ArgumentKind::VarPositional
            )
        });
        for argument in call.arguments() {
            if named_argument(&keyword, &argument.value).is_some() || argument.value.starts_with("@{") {
                break;
            }
            let Some(spec) = positional.next() else {
                break;
            };
            let label = if spec.kind == ArgumentKind::VarPositional {
                format!("*{}=", spec.name)
            } else {
                format!("{}=", spec.name)
            };
            hints.push(hint(
                to_lsp_position(&document.text, argument.range().start),
                label,
                InlayHintKind::PARAMETER,
            ));
            if spec.kind == ArgumentKind::VarPositional {
                break;
            }
        }
    }
    hints
}
