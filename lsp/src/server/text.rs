use ropey::Rope;
use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent};

use robotls_core::token::{Position as CorePosition, Range as CoreRange};

// Convert LSP UTF-16 position to Rope char index (scalar values), clamped to the end of the line.
pub(crate) fn position_to_char_idx(text: &Rope, pos: Position) -> usize {
    let line_idx = pos.line as usize;
    if line_idx >= text.len_lines() {
        return text.len_chars();
    }
    let line_start_char = text.line_to_char(line_idx);
    let line_slice = text.line(line_idx);
    let target_utf16 = pos.character as usize;

    if let Some(s) = line_slice.as_str() {
        if s.is_ascii() {
            let clamped = target_utf16.min(s.len());
            return line_start_char + clamped;
        }
    }

    let mut seen_utf16 = 0usize;
    let mut chars_in_line = 0usize;
    for ch in line_slice.chars() {
        let u16_len = ch.len_utf16();
        if seen_utf16 + u16_len > target_utf16 {
            break;
        }
        seen_utf16 += u16_len;
        chars_in_line += 1;
        if seen_utf16 == target_utf16 {
            break;
        }
    }
    line_start_char + chars_in_line
}

/// Protocol position (UTF-16 columns) to a core position (UTF-32 columns).
pub(crate) fn to_core_position(text: &Rope, pos: Position) -> CorePosition {
    let line_idx = pos.line as usize;
    if line_idx >= text.len_lines() {
        return CorePosition::new(pos.line, pos.character);
    }
    let column = position_to_char_idx(text, pos) - text.line_to_char(line_idx);
    CorePosition::new(pos.line, column as u32)
}

/// Core position (UTF-32 columns) to a protocol position (UTF-16 columns).
/// Columns past the end of the line are kept as they are.
pub(crate) fn to_lsp_position(text: &Rope, pos: CorePosition) -> Position {
    let line_idx = pos.line as usize;
    if line_idx >= text.len_lines() {
        return Position::new(pos.line, pos.character);
    }
    let line_slice = text.line(line_idx);
    if let Some(s) = line_slice.as_str() {
        if s.is_ascii() {
            return Position::new(pos.line, pos.character);
        }
    }
    let mut utf16 = 0u32;
    let mut seen = 0u32;
    for ch in line_slice.chars() {
        if seen == pos.character {
            break;
        }
        utf16 += ch.len_utf16() as u32;
        seen += 1;
    }
    Position::new(pos.line, utf16 + pos.character.saturating_sub(seen))
}

pub(crate) fn to_lsp_range(text: &Rope, range: CoreRange) -> Range {
    Range::new(to_lsp_position(text, range.start), to_lsp_position(text, range.end))
}

// Apply incremental LSP changes to a rope buffer.
pub(crate) fn apply_incremental_change_rope(text: &mut Rope, change: &TextDocumentContentChangeEvent) {
    if let Some(range) = &change.range {
        let start_char = position_to_char_idx(text, range.start);
        let end_char = position_to_char_idx(text, range.end);
        let (s, e) = if start_char <= end_char {
            (start_char, end_char)
        } else {
            (end_char, start_char)
        };
        if s != e {
            text.remove(s..e);
        }
        if !change.text.is_empty() {
            text.insert(s, &change.text);
        }
    } else {
        *text = Rope::from_str(&change.text);
    }
}
