//! Line splitter for the space, tab and pipe separated file format.
//!
//! The splitter only knows about cells; assigning token types is the job of
//! the parser, which needs section context to do it.

const CELL_SPACE: u8 = 1 << 0;
const CELL_TAB: u8 = 1 << 1;

const fn build_space_class() -> [u8; 128] {
    let mut table = [0u8; 128];
    table[b' ' as usize] = CELL_SPACE;
    table[b'\t' as usize] = CELL_TAB;
    table[0x0B] = CELL_SPACE;
    table[0x0C] = CELL_SPACE;
    table
}

const SPACE_CLASS: [u8; 128] = build_space_class();

#[inline]
fn space_flags(c: char) -> u8 {
    if c.is_ascii() {
        SPACE_CLASS[c as usize]
    } else if c == '\u{a0}' {
        CELL_SPACE
    } else {
        0
    }
}

#[inline]
fn is_space(c: char) -> bool {
    space_flags(c) != 0
}

/// A single data cell with its UTF-32 column span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub value: String,
    pub col: u32,
    pub end_col: u32,
}

impl Cell {
    fn from_chars(chars: &[char], start: usize, end: usize) -> Self {
        Self {
            value: chars[start..end].iter().collect(),
            col: start as u32,
            end_col: end as u32,
        }
    }
}

/// One physical line split into cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// One-based line number.
    pub lineno: u32,
    /// The line starts with a separator, i.e. its first cell is empty.
    pub indented: bool,
    pub cells: Vec<Cell>,
    /// Trailing `#` comment, if any.
    pub comment: Option<Cell>,
}

impl Line {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.comment.is_none()
    }

    /// `...` in the first data cell continues the previous statement.
    pub fn is_continuation(&self) -> bool {
        self.cells.first().map(|c| c.value == "...").unwrap_or(false)
    }
}

/// Split the whole text into lines of cells. Both `\n` and `\r\n` are accepted.
pub fn split_lines(text: &str) -> Vec<Line> {
    text.split('\n')
        .enumerate()
        .map(|(idx, raw)| {
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            split_line(raw, idx as u32 + 1)
        })
        .collect()
}

fn split_line(raw: &str, lineno: u32) -> Line {
    let chars: Vec<char> = raw.chars().collect();
    let (indented, mut cells) = if is_pipe_line(&chars) {
        split_pipe_cells(&chars)
    } else {
        split_space_cells(&chars)
    };

    let mut comment = None;
    if let Some(idx) = cells.iter().position(|c| c.value.starts_with('#')) {
        let first = &cells[idx];
        let end = trimmed_end(&chars);
        comment = Some(Cell::from_chars(&chars, first.col as usize, end.max(first.end_col as usize)));
        cells.truncate(idx);
    }

    Line {
        lineno,
        indented,
        cells,
        comment,
    }
}

fn trimmed_end(chars: &[char]) -> usize {
    let mut end = chars.len();
    while end > 0 && is_space(chars[end - 1]) {
        end -= 1;
    }
    end
}

fn is_pipe_line(chars: &[char]) -> bool {
    match chars {
        ['|'] => true,
        ['|', next, ..] => is_space(*next),
        _ => false,
    }
}

fn split_space_cells(chars: &[char]) -> (bool, Vec<Cell>) {
    let len = trimmed_end(chars);
    let indented = len > 0 && is_space(chars[0]);
    let mut cells = Vec::new();
    let mut i = 0usize;
    let mut cell_start: Option<usize> = None;

    while i < len {
        let c = chars[i];
        let is_separator = if space_flags(c) & CELL_TAB != 0 {
            true
        } else if is_space(c) {
            // A single space belongs to the cell, two or more separate.
            cell_start.is_none() || (i + 1 < len && is_space(chars[i + 1]))
        } else {
            false
        };

        if is_separator {
            if let Some(start) = cell_start.take() {
                cells.push(Cell::from_chars(chars, start, i));
            }
            while i < len && is_space(chars[i]) {
                i += 1;
            }
            continue;
        }
        if cell_start.is_none() {
            cell_start = Some(i);
        }
        i += 1;
    }
    if let Some(start) = cell_start {
        cells.push(Cell::from_chars(chars, start, len));
    }
    (indented, cells)
}

fn split_pipe_cells(chars: &[char]) -> (bool, Vec<Cell>) {
    let len = trimmed_end(chars);
    let mut boundaries = Vec::new();
    for i in 0..len {
        if chars[i] == '|' {
            let before = i == 0 || is_space(chars[i - 1]);
            let after = i + 1 >= len || is_space(chars[i + 1]);
            if before && after {
                boundaries.push(i);
            }
        }
    }

    let mut cells = Vec::new();
    for (n, &pipe) in boundaries.iter().enumerate() {
        let seg_start = pipe + 1;
        let seg_end = boundaries.get(n + 1).copied().unwrap_or(len);
        let mut s = seg_start;
        let mut e = seg_end;
        while s < e && is_space(chars[s]) {
            s += 1;
        }
        while e > s && is_space(chars[e - 1]) {
            e -= 1;
        }
        cells.push(Cell::from_chars(chars, s, e));
    }

    // Trailing pipe leaves an empty last segment.
    if boundaries.last().map(|&b| b + 1 >= len).unwrap_or(false) {
        cells.pop();
    }
    let indented = cells.first().map(|c| c.value.is_empty()).unwrap_or(false);
    if indented {
        cells.remove(0);
    }
    (indented, cells)
}
