//! Vertical text shaping.
//!
//! Turns a logical string into glyph placements for top-to-bottom,
//! right-to-left typesetting. Slots fill a column from the top; when a column
//! is full the next placement starts a new column further left. Column 0 is
//! the rightmost column; mapping column indices to physical x positions is
//! the composer's job.
//!
//! Digit runs are set upright. Two digits share one slot, a lone trailing
//! digit takes a full slot, and a hyphen between digit groups becomes a
//! vertical separator inside the run. Everything else takes one slot each,
//! with punctuation swapped for its vertical presentation form.

use serde::Serialize;

/// Glyph drawn for a hyphen joining two digit groups ("1-2-3").
pub const RUN_SEPARATOR: char = '｜';

/// One glyph and the slot it occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlyphPlacement {
    /// One character, or two digits sharing a slot.
    pub glyph: String,
    /// Slot index from the top of the column.
    pub row: usize,
    /// Column index, 0 being the rightmost.
    pub column: usize,
    /// Latin letters and digits set upright inside the vertical run.
    pub upright: bool,
}

impl GlyphPlacement {
    /// Whitespace keeps its slot but draws nothing.
    pub fn is_blank(&self) -> bool {
        self.glyph.chars().all(char::is_whitespace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Native(char),
    Upright(String),
    Separator,
}

/// Lazy, single-pass sequence of placements for one text block.
#[derive(Debug)]
pub struct VerticalShaper {
    tokens: std::vec::IntoIter<Token>,
    max_column_height: usize,
    column_capacity: usize,
    row: usize,
    column: usize,
    columns_used: usize,
    suffix: Option<(char, usize)>,
}

/// Shape `text` into columns of at most `max_column_height` slots.
///
/// `column_capacity` is the number of columns the block is laid out for. It is
/// advisory: text that needs more columns keeps growing leftwards and
/// [`VerticalShaper::is_overflowing`] reports it.
pub fn shape(text: &str, max_column_height: usize, column_capacity: usize) -> VerticalShaper {
    VerticalShaper {
        tokens: tokenize(text).into_iter(),
        max_column_height: max_column_height.max(1),
        column_capacity,
        row: 0,
        column: 0,
        columns_used: 0,
        suffix: None,
    }
}

impl VerticalShaper {
    /// Append `suffix` as the final placement after `gap` empty slots. The gap
    /// never pushes the suffix into a new column on its own.
    pub fn with_suffix(mut self, suffix: char, gap: usize) -> Self {
        self.suffix = Some((suffix, gap));
        self
    }

    /// Number of columns touched so far.
    pub fn columns_used(&self) -> usize {
        self.columns_used
    }

    pub fn is_overflowing(&self) -> bool {
        self.columns_used > self.column_capacity
    }

    fn place(&mut self, glyph: String, upright: bool) -> GlyphPlacement {
        if self.row >= self.max_column_height {
            self.row = 0;
            self.column += 1;
        }
        let placement = GlyphPlacement {
            glyph,
            row: self.row,
            column: self.column,
            upright,
        };
        self.row += 1;
        self.columns_used = self.columns_used.max(self.column + 1);
        placement
    }

    fn skip_slots(&mut self, count: usize) {
        for _ in 0..count {
            if self.row == 0 || self.row + 1 >= self.max_column_height {
                break;
            }
            self.row += 1;
        }
    }
}

impl Iterator for VerticalShaper {
    type Item = GlyphPlacement;

    fn next(&mut self) -> Option<GlyphPlacement> {
        let (glyph, upright) = match self.tokens.next() {
            Some(Token::Native(c)) => (c.to_string(), false),
            Some(Token::Upright(s)) => (s, true),
            Some(Token::Separator) => (RUN_SEPARATOR.to_string(), true),
            None => {
                let (suffix, gap) = self.suffix.take()?;
                self.skip_slots(gap);
                (suffix.to_string(), false)
            }
        };
        Some(self.place(glyph, upright))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tokens.len() + usize::from(self.suffix.is_some());
        (remaining, Some(remaining))
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().map(fold_fullwidth_digit).collect();
    let mut tokens = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            for pair in chars[start..i].chunks(2) {
                tokens.push(Token::Upright(pair.iter().collect()));
            }
            if i + 1 < chars.len() && is_hyphen(chars[i]) && chars[i + 1].is_ascii_digit() {
                tokens.push(Token::Separator);
                i += 1;
            }
            continue;
        }

        if c.is_ascii_alphabetic() {
            tokens.push(Token::Upright(c.to_string()));
        } else {
            tokens.push(Token::Native(vertical_form(c)));
        }
        i += 1;
    }

    tokens
}

fn fold_fullwidth_digit(c: char) -> char {
    match c {
        '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
        _ => c,
    }
}

fn is_hyphen(c: char) -> bool {
    matches!(c, '-' | '－' | '‐' | '−' | '―' | 'ー')
}

/// Vertical presentation form for characters that read wrongly when drawn
/// upright in a column.
fn vertical_form(c: char) -> char {
    match c {
        '、' => '︑',
        '。' => '︒',
        '（' | '(' => '︵',
        '）' | ')' => '︶',
        '「' => '﹁',
        '」' => '﹂',
        '『' => '﹃',
        '』' => '﹄',
        'ー' | '—' => '︱',
        '…' => '︙',
        '-' | '－' | '‐' | '−' | '―' => RUN_SEPARATOR,
        '\u{3000}' => ' ',
        other => other,
    }
}
