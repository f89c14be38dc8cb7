//! Shared formula expansion

use quill_sheets_core::{CellAddress, MAX_COLS, MAX_ROWS};

/// An A1 reference token with its absolute markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RefToken {
    col: u32,
    col_absolute: bool,
    row: u32,
    row_absolute: bool,
}

impl RefToken {
    fn parse(token: &str) -> Option<Self> {
        let bytes = token.as_bytes();
        let mut i = 0;

        let col_absolute = bytes.first() == Some(&b'$');
        if col_absolute {
            i += 1;
        }
        let letters_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i == letters_start || i - letters_start > 3 {
            return None;
        }
        let letters = &token[letters_start..i];

        let row_absolute = bytes.get(i) == Some(&b'$');
        if row_absolute {
            i += 1;
        }
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == digits_start || i != bytes.len() {
            return None;
        }

        let col = CellAddress::letters_to_column(letters).ok()?;
        let row: u32 = token[digits_start..].parse().ok()?;
        if row == 0 || row > MAX_ROWS {
            return None;
        }
        Some(Self {
            col,
            col_absolute,
            row: row - 1,
            row_absolute,
        })
    }

    /// Moved token, or `None` if it would leave the grid
    fn shift(self, d_col: i64, d_row: i64) -> Option<Self> {
        let col = if self.col_absolute {
            self.col as i64
        } else {
            self.col as i64 + d_col
        };
        let row = if self.row_absolute {
            self.row as i64
        } else {
            self.row as i64 + d_row
        };
        if !(0..MAX_COLS as i64).contains(&col) || !(0..MAX_ROWS as i64).contains(&row) {
            return None;
        }
        Some(Self {
            col: col as u32,
            row: row as u32,
            ..self
        })
    }

    fn write_to(self, out: &mut String) {
        if self.col_absolute {
            out.push('$');
        }
        out.push_str(&CellAddress::column_to_letters(self.col));
        if self.row_absolute {
            out.push('$');
        }
        out.push_str(&(self.row + 1).to_string());
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '$' | '_' | '.')
}

/// Move every relative A1 reference in `formula` by the given offset
///
/// String literals, quoted sheet names, function names and sheet
/// prefixes are copied unchanged. A reference pushed off the grid becomes
/// `#REF!`.
pub(crate) fn shift_references(formula: &str, d_col: i64, d_row: i64) -> String {
    if d_col == 0 && d_row == 0 {
        return formula.to_string();
    }

    let mut out = String::with_capacity(formula.len() + 8);
    let mut chars = formula.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '"' | '\'' => {
                // Literal or quoted sheet name; a doubled quote is an escaped one
                out.push(c);
                while let Some((_, inner)) = chars.next() {
                    out.push(inner);
                    if inner == c {
                        if chars.peek().map(|&(_, n)| n) == Some(c) {
                            chars.next();
                            out.push(c);
                        } else {
                            break;
                        }
                    }
                }
            }
            c if is_word_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, n)) = chars.peek() {
                    if !is_word_char(n) {
                        break;
                    }
                    end = i + n.len_utf8();
                    chars.next();
                }
                let token = &formula[start..end];
                let next = chars.peek().map(|&(_, n)| n);

                match RefToken::parse(token) {
                    Some(reference) if !matches!(next, Some('(' | '!')) => {
                        match reference.shift(d_col, d_row) {
                            Some(moved) => moved.write_to(&mut out),
                            None => out.push_str("#REF!"),
                        }
                    }
                    _ => out.push_str(token),
                }
            }
            c => out.push(c),
        }
    }
    out
}
