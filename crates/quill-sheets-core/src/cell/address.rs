//! Cell address and range types

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "$B$2")
///
/// Coordinates are zero-based and column-first, matching the `(col, row)`
/// order used by every sheet accessor. `$` markers are accepted when parsing
/// and dropped; stored cells never carry absolute/relative flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u32,
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use quill_sheets_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("$B$2").unwrap();
    /// assert_eq!((addr.col, addr.row), (1, 1));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let body = s.strip_prefix('$').unwrap_or(s);
        let split = body
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(body.len());
        if split == 0 {
            return Err(Error::InvalidAddress(format!("no column letters in '{s}'")));
        }

        let col = Self::letters_to_column(&body[..split])?;
        let row_str = body[split..].strip_prefix('$').unwrap_or(&body[split..]);
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{s}'")));
        }

        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{s}'")))?;
        if row == 0 || row > MAX_ROWS {
            return Err(Error::InvalidAddress(format!(
                "row number must be in 1..={MAX_ROWS} in '{s}'"
            )));
        }

        Ok(Self { col, row: row - 1 })
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u32) -> String {
        let mut result = Vec::with_capacity(3);
        let mut n = col as u64 + 1;

        while n > 0 {
            n -= 1;
            result.push((n % 26) as u8 + b'A');
            n /= 26;
        }

        result.reverse();
        String::from_utf8(result).unwrap_or_default()
    }

    /// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!("invalid column letter '{c}'")));
            }
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
                .filter(|v| *v <= MAX_COLS)
                .ok_or_else(|| {
                    Error::InvalidAddress(format!("column '{letters}' beyond {MAX_COLS} columns"))
                })?;
        }

        Ok(col - 1)
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row + 1)
    }

    /// A1 form plus zero-based coordinates, used in error messages
    pub fn describe(&self) -> String {
        format!("{} (col {}, row {})", self.to_a1_string(), self.col, self.row)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular range of cells (e.g., "A1:B10")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    /// Top-left corner
    pub start: CellAddress,
    /// Bottom-right corner
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new range, normalizing so `start` is top-left
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.col.min(b.col), a.row.min(b.row)),
            end: CellAddress::new(a.col.max(b.col), a.row.max(b.row)),
        }
    }

    /// Create a range from corner coordinates
    pub fn from_indices(start_col: u32, start_row: u32, end_col: u32, end_row: u32) -> Self {
        Self::new(
            CellAddress::new(start_col, start_row),
            CellAddress::new(end_col, end_row),
        )
    }

    /// Parse a range from A1:B10 notation (a single address is a 1x1 range)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once(':') {
            Some((a, b)) => Ok(Self::new(CellAddress::parse(a)?, CellAddress::parse(b)?)),
            None => {
                let addr = CellAddress::parse(s)?;
                Ok(Self::new(addr, addr))
            }
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Check if the two ranges share at least one cell
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    /// Number of rows covered
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Number of columns covered
    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
