//! Cell-related types
//!
//! - [`Cell`] - one grid slot: position, raw value, style index
//! - [`ValueRef`] / [`CellValue`] - raw and resolved values
//! - [`CellAddress`] / [`CellRange`] - A1 addressing

mod address;
mod value;

pub use address::{CellAddress, CellRange};
pub use value::{CachedValue, CellError, CellValue, SharedString, ValueRef};

use crate::error::{Error, Result};
use crate::shared_strings::SharedStringTable;
use crate::style::{StyleDescriptor, StyleRegistry};

/// A single cell of a sheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    /// Column index (0-based)
    pub col: u32,
    /// Row index (0-based)
    pub row: u32,
    /// Raw value; shared text is an index into the document's string table
    pub value: ValueRef,
    /// Index into the document's style registry (`None` = default style)
    pub style: Option<u32>,
}

impl Cell {
    /// An empty, unstyled cell at `(col, row)`
    pub fn empty(col: u32, row: u32) -> Self {
        Self {
            col,
            row,
            value: ValueRef::Empty,
            style: None,
        }
    }

    pub fn new(col: u32, row: u32, value: ValueRef) -> Self {
        Self {
            col,
            row,
            value,
            style: None,
        }
    }

    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.col, self.row)
    }

    /// Check whether the cell carries neither a value nor a style
    pub fn is_blank(&self) -> bool {
        self.value.is_empty() && self.style.is_none()
    }

    /// Resolve the value against the shared string table
    ///
    /// A shared index outside the table is a corrupt document, reported
    /// with the cell position and the offending index.
    pub fn resolve(&self, strings: &SharedStringTable) -> Result<CellValue> {
        Ok(match &self.value {
            ValueRef::Empty => CellValue::Empty,
            ValueRef::Shared(idx) => match strings.get(*idx) {
                Ok(s) => CellValue::Text(s.clone()),
                Err(err) => {
                    return Err(Error::corrupt(self.address().describe(), err.to_string()))
                }
            },
            ValueRef::InlineString(s) => CellValue::text(s),
            ValueRef::Number(n) => CellValue::Number(*n),
            ValueRef::Boolean(b) => CellValue::Boolean(*b),
            ValueRef::Error(e) => CellValue::Error(*e),
            ValueRef::Formula { text, cached } => CellValue::Formula {
                text: text.clone(),
                cached: cached.clone(),
            },
        })
    }

    /// Resolve the style index against the registry (`None` is index 0)
    pub fn resolve_style<'a>(&self, styles: &'a StyleRegistry) -> Result<&'a StyleDescriptor> {
        styles
            .get(self.style.unwrap_or(0))
            .map_err(|e| e.at_cell(self.address().describe()))
    }

    /// Check the style index without resolving the value
    pub fn check_style(&self, styles: &StyleRegistry) -> Result<()> {
        self.resolve_style(styles).map(|_| ())
    }
}
