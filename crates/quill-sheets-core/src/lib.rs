//! # quill-sheets-core
//!
//! In-memory document model for the quill-sheets spreadsheet engine.
//!
//! - [`SharedStringTable`] and [`StyleRegistry`] - the index-addressed
//!   tables cells refer into
//! - [`Cell`], [`ValueRef`], [`CellValue`] - raw and resolved cell values
//! - [`Sheet`] - sparse `row -> column -> Cell` grid
//! - [`Document`] - owns the tables and the sheets
//!
//! This crate does no I/O; `quill-sheets-xlsx` reads and writes containers.
//!
//! ## Example
//!
//! ```rust
//! use quill_sheets_core::{CellValue, Document, StyleDescriptor};
//!
//! let mut doc = Document::new();
//! let bold = doc.register_style(StyleDescriptor::new().bold(true));
//!
//! let mut sheet = doc.sheet_mut(0).unwrap();
//! sheet.set_value(0, 0, "Alice").unwrap();
//! sheet.set_value_at("B1", 42.5).unwrap();
//! sheet.set_style(0, 0, bold).unwrap();
//!
//! let sheet = doc.sheet(0).unwrap();
//! assert_eq!(sheet.cell(0, 0).value().unwrap(), CellValue::text("Alice"));
//! assert!(sheet.cell(0, 0).style().unwrap().font.bold);
//! assert_eq!(sheet.cell(5, 5).value().unwrap(), CellValue::Empty);
//! ```

pub mod cell;
pub mod date;
pub mod document;
pub mod error;
pub mod row;
pub mod shared_strings;
pub mod sheet;
pub mod style;

pub use cell::{
    CachedValue, Cell, CellAddress, CellError, CellRange, CellValue, SharedString, ValueRef,
};
pub use document::{CellRef, Document, SheetMut, SheetRef};
pub use error::{Error, ErrorKind, Result, Table};
pub use row::{ResolvedCell, ResolvedRow, Row};
pub use shared_strings::SharedStringTable;
pub use sheet::{Sheet, SheetVisibility};
pub use style::{
    Alignment, Border, BorderEdge, BorderLineStyle, Color, Fill, Font, HorizontalAlignment,
    NumberFormat, PatternType, Protection, StyleDescriptor, StyleRegistry, Underline,
    VerticalAlignment,
};

/// Maximum number of rows in a sheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a sheet
pub const MAX_COLS: u32 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
