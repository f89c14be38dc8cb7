//! # quill-sheets
//!
//! A Rust library for reading, streaming and writing xlsx spreadsheets.
//!
//! Cells refer into two document-wide tables: text through the shared
//! string table and formatting through the style registry. Both are loaded
//! before any sheet, and a cell's indices are checked when it is resolved.
//!
//! ## Features
//!
//! - Random access: load a whole document and read or edit any cell
//! - Sequential access: stream the rows of one sheet in bounded memory
//! - Save with every reference validated first, atomically by default
//!
//! ## Example
//!
//! ```rust
//! use quill_sheets::prelude::*;
//!
//! let mut doc = Document::new();
//! let bold = doc.register_style(StyleDescriptor::new().bold(true));
//!
//! let mut sheet = doc.sheet_mut(0).unwrap();
//! sheet.set_value_at("A1", "Alice").unwrap();
//! sheet.set_value_at("B1", 42.5).unwrap();
//! sheet.set_style(0, 0, bold).unwrap();
//!
//! let sheet = doc.sheet(0).unwrap();
//! assert_eq!(sheet.cell(0, 0).value().unwrap(), CellValue::text("Alice"));
//!
//! // doc.save("people.xlsx").unwrap();
//! ```

pub mod prelude;

// Re-export core types
pub use quill_sheets_core::{
    date,
    // Cell types
    CachedValue,
    Cell,
    CellAddress,
    CellError,
    CellRange,
    CellRef,
    CellValue,
    // Main types
    Document,
    // Error types
    Error,
    ErrorKind,
    ResolvedCell,
    ResolvedRow,
    Result,
    Row,
    SharedString,
    SharedStringTable,
    Sheet,
    SheetMut,
    SheetRef,
    SheetVisibility,
    // Style types
    Alignment,
    Border,
    BorderEdge,
    BorderLineStyle,
    Color,
    Fill,
    Font,
    HorizontalAlignment,
    NumberFormat,
    PatternType,
    Protection,
    StyleDescriptor,
    StyleRegistry,
    Table,
    Underline,
    ValueRef,
    VerticalAlignment,
    // Constants
    MAX_COLS,
    MAX_ROWS,
    MAX_SHEET_NAME_LEN,
};

// Re-export I/O types
pub use quill_sheets_xlsx::{
    Compression, ReadOptions, ReaderState, SheetRows, WriteOptions, XlsxError, XlsxReader,
    XlsxResult, XlsxStream, XlsxWriter,
};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Extension trait for Document to add file I/O
pub trait DocumentExt: Sized {
    /// Open a document from a file, loading every sheet
    fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self>;

    fn open_with<P: AsRef<Path>>(path: P, options: ReadOptions) -> XlsxResult<Self>;

    /// Open a file for row-at-a-time reading
    ///
    /// Only the shared strings and styles are loaded up front.
    fn open_streaming<P: AsRef<Path>>(path: P) -> XlsxResult<XlsxStream<BufReader<File>>>;

    /// Save the document to a file
    fn save<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()>;

    fn save_with<P: AsRef<Path>>(&self, path: P, options: WriteOptions) -> XlsxResult<()>;
}

impl DocumentExt for Document {
    fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Document> {
        Self::open_with(path, ReadOptions::default())
    }

    fn open_with<P: AsRef<Path>>(path: P, options: ReadOptions) -> XlsxResult<Document> {
        let path = path.as_ref();
        check_extension(path)?;
        XlsxReader::read_file_with(path, options)
    }

    fn open_streaming<P: AsRef<Path>>(path: P) -> XlsxResult<XlsxStream<BufReader<File>>> {
        let path = path.as_ref();
        check_extension(path)?;
        XlsxStream::open_file(path)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        self.save_with(path, WriteOptions::default())
    }

    fn save_with<P: AsRef<Path>>(&self, path: P, options: WriteOptions) -> XlsxResult<()> {
        let path = path.as_ref();
        check_extension(path)?;
        XlsxWriter::write_file_with(self, path, options)
    }
}

fn check_extension(path: &Path) -> XlsxResult<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => Ok(()),
        _ => Err(Error::UnsupportedFeature(format!("file format: {}", path.display())).into()),
    }
}
