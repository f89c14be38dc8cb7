//! # quill-sheets-xlsx
//!
//! XLSX (Office Open XML) container support for quill-sheets.
//!
//! - [`XlsxReader`] loads a whole container into a [`Document`](quill_sheets_core::Document)
//! - [`XlsxStream`] walks one sheet row by row in bounded memory
//! - [`XlsxWriter`] saves a document, atomically by default
//!
//! Shared strings and styles are always loaded before any sheet, since
//! cells refer to both by index.

pub mod error;
pub mod options;
pub mod reader;
pub mod writer;

mod container;
mod shared_strings;
mod styles;
mod workbook;
mod xml;

pub use error::{XlsxError, XlsxResult};
pub use options::{Compression, ReadOptions, WriteOptions};
pub use reader::{ReaderState, SheetRows, XlsxReader, XlsxStream};
pub use writer::XlsxWriter;
