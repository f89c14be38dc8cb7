//! Prelude module - common imports for quill-sheets users
//!
//! ```rust
//! use quill_sheets::prelude::*;
//! ```

pub use crate::{
    // Style types
    Alignment,
    Border,
    BorderLineStyle,
    CellAddress,
    CellError,
    CellRange,
    // Cell types
    CellValue,
    Color,
    // Main types
    Document,
    // Extension traits
    DocumentExt,
    // Error types
    Error,
    ErrorKind,
    HorizontalAlignment,
    NumberFormat,
    ReadOptions,
    Result,
    SheetVisibility,
    StyleDescriptor,
    VerticalAlignment,
    WriteOptions,
    XlsxError,
    // I/O types
    XlsxReader,
    XlsxStream,
    XlsxWriter,
};
