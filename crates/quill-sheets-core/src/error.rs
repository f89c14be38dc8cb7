//! Error types for quill-sheets-core

use std::fmt;

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// The index-addressed tables a lookup can run off the end of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Shared string table
    SharedStrings,
    /// Style registry
    Styles,
    /// Sheets of a document
    Sheets,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Table::SharedStrings => "shared string",
            Table::Styles => "style",
            Table::Sheets => "sheet",
        })
    }
}

/// Coarse classification of every error the library produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing file, container entry, or named sheet
    NotFound,
    /// Malformed structure, dangling index reference, unexpected event sequence
    CorruptDocument,
    /// Index lookup beyond table bounds
    OutOfRange,
    /// Well-formed but unimplemented construct
    UnsupportedFeature,
    /// Caller supplied an invalid address or name
    InvalidInput,
}

/// Errors that can occur in quill-sheets-core
#[derive(Debug, Error)]
pub enum Error {
    /// Something addressed by name does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The document is structurally broken at `location`
    #[error("Corrupt document at {location}: {reason}")]
    CorruptDocument { location: String, reason: String },

    /// An index does not resolve within its table
    #[error("{table} index {index} out of range (len: {len}){}", cell_suffix(.at))]
    OutOfRange {
        table: Table,
        index: u32,
        len: usize,
        /// Cell that held the index, when the lookup came from a cell
        at: Option<String>,
    },

    /// A construct the library recognizes but does not implement
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Merged region overlaps an existing one
    #[error("Merged region {0} overlaps an existing merged region")]
    MergeConflict(String),
}

fn cell_suffix(at: &Option<String>) -> String {
    at.as_ref().map(|a| format!(" at {a}")).unwrap_or_default()
}

impl Error {
    /// Build a [`Error::CorruptDocument`]
    pub fn corrupt(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CorruptDocument {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Build an [`Error::OutOfRange`] without cell context
    pub fn out_of_range(table: Table, index: u32, len: usize) -> Self {
        Error::OutOfRange {
            table,
            index,
            len,
            at: None,
        }
    }

    /// Attach the cell that held the failing index to an out-of-range error
    pub fn at_cell(self, cell: impl fmt::Display) -> Self {
        match self {
            Error::OutOfRange {
                table, index, len, ..
            } => Error::OutOfRange {
                table,
                index,
                len,
                at: Some(cell.to_string()),
            },
            other => other,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::CorruptDocument { .. } => ErrorKind::CorruptDocument,
            Error::OutOfRange { .. } => ErrorKind::OutOfRange,
            Error::UnsupportedFeature(_) => ErrorKind::UnsupportedFeature,
            Error::InvalidAddress(_)
            | Error::InvalidSheetName(_)
            | Error::DuplicateSheetName(_)
            | Error::MergeConflict(_) => ErrorKind::InvalidInput,
        }
    }
}
