//! XLSX error types

use quill_sheets_core::ErrorKind;
use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur during XLSX reading/writing
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Error from the document model
    #[error(transparent)]
    Core(#[from] quill_sheets_core::Error),

    /// Failure while reading or writing one container part
    #[error("in part '{part}': {source}")]
    InPart {
        part: String,
        #[source]
        source: Box<XlsxError>,
    },
}

impl XlsxError {
    /// A required container entry is absent
    pub(crate) fn missing_part(part: &str) -> Self {
        quill_sheets_core::Error::NotFound(format!("container entry '{part}'")).into()
    }

    /// Malformed content inside a part
    pub(crate) fn corrupt(location: impl Into<String>, reason: impl Into<String>) -> Self {
        quill_sheets_core::Error::corrupt(location, reason).into()
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        quill_sheets_core::Error::UnsupportedFeature(what.into()).into()
    }

    /// Classify this error onto the document error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            XlsxError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            XlsxError::Io(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                ErrorKind::CorruptDocument
            }
            XlsxError::Io(_) => ErrorKind::NotFound,
            XlsxError::Zip(zip::result::ZipError::FileNotFound) => ErrorKind::NotFound,
            XlsxError::Zip(zip::result::ZipError::Io(e))
                if e.kind() == std::io::ErrorKind::NotFound =>
            {
                ErrorKind::NotFound
            }
            XlsxError::Zip(zip::result::ZipError::UnsupportedArchive(_)) => {
                ErrorKind::UnsupportedFeature
            }
            XlsxError::Zip(_) | XlsxError::Xml(_) => ErrorKind::CorruptDocument,
            XlsxError::Core(e) => e.kind(),
            XlsxError::InPart { source, .. } => source.kind(),
        }
    }

    /// Name of the container part the error happened in, if known
    pub fn part(&self) -> Option<&str> {
        match self {
            XlsxError::InPart { part, .. } => Some(part),
            _ => None,
        }
    }

    /// The innermost core error, if this wraps one
    pub fn core(&self) -> Option<&quill_sheets_core::Error> {
        match self {
            XlsxError::Core(e) => Some(e),
            XlsxError::InPart { source, .. } => source.core(),
            _ => None,
        }
    }
}

/// Attach the failing part name to an error
pub(crate) trait PartContext<T> {
    fn in_part(self, part: &str) -> XlsxResult<T>;
}

impl<T, E: Into<XlsxError>> PartContext<T> for std::result::Result<T, E> {
    fn in_part(self, part: &str) -> XlsxResult<T> {
        self.map_err(|e| match e.into() {
            // Keep the innermost part name
            e @ XlsxError::InPart { .. } => e,
            e => XlsxError::InPart {
                part: part.to_string(),
                source: Box::new(e),
            },
        })
    }
}
