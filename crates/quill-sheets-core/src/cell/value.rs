//! Cell value types
//!
//! Two closely related enums live here. [`ValueRef`] is what a cell stores:
//! text may be a bare index into the shared string table. [`CellValue`] is
//! the resolved form handed to callers, with shared text already looked up.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::date;

/// The raw value stored in a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ValueRef {
    /// No value
    #[default]
    Empty,

    /// Index into the document's shared string table
    Shared(u32),

    /// Text stored in the cell itself
    InlineString(String),

    /// Numeric value (dates are numbers too)
    Number(f64),

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(CellError),

    /// Formula with the result last computed by the producing application
    Formula {
        /// Formula text without the leading '='
        text: String,
        /// Cached result, if the file carried one
        cached: Option<CachedValue>,
    },
}

impl ValueRef {
    /// Check if the cell holds no value
    pub fn is_empty(&self) -> bool {
        matches!(self, ValueRef::Empty)
    }

    /// Shared string index, if this is a shared reference
    pub fn shared_index(&self) -> Option<u32> {
        match self {
            ValueRef::Shared(idx) => Some(*idx),
            _ => None,
        }
    }

    /// Get the type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueRef::Empty => "empty",
            ValueRef::Shared(_) => "shared string",
            ValueRef::InlineString(_) => "inline string",
            ValueRef::Number(_) => "number",
            ValueRef::Boolean(_) => "boolean",
            ValueRef::Error(_) => "error",
            ValueRef::Formula { .. } => "formula",
        }
    }
}

/// Result of a formula as cached in the file
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(CellError),
}

impl fmt::Display for CachedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachedValue::Number(n) => write!(f, "{n}"),
            CachedValue::Text(s) => f.write_str(s),
            CachedValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CachedValue::Error(e) => write!(f, "{e}"),
        }
    }
}

/// A resolved cell value
///
/// This is what [`crate::CellRef::value`] returns and what the streaming
/// reader yields. It is also the input type for setting values; text set
/// through a document is interned into the shared string table.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Text, whether it came from the shared table or the cell itself
    Text(SharedString),

    /// Numeric value
    Number(f64),

    /// Boolean value
    Boolean(bool),

    /// Error value
    Error(CellError),

    /// Formula with cached result
    Formula {
        text: String,
        cached: Option<CachedValue>,
    },
}

impl CellValue {
    /// Create a text value
    pub fn text<S: AsRef<str>>(s: S) -> Self {
        CellValue::Text(SharedString::new(s))
    }

    /// Create a formula value without a cached result
    ///
    /// A leading '=' is stripped; the file format stores formulas without it.
    pub fn formula<S: AsRef<str>>(text: S) -> Self {
        let text = text.as_ref();
        CellValue::Formula {
            text: text.strip_prefix('=').unwrap_or(text).to_string(),
            cached: None,
        }
    }

    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Try to get the value as a number (formulas yield their cached number)
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Formula {
                cached: Some(CachedValue::Number(n)),
                ..
            } => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Formula {
                cached: Some(CachedValue::Boolean(b)),
                ..
            } => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            CellValue::Formula {
                cached: Some(CachedValue::Text(s)),
                ..
            } => Some(s),
            _ => None,
        }
    }

    /// Interpret a numeric value as a date serial
    pub fn as_datetime(&self, date_1904: bool) -> Option<NaiveDateTime> {
        self.as_number()
            .and_then(|n| date::serial_to_datetime(n, date_1904))
    }

    /// Get the formula text if this is a formula
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s.as_str()),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Error(e) => write!(f, "{e}"),
            CellValue::Formula {
                cached: Some(v), ..
            } => write!(f, "{v}"),
            CellValue::Formula { text, .. } => write!(f, "={text}"),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(SharedString::from(s))
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Spreadsheet error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellError {
    /// #NULL! - Incorrect range operator
    Null,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
    /// #GETTING_DATA - External data is loading
    GettingData,
    /// #SPILL! - Dynamic array cannot spill
    Spill,
    /// #CALC! - Calculation error
    Calc,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
            CellError::GettingData => "#GETTING_DATA",
            CellError::Spill => "#SPILL!",
            CellError::Calc => "#CALC!",
        }
    }

    /// Parse an error literal (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "#NULL!" => Some(CellError::Null),
            "#DIV/0!" => Some(CellError::Div0),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::Na),
            "#GETTING_DATA" => Some(CellError::GettingData),
            "#SPILL!" => Some(CellError::Spill),
            "#CALC!" => Some(CellError::Calc),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference-counted immutable text
///
/// The shared string table hands these out, so resolving a shared cell is a
/// pointer copy rather than a string allocation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether two handles point at the same allocation
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for SharedString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString(Arc::from(s))
    }
}
