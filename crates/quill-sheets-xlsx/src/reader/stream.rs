//! Streaming access to sheet rows

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;

use quill_sheets_core::{CellRange, ResolvedRow, SharedStringTable, StyleRegistry};

use super::package::Package;
use super::rows::{ReaderState, RowReader};
use crate::error::{PartContext, XlsxError, XlsxResult};

/// A container opened for row-at-a-time reading
///
/// Shared strings and styles are loaded up front; sheet parts are only
/// decompressed while a [`SheetRows`] walks them.
///
/// ```no_run
/// use quill_sheets_xlsx::XlsxStream;
///
/// let mut stream = XlsxStream::open_file("huge.xlsx")?;
/// let mut total = 0.0;
/// for row in stream.rows(0)? {
///     let row = row?;
///     total += row.get(1).and_then(|v| v.as_number()).unwrap_or(0.0);
/// }
/// # Ok::<(), quill_sheets_xlsx::XlsxError>(())
/// ```
pub struct XlsxStream<R> {
    package: Package<R>,
}

impl XlsxStream<BufReader<File>> {
    /// Open a file for streaming
    pub fn open_file<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> XlsxStream<R> {
    pub fn new(reader: R) -> XlsxResult<Self> {
        Ok(Self {
            package: Package::open(reader)?,
        })
    }

    pub fn sheet_count(&self) -> usize {
        self.package.sheets().len()
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.package.sheets().iter().map(|s| s.name.as_str())
    }

    pub fn shared_strings(&self) -> &SharedStringTable {
        self.package.shared_strings()
    }

    pub fn styles(&self) -> &StyleRegistry {
        self.package.styles()
    }

    pub fn date_1904(&self) -> bool {
        self.package.date_1904()
    }

    /// Start reading the rows of sheet `index`
    pub fn rows(&mut self, index: usize) -> XlsxResult<SheetRows<'_>> {
        let open = self.package.open_sheet(index)?;
        Ok(SheetRows {
            name: &open.sheet.name,
            reader: open.reader,
            shared_strings: open.shared_strings,
            styles: open.styles,
            finished: false,
        })
    }

    /// Start reading the rows of the sheet called `name` (case-insensitive)
    pub fn rows_by_name(&mut self, name: &str) -> XlsxResult<SheetRows<'_>> {
        let lower = name.to_lowercase();
        let index = self
            .package
            .sheets()
            .iter()
            .position(|s| s.name.to_lowercase() == lower)
            .ok_or_else(|| {
                XlsxError::from(quill_sheets_core::Error::NotFound(format!("sheet '{name}'")))
            })?;
        self.rows(index)
    }
}

/// Forward-only cursor over the rows of one sheet
///
/// Each row is resolved against the shared strings and styles before it is
/// returned. A row that fails to resolve puts the cursor into
/// [`ReaderState::Failed`]. Dropping the cursor releases the part stream.
pub struct SheetRows<'a> {
    name: &'a str,
    reader: Option<RowReader<Box<dyn BufRead + 'a>>>,
    shared_strings: &'a SharedStringTable,
    styles: &'a StyleRegistry,
    /// Set once the iterator has yielded its error
    finished: bool,
}

impl SheetRows<'_> {
    pub fn sheet_name(&self) -> &str {
        self.name
    }

    /// Read and resolve the next row
    ///
    /// `Ok(None)` marks the end of the sheet; after any error every later
    /// call fails with `CorruptDocument`.
    pub fn next_row(&mut self) -> XlsxResult<Option<ResolvedRow>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        let Some(row) = reader.next_row()? else {
            return Ok(None);
        };
        match row.resolve(self.shared_strings, self.styles) {
            Ok(resolved) => Ok(Some(resolved)),
            Err(err) => {
                reader.fail();
                Err(XlsxError::from(err)).in_part(reader.part())
            }
        }
    }

    pub fn state(&self) -> ReaderState {
        match &self.reader {
            Some(reader) => reader.state(),
            None => ReaderState::Exhausted,
        }
    }

    /// Dimension declared by the sheet, once the reader has passed it
    pub fn dimension(&self) -> Option<CellRange> {
        self.reader.as_ref().and_then(|r| r.dimension())
    }

    /// Merged regions; complete once the cursor is exhausted
    pub fn merged_regions(&self) -> &[CellRange] {
        match &self.reader {
            Some(reader) => reader.merged_regions(),
            None => &[],
        }
    }

    /// Number of rows yielded so far
    pub fn rows_read(&self) -> u64 {
        self.reader.as_ref().map_or(0, |r| r.rows_read())
    }
}

impl Iterator for SheetRows<'_> {
    type Item = XlsxResult<ResolvedRow>;

    /// Yields rows, then at most one error, then nothing
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
