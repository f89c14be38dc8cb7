//! XLSX reader
//!
//! [`XlsxReader`] materializes every sheet into a [`Document`];
//! [`XlsxStream`] hands rows out one at a time. Both run the same row
//! parser over the same package, so they agree row for row.

mod formula;
mod package;
mod rows;
mod stream;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quill_sheets_core::{
    Document, ErrorKind, Row, SharedStringTable, Sheet, StyleRegistry, ValueRef,
};

use crate::error::{PartContext, XlsxError, XlsxResult};
use crate::options::ReadOptions;
use package::{OpenSheet, Package};

pub use rows::ReaderState;
pub use stream::{SheetRows, XlsxStream};

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a document from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Document> {
        Self::read_file_with(path, ReadOptions::default())
    }

    pub fn read_file_with<P: AsRef<Path>>(path: P, options: ReadOptions) -> XlsxResult<Document> {
        let file = File::open(path)?;
        Self::read_with(BufReader::new(file), options)
    }

    /// Read a document from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Document> {
        Self::read_with(reader, ReadOptions::default())
    }

    pub fn read_with<R: Read + Seek>(reader: R, options: ReadOptions) -> XlsxResult<Document> {
        let mut package = Package::open(reader)?;

        let sheet_count = package.sheets().len();
        let mut sheets = Vec::with_capacity(sheet_count);
        for index in 0..sheet_count {
            let open = package.open_sheet(index)?;
            sheets.push(load_sheet(open, options)?);
        }

        let date_1904 = package.date_1904();
        let (shared_strings, styles) = package.into_tables();
        let doc = Document::from_parts(shared_strings, styles, sheets, date_1904).map_err(|e| {
            match e.kind() {
                // Names the application would never have written
                ErrorKind::InvalidInput => XlsxError::corrupt("workbook", e.to_string()),
                _ => e.into(),
            }
        })?;

        log::debug!(
            "loaded {} sheets, {} shared strings, {} styles",
            doc.sheet_count(),
            doc.shared_strings().len(),
            doc.styles().len()
        );
        Ok(doc)
    }
}

fn load_sheet(open: OpenSheet<'_>, options: ReadOptions) -> XlsxResult<Sheet> {
    let OpenSheet {
        sheet: info,
        reader,
        shared_strings,
        styles,
    } = open;

    let mut sheet = Sheet::new(info.name.as_str());
    sheet.set_visibility(info.visibility);
    let Some(mut reader) = reader else {
        return Ok(sheet);
    };

    while let Some(row) = reader.next_row()? {
        if options.validate_references {
            check_row(&row, shared_strings, styles).in_part(reader.part())?;
        }
        sheet.insert_row(row).in_part(reader.part())?;
    }

    sheet.set_declared_dimension(reader.dimension());
    for range in reader.merged_regions() {
        if let Err(err) = sheet.merge_cells(*range) {
            log::warn!("{}: skipping merged region: {err}", reader.part());
        }
    }

    let observed = sheet.used_range();
    if let Some(declared) = sheet.declared_dimension() {
        if observed != Some(declared) {
            log::warn!(
                "{}: declared dimension {declared} differs from observed cells {}",
                reader.part(),
                observed.map_or_else(|| "(none)".to_string(), |r| r.to_string())
            );
        }
    }

    log::debug!(
        "sheet '{}': {} rows, {} cells",
        sheet.name(),
        reader.rows_read(),
        sheet.cell_count()
    );
    Ok(sheet)
}

/// Check every index in `row` against the loaded tables
fn check_row(row: &Row, strings: &SharedStringTable, styles: &StyleRegistry) -> XlsxResult<()> {
    for cell in row.cells() {
        if let ValueRef::Shared(index) = cell.value {
            if let Err(err) = strings.get(index) {
                return Err(XlsxError::corrupt(cell.address().describe(), err.to_string()));
            }
        }
        if let Some(index) = cell.style {
            if let Err(err) = styles.get(index) {
                return Err(XlsxError::corrupt(cell.address().describe(), err.to_string()));
            }
        }
    }
    Ok(())
}
