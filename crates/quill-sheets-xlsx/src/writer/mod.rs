//! XLSX writer

mod sheet;

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use quill_sheets_core::{CachedValue, Document, ValueRef};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{PartContext, XlsxError, XlsxResult};
use crate::options::WriteOptions;
use crate::shared_strings::write_shared_strings;
use crate::styles::{check_number_formats, write_styles};
use crate::workbook::{
    sheet_part_name, write_content_types, write_root_rels, write_workbook, write_workbook_rels,
};

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a document to a file path
    pub fn write_file<P: AsRef<Path>>(doc: &Document, path: P) -> XlsxResult<()> {
        Self::write_file_with(doc, path, WriteOptions::default())
    }

    /// Write a document to a file path
    ///
    /// With [`WriteOptions::atomic`] the container is written to a temporary
    /// file in the destination directory and renamed over `path` only after
    /// it is complete, so a failed save leaves any existing file untouched.
    pub fn write_file_with<P: AsRef<Path>>(
        doc: &Document,
        path: P,
        options: WriteOptions,
    ) -> XlsxResult<()> {
        let path = path.as_ref();
        validate(doc)?;

        if !options.atomic {
            let file = File::create(path)?;
            let writer = write_container(doc, BufWriter::new(file), options)?;
            writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
            log::debug!("saved {}", path.display());
            return Ok(());
        }

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let writer = write_container(doc, BufWriter::new(temp.as_file_mut()), options)?;
            writer.into_inner().map_err(|e| e.into_error())?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        log::debug!("saved {} (atomic)", path.display());
        Ok(())
    }

    /// Write a document to a writer
    pub fn write<W: Write + Seek>(doc: &Document, writer: W) -> XlsxResult<()> {
        Self::write_with(doc, writer, WriteOptions::default())
    }

    pub fn write_with<W: Write + Seek>(
        doc: &Document,
        writer: W,
        options: WriteOptions,
    ) -> XlsxResult<()> {
        validate(doc)?;
        write_container(doc, writer, options)?;
        Ok(())
    }
}

/// Reject documents that would produce a broken container
///
/// Runs before anything is written.
fn validate(doc: &Document) -> XlsxResult<()> {
    if doc.sheet_count() == 0 {
        return Err(XlsxError::corrupt("workbook", "a document needs at least one sheet"));
    }
    doc.validate()?;
    check_number_formats(doc.styles()).in_part("xl/styles.xml")?;

    for sheet in doc.sheets() {
        for cell in sheet.cells() {
            let number = match &cell.value {
                ValueRef::Number(n) => *n,
                ValueRef::Formula {
                    cached: Some(CachedValue::Number(n)),
                    ..
                } => *n,
                _ => continue,
            };
            if !number.is_finite() {
                return Err(XlsxError::unsupported(format!(
                    "non-finite number {number} in sheet '{}' cell {}",
                    sheet.name(),
                    cell.address().describe()
                )));
            }
        }
    }
    Ok(())
}

fn write_container<W: Write + Seek>(
    doc: &Document,
    writer: W,
    options: WriteOptions,
) -> XlsxResult<W> {
    let mut zip = ZipWriter::new(writer);
    let file_options =
        SimpleFileOptions::default().compression_method(options.compression.method());

    let sheet_count = doc.sheet_count();
    let has_shared_strings = !doc.shared_strings().is_empty();

    write_part(&mut zip, "[Content_Types].xml", file_options, |out| {
        write_content_types(out, sheet_count, has_shared_strings)
    })?;
    write_part(&mut zip, "_rels/.rels", file_options, write_root_rels)?;
    write_part(&mut zip, "xl/workbook.xml", file_options, |out| {
        write_workbook(out, doc)
    })?;
    write_part(&mut zip, "xl/_rels/workbook.xml.rels", file_options, |out| {
        write_workbook_rels(out, sheet_count, has_shared_strings)
    })?;

    // Tables go before the sheets whose cells index into them
    write_part(&mut zip, "xl/styles.xml", file_options, |out| {
        write_styles(out, doc.styles())
    })?;
    if has_shared_strings {
        let references = doc
            .sheets()
            .flat_map(|s| s.sheet().cells())
            .filter(|c| matches!(c.value, ValueRef::Shared(_)))
            .count();
        write_part(&mut zip, "xl/sharedStrings.xml", file_options, |out| {
            write_shared_strings(out, doc.shared_strings(), references)
        })?;
    }

    for (i, sheet) in doc.sheets().enumerate() {
        let name = sheet_part_name(i + 1);
        write_part(&mut zip, &name, file_options, |out| {
            sheet::write_sheet(out, sheet.sheet())
        })?;
    }

    let writer = zip.finish()?;
    log::debug!(
        "wrote {} sheets, {} shared strings, {} styles",
        sheet_count,
        doc.shared_strings().len(),
        doc.styles().len()
    );
    Ok(writer)
}

fn write_part<W, F>(
    zip: &mut ZipWriter<W>,
    name: &str,
    options: SimpleFileOptions,
    body: F,
) -> XlsxResult<()>
where
    W: Write + Seek,
    F: FnOnce(&mut ZipWriter<W>) -> XlsxResult<()>,
{
    zip.start_file(name, options).in_part(name)?;
    body(zip).in_part(name)
}
