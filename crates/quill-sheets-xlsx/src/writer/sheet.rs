//! Worksheet part serialization

use std::io::Write;

use quill_sheets_core::{CachedValue, Cell, Row, Sheet, ValueRef};

use crate::error::XlsxResult;
use crate::xml;

/// Write one worksheet part
///
/// The dimension is the range of stored cells, not whatever the sheet
/// declared when it was loaded.
pub(crate) fn write_sheet<W: Write>(out: &mut W, sheet: &Sheet) -> XlsxResult<()> {
    write!(
        out,
        "{}\n<worksheet xmlns=\"{}\" xmlns:r=\"{}\">",
        xml::XML_DECLARATION,
        xml::MAIN_NS,
        xml::REL_NS
    )?;

    let dimension = sheet
        .used_range()
        .map_or_else(|| "A1".to_string(), |r| r.to_string());
    write!(out, "<dimension ref=\"{dimension}\"/>")?;

    let mut rows = sheet
        .rows()
        .filter(|r| !r.is_empty() || r.has_custom_settings())
        .peekable();
    if rows.peek().is_none() {
        out.write_all(b"<sheetData/>")?;
    } else {
        out.write_all(b"<sheetData>")?;
        for row in rows {
            write_row(out, row)?;
        }
        out.write_all(b"</sheetData>")?;
    }

    let merged = sheet.merged_regions();
    if !merged.is_empty() {
        write!(out, "<mergeCells count=\"{}\">", merged.len())?;
        for range in merged {
            write!(out, "<mergeCell ref=\"{range}\"/>")?;
        }
        out.write_all(b"</mergeCells>")?;
    }

    out.write_all(b"</worksheet>")?;
    Ok(())
}

fn write_row<W: Write>(out: &mut W, row: &Row) -> XlsxResult<()> {
    write!(out, "<row r=\"{}\"", row.index() + 1)?;
    if let Some(height) = row.height {
        write!(out, " ht=\"{height}\" customHeight=\"1\"")?;
    }
    if row.hidden {
        out.write_all(b" hidden=\"1\"")?;
    }
    if row.is_empty() {
        out.write_all(b"/>")?;
        return Ok(());
    }

    out.write_all(b">")?;
    for cell in row.cells() {
        write_cell(out, cell)?;
    }
    out.write_all(b"</row>")?;
    Ok(())
}

fn write_cell<W: Write>(out: &mut W, cell: &Cell) -> XlsxResult<()> {
    write!(out, "<c r=\"{}\"", cell.address())?;
    if let Some(style) = cell.style {
        write!(out, " s=\"{style}\"")?;
    }

    match &cell.value {
        ValueRef::Empty => out.write_all(b"/>")?,
        ValueRef::Shared(index) => write!(out, " t=\"s\"><v>{index}</v></c>")?,
        ValueRef::InlineString(text) => {
            out.write_all(b" t=\"inlineStr\"><is>")?;
            write_text(out, "t", text)?;
            out.write_all(b"</is></c>")?;
        }
        ValueRef::Number(n) => write!(out, "><v>{n}</v></c>")?,
        ValueRef::Boolean(b) => write!(out, " t=\"b\"><v>{}</v></c>", u8::from(*b))?,
        ValueRef::Error(e) => write!(out, " t=\"e\"><v>{}</v></c>", xml::escape(e.as_str()))?,
        ValueRef::Formula { text, cached } => {
            let cell_type = match cached {
                Some(CachedValue::Text(_)) => " t=\"str\"",
                Some(CachedValue::Boolean(_)) => " t=\"b\"",
                Some(CachedValue::Error(_)) => " t=\"e\"",
                Some(CachedValue::Number(_)) | None => "",
            };
            write!(out, "{cell_type}><f>")?;
            out.write_all(xml::escape(&xml::encode_escapes(text)).as_bytes())?;
            out.write_all(b"</f>")?;
            match cached {
                Some(CachedValue::Number(n)) => write!(out, "<v>{n}</v>")?,
                Some(CachedValue::Text(s)) => write_text(out, "v", s)?,
                Some(CachedValue::Boolean(b)) => write!(out, "<v>{}</v>", u8::from(*b))?,
                Some(CachedValue::Error(e)) => write!(out, "<v>{}</v>", xml::escape(e.as_str()))?,
                None => {}
            }
            out.write_all(b"</c>")?;
        }
    }
    Ok(())
}

/// Text element with `_xHHHH_` encoding and whitespace preservation
fn write_text<W: Write>(out: &mut W, tag: &str, text: &str) -> XlsxResult<()> {
    let encoded = xml::encode_escapes(text);
    if xml::needs_preserve(&encoded) {
        write!(out, "<{tag} xml:space=\"preserve\">{}</{tag}>", xml::escape(&encoded))?;
    } else {
        write!(out, "<{tag}>{}</{tag}>", xml::escape(&encoded))?;
    }
    Ok(())
}
