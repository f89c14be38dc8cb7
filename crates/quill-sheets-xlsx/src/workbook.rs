//! Workbook manifest, package relationships and content types

use std::io::{BufRead, Write};

use quick_xml::events::Event;
use quill_sheets_core::{Document, SheetVisibility};

use crate::error::{XlsxError, XlsxResult};
use crate::xml;

const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// One `<sheet>` entry of the workbook manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetEntry {
    pub name: String,
    pub sheet_id: Option<u32>,
    /// Relationship id pointing at the sheet part
    pub rel_id: Option<String>,
    pub visibility: SheetVisibility,
}

/// Sheet list and workbook-level properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Manifest {
    pub sheets: Vec<SheetEntry>,
    pub date_1904: bool,
}

/// Parse the workbook part
pub(crate) fn read_workbook<B: BufRead>(source: B) -> XlsxResult<Manifest> {
    let mut reader = xml::reader(source);
    let mut buf = Vec::new();
    let mut manifest = Manifest::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"date1904" {
                            manifest.date_1904 = xml::is_true(&xml::value(&attr)?);
                        }
                    }
                }
                b"sheet" => {
                    let mut name = None;
                    let mut sheet_id = None;
                    let mut rel_id = None;
                    let mut visibility = SheetVisibility::Visible;
                    for attr in e.attributes().flatten() {
                        match attr.key.local_name().as_ref() {
                            b"name" => name = Some(xml::value(&attr)?),
                            b"sheetId" => sheet_id = xml::value(&attr)?.parse().ok(),
                            b"id" => rel_id = Some(xml::value(&attr)?),
                            b"state" => visibility = SheetVisibility::parse(&xml::value(&attr)?),
                            _ => {}
                        }
                    }
                    let name = name.ok_or_else(|| {
                        XlsxError::corrupt(
                            format!("sheet {}", manifest.sheets.len()),
                            "sheet entry without a name",
                        )
                    })?;
                    manifest.sheets.push(SheetEntry {
                        name,
                        sheet_id,
                        rel_id,
                        visibility,
                    });
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    log::debug!(
        "workbook declares {} sheets (date1904: {})",
        manifest.sheets.len(),
        manifest.date_1904
    );
    Ok(manifest)
}

/// Part name of the `n`th sheet (1-based) as written
pub(crate) fn sheet_part_name(n: usize) -> String {
    format!("xl/worksheets/sheet{n}.xml")
}

pub(crate) fn write_workbook<W: Write>(out: &mut W, doc: &Document) -> XlsxResult<()> {
    write!(
        out,
        "{}\n<workbook xmlns=\"{}\" xmlns:r=\"{}\">",
        xml::XML_DECLARATION,
        xml::MAIN_NS,
        xml::REL_NS
    )?;
    if doc.date_1904() {
        out.write_all(b"<workbookPr date1904=\"1\"/>")?;
    } else {
        out.write_all(b"<workbookPr/>")?;
    }

    // At least one sheet must stay visible for the file to open
    let first_visible = doc
        .sheets()
        .position(|s| s.visibility() == SheetVisibility::Visible)
        .unwrap_or(0);
    write!(
        out,
        "<bookViews><workbookView activeTab=\"{first_visible}\"/></bookViews><sheets>"
    )?;
    for (i, sheet) in doc.sheets().enumerate() {
        write!(
            out,
            "<sheet name=\"{}\" sheetId=\"{}\"",
            xml::escape(sheet.name()),
            i + 1
        )?;
        if let Some(state) = sheet.visibility().as_str() {
            write!(out, " state=\"{state}\"")?;
        }
        write!(out, " r:id=\"rId{}\"/>", i + 1)?;
    }
    out.write_all(b"</sheets></workbook>")?;
    Ok(())
}

/// Sheets take `rId1..rIdN`, followed by styles and shared strings
pub(crate) fn write_workbook_rels<W: Write>(
    out: &mut W,
    sheet_count: usize,
    has_shared_strings: bool,
) -> XlsxResult<()> {
    write!(
        out,
        "{}\n<Relationships xmlns=\"{}\">",
        xml::XML_DECLARATION,
        xml::PACKAGE_REL_NS
    )?;
    for n in 1..=sheet_count {
        write!(
            out,
            "<Relationship Id=\"rId{n}\" Type=\"{REL_TYPE_BASE}/worksheet\" Target=\"worksheets/sheet{n}.xml\"/>"
        )?;
    }
    write!(
        out,
        "<Relationship Id=\"rId{}\" Type=\"{REL_TYPE_BASE}/styles\" Target=\"styles.xml\"/>",
        sheet_count + 1
    )?;
    if has_shared_strings {
        write!(
            out,
            "<Relationship Id=\"rId{}\" Type=\"{REL_TYPE_BASE}/sharedStrings\" Target=\"sharedStrings.xml\"/>",
            sheet_count + 2
        )?;
    }
    out.write_all(b"</Relationships>")?;
    Ok(())
}

pub(crate) fn write_root_rels<W: Write>(out: &mut W) -> XlsxResult<()> {
    write!(
        out,
        "{}\n<Relationships xmlns=\"{}\"><Relationship Id=\"rId1\" Type=\"{REL_TYPE_BASE}/officeDocument\" Target=\"xl/workbook.xml\"/></Relationships>",
        xml::XML_DECLARATION,
        xml::PACKAGE_REL_NS
    )?;
    Ok(())
}

pub(crate) fn write_content_types<W: Write>(
    out: &mut W,
    sheet_count: usize,
    has_shared_strings: bool,
) -> XlsxResult<()> {
    const CT: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml";

    write!(
        out,
        "{}\n<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
        xml::XML_DECLARATION
    )?;
    out.write_all(
        b"<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
          <Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    )?;
    write!(
        out,
        "<Override PartName=\"/xl/workbook.xml\" ContentType=\"{CT}.sheet.main+xml\"/>"
    )?;
    for n in 1..=sheet_count {
        write!(
            out,
            "<Override PartName=\"/{}\" ContentType=\"{CT}.worksheet+xml\"/>",
            sheet_part_name(n)
        )?;
    }
    write!(
        out,
        "<Override PartName=\"/xl/styles.xml\" ContentType=\"{CT}.styles+xml\"/>"
    )?;
    if has_shared_strings {
        write!(
            out,
            "<Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"{CT}.sharedStrings+xml\"/>"
        )?;
    }
    out.write_all(b"</Types>")?;
    Ok(())
}
