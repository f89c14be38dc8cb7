//! Writing tests - save with `XlsxWriter`, then read back.

use std::io::{Cursor, Read};

use pretty_assertions::assert_eq;
use quill_sheets_core::{
    Border, BorderLineStyle, CachedValue, CellError, CellRange, CellValue, Color, Document,
    ErrorKind, HorizontalAlignment, NumberFormat, SheetVisibility, StyleDescriptor,
};
use quill_sheets_xlsx::{Compression, WriteOptions, XlsxReader, XlsxWriter};

fn sample() -> Document {
    let mut doc = Document::new();
    let header = doc.register_style(
        StyleDescriptor::new()
            .bold(true)
            .font_size(14.0)
            .fill_color(Color::YELLOW)
            .border(Border::all(BorderLineStyle::Thin, Color::BLACK))
            .horizontal_alignment(HorizontalAlignment::Center),
    );
    let date =
        doc.register_style(StyleDescriptor::new().number_format(NumberFormat::custom("yyyy-mm-dd")));
    let red = doc.register_style(StyleDescriptor::new().font_color(Color::RED).wrap_text(true));

    {
        let mut sheet = doc.sheet_mut(0).unwrap();
        sheet.set_value_at("A1", "Name").unwrap();
        sheet.set_value_at("B1", "Joined").unwrap();
        sheet.set_style(0, 0, header).unwrap();
        sheet.set_style(1, 0, header).unwrap();

        sheet.set_value(0, 1, "Alice").unwrap();
        sheet.set_value(1, 1, 45306.0).unwrap();
        sheet.set_style(1, 1, date).unwrap();
        sheet.set_value(0, 2, "  Bob\tjr. <b> & co  ").unwrap();
        sheet.set_value(1, 2, true).unwrap();
        sheet.set_value(2, 2, CellValue::Error(CellError::Na)).unwrap();
        sheet.set_style(2, 2, red).unwrap();
        sheet
            .set_value(
                3,
                2,
                CellValue::Formula {
                    text: "B2+1".into(),
                    cached: Some(CachedValue::Number(45307.0)),
                },
            )
            .unwrap();
        sheet.set_value(4, 2, CellValue::formula("=A2&\"!\"")).unwrap();

        let row = sheet.row_mut(5).unwrap();
        row.height = Some(32.5);
        row.hidden = true;
        sheet
            .sheet_mut()
            .merge_cells(CellRange::parse("A1:B1").unwrap())
            .unwrap();
    }

    let index = doc.add_sheet("Hidden notes").unwrap();
    let mut notes = doc.sheet_mut(index).unwrap();
    notes.set_value(0, 0, "Alice").unwrap();
    notes.sheet_mut().set_visibility(SheetVisibility::Hidden);
    doc.set_date_1904(true);
    doc
}

fn write_to_vec(doc: &Document, options: WriteOptions) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    XlsxWriter::write_with(doc, &mut out, options).unwrap();
    out.into_inner()
}

/// Every cell of `a` resolves to the same value and style in `b`
fn assert_same_content(a: &Document, b: &Document) {
    assert_eq!(a.sheet_count(), b.sheet_count());
    assert_eq!(a.date_1904(), b.date_1904());
    for (left, right) in a.sheets().zip(b.sheets()) {
        assert_eq!(left.name(), right.name());
        assert_eq!(left.visibility(), right.visibility());
        assert_eq!(left.merged_regions(), right.merged_regions());
        assert_eq!(left.cell_count(), right.cell_count(), "sheet {}", left.name());
        for cell in left.cells() {
            let l = left.cell(cell.col, cell.row);
            let r = right.cell(cell.col, cell.row);
            let at = cell.address().to_string();
            assert_eq!(l.value().unwrap(), r.value().unwrap(), "value at {at}");
            assert_eq!(l.style().unwrap(), r.style().unwrap(), "style at {at}");
        }
        for row in left.sheet().rows() {
            let other = right.row(row.index()).unwrap();
            assert_eq!(row.height, other.height);
            assert_eq!(row.hidden, other.hidden);
        }
    }
}

#[test]
fn test_round_trip() {
    let doc = sample();
    let bytes = write_to_vec(&doc, WriteOptions::default());
    let back = XlsxReader::read(Cursor::new(bytes)).unwrap();

    assert_same_content(&doc, &back);
    assert_eq!(back.shared_strings().len(), doc.shared_strings().len());
    assert_eq!(back.styles().len(), doc.styles().len());
}

#[test]
fn test_round_trip_is_stable() {
    let doc = sample();
    let first =
        XlsxReader::read(Cursor::new(write_to_vec(&doc, WriteOptions::default()))).unwrap();
    let second =
        XlsxReader::read(Cursor::new(write_to_vec(&first, WriteOptions::default()))).unwrap();

    assert_same_content(&first, &second);
    for (a, b) in first.sheets().zip(second.sheets()) {
        let raw_a: Vec<_> = a.cells().cloned().collect();
        let raw_b: Vec<_> = b.cells().cloned().collect();
        assert_eq!(raw_a, raw_b);
    }
}

#[test]
fn test_formula_text_and_empty_cached_text_round_trip() {
    let mut doc = Document::new();
    {
        let mut sheet = doc.sheet_mut(0).unwrap();
        sheet
            .set_value_at(
                "A1",
                CellValue::Formula {
                    text: "IF(B1,\"\",\"x\")".into(),
                    cached: Some(CachedValue::Text(String::new())),
                },
            )
            .unwrap();
        sheet
            .set_value_at("A2", CellValue::formula("\"tab\u{1}_x0041_\"&B2"))
            .unwrap();
    }

    let back = XlsxReader::read(Cursor::new(write_to_vec(&doc, WriteOptions::default()))).unwrap();
    assert_same_content(&doc, &back);

    let sheet = back.sheet(0).unwrap();
    assert_eq!(
        sheet.cell(0, 0).value().unwrap(),
        CellValue::Formula {
            text: "IF(B1,\"\",\"x\")".into(),
            cached: Some(CachedValue::Text(String::new())),
        }
    );
    assert_eq!(
        sheet.cell(0, 1).value().unwrap().formula_text(),
        Some("\"tab\u{1}_x0041_\"&B2")
    );
}

#[test]
fn test_builtin_format_in_custom_range_is_rejected() {
    let mut doc = Document::new();
    let custom =
        doc.register_style(StyleDescriptor::new().number_format(NumberFormat::custom("0.000")));
    let clashing =
        doc.register_style(StyleDescriptor::new().number_format(NumberFormat::BuiltIn(164)));
    {
        let mut sheet = doc.sheet_mut(0).unwrap();
        sheet.set_value(0, 0, 1.5).unwrap();
        sheet.set_style(0, 0, custom).unwrap();
        sheet.set_value(1, 0, 2.5).unwrap();
        sheet.set_style(1, 0, clashing).unwrap();
    }

    let mut out = Cursor::new(Vec::new());
    let err = XlsxWriter::write(&doc, &mut out).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    assert!(out.get_ref().is_empty());
}

#[test]
fn test_stored_compression() {
    let doc = sample();
    let bytes = write_to_vec(&doc, WriteOptions::new().compression(Compression::Stored));

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
    let mut workbook = String::new();
    {
        let mut entry = archive.by_name("xl/workbook.xml").unwrap();
        assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
        entry.read_to_string(&mut workbook).unwrap();
    }
    assert!(
        workbook.contains(r#"<sheet name="Hidden notes" sheetId="2" state="hidden""#),
        "{workbook}"
    );
    assert!(workbook.contains(r#"date1904="1""#), "{workbook}");

    let back = XlsxReader::read(Cursor::new(bytes)).unwrap();
    assert_same_content(&doc, &back);
}

#[test]
fn test_shared_strings_part_only_when_needed() {
    let mut doc = Document::new();
    doc.sheet_mut(0).unwrap().set_value(0, 0, 1.5).unwrap();
    let bytes = write_to_vec(&doc, WriteOptions::default());

    let archive = zip::ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
    assert!(!archive.file_names().any(|n| n == "xl/sharedStrings.xml"));

    let back = XlsxReader::read(Cursor::new(bytes)).unwrap();
    assert_eq!(
        back.sheet(0).unwrap().cell(0, 0).value().unwrap(),
        CellValue::Number(1.5)
    );
}

#[test]
fn test_write_file_and_read_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.xlsx");
    let doc = sample();

    XlsxWriter::write_file(&doc, &path).unwrap();
    let back = XlsxReader::read_file(&path).unwrap();
    assert_same_content(&doc, &back);

    // Only the destination is left behind
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_failed_save_keeps_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keep.xlsx");
    let doc = sample();
    XlsxWriter::write_file(&doc, &path).unwrap();
    let before = std::fs::read(&path).unwrap();

    let mut broken = Document::new();
    broken.sheet_mut(0).unwrap().set_value(0, 0, f64::INFINITY).unwrap();
    let err = XlsxWriter::write_file(&broken, &path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);

    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_overwrite_replaces_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replace.xlsx");
    XlsxWriter::write_file(&sample(), &path).unwrap();

    let mut small = Document::new();
    small.sheet_mut(0).unwrap().set_value(0, 0, "only").unwrap();
    XlsxWriter::write_file_with(&small, &path, WriteOptions::new().atomic(false)).unwrap();

    let back = XlsxReader::read_file(&path).unwrap();
    assert_eq!(back.sheet_count(), 1);
    assert_same_content(&small, &back);
}

#[test]
fn test_missing_directory_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no").join("such").join("dir.xlsx");
    let err = XlsxWriter::write_file(&sample(), &path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
