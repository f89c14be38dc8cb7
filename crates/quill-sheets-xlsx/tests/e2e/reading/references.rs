//! Shared-string and style indices, resolved lazily or checked at load.

use crate::{alice_bob, plain_styles, worksheet, Fixture, MAIN_NS, SHARED_STRINGS};
use pretty_assertions::assert_eq;
use quill_sheets_core::{CellValue, Color, ErrorKind, HorizontalAlignment, PatternType};
use quill_sheets_xlsx::{ReadOptions, XlsxReader};

#[test]
fn test_missing_shared_strings_without_references() {
    let fixture = Fixture::new().sheet(
        "Numbers",
        worksheet(r#"<row r="1"><c r="A1"><v>1</v></c><c r="B1" t="inlineStr"><is><t>x</t></is></c></row>"#),
    );
    let doc = XlsxReader::read(fixture.build()).unwrap();

    assert!(doc.shared_strings().is_empty());
    assert_eq!(doc.sheet(0).unwrap().cell(1, 0).value().unwrap(), CellValue::text("x"));
}

#[test]
fn test_dangling_shared_index_fails_on_resolve() {
    let fixture = alice_bob().without(SHARED_STRINGS);
    let doc = XlsxReader::read(fixture.build()).unwrap();
    let sheet = doc.sheet(0).unwrap();

    let err = sheet.cell(0, 0).value().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptDocument);

    // Cells that do not touch the table still resolve
    assert_eq!(sheet.cell(1, 0).value().unwrap(), CellValue::Number(42.5));
}

#[test]
fn test_dangling_shared_index_with_validation() {
    let fixture = alice_bob().without(SHARED_STRINGS);
    let options = ReadOptions::new().validate_references(true);
    let err = XlsxReader::read_with(fixture.build(), options).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    assert_eq!(err.part(), Some("xl/worksheets/sheet1.xml"));
    assert!(err.to_string().contains("A1"), "{err}");
}

#[test]
fn test_style_index_out_of_range() {
    let fixture = Fixture::new().styles(plain_styles(3)).sheet(
        "Styled",
        worksheet(r#"<row r="1"><c r="A1" s="9999"><v>1</v></c><c r="B1" s="2"><v>2</v></c></row>"#),
    );
    let doc = XlsxReader::read(fixture.build()).unwrap();
    assert_eq!(doc.styles().len(), 3);

    let sheet = doc.sheet(0).unwrap();
    let bad = sheet.cell(0, 0);
    assert_eq!(bad.style().unwrap_err().kind(), ErrorKind::OutOfRange);
    assert_eq!(bad.value().unwrap_err().kind(), ErrorKind::OutOfRange);

    let good = sheet.cell(1, 0);
    assert_eq!(good.value().unwrap(), CellValue::Number(2.0));
    assert_eq!(good.style_index(), Some(2));
}

#[test]
fn test_style_index_with_validation() {
    let fixture = Fixture::new().styles(plain_styles(3)).sheet(
        "Styled",
        worksheet(r#"<row r="1"><c r="A1" s="9999"><v>1</v></c></row>"#),
    );
    let options = ReadOptions::new().validate_references(true);
    let err = XlsxReader::read_with(fixture.build(), options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptDocument);
}

#[test]
fn test_missing_styles_gives_default_only() {
    let doc = XlsxReader::read(alice_bob().build()).unwrap();
    assert_eq!(doc.styles().len(), 1);
    assert_eq!(
        doc.sheet(0).unwrap().cell(0, 0).style().unwrap(),
        doc.styles().get(0).unwrap()
    );
}

#[test]
fn test_styles_are_flattened() {
    let styles = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><styleSheet xmlns="{MAIN_NS}">
<numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd"/></numFmts>
<fonts count="2">
  <font><sz val="11"/><name val="Calibri"/></font>
  <font><b/><i/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font>
</fonts>
<fills count="3">
  <fill><patternFill patternType="none"/></fill>
  <fill><patternFill patternType="gray125"/></fill>
  <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/></patternFill></fill>
</fills>
<borders count="1"><border/></borders>
<cellXfs count="3">
  <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
  <xf numFmtId="164" fontId="1" fillId="2" borderId="0" xfId="0" applyNumberFormat="1" applyFont="1" applyFill="1"/>
  <xf numFmtId="10" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment horizontal="center" wrapText="1"/></xf>
</cellXfs>
</styleSheet>"#
    );
    let fixture = Fixture::new().styles(styles).sheet(
        "Styled",
        worksheet(r#"<row r="1"><c r="A1" s="1"><v>45306</v></c><c r="B1" s="2"><v>0.5</v></c></row>"#),
    );
    let doc = XlsxReader::read(fixture.build()).unwrap();
    let sheet = doc.sheet(0).unwrap();

    let date = sheet.cell(0, 0).style().unwrap();
    assert!(date.font.bold);
    assert!(date.font.italic);
    assert_eq!(date.font.size, 14.0);
    assert_eq!(date.font.name, "Arial");
    assert_eq!(date.font.color, Color::RED);
    assert_eq!(date.fill.pattern, PatternType::Solid);
    assert_eq!(date.fill.foreground, Color::YELLOW);
    assert_eq!(date.number_format.code(), Some("yyyy-mm-dd"));
    assert!(date.number_format.is_date_format());

    let percent = sheet.cell(1, 0).style().unwrap();
    assert_eq!(percent.number_format.code(), Some("0.00%"));
    assert_eq!(percent.alignment.horizontal, HorizontalAlignment::Center);
    assert!(percent.alignment.wrap_text);
}
