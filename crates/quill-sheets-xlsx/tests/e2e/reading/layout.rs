//! Sheet geometry: dimension, merged regions, row metadata.

use crate::{worksheet, worksheet_body, Fixture};
use pretty_assertions::assert_eq;
use quill_sheets_core::{CellRange, CellValue, ErrorKind};
use quill_sheets_xlsx::{XlsxReader, XlsxStream};

#[test]
fn test_dimension_and_merged_regions() {
    let fixture = Fixture::new().sheet(
        "Merged",
        worksheet_body(
            r#"<dimension ref="A1:C4"/>
<sheetViews><sheetView workbookViewId="0"/></sheetViews>
<sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>Title</t></is></c></row>
<row r="4"><c r="C4"><v>4</v></c></row>
</sheetData>
<mergeCells count="2"><mergeCell ref="A1:C1"/><mergeCell ref="A2:A3"/></mergeCells>
<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#,
        ),
    );
    let doc = XlsxReader::read(fixture.build()).unwrap();
    let sheet = doc.sheet(0).unwrap();

    assert_eq!(
        sheet.declared_dimension(),
        Some(CellRange::parse("A1:C4").unwrap())
    );
    assert_eq!(sheet.used_range(), Some(CellRange::parse("A1:C4").unwrap()));
    assert_eq!(
        sheet.merged_regions(),
        &[
            CellRange::parse("A1:C1").unwrap(),
            CellRange::parse("A2:A3").unwrap()
        ]
    );
    assert_eq!(sheet.cell(0, 0).value().unwrap(), CellValue::text("Title"));
}

#[test]
fn test_stale_dimension_is_kept_as_declared() {
    let fixture = Fixture::new().sheet(
        "Stale",
        worksheet_body(
            r#"<dimension ref="A1:Z100"/><sheetData><row r="2"><c r="B2"><v>1</v></c></row></sheetData>"#,
        ),
    );
    let doc = XlsxReader::read(fixture.build()).unwrap();
    let sheet = doc.sheet(0).unwrap();

    assert_eq!(
        sheet.declared_dimension(),
        Some(CellRange::parse("A1:Z100").unwrap())
    );
    assert_eq!(sheet.used_range(), Some(CellRange::parse("B2").unwrap()));
}

#[test]
fn test_row_metadata() {
    let fixture = Fixture::new().sheet(
        "Rows",
        worksheet(
            r#"<row r="1" ht="30" customHeight="1"><c r="A1"><v>1</v></c></row>
<row r="2" hidden="1"/>
<row r="3" ht="15"><c r="A3"><v>3</v></c></row>"#,
        ),
    );
    let doc = XlsxReader::read(fixture.build()).unwrap();
    let sheet = doc.sheet(0).unwrap();

    let tall = sheet.row(0).unwrap();
    assert_eq!(tall.height, Some(30.0));
    assert!(!tall.hidden);

    let hidden = sheet.row(1).unwrap();
    assert!(hidden.hidden);
    assert!(hidden.is_empty());

    // ht without customHeight is the application's default, not a setting
    assert_eq!(sheet.row(2).unwrap().height, None);
}

#[test]
fn test_repeated_row_is_corrupt_in_both_modes() {
    let fixture = Fixture::new().sheet(
        "Twice",
        worksheet(
            r#"<row r="2"><c r="A2"><v>1</v></c></row><row r="2"><c r="B2"><v>2</v></c></row>"#,
        ),
    );

    let err = XlsxReader::read(fixture.build()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    assert_eq!(err.part(), Some("xl/worksheets/sheet1.xml"));

    let mut stream = XlsxStream::new(fixture.build()).unwrap();
    let mut rows = stream.rows(0).unwrap();
    let first = rows.next().unwrap().unwrap();
    assert_eq!((first.index, first.cells.len()), (1, 1));
    let err = rows.next().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    assert!(rows.next().is_none());
}

#[test]
fn test_rows_out_of_order_are_corrupt() {
    let fixture = Fixture::new().sheet(
        "Backwards",
        worksheet(r#"<row r="5"><c r="A5"><v>5</v></c></row><row r="3"><c r="A3"><v>3</v></c></row>"#),
    );
    let err = XlsxReader::read(fixture.build()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    assert!(err.to_string().contains("row 3"), "{err}");
}

#[test]
fn test_overlapping_merges_keep_the_first() {
    let fixture = Fixture::new().sheet(
        "Overlap",
        worksheet_body(
            r#"<sheetData/><mergeCells count="2"><mergeCell ref="A1:B2"/><mergeCell ref="B2:C3"/></mergeCells>"#,
        ),
    );
    let doc = XlsxReader::read(fixture.build()).unwrap();
    assert_eq!(
        doc.sheet(0).unwrap().merged_regions(),
        &[CellRange::parse("A1:B2").unwrap()]
    );
}
