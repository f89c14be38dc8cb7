//! Cell values as seen through a loaded document.

use crate::{alice_bob, worksheet, Fixture, SHARED_STRINGS};
use pretty_assertions::assert_eq;
use quill_sheets_core::{CachedValue, CellError, CellValue, ValueRef};
use quill_sheets_xlsx::XlsxReader;

#[test]
fn test_alice_bob() {
    let doc = XlsxReader::read(alice_bob().build()).expect("Failed to read workbook");
    let sheet = doc.sheet(0).expect("No worksheet");

    assert_eq!(sheet.name(), "Data");
    assert_eq!(sheet.cell(0, 0).value().unwrap(), CellValue::text("Alice"));
    assert_eq!(sheet.cell(1, 0).value().unwrap(), CellValue::Number(42.5));
    assert_eq!(sheet.cell(0, 1).value().unwrap(), CellValue::text("Bob"));
    assert_eq!(sheet.cell(5, 5).value().unwrap(), CellValue::Empty);
    assert!(!sheet.cell(5, 5).exists());
}

#[test]
fn test_shared_index_is_kept_raw() {
    let doc = XlsxReader::read(alice_bob().build()).unwrap();
    let sheet = doc.sheet(0).unwrap();

    assert_eq!(sheet.cell(0, 1).value_ref(), &ValueRef::Shared(1));
    assert_eq!(doc.shared_strings().len(), 2);
}

#[test]
fn test_value_types() {
    let fixture = Fixture::new().sheet(
        "Types",
        worksheet(
            r#"<row r="1">
<c r="A1" t="inlineStr"><is><t>inline</t></is></c>
<c r="B1" t="b"><v>1</v></c>
<c r="C1" t="e"><v>#DIV/0!</v></c>
<c r="D1"><v>-3.25E2</v></c>
<c r="E1" t="str"><f>A1&amp;"!"</f><v>inline!</v></c>
<c r="F1"><f>SUM(D1:D1)</f><v>-325</v></c>
<c r="G1" t="b"><f>D1&lt;0</f><v>1</v></c>
<c r="H1"><f>NOW()</f></c>
<c r="I1" s="0"/>
</row>"#,
        ),
    );
    let doc = XlsxReader::read(fixture.build()).unwrap();
    let sheet = doc.sheet(0).unwrap();

    assert_eq!(sheet.cell(0, 0).value().unwrap(), CellValue::text("inline"));
    assert_eq!(sheet.cell(1, 0).value().unwrap(), CellValue::Boolean(true));
    assert_eq!(
        sheet.cell(2, 0).value().unwrap(),
        CellValue::Error(CellError::Div0)
    );
    assert_eq!(sheet.cell(3, 0).value().unwrap(), CellValue::Number(-325.0));
    assert_eq!(
        sheet.cell(4, 0).value().unwrap(),
        CellValue::Formula {
            text: "A1&\"!\"".into(),
            cached: Some(CachedValue::Text("inline!".into())),
        }
    );
    assert_eq!(
        sheet.cell(5, 0).value().unwrap(),
        CellValue::Formula {
            text: "SUM(D1:D1)".into(),
            cached: Some(CachedValue::Number(-325.0)),
        }
    );
    assert_eq!(
        sheet.cell(6, 0).value().unwrap(),
        CellValue::Formula {
            text: "D1<0".into(),
            cached: Some(CachedValue::Boolean(true)),
        }
    );
    assert_eq!(
        sheet.cell(7, 0).value().unwrap(),
        CellValue::Formula {
            text: "NOW()".into(),
            cached: None,
        }
    );

    // A styled cell without a value is still stored
    assert!(sheet.cell(8, 0).exists());
    assert_eq!(sheet.cell(8, 0).value().unwrap(), CellValue::Empty);
}

#[test]
fn test_rich_text_shared_strings() {
    let sst = r#"<?xml version="1.0" encoding="UTF-8"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
<si><r><rPr><b/></rPr><t>Hello</t></r><r><t xml:space="preserve"> world</t></r></si>
<si><t>tab_x0009_here</t><rPh sb="0" eb="1"><t>ignored</t></rPh></si>
</sst>"#;
    let fixture = Fixture::new()
        .entry(SHARED_STRINGS, sst)
        .sheet(
            "Rich",
            worksheet(r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>"#),
        );
    let doc = XlsxReader::read(fixture.build()).unwrap();
    let sheet = doc.sheet(0).unwrap();

    assert_eq!(sheet.cell(0, 0).value().unwrap(), CellValue::text("Hello world"));
    assert_eq!(sheet.cell(1, 0).value().unwrap(), CellValue::text("tab\there"));
}

#[test]
fn test_shared_formulas() {
    let fixture = Fixture::new().sheet(
        "Shared",
        worksheet(
            r#"<row r="1"><c r="A1"><v>1</v></c><c r="B1"><f t="shared" ref="B1:B3" si="0">A1+$A$1</f><v>2</v></c></row>
<row r="2"><c r="A2"><v>2</v></c><c r="B2"><f t="shared" si="0"/><v>3</v></c></row>
<row r="3"><c r="A3"><v>3</v></c><c r="B3"><f t="shared" si="0"/><v>4</v></c></row>"#,
        ),
    );
    let doc = XlsxReader::read(fixture.build()).unwrap();
    let sheet = doc.sheet(0).unwrap();

    let formulas: Vec<String> = (0..3)
        .map(|row| {
            sheet
                .cell(1, row)
                .value()
                .unwrap()
                .formula_text()
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(formulas, vec!["A1+$A$1", "A2+$A$1", "A3+$A$1"]);
}

#[test]
fn test_date_1904_flag() {
    let fixture = alice_bob().date_1904();
    let doc = XlsxReader::read(fixture.build()).unwrap();
    assert!(doc.date_1904());

    let doc = XlsxReader::read(alice_bob().build()).unwrap();
    assert!(!doc.date_1904());
}

#[test]
fn test_iso_dates_become_serials() {
    let fixture = Fixture::new().sheet(
        "Dates",
        worksheet(r#"<row r="1"><c r="A1" t="d"><v>2024-01-15T12:00:00</v></c></row>"#),
    );
    let doc = XlsxReader::read(fixture.build()).unwrap();
    let value = doc.sheet(0).unwrap().cell(0, 0).value().unwrap();

    assert_eq!(value, CellValue::Number(45306.5));
    let date = value.as_datetime(false).unwrap();
    assert_eq!(date.to_string(), "2024-01-15 12:00:00");
}

#[test]
fn test_rows_without_numbers_follow_on() {
    let fixture = Fixture::new().sheet(
        "Implicit",
        worksheet(r#"<row><c><v>1</v></c><c><v>2</v></c></row><row><c t="b"><v>0</v></c></row>"#),
    );
    let doc = XlsxReader::read(fixture.build()).unwrap();
    let sheet = doc.sheet(0).unwrap();

    assert_eq!(sheet.cell(0, 0).value().unwrap(), CellValue::Number(1.0));
    assert_eq!(sheet.cell(1, 0).value().unwrap(), CellValue::Number(2.0));
    assert_eq!(sheet.cell(0, 1).value().unwrap(), CellValue::Boolean(false));
}
