//! Streaming tests - `XlsxStream` against the eager reader.

use crate::{alice_bob, plain_styles, worksheet, worksheet_body, Fixture, SHARED_STRINGS};
use pretty_assertions::assert_eq;
use quill_sheets_core::{CellRange, CellValue, ErrorKind, ResolvedRow};
use quill_sheets_xlsx::{ReaderState, XlsxReader, XlsxResult, XlsxStream};

fn mixed() -> Fixture {
    Fixture::new()
        .shared_strings(&["Alice", "Bob", "Carol"])
        .styles(plain_styles(2))
        .sheet(
            "People",
            worksheet_body(
                r#"<dimension ref="A1:C5"/><sheetData>
<row r="1" ht="20" customHeight="1"><c r="A1" t="s"><v>0</v></c><c r="B1" s="1"><v>30</v></c></row>
<row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2"><v>41</v></c><c r="C2" t="b"><v>1</v></c></row>
<row r="3" hidden="1"/>
<row r="5"><c r="A5" t="s"><v>2</v></c><c r="C5"><f>B1+B2</f><v>71</v></c></row>
</sheetData><mergeCells count="1"><mergeCell ref="A3:C3"/></mergeCells>"#,
            ),
        )
        .sheet("Second", worksheet(r#"<row r="1"><c r="A1"><v>7</v></c></row>"#))
}

#[test]
fn test_streaming_matches_eager() {
    let fixture = mixed();
    let doc = XlsxReader::read(fixture.build()).unwrap();
    let mut stream = XlsxStream::new(fixture.build()).unwrap();

    for index in 0..doc.sheet_count() {
        let eager: Vec<ResolvedRow> = doc
            .sheet(index)
            .unwrap()
            .rows()
            .collect::<Result<_, _>>()
            .unwrap();
        let streamed: Vec<ResolvedRow> = stream
            .rows(index)
            .unwrap()
            .collect::<XlsxResult<_>>()
            .unwrap();
        assert_eq!(streamed, eager, "sheet {index}");
    }
}

#[test]
fn test_stream_tables_and_names() {
    let stream = XlsxStream::new(mixed().build()).unwrap();

    assert_eq!(stream.sheet_count(), 2);
    assert_eq!(stream.sheet_names().collect::<Vec<_>>(), vec!["People", "Second"]);
    assert_eq!(stream.shared_strings().len(), 3);
    assert_eq!(stream.styles().len(), 2);
    assert!(!stream.date_1904());
}

#[test]
fn test_cursor_states_and_trailer() {
    let mut stream = XlsxStream::new(mixed().build()).unwrap();
    let mut rows = stream.rows_by_name("people").unwrap();

    assert_eq!(rows.sheet_name(), "People");
    assert_eq!(rows.state(), ReaderState::Idle);

    let first = rows.next_row().unwrap().unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(first.height, Some(20.0));
    assert_eq!(first.get(0), Some(&CellValue::text("Alice")));
    assert_eq!(rows.state(), ReaderState::Positioned(0));
    assert_eq!(rows.dimension(), Some(CellRange::parse("A1:C5").unwrap()));

    let indices: Vec<u32> = rows.by_ref().map(|r| r.unwrap().index).collect();
    assert_eq!(indices, vec![1, 2, 4]);
    assert_eq!(rows.state(), ReaderState::Exhausted);
    assert_eq!(rows.rows_read(), 4);
    assert_eq!(rows.merged_regions(), &[CellRange::parse("A3:C3").unwrap()]);

    // Exhausted stays exhausted
    assert!(rows.next_row().unwrap().is_none());
}

#[test]
fn test_sheets_can_be_reopened() {
    let mut stream = XlsxStream::new(mixed().build()).unwrap();

    let first_pass = stream.rows(0).unwrap().count();
    let second_pass = stream.rows(0).unwrap().count();
    assert_eq!(first_pass, 4);
    assert_eq!(second_pass, first_pass);
}

#[test]
fn test_unknown_sheet() {
    let mut stream = XlsxStream::new(mixed().build()).unwrap();

    let err = stream.rows_by_name("Missing").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = stream.rows(9).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
}

#[test]
fn test_malformed_row_is_sticky() {
    let fixture = Fixture::new().sheet(
        "Broken",
        worksheet(
            r#"<row r="1"><c r="A1"><v>1</v></c></row><row r="2"><c r="A2"><v>not a number</v></c></row><row r="3"><c r="A3"><v>3</v></c></row>"#,
        ),
    );
    let mut stream = XlsxStream::new(fixture.build()).unwrap();
    let mut rows = stream.rows(0).unwrap();

    assert_eq!(rows.next_row().unwrap().unwrap().index, 0);

    let first = rows.next_row().unwrap_err();
    assert_eq!(first.kind(), ErrorKind::CorruptDocument);
    assert_eq!(rows.state(), ReaderState::Failed);

    // Row 3 is well formed, but the cursor never gets there
    for _ in 0..3 {
        let err = rows.next_row().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    }
}

#[test]
fn test_iterator_yields_one_error_then_ends() {
    let fixture = Fixture::new().sheet(
        "Broken",
        worksheet(r#"<row r="1"><c r="A1"><v>1</v></c></row><row r="2"><c r="A2" t="b"><v>maybe</v></c></row>"#),
    );
    let mut stream = XlsxStream::new(fixture.build()).unwrap();
    let items: Vec<XlsxResult<ResolvedRow>> = stream.rows(0).unwrap().collect();

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert_eq!(
        items[1].as_ref().err().unwrap().kind(),
        ErrorKind::CorruptDocument
    );
}

#[test]
fn test_resolve_failures_stop_the_cursor() {
    let fixture = Fixture::new().styles(plain_styles(3)).sheet(
        "Styled",
        worksheet(
            r#"<row r="1"><c r="A1" s="9999"><v>1</v></c></row><row r="2"><c r="A2"><v>2</v></c></row>"#,
        ),
    );
    let mut stream = XlsxStream::new(fixture.build()).unwrap();
    let mut rows = stream.rows(0).unwrap();

    let err = rows.next_row().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
    assert_eq!(rows.state(), ReaderState::Failed);
    assert_eq!(rows.next_row().unwrap_err().kind(), ErrorKind::CorruptDocument);
}

#[test]
fn test_dangling_shared_index_while_streaming() {
    let mut stream = XlsxStream::new(alice_bob().without(SHARED_STRINGS).build()).unwrap();
    let mut rows = stream.rows(0).unwrap();

    let err = rows.next_row().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptDocument);
    assert_eq!(err.part(), Some("xl/worksheets/sheet1.xml"));
}

#[test]
fn test_large_sheet_streams_in_order() {
    let mut rows = String::new();
    for r in 1..=2000 {
        rows.push_str(&format!(
            r#"<row r="{r}"><c r="A{r}"><v>{r}</v></c><c r="B{r}" t="inlineStr"><is><t>row {r}</t></is></c></row>"#
        ));
    }
    let fixture = Fixture::new().sheet("Big", worksheet(&rows));
    let mut stream = XlsxStream::new(fixture.build()).unwrap();

    let mut expected = 0u32;
    let mut total = 0.0;
    for row in stream.rows(0).unwrap() {
        let row = row.unwrap();
        assert_eq!(row.index, expected);
        total += row.get(0).and_then(CellValue::as_number).unwrap();
        expected += 1;
    }
    assert_eq!(expected, 2000);
    assert_eq!(total, (1..=2000).sum::<u32>() as f64);
}
