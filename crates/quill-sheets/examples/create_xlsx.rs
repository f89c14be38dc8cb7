//! Example: Create an xlsx file, then stream it back

use quill_sheets::prelude::*;

fn main() -> std::result::Result<(), XlsxError> {
    let mut doc = Document::new();
    let header = doc.register_style(
        StyleDescriptor::new()
            .bold(true)
            .fill_color(Color::rgb(0xDD, 0xEB, 0xF7)),
    );
    let money =
        doc.register_style(StyleDescriptor::new().number_format(NumberFormat::custom("#,##0.00")));

    let mut sheet = doc.sheet_mut(0)?;

    // Add header row
    sheet.set_value_at("A1", "Item")?;
    sheet.set_value_at("B1", "Price")?;
    sheet.set_style(0, 0, header)?;
    sheet.set_style(1, 0, header)?;

    // Add data rows
    for (i, (item, price)) in [("Widget", 4.5), ("Gadget", 12.25), ("Gizmo", 99.0)]
        .into_iter()
        .enumerate()
    {
        let row = i as u32 + 1;
        sheet.set_value(0, row, item)?;
        sheet.set_value(1, row, price)?;
        sheet.set_style(1, row, money)?;
    }
    sheet.set_value_at("B5", CellValue::formula("=SUM(B2:B4)"))?;

    // Save the file
    let path = std::env::temp_dir().join("quill-sheets-example.xlsx");
    doc.save(&path)?;
    println!("Saved {}", path.display());

    // Read it back one row at a time
    let mut stream = Document::open_streaming(&path)?;
    for row in stream.rows(0)? {
        let row = row?;
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|c| match &c.value {
                CellValue::Text(s) => s.as_str().to_string(),
                CellValue::Number(n) => n.to_string(),
                other => format!("{other:?}"),
            })
            .collect();
        println!("row {}: {}", row.index + 1, cells.join(" | "));
    }

    Ok(())
}
