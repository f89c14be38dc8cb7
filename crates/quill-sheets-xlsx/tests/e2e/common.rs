//! Common utilities for E2E tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const CONTENT_TYPES: &str = "[Content_Types].xml";
pub const ROOT_RELS: &str = "_rels/.rels";
pub const WORKBOOK: &str = "xl/workbook.xml";
pub const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
pub const SHARED_STRINGS: &str = "xl/sharedStrings.xml";
pub const STYLES: &str = "xl/styles.xml";

pub const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Part name of the n-th (1-based) worksheet
pub fn sheet_part(n: usize) -> String {
    format!("xl/worksheets/sheet{n}.xml")
}

/// A worksheet part wrapping the given `<sheetData>` children
pub fn worksheet(rows: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheetData>{rows}</sheetData></worksheet>"#
    )
}

/// A worksheet part with arbitrary body content (dimension, merges, ...)
pub fn worksheet_body(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{MAIN_NS}" xmlns:r="{REL_NS}">{body}</worksheet>"#
    )
}

/// A shared-strings part holding plain `<t>` items
pub fn shared_strings(items: &[&str]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="{MAIN_NS}" count="{0}" uniqueCount="{0}">"#,
        items.len()
    );
    for item in items {
        xml.push_str(&format!("<si><t>{item}</t></si>"));
    }
    xml.push_str("</sst>");
    xml
}

/// A styles part with `xf_count` plain cell formats
pub fn plain_styles(xf_count: usize) -> String {
    let xfs = r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#.repeat(xf_count);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="{MAIN_NS}"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border/></borders><cellXfs count="{xf_count}">{xfs}</cellXfs></styleSheet>"#
    )
}

/// One sheet declared by a fixture workbook
#[derive(Debug, Clone)]
struct FixtureSheet {
    name: String,
    state: Option<String>,
    chartsheet: bool,
}

/// In-memory xlsx container builder
///
/// Unless a test overrides them, the workbook, its relationships, the root
/// relationships and the content types are generated from the declared
/// sheets and whichever table parts were added.
#[derive(Debug, Default)]
pub struct Fixture {
    sheets: Vec<FixtureSheet>,
    entries: Vec<(String, Vec<u8>)>,
    removed: Vec<String>,
    date_1904: bool,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a worksheet and store its part
    pub fn sheet(mut self, name: &str, xml: impl Into<String>) -> Self {
        self.sheets.push(FixtureSheet {
            name: name.to_string(),
            state: None,
            chartsheet: false,
        });
        let part = sheet_part(self.sheets.len());
        self.entry(&part, xml.into())
    }

    /// Declare a worksheet with a `state` attribute
    pub fn sheet_with_state(mut self, name: &str, state: &str, xml: impl Into<String>) -> Self {
        self = self.sheet(name, xml);
        if let Some(last) = self.sheets.last_mut() {
            last.state = Some(state.to_string());
        }
        self
    }

    /// Declare a chartsheet; no part is stored for it
    pub fn chartsheet(mut self, name: &str) -> Self {
        self.sheets.push(FixtureSheet {
            name: name.to_string(),
            state: None,
            chartsheet: true,
        });
        self
    }

    pub fn shared_strings(self, items: &[&str]) -> Self {
        self.entry(SHARED_STRINGS, shared_strings(items))
    }

    pub fn styles(self, xml: impl Into<String>) -> Self {
        self.entry(STYLES, xml.into())
    }

    pub fn date_1904(mut self) -> Self {
        self.date_1904 = true;
        self
    }

    /// Store an entry verbatim, replacing any generated one of that name
    pub fn entry(mut self, name: &str, content: impl Into<Vec<u8>>) -> Self {
        self.entries.retain(|(n, _)| n != name);
        self.entries.push((name.to_string(), content.into()));
        self
    }

    /// Leave an entry out of the container, generated or not
    pub fn without(mut self, name: &str) -> Self {
        self.removed.push(name.to_string());
        self
    }

    pub fn build(&self) -> Cursor<Vec<u8>> {
        let mut generated = vec![
            (CONTENT_TYPES.to_string(), self.content_types().into_bytes()),
            (ROOT_RELS.to_string(), self.root_rels().into_bytes()),
            (WORKBOOK.to_string(), self.workbook().into_bytes()),
            (WORKBOOK_RELS.to_string(), self.workbook_rels().into_bytes()),
        ];
        generated.retain(|(name, _)| !self.has_entry(name));

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in generated.iter().chain(self.entries.iter()) {
            if self.removed.contains(name) {
                continue;
            }
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(content).unwrap();
        }
        let mut cursor = zip.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    fn has_entry(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    fn content_types(&self) -> String {
        String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/></Types>"#,
        )
    }

    fn root_rels(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PACKAGE_REL_NS}"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
        )
    }

    fn workbook(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}">"#
        );
        if self.date_1904 {
            xml.push_str(r#"<workbookPr date1904="1"/>"#);
        }
        if self.sheets.is_empty() {
            xml.push_str("<sheets/>");
        } else {
            xml.push_str("<sheets>");
            for (i, sheet) in self.sheets.iter().enumerate() {
                xml.push_str(&format!(
                    r#"<sheet name="{}" sheetId="{}" r:id="rId{}""#,
                    sheet.name,
                    i + 1,
                    i + 1
                ));
                if let Some(state) = &sheet.state {
                    xml.push_str(&format!(r#" state="{state}""#));
                }
                xml.push_str("/>");
            }
            xml.push_str("</sheets>");
        }
        xml.push_str("</workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PACKAGE_REL_NS}">"#
        );
        let mut chart_count = 0;
        for (i, sheet) in self.sheets.iter().enumerate() {
            let (kind, target) = if sheet.chartsheet {
                chart_count += 1;
                ("chartsheet", format!("chartsheets/sheet{chart_count}.xml"))
            } else {
                ("worksheet", format!("worksheets/sheet{}.xml", i + 1))
            };
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{REL_NS}/{kind}" Target="{target}"/>"#,
                i + 1
            ));
        }
        let mut next = self.sheets.len() + 1;
        if self.has_entry(STYLES) {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{next}" Type="{REL_NS}/styles" Target="styles.xml"/>"#
            ));
            next += 1;
        }
        if self.has_entry(SHARED_STRINGS) {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{next}" Type="{REL_NS}/sharedStrings" Target="sharedStrings.xml"/>"#
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// The two-cell workbook most reading tests start from
///
/// Sheet "Data": A1 = shared string 0 ("Alice"), B1 = 42.5,
/// A2 = shared string 1 ("Bob").
pub fn alice_bob() -> Fixture {
    Fixture::new().shared_strings(&["Alice", "Bob"]).sheet(
        "Data",
        worksheet(
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>42.5</v></c></row><row r="2"><c r="A2" t="s"><v>1</v></c></row>"#,
        ),
    )
}
