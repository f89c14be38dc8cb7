//! Container opening and table loading shared by the eager and streaming readers

use std::io::{BufRead, Read, Seek};

use quill_sheets_core::{SharedStringTable, SheetVisibility, StyleRegistry, Table};

use super::rows::RowReader;
use crate::container::{Container, RelKind};
use crate::error::{PartContext, XlsxError, XlsxResult};
use crate::shared_strings::read_shared_strings;
use crate::styles::read_styles;
use crate::workbook::read_workbook;

const DEFAULT_SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const DEFAULT_STYLES: &str = "xl/styles.xml";

/// Where a sheet's cells live
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetPart {
    pub name: String,
    pub visibility: SheetVisibility,
    /// `None` for sheets without a worksheet part (chartsheets)
    pub part: Option<String>,
}

/// A sheet opened for reading together with the tables its cells refer to
pub(crate) struct OpenSheet<'a> {
    pub sheet: &'a SheetPart,
    /// `None` for sheets without a worksheet part
    pub reader: Option<RowReader<Box<dyn BufRead + 'a>>>,
    pub shared_strings: &'a SharedStringTable,
    pub styles: &'a StyleRegistry,
}

/// An opened container with its tables loaded and sheets located
pub(crate) struct Package<R> {
    container: Container<R>,
    sheets: Vec<SheetPart>,
    shared_strings: SharedStringTable,
    styles: StyleRegistry,
    date_1904: bool,
}

impl<R: Read + Seek> Package<R> {
    /// Open the container, read the manifest, then the shared strings and
    /// styles
    ///
    /// Sheet parts are located but not read.
    pub(crate) fn open(reader: R) -> XlsxResult<Self> {
        let mut container = Container::open(reader)?;

        let workbook_part = container.workbook_part()?;
        let manifest = {
            let source = container.open_entry(&workbook_part)?;
            read_workbook(source).in_part(&workbook_part)?
        };
        if manifest.sheets.is_empty() {
            return Err(XlsxError::corrupt(workbook_part, "workbook declares no sheets"));
        }

        let rels = container.relationships(&workbook_part)?;
        let mut shared_strings_part = None;
        let mut styles_part = None;
        for rel in &rels {
            match rel.kind {
                RelKind::SharedStrings => shared_strings_part = Some(rel.target.clone()),
                RelKind::Styles => styles_part = Some(rel.target.clone()),
                RelKind::Unknown => log::warn!(
                    "{workbook_part}: ignoring relationship {} of unknown type '{}'",
                    rel.id,
                    rel.rel_type
                ),
                _ => {}
            }
        }

        let mut sheets = Vec::with_capacity(manifest.sheets.len());
        for (i, entry) in manifest.sheets.iter().enumerate() {
            let rel = entry
                .rel_id
                .as_deref()
                .and_then(|id| rels.iter().find(|r| r.id == id));
            let part = match rel {
                Some(rel) if rel.kind == RelKind::Chartsheet => {
                    log::warn!("sheet '{}' is a chartsheet; loading it as empty", entry.name);
                    None
                }
                Some(rel) => Some(rel.target.clone()),
                None => {
                    let fallback = format!("xl/worksheets/sheet{}.xml", i + 1);
                    log::warn!(
                        "sheet '{}' has no workbook relationship; trying {fallback}",
                        entry.name
                    );
                    Some(fallback)
                }
            };
            if let Some(part) = &part {
                if !container.has_entry(part) {
                    return Err(XlsxError::corrupt(
                        workbook_part.as_str(),
                        format!("sheet '{}' points at missing part '{part}'", entry.name),
                    ));
                }
            }
            sheets.push(SheetPart {
                name: entry.name.clone(),
                visibility: entry.visibility,
                part,
            });
        }

        let shared_strings_part = shared_strings_part.or_else(|| {
            container
                .has_entry(DEFAULT_SHARED_STRINGS)
                .then(|| DEFAULT_SHARED_STRINGS.to_string())
        });
        let shared_strings = match shared_strings_part {
            Some(part) if container.has_entry(&part) => {
                let source = container.open_entry(&part)?;
                read_shared_strings(source).in_part(&part)?
            }
            Some(part) => {
                log::warn!("shared strings relationship points at missing part '{part}'");
                SharedStringTable::new()
            }
            None => {
                log::debug!("no shared strings part");
                SharedStringTable::new()
            }
        };

        let styles_part = styles_part.or_else(|| {
            container
                .has_entry(DEFAULT_STYLES)
                .then(|| DEFAULT_STYLES.to_string())
        });
        let styles = match styles_part {
            Some(part) if container.has_entry(&part) => {
                let source = container.open_entry(&part)?;
                read_styles(source).in_part(&part)?
            }
            _ => {
                log::debug!("no styles part; using the default style only");
                StyleRegistry::new()
            }
        };

        Ok(Self {
            container,
            sheets,
            shared_strings,
            styles,
            date_1904: manifest.date_1904,
        })
    }

    pub(crate) fn sheets(&self) -> &[SheetPart] {
        &self.sheets
    }

    pub(crate) fn shared_strings(&self) -> &SharedStringTable {
        &self.shared_strings
    }

    pub(crate) fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    pub(crate) fn date_1904(&self) -> bool {
        self.date_1904
    }

    /// Open sheet `index` for reading, borrowing the tables alongside
    pub(crate) fn open_sheet(&mut self, index: usize) -> XlsxResult<OpenSheet<'_>> {
        let Self {
            container,
            sheets,
            shared_strings,
            styles,
            date_1904,
        } = self;

        let sheet = sheets.get(index).ok_or_else(|| {
            XlsxError::from(quill_sheets_core::Error::out_of_range(
                Table::Sheets,
                index as u32,
                sheets.len(),
            ))
        })?;
        let reader = match &sheet.part {
            Some(part) => {
                let source = container.open_entry(part)?;
                Some(RowReader::new(part.as_str(), source, *date_1904))
            }
            None => None,
        };
        Ok(OpenSheet {
            sheet,
            reader,
            shared_strings,
            styles,
        })
    }

    /// Split into the tables, leaving the container behind
    pub(crate) fn into_tables(self) -> (SharedStringTable, StyleRegistry) {
        (self.shared_strings, self.styles)
    }
}
