//! Forward-only row reader over one sheet part
//!
//! Only the current row is held in memory. Everything before
//! `<sheetData>` except the declared dimension is skipped, and everything
//! after it except merged regions is skipped.

use std::io::BufRead;
use std::mem;

use ahash::AHashMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quill_sheets_core::date::iso8601_to_serial;
use quill_sheets_core::{
    CachedValue, Cell, CellAddress, CellError, CellRange, Row, ValueRef, MAX_COLS, MAX_ROWS,
};

use super::formula::shift_references;
use crate::error::{PartContext, XlsxError, XlsxResult};
use crate::xml;

/// Cursor state of a row reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// No row requested yet
    Idle,
    /// Index of the row most recently yielded
    Positioned(u32),
    /// The end of the sheet data was reached
    Exhausted,
    /// A malformed sequence was hit; every later call fails
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Before `<sheetData>`
    Preamble,
    SheetData,
    /// After `</sheetData>`, collecting merged regions
    Trailer,
}

/// Structural events the sheet loop reacts to
enum SheetEvent {
    Dimension(Option<String>),
    SheetDataStart,
    SheetDataEmpty,
    SheetDataEnd,
    Row(RowAttrs, bool),
    MergeCell(Option<String>),
    Unexpected(String),
    Eof,
    Skip,
}

enum RowEvent {
    Cell(CellAttrs, bool),
    End,
    Unexpected(String),
    Eof,
    Skip,
}

#[derive(Debug, Default)]
struct RowAttrs {
    number: Option<u32>,
    height: Option<f64>,
    custom_height: bool,
    hidden: bool,
}

impl RowAttrs {
    fn parse(e: &BytesStart<'_>) -> XlsxResult<Self> {
        let mut attrs = Self::default();
        for attr in e.attributes().flatten() {
            let value = xml::value(&attr)?;
            match attr.key.local_name().as_ref() {
                b"r" => {
                    attrs.number = Some(value.parse().map_err(|_| {
                        XlsxError::corrupt("row", format!("invalid row number '{value}'"))
                    })?)
                }
                b"ht" => attrs.height = value.parse().ok(),
                b"customHeight" => attrs.custom_height = xml::is_true(&value),
                b"hidden" => attrs.hidden = xml::is_true(&value),
                _ => {}
            }
        }
        Ok(attrs)
    }
}

#[derive(Debug, Default)]
struct CellAttrs {
    reference: Option<String>,
    cell_type: Option<String>,
    style: Option<u32>,
}

impl CellAttrs {
    fn parse(e: &BytesStart<'_>) -> XlsxResult<Self> {
        let mut attrs = Self::default();
        for attr in e.attributes().flatten() {
            match attr.key.local_name().as_ref() {
                b"r" => attrs.reference = Some(xml::value(&attr)?),
                b"t" => attrs.cell_type = Some(xml::value(&attr)?),
                b"s" => {
                    let value = xml::value(&attr)?;
                    attrs.style = Some(value.parse().map_err(|_| {
                        XlsxError::corrupt("cell", format!("invalid style index '{value}'"))
                    })?);
                }
                _ => {}
            }
        }
        Ok(attrs)
    }
}

/// `<f>` element of a cell
#[derive(Debug, Default)]
struct FormulaParts {
    text: String,
    shared: bool,
    shared_index: Option<u32>,
    has_ref: bool,
}

impl FormulaParts {
    fn parse(e: &BytesStart<'_>) -> XlsxResult<Self> {
        let mut parts = Self::default();
        for attr in e.attributes().flatten() {
            match attr.key.local_name().as_ref() {
                b"t" => parts.shared = xml::value(&attr)? == "shared",
                b"si" => parts.shared_index = xml::value(&attr)?.parse().ok(),
                b"ref" => parts.has_ref = true,
                _ => {}
            }
        }
        Ok(parts)
    }
}

#[derive(Debug, Default)]
struct CellContent {
    value: Option<String>,
    formula: Option<FormulaParts>,
    inline: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Value,
    Formula,
    Inline,
}

impl CellContent {
    fn slot(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::None => None,
            Field::Value => Some(self.value.get_or_insert_with(String::new)),
            Field::Formula => self.formula.as_mut().map(|f| &mut f.text),
            Field::Inline => Some(self.inline.get_or_insert_with(String::new)),
        }
    }
}

/// Master of a shared formula group
#[derive(Debug)]
struct SharedFormula {
    text: String,
    col: u32,
    row: u32,
}

/// Row-at-a-time reader over a sheet part
///
/// Yields raw [`Row`]s; resolving them against the document tables is
/// left to the caller.
pub(crate) struct RowReader<B: BufRead> {
    part: String,
    xml: Reader<B>,
    buf: Vec<u8>,
    date_1904: bool,
    state: ReaderState,
    phase: Phase,
    last_row: Option<u32>,
    dimension: Option<CellRange>,
    merged: Vec<CellRange>,
    shared_formulas: AHashMap<u32, SharedFormula>,
    rows_read: u64,
}

impl<B: BufRead> RowReader<B> {
    pub(crate) fn new(part: impl Into<String>, source: B, date_1904: bool) -> Self {
        Self {
            part: part.into(),
            xml: xml::reader(source),
            buf: Vec::with_capacity(1024),
            date_1904,
            state: ReaderState::Idle,
            phase: Phase::Preamble,
            last_row: None,
            dimension: None,
            merged: Vec::new(),
            shared_formulas: AHashMap::new(),
            rows_read: 0,
        }
    }

    pub(crate) fn part(&self) -> &str {
        &self.part
    }

    pub(crate) fn state(&self) -> ReaderState {
        self.state
    }

    /// Dimension declared by the sheet, once it has been read
    pub(crate) fn dimension(&self) -> Option<CellRange> {
        self.dimension
    }

    /// Merged regions; complete once the reader is exhausted
    pub(crate) fn merged_regions(&self) -> &[CellRange] {
        &self.merged
    }

    pub(crate) fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Put the reader into the failed state after an error found by the caller
    pub(crate) fn fail(&mut self) {
        self.state = ReaderState::Failed;
    }

    /// Advance to the next row
    ///
    /// Returns `Ok(None)` once the sheet is exhausted. After an error the
    /// reader stays failed and every call returns `CorruptDocument`.
    pub(crate) fn next_row(&mut self) -> XlsxResult<Option<Row>> {
        match self.state {
            ReaderState::Failed => {
                return Err(XlsxError::corrupt(
                    self.part.clone(),
                    "reader is in error state after an earlier failure",
                ))
            }
            ReaderState::Exhausted => return Ok(None),
            ReaderState::Idle | ReaderState::Positioned(_) => {}
        }

        let mut buf = mem::take(&mut self.buf);
        let result = self.advance(&mut buf).in_part(&self.part);
        buf.clear();
        self.buf = buf;

        match result {
            Ok(Some(row)) => {
                self.state = ReaderState::Positioned(row.index());
                self.rows_read += 1;
                Ok(Some(row))
            }
            Ok(None) => {
                self.state = ReaderState::Exhausted;
                log::debug!(
                    "{}: {} rows, {} merged regions",
                    self.part,
                    self.rows_read,
                    self.merged.len()
                );
                Ok(None)
            }
            Err(err) => {
                self.state = ReaderState::Failed;
                Err(err)
            }
        }
    }

    fn advance(&mut self, buf: &mut Vec<u8>) -> XlsxResult<Option<Row>> {
        loop {
            let event = match self.xml.read_event_into(buf)? {
                Event::Start(e) => classify(self.phase, &e, false)?,
                Event::Empty(e) => classify(self.phase, &e, true)?,
                Event::End(e) if e.local_name().as_ref() == b"sheetData" => SheetEvent::SheetDataEnd,
                Event::Eof => SheetEvent::Eof,
                _ => SheetEvent::Skip,
            };
            buf.clear();

            match event {
                SheetEvent::Dimension(Some(reference)) => match CellRange::parse(&reference) {
                    Ok(range) => self.dimension = Some(range),
                    Err(_) => log::warn!("{}: ignoring malformed dimension '{reference}'", self.part),
                },
                SheetEvent::SheetDataStart => self.phase = Phase::SheetData,
                SheetEvent::SheetDataEmpty | SheetEvent::SheetDataEnd => self.phase = Phase::Trailer,
                SheetEvent::Row(attrs, empty) => {
                    let mut row = self.start_row(attrs)?;
                    if !empty {
                        self.read_cells(buf, &mut row)?;
                    }
                    return Ok(Some(row));
                }
                SheetEvent::MergeCell(Some(reference)) => {
                    let range = CellRange::parse(&reference).map_err(|e| {
                        XlsxError::corrupt("mergeCell", format!("'{reference}': {e}"))
                    })?;
                    self.merged.push(range);
                }
                SheetEvent::MergeCell(None) => {
                    return Err(XlsxError::corrupt("mergeCell", "merged region without ref"))
                }
                SheetEvent::Unexpected(name) => {
                    return Err(XlsxError::corrupt(
                        "sheetData",
                        format!("unexpected <{name}> outside a row"),
                    ))
                }
                SheetEvent::Eof => {
                    return match self.phase {
                        Phase::Trailer => Ok(None),
                        Phase::SheetData => {
                            Err(XlsxError::corrupt("sheetData", "sheetData never closed"))
                        }
                        Phase::Preamble => {
                            Err(XlsxError::corrupt("worksheet", "no sheetData element"))
                        }
                    }
                }
                SheetEvent::Dimension(None) | SheetEvent::Skip => {}
            }
        }
    }

    fn start_row(&mut self, attrs: RowAttrs) -> XlsxResult<Row> {
        let index = match attrs.number {
            Some(0) => return Err(XlsxError::corrupt("row", "row number 0")),
            Some(n) => n - 1,
            None => self.last_row.map_or(0, |r| r + 1),
        };
        if index >= MAX_ROWS {
            return Err(XlsxError::corrupt(
                format!("row {}", index as u64 + 1),
                format!("beyond {MAX_ROWS} rows"),
            ));
        }
        if let Some(last) = self.last_row {
            if index <= last {
                return Err(XlsxError::corrupt(
                    format!("row {}", index + 1),
                    format!("row {} follows row {}", index + 1, last + 1),
                ));
            }
        }
        self.last_row = Some(index);

        let mut row = Row::new(index);
        if attrs.custom_height {
            row.height = attrs.height;
        }
        row.hidden = attrs.hidden;
        Ok(row)
    }

    fn read_cells(&mut self, buf: &mut Vec<u8>, row: &mut Row) -> XlsxResult<()> {
        let mut next_col = 0u32;
        loop {
            let event = match self.xml.read_event_into(buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"c" => {
                    RowEvent::Cell(CellAttrs::parse(&e)?, false)
                }
                Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                    RowEvent::Cell(CellAttrs::parse(&e)?, true)
                }
                Event::Start(e) => {
                    RowEvent::Unexpected(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
                }
                Event::End(e) if e.local_name().as_ref() == b"row" => RowEvent::End,
                Event::End(e) => RowEvent::Unexpected(format!(
                    "/{}",
                    String::from_utf8_lossy(e.local_name().as_ref())
                )),
                Event::Eof => RowEvent::Eof,
                _ => RowEvent::Skip,
            };
            buf.clear();

            match event {
                RowEvent::Cell(attrs, empty) => {
                    let address = self.cell_address(&attrs, row.index(), next_col)?;
                    next_col = address.col + 1;
                    let content = if empty {
                        CellContent::default()
                    } else {
                        self.read_cell_content(buf, &address)?
                    };
                    let value = self.build_value(&address, attrs.cell_type.as_deref(), content)?;
                    let mut cell = Cell::new(address.col, address.row, value);
                    cell.style = attrs.style;
                    row.insert(cell);
                }
                RowEvent::End => return Ok(()),
                RowEvent::Unexpected(name) => {
                    return Err(XlsxError::corrupt(
                        format!("row {}", row.index() + 1),
                        format!("unexpected <{name}> inside row"),
                    ))
                }
                RowEvent::Eof => {
                    return Err(XlsxError::corrupt(
                        format!("row {}", row.index() + 1),
                        "row never closed",
                    ))
                }
                RowEvent::Skip => {}
            }
        }
    }

    fn cell_address(&self, attrs: &CellAttrs, row: u32, next_col: u32) -> XlsxResult<CellAddress> {
        let Some(reference) = &attrs.reference else {
            if next_col >= MAX_COLS {
                return Err(XlsxError::corrupt(
                    format!("row {}", row + 1),
                    format!("more than {MAX_COLS} cells"),
                ));
            }
            return Ok(CellAddress::new(next_col, row));
        };

        let address = CellAddress::parse(reference).map_err(|e| {
            XlsxError::corrupt(format!("row {}", row + 1), format!("cell '{reference}': {e}"))
        })?;
        if address.row != row {
            return Err(XlsxError::corrupt(
                address.describe(),
                format!("cell {reference} inside row {}", row + 1),
            ));
        }
        Ok(address)
    }

    fn read_cell_content(
        &mut self,
        buf: &mut Vec<u8>,
        address: &CellAddress,
    ) -> XlsxResult<CellContent> {
        let mut content = CellContent::default();
        let mut field = Field::None;
        let mut in_inline = false;
        let mut phonetic_depth = 0u32;

        loop {
            match self.xml.read_event_into(buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"rPh" if in_inline => phonetic_depth += 1,
                    b"t" if in_inline && phonetic_depth == 0 => field = Field::Inline,
                    _ if in_inline => {}
                    b"v" => {
                        content.value.get_or_insert_with(String::new);
                        field = Field::Value;
                    }
                    b"f" => {
                        content.formula = Some(FormulaParts::parse(&e)?);
                        field = Field::Formula;
                    }
                    b"is" => {
                        in_inline = true;
                        content.inline.get_or_insert_with(String::new);
                    }
                    b"extLst" => {
                        let end = e.to_end().into_owned();
                        self.xml.read_to_end_into(end.name(), &mut Vec::new())?;
                    }
                    name => {
                        return Err(XlsxError::corrupt(
                            address.describe(),
                            format!("unexpected <{}> inside cell", String::from_utf8_lossy(name)),
                        ))
                    }
                },
                Event::Empty(e) if !in_inline => match e.local_name().as_ref() {
                    b"f" => content.formula = Some(FormulaParts::parse(&e)?),
                    b"v" => {
                        content.value.get_or_insert_with(String::new);
                    }
                    _ => {}
                },
                Event::Text(t) => {
                    if let Some(slot) = content.slot(field) {
                        slot.push_str(&t.unescape()?);
                    }
                }
                Event::CData(t) => {
                    if let Some(slot) = content.slot(field) {
                        slot.push_str(&String::from_utf8_lossy(&t));
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"c" => break,
                    b"v" | b"f" | b"t" => field = Field::None,
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"is" => in_inline = false,
                    _ => {}
                },
                Event::Eof => {
                    return Err(XlsxError::corrupt(address.describe(), "cell never closed"))
                }
                _ => {}
            }
            buf.clear();
        }
        buf.clear();
        Ok(content)
    }

    fn build_value(
        &mut self,
        address: &CellAddress,
        cell_type: Option<&str>,
        content: CellContent,
    ) -> XlsxResult<ValueRef> {
        let CellContent {
            value,
            formula,
            inline,
        } = content;
        // An empty <v> only means something for text
        let value =
            value.filter(|v| !v.is_empty() || matches!(cell_type, Some("str" | "inlineStr")));

        if let Some(formula) = formula {
            if let Some(text) = self.formula_text(address, formula)? {
                let cached = self.cached_value(address, cell_type, value)?;
                return Ok(ValueRef::Formula { text, cached });
            }
        }
        self.plain_value(address, cell_type, value, inline)
    }

    /// Formula text, expanding shared formula followers
    ///
    /// `None` when the cell has an empty `<f/>` that is not part of a
    /// shared group; the cell then keeps its plain value.
    fn formula_text(
        &mut self,
        address: &CellAddress,
        formula: FormulaParts,
    ) -> XlsxResult<Option<String>> {
        let FormulaParts {
            text,
            shared,
            shared_index,
            has_ref,
        } = formula;
        let text = xml::decode_escapes(&text).into_owned();

        let Some(si) = shared_index.filter(|_| shared) else {
            return Ok((!text.is_empty()).then_some(text));
        };

        if !text.is_empty() {
            if has_ref {
                self.shared_formulas.insert(
                    si,
                    SharedFormula {
                        text: text.clone(),
                        col: address.col,
                        row: address.row,
                    },
                );
            } else if !self.shared_formulas.contains_key(&si) {
                log::warn!(
                    "{}: shared formula {si} at {} has no master; using its own text",
                    self.part,
                    address
                );
            }
            return Ok(Some(text));
        }

        match self.shared_formulas.get(&si) {
            Some(master) => Ok(Some(shift_references(
                &master.text,
                address.col as i64 - master.col as i64,
                address.row as i64 - master.row as i64,
            ))),
            None => Err(XlsxError::corrupt(
                address.describe(),
                format!("shared formula {si} has no master cell"),
            )),
        }
    }

    fn cached_value(
        &self,
        address: &CellAddress,
        cell_type: Option<&str>,
        value: Option<String>,
    ) -> XlsxResult<Option<CachedValue>> {
        let cell_type = cell_type.unwrap_or("n");
        let Some(value) = value else {
            return match cell_type {
                "n" | "s" | "str" | "inlineStr" | "b" | "e" | "d" => Ok(None),
                other => Err(unsupported_type(address, other)),
            };
        };
        Ok(Some(match cell_type {
            "n" => CachedValue::Number(parse_number(address, &value)?),
            "str" | "inlineStr" => CachedValue::Text(xml::decode_escapes(&value).into_owned()),
            "b" => CachedValue::Boolean(parse_bool(address, &value)?),
            "e" => CachedValue::Error(parse_error(address, &value)?),
            "d" => CachedValue::Number(self.parse_date(address, &value)?),
            "s" => {
                log::debug!(
                    "{}: dropping shared-string cached value of formula at {}",
                    self.part,
                    address
                );
                return Ok(None);
            }
            other => return Err(unsupported_type(address, other)),
        }))
    }

    fn plain_value(
        &self,
        address: &CellAddress,
        cell_type: Option<&str>,
        value: Option<String>,
        inline: Option<String>,
    ) -> XlsxResult<ValueRef> {
        let cell_type = cell_type.unwrap_or("n");
        if cell_type == "inlineStr" {
            return Ok(match inline.or(value) {
                Some(text) => ValueRef::InlineString(xml::decode_escapes(&text).into_owned()),
                None => ValueRef::Empty,
            });
        }
        if !matches!(cell_type, "n" | "s" | "str" | "b" | "e" | "d") {
            return Err(unsupported_type(address, cell_type));
        }
        let Some(value) = value else {
            return Ok(ValueRef::Empty);
        };

        Ok(match cell_type {
            "s" => {
                let index = value.trim().parse().map_err(|_| {
                    XlsxError::corrupt(
                        address.describe(),
                        format!("invalid shared string index '{value}'"),
                    )
                })?;
                ValueRef::Shared(index)
            }
            "str" => ValueRef::InlineString(xml::decode_escapes(&value).into_owned()),
            "b" => ValueRef::Boolean(parse_bool(address, &value)?),
            "e" => ValueRef::Error(parse_error(address, &value)?),
            "d" => ValueRef::Number(self.parse_date(address, &value)?),
            _ => ValueRef::Number(parse_number(address, &value)?),
        })
    }

    fn parse_date(&self, address: &CellAddress, value: &str) -> XlsxResult<f64> {
        iso8601_to_serial(value, self.date_1904).ok_or_else(|| {
            XlsxError::corrupt(address.describe(), format!("invalid ISO-8601 date '{value}'"))
        })
    }
}

fn classify(phase: Phase, e: &BytesStart<'_>, empty: bool) -> XlsxResult<SheetEvent> {
    Ok(match (phase, e.local_name().as_ref()) {
        (Phase::Preamble, b"dimension") => SheetEvent::Dimension(ref_attr(e)?),
        (Phase::Preamble, b"sheetData") if empty => SheetEvent::SheetDataEmpty,
        (Phase::Preamble, b"sheetData") => SheetEvent::SheetDataStart,
        (Phase::SheetData, b"row") => SheetEvent::Row(RowAttrs::parse(e)?, empty),
        (Phase::SheetData, name) => {
            SheetEvent::Unexpected(String::from_utf8_lossy(name).into_owned())
        }
        (Phase::Trailer, b"mergeCell") => SheetEvent::MergeCell(ref_attr(e)?),
        _ => SheetEvent::Skip,
    })
}

fn ref_attr(e: &BytesStart<'_>) -> XlsxResult<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"ref" {
            return Ok(Some(xml::value(&attr)?));
        }
    }
    Ok(None)
}

fn parse_number(address: &CellAddress, value: &str) -> XlsxResult<f64> {
    value.trim().parse().map_err(|_| {
        XlsxError::corrupt(address.describe(), format!("invalid number '{value}'"))
    })
}

fn parse_bool(address: &CellAddress, value: &str) -> XlsxResult<bool> {
    match value.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(XlsxError::corrupt(
            address.describe(),
            format!("invalid boolean '{other}'"),
        )),
    }
}

fn parse_error(address: &CellAddress, value: &str) -> XlsxResult<CellError> {
    CellError::parse(value.trim()).ok_or_else(|| {
        XlsxError::unsupported(format!(
            "error literal '{value}' at {}",
            address.describe()
        ))
    })
}

fn unsupported_type(address: &CellAddress, cell_type: &str) -> XlsxError {
    XlsxError::unsupported(format!(
        "cell type '{cell_type}' at {}",
        address.describe()
    ))
}
