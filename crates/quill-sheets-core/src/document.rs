//! Document - the top-level spreadsheet model

use std::borrow::Cow;
use std::ops::Deref;

use crate::cell::{Cell, CellAddress, CellValue, ValueRef};
use crate::error::{Error, Result, Table};
use crate::row::{ResolvedRow, Row};
use crate::shared_strings::SharedStringTable;
use crate::sheet::Sheet;
use crate::style::{StyleDescriptor, StyleRegistry};
use crate::MAX_SHEET_NAME_LEN;

const INVALID_SHEET_NAME_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// A spreadsheet document
///
/// Owns the shared string table, the style registry and the sheets, in
/// container order. Cells refer to both tables by index, so the tables
/// only ever grow.
#[derive(Debug, Clone)]
pub struct Document {
    shared_strings: SharedStringTable,
    styles: StyleRegistry,
    sheets: Vec<Sheet>,
    date_1904: bool,
}

impl Document {
    /// Create a document with one empty sheet named "Sheet1"
    pub fn new() -> Self {
        let mut doc = Self::empty();
        doc.sheets.push(Sheet::new("Sheet1"));
        doc
    }

    /// Create a document with no sheets
    pub fn empty() -> Self {
        Self {
            shared_strings: SharedStringTable::new(),
            styles: StyleRegistry::new(),
            sheets: Vec::new(),
            date_1904: false,
        }
    }

    /// Assemble a document from loaded parts
    ///
    /// Sheet names are validated as if the sheets were added one by one.
    pub fn from_parts(
        shared_strings: SharedStringTable,
        styles: StyleRegistry,
        sheets: Vec<Sheet>,
        date_1904: bool,
    ) -> Result<Self> {
        let mut doc = Self {
            shared_strings,
            styles,
            sheets: Vec::with_capacity(sheets.len()),
            date_1904,
        };
        for sheet in sheets {
            doc.validate_sheet_name(sheet.name(), None)?;
            doc.sheets.push(sheet);
        }
        Ok(doc)
    }

    // === Tables ===

    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.shared_strings
    }

    pub fn shared_strings_mut(&mut self) -> &mut SharedStringTable {
        &mut self.shared_strings
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Register a style, returning the index cells should use
    pub fn register_style(&mut self, style: StyleDescriptor) -> u32 {
        self.styles.register(style)
    }

    /// Dates are serials from 1904-01-01 rather than 1900-01-01
    pub fn date_1904(&self) -> bool {
        self.date_1904
    }

    pub fn set_date_1904(&mut self, date_1904: bool) {
        self.date_1904 = date_1904;
    }

    // === Sheet access ===

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Position of the sheet named `name` (case-insensitive)
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        let lower = name.to_lowercase();
        self.sheets
            .iter()
            .position(|s| s.name().to_lowercase() == lower)
    }

    /// Sheet by position
    pub fn sheet(&self, index: usize) -> Result<SheetRef<'_>> {
        let sheet = self.sheets.get(index).ok_or_else(|| self.sheet_out_of_range(index))?;
        Ok(self.sheet_ref(sheet))
    }

    /// Sheet by name
    pub fn sheet_by_name(&self, name: &str) -> Result<SheetRef<'_>> {
        let index = self
            .sheet_index(name)
            .ok_or_else(|| Error::NotFound(format!("sheet '{name}'")))?;
        self.sheet(index)
    }

    /// Mutable sheet by position
    pub fn sheet_mut(&mut self, index: usize) -> Result<SheetMut<'_>> {
        let len = self.sheets.len();
        let sheet = self
            .sheets
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(Table::Sheets, index as u32, len))?;
        Ok(SheetMut {
            sheet,
            strings: &mut self.shared_strings,
            styles: &mut self.styles,
        })
    }

    /// Mutable sheet by name
    pub fn sheet_by_name_mut(&mut self, name: &str) -> Result<SheetMut<'_>> {
        let index = self
            .sheet_index(name)
            .ok_or_else(|| Error::NotFound(format!("sheet '{name}'")))?;
        self.sheet_mut(index)
    }

    /// Sheets in container order
    pub fn sheets(&self) -> impl Iterator<Item = SheetRef<'_>> {
        self.sheets.iter().map(|s| self.sheet_ref(s))
    }

    fn sheet_ref<'a>(&'a self, sheet: &'a Sheet) -> SheetRef<'a> {
        SheetRef {
            sheet,
            strings: &self.shared_strings,
            styles: &self.styles,
        }
    }

    fn sheet_out_of_range(&self, index: usize) -> Error {
        Error::out_of_range(Table::Sheets, index as u32, self.sheets.len())
    }

    // === Sheet management ===

    /// Append an empty sheet
    pub fn add_sheet(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name, None)?;
        self.sheets.push(Sheet::new(name));
        Ok(self.sheets.len() - 1)
    }

    /// Insert an empty sheet at `index`
    pub fn insert_sheet(&mut self, index: usize, name: &str) -> Result<()> {
        if index > self.sheets.len() {
            return Err(self.sheet_out_of_range(index));
        }
        self.validate_sheet_name(name, None)?;
        self.sheets.insert(index, Sheet::new(name));
        Ok(())
    }

    /// Append an existing sheet
    pub fn push_sheet(&mut self, sheet: Sheet) -> Result<usize> {
        self.validate_sheet_name(sheet.name(), None)?;
        self.sheets.push(sheet);
        Ok(self.sheets.len() - 1)
    }

    /// Remove and return the sheet at `index`
    ///
    /// Table entries used only by that sheet stay in the tables.
    pub fn remove_sheet(&mut self, index: usize) -> Result<Sheet> {
        if index >= self.sheets.len() {
            return Err(self.sheet_out_of_range(index));
        }
        Ok(self.sheets.remove(index))
    }

    pub fn rename_sheet(&mut self, index: usize, name: &str) -> Result<()> {
        if index >= self.sheets.len() {
            return Err(self.sheet_out_of_range(index));
        }
        self.validate_sheet_name(name, Some(index))?;
        self.sheets[index].set_name(name);
        Ok(())
    }

    fn validate_sheet_name(&self, name: &str, exclude: Option<usize>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "'{name}' is longer than {MAX_SHEET_NAME_LEN} characters"
            )));
        }
        if let Some(c) = name.chars().find(|c| INVALID_SHEET_NAME_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!("'{name}' contains '{c}'")));
        }

        let lower = name.to_lowercase();
        let taken = self
            .sheets
            .iter()
            .enumerate()
            .any(|(i, s)| Some(i) != exclude && s.name().to_lowercase() == lower);
        if taken {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }

    // === Validation ===

    /// Check that every cell's shared-string and style index resolves
    ///
    /// The first dangling index is reported as a corrupt document naming
    /// the sheet, the cell and the index.
    pub fn validate(&self) -> Result<()> {
        for sheet in &self.sheets {
            for cell in sheet.cells() {
                self.check_cell(sheet.name(), cell)?;
            }
        }
        Ok(())
    }

    fn check_cell(&self, sheet: &str, cell: &Cell) -> Result<()> {
        let location = || format!("sheet '{}' cell {}", sheet, cell.address().describe());
        if let ValueRef::Shared(idx) = cell.value {
            if let Err(err) = self.shared_strings.get(idx) {
                return Err(Error::corrupt(location(), err.to_string()));
            }
        }
        if let Some(idx) = cell.style {
            if let Err(err) = self.styles.get(idx) {
                return Err(Error::corrupt(location(), err.to_string()));
            }
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Read access to one sheet, with the document tables for resolution
#[derive(Debug, Clone, Copy)]
pub struct SheetRef<'a> {
    sheet: &'a Sheet,
    strings: &'a SharedStringTable,
    styles: &'a StyleRegistry,
}

impl<'a> SheetRef<'a> {
    /// The cell at `(col, row)`; unset positions give an empty cell
    pub fn cell(&self, col: u32, row: u32) -> CellRef<'a> {
        CellRef {
            cell: self.sheet.cell(col, row),
            strings: self.strings,
            styles: self.styles,
        }
    }

    /// The cell at an A1 address
    pub fn cell_at(&self, address: &str) -> Result<CellRef<'a>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell(addr.col, addr.row))
    }

    /// Stored rows in ascending order, each cell resolved
    ///
    /// Each item fails independently, so iteration can stop at the first
    /// bad row or skip past it.
    pub fn rows(&self) -> impl Iterator<Item = Result<ResolvedRow>> + 'a {
        let strings = self.strings;
        let styles = self.styles;
        self.sheet
            .rows()
            .map(move |row| row.resolve(strings, styles))
    }

    /// The underlying grid
    pub fn sheet(&self) -> &'a Sheet {
        self.sheet
    }
}

impl Deref for SheetRef<'_> {
    type Target = Sheet;

    fn deref(&self) -> &Sheet {
        self.sheet
    }
}

/// A cell together with the tables needed to resolve it
#[derive(Debug, Clone)]
pub struct CellRef<'a> {
    cell: Cow<'a, Cell>,
    strings: &'a SharedStringTable,
    styles: &'a StyleRegistry,
}

impl<'a> CellRef<'a> {
    /// The resolved value
    ///
    /// The style index is checked first: a cell whose style does not
    /// resolve fails with an out-of-range error rather than silently
    /// taking the default style. A dangling shared-string index fails as
    /// a corrupt document.
    pub fn value(&self) -> Result<CellValue> {
        self.cell.check_style(self.styles)?;
        self.cell.resolve(self.strings)
    }

    /// The resolved style (the default style when the cell has none)
    pub fn style(&self) -> Result<&'a StyleDescriptor> {
        self.cell.resolve_style(self.styles)
    }

    pub fn style_index(&self) -> Option<u32> {
        self.cell.style
    }

    pub fn value_ref(&self) -> &ValueRef {
        &self.cell.value
    }

    pub fn address(&self) -> CellAddress {
        self.cell.address()
    }

    /// Check whether the cell is stored in the grid
    pub fn exists(&self) -> bool {
        matches!(self.cell, Cow::Borrowed(_))
    }
}

/// Write access to one sheet
///
/// Text values are interned into the document's shared string table and
/// style indices are checked against the registry.
#[derive(Debug)]
pub struct SheetMut<'a> {
    sheet: &'a mut Sheet,
    strings: &'a mut SharedStringTable,
    styles: &'a mut StyleRegistry,
}

impl<'a> SheetMut<'a> {
    /// Set the value at `(col, row)`, keeping the cell's style
    ///
    /// Text becomes a shared string; other variants are stored as they
    /// are. Setting [`CellValue::Empty`] on an unstyled cell removes it.
    pub fn set_value<V: Into<CellValue>>(&mut self, col: u32, row: u32, value: V) -> Result<()> {
        let value = match value.into() {
            CellValue::Empty => {
                match self.sheet.get(col, row).map(|c| c.style.is_some()) {
                    Some(true) => self.sheet.set_value_ref(col, row, ValueRef::Empty)?,
                    Some(false) => {
                        self.sheet.clear_cell(col, row);
                    }
                    None => {}
                }
                return Ok(());
            }
            CellValue::Text(s) => ValueRef::Shared(self.strings.intern_shared(&s)),
            CellValue::Number(n) => ValueRef::Number(n),
            CellValue::Boolean(b) => ValueRef::Boolean(b),
            CellValue::Error(e) => ValueRef::Error(e),
            CellValue::Formula { text, cached } => ValueRef::Formula { text, cached },
        };
        self.sheet.set_value_ref(col, row, value)
    }

    /// Set the value at an A1 address
    pub fn set_value_at<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_value(addr.col, addr.row, value)
    }

    /// Set the style index at `(col, row)`, keeping the cell's value
    ///
    /// The index must already be registered.
    pub fn set_style(&mut self, col: u32, row: u32, style: u32) -> Result<()> {
        self.styles
            .check(style)
            .map_err(|e| e.at_cell(CellAddress::new(col, row).describe()))?;
        self.sheet.set_style_index(col, row, Some(style))
    }

    /// Register `style` and apply it to `(col, row)`
    pub fn apply_style(&mut self, col: u32, row: u32, style: StyleDescriptor) -> Result<u32> {
        let index = self.styles.register(style);
        self.sheet.set_style_index(col, row, Some(index))?;
        Ok(index)
    }

    /// Remove the cell at `(col, row)` entirely
    pub fn clear_cell(&mut self, col: u32, row: u32) -> Option<Cell> {
        self.sheet.clear_cell(col, row)
    }

    /// Row metadata (height, hidden flag)
    pub fn row_mut(&mut self, index: u32) -> Result<&mut Row> {
        self.sheet.row_mut(index)
    }

    /// The underlying grid, for raw edits that bypass table checks
    pub fn sheet_mut(&mut self) -> &mut Sheet {
        self.sheet
    }

    /// Read view of this sheet
    pub fn as_sheet_ref(&self) -> SheetRef<'_> {
        SheetRef {
            sheet: &*self.sheet,
            strings: &*self.strings,
            styles: &*self.styles,
        }
    }
}

impl Deref for SheetMut<'_> {
    type Target = Sheet;

    fn deref(&self) -> &Sheet {
        self.sheet
    }
}
