//! Sparse sheet grid

use std::borrow::Cow;
use std::collections::btree_map::{self, BTreeMap};

use crate::cell::{Cell, CellAddress, CellRange, ValueRef};
use crate::error::{Error, Result};
use crate::row::Row;
use crate::{MAX_COLS, MAX_ROWS};

/// Sheet visibility as stored in the workbook manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SheetVisibility {
    #[default]
    Visible,
    /// Hidden, but the user can unhide it
    Hidden,
    /// Hidden and only reachable programmatically
    VeryHidden,
}

impl SheetVisibility {
    /// Value of the `state` attribute; `None` for visible sheets
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            SheetVisibility::Visible => None,
            SheetVisibility::Hidden => Some("hidden"),
            SheetVisibility::VeryHidden => Some("veryHidden"),
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "hidden" => SheetVisibility::Hidden,
            "veryHidden" => SheetVisibility::VeryHidden,
            _ => SheetVisibility::Visible,
        }
    }
}

/// A named, sparse grid of cells
///
/// Storage is `row -> column -> Cell`; absent cells read as empty and cost
/// nothing. [`total_rows`](Self::total_rows) and
/// [`total_cols`](Self::total_cols) are the highest positions ever
/// observed, independent of the dimension the file declared.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    rows: BTreeMap<u32, Row>,
    /// Exclusive upper bounds of observed positions
    total_rows: u32,
    total_cols: u32,
    declared_dimension: Option<CellRange>,
    merged_regions: Vec<CellRange>,
    visibility: SheetVisibility,
}

impl Sheet {
    /// Create an empty sheet
    ///
    /// The name is not validated here; the document validates names when
    /// sheets are added to it.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            total_rows: 0,
            total_cols: 0,
            declared_dimension: None,
            merged_regions: Vec::new(),
            visibility: SheetVisibility::Visible,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn visibility(&self) -> SheetVisibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: SheetVisibility) {
        self.visibility = visibility;
    }

    // === Cell access ===

    /// The cell at `(col, row)`, if one is stored
    pub fn get(&self, col: u32, row: u32) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.cell(col))
    }

    /// The cell at `(col, row)`; unset positions read as an empty cell
    pub fn cell(&self, col: u32, row: u32) -> Cow<'_, Cell> {
        match self.get(col, row) {
            Some(cell) => Cow::Borrowed(cell),
            None => Cow::Owned(Cell::empty(col, row)),
        }
    }

    /// The cell at an A1 address
    pub fn cell_at(&self, address: &str) -> Result<Cow<'_, Cell>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell(addr.col, addr.row))
    }

    /// Get the cell at `(col, row)`, creating it if absent
    ///
    /// Fails only for positions beyond the format's grid limits.
    pub fn cell_mut(&mut self, col: u32, row: u32) -> Result<&mut Cell> {
        check_position(col, row)?;
        self.observe(col, row);
        Ok(self
            .rows
            .entry(row)
            .or_insert_with(|| Row::new(row))
            .cell_mut(col))
    }

    /// Overwrite the raw value at `(col, row)`, keeping its style
    ///
    /// No table lookups happen here; shared indices are taken as given.
    pub fn set_value_ref(&mut self, col: u32, row: u32, value: ValueRef) -> Result<()> {
        self.cell_mut(col, row)?.value = value;
        Ok(())
    }

    /// Overwrite the style index at `(col, row)`, keeping its value
    pub fn set_style_index(&mut self, col: u32, row: u32, style: Option<u32>) -> Result<()> {
        self.cell_mut(col, row)?.style = style;
        Ok(())
    }

    /// Remove the cell at `(col, row)`
    ///
    /// Observed bounds are high-water marks and do not shrink.
    pub fn clear_cell(&mut self, col: u32, row: u32) -> Option<Cell> {
        let entry = self.rows.get_mut(&row)?;
        let removed = entry.remove(col);
        if entry.is_empty() && !entry.has_custom_settings() {
            self.rows.remove(&row);
        }
        removed
    }

    // === Rows ===

    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows.get(&index)
    }

    /// Get the row at `index`, creating an empty one if absent
    pub fn row_mut(&mut self, index: u32) -> Result<&mut Row> {
        if index >= MAX_ROWS {
            return Err(Error::InvalidAddress(format!(
                "row {index} beyond {MAX_ROWS} rows"
            )));
        }
        self.total_rows = self.total_rows.max(index + 1);
        Ok(self.rows.entry(index).or_insert_with(|| Row::new(index)))
    }

    /// Insert a fully built row, replacing any row at the same index
    pub fn insert_row(&mut self, row: Row) -> Result<()> {
        let index = row.index();
        if index >= MAX_ROWS {
            return Err(Error::InvalidAddress(format!(
                "row {index} beyond {MAX_ROWS} rows"
            )));
        }
        if let Some(col) = row.last_col() {
            if col >= MAX_COLS {
                return Err(Error::InvalidAddress(format!(
                    "column {col} beyond {MAX_COLS} columns"
                )));
            }
            self.total_cols = self.total_cols.max(col + 1);
        }
        self.total_rows = self.total_rows.max(index + 1);
        self.rows.insert(index, row);
        Ok(())
    }

    /// Stored rows in ascending index order
    pub fn rows(&self) -> btree_map::Values<'_, u32, Row> {
        self.rows.values()
    }

    /// Stored cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.values().flat_map(|r| r.cells())
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(Row::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // === Bounds ===

    /// One past the highest row index observed
    pub fn total_rows(&self) -> u32 {
        self.total_rows
    }

    /// One past the highest column index observed
    pub fn total_cols(&self) -> u32 {
        self.total_cols
    }

    /// Smallest range covering every stored cell
    pub fn used_range(&self) -> Option<CellRange> {
        let mut min_col = u32::MAX;
        let mut max_col = 0;
        let mut min_row = None;
        let mut max_row = 0;

        for row in self.rows.values().filter(|r| !r.is_empty()) {
            min_row.get_or_insert(row.index());
            max_row = row.index();
            if let Some(first) = row.cells().next() {
                min_col = min_col.min(first.col);
            }
            if let Some(last) = row.last_col() {
                max_col = max_col.max(last);
            }
        }

        min_row.map(|min_row| CellRange::from_indices(min_col, min_row, max_col, max_row))
    }

    /// Dimension declared by the file, kept only as metadata
    pub fn declared_dimension(&self) -> Option<CellRange> {
        self.declared_dimension
    }

    pub fn set_declared_dimension(&mut self, dimension: Option<CellRange>) {
        self.declared_dimension = dimension;
    }

    fn observe(&mut self, col: u32, row: u32) {
        self.total_rows = self.total_rows.max(row + 1);
        self.total_cols = self.total_cols.max(col + 1);
    }

    // === Merged regions ===

    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    /// Merge a range; fails if it overlaps an existing merged region
    pub fn merge_cells(&mut self, range: CellRange) -> Result<()> {
        if self.merged_regions.iter().any(|r| r.overlaps(&range)) {
            return Err(Error::MergeConflict(range.to_string()));
        }
        self.merged_regions.push(range);
        Ok(())
    }

    /// Remove a merged region; returns whether it existed
    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        let before = self.merged_regions.len();
        self.merged_regions.retain(|r| r != range);
        self.merged_regions.len() != before
    }
}

fn check_position(col: u32, row: u32) -> Result<()> {
    if col >= MAX_COLS || row >= MAX_ROWS {
        return Err(Error::InvalidAddress(format!(
            "(col {col}, row {row}) beyond the {MAX_COLS}x{MAX_ROWS} grid"
        )));
    }
    Ok(())
}
