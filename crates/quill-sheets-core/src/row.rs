//! Row types

use std::collections::btree_map::{self, BTreeMap};

use crate::cell::{Cell, CellValue};
use crate::error::Result;
use crate::shared_strings::SharedStringTable;
use crate::style::StyleRegistry;

/// A row of the grid: cells ordered by column plus row metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    index: u32,
    cells: BTreeMap<u32, Cell>,
    /// Custom height in points (None = default)
    pub height: Option<f64>,
    /// Row is hidden
    pub hidden: bool,
}

impl Row {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Row index (0-based)
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn cell(&self, col: u32) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Get the cell at `col`, creating an empty one if absent
    pub fn cell_mut(&mut self, col: u32) -> &mut Cell {
        let row = self.index;
        self.cells
            .entry(col)
            .or_insert_with(|| Cell::empty(col, row))
    }

    /// Place a cell, replacing whatever was at its column
    ///
    /// The cell is re-addressed to this row.
    pub fn insert(&mut self, mut cell: Cell) -> Option<Cell> {
        cell.row = self.index;
        self.cells.insert(cell.col, cell)
    }

    pub fn remove(&mut self, col: u32) -> Option<Cell> {
        self.cells.remove(&col)
    }

    /// Cells in column order
    pub fn cells(&self) -> btree_map::Values<'_, u32, Cell> {
        self.cells.values()
    }

    /// Highest column holding a cell
    pub fn last_col(&self) -> Option<u32> {
        self.cells.keys().next_back().copied()
    }

    /// Number of stored cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check if this row carries metadata worth writing without cells
    pub fn has_custom_settings(&self) -> bool {
        self.height.is_some() || self.hidden
    }

    /// Resolve every cell against the document tables
    pub fn resolve(
        &self,
        strings: &SharedStringTable,
        styles: &StyleRegistry,
    ) -> Result<ResolvedRow> {
        let mut cells = Vec::with_capacity(self.cells.len());
        for cell in self.cells.values() {
            cell.check_style(styles)?;
            cells.push(ResolvedCell {
                col: cell.col,
                value: cell.resolve(strings)?,
                style: cell.style,
            });
        }
        Ok(ResolvedRow {
            index: self.index,
            height: self.height,
            hidden: self.hidden,
            cells,
        })
    }
}

/// A row whose cells have been resolved against the document tables
///
/// This is what both the eager grid and the streaming reader hand out when
/// iterating rows, so the two can be compared directly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedRow {
    /// Row index (0-based)
    pub index: u32,
    pub height: Option<f64>,
    pub hidden: bool,
    /// Cells in column order
    pub cells: Vec<ResolvedCell>,
}

impl ResolvedRow {
    /// Value at `col`, or `None` if the row has no cell there
    pub fn get(&self, col: u32) -> Option<&CellValue> {
        self.cells
            .binary_search_by_key(&col, |c| c.col)
            .ok()
            .map(|i| &self.cells[i].value)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A cell with its value resolved and its style index validated
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCell {
    /// Column index (0-based)
    pub col: u32,
    pub value: CellValue,
    /// Style registry index (`None` = default style)
    pub style: Option<u32>,
}
