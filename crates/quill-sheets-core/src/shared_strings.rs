//! Shared string table
//!
//! Spreadsheets store repeated text once and have cells refer to it by
//! position. Positions are dense (`0..len`) and never renumbered: cells hold
//! indices by value, so the table only ever grows.

use ahash::AHashMap;

use crate::cell::SharedString;
use crate::error::{Error, Result, Table};

/// Deduplicated, append-only pool of text values
#[derive(Debug, Default, Clone)]
pub struct SharedStringTable {
    /// Strings in index order
    strings: Vec<SharedString>,
    /// Content to first index holding it
    lookup: AHashMap<SharedString, u32>,
}

impl SharedStringTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from strings in file order
    ///
    /// Duplicates are kept at their positions so existing indices stay valid;
    /// later [`intern`](Self::intern) calls resolve to the first occurrence.
    pub fn from_strings<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SharedString>,
    {
        let mut table = Self::new();
        for s in strings {
            table.push(s.into());
        }
        table
    }

    fn push(&mut self, s: SharedString) -> u32 {
        let idx = self.strings.len() as u32;
        self.lookup.entry(s.clone()).or_insert(idx);
        self.strings.push(s);
        idx
    }

    /// Look up the string at `index`
    pub fn get(&self, index: u32) -> Result<&SharedString> {
        self.strings
            .get(index as usize)
            .ok_or_else(|| Error::out_of_range(Table::SharedStrings, index, self.strings.len()))
    }

    /// Return the index of `text`, appending it if it is new
    pub fn intern(&mut self, text: &str) -> u32 {
        match self.lookup.get(text) {
            Some(&idx) => idx,
            None => self.push(SharedString::new(text)),
        }
    }

    /// Intern an already shared string without copying its text
    pub fn intern_shared(&mut self, text: &SharedString) -> u32 {
        match self.lookup.get(text.as_str()) {
            Some(&idx) => idx,
            None => self.push(text.clone()),
        }
    }

    /// Index of `text`, if present
    pub fn position(&self, text: &str) -> Option<u32> {
        self.lookup.get(text).copied()
    }

    /// Number of entries (duplicates included)
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over entries in index order
    pub fn iter(&self) -> impl Iterator<Item = &SharedString> {
        self.strings.iter()
    }
}
