//! Style registry

use ahash::AHashMap;

use super::StyleDescriptor;
use crate::error::{Error, Result, Table};

/// Append-only, deduplicated table of style descriptors
///
/// Index 0 always exists and is the default style. Registering a
/// descriptor equal to an existing one returns the existing index, so
/// identical formatting is stored once no matter how many cells use it.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    /// Descriptors in index order
    styles: Vec<StyleDescriptor>,
    /// Descriptor to first index holding it
    lookup: AHashMap<StyleDescriptor, u32>,
}

impl StyleRegistry {
    /// Create a registry holding only the default style
    pub fn new() -> Self {
        let mut registry = Self {
            styles: Vec::with_capacity(16),
            lookup: AHashMap::with_capacity(16),
        };
        registry.push(StyleDescriptor::default());
        registry
    }

    /// Build a registry from descriptors in file order
    ///
    /// Positions are preserved, duplicates included, because cells already
    /// refer to them by index. An empty list yields the default registry.
    pub fn from_descriptors<I>(styles: I) -> Self
    where
        I: IntoIterator<Item = StyleDescriptor>,
    {
        let mut registry = Self {
            styles: Vec::new(),
            lookup: AHashMap::new(),
        };
        for style in styles {
            registry.push(style);
        }
        if registry.styles.is_empty() {
            registry.push(StyleDescriptor::default());
        }
        registry
    }

    fn push(&mut self, style: StyleDescriptor) -> u32 {
        let idx = self.styles.len() as u32;
        self.lookup.entry(style.clone()).or_insert(idx);
        self.styles.push(style);
        idx
    }

    /// Return the index of `style`, appending it if no equal descriptor exists
    pub fn register(&mut self, style: StyleDescriptor) -> u32 {
        match self.lookup.get(&style) {
            Some(&idx) => idx,
            None => self.push(style),
        }
    }

    /// Look up the descriptor at `index`
    pub fn get(&self, index: u32) -> Result<&StyleDescriptor> {
        self.styles
            .get(index as usize)
            .ok_or_else(|| Error::out_of_range(Table::Styles, index, self.styles.len()))
    }

    /// Check that `index` resolves without borrowing the descriptor
    pub fn check(&self, index: u32) -> Result<()> {
        self.get(index).map(|_| ())
    }

    /// The style at index 0
    pub fn default_style(&self) -> &StyleDescriptor {
        &self.styles[0]
    }

    /// Number of entries (duplicates included)
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Always false: index 0 is never removed
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Iterate over descriptors with their indices
    pub fn iter(&self) -> impl Iterator<Item = (u32, &StyleDescriptor)> {
        self.styles.iter().enumerate().map(|(i, s)| (i as u32, s))
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
