//! Cell styling
//!
//! A [`StyleDescriptor`] is the complete formatting of a cell. Cells never
//! hold descriptors directly; they hold an index into the document's
//! [`StyleRegistry`].

mod alignment;
mod border;
mod color;
mod fill;
mod font;
mod number_format;
mod registry;

pub use alignment::{Alignment, HorizontalAlignment, VerticalAlignment};
pub use border::{Border, BorderEdge, BorderLineStyle};
pub use color::Color;
pub use fill::{Fill, PatternType};
pub use font::{Font, Underline};
pub use number_format::{NumberFormat, FIRST_CUSTOM_NUMBER_FORMAT_ID};
pub use registry::StyleRegistry;

/// Bit pattern that float style fields compare and hash by
///
/// `-0.0` and `0.0` share one key, and so do all NaNs.
pub(crate) fn float_key(value: f64) -> u64 {
    if value == 0.0 {
        0
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

/// Complete formatting of a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StyleDescriptor {
    pub font: Font,
    pub fill: Fill,
    pub border: Border,
    pub alignment: Alignment,
    pub number_format: NumberFormat,
    pub protection: Protection,
}

impl StyleDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.font.italic = italic;
        self
    }

    pub fn font_name(mut self, name: impl Into<String>) -> Self {
        self.font.name = name.into();
        self
    }

    /// Set font size in points
    pub fn font_size(mut self, size: f64) -> Self {
        self.font.size = size;
        self
    }

    pub fn font_color(mut self, color: Color) -> Self {
        self.font.color = color;
        self
    }

    /// Solid background in `color`
    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill = Fill::solid(color);
        self
    }

    pub fn border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    pub fn number_format(mut self, format: NumberFormat) -> Self {
        self.number_format = format;
        self
    }

    pub fn horizontal_alignment(mut self, align: HorizontalAlignment) -> Self {
        self.alignment.horizontal = align;
        self
    }

    pub fn wrap_text(mut self, wrap: bool) -> Self {
        self.alignment.wrap_text = wrap;
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.protection.locked = locked;
        self
    }
}

/// Cell protection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Protection {
    /// Locked when the sheet is protected
    pub locked: bool,
    /// Formula hidden when the sheet is protected
    pub hidden: bool,
}

impl Default for Protection {
    fn default() -> Self {
        Self {
            locked: true,
            hidden: false,
        }
    }
}
