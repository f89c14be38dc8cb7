//! Color representation

use std::fmt;
use std::hash::{Hash, Hasher};

use super::float_key;

/// A color as stored in style records
///
/// Theme tints are kept as the raw `f64` from the file so a loaded style
/// compares equal to itself after a save.
#[derive(Debug, Clone, Copy, Default)]
pub enum Color {
    /// Automatic/default color
    #[default]
    Auto,

    /// ARGB color packed as `0xAARRGGBB`
    Argb(u32),

    /// Theme color with tint in `-1.0..=1.0`
    Theme { index: u32, tint: f64 },

    /// Legacy palette index
    Indexed(u32),
}

impl Color {
    pub const BLACK: Color = Color::Argb(0xFF00_0000);
    pub const WHITE: Color = Color::Argb(0xFFFF_FFFF);
    pub const RED: Color = Color::Argb(0xFFFF_0000);
    pub const YELLOW: Color = Color::Argb(0xFFFF_FF00);

    /// Opaque color from components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Argb(0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Parse `RRGGBB` or `AARRGGBB`, with or without a leading '#'
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let value = u32::from_str_radix(hex, 16).ok()?;
        match hex.len() {
            6 => Some(Color::Argb(0xFF00_0000 | value)),
            8 => Some(Color::Argb(value)),
            _ => None,
        }
    }

    /// Eight-digit ARGB hex, if this is an explicit color
    pub fn argb_hex(&self) -> Option<String> {
        match self {
            Color::Argb(v) => Some(format!("{v:08X}")),
            _ => None,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Color::Auto)
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Color::Auto, Color::Auto) => true,
            (Color::Argb(a), Color::Argb(b)) | (Color::Indexed(a), Color::Indexed(b)) => a == b,
            (
                Color::Theme { index: a, tint: ta },
                Color::Theme { index: b, tint: tb },
            ) => a == b && float_key(*ta) == float_key(*tb),
            _ => false,
        }
    }
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Color::Auto => {}
            Color::Argb(v) | Color::Indexed(v) => v.hash(state),
            Color::Theme { index, tint } => {
                index.hash(state);
                float_key(*tint).hash(state);
            }
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Auto => f.write_str("auto"),
            Color::Argb(v) => write!(f, "#{v:08X}"),
            Color::Theme { index, tint } => write!(f, "theme {index} (tint {tint})"),
            Color::Indexed(i) => write!(f, "indexed {i}"),
        }
    }
}
