//! Cell background fill

use super::Color;

/// Pattern fill of a cell background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fill {
    pub pattern: PatternType,
    pub foreground: Color,
    pub background: Color,
}

impl Fill {
    /// Solid fill in one color
    pub fn solid(color: Color) -> Self {
        Self {
            pattern: PatternType::Solid,
            foreground: color,
            background: Color::Auto,
        }
    }

    /// The mandatory second fill record every styles part carries
    pub fn gray125() -> Self {
        Self {
            pattern: PatternType::Gray125,
            ..Self::default()
        }
    }

    pub fn is_none(&self) -> bool {
        self.pattern == PatternType::None
    }
}

/// Pattern fill types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PatternType {
    #[default]
    None,
    Solid,
    MediumGray,
    DarkGray,
    LightGray,
    DarkHorizontal,
    DarkVertical,
    DarkDown,
    DarkUp,
    DarkGrid,
    DarkTrellis,
    LightHorizontal,
    LightVertical,
    LightDown,
    LightUp,
    LightGrid,
    LightTrellis,
    Gray125,
    Gray0625,
}

impl PatternType {
    /// Value of the `patternType` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::None => "none",
            PatternType::Solid => "solid",
            PatternType::MediumGray => "mediumGray",
            PatternType::DarkGray => "darkGray",
            PatternType::LightGray => "lightGray",
            PatternType::DarkHorizontal => "darkHorizontal",
            PatternType::DarkVertical => "darkVertical",
            PatternType::DarkDown => "darkDown",
            PatternType::DarkUp => "darkUp",
            PatternType::DarkGrid => "darkGrid",
            PatternType::DarkTrellis => "darkTrellis",
            PatternType::LightHorizontal => "lightHorizontal",
            PatternType::LightVertical => "lightVertical",
            PatternType::LightDown => "lightDown",
            PatternType::LightUp => "lightUp",
            PatternType::LightGrid => "lightGrid",
            PatternType::LightTrellis => "lightTrellis",
            PatternType::Gray125 => "gray125",
            PatternType::Gray0625 => "gray0625",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "none" => PatternType::None,
            "solid" => PatternType::Solid,
            "mediumGray" => PatternType::MediumGray,
            "darkGray" => PatternType::DarkGray,
            "lightGray" => PatternType::LightGray,
            "darkHorizontal" => PatternType::DarkHorizontal,
            "darkVertical" => PatternType::DarkVertical,
            "darkDown" => PatternType::DarkDown,
            "darkUp" => PatternType::DarkUp,
            "darkGrid" => PatternType::DarkGrid,
            "darkTrellis" => PatternType::DarkTrellis,
            "lightHorizontal" => PatternType::LightHorizontal,
            "lightVertical" => PatternType::LightVertical,
            "lightDown" => PatternType::LightDown,
            "lightUp" => PatternType::LightUp,
            "lightGrid" => PatternType::LightGrid,
            "lightTrellis" => PatternType::LightTrellis,
            "gray125" => PatternType::Gray125,
            "gray0625" => PatternType::Gray0625,
            _ => return None,
        })
    }
}
