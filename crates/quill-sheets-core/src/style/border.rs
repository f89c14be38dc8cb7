//! Cell borders

use super::Color;

/// Border settings of a style
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Border {
    pub left: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub top: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
    pub diagonal: Option<BorderEdge>,
    /// Diagonal runs bottom-left to top-right
    pub diagonal_up: bool,
    /// Diagonal runs top-left to bottom-right
    pub diagonal_down: bool,
}

impl Border {
    /// Same edge on all four sides
    pub fn all(style: BorderLineStyle, color: Color) -> Self {
        let edge = Some(BorderEdge { style, color });
        Self {
            left: edge,
            right: edge,
            top: edge,
            bottom: edge,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Edge slot by element name (`left`, `right`, `top`, `bottom`, `diagonal`)
    pub fn edge_mut(&mut self, name: &str) -> Option<&mut Option<BorderEdge>> {
        match name {
            "left" | "start" => Some(&mut self.left),
            "right" | "end" => Some(&mut self.right),
            "top" => Some(&mut self.top),
            "bottom" => Some(&mut self.bottom),
            "diagonal" => Some(&mut self.diagonal),
            _ => None,
        }
    }

    /// Edges in the element order the file format requires
    pub fn edges(&self) -> [(&'static str, &Option<BorderEdge>); 5] {
        [
            ("left", &self.left),
            ("right", &self.right),
            ("top", &self.top),
            ("bottom", &self.bottom),
            ("diagonal", &self.diagonal),
        ]
    }
}

/// A single border line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BorderEdge {
    pub style: BorderLineStyle,
    pub color: Color,
}

impl BorderEdge {
    pub fn new(style: BorderLineStyle, color: Color) -> Self {
        Self { style, color }
    }

    /// Thin black line
    pub fn thin() -> Self {
        Self::new(BorderLineStyle::Thin, Color::BLACK)
    }
}

/// Border line styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderLineStyle {
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderLineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderLineStyle::Thin => "thin",
            BorderLineStyle::Medium => "medium",
            BorderLineStyle::Thick => "thick",
            BorderLineStyle::Dashed => "dashed",
            BorderLineStyle::Dotted => "dotted",
            BorderLineStyle::Double => "double",
            BorderLineStyle::Hair => "hair",
            BorderLineStyle::MediumDashed => "mediumDashed",
            BorderLineStyle::DashDot => "dashDot",
            BorderLineStyle::MediumDashDot => "mediumDashDot",
            BorderLineStyle::DashDotDot => "dashDotDot",
            BorderLineStyle::MediumDashDotDot => "mediumDashDotDot",
            BorderLineStyle::SlantDashDot => "slantDashDot",
        }
    }

    /// Parse a `style` attribute; `none` and unknown values give `None`
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "thin" => BorderLineStyle::Thin,
            "medium" => BorderLineStyle::Medium,
            "thick" => BorderLineStyle::Thick,
            "dashed" => BorderLineStyle::Dashed,
            "dotted" => BorderLineStyle::Dotted,
            "double" => BorderLineStyle::Double,
            "hair" => BorderLineStyle::Hair,
            "mediumDashed" => BorderLineStyle::MediumDashed,
            "dashDot" => BorderLineStyle::DashDot,
            "mediumDashDot" => BorderLineStyle::MediumDashDot,
            "dashDotDot" => BorderLineStyle::DashDotDot,
            "mediumDashDotDot" => BorderLineStyle::MediumDashDotDot,
            "slantDashDot" => BorderLineStyle::SlantDashDot,
            _ => return None,
        })
    }
}
