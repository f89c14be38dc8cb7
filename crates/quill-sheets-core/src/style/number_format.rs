//! Number formats

/// Display format for numeric values
///
/// Built-in formats are referenced by id and have no record in the file.
/// Custom formats carry their format code; ids for them are assigned when
/// a document is written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    BuiltIn(u32),
    Custom(String),
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat::BuiltIn(0)
    }
}

/// First id available to custom formats
pub const FIRST_CUSTOM_NUMBER_FORMAT_ID: u32 = 164;

impl NumberFormat {
    pub const GENERAL: NumberFormat = NumberFormat::BuiltIn(0);

    /// Custom format from a format code
    pub fn custom<S: Into<String>>(code: S) -> Self {
        NumberFormat::Custom(code.into())
    }

    pub fn is_general(&self) -> bool {
        matches!(self, NumberFormat::BuiltIn(0))
    }

    /// The format code, if known
    pub fn code(&self) -> Option<&str> {
        match self {
            NumberFormat::BuiltIn(id) => builtin_code(*id),
            NumberFormat::Custom(code) => Some(code),
        }
    }

    /// Check whether values in this format display as dates or times
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::BuiltIn(id) => matches!(id, 14..=22 | 45..=47),
            NumberFormat::Custom(code) => is_date_code(code),
        }
    }
}

fn builtin_code(id: u32) -> Option<&'static str> {
    Some(match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    })
}

/// Date tokens outside quotes, escapes and bracketed sections
fn is_date_code(code: &str) -> bool {
    let mut chars = code.chars();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let section: String = chars.by_ref().take_while(|&c| c != ']').collect();
                if matches!(section.to_ascii_lowercase().as_str(), "h" | "hh" | "m" | "mm" | "s" | "ss") {
                    return true;
                }
            }
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => return true,
            _ => {}
        }
    }
    false
}
