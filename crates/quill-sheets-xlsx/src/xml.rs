//! Small helpers shared by the part readers and writers

use std::borrow::Cow;
use std::io::BufRead;

use quick_xml::events::attributes::Attribute;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
pub(crate) const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const PACKAGE_REL_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

/// Event reader over a part; text is kept untrimmed so cell text survives
pub(crate) fn reader<B: BufRead>(source: B) -> Reader<B> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(false);
    reader
}

/// Unescaped attribute value
pub(crate) fn value(attr: &Attribute<'_>) -> XlsxResult<String> {
    Ok(attr.unescape_value()?.into_owned())
}

/// Boolean attribute: `1`/`true` are true, anything else false
pub(crate) fn is_true(value: &str) -> bool {
    matches!(value, "1" | "true")
}

/// Toggle elements like `<b/>` are on unless `val` turns them off
pub(crate) fn toggle(e: &quick_xml::events::BytesStart<'_>) -> XlsxResult<bool> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"val" {
            return Ok(!matches!(value(&attr)?.as_str(), "0" | "false"));
        }
    }
    Ok(true)
}

/// Escape text for element content and attribute values
pub(crate) fn escape(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Text needs `xml:space="preserve"` to keep leading/trailing whitespace
pub(crate) fn needs_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}

/// Decode `_xHHHH_` sequences used for characters XML cannot carry
pub(crate) fn decode_escapes(s: &str) -> Cow<'_, str> {
    if !s.contains("_x") {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match escape_code(candidate).and_then(char::from_u32) {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Encode characters that need `_xHHHH_` form
///
/// Control characters other than tab, newline and carriage return are
/// encoded, and so is the underscore of any literal text that would
/// otherwise decode as an escape.
pub(crate) fn encode_escapes(s: &str) -> Cow<'_, str> {
    let needs_work = s
        .char_indices()
        .any(|(i, c)| is_restricted(c) || (c == '_' && escape_code(&s[i..]).is_some()));
    if !needs_work {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for (i, c) in s.char_indices() {
        if is_restricted(c) || (c == '_' && escape_code(&s[i..]).is_some()) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

fn is_restricted(c: char) -> bool {
    (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r')
}

/// Code point of an `_xHHHH_` sequence at the start of `s`
fn escape_code(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.len() < 7 || &bytes[..2] != b"_x" || bytes[6] != b'_' {
        return None;
    }
    let hex = &s[2..6];
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
