//! Shared strings part (sharedStrings.xml)

use std::io::{BufRead, Write};

use quick_xml::events::Event;
use quill_sheets_core::SharedStringTable;

use crate::error::{XlsxError, XlsxResult};
use crate::xml;

/// Parse a shared strings part into a table, keeping file order
///
/// Rich-text runs are concatenated into one plain string and phonetic
/// runs are skipped.
pub(crate) fn read_shared_strings<B: BufRead>(source: B) -> XlsxResult<SharedStringTable> {
    let mut reader = xml::reader(source);
    let mut buf = Vec::new();
    let mut strings: Vec<String> = Vec::new();

    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut phonetic_depth = 0u32;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sst" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"uniqueCount" {
                            if let Ok(n) = xml::value(&attr)?.parse::<usize>() {
                                strings.reserve(n.min(1 << 20));
                            }
                        }
                    }
                }
                b"si" => {
                    if current.is_some() {
                        return Err(XlsxError::corrupt(
                            format!("string {}", strings.len()),
                            "<si> nested inside <si>",
                        ));
                    }
                    current = Some(String::new());
                }
                b"rPh" => phonetic_depth += 1,
                b"t" if current.is_some() && phonetic_depth == 0 => in_text = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => match current.take() {
                    Some(s) => strings.push(xml::decode_escapes(&s).into_owned()),
                    None => {
                        return Err(XlsxError::corrupt(
                            format!("string {}", strings.len()),
                            "</si> without <si>",
                        ))
                    }
                },
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => {
                if current.is_some() {
                    return Err(XlsxError::corrupt(
                        format!("string {}", strings.len()),
                        "<si> never closed",
                    ));
                }
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    log::debug!("read {} shared strings", strings.len());
    Ok(SharedStringTable::from_strings(strings))
}

/// Write the table in index order
///
/// `references` is the number of cells pointing into the table.
pub(crate) fn write_shared_strings<W: Write>(
    out: &mut W,
    table: &SharedStringTable,
    references: usize,
) -> XlsxResult<()> {
    write!(
        out,
        "{}\n<sst xmlns=\"{}\" count=\"{}\" uniqueCount=\"{}\">",
        xml::XML_DECLARATION,
        xml::MAIN_NS,
        references,
        table.len()
    )?;
    for s in table.iter() {
        let text = xml::encode_escapes(s.as_str());
        if xml::needs_preserve(&text) {
            write!(out, "<si><t xml:space=\"preserve\">{}</t></si>", xml::escape(&text))?;
        } else {
            write!(out, "<si><t>{}</t></si>", xml::escape(&text))?;
        }
    }
    out.write_all(b"</sst>")?;
    log::debug!("wrote {} shared strings", table.len());
    Ok(())
}
