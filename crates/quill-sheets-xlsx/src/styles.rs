//! Styles part (styles.xml) read/write helpers
//!
//! The file stores fonts, fills, borders and number formats in separate
//! tables that `cellXfs` records point into. Reading flattens every record
//! into one [`StyleDescriptor`]; writing splits the registry back into
//! deduplicated tables and emits one `xf` per registry index.

use std::hash::Hash;
use std::io::{BufRead, Write};

use ahash::AHashMap;
use quick_xml::events::{BytesStart, Event};
use quill_sheets_core::style::FIRST_CUSTOM_NUMBER_FORMAT_ID;
use quill_sheets_core::{
    Alignment, Border, BorderEdge, BorderLineStyle, Color, Fill, Font, HorizontalAlignment,
    NumberFormat, PatternType, Protection, StyleDescriptor, StyleRegistry, Underline,
    VerticalAlignment,
};

use crate::error::{XlsxError, XlsxResult};
use crate::xml;

// === Writing ===

/// Append-only table that hands out the first index of each distinct value
struct Interner<T> {
    items: Vec<T>,
    ids: AHashMap<T, u32>,
}

impl<T: Clone + Eq + Hash> Interner<T> {
    fn with(initial: impl IntoIterator<Item = T>) -> Self {
        let mut interner = Self {
            items: Vec::new(),
            ids: AHashMap::new(),
        };
        for item in initial {
            interner.push(item);
        }
        interner
    }

    fn push(&mut self, item: T) -> u32 {
        let id = self.items.len() as u32;
        self.ids.entry(item.clone()).or_insert(id);
        self.items.push(item);
        id
    }

    fn id(&mut self, item: &T) -> u32 {
        match self.ids.get(item) {
            Some(&id) => id,
            None => self.push(item.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct XfIds {
    num_fmt: u32,
    font: u32,
    fill: u32,
    border: u32,
}

/// Reject built-in number format ids that fall in the custom range
///
/// Such an id has no `numFmt` record to point at and would collide with
/// the ids handed out to custom formats on save.
pub(crate) fn check_number_formats(registry: &StyleRegistry) -> XlsxResult<()> {
    for (index, style) in registry.iter() {
        if let NumberFormat::BuiltIn(id) = style.number_format {
            if id >= FIRST_CUSTOM_NUMBER_FORMAT_ID {
                return Err(XlsxError::unsupported(format!(
                    "style {index}: built-in number format id {id} is in the custom range \
                     (first custom id {FIRST_CUSTOM_NUMBER_FORMAT_ID})"
                )));
            }
        }
    }
    Ok(())
}

/// Write the styles part for `registry`
///
/// Registry index `i` becomes `cellXfs` record `i`, so cell `s` attributes
/// are the registry indices unchanged.
pub(crate) fn write_styles<W: Write>(out: &mut W, registry: &StyleRegistry) -> XlsxResult<()> {
    check_number_formats(registry)?;

    let mut fonts = Interner::with([Font::default()]);
    // The first two fills are fixed by the format
    let mut fills = Interner::with([Fill::default(), Fill::gray125()]);
    let mut borders = Interner::with([Border::default()]);
    let mut num_fmts: Vec<(u32, &str)> = Vec::new();
    let mut num_fmt_ids: AHashMap<&str, u32> = AHashMap::new();

    let mut xfs = Vec::with_capacity(registry.len());
    for (_, style) in registry.iter() {
        let num_fmt = match &style.number_format {
            NumberFormat::BuiltIn(id) => *id,
            NumberFormat::Custom(code) => match num_fmt_ids.get(code.as_str()) {
                Some(&id) => id,
                None => {
                    let id = FIRST_CUSTOM_NUMBER_FORMAT_ID + num_fmts.len() as u32;
                    num_fmts.push((id, code));
                    num_fmt_ids.insert(code, id);
                    id
                }
            },
        };
        xfs.push(XfIds {
            num_fmt,
            font: fonts.id(&style.font),
            fill: fills.id(&style.fill),
            border: borders.id(&style.border),
        });
    }

    write!(out, "{}\n<styleSheet xmlns=\"{}\">", xml::XML_DECLARATION, xml::MAIN_NS)?;

    if !num_fmts.is_empty() {
        write!(out, "<numFmts count=\"{}\">", num_fmts.len())?;
        for (id, code) in &num_fmts {
            write!(
                out,
                "<numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                id,
                xml::escape(code)
            )?;
        }
        out.write_all(b"</numFmts>")?;
    }

    write!(out, "<fonts count=\"{}\">", fonts.items.len())?;
    for font in &fonts.items {
        write_font(out, font)?;
    }
    out.write_all(b"</fonts>")?;

    write!(out, "<fills count=\"{}\">", fills.items.len())?;
    for fill in &fills.items {
        write_fill(out, fill)?;
    }
    out.write_all(b"</fills>")?;

    write!(out, "<borders count=\"{}\">", borders.items.len())?;
    for border in &borders.items {
        write_border(out, border)?;
    }
    out.write_all(b"</borders>")?;

    out.write_all(
        br#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    )?;

    write!(out, "<cellXfs count=\"{}\">", xfs.len())?;
    for ((_, style), ids) in registry.iter().zip(&xfs) {
        write_xf(out, style, *ids)?;
    }
    out.write_all(b"</cellXfs>")?;

    out.write_all(
        br#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    )?;
    out.write_all(b"<dxfs count=\"0\"/></styleSheet>")?;

    log::debug!(
        "wrote {} styles ({} fonts, {} fills, {} borders, {} number formats)",
        xfs.len(),
        fonts.items.len(),
        fills.items.len(),
        borders.items.len(),
        num_fmts.len()
    );
    Ok(())
}

/// Color attributes, or `None` for automatic colors written without an element
fn color_attrs(color: &Color) -> Option<String> {
    match color {
        Color::Auto => None,
        Color::Argb(v) => Some(format!(" rgb=\"{v:08X}\"")),
        Color::Indexed(i) => Some(format!(" indexed=\"{i}\"")),
        Color::Theme { index, tint } if *tint == 0.0 => Some(format!(" theme=\"{index}\"")),
        Color::Theme { index, tint } => Some(format!(" theme=\"{index}\" tint=\"{tint}\"")),
    }
}

fn write_color<W: Write>(out: &mut W, tag: &str, color: &Color) -> XlsxResult<()> {
    if let Some(attrs) = color_attrs(color) {
        write!(out, "<{tag}{attrs}/>")?;
    }
    Ok(())
}

fn write_font<W: Write>(out: &mut W, font: &Font) -> XlsxResult<()> {
    out.write_all(b"<font>")?;
    if font.bold {
        out.write_all(b"<b/>")?;
    }
    if font.italic {
        out.write_all(b"<i/>")?;
    }
    if font.strikethrough {
        out.write_all(b"<strike/>")?;
    }
    match font.underline.as_str() {
        None => {}
        Some("single") => out.write_all(b"<u/>")?,
        Some(val) => write!(out, "<u val=\"{val}\"/>")?,
    }
    write!(out, "<sz val=\"{}\"/>", font.size)?;
    write_color(out, "color", &font.color)?;
    write!(out, "<name val=\"{}\"/></font>", xml::escape(&font.name))?;
    Ok(())
}

fn write_fill<W: Write>(out: &mut W, fill: &Fill) -> XlsxResult<()> {
    let fg = color_attrs(&fill.foreground);
    let bg = color_attrs(&fill.background);
    if fg.is_none() && bg.is_none() {
        write!(
            out,
            "<fill><patternFill patternType=\"{}\"/></fill>",
            fill.pattern.as_str()
        )?;
        return Ok(());
    }

    write!(out, "<fill><patternFill patternType=\"{}\">", fill.pattern.as_str())?;
    if let Some(attrs) = fg {
        write!(out, "<fgColor{attrs}/>")?;
    }
    if let Some(attrs) = bg {
        write!(out, "<bgColor{attrs}/>")?;
    }
    out.write_all(b"</patternFill></fill>")?;
    Ok(())
}

fn write_border<W: Write>(out: &mut W, border: &Border) -> XlsxResult<()> {
    out.write_all(b"<border")?;
    if border.diagonal_up {
        out.write_all(b" diagonalUp=\"1\"")?;
    }
    if border.diagonal_down {
        out.write_all(b" diagonalDown=\"1\"")?;
    }
    out.write_all(b">")?;

    for (tag, edge) in border.edges() {
        match edge {
            None => write!(out, "<{tag}/>")?,
            Some(edge) => match color_attrs(&edge.color) {
                None => write!(out, "<{tag} style=\"{}\"/>", edge.style.as_str())?,
                Some(attrs) => write!(
                    out,
                    "<{tag} style=\"{}\"><color{attrs}/></{tag}>",
                    edge.style.as_str()
                )?,
            },
        }
    }
    out.write_all(b"</border>")?;
    Ok(())
}

fn alignment_attrs(al: &Alignment) -> String {
    let default = Alignment::default();
    let mut s = String::new();
    if al.horizontal != default.horizontal {
        s.push_str(&format!(" horizontal=\"{}\"", al.horizontal.as_str()));
    }
    if al.vertical != default.vertical {
        s.push_str(&format!(" vertical=\"{}\"", al.vertical.as_str()));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    if al.shrink_to_fit {
        s.push_str(" shrinkToFit=\"1\"");
    }
    if al.indent != 0 {
        s.push_str(&format!(" indent=\"{}\"", al.indent));
    }
    if al.rotation != 0 {
        s.push_str(&format!(" textRotation=\"{}\"", al.rotation));
    }
    s
}

fn write_xf<W: Write>(out: &mut W, style: &StyleDescriptor, ids: XfIds) -> XlsxResult<()> {
    write!(
        out,
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"",
        ids.num_fmt, ids.font, ids.fill, ids.border
    )?;
    if ids.num_fmt != 0 {
        out.write_all(b" applyNumberFormat=\"1\"")?;
    }
    if ids.font != 0 {
        out.write_all(b" applyFont=\"1\"")?;
    }
    if ids.fill != 0 {
        out.write_all(b" applyFill=\"1\"")?;
    }
    if ids.border != 0 {
        out.write_all(b" applyBorder=\"1\"")?;
    }

    let custom_alignment = !style.alignment.is_default();
    let custom_protection = style.protection != Protection::default();
    if custom_alignment {
        out.write_all(b" applyAlignment=\"1\"")?;
    }
    if custom_protection {
        out.write_all(b" applyProtection=\"1\"")?;
    }
    if !custom_alignment && !custom_protection {
        out.write_all(b"/>")?;
        return Ok(());
    }

    out.write_all(b">")?;
    if custom_alignment {
        write!(out, "<alignment{}/>", alignment_attrs(&style.alignment))?;
    }
    if custom_protection {
        write!(
            out,
            "<protection locked=\"{}\" hidden=\"{}\"/>",
            u8::from(style.protection.locked),
            u8::from(style.protection.hidden)
        )?;
    }
    out.write_all(b"</xf>")?;
    Ok(())
}

// === Reading ===

/// A `cellXfs` record before its sub-table indices are resolved
#[derive(Debug, Default)]
struct XfRecord {
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    alignment: Alignment,
    protection: Protection,
}

/// Which table the parser is inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Fonts,
    Fills,
    Borders,
    CellXfs,
    /// Differential formats and other tables whose children are skipped
    Skipped,
}

/// Parse a styles part into a registry with one entry per `cellXfs` record
pub(crate) fn read_styles<B: BufRead>(source: B) -> XlsxResult<StyleRegistry> {
    let mut reader = xml::reader(source);
    let mut buf = Vec::new();

    let mut num_fmts: AHashMap<u32, String> = AHashMap::new();
    let mut fonts: Vec<Font> = Vec::new();
    let mut fills: Vec<Fill> = Vec::new();
    let mut borders: Vec<Border> = Vec::new();
    let mut xfs: Vec<XfRecord> = Vec::new();

    let mut section = Section::Other;
    let mut font: Option<Font> = None;
    let mut fill: Option<Fill> = None;
    let mut border: Option<Border> = None;
    let mut edge: Option<&'static str> = None;
    let mut xf: Option<XfRecord> = None;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        let (e, empty) = match &event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"fonts" | b"fills" | b"borders" | b"cellXfs" | b"dxfs" | b"cellStyleXfs"
                    | b"cellStyles" | b"colors" | b"extLst" => section = Section::Other,
                    b"font" => fonts.extend(font.take()),
                    b"fill" => fills.extend(fill.take()),
                    b"border" => borders.extend(border.take()),
                    b"left" | b"right" | b"top" | b"bottom" | b"diagonal" | b"start"
                    | b"end" => edge = None,
                    b"xf" => xfs.extend(xf.take()),
                    _ => {}
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match (section, e.local_name().as_ref()) {
            (_, b"numFmt") => {
                let (id, code) = parse_num_fmt(e)?;
                num_fmts.insert(id, code);
            }
            (_, b"fonts") if !empty => section = Section::Fonts,
            (_, b"fills") if !empty => section = Section::Fills,
            (_, b"borders") if !empty => section = Section::Borders,
            (_, b"cellXfs") if !empty => section = Section::CellXfs,
            (_, b"dxfs" | b"cellStyleXfs" | b"cellStyles" | b"colors" | b"extLst") if !empty => {
                section = Section::Skipped
            }

            (Section::Fonts, b"font") => {
                if empty {
                    fonts.push(Font::default());
                } else {
                    font = Some(Font::default());
                }
            }
            (Section::Fonts, name) => {
                if let Some(font) = font.as_mut() {
                    apply_font_child(font, name, e)?;
                }
            }

            (Section::Fills, b"fill") => {
                if empty {
                    fills.push(Fill::default());
                } else {
                    fill = Some(Fill::default());
                }
            }
            (Section::Fills, b"patternFill") => {
                if let Some(fill) = fill.as_mut() {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"patternType" {
                            let value = xml::value(&attr)?;
                            fill.pattern = PatternType::parse(&value).ok_or_else(|| {
                                XlsxError::corrupt("fill", format!("unknown pattern '{value}'"))
                            })?;
                        }
                    }
                }
            }
            (Section::Fills, b"gradientFill") => {
                log::warn!("gradient fill read as an empty fill");
            }
            (Section::Fills, b"fgColor") => {
                if let Some(fill) = fill.as_mut() {
                    fill.foreground = parse_color(e)?;
                }
            }
            (Section::Fills, b"bgColor") => {
                if let Some(fill) = fill.as_mut() {
                    fill.background = parse_color(e)?;
                }
            }

            (Section::Borders, b"border") => {
                let mut b = Border::default();
                for attr in e.attributes().flatten() {
                    match attr.key.local_name().as_ref() {
                        b"diagonalUp" => b.diagonal_up = xml::is_true(&xml::value(&attr)?),
                        b"diagonalDown" => b.diagonal_down = xml::is_true(&xml::value(&attr)?),
                        _ => {}
                    }
                }
                if empty {
                    borders.push(b);
                } else {
                    border = Some(b);
                }
            }
            (Section::Borders, b"color") => {
                if let (Some(b), Some(name)) = (border.as_mut(), edge) {
                    if let Some(Some(edge)) = b.edge_mut(name) {
                        edge.color = parse_color(e)?;
                    }
                }
            }
            (Section::Borders, name) => {
                if let Some(b) = border.as_mut() {
                    let name = edge_name(name);
                    if let Some(name) = name {
                        if let Some(slot) = b.edge_mut(name) {
                            *slot = parse_edge_style(e)?
                                .map(|style| BorderEdge::new(style, Color::Auto));
                        }
                        if !empty {
                            edge = Some(name);
                        }
                    }
                }
            }

            (Section::CellXfs, b"xf") => {
                let record = parse_xf(e)?;
                if empty {
                    xfs.push(record);
                } else {
                    xf = Some(record);
                }
            }
            (Section::CellXfs, b"alignment") => {
                if let Some(xf) = xf.as_mut() {
                    xf.alignment = parse_alignment(e)?;
                }
            }
            (Section::CellXfs, b"protection") => {
                if let Some(xf) = xf.as_mut() {
                    xf.protection = parse_protection(e)?;
                }
            }

            _ => {}
        }
    }

    let styles = xfs
        .into_iter()
        .enumerate()
        .map(|(i, record)| flatten(i, record, &num_fmts, &fonts, &fills, &borders))
        .collect::<XlsxResult<Vec<_>>>()?;

    log::debug!(
        "read {} styles ({} fonts, {} fills, {} borders, {} number formats)",
        styles.len(),
        fonts.len(),
        fills.len(),
        borders.len(),
        num_fmts.len()
    );
    Ok(StyleRegistry::from_descriptors(styles))
}

/// Resolve one record through the sub-tables; no default substitution
fn flatten(
    index: usize,
    record: XfRecord,
    num_fmts: &AHashMap<u32, String>,
    fonts: &[Font],
    fills: &[Fill],
    borders: &[Border],
) -> XlsxResult<StyleDescriptor> {
    fn lookup<'a, T>(index: usize, table: &'a [T], name: &str, id: u32) -> XlsxResult<&'a T> {
        table.get(id as usize).ok_or_else(|| {
            XlsxError::corrupt(
                format!("cellXfs record {index}"),
                format!("{name}Id {id} outside {name}s table (len: {})", table.len()),
            )
        })
    }

    let number_format = match num_fmts.get(&record.num_fmt_id) {
        Some(code) => NumberFormat::Custom(code.clone()),
        None if record.num_fmt_id >= FIRST_CUSTOM_NUMBER_FORMAT_ID => {
            return Err(XlsxError::corrupt(
                format!("cellXfs record {index}"),
                format!("numFmtId {} has no numFmt record", record.num_fmt_id),
            ))
        }
        None => NumberFormat::BuiltIn(record.num_fmt_id),
    };

    Ok(StyleDescriptor {
        font: lookup(index, fonts, "font", record.font_id)?.clone(),
        fill: *lookup(index, fills, "fill", record.fill_id)?,
        border: lookup(index, borders, "border", record.border_id)?.clone(),
        alignment: record.alignment,
        number_format,
        protection: record.protection,
    })
}

fn parse_num_fmt(e: &BytesStart<'_>) -> XlsxResult<(u32, String)> {
    let mut id = None;
    let mut code = String::new();
    for attr in e.attributes().flatten() {
        match attr.key.local_name().as_ref() {
            b"numFmtId" => id = xml::value(&attr)?.parse::<u32>().ok(),
            b"formatCode" => code = xml::value(&attr)?,
            _ => {}
        }
    }
    let id = id.ok_or_else(|| XlsxError::corrupt("numFmt", "missing or invalid numFmtId"))?;
    Ok((id, code))
}

fn apply_font_child(font: &mut Font, name: &[u8], e: &BytesStart<'_>) -> XlsxResult<()> {
    match name {
        b"b" => font.bold = xml::toggle(e)?,
        b"i" => font.italic = xml::toggle(e)?,
        b"strike" => font.strikethrough = xml::toggle(e)?,
        b"u" => {
            font.underline = Underline::Single;
            for attr in e.attributes().flatten() {
                if attr.key.local_name().as_ref() == b"val" {
                    font.underline = Underline::parse(&xml::value(&attr)?);
                }
            }
        }
        b"sz" | b"name" => {
            for attr in e.attributes().flatten() {
                if attr.key.local_name().as_ref() != b"val" {
                    continue;
                }
                let value = xml::value(&attr)?;
                if name == b"name" {
                    font.name = value;
                } else {
                    font.size = value.parse().map_err(|_| {
                        XlsxError::corrupt("font", format!("invalid size '{value}'"))
                    })?;
                }
            }
        }
        b"color" => font.color = parse_color(e)?,
        _ => {}
    }
    Ok(())
}

fn edge_name(name: &[u8]) -> Option<&'static str> {
    Some(match name {
        b"left" | b"start" => "left",
        b"right" | b"end" => "right",
        b"top" => "top",
        b"bottom" => "bottom",
        b"diagonal" => "diagonal",
        _ => return None,
    })
}

/// Line style of a border edge; an absent or `none` style means no edge
fn parse_edge_style(e: &BytesStart<'_>) -> XlsxResult<Option<BorderLineStyle>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"style" {
            let value = xml::value(&attr)?;
            if value == "none" {
                return Ok(None);
            }
            return BorderLineStyle::parse(&value).map(Some).ok_or_else(|| {
                XlsxError::corrupt("border", format!("unknown line style '{value}'"))
            });
        }
    }
    Ok(None)
}

fn parse_xf(e: &BytesStart<'_>) -> XlsxResult<XfRecord> {
    let mut record = XfRecord::default();
    for attr in e.attributes().flatten() {
        let slot = match attr.key.local_name().as_ref() {
            b"numFmtId" => &mut record.num_fmt_id,
            b"fontId" => &mut record.font_id,
            b"fillId" => &mut record.fill_id,
            b"borderId" => &mut record.border_id,
            _ => continue,
        };
        let value = xml::value(&attr)?;
        *slot = value
            .parse()
            .map_err(|_| XlsxError::corrupt("xf", format!("invalid index '{value}'")))?;
    }
    Ok(record)
}

fn parse_alignment(e: &BytesStart<'_>) -> XlsxResult<Alignment> {
    let mut al = Alignment::default();
    for attr in e.attributes().flatten() {
        let value = xml::value(&attr)?;
        match attr.key.local_name().as_ref() {
            b"horizontal" => {
                if let Some(h) = HorizontalAlignment::parse(&value) {
                    al.horizontal = h;
                }
            }
            b"vertical" => {
                if let Some(v) = VerticalAlignment::parse(&value) {
                    al.vertical = v;
                }
            }
            b"wrapText" => al.wrap_text = xml::is_true(&value),
            b"shrinkToFit" => al.shrink_to_fit = xml::is_true(&value),
            b"indent" => al.indent = value.parse().unwrap_or(0),
            b"textRotation" => al.rotation = value.parse().unwrap_or(0),
            _ => {}
        }
    }
    Ok(al)
}

fn parse_protection(e: &BytesStart<'_>) -> XlsxResult<Protection> {
    let mut protection = Protection::default();
    for attr in e.attributes().flatten() {
        match attr.key.local_name().as_ref() {
            b"locked" => protection.locked = xml::is_true(&xml::value(&attr)?),
            b"hidden" => protection.hidden = xml::is_true(&xml::value(&attr)?),
            _ => {}
        }
    }
    Ok(protection)
}

/// Color from `rgb`, `theme`/`tint`, `indexed` or `auto` attributes
fn parse_color(e: &BytesStart<'_>) -> XlsxResult<Color> {
    let mut rgb = None;
    let mut theme = None;
    let mut tint = 0.0;
    let mut indexed = None;

    for attr in e.attributes().flatten() {
        let value = xml::value(&attr)?;
        match attr.key.local_name().as_ref() {
            b"rgb" => rgb = Color::from_hex(&value),
            b"theme" => theme = value.parse::<u32>().ok(),
            b"tint" => tint = value.parse::<f64>().unwrap_or(0.0),
            b"indexed" => indexed = value.parse::<u32>().ok(),
            _ => {}
        }
    }

    Ok(if let Some(color) = rgb {
        color
    } else if let Some(index) = theme {
        Color::Theme { index, tint }
    } else if let Some(i) = indexed {
        Color::Indexed(i)
    } else {
        Color::Auto
    })
}
