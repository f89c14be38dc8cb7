//! Zip container access and package relationships

use std::io::{BufRead, BufReader, Read, Seek};

use quick_xml::events::Event;

use crate::error::{PartContext, XlsxError, XlsxResult};
use crate::xml;

/// Compound-file magic: encrypted packages and legacy binary workbooks
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

pub(crate) const ROOT_RELS: &str = "_rels/.rels";
pub(crate) const DEFAULT_WORKBOOK: &str = "xl/workbook.xml";
const BINARY_WORKBOOK: &str = "xl/workbook.bin";

/// A relationship type, reduced to the kinds the loader cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelKind {
    OfficeDocument,
    Worksheet,
    Chartsheet,
    SharedStrings,
    Styles,
    /// Parts that are skipped without comment (theme, calcChain, ...)
    Ignored,
    Unknown,
}

impl RelKind {
    fn from_type(rel_type: &str) -> Self {
        let name = rel_type.rsplit('/').next().unwrap_or(rel_type);
        match name {
            "officeDocument" => RelKind::OfficeDocument,
            "worksheet" => RelKind::Worksheet,
            "chartsheet" => RelKind::Chartsheet,
            "sharedStrings" => RelKind::SharedStrings,
            "styles" => RelKind::Styles,
            "theme" | "calcChain" | "externalLink" | "customXml" | "connections"
            | "pivotCacheDefinition" | "metadata" | "volatileDependencies" | "vbaProject"
            | "core-properties" | "extended-properties" | "custom-properties" | "thumbnail"
            | "persons" => RelKind::Ignored,
            _ => RelKind::Unknown,
        }
    }
}

/// One `<Relationship>` with its target resolved to a part name
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub kind: RelKind,
    pub rel_type: String,
    /// Part name inside the container (no leading '/'), or the raw
    /// target for external relationships
    pub target: String,
    pub external: bool,
}

/// Read access to the parts of a zip container
pub(crate) struct Container<R> {
    archive: zip::ZipArchive<R>,
}

impl<R: Read + Seek> Container<R> {
    /// Open a container, rejecting formats that look like spreadsheets but
    /// are not zip packages of XML parts
    pub(crate) fn open(mut reader: R) -> XlsxResult<Self> {
        reader.rewind()?;
        let mut head = Vec::with_capacity(OLE_MAGIC.len());
        (&mut reader)
            .take(OLE_MAGIC.len() as u64)
            .read_to_end(&mut head)?;
        reader.rewind()?;

        if head == OLE_MAGIC {
            return Err(XlsxError::unsupported(
                "compound file container (encrypted package or legacy binary workbook)",
            ));
        }

        let archive = zip::ZipArchive::new(reader)?;
        let container = Self { archive };
        if container.has_entry(BINARY_WORKBOOK) && !container.has_entry(DEFAULT_WORKBOOK) {
            return Err(XlsxError::unsupported("binary workbook (xl/workbook.bin)"));
        }
        log::debug!("opened container with {} entries", container.archive.len());
        Ok(container)
    }

    pub(crate) fn has_entry(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Decompressing byte stream over one entry
    ///
    /// Fails with `NotFound` if the entry is absent.
    pub(crate) fn open_entry(&mut self, name: &str) -> XlsxResult<Box<dyn BufRead + '_>> {
        match self.archive.by_name(name) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(zip::result::ZipError::FileNotFound) => Err(XlsxError::missing_part(name)),
            Err(e) => Err(e).in_part(name),
        }
    }

    /// Relationships declared for `part` (empty if it has no rels part)
    pub(crate) fn relationships(&mut self, part: &str) -> XlsxResult<Vec<Relationship>> {
        let rels_part = rels_path_for(part);
        if !self.has_entry(&rels_part) {
            return Ok(Vec::new());
        }
        let source = self.open_entry(&rels_part)?;
        let rels = read_relationships(source, part).in_part(&rels_part)?;
        log::debug!("read {} relationships from {}", rels.len(), rels_part);
        Ok(rels)
    }

    /// Locate the workbook part through the package relationships
    pub(crate) fn workbook_part(&mut self) -> XlsxResult<String> {
        let root = self.relationships("")?;
        if let Some(rel) = root.iter().find(|r| r.kind == RelKind::OfficeDocument) {
            if self.has_entry(&rel.target) {
                return Ok(rel.target.clone());
            }
            log::warn!(
                "officeDocument relationship points at missing part '{}'",
                rel.target
            );
        } else {
            log::warn!("no officeDocument relationship; trying {DEFAULT_WORKBOOK}");
        }

        if self.has_entry(DEFAULT_WORKBOOK) {
            Ok(DEFAULT_WORKBOOK.to_string())
        } else {
            Err(XlsxError::corrupt("container", "no workbook manifest part"))
        }
    }
}

/// Path of the rels part describing `part` (`""` is the package itself)
pub(crate) fn rels_path_for(part: &str) -> String {
    if part.is_empty() {
        return ROOT_RELS.to_string();
    }
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part that declares it
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    let joined = if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else {
        match source_part.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{target}"),
            None => target.to_string(),
        }
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn read_relationships<B: BufRead>(source: B, source_part: &str) -> XlsxResult<Vec<Relationship>> {
    let mut reader = xml::reader(source);
    let mut buf = Vec::new();
    let mut rels = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut rel_type = String::new();
                let mut target = None;
                let mut external = false;

                for attr in e.attributes().flatten() {
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(xml::value(&attr)?),
                        b"Type" => rel_type = xml::value(&attr)?,
                        b"Target" => target = Some(xml::value(&attr)?),
                        b"TargetMode" => external = xml::value(&attr)? == "External",
                        _ => {}
                    }
                }

                let (Some(id), Some(target)) = (id, target) else {
                    return Err(XlsxError::corrupt(
                        "Relationship",
                        "relationship without Id or Target",
                    ));
                };
                let target = if external {
                    target
                } else {
                    resolve_target(source_part, &target)
                };
                rels.push(Relationship {
                    id,
                    kind: RelKind::from_type(&rel_type),
                    rel_type,
                    target,
                    external,
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}
