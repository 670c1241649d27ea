//! Zip container access for presentation packages.

use crate::error::ImportError;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::sync::LazyLock;

pub const PRESENTATION_PART: &str = "ppt/presentation.xml";
pub const SLIDE_PREFIX: &str = "ppt/slides/slide";
pub const THEME_PREFIX: &str = "ppt/theme/theme";

/// Upper bound on the buffer reserved up front for one part. Entry headers
/// declare their own size, so larger parts grow as they inflate.
const MAX_PART_RESERVE: u64 = 8 * 1024 * 1024;

static SLIDE_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// Every part of a package, fully read into memory
#[derive(Debug, Clone, Default)]
pub struct RawPackage {
    parts: BTreeMap<String, Vec<u8>>,
}

impl RawPackage {
    pub fn from_parts(parts: BTreeMap<String, Vec<u8>>) -> Self {
        Self { parts }
    }

    /// Read a zip container. Anything that is not a readable zip is corrupt.
    pub fn read(bytes: &[u8]) -> Result<Self, ImportError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ImportError::CorruptPackage(format!("not a zip container: {e}")))?;

        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| ImportError::CorruptPackage(format!("unreadable entry {i}: {e}")))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(reserve_for(file.size()));
            file.read_to_end(&mut data).map_err(|e| {
                ImportError::CorruptPackage(format!("failed to inflate {name}: {e}"))
            })?;
            parts.insert(name, data);
        }

        let package = Self { parts };
        if !package.contains(PRESENTATION_PART) && package.slide_part_names().is_empty() {
            return Err(ImportError::CorruptPackage(
                "no presentation part and no slide parts".to_string(),
            ));
        }
        Ok(package)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    pub fn part_str(&self, name: &str) -> Option<&str> {
        self.part(name).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Slide parts ordered by their numeric suffix (slide2 before slide10)
    pub fn slide_part_names(&self) -> Vec<String> {
        let mut names: Vec<(u64, String)> = self
            .parts
            .keys()
            .filter_map(|name| {
                SLIDE_NUMBER_REGEX
                    .captures(name)
                    .and_then(|caps| caps[1].parse::<u64>().ok())
                    .map(|number| (number, name.clone()))
            })
            .collect();
        names.sort();
        names.into_iter().map(|(_, name)| name).collect()
    }

    /// First theme part by name order
    pub fn theme_part_name(&self) -> Option<&str> {
        self.part_names()
            .find(|name| name.starts_with(THEME_PREFIX) && name.ends_with(".xml"))
    }

    /// Relationships of a part, keyed by relationship id, targets resolved to part names
    pub fn relationships(&self, part_name: &str) -> HashMap<String, String> {
        let Some(xml) = self.part_str(&rels_part_name(part_name)) else {
            return HashMap::new();
        };
        parse_relationships(xml)
            .into_iter()
            .filter(|rel| !rel.external)
            .map(|rel| (rel.id, resolve_target(part_name, &rel.target)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Relationship {
    id: String,
    target: String,
    external: bool,
}

/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`
pub fn rels_part_name(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part_name}.rels"),
    }
}

fn parse_relationships(xml: &str) -> Vec<Relationship> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut rels = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                let mut external = false;
                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().map(|v| v.into_owned()).ok();
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = value,
                        b"Target" => target = value,
                        b"TargetMode" => external = value.as_deref() == Some("External"),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rels.push(Relationship { id, target, external });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(error = %e, "stopping at malformed relationships part");
                break;
            }
            _ => {}
        }
    }
    rels
}

/// Resolve a relationship target relative to the part that owns it
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn reserve_for(declared_size: u64) -> usize {
    declared_size.min(MAX_PART_RESERVE) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(names: &[&str]) -> RawPackage {
        RawPackage::from_parts(
            names
                .iter()
                .map(|n| (n.to_string(), b"<x/>".to_vec()))
                .collect(),
        )
    }

    #[test]
    fn slide_parts_use_numeric_order() {
        let pkg = package(&[
            "ppt/slides/slide10.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/_rels/slide1.xml.rels",
            "ppt/slideLayouts/slideLayout1.xml",
        ]);
        assert_eq!(
            pkg.slide_part_names(),
            vec![
                "ppt/slides/slide1.xml",
                "ppt/slides/slide2.xml",
                "ppt/slides/slide10.xml"
            ]
        );
    }

    #[test]
    fn resolves_relative_targets() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../charts/chart3.xml"),
            "ppt/charts/chart3.xml"
        );
        assert_eq!(
            resolve_target("ppt/presentation.xml", "slides/slide1.xml"),
            "ppt/slides/slide1.xml"
        );
        assert_eq!(resolve_target("ppt/slides/slide1.xml", "/ppt/media/a.png"), "ppt/media/a.png");
        assert_eq!(rels_part_name("ppt/slides/slide4.xml"), "ppt/slides/_rels/slide4.xml.rels");
    }

    #[test]
    fn relationships_skip_external_targets() {
        let rels = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="x" Target="../charts/chart1.xml"/>
  <Relationship Id="rId2" Type="x" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;
        let mut parts = BTreeMap::new();
        parts.insert("ppt/slides/slide1.xml".to_string(), b"<p:sld/>".to_vec());
        parts.insert("ppt/slides/_rels/slide1.xml.rels".to_string(), rels.as_bytes().to_vec());
        let pkg = RawPackage::from_parts(parts);

        let resolved = pkg.relationships("ppt/slides/slide1.xml");
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved["rId1"], "ppt/charts/chart1.xml");
    }

    #[test]
    fn declared_part_size_is_not_trusted() {
        assert_eq!(reserve_for(4096), 4096);
        assert_eq!(reserve_for(u64::MAX), MAX_PART_RESERVE as usize);
    }

    #[test]
    fn garbage_bytes_are_corrupt() {
        let err = RawPackage::read(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ImportError::CorruptPackage(_)));
    }
}
