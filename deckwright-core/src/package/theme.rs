//! Theme part reading: accent palette and body font.

use crate::error::PartError;
use crate::types::{Theme, DEFAULT_FONT_FAMILY, DEFAULT_PALETTE};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Read the accent colors and minor (body) font of a theme part.
/// Missing pieces fall back to the default palette and font.
pub fn parse_theme(xml: &str) -> Result<Theme, PartError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut accents: Vec<(String, String)> = Vec::new();
    let mut scheme_slot: Option<String> = None;
    let mut in_color_scheme = false;
    let mut font_group: Option<&'static str> = None;
    let mut minor_font: Option<String> = None;
    let mut major_font: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|source| PartError::Xml {
            position: reader.buffer_position(),
            source,
        })?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"clrScheme" => in_color_scheme = true,
                b"majorFont" => font_group = Some("major"),
                b"minorFont" => font_group = Some("minor"),
                b"srgbClr" | b"sysClr" => record_accent(&e, scheme_slot.as_deref(), &mut accents),
                name if in_color_scheme => {
                    scheme_slot = Some(String::from_utf8_lossy(name).into_owned());
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"srgbClr" | b"sysClr" => record_accent(&e, scheme_slot.as_deref(), &mut accents),
                b"latin" => {
                    let typeface = attribute(&e, b"typeface").filter(|t| !t.is_empty());
                    match font_group {
                        Some("minor") if minor_font.is_none() => minor_font = typeface,
                        Some("major") if major_font.is_none() => major_font = typeface,
                        _ => {}
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"clrScheme" => {
                    in_color_scheme = false;
                    scheme_slot = None;
                }
                b"majorFont" | b"minorFont" => font_group = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    accents.sort_by(|a, b| a.0.cmp(&b.0));
    let colors: Vec<String> = if accents.is_empty() {
        DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
    } else {
        accents.into_iter().map(|(_, color)| color).collect()
    };

    Ok(Theme {
        colors,
        font_family: minor_font
            .or(major_font)
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
    })
}

fn record_accent(e: &BytesStart, slot: Option<&str>, accents: &mut Vec<(String, String)>) {
    if let (Some(slot), Some(color)) = (slot, color_of(e)) {
        if slot.starts_with("accent") {
            accents.push((slot.to_string(), color));
        }
    }
}

fn color_of(e: &BytesStart) -> Option<String> {
    let hex = if e.local_name().as_ref() == b"sysClr" {
        attribute(e, b"lastClr")
    } else {
        attribute(e, b"val")
    }?;
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("#{}", hex.to_ascii_lowercase()))
    } else {
        None
    }
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}
