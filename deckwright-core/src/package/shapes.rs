//! Positioned shape extraction from slide parts.
//!
//! Frames are reported in package units (EMU) with group transforms already
//! applied, so callers only need the slide-level LayoutTransform.

use crate::error::PartError;
use crate::types::Rect;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeContent {
    Text {
        paragraphs: Vec<String>,
        /// Points, from the first run that carries a size
        font_size: Option<f64>,
        bold: bool,
    },
    Chart {
        relationship_id: String,
    },
    Picture {
        relationship_id: Option<String>,
        description: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    pub content: ShapeContent,
    /// Absent for placeholders that inherit their frame from the layout
    pub frame: Option<Rect>,
    /// Placeholder type (`title`, `ctrTitle`, `body`, ...) when the shape is one
    pub placeholder: Option<String>,
}

impl ShapeRecord {
    pub fn is_title(&self) -> bool {
        matches!(self.placeholder.as_deref(), Some("title") | Some("ctrTitle"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ShapeKind {
    Sp,
    Frame,
    Pic,
}

#[derive(Debug)]
struct ShapeBuilder {
    kind: ShapeKind,
    offset: Option<(f64, f64)>,
    extent: Option<(f64, f64)>,
    paragraphs: Vec<String>,
    paragraph: Option<String>,
    font_size: Option<f64>,
    bold: bool,
    chart: Option<String>,
    blip: Option<String>,
    description: String,
    placeholder: Option<String>,
}

impl ShapeBuilder {
    fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            offset: None,
            extent: None,
            paragraphs: Vec::new(),
            paragraph: None,
            font_size: None,
            bold: false,
            chart: None,
            blip: None,
            description: String::new(),
            placeholder: None,
        }
    }

    fn finish(self, groups: &[GroupTransform]) -> Option<ShapeRecord> {
        let frame = match (self.offset, self.extent) {
            (Some((x, y)), Some((cx, cy))) => Some(
                groups
                    .iter()
                    .rev()
                    .fold(Rect::new(x, y, cx, cy), |rect, group| group.apply(rect)),
            ),
            _ => None,
        };

        let content = match (self.kind, self.chart) {
            (ShapeKind::Pic, _) => ShapeContent::Picture {
                relationship_id: self.blip,
                description: self.description,
            },
            (_, Some(relationship_id)) => ShapeContent::Chart { relationship_id },
            _ => {
                let paragraphs: Vec<String> = self
                    .paragraphs
                    .into_iter()
                    .map(|p| p.trim().to_string())
                    .collect();
                if paragraphs.iter().all(|p| p.is_empty()) {
                    return None;
                }
                ShapeContent::Text {
                    paragraphs,
                    font_size: self.font_size,
                    bold: self.bold,
                }
            }
        };

        Some(ShapeRecord {
            content,
            frame,
            placeholder: self.placeholder,
        })
    }
}

/// Child-space to parent-space mapping of a group shape
#[derive(Debug, Default, Clone, Copy)]
struct GroupTransform {
    offset: (f64, f64),
    extent: (f64, f64),
    child_offset: (f64, f64),
    child_extent: (f64, f64),
}

impl GroupTransform {
    fn apply(&self, rect: Rect) -> Rect {
        let ratio = |ext: f64, child: f64| if child > 0.0 { ext / child } else { 1.0 };
        let sx = ratio(self.extent.0, self.child_extent.0);
        let sy = ratio(self.extent.1, self.child_extent.1);
        Rect::new(
            self.offset.0 + (rect.x - self.child_offset.0) * sx,
            self.offset.1 + (rect.y - self.child_offset.1) * sy,
            rect.width * sx,
            rect.height * sy,
        )
    }
}

pub fn extract_shapes(xml: &str) -> Result<Vec<ShapeRecord>, PartError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut records = Vec::new();
    let mut groups: Vec<GroupTransform> = Vec::new();
    let mut current: Option<ShapeBuilder> = None;

    loop {
        let event = reader.read_event().map_err(|source| PartError::Xml {
            position: reader.buffer_position(),
            source,
        })?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => current = Some(ShapeBuilder::new(ShapeKind::Sp)),
                b"graphicFrame" => current = Some(ShapeBuilder::new(ShapeKind::Frame)),
                b"pic" => current = Some(ShapeBuilder::new(ShapeKind::Pic)),
                b"grpSp" => groups.push(GroupTransform::default()),
                b"p" => {
                    if let Some(shape) = current.as_mut() {
                        shape.paragraph = Some(String::new());
                    }
                }
                _ => on_element(&e, &mut current, &mut groups),
            },
            Event::Empty(e) => on_element(&e, &mut current, &mut groups),
            Event::Text(t) => {
                if let Some(paragraph) = current.as_mut().and_then(|s| s.paragraph.as_mut()) {
                    let text = t.unescape().map_err(|source| PartError::Xml {
                        position: reader.buffer_position(),
                        source,
                    })?;
                    paragraph.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(shape) = current.as_mut() {
                        if let Some(done) = shape.paragraph.take() {
                            shape.paragraphs.push(done);
                        }
                    }
                }
                b"sp" | b"graphicFrame" | b"pic" => {
                    if let Some(record) = current.take().and_then(|s| s.finish(&groups)) {
                        records.push(record);
                    }
                }
                b"grpSp" => {
                    groups.pop();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

fn on_element(e: &BytesStart, current: &mut Option<ShapeBuilder>, groups: &mut [GroupTransform]) {
    match (e.local_name().as_ref(), current.as_mut()) {
        (b"off", Some(shape)) if shape.offset.is_none() => {
            shape.offset = pair(e, b"x", b"y");
        }
        (b"ext", Some(shape)) if shape.extent.is_none() => {
            shape.extent = pair(e, b"cx", b"cy");
        }
        (b"off", None) => {
            if let (Some(group), Some(offset)) = (groups.last_mut(), pair(e, b"x", b"y")) {
                group.offset = offset;
            }
        }
        (b"ext", None) => {
            if let (Some(group), Some(extent)) = (groups.last_mut(), pair(e, b"cx", b"cy")) {
                group.extent = extent;
            }
        }
        (b"chOff", None) => {
            if let (Some(group), Some(offset)) = (groups.last_mut(), pair(e, b"x", b"y")) {
                group.child_offset = offset;
            }
        }
        (b"chExt", None) => {
            if let (Some(group), Some(extent)) = (groups.last_mut(), pair(e, b"cx", b"cy")) {
                group.child_extent = extent;
            }
        }
        (b"ph", Some(shape)) => {
            shape.placeholder = Some(attribute(e, b"type").unwrap_or_else(|| "body".to_string()));
        }
        (b"br", Some(shape)) => {
            if let Some(paragraph) = shape.paragraph.as_mut() {
                paragraph.push('\n');
            }
        }
        (b"rPr", Some(shape)) => {
            if shape.font_size.is_none() {
                shape.font_size = attribute(e, b"sz")
                    .and_then(|sz| sz.parse::<f64>().ok())
                    .map(|hundredths| hundredths / 100.0);
            }
            if attribute(e, b"b").as_deref() == Some("1") {
                shape.bold = true;
            }
        }
        (b"chart", Some(shape)) => {
            shape.chart = attribute(e, b"id");
        }
        (b"blip", Some(shape)) => {
            shape.blip = attribute(e, b"embed");
        }
        (b"cNvPr", Some(shape)) => {
            if let Some(description) = attribute(e, b"descr").or_else(|| attribute(e, b"name")) {
                shape.description = description;
            }
        }
        _ => {}
    }
}

fn pair(e: &BytesStart, a: &[u8], b: &[u8]) -> Option<(f64, f64)> {
    let first = attribute(e, a)?.parse::<f64>().ok()?;
    let second = attribute(e, b)?.parse::<f64>().ok()?;
    Some((first, second))
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}
