//! DrawingML emission for one slide part.

use crate::types::TextAlign;
use quick_xml::escape::escape;
use std::fmt::{self, Write as FmtWrite};

pub const NS_DECLS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

/// Shape frame in EMU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl From<(i64, i64, i64, i64)> for Frame {
    fn from((x, y, cx, cy): (i64, i64, i64, i64)) -> Self {
        Self { x, y, cx, cy }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Geometry {
    #[default]
    Rect,
    RoundRect,
    Ellipse,
    Line,
}

impl Geometry {
    fn preset(&self) -> &'static str {
        match self {
            Geometry::Rect => "rect",
            Geometry::RoundRect => "roundRect",
            Geometry::Ellipse => "ellipse",
            Geometry::Line => "line",
        }
    }
}

/// Fill and outline of a shape. Colors are bare `RRGGBB`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeStyle {
    pub fill: Option<String>,
    pub outline: Option<Outline>,
    /// 0..=100000, DrawingML alpha
    pub alpha: Option<u32>,
    pub geometry: Geometry,
    /// Uniform text inset in EMU
    pub inset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub color: String,
    pub width: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bullet {
    Char,
    Numbered,
}

/// Paragraphs sharing one run format
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub paragraphs: Vec<String>,
    /// Points
    pub size: f64,
    pub bold: bool,
    /// Bold the first paragraph only, for headed callouts
    pub first_bold: bool,
    pub color: Option<String>,
    pub align: TextAlign,
    pub bullet: Option<Bullet>,
    pub font: String,
    pub anchor_center: bool,
}

impl TextBlock {
    pub fn new(text: &str, size: f64, font: &str) -> Self {
        Self {
            paragraphs: text.split('\n').map(str::to_string).collect(),
            size,
            bold: false,
            first_bold: false,
            color: None,
            align: TextAlign::Left,
            bullet: None,
            font: font.to_string(),
            anchor_center: false,
        }
    }
}

/// Normalize `#RGB`, `#RRGGBB` or `RRGGBB` to uppercase `RRGGBB`
pub fn hex_color(value: &str) -> Option<String> {
    let hex = value.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some(hex.to_ascii_uppercase()),
        3 => Some(hex.chars().flat_map(|c| [c, c]).collect::<String>().to_ascii_uppercase()),
        _ => None,
    }
}

/// Drop leading bullet glyphs authored into the text itself
fn strip_bullet_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix(['•', '-', '*']) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

/// Accumulates the shape tree of one slide
#[derive(Debug)]
pub struct SlideWriter {
    xml: String,
    next_id: u32,
}

impl Default for SlideWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideWriter {
    pub fn new() -> Self {
        Self {
            xml: String::with_capacity(4096),
            // id 1 is the group shape of the tree itself
            next_id: 2,
        }
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn shape(
        &mut self,
        name: &str,
        frame: Frame,
        style: &ShapeStyle,
        text: Option<&TextBlock>,
        placeholder: Option<&str>,
    ) -> fmt::Result {
        let id = self.take_id();
        let xml = &mut self.xml;

        xml.push_str("<p:sp><p:nvSpPr>");
        write!(xml, r#"<p:cNvPr id="{}" name="{} {}"/>"#, id, escape(name), id)?;
        if text.is_some() && placeholder.is_none() {
            xml.push_str(r#"<p:cNvSpPr txBox="1"/>"#);
        } else {
            xml.push_str("<p:cNvSpPr/>");
        }
        match placeholder {
            Some(kind) => write!(xml, r#"<p:nvPr><p:ph type="{}"/></p:nvPr>"#, kind)?,
            None => xml.push_str("<p:nvPr/>"),
        }
        xml.push_str("</p:nvSpPr>");

        xml.push_str("<p:spPr>");
        write_xfrm(xml, frame)?;
        write!(xml, r#"<a:prstGeom prst="{}"><a:avLst/></a:prstGeom>"#, style.geometry.preset())?;
        match &style.fill {
            Some(color) => write_solid_fill(xml, color, style.alpha)?,
            None => xml.push_str("<a:noFill/>"),
        }
        if let Some(outline) = &style.outline {
            write!(xml, r#"<a:ln w="{}">"#, outline.width)?;
            write_solid_fill(xml, &outline.color, style.alpha)?;
            xml.push_str("</a:ln>");
        }
        xml.push_str("</p:spPr>");

        if let Some(text) = text {
            write_text_body(xml, text, style.inset)?;
        }

        xml.push_str("</p:sp>");
        Ok(())
    }

    pub fn picture(&mut self, frame: Frame, rel_id: &str, description: &str) -> fmt::Result {
        let id = self.take_id();
        let xml = &mut self.xml;

        xml.push_str("<p:pic><p:nvPicPr>");
        write!(
            xml,
            r#"<p:cNvPr id="{}" name="Picture {}" descr="{}"/>"#,
            id,
            id,
            escape(description)
        )?;
        xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#);
        write!(
            xml,
            r#"<p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
            rel_id
        )?;
        xml.push_str("<p:spPr>");
        write_xfrm(xml, frame)?;
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
        Ok(())
    }

    pub fn chart_frame(&mut self, frame: Frame, rel_id: &str) -> fmt::Result {
        let id = self.take_id();
        let xml = &mut self.xml;

        xml.push_str("<p:graphicFrame><p:nvGraphicFramePr>");
        write!(xml, r#"<p:cNvPr id="{}" name="Chart {}"/>"#, id, id)?;
        xml.push_str("<p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr>");
        write!(
            xml,
            r#"<p:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></p:xfrm>"#,
            frame.x, frame.y, frame.cx, frame.cy
        )?;
        xml.push_str(r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart">"#);
        write!(
            xml,
            r#"<c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="{}"/>"#,
            rel_id
        )?;
        xml.push_str("</a:graphicData></a:graphic></p:graphicFrame>");
        Ok(())
    }

    /// Complete `p:sld` part around the shapes written so far
    pub fn finish(self, background: Option<&str>) -> Result<String, fmt::Error> {
        let mut xml = String::with_capacity(self.xml.len() + 1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(xml, "<p:sld {}>", NS_DECLS)?;
        xml.push_str("<p:cSld>");
        if let Some(color) = background {
            write!(
                xml,
                r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
                color
            )?;
        }
        xml.push_str(r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
        xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);
        xml.push_str(&self.xml);
        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#);
        Ok(xml)
    }
}

fn write_xfrm(xml: &mut String, frame: Frame) -> fmt::Result {
    write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        frame.x, frame.y, frame.cx, frame.cy
    )
}

fn write_solid_fill(xml: &mut String, color: &str, alpha: Option<u32>) -> fmt::Result {
    match alpha {
        Some(alpha) => write!(
            xml,
            r#"<a:solidFill><a:srgbClr val="{}"><a:alpha val="{}"/></a:srgbClr></a:solidFill>"#,
            color, alpha
        ),
        None => write!(xml, r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color),
    }
}

fn write_text_body(xml: &mut String, text: &TextBlock, inset: Option<i64>) -> fmt::Result {
    xml.push_str(r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0""#);
    if let Some(inset) = inset {
        write!(
            xml,
            r#" lIns="{inset}" tIns="{inset}" rIns="{inset}" bIns="{inset}""#
        )?;
    }
    if text.anchor_center {
        xml.push_str(r#" anchor="ctr""#);
    }
    xml.push_str("><a:normAutofit/></a:bodyPr><a:lstStyle/>");

    let align = match text.align {
        TextAlign::Left => "l",
        TextAlign::Center => "ctr",
        TextAlign::Right => "r",
    };
    let size = (text.size * 100.0).round().max(100.0) as u32;

    for (i, paragraph) in text.paragraphs.iter().enumerate() {
        let content = match text.bullet {
            Some(_) => strip_bullet_marker(paragraph),
            None => paragraph.as_str(),
        };

        write!(xml, r#"<a:p><a:pPr algn="{}""#, align)?;
        match text.bullet {
            Some(Bullet::Char) => {
                xml.push_str(r#" marL="285750" indent="-285750"><a:buFont typeface="Arial"/><a:buChar char="•"/></a:pPr>"#)
            }
            Some(Bullet::Numbered) => {
                xml.push_str(r#" marL="342900" indent="-342900"><a:buAutoNum type="arabicPeriod"/></a:pPr>"#)
            }
            None => xml.push_str("/>"),
        }

        if content.is_empty() {
            write!(xml, r#"<a:endParaRPr lang="en-US" sz="{}" dirty="0"/></a:p>"#, size)?;
            continue;
        }

        write!(xml, r#"<a:r><a:rPr lang="en-US" sz="{}""#, size)?;
        if text.bold || (text.first_bold && i == 0) {
            xml.push_str(r#" b="1""#);
        }
        xml.push_str(r#" dirty="0">"#);
        if let Some(color) = &text.color {
            write!(xml, r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color)?;
        }
        write!(xml, r#"<a:latin typeface="{}"/>"#, escape(text.font.as_str()))?;
        write!(xml, "</a:rPr><a:t>{}</a:t></a:r></a:p>", escape(content))?;
    }

    xml.push_str("</p:txBody>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::from((10, 20, 300, 400))
    }

    #[test]
    fn hex_color_forms() {
        assert_eq!(hex_color("#10b981").as_deref(), Some("10B981"));
        assert_eq!(hex_color("fff").as_deref(), Some("FFFFFF"));
        assert_eq!(hex_color("#12345"), None);
        assert_eq!(hex_color("blue"), None);
    }

    #[test]
    fn text_shape_escapes_and_sizes() {
        let mut writer = SlideWriter::new();
        let mut block = TextBlock::new("Fees & <costs>\nLine two", 18.0, "Arial");
        block.bold = true;
        writer
            .shape("Text", frame(), &ShapeStyle::default(), Some(&block), None)
            .unwrap();
        let xml = writer.finish(None).unwrap();

        assert!(xml.contains(r#"<a:off x="10" y="20"/><a:ext cx="300" cy="400"/>"#));
        assert!(xml.contains("Fees &amp; &lt;costs&gt;"));
        assert!(xml.contains(r#"sz="1800" b="1""#));
        assert_eq!(xml.matches("<a:p>").count(), 2);
        assert!(xml.contains(r#"<p:cNvSpPr txBox="1"/>"#));
    }

    #[test]
    fn bullets_strip_authored_markers() {
        let mut writer = SlideWriter::new();
        let mut block = TextBlock::new("• First\n- Second", 16.0, "Arial");
        block.bullet = Some(Bullet::Char);
        writer
            .shape("List", frame(), &ShapeStyle::default(), Some(&block), None)
            .unwrap();
        let xml = writer.finish(None).unwrap();

        assert_eq!(xml.matches(r#"<a:buChar char="•"/>"#).count(), 2);
        assert!(xml.contains("<a:t>First</a:t>"));
        assert!(xml.contains("<a:t>Second</a:t>"));
    }

    #[test]
    fn fill_outline_and_alpha() {
        let mut writer = SlideWriter::new();
        let style = ShapeStyle {
            fill: Some("E5E7EB".to_string()),
            outline: Some(Outline {
                color: "F59E0B".to_string(),
                width: 25400,
            }),
            alpha: Some(50000),
            geometry: Geometry::RoundRect,
            inset: None,
        };
        writer.shape("Shape", frame(), &style, None, None).unwrap();
        let xml = writer.finish(Some("F3F4F6")).unwrap();

        assert!(xml.contains(r#"prst="roundRect""#));
        assert!(xml.contains(r#"<a:srgbClr val="E5E7EB"><a:alpha val="50000"/></a:srgbClr>"#));
        assert!(xml.contains(r#"<a:ln w="25400">"#));
        assert!(xml.contains(r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="F3F4F6"/>"#));
    }

    #[test]
    fn shape_ids_are_unique() {
        let mut writer = SlideWriter::new();
        writer.chart_frame(frame(), "rId2").unwrap();
        writer.picture(frame(), "rId3", "Logo").unwrap();
        let xml = writer.finish(None).unwrap();

        assert!(xml.contains(r#"<p:cNvPr id="2" name="Chart 2"/>"#));
        assert!(xml.contains(r#"<p:cNvPr id="3" name="Picture 3" descr="Logo"/>"#));
        assert!(xml.contains(r#"r:id="rId2""#));
        assert!(xml.contains(r#"r:embed="rId3""#));
    }
}
