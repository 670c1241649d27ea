//! Package assembly: every part the container needs besides the slides'
//! own shape trees, written into a zip in one pass.

use crate::error::ExportError;
use crate::export::shapes::{hex_color, NS_DECLS};
use crate::types::Theme;
use quick_xml::escape::escape;
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const REL_CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_EXTENDED_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_SLIDE_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_SLIDE_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_CHART: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
const CT_CORE_PROPS: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_EXTENDED_PROPS: &str =
    "application/vnd.openxmlformats-officedocument.extended-properties+xml";

/// First id in `p:sldIdLst`; lower values are reserved
const FIRST_SLIDE_ID: u32 = 256;
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Sniff the format from magic bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(b"GIF8") {
            Some(ImageFormat::Gif)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
        }
    }
}

/// Relationships of one slide, numbered as they are added. `rId1` is always
/// the slide layout.
#[derive(Debug)]
pub struct SlideRels {
    entries: Vec<(&'static str, String)>,
}

impl Default for SlideRels {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideRels {
    pub fn new() -> Self {
        Self {
            entries: vec![(REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml".to_string())],
        }
    }

    fn add(&mut self, rel_type: &'static str, target: String) -> String {
        self.entries.push((rel_type, target));
        format!("rId{}", self.entries.len())
    }

    pub fn add_chart(&mut self, chart_number: usize) -> String {
        self.add(REL_CHART, format!("../charts/chart{chart_number}.xml"))
    }

    pub fn add_image(&mut self, media_name: &str) -> String {
        self.add(REL_IMAGE, format!("../media/{media_name}"))
    }

    fn to_xml(&self) -> String {
        let targets: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(rel_type, target)| (*rel_type, target.as_str()))
            .collect();
        relationships_xml(&targets)
    }
}

#[derive(Debug)]
pub struct SlidePart {
    pub xml: String,
    pub rels: SlideRels,
}

#[derive(Debug, Default, Clone)]
pub struct CoreProperties {
    pub title: String,
    pub author: String,
    pub company: Option<String>,
}

/// Everything that goes into one package
#[derive(Debug, Default)]
pub struct PackageParts {
    pub slides: Vec<SlidePart>,
    /// `chartN.xml` bodies, N starting at 1
    pub charts: Vec<Vec<u8>>,
    /// (file name under `ppt/media/`, bytes, format)
    pub media: Vec<(String, Vec<u8>, ImageFormat)>,
    /// Slide size in EMU
    pub extent: (i64, i64),
    pub theme: Theme,
    pub properties: CoreProperties,
}

pub fn write_package(parts: &PackageParts) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut put = |name: &str, bytes: &[u8]| -> Result<(), ExportError> {
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
        Ok(())
    };

    put("[Content_Types].xml", content_types_xml(parts).as_bytes())?;
    put("_rels/.rels", package_rels_xml().as_bytes())?;
    put("docProps/core.xml", core_properties_xml(&parts.properties).as_bytes())?;
    put("docProps/app.xml", app_properties_xml(parts).as_bytes())?;

    put("ppt/presentation.xml", presentation_xml(parts).as_bytes())?;
    put("ppt/_rels/presentation.xml.rels", presentation_rels_xml(parts.slides.len()).as_bytes())?;

    put("ppt/slideMasters/slideMaster1.xml", slide_master_xml().as_bytes())?;
    put(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        relationships_xml(&[
            (REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
            (REL_THEME, "../theme/theme1.xml"),
        ])
        .as_bytes(),
    )?;
    put("ppt/slideLayouts/slideLayout1.xml", slide_layout_xml().as_bytes())?;
    put(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        relationships_xml(&[(REL_SLIDE_MASTER, "../slideMasters/slideMaster1.xml")]).as_bytes(),
    )?;
    put("ppt/theme/theme1.xml", theme_xml(&parts.theme).as_bytes())?;

    for (i, slide) in parts.slides.iter().enumerate() {
        let number = i + 1;
        put(&format!("ppt/slides/slide{number}.xml"), slide.xml.as_bytes())?;
        put(
            &format!("ppt/slides/_rels/slide{number}.xml.rels"),
            slide.rels.to_xml().as_bytes(),
        )?;
    }

    for (i, chart) in parts.charts.iter().enumerate() {
        put(&format!("ppt/charts/chart{}.xml", i + 1), chart)?;
    }

    for (name, bytes, _) in &parts.media {
        put(&format!("ppt/media/{name}"), bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn relationships_xml(targets: &[(&str, &str)]) -> String {
    let mut xml = String::with_capacity(256 + targets.len() * 160);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    for (i, (rel_type, target)) in targets.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{}" Target="{}"/>"#,
            i + 1,
            rel_type,
            escape(*target)
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn content_types_xml(parts: &PackageParts) -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

    let mut formats: Vec<ImageFormat> = Vec::new();
    for (_, _, format) in &parts.media {
        if !formats.contains(format) {
            formats.push(*format);
        }
    }
    for format in formats {
        let _ = write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.mime_type()
        );
    }

    let mut push_override = |part: &str, content_type: &str| {
        let _ = write!(
            xml,
            r#"<Override PartName="{}" ContentType="{}"/>"#,
            part, content_type
        );
    };
    push_override("/ppt/presentation.xml", CT_PRESENTATION);
    push_override("/ppt/slideMasters/slideMaster1.xml", CT_SLIDE_MASTER);
    push_override("/ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT);
    push_override("/ppt/theme/theme1.xml", CT_THEME);
    for i in 1..=parts.slides.len() {
        push_override(&format!("/ppt/slides/slide{i}.xml"), CT_SLIDE);
    }
    for i in 1..=parts.charts.len() {
        push_override(&format!("/ppt/charts/chart{i}.xml"), CT_CHART);
    }
    push_override("/docProps/core.xml", CT_CORE_PROPS);
    push_override("/docProps/app.xml", CT_EXTENDED_PROPS);

    xml.push_str("</Types>");
    xml
}

fn package_rels_xml() -> String {
    relationships_xml(&[
        (REL_OFFICE_DOCUMENT, "ppt/presentation.xml"),
        (REL_CORE_PROPS, "docProps/core.xml"),
        (REL_EXTENDED_PROPS, "docProps/app.xml"),
    ])
}

/// rId1 master, rId2.. slides, theme last
fn presentation_rels_xml(slide_count: usize) -> String {
    let slide_targets: Vec<String> = (1..=slide_count)
        .map(|i| format!("slides/slide{i}.xml"))
        .collect();

    let mut targets: Vec<(&str, &str)> =
        vec![(REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml")];
    targets.extend(slide_targets.iter().map(|t| (REL_SLIDE, t.as_str())));
    targets.push((REL_THEME, "theme/theme1.xml"));
    relationships_xml(&targets)
}

fn presentation_xml(parts: &PackageParts) -> String {
    let mut xml = String::with_capacity(1024 + parts.slides.len() * 48);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<p:presentation {} saveSubsetFonts="1">"#, NS_DECLS);
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);

    if !parts.slides.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for i in 0..parts.slides.len() {
            let _ = write!(
                xml,
                r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                FIRST_SLIDE_ID as usize + i,
                i + 2
            );
        }
        xml.push_str("</p:sldIdLst>");
    }

    let (cx, cy) = parts.extent;
    let _ = write!(xml, r#"<p:sldSz cx="{}" cy="{}"/>"#, cx, cy);
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");
    xml
}

fn slide_master_xml() -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    let _ = write!(xml, "<p:sldMaster {}>", NS_DECLS);
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld>"#);
    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str(r#"<p:txStyles><p:titleStyle><a:lvl1pPr><a:defRPr sz="3600"><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr><a:defRPr sz="1800"><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"/></a:lvl1pPr></p:otherStyle></p:txStyles>"#);
    xml.push_str("</p:sldMaster>");
    xml
}

fn slide_layout_xml() -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<p:sldLayout {} type="blank" preserve="1">"#, NS_DECLS);
    xml.push_str(r#"<p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld>"#);
    xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#);
    xml
}

/// Theme part built from the document theme. Accent slots the theme does not
/// fill reuse its colors in order.
fn theme_xml(theme: &Theme) -> String {
    let mut accents: Vec<String> = theme.colors.iter().filter_map(|c| hex_color(c)).collect();
    if accents.is_empty() {
        accents = Theme::default().colors.iter().filter_map(|c| hex_color(c)).collect();
    }
    let font = escape(theme.font_family.as_str());

    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Deckwright">"#);
    xml.push_str(r#"<a:themeElements><a:clrScheme name="Deckwright">"#);
    xml.push_str(r#"<a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>"#);
    xml.push_str(r#"<a:dk2><a:srgbClr val="1F2937"/></a:dk2><a:lt2><a:srgbClr val="F3F4F6"/></a:lt2>"#);
    for slot in 0..6 {
        let color = &accents[slot % accents.len()];
        let _ = write!(xml, r#"<a:accent{n}><a:srgbClr val="{color}"/></a:accent{n}>"#, n = slot + 1);
    }
    xml.push_str(r#"<a:hlink><a:srgbClr val="2563EB"/></a:hlink><a:folHlink><a:srgbClr val="7C3AED"/></a:folHlink>"#);
    xml.push_str("</a:clrScheme>");
    let _ = write!(
        xml,
        r#"<a:fontScheme name="Deckwright"><a:majorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>"#
    );
    xml.push_str(r#"<a:fmtScheme name="Deckwright"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>"#);
    xml.push_str(r#"<a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst>"#);
    xml.push_str(r#"<a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>"#);
    xml.push_str(r#"<a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme>"#);
    xml.push_str("</a:themeElements></a:theme>");
    xml
}

fn core_properties_xml(properties: &CoreProperties) -> String {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let mut xml = String::with_capacity(768);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
    let _ = write!(xml, "<dc:title>{}</dc:title>", escape(properties.title.as_str()));
    let _ = write!(xml, "<dc:creator>{}</dc:creator>", escape(properties.author.as_str()));
    let _ = write!(
        xml,
        "<cp:lastModifiedBy>{}</cp:lastModifiedBy><cp:revision>1</cp:revision>",
        escape(properties.author.as_str())
    );
    let _ = write!(
        xml,
        r#"<dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>"#
    );
    xml.push_str("</cp:coreProperties>");
    xml
}

fn app_properties_xml(parts: &PackageParts) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#);
    let _ = write!(
        xml,
        "<Application>deckwright {}</Application>",
        env!("CARGO_PKG_VERSION")
    );
    let _ = write!(xml, "<Slides>{}</Slides>", parts.slides.len());
    if let Some(company) = &parts.properties.company {
        let _ = write!(xml, "<Company>{}</Company>", escape(company.as_str()));
    }
    xml.push_str("</Properties>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::archive::RawPackage;
    use crate::package::theme::parse_theme;

    fn parts_with_slides(count: usize) -> PackageParts {
        PackageParts {
            slides: (0..count)
                .map(|_| SlidePart {
                    xml: format!("{XML_DECL}<p:sld {NS_DECLS}/>"),
                    rels: SlideRels::new(),
                })
                .collect(),
            extent: (12_192_000, 6_858_000),
            theme: Theme::default(),
            properties: CoreProperties {
                title: "Q3 Review".to_string(),
                author: "ClientView".to_string(),
                company: None,
            },
            ..PackageParts::default()
        }
    }

    #[test]
    fn package_has_skeleton_parts() {
        let bytes = write_package(&parts_with_slides(2)).unwrap();
        let package = RawPackage::read(&bytes).unwrap();

        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/theme/theme1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/_rels/slide2.xml.rels",
        ] {
            assert!(package.contains(part), "missing {part}");
        }
        assert_eq!(package.slide_part_names().len(), 2);

        let presentation = package.part_str("ppt/presentation.xml").unwrap();
        assert!(presentation.contains(r#"<p:sldId id="256" r:id="rId2"/>"#));
        assert!(presentation.contains(r#"<p:sldId id="257" r:id="rId3"/>"#));
        assert!(presentation.contains(r#"<p:sldSz cx="12192000" cy="6858000"/>"#));
    }

    #[test]
    fn slide_rels_number_from_layout() {
        let mut rels = SlideRels::new();
        assert_eq!(rels.add_chart(1), "rId2");
        assert_eq!(rels.add_image("image1.png"), "rId3");
        let xml = rels.to_xml();
        assert!(xml.contains(r#"Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart" Target="../charts/chart1.xml""#));
    }

    #[test]
    fn theme_reads_back() {
        let theme = Theme {
            colors: vec!["#112233".to_string()],
            font_family: "Georgia".to_string(),
        };
        let parsed = parse_theme(&theme_xml(&theme)).unwrap();
        assert_eq!(parsed.font_family, "Georgia");
        assert_eq!(parsed.colors[0], "#112233");
        assert_eq!(parsed.colors.len(), 6);
    }

    #[test]
    fn image_formats_sniffed() {
        assert_eq!(ImageFormat::detect(&[0x89, b'P', b'N', b'G', 0x0D]), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect(b"hello"), None);
    }
}
