use crate::config::ParserConfig;
use crate::error::{ImportError, ImportWarning, PartError};
use crate::export::package::ImageFormat;
use crate::layout::LayoutTransform;
use crate::package::archive::{RawPackage, PRESENTATION_PART};
use crate::package::charts::parse_chart;
use crate::package::preprocessor::{ParsedPackage, Preprocessor};
use crate::package::shapes::{extract_shapes, ShapeContent, ShapeRecord};
use crate::package::text::{self, SlideText};
use crate::package::theme::parse_theme;
use crate::types::*;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

static BACKGROUND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<p:bg>.*?<a:srgbClr val="([0-9A-Fa-f]{6})""#).unwrap()
});

const TITLE_FONT_SIZE: f64 = 36.0;
const BODY_FONT_SIZE: f64 = 18.0;

/// Reads presentation packages into Documents.
///
/// Components are built from positioned shapes where the part has them;
/// otherwise a title box and a body box (and a chart box when the part
/// references a chart) are laid out on the canvas.
pub struct PackageParser {
    config: ParserConfig,
    canvas: Extent,
}

impl PackageParser {
    pub fn new(config: ParserConfig, canvas: Extent) -> Self {
        Self { config, canvas }
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Document, ImportError> {
        self.process(bytes).map(|parsed| parsed.document)
    }

    pub fn parse_with_report(&self, bytes: &[u8]) -> Result<ParsedPackage, ImportError> {
        self.process(bytes)
    }

    fn parse_slide(
        &self,
        package: &RawPackage,
        part_name: &str,
        transform: &LayoutTransform,
    ) -> Result<Slide, PartError> {
        let bytes = package.part(part_name).ok_or(PartError::Empty)?;
        let lines = text::extract_lines_from_bytes(bytes)?;
        let summary = text::summarize(&text::clean_lines(&lines), &self.config);
        let has_chart = text::has_chart_marker(bytes, &self.config.chart_markers);
        let xml = std::str::from_utf8(bytes).map_err(|_| PartError::Encoding)?;

        let mut components = if self.config.positioned_shapes {
            let shapes = extract_shapes(xml)?;
            self.components_from_shapes(package, part_name, shapes, transform)
        } else {
            Vec::new()
        };
        if components.is_empty() {
            components = self.synthesized_components(&summary, has_chart);
        }

        let mut slide = Slide::new(summary.title);
        slide.text_content = summary.text;
        slide.extraction = summary.status;
        slide.has_chart = has_chart;
        slide.components = components;
        slide.background_color = BACKGROUND_REGEX
            .captures(xml)
            .map(|caps| format!("#{}", caps[1].to_ascii_lowercase()));
        Ok(slide)
    }

    fn failed_slide(&self) -> Slide {
        let summary = text::failed(&self.config);
        let mut slide = Slide::new(summary.title);
        slide.text_content = summary.text;
        slide.extraction = summary.status;
        slide
    }

    fn components_from_shapes(
        &self,
        package: &RawPackage,
        part_name: &str,
        shapes: Vec<ShapeRecord>,
        transform: &LayoutTransform,
    ) -> Vec<Component> {
        let rels = package.relationships(part_name);

        shapes
            .into_iter()
            .map(|shape| {
                let is_title = shape.is_title();
                let frame = match shape.frame {
                    Some(physical) => transform.to_virtual(physical),
                    None if is_title => self.title_frame(),
                    None => self.body_frame(false),
                };

                let props = match shape.content {
                    ShapeContent::Text {
                        paragraphs,
                        font_size,
                        bold,
                    } => {
                        let mut props = TextProps::new(paragraphs.join("\n"));
                        props.font_size = font_size.unwrap_or(if is_title {
                            TITLE_FONT_SIZE
                        } else {
                            BODY_FONT_SIZE
                        });
                        if bold || is_title {
                            props.font_weight = FontWeight::Bold;
                        }
                        ComponentProps::Text(props)
                    }
                    ShapeContent::Chart { relationship_id } => {
                        ComponentProps::Chart(self.chart_for(package, &rels, &relationship_id))
                    }
                    ShapeContent::Picture {
                        relationship_id,
                        description,
                    } => {
                        let media = relationship_id.as_ref().and_then(|id| rels.get(id));
                        ComponentProps::Image(ImageProps {
                            src: media.cloned(),
                            alt: description,
                            data: media.and_then(|name| {
                                package.part(name).and_then(|bytes| data_url(name, bytes))
                            }),
                        })
                    }
                };

                let size = Size::new(frame.width.max(1.0), frame.height.max(1.0));
                Component::new(props, frame.position(), size)
            })
            .collect()
    }

    fn chart_for(
        &self,
        package: &RawPackage,
        rels: &HashMap<String, String>,
        relationship_id: &str,
    ) -> ChartProps {
        let empty = ChartProps {
            chart_type: ChartType::Bar,
            data: Vec::new(),
            title: None,
        };

        let Some(part) = rels.get(relationship_id) else {
            tracing::debug!(relationship_id, "chart relationship not found");
            return empty;
        };
        match package.part_str(part).map(parse_chart) {
            Some(Ok(chart)) => chart,
            Some(Err(e)) => {
                tracing::warn!(part = %part, error = %e, "chart part unreadable, keeping empty chart");
                empty
            }
            None => empty,
        }
    }

    fn synthesized_components(&self, summary: &SlideText, has_chart: bool) -> Vec<Component> {
        let mut components = Vec::new();

        let mut title = TextProps::new(summary.title.clone());
        title.font_size = TITLE_FONT_SIZE;
        title.font_weight = FontWeight::Bold;
        let frame = self.title_frame();
        components.push(Component::new(
            ComponentProps::Text(title),
            frame.position(),
            frame.size(),
        ));

        let body = match summary.status {
            ExtractionStatus::Clean => summary.text.lines().skip(1).collect::<Vec<_>>().join("\n"),
            _ => summary.text.clone(),
        };
        if !body.is_empty() {
            let mut props = TextProps::new(body);
            props.font_size = BODY_FONT_SIZE;
            let frame = self.body_frame(has_chart);
            components.push(Component::new(
                ComponentProps::Text(props),
                frame.position(),
                frame.size(),
            ));
        }

        if has_chart {
            let frame = self.scaled(1000.0, 220.0, 840.0, 760.0);
            components.push(Component::new(
                ComponentProps::Chart(ChartProps {
                    chart_type: ChartType::Bar,
                    data: Vec::new(),
                    title: None,
                }),
                frame.position(),
                frame.size(),
            ));
        }

        components
    }

    /// Frame expressed on a 1920x1080 reference canvas, scaled to the real one
    fn scaled(&self, x: f64, y: f64, width: f64, height: f64) -> Rect {
        let sx = self.canvas.width / 1920.0;
        let sy = self.canvas.height / 1080.0;
        Rect::new(x * sx, y * sy, width * sx, height * sy)
    }

    fn title_frame(&self) -> Rect {
        self.scaled(80.0, 60.0, 1760.0, 120.0)
    }

    fn body_frame(&self, beside_chart: bool) -> Rect {
        let width = if beside_chart { 860.0 } else { 1760.0 };
        self.scaled(80.0, 220.0, width, 760.0)
    }
}

impl Default for PackageParser {
    fn default() -> Self {
        Self::new(ParserConfig::default(), Extent::new(1920.0, 1080.0))
    }
}

impl Preprocessor for PackageParser {
    fn read_package(&self, bytes: &[u8]) -> Result<RawPackage, ImportError> {
        RawPackage::read(bytes)
    }

    fn build_document(&self, package: &RawPackage) -> Result<ParsedPackage, ImportError> {
        let mut warnings = Vec::new();

        let package_extent = presentation_extent(package).unwrap_or_default();
        let transform = LayoutTransform::new(self.canvas, package_extent);

        let theme = match package.theme_part_name() {
            Some(name) => match package.part_str(name).map(parse_theme) {
                Some(Ok(theme)) => theme,
                Some(Err(e)) => {
                    tracing::warn!(part = name, error = %e, "theme unreadable, using default");
                    warnings.push(ImportWarning::ThemeFallback {
                        reason: e.to_string(),
                    });
                    Theme::default()
                }
                None => {
                    warnings.push(ImportWarning::ThemeFallback {
                        reason: format!("{name} is not valid UTF-8"),
                    });
                    Theme::default()
                }
            },
            None => Theme::default(),
        };

        let slide_parts = package.slide_part_names();
        let mut slides = Vec::with_capacity(slide_parts.len());
        for part_name in &slide_parts {
            let slide = match self.parse_slide(package, part_name, &transform) {
                Ok(slide) => slide,
                Err(e) => {
                    tracing::warn!(part = %part_name, error = %e, "slide part unreadable, inserting placeholder");
                    warnings.push(ImportWarning::PartialExtractionFailure {
                        part: part_name.clone(),
                        reason: e.to_string(),
                    });
                    self.failed_slide()
                }
            };
            slides.push(slide);
        }

        let mut document = Document {
            slides,
            variables: VariableCatalog::default(),
            theme,
            package_extent,
        };
        document.reindex_slides();

        tracing::debug!(
            slides = document.slides.len(),
            warnings = warnings.len(),
            "package parsed"
        );
        Ok(ParsedPackage { document, warnings })
    }

    fn name(&self) -> &str {
        "pptx"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pptx") || ext.eq_ignore_ascii_case("potx"))
            .unwrap_or(false)
    }
}

/// `p:sldSz` of the presentation part, when present and positive
fn presentation_extent(package: &RawPackage) -> Option<Extent> {
    let xml = package.part_str(PRESENTATION_PART)?;
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sldSz" => {
                let mut cx = None;
                let mut cy = None;
                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .ok()
                        .and_then(|v| v.parse::<f64>().ok());
                    match attr.key.local_name().as_ref() {
                        b"cx" => cx = value,
                        b"cy" => cy = value,
                        _ => {}
                    }
                }
                return match (cx, cy) {
                    (Some(cx), Some(cy)) if cx > 0.0 && cy > 0.0 => Some(Extent::new(cx, cy)),
                    _ => None,
                };
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Only media the exporter can embed again is carried inline; anything else
/// keeps its `src` and exports as a placeholder.
fn data_url(part_name: &str, bytes: &[u8]) -> Option<String> {
    match ImageFormat::detect(bytes) {
        Some(format) => Some(format!(
            "data:{};base64,{}",
            format.mime_type(),
            STANDARD.encode(bytes)
        )),
        None => {
            tracing::debug!(part = part_name, "media format not embeddable, keeping reference only");
            None
        }
    }
}
