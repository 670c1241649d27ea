use crate::config::ExportConfig;
use crate::error::{ExportError, ExportWarning};
use crate::export::chart::{validate_chart, write_chart};
use crate::export::package::{
    write_package, CoreProperties, ImageFormat, PackageParts, SlidePart, SlideRels,
};
use crate::export::shapes::{
    hex_color, Bullet, Frame, Geometry, Outline, ShapeStyle, SlideWriter, TextBlock,
};
use crate::export::substitution::substitute_document;
use crate::export::RenderError;
use crate::layout::{points_to_emu, LayoutTransform};
use crate::types::*;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::collections::HashMap;

const TITLE_FONT_SIZE: f64 = 36.0;
const BODY_FONT_SIZE: f64 = 16.0;
const CALLOUT_FONT_SIZE: f64 = 14.0;
const PLACEHOLDER_FONT_SIZE: f64 = 12.0;
const FOOTER_FONT_SIZE: f64 = 10.0;
const SLIDE_NUMBER_FONT_SIZE: f64 = 12.0;
const DEFAULT_BORDER_POINTS: f64 = 1.0;

const LAYOUT_OUTLINE: &str = "D1D5DB";
const LINE_COLOR: &str = "000000";
const MUTED_TEXT: &str = "6B7280";
const SLIDE_NUMBER_COLOR: &str = "9CA3AF";
const WHITE: &str = "FFFFFF";

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub slide_count: usize,
    pub warnings: Vec<ExportWarning>,
}

/// Writes Documents out as presentation packages.
///
/// Substitutions are applied to a copy of the document first. Each visible
/// component is then rendered in z-order; a component that cannot be rendered
/// becomes a labelled placeholder rectangle and a warning. Only failing to
/// produce the container itself is an error.
pub struct PackageExporter {
    config: ExportConfig,
    canvas: Extent,
}

/// State shared by all slides of one export
struct ExportContext {
    transform: LayoutTransform,
    font: String,
    palette: Vec<String>,
    charts: Vec<Vec<u8>>,
    media: Vec<(String, Vec<u8>, ImageFormat)>,
    warnings: Vec<ExportWarning>,
}

/// A component rendered far enough that emitting it cannot fail on content
enum Rendered {
    Shape {
        name: &'static str,
        style: ShapeStyle,
        text: Option<TextBlock>,
    },
    Cells(Vec<(Frame, ShapeStyle, TextBlock)>),
    Chart(Vec<u8>),
    Picture {
        bytes: Vec<u8>,
        format: ImageFormat,
        description: String,
    },
}

impl PackageExporter {
    pub fn new(config: ExportConfig, canvas: Extent) -> Self {
        Self { config, canvas }
    }

    pub fn export(
        &self,
        document: &Document,
        substitutions: &HashMap<String, String>,
    ) -> Result<Vec<u8>, ExportError> {
        self.export_with_report(document, substitutions)
            .map(|report| report.bytes)
    }

    pub fn export_with_report(
        &self,
        document: &Document,
        substitutions: &HashMap<String, String>,
    ) -> Result<ExportReport, ExportError> {
        let document = substitute_document(document, substitutions);
        let physical = self.config.slide_extent.unwrap_or(document.package_extent);
        let transform = LayoutTransform::new(self.canvas, physical);

        let mut ctx = ExportContext {
            transform,
            font: self
                .config
                .branding
                .font_family
                .clone()
                .unwrap_or_else(|| document.theme.font_family.clone()),
            palette: document.theme.colors.iter().filter_map(|c| hex_color(c)).collect(),
            charts: Vec::new(),
            media: Vec::new(),
            warnings: Vec::new(),
        };

        let mut slides = Vec::with_capacity(document.slides.len());
        for slide in &document.slides {
            slides.push(self.slide_part(&mut ctx, slide)?);
        }

        let extent = ctx.transform.physical_extent();
        let slide_count = slides.len();
        let parts = PackageParts {
            slides,
            charts: ctx.charts,
            media: ctx.media,
            extent: (extent.width.round() as i64, extent.height.round() as i64),
            theme: document.theme.clone(),
            properties: CoreProperties {
                title: document
                    .slides
                    .first()
                    .map(|s| s.title.clone())
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| "Presentation".to_string()),
                author: self.config.branding.author.clone(),
                company: self.config.branding.company.clone(),
            },
        };
        let bytes = write_package(&parts)?;

        tracing::info!(
            slides = slide_count,
            charts = parts.charts.len(),
            media = parts.media.len(),
            warnings = ctx.warnings.len(),
            bytes = bytes.len(),
            "package exported"
        );

        Ok(ExportReport {
            bytes,
            slide_count,
            warnings: ctx.warnings,
        })
    }

    fn slide_part(&self, ctx: &mut ExportContext, slide: &Slide) -> Result<SlidePart, ExportError> {
        let mut writer = SlideWriter::new();
        let mut rels = SlideRels::new();

        if needs_title_shape(slide) {
            let mut title = TextBlock::new(&slide.title, TITLE_FONT_SIZE, &ctx.font);
            title.bold = true;
            let frame = self.frame(ctx, self.canvas_rect(80.0, 60.0, 1760.0, 120.0));
            writer
                .shape("Title", frame, &ShapeStyle::default(), Some(&title), Some("title"))
                .map_err(shape_xml_error)?;
        }

        let mut ordered: Vec<&Component> = slide.components.iter().filter(|c| c.visible).collect();
        ordered.sort_by_key(|c| c.z_index());

        for component in ordered {
            let frame = self.frame(ctx, component.bounds());
            let outcome = self
                .render(ctx, component)
                .and_then(|rendered| emit(ctx, &mut writer, &mut rels, frame, rendered));

            if let Err(e) = outcome {
                tracing::warn!(
                    component = %component.id,
                    kind = component.kind().as_str(),
                    error = %e,
                    "component replaced by placeholder"
                );
                ctx.warnings.push(ExportWarning::ComponentRenderFailed {
                    component: component.id,
                    reason: e.to_string(),
                });
                let (style, text) = self.placeholder(ctx, component.kind().as_str());
                writer
                    .shape("Placeholder", frame, &style, Some(&text), None)
                    .map_err(shape_xml_error)?;
            }
        }

        self.branding(ctx, &mut writer, slide)?;

        let background = slide
            .background_color
            .as_deref()
            .and_then(|value| {
                let color = hex_color(value);
                if color.is_none() {
                    tracing::warn!(slide = slide.index, color = value, "ignoring invalid background color");
                }
                color
            })
            .filter(|color| color != WHITE);

        let xml = writer.finish(background.as_deref()).map_err(shape_xml_error)?;
        Ok(SlidePart { xml, rels })
    }

    fn render(&self, ctx: &mut ExportContext, component: &Component) -> Result<Rendered, RenderError> {
        match &component.props {
            ComponentProps::Text(props) => Ok(Rendered::Shape {
                name: "Text",
                style: self.shape_style(ctx, &component.style, None)?,
                text: Some(self.text_block(ctx, props)?),
            }),

            ComponentProps::Chart(chart) => {
                validate_chart(chart)?;
                let mut bytes = Vec::new();
                write_chart(&mut bytes, chart, &ctx.palette)?;
                Ok(Rendered::Chart(bytes))
            }

            ComponentProps::Metric(metric) => self.render_metric(ctx, component, metric),

            ComponentProps::Image(image) => self.render_image(ctx, component, image),

            ComponentProps::Shape(shape) => {
                let mut style =
                    self.shape_style(ctx, &component.style, Some(&self.config.placeholder_fill))?;
                style.geometry = match shape.shape_type {
                    ShapeType::Rectangle if component.style.border_radius.unwrap_or(0.0) > 0.0 => {
                        Geometry::RoundRect
                    }
                    ShapeType::Rectangle => Geometry::Rect,
                    ShapeType::RoundedRectangle => Geometry::RoundRect,
                    ShapeType::Ellipse => Geometry::Ellipse,
                    ShapeType::Line => Geometry::Line,
                };
                if style.geometry == Geometry::Line {
                    style.fill = None;
                    if style.outline.is_none() {
                        style.outline = Some(Outline {
                            color: LINE_COLOR.to_string(),
                            width: points_to_emu(DEFAULT_BORDER_POINTS),
                        });
                    }
                }
                Ok(Rendered::Shape {
                    name: "Shape",
                    style,
                    text: None,
                })
            }

            ComponentProps::Disclosure(disclosure) => {
                let style =
                    self.shape_style(ctx, &component.style, Some(&self.config.disclosure_fill))?;
                let text = [disclosure.title.as_str(), disclosure.content.as_str()]
                    .iter()
                    .filter(|part| !part.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join("\n");
                let mut block = TextBlock::new(&text, CALLOUT_FONT_SIZE, &ctx.font);
                block.first_bold = !disclosure.title.is_empty();
                Ok(Rendered::Shape {
                    name: "Disclosure",
                    style,
                    text: Some(block),
                })
            }

            ComponentProps::Layout(_) => {
                let mut style = self.shape_style(ctx, &component.style, None)?;
                style.fill = None;
                if style.outline.is_none() {
                    style.outline = Some(Outline {
                        color: LAYOUT_OUTLINE.to_string(),
                        width: points_to_emu(DEFAULT_BORDER_POINTS),
                    });
                }
                Ok(Rendered::Shape {
                    name: "Layout",
                    style,
                    text: None,
                })
            }

            ComponentProps::Unsupported(unsupported) => {
                tracing::debug!(
                    component = %component.id,
                    kind = %unsupported.original_kind,
                    "exporting unknown component kind as text"
                );
                ctx.warnings.push(ExportWarning::UnknownComponentKind {
                    component: component.id,
                    kind: unsupported.original_kind.clone(),
                });
                let text = unsupported
                    .text
                    .clone()
                    .unwrap_or_else(|| unsupported.original_kind.clone());
                Ok(Rendered::Shape {
                    name: "Text",
                    style: ShapeStyle::default(),
                    text: Some(TextBlock::new(&text, BODY_FONT_SIZE, &ctx.font)),
                })
            }
        }
    }

    fn render_metric(
        &self,
        ctx: &ExportContext,
        component: &Component,
        metric: &MetricProps,
    ) -> Result<Rendered, RenderError> {
        let style = self.shape_style(ctx, &component.style, None)?;
        let color = to_hex(&self.config.metric_color)?;
        let cell = |label: &str, value: &str| {
            let mut block = TextBlock::new(&format!("{label}\n{value}"), 20.0, &ctx.font);
            block.bold = true;
            block.align = TextAlign::Center;
            block.anchor_center = true;
            block.color = Some(color.clone());
            block
        };

        if metric.metrics.is_empty() {
            return Ok(Rendered::Shape {
                name: "Metric",
                style,
                text: Some(cell(&metric.label, &metric.value)),
            });
        }

        let count = metric.metrics.len();
        let columns = (metric.columns.unwrap_or(count as u32).max(1) as usize).min(count);
        let rows = count.div_ceil(columns);
        let bounds = component.bounds();
        let (width, height) = (bounds.width / columns as f64, bounds.height / rows as f64);

        let cells = metric
            .metrics
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let rect = Rect::new(
                    bounds.x + (i % columns) as f64 * width,
                    bounds.y + (i / columns) as f64 * height,
                    width,
                    height,
                );
                (
                    self.frame(ctx, rect),
                    style.clone(),
                    cell(&entry.label, &entry.value),
                )
            })
            .collect();
        Ok(Rendered::Cells(cells))
    }

    fn render_image(
        &self,
        ctx: &ExportContext,
        component: &Component,
        image: &ImageProps,
    ) -> Result<Rendered, RenderError> {
        let Some(data) = image.data.as_deref().filter(|d| !d.trim().is_empty()) else {
            // nothing embedded: reserve the space
            let (style, mut text) = self.placeholder(ctx, "image");
            if !image.alt.is_empty() {
                text = TextBlock {
                    paragraphs: vec![image.alt.clone()],
                    ..text
                };
            }
            return Ok(Rendered::Shape {
                name: "Image Placeholder",
                style,
                text: Some(text),
            });
        };

        let payload = match data.split_once(";base64,") {
            Some((_, encoded)) => encoded,
            None => data,
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::ImageData(e.to_string()))?;
        let format = ImageFormat::detect(&bytes)
            .ok_or_else(|| RenderError::ImageData("unrecognized image format".to_string()))?;

        tracing::debug!(component = %component.id, bytes = bytes.len(), "embedding image");
        Ok(Rendered::Picture {
            bytes,
            format,
            description: image.alt.clone(),
        })
    }

    fn text_block(&self, ctx: &ExportContext, props: &TextProps) -> Result<TextBlock, RenderError> {
        let mut block = TextBlock::new(&props.content, props.font_size, &ctx.font);
        block.bold = props.font_weight == FontWeight::Bold;
        block.color = props.color.as_deref().map(to_hex).transpose()?;
        block.align = props.align;
        block.bullet = props.list_type.map(|list| match list {
            ListType::Bullet => Bullet::Char,
            ListType::Numbered => Bullet::Numbered,
        });
        Ok(block)
    }

    fn shape_style(
        &self,
        ctx: &ExportContext,
        style: &Style,
        default_fill: Option<&str>,
    ) -> Result<ShapeStyle, RenderError> {
        let fill = match (&style.background_color, default_fill) {
            (Some(color), _) => Some(to_hex(color)?),
            (None, Some(color)) => Some(to_hex(color)?),
            (None, None) => None,
        };

        let outline = match &style.border_color {
            Some(color) => {
                let width = style.border_width.unwrap_or(DEFAULT_BORDER_POINTS);
                if width > 0.0 && width.is_finite() {
                    Some(Outline {
                        color: to_hex(color)?,
                        width: points_to_emu(width),
                    })
                } else {
                    None
                }
            }
            None => None,
        };

        let alpha = style
            .opacity
            .filter(|o| o.is_finite() && *o < 1.0)
            .map(|o| (o.max(0.0) * 100_000.0).round() as u32);

        let geometry = if style.border_radius.unwrap_or(0.0) > 0.0 {
            Geometry::RoundRect
        } else {
            Geometry::Rect
        };

        let inset = style
            .padding
            .filter(|p| p.is_finite() && *p >= 0.0)
            .map(|p| ctx.transform.to_physical_size(Size::new(p, p)).width.round() as i64);

        Ok(ShapeStyle {
            fill,
            outline,
            alpha,
            geometry,
            inset,
        })
    }

    /// Neutral stand-in for a component that could not be rendered
    fn placeholder(&self, ctx: &ExportContext, label: &str) -> (ShapeStyle, TextBlock) {
        let style = ShapeStyle {
            fill: hex_color(&self.config.placeholder_fill),
            ..ShapeStyle::default()
        };
        let mut text = TextBlock::new(&format!("{label} unavailable"), PLACEHOLDER_FONT_SIZE, &ctx.font);
        text.align = TextAlign::Center;
        text.anchor_center = true;
        text.color = Some(MUTED_TEXT.to_string());
        (style, text)
    }

    fn branding(
        &self,
        ctx: &ExportContext,
        writer: &mut SlideWriter,
        slide: &Slide,
    ) -> Result<(), ExportError> {
        let branding = &self.config.branding;

        if let Some(footer) = branding.footer.as_deref().filter(|f| !f.is_empty()) {
            let mut text = TextBlock::new(footer, FOOTER_FONT_SIZE, &ctx.font);
            text.align = TextAlign::Center;
            text.color = Some(MUTED_TEXT.to_string());
            let frame = self.frame(ctx, self.canvas_rect(80.0, 1010.0, 1760.0, 50.0));
            writer
                .shape("Footer", frame, &ShapeStyle::default(), Some(&text), None)
                .map_err(shape_xml_error)?;
        }

        if branding.slide_numbers {
            let number = (slide.index + 1).to_string();
            let mut text = TextBlock::new(&number, SLIDE_NUMBER_FONT_SIZE, &ctx.font);
            text.align = TextAlign::Right;
            text.color = Some(SLIDE_NUMBER_COLOR.to_string());
            let frame = self.frame(ctx, self.canvas_rect(1700.0, 1010.0, 140.0, 50.0));
            writer
                .shape("Slide Number", frame, &ShapeStyle::default(), Some(&text), None)
                .map_err(shape_xml_error)?;
        }

        Ok(())
    }

    fn frame(&self, ctx: &ExportContext, rect: Rect) -> Frame {
        Frame::from(ctx.transform.to_emu(rect))
    }

    /// Rect given on a 1920x1080 reference canvas, scaled to the real one
    fn canvas_rect(&self, x: f64, y: f64, width: f64, height: f64) -> Rect {
        let sx = self.canvas.width / 1920.0;
        let sy = self.canvas.height / 1080.0;
        Rect::new(x * sx, y * sy, width * sx, height * sy)
    }
}

impl Default for PackageExporter {
    fn default() -> Self {
        Self::new(ExportConfig::default(), Extent::new(1920.0, 1080.0))
    }
}

fn emit(
    ctx: &mut ExportContext,
    writer: &mut SlideWriter,
    rels: &mut SlideRels,
    frame: Frame,
    rendered: Rendered,
) -> Result<(), RenderError> {
    match rendered {
        Rendered::Shape { name, style, text } => {
            writer.shape(name, frame, &style, text.as_ref(), None)?;
        }
        Rendered::Cells(cells) => {
            for (cell_frame, style, text) in &cells {
                writer.shape("Metric", *cell_frame, style, Some(text), None)?;
            }
        }
        Rendered::Chart(bytes) => {
            ctx.charts.push(bytes);
            let rel_id = rels.add_chart(ctx.charts.len());
            writer.chart_frame(frame, &rel_id)?;
        }
        Rendered::Picture {
            bytes,
            format,
            description,
        } => {
            let name = format!("image{}.{}", ctx.media.len() + 1, format.extension());
            let rel_id = rels.add_image(&name);
            ctx.media.push((name, bytes, format));
            writer.picture(frame, &rel_id, &description)?;
        }
    }
    Ok(())
}

/// A slide title is emitted as its own shape only when no visible component
/// already shows it
fn needs_title_shape(slide: &Slide) -> bool {
    let title = slide.title.trim();
    if title.is_empty() {
        return false;
    }
    !slide
        .components
        .iter()
        .filter(|c| c.visible)
        .flat_map(|c| c.props.text_fields())
        .any(|field| field.contains(title))
}

fn to_hex(value: &str) -> Result<String, RenderError> {
    hex_color(value).ok_or_else(|| RenderError::InvalidColor(value.to_string()))
}

fn shape_xml_error(e: std::fmt::Error) -> ExportError {
    ExportError::ExportIoFailure(format!("failed to format slide xml: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::archive::RawPackage;
    use crate::package::text::extract_lines;

    fn text(content: &str) -> Component {
        Component::new(
            ComponentProps::Text(TextProps::new(content)),
            Position::new(100.0, 100.0),
            Size::new(800.0, 100.0),
        )
    }

    fn chart(chart_type: ChartType, data: Vec<DataPoint>) -> Component {
        Component::new(
            ComponentProps::Chart(ChartProps {
                chart_type,
                data,
                title: None,
            }),
            Position::new(100.0, 300.0),
            Size::new(600.0, 400.0),
        )
    }

    fn document(components: Vec<Component>) -> Document {
        let mut slide = Slide::new("Review");
        slide.components = components;
        Document {
            slides: vec![slide],
            ..Document::default()
        }
    }

    fn slide_xml(bytes: &[u8], number: usize) -> String {
        let package = RawPackage::read(bytes).unwrap();
        package
            .part_str(&format!("ppt/slides/slide{number}.xml"))
            .unwrap()
            .to_string()
    }

    #[test]
    fn explicit_substitution_reaches_the_package() {
        let document = document(vec![text("Dear {{client_name}}, your balance is {{balance}}.")]);
        let values: HashMap<String, String> = [
            ("client_name".to_string(), "Jane Doe".to_string()),
            ("balance".to_string(), "$1,000".to_string()),
        ]
        .into_iter()
        .collect();

        let bytes = PackageExporter::default().export(&document, &values).unwrap();
        let lines = extract_lines(&slide_xml(&bytes, 1)).unwrap();
        assert!(lines.contains(&"Dear Jane Doe, your balance is $1,000.".to_string()));
    }

    #[test]
    fn bad_chart_becomes_placeholder() {
        let document = document(vec![
            chart(ChartType::Pie, Vec::new()),
            chart(ChartType::Bar, vec![DataPoint::new("A", 1.0)]),
            text("Still here"),
        ]);

        let report = PackageExporter::default()
            .export_with_report(&document, &HashMap::new())
            .unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            &report.warnings[0],
            ExportWarning::ComponentRenderFailed { component, .. } if *component == document.slides[0].components[0].id
        ));

        let package = RawPackage::read(&report.bytes).unwrap();
        assert!(package.contains("ppt/charts/chart1.xml"));
        assert!(!package.contains("ppt/charts/chart2.xml"));
        let xml = slide_xml(&report.bytes, 1);
        assert!(xml.contains("chart unavailable"));
        assert!(xml.contains("Still here"));
    }

    #[test]
    fn unknown_kind_degrades_to_text() {
        let unknown = Component::new(
            ComponentProps::Unsupported(UnsupportedProps {
                original_kind: "sparkline".to_string(),
                text: Some("Trend up".to_string()),
                payload: serde_json::Value::Null,
            }),
            Position::new(0.0, 0.0),
            Size::new(100.0, 50.0),
        );
        let report = PackageExporter::default()
            .export_with_report(&document(vec![unknown]), &HashMap::new())
            .unwrap();

        assert!(matches!(
            &report.warnings[..],
            [ExportWarning::UnknownComponentKind { kind, .. }] if kind == "sparkline"
        ));
        assert!(slide_xml(&report.bytes, 1).contains("Trend up"));
    }

    #[test]
    fn components_follow_z_order_and_visibility() {
        let mut back = text("Back");
        back.style.z_index = Some(-1);
        let mut hidden = text("Hidden");
        hidden.visible = false;
        let document = document(vec![text("Front"), back, hidden]);

        let bytes = PackageExporter::default().export(&document, &HashMap::new()).unwrap();
        let xml = slide_xml(&bytes, 1);
        let (back_at, front_at) = (xml.find("Back").unwrap(), xml.find("Front").unwrap());
        assert!(back_at < front_at);
        assert!(!xml.contains("Hidden"));
    }

    #[test]
    fn images_are_embedded_or_reserved() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        let embedded = Component::new(
            ComponentProps::Image(ImageProps {
                src: None,
                alt: "Logo".to_string(),
                data: Some(format!("data:image/png;base64,{}", STANDARD.encode(png))),
            }),
            Position::new(0.0, 0.0),
            Size::new(100.0, 100.0),
        );
        let empty = Component::new(
            ComponentProps::Image(ImageProps {
                src: None,
                alt: String::new(),
                data: None,
            }),
            Position::new(200.0, 0.0),
            Size::new(100.0, 100.0),
        );

        let report = PackageExporter::default()
            .export_with_report(&document(vec![embedded, empty]), &HashMap::new())
            .unwrap();
        assert!(report.warnings.is_empty());

        let package = RawPackage::read(&report.bytes).unwrap();
        assert_eq!(package.part("ppt/media/image1.png"), Some(&png[..]));
        let xml = slide_xml(&report.bytes, 1);
        assert!(xml.contains(r#"descr="Logo""#));
        assert!(xml.contains("image unavailable"));
    }

    #[test]
    fn invalid_color_fails_only_that_component() {
        let mut shape = Component::new(
            ComponentProps::Shape(ShapeProps {
                shape_type: ShapeType::Ellipse,
            }),
            Position::new(0.0, 0.0),
            Size::new(50.0, 50.0),
        );
        shape.style.background_color = Some("not-a-color".to_string());

        let report = PackageExporter::default()
            .export_with_report(&document(vec![shape, text("Review notes")]), &HashMap::new())
            .unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(slide_xml(&report.bytes, 1).contains("Review notes"));
    }

    #[test]
    fn branding_adds_footer_and_numbers() {
        let mut config = ExportConfig::default();
        config.branding.footer = Some("Confidential".to_string());
        config.branding.slide_numbers = true;
        let mut doc = document(vec![text("Review")]);
        doc.slides.push(Slide::new("Second"));
        doc.reindex_slides();

        let bytes = PackageExporter::new(config, Extent::new(1920.0, 1080.0))
            .export(&doc, &HashMap::new())
            .unwrap();

        let second = extract_lines(&slide_xml(&bytes, 2)).unwrap();
        assert!(second.contains(&"Second".to_string()));
        assert!(second.contains(&"Confidential".to_string()));
        assert!(second.contains(&"2".to_string()));

        // the first slide's title is already shown by its text component
        let first = slide_xml(&bytes, 1);
        assert_eq!(first.matches("Review").count(), 1);
    }

    #[test]
    fn components_are_scaled_to_package_units() {
        let mut config = ExportConfig::default();
        config.slide_extent = Some(Extent::new(9_144_000.0, 6_858_000.0));
        let bytes = PackageExporter::new(config, Extent::new(1920.0, 1080.0))
            .export(&document(vec![text("Review")]), &HashMap::new())
            .unwrap();

        // 100 virtual units = 100 * 9144000 / 1920 EMU on x, 100 * 6858000 / 1080 on y
        assert!(slide_xml(&bytes, 1).contains(r#"<a:off x="476250" y="635000"/>"#));
        let package = RawPackage::read(&bytes).unwrap();
        assert!(package
            .part_str("ppt/presentation.xml")
            .unwrap()
            .contains(r#"<p:sldSz cx="9144000" cy="6858000"/>"#));
    }
}
