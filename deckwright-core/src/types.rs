use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub type SlideId = Uuid;
pub type ComponentId = Uuid;

/// The schema version stamped on every persisted document.
/// Bump this when the serialized shape changes.
pub const SCHEMA_VERSION: &str = "1.0.0";

pub const UNTITLED_SLIDE: &str = "Untitled Slide";
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_PALETTE: [&str; 4] = ["#22c55e", "#16a34a", "#15803d", "#166534"];

// ===== GEOMETRY =====
// Component geometry lives in the virtual canvas space (top-left origin).
// Package geometry (EMU) only exists at the import/export boundary, see layout.rs.

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions strictly positive and finite
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Width/height of a whole coordinate space (canvas or package slide)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Default widescreen slide size in EMU (13.333in x 7.5in)
impl Default for Extent {
    fn default() -> Self {
        Self::new(12_192_000.0, 6_858_000.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_parts(position: Position, size: Size) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x <= self.x + self.width
            && point.y <= self.y + self.height
    }
}

// ===== COMPONENTS =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
}

/// Closed set of component kinds the engine understands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Text,
    Chart,
    Metric,
    Image,
    Shape,
    Disclosure,
    Layout,
    Unsupported,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Text => "text",
            ComponentKind::Chart => "chart",
            ComponentKind::Metric => "metric",
            ComponentKind::Image => "image",
            ComponentKind::Shape => "shape",
            ComponentKind::Disclosure => "disclosure",
            ComponentKind::Layout => "layout",
            ComponentKind::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    Bullet,
    Numbered,
}

fn default_font_size() -> f64 {
    16.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextProps {
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_type: Option<ListType>,
}

impl TextProps {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_size: default_font_size(),
            font_weight: FontWeight::Normal,
            color: None,
            align: TextAlign::Left,
            list_type: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Pie,
    Donut,
    Line,
    Bar,
    Scatter,
    Waterfall,
    Heatmap,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Pie => "pie",
            ChartType::Donut => "donut",
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Scatter => "scatter",
            ChartType::Waterfall => "waterfall",
            ChartType::Heatmap => "heatmap",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataPoint {
    #[serde(alias = "label")]
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl DataPoint {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            color: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartProps {
    pub chart_type: ChartType,
    #[serde(default)]
    pub data: Vec<DataPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricEntry {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricProps {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
    /// Non-empty for metric grids; `label`/`value` are then ignored by the exporter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<MetricEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default)]
    pub alt: String,
    /// Base64 payload or `data:` URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShapeType {
    #[default]
    Rectangle,
    RoundedRectangle,
    Ellipse,
    Line,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShapeProps {
    #[serde(default)]
    pub shape_type: ShapeType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisclosureProps {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutProps {
    pub columns: u32,
    #[serde(default)]
    pub gap: f64,
}

/// A component kind this build does not know. Kept verbatim so a snapshot
/// written by a newer editor survives a load/save cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnsupportedProps {
    pub original_kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Kind-specific properties. The variant is the component's kind.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentProps {
    Text(TextProps),
    Chart(ChartProps),
    Metric(MetricProps),
    Image(ImageProps),
    Shape(ShapeProps),
    Disclosure(DisclosureProps),
    Layout(LayoutProps),
    Unsupported(UnsupportedProps),
}

impl ComponentProps {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentProps::Text(_) => ComponentKind::Text,
            ComponentProps::Chart(_) => ComponentKind::Chart,
            ComponentProps::Metric(_) => ComponentKind::Metric,
            ComponentProps::Image(_) => ComponentKind::Image,
            ComponentProps::Shape(_) => ComponentKind::Shape,
            ComponentProps::Disclosure(_) => ComponentKind::Disclosure,
            ComponentProps::Layout(_) => ComponentKind::Layout,
            ComponentProps::Unsupported(_) => ComponentKind::Unsupported,
        }
    }

    /// User-visible strings in reading order
    pub fn text_fields(&self) -> Vec<&str> {
        match self {
            ComponentProps::Text(text) => vec![text.content.as_str()],
            ComponentProps::Chart(chart) => chart
                .title
                .iter()
                .map(String::as_str)
                .chain(chart.data.iter().map(|point| point.name.as_str()))
                .collect(),
            ComponentProps::Metric(metric) if metric.metrics.is_empty() => {
                vec![metric.label.as_str(), metric.value.as_str()]
            }
            ComponentProps::Metric(metric) => metric
                .metrics
                .iter()
                .flat_map(|entry| [entry.label.as_str(), entry.value.as_str()])
                .collect(),
            ComponentProps::Disclosure(disclosure) => {
                vec![disclosure.title.as_str(), disclosure.content.as_str()]
            }
            ComponentProps::Image(image) => vec![image.alt.as_str()],
            ComponentProps::Unsupported(unsupported) => {
                unsupported.text.iter().map(String::as_str).collect()
            }
            ComponentProps::Shape(_) | ComponentProps::Layout(_) => Vec::new(),
        }
    }

    /// Mutable view of the same strings as [`ComponentProps::text_fields`]
    pub fn text_fields_mut(&mut self) -> Vec<&mut String> {
        match self {
            ComponentProps::Text(text) => vec![&mut text.content],
            ComponentProps::Chart(chart) => chart
                .title
                .iter_mut()
                .chain(chart.data.iter_mut().map(|point| &mut point.name))
                .collect(),
            ComponentProps::Metric(metric) => {
                let mut fields = vec![&mut metric.label, &mut metric.value];
                for entry in metric.metrics.iter_mut() {
                    fields.push(&mut entry.label);
                    fields.push(&mut entry.value);
                }
                fields
            }
            ComponentProps::Disclosure(disclosure) => {
                vec![&mut disclosure.title, &mut disclosure.content]
            }
            ComponentProps::Image(image) => vec![&mut image.alt],
            ComponentProps::Unsupported(unsupported) => unsupported.text.iter_mut().collect(),
            ComponentProps::Shape(_) | ComponentProps::Layout(_) => Vec::new(),
        }
    }
}

// Unknown `kind` tags must not fail the whole document load, so the tag is
// dispatched by hand and anything unrecognised lands in `Unsupported`.
impl<'de> Deserialize<'de> for ComponentProps {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("kind")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| D::Error::missing_field("kind"))?
            .to_string();

        let props = match kind.as_str() {
            "text" => serde_json::from_value(value).map(ComponentProps::Text),
            "chart" => serde_json::from_value(value).map(ComponentProps::Chart),
            "metric" => serde_json::from_value(value).map(ComponentProps::Metric),
            "image" => serde_json::from_value(value).map(ComponentProps::Image),
            "shape" => serde_json::from_value(value).map(ComponentProps::Shape),
            "disclosure" => serde_json::from_value(value).map(ComponentProps::Disclosure),
            "layout" => serde_json::from_value(value).map(ComponentProps::Layout),
            "unsupported" => serde_json::from_value(value).map(ComponentProps::Unsupported),
            _ => {
                let text = ["content", "text", "title"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
                    .map(str::to_string);
                Ok(ComponentProps::Unsupported(UnsupportedProps {
                    original_kind: kind,
                    text,
                    payload: value,
                }))
            }
        };

        props.map_err(D::Error::custom)
    }
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Component {
    pub id: ComponentId,
    pub position: Position,
    pub size: Size,
    #[serde(default)]
    pub style: Style,
    pub props: ComponentProps,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl Component {
    pub fn new(props: ComponentProps, position: Position, size: Size) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            size,
            style: Style::default(),
            props,
            locked: false,
            visible: true,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.props.kind()
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    pub fn z_index(&self) -> i32 {
        self.style.z_index.unwrap_or(0)
    }
}

// ===== SLIDES =====

/// Fixed category set assigned by the categorizer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[serde(rename = "Current Allocation")]
    CurrentAllocation,
    #[serde(rename = "Target Allocation")]
    TargetAllocation,
    #[serde(rename = "Performance")]
    Performance,
    #[serde(rename = "Risk/Reward")]
    RiskReward,
    #[serde(rename = "Pacing")]
    Pacing,
    #[serde(rename = "Fees")]
    Fees,
    #[serde(rename = "Disclosures")]
    Disclosures,
    #[default]
    #[serde(rename = "Appendix")]
    Appendix,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::CurrentAllocation => "Current Allocation",
            Category::TargetAllocation => "Target Allocation",
            Category::Performance => "Performance",
            Category::RiskReward => "Risk/Reward",
            Category::Pacing => "Pacing",
            Category::Fees => "Fees",
            Category::Disclosures => "Disclosures",
            Category::Appendix => "Appendix",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a slide's text came out of its package part
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// Authored in the editor, or imported with usable text
    #[default]
    Clean,
    /// Part parsed but carried too little text
    Placeholder,
    /// Part was unreadable; slide is a stand-in
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slide {
    pub id: SlideId,
    pub index: usize,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub category: Category,
    /// Raw text pulled from the package part, newline separated
    #[serde(default)]
    pub text_content: String,
    #[serde(default)]
    pub has_chart: bool,
    #[serde(default)]
    pub extraction: ExtractionStatus,
}

impl Slide {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            index: 0,
            title: title.into(),
            background_color: None,
            components: Vec::new(),
            category: Category::Appendix,
            text_content: String::new(),
            has_chart: false,
            extraction: ExtractionStatus::Clean,
        }
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Text the variable detector reads: component strings when the slide has
    /// any, the extracted part text otherwise
    pub fn searchable_text(&self) -> String {
        let fields: Vec<&str> = self
            .components
            .iter()
            .flat_map(|c| c.props.text_fields())
            .filter(|field| !field.trim().is_empty())
            .collect();
        if fields.is_empty() {
            self.text_content.clone()
        } else {
            fields.join("\n")
        }
    }

    /// Everything after the title line of the extracted text
    pub fn body_text(&self) -> String {
        self.text_content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .skip(1)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ===== VARIABLES =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Name,
    Date,
    Currency,
    Percentage,
    Number,
    Text,
}

/// Whether a variable was authored as `{{name}}` or guessed from a value pattern
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Explicit,
    Inferred,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedVariable {
    pub name: String,
    /// Verbatim matched span; for explicit placeholders this is `{{name}}`
    pub sample_value: String,
    pub inferred_type: VariableType,
    pub occurrence_count: usize,
    pub confidence: Confidence,
}

/// Advisory list of variables found in a document, unique by name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VariableCatalog {
    pub entries: Vec<DetectedVariable>,
}

impl VariableCatalog {
    pub fn get(&self, name: &str) -> Option<&DetectedVariable> {
        self.entries.iter().find(|v| v.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetectedVariable> {
        self.entries.iter()
    }

    /// Fold a fresh detection into this catalog. Known entries keep their
    /// value, type and confidence, and their count never goes down. Unseen
    /// names are appended.
    pub fn absorb(&mut self, fresh: VariableCatalog) {
        for variable in fresh.entries {
            match self.entries.iter_mut().find(|v| v.name == variable.name) {
                Some(existing) => {
                    existing.occurrence_count =
                        existing.occurrence_count.max(variable.occurrence_count);
                }
                None => self.entries.push(variable),
            }
        }
    }
}

// ===== DOCUMENT =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Theme {
    pub colors: Vec<String>,
    pub font_family: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Document {
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub variables: VariableCatalog,
    #[serde(default)]
    pub theme: Theme,
    /// Physical slide size of the package this came from (EMU)
    #[serde(default)]
    pub package_extent: Extent,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(&self, id: SlideId) -> Option<&Slide> {
        self.slides.iter().find(|s| s.id == id)
    }

    /// Locate a component anywhere in the document: (slide position, component position)
    pub fn locate_component(&self, id: ComponentId) -> Option<(usize, usize)> {
        self.slides.iter().enumerate().find_map(|(slide_pos, slide)| {
            slide
                .components
                .iter()
                .position(|c| c.id == id)
                .map(|component_pos| (slide_pos, component_pos))
        })
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.locate_component(id)
            .map(|(s, c)| &self.slides[s].components[c])
    }

    pub fn contains_component(&self, id: ComponentId) -> bool {
        self.locate_component(id).is_some()
    }

    /// Re-derive slide indices from their order
    pub fn reindex_slides(&mut self) {
        for (index, slide) in self.slides.iter_mut().enumerate() {
            slide.index = index;
        }
    }

    pub fn component_count(&self) -> usize {
        self.slides.iter().map(|s| s.components.len()).sum()
    }
}
