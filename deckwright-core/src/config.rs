use crate::types::Extent;
use anyhow::Result;
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

// ===== IMPORT =====

fn default_min_text_chars() -> usize {
    10
}

fn default_max_title_chars() -> usize {
    100
}

fn default_placeholder_text() -> String {
    "Slide content extracted successfully".to_string()
}

fn default_chart_markers() -> Vec<String> {
    vec!["c:chart".to_string(), "drawingml/2006/chart".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Extracted text shorter than this is replaced by `placeholder_text`
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
    #[serde(default = "default_max_title_chars")]
    pub max_title_chars: usize,
    #[serde(default = "default_placeholder_text")]
    pub placeholder_text: String,
    /// Raw-XML tokens that mark a slide as carrying a chart
    #[serde(default = "default_chart_markers")]
    pub chart_markers: Vec<String>,
    /// Build components from positioned shapes; when false every slide gets
    /// the synthesized title/body layout
    #[serde(default = "default_true")]
    pub positioned_shapes: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_text_chars: default_min_text_chars(),
            max_title_chars: default_max_title_chars(),
            placeholder_text: default_placeholder_text(),
            chart_markers: default_chart_markers(),
            positioned_shapes: true,
        }
    }
}

fn default_name_labels() -> Vec<String> {
    vec![
        "Client".to_string(),
        "Advisor".to_string(),
        "Investor".to_string(),
        "Prepared for".to_string(),
        "Prepared by".to_string(),
    ]
}

/// Pattern families are always applied in the same order; these only switch them off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_true")]
    pub explicit_placeholders: bool,
    #[serde(default = "default_true")]
    pub labeled_names: bool,
    #[serde(default = "default_true")]
    pub dates: bool,
    #[serde(default = "default_true")]
    pub currency: bool,
    #[serde(default = "default_true")]
    pub percentages: bool,
    /// Labels that introduce a person's name, e.g. "Client: Jane Doe"
    #[serde(default = "default_name_labels")]
    pub name_labels: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            explicit_placeholders: true,
            labeled_names: true,
            dates: true,
            currency: true,
            percentages: true,
            name_labels: default_name_labels(),
        }
    }
}

// ===== EDITING =====

fn default_max_snapshots() -> usize {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Ring buffer capacity; the oldest snapshot is dropped first
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_snapshots: default_max_snapshots(),
        }
    }
}

fn default_canvas_width() -> f64 {
    1920.0
}

fn default_canvas_height() -> f64 {
    1080.0
}

fn default_grid_size() -> f64 {
    10.0
}

fn default_duplicate_offset() -> f64 {
    20.0
}

fn default_new_slide_title() -> String {
    "New Slide".to_string()
}

fn default_new_slide_background() -> String {
    "#ffffff".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_canvas_width")]
    pub width: f64,
    #[serde(default = "default_canvas_height")]
    pub height: f64,
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default)]
    pub snap_to_grid: bool,
    /// Applied to both axes when duplicating
    #[serde(default = "default_duplicate_offset")]
    pub duplicate_offset: f64,
    #[serde(default = "default_new_slide_title")]
    pub new_slide_title: String,
    #[serde(default = "default_new_slide_background")]
    pub new_slide_background: String,
}

impl CanvasConfig {
    pub fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
            grid_size: default_grid_size(),
            show_grid: true,
            snap_to_grid: false,
            duplicate_offset: default_duplicate_offset(),
            new_slide_title: default_new_slide_title(),
            new_slide_background: default_new_slide_background(),
        }
    }
}

// ===== EXPORT =====

fn default_author() -> String {
    "ClientView".to_string()
}

fn default_placeholder_fill() -> String {
    "#e5e7eb".to_string()
}

fn default_disclosure_fill() -> String {
    "#fef3c7".to_string()
}

fn default_metric_color() -> String {
    "#10b981".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingConfig {
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Footer text placed on every slide
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default)]
    pub slide_numbers: bool,
    /// Overrides the document theme font
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            author: default_author(),
            company: None,
            footer: None,
            slide_numbers: false,
            font_family: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Physical slide size; defaults to the size the document was imported with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_extent: Option<Extent>,
    #[serde(default)]
    pub branding: BrandingConfig,
    /// Fill for image and render-failure placeholders
    #[serde(default = "default_placeholder_fill")]
    pub placeholder_fill: String,
    #[serde(default = "default_disclosure_fill")]
    pub disclosure_fill: String,
    #[serde(default = "default_metric_color")]
    pub metric_color: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            slide_extent: None,
            branding: BrandingConfig::default(),
            placeholder_fill: default_placeholder_fill(),
            disclosure_fill: default_disclosure_fill(),
            metric_color: default_metric_color(),
        }
    }
}

impl EngineConfig {
    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!(path = p, error = %e, "failed to load config, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
