//! Package export
//!
//! ```text
//! Document + substitution map
//!     ↓
//! [substitution]  {{name}} placeholders, then inferred spans
//!     ↓
//! [exporter]  per component: shapes / chart / media, placeholder on failure
//!     ↓
//! [package]  skeleton parts + zip container
//! ```

pub mod chart;
pub mod exporter;
pub mod package;
pub mod shapes;
pub mod substitution;

use thiserror::Error;

pub use exporter::{ExportReport, PackageExporter};
pub use substitution::{preview, substitute_document, SlidePreview, Substitutions};

/// Why one component could not be rendered. Never escapes an export: the
/// component is replaced by a placeholder and the reason becomes a warning.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid color '{0}'")]
    InvalidColor(String),

    #[error("chart type '{0}' cannot be exported")]
    UnsupportedChart(&'static str),

    #[error("chart has no data points")]
    EmptyChart,

    #[error("chart value for '{0}' is not a finite number")]
    NonFiniteValue(String),

    #[error("image data could not be decoded: {0}")]
    ImageData(String),

    #[error("failed to write chart part: {0}")]
    ChartWrite(#[from] std::io::Error),

    #[error("failed to format shape xml")]
    Format(#[from] std::fmt::Error),
}
