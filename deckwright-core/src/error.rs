use crate::types::{ComponentId, SlideId};
use thiserror::Error;

/// Fatal import failures. Anything recoverable becomes an [`ImportWarning`].
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("corrupt package: {0}")]
    CorruptPackage(String),

    #[error("failed to read package: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single XML part could not be read
#[derive(Debug, Error)]
pub enum PartError {
    #[error("part is not valid UTF-8")]
    Encoding,

    #[error("xml error near byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("part has no root element")]
    Empty,
}

/// Recovered import problems; the document is still produced
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImportWarning {
    PartialExtractionFailure { part: String, reason: String },
    ThemeFallback { reason: String },
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportWarning::PartialExtractionFailure { part, reason } => {
                write!(f, "could not extract {part}: {reason}")
            }
            ImportWarning::ThemeFallback { reason } => {
                write!(f, "using default theme: {reason}")
            }
        }
    }
}

/// Fatal export failure. Only the container write can abort an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write package: {0}")]
    ExportIoFailure(String),
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::ExportIoFailure(err.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::ExportIoFailure(err.to_string())
    }
}

/// Recovered export problems; the affected component was degraded, not dropped
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExportWarning {
    UnknownComponentKind { component: ComponentId, kind: String },
    ComponentRenderFailed { component: ComponentId, reason: String },
}

impl std::fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportWarning::UnknownComponentKind { component, kind } => {
                write!(f, "component {component} has unknown kind '{kind}', exported as text")
            }
            ExportWarning::ComponentRenderFailed { component, reason } => {
                write!(f, "component {component} replaced by placeholder: {reason}")
            }
        }
    }
}

/// A rejected editing command. The model is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("slide {0} not found")]
    SlideNotFound(SlideId),

    #[error("component {0} not found")]
    ComponentNotFound(ComponentId),

    #[error("invalid size {width}x{height}: both dimensions must be positive")]
    InvalidSize { width: f64, height: f64 },

    #[error("slide index {index} out of range for {len} slides")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("component {0} is locked")]
    ComponentLocked(ComponentId),

    #[error("cannot change component {id} from {from} to {to}")]
    KindMismatch {
        id: ComponentId,
        from: &'static str,
        to: &'static str,
    },

    #[error("no components selected")]
    EmptySelection,

    #[error("pointer is outside the drop surface")]
    OutsideDropSurface,
}
