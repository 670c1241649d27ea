// Deckwright Core Library
//
// Imports slide deck packages into an editable document model, records edits
// with undo/redo, and exports templated packages with variable substitution.

pub mod types;
pub mod error;
pub mod config;
pub mod layout;
pub mod package;
pub mod detection;
pub mod model;
pub mod registry;
pub mod export;
pub mod serialization;
pub mod cache;
pub mod storage;
pub mod processor;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::{CommandError, ExportError, ExportWarning, ImportError, ImportWarning};
pub use config::EngineConfig;
pub use layout::LayoutTransform;
pub use package::{PackageParser, ParsedPackage, Preprocessor};
pub use detection::{SlideCategorizer, VariableDetector};
pub use model::{ComponentDraft, ComponentUpdate, DocumentModel, SlideDraft, SlideUpdate};
pub use registry::ComponentRegistry;
pub use export::{preview, ExportReport, PackageExporter};
pub use serialization::{DocumentOutline, PersistedDocument};
pub use processor::{DocumentProcessor, ImportOptions, ImportReport};
