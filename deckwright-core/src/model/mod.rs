//! Editable document state: command application, undo history and the
//! editor-only selection/view state that sits beside it.

pub mod document_model;
pub mod history;
pub mod selection;

pub use document_model::{ComponentDraft, ComponentUpdate, DocumentModel, SlideDraft, SlideUpdate};
pub use history::{HistoryEngine, HistorySnapshot};
pub use selection::{Selection, ViewState};
