use crate::config::{CanvasConfig, HistoryConfig};
use crate::detection::VariableDetector;
use crate::error::CommandError;
use crate::layout;
use crate::model::history::HistoryEngine;
use crate::model::selection::{Selection, ViewState};
use crate::types::*;
use uuid::Uuid;

/// Everything needed to create a component; the id is assigned on insert
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDraft {
    pub props: ComponentProps,
    pub position: Position,
    pub size: Size,
    pub style: Style,
    pub locked: bool,
    pub visible: bool,
}

impl ComponentDraft {
    pub fn new(props: ComponentProps, position: Position, size: Size) -> Self {
        Self {
            props,
            position,
            size,
            style: Style::default(),
            locked: false,
            visible: true,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn into_component(self) -> Result<Component, CommandError> {
        ensure_size(self.size)?;
        Ok(Component {
            id: Uuid::new_v4(),
            position: self.position,
            size: self.size,
            style: self.style,
            props: self.props,
            locked: self.locked,
            visible: self.visible,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideDraft {
    pub title: Option<String>,
    pub background_color: Option<String>,
    pub components: Vec<ComponentDraft>,
    /// Insert position; appended when absent
    pub at: Option<usize>,
}

/// Partial slide update; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideUpdate {
    pub title: Option<String>,
    pub background_color: Option<String>,
    pub category: Option<Category>,
}

/// Partial component update; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentUpdate {
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub style: Option<Style>,
    pub props: Option<ComponentProps>,
    pub locked: Option<bool>,
    pub visible: Option<bool>,
}

/// The editable document plus its history and editor state.
///
/// Every mutating command runs against a copy of the current document and is
/// installed, with a history snapshot, only when it succeeds. Rejected
/// commands leave both the document and the history untouched.
pub struct DocumentModel {
    document: Document,
    history: HistoryEngine,
    selection: Selection,
    active_slide: Option<SlideId>,
    view: ViewState,
    canvas: CanvasConfig,
}

impl DocumentModel {
    pub fn new(mut document: Document, history: &HistoryConfig, canvas: &CanvasConfig) -> Self {
        document.reindex_slides();
        let active_slide = document.slides.first().map(|s| s.id);
        Self {
            history: HistoryEngine::new(document.clone(), history.max_snapshots),
            document,
            selection: Selection::default(),
            active_slide,
            view: ViewState::from_config(canvas),
            canvas: canvas.clone(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn history(&self) -> &HistoryEngine {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_slide(&self) -> Option<SlideId> {
        self.active_slide
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn apply<T>(
        &mut self,
        label: &str,
        command: impl FnOnce(&mut Document) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        let mut next = self.document.clone();
        let output = command(&mut next).inspect_err(|e| {
            tracing::debug!(command = label, error = %e, "command rejected");
        })?;
        next.reindex_slides();
        self.history.commit(next.clone(), label);
        self.document = next;
        tracing::debug!(command = label, snapshots = self.history.len(), "command applied");
        Ok(output)
    }

    // ===== SLIDE COMMANDS =====

    pub fn add_slide(&mut self, draft: Option<SlideDraft>) -> Result<SlideId, CommandError> {
        let draft = draft.unwrap_or_default();
        let mut slide = Slide::new(
            draft
                .title
                .unwrap_or_else(|| self.canvas.new_slide_title.clone()),
        );
        slide.background_color = draft
            .background_color
            .or_else(|| Some(self.canvas.new_slide_background.clone()));
        slide.components = draft
            .components
            .into_iter()
            .map(ComponentDraft::into_component)
            .collect::<Result<_, _>>()?;
        let id = slide.id;

        self.apply("add_slide", |doc| {
            let at = draft.at.unwrap_or(doc.slides.len());
            if at > doc.slides.len() {
                return Err(CommandError::IndexOutOfRange {
                    index: at,
                    len: doc.slides.len(),
                });
            }
            doc.slides.insert(at, slide);
            Ok(())
        })?;

        self.active_slide = Some(id);
        Ok(id)
    }

    pub fn update_slide(&mut self, id: SlideId, update: SlideUpdate) -> Result<(), CommandError> {
        self.apply("update_slide", |doc| {
            let slide = slide_mut(doc, id)?;
            if let Some(title) = update.title {
                slide.title = title;
            }
            if let Some(color) = update.background_color {
                slide.background_color = Some(color);
            }
            if let Some(category) = update.category {
                slide.category = category;
            }
            Ok(())
        })
    }

    pub fn delete_slide(&mut self, id: SlideId) -> Result<(), CommandError> {
        self.apply("delete_slide", |doc| {
            let at = doc
                .slides
                .iter()
                .position(|s| s.id == id)
                .ok_or(CommandError::SlideNotFound(id))?;
            doc.slides.remove(at);
            Ok(())
        })?;
        self.reconcile_editor_state();
        Ok(())
    }

    /// Move the slide at `from` so it ends up at `to`
    pub fn reorder_slides(&mut self, from: usize, to: usize) -> Result<(), CommandError> {
        self.apply("reorder_slides", |doc| {
            let len = doc.slides.len();
            for index in [from, to] {
                if index >= len {
                    return Err(CommandError::IndexOutOfRange { index, len });
                }
            }
            let slide = doc.slides.remove(from);
            doc.slides.insert(to, slide);
            Ok(())
        })
    }

    // ===== COMPONENT COMMANDS =====

    pub fn add_component(
        &mut self,
        slide_id: SlideId,
        draft: ComponentDraft,
    ) -> Result<ComponentId, CommandError> {
        let component = draft.into_component()?;
        let id = component.id;
        self.apply("add_component", |doc| {
            slide_mut(doc, slide_id)?.components.push(component);
            Ok(())
        })?;
        Ok(id)
    }

    pub fn update_component(
        &mut self,
        id: ComponentId,
        update: ComponentUpdate,
    ) -> Result<(), CommandError> {
        self.apply("update_component", |doc| {
            let component = component_mut(doc, id)?;

            let moves = update.position.is_some() || update.size.is_some();
            let stays_locked = update.locked.unwrap_or(component.locked);
            if moves && stays_locked {
                return Err(CommandError::ComponentLocked(id));
            }
            if let Some(props) = &update.props {
                if props.kind() != component.kind() {
                    return Err(CommandError::KindMismatch {
                        id,
                        from: component.kind().as_str(),
                        to: props.kind().as_str(),
                    });
                }
            }
            if let Some(size) = update.size {
                ensure_size(size)?;
                component.size = size;
            }
            if let Some(position) = update.position {
                component.position = position;
            }
            if let Some(style) = update.style {
                component.style = style;
            }
            if let Some(props) = update.props {
                component.props = props;
            }
            if let Some(locked) = update.locked {
                component.locked = locked;
            }
            if let Some(visible) = update.visible {
                component.visible = visible;
            }
            Ok(())
        })
    }

    pub fn delete_component(&mut self, id: ComponentId) -> Result<(), CommandError> {
        self.apply("delete_component", |doc| {
            let (slide, at) = doc
                .locate_component(id)
                .ok_or(CommandError::ComponentNotFound(id))?;
            doc.slides[slide].components.remove(at);
            Ok(())
        })?;
        self.selection.remove(id);
        Ok(())
    }

    /// Copy a component onto the same slide with a fresh id, offset down and right
    pub fn duplicate_component(&mut self, id: ComponentId) -> Result<ComponentId, CommandError> {
        let offset = self.canvas.duplicate_offset;
        self.apply("duplicate_component", |doc| duplicate_into(doc, id, offset))
    }

    pub fn move_component(&mut self, id: ComponentId, position: Position) -> Result<(), CommandError> {
        self.apply("move_component", |doc| {
            let component = component_mut(doc, id)?;
            if component.locked {
                return Err(CommandError::ComponentLocked(id));
            }
            component.position = position;
            Ok(())
        })
    }

    pub fn resize_component(&mut self, id: ComponentId, size: Size) -> Result<(), CommandError> {
        ensure_size(size)?;
        self.apply("resize_component", |doc| {
            let component = component_mut(doc, id)?;
            if component.locked {
                return Err(CommandError::ComponentLocked(id));
            }
            component.size = size;
            Ok(())
        })
    }

    /// Insert a component where it was dropped on the editor surface,
    /// snapped to the grid when snapping is on
    pub fn drop_component(
        &mut self,
        slide_id: SlideId,
        mut draft: ComponentDraft,
        pointer: Position,
        surface: Rect,
    ) -> Result<ComponentId, CommandError> {
        draft.position = layout::drop_target(pointer, surface, self.view.snap_grid())
            .ok_or(CommandError::OutsideDropSurface)?;
        self.add_component(slide_id, draft)
    }

    /// Move an existing component to a pointer position on the editor surface
    pub fn drag_component(
        &mut self,
        id: ComponentId,
        pointer: Position,
        surface: Rect,
    ) -> Result<(), CommandError> {
        let position = layout::drop_target(pointer, surface, self.view.snap_grid())
            .ok_or(CommandError::OutsideDropSurface)?;
        self.move_component(id, position)
    }

    // ===== SELECTION =====

    pub fn select_component(&mut self, id: ComponentId, multi: bool) -> Result<(), CommandError> {
        let (slide, _) = self
            .document
            .locate_component(id)
            .ok_or(CommandError::ComponentNotFound(id))?;
        self.selection.select(id, multi);
        self.active_slide = Some(self.document.slides[slide].id);
        Ok(())
    }

    pub fn select_components(&mut self, ids: &[ComponentId]) -> Result<(), CommandError> {
        if let Some(missing) = ids.iter().find(|id| !self.document.contains_component(**id)) {
            return Err(CommandError::ComponentNotFound(*missing));
        }
        self.selection.set(ids.iter().copied());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every component on the active slide; returns how many
    pub fn select_all(&mut self) -> usize {
        let ids: Vec<ComponentId> = self
            .active_slide
            .and_then(|id| self.document.slide(id))
            .map(|slide| slide.components.iter().map(|c| c.id).collect())
            .unwrap_or_default();
        self.selection.set(ids);
        self.selection.len()
    }

    /// Delete all selected components as one undoable step
    pub fn delete_selected(&mut self) -> Result<usize, CommandError> {
        if self.selection.is_empty() {
            return Err(CommandError::EmptySelection);
        }
        let ids = self.selection.ids().to_vec();
        let count = self.apply("delete_selected", |doc| {
            let mut removed = 0;
            for slide in doc.slides.iter_mut() {
                let before = slide.components.len();
                slide.components.retain(|c| !ids.contains(&c.id));
                removed += before - slide.components.len();
            }
            Ok(removed)
        })?;
        self.selection.clear();
        Ok(count)
    }

    /// Duplicate all selected components as one undoable step; the copies
    /// become the new selection
    pub fn duplicate_selected(&mut self) -> Result<Vec<ComponentId>, CommandError> {
        if self.selection.is_empty() {
            return Err(CommandError::EmptySelection);
        }
        let ids = self.selection.ids().to_vec();
        let offset = self.canvas.duplicate_offset;
        let copies = self.apply("duplicate_selected", |doc| {
            ids.iter()
                .map(|id| duplicate_into(doc, *id, offset))
                .collect::<Result<Vec<_>, _>>()
        })?;
        self.selection.set(copies.iter().copied());
        Ok(copies)
    }

    pub fn set_active_slide(&mut self, id: SlideId) -> Result<(), CommandError> {
        if self.document.slide(id).is_none() {
            return Err(CommandError::SlideNotFound(id));
        }
        self.active_slide = Some(id);
        Ok(())
    }

    // ===== VIEW =====

    pub fn set_zoom(&mut self, zoom: f64) {
        self.view.set_zoom(zoom);
    }

    pub fn toggle_grid(&mut self) {
        self.view.show_grid = !self.view.show_grid;
    }

    pub fn toggle_snap_to_grid(&mut self) {
        self.view.snap_to_grid = !self.view.snap_to_grid;
    }

    pub fn set_grid_size(&mut self, grid_size: f64) {
        if grid_size.is_finite() && grid_size > 0.0 {
            self.view.grid_size = grid_size;
        }
    }

    // ===== VARIABLES =====

    /// Pick up variables introduced by edits. Counts only grow; entries
    /// whose text was deleted stay until the package is parsed again.
    pub fn refresh_variables(&mut self, detector: &VariableDetector) -> Result<(), CommandError> {
        let fresh = detector.detect(&self.document);
        self.apply("refresh_variables", |doc| {
            doc.variables.absorb(fresh);
            Ok(())
        })
    }

    // ===== HISTORY =====

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(document) => {
                self.document = document.clone();
                self.reconcile_editor_state();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(document) => {
                self.document = document.clone();
                self.reconcile_editor_state();
                true
            }
            None => false,
        }
    }

    /// Selection and active slide may point at things the current document
    /// no longer has
    fn reconcile_editor_state(&mut self) {
        let dropped = self.selection.retain_existing(&self.document);
        if dropped > 0 {
            tracing::debug!(dropped, "dropped stale selection ids");
        }
        let active_exists = self
            .active_slide
            .is_some_and(|id| self.document.slide(id).is_some());
        if !active_exists {
            self.active_slide = self.document.slides.first().map(|s| s.id);
        }
    }
}

fn ensure_size(size: Size) -> Result<(), CommandError> {
    if size.is_valid() {
        Ok(())
    } else {
        Err(CommandError::InvalidSize {
            width: size.width,
            height: size.height,
        })
    }
}

fn slide_mut(doc: &mut Document, id: SlideId) -> Result<&mut Slide, CommandError> {
    doc.slides
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or(CommandError::SlideNotFound(id))
}

fn component_mut(doc: &mut Document, id: ComponentId) -> Result<&mut Component, CommandError> {
    let (slide, at) = doc
        .locate_component(id)
        .ok_or(CommandError::ComponentNotFound(id))?;
    Ok(&mut doc.slides[slide].components[at])
}

fn duplicate_into(doc: &mut Document, id: ComponentId, offset: f64) -> Result<ComponentId, CommandError> {
    let (slide, at) = doc
        .locate_component(id)
        .ok_or(CommandError::ComponentNotFound(id))?;
    let mut copy = doc.slides[slide].components[at].clone();
    copy.id = Uuid::new_v4();
    copy.position = copy.position.offset(offset, offset);
    let copy_id = copy.id;
    doc.slides[slide].components.push(copy);
    Ok(copy_id)
}
