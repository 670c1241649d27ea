use crate::config::CanvasConfig;
use crate::types::{ComponentId, Document};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;

/// Selected component ids in selection order. Editor state only, never part
/// of history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: Vec<ComponentId>,
}

impl Selection {
    /// Replace the selection, or toggle `id` when `multi` is set
    pub fn select(&mut self, id: ComponentId, multi: bool) {
        if !multi {
            self.ids = vec![id];
        } else if let Some(at) = self.ids.iter().position(|s| *s == id) {
            self.ids.remove(at);
        } else {
            self.ids.push(id);
        }
    }

    pub fn set(&mut self, ids: impl IntoIterator<Item = ComponentId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn remove(&mut self, id: ComponentId) {
        self.ids.retain(|s| *s != id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[ComponentId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop ids that no longer exist in `document`; returns how many went
    pub fn retain_existing(&mut self, document: &Document) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| document.contains_component(*id));
        before - self.ids.len()
    }
}

/// Canvas view settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub zoom: f64,
    pub show_grid: bool,
    pub snap_to_grid: bool,
    pub grid_size: f64,
}

impl ViewState {
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            zoom: 1.0,
            show_grid: config.show_grid,
            snap_to_grid: config.snap_to_grid,
            grid_size: config.grid_size,
        }
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Grid used for snapping, if snapping is on
    pub fn snap_grid(&self) -> Option<f64> {
        (self.snap_to_grid && self.grid_size > 0.0).then_some(self.grid_size)
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}
