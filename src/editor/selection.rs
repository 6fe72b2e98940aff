//! Selection management for the board editor.
//!
//! Provides rectangle-based selection of placed pads, maintaining the
//! selected channels in click order.
//!
//! # Usage
//!
//! ```rust,ignore
//! use padplace::editor::selection::PadSelection;
//!
//! let mut sel = PadSelection::new();
//! sel.start_rect(10.0, 20.0);
//! sel.update_rect(15.0, 12.0);
//! sel.finish_rect(session.all_objects().iter(), Side::Top);
//! assert!(!sel.is_empty());
//! ```

use crate::model::{BoardObject, Channel, Side};

/// Drags smaller than this (mm, both axes) select nothing.
const MIN_DRAG_MM: f64 = 0.05;

/// A rectangle used for drag-selection, in board millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
}

impl SelectionRect {
    /// Create a new selection rectangle starting at the given point.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            start_x: x,
            start_y: y,
            end_x: x,
            end_y: y,
        }
    }

    /// Update the end point of the selection rectangle.
    pub fn update(&mut self, x: f64, y: f64) {
        self.end_x = x;
        self.end_y = y;
    }

    /// Get the normalized (min-max) rectangle bounds.
    pub fn normalized(&self) -> (f64, f64, f64, f64) {
        (
            self.start_x.min(self.end_x),
            self.start_y.min(self.end_y),
            self.start_x.max(self.end_x),
            self.start_y.max(self.end_y),
        )
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (min_x, min_y, max_x, max_y) = self.normalized();
        x >= min_x && x <= max_x && y >= min_y && y <= max_y
    }

    /// Check if the box `(min_x, min_y, max_x, max_y)` overlaps this rectangle.
    pub fn overlaps_box(&self, l: f64, b: f64, r: f64, t: f64) -> bool {
        let (min_x, min_y, max_x, max_y) = self.normalized();
        l < max_x && r > min_x && b < max_y && t > min_y
    }

    /// Check if a placed pad (its rotated bounding box) overlaps this rectangle.
    pub fn overlaps_pad(&self, obj: &BoardObject) -> bool {
        let (hx, hy) = obj.shape.half_extents(obj.angle_deg);
        self.overlaps_box(
            obj.x_coord_mm - hx,
            obj.y_coord_mm - hy,
            obj.x_coord_mm + hx,
            obj.y_coord_mm + hy,
        )
    }

    pub fn width(&self) -> f64 {
        (self.end_x - self.start_x).abs()
    }

    pub fn height(&self) -> f64 {
        (self.end_y - self.start_y).abs()
    }
}

/// Tracks the selected pads.
#[derive(Debug, Clone, Default)]
pub struct PadSelection {
    /// Selected channels, in selection order.
    pub selected: Vec<Channel>,
    /// Active drag-selection rectangle, if any.
    pub selection_rect: Option<SelectionRect>,
}

impl PadSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.selection_rect = None;
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_selected(&self, channel: Channel) -> bool {
        self.selected.contains(&channel)
    }

    /// Add the channel if absent, remove it otherwise.
    pub fn toggle(&mut self, channel: Channel) {
        if let Some(pos) = self.selected.iter().position(|&c| c == channel) {
            self.selected.remove(pos);
        } else {
            self.selected.push(channel);
        }
    }

    /// Select a single pad, clearing any previous selection.
    pub fn select(&mut self, channel: Channel) {
        self.selected.clear();
        self.selected.push(channel);
    }

    pub fn start_rect(&mut self, x: f64, y: f64) {
        self.selection_rect = Some(SelectionRect::new(x, y));
    }

    pub fn update_rect(&mut self, x: f64, y: f64) {
        if let Some(rect) = &mut self.selection_rect {
            rect.update(x, y);
        }
    }

    /// Finish the drag, replacing the selection with the visible pads on
    /// `side` (pads on both sides always count) that touch the rectangle.
    pub fn finish_rect<'a>(
        &mut self,
        objects: impl IntoIterator<Item = &'a BoardObject>,
        side: Side,
    ) {
        let Some(rect) = self.selection_rect.take() else {
            return;
        };
        if rect.width() < MIN_DRAG_MM && rect.height() < MIN_DRAG_MM {
            return;
        }
        self.selected = objects
            .into_iter()
            .filter(|o| o.visible && (o.side == side || o.side == Side::Both))
            .filter(|o| rect.overlaps_pad(o))
            .filter_map(|o| o.channel)
            .collect();
    }

    /// Drop channels for which `exists` returns false (e.g. after a delete
    /// or an undo).
    pub fn retain_existing(&mut self, exists: impl Fn(Channel) -> bool) {
        self.selected.retain(|&c| exists(c));
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }
}
