//! Converts pointer gestures into form snapshots: dragging and resizing widgets,
//! resizing the form, and placing new widgets.
//!
//! Pointer positions are in surface coordinates, with the origin at the top-left of
//! the simulated window frame. The title bar is subtracted before anything
//! touches the model. Every operation takes the current form by reference and
//! returns the next snapshot by value. `None` means the call was a no-op.

pub mod snap;

use crate::catalog::{Catalog, WidgetDef};
use crate::config::DesignerConfig;
use crate::widget::{
    FormState, IdCounter, PlacedWidget, WidgetId, snap_pos_with_grid, snap_with_grid,
};
use egui::{Pos2, Rect, Vec2, pos2, vec2};
use snap::{Guides, align_snap, derive_guides};
use tracing::{debug, trace};

/// Form edge grabbed by a resize gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormEdge {
    East,
    South,
    SouthEast,
}

impl FormEdge {
    pub const fn resizes_width(&self) -> bool {
        matches!(self, FormEdge::East | FormEdge::SouthEast)
    }

    pub const fn resizes_height(&self) -> bool {
        matches!(self, FormEdge::South | FormEdge::SouthEast)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Gesture {
    DragWidget {
        id: WidgetId,
        offset: Vec2,
    },
    ResizeWidget {
        id: WidgetId,
        start_pointer: Pos2,
        start_size: Vec2,
    },
    ResizeForm {
        edge: FormEdge,
        start_pointer: Pos2,
        start_size: Vec2,
    },
}

/// Kind of the gesture in progress, for hosts that pick cursors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Drag,
    ResizeWidget,
    ResizeForm(FormEdge),
}

pub struct PlacementEngine {
    config: DesignerConfig,
    gesture: Option<Gesture>,
    guides: Guides,
}

impl PlacementEngine {
    pub fn new(config: DesignerConfig) -> Self {
        Self {
            config,
            gesture: None,
            guides: Guides::default(),
        }
    }

    pub fn config(&self) -> &DesignerConfig {
        &self.config
    }

    /// Guides recorded by the latest drag update.
    pub fn guides(&self) -> &Guides {
        &self.guides
    }

    pub fn active_gesture(&self) -> Option<GestureKind> {
        self.gesture.as_ref().map(|g| match g {
            Gesture::DragWidget { .. } => GestureKind::Drag,
            Gesture::ResizeWidget { .. } => GestureKind::ResizeWidget,
            Gesture::ResizeForm { edge, .. } => GestureKind::ResizeForm(*edge),
        })
    }

    /// Surface position to form content position.
    pub fn to_content(&self, pointer: Pos2) -> Pos2 {
        pointer - vec2(0.0, self.config.title_bar_height)
    }

    /// Abandons any gesture without touching the form.
    pub fn cancel(&mut self) {
        self.gesture = None;
        self.guides.clear();
    }

    pub fn begin_drag_widget(&mut self, form: &FormState, id: &WidgetId, pointer: Pos2) -> bool {
        let Some(w) = form.widget(id) else {
            debug!(%id, "drag ignored: unknown widget");
            return false;
        };
        let offset = self.to_content(pointer) - w.pos;
        debug!(%id, ?offset, "drag started");
        self.gesture = Some(Gesture::DragWidget {
            id: id.clone(),
            offset,
        });
        self.guides.clear();
        true
    }

    pub fn update_drag(&mut self, form: &FormState, pointer: Pos2) -> Option<FormState> {
        let Some(Gesture::DragWidget { id, offset }) = &self.gesture else {
            return None;
        };
        let index = form.index_of(id)?;
        let size = form.widgets[index].size;
        let proposed = Rect::from_min_size(self.to_content(pointer) - *offset, size);
        let others: Vec<Rect> = form
            .widgets
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, w)| w.rect())
            .collect();

        let snapped = align_snap(
            proposed,
            &others,
            self.config.snap_threshold,
            self.config.grid_size,
        );
        let origin = clamp_origin(snapped, size, form.size);
        self.guides = derive_guides(
            Rect::from_min_size(origin, size),
            &others,
            self.config.guide_tolerance,
        );
        trace!(%id, proposed = ?proposed.min, ?origin, "drag update");

        let mut next = form.clone();
        next.widgets[index].pos = origin;
        Some(next)
    }

    pub fn end_drag(&mut self) -> bool {
        let was_dragging = matches!(self.gesture, Some(Gesture::DragWidget { .. }));
        if was_dragging {
            debug!("drag ended");
            self.cancel();
        }
        was_dragging
    }

    pub fn begin_resize_widget(&mut self, form: &FormState, id: &WidgetId, pointer: Pos2) -> bool {
        let Some(w) = form.widget(id) else {
            debug!(%id, "resize ignored: unknown widget");
            return false;
        };
        self.gesture = Some(Gesture::ResizeWidget {
            id: id.clone(),
            start_pointer: pointer,
            start_size: w.size,
        });
        self.guides.clear();
        true
    }

    pub fn update_resize_widget(&mut self, form: &FormState, pointer: Pos2) -> Option<FormState> {
        let Some(Gesture::ResizeWidget {
            id,
            start_pointer,
            start_size,
        }) = &self.gesture
        else {
            return None;
        };
        let index = form.index_of(id)?;
        let pos = form.widgets[index].pos;
        let raw = *start_size + (pointer - *start_pointer);
        let min = self.config.min_widget_size;
        let grid = self.config.grid_size;
        // Stay inside the form, unless that would break the minimum size.
        let limit = vec2(
            (form.size.x - pos.x).max(min.x),
            (form.size.y - pos.y).max(min.y),
        );
        let size = vec2(
            snap_with_grid(raw.x, grid).clamp(min.x, limit.x),
            snap_with_grid(raw.y, grid).clamp(min.y, limit.y),
        );
        trace!(%id, ?size, "resize update");

        let mut next = form.clone();
        next.widgets[index].size = size;
        Some(next)
    }

    pub fn end_resize_widget(&mut self) -> bool {
        let was_resizing = matches!(self.gesture, Some(Gesture::ResizeWidget { .. }));
        if was_resizing {
            self.cancel();
        }
        was_resizing
    }

    pub fn begin_resize_form(&mut self, form: &FormState, edge: FormEdge, pointer: Pos2) {
        debug!(?edge, "form resize started");
        self.gesture = Some(Gesture::ResizeForm {
            edge,
            start_pointer: pointer,
            start_size: form.size,
        });
        self.guides.clear();
    }

    pub fn update_resize_form(&mut self, form: &FormState, pointer: Pos2) -> Option<FormState> {
        let Some(Gesture::ResizeForm {
            edge,
            start_pointer,
            start_size,
        }) = &self.gesture
        else {
            return None;
        };
        let raw = *start_size + (pointer - *start_pointer);
        let grid = self.config.grid_size;
        // The form never gets smaller than its largest widget.
        let floor = form.widgets.iter().fold(self.config.min_form_size, |acc, w| {
            vec2(acc.x.max(w.size.x), acc.y.max(w.size.y))
        });
        let mut size = form.size;
        if edge.resizes_width() {
            size.x = snap_with_grid(raw.x, grid).max(floor.x);
        }
        if edge.resizes_height() {
            size.y = snap_with_grid(raw.y, grid).max(floor.y);
        }
        trace!(?edge, ?size, "form resize update");

        let mut next = form.clone();
        next.size = size;
        for w in &mut next.widgets {
            w.pos = clamp_origin(w.pos, w.size, size);
        }
        Some(next)
    }

    pub fn end_resize_form(&mut self) -> bool {
        let was_resizing = matches!(self.gesture, Some(Gesture::ResizeForm { .. }));
        if was_resizing {
            self.cancel();
        }
        was_resizing
    }

    /// Instantiates `type_name` centered on the pointer.
    pub fn drop_new_widget(
        &self,
        form: &FormState,
        ids: &mut IdCounter,
        type_name: &str,
        pointer: Pos2,
    ) -> Option<(FormState, WidgetId)> {
        let Some(def) = Catalog::lookup(type_name) else {
            debug!(type_name, "drop ignored: unknown widget type");
            return None;
        };
        let size = fit_size(def.default_size, form.size);
        let centered = self.to_content(pointer) - size * 0.5;
        let pos = clamp_origin(
            snap_pos_with_grid(centered, self.config.grid_size),
            size,
            form.size,
        );
        Some(self.insert(form, ids, def, pos, size))
    }

    /// Places `type_name` in the first free cascade slot.
    ///
    /// Slots are stacked top to bottom in columns, starting at the cascade origin.
    /// A slot is free when the widget fits inside the form without touching any
    /// other widget. Once no slot is free the origin steps diagonally with the
    /// widget count, wrapped within the form.
    pub fn add_widget_cascaded(
        &self,
        form: &FormState,
        ids: &mut IdCounter,
        type_name: &str,
    ) -> Option<(FormState, WidgetId)> {
        let Some(def) = Catalog::lookup(type_name) else {
            debug!(type_name, "add ignored: unknown widget type");
            return None;
        };
        let size = fit_size(def.default_size, form.size);
        let pos = match self.free_slot(form, size) {
            Some(pos) => pos,
            None => {
                debug!(type_name, "no free cascade slot, wrapping");
                self.wrapped_slot(form, size)
            }
        };
        Some(self.insert(form, ids, def, pos, size))
    }

    fn free_slot(&self, form: &FormState, size: Vec2) -> Option<Pos2> {
        let grid = self.config.grid_size;
        let gap = self.config.cascade_gap;
        let up = |v: f32| (v / grid).ceil() * grid;
        let top = up(self.config.cascade_origin);

        let mut slots = vec![pos2(top, top)];
        for w in &form.widgets {
            let r = w.rect();
            slots.push(pos2(up(r.min.x), up(r.max.y + gap)));
            slots.push(pos2(up(r.max.x + gap), top));
        }
        // Column-major: fill a column before opening the next one.
        slots.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

        let bounds = form.bounds();
        slots.into_iter().find(|slot| {
            let rect = Rect::from_min_size(*slot, size);
            bounds.contains_rect(rect) && form.widgets.iter().all(|w| !overlaps(rect, w.rect()))
        })
    }

    fn wrapped_slot(&self, form: &FormState, size: Vec2) -> Pos2 {
        let offset =
            self.config.cascade_origin + self.config.cascade_step * form.widgets.len() as f32;
        let wrap = |span: f32| if span > 0.0 { offset % span } else { 0.0 };
        let slot = pos2(wrap(form.size.x - size.x), wrap(form.size.y - size.y));
        clamp_origin(
            snap_pos_with_grid(slot, self.config.grid_size),
            size,
            form.size,
        )
    }

    fn insert(
        &self,
        form: &FormState,
        ids: &mut IdCounter,
        def: &WidgetDef,
        pos: Pos2,
        size: Vec2,
    ) -> (FormState, WidgetId) {
        let id = ids.mint(def, form);
        let mut w = PlacedWidget::from_def(id.clone(), def, pos);
        w.size = size;
        debug!(%id, ?pos, "widget added");
        let mut next = form.clone();
        next.widgets.push(w);
        (next, id)
    }

    pub fn delete_widget(&mut self, form: &FormState, id: &WidgetId) -> Option<FormState> {
        let index = form.index_of(id)?;
        if self.gesture_targets(id) {
            self.cancel();
        }
        let mut next = form.clone();
        next.widgets.remove(index);
        debug!(%id, "widget deleted");
        Some(next)
    }

    /// Copies a widget (properties and event code) one offset step down-right.
    pub fn duplicate_widget(
        &self,
        form: &FormState,
        ids: &mut IdCounter,
        id: &WidgetId,
    ) -> Option<(FormState, WidgetId)> {
        let source = form.widget(id)?;
        let def = source.def()?;
        let mut copy = source.clone();
        copy.id = ids.mint(def, form);
        let offset = Vec2::splat(self.config.duplicate_offset);
        copy.pos = clamp_origin(source.pos + offset, copy.size, form.size);
        let new_id = copy.id.clone();
        let mut next = form.clone();
        next.widgets.push(copy);
        debug!(source = %id, copy = %new_id, "widget duplicated");
        Some((next, new_id))
    }

    /// Moves a widget by `delta`, kept inside the form.
    pub fn nudge_widget(&self, form: &FormState, id: &WidgetId, delta: Vec2) -> Option<FormState> {
        let index = form.index_of(id)?;
        let w = &form.widgets[index];
        let pos = clamp_origin(w.pos + delta, w.size, form.size);
        if pos == w.pos {
            return None;
        }
        let mut next = form.clone();
        next.widgets[index].pos = pos;
        Some(next)
    }

    /// Moves a widget to the end of the paint order.
    pub fn bring_to_front(&self, form: &FormState, id: &WidgetId) -> Option<FormState> {
        let index = form.index_of(id)?;
        if index + 1 == form.widgets.len() {
            return None;
        }
        let mut next = form.clone();
        let w = next.widgets.remove(index);
        next.widgets.push(w);
        Some(next)
    }

    /// Moves a widget to the start of the paint order.
    pub fn send_to_back(&self, form: &FormState, id: &WidgetId) -> Option<FormState> {
        let index = form.index_of(id)?;
        if index == 0 {
            return None;
        }
        let mut next = form.clone();
        let w = next.widgets.remove(index);
        next.widgets.insert(0, w);
        Some(next)
    }

    fn gesture_targets(&self, target: &WidgetId) -> bool {
        match &self.gesture {
            Some(Gesture::DragWidget { id, .. }) | Some(Gesture::ResizeWidget { id, .. }) => {
                id == target
            }
            _ => false,
        }
    }
}

/// Keeps a `size` rectangle at `origin` inside `form_size`.
pub fn clamp_origin(origin: Pos2, size: Vec2, form_size: Vec2) -> Pos2 {
    let max_x = (form_size.x - size.x).max(0.0);
    let max_y = (form_size.y - size.y).max(0.0);
    pos2(origin.x.clamp(0.0, max_x), origin.y.clamp(0.0, max_y))
}

/// Interiors intersect. Shared edges do not count.
fn overlaps(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && b.min.x < a.max.x && a.min.y < b.max.y && b.min.y < a.max.y
}

fn fit_size(size: Vec2, form_size: Vec2) -> Vec2 {
    vec2(size.x.min(form_size.x), size.y.min(form_size.y))
}
