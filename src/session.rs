//! One designer session: the placement engine, history, id counter and selection
//! wired together.
//!
//! The host keeps the canonical [`FormState`] and hands it to every call by
//! reference. Calls that change the form return the next snapshot, which the host
//! stores. Discrete edits are committed to history right away. A drag or resize is
//! committed once, when it ends, and only if it moved something. Inspector edits
//! made between [`Designer::begin_edit`] and [`Designer::end_edit`] are committed
//! the same way.

use crate::config::DesignerConfig;
use crate::events::{self, EventCode};
use crate::history::History;
use crate::placement::snap::Guides;
use crate::placement::{FormEdge, GestureKind, PlacementEngine};
use crate::widget::props::PropValue;
use crate::widget::{BackgroundImage, FormState, IdCounter, WidgetId};
use egui::{Pos2, Vec2, vec2};
use tracing::debug;

pub struct Designer {
    engine: PlacementEngine,
    history: History,
    ids: IdCounter,
    selected: Option<WidgetId>,
    /// Direct edits are held back from history until `end_edit`.
    editing: bool,
}

impl Designer {
    pub fn new(config: DesignerConfig, baseline: &FormState) -> Self {
        let config = config.sanitized();
        let history = History::new(baseline.clone(), config.history_limit);
        Self {
            engine: PlacementEngine::new(config),
            history,
            ids: IdCounter::resume_after(baseline),
            selected: None,
            editing: false,
        }
    }

    /// Starts over from `form` (new or loaded project).
    pub fn reset(&mut self, form: &FormState) {
        self.engine.cancel();
        self.history.reset(form.clone());
        self.ids = IdCounter::resume_after(form);
        self.selected = None;
        self.editing = false;
    }

    pub fn config(&self) -> &DesignerConfig {
        self.engine.config()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn guides(&self) -> &Guides {
        self.engine.guides()
    }

    pub fn active_gesture(&self) -> Option<GestureKind> {
        self.engine.active_gesture()
    }

    pub fn selected(&self) -> Option<&WidgetId> {
        self.selected.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Selects `id`, or clears the selection. Ids not in `form` are ignored.
    pub fn select(&mut self, form: &FormState, id: Option<WidgetId>) -> bool {
        match id {
            Some(id) if form.widget(&id).is_none() => {
                debug!(%id, "select ignored: unknown widget");
                false
            }
            id => {
                self.selected = id;
                true
            }
        }
    }

    /// Topmost widget under a surface-coordinate pointer.
    pub fn widget_at(&self, form: &FormState, pointer: Pos2) -> Option<WidgetId> {
        let p = self.engine.to_content(pointer);
        form.widgets
            .iter()
            .rev()
            .find(|w| w.rect().contains(p))
            .map(|w| w.id.clone())
    }

    /// Commits a discrete operation. `next` was built from the host's form, so it
    /// already carries any pending direct edit.
    fn commit(&mut self, next: FormState) -> FormState {
        self.editing = false;
        self.history.commit(next.clone());
        next
    }

    fn commit_edit(&mut self, next: FormState) -> FormState {
        if !self.editing {
            self.history.commit(next.clone());
        }
        next
    }

    /// Holds direct edits (properties, geometry, form settings) back from
    /// history, for a control that changes on every frame of a drag or keystroke.
    pub fn begin_edit(&mut self) {
        self.editing = true;
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Commits `form` once if the held-back edits changed it.
    pub fn end_edit(&mut self, form: &FormState) -> bool {
        if !std::mem::take(&mut self.editing) || form == self.history.current() {
            return false;
        }
        debug!("inspector edit committed");
        self.history.commit(form.clone())
    }

    pub fn drop_new_widget(
        &mut self,
        form: &FormState,
        type_name: &str,
        pointer: Pos2,
    ) -> Option<FormState> {
        let (next, id) = self
            .engine
            .drop_new_widget(form, &mut self.ids, type_name, pointer)?;
        self.selected = Some(id);
        Some(self.commit(next))
    }

    pub fn add_widget(&mut self, form: &FormState, type_name: &str) -> Option<FormState> {
        let (next, id) = self
            .engine
            .add_widget_cascaded(form, &mut self.ids, type_name)?;
        self.selected = Some(id);
        Some(self.commit(next))
    }

    pub fn delete_widget(&mut self, form: &FormState, id: &WidgetId) -> Option<FormState> {
        let next = self.engine.delete_widget(form, id)?;
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        Some(self.commit(next))
    }

    pub fn duplicate_widget(&mut self, form: &FormState, id: &WidgetId) -> Option<FormState> {
        let (next, copy) = self.engine.duplicate_widget(form, &mut self.ids, id)?;
        self.selected = Some(copy);
        Some(self.commit(next))
    }

    pub fn nudge_widget(&mut self, form: &FormState, id: &WidgetId, delta: Vec2) -> Option<FormState> {
        let next = self.engine.nudge_widget(form, id, delta)?;
        Some(self.commit(next))
    }

    pub fn bring_to_front(&mut self, form: &FormState, id: &WidgetId) -> Option<FormState> {
        let next = self.engine.bring_to_front(form, id)?;
        Some(self.commit(next))
    }

    pub fn send_to_back(&mut self, form: &FormState, id: &WidgetId) -> Option<FormState> {
        let next = self.engine.send_to_back(form, id)?;
        Some(self.commit(next))
    }

    /// Starts dragging `id` and selects it.
    pub fn begin_drag(&mut self, form: &FormState, id: &WidgetId, pointer: Pos2) -> bool {
        if !self.engine.begin_drag_widget(form, id, pointer) {
            return false;
        }
        self.selected = Some(id.clone());
        true
    }

    pub fn begin_resize_widget(&mut self, form: &FormState, id: &WidgetId, pointer: Pos2) -> bool {
        if !self.engine.begin_resize_widget(form, id, pointer) {
            return false;
        }
        self.selected = Some(id.clone());
        true
    }

    pub fn begin_resize_form(&mut self, form: &FormState, edge: FormEdge, pointer: Pos2) {
        self.engine.begin_resize_form(form, edge, pointer);
    }

    /// Live snapshot for the gesture in progress. Not committed.
    pub fn update_gesture(&mut self, form: &FormState, pointer: Pos2) -> Option<FormState> {
        match self.engine.active_gesture()? {
            GestureKind::Drag => self.engine.update_drag(form, pointer),
            GestureKind::ResizeWidget => self.engine.update_resize_widget(form, pointer),
            GestureKind::ResizeForm(_) => self.engine.update_resize_form(form, pointer),
        }
    }

    /// Ends the gesture, committing `form` when the gesture changed it.
    pub fn end_gesture(&mut self, form: &FormState) -> bool {
        let ended = match self.engine.active_gesture() {
            Some(GestureKind::Drag) => self.engine.end_drag(),
            Some(GestureKind::ResizeWidget) => self.engine.end_resize_widget(),
            Some(GestureKind::ResizeForm(_)) => self.engine.end_resize_form(),
            None => false,
        };
        if !ended || form == self.history.current() {
            return false;
        }
        self.editing = false;
        self.history.commit(form.clone())
    }

    /// Abandons the gesture and returns the last committed snapshot.
    pub fn cancel_gesture(&mut self) -> FormState {
        self.engine.cancel();
        self.history.current().clone()
    }

    /// Steps back one commit. A pending direct edit is discarded instead, returning
    /// the last committed snapshot.
    pub fn undo(&mut self) -> Option<FormState> {
        self.engine.cancel();
        if std::mem::take(&mut self.editing) {
            let snapshot = self.history.current().clone();
            self.fix_selection(&snapshot);
            return Some(snapshot);
        }
        let snapshot = self.history.undo()?.snapshot().clone();
        self.fix_selection(&snapshot);
        Some(snapshot)
    }

    pub fn redo(&mut self) -> Option<FormState> {
        self.engine.cancel();
        self.editing = false;
        let snapshot = self.history.redo()?.snapshot().clone();
        self.fix_selection(&snapshot);
        Some(snapshot)
    }

    fn fix_selection(&mut self, form: &FormState) {
        if let Some(id) = &self.selected
            && form.widget(id).is_none()
        {
            self.selected = None;
        }
    }

    /// Sets a schema property. Keys outside the widget's schema are ignored.
    pub fn set_prop(
        &mut self,
        form: &FormState,
        id: &WidgetId,
        key: &str,
        value: PropValue,
    ) -> Option<FormState> {
        let w = form.widget(id)?;
        w.def()?.prop(key)?;
        if w.props.get(key) == Some(&value) {
            return None;
        }
        let mut next = form.clone();
        next.widget_mut(id)?.props.insert(key.to_owned(), value);
        debug!(%id, key, "property set");
        Some(self.commit_edit(next))
    }

    /// Sets position and size from numeric input. Negative values become zero; the
    /// form bounds are not enforced.
    pub fn set_geometry(
        &mut self,
        form: &FormState,
        id: &WidgetId,
        pos: Pos2,
        size: Vec2,
    ) -> Option<FormState> {
        let w = form.widget(id)?;
        let pos = pos.max(Pos2::ZERO);
        let size = size.max(Vec2::ZERO);
        if w.pos == pos && w.size == size {
            return None;
        }
        let mut next = form.clone();
        let w = next.widget_mut(id)?;
        w.pos = pos;
        w.size = size;
        Some(self.commit_edit(next))
    }

    pub fn set_title(&mut self, form: &FormState, title: &str) -> Option<FormState> {
        if form.title == title {
            return None;
        }
        let mut next = form.clone();
        next.title = title.to_owned();
        Some(self.commit_edit(next))
    }

    /// Sets the form size, held at the configured minimum.
    pub fn set_form_size(&mut self, form: &FormState, size: Vec2) -> Option<FormState> {
        let min = self.config().min_form_size;
        let size = vec2(size.x.max(min.x), size.y.max(min.y));
        if form.size == size {
            return None;
        }
        let mut next = form.clone();
        next.size = size;
        Some(self.commit_edit(next))
    }

    pub fn set_background(&mut self, form: &FormState, color: &str) -> Option<FormState> {
        if form.background == color {
            return None;
        }
        let mut next = form.clone();
        next.background = color.to_owned();
        Some(self.commit_edit(next))
    }

    pub fn set_background_image(
        &mut self,
        form: &FormState,
        image: Option<BackgroundImage>,
    ) -> Option<FormState> {
        if form.background_image == image {
            return None;
        }
        let mut next = form.clone();
        next.background_image = image;
        Some(self.commit_edit(next))
    }

    pub fn save_event_code(
        &mut self,
        form: &FormState,
        id: &WidgetId,
        code: EventCode,
    ) -> Option<FormState> {
        let next = events::save_event_code(form, id, code)?;
        Some(self.commit(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn designer() -> (Designer, FormState) {
        let form = FormState::default();
        (Designer::new(DesignerConfig::default(), &form), form)
    }

    #[test]
    fn test_discrete_ops_commit_and_select() {
        let (mut d, form) = designer();
        let form = d.add_widget(&form, "Button").unwrap();
        let id = d.selected().cloned().unwrap();
        assert_eq!(id.as_str(), "button1");
        assert_eq!(d.history().len(), 2);

        let form = d.duplicate_widget(&form, &id).unwrap();
        assert_eq!(d.selected().map(WidgetId::as_str), Some("button2"));
        assert_eq!(form.widgets.len(), 2);
        assert_eq!(d.history().len(), 3);
    }

    #[test]
    fn test_noops_do_not_commit() {
        let (mut d, form) = designer();
        assert!(d.add_widget(&form, "Treeview").is_none());
        assert!(d.delete_widget(&form, &WidgetId::new("ghost1")).is_none());
        assert!(d.set_title(&form, "Form1").is_none());
        assert_eq!(d.history().len(), 1);
        assert!(!d.can_undo());
    }

    #[test]
    fn test_drag_commits_once_on_end() {
        let (mut d, form) = designer();
        let mut form = d.add_widget(&form, "Button").unwrap();
        let id = d.selected().cloned().unwrap();
        let start = form.widget(&id).unwrap().pos;
        let grab = pos2(start.x, start.y + 30.0);
        assert!(d.begin_drag(&form, &id, grab));
        for step in 1..=5 {
            let p = grab + vec2(10.0 * step as f32, 8.0 * step as f32);
            form = d.update_gesture(&form, p).unwrap();
        }
        assert_eq!(d.history().len(), 2);
        assert!(d.end_gesture(&form));
        assert_eq!(d.history().len(), 3);

        let undone = d.undo().unwrap();
        assert_eq!(undone.widget(&id).unwrap().pos, start);
    }

    #[test]
    fn test_gesture_without_change_is_not_committed() {
        let (mut d, form) = designer();
        let form = d.add_widget(&form, "Label").unwrap();
        let id = d.selected().cloned().unwrap();
        let pos = form.widget(&id).unwrap().pos;
        d.begin_drag(&form, &id, pos2(pos.x, pos.y + 30.0));
        assert!(!d.end_gesture(&form));
        assert_eq!(d.history().len(), 2);
        assert_eq!(d.active_gesture(), None);
    }

    #[test]
    fn test_form_resize_gesture() {
        let (mut d, form) = designer();
        d.begin_resize_form(&form, FormEdge::SouthEast, pos2(500.0, 430.0));
        let form = d.update_gesture(&form, pos2(600.0, 530.0)).unwrap();
        assert_eq!(form.size, vec2(600.0, 500.0));
        assert!(d.end_gesture(&form));
        assert!(d.can_undo());
    }

    #[test]
    fn test_cancel_restores_committed() {
        let (mut d, form) = designer();
        let committed = d.add_widget(&form, "Button").unwrap();
        let id = d.selected().cloned().unwrap();
        d.begin_drag(&committed, &id, pos2(0.0, 30.0));
        let moved = d.update_gesture(&committed, pos2(300.0, 300.0)).unwrap();
        assert_ne!(moved, committed);
        assert_eq!(d.cancel_gesture(), committed);
        assert_eq!(d.active_gesture(), None);
    }

    #[test]
    fn test_undo_redo_fix_selection() {
        let (mut d, form) = designer();
        let form = d.add_widget(&form, "Entry").unwrap();
        assert!(d.selected().is_some());
        let empty = d.undo().unwrap();
        assert!(empty.widgets.is_empty());
        assert_eq!(d.selected(), None);
        assert_eq!(d.redo().unwrap(), form);
        assert!(d.redo().is_none());
    }

    #[test]
    fn test_undo_then_edit_truncates() {
        let (mut d, form) = designer();
        let form = d.add_widget(&form, "Button").unwrap();
        d.add_widget(&form, "Label").unwrap();
        let form = d.undo().unwrap();
        let form = d.set_title(&form, "Edited").unwrap();
        assert!(!d.can_redo());
        assert_eq!(form.widgets.len(), 1);
    }

    #[test]
    fn test_select_ignores_unknown() {
        let (mut d, form) = designer();
        let form = d.add_widget(&form, "Button").unwrap();
        assert!(!d.select(&form, Some(WidgetId::new("nope9"))));
        assert_eq!(d.selected().map(WidgetId::as_str), Some("button1"));
        assert!(d.select(&form, None));
        assert_eq!(d.selected(), None);
    }

    #[test]
    fn test_widget_at_prefers_topmost() {
        let (mut d, form) = designer();
        let form = d.add_widget(&form, "Frame").unwrap();
        let frame = d.selected().cloned().unwrap();
        let origin = form.widget(&frame).unwrap().pos;
        let form = d.drop_new_widget(&form, "Button", pos2(origin.x + 60.0, origin.y + 50.0)).unwrap();
        let button = d.selected().cloned().unwrap();
        let hit = form.widget(&button).unwrap().rect().center();
        assert_eq!(d.widget_at(&form, pos2(hit.x, hit.y + 30.0)), Some(button));
        assert_eq!(d.widget_at(&form, pos2(499.0, 429.0)), None);
    }

    #[test]
    fn test_set_prop_schema_only() {
        let (mut d, form) = designer();
        let form = d.add_widget(&form, "Button").unwrap();
        let id = d.selected().cloned().unwrap();
        let form = d.set_prop(&form, &id, "text", "Go".into()).unwrap();
        assert_eq!(form.widget(&id).unwrap().text_prop("text"), "Go");
        assert!(d.set_prop(&form, &id, "text", "Go".into()).is_none());
        assert!(d.set_prop(&form, &id, "bogus", "x".into()).is_none());
    }

    #[test]
    fn test_set_geometry_floors_but_does_not_clamp() {
        let (mut d, form) = designer();
        let form = d.add_widget(&form, "Button").unwrap();
        let id = d.selected().cloned().unwrap();
        let form = d
            .set_geometry(&form, &id, pos2(-5.0, 900.0), vec2(1000.0, -1.0))
            .unwrap();
        let w = form.widget(&id).unwrap();
        assert_eq!(w.pos, pos2(0.0, 900.0));
        assert_eq!(w.size, vec2(1000.0, 0.0));
    }

    #[test]
    fn test_form_settings() {
        let (mut d, form) = designer();
        let form = d.set_form_size(&form, vec2(10.0, 10.0)).unwrap();
        assert_eq!(form.size, vec2(200.0, 150.0));
        let form = d.set_background(&form, "#ffffff").unwrap();
        let image = Some(BackgroundImage::External("bg.png".into()));
        let form = d.set_background_image(&form, image.clone()).unwrap();
        assert_eq!(form.background_image, image);
        assert!(d.set_background_image(&form, image).is_none());
        assert_eq!(d.history().len(), 4);
    }

    #[test]
    fn test_save_event_code_commits() {
        let (mut d, form) = designer();
        let form = d.add_widget(&form, "Button").unwrap();
        let id = d.selected().cloned().unwrap();
        let code = EventCode::from([("click".to_owned(), "print(1)".to_owned())]);
        let form = d.save_event_code(&form, &id, code).unwrap();
        assert_eq!(form.widget(&id).unwrap().event_code["click"], "print(1)");
        assert_eq!(d.history().len(), 3);
    }

    #[test]
    fn test_held_back_edits_commit_once() {
        let (mut d, form) = designer();
        let mut form = d.add_widget(&form, "Button").unwrap();
        let id = d.selected().cloned().unwrap();
        let start = form.clone();
        d.begin_edit();
        for x in 1..=50 {
            form = d
                .set_geometry(&form, &id, pos2(x as f32, 16.0), vec2(100.0, 32.0))
                .unwrap();
        }
        form = d.set_title(&form, "Login").unwrap();
        assert_eq!(d.history().len(), 2);
        assert!(d.is_editing());

        assert!(d.end_edit(&form));
        assert!(!d.is_editing());
        assert_eq!(d.history().len(), 3);
        assert_eq!(d.undo().unwrap(), start);
        assert!(!d.end_edit(&form));
    }

    #[test]
    fn test_edit_without_change_is_not_committed() {
        let (mut d, form) = designer();
        d.begin_edit();
        assert!(d.set_title(&form, "Form1").is_none());
        assert!(!d.end_edit(&form));
        assert_eq!(d.history().len(), 1);
    }

    #[test]
    fn test_discrete_op_flushes_pending_edit() {
        let (mut d, form) = designer();
        d.begin_edit();
        let form = d.set_title(&form, "Draft").unwrap();
        let form = d.add_widget(&form, "Label").unwrap();
        assert!(!d.is_editing());
        assert_eq!(d.history().len(), 2);
        assert_eq!(d.history().current(), &form);
        assert_eq!(form.title, "Draft");
    }

    #[test]
    fn test_undo_discards_pending_edit() {
        let (mut d, form) = designer();
        let committed = d.set_title(&form, "Saved").unwrap();
        d.begin_edit();
        let draft = d.set_title(&committed, "Draft").unwrap();
        assert_ne!(draft, committed);
        assert_eq!(d.undo().unwrap(), committed);
        assert!(!d.is_editing());
        assert_eq!(d.undo().unwrap().title, "Form1");
    }

    #[test]
    fn test_reset_resumes_ids() {
        let (mut d, form) = designer();
        let form = d.add_widget(&form, "Button").unwrap();
        let form = d.add_widget(&form, "Button").unwrap();
        d.reset(&form);
        assert!(!d.can_undo());
        assert_eq!(d.selected(), None);
        let form = d.add_widget(&form, "Label").unwrap();
        assert!(form.widget(&WidgetId::new("label3")).is_some());
    }
}
