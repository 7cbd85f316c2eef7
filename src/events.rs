//! Boundary between widgets and the event-code editing surface.
//!
//! Event code is opaque text: it is stored and emitted verbatim and never parsed.

use crate::catalog::EventParams;
use crate::widget::{FormState, PlacedWidget, WidgetId};
use std::collections::BTreeMap;
use tracing::debug;

/// Event name to handler body.
pub type EventCode = BTreeMap<String, String>;

/// Unsaved event code by widget, consulted by the generator before the code
/// stored on each widget.
pub type EventCodeMap = BTreeMap<WidgetId, EventCode>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSlot {
    pub name: &'static str,
    pub params: EventParams,
    pub code: String,
}

/// Declared events of `widget` with their current code, in catalog order.
/// Widgets without events (or of an unknown type) yield nothing.
pub fn event_slots(widget: &PlacedWidget) -> Vec<EventSlot> {
    let Some(def) = widget.def() else {
        return Vec::new();
    };
    def.events
        .iter()
        .map(|e| EventSlot {
            name: e.name,
            params: e.params,
            code: widget.event_code.get(e.name).cloned().unwrap_or_default(),
        })
        .collect()
}

/// Replaces the widget's event code with `code`, keeping only declared events.
/// `None` when the widget is unknown, declares no events, or nothing changed.
pub fn save_event_code(form: &FormState, id: &WidgetId, code: EventCode) -> Option<FormState> {
    let widget = form.widget(id)?;
    let def = widget.def()?;
    if !def.has_events() {
        return None;
    }
    let (merged, undeclared): (EventCode, EventCode) = code
        .into_iter()
        .partition(|(name, _)| def.event(name).is_some());
    if !undeclared.is_empty() {
        let names: Vec<&str> = undeclared.keys().map(String::as_str).collect();
        debug!(%id, ?names, "dropping code for undeclared events");
    }
    if merged == widget.event_code {
        return None;
    }
    let mut next = form.clone();
    if let Some(w) = next.widget_mut(id) {
        w.event_code = merged;
    }
    debug!(%id, "event code saved");
    Some(next)
}

/// Edits in progress for the widget open in the event editor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventCodeBuffer {
    widget: Option<WidgetId>,
    slots: Vec<EventSlot>,
    dirty: bool,
}

impl EventCodeBuffer {
    /// Loads `widget`'s slots unless it is already open with unsaved edits.
    pub fn open(&mut self, widget: &PlacedWidget) {
        if self.widget.as_ref() == Some(&widget.id) && self.dirty {
            return;
        }
        self.widget = Some(widget.id.clone());
        self.slots = event_slots(widget);
        self.dirty = false;
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn widget(&self) -> Option<&WidgetId> {
        self.widget.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn slots(&self) -> &[EventSlot] {
        &self.slots
    }

    pub fn set(&mut self, event: &str, code: impl Into<String>) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.name == event) {
            slot.code = code.into();
            self.dirty = true;
        }
    }

    /// Full replacement mapping for [`save_event_code`]. Empty slots are left
    /// out, matching a widget that never had code for them.
    pub fn to_code(&self) -> EventCode {
        self.slots
            .iter()
            .filter(|s| !s.code.is_empty())
            .map(|s| (s.name.to_owned(), s.code.clone()))
            .collect()
    }

    /// Unsaved edits in the shape the generator accepts. Every slot is present,
    /// so a slot cleared in the editor overrides the stored code with an empty body.
    pub fn overrides(&self) -> EventCodeMap {
        match &self.widget {
            Some(id) if self.dirty => {
                let code = self
                    .slots
                    .iter()
                    .map(|s| (s.name.to_owned(), s.code.clone()))
                    .collect();
                BTreeMap::from([(id.clone(), code)])
            }
            _ => EventCodeMap::new(),
        }
    }

    /// Marks the buffer saved after the host committed [`Self::to_code`].
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}
