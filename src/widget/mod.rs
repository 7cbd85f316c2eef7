pub mod props;

use crate::catalog::{Catalog, WidgetDef};
use egui::{Pos2, Rect, Vec2, pos2};
use props::PropValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const DEFAULT_BACKGROUND: &str = "#f0f0f0";

const RESERVED_NAMES: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield", "root", "tk", "ttk", "bg_image", "bg_label",
];

/// Widget identifier, also the variable name in the generated script.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Usable as a Python variable in the generated script: an identifier that is
    /// neither a keyword nor a name the script itself defines.
    pub fn is_identifier_safe(&self) -> bool {
        let mut chars = self.0.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !RESERVED_NAMES.contains(&self.0.as_str())
    }

    /// Numeric suffix of a minted id (`button12` -> 12).
    fn counter_suffix(&self) -> Option<u64> {
        let digits = self.0.trim_start_matches(|c: char| !c.is_ascii_digit());
        digits.parse().ok()
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic id source owned by one designer session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdCounter {
    next: u64,
}

impl Default for IdCounter {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A counter that continues past every id already present in `form`.
    pub fn resume_after(form: &FormState) -> Self {
        let max = form
            .widgets
            .iter()
            .filter_map(|w| w.id.counter_suffix())
            .max()
            .unwrap_or(0);
        Self { next: max + 1 }
    }

    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Mints `{prefix}{n}`, skipping any value that would collide in `form`.
    pub fn mint(&mut self, def: &WidgetDef, form: &FormState) -> WidgetId {
        let prefix = def.id_prefix();
        loop {
            let id = WidgetId(format!("{prefix}{}", self.next));
            self.next += 1;
            if form.widget(&id).is_none() {
                return id;
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedWidget {
    pub id: WidgetId,
    /// Catalog type name.
    pub kind: String,
    pub pos: Pos2,  // Top-left relative to the form content area
    pub size: Vec2,
    pub props: BTreeMap<String, PropValue>,
    #[serde(default)]
    pub event_code: BTreeMap<String, String>,
}

impl PlacedWidget {
    /// Instance with the catalog's default size and properties at `pos`.
    pub fn from_def(id: WidgetId, def: &WidgetDef, pos: Pos2) -> Self {
        let props = def
            .props
            .iter()
            .map(|p| (p.key.to_owned(), p.default.to_value()))
            .collect();
        Self {
            id,
            kind: def.type_name.to_owned(),
            pos,
            size: def.default_size,
            props,
            event_code: BTreeMap::new(),
        }
    }

    pub fn def(&self) -> Option<&'static WidgetDef> {
        Catalog::lookup(&self.kind)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.pos, self.size)
    }

    /// Explicit value, falling back to the catalog default.
    pub fn prop(&self, key: &str) -> Option<PropValue> {
        self.props.get(key).cloned().or_else(|| {
            self.def()
                .and_then(|d| d.prop(key))
                .map(|p| p.default.to_value())
        })
    }

    pub fn text_prop(&self, key: &str) -> String {
        match self.prop(key) {
            Some(PropValue::Text(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum BackgroundImage {
    /// Inline image data (for instance a data URI); not re-emitted by the generator.
    Embedded(String),
    /// Path or URL loaded at runtime by the generated program.
    External(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub title: String,
    pub size: Vec2,
    pub background: String,
    #[serde(default)]
    pub background_image: Option<BackgroundImage>,
    /// Paint order.
    pub widgets: Vec<PlacedWidget>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            title: "Form1".into(),
            size: Vec2::new(500.0, 400.0),
            background: DEFAULT_BACKGROUND.into(),
            background_image: None,
            widgets: Vec::new(),
        }
    }
}

impl FormState {
    pub fn widget(&self, id: &WidgetId) -> Option<&PlacedWidget> {
        self.widgets.iter().find(|w| &w.id == id)
    }

    pub fn widget_mut(&mut self, id: &WidgetId) -> Option<&mut PlacedWidget> {
        self.widgets.iter_mut().find(|w| &w.id == id)
    }

    pub fn index_of(&self, id: &WidgetId) -> Option<usize> {
        self.widgets.iter().position(|w| &w.id == id)
    }

    /// Content-area rectangle in form coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_min_size(Pos2::ZERO, self.size)
    }

    pub fn has_default_background(&self) -> bool {
        self.background.eq_ignore_ascii_case(DEFAULT_BACKGROUND)
    }

    /// First widget id that would break the generated script, if any.
    pub fn id_problem(&self) -> Option<String> {
        let mut seen = BTreeSet::new();
        for w in &self.widgets {
            if !w.id.is_identifier_safe() {
                return Some(format!("widget id `{}` is not a valid identifier", w.id));
            }
            if !seen.insert(&w.id) {
                return Some(format!("widget id `{}` is used more than once", w.id));
            }
        }
        None
    }
}

pub(crate) fn snap_pos_with_grid(p: Pos2, grid: f32) -> Pos2 {
    pos2(snap_with_grid(p.x, grid), snap_with_grid(p.y, grid))
}

pub(crate) fn snap_with_grid(v: f32, grid: f32) -> f32 {
    (v / grid).round() * grid
}

/// Escapes text for a double-quoted Python string literal.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    #[test]
    fn test_snap_pos_with_grid() {
        // Grid of 4, the placement default; halves round away from zero.
        assert_eq!(snap_pos_with_grid(pos2(101.0, 103.0), 4.0), pos2(100.0, 104.0));
        assert_eq!(snap_pos_with_grid(pos2(2.0, 1.9), 4.0), pos2(4.0, 0.0));
        // Negative proposals (a drag past the left or top edge) snap before clamping.
        assert_eq!(snap_pos_with_grid(pos2(-5.0, -1.0), 4.0), pos2(-4.0, 0.0));
        assert_eq!(snap_pos_with_grid(pos2(-6.0, -10.0), 4.0), pos2(-8.0, -12.0));
        // A sanitized grid of 1 only rounds.
        assert_eq!(snap_pos_with_grid(pos2(10.4, 10.6), 1.0), pos2(10.0, 11.0));
    }

    #[test]
    fn test_escape_python_literals() {
        assert_eq!(escape("Go"), "Go");
        assert_eq!(escape(r"C:\tk\forms"), r"C:\\tk\\forms");
        assert_eq!(escape("Say \"hi\""), r#"Say \"hi\""#);
        assert_eq!(escape("line1\r\nline2"), r"line1\r\nline2");
        // Single quotes and tabs are legal inside a double-quoted literal.
        assert_eq!(escape("it's\tok"), "it's\tok");
    }

    #[test]
    fn test_identifier_safe_ids() {
        for ok in ["button1", "_private", "Label2", "text_box3"] {
            assert!(WidgetId::new(ok).is_identifier_safe(), "{ok}");
        }
        for bad in ["", "my button", "1button", "button-1", "class", "root", "ttk", "é1"] {
            assert!(!WidgetId::new(bad).is_identifier_safe(), "{bad}");
        }
    }

    #[test]
    fn test_id_problem_reports_bad_and_duplicate_ids() {
        let def = Catalog::lookup("Button").unwrap();
        let mut form = FormState::default();
        form.widgets
            .push(PlacedWidget::from_def(WidgetId::new("button1"), def, Pos2::ZERO));
        assert_eq!(form.id_problem(), None);

        let mut dup = form.clone();
        dup.widgets
            .push(PlacedWidget::from_def(WidgetId::new("button1"), def, Pos2::ZERO));
        assert!(dup.id_problem().unwrap().contains("more than once"));

        form.widgets
            .push(PlacedWidget::from_def(WidgetId::new("my button"), def, Pos2::ZERO));
        assert!(form.id_problem().unwrap().contains("`my button`"));
    }

    #[test]
    fn test_from_def_seeds_defaults() {
        let def = Catalog::lookup("Button").unwrap();
        let w = PlacedWidget::from_def(WidgetId::new("button1"), def, pos2(8.0, 12.0));
        assert_eq!(w.size, def.default_size);
        assert_eq!(w.props.len(), def.props.len());
        assert_eq!(w.text_prop("text"), "Button");
        assert!(w.event_code.is_empty());
    }

    #[test]
    fn test_prop_falls_back_to_catalog_default() {
        let def = Catalog::lookup("Label").unwrap();
        let mut w = PlacedWidget::from_def(WidgetId::new("label1"), def, Pos2::ZERO);
        w.props.clear();
        assert_eq!(w.prop("text"), Some(PropValue::from("Label")));
        assert_eq!(w.prop("nonexistent"), None);
    }

    #[test]
    fn test_id_counter_mints_lowercase_suffixed() {
        let form = FormState::default();
        let mut ids = IdCounter::new();
        let def = Catalog::lookup("Checkbutton").unwrap();
        assert_eq!(ids.mint(def, &form).as_str(), "checkbutton1");
        assert_eq!(ids.mint(def, &form).as_str(), "checkbutton2");
        assert_eq!(ids.peek(), 3);
    }

    #[test]
    fn test_id_counter_skips_collisions() {
        let def = Catalog::lookup("Label").unwrap();
        let mut form = FormState::default();
        form.widgets
            .push(PlacedWidget::from_def(WidgetId::new("label1"), def, Pos2::ZERO));
        let mut ids = IdCounter::new();
        assert_eq!(ids.mint(def, &form).as_str(), "label2");
    }

    #[test]
    fn test_id_counter_resume_after() {
        let def = Catalog::lookup("Label").unwrap();
        let mut form = FormState::default();
        form.widgets
            .push(PlacedWidget::from_def(WidgetId::new("label7"), def, Pos2::ZERO));
        form.widgets
            .push(PlacedWidget::from_def(WidgetId::new("label3"), def, Pos2::ZERO));
        assert_eq!(IdCounter::resume_after(&form).peek(), 8);
        assert_eq!(IdCounter::resume_after(&FormState::default()).peek(), 1);
    }

    #[test]
    fn test_form_default_background() {
        let mut form = FormState::default();
        assert!(form.has_default_background());
        form.background = "#F0F0F0".into();
        assert!(form.has_default_background());
        form.background = "#ffffff".into();
        assert!(!form.has_default_background());
        assert_eq!(form.bounds().size(), vec2(500.0, 400.0));
    }

    #[test]
    fn test_form_state_json_round_trip() {
        let def = Catalog::lookup("Entry").unwrap();
        let mut form = FormState::default();
        let mut w = PlacedWidget::from_def(WidgetId::new("entry1"), def, pos2(4.0, 8.0));
        w.event_code.insert("change".into(), "print(event)".into());
        form.widgets.push(w);
        form.background_image = Some(BackgroundImage::External("bg.png".into()));
        let json = serde_json::to_string(&form).unwrap();
        let back: FormState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, form);
    }
}
