//! Static registry of the Tkinter widget kinds the designer can place.
//!
//! Each [`WidgetDef`] is the schema for one kind: its default geometry, the
//! ordered property table (with how each property reaches the generated
//! constructor), the events it exposes and the Tk variable it binds, if any.
//! The inspector and the code generator both read these tables; neither
//! branches on widget type.

use crate::widget::props::{PropKind, PropValue, is_color_key};
use egui::{Vec2, vec2};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Basic,
    Input,
    Display,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Basic, Category::Input, Category::Display];

    pub const fn display_name(&self) -> &'static str {
        match self {
            Category::Basic => "Basic",
            Category::Input => "Input",
            Category::Display => "Display",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Compile-time default of a property.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DefaultValue {
    Text(&'static str),
    Number(f64),
    Bool(bool),
}

impl DefaultValue {
    pub fn to_value(self) -> PropValue {
        match self {
            DefaultValue::Text(s) => PropValue::Text(s.to_owned()),
            DefaultValue::Number(n) => PropValue::Number(n),
            DefaultValue::Bool(b) => PropValue::Bool(b),
        }
    }
}

/// How a property value reaches the generated program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropEmit {
    /// Constructor keyword argument.
    Kwarg(&'static str),
    /// Newline-separated text emitted as a Python list for the keyword.
    ListKwarg(&'static str),
    /// Newline-separated text wrapped in `tk.Variable` as `listvariable=`.
    ListVariable,
    /// Text inserted after construction (`Text` widgets have no `text=` option).
    Insert,
    /// Initial value of the bound state variable.
    StateInit,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropDef {
    pub key: &'static str,
    pub default: DefaultValue,
    pub emit: PropEmit,
    /// Edited with a multi-line surface (item lists, text bodies).
    pub multiline: bool,
}

impl PropDef {
    const fn new(key: &'static str, default: DefaultValue, emit: PropEmit) -> Self {
        Self {
            key,
            default,
            emit,
            multiline: false,
        }
    }

    const fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// Kind used uniformly by editing surfaces and the generator.
    pub fn kind(&self) -> PropKind {
        match self.default {
            DefaultValue::Text(_) if is_color_key(self.key) => PropKind::Color,
            DefaultValue::Text(_) => PropKind::String,
            DefaultValue::Number(_) => PropKind::Number,
            DefaultValue::Bool(_) => PropKind::Boolean,
        }
    }
}

/// Arguments the generated handler receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventParams {
    None,
    /// Generic event object; `event=None` so command callbacks may omit it.
    Event,
    /// The new value, as passed by `Scale`'s command.
    Value,
}

impl EventParams {
    pub const fn signature(&self) -> &'static str {
        match self {
            EventParams::None => "",
            EventParams::Event => "event=None",
            EventParams::Value => "value",
        }
    }
}

/// How a handler is attached to its widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventBinding {
    /// `command=handler` constructor option.
    Command,
    /// `widget.bind(sequence, handler)` after placement.
    Bind(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventDef {
    pub name: &'static str,
    pub params: EventParams,
    pub binding: EventBinding,
}

/// Tk variable declared for widgets whose value lives in bound state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateBinding {
    pub var_class: &'static str,
    /// Property seeding the variable's initial value.
    pub init_key: &'static str,
    /// Constructor option receiving the variable.
    pub option: &'static str,
}

#[derive(Debug, PartialEq)]
pub struct WidgetDef {
    pub type_name: &'static str,
    pub category: Category,
    /// Constructor expression, e.g. `tk.Button`.
    pub class: &'static str,
    pub default_size: Vec2,
    pub props: &'static [PropDef],
    pub events: &'static [EventDef],
    pub state: Option<StateBinding>,
}

impl WidgetDef {
    pub fn prop(&self, key: &str) -> Option<&PropDef> {
        self.props.iter().find(|p| p.key == key)
    }

    pub fn event(&self, name: &str) -> Option<&EventDef> {
        self.events.iter().find(|e| e.name == name)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Prefix for minted widget ids; also a valid Python identifier.
    pub fn id_prefix(&self) -> String {
        self.type_name.to_ascii_lowercase()
    }
}

use DefaultValue::{Bool, Number, Text};
use PropEmit::{Insert, Kwarg, ListKwarg, ListVariable, StateInit};

const fn bind(name: &'static str, sequence: &'static str) -> EventDef {
    EventDef {
        name,
        params: EventParams::Event,
        binding: EventBinding::Bind(sequence),
    }
}

const fn command(name: &'static str, params: EventParams) -> EventDef {
    EventDef {
        name,
        params,
        binding: EventBinding::Command,
    }
}

const FG: PropDef = PropDef::new("fg", Text("#000000"), Kwarg("fg"));
const BG: PropDef = PropDef::new("bg", Text("#f0f0f0"), Kwarg("bg"));
const FIELD_BG: PropDef = PropDef::new("bg", Text("#ffffff"), Kwarg("bg"));

static WIDGETS: &[WidgetDef] = &[
    WidgetDef {
        type_name: "Button",
        category: Category::Basic,
        class: "tk.Button",
        default_size: vec2(100.0, 32.0),
        props: &[PropDef::new("text", Text("Button"), Kwarg("text")), FG, BG],
        events: &[command("click", EventParams::Event)],
        state: None,
    },
    WidgetDef {
        type_name: "Label",
        category: Category::Basic,
        class: "tk.Label",
        default_size: vec2(100.0, 24.0),
        props: &[
            PropDef::new("text", Text("Label"), Kwarg("text")),
            PropDef::new("anchor", Text("w"), Kwarg("anchor")),
            FG,
            BG,
        ],
        events: &[bind("click", "<Button-1>")],
        state: None,
    },
    WidgetDef {
        type_name: "Entry",
        category: Category::Input,
        class: "tk.Entry",
        default_size: vec2(160.0, 24.0),
        props: &[
            PropDef::new("text", Text(""), StateInit),
            PropDef::new("show", Text(""), Kwarg("show")),
            FG,
            FIELD_BG,
        ],
        events: &[bind("change", "<KeyRelease>"), bind("submit", "<Return>")],
        state: Some(StateBinding {
            var_class: "tk.StringVar",
            init_key: "text",
            option: "textvariable",
        }),
    },
    WidgetDef {
        type_name: "Text",
        category: Category::Input,
        class: "tk.Text",
        default_size: vec2(240.0, 96.0),
        props: &[
            PropDef::new("text", Text(""), Insert).multiline(),
            PropDef::new("wrap", Text("word"), Kwarg("wrap")),
            FG,
            FIELD_BG,
        ],
        events: &[bind("change", "<KeyRelease>")],
        state: None,
    },
    WidgetDef {
        type_name: "Checkbutton",
        category: Category::Input,
        class: "tk.Checkbutton",
        default_size: vec2(120.0, 24.0),
        props: &[
            PropDef::new("text", Text("Check"), Kwarg("text")),
            PropDef::new("checked", Bool(false), StateInit),
            FG,
            BG,
        ],
        events: &[command("toggle", EventParams::None)],
        state: Some(StateBinding {
            var_class: "tk.BooleanVar",
            init_key: "checked",
            option: "variable",
        }),
    },
    WidgetDef {
        type_name: "Combobox",
        category: Category::Input,
        class: "ttk.Combobox",
        default_size: vec2(160.0, 24.0),
        props: &[
            PropDef::new("items", Text("Red\nGreen\nBlue"), ListKwarg("values")).multiline(),
            PropDef::new("text", Text("Red"), StateInit),
            PropDef::new("state", Text("readonly"), Kwarg("state")),
        ],
        events: &[bind("select", "<<ComboboxSelected>>")],
        state: Some(StateBinding {
            var_class: "tk.StringVar",
            init_key: "text",
            option: "textvariable",
        }),
    },
    WidgetDef {
        type_name: "Spinbox",
        category: Category::Input,
        class: "tk.Spinbox",
        default_size: vec2(100.0, 24.0),
        props: &[
            PropDef::new("min", Number(0.0), Kwarg("from_")),
            PropDef::new("max", Number(10.0), Kwarg("to")),
            PropDef::new("increment", Number(1.0), Kwarg("increment")),
            PropDef::new("value", Number(0.0), StateInit),
        ],
        events: &[command("change", EventParams::Event)],
        state: Some(StateBinding {
            var_class: "tk.IntVar",
            init_key: "value",
            option: "textvariable",
        }),
    },
    WidgetDef {
        type_name: "Scale",
        category: Category::Input,
        class: "tk.Scale",
        default_size: vec2(200.0, 44.0),
        props: &[
            PropDef::new("min", Number(0.0), Kwarg("from_")),
            PropDef::new("max", Number(100.0), Kwarg("to")),
            PropDef::new("value", Number(50.0), StateInit),
            PropDef::new("orient", Text("horizontal"), Kwarg("orient")),
            BG,
        ],
        events: &[command("change", EventParams::Value)],
        state: Some(StateBinding {
            var_class: "tk.DoubleVar",
            init_key: "value",
            option: "variable",
        }),
    },
    WidgetDef {
        type_name: "Listbox",
        category: Category::Input,
        class: "tk.Listbox",
        default_size: vec2(160.0, 96.0),
        props: &[
            PropDef::new("items", Text("First\nSecond\nThird"), ListVariable).multiline(),
            PropDef::new("selectmode", Text("browse"), Kwarg("selectmode")),
            FG,
            FIELD_BG,
        ],
        events: &[bind("select", "<<ListboxSelect>>")],
        state: None,
    },
    WidgetDef {
        type_name: "Progressbar",
        category: Category::Display,
        class: "ttk.Progressbar",
        default_size: vec2(200.0, 20.0),
        props: &[
            PropDef::new("maximum", Number(100.0), Kwarg("maximum")),
            PropDef::new("value", Number(25.0), Kwarg("value")),
            PropDef::new("orient", Text("horizontal"), Kwarg("orient")),
        ],
        events: &[],
        state: None,
    },
    WidgetDef {
        type_name: "Separator",
        category: Category::Display,
        class: "ttk.Separator",
        default_size: vec2(200.0, 4.0),
        props: &[PropDef::new("orient", Text("horizontal"), Kwarg("orient"))],
        events: &[],
        state: None,
    },
    WidgetDef {
        type_name: "Frame",
        category: Category::Display,
        class: "tk.Frame",
        default_size: vec2(200.0, 120.0),
        props: &[
            PropDef::new("relief", Text("groove"), Kwarg("relief")),
            PropDef::new("borderwidth", Number(2.0), Kwarg("borderwidth")),
            BG,
        ],
        events: &[],
        state: None,
    },
];

/// Read-only lookup into the widget registry.
pub struct Catalog;

impl Catalog {
    pub fn lookup(type_name: &str) -> Option<&'static WidgetDef> {
        WIDGETS.iter().find(|d| d.type_name == type_name)
    }

    /// All entries in palette order.
    pub fn all() -> &'static [WidgetDef] {
        WIDGETS
    }

    pub fn by_category(category: Category) -> impl Iterator<Item = &'static WidgetDef> {
        WIDGETS.iter().filter(move |d| d.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_known_and_unknown() {
        let button = Catalog::lookup("Button").unwrap();
        assert_eq!(button.class, "tk.Button");
        assert!(Catalog::lookup("button").is_none());
        assert!(Catalog::lookup("Treeview").is_none());
    }

    #[test]
    fn test_type_names_unique() {
        let names: HashSet<_> = Catalog::all().iter().map(|d| d.type_name).collect();
        assert_eq!(names.len(), Catalog::all().len());
    }

    #[test]
    fn test_default_sizes_positive() {
        for def in Catalog::all() {
            assert!(def.default_size.x > 0.0, "{} width", def.type_name);
            assert!(def.default_size.y > 0.0, "{} height", def.type_name);
        }
    }

    #[test]
    fn test_state_init_key_exists_in_schema() {
        for def in Catalog::all() {
            if let Some(state) = def.state {
                let prop = def.prop(state.init_key).unwrap();
                assert_eq!(prop.emit, PropEmit::StateInit, "{}", def.type_name);
            }
        }
    }

    #[test]
    fn test_prop_keys_unique_per_widget() {
        for def in Catalog::all() {
            let keys: HashSet<_> = def.props.iter().map(|p| p.key).collect();
            assert_eq!(keys.len(), def.props.len(), "{}", def.type_name);
        }
    }

    #[test]
    fn test_color_kind_inferred_from_key() {
        let label = Catalog::lookup("Label").unwrap();
        assert_eq!(label.prop("fg").unwrap().kind(), PropKind::Color);
        assert_eq!(label.prop("bg").unwrap().kind(), PropKind::Color);
        assert_eq!(label.prop("text").unwrap().kind(), PropKind::String);
        let scale = Catalog::lookup("Scale").unwrap();
        assert_eq!(scale.prop("value").unwrap().kind(), PropKind::Number);
        let check = Catalog::lookup("Checkbutton").unwrap();
        assert_eq!(check.prop("checked").unwrap().kind(), PropKind::Boolean);
    }

    #[test]
    fn test_display_widgets_are_inert() {
        for def in Catalog::by_category(Category::Display) {
            assert!(!def.has_events(), "{}", def.type_name);
        }
    }

    #[test]
    fn test_scale_change_receives_value() {
        let scale = Catalog::lookup("Scale").unwrap();
        let change = scale.event("change").unwrap();
        assert_eq!(change.params, EventParams::Value);
        assert_eq!(change.binding, EventBinding::Command);
    }

    #[test]
    fn test_id_prefix_is_identifier() {
        for def in Catalog::all() {
            let prefix = def.id_prefix();
            assert!(prefix.chars().all(|c| c.is_ascii_lowercase()));
        }
    }
}
