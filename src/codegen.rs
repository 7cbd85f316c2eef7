//! Emits a flat Python/Tkinter script for a form.
//!
//! Generation is a pure function of the form and the event-code overrides.
//! Identical input gives byte-identical output. Every property is rendered through
//! the catalog schema, so adding a widget kind never touches this module.

use crate::catalog::{EventBinding, PropEmit, WidgetDef};
use crate::events::EventCodeMap;
use crate::widget::props::PropValue;
use crate::widget::{BackgroundImage, FormState, PlacedWidget, escape};
use tracing::warn;

const INDENT: &str = "    ";

/// Generates the script for `form`. Code in `overrides` replaces the code
/// stored on the matching widget event.
pub fn generate(form: &FormState, overrides: &EventCodeMap) -> String {
    let widgets: Vec<(&PlacedWidget, &'static WidgetDef)> = form
        .widgets
        .iter()
        .filter_map(|w| match w.def() {
            Some(def) => Some((w, def)),
            None => {
                warn!(id = %w.id, kind = %w.kind, "skipping widget of unknown type");
                None
            }
        })
        .collect();

    let mut out = String::new();
    out.push_str("# Generated by tk-rad-builder\n");
    out.push_str("import tkinter as tk\n");
    out.push_str("from tkinter import ttk\n");

    for (w, def) in &widgets {
        for event in def.events {
            let code = overrides
                .get(&w.id)
                .and_then(|m| m.get(event.name))
                .or_else(|| w.event_code.get(event.name))
                .map(String::as_str)
                .unwrap_or("");
            out.push_str("\n\n");
            out.push_str(&format!(
                "def {}({}):\n",
                handler_name(w, event.name),
                event.params.signature()
            ));
            out.push_str(&indent_body(code));
        }
    }

    out.push_str("\n\n");
    emit_window(form, &mut out);

    let stateful: Vec<_> = widgets.iter().filter(|(_, def)| def.state.is_some()).collect();
    if !stateful.is_empty() {
        out.push('\n');
        for (w, def) in stateful {
            if let Some(state) = def.state {
                let init = w.prop(state.init_key).map(|v| literal(&v)).unwrap_or_default();
                out.push_str(&format!(
                    "{} = {}(value={})\n",
                    var_name(w),
                    state.var_class,
                    init
                ));
            }
        }
    }

    for (w, def) in &widgets {
        out.push('\n');
        emit_widget(w, def, &mut out);
    }

    out.push('\n');
    out.push_str("root.mainloop()\n");
    out
}

fn emit_window(form: &FormState, out: &mut String) {
    out.push_str("root = tk.Tk()\n");
    out.push_str(&format!("root.title(\"{}\")\n", escape(&form.title)));
    out.push_str(&format!(
        "root.geometry(\"{}x{}\")\n",
        pixels(form.size.x).max(1),
        pixels(form.size.y).max(1)
    ));
    out.push_str("root.resizable(False, False)\n");
    if !form.has_default_background() {
        out.push_str(&format!("root.configure(bg=\"{}\")\n", escape(&form.background)));
    }
    match &form.background_image {
        Some(BackgroundImage::External(path)) => {
            out.push_str(&format!(
                "bg_image = tk.PhotoImage(file=\"{}\")\n",
                escape(path)
            ));
            out.push_str("bg_label = tk.Label(root, image=bg_image, borderwidth=0)\n");
            out.push_str("bg_label.place(x=0, y=0, relwidth=1, relheight=1)\n");
        }
        Some(BackgroundImage::Embedded(_)) => {
            out.push_str("# Embedded background images are not exported; use an image file.\n");
        }
        None => {}
    }
}

fn emit_widget(w: &PlacedWidget, def: &WidgetDef, out: &mut String) {
    let mut args = vec!["root".to_owned()];
    let mut inserted = None;
    for prop in def.props {
        let Some(value) = w.prop(prop.key) else {
            continue;
        };
        match prop.emit {
            PropEmit::Kwarg(name) => args.push(format!("{name}={}", literal(&value))),
            PropEmit::ListKwarg(name) => args.push(format!("{name}={}", list_literal(&value))),
            PropEmit::ListVariable => args.push(format!(
                "listvariable=tk.Variable(value={})",
                list_literal(&value)
            )),
            PropEmit::Insert => inserted = Some(value),
            PropEmit::StateInit => {}
        }
    }
    if let Some(state) = def.state {
        args.push(format!("{}={}", state.option, var_name(w)));
    }
    for event in def.events {
        if event.binding == EventBinding::Command {
            args.push(format!("command={}", handler_name(w, event.name)));
        }
    }

    let id = &w.id;
    out.push_str(&format!("{id} = {}({})\n", def.class, args.join(", ")));
    out.push_str(&format!(
        "{id}.place(x={}, y={}, width={}, height={})\n",
        coord(w.pos.x),
        coord(w.pos.y),
        coord(w.size.x),
        coord(w.size.y)
    ));
    if let Some(value) = inserted
        && !value.to_string().is_empty()
    {
        out.push_str(&format!("{id}.insert(\"1.0\", {})\n", literal_text(&value)));
    }
    for event in def.events {
        if let EventBinding::Bind(sequence) = event.binding {
            out.push_str(&format!(
                "{id}.bind(\"{}\", {})\n",
                escape(sequence),
                handler_name(w, event.name)
            ));
        }
    }
}

fn handler_name(w: &PlacedWidget, event: &str) -> String {
    format!("{}_{}", w.id, event)
}

fn var_name(w: &PlacedWidget) -> String {
    format!("{}_var", w.id)
}

/// Handler body one level deep, or `pass` when there is no code.
fn indent_body(code: &str) -> String {
    if code.trim().is_empty() {
        return format!("{INDENT}pass\n");
    }
    let mut body = String::new();
    for line in code.lines() {
        if !line.trim().is_empty() {
            body.push_str(INDENT);
            body.push_str(line);
        }
        body.push('\n');
    }
    body
}

/// Python literal for a property value.
fn literal(value: &PropValue) -> String {
    match value {
        PropValue::Text(s) => format!("\"{}\"", escape(s)),
        PropValue::Number(n) => number(*n),
        PropValue::Bool(true) => "True".to_owned(),
        PropValue::Bool(false) => "False".to_owned(),
    }
}

/// String literal regardless of the stored kind.
fn literal_text(value: &PropValue) -> String {
    format!("\"{}\"", escape(&value.to_string()))
}

/// Newline-separated items as a Python list of strings.
fn list_literal(value: &PropValue) -> String {
    let text = value.to_string();
    let items: Vec<String> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| format!("\"{}\"", escape(l)))
        .collect();
    format!("[{}]", items.join(", "))
}

fn number(n: f64) -> String {
    if n.is_nan() {
        "float(\"nan\")".to_owned()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("float(\"{sign}inf\")")
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Geometry value at `f32` precision, so 10.1 stays `10.1`.
fn coord(v: f32) -> String {
    if v.is_finite() && v.fract() != 0.0 {
        format!("{v}")
    } else {
        number(f64::from(v))
    }
}

fn pixels(v: f32) -> i64 {
    v.round() as i64
}
