//! Core of a visual builder for single-window Tkinter forms.
//!
//! Widgets are placed on a simulated window with alignment snapping, every
//! discrete edit is undoable, and the form compiles to a standalone Python script.
//! The egui front end in `main.rs` is one host for this core.

pub mod catalog;
pub mod codegen;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod placement;
pub mod project;
pub mod session;
pub mod widget;

pub use catalog::{Catalog, Category, WidgetDef};
pub use codegen::generate;
pub use config::DesignerConfig;
pub use error::{Error, Result};
pub use events::{EventCode, EventCodeBuffer, EventCodeMap};
pub use history::History;
pub use placement::{FormEdge, PlacementEngine};
pub use project::ProjectFile;
pub use session::Designer;
pub use widget::props::PropValue;
pub use widget::{BackgroundImage, FormState, IdCounter, PlacedWidget, WidgetId};
