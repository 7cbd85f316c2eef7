//! Desktop front end for designing Tkinter forms.

mod app;
mod highlight;

use crate::app::TkRadBuilderApp;
use eframe::egui;
use tk_rad_builder::{DesignerConfig, FormState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Optional path to a JSON [`DesignerConfig`].
const CONFIG_ENV: &str = "TK_RAD_BUILDER_CONFIG";

fn load_config() -> DesignerConfig {
    let Some(path) = std::env::var_os(CONFIG_ENV) else {
        return DesignerConfig::default();
    };
    match DesignerConfig::load(&path) {
        Ok(config) => {
            info!(path = ?path, "designer config loaded");
            config
        }
        Err(e) => {
            warn!(error = %e, "falling back to default designer config");
            DesignerConfig::default()
        }
    }
}

fn initial_inner_size(config: &DesignerConfig) -> egui::Vec2 {
    let form = FormState::default();
    // Palette (180) and right panel (320) around the surface, plus padding.
    let w = form.size.x + 180.0 + 320.0 + 48.0;
    let h = form.size.y + config.title_bar_height + 96.0;
    egui::vec2(w, h)
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tk_rad_builder=info")),
        )
        .init();

    let config = load_config();
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_inner_size(initial_inner_size(&config))
        .with_resizable(true);

    eframe::run_native(
        "Tk RAD Builder",
        native_options,
        Box::new(move |_cc| Ok(Box::new(TkRadBuilderApp::new(config)))),
    )
}
