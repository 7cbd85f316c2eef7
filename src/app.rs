use crate::highlight::{self, Highlighter};
use egui::{Align2, Color32, CornerRadius, FontId, Id, Pos2, Rect, Sense, Stroke, StrokeKind, pos2, vec2};
use std::path::PathBuf;
use std::time::Instant;
use tk_rad_builder::catalog::{Catalog, Category, PropDef};
use tk_rad_builder::events::EventCodeMap;
use tk_rad_builder::placement::{FormEdge, GestureKind};
use tk_rad_builder::project::{self, ProjectFile};
use tk_rad_builder::widget::props::{PropKind, format_hex_color, parse_hex_color};
use tk_rad_builder::{
    BackgroundImage, Designer, DesignerConfig, EventCodeBuffer, FormState, PlacedWidget, PropValue,
    WidgetId, codegen,
};
use tracing::info;

const HANDLE: f32 = 8.0;
const EDGE_GRAB: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
enum RightTab {
    #[default]
    Inspector,
    Events,
    Code,
}

/// What the pointer grabbed on the design surface.
enum Grab {
    FormEdge(FormEdge),
    WidgetHandle(WidgetId),
    Widget(WidgetId),
}

pub(crate) struct TkRadBuilderApp {
    form: FormState,
    designer: Designer,
    events: EventCodeBuffer,
    palette_open: bool,
    /// Palette entry being dragged onto the surface.
    spawning: Option<&'static str>,
    /// Screen position of the surface's top-left corner, from the last frame.
    surface_origin: Pos2,
    current_file: Option<PathBuf>,
    status_message: Option<(String, Instant)>,
    highlighter: Highlighter,
    syntax_highlighting: bool,
    /// Script cache, keyed by the inputs it was generated from.
    generated: Option<(FormState, EventCodeMap, String)>,
    right_panel_tab: RightTab,
}

impl TkRadBuilderApp {
    pub(crate) fn new(config: DesignerConfig) -> Self {
        let form = FormState::default();
        Self {
            designer: Designer::new(config, &form),
            form,
            events: EventCodeBuffer::default(),
            palette_open: true,
            spawning: None,
            surface_origin: Pos2::ZERO,
            current_file: None,
            status_message: None,
            highlighter: Highlighter::new(),
            syntax_highlighting: true,
            generated: None,
            right_panel_tab: RightTab::default(),
        }
    }

    fn apply(&mut self, next: Option<FormState>) -> bool {
        match next {
            Some(form) => {
                self.form = form;
                true
            }
            None => false,
        }
    }

    fn set_status(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    fn title_bar_height(&self) -> f32 {
        self.designer.config().title_bar_height
    }

    fn content_rect(&self) -> Rect {
        Rect::from_min_size(
            self.surface_origin + vec2(0.0, self.title_bar_height()),
            self.form.size,
        )
    }

    fn to_surface(&self, screen: Pos2) -> Pos2 {
        (screen - self.surface_origin).to_pos2()
    }

    fn new_project(&mut self) {
        self.form = FormState::default();
        self.designer.reset(&self.form);
        self.events.close();
        self.current_file = None;
        self.set_status("New project created".into());
    }

    fn save_project(&mut self, path: PathBuf) {
        match ProjectFile::new(self.form.clone()).save(&path) {
            Ok(()) => {
                self.set_status(format!("Saved to {}", path.display()));
                self.current_file = Some(path);
            }
            Err(e) => self.set_status(format!("Save failed: {e}")),
        }
    }

    fn load_project(&mut self, path: PathBuf) {
        match ProjectFile::load(&path) {
            Ok(project) => {
                self.form = project.form;
                self.designer.reset(&self.form);
                self.events.close();
                self.set_status(format!("Loaded {}", path.display()));
                self.current_file = Some(path);
            }
            Err(e) => self.set_status(format!("Load failed: {e}")),
        }
    }

    fn save_as(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Tk RAD Project", &["json"])
            .set_file_name("form.json")
            .save_file()
        {
            self.save_project(path);
        }
    }

    fn export(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Python", &["py"])
            .set_file_name("form.py")
            .save_file()
        else {
            return;
        };
        match project::export_script(&self.form, &self.events.overrides(), &path) {
            Ok(()) => self.set_status(format!("Exported {}", path.display())),
            Err(e) => self.set_status(format!("Export failed: {e}")),
        }
    }

    fn undo(&mut self) {
        let next = self.designer.undo();
        if self.apply(next) {
            self.set_status("Undo".into());
        }
    }

    fn redo(&mut self) {
        let next = self.designer.redo();
        if self.apply(next) {
            self.set_status("Redo".into());
        }
    }

    fn with_selected(
        &mut self,
        op: impl FnOnce(&mut Designer, &FormState, &WidgetId) -> Option<FormState>,
    ) {
        let Some(id) = self.designer.selected().cloned() else {
            return;
        };
        let next = op(&mut self.designer, &self.form, &id);
        self.apply(next);
    }

    fn shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (undo, redo, duplicate, delete, nudge, front, back, cancel) = ctx.input(|i| {
            let cmd = i.modifiers.command;
            let undo = cmd && !i.modifiers.shift && i.key_pressed(egui::Key::Z);
            let redo = cmd
                && (i.key_pressed(egui::Key::Y) || (i.modifiers.shift && i.key_pressed(egui::Key::Z)));
            let duplicate = cmd && i.key_pressed(egui::Key::D);
            let delete = i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace);
            let step = if i.modifiers.shift { 10.0 } else { 1.0 };
            let mut nudge = egui::Vec2::ZERO;
            if i.key_pressed(egui::Key::ArrowUp) {
                nudge.y -= step;
            }
            if i.key_pressed(egui::Key::ArrowDown) {
                nudge.y += step;
            }
            if i.key_pressed(egui::Key::ArrowLeft) {
                nudge.x -= step;
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                nudge.x += step;
            }
            // ] = bring to front, [ = send to back
            let front = i.key_pressed(egui::Key::CloseBracket);
            let back = i.key_pressed(egui::Key::OpenBracket);
            let cancel = i.key_pressed(egui::Key::Escape);
            (undo, redo, duplicate, delete, nudge, front, back, cancel)
        });

        if cancel && self.designer.active_gesture().is_some() {
            self.form = self.designer.cancel_gesture();
            return;
        }
        if undo {
            self.undo();
        }
        if redo {
            self.redo();
        }
        if duplicate {
            self.with_selected(|d, f, id| d.duplicate_widget(f, id));
        }
        if delete {
            self.with_selected(|d, f, id| d.delete_widget(f, id));
        }
        if nudge != egui::Vec2::ZERO {
            self.with_selected(|d, f, id| d.nudge_widget(f, id, nudge));
        }
        if front {
            self.with_selected(|d, f, id| d.bring_to_front(f, id));
        }
        if back {
            self.with_selected(|d, f, id| d.send_to_back(f, id));
        }
    }

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("New Project").clicked() {
                    self.new_project();
                    ui.close_kind(egui::UiKind::Menu);
                }
                ui.separator();
                if ui.button("Open...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Tk RAD Project", &["json"])
                        .pick_file()
                    {
                        self.load_project(path);
                    }
                    ui.close_kind(egui::UiKind::Menu);
                }
                if ui.button("Save").clicked() {
                    match self.current_file.clone() {
                        Some(path) => self.save_project(path),
                        None => self.save_as(),
                    }
                    ui.close_kind(egui::UiKind::Menu);
                }
                if ui.button("Save As...").clicked() {
                    self.save_as();
                    ui.close_kind(egui::UiKind::Menu);
                }
                ui.separator();
                if ui
                    .button("Export Python...")
                    .on_hover_text("Write the generated Tkinter script")
                    .clicked()
                {
                    self.export();
                    ui.close_kind(egui::UiKind::Menu);
                }
            });

            ui.menu_button("Edit", |ui| {
                if ui
                    .add_enabled(self.designer.can_undo(), egui::Button::new("Undo"))
                    .on_hover_text("Ctrl+Z")
                    .clicked()
                {
                    self.undo();
                    ui.close_kind(egui::UiKind::Menu);
                }
                if ui
                    .add_enabled(self.designer.can_redo(), egui::Button::new("Redo"))
                    .on_hover_text("Ctrl+Y / Ctrl+Shift+Z")
                    .clicked()
                {
                    self.redo();
                    ui.close_kind(egui::UiKind::Menu);
                }
                ui.separator();
                ui.add_enabled_ui(self.designer.selected().is_some(), |ui| {
                    if ui.button("Duplicate").on_hover_text("Ctrl+D").clicked() {
                        self.with_selected(|d, f, id| d.duplicate_widget(f, id));
                        ui.close_kind(egui::UiKind::Menu);
                    }
                    if ui.button("Delete").on_hover_text("Del").clicked() {
                        self.with_selected(|d, f, id| d.delete_widget(f, id));
                        ui.close_kind(egui::UiKind::Menu);
                    }
                    ui.separator();
                    if ui.button("Bring to Front").on_hover_text("]").clicked() {
                        self.with_selected(|d, f, id| d.bring_to_front(f, id));
                        ui.close_kind(egui::UiKind::Menu);
                    }
                    if ui.button("Send to Back").on_hover_text("[").clicked() {
                        self.with_selected(|d, f, id| d.send_to_back(f, id));
                        ui.close_kind(egui::UiKind::Menu);
                    }
                });
            });

            ui.menu_button("View", |ui| {
                ui.checkbox(&mut self.palette_open, "Palette");
                ui.checkbox(&mut self.syntax_highlighting, "Syntax Highlighting");
            });
        });
    }

    fn status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let cfg = self.designer.config();
            ui.label(format!(
                "{} widgets | {}x{} | grid {} | snap {}",
                self.form.widgets.len(),
                self.form.size.x,
                self.form.size.y,
                cfg.grid_size,
                cfg.snap_threshold,
            ));
            if let Some((msg, time)) = &self.status_message {
                if time.elapsed().as_secs() < 3 {
                    ui.separator();
                    ui.label(msg);
                } else {
                    self.status_message = None;
                }
            }
        });
    }

    fn palette_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Palette");
        ui.separator();
        ui.label("Click to add, or drag onto the form");
        ui.add_space(4.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for category in Category::ALL {
                    egui::CollapsingHeader::new(category.display_name())
                        .default_open(true)
                        .show(ui, |ui| {
                            for def in Catalog::by_category(category) {
                                let r = ui.add(
                                    egui::Button::new(def.type_name).sense(Sense::click_and_drag()),
                                );
                                if r.clicked() {
                                    let next = self.designer.add_widget(&self.form, def.type_name);
                                    self.apply(next);
                                }
                                if r.drag_started() {
                                    self.spawning = Some(def.type_name);
                                }
                            }
                        });
                }

                ui.add_space(8.0);
                ui.separator();
                egui::CollapsingHeader::new("Shortcuts")
                    .default_open(false)
                    .show(ui, |ui| {
                        ui.small("Ctrl+Z / Ctrl+Y: undo / redo");
                        ui.small("Arrows: nudge (Shift: x10)");
                        ui.small("Delete: remove");
                        ui.small("Ctrl+D: duplicate");
                        ui.small("] / [: z-order");
                        ui.small("Esc: cancel drag");
                    });
            });
    }

    fn grab_at(&self, screen: Pos2) -> Option<Grab> {
        let content = self.content_rect();
        let corner = Rect::from_center_size(content.max, vec2(HANDLE * 2.0, HANDLE * 2.0));
        if corner.contains(screen) {
            return Some(Grab::FormEdge(FormEdge::SouthEast));
        }
        if (screen.x - content.max.x).abs() <= EDGE_GRAB
            && (content.min.y..=content.max.y).contains(&screen.y)
        {
            return Some(Grab::FormEdge(FormEdge::East));
        }
        if (screen.y - content.max.y).abs() <= EDGE_GRAB
            && (content.min.x..=content.max.x).contains(&screen.x)
        {
            return Some(Grab::FormEdge(FormEdge::South));
        }
        if let Some(id) = self.designer.selected()
            && let Some(w) = self.form.widget(id)
        {
            let r = w.rect().translate(content.min.to_vec2());
            if Rect::from_center_size(r.max, vec2(HANDLE, HANDLE)).contains(screen) {
                return Some(Grab::WidgetHandle(id.clone()));
            }
        }
        self.designer
            .widget_at(&self.form, self.to_surface(screen))
            .map(Grab::Widget)
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui) {
        let margin = vec2(HANDLE * 2.0, HANDLE * 2.0);
        let surface_size = self.form.size + vec2(0.0, self.title_bar_height());
        let (area, resp) = ui.allocate_exact_size(surface_size + margin, Sense::click_and_drag());
        self.surface_origin = area.min;

        if resp.drag_started()
            && let Some(press) = ui.input(|i| i.pointer.press_origin())
            && self.spawning.is_none()
        {
            let p = self.to_surface(press);
            match self.grab_at(press) {
                Some(Grab::FormEdge(edge)) => self.designer.begin_resize_form(&self.form, edge, p),
                Some(Grab::WidgetHandle(id)) => {
                    self.designer.begin_resize_widget(&self.form, &id, p);
                }
                Some(Grab::Widget(id)) => {
                    self.designer.begin_drag(&self.form, &id, p);
                }
                None => {
                    self.designer.select(&self.form, None);
                }
            }
        }
        if resp.dragged()
            && let Some(pointer) = resp.interact_pointer_pos()
        {
            let next = self.designer.update_gesture(&self.form, self.to_surface(pointer));
            self.apply(next);
        }
        if resp.drag_stopped() && self.designer.end_gesture(&self.form) {
            info!(widgets = self.form.widgets.len(), "gesture committed");
        }
        if resp.clicked()
            && let Some(pointer) = resp.interact_pointer_pos()
        {
            let hit = self.designer.widget_at(&self.form, self.to_surface(pointer));
            self.designer.select(&self.form, hit);
        }

        if let Some(hover) = resp.hover_pos() {
            let icon = match (self.designer.active_gesture(), self.grab_at(hover)) {
                (Some(GestureKind::Drag), _) => Some(egui::CursorIcon::Grabbing),
                (Some(GestureKind::ResizeWidget), _) | (None, Some(Grab::WidgetHandle(_))) => {
                    Some(egui::CursorIcon::ResizeNwSe)
                }
                (Some(GestureKind::ResizeForm(edge)), _) | (None, Some(Grab::FormEdge(edge))) => {
                    Some(edge_cursor(edge))
                }
                _ => None,
            };
            if let Some(icon) = icon {
                ui.ctx().set_cursor_icon(icon);
            }
        }

        self.paint_surface(ui);
        self.spawn_ghost(ui);
    }

    fn paint_surface(&self, ui: &egui::Ui) {
        let painter = ui.painter();
        let content = self.content_rect();
        let title_bar = Rect::from_min_max(self.surface_origin, pos2(content.max.x, content.min.y));

        painter.rect_filled(title_bar, CornerRadius::same(0), Color32::from_rgb(52, 101, 164));
        painter.text(
            title_bar.left_center() + vec2(8.0, 0.0),
            Align2::LEFT_CENTER,
            &self.form.title,
            FontId::proportional(13.0),
            Color32::WHITE,
        );
        painter.text(
            title_bar.right_center() - vec2(8.0, 0.0),
            Align2::RIGHT_CENTER,
            "_  □  ×",
            FontId::proportional(12.0),
            Color32::WHITE,
        );
        painter.rect_filled(content, 0.0, color_or(&self.form.background, Color32::from_gray(240)));
        if let Some(image) = &self.form.background_image {
            let label = match image {
                BackgroundImage::External(path) => format!("background: {path}"),
                BackgroundImage::Embedded(_) => "background: embedded image".to_owned(),
            };
            painter.text(
                content.right_bottom() - vec2(6.0, 6.0),
                Align2::RIGHT_BOTTOM,
                label,
                FontId::proportional(10.0),
                Color32::from_gray(120),
            );
        }

        let clipped = painter.with_clip_rect(content);
        for w in &self.form.widgets {
            let r = w.rect().translate(content.min.to_vec2());
            paint_widget(&clipped, w, r);
            if self.designer.selected() == Some(&w.id) {
                painter.rect_stroke(r, 0.0, Stroke::new(2.0, Color32::LIGHT_BLUE), StrokeKind::Outside);
                painter.rect_filled(
                    Rect::from_center_size(r.max, vec2(HANDLE, HANDLE)),
                    2.0,
                    Color32::from_rgb(100, 160, 255),
                );
            }
        }

        let guide = Stroke::new(1.0, Color32::from_rgb(255, 0, 200));
        let guides = self.designer.guides();
        for x in &guides.vertical {
            let x = content.min.x + x;
            clipped.line_segment([pos2(x, content.min.y), pos2(x, content.max.y)], guide);
        }
        for y in &guides.horizontal {
            let y = content.min.y + y;
            clipped.line_segment([pos2(content.min.x, y), pos2(content.max.x, y)], guide);
        }

        painter.rect_stroke(
            content.union(title_bar),
            0.0,
            Stroke::new(1.0, Color32::from_gray(90)),
            StrokeKind::Outside,
        );
        painter.rect_filled(
            Rect::from_center_size(content.max, vec2(HANDLE, HANDLE)),
            2.0,
            Color32::from_gray(160),
        );
    }

    fn spawn_ghost(&mut self, ui: &egui::Ui) {
        let Some(type_name) = self.spawning else {
            return;
        };
        let pointer = ui.ctx().pointer_interact_pos();
        if let (Some(mouse), Some(def)) = (pointer, Catalog::lookup(type_name)) {
            let ghost = Rect::from_center_size(mouse, def.default_size);
            let layer = egui::LayerId::new(egui::Order::Tooltip, Id::new("ghost"));
            let painter = ui.ctx().layer_painter(layer);
            painter.rect_filled(ghost, 4.0, Color32::from_gray(40).gamma_multiply(0.6));
            painter.rect_stroke(
                ghost,
                CornerRadius::same(4),
                Stroke::new(1.0, Color32::LIGHT_BLUE),
                StrokeKind::Outside,
            );
            painter.text(
                ghost.center(),
                Align2::CENTER_CENTER,
                type_name,
                FontId::proportional(12.0),
                Color32::WHITE,
            );
        }
        ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);

        if ui.input(|i| i.pointer.any_released()) {
            if let Some(mouse) = pointer
                && self.content_rect().contains(mouse)
            {
                let next = self
                    .designer
                    .drop_new_widget(&self.form, type_name, self.to_surface(mouse));
                self.apply(next);
            }
            self.spawning = None;
        }
    }

    fn inspector_ui(&mut self, ui: &mut egui::Ui) {
        let Some(id) = self.designer.selected().cloned() else {
            self.form_settings(ui);
            return;
        };
        let Some(w) = self.form.widget(&id) else {
            return;
        };
        ui.heading(format!("{} ({})", id, w.kind));
        ui.separator();

        let (mut pos, mut size) = (w.pos, w.size);
        let mut geometry_changed = false;
        egui::Grid::new("geometry_grid").num_columns(4).show(ui, |ui| {
            ui.label("x");
            geometry_changed |= ui.add(egui::DragValue::new(&mut pos.x)).changed();
            ui.label("y");
            geometry_changed |= ui.add(egui::DragValue::new(&mut pos.y)).changed();
            ui.end_row();
            ui.label("width");
            geometry_changed |= ui.add(egui::DragValue::new(&mut size.x)).changed();
            ui.label("height");
            geometry_changed |= ui.add(egui::DragValue::new(&mut size.y)).changed();
            ui.end_row();
        });
        ui.separator();

        let mut edits = Vec::new();
        match w.def() {
            Some(def) => {
                egui::Grid::new("props_grid")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        for prop in def.props {
                            ui.label(prop.key);
                            let current = w.prop(prop.key).unwrap_or_else(|| prop.default.to_value());
                            if let Some(value) = prop_editor(ui, prop, &current) {
                                edits.push((prop.key, value));
                            }
                            ui.end_row();
                        }
                    });
            }
            None => {
                ui.colored_label(Color32::YELLOW, format!("Unknown widget type {}", w.kind));
            }
        }

        if geometry_changed || !edits.is_empty() {
            self.designer.begin_edit();
        }
        if geometry_changed {
            let next = self.designer.set_geometry(&self.form, &id, pos, size);
            self.apply(next);
        }
        for (key, value) in edits {
            let next = self.designer.set_prop(&self.form, &id, key, value);
            self.apply(next);
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Duplicate").clicked() {
                self.with_selected(|d, f, id| d.duplicate_widget(f, id));
            }
            if ui.button("Delete").clicked() {
                self.with_selected(|d, f, id| d.delete_widget(f, id));
            }
        });
    }

    fn form_settings(&mut self, ui: &mut egui::Ui) {
        ui.heading("Form");
        ui.separator();
        let mut title = self.form.title.clone();
        let mut size = self.form.size;
        let mut background = self.form.background.clone();
        let mut title_changed = false;
        let mut size_changed = false;
        let mut background_changed = false;
        egui::Grid::new("form_grid").num_columns(2).show(ui, |ui| {
            ui.label("title");
            title_changed = ui.text_edit_singleline(&mut title).changed();
            ui.end_row();
            ui.label("width");
            size_changed |= ui.add(egui::DragValue::new(&mut size.x)).changed();
            ui.end_row();
            ui.label("height");
            size_changed |= ui.add(egui::DragValue::new(&mut size.y)).changed();
            ui.end_row();
            ui.label("bg");
            background_changed = color_field(ui, &mut background);
            ui.end_row();
        });
        if title_changed || size_changed || background_changed {
            self.designer.begin_edit();
        }
        if title_changed {
            let next = self.designer.set_title(&self.form, &title);
            self.apply(next);
        }
        if size_changed {
            let next = self.designer.set_form_size(&self.form, size);
            self.apply(next);
        }
        if background_changed {
            let next = self.designer.set_background(&self.form, &background);
            self.apply(next);
        }

        ui.separator();
        ui.label("Background image");
        let mut image = None;
        ui.horizontal(|ui| {
            if ui.button("Choose...").clicked()
                && let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image", &["png", "gif", "ppm", "pgm"])
                    .pick_file()
            {
                image = Some(Some(BackgroundImage::External(path.display().to_string())));
            }
            if ui
                .add_enabled(self.form.background_image.is_some(), egui::Button::new("Clear"))
                .clicked()
            {
                image = Some(None);
            }
        });
        match &self.form.background_image {
            Some(BackgroundImage::External(path)) => {
                ui.small(path);
            }
            Some(BackgroundImage::Embedded(_)) => {
                ui.small("Embedded image (not exported)");
            }
            None => {}
        }
        if let Some(image) = image {
            let next = self.designer.set_background_image(&self.form, image);
            self.apply(next);
        }
    }

    fn events_ui(&mut self, ui: &mut egui::Ui) {
        let Some(w) = self
            .designer
            .selected()
            .and_then(|id| self.form.widget(id))
        else {
            self.events.close();
            ui.label("Select a widget to edit its event handlers.");
            return;
        };
        self.events.open(w);
        let id = w.id.clone();
        if self.events.slots().is_empty() {
            ui.label(format!("{} has no events.", w.kind));
            return;
        }

        let mut edits = Vec::new();
        egui::ScrollArea::vertical().show(ui, |ui| {
            for slot in self.events.slots() {
                ui.monospace(format!("def {}_{}({}):", id, slot.name, slot.params.signature()));
                let mut code = slot.code.clone();
                let edit = egui::TextEdit::multiline(&mut code)
                    .code_editor()
                    .desired_rows(5)
                    .desired_width(f32::INFINITY);
                if ui.add(edit).changed() {
                    edits.push((slot.name, code));
                }
                ui.add_space(6.0);
            }
        });
        for (name, code) in edits {
            self.events.set(name, code);
        }

        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.events.is_dirty(), egui::Button::new("Save"))
                .clicked()
            {
                let next = self
                    .designer
                    .save_event_code(&self.form, &id, self.events.to_code());
                self.apply(next);
                self.events.mark_saved();
                self.set_status(format!("Saved event code for {id}"));
            }
            if ui
                .add_enabled(self.events.is_dirty(), egui::Button::new("Revert"))
                .clicked()
            {
                self.events.close();
            }
            if self.events.is_dirty() {
                ui.colored_label(Color32::YELLOW, "unsaved");
            }
        });
    }

    fn generated_panel(&mut self, ui: &mut egui::Ui) {
        let overrides = self.events.overrides();
        let stale = !matches!(&self.generated, Some((form, o, _)) if *form == self.form && *o == overrides);
        if stale {
            let code = codegen::generate(&self.form, &overrides);
            self.generated = Some((self.form.clone(), overrides, code));
        }
        let Some((_, _, code)) = &self.generated else {
            return;
        };

        ui.horizontal(|ui| {
            if ui.button("Copy").clicked() {
                ui.ctx().copy_text(code.clone());
            }
            ui.checkbox(&mut self.syntax_highlighting, "Highlight");
        });
        ui.separator();
        if self.syntax_highlighting {
            highlight::code_viewer(ui, &self.highlighter, code);
        } else {
            egui::ScrollArea::both()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.add(egui::Label::new(egui::RichText::new(code).monospace()).selectable(true));
                });
        }
    }
}

/// Inline editor for one schema property. Returns the new value when edited.
fn prop_editor(ui: &mut egui::Ui, prop: &PropDef, current: &PropValue) -> Option<PropValue> {
    match prop.kind() {
        PropKind::Boolean => {
            let mut b = current.as_bool().unwrap_or(false);
            ui.checkbox(&mut b, "").changed().then_some(PropValue::Bool(b))
        }
        PropKind::Number => {
            let mut n = current.as_number().unwrap_or(0.0);
            ui.add(egui::DragValue::new(&mut n))
                .changed()
                .then_some(PropValue::Number(n))
        }
        PropKind::Color => {
            let mut s = current.to_string();
            color_field(ui, &mut s).then(|| PropValue::Text(s))
        }
        PropKind::String => {
            let mut s = current.to_string();
            let edit = if prop.multiline {
                egui::TextEdit::multiline(&mut s).desired_rows(3)
            } else {
                egui::TextEdit::singleline(&mut s)
            };
            ui.add(edit).changed().then(|| PropValue::Text(s))
        }
    }
}

/// Hex text field with a picker when the text parses as a color.
fn color_field(ui: &mut egui::Ui, value: &mut String) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        if let Some(mut rgb) = parse_hex_color(value)
            && ui.color_edit_button_srgb(&mut rgb).changed()
        {
            *value = format_hex_color(rgb);
            changed = true;
        }
        changed |= ui
            .add(egui::TextEdit::singleline(value).desired_width(80.0))
            .changed();
    });
    changed
}

fn color_or(value: &str, fallback: Color32) -> Color32 {
    parse_hex_color(value).map_or(fallback, |[r, g, b]| Color32::from_rgb(r, g, b))
}

fn edge_cursor(edge: FormEdge) -> egui::CursorIcon {
    match edge {
        FormEdge::East => egui::CursorIcon::ResizeHorizontal,
        FormEdge::South => egui::CursorIcon::ResizeVertical,
        FormEdge::SouthEast => egui::CursorIcon::ResizeNwSe,
    }
}

/// Approximation of the Tk widget, good enough to lay a form out.
fn paint_widget(painter: &egui::Painter, w: &PlacedWidget, r: Rect) {
    let fg = color_or(&w.text_prop("fg"), Color32::BLACK);
    let bg = color_or(&w.text_prop("bg"), Color32::from_gray(240));
    let font = FontId::proportional(12.0);
    let sunken = Stroke::new(1.0, Color32::from_gray(130));
    let text_at = |pos: Pos2, align: Align2, text: &str| {
        painter.text(pos, align, text, font.clone(), fg);
    };

    match w.kind.as_str() {
        "Button" => {
            painter.rect_filled(r, 2.0, bg);
            painter.rect_stroke(r, 2.0, Stroke::new(1.0, Color32::from_gray(100)), StrokeKind::Inside);
            text_at(r.center(), Align2::CENTER_CENTER, &w.text_prop("text"));
        }
        "Label" => {
            painter.rect_filled(r, 0.0, bg);
            text_at(r.left_center() + vec2(2.0, 0.0), Align2::LEFT_CENTER, &w.text_prop("text"));
        }
        "Entry" | "Combobox" | "Spinbox" => {
            painter.rect_filled(r, 0.0, color_or(&w.text_prop("bg"), Color32::WHITE));
            painter.rect_stroke(r, 0.0, sunken, StrokeKind::Inside);
            let shown = match w.kind.as_str() {
                "Spinbox" => w.text_prop("value"),
                _ => w.text_prop("text"),
            };
            text_at(r.left_center() + vec2(4.0, 0.0), Align2::LEFT_CENTER, &shown);
            if w.kind != "Entry" {
                let arrow = Rect::from_min_max(pos2(r.max.x - 16.0, r.min.y), r.max);
                painter.rect_filled(arrow.shrink(1.0), 0.0, Color32::from_gray(220));
                text_at(arrow.center(), Align2::CENTER_CENTER, "▾");
            }
        }
        "Text" | "Listbox" => {
            painter.rect_filled(r, 0.0, color_or(&w.text_prop("bg"), Color32::WHITE));
            painter.rect_stroke(r, 0.0, sunken, StrokeKind::Inside);
            let key = if w.kind == "Text" { "text" } else { "items" };
            for (i, line) in w.text_prop(key).lines().enumerate() {
                let y = r.min.y + 4.0 + i as f32 * 15.0;
                if y + 12.0 > r.max.y {
                    break;
                }
                text_at(pos2(r.min.x + 4.0, y), Align2::LEFT_TOP, line);
            }
        }
        "Checkbutton" => {
            painter.rect_filled(r, 0.0, bg);
            let tick = Rect::from_min_size(r.left_center() + vec2(2.0, -6.0), vec2(12.0, 12.0));
            painter.rect_filled(tick, 0.0, Color32::WHITE);
            painter.rect_stroke(tick, 0.0, sunken, StrokeKind::Inside);
            if w.prop("checked").and_then(|v| v.as_bool()).unwrap_or(false) {
                text_at(tick.center(), Align2::CENTER_CENTER, "✔");
            }
            text_at(r.left_center() + vec2(18.0, 0.0), Align2::LEFT_CENTER, &w.text_prop("text"));
        }
        "Scale" | "Progressbar" => {
            let (lo, hi) = if w.kind == "Scale" {
                (number_prop(w, "min"), number_prop(w, "max"))
            } else {
                (0.0, number_prop(w, "maximum"))
            };
            let value = number_prop(w, "value");
            let t = if hi > lo { ((value - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 0.0 };
            painter.rect_filled(r, 0.0, bg);
            let track = Rect::from_center_size(r.center(), vec2(r.width() - 8.0, 8.0_f32.min(r.height())));
            painter.rect_filled(track, 2.0, Color32::from_gray(200));
            let filled = Rect::from_min_size(track.min, vec2(track.width() * t as f32, track.height()));
            painter.rect_filled(filled, 2.0, Color32::from_rgb(80, 140, 220));
        }
        "Separator" => {
            painter.line_segment([r.left_center(), r.right_center()], sunken);
        }
        _ => {
            painter.rect_filled(r, 0.0, bg);
            painter.rect_stroke(r, 0.0, sunken, StrokeKind::Inside);
            if w.def().is_none() {
                text_at(r.center(), Align2::CENTER_CENTER, &w.kind);
            }
        }
    }
}

fn number_prop(w: &PlacedWidget, key: &str) -> f64 {
    w.prop(key).and_then(|v| v.as_number()).unwrap_or(0.0)
}

impl eframe::App for TkRadBuilderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.shortcuts(ctx);

        egui::TopBottomPanel::top("menubar").show(ctx, |ui| self.top_bar(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));
        if self.palette_open {
            egui::SidePanel::left("palette")
                .default_width(180.0)
                .resizable(true)
                .show(ctx, |ui| self.palette_ui(ui));
        }
        egui::SidePanel::right("inspector")
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.right_panel_tab, RightTab::Inspector, "Inspector");
                    ui.selectable_value(&mut self.right_panel_tab, RightTab::Events, "Events");
                    ui.selectable_value(&mut self.right_panel_tab, RightTab::Code, "Code");
                });
                ui.separator();
                match self.right_panel_tab {
                    RightTab::Inspector => self.inspector_ui(ui),
                    RightTab::Events => self.events_ui(ui),
                    RightTab::Code => self.generated_panel(ui),
                }
            });
        // An inspector edit ends once no control is focused or dragged.
        if self.designer.is_editing()
            && ctx.dragged_id().is_none()
            && ctx.memory(|m| m.focused().is_none())
        {
            self.designer.end_edit(&self.form);
        }
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both()
                .auto_shrink([false, false])
                .show(ui, |ui| self.canvas_ui(ui));
        });
    }
}
