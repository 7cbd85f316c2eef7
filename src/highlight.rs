//! Python highlighting for the generated script, via syntect.

use egui::Color32;
use egui::text::{LayoutJob, TextFormat};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const THEME: &str = "base16-ocean.dark";

pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(THEME)
            .or_else(|| self.theme_set.themes.values().next())
    }

    /// (text, color) spans for Python source. Lines that fail to highlight are
    /// kept as plain text.
    pub fn highlight_python(&self, code: &str) -> Vec<(String, Color32)> {
        let Some(theme) = self.theme() else {
            return vec![(code.to_owned(), Color32::LIGHT_GRAY)];
        };
        let syntax = self
            .syntax_set
            .find_syntax_by_extension("py")
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut spans = Vec::new();
        for line in LinesWithEndings::from(code) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => spans.extend(
                    ranges
                        .into_iter()
                        .map(|(style, text)| (text.to_owned(), style_to_color32(style))),
                ),
                Err(_) => spans.push((line.to_owned(), Color32::LIGHT_GRAY)),
            }
        }
        spans
    }

    pub fn layout_job(&self, code: &str) -> LayoutJob {
        let mut job = LayoutJob::default();
        for (text, color) in self.highlight_python(code) {
            job.append(
                &text,
                0.0,
                TextFormat {
                    font_id: egui::FontId::monospace(12.0),
                    color,
                    ..Default::default()
                },
            );
        }
        job
    }
}

fn style_to_color32(style: Style) -> Color32 {
    Color32::from_rgb(style.foreground.r, style.foreground.g, style.foreground.b)
}

/// Read-only, selectable code view.
pub fn code_viewer(ui: &mut egui::Ui, highlighter: &Highlighter, code: &str) {
    let job = highlighter.layout_job(code);
    egui::ScrollArea::both()
        .id_salt("generated_code_scroll")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.add(egui::Label::new(job).selectable(true).extend());
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_spans_cover_input() {
        let highlighter = Highlighter::new();
        let code = "import tkinter as tk\n\n\ndef button1_click(event=None):\n    pass\n";
        let spans = highlighter.highlight_python(code);
        let joined: String = spans.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(joined, code);
        // Keywords get a color distinct from plain identifiers.
        let colors: std::collections::HashSet<_> = spans.iter().map(|(_, c)| *c).collect();
        assert!(colors.len() > 1);
    }

    #[test]
    fn test_layout_job() {
        let job = Highlighter::new().layout_job("root.mainloop()\n");
        assert_eq!(job.text, "root.mainloop()\n");
    }
}
