//! On-disk project files and script export.

use crate::codegen;
use crate::error::{Error, Result};
use crate::events::EventCodeMap;
use crate::widget::FormState;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const PROJECT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub version: u32,
    pub form: FormState,
}

impl ProjectFile {
    pub fn new(form: FormState) -> Self {
        Self {
            version: PROJECT_VERSION,
            form,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json().map_err(|e| Error::json(path, e))?;
        std::fs::write(path, json).map_err(|e| Error::io(path, e))?;
        info!(path = %path.display(), "project saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let project: Self = serde_json::from_str(&json).map_err(|e| Error::json(path, e))?;
        if project.version != PROJECT_VERSION {
            return Err(Error::UnsupportedVersion {
                found: project.version,
                expected: PROJECT_VERSION,
            });
        }
        // Ids become Python names in the generated script.
        if let Some(reason) = project.form.id_problem() {
            return Err(Error::InvalidProject {
                path: path.to_path_buf(),
                reason,
            });
        }
        info!(path = %path.display(), widgets = project.form.widgets.len(), "project loaded");
        Ok(project)
    }
}

/// Writes the generated script for `form` to `path`.
pub fn export_script(
    form: &FormState,
    overrides: &EventCodeMap,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, codegen::generate(form, overrides)).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), "script exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::widget::{PlacedWidget, WidgetId};
    use egui::pos2;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tk-rad-builder-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut form = FormState::default();
        let def = Catalog::lookup("Combobox").unwrap();
        form.widgets
            .push(PlacedWidget::from_def(WidgetId::new("combobox1"), def, pos2(8.0, 8.0)));
        let path = temp_path("round-trip.json");
        ProjectFile::new(form.clone()).save(&path).unwrap();
        let loaded = ProjectFile::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.form, form);
    }

    #[test]
    fn test_rejects_other_versions() {
        let mut project = ProjectFile::new(FormState::default());
        project.version = 99;
        let path = temp_path("version.json");
        std::fs::write(&path, project.to_json().unwrap()).unwrap();
        let err = ProjectFile::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            err,
            Error::UnsupportedVersion {
                found: 99,
                expected: PROJECT_VERSION
            }
        ));
    }

    #[test]
    fn test_rejects_ids_unusable_as_python_names() {
        let def = Catalog::lookup("Button").unwrap();
        for ids in [["my button", "button2"], ["button1", "button1"]] {
            let mut form = FormState::default();
            for id in ids {
                form.widgets
                    .push(PlacedWidget::from_def(WidgetId::new(id), def, pos2(8.0, 8.0)));
            }
            let path = temp_path(&format!("ids-{}.json", ids[0].replace(' ', "-")));
            std::fs::write(&path, ProjectFile::new(form).to_json().unwrap()).unwrap();
            let err = ProjectFile::load(&path).unwrap_err();
            std::fs::remove_file(&path).ok();
            assert!(matches!(err, Error::InvalidProject { .. }), "{ids:?}");
            assert!(err.to_string().contains(ids[0]));
        }
    }

    #[test]
    fn test_load_errors_name_the_path() {
        let path = temp_path("missing.json");
        let err = ProjectFile::load(&path).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("missing.json"));

        let bad = temp_path("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        let err = ProjectFile::load(&bad).unwrap_err();
        std::fs::remove_file(&bad).ok();
        assert!(matches!(err, Error::Json { .. }));
    }

    #[test]
    fn test_export_writes_script() {
        let path = temp_path("form.py");
        export_script(&FormState::default(), &EventCodeMap::new(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(text.ends_with("root.mainloop()\n"));
    }
}
