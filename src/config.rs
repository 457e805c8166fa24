use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::LayoutOptions;
use crate::error::StoreError;
use crate::model::{CellWidths, ScaleMode};

/// User-tunable engine settings, stored as `settings.json`.
///
/// Every field has a default, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cell_widths: CellWidths,
    pub layout: LayoutOptions,
    pub default_scale: ScaleMode,
    /// Pixels a bar must travel before a press becomes a drag.
    pub bar_drag_threshold: f32,
    /// Pixels a list handle must travel before a press becomes a reorder.
    pub reorder_threshold: f32,
    /// View and user names keying persisted orders.
    pub view: String,
    pub user: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cell_widths: CellWidths::default(),
            layout: LayoutOptions::default(),
            default_scale: ScaleMode::Month,
            bar_drag_threshold: 3.0,
            reorder_threshold: 5.0,
            view: "tasks".into(),
            user: std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_else(|_| "local".into()),
        }
    }
}

impl EngineConfig {
    /// Read `path`, falling back to defaults when the file is missing or broken.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Where settings, overrides, orders and the audit log live.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub config_dir: PathBuf,
}

impl DataPaths {
    pub fn resolve() -> Self {
        let config_dir = directories::ProjectDirs::from("", "", "StudioTimeline")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Self { config_dir }
    }

    pub fn settings(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    pub fn overrides(&self) -> PathBuf {
        self.config_dir.join("overrides.json")
    }

    pub fn orders(&self) -> PathBuf {
        self.config_dir.join("orders.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.config_dir.join("audit.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "cell_widths": { "month": 30.0 }, "user": "bia" }"#).unwrap();
        let config = EngineConfig::load(&path);
        assert_eq!(config.cell_widths.month, 30.0);
        assert_eq!(config.cell_widths.day, 40.0);
        assert_eq!(config.user, "bia");
        assert_eq!(config.reorder_threshold, 5.0);
    }

    #[test]
    fn malformed_or_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(EngineConfig::load(&path).bar_drag_threshold, 3.0);
        std::fs::write(&path, "{").unwrap();
        assert_eq!(EngineConfig::load(&path).default_scale, ScaleMode::Month);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("settings.json");
        let config = EngineConfig {
            default_scale: ScaleMode::Quarter,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path), config);
    }
}
