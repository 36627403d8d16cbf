// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application settings stored as RON.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings file format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "nodeflow.ron";

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Settings format version
    pub version: u32,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Maximum undo depth
    pub history_depth: usize,
    /// Node path rendered when none is given
    pub render_path: String,
    /// Pretty-print JSON output
    pub pretty_output: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            log_filter: "info".to_string(),
            history_depth: crate::history::MAX_HISTORY,
            render_path: "/".to_string(),
            pretty_output: true,
        }
    }
}

impl AppSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: AppSettings = ron::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    settings.version, SETTINGS_FORMAT_VERSION
                ),
            ));
        }

        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> std::io::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("nodeflow-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.render_path, "/");
        assert_eq!(settings.history_depth, crate::history::MAX_HISTORY);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("settings.ron");
        let settings = AppSettings {
            log_filter: "nodeflow_graph=trace".to_string(),
            pretty_output: false,
            ..AppSettings::default()
        };
        settings.save(&path).unwrap();
        let loaded = AppSettings::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded: AppSettings = ron::from_str("(history_depth: 5)").unwrap();
        assert_eq!(loaded.history_depth, 5);
        assert_eq!(loaded.log_filter, "info");
    }

    #[test]
    fn test_newer_version_rejected() {
        let path = temp_path("newer.ron");
        std::fs::write(&path, "(version: 99)").unwrap();
        let result = AppSettings::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(result.unwrap_err().kind(), std::io::ErrorKind::InvalidData);
        assert_eq!(
            AppSettings::load_or_default(&temp_path("absent.ron")).unwrap(),
            AppSettings::default()
        );
    }
}
