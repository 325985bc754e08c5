use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Local directory or http(s) base URL holding the JSON files.
    pub data_root: String,
    /// Data-source manifest, relative to the root.
    pub manifest: String,
    /// Directory of job feeds named by the manifest, relative to the root.
    pub data_dir: String,
    pub company_file: String,
    pub default_province: String,
    pub missing_type: String,
    pub tag_label_max: usize,
    pub card_tag_limit: usize,
    pub portal_url: String,
    pub maps_url: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_root: ".".to_string(),
            manifest: "config.json".to_string(),
            data_dir: "data".to_string(),
            company_file: "company/company.json".to_string(),
            default_province: "Bangkok".to_string(),
            missing_type: "N/A".to_string(),
            tag_label_max: 40,
            card_tag_limit: 5,
            portal_url: "https://cedtintern.cp.eng.chula.ac.th".to_string(),
            maps_url: "https://www.google.com/maps/search/".to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl Settings {
    /// Reads `path` if given, else the per-user settings file if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file: {}", path.display()))
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "internboard")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Path of a manifest-listed feed relative to the data root.
    pub fn feed_path(&self, filename: &str) -> String {
        let dir = self.data_dir.trim_end_matches('/');
        if dir.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", dir, filename)
        }
    }
}

/// Log file for the interactive views, beside the platform data directory.
pub fn log_path() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("", "", "internboard") {
        dirs.data_dir().join("internboard.log")
    } else {
        PathBuf::from("internboard.log")
    }
}
