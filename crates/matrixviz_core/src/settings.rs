//! Persistent Settings Management
//!
//! Handles saving/loading the settings tree to disk.
//!
//! # Storage Locations
//! - Linux: `~/.config/matrixviz/settings.json`
//! - Windows: `%APPDATA%\matrixviz\matrixviz\config\settings.json`
//! - macOS: `~/Library/Application Support/com.matrixviz.matrixviz/settings.json`

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::{error, info};

use crate::config::Settings;
use crate::error::{EngineError, EngineResult};

impl Settings {
    /// Platform-specific settings file path
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "matrixviz", "matrixviz")
            .map(|proj| proj.config_dir().join("settings.json"))
    }

    /// Read and validate a settings file
    pub fn load_from(path: &Path) -> EngineResult<Self> {
        let file = fs::File::open(path)?;
        let settings: Settings = serde_json::from_reader(std::io::BufReader::new(file))?;
        settings.validate().map_err(EngineError::InvalidSettings)?;
        Ok(settings)
    }

    /// Load settings from `path` (or the default location), or return the
    /// defaults if the file is missing, corrupt or invalid
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);

        if let Some(path) = path {
            if path.exists() {
                match Self::load_from(&path) {
                    Ok(settings) => {
                        info!("Settings loaded from {:?}", path);
                        return settings;
                    }
                    Err(e) => {
                        error!("Failed to load settings file {:?}: {}", path, e);
                    }
                }
            }
        }

        info!("Using default settings");
        Self::default()
    }

    /// Save settings to `path` (or the default location); returns where
    /// they were written
    pub fn save(&self, path: Option<&Path>) -> EngineResult<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path().ok_or(EngineError::NoConfigDir)?,
        };

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, self)?;

        info!("Settings saved to {:?}", path);
        Ok(path)
    }
}
