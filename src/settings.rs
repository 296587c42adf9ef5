//! Persisted preferences (config dir / tray-tetris / settings.json).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::wrap_start_level;
use crate::core::GameConfig;

const DIR_NAME: &str = "tray-tetris";
const FILE_NAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Scalars remembered between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Stored signed; wrapped into 0-19 when read back.
    pub start_level: i64,
    pub hard_drops: bool,
    pub high_score: u32,
}

impl Settings {
    /// `settings.json` under the platform config directory, or the working
    /// directory if there is none.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DIR_NAME)
            .join(FILE_NAME)
    }

    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let s = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&s)?)
    }

    /// Like [`Settings::load`], but a file that exists and does not parse is
    /// renamed to `settings.json.bak` and the defaults are returned along with
    /// the backup path. A later [`Settings::save`] then cannot overwrite the
    /// stored high score.
    pub fn load_or_back_up(path: &Path) -> Result<(Self, Option<PathBuf>), SettingsError> {
        match Self::load(path) {
            Ok(settings) => Ok((settings, None)),
            Err(SettingsError::Json(_)) => {
                let backup = path.with_extension("json.bak");
                fs::rename(path, &backup)?;
                Ok((Self::default(), Some(backup)))
            }
            Err(e) => Err(e),
        }
    }

    /// Save settings to `path`, creating its directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let s = serde_json::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            start_level: wrap_start_level(self.start_level),
            hard_drops: self.hard_drops,
            high_score: self.high_score,
        }
    }

    /// Take over the values a session changed.
    ///
    /// The high score only ever grows.
    pub fn update_from(&mut self, config: GameConfig) {
        self.start_level = i64::from(config.start_level);
        self.hard_drops = config.hard_drops;
        self.high_score = self.high_score.max(config.high_score);
    }
}
