//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/triblocks/settings.toml (or platform equivalent)

use crate::game::GameConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("could not determine config directory")]
    NoConfigDir,
}

/// Game settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keybindings
    pub keys: KeyBindings,
    /// Visual settings
    pub visual: VisualSettings,
    /// Gameplay settings
    pub gameplay: GameplaySettings,
}

/// Key bindings (stored as strings for easy editing)
/// Each action can have one or more keys bound to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_forward: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_backward: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub pause: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub next_tileset: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub prev_tileset: Vec<String>,
}

/// Deserialize keys as either a single string or array of strings
fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(key) => vec![key],
        OneOrMany::Many(keys) => keys,
    })
}

/// Serialize keys: single key as string, multiple as array
fn serialize_keys<S>(keys: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match keys {
        [key] => serializer.serialize_str(key),
        keys => keys.serialize(serializer),
    }
}

/// Visual settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    /// Tileset loaded on startup
    pub tileset: String,
    /// Mark the landing spot of the falling piece
    pub show_target: bool,
}

/// Gameplay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Initial fall speed in field units (32 per row) per second
    pub base_speed: f32,
    /// Extra fall speed while soft drop is held
    pub speedup: f32,
    /// Fall speed added on every difficulty tick
    pub speed_increment: f32,
    /// Seconds between difficulty ticks
    pub difficulty_interval_secs: u64,
    /// Pause after each collapse, 0 resolves cascades instantly
    pub collapse_delay_ms: u64,
    /// Delayed Auto Shift in milliseconds
    pub das_ms: u64,
    /// Auto Repeat Rate in milliseconds
    pub arr_ms: u64,
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_left: keys(&["Left"]),
            move_right: keys(&["Right"]),
            rotate_forward: keys(&["Up", "Shift"]),
            rotate_backward: keys(&["Ctrl", "z"]),
            soft_drop: keys(&["Down"]),
            pause: keys(&["p"]),
            quit: keys(&["Esc", "q"]),
            next_tileset: keys(&["+"]),
            prev_tileset: keys(&["-"]),
        }
    }
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            tileset: "Default".to_string(),
            show_target: true,
        }
    }
}

impl Default for GameplaySettings {
    fn default() -> Self {
        let game = GameConfig::default();
        Self {
            base_speed: game.base_speed,
            speedup: game.speedup,
            speed_increment: game.speed_increment,
            difficulty_interval_secs: 5,
            collapse_delay_ms: (game.collapse_delay * 1000.0).round() as u64,
            das_ms: 170,
            arr_ms: 50,
        }
    }
}

impl GameplaySettings {
    /// Session tuning derived from these settings
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            base_speed: self.base_speed,
            speedup: self.speedup,
            speed_increment: self.speed_increment,
            collapse_delay: self.collapse_delay_ms as f32 / 1000.0,
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "triblocks", "triblocks")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the default settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from the default location, or fall back to defaults
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_or_default(&path),
            None => {
                tracing::warn!("no config directory, using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from a file, falling back to defaults on any error.
    /// A missing file is not an error.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file");
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from a file
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a file, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        tracing::info!(path = %path.display(), "settings saved");
        Ok(())
    }
}
