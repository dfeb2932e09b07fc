use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use std::{fs, io};
use thiserror::Error;

// --- Error Type ---
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON config: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("invalid TOML config: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid config: {0}")]
    Validation(String),
}

// --- Enums for Choices ---
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SerializerType {
    Json,
    Binary,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Stdio,
}

// --- Configuration Sections ---

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct DragSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_drag_coeff")]
    pub coeff: f64,
}

fn default_drag_coeff() -> f64 {
    0.02
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            coeff: default_drag_coeff(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SimulationSettings {
    #[serde(default = "default_emitter")]
    pub emitter: Point,
    #[serde(default = "default_wind")]
    pub wind: Point,
    #[serde(default = "default_max_age")]
    pub max_age: u64,
    #[serde(default)]
    pub drag: DragSettings,
}

fn default_emitter() -> Point {
    Point { x: 100.0, y: -50.0 }
}
fn default_wind() -> Point {
    Point { x: -2.0, y: 1.0 }
}
fn default_max_age() -> u64 {
    200
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            emitter: default_emitter(),
            wind: default_wind(),
            max_age: default_max_age(),
            drag: DragSettings::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct CanvasSettings {
    #[serde(default = "default_canvas_side")]
    pub width: f64,
    #[serde(default = "default_canvas_side")]
    pub height: f64,
}

fn default_canvas_side() -> f64 {
    600.0
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: default_canvas_side(),
            height: default_canvas_side(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct SerializerConfig {
    #[serde(rename = "type")]
    pub serializer_type: SerializerType,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            serializer_type: SerializerType::Json,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct SenderConfig {
    #[serde(rename = "type")]
    pub sender_type: SenderType,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            sender_type: SenderType::Stdio,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct TransportConfig {
    #[serde(default)]
    pub serializer: SerializerConfig,
    #[serde(default)]
    pub sender: SenderConfig,
}

// --- Top-Level Config Struct ---

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_framerate")]
    pub framerate: u32,
    /// Seeds the spawn RNG when set, for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub canvas: CanvasSettings,
    #[serde(default)]
    pub transport: TransportConfig,
}

fn default_framerate() -> u32 {
    50 // 20ms tick cadence
}

impl Default for Config {
    fn default() -> Self {
        Self {
            framerate: default_framerate(),
            seed: None,
            simulation: SimulationSettings::default(),
            canvas: CanvasSettings::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Wall-clock duration of one tick at the configured framerate.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.framerate as f64)
    }
}

// --- Loading Function ---

/// Loads a config from JSON or TOML, chosen by file extension.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let config: Config = match extension {
        "json" => serde_json::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.framerate == 0 {
        return Err(ConfigError::Validation(
            "framerate cannot be zero".to_string(),
        ));
    }
    if config.canvas.width <= 0.0 || config.canvas.height <= 0.0 {
        return Err(ConfigError::Validation(
            "canvas dimensions must be positive".to_string(),
        ));
    }
    if !config.simulation.drag.coeff.is_finite() || config.simulation.drag.coeff < 0.0 {
        return Err(ConfigError::Validation(
            "drag coefficient must be finite and non-negative".to_string(),
        ));
    }
    Ok(())
}
