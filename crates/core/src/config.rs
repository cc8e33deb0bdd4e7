//! Session configuration
//!
//! Every field has a documented default. Configuration is validated before a session is
//! built; an unknown mode or a degenerate grid is rejected instead of being replaced.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{
    Mode, DEFAULT_COLUMNS, DEFAULT_DURATION_SECS, DEFAULT_ROWS, DEFAULT_TILE_SIZE,
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unknown mode: {0}")]
    UnknownMode(String),
    #[error("grid dimensions must be positive, got {rows}x{columns}")]
    InvalidDimensions { rows: usize, columns: usize },
    #[error("tile size must be a positive number, got {0}")]
    InvalidTileSize(f32),
    #[error("duration must be a non-negative number of seconds, got {0}")]
    InvalidDuration(f32),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {key}: {value}")]
    Env { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grid rows
    pub rows: usize,
    /// Grid columns
    pub columns: usize,
    /// View-space size of one cell; only used for coordinate mapping
    #[serde(rename = "tileSize", alias = "tile_size")]
    pub tile_size: f32,
    /// Skip the swap-must-match requirement
    #[serde(rename = "freeMoves", alias = "free_moves")]
    pub free_moves: bool,
    /// Session time budget in seconds
    pub duration: f32,
    /// Active piece roster
    #[serde(deserialize_with = "deserialize_mode")]
    pub mode: Mode,
    /// RNG seed; None seeds from entropy
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            tile_size: DEFAULT_TILE_SIZE,
            free_moves: false,
            duration: DEFAULT_DURATION_SECS,
            mode: Mode::Normal,
            seed: None,
        }
    }
}

fn deserialize_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Mode, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Mode::from_str(&raw)
        .ok_or_else(|| serde::de::Error::custom(ConfigError::UnknownMode(raw)))
}

impl Config {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Create from environment variables.
    ///
    /// Unset variables keep their defaults; a variable that is set but does not parse is
    /// an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom lookup, for tests and embedding.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(
            key: &'static str,
            raw: Option<String>,
        ) -> Result<Option<T>, ConfigError> {
            match raw {
                None => Ok(None),
                Some(value) => value
                    .trim()
                    .parse::<T>()
                    .map(Some)
                    .map_err(|_| ConfigError::Env { key, value }),
            }
        }

        let mut config = Config::default();

        if let Some(rows) = parse("MATCH3_ROWS", lookup("MATCH3_ROWS"))? {
            config.rows = rows;
        }
        if let Some(columns) = parse("MATCH3_COLUMNS", lookup("MATCH3_COLUMNS"))? {
            config.columns = columns;
        }
        if let Some(tile_size) = parse("MATCH3_TILE_SIZE", lookup("MATCH3_TILE_SIZE"))? {
            config.tile_size = tile_size;
        }
        if let Some(raw) = lookup("MATCH3_FREE_MOVES") {
            config.free_moves = match raw.trim().to_lowercase().as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => {
                    return Err(ConfigError::Env {
                        key: "MATCH3_FREE_MOVES",
                        value: raw,
                    })
                }
            };
        }
        if let Some(duration) = parse("MATCH3_DURATION", lookup("MATCH3_DURATION"))? {
            config.duration = duration;
        }
        if let Some(raw) = lookup("MATCH3_MODE") {
            config.mode = Mode::from_str(raw.trim()).ok_or(ConfigError::UnknownMode(raw))?;
        }
        if let Some(seed) = parse("MATCH3_SEED", lookup("MATCH3_SEED"))? {
            config.seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ConfigError::InvalidDimensions {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(ConfigError::InvalidTileSize(self.tile_size));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(ConfigError::InvalidDuration(self.duration));
        }
        Ok(())
    }

    /// Session duration in milliseconds
    pub fn duration_ms(&self) -> u32 {
        (self.duration * 1000.0).floor() as u32
    }
}
