//! Game configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration:
//!
//! ```toml
//! fixed_dt = 0.016666668
//! ticks = 600
//! gravity = [0.0, 980.0]
//! # sprites = "assets/sprites.txt"
//! asset_root = "."
//! player_speed = 240.0
//! jump_speed = 520.0
//! ```

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration of the demo game loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Ticks the headless demo runs.
    pub ticks: u64,
    /// Acceleration applied to dynamic bodies, px/s².
    pub gravity: [f32; 2],
    /// Sprite description file. `None` uses the built-in table with
    /// placeholder textures.
    pub sprites: Option<PathBuf>,
    /// Base directory of texture paths.
    pub asset_root: PathBuf,
    /// Horizontal player speed, px/s.
    pub player_speed: f32,
    /// Initial jump speed, px/s.
    pub jump_speed: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            ticks: 600,
            gravity: [0.0, 980.0],
            sprites: None,
            asset_root: PathBuf::from("."),
            player_speed: 240.0,
            jump_speed: 520.0,
        }
    }
}

impl GameConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(invalid("fixed_dt", format!("must be positive and finite, got {}", self.fixed_dt)));
        }
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(invalid("gravity", format!("must be finite, got {:?}", self.gravity)));
        }
        for (field, value) in [("player_speed", self.player_speed), ("jump_speed", self.jump_speed)] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(invalid(field, format!("must be non-negative and finite, got {value}")));
            }
        }
        Ok(())
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::from(self.gravity)
    }

    /// Resolve the sprite file against the asset root.
    pub fn sprites_path(&self) -> Option<PathBuf> {
        self.sprites.as_ref().map(|p| self.asset_root.join(p))
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(GameConfig::from_toml("").unwrap(), GameConfig::default());
    }

    #[test]
    fn default_is_60hz() {
        let config = GameConfig::default();
        assert!((config.fixed_dt - 1.0 / 60.0).abs() < f64::EPSILON);
        assert_eq!(config.gravity(), Vec2::new(0.0, 980.0));
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = GameConfig::from_toml(
            "ticks = 30\ngravity = [0.0, 500.0]\nsprites = \"sprites.txt\"\nasset_root = \"data\"",
        )
        .unwrap();
        assert_eq!(config.ticks, 30);
        assert_eq!(config.gravity(), Vec2::new(0.0, 500.0));
        assert_eq!(config.sprites_path(), Some(PathBuf::from("data/sprites.txt")));
        assert_eq!(config.player_speed, 240.0);
    }

    #[test]
    fn non_positive_dt_is_rejected() {
        for text in ["fixed_dt = 0.0", "fixed_dt = -1.0", "fixed_dt = inf"] {
            let err = GameConfig::from_toml(text).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { field: "fixed_dt", .. }),
                "{text}: {err}"
            );
        }
    }

    #[test]
    fn negative_speed_is_rejected() {
        let err = GameConfig::from_toml("jump_speed = -3.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "jump_speed", .. }));
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let err = GameConfig::from_toml("tick = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ticks = 7").unwrap();
        assert_eq!(GameConfig::load(file.path()).unwrap().ticks, 7);

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ecsps.toml");
        assert!(matches!(GameConfig::load(&missing), Err(ConfigError::Io { .. })));
        assert_eq!(GameConfig::load_or_default(&missing).unwrap(), GameConfig::default());
    }
}
