//! Error types of the game layer.

use std::path::PathBuf;

use ecsps_ecs::EcsError;

/// Failures loading sprite descriptions or textures.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The file could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sprite description line is malformed. `line` is 1-based.
    #[error("sprite description line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Failures loading or validating [`GameConfig`](crate::config::GameConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A field holds a value the game cannot run with.
    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level error of the game layer.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The canonical state could not be encoded for hashing.
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}
