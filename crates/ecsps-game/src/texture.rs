//! Texture loading through a shared [`ResourcePool`].
//!
//! Textures stay undecoded: the headless renderer only needs to know which
//! texture a draw call uses and that its file exists.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ecsps_ecs::pool::{Handle, ResourcePool};

use crate::error::AssetError;

/// Raw texture file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl Texture {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for placeholder textures.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Textures keyed by their path relative to the asset root.
pub type TexturePool = ResourcePool<String, Texture, AssetError>;

pub type TextureHandle = Handle<String, Texture>;

/// Where texture bytes come from.
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Read files below this root directory.
    Files(PathBuf),
    /// Hand out empty textures without touching the file system.
    Placeholder,
}

/// Create a shared texture pool reading from `source`.
pub fn texture_pool(source: TextureSource) -> Arc<TexturePool> {
    Arc::new(ResourcePool::new(move |key: &String| load(&source, key)))
}

fn load(source: &TextureSource, key: &str) -> Result<Texture, AssetError> {
    match source {
        TextureSource::Files(root) => read_texture(root, key),
        TextureSource::Placeholder => Ok(Texture {
            path: PathBuf::from(key),
            bytes: Vec::new(),
        }),
    }
}

fn read_texture(root: &Path, key: &str) -> Result<Texture, AssetError> {
    let path = root.join(key);
    let bytes = std::fs::read(&path).map_err(|source| AssetError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "loaded texture");
    Ok(Texture { path, bytes })
}
