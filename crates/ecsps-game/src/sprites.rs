//! Sprite description table.
//!
//! One record per line, whitespace-delimited:
//!
//! ```text
//! # name       path                       anchorX anchorY mirror
//! background   assets/bg.png              0       0       false
//! idle1        assets/character/idle_1.png 64     128     true
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. The mirror flag is
//! set only by the literal token `true`.

use std::path::Path;

use ecsps_ecs::Keyword;

use crate::components::Anchor;
use crate::error::AssetError;

/// One sprite: a texture plus the origin it is drawn around.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDesc {
    pub name: Keyword,
    /// Texture path, relative to the asset root.
    pub texture: String,
    pub anchor: Anchor,
    pub mirror: bool,
}

impl SpriteDesc {
    pub fn new(name: &str, texture: &str, anchor: (i32, i32)) -> Self {
        Self {
            name: Keyword::new(name),
            texture: texture.to_owned(),
            anchor: Anchor::new(anchor.0, anchor.1),
            mirror: false,
        }
    }
}

/// Parse a sprite description table.
pub fn parse_sprite_descs(text: &str) -> Result<Vec<SpriteDesc>, AssetError> {
    let mut descs = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        descs.push(parse_line(line, index + 1)?);
    }
    Ok(descs)
}

fn parse_line(line: &str, number: usize) -> Result<SpriteDesc, AssetError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [name, texture, x, y, mirror] = fields[..] else {
        return Err(AssetError::Parse {
            line: number,
            reason: format!("expected 5 fields (name path anchorX anchorY mirror), found {}", fields.len()),
        });
    };
    let coord = |token: &str, axis: &str| {
        token.parse::<i32>().map_err(|e| AssetError::Parse {
            line: number,
            reason: format!("anchor{axis} '{token}' is not an integer: {e}"),
        })
    };
    Ok(SpriteDesc {
        name: Keyword::new(name),
        texture: texture.to_owned(),
        anchor: Anchor::new(coord(x, "X")?, coord(y, "Y")?),
        mirror: mirror == "true",
    })
}

/// Read and parse a sprite description file.
pub fn load_sprite_descs(path: &Path) -> Result<Vec<SpriteDesc>, AssetError> {
    let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_owned(),
        source,
    })?;
    let descs = parse_sprite_descs(&text)?;
    tracing::debug!(path = %path.display(), sprites = descs.len(), "loaded sprite descriptions");
    Ok(descs)
}

/// The demo's sprite table, used when no description file is configured.
pub fn builtin_sprite_descs() -> Vec<SpriteDesc> {
    vec![
        SpriteDesc::new("background", "assets/bg.png", (0, 0)),
        SpriteDesc::new("tile1", "assets/tiles/1.png", (0, 0)),
        SpriteDesc::new("tile2", "assets/tiles/2.png", (0, 0)),
        SpriteDesc::new("tile3", "assets/tiles/3.png", (0, 0)),
        SpriteDesc::new("tree", "assets/objects/tree.png", (0, 260)),
        SpriteDesc::new("grass", "assets/objects/grass2.png", (0, 50)),
        SpriteDesc::new("cactus", "assets/objects/cactus3.png", (0, 96)),
        SpriteDesc::new("idle1", "assets/character/idle_1.png", (64, 128)),
        SpriteDesc::new("idle2", "assets/character/idle_2.png", (64, 128)),
        SpriteDesc::new("idle3", "assets/character/idle_3.png", (64, 128)),
        SpriteDesc::new("idle4", "assets/character/idle_4.png", (64, 128)),
    ]
}
