//! Assets: turning slide ids into RGBA pixels without stalling a frame.
//!
//! Texture ids are site-absolute paths such as `/assets/mobile_ui_1.png`.
//! [`AssetResolver`] maps them under a local root; [`TextureLoader`] reads and
//! decodes them on a worker thread and hands results back over a channel.
//!
//! # Invariants
//! - Resolution never escapes the asset root.
//! - Every request produces exactly one [`TextureEvent`], loaded or failed.
//! - The caller drains events with a non-blocking poll; decoding never runs
//!   on the thread that renders.

mod loader;
mod resolver;
mod texture;

pub use loader::{TextureEvent, TextureLoader, TextureRequest};
pub use resolver::AssetResolver;
pub use texture::{DecodedTexture, MipLevel, mip_level_count};

/// Errors from asset resolution and decoding.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("asset id {0:?} is empty or leaves the asset root")]
    InvalidId(String),
    #[error("decode error for {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: image::ImageError,
    },
    #[error("texture {0} has no pixels")]
    Empty(String),
    #[error("could not start loader thread: {0}")]
    Spawn(std::io::Error),
}

pub fn crate_info() -> &'static str {
    "showcase-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("assets"));
    }
}
