use image::{RgbaImage, imageops};

use crate::AssetError;

/// One level of a mip chain, tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A decoded image ready for upload. Pixels are sRGB-encoded RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedTexture {
    /// Decode PNG or JPEG bytes; the format is sniffed from the data.
    pub fn decode(source: impl Into<String>, bytes: &[u8]) -> Result<Self, AssetError> {
        let source = source.into();
        let image = match image::load_from_memory(bytes) {
            Ok(image) => image,
            Err(e) => return Err(AssetError::Decode { id: source, source: e }),
        };
        Self::from_rgba(source, image.to_rgba8())
    }

    pub fn from_rgba(source: impl Into<String>, image: RgbaImage) -> Result<Self, AssetError> {
        let source = source.into();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::Empty(source));
        }
        Ok(Self {
            source,
            width,
            height,
            pixels: image.into_raw(),
        })
    }

    pub fn mip_level_count(&self) -> u32 {
        mip_level_count(self.width, self.height)
    }

    /// Full chain from the base image down to 1x1, each level a triangle-filtered
    /// half of the previous one.
    pub fn mip_chain(&self) -> Vec<MipLevel> {
        let mut levels = Vec::with_capacity(self.mip_level_count() as usize);
        levels.push(MipLevel {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        });
        let Some(mut current) = RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
        else {
            return levels;
        };
        while current.width() > 1 || current.height() > 1 {
            let width = (current.width() / 2).max(1);
            let height = (current.height() / 2).max(1);
            current = imageops::resize(&current, width, height, imageops::FilterType::Triangle);
            levels.push(MipLevel {
                width,
                height,
                pixels: current.as_raw().clone(),
            });
        }
        levels
    }
}

/// Levels needed to reach 1x1 from a `width` x `height` base.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn level_counts() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(8, 2), 4);
        assert_eq!(mip_level_count(470, 960), 10);
    }

    #[test]
    fn chain_halves_down_to_one_pixel() {
        let texture = DecodedTexture::from_rgba("checker", checker(8, 3)).unwrap();
        let chain = texture.mip_chain();
        let sizes: Vec<(u32, u32)> = chain.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(8, 3), (4, 1), (2, 1), (1, 1)]);
        for level in &chain {
            assert_eq!(level.pixels.len(), (level.width * level.height * 4) as usize);
        }
        // a checkerboard averages to grey
        let last = &chain[3].pixels;
        assert!(last[0] > 64 && last[0] < 192);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = DecodedTexture::decode("/assets/broken.png", b"not an image").unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }
}
