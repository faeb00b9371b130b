use showcase_common::Color;

/// Lighting model of a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Color and texture only, no lighting.
    Unlit,
    Standard {
        metalness: f32,
        roughness: f32,
    },
    /// Standard plus a clear lacquer layer.
    Physical {
        metalness: f32,
        roughness: f32,
        clearcoat: f32,
        clearcoat_roughness: f32,
    },
}

/// A texture reference and whether its pixels have reached the GPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSlot {
    pub source: String,
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub color: Color,
    pub shading: Shading,
    pub opacity: f32,
    pub transparent: bool,
    pub map: Option<TextureSlot>,
}

impl Material {
    fn with_shading(name: impl Into<String>, color: Color, shading: Shading) -> Self {
        Self {
            name: name.into(),
            color,
            shading,
            opacity: 1.0,
            transparent: false,
            map: None,
        }
    }

    pub fn unlit(name: impl Into<String>, color: Color) -> Self {
        Self::with_shading(name, color, Shading::Unlit)
    }

    pub fn standard(name: impl Into<String>, color: Color, metalness: f32, roughness: f32) -> Self {
        Self::with_shading(
            name,
            color,
            Shading::Standard {
                metalness,
                roughness,
            },
        )
    }

    pub fn physical(
        name: impl Into<String>,
        color: Color,
        metalness: f32,
        roughness: f32,
        clearcoat: f32,
        clearcoat_roughness: f32,
    ) -> Self {
        Self::with_shading(
            name,
            color,
            Shading::Physical {
                metalness,
                roughness,
                clearcoat,
                clearcoat_roughness,
            },
        )
    }

    /// Mark as alpha-blended with the given opacity.
    pub fn blended(mut self, opacity: f32) -> Self {
        self.transparent = true;
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_texture(mut self, source: impl Into<String>) -> Self {
        self.map = Some(TextureSlot {
            source: source.into(),
            ready: false,
        });
        self
    }

    /// Whether this material contributes any pixels this frame.
    pub fn is_visible(&self) -> bool {
        !self.transparent || self.opacity > 0.0
    }

    /// Textured materials draw nothing until their texture is ready.
    pub fn texture_pending(&self) -> bool {
        self.map.as_ref().is_some_and(|slot| !slot.ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blended_clamps_opacity() {
        let m = Material::unlit("slide", Color::WHITE).blended(1.7);
        assert!(m.transparent);
        assert_eq!(m.opacity, 1.0);
        assert!(!Material::unlit("x", Color::WHITE).blended(0.0).is_visible());
    }

    #[test]
    fn texture_starts_pending() {
        let m = Material::unlit("slide", Color::WHITE).with_texture("/assets/a.png");
        assert!(m.texture_pending());
        assert!(!Material::unlit("bezel", Color::BLACK).texture_pending());
    }
}
