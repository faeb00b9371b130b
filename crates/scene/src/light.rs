use glam::Vec3;
use showcase_common::Color;

/// Shadow map request for a light. Stored with the light; see the render
/// backend for what is honoured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub map_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Uniform light from every direction.
    Ambient,
    /// Parallel rays from the node position toward `target`.
    Directional {
        target: Vec3,
        shadow: Option<ShadowSettings>,
    },
    /// Cone from the node position toward `target`. `angle` is the half-angle
    /// in radians.
    Spot {
        target: Vec3,
        angle: f32,
        penumbra: f32,
        decay: f32,
    },
    /// Omnidirectional light from the node position.
    Point { decay: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: Color,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Ambient,
        }
    }

    pub fn directional(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Directional {
                target: Vec3::ZERO,
                shadow: None,
            },
        }
    }

    pub fn spot(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Spot {
                target: Vec3::ZERO,
                angle: std::f32::consts::FRAC_PI_3,
                penumbra: 0.0,
                decay: 2.0,
            },
        }
    }

    pub fn point(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Point { decay: 2.0 },
        }
    }

    /// Request a square shadow map. Ignored for non-directional lights.
    pub fn with_shadow(mut self, map_size: u32) -> Self {
        if let LightKind::Directional { shadow, .. } = &mut self.kind {
            *shadow = Some(ShadowSettings { map_size });
        }
        self
    }

    pub fn casts_shadow(&self) -> bool {
        matches!(
            self.kind,
            LightKind::Directional {
                shadow: Some(_),
                ..
            }
        )
    }
}
