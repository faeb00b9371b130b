use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use showcase_common::Transform;

/// Viewports narrower than this use the mobile preset.
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

/// Placement of the main object for one device class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPreset {
    pub translation: Vec3,
    pub rotation_y: f32,
    pub scale: f32,
}

impl LayoutPreset {
    /// Centred in the camera's view and slightly smaller.
    pub const MOBILE: Self = Self {
        translation: Vec3::new(2.0, 0.0, 0.0),
        rotation_y: 0.0,
        scale: 0.85,
    };

    /// Pushed to the right, leaving room for the hero copy.
    pub const DESKTOP: Self = Self {
        translation: Vec3::new(9.0, 0.0, 0.0),
        rotation_y: 0.0,
        scale: 1.0,
    };

    /// Overwrite `target` with this preset in one assignment.
    pub fn write_to(&self, target: &mut Transform) {
        *target = Transform {
            position: self.translation,
            rotation: Quat::from_rotation_y(self.rotation_y),
            scale: Vec3::splat(self.scale),
        };
    }
}

/// A preset that applies from `min_width_px` upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub min_width_px: u32,
    pub name: String,
    pub preset: LayoutPreset,
}

impl Breakpoint {
    pub fn new(min_width_px: u32, name: impl Into<String>, preset: LayoutPreset) -> Self {
        Self {
            min_width_px,
            name: name.into(),
            preset,
        }
    }
}

/// Errors from breakpoint table validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("breakpoint table is empty")]
    Empty,
    #[error("first breakpoint must start at 0 px, got {0} px")]
    NoZeroBreakpoint(u32),
    #[error("breakpoint at {next} px must be wider than the previous one at {previous} px")]
    Unordered { previous: u32, next: u32 },
}

/// Ordered breakpoints covering every width from 0 upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Breakpoint>", into = "Vec<Breakpoint>")]
pub struct LayoutTable {
    breakpoints: Vec<Breakpoint>,
}

impl LayoutTable {
    pub fn new(breakpoints: Vec<Breakpoint>) -> Result<Self, LayoutError> {
        let first = breakpoints.first().ok_or(LayoutError::Empty)?;
        if first.min_width_px != 0 {
            return Err(LayoutError::NoZeroBreakpoint(first.min_width_px));
        }
        for pair in breakpoints.windows(2) {
            if pair[1].min_width_px <= pair[0].min_width_px {
                return Err(LayoutError::Unordered {
                    previous: pair[0].min_width_px,
                    next: pair[1].min_width_px,
                });
            }
        }
        Ok(Self { breakpoints })
    }

    /// Index of the widest breakpoint not wider than `width_px`.
    pub fn select_index(&self, width_px: u32) -> usize {
        self.breakpoints
            .partition_point(|b| b.min_width_px <= width_px)
            .saturating_sub(1)
    }

    pub fn select(&self, width_px: u32) -> &Breakpoint {
        &self.breakpoints[self.select_index(width_px)]
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self {
            breakpoints: vec![
                Breakpoint::new(0, "mobile", LayoutPreset::MOBILE),
                Breakpoint::new(MOBILE_BREAKPOINT_PX, "desktop", LayoutPreset::DESKTOP),
            ],
        }
    }
}

impl TryFrom<Vec<Breakpoint>> for LayoutTable {
    type Error = LayoutError;

    fn try_from(breakpoints: Vec<Breakpoint>) -> Result<Self, Self::Error> {
        Self::new(breakpoints)
    }
}

impl From<LayoutTable> for Vec<Breakpoint> {
    fn from(table: LayoutTable) -> Self {
        table.breakpoints
    }
}

/// Places the main object according to the viewport width.
///
/// Only the subject moves; the camera stays fixed.
#[derive(Debug, Clone, Default)]
pub struct ViewportLayoutController {
    table: LayoutTable,
    active: Option<usize>,
}

impl ViewportLayoutController {
    pub fn new(table: LayoutTable) -> Self {
        Self {
            table,
            active: None,
        }
    }

    pub fn preset_for(&self, viewport_width_px: u32) -> LayoutPreset {
        self.table.select(viewport_width_px).preset
    }

    /// Select the preset for `viewport_width_px` and write it onto `target`.
    pub fn apply(&mut self, viewport_width_px: u32, target: &mut Transform) -> LayoutPreset {
        let index = self.table.select_index(viewport_width_px);
        let breakpoint = &self.table.breakpoints()[index];
        if self.active != Some(index) {
            tracing::debug!(
                width = viewport_width_px,
                layout = %breakpoint.name,
                "layout preset changed"
            );
        }
        self.active = Some(index);
        breakpoint.preset.write_to(target);
        breakpoint.preset
    }

    /// Breakpoint written by the last `apply`, if any.
    pub fn active(&self) -> Option<&Breakpoint> {
        self.active.map(|i| &self.table.breakpoints()[i])
    }

    /// Resting position of the main object under the active preset.
    pub fn base_translation(&self) -> Vec3 {
        self.active()
            .map(|b| b.preset.translation)
            .unwrap_or(Vec3::ZERO)
    }

    pub fn table(&self) -> &LayoutTable {
        &self.table
    }
}

/// Keeps only the newest resize so a burst is applied once per frame.
#[derive(Debug, Clone, Default)]
pub struct ResizeCoalescer<T> {
    pending: Option<T>,
    dropped: u64,
}

impl<T> ResizeCoalescer<T> {
    pub fn new() -> Self {
        Self {
            pending: None,
            dropped: 0,
        }
    }

    pub fn push(&mut self, size: T) {
        if self.pending.replace(size).is_some() {
            self.dropped += 1;
        }
    }

    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resize events superseded before they were applied.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_belongs_to_desktop() {
        let layout = ViewportLayoutController::default();
        assert_eq!(layout.preset_for(767), LayoutPreset::MOBILE);
        assert_eq!(layout.preset_for(768), LayoutPreset::DESKTOP);
        assert_eq!(layout.preset_for(0), LayoutPreset::MOBILE);
    }

    #[test]
    fn phone_width_uses_mobile_preset() {
        let mut layout = ViewportLayoutController::default();
        let mut t = Transform::default();
        let preset = layout.apply(375, &mut t);
        assert_eq!(preset.translation, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(t.position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(t.scale, Vec3::splat(0.85));
        assert_eq!(layout.active().unwrap().name, "mobile");
    }

    #[test]
    fn full_hd_width_uses_desktop_preset() {
        let mut layout = ViewportLayoutController::default();
        let mut t = Transform::default();
        layout.apply(1920, &mut t);
        assert_eq!(t.position, Vec3::new(9.0, 0.0, 0.0));
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(layout.base_translation(), Vec3::new(9.0, 0.0, 0.0));
    }

    #[test]
    fn apply_overwrites_every_component() {
        let mut layout = ViewportLayoutController::default();
        let mut t = Transform {
            position: Vec3::new(-4.0, 0.13, 7.0),
            rotation: Quat::from_rotation_z(1.0),
            scale: Vec3::new(3.0, 2.0, 1.0),
        };
        layout.apply(500, &mut t);
        let mut expected = Transform::default();
        LayoutPreset::MOBILE.write_to(&mut expected);
        assert_eq!(t, expected);
    }

    #[test]
    fn resize_across_breakpoint_switches_back_and_forth() {
        let mut layout = ViewportLayoutController::default();
        let mut t = Transform::default();
        for (width, x) in [(1024, 9.0), (600, 2.0), (768, 9.0), (767, 2.0)] {
            layout.apply(width, &mut t);
            assert_eq!(t.position.x, x);
        }
    }

    #[test]
    fn extra_device_class_without_new_branches() {
        let tablet = LayoutPreset {
            translation: Vec3::new(5.0, 0.0, 0.0),
            rotation_y: -0.2,
            scale: 0.9,
        };
        let table = LayoutTable::new(vec![
            Breakpoint::new(0, "mobile", LayoutPreset::MOBILE),
            Breakpoint::new(600, "tablet", tablet),
            Breakpoint::new(1200, "desktop", LayoutPreset::DESKTOP),
        ])
        .unwrap();
        let layout = ViewportLayoutController::new(table);
        assert_eq!(layout.preset_for(599), LayoutPreset::MOBILE);
        assert_eq!(layout.preset_for(600), tablet);
        assert_eq!(layout.preset_for(1199), tablet);
        assert_eq!(layout.preset_for(u32::MAX), LayoutPreset::DESKTOP);
    }

    #[test]
    fn table_validation() {
        assert_eq!(LayoutTable::new(vec![]), Err(LayoutError::Empty));
        assert_eq!(
            LayoutTable::new(vec![Breakpoint::new(10, "a", LayoutPreset::MOBILE)]),
            Err(LayoutError::NoZeroBreakpoint(10))
        );
        assert!(matches!(
            LayoutTable::new(vec![
                Breakpoint::new(0, "a", LayoutPreset::MOBILE),
                Breakpoint::new(0, "b", LayoutPreset::DESKTOP),
            ]),
            Err(LayoutError::Unordered { .. })
        ));
    }

    #[test]
    fn table_round_trips_through_json_with_validation() {
        let json = serde_json::to_string(&LayoutTable::default()).unwrap();
        let table: LayoutTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, LayoutTable::default());
        assert!(serde_json::from_str::<LayoutTable>("[]").is_err());
    }

    #[test]
    fn coalescer_keeps_latest_size() {
        let mut resizes = ResizeCoalescer::new();
        assert_eq!(resizes.take(), None::<(u32, u32)>);
        resizes.push((800, 600));
        resizes.push((810, 600));
        resizes.push((820, 610));
        assert!(resizes.is_pending());
        assert_eq!(resizes.take(), Some((820, 610)));
        assert_eq!(resizes.take(), None);
        assert_eq!(resizes.dropped(), 2);
    }
}
