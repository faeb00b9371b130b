use showcase_assets::TextureEvent;
use showcase_common::SurfaceTarget;
use showcase_motion::{
    SlideCarousel, SlideDescriptor, ViewportLayoutController, apply_readiness, idle_bob,
};
use showcase_scene::SceneHandle;

use crate::renderer::Renderer;
use crate::scheduler::{FrameScheduler, FrameToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Built, nothing scheduled yet.
    Idle,
    Running,
    Stopped,
    /// Resources released; the loop can never run again.
    Disposed,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderLoopError {
    #[error("render loop has been disposed")]
    Disposed,
    #[error("carousel has {carousel} slides but the scene has {scene}")]
    SlideCountMismatch { carousel: usize, scene: usize },
    #[error("scene has no camera")]
    MissingCamera,
    #[error("render failed: {0}")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Drives the hero scene one frame at a time.
///
/// Each frame applies the idle bob, writes carousel opacities, and renders
/// once. Frames are requested from the host's [`FrameScheduler`] and only a
/// frame the loop actually requested is honoured.
pub struct RenderLoop<R: Renderer, S: FrameScheduler> {
    scene: SceneHandle,
    renderer: R,
    scheduler: S,
    carousel: SlideCarousel,
    layout: ViewportLayoutController,
    viewport_width: u32,
    state: LoopState,
    pending: Option<FrameToken>,
    frames: u64,
}

impl<R: Renderer, S: FrameScheduler> RenderLoop<R, S> {
    /// Take ownership of an assembled scene and lay it out for
    /// `viewport_width_px`.
    pub fn new(scene: SceneHandle, mut renderer: R, scheduler: S, viewport_width_px: u32) -> Self {
        renderer.resize(scene.surface());
        let carousel = SlideCarousel::new(scene_slides(&scene));
        let mut render_loop = Self {
            scene,
            renderer,
            scheduler,
            carousel,
            layout: ViewportLayoutController::default(),
            viewport_width: viewport_width_px,
            state: LoopState::Idle,
            pending: None,
            frames: 0,
        };
        render_loop.apply_layout();
        render_loop
    }

    /// Replace the carousel timing. The carousel must cover exactly the
    /// scene's slides.
    pub fn with_carousel(mut self, carousel: SlideCarousel) -> Result<Self, RenderLoopError> {
        let (carousel_len, scene_len) = (carousel.slides().len(), self.scene.slide_count());
        if carousel_len != scene_len {
            return Err(RenderLoopError::SlideCountMismatch {
                carousel: carousel_len,
                scene: scene_len,
            });
        }
        self.carousel = carousel;
        Ok(self)
    }

    pub fn with_layout(mut self, layout: ViewportLayoutController) -> Self {
        self.layout = layout;
        self.apply_layout();
        self
    }

    fn apply_layout(&mut self) {
        if let Some(transform) = self.scene.main_transform_mut() {
            self.layout.apply(self.viewport_width, transform);
        }
    }

    /// Begin requesting frames.
    pub fn start(&mut self) -> Result<(), RenderLoopError> {
        match self.state {
            LoopState::Disposed => Err(RenderLoopError::Disposed),
            LoopState::Running => Ok(()),
            LoopState::Idle | LoopState::Stopped => {
                self.state = LoopState::Running;
                self.pending = Some(self.scheduler.request_frame());
                tracing::debug!("render loop started");
                Ok(())
            }
        }
    }

    /// Cancel the pending frame. Does nothing unless running.
    pub fn stop(&mut self) {
        if self.state != LoopState::Running {
            return;
        }
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel_frame(token);
        }
        self.state = LoopState::Stopped;
        tracing::debug!(frames = self.frames, "render loop stopped");
    }

    /// Stop, then release GPU resources and the scene. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.state == LoopState::Disposed {
            return;
        }
        self.stop();
        self.renderer.release();
        self.scene.release();
        self.state = LoopState::Disposed;
        tracing::info!(frames = self.frames, "render loop disposed");
    }

    /// Host callback for a due frame. Returns `None` for frames the loop did
    /// not ask for, including any that arrive after `stop` or `dispose`.
    pub fn on_frame(&mut self, now_ms: f64) -> Result<Option<R::Output>, RenderLoopError> {
        if self.state != LoopState::Running || self.pending.take().is_none() {
            return Ok(None);
        }

        let base = self.layout.base_translation();
        if let Some(transform) = self.scene.main_transform_mut() {
            transform.position.y = base.y + idle_bob(now_ms);
        }

        let mut opacities = self.carousel.sample_opacities(now_ms);
        apply_readiness(&mut opacities, &self.scene.slide_readiness());
        self.scene.set_slide_opacities(&opacities);

        let Some(camera) = self.scene.camera().copied() else {
            self.stop();
            return Err(RenderLoopError::MissingCamera);
        };
        match self.renderer.render(self.scene.graph(), &camera) {
            Ok(output) => {
                self.frames += 1;
                self.pending = Some(self.scheduler.request_frame());
                Ok(Some(output))
            }
            Err(e) => {
                self.stop();
                Err(RenderLoopError::Render(Box::new(e)))
            }
        }
    }

    /// Host callback for a new surface size and viewport width.
    pub fn on_resize(&mut self, surface: SurfaceTarget, viewport_width_px: u32) {
        if self.state == LoopState::Disposed {
            return;
        }
        if self.scene.resize(surface) && surface.has_area() {
            self.renderer.resize(surface);
        }
        self.viewport_width = viewport_width_px;
        self.apply_layout();
    }

    /// Upload a finished slide texture, or note that it failed. A failed slide
    /// stays hidden; the rest of the carousel keeps cycling.
    pub fn on_texture_event(&mut self, event: TextureEvent) {
        if self.state == LoopState::Disposed {
            return;
        }
        match event {
            TextureEvent::Loaded { slide, texture } => {
                let Some(material) = self.scene.slide_material(slide) else {
                    tracing::warn!(slide, "texture for unknown slide");
                    return;
                };
                match self.renderer.upload_texture(material, &texture) {
                    Ok(()) => {
                        self.scene.mark_slide_ready(slide);
                        tracing::debug!(slide, source = %texture.source, "slide ready");
                    }
                    Err(e) => tracing::warn!(slide, error = %e, "slide upload failed"),
                }
            }
            TextureEvent::Failed {
                slide,
                source,
                error,
            } => {
                tracing::warn!(slide, %source, %error, "slide texture failed to load");
            }
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn layout(&self) -> &ViewportLayoutController {
        &self.layout
    }
}

fn scene_slides(scene: &SceneHandle) -> SlideDescriptor {
    let sources: Vec<String> = (0..scene.slide_count())
        .filter_map(|i| scene.slide_material(i))
        .filter_map(|id| scene.graph().material(id))
        .filter_map(|m| m.map.as_ref().map(|slot| slot.source.clone()))
        .collect();
    SlideDescriptor::new(sources).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TextRenderer;
    use crate::scheduler::ManualScheduler;
    use glam::Vec3;
    use showcase_assets::{AssetError, DecodedTexture};
    use showcase_motion::{BOB_AMPLITUDE, LayoutPreset};
    use showcase_scene::SceneAssembler;

    const EPS: f32 = 1e-5;

    fn new_loop(width: u32) -> RenderLoop<TextRenderer, ManualScheduler> {
        let scene = SceneAssembler::new(SlideDescriptor::landing_defaults())
            .with_seed(3)
            .build(Some(SurfaceTarget::new(width, 800)))
            .unwrap();
        RenderLoop::new(scene, TextRenderer::new(), ManualScheduler::new(), width)
    }

    fn texture(slide: usize) -> TextureEvent {
        TextureEvent::Loaded {
            slide,
            texture: DecodedTexture {
                source: format!("/assets/mobile_ui_{}.png", slide + 1),
                width: 2,
                height: 2,
                pixels: vec![255; 16],
            },
        }
    }

    fn main_position(l: &RenderLoop<TextRenderer, ManualScheduler>) -> Vec3 {
        let scene = l.scene();
        scene.graph().node(scene.main_object()).unwrap().transform.position
    }

    #[test]
    fn frames_only_run_while_started() {
        let mut l = new_loop(1280);
        assert!(l.on_frame(0.0).unwrap().is_none());
        l.start().unwrap();
        assert_eq!(l.state(), LoopState::Running);
        assert!(l.on_frame(16.0).unwrap().is_some());
        assert_eq!(l.frames_drawn(), 1);
        assert!(l.pending_frame().is_some());
        assert_eq!(l.scheduler().requested(), 2);
    }

    #[test]
    fn unrequested_frames_are_ignored() {
        let mut l = new_loop(1280);
        l.start().unwrap();
        assert!(l.on_frame(16.0).unwrap().is_some());
        l.stop();
        assert!(l.on_frame(32.0).unwrap().is_none());
        assert_eq!(l.frames_drawn(), 1);
    }

    #[test]
    fn stop_twice_is_harmless() {
        let mut l = new_loop(1280);
        l.start().unwrap();
        l.stop();
        l.stop();
        assert_eq!(l.state(), LoopState::Stopped);
        assert_eq!(l.scheduler().cancelled(), 1);
        assert_eq!(l.scheduler().pending(), None);
        assert_eq!(l.pending_frame(), None);
    }

    #[test]
    fn restart_after_stop() {
        let mut l = new_loop(1280);
        l.start().unwrap();
        l.stop();
        l.start().unwrap();
        assert!(l.on_frame(100.0).unwrap().is_some());
    }

    #[test]
    fn dispose_releases_once_and_blocks_restart() {
        let mut l = new_loop(1280);
        l.start().unwrap();
        l.dispose();
        l.dispose();
        assert_eq!(l.state(), LoopState::Disposed);
        assert_eq!(l.renderer().releases(), 1);
        assert!(l.scene().is_released());
        assert!(matches!(l.start(), Err(RenderLoopError::Disposed)));
        assert!(l.on_frame(50.0).unwrap().is_none());
        assert_eq!(l.scheduler().pending(), None);
    }

    #[test]
    fn dispose_without_start() {
        let mut l = new_loop(1280);
        l.dispose();
        assert_eq!(l.renderer().releases(), 1);
        assert_eq!(l.scheduler().requested(), 0);
    }

    #[test]
    fn layout_applied_at_construction() {
        let desktop = new_loop(1280);
        assert_eq!(main_position(&desktop).x, LayoutPreset::DESKTOP.translation.x);
        let mobile = new_loop(375);
        assert_eq!(main_position(&mobile).x, LayoutPreset::MOBILE.translation.x);
    }

    #[test]
    fn bob_moves_only_y_within_amplitude() {
        let mut l = new_loop(1280);
        l.start().unwrap();
        let mut now = 0.0;
        for _ in 0..200 {
            l.on_frame(now).unwrap();
            let p = main_position(&l);
            assert_eq!(p.x, 9.0);
            assert_eq!(p.z, 0.0);
            assert!(p.y.abs() <= BOB_AMPLITUDE as f32 + EPS);
            now += 97.0;
        }
    }

    #[test]
    fn resize_across_breakpoint_keeps_bob_relative() {
        let mut l = new_loop(1280);
        l.start().unwrap();
        l.on_frame(1500.0).unwrap();
        l.on_resize(SurfaceTarget::new(375, 800), 375);
        let p = main_position(&l);
        assert_eq!(p.x, 2.0);
        assert_eq!(p.y, 0.0);
        l.on_frame(1516.0).unwrap();
        let expected = idle_bob(1516.0);
        assert!((main_position(&l).y - expected).abs() < EPS);
        assert_eq!(l.renderer().surface(), Some(SurfaceTarget::new(375, 800)));
    }

    #[test]
    fn zero_height_resize_keeps_aspect() {
        let mut l = new_loop(1280);
        let before = l.scene().camera().unwrap().aspect;
        l.on_resize(SurfaceTarget::new(1280, 0), 1280);
        let after = l.scene().camera().unwrap().aspect;
        assert_eq!(before, after);
        assert!(after.is_finite());
        assert_eq!(l.renderer().surface(), Some(SurfaceTarget::new(1280, 800)));
    }

    #[test]
    fn zero_width_resize_keeps_projection_finite() {
        let mut l = new_loop(1280);
        l.on_resize(SurfaceTarget::new(0, 800), 0);
        let camera = l.scene().camera().unwrap();
        assert!(camera.aspect > 0.0);
        assert!(camera.view_projection().is_finite());
        assert_eq!(l.renderer().surface(), Some(SurfaceTarget::new(1280, 800)));
        l.start().unwrap();
        assert!(l.on_frame(16.0).unwrap().is_some());
    }

    #[test]
    fn slides_stay_hidden_until_ready() {
        let mut l = new_loop(1280);
        l.start().unwrap();
        l.on_frame(0.0).unwrap();
        assert_eq!(l.scene().slide_opacities(), vec![0.0; 5]);

        l.on_texture_event(texture(0));
        l.on_frame(16.0).unwrap();
        assert_eq!(l.scene().slide_opacities()[0], 1.0);
        assert!(l.renderer().has_texture(l.scene().slide_material(0).unwrap()));
    }

    #[test]
    fn crossfade_written_to_materials() {
        let mut l = new_loop(1280);
        for slide in 0..5 {
            l.on_texture_event(texture(slide));
        }
        l.start().unwrap();
        l.on_frame(3500.0).unwrap();
        assert_eq!(l.scene().slide_opacities(), vec![0.5, 0.5, 0.0, 0.0, 0.0]);
        l.on_frame(4000.0).unwrap();
        assert_eq!(l.scene().slide_opacities(), vec![0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn failed_texture_leaves_slide_hidden() {
        let mut l = new_loop(1280);
        l.on_texture_event(TextureEvent::Failed {
            slide: 1,
            source: "/assets/mobile_ui_2.png".into(),
            error: AssetError::InvalidId("/assets/mobile_ui_2.png".into()),
        });
        l.on_texture_event(texture(0));
        l.start().unwrap();
        l.on_frame(3500.0).unwrap();
        assert_eq!(l.scene().slide_opacities(), vec![0.5, 0.0, 0.0, 0.0, 0.0]);
        assert!(!l.scene().slide_readiness()[1]);
    }

    #[test]
    fn carousel_follows_scene_slides() {
        let l = new_loop(1280);
        assert_eq!(l.carousel.slides(), &SlideDescriptor::landing_defaults());
    }

    #[test]
    fn carousel_must_match_scene_slides() {
        let short = SlideCarousel::new(SlideDescriptor::new(["a.png", "b.png"]).unwrap());
        let err = new_loop(1280).with_carousel(short).err().unwrap();
        assert!(matches!(
            err,
            RenderLoopError::SlideCountMismatch {
                carousel: 2,
                scene: 5
            }
        ));

        let slower = SlideCarousel::with_timing(SlideDescriptor::landing_defaults(), 6000.0, 500.0)
            .unwrap();
        let l = new_loop(1280).with_carousel(slower).unwrap();
        assert_eq!(l.carousel.cycle_ms(), 6000.0);
    }

    #[test]
    fn missing_camera_stops_instead_of_stalling() {
        let mut l = new_loop(1280);
        let camera = l.scene.camera_node();
        if let Some(node) = l.scene.graph_mut().node_mut(camera) {
            node.kind = showcase_scene::NodeKind::Group;
        }
        l.start().unwrap();
        assert!(matches!(l.on_frame(16.0), Err(RenderLoopError::MissingCamera)));
        assert_eq!(l.state(), LoopState::Stopped);
        assert!(l.pending_frame().is_none());
    }

    #[derive(Debug, thiserror::Error)]
    #[error("device lost")]
    struct DeviceLost;

    /// Draws `budget` frames, then fails every render.
    struct FlakyRenderer {
        budget: u32,
    }

    impl Renderer for FlakyRenderer {
        type Output = ();
        type Error = DeviceLost;

        fn render(
            &mut self,
            _scene: &showcase_scene::SceneGraph,
            _camera: &showcase_scene::PerspectiveCamera,
        ) -> Result<(), DeviceLost> {
            if self.budget == 0 {
                return Err(DeviceLost);
            }
            self.budget -= 1;
            Ok(())
        }

        fn resize(&mut self, _surface: SurfaceTarget) {}

        fn upload_texture(
            &mut self,
            _material: showcase_scene::MaterialId,
            _texture: &DecodedTexture,
        ) -> Result<(), DeviceLost> {
            Ok(())
        }

        fn release(&mut self) {}
    }

    #[test]
    fn render_error_stops_the_loop() {
        let scene = SceneAssembler::new(SlideDescriptor::landing_defaults())
            .with_seed(3)
            .build(Some(SurfaceTarget::new(1280, 800)))
            .unwrap();
        let mut l = RenderLoop::new(scene, FlakyRenderer { budget: 1 }, ManualScheduler::new(), 1280);
        l.start().unwrap();
        l.scheduler_mut().fire();
        assert!(l.on_frame(16.0).unwrap().is_some());

        l.scheduler_mut().fire();
        let err = l.on_frame(32.0).unwrap_err();
        assert!(matches!(err, RenderLoopError::Render(_)));
        assert_eq!(err.to_string(), "render failed: device lost");
        assert_eq!(l.state(), LoopState::Stopped);
        assert!(l.pending_frame().is_none());
        assert!(l.scheduler().pending().is_none());
        assert_eq!(l.frames_drawn(), 1);
        assert!(l.on_frame(48.0).unwrap().is_none());
    }
}
