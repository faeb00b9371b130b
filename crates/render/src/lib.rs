//! Rendering: the renderer-agnostic interface and the loop that drives it.
//!
//! # Invariants
//! - A renderer reads the scene; it never mutates it.
//! - Exactly one render per honoured frame, and at most one frame pending.
//! - After `dispose` no frame is drawn and no frame is requested.
//! - Teardown cancels the pending frame before releasing GPU resources.
//!
//! [`TextRenderer`] and [`ManualScheduler`] let the whole loop run without a
//! GPU or a window; the wgpu backend lives in `showcase-render-wgpu`.

mod config;
mod render_loop;
mod renderer;
mod scheduler;

pub use config::{ConfigError, ShowcaseConfig};
pub use render_loop::{LoopState, RenderLoop, RenderLoopError};
pub use renderer::{Renderer, TextRenderer};
pub use scheduler::{FrameScheduler, FrameToken, ManualScheduler};

pub fn crate_info() -> &'static str {
    "showcase-render v0.1.0"
}
