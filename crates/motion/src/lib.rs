//! Motion: everything that moves the hero scene without touching the GPU.
//!
//! # Invariants
//! - Carousel sampling is a pure function of absolute elapsed time. It keeps
//!   no memory of earlier samples, so skipped frames, pauses and restarts
//!   need no special handling.
//! - Sampled opacities sum to one and at most two slides are non-zero.
//! - Layout writes the whole preset in a single assignment; a frame never sees
//!   a partly applied layout.

mod bob;
mod carousel;
mod layout;

pub use bob::{BOB_AMPLITUDE, BOB_FREQUENCY, idle_bob};
pub use carousel::{
    CarouselError, CarouselState, DEFAULT_CYCLE_MS, DEFAULT_FADE_MS, SlideCarousel,
    SlideDescriptor, apply_readiness,
};
pub use layout::{
    Breakpoint, LayoutError, LayoutPreset, LayoutTable, MOBILE_BREAKPOINT_PX, ResizeCoalescer,
    ViewportLayoutController,
};

pub fn crate_info() -> &'static str {
    "showcase-motion v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("motion"));
    }
}
