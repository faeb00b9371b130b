//! Shared value types used across the showcase crates.
//!
//! # Invariants
//! - Types here are plain data: no GPU handles, no interior mutability.

mod types;

pub use types::{Color, SurfaceTarget, Transform};

pub fn crate_info() -> &'static str {
    "showcase-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
