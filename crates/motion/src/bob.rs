/// Peak vertical offset of the idle float.
pub const BOB_AMPLITUDE: f64 = 0.2;
/// Angular frequency in radians per millisecond (period of 2π seconds).
pub const BOB_FREQUENCY: f64 = 0.001;

/// Vertical idle offset at `now_ms`. Always within `±BOB_AMPLITUDE`.
pub fn idle_bob(now_ms: f64) -> f32 {
    let offset = BOB_AMPLITUDE * (now_ms * BOB_FREQUENCY).sin();
    if offset.is_finite() { offset as f32 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bob_starts_at_rest() {
        assert_eq!(idle_bob(0.0), 0.0);
    }

    #[test]
    fn bob_peaks_at_quarter_period() {
        let quarter = std::f64::consts::FRAC_PI_2 / BOB_FREQUENCY;
        assert!((idle_bob(quarter) - 0.2).abs() < 1e-6);
        assert!((idle_bob(3.0 * quarter) + 0.2).abs() < 1e-6);
    }

    #[test]
    fn bob_never_exceeds_amplitude() {
        let limit = BOB_AMPLITUDE as f32;
        let mut t = 0.0;
        while t < 50_000.0 {
            assert!(idle_bob(t).abs() <= limit);
            t += 7.3;
        }
        // wall-clock style timestamps
        for t in [1.7e12, 1.7e12 + 1570.8, 9.9e15, -3.3e9] {
            assert!(idle_bob(t).abs() <= limit);
        }
        assert_eq!(idle_bob(f64::NAN), 0.0);
    }
}
