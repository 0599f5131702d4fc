//! Fast approximations for control-rate coefficient math.
//!
//! Filter coefficients are recomputed once per sub-block for every voice, so
//! the `tan` in the bilinear prewarp shows up in profiles with many voices.

/// Padé [3/2] approximation of `tan(x)`.
///
/// Accurate to better than 0.1% for `x` in `[0, π/4]`, which covers cutoff
/// frequencies up to a quarter of the sample rate. Callers needing larger
/// arguments should fall back to [`libm::tanf`].
///
/// # Example
/// ```rust
/// use wavefont_core::fast_tan;
///
/// let x = core::f32::consts::PI * 1000.0 / 48000.0;
/// let exact = libm::tanf(x);
/// assert!((fast_tan(x) - exact).abs() / exact < 0.001);
/// ```
#[inline]
pub fn fast_tan(x: f32) -> f32 {
    let x2 = x * x;
    x * (15.0 - x2) / (15.0 - 6.0 * x2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tan_accuracy_sweep() {
        let mut max_rel: f32 = 0.0;
        for i in 1..=100 {
            let x = i as f32 * core::f32::consts::FRAC_PI_4 / 100.0;
            let exact = libm::tanf(x);
            let rel = (fast_tan(x) - exact).abs() / exact;
            max_rel = max_rel.max(rel);
        }
        assert!(max_rel < 0.001, "max relative error {max_rel}");
    }

    #[test]
    fn tan_zero() {
        assert_eq!(fast_tan(0.0), 0.0);
    }
}
