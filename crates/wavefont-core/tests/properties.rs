//! Property-based tests for wavefont-core DSP primitives.
//!
//! Tests filter stability under control-rate sweeps, LFO output bounds, and
//! interpolation kernel bounds using proptest for randomized input generation.

use proptest::prelude::*;
use wavefont_core::{Lfo, LowpassSvf, cubic, linear, timecents_to_seconds};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// For any cutoff and resonance, the low-pass filter produces finite
    /// output for random finite input, even when the cutoff jumps every
    /// 8 samples the way envelope and LFO modulation move it.
    #[test]
    fn svf_stability_under_sweep(
        cutoffs in prop::collection::vec(10.0f32..24000.0f32, 8),
        q_db in 0.0f32..96.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut svf = LowpassSvf::new(48000.0);
        svf.set_resonance_db(q_db);

        for (i, &sample) in input.iter().enumerate() {
            if i % 8 == 0 {
                svf.set_cutoff(cutoffs[(i / 8) % cutoffs.len()]);
            }
            let out = svf.process(sample);
            prop_assert!(
                out.is_finite(),
                "SVF (q_db={}) produced non-finite output {} for input {}",
                q_db, out, sample
            );
        }
    }

    /// LFO output stays within [-1, 1] for any rate, delay, and block size.
    #[test]
    fn lfo_bounded(
        freq in 0.0f32..100.0f32,
        delay in 0u32..10_000,
        block in 1u32..512,
    ) {
        let mut lfo = Lfo::new(44100.0, freq);
        lfo.set_delay_samples(delay);
        for _ in 0..200 {
            lfo.advance(block);
            let v = lfo.value();
            prop_assert!((-1.0..=1.0).contains(&v), "LFO value {} out of range", v);
        }
    }

    /// Linear interpolation never leaves the interval spanned by its endpoints.
    #[test]
    fn linear_within_endpoints(
        a in -1.0f32..=1.0f32,
        b in -1.0f32..=1.0f32,
        frac in 0.0f32..1.0f32,
    ) {
        let y = linear(a, b, frac);
        prop_assert!(y >= a.min(b) - 1e-6 && y <= a.max(b) + 1e-6);
    }

    /// Cubic interpolation of full-scale input overshoots by a bounded amount.
    #[test]
    fn cubic_bounded_overshoot(
        x in prop::array::uniform4(-1.0f32..=1.0f32),
        frac in 0.0f32..1.0f32,
    ) {
        let y = cubic(x[0], x[1], x[2], x[3], frac);
        prop_assert!(y.abs() <= 1.5, "cubic overshoot {}", y);
    }

    /// Durations grow monotonically with timecents above the instant threshold.
    #[test]
    fn timecents_monotonic(tc in -11900.0f32..8000.0f32, step in 1.0f32..1200.0f32) {
        prop_assert!(timecents_to_seconds(tc + step) > timecents_to_seconds(tc));
    }
}
