//! Resonant low-pass filter for per-voice tone shaping.
//!
//! # Topology
//!
//! Implements the Topology-Preserving Transform (TPT) state variable filter
//! after Zavalishin, "The Art of VA Filter Design" (2012). The trapezoidal
//! integrators keep the filter stable while its cutoff is swept by envelopes
//! and LFOs at control rate, which Direct Form biquads do not guarantee.
//!
//! # Bypass
//!
//! Patch banks specify the cutoff in absolute cents with a default near
//! 20 kHz. A cutoff at or above [`BYPASS_RATIO`] of the sample rate is
//! treated as "filter off": [`LowpassSvf::is_active`] reports `false` and
//! callers skip the filter entirely, leaving the signal bit-exact.
//!
//! # Reference
//!
//! Zavalishin, "The Art of VA Filter Design", rev. 2.1.2 (2018), Chapter 3.

use core::f32::consts::{FRAC_PI_4, PI};
use libm::{powf, tanf};

use crate::fast_math::fast_tan;
use crate::math::flush_denormal;

/// Cutoff-to-sample-rate ratio at and above which the filter is bypassed.
pub const BYPASS_RATIO: f32 = 0.499;

/// Two-pole (12 dB/oct) resonant low-pass filter.
///
/// ## Parameters
///
/// - `cutoff`: Cutoff frequency in Hz (clamped to 10.0 .. sr×0.499)
/// - `resonance`: Q factor (clamped to 0.5 .. 40.0, default 0.707)
///
/// # Example
///
/// ```rust
/// use wavefont_core::LowpassSvf;
///
/// let mut svf = LowpassSvf::new(48000.0);
/// svf.set_cutoff(1000.0);
/// svf.set_resonance_db(6.0);
///
/// let output = svf.process(0.5);
/// ```
#[derive(Debug, Clone)]
pub struct LowpassSvf {
    ic1eq: f32,
    ic2eq: f32,
    g: f32,
    k: f32,
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    active: bool,
}

impl Default for LowpassSvf {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl LowpassSvf {
    /// Create a new filter, bypassed (cutoff at Nyquist, Butterworth Q).
    pub fn new(sample_rate: f32) -> Self {
        let mut svf = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
            k: 0.0,
            sample_rate,
            cutoff: sample_rate * 0.5,
            resonance: core::f32::consts::FRAC_1_SQRT_2,
            active: false,
        };
        svf.update_coefficients();
        svf
    }

    /// Set cutoff frequency in Hz.
    ///
    /// Frequencies at or above `sample_rate × BYPASS_RATIO` deactivate the
    /// filter. The integrator state is kept so that re-activation on the next
    /// sub-block does not click.
    pub fn set_cutoff(&mut self, freq: f32) {
        let limit = self.sample_rate * BYPASS_RATIO;
        self.active = freq < limit;
        self.cutoff = freq.clamp(10.0, limit);
        self.update_coefficients();
    }

    /// Get current cutoff frequency in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set resonance as a Q factor.
    pub fn set_resonance(&mut self, q: f32) {
        self.resonance = q.clamp(0.5, 40.0);
        self.update_coefficients();
    }

    /// Set resonance as the height of the resonant peak in dB.
    ///
    /// 0 dB maps to Q = 1.0; patch banks store this value in centibels.
    pub fn set_resonance_db(&mut self, db: f32) {
        self.set_resonance(powf(10.0, db / 20.0));
    }

    /// Get current Q factor.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Whether the filter currently affects the signal.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Change the sample rate, keeping cutoff and resonance.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.set_cutoff(self.cutoff);
    }

    /// Clear integrator state.
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    fn update_coefficients(&mut self) {
        let arg = PI * self.cutoff / self.sample_rate;
        self.g = if arg < FRAC_PI_4 { fast_tan(arg) } else { tanf(arg) };
        self.k = 1.0 / self.resonance;
    }

    /// Filter one sample, returning the low-pass output.
    ///
    /// Always runs the filter, regardless of [`is_active`](Self::is_active).
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let v3 = input - self.ic2eq;
        let v1 = (self.g * v3 + self.ic1eq) / (1.0 + self.g * (self.g + self.k));
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = flush_denormal(2.0 * v1 - self.ic1eq);
        self.ic2eq = flush_denormal(2.0 * v2 - self.ic2eq);

        v2
    }
}
