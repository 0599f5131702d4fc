//! Unit conversions used throughout the synthesis engine.
//!
//! Patch banks describe their parameters in perceptual units: decibels and
//! centibels for level, cents for pitch and filter frequency, timecents for
//! durations. The engine works in linear gain, frequency ratios, Hz, and
//! seconds. All functions are allocation-free and suitable for `no_std`.
//!
//! # Level
//!
//! - [`db_to_linear`] / [`linear_to_db`] - decibels and linear gain
//! - [`centibels_to_linear`] - attenuation in centibels (tenths of a dB)
//!
//! # Pitch
//!
//! - [`semitones_to_ratio`] / [`cents_to_ratio`] - intervals as playback ratios
//! - [`cents_to_hz`] - absolute cents (8.176 Hz reference) to Hz
//!
//! # Time
//!
//! - [`timecents_to_seconds`] - 1200 timecents per doubling, -12000 is "instant"

use libm::{expf, exp2f, logf};

/// Timecent value treated as zero duration.
///
/// Patch banks use -12000 timecents (about 1 ms) as their "no time" default.
/// Anything at or below this threshold resolves to an instantaneous segment.
pub const INSTANT_TIMECENTS: f32 = -11950.0;

/// Frequency of absolute-cent zero (MIDI key 0), in Hz.
pub const CENTS_REFERENCE_HZ: f32 = 8.175_799;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use wavefont_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Gains at or below 1e-10 map to -200 dB rather than negative infinity.
///
/// # Example
/// ```rust
/// use wavefont_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Convert an attenuation in centibels to a linear gain factor.
///
/// Positive values attenuate: 60 cB is -6 dB.
#[inline]
pub fn centibels_to_linear(centibels: f32) -> f32 {
    db_to_linear(-centibels * 0.1)
}

/// Convert an interval in semitones to a frequency ratio.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    exp2f(semitones / 12.0)
}

/// Convert an interval in cents to a frequency ratio.
///
/// 100 cents = 1 semitone.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    exp2f(cents / 1200.0)
}

/// Convert absolute cents to Hz.
///
/// Absolute cents count up from MIDI key 0 (8.176 Hz), so 6900 cents is 440 Hz.
#[inline]
pub fn cents_to_hz(cents: f32) -> f32 {
    CENTS_REFERENCE_HZ * exp2f(cents / 1200.0)
}

/// Convert timecents to seconds.
///
/// Values at or below [`INSTANT_TIMECENTS`] return exactly `0.0`.
///
/// # Example
/// ```rust
/// use wavefont_core::timecents_to_seconds;
///
/// assert_eq!(timecents_to_seconds(-12000.0), 0.0);
/// assert!((timecents_to_seconds(0.0) - 1.0).abs() < 1e-6);
/// assert!((timecents_to_seconds(1200.0) - 2.0).abs() < 1e-5);
/// ```
#[inline]
pub fn timecents_to_seconds(timecents: f32) -> f32 {
    if timecents <= INSTANT_TIMECENTS {
        0.0
    } else {
        exp2f(timecents / 1200.0)
    }
}

/// Convert seconds to the nearest whole number of samples, never negative.
#[inline]
pub fn seconds_to_samples(seconds: f32, sample_rate: f32) -> u32 {
    let samples = seconds * sample_rate;
    if samples <= 0.0 { 0 } else { (samples + 0.5) as u32 }
}

/// Flush denormal floats to zero.
///
/// Filter state decaying toward zero can fall into the IEEE 754 subnormal
/// range, where arithmetic is drastically slower on most CPUs.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_linear_roundtrip_points() {
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-4);
        assert!((db_to_linear(20.0) - 10.0).abs() < 1e-3);
        assert!((linear_to_db(0.1) + 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_linear_to_db_floor() {
        assert!(linear_to_db(0.0) <= -199.0);
    }

    #[test]
    fn test_centibels() {
        assert!((centibels_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((centibels_to_linear(200.0) - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_pitch_ratios() {
        assert!((semitones_to_ratio(12.0) - 2.0).abs() < 1e-5);
        assert!((semitones_to_ratio(-12.0) - 0.5).abs() < 1e-6);
        assert!((cents_to_ratio(1200.0) - 2.0).abs() < 1e-5);
        assert!((cents_to_ratio(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cents_to_hz_a4() {
        let hz = cents_to_hz(6900.0);
        assert!((hz - 440.0).abs() < 0.05, "6900 cents should be 440 Hz, got {hz}");
    }

    #[test]
    fn test_timecents_instant_threshold() {
        assert_eq!(timecents_to_seconds(-12000.0), 0.0);
        assert_eq!(timecents_to_seconds(-32768.0), 0.0);
        assert!(timecents_to_seconds(-11900.0) > 0.0);
    }

    #[test]
    fn test_seconds_to_samples() {
        assert_eq!(seconds_to_samples(1.0, 44100.0), 44100);
        assert_eq!(seconds_to_samples(-1.0, 44100.0), 0);
        assert_eq!(seconds_to_samples(0.0, 44100.0), 0);
        assert_eq!(seconds_to_samples(0.01, 44100.0), 441);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-25), 0.0);
        assert_eq!(flush_denormal(0.5), 0.5);
    }
}
