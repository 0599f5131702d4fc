//! Wavefont Core - DSP primitives for wavetable synthesis
//!
//! This crate provides the small set of signal-processing building blocks the
//! wavefont engine needs per voice, designed for real-time rendering with zero
//! allocation in the audio path.
//!
//! # Components
//!
//! - [`LowpassSvf`] - Resonant TPT low-pass filter, safe to sweep at control rate
//! - [`Lfo`] - Block-stepped LFO with onset delay (triangle)
//! - [`Interpolation`] with [`linear`] and [`cubic`] - resampling kernels for
//!   fractional sample playback
//!
//! ## Utilities
//!
//! - Level: [`db_to_linear`], [`linear_to_db`], [`centibels_to_linear`]
//! - Pitch: [`semitones_to_ratio`], [`cents_to_ratio`], [`cents_to_hz`]
//! - Time: [`timecents_to_seconds`], [`seconds_to_samples`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! wavefont-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod fast_math;
pub mod interpolation;
pub mod lfo;
pub mod math;
pub mod svf;

pub use fast_math::fast_tan;
pub use interpolation::{Interpolation, cubic, linear};
pub use lfo::Lfo;
pub use math::{
    CENTS_REFERENCE_HZ, INSTANT_TIMECENTS, cents_to_hz, cents_to_ratio, centibels_to_linear,
    db_to_linear, flush_denormal, linear_to_db, seconds_to_samples, semitones_to_ratio,
    timecents_to_seconds,
};
pub use svf::{BYPASS_RATIO, LowpassSvf};
