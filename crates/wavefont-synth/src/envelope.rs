//! Six-stage envelope generator stepped once per render sub-block.
//!
//! Each voice runs two of these: an amplitude envelope and a modulation
//! envelope that drives pitch and filter cutoff. They share the stage
//! sequence `Delay → Attack → Hold → Decay → Sustain → Release → Finished`
//! but differ in curve shape:
//!
//! | Segment | Amplitude | Modulation |
//! |---------|-----------|------------|
//! | Attack | linear | linear, shortened by velocity |
//! | Decay | exponential, -80 dB over the decay time | linear |
//! | Release | exponential, -80 dB over the release time | linear to zero |
//!
//! Stage durations are whole sample counts. [`Envelope::advance`] consumes a
//! block of samples and may cross several stage boundaries in one call,
//! so the level is exact at the end of every block regardless of block size.

use libm::{exp2f, expf, logf, powf};
use wavefont_core::seconds_to_samples;

use crate::generators::EnvelopeParams;

/// Release time used when a zone specifies none, and for forced quick release.
pub const FAST_RELEASE_SECONDS: f32 = 0.01;

/// Amplitude below which a releasing amplitude envelope finishes early.
pub const SILENCE_THRESHOLD: f32 = 1.0e-5;

/// Natural log of -80 dB: exponential segments fall this far over their duration.
const EXP_SEGMENT_SPAN: f32 = -9.210_34;

/// Envelope stages
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnvelopeStage {
    /// Waiting before the attack; output is zero.
    #[default]
    Delay,
    /// Rising from zero to full level.
    Attack,
    /// Holding at full level.
    Hold,
    /// Falling toward the sustain level.
    Decay,
    /// Holding at the sustain level until release.
    Sustain,
    /// Falling to zero after note-off.
    Release,
    /// Terminal; output is zero.
    Finished,
}

impl EnvelopeStage {
    fn next(self) -> Self {
        match self {
            Self::Delay => Self::Attack,
            Self::Attack => Self::Hold,
            Self::Hold => Self::Decay,
            Self::Decay => Self::Sustain,
            Self::Sustain => Self::Sustain,
            Self::Release | Self::Finished => Self::Finished,
        }
    }
}

/// Which curve family the envelope uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeKind {
    /// Volume envelope: exponential decay and release.
    Amplitude,
    /// Modulation envelope: linear segments throughout.
    Modulation,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Curve {
    /// Add this much per sample
    Linear(f32),
    /// Multiply by this much per sample
    Exponential(f32),
}

/// Block-stepped DAHDSR envelope.
///
/// # Example
///
/// ```rust
/// use wavefont_synth::{Envelope, EnvelopeKind, EnvelopeParams, EnvelopeStage};
///
/// let params = EnvelopeParams { attack: 0.01, release: 0.1, ..Default::default() };
/// let mut env = Envelope::new(EnvelopeKind::Amplitude, &params, 60, 127, 44100.0);
///
/// env.advance(441);
/// assert_eq!(env.stage(), EnvelopeStage::Sustain);
///
/// env.release();
/// env.advance(44100);
/// assert!(env.is_finished());
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    kind: EnvelopeKind,
    stage: EnvelopeStage,
    level: f32,
    sample_rate: f32,
    /// Key- and velocity-scaled segment times
    params: EnvelopeParams,
    /// Samples left in the current stage
    remaining: u32,
    curve: Curve,
    /// Level snapped to when the current stage completes
    target: f32,
}

impl Envelope {
    /// Create an envelope for a note and enter its first non-empty stage.
    ///
    /// Hold and decay times are scaled by the key's distance from key 60.
    /// A modulation envelope's attack shortens as velocity rises.
    pub fn new(
        kind: EnvelopeKind,
        params: &EnvelopeParams,
        key: u8,
        velocity: u8,
        sample_rate: f32,
    ) -> Self {
        let key_offset = 60.0 - f32::from(key.min(127));
        let mut scaled = *params;
        scaled.hold *= exp2f(key_offset * params.key_to_hold / 1200.0);
        scaled.decay *= exp2f(key_offset * params.key_to_decay / 1200.0);
        scaled.sustain = params.sustain.clamp(0.0, 1.0);
        if kind == EnvelopeKind::Modulation {
            scaled.attack *= (145.0 - f32::from(velocity.min(127))) / 144.0;
        }

        let mut env = Self {
            kind,
            stage: EnvelopeStage::Delay,
            level: 0.0,
            sample_rate,
            params: scaled,
            remaining: 0,
            curve: Curve::Linear(0.0),
            target: 0.0,
        };
        env.enter(EnvelopeStage::Delay);
        env
    }

    /// Current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current level in `[0.0, 1.0]`.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Envelope kind.
    pub fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    /// Samples left in the current stage; `u32::MAX` while sustaining or finished.
    pub fn remaining_samples(&self) -> u32 {
        self.remaining
    }

    /// Whether the envelope has completed.
    pub fn is_finished(&self) -> bool {
        self.stage == EnvelopeStage::Finished
    }

    /// Whether the envelope is in its release stage.
    pub fn is_releasing(&self) -> bool {
        self.stage == EnvelopeStage::Release
    }

    /// Advance by `samples`, crossing stage boundaries as needed.
    pub fn advance(&mut self, samples: u32) {
        let mut left = samples;
        while left > 0 && !matches!(self.stage, EnvelopeStage::Sustain | EnvelopeStage::Finished) {
            let step = left.min(self.remaining);
            self.apply(step);
            self.remaining -= step;
            left -= step;
            if self.remaining == 0 {
                self.level = self.target;
                self.enter(self.stage.next());
            }
        }

        if self.kind == EnvelopeKind::Amplitude
            && self.stage == EnvelopeStage::Release
            && self.level < SILENCE_THRESHOLD
        {
            self.finish();
        }
    }

    /// Move to release from the current level, using the envelope's release time.
    pub fn release(&mut self) {
        let seconds = if self.params.release > 0.0 {
            self.params.release
        } else {
            FAST_RELEASE_SECONDS
        };
        self.release_over(seconds);
    }

    /// Move to release with an explicit duration.
    ///
    /// An envelope that is already releasing only ever gets shorter.
    pub fn release_over(&mut self, seconds: f32) {
        if self.is_finished() {
            return;
        }
        if self.stage == EnvelopeStage::Release && seconds >= self.remaining_seconds() {
            return;
        }
        self.stage = EnvelopeStage::Release;
        self.setup_release(seconds);
        if self.kind == EnvelopeKind::Amplitude && self.level < SILENCE_THRESHOLD {
            self.finish();
        }
    }

    /// Stop immediately at zero.
    pub fn finish(&mut self) {
        self.stage = EnvelopeStage::Finished;
        self.level = 0.0;
        self.remaining = u32::MAX;
        self.curve = Curve::Linear(0.0);
        self.target = 0.0;
    }

    fn remaining_seconds(&self) -> f32 {
        self.remaining as f32 / self.sample_rate
    }

    fn samples(&self, seconds: f32) -> u32 {
        seconds_to_samples(seconds, self.sample_rate)
    }

    fn apply(&mut self, samples: u32) {
        match self.curve {
            Curve::Linear(slope) => self.level += slope * samples as f32,
            Curve::Exponential(coeff) => self.level *= powf(coeff, samples as f32),
        }
        self.level = self.level.clamp(0.0, 1.0);
    }

    /// Enter `stage`, skipping forward through any zero-length stages.
    fn enter(&mut self, stage: EnvelopeStage) {
        self.stage = stage;
        loop {
            match self.stage {
                EnvelopeStage::Delay => {
                    self.level = 0.0;
                    self.hold_for(self.params.delay, 0.0);
                }
                EnvelopeStage::Attack => {
                    self.level = 0.0;
                    self.remaining = self.samples(self.params.attack);
                    self.curve = Curve::Linear(1.0 / self.remaining.max(1) as f32);
                    self.target = 1.0;
                }
                EnvelopeStage::Hold => {
                    self.level = 1.0;
                    self.hold_for(self.params.hold, 1.0);
                }
                EnvelopeStage::Decay => self.setup_decay(),
                EnvelopeStage::Sustain => {
                    self.level = self.params.sustain;
                    self.remaining = u32::MAX;
                    self.curve = Curve::Linear(0.0);
                    self.target = self.level;
                    if self.kind == EnvelopeKind::Amplitude && self.level < SILENCE_THRESHOLD {
                        self.finish();
                    }
                    return;
                }
                EnvelopeStage::Release => return,
                EnvelopeStage::Finished => {
                    self.finish();
                    return;
                }
            }
            if self.remaining > 0 {
                return;
            }
            self.level = self.target;
            self.stage = self.stage.next();
        }
    }

    fn hold_for(&mut self, seconds: f32, level: f32) {
        self.remaining = self.samples(seconds);
        self.curve = Curve::Linear(0.0);
        self.target = level;
    }

    fn setup_decay(&mut self) {
        let sustain = self.params.sustain;
        let total = self.samples(self.params.decay);
        self.target = sustain;
        if total == 0 || sustain >= 1.0 {
            self.remaining = 0;
            return;
        }

        match self.kind {
            EnvelopeKind::Amplitude => {
                // Fall -80 dB over the full decay time, stopping at sustain
                let coeff = expf(EXP_SEGMENT_SPAN / total as f32);
                let to_sustain = if sustain > 0.0 {
                    (logf(sustain) / EXP_SEGMENT_SPAN * total as f32) as u32
                } else {
                    total
                };
                self.remaining = to_sustain.min(total);
                self.curve = Curve::Exponential(coeff);
            }
            EnvelopeKind::Modulation => {
                // Full-scale slope; reaching sustain takes (1 - sustain) of the time
                self.remaining = ((1.0 - sustain) * total as f32) as u32;
                self.curve = Curve::Linear(-1.0 / total as f32);
            }
        }
    }

    fn setup_release(&mut self, seconds: f32) {
        let samples = self.samples(seconds).max(1);
        self.remaining = samples;
        self.target = 0.0;
        self.curve = match self.kind {
            EnvelopeKind::Amplitude => Curve::Exponential(expf(EXP_SEGMENT_SPAN / samples as f32)),
            EnvelopeKind::Modulation => Curve::Linear(-self.level / samples as f32),
        };
    }
}
