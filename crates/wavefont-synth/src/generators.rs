//! Patch-bank generator values and two-layer resolution.
//!
//! A patch bank describes each zone with a sparse set of *generators*, stored
//! in the bank's own perceptual units:
//!
//! | Unit | Used for | Conversion |
//! |------|----------|------------|
//! | timecents | envelope and LFO delay times | `2^(tc/1200)` seconds |
//! | centibels | attenuation, sustain, filter Q | tenths of a dB |
//! | absolute cents | filter cutoff, LFO rate | `8.176 × 2^(c/1200)` Hz |
//! | cents | pitch modulation depths, fine tune | 1/100 semitone |
//! | 0.1 % | pan, modulation-envelope sustain | per mille |
//!
//! Generators are specified at two levels. Instrument zones carry absolute
//! values, falling back to the instrument's global zone and then to the
//! defaults in [`GeneratorKind::default_value`]. Preset zones carry *offsets*
//! that are added on top, falling back to the preset's global zone and then
//! to zero. [`resolve`] performs that layering and converts the result into
//! the natural units of [`ZoneParams`].

use wavefont_core::{centibels_to_linear, cents_to_hz, timecents_to_seconds};

use crate::catalog::LoopMode;

/// Generator identifiers understood by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeneratorKind {
    /// Modulation LFO to pitch, cents at full LFO excursion.
    ModLfoToPitch,
    /// Vibrato LFO to pitch, cents at full LFO excursion.
    VibLfoToPitch,
    /// Modulation envelope to pitch, cents at full envelope level.
    ModEnvToPitch,
    /// Filter cutoff, absolute cents.
    InitialFilterFc,
    /// Filter resonance, centibels above DC gain.
    InitialFilterQ,
    /// Modulation LFO to filter cutoff, cents.
    ModLfoToFilterFc,
    /// Modulation envelope to filter cutoff, cents.
    ModEnvToFilterFc,
    /// Modulation LFO to volume, centibels.
    ModLfoToVolume,
    /// Pan, 0.1 % units from -500 (left) to 500 (right).
    Pan,
    /// Modulation LFO delay, timecents.
    DelayModLfo,
    /// Modulation LFO frequency, absolute cents.
    FreqModLfo,
    /// Vibrato LFO delay, timecents.
    DelayVibLfo,
    /// Vibrato LFO frequency, absolute cents.
    FreqVibLfo,
    /// Modulation envelope delay, timecents.
    DelayModEnv,
    /// Modulation envelope attack, timecents.
    AttackModEnv,
    /// Modulation envelope hold, timecents.
    HoldModEnv,
    /// Modulation envelope decay, timecents.
    DecayModEnv,
    /// Modulation envelope sustain, 0.1 % below full scale.
    SustainModEnv,
    /// Modulation envelope release, timecents.
    ReleaseModEnv,
    /// Key number to modulation envelope hold, timecents per key.
    KeynumToModEnvHold,
    /// Key number to modulation envelope decay, timecents per key.
    KeynumToModEnvDecay,
    /// Volume envelope delay, timecents.
    DelayVolEnv,
    /// Volume envelope attack, timecents.
    AttackVolEnv,
    /// Volume envelope hold, timecents.
    HoldVolEnv,
    /// Volume envelope decay, timecents.
    DecayVolEnv,
    /// Volume envelope sustain, centibels of attenuation.
    SustainVolEnv,
    /// Volume envelope release, timecents.
    ReleaseVolEnv,
    /// Key number to volume envelope hold, timecents per key.
    KeynumToVolEnvHold,
    /// Key number to volume envelope decay, timecents per key.
    KeynumToVolEnvDecay,
    /// Initial attenuation, centibels.
    InitialAttenuation,
    /// Coarse tune, semitones.
    CoarseTune,
    /// Fine tune, cents.
    FineTune,
    /// Loop mode: 0 none, 1 continuous, 3 sustain-only. Instrument level only.
    SampleModes,
    /// Cents of pitch change per key.
    ScaleTuning,
    /// Exclusive class; 0 means none. Instrument level only.
    ExclusiveClass,
    /// Root key override; -1 means use the sample's. Instrument level only.
    OverridingRootKey,
}

impl GeneratorKind {
    /// Number of generator kinds.
    pub const COUNT: usize = 36;

    /// Every generator kind, in declaration order.
    pub const ALL: [GeneratorKind; Self::COUNT] = [
        Self::ModLfoToPitch,
        Self::VibLfoToPitch,
        Self::ModEnvToPitch,
        Self::InitialFilterFc,
        Self::InitialFilterQ,
        Self::ModLfoToFilterFc,
        Self::ModEnvToFilterFc,
        Self::ModLfoToVolume,
        Self::Pan,
        Self::DelayModLfo,
        Self::FreqModLfo,
        Self::DelayVibLfo,
        Self::FreqVibLfo,
        Self::DelayModEnv,
        Self::AttackModEnv,
        Self::HoldModEnv,
        Self::DecayModEnv,
        Self::SustainModEnv,
        Self::ReleaseModEnv,
        Self::KeynumToModEnvHold,
        Self::KeynumToModEnvDecay,
        Self::DelayVolEnv,
        Self::AttackVolEnv,
        Self::HoldVolEnv,
        Self::DecayVolEnv,
        Self::SustainVolEnv,
        Self::ReleaseVolEnv,
        Self::KeynumToVolEnvHold,
        Self::KeynumToVolEnvDecay,
        Self::InitialAttenuation,
        Self::CoarseTune,
        Self::FineTune,
        Self::SampleModes,
        Self::ScaleTuning,
        Self::ExclusiveClass,
        Self::OverridingRootKey,
    ];

    /// Value used when neither the zone nor its global zone sets the generator.
    pub const fn default_value(self) -> f32 {
        match self {
            Self::InitialFilterFc => 13500.0,
            Self::DelayModLfo
            | Self::DelayVibLfo
            | Self::DelayModEnv
            | Self::AttackModEnv
            | Self::HoldModEnv
            | Self::DecayModEnv
            | Self::ReleaseModEnv
            | Self::DelayVolEnv
            | Self::AttackVolEnv
            | Self::HoldVolEnv
            | Self::DecayVolEnv
            | Self::ReleaseVolEnv => -12000.0,
            Self::ScaleTuning => 100.0,
            Self::OverridingRootKey => -1.0,
            _ => 0.0,
        }
    }

    /// Whether the generator is meaningful only at the instrument level.
    ///
    /// Preset-level values for these kinds are ignored during resolution.
    pub const fn instrument_only(self) -> bool {
        matches!(
            self,
            Self::SampleModes | Self::ExclusiveClass | Self::OverridingRootKey
        )
    }

    /// Human-readable generator name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ModLfoToPitch => "modLfoToPitch",
            Self::VibLfoToPitch => "vibLfoToPitch",
            Self::ModEnvToPitch => "modEnvToPitch",
            Self::InitialFilterFc => "initialFilterFc",
            Self::InitialFilterQ => "initialFilterQ",
            Self::ModLfoToFilterFc => "modLfoToFilterFc",
            Self::ModEnvToFilterFc => "modEnvToFilterFc",
            Self::ModLfoToVolume => "modLfoToVolume",
            Self::Pan => "pan",
            Self::DelayModLfo => "delayModLFO",
            Self::FreqModLfo => "freqModLFO",
            Self::DelayVibLfo => "delayVibLFO",
            Self::FreqVibLfo => "freqVibLFO",
            Self::DelayModEnv => "delayModEnv",
            Self::AttackModEnv => "attackModEnv",
            Self::HoldModEnv => "holdModEnv",
            Self::DecayModEnv => "decayModEnv",
            Self::SustainModEnv => "sustainModEnv",
            Self::ReleaseModEnv => "releaseModEnv",
            Self::KeynumToModEnvHold => "keynumToModEnvHold",
            Self::KeynumToModEnvDecay => "keynumToModEnvDecay",
            Self::DelayVolEnv => "delayVolEnv",
            Self::AttackVolEnv => "attackVolEnv",
            Self::HoldVolEnv => "holdVolEnv",
            Self::DecayVolEnv => "decayVolEnv",
            Self::SustainVolEnv => "sustainVolEnv",
            Self::ReleaseVolEnv => "releaseVolEnv",
            Self::KeynumToVolEnvHold => "keynumToVolEnvHold",
            Self::KeynumToVolEnvDecay => "keynumToVolEnvDecay",
            Self::InitialAttenuation => "initialAttenuation",
            Self::CoarseTune => "coarseTune",
            Self::FineTune => "fineTune",
            Self::SampleModes => "sampleModes",
            Self::ScaleTuning => "scaleTuning",
            Self::ExclusiveClass => "exclusiveClass",
            Self::OverridingRootKey => "overridingRootKey",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// A sparse set of generator values for one zone.
#[derive(Clone, Debug, PartialEq)]
pub struct Generators {
    values: [Option<f32>; GeneratorKind::COUNT],
}

impl Default for Generators {
    fn default() -> Self {
        Self {
            values: [None; GeneratorKind::COUNT],
        }
    }
}

impl Generators {
    /// An empty set: every generator unspecified.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, kind: GeneratorKind, value: f32) -> Self {
        self.set(kind, value);
        self
    }

    /// Specify a generator value.
    pub fn set(&mut self, kind: GeneratorKind, value: f32) {
        self.values[kind.index()] = Some(value);
    }

    /// Remove a generator value.
    pub fn clear(&mut self, kind: GeneratorKind) {
        self.values[kind.index()] = None;
    }

    /// The value specified at this level, if any.
    pub fn get(&self, kind: GeneratorKind) -> Option<f32> {
        self.values[kind.index()]
    }

    /// Whether no generator is specified.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Instrument-level value: this zone, then `global`, then the default.
    fn absolute(&self, global: &Generators, kind: GeneratorKind) -> f32 {
        self.get(kind)
            .or_else(|| global.get(kind))
            .unwrap_or_else(|| kind.default_value())
    }

    /// Preset-level offset: this zone, then `global`, then zero.
    fn offset(&self, global: &Generators, kind: GeneratorKind) -> f32 {
        if kind.instrument_only() {
            return 0.0;
        }
        self.get(kind).or_else(|| global.get(kind)).unwrap_or(0.0)
    }
}

/// One layer of a zone: its own generators plus its parent's global zone.
#[derive(Clone, Copy, Debug)]
pub struct Layer<'a> {
    /// Generators set on the zone itself.
    pub local: &'a Generators,
    /// Generators set on the enclosing instrument's or preset's global zone.
    pub global: &'a Generators,
}

/// Envelope parameters in natural units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeParams {
    /// Delay before the attack starts, seconds.
    pub delay: f32,
    /// Attack duration, seconds.
    pub attack: f32,
    /// Hold duration at full level, seconds.
    pub hold: f32,
    /// Decay duration, seconds.
    pub decay: f32,
    /// Sustain level, 0.0 to 1.0.
    pub sustain: f32,
    /// Release duration, seconds.
    pub release: f32,
    /// Hold scaling in timecents per key away from key 60.
    pub key_to_hold: f32,
    /// Decay scaling in timecents per key away from key 60.
    pub key_to_decay: f32,
}

impl Default for EnvelopeParams {
    /// Instant attack to full sustain, no tail beyond the fast release.
    fn default() -> Self {
        Self {
            delay: 0.0,
            attack: 0.0,
            hold: 0.0,
            decay: 0.0,
            sustain: 1.0,
            release: 0.0,
            key_to_hold: 0.0,
            key_to_decay: 0.0,
        }
    }
}

/// LFO parameters in natural units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LfoParams {
    /// Onset delay, seconds.
    pub delay: f32,
    /// Rate, Hz.
    pub frequency: f32,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            delay: 0.0,
            frequency: cents_to_hz(0.0),
        }
    }
}

/// Fully resolved playback parameters for one zone.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneParams {
    /// Amplitude envelope.
    pub amp_env: EnvelopeParams,
    /// Modulation envelope.
    pub mod_env: EnvelopeParams,
    /// Modulation envelope to pitch, cents.
    pub mod_env_to_pitch: f32,
    /// Modulation envelope to filter cutoff, cents.
    pub mod_env_to_filter: f32,
    /// Modulation LFO.
    pub mod_lfo: LfoParams,
    /// Modulation LFO to pitch, cents.
    pub mod_lfo_to_pitch: f32,
    /// Modulation LFO to filter cutoff, cents.
    pub mod_lfo_to_filter: f32,
    /// Modulation LFO to volume, dB.
    pub mod_lfo_to_volume: f32,
    /// Vibrato LFO.
    pub vib_lfo: LfoParams,
    /// Vibrato LFO to pitch, cents.
    pub vib_lfo_to_pitch: f32,
    /// Filter cutoff, absolute cents.
    pub filter_cutoff: f32,
    /// Filter resonance, dB.
    pub filter_q_db: f32,
    /// Attenuation, dB (positive is quieter).
    pub attenuation_db: f32,
    /// Pan from -0.5 (left) to 0.5 (right).
    pub pan: f32,
    /// Root key override; `None` uses the sample's root key.
    pub root_key: Option<u8>,
    /// Transposition in semitones, coarse and fine combined.
    pub transpose: f32,
    /// Cents of pitch change per key.
    pub scale_tuning: f32,
    /// Loop mode override; `None` uses the sample's loop mode.
    pub loop_mode: Option<LoopMode>,
    /// Exclusive class; 0 means none.
    pub exclusive_class: u16,
}

impl Default for ZoneParams {
    fn default() -> Self {
        Self {
            amp_env: EnvelopeParams::default(),
            mod_env: EnvelopeParams::default(),
            mod_env_to_pitch: 0.0,
            mod_env_to_filter: 0.0,
            mod_lfo: LfoParams::default(),
            mod_lfo_to_pitch: 0.0,
            mod_lfo_to_filter: 0.0,
            mod_lfo_to_volume: 0.0,
            vib_lfo: LfoParams::default(),
            vib_lfo_to_pitch: 0.0,
            filter_cutoff: GeneratorKind::InitialFilterFc.default_value(),
            filter_q_db: 0.0,
            attenuation_db: 0.0,
            pan: 0.0,
            root_key: None,
            transpose: 0.0,
            scale_tuning: 100.0,
            loop_mode: None,
            exclusive_class: 0,
        }
    }
}

/// Layer preset offsets over instrument values and convert to natural units.
pub fn resolve(instrument: Layer<'_>, preset: Layer<'_>) -> ZoneParams {
    let value = |kind: GeneratorKind| {
        instrument.local.absolute(instrument.global, kind)
            + preset.local.offset(preset.global, kind)
    };
    // Instrument-only generators that are "unset" keep their sentinel
    let explicit = |kind: GeneratorKind| {
        instrument
            .local
            .get(kind)
            .or_else(|| instrument.global.get(kind))
    };

    let amp_env = EnvelopeParams {
        delay: timecents_to_seconds(value(GeneratorKind::DelayVolEnv)),
        attack: timecents_to_seconds(value(GeneratorKind::AttackVolEnv)),
        hold: timecents_to_seconds(value(GeneratorKind::HoldVolEnv)),
        decay: timecents_to_seconds(value(GeneratorKind::DecayVolEnv)),
        sustain: centibels_to_linear(value(GeneratorKind::SustainVolEnv).max(0.0)),
        release: timecents_to_seconds(value(GeneratorKind::ReleaseVolEnv)),
        key_to_hold: value(GeneratorKind::KeynumToVolEnvHold),
        key_to_decay: value(GeneratorKind::KeynumToVolEnvDecay),
    };
    let mod_env = EnvelopeParams {
        delay: timecents_to_seconds(value(GeneratorKind::DelayModEnv)),
        attack: timecents_to_seconds(value(GeneratorKind::AttackModEnv)),
        hold: timecents_to_seconds(value(GeneratorKind::HoldModEnv)),
        decay: timecents_to_seconds(value(GeneratorKind::DecayModEnv)),
        sustain: (1.0 - value(GeneratorKind::SustainModEnv) / 1000.0).clamp(0.0, 1.0),
        release: timecents_to_seconds(value(GeneratorKind::ReleaseModEnv)),
        key_to_hold: value(GeneratorKind::KeynumToModEnvHold),
        key_to_decay: value(GeneratorKind::KeynumToModEnvDecay),
    };

    let root_key = explicit(GeneratorKind::OverridingRootKey)
        .filter(|&key| (0.0..=127.0).contains(&key))
        .map(|key| key as u8);
    let loop_mode = explicit(GeneratorKind::SampleModes).map(LoopMode::from_sample_modes);
    let exclusive_class = explicit(GeneratorKind::ExclusiveClass)
        .map(|class| class.clamp(0.0, f32::from(u16::MAX)) as u16)
        .unwrap_or(0);

    ZoneParams {
        amp_env,
        mod_env,
        mod_env_to_pitch: value(GeneratorKind::ModEnvToPitch),
        mod_env_to_filter: value(GeneratorKind::ModEnvToFilterFc),
        mod_lfo: LfoParams {
            delay: timecents_to_seconds(value(GeneratorKind::DelayModLfo)),
            frequency: cents_to_hz(value(GeneratorKind::FreqModLfo)),
        },
        mod_lfo_to_pitch: value(GeneratorKind::ModLfoToPitch),
        mod_lfo_to_filter: value(GeneratorKind::ModLfoToFilterFc),
        mod_lfo_to_volume: value(GeneratorKind::ModLfoToVolume) * 0.1,
        vib_lfo: LfoParams {
            delay: timecents_to_seconds(value(GeneratorKind::DelayVibLfo)),
            frequency: cents_to_hz(value(GeneratorKind::FreqVibLfo)),
        },
        vib_lfo_to_pitch: value(GeneratorKind::VibLfoToPitch),
        filter_cutoff: value(GeneratorKind::InitialFilterFc),
        filter_q_db: value(GeneratorKind::InitialFilterQ).max(0.0) * 0.1,
        attenuation_db: value(GeneratorKind::InitialAttenuation).max(0.0) * 0.1,
        pan: (value(GeneratorKind::Pan) / 1000.0).clamp(-0.5, 0.5),
        root_key,
        transpose: value(GeneratorKind::CoarseTune) + value(GeneratorKind::FineTune) / 100.0,
        scale_tuning: value(GeneratorKind::ScaleTuning),
        loop_mode,
        exclusive_class,
    }
}
