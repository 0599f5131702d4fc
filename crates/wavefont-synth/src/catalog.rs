//! Patch catalog: samples, zones, and bank/number-addressed presets.
//!
//! A [`Catalog`] is immutable once built and shared by reference between the
//! engine and every voice that plays from it. PCM data lives in [`Sample`]s
//! held behind [`Arc`], so a voice clones a pointer, never audio.
//!
//! Catalogs are produced in two ways:
//!
//! - [`CatalogBuilder`] mirrors a patch bank's two-layer structure
//!   (presets referencing instruments referencing samples) and flattens it
//!   into resolved [`Zone`]s on [`build`](CatalogBuilder::build).
//! - [`Catalog::from_presets`] takes presets whose zones are already
//!   resolved, for callers that synthesize patches programmatically.
//!
//! A bank loader plugs in through [`CatalogSource`]; [`Catalog::load`] turns
//! any load error into an explicitly invalid, empty catalog.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wavefont_synth::{Catalog, PcmData, Preset, Sample, Zone};
//!
//! let sample = Arc::new(Sample::new("sine", PcmData::F32(vec![0.0, 1.0, 0.0, -1.0]), 44100));
//! let catalog = Catalog::from_presets(vec![Preset::new("Sine", 0, 0, vec![Zone::new(sample)])])
//!     .unwrap();
//!
//! assert_eq!(catalog.preset_count(), 1);
//! assert_eq!(catalog.preset_index(0, 0), Some(0));
//! assert_eq!(catalog.matching_zones(0, 60, 100).count(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::CatalogError;
use crate::generators::{Generators, Layer, ZoneParams, resolve};

/// How a sample loops during playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Play once to the end of the sample.
    #[default]
    None,
    /// Wrap from loop end to loop start for the voice's whole lifetime.
    Continuous,
    /// Wrap only until the voice is released, then play out past the loop.
    SustainOnly,
}

impl LoopMode {
    /// Decode a `sampleModes` generator value (0, 1, or 3).
    pub fn from_sample_modes(value: f32) -> Self {
        match value as i32 {
            1 => LoopMode::Continuous,
            3 => LoopMode::SustainOnly,
            _ => LoopMode::None,
        }
    }
}

/// Raw PCM frames, mono.
#[derive(Clone, Debug, PartialEq)]
pub enum PcmData {
    /// 16-bit signed integer frames.
    I16(Vec<i16>),
    /// Floating-point frames in [-1.0, 1.0].
    F32(Vec<f32>),
}

impl PcmData {
    /// Number of frames.
    pub fn len(&self) -> usize {
        match self {
            PcmData::I16(frames) => frames.len(),
            PcmData::F32(frames) => frames.len(),
        }
    }

    /// Whether the sample holds no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A PCM frame type a voice can read.
pub trait PcmFrame: Copy {
    /// Convert to a float in [-1.0, 1.0].
    fn to_f32(self) -> f32;
}

impl PcmFrame for i16 {
    #[inline]
    fn to_f32(self) -> f32 {
        f32::from(self) / 32768.0
    }
}

impl PcmFrame for f32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }
}

/// Mono PCM audio with its pitch and loop metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    name: String,
    data: PcmData,
    sample_rate: u32,
    root_key: u8,
    coarse_tune: i8,
    fine_tune: i8,
    loop_start: u32,
    loop_end: u32,
    loop_mode: LoopMode,
}

impl Sample {
    /// Create an unlooped sample rooted at middle C (key 60).
    pub fn new(name: impl Into<String>, data: PcmData, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            data,
            sample_rate,
            root_key: 60,
            coarse_tune: 0,
            fine_tune: 0,
            loop_start: 0,
            loop_end: 0,
            loop_mode: LoopMode::None,
        }
    }

    /// Set the key at which the sample plays at its native pitch.
    #[must_use]
    pub fn with_root_key(mut self, key: u8) -> Self {
        self.root_key = key.min(127);
        self
    }

    /// Set the pitch correction: whole semitones plus cents.
    #[must_use]
    pub fn with_tune(mut self, coarse: i8, fine_cents: i8) -> Self {
        self.coarse_tune = coarse;
        self.fine_tune = fine_cents;
        self
    }

    /// Set the loop region (`end` exclusive) and default loop mode.
    ///
    /// `end` is clamped to the sample length. A region that is still empty
    /// or reversed afterwards leaves the sample playing unlooped.
    #[must_use]
    pub fn with_loop(mut self, start: u32, end: u32, mode: LoopMode) -> Self {
        let len = u32::try_from(self.len()).unwrap_or(u32::MAX);
        self.loop_start = start;
        self.loop_end = end.min(len);
        self.loop_mode = mode;
        self
    }

    /// Sample name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// PCM frames.
    pub fn data(&self) -> &PcmData {
        &self.data
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the sample holds no frames.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Native sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Root key.
    pub fn root_key(&self) -> u8 {
        self.root_key
    }

    /// Pitch correction in semitones, coarse and fine combined.
    pub fn tune_semitones(&self) -> f32 {
        f32::from(self.coarse_tune) + f32::from(self.fine_tune) / 100.0
    }

    /// Loop start frame.
    pub fn loop_start(&self) -> u32 {
        self.loop_start
    }

    /// Loop end frame (exclusive).
    pub fn loop_end(&self) -> u32 {
        self.loop_end
    }

    /// Loop mode used when the zone does not override it.
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Whether the loop region is non-empty and inside the sample.
    pub fn has_valid_loop(&self) -> bool {
        self.loop_start < self.loop_end && self.loop_end as usize <= self.len()
    }

    fn validate(&self, loop_mode: LoopMode) -> Result<(), CatalogError> {
        if self.is_empty() {
            return Err(CatalogError::EmptySample {
                name: self.name.clone(),
            });
        }
        if self.sample_rate == 0 {
            return Err(CatalogError::ZeroSampleRate {
                name: self.name.clone(),
            });
        }
        if loop_mode != LoopMode::None && !self.has_valid_loop() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                sample = %self.name,
                start = self.loop_start,
                end = self.loop_end,
                "unusable loop, sample plays unlooped"
            );
        }
        Ok(())
    }
}

/// An inclusive key or velocity range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteRange {
    /// Lowest value in the range.
    pub lo: u8,
    /// Highest value in the range.
    pub hi: u8,
}

impl NoteRange {
    /// The full MIDI range, 0 to 127.
    pub const FULL: NoteRange = NoteRange { lo: 0, hi: 127 };

    /// Create a range; bounds are not reordered.
    pub const fn new(lo: u8, hi: u8) -> Self {
        Self { lo, hi }
    }

    /// Whether `value` lies in the range.
    pub fn contains(self, value: u8) -> bool {
        self.lo <= value && value <= self.hi
    }

    /// Overlap of two ranges, if any.
    pub fn intersect(self, other: NoteRange) -> Option<NoteRange> {
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        (lo <= hi).then_some(NoteRange { lo, hi })
    }

    fn is_valid(self) -> bool {
        self.lo <= self.hi && self.hi <= 127
    }
}

impl Default for NoteRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// A key/velocity-scoped binding of a sample to resolved playback parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    /// Keys the zone responds to.
    pub key_range: NoteRange,
    /// Velocities (0-127) the zone responds to.
    pub vel_range: NoteRange,
    /// Sample played by the zone.
    pub sample: Arc<Sample>,
    /// Resolved generator parameters.
    pub params: ZoneParams,
}

impl Zone {
    /// A zone covering every key and velocity with default parameters.
    pub fn new(sample: Arc<Sample>) -> Self {
        Self {
            key_range: NoteRange::FULL,
            vel_range: NoteRange::FULL,
            sample,
            params: ZoneParams::default(),
        }
    }

    /// Restrict the key range.
    #[must_use]
    pub fn with_keys(mut self, range: NoteRange) -> Self {
        self.key_range = range;
        self
    }

    /// Restrict the velocity range.
    #[must_use]
    pub fn with_velocities(mut self, range: NoteRange) -> Self {
        self.vel_range = range;
        self
    }

    /// Replace the playback parameters.
    #[must_use]
    pub fn with_params(mut self, params: ZoneParams) -> Self {
        self.params = params;
        self
    }

    /// Whether the zone responds to `key` at `velocity`.
    pub fn matches(&self, key: u8, velocity: u8) -> bool {
        self.key_range.contains(key) && self.vel_range.contains(velocity)
    }

    /// Effective loop mode: the zone's override, else the sample's.
    pub fn loop_mode(&self) -> LoopMode {
        self.params.loop_mode.unwrap_or(self.sample.loop_mode)
    }

    /// Effective root key: the zone's override, else the sample's.
    pub fn root_key(&self) -> u8 {
        self.params.root_key.unwrap_or(self.sample.root_key)
    }
}

/// A named, bank/number-addressed set of zones.
#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    name: String,
    bank: u16,
    number: u16,
    zones: Vec<Zone>,
}

impl Preset {
    /// Create a preset from resolved zones.
    pub fn new(name: impl Into<String>, bank: u16, number: u16, zones: Vec<Zone>) -> Self {
        Self {
            name: name.into(),
            bank,
            number,
            zones,
        }
    }

    /// Preset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bank number.
    pub fn bank(&self) -> u16 {
        self.bank
    }

    /// Preset (program) number within the bank.
    pub fn number(&self) -> u16 {
        self.number
    }

    /// All zones, in declaration order.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }
}

/// Immutable, shareable collection of presets.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    presets: Vec<Preset>,
    index: BTreeMap<(u16, u16), usize>,
    valid: bool,
}

impl Catalog {
    /// Build a catalog from presets whose zones are already resolved.
    ///
    /// The first preset declared for a (bank, number) pair wins lookups.
    pub fn from_presets(presets: Vec<Preset>) -> Result<Self, CatalogError> {
        for preset in &presets {
            for zone in &preset.zones {
                for range in [zone.key_range, zone.vel_range] {
                    if !range.is_valid() {
                        return Err(CatalogError::InvalidRange {
                            owner: preset.name.clone(),
                            lo: range.lo,
                            hi: range.hi,
                        });
                    }
                }
                zone.sample.validate(zone.loop_mode())?;
            }
        }

        let mut index = BTreeMap::new();
        for (i, preset) in presets.iter().enumerate() {
            index.entry((preset.bank, preset.number)).or_insert(i);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(presets = presets.len(), "catalog built");

        Ok(Self {
            presets,
            index,
            valid: true,
        })
    }

    /// Load through a [`CatalogSource`], yielding an invalid catalog on failure.
    pub fn load(source: impl CatalogSource) -> Self {
        match source.into_builder().and_then(CatalogBuilder::build) {
            Ok(catalog) => catalog,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("catalog load failed: {_err}");
                Self::invalid()
            }
        }
    }

    /// An empty catalog marked invalid; every lookup reports "not found".
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Whether the catalog was loaded successfully.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of presets.
    pub fn preset_count(&self) -> usize {
        self.presets.len()
    }

    /// All presets in index order.
    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Preset at `index`.
    pub fn preset(&self, index: usize) -> Option<&Preset> {
        self.presets.get(index)
    }

    /// Resolve a (bank, number) pair to a preset index.
    pub fn preset_index(&self, bank: u16, number: u16) -> Option<usize> {
        self.index.get(&(bank, number)).copied()
    }

    /// Name of the preset at `index`.
    pub fn preset_name(&self, index: usize) -> Option<&str> {
        self.preset(index).map(Preset::name)
    }

    /// Name of the preset addressed by (bank, number).
    pub fn bank_preset_name(&self, bank: u16, number: u16) -> Option<&str> {
        self.preset_index(bank, number)
            .and_then(|index| self.preset_name(index))
    }

    /// Zones of preset `index` that respond to `key` at MIDI `velocity`.
    ///
    /// Empty for an unknown index. Overlapping zones all match.
    pub fn matching_zones(
        &self,
        index: usize,
        key: u8,
        velocity: u8,
    ) -> impl Iterator<Item = &Zone> + '_ {
        self.preset(index)
            .map(Preset::zones)
            .unwrap_or_default()
            .iter()
            .filter(move |zone| zone.matches(key, velocity))
    }
}

/// Handle to a sample added to a [`CatalogBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleId(pub usize);

/// Handle to an instrument added to a [`CatalogBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstrumentId(pub usize);

/// An instrument-level zone binding a sample.
#[derive(Clone, Debug)]
pub struct InstrumentZone {
    /// Keys the zone responds to.
    pub key_range: NoteRange,
    /// Velocities the zone responds to.
    pub vel_range: NoteRange,
    /// Sample played by the zone.
    pub sample: SampleId,
    /// Absolute generator values.
    pub generators: Generators,
}

impl InstrumentZone {
    /// A full-range zone with no generators set.
    pub fn new(sample: SampleId) -> Self {
        Self {
            key_range: NoteRange::FULL,
            vel_range: NoteRange::FULL,
            sample,
            generators: Generators::new(),
        }
    }
}

/// A named group of instrument zones with a shared global zone.
#[derive(Clone, Debug, Default)]
pub struct Instrument {
    /// Instrument name.
    pub name: String,
    /// Generators inherited by every zone that leaves them unset.
    pub global: Generators,
    /// Sample-bearing zones.
    pub zones: Vec<InstrumentZone>,
}

/// A preset-level zone binding an instrument.
#[derive(Clone, Debug)]
pub struct PresetZone {
    /// Keys the zone responds to.
    pub key_range: NoteRange,
    /// Velocities the zone responds to.
    pub vel_range: NoteRange,
    /// Instrument played by the zone.
    pub instrument: InstrumentId,
    /// Generator offsets added to the instrument's values.
    pub generators: Generators,
}

impl PresetZone {
    /// A full-range zone with no offsets set.
    pub fn new(instrument: InstrumentId) -> Self {
        Self {
            key_range: NoteRange::FULL,
            vel_range: NoteRange::FULL,
            instrument,
            generators: Generators::new(),
        }
    }
}

/// A preset as declared in a patch bank, before flattening.
#[derive(Clone, Debug, Default)]
pub struct PresetDefinition {
    /// Preset name.
    pub name: String,
    /// Bank number.
    pub bank: u16,
    /// Preset number.
    pub number: u16,
    /// Offsets inherited by every zone that leaves them unset.
    pub global: Generators,
    /// Instrument-bearing zones.
    pub zones: Vec<PresetZone>,
}

/// Assembles a patch bank's samples, instruments, and presets into a [`Catalog`].
#[derive(Clone, Debug, Default)]
pub struct CatalogBuilder {
    samples: Vec<Arc<Sample>>,
    instruments: Vec<Instrument>,
    presets: Vec<PresetDefinition>,
}

impl CatalogBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample.
    pub fn add_sample(&mut self, sample: Sample) -> SampleId {
        self.samples.push(Arc::new(sample));
        SampleId(self.samples.len() - 1)
    }

    /// Add an instrument.
    pub fn add_instrument(&mut self, instrument: Instrument) -> InstrumentId {
        self.instruments.push(instrument);
        InstrumentId(self.instruments.len() - 1)
    }

    /// Add a preset.
    pub fn add_preset(&mut self, preset: PresetDefinition) {
        self.presets.push(preset);
    }

    /// Flatten every preset zone × instrument zone pair into resolved zones.
    ///
    /// Key and velocity ranges are intersected; pairs whose ranges do not
    /// overlap produce no zone.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut presets = Vec::with_capacity(self.presets.len());

        for definition in &self.presets {
            let mut zones = Vec::new();
            for preset_zone in &definition.zones {
                let instrument = self.instruments.get(preset_zone.instrument.0).ok_or_else(|| {
                    CatalogError::UnknownInstrument {
                        preset: definition.name.clone(),
                        instrument: preset_zone.instrument.0,
                    }
                })?;

                for instrument_zone in &instrument.zones {
                    let sample = self.samples.get(instrument_zone.sample.0).ok_or_else(|| {
                        CatalogError::UnknownSample {
                            instrument: instrument.name.clone(),
                            sample: instrument_zone.sample.0,
                        }
                    })?;

                    let key_range = preset_zone.key_range.intersect(instrument_zone.key_range);
                    let vel_range = preset_zone.vel_range.intersect(instrument_zone.vel_range);
                    let (Some(key_range), Some(vel_range)) = (key_range, vel_range) else {
                        continue;
                    };

                    let params = resolve(
                        Layer {
                            local: &instrument_zone.generators,
                            global: &instrument.global,
                        },
                        Layer {
                            local: &preset_zone.generators,
                            global: &definition.global,
                        },
                    );
                    zones.push(Zone {
                        key_range,
                        vel_range,
                        sample: Arc::clone(sample),
                        params,
                    });
                }
            }
            presets.push(Preset::new(
                definition.name.clone(),
                definition.bank,
                definition.number,
                zones,
            ));
        }

        Catalog::from_presets(presets)
    }
}

/// Anything that can produce a [`CatalogBuilder`], such as a bank file parser.
pub trait CatalogSource {
    /// Produce the builder, or the reason the source could not be read.
    fn into_builder(self) -> Result<CatalogBuilder, CatalogError>;
}

impl CatalogSource for CatalogBuilder {
    fn into_builder(self) -> Result<CatalogBuilder, CatalogError> {
        Ok(self)
    }
}

impl<F> CatalogSource for F
where
    F: FnOnce() -> Result<CatalogBuilder, CatalogError>,
{
    fn into_builder(self) -> Result<CatalogBuilder, CatalogError> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::GeneratorKind;

    fn sine(len: usize) -> Sample {
        let data = (0..len)
            .map(|i| libm::sinf(i as f32 * core::f32::consts::TAU / 32.0))
            .collect();
        Sample::new("sine", PcmData::F32(data), 44100)
    }

    fn two_layer_builder() -> CatalogBuilder {
        let mut builder = CatalogBuilder::new();
        let low = builder.add_sample(sine(64).with_root_key(48));
        let high = builder.add_sample(sine(64).with_root_key(72));

        let mut low_zone = InstrumentZone::new(low);
        low_zone.key_range = NoteRange::new(0, 63);
        let mut high_zone = InstrumentZone::new(high);
        high_zone.key_range = NoteRange::new(64, 127);
        high_zone.generators.set(GeneratorKind::InitialAttenuation, 100.0);

        let piano = builder.add_instrument(Instrument {
            name: "Piano".to_string(),
            global: Generators::new().with(GeneratorKind::ReleaseVolEnv, 0.0),
            zones: vec![low_zone, high_zone],
        });

        let mut zone = PresetZone::new(piano);
        zone.generators.set(GeneratorKind::InitialAttenuation, 20.0);
        builder.add_preset(PresetDefinition {
            name: "Grand".to_string(),
            bank: 0,
            number: 0,
            global: Generators::new(),
            zones: vec![zone],
        });
        builder
    }

    #[test]
    fn test_build_flattens_layers() {
        let catalog = two_layer_builder().build().unwrap();
        assert!(catalog.is_valid());
        assert_eq!(catalog.preset_count(), 1);

        let zones = catalog.preset(0).unwrap().zones();
        assert_eq!(zones.len(), 2);
        assert!((zones[0].params.attenuation_db - 2.0).abs() < 1e-5);
        assert!((zones[1].params.attenuation_db - 12.0).abs() < 1e-5);
        assert!((zones[0].params.amp_env.release - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_matching_zones_by_key() {
        let catalog = two_layer_builder().build().unwrap();
        let low: Vec<_> = catalog.matching_zones(0, 40, 100).collect();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].root_key(), 48);

        let high: Vec<_> = catalog.matching_zones(0, 100, 100).collect();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].root_key(), 72);
    }

    #[test]
    fn test_overlapping_zones_layer() {
        let sample = Arc::new(sine(32));
        let preset = Preset::new(
            "Layered",
            0,
            0,
            vec![
                Zone::new(Arc::clone(&sample)),
                Zone::new(Arc::clone(&sample)).with_velocities(NoteRange::new(64, 127)),
            ],
        );
        let catalog = Catalog::from_presets(vec![preset]).unwrap();
        assert_eq!(catalog.matching_zones(0, 60, 127).count(), 2);
        assert_eq!(catalog.matching_zones(0, 60, 10).count(), 1);
    }

    #[test]
    fn test_preset_range_intersection_drops_disjoint_pairs() {
        let mut builder = two_layer_builder();
        let mut zone = PresetZone::new(InstrumentId(0));
        zone.key_range = NoteRange::new(0, 30);
        builder.add_preset(PresetDefinition {
            name: "Low Only".to_string(),
            bank: 0,
            number: 1,
            zones: vec![zone],
            ..Default::default()
        });
        let catalog = builder.build().unwrap();
        let index = catalog.preset_index(0, 1).unwrap();
        assert_eq!(catalog.preset(index).unwrap().zones().len(), 1);
        assert_eq!(catalog.matching_zones(index, 40, 100).count(), 0);
    }

    #[test]
    fn test_preset_index_lookup() {
        let catalog = two_layer_builder().build().unwrap();
        assert_eq!(catalog.preset_index(0, 0), Some(0));
        assert_eq!(catalog.preset_index(0, 0), Some(0));
        assert_eq!(catalog.preset_index(1, 0), None);
        assert_eq!(catalog.preset_name(0), Some("Grand"));
        assert_eq!(catalog.bank_preset_name(0, 0), Some("Grand"));
        assert_eq!(catalog.preset_name(5), None);
    }

    #[test]
    fn test_duplicate_address_keeps_first() {
        let sample = Arc::new(sine(16));
        let catalog = Catalog::from_presets(vec![
            Preset::new("First", 0, 3, vec![Zone::new(Arc::clone(&sample))]),
            Preset::new("Second", 0, 3, vec![Zone::new(sample)]),
        ])
        .unwrap();
        assert_eq!(catalog.preset_index(0, 3), Some(0));
    }

    #[test]
    fn test_unknown_instrument_rejected() {
        let mut builder = CatalogBuilder::new();
        builder.add_preset(PresetDefinition {
            name: "Broken".to_string(),
            zones: vec![PresetZone::new(InstrumentId(7))],
            ..Default::default()
        });
        assert_eq!(
            builder.build().unwrap_err(),
            CatalogError::UnknownInstrument {
                preset: "Broken".to_string(),
                instrument: 7
            }
        );
    }

    #[test]
    fn test_bad_loop_points_keep_the_bank() {
        let overlong = sine(16).with_loop(4, 32, LoopMode::Continuous);
        assert_eq!(overlong.loop_end(), 16);
        assert!(overlong.has_valid_loop());

        let reversed = sine(16).with_loop(10, 4, LoopMode::Continuous);
        assert!(!reversed.has_valid_loop());

        let catalog = Catalog::from_presets(vec![
            Preset::new("a", 0, 0, vec![Zone::new(Arc::new(overlong))]),
            Preset::new("b", 0, 1, vec![Zone::new(Arc::new(reversed))]),
        ])
        .unwrap();
        assert!(catalog.is_valid());
        assert_eq!(catalog.preset_count(), 2);
    }

    #[test]
    fn test_empty_sample_rejected() {
        let empty = Arc::new(Sample::new("void", PcmData::I16(Vec::new()), 44100));
        let err = Catalog::from_presets(vec![Preset::new("v", 0, 0, vec![Zone::new(empty)])])
            .unwrap_err();
        assert!(matches!(err, CatalogError::EmptySample { .. }));
    }

    #[test]
    fn test_load_failure_yields_invalid_catalog() {
        let catalog = Catalog::load(|| -> Result<CatalogBuilder, CatalogError> {
            Err(CatalogError::malformed("truncated"))
        });
        assert!(!catalog.is_valid());
        assert_eq!(catalog.preset_count(), 0);
        assert_eq!(catalog.preset_index(0, 0), None);
        assert_eq!(catalog.matching_zones(0, 60, 100).count(), 0);
    }

    #[test]
    fn test_load_from_builder() {
        let catalog = Catalog::load(two_layer_builder());
        assert!(catalog.is_valid());
        assert_eq!(catalog.preset_count(), 1);
    }

    #[test]
    fn test_zone_loop_mode_override() {
        let sample = Arc::new(sine(32).with_loop(8, 24, LoopMode::Continuous));
        let mut zone = Zone::new(sample);
        assert_eq!(zone.loop_mode(), LoopMode::Continuous);
        zone.params.loop_mode = Some(LoopMode::SustainOnly);
        assert_eq!(zone.loop_mode(), LoopMode::SustainOnly);
    }

    #[test]
    fn test_note_range() {
        let range = NoteRange::new(10, 20);
        assert!(range.contains(10) && range.contains(20));
        assert!(!range.contains(21));
        assert_eq!(range.intersect(NoteRange::new(15, 40)), Some(NoteRange::new(15, 20)));
        assert_eq!(range.intersect(NoteRange::new(21, 40)), None);
    }

    #[test]
    fn test_i16_frame_scaling() {
        assert_eq!(i16::MIN.to_f32(), -1.0);
        assert!((i16::MAX.to_f32() - 1.0).abs() < 1e-4);
    }
}
