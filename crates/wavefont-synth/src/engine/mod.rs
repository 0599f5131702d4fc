//! The synthesis engine: catalog, channels, voices and output settings.
//!
//! An [`Engine`] owns everything one instance needs and shares nothing
//! mutable with other instances. Control calls (notes, channel setters,
//! controllers) and [`Engine::render`] all take `&mut self`; see the crate
//! docs for the concurrency contract.
//!
//! Notes can be played two ways:
//!
//! - directly on a preset index ([`Engine::note_on`]), bypassing channel state
//! - on a channel ([`Engine::channel_note_on`]), which applies the channel's
//!   preset, bend, tuning, volume and pan

mod channels;
mod dispatch;
mod render;

pub use render::{OutputMode, OutputSample, SUB_BLOCK};

use std::sync::Arc;

use wavefont_core::Interpolation;

use crate::catalog::Catalog;
use crate::channel::{Channel, ChannelTable, direct_channel};
use crate::envelope::FAST_RELEASE_SECONDS;
use crate::pool::{DEFAULT_MAX_VOICES, VoicePool};
use crate::voice::{NoteStart, Voice, velocity_to_midi};

/// Default output sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
/// Default percussion channel (MIDI channel 10).
pub const DEFAULT_PERCUSSION_CHANNEL: usize = 9;

/// A polyphonic wavetable synthesizer instance.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use wavefont_synth::{Catalog, Engine, OutputMode, PcmData, Preset, Sample, Zone};
///
/// let sample = Arc::new(Sample::new("sine", PcmData::F32(vec![0.25; 4410]), 44100));
/// let catalog = Catalog::from_presets(vec![Preset::new("Lead", 0, 0, vec![Zone::new(sample)])])
///     .unwrap();
///
/// let mut engine = Engine::new(Arc::new(catalog));
/// engine.set_output(OutputMode::Mono, 44100, 0.0);
/// engine.note_on(0, 60, 1.0);
///
/// let mut out = [0.0f32; 64];
/// engine.render(&mut out, 64, false);
/// assert!(out.iter().any(|s| *s != 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    catalog: Arc<Catalog>,
    channels: ChannelTable,
    /// State applied to notes played directly on a preset
    direct: Channel,
    pool: VoicePool,
    output_mode: OutputMode,
    sample_rate: u32,
    gain_db: f32,
    volume: f32,
    interpolation: Interpolation,
    /// Interleaved mix of the current chunk
    scratch: Vec<f32>,
    /// One voice's mono signal for the current sub-block
    voice_buf: [f32; SUB_BLOCK],
}

impl Engine {
    /// Create an engine over `catalog` with default output settings.
    ///
    /// Stereo interleaved at 44.1 kHz, 0 dB gain, 256 voices, channel 9 as
    /// the percussion channel.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let channels = ChannelTable::new(&catalog, Some(DEFAULT_PERCUSSION_CHANNEL));
        Self {
            catalog,
            channels,
            direct: direct_channel(),
            pool: VoicePool::new(DEFAULT_MAX_VOICES),
            output_mode: OutputMode::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            gain_db: 0.0,
            volume: 1.0,
            interpolation: Interpolation::default(),
            scratch: vec![0.0; render::CHUNK_FRAMES * 2],
            voice_buf: [0.0; SUB_BLOCK],
        }
    }

    /// The patch catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shared handle to the patch catalog, e.g. for building another engine.
    pub fn catalog_arc(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    // --- Output settings ---

    /// Set output layout, sample rate and global gain in dB.
    ///
    /// A sample rate of 0 is raised to 1. Changing the rate silences every
    /// active voice, since their envelopes and filters were timed for the
    /// old rate.
    pub fn set_output(&mut self, mode: OutputMode, sample_rate: u32, gain_db: f32) {
        let sample_rate = sample_rate.max(1);
        if sample_rate != self.sample_rate && !self.pool.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                from = self.sample_rate,
                to = sample_rate,
                "sample rate changed, silencing {} voices",
                self.pool.len()
            );
            self.pool.clear();
        }
        self.output_mode = mode;
        self.sample_rate = sample_rate;
        self.gain_db = if gain_db.is_finite() { gain_db } else { 0.0 };
    }

    /// Output layout.
    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Global gain in dB.
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Set the global linear volume; negative values clamp to 0.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() { 0.0 } else { volume.max(0.0) };
    }

    /// Global linear volume.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the voice limit and reserve storage for it.
    ///
    /// Active voices above the new limit are stolen immediately.
    pub fn set_max_voices(&mut self, max_voices: usize) {
        self.pool.set_max_voices(max_voices);
    }

    /// Voice limit.
    pub fn max_voices(&self) -> usize {
        self.pool.max_voices()
    }

    /// Select the resampling kernel.
    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    /// Resampling kernel.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Designate the percussion channel, or none.
    ///
    /// Drops all channel state so fresh channels pick up the new defaults.
    pub fn set_percussion_channel(&mut self, channel: Option<usize>) {
        self.channels = ChannelTable::new(&self.catalog, channel);
    }

    /// The percussion channel.
    pub fn percussion_channel(&self) -> Option<usize> {
        self.channels.percussion_channel()
    }

    // --- Queries ---

    /// Number of voices that have not finished.
    pub fn active_voice_count(&self) -> usize {
        self.pool.iter().filter(|voice| !voice.is_finished()).count()
    }

    /// Active voices, for inspection.
    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.pool.iter()
    }

    /// Number of presets in the catalog.
    pub fn preset_count(&self) -> usize {
        self.catalog.preset_count()
    }

    /// Index of the preset at (`bank`, `number`).
    pub fn preset_index(&self, bank: u16, number: u16) -> Option<usize> {
        self.catalog.preset_index(bank, number)
    }

    /// Name of preset `index`.
    pub fn preset_name(&self, index: usize) -> Option<&str> {
        self.catalog.preset_name(index)
    }

    /// Name of the preset at (`bank`, `number`).
    pub fn bank_preset_name(&self, bank: u16, number: u16) -> Option<&str> {
        self.catalog.bank_preset_name(bank, number)
    }

    // --- Direct preset notes ---

    /// Start a note on preset `index`; returns whether the preset exists.
    ///
    /// One voice is spawned per matching zone. A velocity of 0 releases the
    /// key instead.
    pub fn note_on(&mut self, index: usize, key: u8, velocity: f32) -> bool {
        if index >= self.catalog.preset_count() {
            return false;
        }
        if velocity_to_midi(velocity) == 0 {
            self.note_off(index, key);
        } else {
            self.start_note(None, index, key, velocity);
        }
        true
    }

    /// Start a note on the preset at (`bank`, `number`); false if absent.
    pub fn bank_note_on(&mut self, bank: u16, number: u16, key: u8, velocity: f32) -> bool {
        match self.catalog.preset_index(bank, number) {
            Some(index) => self.note_on(index, key, velocity),
            None => false,
        }
    }

    /// Release `key` on preset `index`.
    pub fn note_off(&mut self, index: usize, key: u8) {
        for voice in self.pool.iter_mut() {
            if voice.preset() == index && voice.is_playing_note(None, key) {
                voice.release();
            }
        }
    }

    /// Release `key` on the preset at (`bank`, `number`); false if absent.
    pub fn bank_note_off(&mut self, bank: u16, number: u16, key: u8) -> bool {
        match self.catalog.preset_index(bank, number) {
            Some(index) => {
                self.note_off(index, key);
                true
            }
            None => false,
        }
    }

    /// Release every voice on every channel.
    pub fn all_notes_off(&mut self) {
        self.pool.iter_mut().for_each(Voice::release);
    }

    /// Silence every voice immediately.
    pub fn all_sounds_off(&mut self) {
        self.pool.iter_mut().for_each(Voice::kill);
    }

    /// Stop all voices immediately and drop all channel state.
    pub fn reset(&mut self) {
        self.pool.clear();
        self.channels.clear();
    }

    /// Spawn one voice per zone of `preset` matching `key` and `velocity`.
    ///
    /// Room is made for every match before the first spawn, so the pool
    /// never grows past its limit and never reallocates.
    pub(crate) fn start_note(
        &mut self,
        channel: Option<usize>,
        preset: usize,
        key: u8,
        velocity: f32,
    ) -> usize {
        let key = key.min(127);
        let midi_velocity = velocity_to_midi(velocity);
        let catalog = Arc::clone(&self.catalog);
        let wanted = catalog.matching_zones(preset, key, midi_velocity).count();
        if wanted == 0 {
            return 0;
        }
        self.pool.make_room(wanted);

        let note = NoteStart {
            channel,
            preset,
            key,
            velocity,
        };
        let output_rate = self.sample_rate as f32;
        let mut first_id = None;
        let mut spawned = 0;
        for zone in catalog.matching_zones(preset, key, midi_velocity) {
            let id = self.pool.next_id();
            let first = *first_id.get_or_insert(id);
            if zone.params.exclusive_class != 0 {
                self.cut_exclusive(channel, preset, zone.params.exclusive_class, first);
            }
            if self.pool.spawn(Voice::new(zone, note, output_rate, id)) {
                spawned += 1;
            }
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(?channel, preset, key, spawned, "note started");
        spawned
    }

    /// Fast-release older voices sharing `class` on the same channel.
    ///
    /// Direct notes have no channel, so their class is scoped to the preset.
    fn cut_exclusive(&mut self, channel: Option<usize>, preset: usize, class: u16, before: u64) {
        for voice in self.pool.iter_mut() {
            let same_target = voice.channel() == channel
                && (channel.is_some() || voice.preset() == preset);
            if same_target
                && voice.exclusive_class() == class
                && voice.id() < before
                && !voice.is_finished()
            {
                voice.quick_release(FAST_RELEASE_SECONDS);
            }
        }
    }
}
