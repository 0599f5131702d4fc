//! One playing instance of a zone.
//!
//! A [`Voice`] owns everything that varies per note: two envelopes, two LFOs,
//! a low-pass filter, and a fractional playback cursor into the zone's
//! shared sample. Control values (pitch, cutoff, gain, pan) are computed once
//! per sub-block in [`Voice::render`]; the cursor and filter still run at
//! full sample rate inside it.
//!
//! ## Modulation routing
//!
//! | Source | Pitch | Filter cutoff | Volume |
//! |--------|-------|---------------|--------|
//! | Modulation LFO | cents | cents | dB |
//! | Vibrato LFO | cents | | |
//! | Modulation envelope | cents | cents | |
//! | Amplitude envelope | | | linear |

use wavefont_core::{
    Interpolation, Lfo, LowpassSvf, cents_to_hz, cubic, db_to_linear, linear, seconds_to_samples,
    semitones_to_ratio,
};

use crate::catalog::{LoopMode, PcmData, PcmFrame, Zone};
use crate::envelope::{Envelope, EnvelopeKind, EnvelopeStage};
use crate::generators::LfoParams;

/// Filter cutoff, in absolute cents, at or above which a static filter is left out.
const FILTER_OPEN_CENTS: f32 = 13500.0;

/// Largest pitch shift from the native rate a voice will play, semitones.
const MAX_PITCH_SHIFT: f32 = 240.0;

/// Per-sub-block inputs taken from the voice's channel and the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockContext {
    /// Channel pitch offset (bend plus tuning), semitones.
    pub pitch_offset: f32,
    /// Combined engine and channel linear gain.
    pub gain: f32,
    /// Channel pan, 0.0 (left) to 1.0 (right).
    pub pan: f32,
    /// Whether the output has two channels.
    pub stereo: bool,
    /// Resampling kernel.
    pub interpolation: Interpolation,
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            pitch_offset: 0.0,
            gain: 1.0,
            pan: 0.5,
            stereo: true,
            interpolation: Interpolation::Linear,
        }
    }
}

/// Identity of the note that started a voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteStart {
    /// Channel id; `None` for notes played directly on a preset.
    pub channel: Option<usize>,
    /// Preset index the voice was spawned from.
    pub preset: usize,
    /// Key, 0 to 127.
    pub key: u8,
    /// Velocity, 0.0 to 1.0.
    pub velocity: f32,
}

impl NoteStart {
    /// Velocity on the MIDI 1-127 scale used by zone ranges.
    pub fn midi_velocity(&self) -> u8 {
        velocity_to_midi(self.velocity)
    }
}

/// Map a 0.0-1.0 velocity onto 1-127; any audible velocity is at least 1.
pub fn velocity_to_midi(velocity: f32) -> u8 {
    if velocity.is_nan() || velocity <= 0.0 {
        0
    } else {
        ((velocity.min(1.0) * 127.0 + 0.5) as u8).max(1)
    }
}

/// A single sounding zone.
#[derive(Debug, Clone)]
pub struct Voice {
    id: u64,
    note: NoteStart,
    zone: Zone,
    amp_env: Envelope,
    mod_env: Envelope,
    mod_lfo: Lfo,
    vib_lfo: Lfo,
    filter: LowpassSvf,
    filter_enabled: bool,
    /// Fractional frame position in the sample
    cursor: f64,
    loop_mode: LoopMode,
    /// Note-off arrived while the sustain pedal was down
    held: bool,
    /// Pitch relative to the root key, semitones
    base_pitch: f32,
    /// Sample rate over output rate
    rate_ratio: f64,
    /// Velocity times zone attenuation
    base_gain: f32,
}

impl Voice {
    /// Start a voice for `zone`.
    pub fn new(zone: &Zone, note: NoteStart, output_rate: f32, id: u64) -> Self {
        let params = &zone.params;
        let sample = &zone.sample;
        let midi_velocity = note.midi_velocity();

        let amp_env = Envelope::new(
            EnvelopeKind::Amplitude,
            &params.amp_env,
            note.key,
            midi_velocity,
            output_rate,
        );
        let mod_env = Envelope::new(
            EnvelopeKind::Modulation,
            &params.mod_env,
            note.key,
            midi_velocity,
            output_rate,
        );

        let mut filter = LowpassSvf::new(output_rate);
        filter.set_resonance_db(params.filter_q_db);
        filter.set_cutoff(cents_to_hz(params.filter_cutoff));
        let filter_enabled = params.filter_cutoff < FILTER_OPEN_CENTS
            || params.mod_lfo_to_filter != 0.0
            || params.mod_env_to_filter != 0.0;

        let loop_mode = if sample.has_valid_loop() {
            zone.loop_mode()
        } else {
            LoopMode::None
        };

        let key_distance = f32::from(note.key) - f32::from(zone.root_key());
        let base_pitch =
            key_distance * params.scale_tuning / 100.0 + params.transpose + sample.tune_semitones();

        let base_gain = note.velocity.clamp(0.0, 1.0) * db_to_linear(-params.attenuation_db);

        Self {
            id,
            note,
            rate_ratio: f64::from(sample.sample_rate()) / f64::from(output_rate),
            amp_env,
            mod_env,
            mod_lfo: lfo(&params.mod_lfo, output_rate),
            vib_lfo: lfo(&params.vib_lfo, output_rate),
            filter,
            filter_enabled,
            cursor: 0.0,
            loop_mode,
            held: false,
            base_pitch,
            base_gain,
            zone: zone.clone(),
        }
    }

    /// Spawn order; lower is older.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Channel the voice plays on; `None` for direct preset notes.
    pub fn channel(&self) -> Option<usize> {
        self.note.channel
    }

    /// Preset index the voice was spawned from.
    pub fn preset(&self) -> usize {
        self.note.preset
    }

    /// Key that started the voice.
    pub fn key(&self) -> u8 {
        self.note.key
    }

    /// Exclusive class of the voice's zone; 0 means none.
    pub fn exclusive_class(&self) -> u16 {
        self.zone.params.exclusive_class
    }

    /// Amplitude envelope stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.amp_env.stage()
    }

    /// Amplitude envelope level.
    pub fn level(&self) -> f32 {
        self.amp_env.level()
    }

    /// Playback position in sample frames.
    pub fn position(&self) -> f64 {
        self.cursor
    }

    /// Whether the voice has completed and can be reclaimed.
    pub fn is_finished(&self) -> bool {
        self.amp_env.is_finished()
    }

    /// Whether the voice is in its release tail.
    pub fn is_releasing(&self) -> bool {
        self.amp_env.is_releasing()
    }

    /// Whether a note-off is being held back by the sustain pedal.
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Whether the voice still responds to a note-off for (`channel`, `key`).
    pub fn is_playing_note(&self, channel: Option<usize>, key: u8) -> bool {
        self.note.channel == channel
            && self.note.key == key
            && self.amp_env.stage() < EnvelopeStage::Release
    }

    /// Handle a note-off; with `sustain_pedal` down the release is deferred.
    pub fn note_off(&mut self, sustain_pedal: bool) {
        if sustain_pedal {
            self.held = true;
        } else {
            self.release();
        }
    }

    /// Enter release on both envelopes.
    pub fn release(&mut self) {
        self.held = false;
        self.amp_env.release();
        self.mod_env.release();
    }

    /// Release over `seconds` at most, used to cut off exclusive-class siblings.
    pub fn quick_release(&mut self, seconds: f32) {
        self.held = false;
        self.amp_env.release_over(seconds);
        self.mod_env.release_over(seconds);
    }

    /// Silence immediately.
    pub fn kill(&mut self) {
        self.held = false;
        self.amp_env.finish();
        self.mod_env.finish();
    }

    /// Victim ordering for voice stealing; lower sorts first.
    ///
    /// Finished voices come first, then releasing voices by samples left in
    /// their release, then sounding voices by loudness: velocity and zone
    /// attenuation times the envelope level, taken at its peak until the
    /// decay starts. Ties go to the oldest voice.
    pub fn steal_rank(&self) -> (u8, f32, u64) {
        if self.is_finished() {
            (0, 0.0, self.id)
        } else if self.is_releasing() {
            (1, self.amp_env.remaining_samples() as f32, self.id)
        } else {
            let level = if self.amp_env.stage() < EnvelopeStage::Decay {
                1.0
            } else {
                self.amp_env.level()
            };
            (2, self.base_gain * level, self.id)
        }
    }

    fn is_looping(&self) -> bool {
        match self.loop_mode {
            LoopMode::None => false,
            LoopMode::Continuous => true,
            LoopMode::SustainOnly => self.amp_env.stage() < EnvelopeStage::Release,
        }
    }

    /// Render one sub-block of mono signal into `out`.
    ///
    /// Advances envelopes and LFOs by `out.len()` samples first, then plays
    /// the sample with the resulting control values held for the block.
    /// Returns the left/right gains to mix with (both equal for mono output),
    /// or `None` once the voice has finished. A voice that reaches the end
    /// of an unlooped sample finishes and zero-fills the rest of `out`.
    pub fn render(&mut self, ctx: &BlockContext, out: &mut [f32]) -> Option<[f32; 2]> {
        let frames = out.len() as u32;
        self.amp_env.advance(frames);
        self.mod_env.advance(frames);
        self.mod_lfo.advance(frames);
        self.vib_lfo.advance(frames);

        if self.amp_env.is_finished() {
            out.fill(0.0);
            return None;
        }

        let params = &self.zone.params;
        let mod_lfo = self.mod_lfo.value();
        let vib_lfo = self.vib_lfo.value();
        let mod_env = self.mod_env.level();

        let pitch_cents = mod_lfo * params.mod_lfo_to_pitch
            + vib_lfo * params.vib_lfo_to_pitch
            + mod_env * params.mod_env_to_pitch;
        let semitones = (self.base_pitch + ctx.pitch_offset + pitch_cents / 100.0)
            .clamp(-MAX_PITCH_SHIFT, MAX_PITCH_SHIFT);
        let ratio = semitones_to_ratio(semitones);
        let step = if ratio.is_finite() {
            f64::from(ratio) * self.rate_ratio
        } else {
            self.rate_ratio
        };

        if self.filter_enabled {
            let cutoff = params.filter_cutoff
                + mod_lfo * params.mod_lfo_to_filter
                + mod_env * params.mod_env_to_filter;
            self.filter.set_cutoff(cents_to_hz(cutoff));
        }

        let gain = self.base_gain
            * ctx.gain
            * self.amp_env.level()
            * db_to_linear(mod_lfo * params.mod_lfo_to_volume);
        let gains = if ctx.stereo {
            let pan = (params.pan + ctx.pan - 0.5).clamp(-0.5, 0.5);
            [gain * libm::sqrtf(0.5 - pan), gain * libm::sqrtf(0.5 + pan)]
        } else {
            [gain, gain]
        };

        let span = self.is_looping().then(|| {
            (
                self.zone.sample.loop_start() as usize,
                self.zone.sample.loop_end() as usize,
            )
        });
        let filter_active = self.filter_enabled && self.filter.is_active();
        let Self {
            zone,
            cursor,
            filter,
            ..
        } = self;
        let mut playback = Playback {
            cursor,
            filter: filter_active.then_some(filter),
            span,
            step,
            interpolation: ctx.interpolation,
        };
        let playing = match zone.sample.data() {
            PcmData::I16(frames) => playback.play(frames, out),
            PcmData::F32(frames) => playback.play(frames, out),
        };
        if !playing {
            self.kill();
        }
        Some(gains)
    }
}

/// Cursor state borrowed from a voice for one sub-block of sample playback.
struct Playback<'a> {
    cursor: &'a mut f64,
    filter: Option<&'a mut LowpassSvf>,
    /// Loop start and end while the loop is active
    span: Option<(usize, usize)>,
    step: f64,
    interpolation: Interpolation,
}

impl Playback<'_> {
    /// Fill `out` from `frames` starting at the cursor; false once the sample ends.
    ///
    /// While looping, the cursor is wrapped as soon as it passes the loop
    /// end, so between blocks it always lies inside the loop.
    fn play<T: PcmFrame>(&mut self, frames: &[T], out: &mut [f32]) -> bool {
        let end = frames.len() as f64;
        for (n, slot) in out.iter_mut().enumerate() {
            let position = *self.cursor;
            if self.span.is_none() && position >= end {
                out[n..].fill(0.0);
                return false;
            }

            let i = position as usize;
            let frac = (position - i as f64) as f32;
            let x1 = frames.get(i).map_or(0.0, |&frame| frame.to_f32());
            let value = match self.interpolation {
                Interpolation::None => x1,
                Interpolation::Linear => linear(x1, fetch(frames, i + 1, self.span), frac),
                Interpolation::Cubic => {
                    let x0 = if i == 0 { x1 } else { frames[i - 1].to_f32() };
                    cubic(
                        x0,
                        x1,
                        fetch(frames, i + 1, self.span),
                        fetch(frames, i + 2, self.span),
                        frac,
                    )
                }
            };

            *slot = match self.filter.as_deref_mut() {
                Some(filter) => filter.process(value),
                None => value,
            };

            let mut next = position + self.step;
            if let Some((start, stop)) = self.span
                && next >= stop as f64
            {
                let len = (stop - start) as f64;
                next = start as f64 + (next - start as f64) % len;
            }
            *self.cursor = next;
        }
        true
    }
}

/// Frame `index`, wrapped into the loop when one is active, silence past the end.
#[inline]
fn fetch<T: PcmFrame>(frames: &[T], index: usize, span: Option<(usize, usize)>) -> f32 {
    let index = match span {
        Some((start, stop)) if index >= stop => start + (index - stop) % (stop - start),
        _ => index,
    };
    frames.get(index).map_or(0.0, |&frame| frame.to_f32())
}

fn lfo(params: &LfoParams, output_rate: f32) -> Lfo {
    let mut lfo = Lfo::new(output_rate, params.frequency);
    lfo.set_delay_samples(seconds_to_samples(params.delay, output_rate));
    lfo
}
