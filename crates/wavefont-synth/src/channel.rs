//! Per-channel parameter state.
//!
//! Channel ids are open-ended: any id is valid and reads as default state
//! until something writes to it, at which point an entry is materialized.
//! Setters clamp out-of-range input instead of rejecting it, so malformed
//! upstream event data never interrupts playback.

use std::collections::BTreeMap;

use crate::catalog::Catalog;

/// Centre position of the 14-bit pitch wheel.
pub const PITCH_WHEEL_CENTER: u16 = 8192;
/// Largest 14-bit pitch wheel value.
pub const PITCH_WHEEL_MAX: u16 = 16383;
/// Largest 14-bit controller value.
const CONTROLLER_MAX: u16 = 16383;
/// Bank conventionally holding drum kits.
pub const PERCUSSION_BANK: u16 = 128;
/// Widest pitch-bend range accepted, in semitones.
pub const MAX_PITCH_RANGE: f32 = 96.0;
/// Largest tuning offset accepted either way, in semitones.
pub const MAX_TUNING: f32 = 96.0;

/// Registered parameter addressed by data-entry controllers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterSelect {
    /// No parameter selected, or a non-registered parameter; data entry is ignored.
    None,
    /// A registered parameter number (0 pitch-bend range, 1 fine tuning, 2 coarse tuning).
    Registered(u16),
}

/// Raw 14-bit MIDI controller registers kept so MSB and LSB writes combine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerState {
    /// Channel volume (CC 7 / 39).
    pub volume: u16,
    /// Expression (CC 11 / 43).
    pub expression: u16,
    /// Pan (CC 10 / 42).
    pub pan: u16,
    /// Registered parameter number being assembled (CC 100 / 101).
    pub rpn: u16,
    /// Parameter targeted by data entry.
    pub select: ParameterSelect,
    /// Data entry value (CC 6 / 38).
    pub data_entry: u16,
    /// Bank select MSB (CC 0).
    pub bank_msb: u8,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            volume: CONTROLLER_MAX,
            expression: CONTROLLER_MAX,
            pan: 8192,
            rpn: 0x3FFF,
            select: ParameterSelect::None,
            data_entry: 0,
            bank_msb: 0,
        }
    }
}

/// Playback parameters for one channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    bank: u16,
    preset: Option<usize>,
    pan: f32,
    volume: f32,
    pitch_wheel: u16,
    pitch_range: f32,
    tuning: f32,
    sustain: bool,
    controllers: ControllerState,
}

impl Channel {
    fn with_preset(bank: u16, preset: Option<usize>) -> Self {
        Self {
            bank,
            preset,
            pan: 0.5,
            volume: 1.0,
            pitch_wheel: PITCH_WHEEL_CENTER,
            pitch_range: 2.0,
            tuning: 0.0,
            sustain: false,
            controllers: ControllerState::default(),
        }
    }

    /// Selected bank.
    pub fn bank(&self) -> u16 {
        self.bank
    }

    /// Resolved preset index, `None` when unresolved.
    pub fn preset(&self) -> Option<usize> {
        self.preset
    }

    /// Pan position, 0.0 (left) to 1.0 (right).
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Linear volume, 0.0 to 1.0.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Pitch wheel position, 0 to 16383.
    pub fn pitch_wheel(&self) -> u16 {
        self.pitch_wheel
    }

    /// Pitch-bend range in semitones.
    pub fn pitch_range(&self) -> f32 {
        self.pitch_range
    }

    /// Tuning offset in semitones.
    pub fn tuning(&self) -> f32 {
        self.tuning
    }

    /// Whether the sustain pedal is down.
    pub fn sustain(&self) -> bool {
        self.sustain
    }

    /// Raw controller registers.
    pub fn controllers(&self) -> &ControllerState {
        &self.controllers
    }

    /// Pitch offset applied to every voice on the channel, in semitones.
    ///
    /// `(pitch_wheel - 8192) / 8192 * pitch_range + tuning`
    pub fn pitch_offset(&self) -> f32 {
        let bend = (f32::from(self.pitch_wheel) - f32::from(PITCH_WHEEL_CENTER))
            / f32::from(PITCH_WHEEL_CENTER);
        bend * self.pitch_range + self.tuning
    }

    pub(crate) fn set_bank(&mut self, bank: u16) {
        self.bank = bank;
    }

    pub(crate) fn set_preset(&mut self, preset: usize) {
        self.preset = Some(preset);
    }

    pub(crate) fn set_pan(&mut self, pan: f32) {
        self.pan = if pan.is_nan() { 0.5 } else { pan.clamp(0.0, 1.0) };
    }

    pub(crate) fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
    }

    pub(crate) fn set_pitch_wheel(&mut self, value: i32) {
        self.pitch_wheel = value.clamp(0, i32::from(PITCH_WHEEL_MAX)) as u16;
    }

    pub(crate) fn set_pitch_range(&mut self, semitones: f32) {
        self.pitch_range = if semitones.is_nan() {
            2.0
        } else {
            semitones.clamp(0.0, MAX_PITCH_RANGE)
        };
    }

    pub(crate) fn set_tuning(&mut self, semitones: f32) {
        self.tuning = if semitones.is_nan() {
            0.0
        } else {
            semitones.clamp(-MAX_TUNING, MAX_TUNING)
        };
    }

    pub(crate) fn set_sustain(&mut self, down: bool) {
        self.sustain = down;
    }

    pub(crate) fn controllers_mut(&mut self) -> &mut ControllerState {
        &mut self.controllers
    }

    /// Return controllers to power-on state, keeping bank and preset.
    pub(crate) fn reset_controllers(&mut self) {
        let bank = self.bank;
        let preset = self.preset;
        *self = Self::with_preset(bank, preset);
    }
}

/// Lazily materialized channel state addressed by id.
#[derive(Clone, Debug)]
pub struct ChannelTable {
    channels: BTreeMap<usize, Channel>,
    melodic: Channel,
    percussion: Channel,
    percussion_channel: Option<usize>,
}

impl ChannelTable {
    /// Create a table whose fresh channels select bank 0 preset 0.
    ///
    /// The percussion channel, if any, starts on bank 128 preset 0 when the
    /// catalog has one.
    pub fn new(catalog: &Catalog, percussion_channel: Option<usize>) -> Self {
        let melodic = Channel::with_preset(0, catalog.preset_index(0, 0));
        let percussion = match catalog.preset_index(PERCUSSION_BANK, 0) {
            Some(index) => Channel::with_preset(PERCUSSION_BANK, Some(index)),
            None => melodic.clone(),
        };
        Self {
            channels: BTreeMap::new(),
            melodic,
            percussion,
            percussion_channel,
        }
    }

    /// The channel designated for drum kits.
    pub fn percussion_channel(&self) -> Option<usize> {
        self.percussion_channel
    }

    /// Whether `id` is the percussion channel.
    pub fn is_percussion(&self, id: usize) -> bool {
        self.percussion_channel == Some(id)
    }

    /// State of channel `id`; defaults if never written.
    pub fn get(&self, id: usize) -> &Channel {
        self.channels.get(&id).unwrap_or_else(|| self.template(id))
    }

    /// Mutable state of channel `id`, materializing defaults on first use.
    pub fn get_mut(&mut self, id: usize) -> &mut Channel {
        let template = if self.is_percussion(id) {
            &self.percussion
        } else {
            &self.melodic
        };
        self.channels.entry(id).or_insert_with(|| template.clone())
    }

    /// Number of materialized channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channel has been materialized.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Ids of materialized channels, ascending.
    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.channels.keys().copied()
    }

    /// Drop every materialized channel.
    pub fn clear(&mut self) {
        self.channels.clear();
    }

    fn template(&self, id: usize) -> &Channel {
        if self.is_percussion(id) {
            &self.percussion
        } else {
            &self.melodic
        }
    }
}

/// Defaults for a channel that is not addressed by id, used by direct preset notes.
pub(crate) fn direct_channel() -> Channel {
    Channel::with_preset(0, None)
}
