//! Channel-addressed control calls and getters.
//!
//! Setters clamp their input. Preset selection reports whether the
//! requested preset exists and leaves the previous selection alone when it
//! does not.

use super::Engine;
use crate::channel::{Channel, PERCUSSION_BANK};
use crate::voice::{Voice, velocity_to_midi};

impl Engine {
    /// State of channel `channel`; defaults if never written.
    pub fn channel(&self, channel: usize) -> &Channel {
        self.channels.get(channel)
    }

    // --- Preset selection ---

    /// Select the bank used by later preset-number selections.
    pub fn channel_set_bank(&mut self, channel: usize, bank: u16) {
        self.channels.get_mut(channel).set_bank(bank);
    }

    /// Select the preset at catalog `index`; false if out of range.
    pub fn channel_set_preset_index(&mut self, channel: usize, index: usize) -> bool {
        if index >= self.catalog.preset_count() {
            return false;
        }
        self.channels.get_mut(channel).set_preset(index);
        true
    }

    /// Select preset `number` in the channel's bank; false if none matches.
    ///
    /// With `drums` set, the lookup tries in order the channel's bank offset
    /// into the percussion bank (`128 | bank`), bank 128 itself, preset 0 of
    /// bank 128, then the channel's own bank. Every channel finally falls
    /// back to bank 0.
    pub fn channel_set_preset_number(&mut self, channel: usize, number: u16, drums: bool) -> bool {
        let bank = self.channels.get(channel).bank();
        let lookup = |bank, number| self.catalog.preset_index(bank, number);
        let found = if drums {
            lookup(PERCUSSION_BANK | bank, number)
                .or_else(|| lookup(PERCUSSION_BANK, number))
                .or_else(|| lookup(PERCUSSION_BANK, 0))
                .or_else(|| lookup(bank, number))
        } else {
            lookup(bank, number)
        }
        .or_else(|| lookup(0, number));

        match found {
            Some(index) => {
                self.channels.get_mut(channel).set_preset(index);
                true
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(channel, bank, number, drums, "no preset for program change");
                false
            }
        }
    }

    /// Select bank and preset together; false, changing nothing, if absent.
    pub fn channel_set_bank_preset(&mut self, channel: usize, bank: u16, number: u16) -> bool {
        match self.catalog.preset_index(bank, number) {
            Some(index) => {
                let state = self.channels.get_mut(channel);
                state.set_bank(bank);
                state.set_preset(index);
                true
            }
            None => false,
        }
    }

    /// Selected bank.
    pub fn channel_bank(&self, channel: usize) -> u16 {
        self.channels.get(channel).bank()
    }

    /// Selected preset index; `None` when unresolved.
    pub fn channel_preset_index(&self, channel: usize) -> Option<usize> {
        self.channels.get(channel).preset()
    }

    /// Bank of the selected preset.
    pub fn channel_preset_bank(&self, channel: usize) -> Option<u16> {
        let index = self.channel_preset_index(channel)?;
        self.catalog.preset(index).map(|preset| preset.bank())
    }

    /// Number of the selected preset.
    pub fn channel_preset_number(&self, channel: usize) -> Option<u16> {
        let index = self.channel_preset_index(channel)?;
        self.catalog.preset(index).map(|preset| preset.number())
    }

    // --- Parameters ---

    /// Set pan, 0.0 (left) to 1.0 (right); clamped.
    pub fn channel_set_pan(&mut self, channel: usize, pan: f32) {
        self.channels.get_mut(channel).set_pan(pan);
    }

    /// Pan position.
    pub fn channel_pan(&self, channel: usize) -> f32 {
        self.channels.get(channel).pan()
    }

    /// Set linear volume, 0.0 to 1.0; clamped.
    pub fn channel_set_volume(&mut self, channel: usize, volume: f32) {
        self.channels.get_mut(channel).set_volume(volume);
    }

    /// Linear volume.
    pub fn channel_volume(&self, channel: usize) -> f32 {
        self.channels.get(channel).volume()
    }

    /// Set the pitch wheel, 0 to 16383 with 8192 centred; clamped.
    pub fn channel_set_pitch_wheel(&mut self, channel: usize, value: i32) {
        self.channels.get_mut(channel).set_pitch_wheel(value);
    }

    /// Pitch wheel position.
    pub fn channel_pitch_wheel(&self, channel: usize) -> u16 {
        self.channels.get(channel).pitch_wheel()
    }

    /// Set the pitch-bend range in semitones; clamped to 0-96.
    pub fn channel_set_pitch_range(&mut self, channel: usize, semitones: f32) {
        self.channels.get_mut(channel).set_pitch_range(semitones);
    }

    /// Pitch-bend range in semitones.
    pub fn channel_pitch_range(&self, channel: usize) -> f32 {
        self.channels.get(channel).pitch_range()
    }

    /// Set the tuning offset in semitones.
    pub fn channel_set_tuning(&mut self, channel: usize, semitones: f32) {
        self.channels.get_mut(channel).set_tuning(semitones);
    }

    /// Tuning offset in semitones.
    pub fn channel_tuning(&self, channel: usize) -> f32 {
        self.channels.get(channel).tuning()
    }

    /// Press or lift the sustain pedal; lifting releases held notes.
    pub fn channel_set_sustain(&mut self, channel: usize, down: bool) {
        self.channels.get_mut(channel).set_sustain(down);
        if !down {
            for voice in self.pool.iter_mut() {
                if voice.channel() == Some(channel) && voice.is_held() {
                    voice.release();
                }
            }
        }
    }

    /// Whether the sustain pedal is down.
    pub fn channel_sustain(&self, channel: usize) -> bool {
        self.channels.get(channel).sustain()
    }

    // --- Notes ---

    /// Start a note on the channel's preset; returns the voices spawned.
    ///
    /// A velocity of 0 releases the key instead. A channel whose preset is
    /// unresolved plays nothing.
    pub fn channel_note_on(&mut self, channel: usize, key: u8, velocity: f32) -> usize {
        if velocity_to_midi(velocity) == 0 {
            self.channel_note_off(channel, key);
            return 0;
        }
        let Some(preset) = self.channels.get(channel).preset() else {
            #[cfg(feature = "tracing")]
            tracing::debug!(channel, key, "note on channel without a preset");
            return 0;
        };
        self.start_note(Some(channel), preset, key, velocity)
    }

    /// Release `key` on the channel, deferred while the sustain pedal is down.
    pub fn channel_note_off(&mut self, channel: usize, key: u8) {
        let sustain = self.channels.get(channel).sustain();
        for voice in self.pool.iter_mut() {
            if voice.is_playing_note(Some(channel), key) {
                voice.note_off(sustain);
            }
        }
    }

    /// Release every voice on the channel.
    pub fn channel_note_off_all(&mut self, channel: usize) {
        for voice in self.pool.iter_mut() {
            if voice.channel() == Some(channel) {
                voice.release();
            }
        }
    }

    /// Silence every voice on the channel immediately.
    pub fn channel_sounds_off_all(&mut self, channel: usize) {
        self.pool
            .iter_mut()
            .filter(|voice| voice.channel() == Some(channel))
            .for_each(Voice::kill);
    }
}
