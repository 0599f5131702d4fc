//! Event dispatch and MIDI controller interpretation.
//!
//! | Controller | Effect |
//! |------------|--------|
//! | 0 / 32 bank select | channel bank, `msb << 7 | lsb` |
//! | 7 / 39 volume, 11 / 43 expression | channel volume `(volume * expression)^3` |
//! | 10 / 42 pan | channel pan |
//! | 6 / 38 data entry | registered parameter 0 (bend range), 1 (fine tune), 2 (coarse tune) |
//! | 100 / 101 RPN, 98 / 99 NRPN | parameter selection for data entry |
//! | 64 sustain | hold note-offs while down |
//! | 120 / 121 / 123 | all sound off, reset controllers, all notes off |
//!
//! Every other controller is accepted and ignored.

use super::Engine;
use crate::channel::{ParameterSelect, PITCH_WHEEL_CENTER};
use crate::event::Event;
use crate::midi::{
    ALL_CTRL_OFF, ALL_NOTES_OFF, ALL_SOUND_OFF, BANK_SELECT_LSB, BANK_SELECT_MSB, DATA_ENTRY_LSB,
    DATA_ENTRY_MSB, EXPRESSION_LSB, EXPRESSION_MSB, NRPN_LSB, NRPN_MSB, PAN_LSB, PAN_MSB,
    RPN_COARSE_TUNING, RPN_FINE_TUNING, RPN_LSB, RPN_MSB, RPN_PITCH_BEND_RANGE, SUSTAIN_SWITCH,
    VOLUME_LSB, VOLUME_MSB,
};

/// Largest 14-bit controller value, as a float.
const FULL_SCALE: f32 = 16383.0;

/// Replace the high 7 bits of a 14-bit register.
fn set_msb(register: u16, value: u8) -> u16 {
    (register & 0x7F) | (u16::from(value & 0x7F) << 7)
}

/// Replace the low 7 bits of a 14-bit register.
fn set_lsb(register: u16, value: u8) -> u16 {
    (register & 0x3F80) | u16::from(value & 0x7F)
}

impl Engine {
    /// Apply one event.
    ///
    /// Program changes on the percussion channel use the drum-kit preset
    /// lookup. Aftertouch and tempo events do not affect the engine.
    pub fn apply(&mut self, event: &Event) {
        #[cfg(feature = "tracing")]
        tracing::trace!(%event, "apply");
        match *event {
            Event::NoteOn {
                channel,
                key,
                velocity,
            } => {
                self.channel_note_on(channel, key, velocity);
            }
            Event::NoteOff { channel, key } => self.channel_note_off(channel, key),
            Event::ControlChange {
                channel,
                controller,
                value,
            } => self.channel_midi_control(channel, controller, value),
            Event::ProgramChange { channel, program } => {
                let drums = self.channels.is_percussion(channel);
                self.channel_set_preset_number(channel, u16::from(program), drums);
            }
            Event::PitchBend { channel, value } => {
                self.channel_set_pitch_wheel(channel, i32::from(value));
            }
            Event::KeyPressure { .. } | Event::ChannelPressure { .. } | Event::SetTempo { .. } => {}
        }
    }

    /// Interpret a MIDI control change on `channel`.
    pub fn channel_midi_control(&mut self, channel: usize, controller: u8, value: u8) {
        let value = value & 0x7F;
        match controller {
            VOLUME_MSB | VOLUME_LSB | EXPRESSION_MSB | EXPRESSION_LSB => {
                let state = self.channels.get_mut(channel);
                let regs = state.controllers_mut();
                match controller {
                    VOLUME_MSB => regs.volume = set_msb(regs.volume, value),
                    VOLUME_LSB => regs.volume = set_lsb(regs.volume, value),
                    EXPRESSION_MSB => regs.expression = set_msb(regs.expression, value),
                    _ => regs.expression = set_lsb(regs.expression, value),
                }
                let level =
                    f32::from(regs.volume) / FULL_SCALE * f32::from(regs.expression) / FULL_SCALE;
                state.set_volume(level * level * level);
            }
            PAN_MSB | PAN_LSB => {
                let state = self.channels.get_mut(channel);
                let regs = state.controllers_mut();
                regs.pan = if controller == PAN_MSB {
                    set_msb(regs.pan, value)
                } else {
                    set_lsb(regs.pan, value)
                };
                let pan = f32::from(regs.pan) / FULL_SCALE;
                state.set_pan(pan);
            }
            BANK_SELECT_MSB => {
                let state = self.channels.get_mut(channel);
                state.controllers_mut().bank_msb = value;
                state.set_bank(u16::from(value));
            }
            BANK_SELECT_LSB => {
                let state = self.channels.get_mut(channel);
                let msb = state.controllers().bank_msb;
                state.set_bank((u16::from(msb) << 7) | u16::from(value));
            }
            RPN_MSB | RPN_LSB => {
                let regs = self.channels.get_mut(channel).controllers_mut();
                let base = match regs.select {
                    ParameterSelect::Registered(_) => regs.rpn,
                    ParameterSelect::None => 0,
                };
                regs.rpn = if controller == RPN_MSB {
                    set_msb(base, value)
                } else {
                    set_lsb(base, value)
                };
                regs.select = ParameterSelect::Registered(regs.rpn);
            }
            NRPN_MSB | NRPN_LSB => {
                self.channels.get_mut(channel).controllers_mut().select = ParameterSelect::None;
            }
            DATA_ENTRY_MSB | DATA_ENTRY_LSB => self.data_entry(channel, controller, value),
            SUSTAIN_SWITCH => self.channel_set_sustain(channel, value >= 64),
            ALL_SOUND_OFF => self.channel_sounds_off_all(channel),
            ALL_NOTES_OFF => self.channel_note_off_all(channel),
            ALL_CTRL_OFF => {
                self.channels.get_mut(channel).reset_controllers();
                self.channel_set_sustain(channel, false);
            }
            _ => {}
        }
    }

    fn data_entry(&mut self, channel: usize, controller: u8, value: u8) {
        let state = self.channels.get_mut(channel);
        let regs = state.controllers_mut();
        regs.data_entry = if controller == DATA_ENTRY_MSB {
            set_msb(regs.data_entry, value)
        } else {
            set_lsb(regs.data_entry, value)
        };
        let data = regs.data_entry;
        let ParameterSelect::Registered(parameter) = regs.select else {
            return;
        };

        match parameter {
            RPN_PITCH_BEND_RANGE => {
                let semitones = f32::from(data >> 7) + 0.01 * f32::from(data & 0x7F);
                state.set_pitch_range(semitones);
            }
            RPN_FINE_TUNING => {
                let coarse = libm::truncf(state.tuning());
                let fine = (f32::from(data) - f32::from(PITCH_WHEEL_CENTER))
                    / f32::from(PITCH_WHEEL_CENTER);
                state.set_tuning(coarse + fine);
            }
            RPN_COARSE_TUNING if controller == DATA_ENTRY_MSB => {
                let fine = state.tuning() - libm::truncf(state.tuning());
                state.set_tuning(f32::from(value) - 64.0 + fine);
            }
            _ => {}
        }
    }
}
