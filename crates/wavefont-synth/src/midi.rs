//! MIDI message kinds and controller numbers.
//!
//! Name lookups are `match` tables compiled into the binary: no runtime
//! initialization, no shared mutable state.

/// Channel voice and meta message kinds the engine understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Key released.
    NoteOff,
    /// Key pressed.
    NoteOn,
    /// Polyphonic aftertouch.
    KeyPressure,
    /// Controller change.
    ControlChange,
    /// Program (preset) change.
    ProgramChange,
    /// Channel aftertouch.
    ChannelPressure,
    /// Pitch wheel.
    PitchBend,
    /// Tempo meta event.
    SetTempo,
}

impl MessageKind {
    /// Every message kind.
    pub const ALL: [MessageKind; 8] = [
        Self::NoteOff,
        Self::NoteOn,
        Self::KeyPressure,
        Self::ControlChange,
        Self::ProgramChange,
        Self::ChannelPressure,
        Self::PitchBend,
        Self::SetTempo,
    ];

    /// Status nibble for channel messages (`0x80`-`0xE0`) or meta type (`0x51`).
    pub const fn code(self) -> u8 {
        match self {
            Self::NoteOff => 0x80,
            Self::NoteOn => 0x90,
            Self::KeyPressure => 0xA0,
            Self::ControlChange => 0xB0,
            Self::ProgramChange => 0xC0,
            Self::ChannelPressure => 0xD0,
            Self::PitchBend => 0xE0,
            Self::SetTempo => 0x51,
        }
    }

    /// Kind of a channel message from its status byte; the channel nibble is ignored.
    pub const fn from_status(status: u8) -> Option<Self> {
        match status & 0xF0 {
            0x80 => Some(Self::NoteOff),
            0x90 => Some(Self::NoteOn),
            0xA0 => Some(Self::KeyPressure),
            0xB0 => Some(Self::ControlChange),
            0xC0 => Some(Self::ProgramChange),
            0xD0 => Some(Self::ChannelPressure),
            0xE0 => Some(Self::PitchBend),
            _ => None,
        }
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoteOff => "NoteOff",
            Self::NoteOn => "NoteOn",
            Self::KeyPressure => "KeyPressure",
            Self::ControlChange => "ControlChange",
            Self::ProgramChange => "ProgramChange",
            Self::ChannelPressure => "ChannelPressure",
            Self::PitchBend => "PitchBend",
            Self::SetTempo => "SetTempo",
        }
    }
}

/// Bank select, coarse.
pub const BANK_SELECT_MSB: u8 = 0x00;
/// Modulation wheel, coarse.
pub const MODULATION_MSB: u8 = 0x01;
/// Data entry, coarse.
pub const DATA_ENTRY_MSB: u8 = 0x06;
/// Channel volume, coarse.
pub const VOLUME_MSB: u8 = 0x07;
/// Pan, coarse.
pub const PAN_MSB: u8 = 0x0A;
/// Expression, coarse.
pub const EXPRESSION_MSB: u8 = 0x0B;
/// Bank select, fine.
pub const BANK_SELECT_LSB: u8 = 0x20;
/// Data entry, fine.
pub const DATA_ENTRY_LSB: u8 = 0x26;
/// Channel volume, fine.
pub const VOLUME_LSB: u8 = 0x27;
/// Pan, fine.
pub const PAN_LSB: u8 = 0x2A;
/// Expression, fine.
pub const EXPRESSION_LSB: u8 = 0x2B;
/// Sustain (damper) pedal.
pub const SUSTAIN_SWITCH: u8 = 0x40;
/// Non-registered parameter number, fine.
pub const NRPN_LSB: u8 = 0x62;
/// Non-registered parameter number, coarse.
pub const NRPN_MSB: u8 = 0x63;
/// Registered parameter number, fine.
pub const RPN_LSB: u8 = 0x64;
/// Registered parameter number, coarse.
pub const RPN_MSB: u8 = 0x65;
/// Silence every voice immediately.
pub const ALL_SOUND_OFF: u8 = 0x78;
/// Reset all controllers.
pub const ALL_CTRL_OFF: u8 = 0x79;
/// Release every voice.
pub const ALL_NOTES_OFF: u8 = 0x7B;

/// Registered parameter: pitch-bend range.
pub const RPN_PITCH_BEND_RANGE: u16 = 0;
/// Registered parameter: fine tuning.
pub const RPN_FINE_TUNING: u16 = 1;
/// Registered parameter: coarse tuning.
pub const RPN_COARSE_TUNING: u16 = 2;

/// Display name of a controller number, if it has one.
pub const fn controller_name(controller: u8) -> Option<&'static str> {
    let name = match controller {
        0x00 => "BankSelectMSB",
        0x01 => "ModulationMSB",
        0x02 => "BreathMSB",
        0x04 => "FootMSB",
        0x05 => "PortamentoTimeMSB",
        0x06 => "DataEntryMSB",
        0x07 => "VolumeMSB",
        0x08 => "BalanceMSB",
        0x0A => "PanMSB",
        0x0B => "ExpressionMSB",
        0x0C => "Effects1MSB",
        0x0D => "Effects2MSB",
        0x10 => "GPC1MSB",
        0x11 => "GPC2MSB",
        0x12 => "GPC3MSB",
        0x13 => "GPC4MSB",
        0x20 => "BankSelectLSB",
        0x21 => "ModulationWheelLSB",
        0x22 => "BreathLSB",
        0x24 => "FootLSB",
        0x25 => "PortamentoTimeLSB",
        0x26 => "DataEntryLSB",
        0x27 => "VolumeLSB",
        0x28 => "BalanceLSB",
        0x2A => "PanLSB",
        0x2B => "ExpressionLSB",
        0x2C => "Effects1LSB",
        0x2D => "Effects2LSB",
        0x30 => "GPC1LSB",
        0x31 => "GPC2LSB",
        0x32 => "GPC3LSB",
        0x33 => "GPC4LSB",
        0x40 => "SustainSwitch",
        0x41 => "PortamentoSwitch",
        0x42 => "SostenutoSwitch",
        0x43 => "SoftPedalSwitch",
        0x44 => "LegatoSwitch",
        0x45 => "Hold2Switch",
        0x46 => "SoundCtrl1",
        0x47 => "SoundCtrl2",
        0x48 => "SoundCtrl3",
        0x49 => "SoundCtrl4",
        0x4A => "SoundCtrl5",
        0x4B => "SoundCtrl6",
        0x4C => "SoundCtrl7",
        0x4D => "SoundCtrl8",
        0x4E => "SoundCtrl9",
        0x4F => "SoundCtrl10",
        0x50 => "GPC5",
        0x51 => "GPC6",
        0x52 => "GPC7",
        0x53 => "GPC8",
        0x54 => "PortamentoCtrl",
        0x5B => "EffectsDepth1",
        0x5C => "EffectsDepth2",
        0x5D => "EffectsDepth3",
        0x5E => "EffectsDepth4",
        0x5F => "EffectsDepth5",
        0x60 => "DataEntryIncr",
        0x61 => "DataEntryDecr",
        0x62 => "NRPNLSB",
        0x63 => "NRPNMSB",
        0x64 => "RPNLSB",
        0x65 => "RPNMSB",
        0x78 => "AllSoundOff",
        0x79 => "AllCtrlOff",
        0x7A => "LocalControl",
        0x7B => "AllNotesOff",
        0x7C => "OmniOff",
        0x7D => "OmniOn",
        0x7E => "PolyOff",
        0x7F => "PolyOn",
        _ => return None,
    };
    Some(name)
}
