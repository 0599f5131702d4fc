//! Timed performance events.
//!
//! An event source is any iterator of [`TimedEvent`]s in non-decreasing time
//! order. How it is produced (a file tokenizer, a live input queue, a test
//! vector) is the caller's concern; [`Event::from_bytes`] decodes raw channel
//! messages for sources that start from MIDI bytes.

use std::fmt;

use crate::midi::{MessageKind, controller_name};

/// A performance event addressed to a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// Start a note; velocity 0.0 acts as a note-off.
    NoteOn {
        /// Channel id.
        channel: usize,
        /// Key, 0 to 127.
        key: u8,
        /// Velocity, 0.0 to 1.0.
        velocity: f32,
    },
    /// Release a note.
    NoteOff {
        /// Channel id.
        channel: usize,
        /// Key, 0 to 127.
        key: u8,
    },
    /// Polyphonic aftertouch; accepted and ignored by the engine.
    KeyPressure {
        /// Channel id.
        channel: usize,
        /// Key, 0 to 127.
        key: u8,
        /// Pressure, 0 to 127.
        pressure: u8,
    },
    /// Controller change.
    ControlChange {
        /// Channel id.
        channel: usize,
        /// Controller number, 0 to 127.
        controller: u8,
        /// Controller value, 0 to 127.
        value: u8,
    },
    /// Select a preset within the channel's bank.
    ProgramChange {
        /// Channel id.
        channel: usize,
        /// Program number, 0 to 127.
        program: u8,
    },
    /// Channel aftertouch; accepted and ignored by the engine.
    ChannelPressure {
        /// Channel id.
        channel: usize,
        /// Pressure, 0 to 127.
        pressure: u8,
    },
    /// Move the pitch wheel.
    PitchBend {
        /// Channel id.
        channel: usize,
        /// 14-bit wheel position, 8192 is centre.
        value: u16,
    },
    /// Tempo change; affects sequencing only.
    SetTempo {
        /// Microseconds per quarter note.
        micros_per_quarter: u32,
    },
}

impl Event {
    /// Decode a channel message from its status and data bytes.
    ///
    /// Pitch bend combines `data1` as the low 7 bits and `data2` as the high
    /// 7 bits. A note-on with velocity 0 decodes as [`Event::NoteOn`] with
    /// velocity 0.0, which the engine treats as a note-off. Returns `None`
    /// for system messages.
    pub fn from_bytes(status: u8, data1: u8, data2: u8) -> Option<Self> {
        let channel = usize::from(status & 0x0F);
        let data1 = data1 & 0x7F;
        let data2 = data2 & 0x7F;
        let event = match MessageKind::from_status(status)? {
            MessageKind::NoteOff => Event::NoteOff { channel, key: data1 },
            MessageKind::NoteOn => Event::NoteOn {
                channel,
                key: data1,
                velocity: f32::from(data2) / 127.0,
            },
            MessageKind::KeyPressure => Event::KeyPressure {
                channel,
                key: data1,
                pressure: data2,
            },
            MessageKind::ControlChange => Event::ControlChange {
                channel,
                controller: data1,
                value: data2,
            },
            MessageKind::ProgramChange => Event::ProgramChange {
                channel,
                program: data1,
            },
            MessageKind::ChannelPressure => Event::ChannelPressure {
                channel,
                pressure: data1,
            },
            MessageKind::PitchBend => Event::PitchBend {
                channel,
                value: u16::from(data1) | (u16::from(data2) << 7),
            },
            MessageKind::SetTempo => return None,
        };
        Some(event)
    }

    /// Message kind.
    pub fn kind(&self) -> MessageKind {
        match self {
            Event::NoteOn { .. } => MessageKind::NoteOn,
            Event::NoteOff { .. } => MessageKind::NoteOff,
            Event::KeyPressure { .. } => MessageKind::KeyPressure,
            Event::ControlChange { .. } => MessageKind::ControlChange,
            Event::ProgramChange { .. } => MessageKind::ProgramChange,
            Event::ChannelPressure { .. } => MessageKind::ChannelPressure,
            Event::PitchBend { .. } => MessageKind::PitchBend,
            Event::SetTempo { .. } => MessageKind::SetTempo,
        }
    }

    /// Target channel; `None` for channel-less meta events.
    pub fn channel(&self) -> Option<usize> {
        match *self {
            Event::NoteOn { channel, .. }
            | Event::NoteOff { channel, .. }
            | Event::KeyPressure { channel, .. }
            | Event::ControlChange { channel, .. }
            | Event::ProgramChange { channel, .. }
            | Event::ChannelPressure { channel, .. }
            | Event::PitchBend { channel, .. } => Some(channel),
            Event::SetTempo { .. } => None,
        }
    }
}

impl fmt::Display for Event {
    /// One-line trace form, e.g. `[0] NoteOn Key=60 Velocity=100`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(channel) = self.channel() {
            write!(f, "[{channel}] ")?;
        }
        write!(f, "{}", self.kind().name())?;
        match *self {
            Event::NoteOn { key, velocity, .. } => {
                write!(f, " Key={key} Velocity={}", (velocity * 127.0).round() as i32)
            }
            Event::NoteOff { key, .. } => write!(f, " Key={key}"),
            Event::KeyPressure { key, pressure, .. } => {
                write!(f, " Key={key} Pressure={pressure}")
            }
            Event::ControlChange {
                controller, value, ..
            } => match controller_name(controller) {
                Some(name) => write!(f, " {name}={value}"),
                None => write!(f, " control {controller}={value}"),
            },
            Event::ProgramChange { program, .. } => write!(f, " Program={program}"),
            Event::ChannelPressure { pressure, .. } => write!(f, " Pressure={pressure}"),
            Event::PitchBend { value, .. } => write!(f, " Value={value}"),
            Event::SetTempo { micros_per_quarter } => {
                write!(f, " MicrosPerQuarter={micros_per_quarter}")
            }
        }
    }
}

/// An event stamped with its time from the start of the sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimedEvent {
    /// Milliseconds from the start of the sequence.
    pub time_ms: f64,
    /// The event.
    pub event: Event,
}

impl TimedEvent {
    /// Stamp `event` with `time_ms`.
    pub fn new(time_ms: f64, event: Event) -> Self {
        Self { time_ms, event }
    }
}

/// A forward-only, time-ordered supply of events.
///
/// Implemented for every iterator of [`TimedEvent`]. Restart a source by
/// constructing it again.
pub trait EventSource: Iterator<Item = TimedEvent> {}

impl<I: Iterator<Item = TimedEvent>> EventSource for I {}
