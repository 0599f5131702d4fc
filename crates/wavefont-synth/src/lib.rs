//! Wavefont Synth - polyphonic patch-bank wavetable synthesizer
//!
//! This crate renders PCM audio from a bank of sampled instrument presets,
//! driven by note and controller events. It covers the synthesis engine
//! only: turning a patch file or a MIDI file into the types here is left to
//! the caller.
//!
//! # Components
//!
//! ## Patch data
//!
//! - [`Catalog`] - Immutable presets, each a set of [`Zone`]s over shared [`Sample`]s
//! - [`CatalogBuilder`] - Builds a catalog from instruments and presets with
//!   layered [`Generators`], resolving them into [`ZoneParams`]
//!
//! ## Playback
//!
//! - [`Engine`] - Channels, voices, output settings and the block renderer
//! - [`Voice`] - One sounding zone: [`Envelope`]s, LFOs, filter, playback cursor
//! - [`VoicePool`] - Bounded voice storage with priority-based stealing
//! - [`Channel`] - Per-channel bank, preset, pan, volume, bend and tuning
//!
//! ## Events
//!
//! - [`Event`] / [`TimedEvent`] - Note, controller, program, bend and tempo events
//! - [`Sequencer`] - Applies an [`EventSource`] at sub-block granularity while rendering
//! - [`midi`] - Message kinds, controller numbers and name tables
//!
//! ## Support
//!
//! - [`EngineConfig`] - Output and voice settings, loadable from TOML
//! - [`SharedEngine`] - Engine behind a mutex for multi-threaded use
//!
//! # Concurrency
//!
//! An [`Engine`] is synchronous: it spawns no threads and every call runs to
//! completion. Control calls and [`Engine::render`] take `&mut self`, so the
//! borrow checker already rules out running them concurrently on one
//! instance. Two ways to drive one engine from several threads:
//!
//! - Wrap it in a [`SharedEngine`], which serializes every call through a
//!   [`parking_lot::Mutex`]. The cost is one lock per call.
//! - Keep it on the audio thread and forward control as [`Event`]s through a
//!   queue, applying them between render calls.
//!
//! Voice storage is reserved for the voice limit up front, and only
//! [`Engine::set_max_voices`] can grow it, so note-ons never reallocate.
//! Limits above [`pool::MAX_RESERVED_VOICES`] reserve that many slots and
//! grow on demand past them.
//! Separate engine instances share nothing mutable, only the read-only
//! [`Catalog`], and can run fully in parallel.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wavefont_synth::{Catalog, Engine, OutputMode, PcmData, Preset, Sample, Zone};
//!
//! let sample = Arc::new(Sample::new("tone", PcmData::I16(vec![8192; 22050]), 22050));
//! let catalog = Catalog::from_presets(vec![Preset::new("Tone", 0, 0, vec![Zone::new(sample)])])
//!     .unwrap();
//!
//! let mut engine = Engine::new(Arc::new(catalog));
//! engine.set_output(OutputMode::StereoInterleaved, 48000, -3.0);
//! engine.channel_note_on(0, 64, 0.8);
//!
//! let mut buffer = vec![0i16; 2 * 256];
//! engine.render(&mut buffer, 256, false);
//! assert_eq!(engine.active_voice_count(), 1);
//! ```

pub mod catalog;
pub mod channel;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod event;
pub mod generators;
pub mod midi;
pub mod pool;
pub mod sequencer;
pub mod shared;
pub mod voice;

pub use catalog::{
    Catalog, CatalogBuilder, CatalogSource, Instrument, InstrumentId, InstrumentZone, LoopMode,
    NoteRange, PcmData, PcmFrame, Preset, PresetDefinition, PresetZone, Sample, SampleId, Zone,
};
pub use channel::{Channel, ChannelTable, ControllerState, ParameterSelect};
pub use config::EngineConfig;
pub use engine::{Engine, OutputMode, OutputSample, SUB_BLOCK};
pub use envelope::{Envelope, EnvelopeKind, EnvelopeStage};
pub use error::{CatalogError, ConfigError};
pub use event::{Event, EventSource, TimedEvent};
pub use generators::{
    EnvelopeParams, GeneratorKind, Generators, Layer, LfoParams, ZoneParams, resolve,
};
pub use midi::MessageKind;
pub use pool::VoicePool;
pub use sequencer::Sequencer;
pub use shared::SharedEngine;
pub use voice::{BlockContext, NoteStart, Voice};

pub use wavefont_core::Interpolation;
