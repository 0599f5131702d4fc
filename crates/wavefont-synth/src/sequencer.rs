//! Time-stamped event playback.
//!
//! A [`Sequencer`] advances a clock through rendered audio and, before each
//! sub-block, applies every event whose timestamp has been reached. Event
//! timing is therefore quantized to [`SUB_BLOCK`] frames.

use std::iter::Peekable;

use crate::engine::{Engine, OutputSample, SUB_BLOCK};
use crate::event::{Event, EventSource, TimedEvent};

/// Default tempo, microseconds per quarter note (120 BPM).
pub const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;

/// Drives an [`EventSource`] against an [`Engine`] while rendering.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use wavefont_synth::{Catalog, Engine, Event, PcmData, Preset, Sample, Sequencer, TimedEvent, Zone};
///
/// let sample = Arc::new(Sample::new("s", PcmData::F32(vec![0.5; 44100]), 44100));
/// let catalog = Catalog::from_presets(vec![Preset::new("P", 0, 0, vec![Zone::new(sample)])]).unwrap();
/// let mut engine = Engine::new(Arc::new(catalog));
///
/// let events = vec![
///     TimedEvent::new(0.0, Event::NoteOn { channel: 0, key: 60, velocity: 1.0 }),
///     TimedEvent::new(10.0, Event::NoteOff { channel: 0, key: 60 }),
/// ];
/// let mut sequencer = Sequencer::new(events.into_iter());
///
/// let mut buffer = vec![0.0f32; 2 * 1024];
/// sequencer.render(&mut engine, &mut buffer, 1024, false);
/// assert!(sequencer.is_finished());
/// ```
#[derive(Debug)]
pub struct Sequencer<S: EventSource> {
    source: Peekable<S>,
    time_ms: f64,
    micros_per_quarter: u32,
    dispatched: usize,
}

impl<S: EventSource> Sequencer<S> {
    /// Start at time zero.
    pub fn new(source: S) -> Self {
        Self {
            source: source.peekable(),
            time_ms: 0.0,
            micros_per_quarter: DEFAULT_MICROS_PER_QUARTER,
            dispatched: 0,
        }
    }

    /// Playback position in milliseconds.
    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    /// Most recent tempo seen in the stream.
    pub fn micros_per_quarter(&self) -> u32 {
        self.micros_per_quarter
    }

    /// Number of events applied so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Whether every event has been applied.
    pub fn is_finished(&mut self) -> bool {
        self.source.peek().is_none()
    }

    /// Apply every event due at or before the current time.
    pub fn dispatch_due(&mut self, engine: &mut Engine) {
        let now = self.time_ms;
        while let Some(TimedEvent { event, .. }) = self.source.next_if(|next| next.time_ms <= now)
        {
            if let Event::SetTempo { micros_per_quarter } = event {
                self.micros_per_quarter = micros_per_quarter;
            }
            engine.apply(&event);
            self.dispatched += 1;
        }
    }

    /// Render `frames` frames, applying events as their time comes up.
    ///
    /// Buffer layout and `mix` behave as in [`Engine::render`].
    pub fn render<T: OutputSample>(
        &mut self,
        engine: &mut Engine,
        buffer: &mut [T],
        frames: usize,
        mix: bool,
    ) {
        let frames = frames.min(buffer.len() / engine.output_mode().channels());
        let ms_per_frame = 1000.0 / f64::from(engine.sample_rate());
        let mut done = 0;
        while done < frames {
            self.dispatch_due(engine);
            let block = (frames - done).min(SUB_BLOCK);
            engine.render_span(buffer, frames, done, block, mix);
            done += block;
            self.time_ms += block as f64 * ms_per_frame;
        }
    }

    /// Give back the remaining events.
    pub fn into_inner(self) -> Peekable<S> {
        self.source
    }
}
