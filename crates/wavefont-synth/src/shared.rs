//! Engine handle with internal locking.
//!
//! [`SharedEngine`] serializes every control and render call through one
//! mutex, so clones of the handle can be used from a control thread and an
//! audio thread at once. The cost is one lock acquisition per call; with a
//! single caller it is uncontended. A render call holds the lock for its
//! whole duration, so control calls made meanwhile wait for it to finish.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::engine::{Engine, OutputSample};
use crate::event::Event;

/// Cloneable, lock-protected [`Engine`].
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    /// Wrap `engine`.
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Lock the engine for a sequence of calls.
    pub fn lock(&self) -> MutexGuard<'_, Engine> {
        self.inner.lock()
    }

    /// Lock without waiting; `None` if another caller holds the engine.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Engine>> {
        self.inner.try_lock()
    }

    /// Apply one event.
    pub fn apply(&self, event: &Event) {
        self.inner.lock().apply(event);
    }

    /// Start a note on a channel.
    pub fn channel_note_on(&self, channel: usize, key: u8, velocity: f32) -> usize {
        self.inner.lock().channel_note_on(channel, key, velocity)
    }

    /// Release a note on a channel.
    pub fn channel_note_off(&self, channel: usize, key: u8) {
        self.inner.lock().channel_note_off(channel, key);
    }

    /// Interpret a MIDI control change.
    pub fn channel_midi_control(&self, channel: usize, controller: u8, value: u8) {
        self.inner.lock().channel_midi_control(channel, controller, value);
    }

    /// Render into `buffer`; see [`Engine::render`].
    pub fn render<S: OutputSample>(&self, buffer: &mut [S], frames: usize, mix: bool) {
        self.inner.lock().render(buffer, frames, mix);
    }

    /// Number of voices that have not finished.
    pub fn active_voice_count(&self) -> usize {
        self.inner.lock().active_voice_count()
    }

    /// Take the engine back if this is the last handle.
    pub fn try_unwrap(self) -> Result<Engine, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<Engine> for SharedEngine {
    fn from(engine: Engine) -> Self {
        Self::new(engine)
    }
}
