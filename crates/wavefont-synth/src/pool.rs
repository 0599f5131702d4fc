//! Bounded set of active voices.
//!
//! The pool never holds more than its configured maximum. Making room for a
//! new note steals the voice with the lowest audible priority, in order:
//!
//! 1. Voices that already finished but were not yet reclaimed
//! 2. Releasing voices, nearest to the end of their release first
//! 3. Sounding voices, quietest first
//!
//! Ties go to the oldest voice. Storage is reserved up front for the maximum
//! voice count, up to [`MAX_RESERVED_VOICES`], so spawning never reallocates
//! while the limit is unchanged. Larger limits grow the storage on demand.

use crate::voice::Voice;

/// Default voice limit.
pub const DEFAULT_MAX_VOICES: usize = 256;

/// Most voice slots reserved ahead of use.
pub const MAX_RESERVED_VOICES: usize = 4096;

/// Active voices plus the spawn counter that orders them by age.
#[derive(Debug, Clone)]
pub struct VoicePool {
    voices: Vec<Voice>,
    max_voices: usize,
    next_id: u64,
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VOICES)
    }
}

impl VoicePool {
    /// Create a pool with storage reserved for `max_voices`, capped at
    /// [`MAX_RESERVED_VOICES`].
    pub fn new(max_voices: usize) -> Self {
        Self {
            voices: Vec::with_capacity(max_voices.min(MAX_RESERVED_VOICES)),
            max_voices,
            next_id: 0,
        }
    }

    /// Maximum number of simultaneous voices.
    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    /// Change the voice limit, stealing voices above the new limit.
    pub fn set_max_voices(&mut self, max_voices: usize) {
        self.max_voices = max_voices;
        let reserved = max_voices.min(MAX_RESERVED_VOICES);
        if self.voices.capacity() < reserved {
            self.voices.reserve_exact(reserved - self.voices.len());
        }
        let excess = self.voices.len().saturating_sub(max_voices);
        for _ in 0..excess {
            self.steal_one();
        }
    }

    /// Number of voices in the pool, including finished ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Whether the pool holds no voices.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Allocated voice storage.
    pub fn capacity(&self) -> usize {
        self.voices.capacity()
    }

    /// Active voices.
    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    /// Active voices, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.iter_mut()
    }

    /// Id to give the next spawned voice.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Steal until `incoming` more voices fit; returns how many were stolen.
    ///
    /// `incoming` is capped at the voice limit.
    pub fn make_room(&mut self, incoming: usize) -> usize {
        let incoming = incoming.min(self.max_voices);
        let mut stolen = 0;
        while self.voices.len() + incoming > self.max_voices && self.steal_one() {
            stolen += 1;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(stolen, active = self.voices.len(), "made room for {incoming} voices");
        stolen
    }

    /// Add a voice; ignored when the pool is already full.
    pub fn spawn(&mut self, voice: Voice) -> bool {
        if self.voices.len() >= self.max_voices {
            return false;
        }
        self.voices.push(voice);
        true
    }

    /// Remove finished voices; returns how many were removed.
    pub fn reclaim(&mut self) -> usize {
        let before = self.voices.len();
        self.voices.retain(|voice| !voice.is_finished());
        before - self.voices.len()
    }

    /// Remove every voice.
    pub fn clear(&mut self) {
        self.voices.clear();
    }

    fn steal_one(&mut self) -> bool {
        let victim = self
            .voices
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let (ca, ma, ia) = a.steal_rank();
                let (cb, mb, ib) = b.steal_rank();
                ca.cmp(&cb)
                    .then(ma.total_cmp(&mb))
                    .then(ia.cmp(&ib))
            })
            .map(|(index, _)| index);

        match victim {
            Some(index) => {
                self.voices.swap_remove(index);
                true
            }
            None => false,
        }
    }
}
