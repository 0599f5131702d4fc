//! Control-rate Low Frequency Oscillator.
//!
//! Voices advance their LFOs once per render sub-block rather than once per
//! sample, so the oscillator steps by a whole block of samples at a time and
//! reports a held value in between. Each LFO has an onset delay during which
//! its output stays at zero.

use libm::floorf;

/// Block-stepped triangle Low Frequency Oscillator.
///
/// Output is bipolar in `[-1.0, 1.0]`. The triangle starts at zero heading
/// upward once the delay has elapsed, so an LFO never introduces a step
/// at its onset.
///
/// # Example
///
/// ```rust
/// use wavefont_core::Lfo;
///
/// let mut lfo = Lfo::new(44100.0, 5.0);
/// lfo.set_delay_samples(441);
///
/// lfo.advance(64);
/// assert_eq!(lfo.value(), 0.0); // still inside the delay
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    sample_rate: f32,
    /// Samples left before the oscillator starts moving
    delay_remaining: u32,
    /// Held output, refreshed on every advance
    value: f32,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(48000.0, 1.0)
    }
}

impl Lfo {
    /// Create a new LFO with the given sample rate and frequency.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: freq_hz.max(0.0) / sample_rate,
            sample_rate,
            delay_remaining: 0,
            value: 0.0,
        }
    }

    /// Set frequency in Hz.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.phase_inc = freq_hz.max(0.0) / self.sample_rate;
    }

    /// Get current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }

    /// Set the onset delay in samples.
    pub fn set_delay_samples(&mut self, samples: u32) {
        self.delay_remaining = samples;
    }

    /// Samples remaining before the oscillator starts.
    pub fn delay_remaining(&self) -> u32 {
        self.delay_remaining
    }

    /// Restart at zero phase with no delay.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.delay_remaining = 0;
        self.value = 0.0;
    }

    /// Whether the LFO can ever leave zero.
    pub fn is_running(&self) -> bool {
        self.phase_inc > 0.0
    }

    /// Current held output in `[-1.0, 1.0]`.
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Advance by `samples` and refresh the held output.
    ///
    /// Delay is consumed first; any remainder of the block moves the phase.
    #[inline]
    pub fn advance(&mut self, samples: u32) {
        let mut running = samples;
        if self.delay_remaining > 0 {
            if self.delay_remaining >= running {
                self.delay_remaining -= running;
                return;
            }
            running -= self.delay_remaining;
            self.delay_remaining = 0;
        }

        self.phase += self.phase_inc * running as f32;
        self.phase -= floorf(self.phase);
        self.value = triangle(self.phase);
    }

    /// Set sample rate, keeping the frequency.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let freq = self.frequency();
        self.sample_rate = sample_rate;
        self.set_frequency(freq);
    }
}

/// Triangle value at `phase`, with phase 0 mapped to a rising zero crossing.
#[inline]
fn triangle(phase: f32) -> f32 {
    // 0 → 1 over the first quarter, down to -1 at three quarters
    if phase < 0.25 {
        4.0 * phase
    } else if phase < 0.75 {
        2.0 - 4.0 * phase
    } else {
        4.0 * phase - 4.0
    }
}
