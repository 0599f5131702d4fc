//! Block renderer and output formats.
//!
//! Rendering walks the request in chunks of at most 2048 frames,
//! and each chunk in sub-blocks of [`SUB_BLOCK`] frames. Every voice renders
//! one mono sub-block with its control values held constant, which is then
//! panned into the interleaved chunk mix. Finished voices are reclaimed after
//! every sub-block. The chunk mix is written to the caller's buffer in the
//! configured layout, replacing or accumulating onto its contents.

use serde::{Deserialize, Serialize};
use wavefont_core::db_to_linear;

use super::Engine;
use crate::voice::BlockContext;

/// Frames over which modulation values are held constant.
pub const SUB_BLOCK: usize = 64;

/// Frames mixed per pass through the scratch buffer.
pub(crate) const CHUNK_FRAMES: usize = 2048;

/// Channel layout of the output buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// One channel.
    Mono,
    /// Two channels, frames stored `L R L R ...`.
    #[default]
    StereoInterleaved,
    /// Two channels, all left samples followed by all right samples.
    StereoUnweaved,
}

impl OutputMode {
    /// Number of output channels.
    pub const fn channels(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::StereoInterleaved | Self::StereoUnweaved => 2,
        }
    }

    /// Buffer index of (`frame`, `channel`) in a buffer holding `frames` frames.
    #[inline]
    pub const fn index(self, frame: usize, channel: usize, frames: usize) -> usize {
        match self {
            Self::Mono => frame,
            Self::StereoInterleaved => frame * 2 + channel,
            Self::StereoUnweaved => channel * frames + frame,
        }
    }
}

/// A PCM sample type the renderer can write.
pub trait OutputSample: Copy {
    /// Convert to the internal full-scale `[-1, 1]` float domain.
    fn to_mix(self) -> f32;
    /// Convert from the float domain.
    fn from_mix(value: f32) -> Self;
}

impl OutputSample for f32 {
    #[inline]
    fn to_mix(self) -> f32 {
        self
    }

    #[inline]
    fn from_mix(value: f32) -> Self {
        value
    }
}

impl OutputSample for i16 {
    #[inline]
    fn to_mix(self) -> f32 {
        f32::from(self) / 32767.0
    }

    /// Scales by 32767 and saturates.
    #[inline]
    fn from_mix(value: f32) -> Self {
        // `as` saturates float-to-int casts and maps NaN to 0.
        (value * 32767.0).round().clamp(-32768.0, 32767.0) as i16
    }
}

impl Engine {
    /// Render `frames` frames into `buffer` in the configured output mode.
    ///
    /// With `mix` false the buffer is overwritten; with `mix` true the new
    /// signal is added onto its contents. `buffer` must hold at least
    /// `frames * channels` samples; a shorter buffer renders only the frames
    /// that fit. For [`OutputMode::StereoUnweaved`] the right channel starts
    /// at index `frames`.
    pub fn render<S: OutputSample>(&mut self, buffer: &mut [S], frames: usize, mix: bool) {
        let channels = self.output_mode.channels();
        let fit = buffer.len() / channels;
        let frames = if frames > fit {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                requested = frames,
                available = fit,
                "render buffer too small, clamping"
            );
            fit
        } else {
            frames
        };
        self.render_span(buffer, frames, 0, frames, mix);
    }

    /// Render 16-bit output; see [`Engine::render`].
    pub fn render_i16(&mut self, buffer: &mut [i16], frames: usize, mix: bool) {
        self.render(buffer, frames, mix);
    }

    /// Render float output; see [`Engine::render`].
    pub fn render_f32(&mut self, buffer: &mut [f32], frames: usize, mix: bool) {
        self.render(buffer, frames, mix);
    }

    /// Render `len` frames starting at frame `start` of a buffer laid out for
    /// `layout_frames` frames.
    pub(crate) fn render_span<S: OutputSample>(
        &mut self,
        buffer: &mut [S],
        layout_frames: usize,
        start: usize,
        len: usize,
        mix: bool,
    ) {
        let mode = self.output_mode;
        let channels = mode.channels();
        let mut done = 0;
        while done < len {
            let chunk = (len - done).min(CHUNK_FRAMES);
            self.mix_chunk(chunk);
            for frame in 0..chunk {
                for channel in 0..channels {
                    let index = mode.index(start + done + frame, channel, layout_frames);
                    let value = self.scratch[frame * channels + channel];
                    buffer[index] = if mix {
                        S::from_mix(buffer[index].to_mix() + value)
                    } else {
                        S::from_mix(value)
                    };
                }
            }
            done += chunk;
        }
    }

    /// Mix every voice into the first `frames` frames of the scratch buffer.
    fn mix_chunk(&mut self, frames: usize) {
        let Self {
            channels,
            direct,
            pool,
            output_mode,
            gain_db,
            volume,
            interpolation,
            scratch,
            voice_buf,
            ..
        } = self;
        let stereo = output_mode.channels() == 2;
        let width = output_mode.channels();
        let master = db_to_linear(*gain_db) * *volume;
        scratch[..frames * width].fill(0.0);

        let mut offset = 0;
        while offset < frames {
            let block = (frames - offset).min(SUB_BLOCK);
            let signal = &mut voice_buf[..block];
            for voice in pool.iter_mut() {
                let channel = voice.channel().map_or(&*direct, |id| channels.get(id));
                let ctx = BlockContext {
                    pitch_offset: channel.pitch_offset(),
                    gain: master * channel.volume(),
                    pan: channel.pan(),
                    stereo,
                    interpolation: *interpolation,
                };
                let Some([left, right]) = voice.render(&ctx, signal) else {
                    continue;
                };
                let out = &mut scratch[offset * width..(offset + block) * width];
                if stereo {
                    for (frame, sample) in out.chunks_exact_mut(2).zip(signal.iter()) {
                        frame[0] += sample * left;
                        frame[1] += sample * right;
                    }
                } else {
                    for (out, sample) in out.iter_mut().zip(signal.iter()) {
                        *out += sample * left;
                    }
                }
            }
            pool.reclaim();
            offset += block;
        }
    }
}
