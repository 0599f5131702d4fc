//! Property-based tests for the wavefont-synth engine.
//!
//! Channel setter clamping, the voice limit under arbitrary note storms,
//! silence without voices, finite output, and mix linearity, using proptest
//! for randomized input generation.

use std::sync::Arc;

use proptest::prelude::*;
use wavefont_synth::{
    Catalog, Engine, LoopMode, NoteRange, OutputMode, PcmData, Preset, Sample, Zone,
};

/// Two presets: one looped single zone, one with three overlapping layers.
fn catalog() -> Arc<Catalog> {
    let data = (0..2000)
        .map(|i| libm::sinf(i as f32 * core::f32::consts::TAU / 40.0))
        .collect();
    let sample = Arc::new(
        Sample::new("sine", PcmData::F32(data), 32000).with_loop(0, 2000, LoopMode::Continuous),
    );
    let layer = |lo, hi| {
        let mut zone = Zone::new(Arc::clone(&sample)).with_keys(NoteRange::new(lo, hi));
        zone.params.amp_env.release = 0.05;
        zone
    };
    Arc::new(
        Catalog::from_presets(vec![
            Preset::new("Single", 0, 0, vec![layer(0, 127)]),
            Preset::new("Layers", 0, 1, vec![layer(0, 127), layer(0, 80), layer(40, 127)]),
        ])
        .unwrap(),
    )
}

fn output_mode(index: usize) -> OutputMode {
    match index % 3 {
        0 => OutputMode::Mono,
        1 => OutputMode::StereoInterleaved,
        _ => OutputMode::StereoUnweaved,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Pan reads back as the input clamped to [0, 1].
    #[test]
    fn pan_is_clamped(channel in 0usize..1000, pan in -100.0f32..100.0f32) {
        let mut engine = Engine::new(catalog());
        engine.channel_set_pan(channel, pan);
        prop_assert_eq!(engine.channel_pan(channel), pan.clamp(0.0, 1.0));
    }

    /// Volume reads back clamped to [0, 1] and the wheel to [0, 16383].
    #[test]
    fn volume_and_wheel_are_clamped(
        volume in -10.0f32..10.0f32,
        wheel in -100_000i32..100_000i32,
    ) {
        let mut engine = Engine::new(catalog());
        engine.channel_set_volume(2, volume);
        engine.channel_set_pitch_wheel(2, wheel);
        prop_assert_eq!(engine.channel_volume(2), volume.clamp(0.0, 1.0));
        prop_assert_eq!(i32::from(engine.channel_pitch_wheel(2)), wheel.clamp(0, 16383));
    }

    /// No sequence of note-ons pushes the voice count past the limit.
    #[test]
    fn voice_limit_holds(
        max_voices in 0usize..24,
        notes in prop::collection::vec((0usize..2, 0u8..128, 0.01f32..1.0f32), 1..120),
    ) {
        let mut engine = Engine::new(catalog());
        engine.set_max_voices(max_voices);
        let mut block = vec![0.0f32; 2 * 64];
        for (i, (preset, key, velocity)) in notes.into_iter().enumerate() {
            engine.note_on(preset, key, velocity);
            prop_assert!(engine.active_voice_count() <= max_voices);
            if i % 7 == 0 {
                engine.render(&mut block, 64, false);
                prop_assert!(engine.active_voice_count() <= max_voices);
            }
        }
    }

    /// With no voices every render is silent, whatever was in the buffer.
    #[test]
    fn silent_without_voices(
        mode in 0usize..3,
        frames in 1usize..3000,
        fill in -1.0f32..1.0f32,
    ) {
        let mode = output_mode(mode);
        let mut engine = Engine::new(catalog());
        engine.set_output(mode, 44100, 0.0);
        let mut buffer = vec![fill; frames * mode.channels()];
        engine.render(&mut buffer, frames, false);
        prop_assert!(buffer.iter().all(|s| *s == 0.0));
    }

    /// Output stays finite for any note, bend and channel setting.
    #[test]
    fn output_is_finite(
        key in 0u8..128,
        velocity in 0.01f32..1.0f32,
        wheel in 0i32..16384,
        range in 0.0f32..96.0f32,
        tuning in -48.0f32..48.0f32,
    ) {
        let mut engine = Engine::new(catalog());
        engine.channel_set_pitch_range(0, range);
        engine.channel_set_pitch_wheel(0, wheel);
        engine.channel_set_tuning(0, tuning);
        engine.channel_set_preset_index(0, 1);
        engine.channel_note_on(0, key, velocity);
        let mut buffer = vec![0.0f32; 2 * 512];
        engine.render(&mut buffer, 512, false);
        prop_assert!(buffer.iter().all(|s| s.is_finite()));
    }

    /// Tuning of any magnitude reads back clamped and keeps looped output finite.
    #[test]
    fn any_tuning_keeps_output_finite(
        tuning in prop::num::f32::ANY,
        wheel in 0i32..16384,
        key in 0u8..128,
    ) {
        let mut engine = Engine::new(catalog());
        engine.set_output(OutputMode::Mono, 44100, 0.0);
        engine.channel_set_pitch_range(0, 96.0);
        engine.channel_set_pitch_wheel(0, wheel);
        engine.channel_set_tuning(0, tuning);
        prop_assert!(engine.channel_tuning(0).abs() <= 96.0);
        engine.channel_note_on(0, key, 1.0);
        let mut buffer = vec![0.0f32; 256];
        engine.render(&mut buffer, 256, false);
        prop_assert!(buffer.iter().all(|s| s.is_finite()));
    }

    /// Mixing a render onto an identical render doubles it exactly.
    #[test]
    fn mix_is_linear(
        mode in 0usize..3,
        keys in prop::collection::vec(20u8..110, 1..6),
        frames in 1usize..700,
    ) {
        let mut engine = Engine::new(catalog());
        engine.set_output(output_mode(mode), 44100, 0.0);
        for key in keys {
            engine.note_on(1, key, 0.8);
        }
        let mut snapshot = engine.clone();
        let mut buffer = vec![0.0f32; frames * 2];
        snapshot.render(&mut buffer, frames, false);
        let single = buffer.clone();
        engine.render(&mut buffer, frames, true);
        for (doubled, once) in buffer.iter().zip(&single) {
            prop_assert_eq!(*doubled, 2.0 * once);
        }
    }
}
