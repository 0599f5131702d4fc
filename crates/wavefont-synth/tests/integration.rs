//! Integration tests for the wavefont-synth engine.
//!
//! Drives the public API end to end: catalogs built through the layered
//! builder, channel and direct notes, the block renderer in every output
//! mode, MIDI controller dispatch, sequenced playback, and configuration
//! files.

use std::sync::Arc;

use wavefont_synth::{
    Catalog, CatalogBuilder, CatalogError, Engine, EngineConfig, Event, GeneratorKind,
    Generators, Instrument, InstrumentZone, Interpolation, LoopMode, NoteRange, OutputMode,
    PcmData, Preset, PresetDefinition, PresetZone, SUB_BLOCK, Sample, Sequencer, TimedEvent,
    Zone, midi,
};

const SAMPLE_RATE: u32 = 44100;

/// A sine with a `period`-frame cycle, `cycles` cycles long, looped end to end.
fn sine_sample(period: usize, cycles: usize) -> Sample {
    let len = period * cycles;
    let data = (0..len)
        .map(|i| libm::sinf(i as f32 * core::f32::consts::TAU / period as f32))
        .collect();
    Sample::new("sine", PcmData::F32(data), SAMPLE_RATE).with_loop(
        0,
        len as u32,
        LoopMode::Continuous,
    )
}

/// A constant-level sample looped over its whole length.
fn dc_sample(level: f32) -> Sample {
    Sample::new("dc", PcmData::F32(vec![level; 1000]), SAMPLE_RATE).with_loop(
        0,
        1000,
        LoopMode::Continuous,
    )
}

/// Timecents for a duration in seconds.
fn timecents(seconds: f32) -> f32 {
    1200.0 * libm::log2f(seconds)
}

/// Catalog with one preset holding one full-range looped zone.
fn single_zone_catalog(sample: Sample, release_seconds: f32) -> Catalog {
    let mut builder = CatalogBuilder::new();
    let sample = builder.add_sample(sample);
    let mut zone = InstrumentZone::new(sample);
    zone.generators = Generators::new()
        .with(GeneratorKind::SampleModes, 1.0)
        .with(GeneratorKind::ReleaseVolEnv, timecents(release_seconds));
    let instrument = builder.add_instrument(Instrument {
        name: "Solo".to_string(),
        global: Generators::new(),
        zones: vec![zone],
    });
    builder.add_preset(PresetDefinition {
        name: "Solo".to_string(),
        bank: 0,
        number: 0,
        global: Generators::new(),
        zones: vec![PresetZone::new(instrument)],
    });
    builder.build().unwrap()
}

fn mono_engine(catalog: Catalog) -> Engine {
    let mut engine = Engine::new(Arc::new(catalog));
    engine.set_output(OutputMode::Mono, SAMPLE_RATE, 0.0);
    engine
}

fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

// ============================================================================
// 1. End-to-end note lifecycle
// ============================================================================

#[test]
fn note_renders_then_releases_to_silence() {
    let release = 0.1;
    let mut engine = mono_engine(single_zone_catalog(sine_sample(100, 400), release));

    engine.note_on(0, 60, 1.0);
    assert_eq!(engine.active_voice_count(), 1);

    let mut block = [0.0f32; 64];
    engine.render(&mut block, 64, false);
    assert!(block.iter().any(|s| *s != 0.0));

    engine.note_off(0, 60);
    let release_blocks = (release * SAMPLE_RATE as f32 / 64.0).ceil() as usize;
    let mut blocks = 0;
    while engine.active_voice_count() > 0 {
        engine.render(&mut block, 64, false);
        blocks += 1;
        assert!(blocks <= release_blocks + 1, "voice outlived its release");
    }

    for _ in 0..10 {
        engine.render(&mut block, 64, false);
        assert!(block.iter().all(|s| *s == 0.0));
    }
}

#[test]
fn release_amplitude_never_increases() {
    let mut engine = mono_engine(single_zone_catalog(dc_sample(0.5), 0.25));
    engine.note_on(0, 60, 1.0);
    let mut block = [0.0f32; 64];
    engine.render(&mut block, 64, false);
    engine.note_off(0, 60);

    let mut previous = f32::INFINITY;
    while engine.active_voice_count() > 0 {
        engine.render(&mut block, 64, false);
        for &sample in &block {
            assert!(sample <= previous + 1e-7, "{sample} after {previous}");
            previous = sample;
        }
    }
    assert!(previous < 1e-3);
}

// ============================================================================
// 2. Renderer properties
// ============================================================================

#[test]
fn silent_without_voices_in_every_mode() {
    let catalog = Arc::new(single_zone_catalog(dc_sample(0.5), 0.1));
    for mode in [
        OutputMode::Mono,
        OutputMode::StereoInterleaved,
        OutputMode::StereoUnweaved,
    ] {
        let mut engine = Engine::new(Arc::clone(&catalog));
        engine.set_output(mode, SAMPLE_RATE, 0.0);

        let mut floats = vec![0.3f32; 1000 * mode.channels()];
        let mut shorts = vec![123i16; 1000 * mode.channels()];
        for _ in 0..4 {
            engine.render(&mut floats, 1000, false);
            engine.render(&mut shorts, 1000, false);
            assert!(floats.iter().all(|s| *s == 0.0));
            assert!(shorts.iter().all(|s| *s == 0));
        }
    }
}

#[test]
fn mix_render_doubles_output() {
    let mut engine = Engine::new(Arc::new(single_zone_catalog(sine_sample(64, 100), 0.1)));
    engine.channel_note_on(0, 67, 0.7);
    engine.channel_note_on(0, 72, 0.5);
    engine.channel_set_pan(0, 0.3);

    let mut snapshot = engine.clone();
    let mut buffer = vec![0.0f32; 2 * 500];
    snapshot.render(&mut buffer, 500, false);
    let single = buffer.clone();
    engine.render(&mut buffer, 500, true);

    for (doubled, once) in buffer.iter().zip(&single) {
        assert_eq!(*doubled, 2.0 * once);
    }
    assert!(peak(&single) > 0.0);
}

#[test]
fn stereo_modes_carry_the_same_signal() {
    let catalog = Arc::new(single_zone_catalog(sine_sample(50, 100), 0.1));
    let mut interleaved = Engine::new(Arc::clone(&catalog));
    let mut unweaved = Engine::new(catalog);
    unweaved.set_output(OutputMode::StereoUnweaved, SAMPLE_RATE, 0.0);
    for engine in [&mut interleaved, &mut unweaved] {
        engine.channel_set_pan(0, 0.8);
        engine.channel_note_on(0, 60, 1.0);
    }

    let frames = 300;
    let mut a = vec![0.0f32; frames * 2];
    let mut b = vec![0.0f32; frames * 2];
    interleaved.render(&mut a, frames, false);
    unweaved.render(&mut b, frames, false);
    for frame in 0..frames {
        assert_eq!(a[frame * 2], b[frame]);
        assert_eq!(a[frame * 2 + 1], b[frames + frame]);
    }
}

#[test]
fn render_length_does_not_change_output() {
    let catalog = Arc::new(single_zone_catalog(sine_sample(37, 200), 0.1));
    let mut whole = mono_engine(Catalog::clone(&catalog));
    let mut pieces = mono_engine(Catalog::clone(&catalog));
    whole.note_on(0, 55, 0.9);
    pieces.note_on(0, 55, 0.9);

    let mut expected = vec![0.0f32; 640];
    whole.render(&mut expected, 640, false);

    let mut actual = vec![0.0f32; 640];
    for chunk in actual.chunks_mut(SUB_BLOCK * 2) {
        let frames = chunk.len();
        pieces.render(chunk, frames, false);
    }
    assert_eq!(expected, actual);
}

// ============================================================================
// 3. Catalog and preset lookup
// ============================================================================

#[test]
fn preset_lookup_is_stable() {
    let sample = Arc::new(dc_sample(0.5));
    let catalog = Catalog::from_presets(vec![
        Preset::new("Piano", 0, 0, vec![Zone::new(Arc::clone(&sample))]),
        Preset::new("Bass", 0, 32, vec![Zone::new(Arc::clone(&sample))]),
        Preset::new("Kit", 128, 0, vec![Zone::new(sample)]),
    ])
    .unwrap();
    let engine = Engine::new(Arc::new(catalog));

    assert_eq!(engine.preset_count(), 3);
    let bass = engine.preset_index(0, 32);
    assert!(bass.is_some());
    for _ in 0..5 {
        assert_eq!(engine.preset_index(0, 32), bass);
    }
    assert_eq!(engine.preset_index(0, 33), None);
    assert_eq!(engine.preset_index(1, 0), None);
    assert_eq!(engine.preset_name(bass.unwrap()), Some("Bass"));
    assert_eq!(engine.preset_name(99), None);
}

#[test]
fn layered_zones_spawn_together() {
    let mut builder = CatalogBuilder::new();
    let soft = builder.add_sample(dc_sample(0.2));
    let loud = builder.add_sample(dc_sample(0.8));
    let pad = builder.add_sample(dc_sample(0.1));

    let mut soft_zone = InstrumentZone::new(soft);
    soft_zone.vel_range = NoteRange::new(0, 63);
    let mut loud_zone = InstrumentZone::new(loud);
    loud_zone.vel_range = NoteRange::new(64, 127);
    let mut pad_zone = InstrumentZone::new(pad);
    pad_zone.key_range = NoteRange::new(48, 72);

    let instrument = builder.add_instrument(Instrument {
        name: "Layers".to_string(),
        global: Generators::new().with(GeneratorKind::SampleModes, 1.0),
        zones: vec![soft_zone, loud_zone, pad_zone],
    });
    builder.add_preset(PresetDefinition {
        name: "Layers".to_string(),
        zones: vec![PresetZone::new(instrument)],
        ..Default::default()
    });
    let mut engine = mono_engine(builder.build().unwrap());

    let expected = engine.catalog().matching_zones(0, 60, 127).count();
    assert_eq!(expected, 2);
    engine.note_on(0, 60, 1.0);
    assert_eq!(engine.active_voice_count(), 2);

    engine.note_on(0, 90, 0.2);
    assert_eq!(engine.active_voice_count(), 3);
}

#[test]
fn invalid_catalog_is_inert() {
    let catalog = Catalog::load(|| -> Result<CatalogBuilder, CatalogError> {
        Err(CatalogError::malformed("truncated sample chunk"))
    });
    assert!(!catalog.is_valid());

    let mut engine = Engine::new(Arc::new(catalog));
    assert_eq!(engine.preset_count(), 0);
    assert_eq!(engine.preset_index(0, 0), None);
    assert!(!engine.note_on(0, 60, 1.0));
    assert_eq!(engine.channel_note_on(0, 60, 1.0), 0);
    assert!(!engine.channel_set_bank_preset(0, 0, 0));

    let mut buffer = vec![1.0f32; 128];
    engine.render(&mut buffer, 64, false);
    assert!(buffer.iter().all(|s| *s == 0.0));
}

// ============================================================================
// 4. Channels and voice limits
// ============================================================================

#[test]
fn pan_is_clamped() {
    let mut engine = Engine::new(Arc::new(single_zone_catalog(dc_sample(0.5), 0.1)));
    for (input, expected) in [(-3.0, 0.0), (0.0, 0.0), (0.25, 0.25), (1.0, 1.0), (7.5, 1.0)] {
        engine.channel_set_pan(5, input);
        assert_eq!(engine.channel_pan(5), expected);
    }
}

#[test]
fn voice_count_respects_limit() {
    let mut engine = mono_engine(single_zone_catalog(dc_sample(0.5), 1.0));
    engine.set_max_voices(8);
    let mut block = [0.0f32; 64];
    for round in 0..10u8 {
        for key in 0..50u8 {
            engine.channel_note_on(usize::from(key % 4), key.wrapping_add(round), 1.0);
            assert!(engine.active_voice_count() <= 8);
        }
        engine.render(&mut block, 64, false);
        assert!(engine.active_voice_count() <= 8);
    }

    engine.set_max_voices(2);
    assert!(engine.active_voice_count() <= 2);
}

#[test]
fn pitch_bend_retunes_next_sub_block() {
    let mut engine = mono_engine(single_zone_catalog(sine_sample(100, 400), 0.1));
    engine.channel_note_on(0, 60, 1.0);
    let mut block = [0.0f32; SUB_BLOCK];
    engine.render(&mut block, SUB_BLOCK, false);
    let before = engine.voices().next().unwrap().position();
    assert!((before - SUB_BLOCK as f64).abs() < 1e-9);

    engine.apply(&Event::PitchBend {
        channel: 0,
        value: 16383,
    });
    engine.render(&mut block, SUB_BLOCK, false);
    let after = engine.voices().next().unwrap().position();

    let semitones = 8191.0 / 8192.0 * 2.0;
    let step = libm::exp2(semitones / 12.0);
    assert!((after - before - step * SUB_BLOCK as f64).abs() < 1e-3);
    assert_eq!(engine.active_voice_count(), 1);
}

#[test]
fn huge_tuning_is_clamped_not_propagated() {
    let mut engine = mono_engine(single_zone_catalog(sine_sample(100, 400), 0.1));
    engine.channel_set_tuning(0, 1e6);
    assert_eq!(engine.channel_tuning(0), 96.0);
    engine.channel_note_on(0, 60, 1.0);
    let mut block = [0.0f32; SUB_BLOCK];
    engine.render(&mut block, SUB_BLOCK, false);
    assert!(block.iter().all(|s| s.is_finite()));
    assert!(peak(&block) > 0.0);
}

#[test]
fn percussion_channel_selects_drum_kits() {
    let sample = Arc::new(dc_sample(0.5));
    let catalog = Catalog::from_presets(vec![
        Preset::new("Piano", 0, 0, vec![Zone::new(Arc::clone(&sample))]),
        Preset::new("Standard", 128, 0, vec![Zone::new(Arc::clone(&sample))]),
        Preset::new("Jazz", 128, 32, vec![Zone::new(sample)]),
    ])
    .unwrap();
    let mut engine = Engine::new(Arc::new(catalog));

    assert_eq!(engine.channel_preset_bank(9), Some(128));
    engine.apply(&Event::ProgramChange {
        channel: 9,
        program: 32,
    });
    assert_eq!(engine.channel_preset_number(9), Some(32));

    engine.apply(&Event::ProgramChange {
        channel: 0,
        program: 32,
    });
    assert_eq!(engine.channel_preset_number(0), Some(0));

    engine.set_percussion_channel(None);
    assert_eq!(engine.channel_preset_bank(9), Some(0));
}

#[test]
fn exclusive_class_chokes_open_hat() {
    let mut builder = CatalogBuilder::new();
    let closed = builder.add_sample(dc_sample(0.4));
    let open = builder.add_sample(dc_sample(0.4));
    let mut closed_zone = InstrumentZone::new(closed);
    closed_zone.key_range = NoteRange::new(42, 42);
    let mut open_zone = InstrumentZone::new(open);
    open_zone.key_range = NoteRange::new(46, 46);
    let instrument = builder.add_instrument(Instrument {
        name: "Hats".to_string(),
        global: Generators::new()
            .with(GeneratorKind::SampleModes, 1.0)
            .with(GeneratorKind::ExclusiveClass, 1.0)
            .with(GeneratorKind::ReleaseVolEnv, timecents(2.0)),
        zones: vec![closed_zone, open_zone],
    });
    builder.add_preset(PresetDefinition {
        name: "Kit".to_string(),
        bank: 128,
        number: 0,
        zones: vec![PresetZone::new(instrument)],
        ..Default::default()
    });
    let mut engine = mono_engine(builder.build().unwrap());

    engine.channel_note_on(9, 46, 1.0);
    engine.channel_note_on(9, 42, 1.0);
    let mut block = [0.0f32; 64];
    // The choke fades over 10 ms, far shorter than the 2 s release.
    for _ in 0..8 {
        engine.render(&mut block, 64, false);
    }
    let keys: Vec<u8> = engine.voices().map(|v| v.key()).collect();
    assert_eq!(keys, vec![42]);
}

#[test]
fn controllers_shape_channel_output() {
    let mut engine = mono_engine(single_zone_catalog(dc_sample(0.5), 0.1));
    engine.channel_midi_control(0, midi::VOLUME_MSB, 64);
    engine.channel_midi_control(0, midi::VOLUME_LSB, 0);
    engine.channel_note_on(0, 60, 1.0);

    let mut block = [0.0f32; 64];
    engine.render(&mut block, 64, false);
    let level = 8192.0f32 / 16383.0;
    let expected = 0.5 * level * level * level;
    assert!((block[32] - expected).abs() < 1e-5, "got {}", block[32]);

    engine.channel_midi_control(0, midi::ALL_SOUND_OFF, 0);
    engine.render(&mut block, 64, false);
    assert!(block.iter().all(|s| *s == 0.0));
    assert_eq!(engine.active_voice_count(), 0);
}

#[test]
fn engines_are_independent_across_threads() {
    let catalog = Arc::new(single_zone_catalog(sine_sample(64, 200), 0.1));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            std::thread::spawn(move || {
                let mut engine = Engine::new(catalog);
                engine.channel_note_on(0, 64, 0.9);
                let mut buffer = vec![0.0f32; 2 * 1024];
                engine.render(&mut buffer, 1024, false);
                buffer
            })
        })
        .collect();
    let outputs: Vec<Vec<f32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
}

// ============================================================================
// 5. Sequencing and configuration
// ============================================================================

#[test]
fn sequenced_performance_plays_and_ends() {
    let mut engine = mono_engine(single_zone_catalog(sine_sample(100, 400), 0.05));
    let events = vec![
        TimedEvent::new(
            0.0,
            Event::ControlChange {
                channel: 0,
                controller: midi::PAN_MSB,
                value: 0,
            },
        ),
        TimedEvent::new(
            0.0,
            Event::NoteOn {
                channel: 0,
                key: 60,
                velocity: 1.0,
            },
        ),
        TimedEvent::new(
            5.0,
            Event::NoteOn {
                channel: 0,
                key: 64,
                velocity: 1.0,
            },
        ),
        TimedEvent::new(100.0, Event::NoteOff { channel: 0, key: 60 }),
        TimedEvent::new(100.0, Event::NoteOff { channel: 0, key: 64 }),
    ];
    let mut sequencer = Sequencer::new(events.into_iter());

    let mut buffer = vec![0.0f32; 4410];
    sequencer.render(&mut engine, &mut buffer, 4410, false);
    assert_eq!(engine.active_voice_count(), 2);
    assert!(peak(&buffer) > 0.0);

    for _ in 0..3 {
        sequencer.render(&mut engine, &mut buffer, 4410, false);
    }
    assert!(sequencer.is_finished());
    assert_eq!(sequencer.dispatched(), 5);
    assert_eq!(engine.active_voice_count(), 0);
}

#[test]
fn raw_midi_bytes_drive_the_engine() {
    let mut engine = mono_engine(single_zone_catalog(dc_sample(0.5), 0.1));
    let messages = [[0xB0, 0x07, 0x7F], [0x90, 60, 100], [0xE0, 0x00, 0x60], [0x80, 60, 0]];
    for [status, data1, data2] in messages {
        if let Some(event) = Event::from_bytes(status, data1, data2) {
            engine.apply(&event);
        }
    }
    assert_eq!(engine.channel_pitch_wheel(0), 0x60 << 7);
    assert!(engine.voices().all(|v| v.is_releasing()));
}

#[test]
fn config_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings").join("engine.toml");

    let config = EngineConfig::default()
        .with_output(OutputMode::StereoUnweaved, 48000)
        .with_gain_db(-6.0)
        .with_max_voices(48)
        .with_interpolation(Interpolation::Cubic);
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let engine = Engine::with_config(Arc::new(Catalog::invalid()), &loaded);
    assert_eq!(engine.output_mode(), OutputMode::StereoUnweaved);
    assert_eq!(engine.sample_rate(), 48000);
    assert_eq!(engine.max_voices(), 48);
    assert_eq!(engine.interpolation(), Interpolation::Cubic);
}

#[test]
fn missing_config_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}
