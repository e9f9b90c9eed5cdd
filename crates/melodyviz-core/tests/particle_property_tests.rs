use melodyviz_core::{
    color_for_note, note_to_frequency, ColorMode, ParticleEngine, KEEP_PARTICLES, MAX_PARTICLES,
};
use proptest::prelude::*;

const BASE: u32 = 50;

fn engine(seed: u64) -> ParticleEngine {
    ParticleEngine::with_seed(BASE, ColorMode::Rainbow, seed)
}

proptest! {
    #[test]
    fn frequency_strictly_increases(n in 0u8..127) {
        prop_assert!(note_to_frequency(n) < note_to_frequency(n + 1));
    }

    #[test]
    fn burst_count_and_size_follow_velocity(
        v in 1u8..=127,
        note in 0u8..=127,
        seed in any::<u64>(),
    ) {
        let mut engine = engine(seed);
        let spawned = engine.spawn_burst(note, v, 1.0);

        let expected = (50 * u32::from(v) / 127) as usize;
        prop_assert_eq!(spawned, expected);
        prop_assert_eq!(engine.len(), expected);

        let size = 1.2 + (f32::from(v) / 127.0) * 2.5;
        for p in engine.particles() {
            prop_assert!((p.size - size).abs() < 1e-5);
            prop_assert_eq!(p.life, 1.0);
        }
    }

    #[test]
    fn cap_holds_after_every_spawn(
        bursts in prop::collection::vec((0u8..=127, 1u8..=127, 0.5f32..5.0), 1..60),
    ) {
        let mut engine = ParticleEngine::with_seed(500, ColorMode::Fire, 1);
        for (note, velocity, intensity) in bursts {
            let before = engine.len();
            let spawned = engine.spawn_burst(note, velocity, intensity);
            prop_assert!(engine.len() <= MAX_PARTICLES);
            if before + spawned > MAX_PARTICLES {
                prop_assert_eq!(engine.len(), KEEP_PARTICLES);
            } else {
                prop_assert_eq!(engine.len(), before + spawned);
            }
        }
    }

    #[test]
    fn same_pitch_class_same_color(pc in 0u8..12, octave in 0u8..10) {
        let note = pc + 12 * octave;
        prop_assume!(note <= 127);
        for mode in ColorMode::ALL {
            prop_assert_eq!(color_for_note(note, mode), color_for_note(pc, mode));
        }
    }
}

#[test]
fn a4_is_440() {
    assert_eq!(note_to_frequency(69), 440.0);
}

#[test]
fn rainbow_octaves_match() {
    assert_eq!(
        color_for_note(0, ColorMode::Rainbow),
        color_for_note(12, ColorMode::Rainbow)
    );
}

#[test]
fn advancing_empty_engine_is_a_no_op() {
    let mut engine = engine(0);
    engine.advance();
    assert!(engine.is_empty());
    assert!(engine.render_buffers().is_empty());
}

#[test]
fn finite_burst_eventually_empties() {
    let mut engine = engine(42);
    engine.spawn_burst(60, 127, 1.0);
    assert_eq!(engine.len(), 50);

    // Slowest decay is 0.003 per frame, so 334 frames suffice
    let mut frames = 0;
    while !engine.is_empty() {
        engine.advance();
        frames += 1;
        assert!(frames <= 400, "particles outlived their slowest decay");
    }
    assert!(frames >= 125, "fastest decay is 0.008 per frame");
    assert!(engine.render_buffers().is_empty());
}

#[test]
fn truncation_keeps_exactly_the_newest() {
    let mut engine = ParticleEngine::with_seed(500, ColorMode::Neon, 9);
    let mut total = 0;
    while total + 250 <= MAX_PARTICLES {
        total += engine.spawn_burst(10, 127, 0.5);
    }
    assert_eq!(engine.len(), MAX_PARTICLES);

    engine.spawn_burst(90, 127, 0.5);
    assert_eq!(engine.len(), KEEP_PARTICLES);
}
