//! Integration tests: full exercises driven with synthetic audio.

use std::io::Write;
use std::time::Duration;

use grader_core::peaks::{PeakStrategy, Spectrum};
use grader_core::sequencer::SequencerState;
use grader_core::{DetectedValue, Exercise, ExerciseConfig, Target};

/// 10 Hz per bin with a 2048-sample window.
const SAMPLE_RATE: u32 = 20480;
const WINDOW: usize = 2048;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Sum of equal-amplitude sines.
fn tone(freqs: &[f32], amplitude: f32) -> Vec<f32> {
    (0..WINDOW)
        .map(|i| {
            freqs
                .iter()
                .map(|f| amplitude * (2.0 * std::f32::consts::PI * f * i as f32 / SAMPLE_RATE as f32).sin())
                .sum()
        })
        .collect()
}

/// A (note), 400-450 Hz (band), G (chord); waits 1, 2, 3 s; half a second lead-in.
fn config() -> ExerciseConfig {
    ExerciseConfig {
        script: vec![
            Target::note("Target1", "A"),
            Target::band("Target2", 400.0, 450.0),
            Target::chord("Target3", "G"),
        ],
        waits_secs: vec![1.0, 2.0, 3.0],
        lead_in_secs: 0.5,
        window_size: WINDOW,
        ..Default::default()
    }
}

/// Starts the exercise and returns it with its three lap-0 instance ids.
fn started() -> (Exercise, Vec<grader_core::InstanceId>) {
    let mut exercise = config().build().expect("config should be valid");
    exercise.start(Duration::ZERO);
    // 0.5 s: Target1, +waits[1] -> 2.5 s: Target2, +waits[2] -> 5.5 s: Target3
    let ids: Vec<_> = exercise.tick(ms(5500)).iter().map(|i| i.id).collect();
    assert_eq!(ids.len(), 3);
    (exercise, ids)
}

#[test]
fn test_activation_times_follow_post_increment_waits() {
    let mut exercise = config().build().unwrap();
    exercise.start(Duration::ZERO);
    let times: Vec<Duration> = exercise.tick(ms(7000)).iter().map(|i| i.activated_at).collect();
    // Target3 at 5.5 s is followed by waits[0] = 1 s before Target1 again.
    assert_eq!(times, vec![ms(500), ms(2500), ms(5500), ms(6500)]);
}

#[test]
fn test_note_target_graded_from_sine() {
    let (mut exercise, ids) = started();
    exercise.push_samples(&tone(&[440.0], 0.5));

    let detection = exercise.detect(SAMPLE_RATE);
    assert_eq!(detection.notes, vec!["A"]);

    let feedback = exercise.arrive(ids[0], &detection, ms(6000)).expect("instance is live");
    assert!(feedback.result.matched);
    assert!(feedback.result.cents_deviation.unwrap().abs() < 1.0);
    assert_eq!(feedback.visible_until, ms(7000));
}

#[test]
fn test_band_target_graded_from_sine() {
    let (mut exercise, ids) = started();
    exercise.push_samples(&tone(&[880.0], 0.5));
    let detection = exercise.detect(SAMPLE_RATE);

    let feedback = exercise.arrive(ids[1], &detection, ms(6000)).unwrap();
    assert!(!feedback.result.matched);
    assert_eq!(feedback.result.detected, DetectedValue::Frequency { hz: 880.0 });
}

#[test]
fn test_chord_target_graded_from_strummed_sines() {
    let (mut exercise, ids) = started();
    // Bin-aligned stand-ins for D4, G4 and B4, each within 5 Hz.
    exercise.push_samples(&tone(&[290.0, 390.0, 490.0], 0.2));
    let detection = exercise.detect(SAMPLE_RATE);
    assert_eq!(detection.notes, vec!["D", "G", "B"]);
    assert_eq!(detection.chord.as_deref(), Some("G"));

    let feedback = exercise.arrive(ids[2], &detection, ms(6000)).unwrap();
    assert!(feedback.result.matched);
    assert_eq!(feedback.result.detected, DetectedValue::Chord { name: "G".to_string() });
}

#[test]
fn test_silence_and_missing_audio_grade_as_failure() {
    let (mut exercise, ids) = started();

    // Nothing captured yet: not enough data for a window.
    let detection = exercise.detect(SAMPLE_RATE);
    assert!(detection.is_empty());
    let feedback = exercise.arrive(ids[0], &detection, ms(6000)).unwrap();
    assert!(!feedback.result.matched);
    assert_eq!(feedback.result.detected, DetectedValue::Nothing);

    exercise.push_samples(&vec![0.0; WINDOW]);
    let detection = exercise.detect(SAMPLE_RATE);
    for id in &ids[1..] {
        let result = exercise.arrive(*id, &detection, ms(6000)).unwrap().result;
        assert!(!result.matched);
        assert_eq!(result.detected, DetectedValue::Nothing);
    }
    assert_eq!(exercise.drain_results().len(), 3);
}

#[test]
fn test_each_instance_graded_exactly_once() {
    let (mut exercise, ids) = started();
    let detection = exercise.detect(SAMPLE_RATE);
    assert!(exercise.arrive(ids[1], &detection, ms(6000)).is_some());
    assert!(exercise.arrive(ids[1], &detection, ms(6001)).is_none());
    assert_eq!(exercise.drain_results().len(), 1);
    assert_eq!(exercise.active_targets().len(), 2);
}

#[test]
fn test_lapped_instance_cannot_be_graded() {
    let (mut exercise, ids) = started();
    // 6.5 s re-activates Target1 on lap 1, dropping the lap-0 instance.
    let relaunched = exercise.tick(ms(6500));
    assert_eq!(relaunched.len(), 1);
    assert_eq!(relaunched[0].script_index, 0);

    let detection = exercise.detect(SAMPLE_RATE);
    assert!(exercise.arrive(ids[0], &detection, ms(6600)).is_none());
    assert!(exercise.arrive(relaunched[0].id, &detection, ms(6600)).is_some());
    assert_eq!(exercise.drain_results().len(), 1);
}

#[test]
fn test_end_drops_pending_targets() {
    let (mut exercise, ids) = started();
    assert_eq!(exercise.status().len(), 3);
    assert_eq!(exercise.end(), 3);
    assert_eq!(exercise.sequencer().state(), SequencerState::Exhausted);
    let detection = exercise.detect(SAMPLE_RATE);
    assert!(exercise.arrive(ids[0], &detection, ms(6000)).is_none());
    assert!(exercise.drain_results().is_empty());
}

#[test]
fn test_long_run_repeats_script_order() {
    let mut exercise = config().build().unwrap();
    exercise.start(Duration::ZERO);
    let mut order = Vec::new();
    let mut now = Duration::ZERO;
    while now < Duration::from_secs(60) {
        now += ms(100);
        order.extend(exercise.tick(now).into_iter().map(|i| i.script_index));
    }
    assert!(order.len() > 3);
    for (n, index) in order.iter().enumerate() {
        assert_eq!(*index, n % 3);
    }
    assert!(exercise.active_targets().len() <= 3);
}

#[test]
fn test_raw_amplitude_strategy_end_to_end() {
    let config = ExerciseConfig {
        strategy: PeakStrategy::RawAmplitude,
        ..config()
    };
    let mut exercise = config.build().unwrap();
    exercise.start(Duration::ZERO);
    let ids: Vec<_> = exercise.tick(ms(5500)).iter().map(|i| i.id).collect();

    // Loudest sample at index 42 -> 42 * 10240 / 1024 = 420 Hz.
    let mut window = vec![0.0; WINDOW];
    window[42] = 0.9;
    window[7] = -0.3;
    exercise.push_samples(&window);
    let detection = exercise.detect(SAMPLE_RATE);
    assert_eq!(detection.peaks.len(), 1);

    let result = exercise.arrive(ids[1], &detection, ms(6000)).unwrap().result;
    assert!(result.matched);
    assert_eq!(result.detected, DetectedValue::Frequency { hz: 420.0 });
}

#[test]
fn test_precomputed_spectrum_path() {
    let (mut exercise, ids) = started();
    // 4096 bins at 8192 Hz: 1 Hz per bin.
    let mut magnitudes = vec![0.0; 4096];
    magnitudes[440] = 0.4;
    let detection = exercise.detect_spectrum(&Spectrum::new(magnitudes, 8192));
    assert_eq!(detection.notes, vec!["A"]);
    assert!(exercise.arrive(ids[0], &detection, ms(6000)).unwrap().result.matched);
}

#[test]
fn test_config_loaded_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = config().to_json_pretty().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let loaded = ExerciseConfig::from_path(file.path()).unwrap();
    assert_eq!(loaded, config());
    assert_eq!(loaded.build().unwrap().sequencer().script().len(), 3);
}
