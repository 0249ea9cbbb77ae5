//! # Chord Grader - Practice Host
//!
//! Runs a grading exercise against the default microphone.
//!
//! ## Architecture
//! - **Capture**: CPAL callback thread sends mono frames over a crossbeam channel
//! - **Main loop**: a crossbeam ticker drives the exercise; frames are drained
//!   into the sample ring as they arrive
//! - **Motion**: [`motion::CueMover`] fires arrivals a fixed travel time after
//!   each activation
//! - **Feedback**: verdicts are logged and tallied

mod motion;
mod report;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, select};
use grader_core::{Exercise, ExerciseConfig, audio};

use motion::{CueEvent, CueMover};
use report::Tally;

#[derive(Parser, Debug)]
#[command(name = "chord-grader", about = "Grade live guitar input against a looping target script")]
struct Args {
    /// Exercise configuration (JSON). Uses the built-in G-D-Em-C loop when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds a cue takes to reach its target after activation
    #[arg(long, default_value_t = 4.0)]
    travel_secs: f64,

    /// Host ticks per second
    #[arg(long, default_value_t = 60)]
    tick_hz: u32,

    /// End the exercise after this many seconds
    #[arg(long)]
    run_secs: Option<f64>,

    /// Print the configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ExerciseConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ExerciseConfig::default(),
    };

    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let mut exercise = config.build().context("invalid exercise configuration")?;
    let travel = Duration::try_from_secs_f64(args.travel_secs).context("invalid --travel-secs")?;
    let run_for = args
        .run_secs
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("invalid --run-secs")?;

    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Vec<f32>>(64);
    let (stream, sample_rate) = audio::start_audio_capture(frame_tx, exercise.analyzer().window_size())?;

    let tally = run(&mut exercise, &frame_rx, sample_rate, travel, args.tick_hz.max(1), run_for);

    log::info!(
        "Session over: {}/{} targets hit ({:.0}%)",
        tally.hits,
        tally.total(),
        tally.accuracy() * 100.0
    );

    if let Err(e) = stream.pause() {
        log::warn!("Error pausing stream: {}", e);
    }
    drop(stream);
    Ok(())
}

/// Drives the exercise until `run_for` elapses or the capture stream closes.
fn run(
    exercise: &mut Exercise,
    frames: &Receiver<Vec<f32>>,
    sample_rate: u32,
    travel: Duration,
    tick_hz: u32,
    run_for: Option<Duration>,
) -> Tally {
    let ticker = crossbeam_channel::tick(Duration::from_secs_f64(1.0 / tick_hz as f64));
    let mut mover = CueMover::new(travel);
    let mut tally = Tally::default();

    let started = Instant::now();
    exercise.start(Duration::ZERO);
    log::info!("Get ready...");

    loop {
        select! {
            recv(frames) -> msg => match msg {
                Ok(frame) => exercise.push_samples(&frame),
                Err(_) => {
                    log::error!("Audio channel closed");
                    break;
                }
            },
            recv(ticker) -> _ => {
                let now = started.elapsed();

                for instance in exercise.tick(now) {
                    log::info!("{}", instance.status());
                    mover.launch(&instance);
                }

                for event in mover.due(now) {
                    match event {
                        CueEvent::Arrived(id) => {
                            let detection = exercise.detect(sample_rate);
                            if let Some(feedback) = exercise.arrive(id, &detection, now) {
                                mover.highlight_until(id, feedback.visible_until);
                            }
                        }
                        CueEvent::HighlightExpired(id) => log::debug!("Highlight for {} cleared", id),
                    }
                }

                for result in exercise.drain_results() {
                    report::announce(&result);
                    tally.record(&result);
                }

                if run_for.is_some_and(|limit| now >= limit) {
                    let dropped = exercise.end();
                    log::info!("Time is up; {} cue(s) still in flight were not graded", dropped);
                    break;
                }
            },
        }
    }

    tally
}
