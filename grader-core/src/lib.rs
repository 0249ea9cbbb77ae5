// grader-core/src/lib.rs

//! The core logic for the chord grader.
//! This crate turns captured audio into pitch and chord judgments and grades
//! them against a looping, timed script of targets. It is completely
//! headless: it never renders, never sleeps and never reads a clock; the
//! host drives it with a tick and reports when cues arrive.

pub mod analysis;
pub mod audio;
pub mod chords;
pub mod config;
pub mod error;
pub mod exercise;
pub mod fft;
pub mod grading;
pub mod peaks;
pub mod ring;
pub mod schedule;
pub mod sequencer;
pub mod tuning;

pub use config::ExerciseConfig;
pub use error::{ConfigurationError, InsufficientData, UnknownTargetReference};
pub use exercise::Exercise;
pub use grading::{DetectedValue, Detection, Feedback, GradingEngine, GradingResult};
pub use sequencer::{InstanceId, StatusSnapshot, Target, TargetInstance, TargetKind, TargetSequencer};
