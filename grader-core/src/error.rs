//! # Error Types
//!
//! Errors raised by the grading core. Only configuration problems are fatal;
//! the per-tick conditions are folded into "nothing detected" or a dropped
//! arrival by the callers that see them.

use thiserror::Error;

use crate::sequencer::InstanceId;

/// Rejected exercise configuration. Raised before the engine starts ticking.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("Note table is empty")]
    EmptyNoteTable,
    #[error("Note table must be strictly increasing: {previous} ({previous_hz} Hz) is followed by {name} ({hz} Hz)")]
    NotesNotIncreasing {
        previous: String,
        previous_hz: f32,
        name: String,
        hz: f32,
    },
    #[error("Note {0} has an invalid reference frequency")]
    InvalidNoteFrequency(String),
    #[error("Chord {0} has no required notes")]
    EmptyChord(String),
    #[error("Chord {chord} lists note {note} more than once")]
    DuplicateChordNote { chord: String, note: String },
    #[error("Target script is empty")]
    EmptyScript,
    #[error("Wait list has {waits} entries but the target script has {targets}")]
    WaitCountMismatch { targets: usize, waits: usize },
    #[error("Wait duration at position {0} is negative or not finite")]
    InvalidWait(usize),
    #[error("Every wait in the wait list is zero; the script could never advance in time")]
    AllWaitsZero,
    #[error("Duration {0} is negative or not finite")]
    InvalidDuration(String),
    #[error("Target {label} has an invalid band [{min}, {max}]")]
    InvalidBand { label: String, min: f64, max: f64 },
    #[error("Target {label} expects note {note}, which is not in the note table")]
    UnknownNote { label: String, note: String },
    #[error("Target {label} expects chord {chord}, which is not in the chord dictionary")]
    UnknownChord { label: String, chord: String },
    #[error("Classification tolerance must be positive, got {0} Hz")]
    InvalidTolerance(f32),
    #[error("Noise floor must be finite and non-negative, got {0}")]
    InvalidNoiseFloor(f32),
    #[error("Analysis window must hold at least {min} samples, got {got}")]
    WindowTooSmall { min: usize, got: usize },
    #[error("Failed to read configuration: {0}")]
    Io(String),
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// The audio ring has not yet accumulated a full analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Insufficient audio data: need {needed} samples, have {available}")]
pub struct InsufficientData {
    pub needed: usize,
    pub available: usize,
}

/// An arrival named a target instance the sequencer no longer tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Arrival for unknown target instance {0}")]
pub struct UnknownTargetReference(pub InstanceId);
