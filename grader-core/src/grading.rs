//! # Grading Engine
//!
//! Judges what was heard against one target instance at the moment the
//! motion collaborator reports its arrival.
//!
//! ## Policy
//! - **Band** targets match iff the dominant candidate frequency lies in
//!   `[min, max]`, both ends inclusive.
//! - **Note** targets match iff the dominant classified note has exactly the
//!   expected name.
//! - **Chord** targets match iff the chord dictionary picks exactly the
//!   expected chord name.
//! - Nothing detected (silence, insufficient data, every candidate
//!   unclassified) is a mismatch, never an error.
//!
//! Each arrival yields exactly one result. There is no retry or debounce
//! here; a host that wants several looks at the microphone takes them
//! before reporting the arrival.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::chords::{ChordDictionary, UNKNOWN_CHORD};
use crate::error::{ConfigurationError, UnknownTargetReference};
use crate::peaks::{self, Peak};
use crate::sequencer::{InstanceId, TargetInstance, TargetKind, TargetSequencer};
use crate::tuning::{self, Note, NoteTable};

/// Default time a verdict stays highlighted.
pub const DEFAULT_FEEDBACK_HOLD: Duration = Duration::from_secs(1);

/// Default number of undrained results kept before the oldest are discarded.
pub const DEFAULT_RESULT_CAPACITY: usize = 256;

/// Everything one analysis cycle heard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    /// Candidate frequencies, in bin order.
    pub peaks: Vec<Peak>,
    /// Distinct classified note names, first-seen order.
    pub notes: Vec<String>,
    /// Winning chord, if any chord in the dictionary was satisfied.
    pub chord: Option<String>,
    /// Note of the loudest candidate that classified.
    pub dominant_note: Option<(Note, f64)>,
}

impl Detection {
    /// A cycle in which nothing was heard.
    pub fn nothing() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Frequency of the loudest candidate.
    pub fn dominant_frequency(&self) -> Option<f64> {
        peaks::dominant(&self.peaks).map(|p| p.frequency)
    }
}

/// The value a target was judged on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectedValue {
    Nothing,
    Frequency { hz: f64 },
    Note { name: String, hz: f64 },
    Chord { name: String },
}

impl fmt::Display for DetectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectedValue::Nothing => write!(f, "nothing"),
            DetectedValue::Frequency { hz } => write!(f, "{:.1} Hz", hz),
            DetectedValue::Note { name, hz } => write!(f, "{} ({:.1} Hz)", name, hz),
            DetectedValue::Chord { name } => write!(f, "{}", name),
        }
    }
}

/// Verdict for one target instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingResult {
    pub instance: InstanceId,
    pub script_index: usize,
    pub label: String,
    pub expected: TargetKind,
    pub matched: bool,
    pub detected: DetectedValue,
    /// Distance from the expected note, for note targets heard as some note.
    pub cents_deviation: Option<f32>,
    pub timestamp: Duration,
}

impl fmt::Display for GradingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.matched { "Success!" } else { "Failed!" };
        write!(f, "{} {} heard {} (expected {})", verdict, self.label, self.detected, self.expected)
    }
}

/// A verdict and how long it stays on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub result: GradingResult,
    pub visible_until: Duration,
}

impl Feedback {
    pub fn is_visible(&self, now: Duration) -> bool {
        now < self.visible_until
    }
}

#[derive(Debug, Clone)]
pub struct GradingEngine {
    notes: NoteTable,
    chords: ChordDictionary,
    tolerance: f32,
    feedback_hold: Duration,
    result_capacity: usize,
    results: VecDeque<GradingResult>,
}

impl GradingEngine {
    /// Creates an engine over a note table and chord dictionary.
    ///
    /// A tolerance wide enough to reach two adjacent notes is accepted with a
    /// warning; classification then relies on the closest-wins tie policy.
    pub fn new(
        notes: NoteTable,
        chords: ChordDictionary,
        tolerance: f32,
    ) -> Result<Self, ConfigurationError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(ConfigurationError::InvalidTolerance(tolerance));
        }
        if !notes.is_unambiguous(tolerance) {
            log::warn!(
                "Tolerance {} Hz is not below half the smallest note gap ({:?} Hz); closest note wins",
                tolerance,
                notes.min_gap()
            );
        }
        Ok(Self {
            notes,
            chords,
            tolerance,
            feedback_hold: DEFAULT_FEEDBACK_HOLD,
            result_capacity: DEFAULT_RESULT_CAPACITY,
            results: VecDeque::new(),
        })
    }

    pub fn with_feedback_hold(mut self, hold: Duration) -> Self {
        self.feedback_hold = hold;
        self
    }

    /// Caps the undrained result queue; at least one result is always kept.
    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity.max(1);
        self
    }

    pub fn notes(&self) -> &NoteTable {
        &self.notes
    }

    pub fn chords(&self) -> &ChordDictionary {
        &self.chords
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Classifies a cycle's candidates and matches them against the chords.
    pub fn detect(&self, peaks: Vec<Peak>) -> Detection {
        let notes = self
            .notes
            .classify_all(peaks.iter().map(|p| p.frequency as f32), self.tolerance);
        let chord = self.chords.find(&notes).map(|c| c.name.clone());

        let mut dominant_note: Option<(Note, f64, f32)> = None;
        for peak in &peaks {
            if let Some(note) = self.notes.classify(peak.frequency as f32, self.tolerance) {
                if dominant_note.as_ref().is_none_or(|(_, _, mag)| peak.magnitude > *mag) {
                    dominant_note = Some((note.clone(), peak.frequency, peak.magnitude));
                }
            }
        }

        Detection {
            peaks,
            notes,
            chord,
            dominant_note: dominant_note.map(|(note, hz, _)| (note, hz)),
        }
    }

    /// Judges `detection` against `instance`. Pure; records nothing.
    pub fn grade(&self, detection: &Detection, instance: &TargetInstance, now: Duration) -> GradingResult {
        let expected = instance.target.kind.clone();
        let mut cents_deviation = None;

        let (matched, detected) = match &expected {
            TargetKind::Band { .. } => match detection.dominant_frequency() {
                Some(hz) => (expected.band_contains(hz), DetectedValue::Frequency { hz }),
                None => (false, DetectedValue::Nothing),
            },
            TargetKind::Note { name } => match &detection.dominant_note {
                Some((note, hz)) => {
                    cents_deviation = self
                        .notes
                        .find(name)
                        .map(|target| tuning::calculate_cents_deviation(*hz as f32, target.frequency));
                    (
                        &note.name == name,
                        DetectedValue::Note { name: note.name.clone(), hz: *hz },
                    )
                }
                None => match detection.dominant_frequency() {
                    Some(hz) => (false, DetectedValue::Frequency { hz }),
                    None => (false, DetectedValue::Nothing),
                },
            },
            TargetKind::Chord { name } => match &detection.chord {
                Some(chord) => (chord == name, DetectedValue::Chord { name: chord.clone() }),
                None if detection.is_empty() => (false, DetectedValue::Nothing),
                None => (false, DetectedValue::Chord { name: UNKNOWN_CHORD.to_string() }),
            },
        };

        GradingResult {
            instance: instance.id,
            script_index: instance.script_index,
            label: instance.target.label.clone(),
            expected,
            matched,
            detected,
            cents_deviation,
            timestamp: now,
        }
    }

    /// Handles an arrival: resolves the instance, grades it once and queues
    /// the result.
    ///
    /// The queue holds at most the configured capacity; a host that never
    /// drains it loses the oldest results first.
    ///
    /// An arrival for an instance the sequencer has already dropped (or
    /// already graded) produces no result.
    pub fn on_arrival(
        &mut self,
        sequencer: &mut TargetSequencer,
        id: InstanceId,
        detection: &Detection,
        now: Duration,
    ) -> Result<Feedback, UnknownTargetReference> {
        let instance = sequencer.resolve(id).inspect_err(|e| log::warn!("{}; ignoring", e))?;

        let result = self.grade(detection, &instance, now);
        log::debug!("{}", result);
        if self.results.len() >= self.result_capacity {
            if let Some(stale) = self.results.pop_front() {
                log::warn!("Result queue full; discarding undrained result for {}", stale.instance);
            }
        }
        self.results.push_back(result.clone());

        Ok(Feedback { result, visible_until: now + self.feedback_hold })
    }

    /// Takes every queued result, oldest first.
    pub fn drain_results(&mut self) -> Vec<GradingResult> {
        self.results.drain(..).collect()
    }

    pub fn pending_results(&self) -> usize {
        self.results.len()
    }
}
