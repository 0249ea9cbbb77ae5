//! # Note Classification Module
//!
//! Maps candidate frequencies onto a fixed, ordered note table.
//!
//! ## Classification policy
//! - The note with the smallest absolute Hz difference wins, provided the
//!   difference is within the tolerance; otherwise the frequency is
//!   unclassified.
//! - A strictly smaller difference is required to displace an earlier
//!   candidate, so on an exact tie the earlier table entry wins.
//! - Each frequency is classified on its own. Callers deduplicate the names
//!   before chord matching.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Default classification tolerance in Hz.
pub const DEFAULT_TOLERANCE_HZ: f32 = 5.0;

/// Pitch-class names starting from C.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Represents a single musical note with its name and frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Note name (e.g., "A", "C#")
    pub name: String,
    /// Reference frequency in Hz
    pub frequency: f32,
}

impl Note {
    pub fn new(name: impl Into<String>, frequency: f32) -> Self {
        Self { name: name.into(), frequency }
    }
}

/// The C4..B4 chromatic octave, equal temperament with A4 = 440 Hz.
///
/// Names carry no octave number, so "A" is 440 Hz.
static CHROMATIC_OCTAVE_4: Lazy<Vec<Note>> = Lazy::new(|| equal_tempered(4, 1));

/// Builds `octaves` equal-tempered octaves starting at C of `first_octave`.
///
/// The formula is f = 440 * 2^(n/12), with n counted in semitones from A4.
pub fn equal_tempered(first_octave: i32, octaves: usize) -> Vec<Note> {
    let mut notes = Vec::with_capacity(octaves * 12);
    for octave in 0..octaves as i32 {
        for (pc, name) in NOTE_NAMES.iter().enumerate() {
            let semitones_from_a4 = (first_octave + octave - 4) * 12 + pc as i32 - 9;
            let frequency = 440.0 * 2.0_f32.powf(semitones_from_a4 as f32 / 12.0);
            notes.push(Note::new(*name, frequency));
        }
    }
    notes
}

/// Validated, immutable note table ordered by strictly increasing frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTable {
    notes: Vec<Note>,
}

impl NoteTable {
    /// Validates and wraps a note list.
    pub fn new(notes: Vec<Note>) -> Result<Self, ConfigurationError> {
        if notes.is_empty() {
            return Err(ConfigurationError::EmptyNoteTable);
        }
        if let Some(bad) = notes.iter().find(|n| !n.frequency.is_finite() || n.frequency <= 0.0) {
            return Err(ConfigurationError::InvalidNoteFrequency(bad.name.clone()));
        }
        if let Some(pair) = notes.windows(2).find(|w| w[1].frequency <= w[0].frequency) {
            return Err(ConfigurationError::NotesNotIncreasing {
                previous: pair[0].name.clone(),
                previous_hz: pair[0].frequency,
                name: pair[1].name.clone(),
                hz: pair[1].frequency,
            });
        }
        Ok(Self { notes })
    }

    /// The standard 12-note chromatic table (C4..B4).
    pub fn chromatic() -> Self {
        Self { notes: CHROMATIC_OCTAVE_4.clone() }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.notes.iter().any(|n| n.name == name)
    }

    /// First entry with the given name.
    pub fn find(&self, name: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.name == name)
    }

    /// Smallest gap between adjacent reference frequencies, if there are two or more notes.
    pub fn min_gap(&self) -> Option<f32> {
        self.notes
            .windows(2)
            .map(|w| w[1].frequency - w[0].frequency)
            .reduce(f32::min)
    }

    /// True when `tolerance` can never reach two notes at once.
    pub fn is_unambiguous(&self, tolerance: f32) -> bool {
        self.min_gap().is_none_or(|gap| tolerance < gap / 2.0)
    }

    /// Finds the closest note within `tolerance` Hz of `freq`.
    ///
    /// Returns `None` ("unclassified") when nothing is close enough. On an
    /// exact tie the earlier table entry is kept.
    pub fn classify(&self, freq: f32, tolerance: f32) -> Option<&Note> {
        if !freq.is_finite() {
            return None;
        }
        let mut closest: Option<(&Note, f32)> = None;
        for note in &self.notes {
            let diff = (note.frequency - freq).abs();
            if diff <= tolerance && closest.is_none_or(|(_, best)| diff < best) {
                closest = Some((note, diff));
            }
        }
        closest.map(|(note, _)| note)
    }

    /// Classifies every frequency and returns the distinct names, first-seen order.
    pub fn classify_all(&self, freqs: impl IntoIterator<Item = f32>, tolerance: f32) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for freq in freqs {
            if let Some(note) = self.classify(freq, tolerance) {
                if !names.iter().any(|n| n == &note.name) {
                    names.push(note.name.clone());
                }
            }
        }
        names
    }
}

/// Calculates the deviation from a target frequency in cents.
///
/// 100 cents = 1 semitone; positive is sharp, negative is flat.
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}
