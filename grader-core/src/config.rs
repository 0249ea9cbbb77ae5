//! # Exercise Configuration
//!
//! Everything the engine needs at startup: note table, chord dictionary,
//! target script and timings. Stored as JSON.
//!
//! Validation happens in [`ExerciseConfig::build`]; a configuration that
//! fails it never produces a running [`Exercise`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::{Analyzer, DEFAULT_WINDOW_SIZE};
use crate::chords::{Chord, ChordDictionary};
use crate::error::ConfigurationError;
use crate::exercise::Exercise;
use crate::grading::GradingEngine;
use crate::peaks::{PeakStrategy, DEFAULT_NOISE_FLOOR};
use crate::sequencer::{Target, TargetKind, TargetSequencer};
use crate::tuning::{Note, NoteTable, DEFAULT_TOLERANCE_HZ};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseConfig {
    /// Reference notes, strictly increasing in frequency.
    pub notes: Vec<Note>,
    /// Chords in precedence order; the first satisfied chord wins.
    pub chords: Vec<Chord>,
    /// Targets in the order they are activated.
    pub script: Vec<Target>,
    /// One wait per script entry, in seconds.
    pub waits_secs: Vec<f64>,
    pub tolerance_hz: f32,
    pub noise_floor: f32,
    pub strategy: PeakStrategy,
    pub window_size: usize,
    /// Countdown before the first target.
    pub lead_in_secs: f64,
    /// How long a verdict stays highlighted.
    pub feedback_secs: f64,
}

impl Default for ExerciseConfig {
    /// G, D, Em, C on a loop, four seconds each.
    fn default() -> Self {
        let dictionary = ChordDictionary::open_chords();
        Self {
            notes: NoteTable::chromatic().notes().to_vec(),
            chords: dictionary.chords().to_vec(),
            script: ["G", "D", "Em", "C"]
                .iter()
                .map(|name| Target::chord(*name, *name))
                .collect(),
            waits_secs: vec![4.0; 4],
            tolerance_hz: DEFAULT_TOLERANCE_HZ,
            noise_floor: DEFAULT_NOISE_FLOOR,
            strategy: PeakStrategy::Spectral,
            window_size: DEFAULT_WINDOW_SIZE,
            lead_in_secs: 4.0,
            feedback_secs: 1.0,
        }
    }
}

fn seconds(value: f64, what: impl FnOnce() -> ConfigurationError) -> Result<Duration, ConfigurationError> {
    Duration::try_from_secs_f64(value).map_err(|_| what())
}

impl ExerciseConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigurationError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// Validates the configuration and assembles a ready-to-start exercise.
    pub fn build(&self) -> Result<Exercise, ConfigurationError> {
        let notes = NoteTable::new(self.notes.clone())?;
        let chords = ChordDictionary::new(self.chords.clone())?;

        for chord in chords.chords() {
            if let Some(missing) = chord.notes.iter().find(|n| !notes.contains_name(n)) {
                log::warn!("Chord {} needs {}, which the note table never reports", chord.name, missing);
            }
        }

        for target in &self.script {
            match &target.kind {
                TargetKind::Note { name } if !notes.contains_name(name) => {
                    return Err(ConfigurationError::UnknownNote {
                        label: target.label.clone(),
                        note: name.clone(),
                    });
                }
                TargetKind::Chord { name } if !chords.contains_name(name) => {
                    return Err(ConfigurationError::UnknownChord {
                        label: target.label.clone(),
                        chord: name.clone(),
                    });
                }
                _ => {}
            }
        }

        let waits = self
            .waits_secs
            .iter()
            .enumerate()
            .map(|(i, &w)| seconds(w, || ConfigurationError::InvalidWait(i)))
            .collect::<Result<Vec<_>, _>>()?;
        let lead_in = seconds(self.lead_in_secs, || {
            ConfigurationError::InvalidDuration("lead_in_secs".to_string())
        })?;
        let feedback = seconds(self.feedback_secs, || {
            ConfigurationError::InvalidDuration("feedback_secs".to_string())
        })?;

        let sequencer = TargetSequencer::new(self.script.clone(), waits, lead_in)?;
        let engine = GradingEngine::new(notes, chords, self.tolerance_hz)?.with_feedback_hold(feedback);
        let analyzer = Analyzer::new(self.strategy, self.window_size, self.noise_floor)?;

        Ok(Exercise::new(sequencer, engine, analyzer))
    }
}
