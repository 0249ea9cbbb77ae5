//! # Chord Matching Module
//!
//! Chooses a chord name for a set of detected note names.
//!
//! A chord matches when all of its required notes are present in the
//! detected set; extra notes (overtones classified as other notes, open
//! strings ringing on) do not prevent a match. Several chords can therefore
//! match at once, and the dictionary's declaration order is the only
//! tie-break: the first matching entry wins. Callers that need a particular
//! chord to take precedence must list it earlier.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Name reported when no chord in the dictionary matches.
pub const UNKNOWN_CHORD: &str = "Unknown";

/// A named chord and the note names it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub name: String,
    pub notes: Vec<String>,
}

impl Chord {
    pub fn new(name: impl Into<String>, notes: &[&str]) -> Self {
        Self {
            name: name.into(),
            notes: notes.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// True when every required note appears in `detected`.
    pub fn is_satisfied_by(&self, detected: &[String]) -> bool {
        self.notes.iter().all(|n| detected.contains(n))
    }
}

/// Ordered chord list evaluated first-match-wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordDictionary {
    chords: Vec<Chord>,
}

impl ChordDictionary {
    /// Validates and wraps a chord list. Order is preserved as given.
    pub fn new(chords: Vec<Chord>) -> Result<Self, ConfigurationError> {
        for chord in &chords {
            if chord.notes.is_empty() {
                return Err(ConfigurationError::EmptyChord(chord.name.clone()));
            }
            for (i, note) in chord.notes.iter().enumerate() {
                if chord.notes[..i].contains(note) {
                    return Err(ConfigurationError::DuplicateChordNote {
                        chord: chord.name.clone(),
                        note: note.clone(),
                    });
                }
            }
        }
        Ok(Self { chords })
    }

    /// G, D, C, Em: the open chords of the default exercise.
    pub fn open_chords() -> Self {
        Self {
            chords: vec![
                Chord::new("G", &["G", "B", "D"]),
                Chord::new("D", &["D", "F#", "A"]),
                Chord::new("C", &["C", "E", "G"]),
                Chord::new("Em", &["E", "G", "B"]),
            ],
        }
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.chords.iter().any(|c| c.name == name)
    }

    /// First chord, in declaration order, whose notes are all in `detected`.
    pub fn find(&self, detected: &[String]) -> Option<&Chord> {
        self.chords.iter().find(|c| c.is_satisfied_by(detected))
    }

    /// Like [`find`](Self::find) but reports [`UNKNOWN_CHORD`] when nothing matches.
    pub fn name_for(&self, detected: &[String]) -> &str {
        self.find(detected).map_or(UNKNOWN_CHORD, |c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_subset_match_ignores_extra_notes() {
        let dict = ChordDictionary::open_chords();
        assert_eq!(dict.name_for(&names(&["A", "D", "F#", "C#"])), "D");
    }

    #[test]
    fn test_declaration_order_wins() {
        let detected = names(&["E", "G", "B", "D"]);

        let g_first = ChordDictionary::new(vec![
            Chord::new("G", &["G", "B", "D"]),
            Chord::new("Em", &["E", "G", "B"]),
        ])
        .unwrap();
        assert_eq!(g_first.name_for(&detected), "G");

        let em_first = ChordDictionary::new(vec![
            Chord::new("Em", &["E", "G", "B"]),
            Chord::new("G", &["G", "B", "D"]),
        ])
        .unwrap();
        assert_eq!(em_first.name_for(&detected), "Em");
    }

    #[test]
    fn test_later_entry_matches_when_earlier_is_incomplete() {
        let dict = ChordDictionary::new(vec![
            Chord::new("G", &["G", "B", "D"]),
            Chord::new("Em", &["E", "G", "B"]),
        ])
        .unwrap();
        // No D, so G cannot match.
        assert_eq!(dict.name_for(&names(&["E", "G", "B", "C"])), "Em");
    }

    #[test]
    fn test_unknown_when_nothing_matches() {
        let dict = ChordDictionary::open_chords();
        assert_eq!(dict.name_for(&names(&["G", "B"])), UNKNOWN_CHORD);
        assert_eq!(dict.name_for(&[]), UNKNOWN_CHORD);
        assert!(dict.find(&[]).is_none());
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            ChordDictionary::new(vec![Chord::new("X", &[])]),
            Err(ConfigurationError::EmptyChord("X".to_string()))
        );
        assert!(matches!(
            ChordDictionary::new(vec![Chord::new("X", &["A", "C", "A"])]),
            Err(ConfigurationError::DuplicateChordNote { .. })
        ));
        assert!(ChordDictionary::new(vec![]).is_ok());
    }
}
