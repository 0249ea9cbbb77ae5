//! # Target Sequencer
//!
//! Walks a looping script of targets on a timed schedule, independently of
//! how the performer is doing.
//!
//! ## Scheduling
//! `advance` activates the target under the cursor, moves the cursor on
//! (wrapping to 0 after the last entry) and schedules the next advance after
//! `waits[cursor]`, where `cursor` is the position *after* the increment. So
//! the wait that follows activating `script[i]` is `waits[i + 1]`, and the
//! wait that follows the last entry is `waits[0]`. Existing exercise scripts
//! are timed against this pairing.
//!
//! ## Instances
//! Every activation creates a new [`TargetInstance`] with its own id. Several
//! can be live at once; each stays gradable until the motion collaborator
//! reports its arrival ([`TargetSequencer::resolve`]). An instance nobody has
//! resolved by the time the loop comes back round to its script position is
//! dropped, as is everything still live when the exercise ends.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, UnknownTargetReference};

/// What a target expects the performer to play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetKind {
    /// A single note, matched by name.
    Note { name: String },
    /// A chord, matched by name.
    Chord { name: String },
    /// An inclusive frequency band in Hz.
    Band { min: f64, max: f64 },
}

impl TargetKind {
    /// True when `freq` lies in a band target, both ends inclusive.
    /// Always false for identity targets.
    pub fn band_contains(&self, freq: f64) -> bool {
        match *self {
            TargetKind::Band { min, max } => min <= freq && freq <= max,
            _ => false,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Note { name } => write!(f, "Note: {}", name),
            TargetKind::Chord { name } => write!(f, "Chord: {}", name),
            TargetKind::Band { min, max } => {
                write!(f, "Frequency Range: {:.1} Hz - {:.1} Hz", min, max)
            }
        }
    }
}

/// One scripted entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Display name of the on-screen target.
    pub label: String,
    #[serde(flatten)]
    pub kind: TargetKind,
}

impl Target {
    pub fn note(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self { label: label.into(), kind: TargetKind::Note { name: name.into() } }
    }

    pub fn chord(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self { label: label.into(), kind: TargetKind::Chord { name: name.into() } }
    }

    pub fn band(label: impl Into<String>, min: f64, max: f64) -> Self {
        Self { label: label.into(), kind: TargetKind::Band { min, max } }
    }
}

/// Identifies one activation of a scripted target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live activation of a target, waiting for its arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetInstance {
    pub id: InstanceId,
    /// Position of the target in the script.
    pub script_index: usize,
    /// How many times the script had looped when this was activated.
    pub lap: u64,
    pub target: Target,
    pub activated_at: Duration,
}

impl TargetInstance {
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            id: self.id,
            label: self.target.label.clone(),
            expected: self.target.kind.clone(),
        }
    }
}

/// Display-only summary of what a live instance expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub id: InstanceId,
    pub label: String,
    pub expected: TargetKind,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cue moving to {} ({})", self.label, self.expected)
    }
}

/// Lifecycle of the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Nothing activated yet.
    Idle,
    /// Looping; `current` is the most recent activation.
    Active { current: InstanceId, since: Duration },
    /// The exercise has ended. Never reached by looping alone.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct TargetSequencer {
    script: Vec<Target>,
    waits: Vec<Duration>,
    lead_in: Duration,
    cursor: usize,
    lap: u64,
    next_id: u64,
    state: SequencerState,
    next_advance: Option<Duration>,
    active: BTreeMap<InstanceId, TargetInstance>,
}

impl TargetSequencer {
    /// Builds a sequencer over `script` with one wait per entry.
    ///
    /// The wait list must be exactly as long as the script; shorter lists
    /// are not padded and longer ones are not truncated. At least one wait
    /// must be non-zero so the loop takes time to go round.
    pub fn new(
        script: Vec<Target>,
        waits: Vec<Duration>,
        lead_in: Duration,
    ) -> Result<Self, ConfigurationError> {
        if script.is_empty() {
            return Err(ConfigurationError::EmptyScript);
        }
        if waits.len() != script.len() {
            return Err(ConfigurationError::WaitCountMismatch {
                targets: script.len(),
                waits: waits.len(),
            });
        }
        if waits.iter().all(Duration::is_zero) {
            return Err(ConfigurationError::AllWaitsZero);
        }
        for target in &script {
            if let TargetKind::Band { min, max } = target.kind {
                if !min.is_finite() || !max.is_finite() || min > max {
                    return Err(ConfigurationError::InvalidBand {
                        label: target.label.clone(),
                        min,
                        max,
                    });
                }
            }
        }

        Ok(Self {
            script,
            waits,
            lead_in,
            cursor: 0,
            lap: 0,
            next_id: 0,
            state: SequencerState::Idle,
            next_advance: None,
            active: BTreeMap::new(),
        })
    }

    pub fn script(&self) -> &[Target] {
        &self.script
    }

    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    /// Script position the next advance will activate.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Completed trips round the script.
    pub fn lap(&self) -> u64 {
        self.lap
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// When the next scheduled advance is due, if any.
    pub fn next_advance_at(&self) -> Option<Duration> {
        self.next_advance
    }

    /// Schedules the first advance after the lead-in. Only meaningful while idle.
    pub fn start(&mut self, now: Duration) {
        if self.state == SequencerState::Idle && self.next_advance.is_none() {
            self.next_advance = Some(now + self.lead_in);
            log::debug!("Sequencer starts at {:?} after a {:?} lead-in", now, self.lead_in);
        }
    }

    /// Fires every advance due at or before `now`.
    ///
    /// A host that stalls across several waits gets every missed activation,
    /// each stamped with the time it was due rather than `now`.
    pub fn tick(&mut self, now: Duration) -> Vec<TargetInstance> {
        let mut activated = Vec::new();
        while let Some(due) = self.next_advance {
            if due > now {
                break;
            }
            match self.advance(due) {
                Some(instance) => activated.push(instance),
                None => break,
            }
        }
        activated
    }

    /// Activates the target under the cursor and schedules the next advance.
    ///
    /// Returns `None` once the exercise has ended.
    pub fn advance(&mut self, now: Duration) -> Option<TargetInstance> {
        if self.state == SequencerState::Exhausted {
            return None;
        }

        let script_index = self.cursor;
        let lap = self.lap;
        self.drop_lapped(script_index, lap);

        let id = InstanceId(self.next_id);
        self.next_id += 1;
        let instance = TargetInstance {
            id,
            script_index,
            lap,
            target: self.script[script_index].clone(),
            activated_at: now,
        };
        self.active.insert(id, instance.clone());
        self.state = SequencerState::Active { current: id, since: now };

        self.cursor += 1;
        if self.cursor >= self.script.len() {
            self.cursor = 0;
            self.lap += 1;
        }
        // The wait is looked up with the post-increment cursor.
        let wait = self.waits[self.cursor];
        self.next_advance = Some(now + wait);

        log::debug!(
            "Activated {} ({}) at {:?}; next advance in {:?}",
            id,
            instance.target.label,
            now,
            wait
        );
        Some(instance)
    }

    /// Live instances, oldest activation first.
    pub fn current(&self) -> Vec<&TargetInstance> {
        self.active.values().collect()
    }

    /// The most recently activated instance that is still live.
    pub fn latest(&self) -> Option<&TargetInstance> {
        self.active.values().next_back()
    }

    pub fn get(&self, id: InstanceId) -> Option<&TargetInstance> {
        self.active.get(&id)
    }

    /// Display snapshots of every live instance.
    pub fn status(&self) -> Vec<StatusSnapshot> {
        self.active.values().map(TargetInstance::status).collect()
    }

    /// Removes an instance so it can be graded. Each instance resolves once.
    pub fn resolve(&mut self, id: InstanceId) -> Result<TargetInstance, UnknownTargetReference> {
        self.active.remove(&id).ok_or(UnknownTargetReference(id))
    }

    /// Ends the exercise, dropping every live instance. Returns how many were dropped.
    pub fn end(&mut self) -> usize {
        let dropped = self.active.len();
        self.active.clear();
        self.next_advance = None;
        self.state = SequencerState::Exhausted;
        log::debug!("Sequencer ended; dropped {} pending instance(s)", dropped);
        dropped
    }

    /// Drops instances from earlier laps at or before `script_index`: the
    /// loop has come all the way round past them.
    fn drop_lapped(&mut self, script_index: usize, lap: u64) {
        self.active.retain(|id, inst| {
            let lapped = inst.lap < lap && inst.script_index <= script_index;
            if lapped {
                log::debug!("Dropping {} ({}) without a verdict", id, inst.target.label);
            }
            !lapped
        });
    }
}
