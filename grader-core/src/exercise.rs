//! A configured exercise: sequencer, grading engine, analyzer and sample ring
//! behind one tick-driven surface for the host.
//!
//! Per host tick:
//! 1. [`Exercise::push_samples`] with whatever the capture device produced.
//! 2. [`Exercise::tick`] to fire due activations; hand them to the motion
//!    collaborator.
//! 3. For every cue that reached its target, [`Exercise::detect`] and then
//!    [`Exercise::arrive`].

use std::time::Duration;

use crate::analysis::Analyzer;
use crate::grading::{Detection, Feedback, GradingEngine, GradingResult};
use crate::peaks::Spectrum;
use crate::ring::SampleRing;
use crate::sequencer::{InstanceId, StatusSnapshot, TargetInstance, TargetSequencer};

/// Ring capacity in analysis windows.
const RING_WINDOWS: usize = 4;

#[derive(Debug)]
pub struct Exercise {
    sequencer: TargetSequencer,
    engine: GradingEngine,
    analyzer: Analyzer,
    ring: SampleRing,
}

impl Exercise {
    pub fn new(sequencer: TargetSequencer, engine: GradingEngine, analyzer: Analyzer) -> Self {
        let ring = SampleRing::with_capacity(analyzer.window_size() * RING_WINDOWS);
        Self { sequencer, engine, analyzer, ring }
    }

    pub fn sequencer(&self) -> &TargetSequencer {
        &self.sequencer
    }

    pub fn engine(&self) -> &GradingEngine {
        &self.engine
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn start(&mut self, now: Duration) {
        self.sequencer.start(now);
    }

    /// Fires due activations.
    pub fn tick(&mut self, now: Duration) -> Vec<TargetInstance> {
        self.sequencer.tick(now)
    }

    /// Writer side of the sample ring.
    pub fn push_samples(&mut self, samples: &[f32]) {
        self.ring.write(samples);
    }

    /// Analyzes the newest window of captured audio.
    pub fn detect(&self, sample_rate: u32) -> Detection {
        let peaks = self.analyzer.peaks_from_ring(&self.ring, sample_rate);
        self.engine.detect(peaks)
    }

    /// Analyzes a spectrum the host computed itself.
    pub fn detect_spectrum(&self, spectrum: &Spectrum) -> Detection {
        self.engine.detect(self.analyzer.peaks_from_spectrum(spectrum))
    }

    /// Grades an arrived cue. `None` if the instance is no longer live.
    ///
    /// The result is also queued for [`Exercise::drain_results`]; the queue is
    /// bounded, so a host that only reads the returned feedback loses nothing
    /// but old queue entries.
    pub fn arrive(&mut self, id: InstanceId, detection: &Detection, now: Duration) -> Option<Feedback> {
        self.engine.on_arrival(&mut self.sequencer, id, detection, now).ok()
    }

    /// Live target instances, oldest first.
    pub fn active_targets(&self) -> Vec<&TargetInstance> {
        self.sequencer.current()
    }

    pub fn status(&self) -> Vec<StatusSnapshot> {
        self.sequencer.status()
    }

    pub fn drain_results(&mut self) -> Vec<GradingResult> {
        self.engine.drain_results()
    }

    /// Ends the exercise; pending instances are dropped without a verdict.
    pub fn end(&mut self) -> usize {
        self.sequencer.end()
    }
}
