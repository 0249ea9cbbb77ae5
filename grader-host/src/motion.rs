//! Stand-in for the motion collaborator.
//!
//! Every activated target gets a cue that takes a fixed travel time to reach
//! it; the arrival, and later the end of the verdict highlight, are deferred
//! events on a [`Timeline`] drained once per tick.

use std::time::Duration;

use grader_core::schedule::Timeline;
use grader_core::{InstanceId, TargetInstance};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueEvent {
    /// The cue for this instance reached its target.
    Arrived(InstanceId),
    /// The verdict highlight for this instance should be cleared.
    HighlightExpired(InstanceId),
}

#[derive(Debug)]
pub struct CueMover {
    travel: Duration,
    timeline: Timeline<CueEvent>,
}

impl CueMover {
    pub fn new(travel: Duration) -> Self {
        Self { travel, timeline: Timeline::new() }
    }

    /// Launches a cue toward a freshly activated target.
    pub fn launch(&mut self, instance: &TargetInstance) {
        self.timeline.schedule(instance.activated_at + self.travel, CueEvent::Arrived(instance.id));
    }

    pub fn highlight_until(&mut self, id: InstanceId, until: Duration) {
        self.timeline.schedule(until, CueEvent::HighlightExpired(id));
    }

    pub fn due(&mut self, now: Duration) -> Vec<CueEvent> {
        self.timeline.drain_due(now).into_iter().map(|(_, e)| e).collect()
    }

    /// Cues and highlights still in flight.
    pub fn in_flight(&self) -> usize {
        self.timeline.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grader_core::Target;

    #[test]
    fn test_arrival_after_travel_time() {
        let mut mover = CueMover::new(Duration::from_secs(4));
        let instance = TargetInstance {
            id: InstanceId(3),
            script_index: 0,
            lap: 0,
            target: Target::chord("G", "G"),
            activated_at: Duration::from_secs(10),
        };
        mover.launch(&instance);
        assert!(mover.due(Duration::from_secs(13)).is_empty());
        assert_eq!(mover.due(Duration::from_secs(14)), vec![CueEvent::Arrived(InstanceId(3))]);
        assert_eq!(mover.in_flight(), 0);
    }
}
