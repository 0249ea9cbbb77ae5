//! Console feedback for verdicts.

use grader_core::GradingResult;

/// Running score for the session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub hits: usize,
    pub misses: usize,
}

impl Tally {
    pub fn record(&mut self, result: &GradingResult) {
        if result.matched {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.hits + self.misses
    }

    /// Share of graded targets that matched, 0.0 when nothing was graded.
    pub fn accuracy(&self) -> f32 {
        if self.total() == 0 {
            0.0
        } else {
            self.hits as f32 / self.total() as f32
        }
    }
}

pub fn announce(result: &GradingResult) {
    match result.cents_deviation {
        Some(cents) => log::info!("{} [{:+.1} cents]", result, cents),
        None => log::info!("{}", result),
    }
}
