//! Continuous sample ring between the capture device and the analyzer.
//!
//! One writer appends captured frames; one reader copies out the most
//! recent window. The writer may lap the reader (old samples are simply
//! overwritten) and the reader never sees samples that were not written.
//! Both sides are driven from the host tick, so no locking is involved.

use crate::error::InsufficientData;

#[derive(Debug, Clone)]
pub struct SampleRing {
    buffer: Vec<f32>,
    /// Total samples ever written; the write head is `written % capacity`.
    written: u64,
}

impl SampleRing {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buffer: vec![0.0; capacity.max(1)], written: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Samples currently readable (never more than the capacity).
    pub fn available(&self) -> usize {
        self.written.min(self.buffer.len() as u64) as usize
    }

    pub fn total_written(&self) -> u64 {
        self.written
    }

    /// Appends samples, overwriting the oldest once full.
    pub fn write(&mut self, samples: &[f32]) {
        let cap = self.buffer.len();
        // Only the last `cap` samples of an oversized write survive.
        let skip = samples.len().saturating_sub(cap);
        let mut head = ((self.written + skip as u64) % cap as u64) as usize;
        for &s in &samples[skip..] {
            self.buffer[head] = s;
            head = (head + 1) % cap;
        }
        self.written += samples.len() as u64;
    }

    /// Copies out the most recent `len` samples, oldest first.
    pub fn latest(&self, len: usize) -> Result<Vec<f32>, InsufficientData> {
        let available = self.available();
        if len > available || len == 0 {
            return Err(InsufficientData { needed: len, available });
        }

        let cap = self.buffer.len();
        let end = (self.written % cap as u64) as usize;
        let start = (end + cap - len) % cap;
        let mut window = Vec::with_capacity(len);
        if start < end {
            window.extend_from_slice(&self.buffer[start..end]);
        } else {
            window.extend_from_slice(&self.buffer[start..]);
            window.extend_from_slice(&self.buffer[..end]);
        }
        Ok(window)
    }

    pub fn clear(&mut self) {
        self.written = 0;
    }
}
