//! # Fast Fourier Transform (FFT) Module
//!
//! Builds the magnitude [`Spectrum`] the peak extractor works on when the
//! host hands us raw samples instead of a precomputed spectrum.
//!
//! ## Steps
//! - DC offset removal
//! - Hann windowing to reduce spectral leakage
//! - Forward FFT with RustFFT
//! - Magnitudes of the first half, scaled so a full-scale sine peaks near
//!   its amplitude (which is what the default 0.01 noise floor assumes)

use rustfft::{num_complex::Complex, FftPlanner};

use crate::peaks::Spectrum;

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Applies a periodic Hann window in place and returns the window's sum.
fn apply_hann_window(buffer: &mut [f32]) -> f32 {
    let n = buffer.len();
    if n == 0 { return 0.0; }
    let mut sum = 0.0;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos());
        *sample *= multiplier;
        sum += multiplier;
    }
    sum
}

/// Reusable FFT front end for one window size.
pub struct SpectrumAnalyzer {
    window_size: usize,
    fft: std::sync::Arc<dyn rustfft::Fft<f32>>,
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("window_size", &self.window_size)
            .finish()
    }
}

impl SpectrumAnalyzer {
    pub fn new(window_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);
        Self { window_size, fft }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Computes the magnitude spectrum of the first `window_size` samples.
    ///
    /// Shorter input is zero-padded. The result has `window_size / 2` bins.
    pub fn spectrum(&self, signal: &[f32], sample_rate: u32) -> Spectrum {
        let mut processed: Vec<f32> = signal.iter().take(self.window_size).copied().collect();
        processed.resize(self.window_size, 0.0);
        remove_dc_offset(&mut processed);
        let window_sum = apply_hann_window(&mut processed);

        let mut buffer: Vec<Complex<f32>> = processed
            .into_iter()
            .map(|sample| Complex { re: sample, im: 0.0 })
            .collect();
        self.fft.process(&mut buffer);

        let scale = if window_sum > 0.0 { 2.0 / window_sum } else { 0.0 };
        let magnitudes = buffer
            .iter()
            .take(self.window_size / 2)
            .map(|c| c.norm() * scale) // .norm() is sqrt(re^2 + im^2)
            .collect();
        Spectrum::new(magnitudes, sample_rate)
    }
}
