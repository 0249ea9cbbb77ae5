//! Per-tick analysis: from captured audio to candidate peaks.

use crate::error::ConfigurationError;
use crate::fft::SpectrumAnalyzer;
use crate::peaks::{self, Peak, PeakStrategy, Spectrum};
use crate::ring::SampleRing;

/// Smallest usable analysis window.
pub const MIN_WINDOW_SIZE: usize = 4;

/// Default analysis window, in samples.
pub const DEFAULT_WINDOW_SIZE: usize = 2048;

#[derive(Debug)]
pub struct Analyzer {
    strategy: PeakStrategy,
    noise_floor: f32,
    spectrum: SpectrumAnalyzer,
}

impl Analyzer {
    pub fn new(
        strategy: PeakStrategy,
        window_size: usize,
        noise_floor: f32,
    ) -> Result<Self, ConfigurationError> {
        if window_size < MIN_WINDOW_SIZE {
            return Err(ConfigurationError::WindowTooSmall { min: MIN_WINDOW_SIZE, got: window_size });
        }
        if !noise_floor.is_finite() || noise_floor < 0.0 {
            return Err(ConfigurationError::InvalidNoiseFloor(noise_floor));
        }
        Ok(Self {
            strategy,
            noise_floor,
            spectrum: SpectrumAnalyzer::new(window_size),
        })
    }

    pub fn strategy(&self) -> PeakStrategy {
        self.strategy
    }

    pub fn window_size(&self) -> usize {
        self.spectrum.window_size()
    }

    pub fn noise_floor(&self) -> f32 {
        self.noise_floor
    }

    /// Peaks of a spectrum computed elsewhere. Always spectral.
    pub fn peaks_from_spectrum(&self, spectrum: &Spectrum) -> Vec<Peak> {
        peaks::spectral_peaks(spectrum, self.noise_floor)
    }

    /// Peaks of one raw window, using the configured strategy.
    pub fn peaks_from_samples(&self, samples: &[f32], sample_rate: u32) -> Vec<Peak> {
        match self.strategy {
            PeakStrategy::Spectral => {
                let spectrum = self.spectrum.spectrum(samples, sample_rate);
                peaks::spectral_peaks(&spectrum, self.noise_floor)
            }
            PeakStrategy::RawAmplitude => {
                peaks::raw_amplitude_peak(samples, sample_rate, self.noise_floor)
                    .into_iter()
                    .collect()
            }
        }
    }

    /// Peaks of the newest full window in the ring.
    ///
    /// Until the ring holds a whole window this reports no peaks.
    pub fn peaks_from_ring(&self, ring: &SampleRing, sample_rate: u32) -> Vec<Peak> {
        match ring.latest(self.window_size()) {
            Ok(window) => self.peaks_from_samples(&window, sample_rate),
            Err(e) => {
                log::trace!("{}", e);
                Vec::new()
            }
        }
    }
}
