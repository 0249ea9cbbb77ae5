//! # Peak Extraction Module
//!
//! Turns one analysis cycle of audio into candidate frequencies.
//!
//! Two strategies are offered and they are never mixed:
//! - **Spectral**: every interior local maximum of a magnitude spectrum that
//!   clears the noise floor. Bin `i` maps to `i * sr / (2N)` Hz with no
//!   smoothing or sub-bin interpolation.
//! - **Raw amplitude**: the single sample of largest absolute amplitude in a
//!   raw window, reported as `index * (sr / 2) / (window / 2)`. Coarse, and
//!   it reacts to amplitude rather than frequency content.
//!
//! An empty result is a normal outcome (silence or noise-floor audio).

use serde::{Deserialize, Serialize};

/// Default noise floor in normalized magnitude units.
pub const DEFAULT_NOISE_FLOOR: f32 = 0.01;

/// A magnitude spectrum for a single analysis cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// One magnitude per frequency bin, from 0 Hz up to Nyquist.
    pub magnitudes: Vec<f32>,
    /// Sample rate the spectrum was computed at, in Hz.
    pub sample_rate: u32,
}

impl Spectrum {
    pub fn new(magnitudes: Vec<f32>, sample_rate: u32) -> Self {
        Self { magnitudes, sample_rate }
    }

    /// Number of bins (`N`).
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Centre frequency of bin `i`: `i * sr / (2N)`.
    ///
    /// Kept in `f64` so band edges compare exactly.
    pub fn bin_frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.sample_rate as f64 / (2 * self.magnitudes.len()) as f64
    }
}

/// A candidate frequency and the magnitude it was found at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub frequency: f64,
    pub magnitude: f32,
}

/// How a cycle's candidate frequencies are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakStrategy {
    /// Local maxima of an FFT magnitude spectrum.
    #[default]
    Spectral,
    /// Single loudest sample of the raw window.
    RawAmplitude,
}

/// Finds every interior local maximum above `noise_floor`, in bin order.
///
/// A bin is a peak iff it is strictly greater than both neighbours and
/// strictly greater than the floor. The first and last bins are never peaks.
pub fn spectral_peaks(spectrum: &Spectrum, noise_floor: f32) -> Vec<Peak> {
    let mags = &spectrum.magnitudes;
    if mags.len() < 3 {
        return Vec::new();
    }

    mags.windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2] && w[1] > noise_floor)
        .map(|(i, w)| Peak {
            frequency: spectrum.bin_frequency(i + 1),
            magnitude: w[1],
        })
        .collect()
}

/// Reports the loudest sample of a raw window as a single frequency estimate.
///
/// Returns `None` for an empty window or when no sample rises above
/// `noise_floor`. Ties keep the earliest index.
pub fn raw_amplitude_peak(samples: &[f32], sample_rate: u32, noise_floor: f32) -> Option<Peak> {
    let window = samples.len();
    if window < 2 {
        return None;
    }

    let mut best: Option<(usize, f32)> = None;
    for (i, s) in samples.iter().enumerate() {
        let amplitude = s.abs();
        if amplitude > noise_floor && best.is_none_or(|(_, a)| amplitude > a) {
            best = Some((i, amplitude));
        }
    }

    best.map(|(index, amplitude)| Peak {
        frequency: index as f64 * (sample_rate as f64 / 2.0) / (window as f64 / 2.0),
        magnitude: amplitude,
    })
}

/// The largest-magnitude peak; the earliest one wins a tie.
pub fn dominant(peaks: &[Peak]) -> Option<&Peak> {
    peaks.iter().fold(None, |best: Option<&Peak>, p| match best {
        Some(b) if b.magnitude >= p.magnitude => Some(b),
        _ => Some(p),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 Hz per bin: N = 4096 bins at 8192 Hz.
    fn one_hz_spectrum(peaks: &[(usize, f32)]) -> Spectrum {
        let mut mags = vec![0.0; 4096];
        for &(bin, mag) in peaks {
            mags[bin] = mag;
        }
        Spectrum::new(mags, 8192)
    }

    #[test]
    fn test_bin_to_frequency() {
        let spectrum = Spectrum::new(vec![0.0; 1024], 44100);
        assert!((spectrum.bin_frequency(10) - 215.332).abs() < 0.01);
        assert_eq!(spectrum.bin_frequency(0), 0.0);
    }

    #[test]
    fn test_single_peak_found() {
        let spectrum = one_hz_spectrum(&[(440, 0.5)]);
        let peaks = spectral_peaks(&spectrum, DEFAULT_NOISE_FLOOR);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].frequency, 440.0);
        assert_eq!(peaks[0].magnitude, 0.5);
    }

    #[test]
    fn test_peaks_below_floor_ignored() {
        let spectrum = one_hz_spectrum(&[(200, 0.005), (300, 0.01), (400, 0.02)]);
        let peaks = spectral_peaks(&spectrum, DEFAULT_NOISE_FLOOR);
        // 0.01 is not strictly above the floor.
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].frequency, 400.0);
    }

    #[test]
    fn test_plateau_is_not_a_peak() {
        let spectrum = one_hz_spectrum(&[(100, 0.3), (101, 0.3)]);
        assert!(spectral_peaks(&spectrum, DEFAULT_NOISE_FLOOR).is_empty());
    }

    #[test]
    fn test_edge_bins_never_peak() {
        let spectrum = Spectrum::new(vec![0.9, 0.1, 0.2, 0.1, 0.9], 8000);
        let peaks = spectral_peaks(&spectrum, DEFAULT_NOISE_FLOOR);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].frequency, spectrum.bin_frequency(2));
    }

    #[test]
    fn test_silence_and_tiny_spectra_are_empty() {
        assert!(spectral_peaks(&one_hz_spectrum(&[]), DEFAULT_NOISE_FLOOR).is_empty());
        assert!(spectral_peaks(&Spectrum::new(vec![0.0, 1.0], 8000), 0.0).is_empty());
    }

    #[test]
    fn test_peaks_come_out_in_bin_order() {
        let spectrum = one_hz_spectrum(&[(494, 0.2), (392, 0.6), (294, 0.4)]);
        let freqs: Vec<f64> = spectral_peaks(&spectrum, DEFAULT_NOISE_FLOOR)
            .iter()
            .map(|p| p.frequency)
            .collect();
        assert_eq!(freqs, vec![294.0, 392.0, 494.0]);
    }

    #[test]
    fn test_raw_amplitude_peak() {
        let mut samples = vec![0.0; 1024];
        samples[10] = -0.8;
        samples[20] = 0.5;
        let peak = raw_amplitude_peak(&samples, 44100, DEFAULT_NOISE_FLOOR).unwrap();
        // 10 * 22050 / 512
        assert!((peak.frequency - 430.664).abs() < 0.01);
        assert_eq!(peak.magnitude, 0.8);
    }

    #[test]
    fn test_raw_amplitude_silence() {
        assert!(raw_amplitude_peak(&[0.0; 1024], 44100, DEFAULT_NOISE_FLOOR).is_none());
        assert!(raw_amplitude_peak(&[], 44100, DEFAULT_NOISE_FLOOR).is_none());
    }

    #[test]
    fn test_dominant_prefers_first_on_tie() {
        let peaks = [
            Peak { frequency: 100.0, magnitude: 0.5 },
            Peak { frequency: 200.0, magnitude: 0.7 },
            Peak { frequency: 300.0, magnitude: 0.7 },
        ];
        assert_eq!(dominant(&peaks).unwrap().frequency, 200.0);
        assert!(dominant(&[]).is_none());
    }
}
