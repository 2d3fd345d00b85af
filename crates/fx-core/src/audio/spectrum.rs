//! Frequency analysis of raw PCM that reproduces the browser `AnalyserNode`'s
//! byte spectrum (as floats in [0, 1]), so native hosts feed the reactive
//! mapping the same values a browser would.

use crate::constants::{
    DEFAULT_FFT_SIZE, DEFAULT_MAX_DECIBELS, DEFAULT_MIN_DECIBELS, DEFAULT_SMOOTHING, MAX_FFT_SIZE,
    MIN_FFT_SIZE,
};
use crate::error::ConfigError;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalyserConfig {
    pub fft_size: usize,
    /// Weight of the previous frame in the running average, in [0, 1).
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            smoothing: DEFAULT_SMOOTHING,
            min_decibels: DEFAULT_MIN_DECIBELS,
            max_decibels: DEFAULT_MAX_DECIBELS,
        }
    }
}

impl AnalyserConfig {
    pub fn with_fft_size(fft_size: usize) -> Self {
        Self {
            fft_size,
            ..Self::default()
        }
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(ConfigError::InvalidAnalyser(format!(
                "fft size {} must be a power of two in {MIN_FFT_SIZE}..={MAX_FFT_SIZE}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(ConfigError::InvalidAnalyser(format!(
                "smoothing {} outside [0, 1)",
                self.smoothing
            )));
        }
        if self.min_decibels.is_nan()
            || self.max_decibels.is_nan()
            || self.min_decibels >= self.max_decibels
        {
            return Err(ConfigError::InvalidAnalyser(format!(
                "min decibels {} must be below max decibels {}",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Blackman window coefficient for sample `i` of `n`.
pub fn blackman(i: usize, n: usize) -> f32 {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    let x = i as f32 / n as f32;
    A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
}

pub struct SpectrumAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    /// Last `fft_size` samples, oldest first once `filled`.
    history: Vec<f32>,
    write: usize,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyser {
    pub fn new(config: AnalyserConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let n = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        Ok(Self {
            config,
            fft,
            window: (0..n).map(|i| blackman(i, n)).collect(),
            buffer: vec![Complex::new(0.0, 0.0); n],
            history: vec![0.0; n],
            write: 0,
            smoothed: vec![0.0; n / 2],
        })
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    /// Append mono samples; only the most recent `fft_size` are kept.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let n = self.history.len();
        let samples = if samples.len() > n {
            &samples[samples.len() - n..]
        } else {
            samples
        };
        for &s in samples {
            self.history[self.write] = s;
            self.write = (self.write + 1) % n;
        }
    }

    /// Run one analysis step and write normalized energies into `out`
    /// (length [`bin_count`](Self::bin_count); extra entries are left alone).
    pub fn analyse(&mut self, out: &mut [f32]) {
        let n = self.config.fft_size;
        for i in 0..n {
            let sample = self.history[(self.write + i) % n];
            self.buffer[i] = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let tau = self.config.smoothing;
        let span = self.config.max_decibels - self.config.min_decibels;
        let scale = 1.0 / n as f32;
        for (k, slot) in out.iter_mut().take(n / 2).enumerate() {
            let magnitude = self.buffer[k].norm() * scale;
            let s = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            self.smoothed[k] = if s.is_finite() { s } else { 0.0 };
            let db = if self.smoothed[k] > 0.0 {
                20.0 * self.smoothed[k].log10()
            } else {
                f32::NEG_INFINITY
            };
            *slot = ((db - self.config.min_decibels) / span).clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation() {
        assert!(AnalyserConfig::default().validate().is_ok());
        assert!(AnalyserConfig::with_fft_size(300).validate().is_err());
        assert!(AnalyserConfig::with_fft_size(16).validate().is_err());
        let smoothing = AnalyserConfig {
            smoothing: 1.0,
            ..Default::default()
        };
        assert!(smoothing.validate().is_err());
    }

    #[test]
    fn blackman_is_zero_at_edge_and_one_at_centre() {
        assert!(blackman(0, 256).abs() < 1e-6);
        assert!((blackman(128, 256) - 1.0).abs() < 1e-5);
    }
}
