//! FFT analyser node
//!
//! A native analyser with browser-analyser semantics: the most recent
//! `fft_size` samples are kept in a ring buffer, Blackman-windowed and
//! transformed on each frequency read. Magnitudes are smoothed over time and
//! mapped from decibels onto 0-255.

use crate::config::{AnalyserConfig, FFT_SIZE_RANGE};
use crate::spectrum::AnalysisNode;
use crate::Result;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use tracing::debug;

/// Analyser node fed with mono samples by the host
pub struct FftAnalyser {
    /// FFT instance
    fft: Arc<dyn Fft<f32>>,

    /// Configuration
    config: AnalyserConfig,

    /// Input sample ring buffer (most recent `fft_size` samples)
    input_buffer: Vec<f32>,

    /// Write position in ring buffer
    write_pos: usize,

    /// FFT complex buffer
    fft_buffer: Vec<Complex<f32>>,

    /// FFT scratch buffer
    scratch_buffer: Vec<Complex<f32>>,

    /// Blackman window coefficients
    window: Vec<f32>,

    /// Smoothed magnitudes, one per frequency bin
    smoothed: Vec<f32>,

    /// Debug: samples received
    total_samples: u64,
}

impl FftAnalyser {
    /// Create an analyser. `fft_size` is clamped into range and rounded up
    /// to a power of two; use [`FftAnalyser::try_new`] to reject it instead.
    pub fn new(mut config: AnalyserConfig) -> Self {
        let fft_size = config
            .fft_size
            .clamp(*FFT_SIZE_RANGE.start(), *FFT_SIZE_RANGE.end())
            .next_power_of_two();
        config.fft_size = fft_size;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        debug!(
            "FftAnalyser created: fft_size={}, smoothing={}, range={}..{} dB",
            fft_size, config.smoothing_time_constant, config.min_decibels, config.max_decibels
        );

        Self {
            fft,
            input_buffer: vec![0.0; fft_size],
            write_pos: 0,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch_buffer: vec![Complex::new(0.0, 0.0); scratch_len],
            window: blackman_window(fft_size),
            smoothed: vec![0.0; fft_size / 2],
            total_samples: 0,
            config,
        }
    }

    /// Validate the config, then create the analyser
    pub fn try_new(config: AnalyserConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Append mono samples. Non-finite samples are treated as silence.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let size = self.input_buffer.len();
        for &sample in samples {
            self.input_buffer[self.write_pos] = if sample.is_finite() { sample } else { 0.0 };
            self.write_pos = (self.write_pos + 1) % size;
        }
        self.total_samples += samples.len() as u64;
    }

    /// Forget all buffered audio and smoothing history
    pub fn reset(&mut self) {
        self.input_buffer.fill(0.0);
        self.smoothed.fill(0.0);
        self.write_pos = 0;
    }

    /// Total samples received since creation
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Analyser configuration
    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    /// Run the FFT over the current window and fold it into the smoothed spectrum
    fn update_spectrum(&mut self) {
        let size = self.input_buffer.len();

        // Oldest sample sits at the write position
        for i in 0..size {
            let src = (self.write_pos + i) % size;
            self.fft_buffer[i] = Complex::new(self.input_buffer[src] * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch_buffer);

        let tau = self.config.smoothing_time_constant;
        let norm = 1.0 / size as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(&self.fft_buffer) {
            let magnitude = bin.norm() * norm;
            let next = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if next.is_finite() { next } else { 0.0 };
        }
    }

    fn magnitude_to_byte(&self, magnitude: f32) -> u8 {
        let min_db = self.config.min_decibels;
        let max_db = self.config.max_decibels;
        if magnitude <= 0.0 {
            return 0;
        }
        let db = 20.0 * magnitude.log10();
        let scaled = (255.0 / (max_db - min_db) * (db - min_db)).floor();
        scaled.clamp(0.0, 255.0) as u8
    }
}

impl AnalysisNode for FftAnalyser {
    fn frequency_bin_count(&self) -> usize {
        self.smoothed.len()
    }

    fn fft_size(&self) -> usize {
        self.input_buffer.len()
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.update_spectrum();
        for (byte, magnitude) in out.iter_mut().zip(&self.smoothed) {
            *byte = self.magnitude_to_byte(*magnitude);
        }
    }

    fn byte_time_domain_data(&mut self, out: &mut [u8]) {
        let size = self.input_buffer.len();
        for (i, byte) in out.iter_mut().take(size).enumerate() {
            let sample = self.input_buffer[(self.write_pos + i) % size];
            *byte = (128.0 * (sample + 1.0)).floor().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Blackman window (alpha = 0.16)
fn blackman_window(size: usize) -> Vec<f32> {
    const ALPHA: f32 = 0.16;
    let a0 = 0.5 * (1.0 - ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * ALPHA;
    let two_pi = 2.0 * std::f32::consts::PI;

    (0..size)
        .map(|i| {
            let t = i as f32 / size as f32;
            a0 - a1 * (two_pi * t).cos() + a2 * (2.0 * two_pi * t).cos()
        })
        .collect()
}
