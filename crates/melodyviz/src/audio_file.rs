//! WAV playback into the analyser.
//!
//! There is no audio output; playback only means "feed the analyser in real
//! time". Each frame pushes the samples that elapsed since the previous frame.

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader};
use melodyviz_core::FftAnalyser;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};

/// Where playback stands after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not started or stopped
    Idle,
    /// Feeding samples
    Playing,
    /// Reached the end this frame
    Finished,
}

/// A decoded mono clip and its playback cursor
pub struct WavPlayback {
    name: String,
    samples: Vec<f32>,
    sample_rate: u32,
    position: usize,
    started_ms: Option<u64>,
    analyser: Rc<RefCell<FftAnalyser>>,
}

impl WavPlayback {
    /// Decode a WAV file and downmix it to mono
    pub fn load(path: &Path, analyser: Rc<RefCell<FftAnalyser>>) -> Result<Self> {
        let reader =
            WavReader::open(path).with_context(|| format!("Failed to open WAV file {:?}", path))?;
        let spec = reader.spec();
        if spec.channels == 0 || spec.sample_rate == 0 {
            bail!("WAV file {:?} has no channels or no sample rate", path);
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .context("Failed to decode float samples")?,
            SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<_, _>>()
                    .context("Failed to decode integer samples")?
            }
        };

        let samples = downmix(&interleaved, usize::from(spec.channels));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!(
            "Loaded {}: {} Hz, {} ch, {:.1} s",
            name,
            spec.sample_rate,
            spec.channels,
            samples.len() as f32 / spec.sample_rate as f32
        );

        Ok(Self {
            name,
            samples,
            sample_rate: spec.sample_rate,
            position: 0,
            started_ms: None,
            analyser,
        })
    }

    /// File name for status messages
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.samples.len() as u64 * 1000 / u64::from(self.sample_rate)
    }

    /// Start from the beginning at `now_ms`
    pub fn play(&mut self, now_ms: u64) {
        self.position = 0;
        self.started_ms = Some(now_ms);
        self.analyser.borrow_mut().reset();
        debug!("Playback of {} started", self.name);
    }

    /// Stop feeding the analyser
    pub fn stop(&mut self) {
        self.started_ms = None;
    }

    /// Whether playback is running
    pub fn is_playing(&self) -> bool {
        self.started_ms.is_some()
    }

    /// Push the samples due by `now_ms` into the analyser
    pub fn advance(&mut self, now_ms: u64) -> PlaybackState {
        let Some(started) = self.started_ms else {
            return PlaybackState::Idle;
        };

        let elapsed = now_ms.saturating_sub(started);
        let due = (elapsed * u64::from(self.sample_rate) / 1000) as usize;
        let target = due.min(self.samples.len());
        if target > self.position {
            self.analyser
                .borrow_mut()
                .push_samples(&self.samples[self.position..target]);
            self.position = target;
        }

        if self.position >= self.samples.len() {
            self.started_ms = None;
            info!("Playback of {} finished", self.name);
            PlaybackState::Finished
        } else {
            PlaybackState::Playing
        }
    }
}

/// Average interleaved frames down to one channel
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
