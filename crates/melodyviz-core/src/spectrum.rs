//! Per-frame spectrum sampling.
//!
//! The sampler pulls a fresh snapshot from an analysis node every time it is
//! asked. Nothing is cached between frames.

use std::cell::RefCell;
use std::rc::Rc;

/// Source of frequency and time-domain snapshots of an audio signal
pub trait AnalysisNode {
    /// Number of frequency bins (half the FFT size)
    fn frequency_bin_count(&self) -> usize;

    /// Number of time-domain samples per snapshot
    fn fft_size(&self) -> usize;

    /// Write byte-scaled frequency magnitudes into `out`
    fn byte_frequency_data(&mut self, out: &mut [u8]);

    /// Write byte-scaled waveform samples (128 = silence) into `out`
    fn byte_time_domain_data(&mut self, out: &mut [u8]);
}

/// Shared handle so the host can keep feeding a node the sampler reads from
impl<T: AnalysisNode> AnalysisNode for Rc<RefCell<T>> {
    fn frequency_bin_count(&self) -> usize {
        self.borrow().frequency_bin_count()
    }

    fn fft_size(&self) -> usize {
        self.borrow().fft_size()
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.borrow_mut().byte_frequency_data(out)
    }

    fn byte_time_domain_data(&mut self, out: &mut [u8]) {
        self.borrow_mut().byte_time_domain_data(out)
    }
}

/// One frame's spectrum snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpectrumFrame {
    /// Frequency magnitudes (0-255)
    pub frequencies: Vec<u8>,
    /// Waveform samples (0-255, 128 = zero crossing)
    pub waveform: Vec<u8>,
}

impl SpectrumFrame {
    /// Loudest frequency bin
    pub fn peak(&self) -> u8 {
        peak(&self.frequencies)
    }
}

/// Maximum of a byte spectrum; 0 for an empty one
pub fn peak(frequencies: &[u8]) -> u8 {
    frequencies.iter().copied().max().unwrap_or(0)
}

/// Reads snapshots from an optional analysis node
#[derive(Default)]
pub struct SpectrumSampler {
    node: Option<Box<dyn AnalysisNode>>,
}

impl SpectrumSampler {
    /// Sampler with no node attached; every sample is `None`
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampler reading from `node`
    pub fn with_node(node: Box<dyn AnalysisNode>) -> Self {
        Self { node: Some(node) }
    }

    /// Attach a node, replacing any previous one
    pub fn attach(&mut self, node: Box<dyn AnalysisNode>) {
        self.node = Some(node);
    }

    /// Detach and return the current node
    pub fn detach(&mut self) -> Option<Box<dyn AnalysisNode>> {
        self.node.take()
    }

    /// Whether a node is attached
    pub fn is_available(&self) -> bool {
        self.node.is_some()
    }

    /// Fresh frequency snapshot, `None` when no node is attached
    pub fn sample_frequencies(&mut self) -> Option<Vec<u8>> {
        let node = self.node.as_mut()?;
        let mut data = vec![0u8; node.frequency_bin_count()];
        node.byte_frequency_data(&mut data);
        Some(data)
    }

    /// Fresh waveform snapshot, `None` when no node is attached
    pub fn sample_waveform(&mut self) -> Option<Vec<u8>> {
        let node = self.node.as_mut()?;
        let mut data = vec![0u8; node.fft_size()];
        node.byte_time_domain_data(&mut data);
        Some(data)
    }

    /// Both snapshots at once
    pub fn sample(&mut self) -> Option<SpectrumFrame> {
        let frequencies = self.sample_frequencies()?;
        let waveform = self.sample_waveform()?;
        Some(SpectrumFrame {
            frequencies,
            waveform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant {
        level: u8,
    }

    impl AnalysisNode for Constant {
        fn frequency_bin_count(&self) -> usize {
            8
        }

        fn fft_size(&self) -> usize {
            16
        }

        fn byte_frequency_data(&mut self, out: &mut [u8]) {
            out.fill(self.level);
        }

        fn byte_time_domain_data(&mut self, out: &mut [u8]) {
            out.fill(128);
        }
    }

    #[test]
    fn test_unavailable_sampler_yields_none() {
        let mut sampler = SpectrumSampler::new();
        assert!(!sampler.is_available());
        assert!(sampler.sample_frequencies().is_none());
        assert!(sampler.sample_waveform().is_none());
        assert!(sampler.sample().is_none());
    }

    #[test]
    fn test_sizes_follow_node() {
        let mut sampler = SpectrumSampler::with_node(Box::new(Constant { level: 9 }));
        let frame = sampler.sample().unwrap();
        assert_eq!(frame.frequencies.len(), 8);
        assert_eq!(frame.waveform.len(), 16);
        assert_eq!(frame.peak(), 9);
    }

    #[test]
    fn test_silent_node_has_zero_peak() {
        let mut sampler = SpectrumSampler::with_node(Box::new(Constant { level: 0 }));
        let freqs = sampler.sample_frequencies().unwrap();
        assert_eq!(peak(&freqs), 0);
    }

    #[test]
    fn test_peak_of_empty_is_zero() {
        assert_eq!(peak(&[]), 0);
        assert_eq!(peak(&[3, 200, 17]), 200);
    }

    #[test]
    fn test_shared_node_reads_live_state() {
        let shared = Rc::new(RefCell::new(Constant { level: 4 }));
        let mut sampler = SpectrumSampler::with_node(Box::new(Rc::clone(&shared)));
        assert_eq!(sampler.sample().unwrap().peak(), 4);

        shared.borrow_mut().level = 250;
        assert_eq!(sampler.sample().unwrap().peak(), 250);
    }

    #[test]
    fn test_detach_makes_unavailable() {
        let mut sampler = SpectrumSampler::with_node(Box::new(Constant { level: 1 }));
        assert!(sampler.detach().is_some());
        assert!(sampler.sample().is_none());
    }
}
