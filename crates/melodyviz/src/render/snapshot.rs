//! PNG snapshots of the canvases.

use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes numbered PNG files every N frames
pub struct SnapshotWriter {
    dir: PathBuf,
    every: u64,
    written: usize,
}

impl SnapshotWriter {
    /// Create the output directory if needed
    pub fn new(dir: &Path, every: u64) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create snapshot directory {:?}", dir))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            every: every.max(1),
            written: 0,
        })
    }

    /// Whether `frame` (1-based) is a snapshot frame
    pub fn is_due(&self, frame: u64) -> bool {
        frame % self.every == 0
    }

    /// Save one layer of a frame as `<layer>_<frame>.png`
    pub fn save(&mut self, layer: &str, frame: u64, image: &RgbImage) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}_{:06}.png", layer, frame));
        image
            .save(&path)
            .with_context(|| format!("Failed to write snapshot {:?}", path))?;
        self.written += 1;
        debug!("Snapshot written: {:?}", path);
        Ok(path)
    }

    /// Files written so far
    pub fn written(&self) -> usize {
        self.written
    }
}
