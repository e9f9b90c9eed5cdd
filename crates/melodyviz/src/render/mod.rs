//! Render adapters: the host side of the frame driver's output buffers.

mod keyboard;
mod points;
mod snapshot;
mod spectrum;

pub use keyboard::KeyboardDisplay;
pub use points::PointRenderer;
pub use snapshot::SnapshotWriter;
pub use spectrum::SpectrumCanvas;
