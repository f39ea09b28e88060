//! Scrolling spectrogram ribbons.
//!
//! A ribbon is a fixed-capacity ring of spectrum slices. Each frame the oldest
//! slice is overwritten, and the draw pass walks the ring by age so that
//! older slices recede in depth, spread in width and fade out.

pub mod history;
pub mod resample;
pub mod transform;

pub use history::RingHistory;
pub use resample::{resample, resample_to};
pub use transform::{AgeTransform, Direction};
