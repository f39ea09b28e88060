//! Fixed-capacity ring of spectrum slices.
//!
//! The ring holds `capacity` slices of `width` samples each and never
//! reallocates after construction. `write_head` always names the most
//! recently written slot. Slots that were never written keep the flat
//! baseline until the ring wraps around to them.

use super::transform::{AgeTransform, Direction, StripPose};
use thiserror::Error;

/// Baseline height of a zero sample in ribbon space.
const BASELINE_Y: f32 = -1.0;

/// Errors raised by the ring history.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The `capacity x width` layout is empty, overflows or cannot be allocated.
    #[error("cannot allocate a history of {capacity} slices x {width} bins")]
    Allocation { capacity: usize, width: usize },
    /// A slice handed to `advance` does not match the ring width.
    #[error("slice has {actual} samples but the history expects {expected}")]
    SliceWidth { expected: usize, actual: usize },
    /// A slot or age outside the ring was requested.
    #[error("index {index} is outside a history of {capacity} slices")]
    OutOfRange { index: usize, capacity: usize },
}

/// One slice as seen by the draw pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strip {
    /// Ring slot to draw for this age.
    pub read_index: usize,
    pub pose: StripPose,
}

/// Horizontal position of `bin` across `[-1, 1)`.
fn bin_x(bin: usize, width: usize) -> f32 {
    2.0 * bin as f32 / width as f32 - 1.0
}

/// Scrolling ring history of spectrum slices.
#[derive(Debug, Clone)]
pub struct RingHistory {
    samples: Vec<f32>,
    capacity: usize,
    width: usize,
    write_head: usize,
    direction: Direction,
    dirty: bool,
}

impl RingHistory {
    /// Allocates a ring of `capacity` slices with `width` bins each.
    ///
    /// # Errors
    /// - If either dimension is zero
    /// - If the sample count overflows or the allocation fails
    pub fn new(capacity: usize, width: usize, direction: Direction) -> Result<Self, HistoryError> {
        let allocation = HistoryError::Allocation { capacity, width };

        if capacity == 0 || width == 0 {
            return Err(allocation);
        }

        let len = capacity.checked_mul(width).ok_or(allocation.clone())?;
        let mut samples = Vec::new();
        samples.try_reserve_exact(len).map_err(|_| allocation)?;
        samples.resize(len, 0.0);

        tracing::debug!(
            "Ring history allocated: {} slices x {} bins ({})",
            capacity,
            width,
            direction
        );

        Ok(Self {
            samples,
            capacity,
            width,
            write_head: 0,
            direction,
            dirty: true,
        })
    }

    /// Moves the write head forward and stores `slice` in the new slot.
    ///
    /// All other slots are left untouched.
    ///
    /// # Errors
    /// - If `slice` does not have exactly `width` samples; the ring is unchanged
    pub fn advance(&mut self, slice: &[f32]) -> Result<(), HistoryError> {
        if slice.len() != self.width {
            return Err(HistoryError::SliceWidth {
                expected: self.width,
                actual: slice.len(),
            });
        }

        self.write_head = (self.write_head + 1) % self.capacity;
        let offset = self.write_head * self.width;
        self.samples[offset..offset + self.width].copy_from_slice(slice);
        self.dirty = true;
        Ok(())
    }

    /// Ring slot holding the slice `age` steps behind the write head.
    pub fn read_index(&self, age: usize) -> usize {
        (self.write_head + self.capacity - age % self.capacity) % self.capacity
    }

    /// Samples stored in ring slot `index`.
    ///
    /// # Errors
    /// - If `index` is not below the capacity
    pub fn slot(&self, index: usize) -> Result<&[f32], HistoryError> {
        if index >= self.capacity {
            return Err(HistoryError::OutOfRange {
                index,
                capacity: self.capacity,
            });
        }
        let offset = index * self.width;
        Ok(&self.samples[offset..offset + self.width])
    }

    /// Samples of the slice `age` steps behind the write head.
    ///
    /// # Errors
    /// - If `age` is not below the capacity
    pub fn slice_by_age(&self, age: usize) -> Result<&[f32], HistoryError> {
        if age >= self.capacity {
            return Err(HistoryError::OutOfRange {
                index: age,
                capacity: self.capacity,
            });
        }
        self.slot(self.read_index(age))
    }

    /// Hands every strip to `draw`, oldest first, so the newest one is
    /// painted over everything behind it.
    pub fn render<F>(&self, transform: &AgeTransform, mut draw: F)
    where
        F: FnMut(Strip),
    {
        for age in (0..self.capacity).rev() {
            draw(Strip {
                read_index: self.read_index(age),
                pose: transform.pose(age, self.capacity, self.direction),
            });
        }
    }

    /// Flattened `[x, y, z]` positions of every slot in ring order, ready
    /// to be copied into a host-owned vertex buffer.
    pub fn vertices(&self) -> Vec<[f32; 3]> {
        self.samples
            .chunks_exact(self.width)
            .flat_map(|slice| {
                slice
                    .iter()
                    .enumerate()
                    .map(|(bin, &sample)| [bin_x(bin, self.width), BASELINE_Y + sample, 0.0])
            })
            .collect()
    }

    /// Reports whether the ring changed since the last call and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn write_head(&self) -> usize {
        self.write_head
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> AgeTransform {
        AgeTransform::new(0.1, 0.05, 4)
    }

    #[test]
    fn test_new_starts_on_flat_baseline() {
        let history = RingHistory::new(3, 4, Direction::Forward).unwrap();
        assert_eq!(history.write_head(), 0);
        assert!((0..3).all(|slot| history.slot(slot).unwrap() == [0.0; 4]));

        let vertices = history.vertices();
        assert_eq!(vertices.len(), 12);
        assert_eq!(vertices[0], [-1.0, -1.0, 0.0]);
        assert_eq!(vertices[2], [0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_new_rejects_empty_layout() {
        assert_eq!(
            RingHistory::new(0, 4, Direction::Forward).unwrap_err(),
            HistoryError::Allocation {
                capacity: 0,
                width: 4
            }
        );
        assert!(RingHistory::new(4, 0, Direction::Reverse).is_err());
    }

    #[test]
    fn test_new_rejects_overflowing_layout() {
        let err = RingHistory::new(usize::MAX, 2, Direction::Forward).unwrap_err();
        assert!(matches!(err, HistoryError::Allocation { .. }));
    }

    #[test]
    fn test_write_head_counts_advances_modulo_capacity() {
        let mut history = RingHistory::new(5, 2, Direction::Forward).unwrap();
        for n in 1..=23 {
            history.advance(&[n as f32, 0.0]).unwrap();
            assert_eq!(history.write_head(), n % 5);
        }
    }

    #[test]
    fn test_advance_touches_only_the_new_slot() {
        let mut history = RingHistory::new(4, 3, Direction::Forward).unwrap();
        history.advance(&[1.0, 1.0, 1.0]).unwrap();
        history.advance(&[2.0, 2.0, 2.0]).unwrap();
        let before = history.vertices();

        history.advance(&[3.0, 3.0, 3.0]).unwrap();

        let after = history.vertices();
        for slot in 0..4 {
            let range = slot * 3..slot * 3 + 3;
            if slot == history.write_head() {
                assert_ne!(after[range.clone()], before[range]);
            } else {
                assert_eq!(after[range.clone()], before[range]);
            }
        }
    }

    #[test]
    fn test_wrong_width_is_rejected_without_change() {
        let mut history = RingHistory::new(4, 2, Direction::Forward).unwrap();
        history.advance(&[0.5, 0.5]).unwrap();
        history.take_dirty();

        let err = history.advance(&[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            HistoryError::SliceWidth {
                expected: 2,
                actual: 3
            }
        );
        assert_eq!(history.write_head(), 1);
        assert_eq!(history.slot(1).unwrap(), &[0.5, 0.5]);
        assert!(!history.take_dirty());
    }

    #[test]
    fn test_newest_strip_reads_back_the_written_slice() {
        let mut history = RingHistory::new(6, 4, Direction::Reverse).unwrap();
        let slice = [0.1, 0.9, 0.3, 0.7];
        history.advance(&slice).unwrap();

        let mut newest = None;
        history.render(&transform(), |strip| newest = Some(strip));
        let newest = newest.unwrap();
        assert_eq!(history.slot(newest.read_index).unwrap(), &slice);
        assert_eq!(history.slice_by_age(0).unwrap(), &slice);
    }

    #[test]
    fn test_two_advances_on_four_slots() {
        let mut history = RingHistory::new(4, 2, Direction::Forward).unwrap();

        history.advance(&[1.0, 2.0]).unwrap();
        assert_eq!(history.write_head(), 1);
        assert_eq!(history.slot(1).unwrap(), &[1.0, 2.0]);

        history.advance(&[3.0, 4.0]).unwrap();
        assert_eq!(history.write_head(), 2);
        assert_eq!(history.slot(2).unwrap(), &[3.0, 4.0]);
        assert_eq!(history.slot(1).unwrap(), &[1.0, 2.0]);

        let mut read_indices = Vec::new();
        history.render(&transform(), |strip| read_indices.push(strip.read_index));
        // Oldest first: ages 3, 2, 1, 0
        assert_eq!(read_indices, vec![3, 0, 1, 2]);
        assert_eq!(history.slice_by_age(0).unwrap(), &[3.0, 4.0]);
        assert_eq!(history.slice_by_age(1).unwrap(), &[1.0, 2.0]);
        assert_eq!(history.slice_by_age(2).unwrap(), &[0.0, 0.0]);
        assert_eq!(history.slice_by_age(3).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_fourth_advance_wraps_onto_first_written_slot() {
        let mut history = RingHistory::new(3, 1, Direction::Forward).unwrap();
        history.advance(&[1.0]).unwrap();
        history.advance(&[2.0]).unwrap();
        history.advance(&[3.0]).unwrap();
        assert_eq!(history.write_head(), 0);

        history.advance(&[4.0]).unwrap();
        assert_eq!(history.write_head(), 1);
        assert_eq!(history.slot(1).unwrap(), &[4.0]);
        assert_eq!(history.slice_by_age(1).unwrap(), &[3.0]);
    }

    #[test]
    fn test_render_paints_oldest_first_without_mutation() {
        let mut history = RingHistory::new(4, 2, Direction::Forward).unwrap();
        history.advance(&[0.2, 0.4]).unwrap();
        history.take_dirty();
        let before = history.vertices();

        let t = transform();
        let mut poses = Vec::new();
        history.render(&t, |strip| poses.push(strip.pose));

        let expected: Vec<_> = (0..4).rev().map(|age| t.pose(age, 4, Direction::Forward)).collect();
        assert_eq!(poses, expected);
        assert_eq!(history.vertices(), before);
        assert_eq!(history.write_head(), 1);
        assert!(!history.take_dirty());
    }

    #[test]
    fn test_vertices_lift_samples_off_the_baseline() {
        let mut history = RingHistory::new(2, 2, Direction::Forward).unwrap();
        history.advance(&[0.5, 1.0]).unwrap();
        let vertices = history.vertices();
        assert_eq!(vertices[2], [-1.0, -0.5, 0.0]);
        assert_eq!(vertices[3], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_accessors_reject_out_of_range() {
        let history = RingHistory::new(2, 2, Direction::Forward).unwrap();
        assert_eq!(
            history.slot(2).unwrap_err(),
            HistoryError::OutOfRange {
                index: 2,
                capacity: 2
            }
        );
        assert!(history.slice_by_age(5).is_err());
    }

    #[test]
    fn test_dirty_flag_follows_advance() {
        let mut history = RingHistory::new(2, 1, Direction::Forward).unwrap();
        assert!(history.take_dirty());
        assert!(!history.take_dirty());
        history.advance(&[1.0]).unwrap();
        assert!(history.take_dirty());
    }
}
