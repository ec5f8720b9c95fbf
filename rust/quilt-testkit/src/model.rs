//! A flat ground-truth model of a chunked sequence.

use quilt_buffer::{Buffer, Slice};

/// The materialized values of a chunked array, addressed directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatModel {
    values: Vec<i64>,
}

impl FlatModel {
    pub fn new(values: Vec<i64>) -> FlatModel {
        FlatModel { values }
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Positions selected by `slice`, in selection order.
    ///
    /// Bounds are expected to be non-negative.
    pub fn slice_positions(&self, slice: &Slice) -> Option<Vec<usize>> {
        let resolved = slice.resolve(self.len()).ok()?;
        Some(resolved.positions().collect())
    }

    pub fn slice(&self, slice: &Slice) -> Option<Vec<i64>> {
        let positions = self.slice_positions(slice)?;
        Some(positions.into_iter().map(|pos| self.values[pos]).collect())
    }

    /// Values at `indices`, or `None` if any index is negative or out of range.
    pub fn take(&self, indices: &[i64]) -> Option<Vec<i64>> {
        indices
            .iter()
            .map(|&index| {
                let index = usize::try_from(index).ok()?;
                self.values.get(index).copied()
            })
            .collect()
    }

    /// Values whose mask entry is set, or `None` on a length mismatch.
    pub fn filter(&self, mask: &[bool]) -> Option<Vec<i64>> {
        if mask.len() != self.len() {
            return None;
        }
        Some(
            self.values
                .iter()
                .zip(mask)
                .filter_map(|(&value, &keep)| keep.then_some(value))
                .collect(),
        )
    }

    /// Positions selected by `mask`.
    pub fn mask_positions(mask: &[bool]) -> Vec<usize> {
        mask.iter()
            .enumerate()
            .filter_map(|(pos, &keep)| keep.then_some(pos))
            .collect()
    }

    /// Assigns `values` to `positions` in order; a single value is broadcast.
    ///
    /// Returns `false` without modifying anything when a sequence of more than one
    /// value does not match the number of positions.
    pub fn assign(&mut self, positions: &[usize], values: &[i64]) -> bool {
        match values {
            [value] => {
                for &pos in positions {
                    self.values[pos] = *value;
                }
                true
            }
            _ if values.len() == positions.len() => {
                for (&pos, &value) in positions.iter().zip(values) {
                    self.values[pos] = value;
                }
                true
            }
            _ => false,
        }
    }
}

/// The values of an integer-valued buffer of any element type, row-major.
pub fn to_i64s(buffer: &Buffer) -> Vec<i64> {
    buffer.scalars().map(|s| s.as_i64()).collect()
}
