//! Random chunk layouts.

use std::sync::Arc;

use arrow_array::{ArrayRef, Int64Array};
use quilt_buffer::{Buffer, ChunkInput, Slice};

/// Input representation used for a generated chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkForm {
    Values,
    Arrow,
    Buffer,
}

/// A sequence of `i64` values split into chunks.
#[derive(Debug, Clone)]
pub struct ChunkLayout {
    pub lens: Vec<usize>,
    pub forms: Vec<ChunkForm>,
    pub values: Vec<i64>,
}

impl ChunkLayout {
    /// Splits `values` according to `lens`, using `Values` inputs for every chunk.
    ///
    /// # Panics
    ///
    /// Panics if the lengths do not add up to the number of values.
    pub fn new(values: Vec<i64>, lens: Vec<usize>) -> ChunkLayout {
        assert_eq!(lens.iter().sum::<usize>(), values.len());
        let forms = vec![ChunkForm::Values; lens.len()];
        ChunkLayout {
            lens,
            forms,
            values,
        }
    }

    /// Generates between one and `max_chunks` chunks of up to `max_len` elements
    /// each; zero-length chunks are common.
    pub fn random(rng: &mut fastrand::Rng, max_chunks: usize, max_len: usize) -> ChunkLayout {
        let count = rng.usize(1..=max_chunks);
        let lens: Vec<usize> = (0..count)
            .map(|_| {
                if rng.u8(0..4) == 0 {
                    0
                } else {
                    rng.usize(0..=max_len)
                }
            })
            .collect();
        let total: usize = lens.iter().sum();
        let values = (0..total).map(|_| rng.i64(-1000..1000)).collect();
        let forms = (0..count)
            .map(|_| match rng.u8(0..3) {
                0 => ChunkForm::Values,
                1 => ChunkForm::Arrow,
                _ => ChunkForm::Buffer,
            })
            .collect();
        ChunkLayout {
            lens,
            forms,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The chunk inputs, in order.
    pub fn chunks(&self) -> Vec<ChunkInput> {
        let mut offset = 0;
        self.lens
            .iter()
            .zip(&self.forms)
            .map(|(&len, &form)| {
                let values = &self.values[offset..offset + len];
                offset += len;
                match form {
                    ChunkForm::Values => ChunkInput::from(values.to_vec()),
                    ChunkForm::Arrow => {
                        let array: ArrayRef = Arc::new(Int64Array::from(values.to_vec()));
                        ChunkInput::from(array)
                    }
                    ChunkForm::Buffer => ChunkInput::from(Buffer::from_slice(values)),
                }
            })
            .collect()
    }
}

/// A slice with bounds in `0..=len + 2` (or open) and a non-zero step in `-4..=4`.
pub fn random_slice(rng: &mut fastrand::Rng, len: usize) -> Slice {
    let mut bound = || rng.bool().then(|| rng.i64(0..=len as i64 + 2));
    let start = bound();
    let stop = bound();
    let step = match rng.i64(-4..=4) {
        0 => None,
        step => Some(step),
    };
    Slice::new(start, stop, step)
}

/// `count` indices in `0..len`, unordered and possibly repeated.
pub fn random_indices(rng: &mut fastrand::Rng, len: usize, count: usize) -> Vec<i64> {
    if len == 0 {
        return Vec::new();
    }
    (0..count).map(|_| rng.i64(0..len as i64)).collect()
}

pub fn random_mask(rng: &mut fastrand::Rng, len: usize) -> Vec<bool> {
    (0..len).map(|_| rng.bool()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_layout_is_consistent() {
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..50 {
            let layout = ChunkLayout::random(&mut rng, 5, 6);
            let chunks = layout.chunks();
            assert_eq!(chunks.len(), layout.lens.len());
            let lens: Vec<usize> = chunks.iter().map(ChunkInput::len).collect();
            assert_eq!(lens, layout.lens);
            assert_eq!(layout.len(), lens.iter().sum::<usize>());
        }
    }

    #[test]
    fn test_random_slice_step() {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..100 {
            let slice = random_slice(&mut rng, 10);
            assert_ne!(slice.step, Some(0));
        }
    }
}
