//! The chunk traversal primitive shared by every operation.

use quilt_buffer::{Buffer, Item, TailPlan};
use quilt_common::{Result, try_or_ret_some_err};

use crate::slot::ChunkSlot;

/// One chunk reached by a traversal.
#[derive(Debug)]
pub struct ChunkRef<'a> {
    /// Position of the chunk in the chunk list.
    pub index: usize,
    /// Global position of the chunk's first element.
    pub offset: usize,
    pub buffer: &'a mut Buffer,
}

impl ChunkRef<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Global position one past the chunk's last element.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.buffer.len()
    }
}

/// Walks chunk slots in order, normalizing each raw slot it reaches.
///
/// The iterator is lazy: slots after the point where the consumer stops are
/// left untouched. A normalization failure is yielded as an error item, after
/// which the iterator is exhausted.
pub struct ChunkIter<'a> {
    slots: std::slice::IterMut<'a, ChunkSlot>,
    index: usize,
    offset: usize,
    failed: bool,
}

impl<'a> ChunkIter<'a> {
    pub fn new(slots: &'a mut [ChunkSlot]) -> ChunkIter<'a> {
        ChunkIter {
            slots: slots.iter_mut(),
            index: 0,
            offset: 0,
            failed: false,
        }
    }

    /// Global position of the next chunk, which is the total length of the chunks
    /// yielded so far.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<ChunkRef<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let slot = self.slots.next()?;
        self.failed = true;
        let buffer = try_or_ret_some_err!(slot.normalize());
        self.failed = false;

        let chunk = ChunkRef {
            index: self.index,
            offset: self.offset,
            buffer,
        };
        self.index += 1;
        self.offset += chunk.len();
        Some(Ok(chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.slots.len()))
        }
    }
}

/// Iterates the elements of consecutive chunks.
pub struct ElementIter<'a> {
    chunks: ChunkIter<'a>,
    current: Option<(&'a Buffer, TailPlan)>,
    row: usize,
}

impl<'a> ElementIter<'a> {
    pub fn new(chunks: ChunkIter<'a>) -> ElementIter<'a> {
        ElementIter {
            chunks,
            current: None,
            row: 0,
        }
    }
}

impl Iterator for ElementIter<'_> {
    type Item = Result<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((buffer, plan)) = &self.current {
                if self.row < buffer.len() {
                    let item = buffer.get_planned(self.row, plan);
                    self.row += 1;
                    return Some(Ok(item));
                }
            }
            let chunk = try_or_ret_some_err!(self.chunks.next()?);
            let buffer: &Buffer = chunk.buffer;
            self.current = Some((buffer, TailPlan::identity(buffer.inner_shape())));
            self.row = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quilt_buffer::ChunkInput;

    fn slots(inputs: Vec<ChunkInput>) -> Vec<ChunkSlot> {
        inputs.into_iter().map(ChunkSlot::from).collect()
    }

    #[test]
    fn test_offsets() {
        let mut slots = slots(vec![
            ChunkInput::from(vec![1, 2, 3]),
            ChunkInput::from(Vec::<i64>::new()),
            ChunkInput::from(vec![4, 5]),
        ]);
        let chunks: Vec<(usize, usize, usize)> = ChunkIter::new(&mut slots)
            .map(|chunk| {
                let chunk = chunk.unwrap();
                (chunk.index, chunk.offset, chunk.len())
            })
            .collect();
        assert_eq!(chunks, vec![(0, 0, 3), (1, 3, 0), (2, 3, 2)]);
        assert!(slots.iter().all(ChunkSlot::is_normalized));
    }

    #[test]
    fn test_lazy_normalization() {
        let mut slots = slots(vec![
            ChunkInput::from(vec![1, 2]),
            ChunkInput::from(vec![3]),
        ]);
        let mut iter = ChunkIter::new(&mut slots);
        assert_eq!(iter.next().unwrap().unwrap().end(), 2);
        assert_eq!(iter.offset(), 2);
        drop(iter);
        assert!(slots[0].is_normalized());
        assert!(!slots[1].is_normalized());
    }

    #[test]
    fn test_elements_skip_empty_chunks() {
        let mut slots = slots(vec![
            ChunkInput::from(Vec::<i64>::new()),
            ChunkInput::from(vec![vec![1, 2]]),
            ChunkInput::from(Vec::<Vec<i64>>::new()),
            ChunkInput::from(vec![vec![3, 4]]),
        ]);
        let rows: Vec<String> = ElementIter::new(ChunkIter::new(&mut slots))
            .map(|item| item.unwrap().to_string())
            .collect();
        assert_eq!(rows, vec!["[1 2]", "[3 4]"]);
    }

    #[test]
    fn test_error_stops_iteration() {
        let mut slots = slots(vec![
            ChunkInput::from(vec![vec![1, 2], vec![3]]),
            ChunkInput::from(vec![4]),
        ]);
        let mut iter = ChunkIter::new(&mut slots);
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
        drop(iter);
        assert!(!slots[1].is_normalized());
    }
}
