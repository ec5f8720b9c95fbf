use quilt_buffer::{Buffer, TailIndex};
use quilt_common::{Result, error::ErrorKind};

use super::{ChunkedArray, Feed, PendingWrite, apply_tail, check_inner_shape};
use crate::selector::Assign;

/// Local rows of the chunk spanning `offset..end` whose mask entry is set.
///
/// The mask may be shorter or longer than the array; its length is checked once
/// every chunk has been visited.
fn masked_rows(mask: &[bool], offset: usize, end: usize) -> Vec<usize> {
    let lo = offset.min(mask.len());
    let hi = end.min(mask.len());
    mask[lo..hi]
        .iter()
        .enumerate()
        .filter_map(|(row, &keep)| keep.then_some(row))
        .collect()
}

fn check_mask_len(mask: &[bool], len: usize) -> Result<()> {
    if mask.len() != len {
        return Err(ErrorKind::MaskLengthMismatch {
            len,
            mask_len: mask.len(),
        }
        .into());
    }
    Ok(())
}

impl ChunkedArray {
    /// Keeps the elements whose mask entry is set, in increasing order.
    pub(super) fn get_mask(&mut self, mask: &[bool], tail: &[TailIndex]) -> Result<Buffer> {
        let selected = mask.iter().filter(|&&keep| keep).count();
        let mut out: Option<Buffer> = None;
        let mut next = 0;
        let mut end = 0;
        for chunk in self.chunk_iter() {
            let chunk = chunk?;
            end = chunk.end();
            if chunk.is_empty() {
                continue;
            }
            let out = out.get_or_insert_with(|| {
                Buffer::zeroed(&chunk.buffer.descriptor(), selected)
            });
            check_inner_shape(out, chunk.buffer)?;

            let rows = masked_rows(mask, chunk.offset, end);
            out.copy_rows_from(next..next + rows.len(), chunk.buffer, rows.iter().copied());
            next += rows.len();
        }
        check_mask_len(mask, end)?;

        match out {
            Some(out) => apply_tail(out, tail),
            None => self.empty_result(tail),
        }
    }

    /// Writes `value` to the elements whose mask entry is set.
    pub(super) fn set_mask(&mut self, mask: &[bool], tail: &[TailIndex], value: &Assign) -> Result<()> {
        let mut hits = Vec::new();
        let mut end = 0;
        for chunk in self.chunk_iter() {
            let chunk = chunk?;
            end = chunk.end();
            let rows = masked_rows(mask, chunk.offset, end);
            if !rows.is_empty() {
                hits.push((chunk.index, rows));
            }
        }
        check_mask_len(mask, end)?;

        let selected = hits.iter().map(|(_, rows)| rows.len()).sum();
        let feed = Feed::new(value, selected)?;
        let mut writes = Vec::with_capacity(hits.len());
        let mut consumed = 0;
        for (chunk, rows) in hits {
            let buffer = self.chunk_mut(chunk)?;
            let source = feed.source(consumed..consumed + rows.len());
            consumed += rows.len();
            writes.push(PendingWrite::prepare(chunk, buffer, rows, tail, source)?);
        }
        self.apply_writes(&writes)
    }
}

#[cfg(test)]
mod tests {
    use quilt_buffer::{ChunkInput, Item};
    use quilt_common::error::ErrorCategory;

    use super::*;

    fn sample() -> ChunkedArray {
        ChunkedArray::new(vec![vec![1, 2, 3], vec![], vec![4, 5]])
    }

    fn ints(item: Item) -> Vec<i64> {
        item.as_array().unwrap().as_slice::<i64>().unwrap().to_vec()
    }

    #[test]
    fn test_masked_rows() {
        let mask = [true, false, true, true];
        assert_eq!(masked_rows(&mask, 0, 2), vec![0]);
        assert_eq!(masked_rows(&mask, 2, 4), vec![0, 1]);
        assert_eq!(masked_rows(&mask, 3, 6), vec![0]);
        assert!(masked_rows(&mask, 5, 7).is_empty());
    }

    #[test]
    fn test_get_mask() {
        let mut array = sample();
        let mask = vec![true, false, true, false, true];
        assert_eq!(ints(array.get(mask).unwrap()), vec![1, 3, 5]);

        let none = array.get(vec![false; 5]).unwrap();
        assert!(none.as_array().unwrap().is_empty());
    }

    #[test]
    fn test_mask_length_checked_after_traversal() {
        let mut array = sample();
        for mask in [vec![true; 4], vec![true; 6]] {
            let err = array.get(mask.clone()).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Index);
            assert!(err.to_string().contains("dimension is 5"));
            let err = array.set(mask, 0).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Index);
        }
        assert_eq!(ints(array.get(..).unwrap()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_get_from_bool_buffer_with_tail() {
        let mut array = ChunkedArray::new(vec![
            ChunkInput::from(vec![vec![1, 2]]),
            ChunkInput::from(vec![vec![3, 4], vec![5, 6]]),
        ]);
        let mask = Buffer::from_bools(&[false, true, true]);
        let column = array.get_with(mask, &[TailIndex::Index(1)]).unwrap();
        assert_eq!(ints(column), vec![4, 6]);
    }

    #[test]
    fn test_set_mask() {
        let mut array = sample();
        let mask = vec![true, false, true, true, false];
        array.set(mask.clone(), vec![7i64, 8, 9]).unwrap();
        assert_eq!(ints(array.get(..).unwrap()), vec![7, 2, 8, 9, 5]);

        array.set(mask.clone(), vec![0i64]).unwrap();
        assert_eq!(ints(array.get(..).unwrap()), vec![0, 2, 0, 0, 5]);

        array.set(mask.clone(), 1).unwrap();
        assert_eq!(ints(array.get(..).unwrap()), vec![1, 2, 1, 1, 5]);

        let err = array.set(mask, vec![1i64, 2]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ShapeMismatch);
        assert_eq!(ints(array.get(..).unwrap()), vec![1, 2, 1, 1, 5]);
    }
}
