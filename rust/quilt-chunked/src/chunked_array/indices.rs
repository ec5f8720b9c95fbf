use quilt_buffer::{Buffer, TailIndex, WriteSource};
use quilt_common::{Result, error::Error, reject_negative};

use super::{ChunkedArray, Feed, PendingWrite, apply_tail, check_inner_shape};
use crate::selector::Assign;

/// Rejects negative entries and returns the largest index.
fn max_index(indices: &[i64]) -> Result<usize> {
    let mut max = 0;
    for &index in indices {
        max = max.max(reject_negative!(index));
    }
    Ok(max)
}

impl ChunkedArray {
    /// Gathers the elements at `indices`, in the given order.
    pub(super) fn get_indices(&mut self, indices: &[i64], tail: &[TailIndex]) -> Result<Buffer> {
        if indices.is_empty() {
            return self.empty_result(tail);
        }
        let max = max_index(indices)?;

        let mut out: Option<Buffer> = None;
        let mut end = 0;
        for chunk in self.chunk_iter() {
            let chunk = chunk?;
            end = chunk.end();
            if chunk.is_empty() {
                continue;
            }
            let out = out.get_or_insert_with(|| {
                Buffer::zeroed(&chunk.buffer.descriptor(), indices.len())
            });
            check_inner_shape(out, chunk.buffer)?;

            let (dst, src): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .enumerate()
                .filter(|&(_, &index)| (chunk.offset..end).contains(&(index as usize)))
                .map(|(position, &index)| (position, index as usize - chunk.offset))
                .unzip();
            out.copy_rows_from(dst.into_iter(), chunk.buffer, src.into_iter());

            if end > max {
                break;
            }
        }

        match out {
            Some(out) if max < end => apply_tail(out, tail),
            _ => Err(Error::out_of_bounds(max, end)),
        }
    }

    /// Writes `value` to the elements at `indices`.
    ///
    /// When `value` is a sequence of the index count, entry `k` goes to
    /// `indices[k]` and a repeated index keeps the last entry written to it.
    pub(super) fn set_indices(
        &mut self,
        indices: &[i64],
        tail: &[TailIndex],
        value: &Assign,
    ) -> Result<()> {
        let feed = Feed::new(value, indices.len())?;
        if indices.is_empty() {
            return Ok(());
        }
        let max = max_index(indices)?;

        let mut starts = Vec::new();
        let mut end = 0;
        for chunk in self.chunk_iter() {
            let chunk = chunk?;
            starts.push(chunk.offset);
            end = chunk.end();
            if end > max {
                break;
            }
        }
        if max >= end {
            return Err(Error::out_of_bounds(max, end));
        }

        let mut writes = Vec::new();
        match feed {
            Feed::Broadcast(source) => {
                for (chunk, &start) in starts.iter().enumerate() {
                    let buffer = self.chunk_mut(chunk)?;
                    let stop = start + buffer.len();
                    let rows: Vec<usize> = indices
                        .iter()
                        .map(|&index| index as usize)
                        .filter(|index| (start..stop).contains(index))
                        .map(|index| index - start)
                        .collect();
                    if !rows.is_empty() {
                        writes.push(PendingWrite::prepare(
                            chunk,
                            buffer,
                            rows,
                            tail,
                            source.clone(),
                        )?);
                    }
                }
            }
            Feed::Sequence(values) => {
                writes.reserve(indices.len());
                for (position, &index) in indices.iter().enumerate() {
                    let index = index as usize;
                    // Chunks are ordered by offset: the last one starting at or
                    // before `index` holds it, empty chunks included.
                    let chunk = starts.partition_point(|&start| start <= index) - 1;
                    let buffer = self.chunk_mut(chunk)?;
                    let source = WriteSource::rows(values, position..position + 1);
                    writes.push(PendingWrite::prepare(
                        chunk,
                        buffer,
                        vec![index - starts[chunk]],
                        tail,
                        source,
                    )?);
                }
            }
        }
        self.apply_writes(&writes)
    }
}
