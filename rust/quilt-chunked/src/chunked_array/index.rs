use quilt_buffer::{Item, TailIndex};
use quilt_common::{Result, error::Error, reject_negative};

use super::{ChunkedArray, element_source};
use crate::selector::Assign;

impl ChunkedArray {
    /// Reads global position `index`.
    pub(super) fn get_index(&mut self, index: i64, tail: &[TailIndex]) -> Result<Item> {
        let index = reject_negative!(index);
        let mut end = 0;
        for chunk in self.chunk_iter() {
            let chunk = chunk?;
            end = chunk.end();
            if index < end {
                return chunk.buffer.get(index - chunk.offset, tail);
            }
        }
        Err(Error::out_of_bounds(index, end))
    }

    /// Writes global position `index`.
    pub(super) fn set_index(&mut self, index: i64, tail: &[TailIndex], value: &Assign) -> Result<()> {
        let index = reject_negative!(index);
        let source = element_source(value);
        let mut end = 0;
        for chunk in self.chunk_iter() {
            let chunk = chunk?;
            end = chunk.end();
            if index < end {
                return chunk.buffer.set(index - chunk.offset, tail, &source);
            }
        }
        Err(Error::out_of_bounds(index, end))
    }
}
