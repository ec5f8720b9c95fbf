//! Per-position chunk storage with lazy normalization.

use std::borrow::Cow;

use quilt_buffer::{Buffer, ChunkInput};
use quilt_common::Result;

/// One chunk of a chunked array, either as supplied or already normalized.
///
/// A `Raw` slot becomes a `Buffer` slot the first time it is reached by a
/// traversal and stays that way.
#[derive(Debug, Clone)]
pub enum ChunkSlot {
    Raw(ChunkInput),
    Buffer(Buffer),
}

impl ChunkSlot {
    /// Number of elements in the chunk. Does not normalize.
    pub fn len(&self) -> usize {
        match self {
            ChunkSlot::Raw(input) => input.len(),
            ChunkSlot::Buffer(buffer) => buffer.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, ChunkSlot::Buffer(_))
    }

    /// Normalizes the slot in place and returns its buffer.
    ///
    /// On a conversion error the slot is left raw.
    pub fn normalize(&mut self) -> Result<&mut Buffer> {
        if let ChunkSlot::Raw(input) = self {
            let buffer = input.to_buffer()?;
            log::trace!(
                "normalized raw chunk into {} elements of {}",
                buffer.len(),
                buffer.descriptor()
            );
            *self = ChunkSlot::Buffer(buffer);
        }
        match self {
            ChunkSlot::Buffer(buffer) => Ok(buffer),
            ChunkSlot::Raw(_) => unreachable!("slot normalized above"),
        }
    }

    /// The chunk as a buffer without touching the slot; raw inputs are converted
    /// into a temporary.
    pub fn view(&self) -> Result<Cow<'_, Buffer>> {
        match self {
            ChunkSlot::Raw(input) => input.to_buffer().map(Cow::Owned),
            ChunkSlot::Buffer(buffer) => Ok(Cow::Borrowed(buffer)),
        }
    }
}

impl From<ChunkInput> for ChunkSlot {
    fn from(input: ChunkInput) -> Self {
        match input {
            ChunkInput::Buffer(buffer) => ChunkSlot::Buffer(buffer),
            input => ChunkSlot::Raw(input),
        }
    }
}
