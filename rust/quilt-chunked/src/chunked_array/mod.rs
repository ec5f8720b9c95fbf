//! The chunked array and its selector dispatch.
//!
//! Each selector form has its own submodule with the read and write paths.
//! All of them share the same shape: walk the chunks with a [`ChunkIter`],
//! translate the selection into chunk-local rows, then read or write through
//! the chunk buffers.
//!
//! Writes go through two passes. The first pass normalizes the touched chunks,
//! resolves every target and validates every assignment, collecting a list of
//! [`PendingWrite`]s. The second pass applies them and cannot fail, so a
//! rejected write leaves the array unchanged.

use std::ops::Range;

use quilt_buffer::{
    Buffer, ChunkInput, ElementDescriptor, Item, PreparedWrite, Slice, TailIndex, TailPlan,
    WriteSource,
};
use quilt_common::{
    Result,
    error::{Error, ErrorKind},
};

use crate::{
    chunk_iter::{ChunkIter, ElementIter},
    fragment::ChunkExtent,
    options::ChunkedArrayOptions,
    selector::{Assign, Selector},
    slot::ChunkSlot,
};

mod index;
mod indices;
mod mask;
mod preview;
mod slice;

/// A logically contiguous array over a list of independently allocated chunks.
///
/// Global position `g` lives in the chunk whose offset range contains it, at
/// local position `g - offset`. Chunks are normalized lazily: a raw chunk input
/// is converted into a [`Buffer`] the first time an operation walks past it.
///
/// Every operation takes `&mut self`, reads included, since a traversal may
/// normalize chunks in place.
#[derive(Debug, Clone)]
pub struct ChunkedArray {
    chunks: Vec<ChunkSlot>,
    options: ChunkedArrayOptions,
}

impl ChunkedArray {
    /// Creates a chunked array with default options.
    pub fn new<I>(chunks: I) -> ChunkedArray
    where
        I: IntoIterator,
        I::Item: Into<ChunkInput>,
    {
        ChunkedArray {
            chunks: chunks
                .into_iter()
                .map(|chunk| ChunkSlot::from(chunk.into()))
                .collect(),
            options: ChunkedArrayOptions::default(),
        }
    }

    /// Creates a chunked array with the given options.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `options` fail validation.
    pub fn with_options<I>(chunks: I, options: ChunkedArrayOptions) -> Result<ChunkedArray>
    where
        I: IntoIterator,
        I::Item: Into<ChunkInput>,
    {
        options.validate()?;
        let mut array = ChunkedArray::new(chunks);
        array.options = options;
        Ok(array)
    }

    pub fn options(&self) -> &ChunkedArrayOptions {
        &self.options
    }

    pub fn writeable(&self) -> bool {
        self.options.writeable
    }

    pub fn set_writeable(&mut self, writeable: bool) {
        self.options.writeable = writeable;
    }

    /// Total number of elements across all chunks.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(ChunkSlot::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(ChunkSlot::is_empty)
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[ChunkSlot] {
        &self.chunks
    }

    /// Global position of the first element of every chunk.
    pub fn chunk_offsets(&self) -> Vec<usize> {
        self.chunks
            .iter()
            .scan(0, |offset, slot| {
                let start = *offset;
                *offset += slot.len();
                Some(start)
            })
            .collect()
    }

    /// Appends a chunk after the last one.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error if the array was created non-appendable.
    pub fn push_chunk(&mut self, chunk: impl Into<ChunkInput>) -> Result<()> {
        if !self.options.appendable {
            return Err(Error::invalid_arg("chunk", "array is not appendable"));
        }
        self.chunks.push(ChunkSlot::from(chunk.into()));
        Ok(())
    }

    /// The element descriptor of the first non-empty chunk.
    ///
    /// # Errors
    ///
    /// Fails with an empty array error if no chunk has elements.
    pub fn element_type(&mut self) -> Result<ElementDescriptor> {
        self.first_descriptor()?
            .ok_or_else(|| ErrorKind::EmptyArray { what: "element type" }.into())
    }

    /// The trailing shape of one element.
    ///
    /// # Errors
    ///
    /// Fails with an empty array error if no chunk has elements.
    pub fn dimension(&mut self) -> Result<Vec<usize>> {
        match self.first_descriptor()? {
            Some(descriptor) => Ok(descriptor.shape),
            None => Err(ErrorKind::EmptyArray { what: "dimension" }.into()),
        }
    }

    /// Reads the elements selected by `selector`.
    ///
    /// A single index yields one element; every other selector yields an array.
    pub fn get(&mut self, selector: impl Into<Selector>) -> Result<Item> {
        self.get_with(selector, &[])
    }

    /// Reads the elements selected by `selector`, applying `tail` to each of them.
    pub fn get_with(&mut self, selector: impl Into<Selector>, tail: &[TailIndex]) -> Result<Item> {
        match selector.into() {
            Selector::Index(index) => self.get_index(index, tail),
            Selector::Slice(slice) => self.get_slice(&slice, tail).map(Item::Array),
            Selector::Indices(indices) => self.get_indices(&indices, tail).map(Item::Array),
            Selector::Mask(mask) => self.get_mask(&mask, tail).map(Item::Array),
            array @ Selector::Array(_) => {
                let selector = array.classify(self.len())?;
                self.get_with(selector, tail)
            }
        }
    }

    /// Assigns `value` to the elements selected by `selector`.
    pub fn set(&mut self, selector: impl Into<Selector>, value: impl Into<Assign>) -> Result<()> {
        self.set_with(selector, &[], value)
    }

    /// Assigns `value` to the part `tail` of each element selected by `selector`.
    ///
    /// # Errors
    ///
    /// Fails with a not-writeable error before anything else when writes are
    /// disabled. Index and shape errors are detected before any element is
    /// modified.
    pub fn set_with(
        &mut self,
        selector: impl Into<Selector>,
        tail: &[TailIndex],
        value: impl Into<Assign>,
    ) -> Result<()> {
        if !self.options.writeable {
            return Err(Error::not_writeable());
        }
        let value = value.into();
        self.assign(selector.into(), tail, &value)
    }

    fn assign(&mut self, selector: Selector, tail: &[TailIndex], value: &Assign) -> Result<()> {
        match selector {
            Selector::Index(index) => self.set_index(index, tail, value),
            Selector::Slice(slice) => self.set_slice(&slice, tail, value),
            Selector::Indices(indices) => self.set_indices(&indices, tail, value),
            Selector::Mask(mask) => self.set_mask(&mask, tail, value),
            array @ Selector::Array(_) => {
                let selector = array.classify(self.len())?;
                self.assign(selector, tail, value)
            }
        }
    }

    /// Materializes the whole array into one freshly allocated buffer.
    pub fn to_buffer(&mut self) -> Result<Buffer> {
        self.get_slice(&Slice::full(), &[])
    }

    /// Iterates the elements in global order, normalizing chunks as they are reached.
    pub fn iter(&mut self) -> ElementIter<'_> {
        ElementIter::new(self.chunk_iter())
    }

    pub(crate) fn chunk_iter(&mut self) -> ChunkIter<'_> {
        ChunkIter::new(&mut self.chunks)
    }

    /// Positions and lengths of the chunks, normalizing them as they are pulled.
    fn extents(&mut self) -> impl Iterator<Item = Result<ChunkExtent>> + '_ {
        self.chunk_iter().map(|chunk| {
            chunk.map(|chunk| ChunkExtent {
                chunk: chunk.index,
                offset: chunk.offset,
                len: chunk.len(),
            })
        })
    }

    /// A chunk already reached by a traversal of the current operation.
    fn chunk_mut(&mut self, chunk: usize) -> Result<&mut Buffer> {
        self.chunks[chunk].normalize()
    }

    fn first_descriptor(&mut self) -> Result<Option<ElementDescriptor>> {
        for chunk in self.chunk_iter() {
            let chunk = chunk?;
            if !chunk.is_empty() {
                return Ok(Some(chunk.buffer.descriptor()));
            }
        }
        Ok(None)
    }

    /// The zero-length result of a selection that matched nothing.
    ///
    /// Carries the element type of the first non-empty chunk with `tail`
    /// applied to its shape, or `Float64` when every chunk is empty.
    fn empty_result(&mut self, tail: &[TailIndex]) -> Result<Buffer> {
        match self.first_descriptor()? {
            Some(descriptor) => {
                let plan = TailPlan::new(&descriptor.shape, tail)?;
                Ok(Buffer::empty(&ElementDescriptor::new(
                    descriptor.element_type,
                    plan.out_shape().to_vec(),
                )))
            }
            None => Ok(Buffer::empty(&ElementDescriptor::default())),
        }
    }

    /// Applies validated writes in order.
    fn apply_writes(&mut self, writes: &[PendingWrite]) -> Result<()> {
        for write in writes {
            let buffer = self.chunk_mut(write.chunk)?;
            buffer.apply_write(
                write.rows.iter().copied(),
                &write.plan,
                &write.source,
                &write.prepared,
            );
        }
        Ok(())
    }
}

/// One validated assignment into a chunk, produced by the first pass of a write.
struct PendingWrite<'a> {
    chunk: usize,
    rows: Vec<usize>,
    plan: TailPlan,
    source: WriteSource<'a>,
    prepared: PreparedWrite,
}

impl<'a> PendingWrite<'a> {
    /// Resolves `tail` against `buffer` and validates `source` for `rows`.
    fn prepare(
        chunk: usize,
        buffer: &Buffer,
        rows: Vec<usize>,
        tail: &[TailIndex],
        source: WriteSource<'a>,
    ) -> Result<PendingWrite<'a>> {
        let plan = buffer.tail_plan(tail)?;
        let prepared = buffer.prepare_write(rows.len(), &plan, &source)?;
        Ok(PendingWrite {
            chunk,
            rows,
            plan,
            source,
            prepared,
        })
    }
}

/// How an assigned value is spread over `count` selected positions.
enum Feed<'a> {
    /// The same value for every position.
    Broadcast(WriteSource<'a>),
    /// One row of the sequence per position, in selection order.
    Sequence(&'a Buffer),
}

impl<'a> Feed<'a> {
    /// Decides between broadcasting and consuming `value`.
    ///
    /// # Errors
    ///
    /// Fails with a count mismatch when `value` is a sequence whose length is
    /// neither one nor `count`.
    fn new(value: &'a Assign, count: usize) -> Result<Feed<'a>> {
        match value {
            Assign::Scalar(scalar) => Ok(Feed::Broadcast(WriteSource::scalar(*scalar))),
            Assign::Array(buffer) if buffer.len() == 1 => {
                Ok(Feed::Broadcast(WriteSource::row(buffer, 0)))
            }
            Assign::Array(buffer) if buffer.len() == count => Ok(Feed::Sequence(buffer)),
            Assign::Array(buffer) => Err(Error::count_mismatch(buffer.len(), count)),
        }
    }

    /// The source for the selected positions `positions` (in selection order).
    fn source(&self, positions: Range<usize>) -> WriteSource<'a> {
        match self {
            Feed::Broadcast(source) => source.clone(),
            Feed::Sequence(buffer) => WriteSource::rows(buffer, positions),
        }
    }
}

/// The assignment source for a single element.
fn element_source(value: &Assign) -> WriteSource<'_> {
    match value {
        Assign::Scalar(scalar) => WriteSource::scalar(*scalar),
        Assign::Array(buffer) => WriteSource::buffer(buffer),
    }
}

/// Checks that two chunks can contribute rows to the same result.
fn check_inner_shape(out: &Buffer, chunk: &Buffer) -> Result<()> {
    if out.inner_shape() != chunk.inner_shape() {
        return Err(Error::shape_mismatch(&chunk.shape(), &out.shape()));
    }
    Ok(())
}

/// Applies `tail` to every row of a gathered result.
fn apply_tail(out: Buffer, tail: &[TailIndex]) -> Result<Buffer> {
    let plan = out.tail_plan(tail)?;
    if plan.is_identity() {
        Ok(out)
    } else {
        Ok(out.take_planned(0..out.len(), &plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quilt_buffer::ElementType;
    use quilt_common::error::ErrorCategory;

    fn sample() -> ChunkedArray {
        ChunkedArray::new(vec![vec![1, 2, 3], vec![], vec![4, 5]])
    }

    #[test]
    fn test_lengths_and_offsets() {
        let array = sample();
        assert_eq!(array.len(), 5);
        assert!(!array.is_empty());
        assert_eq!(array.num_chunks(), 3);
        assert_eq!(array.chunk_offsets(), vec![0, 3, 3]);
        assert!(ChunkedArray::new(Vec::<ChunkInput>::new()).is_empty());
    }

    #[test]
    fn test_element_type_from_first_non_empty_chunk() {
        let mut array = ChunkedArray::new(vec![
            ChunkInput::from(Buffer::from_slice::<f32>(&[])),
            ChunkInput::from(Buffer::from_slice(&[1u16, 2])),
        ]);
        assert_eq!(
            array.element_type().unwrap(),
            ElementDescriptor::scalar(ElementType::UInt16)
        );
        assert_eq!(array.dimension().unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn test_empty_array_errors() {
        let mut array = ChunkedArray::new(vec![Vec::<i64>::new(), Vec::new()]);
        let err = array.element_type().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::EmptyArray);
        let err = array.dimension().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::EmptyArray);

        let empty = array.to_buffer().unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.descriptor(), ElementDescriptor::default());
    }

    #[test]
    fn test_options() {
        let options = ChunkedArrayOptions::default().append_size(0);
        let err = ChunkedArray::with_options(vec![vec![1]], options).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let options = ChunkedArrayOptions::default().appendable(false);
        let mut array = ChunkedArray::with_options(vec![vec![1]], options).unwrap();
        assert!(array.push_chunk(vec![2]).is_err());
        assert_eq!(array.len(), 1);
    }

    #[test]
    fn test_push_chunk() {
        let mut array = sample();
        array.push_chunk(vec![6, 7]).unwrap();
        assert_eq!(array.len(), 7);
        assert_eq!(array.get(6).unwrap().as_scalar().unwrap().as_i64(), 7);
    }

    #[test]
    fn test_not_writeable() {
        let mut array = sample();
        array.set_writeable(false);
        assert!(!array.writeable());
        for result in [
            array.set(0, 1),
            array.set(10, 1),
            array.set(Selector::Index(-1), 1),
            array.set(.., 1),
            array.set(vec![0i64], 1),
            array.set(vec![true], 1),
            array.set(Buffer::from_slice(&[0.5f64]), 1),
        ] {
            assert_eq!(result.unwrap_err().category(), ErrorCategory::NotWriteable);
        }
        assert_eq!(array.to_buffer().unwrap().as_slice::<i64>().unwrap(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_feed() {
        let single = Assign::from(vec![7i64]);
        assert!(matches!(Feed::new(&single, 4).unwrap(), Feed::Broadcast(_)));
        let exact = Assign::from(vec![1i64, 2, 3]);
        assert!(matches!(Feed::new(&exact, 3).unwrap(), Feed::Sequence(_)));
        let err = Feed::new(&exact, 2).err().unwrap();
        assert_eq!(err.category(), ErrorCategory::ShapeMismatch);
        assert!(matches!(Feed::new(&Assign::from(1), 0).unwrap(), Feed::Broadcast(_)));
    }

    #[test]
    fn test_iter() {
        let mut array = sample();
        let values: Vec<i64> = array
            .iter()
            .map(|item| item.unwrap().as_scalar().unwrap().as_i64())
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }
}
