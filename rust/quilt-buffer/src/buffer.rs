//! A fixed-length, element-typed, randomly indexable chunk of values.

use std::{borrow::Cow, fmt, ops::Range};

use quilt_common::{Result, error::Error};

use crate::{
    broadcast::broadcast_map,
    element_type::{ElementDescriptor, ElementType},
    scalar::{NativeElement, Scalar, fmt_float},
    tail::{TailIndex, TailPlan},
    values::Values,
};

/// A contiguous, row-major array of one element type.
///
/// A buffer is always at least one-dimensional: `len` is the size of the leading
/// dimension and `inner_shape` is the fixed trailing shape of every element. The
/// values of row `i` occupy the byte range
/// `i * element_size()..(i + 1) * element_size()` of `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    element_type: ElementType,
    len: usize,
    inner_shape: Vec<usize>,
    values: Values,
}

/// The result of reading one position of a buffer or chunked array.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// A fully indexed single value.
    Scalar(Scalar),
    /// A sub-array (an element with a trailing shape, or any multi-row selection).
    Array(Buffer),
}

impl Item {
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Item::Scalar(s) => Some(*s),
            Item::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&Buffer> {
        match self {
            Item::Scalar(_) => None,
            Item::Array(b) => Some(b),
        }
    }

    /// Converts the item into a buffer; a scalar becomes a one-row buffer.
    pub fn into_buffer(self) -> Buffer {
        match self {
            Item::Scalar(s) => Buffer::from_scalars(s.natural_type(), &[s]),
            Item::Array(b) => b,
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Scalar(s) => write!(f, "{s}"),
            Item::Array(b) => write!(f, "{b}"),
        }
    }
}

/// A value prepared for assignment into a buffer region.
///
/// The source keeps its own element type; values are converted when written.
#[derive(Debug, Clone)]
pub struct WriteSource<'a> {
    element_type: ElementType,
    shape: Vec<usize>,
    bytes: Cow<'a, [u8]>,
}

impl<'a> WriteSource<'a> {
    /// A single value, broadcast to any target shape.
    pub fn scalar(value: Scalar) -> WriteSource<'static> {
        let element_type = value.natural_type();
        WriteSource {
            element_type,
            shape: Vec::new(),
            bytes: Cow::Owned(value.to_bytes(element_type)),
        }
    }

    /// The whole of `buffer`.
    pub fn buffer(buffer: &'a Buffer) -> WriteSource<'a> {
        WriteSource {
            element_type: buffer.element_type,
            shape: buffer.shape(),
            bytes: Cow::Borrowed(buffer.values.as_bytes()),
        }
    }

    /// The rows `rows` of `buffer`, keeping the leading dimension.
    pub fn rows(buffer: &'a Buffer, rows: Range<usize>) -> WriteSource<'a> {
        let mut shape = Vec::with_capacity(buffer.inner_shape.len() + 1);
        shape.push(rows.len());
        shape.extend_from_slice(&buffer.inner_shape);
        WriteSource {
            element_type: buffer.element_type,
            shape,
            bytes: Cow::Borrowed(buffer.rows_bytes(rows)),
        }
    }

    /// Row `row` of `buffer` without its leading dimension (a scalar for
    /// one-dimensional buffers).
    pub fn row(buffer: &'a Buffer, row: usize) -> WriteSource<'a> {
        WriteSource {
            element_type: buffer.element_type,
            shape: buffer.inner_shape.clone(),
            bytes: Cow::Borrowed(buffer.rows_bytes(row..row + 1)),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }
}

/// A validated assignment of a source onto `row_count` rows through a tail plan.
///
/// Produced by [`Buffer::prepare_write`]; applying it cannot fail.
#[derive(Debug, Clone)]
pub struct PreparedWrite {
    row_count: usize,
    map: Vec<usize>,
}

impl PreparedWrite {
    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

impl Buffer {
    /// Creates an empty buffer for the given element descriptor.
    pub fn empty(descriptor: &ElementDescriptor) -> Buffer {
        Buffer {
            element_type: descriptor.element_type,
            len: 0,
            inner_shape: descriptor.shape.clone(),
            values: Values::new(),
        }
    }

    /// Creates a buffer of `len` zeroed elements.
    pub fn zeroed(descriptor: &ElementDescriptor, len: usize) -> Buffer {
        Buffer {
            element_type: descriptor.element_type,
            len,
            inner_shape: descriptor.shape.clone(),
            values: Values::zeroed_bytes(len * descriptor.element_size()),
        }
    }

    /// Creates a buffer over existing values.
    ///
    /// `shape` is the full shape, including the leading dimension.
    ///
    /// # Errors
    ///
    /// Fails if `shape` is empty or if the byte length of `values` does not match it.
    pub fn try_new(element_type: ElementType, shape: &[usize], values: Values) -> Result<Buffer> {
        let Some((&len, inner)) = shape.split_first() else {
            return Err(Error::invalid_arg(
                "shape",
                "buffer must have at least one dimension",
            ));
        };
        let expected = shape.iter().product::<usize>() * element_type.size();
        if values.bytes_len() != expected {
            return Err(Error::invalid_arg(
                "values",
                format!(
                    "{} bytes do not match shape {shape:?} of {element_type}",
                    values.bytes_len()
                ),
            ));
        }
        Ok(Buffer {
            element_type,
            len,
            inner_shape: inner.to_vec(),
            values,
        })
    }

    /// Creates a one-dimensional buffer from a slice of native values.
    pub fn from_slice<T: NativeElement>(values: &[T]) -> Buffer {
        Buffer {
            element_type: T::ELEMENT_TYPE,
            len: values.len(),
            inner_shape: Vec::new(),
            values: Values::from_slice(values),
        }
    }

    /// Creates a buffer of the given full `shape` from row-major native values.
    pub fn from_slice_shaped<T: NativeElement>(values: &[T], shape: &[usize]) -> Result<Buffer> {
        Buffer::try_new(T::ELEMENT_TYPE, shape, Values::from_slice(values))
    }

    /// Creates a one-dimensional `Boolean` buffer.
    pub fn from_bools(values: &[bool]) -> Buffer {
        let bytes: Vec<u8> = values.iter().map(|&v| v as u8).collect();
        Buffer {
            element_type: ElementType::Boolean,
            len: values.len(),
            inner_shape: Vec::new(),
            values: Values::from_bytes(&bytes),
        }
    }

    /// Creates a one-dimensional buffer of `element_type`, converting each scalar.
    pub fn from_scalars(element_type: ElementType, values: &[Scalar]) -> Buffer {
        let size = element_type.size();
        let mut bytes = vec![0u8; values.len() * size];
        for (value, out) in values.iter().zip(bytes.chunks_exact_mut(size)) {
            value.write(element_type, out);
        }
        Buffer {
            element_type,
            len: values.len(),
            inner_shape: Vec::new(),
            values: Values::from_bytes(&bytes),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// The trailing shape shared by all elements.
    #[inline]
    pub fn inner_shape(&self) -> &[usize] {
        &self.inner_shape
    }

    /// The full shape, leading dimension first.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = Vec::with_capacity(self.inner_shape.len() + 1);
        shape.push(self.len);
        shape.extend_from_slice(&self.inner_shape);
        shape
    }

    /// Number of dimensions, including the leading one.
    pub fn ndim(&self) -> usize {
        self.inner_shape.len() + 1
    }

    pub fn descriptor(&self) -> ElementDescriptor {
        ElementDescriptor::new(self.element_type, self.inner_shape.clone())
    }

    /// Number of values in one element.
    #[inline]
    pub fn values_per_element(&self) -> usize {
        self.inner_shape.iter().product()
    }

    /// Number of bytes in one element.
    #[inline]
    pub fn element_size(&self) -> usize {
        self.values_per_element() * self.element_type.size()
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn into_values(self) -> Values {
        self.values
    }

    /// Typed view of all values, in row-major order.
    ///
    /// # Errors
    ///
    /// Fails if `T` does not match the element type.
    pub fn as_slice<T: NativeElement>(&self) -> Result<&[T]> {
        if T::ELEMENT_TYPE != self.element_type {
            return Err(Error::invalid_arg(
                "T",
                format!(
                    "requested {} view of a {} buffer",
                    T::ELEMENT_TYPE,
                    self.element_type
                ),
            ));
        }
        Ok(self.values.as_slice())
    }

    /// All values as booleans, in row-major order.
    pub fn to_bools(&self) -> Vec<bool> {
        self.scalars().map(|s| s.as_bool()).collect()
    }

    /// All values as scalars, in row-major order.
    pub fn scalars(&self) -> impl ExactSizeIterator<Item = Scalar> + '_ {
        let element_type = self.element_type;
        self.values
            .as_bytes()
            .chunks_exact(element_type.size())
            .map(move |bytes| Scalar::read(element_type, bytes))
    }

    /// Value at flat (row-major) position `pos`.
    pub fn scalar_at(&self, pos: usize) -> Scalar {
        let size = self.element_type.size();
        Scalar::read(self.element_type, &self.values.as_bytes()[pos * size..])
    }

    fn rows_bytes(&self, rows: Range<usize>) -> &[u8] {
        let size = self.element_size();
        &self.values.as_bytes()[rows.start * size..rows.end * size]
    }

    /// Resolves a trailing sub-index against this buffer's element shape.
    pub fn tail_plan(&self, tail: &[TailIndex]) -> Result<TailPlan> {
        TailPlan::new(&self.inner_shape, tail)
    }

    /// Reads row `row` with the trailing sub-index `tail`.
    ///
    /// Yields [`Item::Scalar`] when every dimension of the element is indexed.
    ///
    /// # Errors
    ///
    /// Fails with an index error if `row` is out of range or `tail` does not
    /// resolve against the element shape.
    pub fn get(&self, row: usize, tail: &[TailIndex]) -> Result<Item> {
        if row >= self.len {
            return Err(Error::out_of_bounds(row, self.len));
        }
        let plan = self.tail_plan(tail)?;
        Ok(self.get_planned(row, &plan))
    }

    /// Reads row `row` through a prepared tail plan. `row` must be in range.
    pub fn get_planned(&self, row: usize, plan: &TailPlan) -> Item {
        if plan.out_shape().is_empty() {
            let base = row * self.values_per_element();
            return Item::Scalar(self.scalar_at(base + plan.offsets()[0]));
        }
        // One gathered row of shape `out_shape` has the same bytes as a buffer of that shape.
        let element = self.take_planned(std::iter::once(row), plan);
        let shape = plan.out_shape();
        Item::Array(Buffer {
            element_type: self.element_type,
            len: shape[0],
            inner_shape: shape[1..].to_vec(),
            values: element.values,
        })
    }

    /// Iterates all rows as items.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = Item> + '_ {
        let plan = TailPlan::identity(&self.inner_shape);
        (0..self.len).map(move |row| self.get_planned(row, &plan))
    }

    /// Gathers `rows` (in the given order) into a new buffer, applying `plan` to each
    /// element. Every row must be in range.
    pub fn take_planned(
        &self,
        rows: impl ExactSizeIterator<Item = usize>,
        plan: &TailPlan,
    ) -> Buffer {
        let count = rows.len();
        let size = self.element_type.size();
        let out_element_size = plan.values_per_element() * size;
        let mut values = Values::with_byte_capacity(count * out_element_size);
        if plan.is_identity() {
            for row in rows {
                values.extend_from_bytes(self.rows_bytes(row..row + 1));
            }
        } else {
            let bytes = self.values.as_bytes();
            let element_values = self.values_per_element();
            for row in rows {
                let base = row * element_values;
                for &offset in plan.offsets() {
                    let start = (base + offset) * size;
                    values.extend_from_bytes(&bytes[start..start + size]);
                }
            }
        }
        Buffer {
            element_type: self.element_type,
            len: count,
            inner_shape: plan.out_shape().to_vec(),
            values,
        }
    }

    /// Extracts the local rows `range` with a unit step, optionally reversed.
    ///
    /// # Panics
    ///
    /// Panics if `range` exceeds the buffer length.
    pub fn slice_rows(&self, range: Range<usize>, reverse: bool, plan: &TailPlan) -> Buffer {
        assert!(range.end <= self.len, "row range {range:?} exceeds {}", self.len);
        if reverse {
            self.take_planned(range.rev(), plan)
        } else {
            self.take_planned(range, plan)
        }
    }

    /// Keeps every `step`-th row, starting with the first.
    pub fn step_by(&self, step: usize) -> Buffer {
        if step <= 1 {
            return self.clone();
        }
        self.take_planned(
            (0..self.len).step_by(step),
            &TailPlan::identity(&self.inner_shape),
        )
    }

    /// Returns a copy of this buffer with values converted to `element_type`.
    pub fn cast(&self, element_type: ElementType) -> Buffer {
        if element_type == self.element_type {
            return self.clone();
        }
        let size = element_type.size();
        let mut bytes = vec![0u8; self.values_per_element() * self.len * size];
        for (value, out) in self.scalars().zip(bytes.chunks_exact_mut(size)) {
            value.write(element_type, out);
        }
        Buffer {
            element_type,
            len: self.len,
            inner_shape: self.inner_shape.clone(),
            values: Values::from_bytes(&bytes),
        }
    }

    /// Concatenates buffers along the leading dimension into freshly allocated storage.
    ///
    /// The element type of the first buffer wins; the others are converted.
    ///
    /// # Errors
    ///
    /// Fails with a shape mismatch if the buffers have different trailing shapes,
    /// and with an invalid argument error if `buffers` is empty.
    pub fn concat(buffers: &[Buffer]) -> Result<Buffer> {
        let Some(first) = buffers.first() else {
            return Err(Error::invalid_arg("buffers", "nothing to concatenate"));
        };
        let total: usize = buffers.iter().map(Buffer::len).sum();
        let mut values = Values::with_byte_capacity(total * first.element_size());
        for buffer in buffers {
            if buffer.inner_shape != first.inner_shape {
                return Err(Error::shape_mismatch(&buffer.shape(), &first.shape()));
            }
            if buffer.element_type == first.element_type {
                values.extend_from_bytes(buffer.values.as_bytes());
            } else {
                values.extend_from_bytes(buffer.cast(first.element_type).values.as_bytes());
            }
        }
        Ok(Buffer {
            element_type: first.element_type,
            len: total,
            inner_shape: first.inner_shape.clone(),
            values,
        })
    }

    /// Copies whole rows of `src` into rows of `self`, converting element types if
    /// they differ. `src_rows` and `dst_rows` must have equal lengths and be in range,
    /// and both buffers must share the same element shape.
    pub fn copy_rows_from(
        &mut self,
        dst_rows: impl Iterator<Item = usize>,
        src: &Buffer,
        src_rows: impl Iterator<Item = usize>,
    ) {
        debug_assert_eq!(self.inner_shape, src.inner_shape);
        let dst_size = self.element_size();
        let same_type = self.element_type == src.element_type;
        let dst_type = self.element_type;
        let dst_bytes = self.values.as_bytes_mut();
        for (dst_row, src_row) in dst_rows.zip(src_rows) {
            let src_bytes = src.rows_bytes(src_row..src_row + 1);
            let out = &mut dst_bytes[dst_row * dst_size..(dst_row + 1) * dst_size];
            if same_type {
                out.copy_from_slice(src_bytes);
            } else {
                let src_size = src.element_type.size();
                for (value, out) in src_bytes
                    .chunks_exact(src_size)
                    .zip(out.chunks_exact_mut(dst_type.size()))
                {
                    Scalar::read(src.element_type, value).write(dst_type, out);
                }
            }
        }
    }

    /// Validates an assignment of `source` onto `row_count` rows selected through
    /// `plan`, following the broadcast rule.
    ///
    /// # Errors
    ///
    /// Fails with a shape mismatch if the source cannot be broadcast to the shape
    /// `[row_count, plan.out_shape()...]`.
    pub fn prepare_write(
        &self,
        row_count: usize,
        plan: &TailPlan,
        source: &WriteSource,
    ) -> Result<PreparedWrite> {
        let mut target = Vec::with_capacity(plan.out_shape().len() + 1);
        target.push(row_count);
        target.extend_from_slice(plan.out_shape());
        let map = broadcast_map(&source.shape, &target)?;
        Ok(PreparedWrite { row_count, map })
    }

    /// Applies a prepared write. `rows` must yield exactly `prepared.row_count()`
    /// in-range rows.
    pub fn apply_write(
        &mut self,
        rows: impl Iterator<Item = usize>,
        plan: &TailPlan,
        source: &WriteSource,
        prepared: &PreparedWrite,
    ) {
        let size = self.element_type.size();
        let src_size = source.element_type.size();
        let same_type = source.element_type == self.element_type;
        let element_values = self.values_per_element();
        let out_values = plan.values_per_element();
        let dst_type = self.element_type;
        let bytes = self.values.as_bytes_mut();
        for (k, row) in rows.enumerate().take(prepared.row_count) {
            let base = row * element_values;
            for (j, &offset) in plan.offsets().iter().enumerate() {
                let src_pos = prepared.map[k * out_values + j];
                let src = &source.bytes[src_pos * src_size..(src_pos + 1) * src_size];
                let dst_pos = (base + offset) * size;
                let out = &mut bytes[dst_pos..dst_pos + size];
                if same_type {
                    out.copy_from_slice(src);
                } else {
                    Scalar::read(source.element_type, src).write(dst_type, out);
                }
            }
        }
    }

    /// Writes `source` into row `row` with the trailing sub-index `tail`.
    ///
    /// # Errors
    ///
    /// Fails with an index error for an out-of-range row or invalid tail, and with a
    /// shape mismatch if the source does not broadcast onto the indexed region.
    pub fn set(&mut self, row: usize, tail: &[TailIndex], source: &WriteSource) -> Result<()> {
        if row >= self.len {
            return Err(Error::out_of_bounds(row, self.len));
        }
        let plan = self.tail_plan(tail)?;
        // The region of a single row excludes the leading dimension.
        let target = plan.out_shape();
        let map = broadcast_map(&source.shape, target)?;
        let prepared = PreparedWrite { row_count: 1, map };
        self.apply_write(std::iter::once(row), &plan, source, &prepared);
        Ok(())
    }

    fn fmt_values(&self, f: &mut fmt::Formatter<'_>, shape: &[usize], start: usize) -> fmt::Result {
        match shape.split_first() {
            None => {
                let offset = start * self.element_type.size();
                fmt_value(f, self.element_type, &self.values.as_bytes()[offset..])
            }
            Some((&dim, rest)) => {
                let stride: usize = rest.iter().product();
                f.write_str("[")?;
                for i in 0..dim {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    self.fmt_values(f, rest, start + i * stride)?;
                }
                f.write_str("]")
            }
        }
    }
}

fn fmt_value(f: &mut fmt::Formatter<'_>, element_type: ElementType, bytes: &[u8]) -> fmt::Result {
    match element_type {
        ElementType::Float32 => fmt_float(f, bytemuck::pod_read_unaligned::<f32>(&bytes[..4])),
        _ => write!(f, "{}", Scalar::read(element_type, bytes)),
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_values(f, &self.shape(), 0)
    }
}

impl<T: NativeElement> From<Vec<T>> for Buffer {
    fn from(values: Vec<T>) -> Self {
        Buffer::from_slice(&values)
    }
}

impl<T: NativeElement> From<&[T]> for Buffer {
    fn from(values: &[T]) -> Self {
        Buffer::from_slice(values)
    }
}
