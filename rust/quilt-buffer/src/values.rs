//! A collection of values stored as bytes with alignment guarantees.

use arrow_buffer::MutableBuffer;

/// A collection of values stored as bytes with alignment guarantees.
///
/// `Values` wraps an Arrow `MutableBuffer` (64-byte aligned) and provides typed
/// views over the raw bytes. It carries no type information itself; the owning
/// [`Buffer`](crate::buffer::Buffer) knows the element type.
#[derive(Debug)]
pub struct Values(MutableBuffer);

impl Values {
    /// Creates a new, empty `Values` instance.
    pub fn new() -> Values {
        Values(MutableBuffer::new(0))
    }

    /// Creates a new `Values` instance with a specified byte capacity.
    pub fn with_byte_capacity(capacity: usize) -> Values {
        Values(MutableBuffer::with_capacity(capacity))
    }

    /// Creates a new `Values` instance filled with `bytes_len` zeroed bytes.
    pub fn zeroed_bytes(bytes_len: usize) -> Values {
        Values(MutableBuffer::from_len_zeroed(bytes_len))
    }

    /// Creates a new `Values` instance holding a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Values {
        let mut buf = MutableBuffer::with_capacity(bytes.len());
        buf.extend_from_slice(bytes);
        Values(buf)
    }

    /// Creates a new `Values` instance holding a copy of the typed `values`.
    pub fn from_slice<T>(values: &[T]) -> Values
    where
        T: bytemuck::NoUninit,
    {
        Values::from_bytes(bytemuck::cast_slice(values))
    }

    /// Checks if the container is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of bytes in the container.
    #[inline]
    pub fn bytes_len(&self) -> usize {
        self.0.len()
    }

    /// Returns a reference to the underlying bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Returns a mutable reference to the underlying bytes.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.0.as_slice_mut()
    }

    /// Interprets the underlying bytes as a slice of elements of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if the byte length is not a multiple of `size_of::<T>()`.
    #[inline]
    pub fn as_slice<T>(&self) -> &[T]
    where
        T: bytemuck::AnyBitPattern,
    {
        if self.0.is_empty() {
            return &[];
        }
        bytemuck::cast_slice(self.0.as_slice())
    }

    /// Appends raw bytes to the end of the container.
    #[inline]
    pub fn extend_from_bytes(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    /// Consumes the container and returns an immutable Arrow buffer sharing its memory.
    pub fn into_arrow_buffer(self) -> arrow_buffer::Buffer {
        self.0.into()
    }
}

impl Clone for Values {
    fn clone(&self) -> Self {
        Values::from_bytes(self.as_bytes())
    }
}

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Values {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}
