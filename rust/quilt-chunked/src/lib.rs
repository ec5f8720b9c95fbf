//! A randomly addressable sequence over independently allocated chunks.
//!
//! [`ChunkedArray`] presents a list of [`Buffer`](quilt_buffer::Buffer) chunks as
//! one logically contiguous array without merging them. Reads and writes are
//! addressed with a [`Selector`] over the global index space (a single index, a
//! slice with an optional negative step, an integer index array or a boolean
//! mask), optionally followed by a trailing [`TailIndex`](quilt_buffer::TailIndex)
//! applied inside each element. The engine translates the selection into
//! chunk-local operations and touches only the chunks it needs.
//!
//! ```
//! use quilt_buffer::Slice;
//! use quilt_chunked::ChunkedArray;
//!
//! let mut array = ChunkedArray::new(vec![vec![1, 2, 3], vec![], vec![4, 5]]);
//! let reversed = array.get(Slice::step_only(-1)).unwrap();
//! assert_eq!(reversed.to_string(), "[5 4 3 2 1]");
//!
//! array.set(vec![0i64, 4], 0).unwrap();
//! assert_eq!(array.to_string(), "[0 2 3 4 0]");
//! ```

pub mod chunk_iter;
pub mod chunked_array;
pub mod fragment;
pub mod options;
pub mod selector;
pub mod slot;

pub use chunked_array::ChunkedArray;
pub use options::ChunkedArrayOptions;
pub use selector::{Assign, Selector};
pub use slot::ChunkSlot;
