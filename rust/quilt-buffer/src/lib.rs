//! Typed buffers: the chunk storage unit of quilt.
//!
//! A [`buffer::Buffer`] is a fixed-length, contiguous, row-major array of one
//! [`element_type::ElementType`], with an optional fixed trailing shape per element.
//! It provides the capability set a chunked array needs from each of its chunks:
//!
//! - length and element descriptor reporting;
//! - local get/set with a trailing sub-index ([`tail::TailIndex`]);
//! - row extraction with a local step, and planned row gathers and copies;
//! - concatenation with buffers of the same trailing shape;
//! - assignment with broadcasting ([`broadcast`]).
//!
//! Raw inputs (nested literal lists, Arrow arrays) are normalized into buffers by
//! [`chunk_input::ChunkInput::to_buffer`].

pub mod arrow_compat;
pub mod broadcast;
pub mod buffer;
pub mod chunk_input;
pub mod element_type;
pub mod scalar;
pub mod tail;
pub mod values;

pub use buffer::{Buffer, Item, PreparedWrite, WriteSource};
pub use chunk_input::{ChunkInput, Value};
pub use element_type::{ElementDescriptor, ElementType};
pub use scalar::{NativeElement, Scalar};
pub use tail::{ResolvedSlice, Slice, TailIndex, TailPlan};
