//! Raw chunk inputs and their normalization into buffers.
//!
//! A chunked array accepts chunks in several representations: nested literal
//! lists, Arrow arrays, or ready-made buffers. [`ChunkInput::to_buffer`] is the
//! single, deterministic conversion from any of them into a [`Buffer`]; converting
//! a buffer input is the identity, so normalization is idempotent.

use arrow_array::ArrayRef;
use quilt_common::{Result, error::Error, verify_chunk};

use crate::{
    arrow_compat,
    buffer::Buffer,
    element_type::ElementType,
    scalar::Scalar,
    values::Values,
};

/// A literal value used to describe list-like chunk inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<Value>),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

/// Anything that can be normalized into a chunk buffer.
#[derive(Debug, Clone)]
pub enum ChunkInput {
    /// A list of literal values; nested lists define the trailing shape.
    Values(Vec<Value>),
    /// An Arrow primitive, boolean or fixed-size-list array without nulls.
    Arrow(ArrayRef),
    /// An already normalized buffer.
    Buffer(Buffer),
}

impl ChunkInput {
    /// Number of elements (the leading dimension) this input will normalize to.
    pub fn len(&self) -> usize {
        match self {
            ChunkInput::Values(values) => values.len(),
            ChunkInput::Arrow(array) => array.len(),
            ChunkInput::Buffer(buffer) => buffer.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts this input into its canonical buffer representation.
    ///
    /// List inputs follow these rules: nested lists must be rectangular; the element
    /// type is `Boolean` if every leaf is a boolean, `Int64` if every leaf is a
    /// boolean or an integer, and `Float64` otherwise (including lists without any
    /// leaves); the nesting depth below the top level gives the trailing shape.
    ///
    /// # Errors
    ///
    /// Fails with an invalid chunk error for ragged lists, Arrow arrays with nulls
    /// or unsupported Arrow data types.
    pub fn to_buffer(&self) -> Result<Buffer> {
        match self {
            ChunkInput::Values(values) => list_to_buffer(values),
            ChunkInput::Arrow(array) => arrow_compat::array_to_buffer(array.as_ref()),
            ChunkInput::Buffer(buffer) => Ok(buffer.clone()),
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for ChunkInput {
    fn from(values: Vec<T>) -> Self {
        ChunkInput::Values(values.into_iter().map(Into::into).collect())
    }
}

impl From<Buffer> for ChunkInput {
    fn from(buffer: Buffer) -> Self {
        ChunkInput::Buffer(buffer)
    }
}

impl From<ArrayRef> for ChunkInput {
    fn from(array: ArrayRef) -> Self {
        ChunkInput::Arrow(array)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LeafKind {
    Bool,
    Int,
    Float,
}

fn list_to_buffer(values: &[Value]) -> Result<Buffer> {
    let mut shape = vec![values.len()];
    let mut kind = None;
    if let Some(first) = values.first() {
        shape.extend(value_shape(first));
    }
    for value in values {
        check_shape(value, &shape[1..])?;
        leaf_kind(value, &mut kind);
    }

    let element_type = match kind {
        Some(LeafKind::Bool) => ElementType::Boolean,
        Some(LeafKind::Int) => ElementType::Int64,
        Some(LeafKind::Float) | None => ElementType::Float64,
    };

    let size = element_type.size();
    let mut leaves = Vec::with_capacity(shape.iter().product());
    for value in values {
        collect_leaves(value, &mut leaves);
    }
    let mut bytes = vec![0u8; leaves.len() * size];
    for (leaf, out) in leaves.iter().zip(bytes.chunks_exact_mut(size)) {
        leaf.write(element_type, out);
    }
    Buffer::try_new(element_type, &shape, Values::from_bytes(&bytes))
}

/// Shape implied by following the first child at every nesting level.
fn value_shape(value: &Value) -> Vec<usize> {
    let mut shape = Vec::new();
    let mut current = value;
    while let Value::List(children) = current {
        shape.push(children.len());
        match children.first() {
            Some(child) => current = child,
            None => break,
        }
    }
    shape
}

fn check_shape(value: &Value, shape: &[usize]) -> Result<()> {
    match (value, shape.split_first()) {
        (Value::List(children), Some((&dim, rest))) => {
            verify_chunk!(
                children.len() == dim,
                "ragged nested lists: expected {dim} values, found {}",
                children.len()
            );
            children.iter().try_for_each(|child| check_shape(child, rest))
        }
        (Value::List(children), None) => Err(Error::invalid_chunk(format!(
            "ragged nested lists: expected a single value, found a list of {}",
            children.len()
        ))),
        (_, Some(_)) => Err(Error::invalid_chunk(
            "ragged nested lists: expected a list, found a single value",
        )),
        (_, None) => Ok(()),
    }
}

fn leaf_kind(value: &Value, kind: &mut Option<LeafKind>) {
    let leaf = match value {
        Value::Bool(_) => LeafKind::Bool,
        Value::Int(_) => LeafKind::Int,
        Value::Float(_) => LeafKind::Float,
        Value::List(children) => {
            children.iter().for_each(|child| leaf_kind(child, kind));
            return;
        }
    };
    *kind = Some(kind.map_or(leaf, |k| k.max(leaf)));
}

fn collect_leaves(value: &Value, out: &mut Vec<Scalar>) {
    match value {
        Value::Bool(v) => out.push(Scalar::Bool(*v)),
        Value::Int(v) => out.push(Scalar::Int(*v)),
        Value::Float(v) => out.push(Scalar::Float(*v)),
        Value::List(children) => children.iter().for_each(|child| collect_leaves(child, out)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quilt_common::error::ErrorCategory;

    #[test]
    fn test_integer_list() {
        let buffer = ChunkInput::from(vec![1, 2, 3]).to_buffer().unwrap();
        assert_eq!(buffer.element_type(), ElementType::Int64);
        assert_eq!(buffer.as_slice::<i64>().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_type_promotion() {
        let input = ChunkInput::Values(vec![Value::Bool(true), Value::Int(2)]);
        let buffer = input.to_buffer().unwrap();
        assert_eq!(buffer.element_type(), ElementType::Int64);
        assert_eq!(buffer.as_slice::<i64>().unwrap(), &[1, 2]);

        let input = ChunkInput::Values(vec![Value::Int(1), Value::Float(2.5)]);
        let buffer = input.to_buffer().unwrap();
        assert_eq!(buffer.as_slice::<f64>().unwrap(), &[1.0, 2.5]);

        let buffer = ChunkInput::from(vec![true, false]).to_buffer().unwrap();
        assert_eq!(buffer.element_type(), ElementType::Boolean);
        assert_eq!(buffer.to_bools(), vec![true, false]);
    }

    #[test]
    fn test_empty_lists_default_to_float() {
        let buffer = ChunkInput::Values(vec![]).to_buffer().unwrap();
        assert_eq!(buffer.element_type(), ElementType::Float64);
        assert_eq!(buffer.shape(), vec![0]);

        let input = ChunkInput::from(vec![Vec::<i64>::new(), Vec::new()]);
        let buffer = input.to_buffer().unwrap();
        assert_eq!(buffer.shape(), vec![2, 0]);
        assert_eq!(buffer.element_type(), ElementType::Float64);
    }

    #[test]
    fn test_nested_lists() {
        let input = ChunkInput::from(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(input.len(), 2);
        let buffer = input.to_buffer().unwrap();
        assert_eq!(buffer.shape(), vec![2, 3]);
        assert_eq!(buffer.as_slice::<i64>().unwrap(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_ragged_lists() {
        let input = ChunkInput::from(vec![vec![1, 2], vec![3]]);
        let err = input.to_buffer().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let input = ChunkInput::Values(vec![Value::Int(1), Value::List(vec![Value::Int(2)])]);
        assert!(input.to_buffer().is_err());
        let input = ChunkInput::Values(vec![Value::List(vec![Value::Int(2)]), Value::Int(1)]);
        assert!(input.to_buffer().is_err());
    }

    #[test]
    fn test_buffer_input_is_identity() {
        let buffer = Buffer::from_slice(&[1u32, 2]);
        let input = ChunkInput::from(buffer.clone());
        assert_eq!(input.to_buffer().unwrap(), buffer);
    }
}
