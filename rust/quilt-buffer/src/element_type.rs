//! Element types and descriptors for typed buffers.

use std::fmt;

/// The physical type of the values stored in a [`Buffer`](crate::buffer::Buffer).
///
/// `Boolean` values occupy one byte each (`0` is `false`, anything else is `true`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl ElementType {
    /// Size of one value in bytes.
    pub fn size(&self) -> usize {
        match self {
            ElementType::Boolean | ElementType::Int8 | ElementType::UInt8 => 1,
            ElementType::Int16 | ElementType::UInt16 => 2,
            ElementType::Int32 | ElementType::UInt32 | ElementType::Float32 => 4,
            ElementType::Int64 | ElementType::UInt64 | ElementType::Float64 => 8,
        }
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        *self == ElementType::Boolean
    }

    /// Returns `true` for signed and unsigned integer types.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ElementType::Int8
                | ElementType::Int16
                | ElementType::Int32
                | ElementType::Int64
                | ElementType::UInt8
                | ElementType::UInt16
                | ElementType::UInt32
                | ElementType::UInt64
        )
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, ElementType::Float32 | ElementType::Float64)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Boolean => "Boolean",
            ElementType::Int8 => "Int8",
            ElementType::Int16 => "Int16",
            ElementType::Int32 => "Int32",
            ElementType::Int64 => "Int64",
            ElementType::UInt8 => "UInt8",
            ElementType::UInt16 => "UInt16",
            ElementType::UInt32 => "UInt32",
            ElementType::UInt64 => "UInt64",
            ElementType::Float32 => "Float32",
            ElementType::Float64 => "Float64",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes one logical element of a buffer: its value type and its trailing shape.
///
/// An element with an empty `shape` is a single value. An element with shape `[2, 3]`
/// is a row-major block of six values. This is the equivalent of a sub-array dtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementDescriptor {
    pub element_type: ElementType,
    pub shape: Vec<usize>,
}

impl ElementDescriptor {
    pub fn new(element_type: ElementType, shape: Vec<usize>) -> ElementDescriptor {
        ElementDescriptor {
            element_type,
            shape,
        }
    }

    /// A descriptor for single values of the given type.
    pub fn scalar(element_type: ElementType) -> ElementDescriptor {
        ElementDescriptor::new(element_type, Vec::new())
    }

    /// Number of values in one element.
    pub fn values_per_element(&self) -> usize {
        self.shape.iter().product()
    }

    /// Number of bytes in one element.
    pub fn element_size(&self) -> usize {
        self.values_per_element() * self.element_type.size()
    }
}

impl Default for ElementDescriptor {
    fn default() -> Self {
        ElementDescriptor::scalar(ElementType::Float64)
    }
}

impl fmt::Display for ElementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape.is_empty() {
            write!(f, "{}", self.element_type)
        } else {
            write!(f, "({}, {:?})", self.element_type, self.shape)
        }
    }
}
