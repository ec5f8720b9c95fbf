//! Conversions between buffers and Arrow arrays.
//!
//! Trailing element dimensions map to nested `FixedSizeList` arrays, innermost
//! dimension first. Arrow nulls have no buffer counterpart and are rejected.

use std::sync::Arc;

use arrow_array::{
    Array, ArrayRef, ArrowPrimitiveType, BooleanArray, FixedSizeListArray, PrimitiveArray,
    cast::AsArray,
    types::{
        Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type,
        UInt16Type, UInt32Type, UInt64Type,
    },
};
use arrow_buffer::ScalarBuffer;
use arrow_schema::{DataType, Field};
use quilt_common::{Result, error::Error, verify_arg, verify_chunk};

use crate::{buffer::Buffer, element_type::ElementType, scalar::NativeElement};

/// Converts an Arrow array into a buffer, copying its values.
///
/// # Errors
///
/// Fails with an invalid chunk error if the array (or any nested child) contains
/// nulls, or if its data type has no buffer counterpart.
pub fn array_to_buffer(array: &dyn Array) -> Result<Buffer> {
    verify_chunk!(
        array.null_count() == 0,
        "Arrow array contains {} null values",
        array.null_count()
    );
    match array.data_type() {
        DataType::Boolean => {
            let values: Vec<bool> = array.as_boolean().values().iter().collect();
            Ok(Buffer::from_bools(&values))
        }
        DataType::Int8 => Ok(primitive_to_buffer::<Int8Type>(array)),
        DataType::Int16 => Ok(primitive_to_buffer::<Int16Type>(array)),
        DataType::Int32 => Ok(primitive_to_buffer::<Int32Type>(array)),
        DataType::Int64 => Ok(primitive_to_buffer::<Int64Type>(array)),
        DataType::UInt8 => Ok(primitive_to_buffer::<UInt8Type>(array)),
        DataType::UInt16 => Ok(primitive_to_buffer::<UInt16Type>(array)),
        DataType::UInt32 => Ok(primitive_to_buffer::<UInt32Type>(array)),
        DataType::UInt64 => Ok(primitive_to_buffer::<UInt64Type>(array)),
        DataType::Float32 => Ok(primitive_to_buffer::<Float32Type>(array)),
        DataType::Float64 => Ok(primitive_to_buffer::<Float64Type>(array)),
        DataType::FixedSizeList(_, size) => {
            let list = array.as_fixed_size_list();
            let child = array_to_buffer(list.values().as_ref())?;
            let mut shape = vec![list.len(), *size as usize];
            shape.extend_from_slice(child.inner_shape());
            Buffer::try_new(child.element_type(), &shape, child.into_values())
        }
        other => Err(Error::invalid_chunk(format!(
            "unsupported Arrow data type {other}"
        ))),
    }
}

fn primitive_to_buffer<T>(array: &dyn Array) -> Buffer
where
    T: ArrowPrimitiveType,
    T::Native: NativeElement,
{
    let values: &[T::Native] = array.as_primitive::<T>().values();
    Buffer::from_slice(values)
}

/// Converts a buffer into an Arrow array.
///
/// One-dimensional buffers become primitive (or boolean) arrays; each trailing
/// dimension adds one `FixedSizeList` level.
///
/// # Errors
///
/// Fails if a trailing dimension is zero, which `FixedSizeList` cannot represent
/// without losing the row count.
pub fn buffer_to_array(buffer: &Buffer) -> Result<ArrayRef> {
    let flat_len = buffer.len() * buffer.values_per_element();
    let mut array: ArrayRef = match buffer.element_type() {
        ElementType::Boolean => Arc::new(BooleanArray::from(buffer.to_bools())),
        ElementType::Int8 => primitive_array::<Int8Type>(buffer, flat_len),
        ElementType::Int16 => primitive_array::<Int16Type>(buffer, flat_len),
        ElementType::Int32 => primitive_array::<Int32Type>(buffer, flat_len),
        ElementType::Int64 => primitive_array::<Int64Type>(buffer, flat_len),
        ElementType::UInt8 => primitive_array::<UInt8Type>(buffer, flat_len),
        ElementType::UInt16 => primitive_array::<UInt16Type>(buffer, flat_len),
        ElementType::UInt32 => primitive_array::<UInt32Type>(buffer, flat_len),
        ElementType::UInt64 => primitive_array::<UInt64Type>(buffer, flat_len),
        ElementType::Float32 => primitive_array::<Float32Type>(buffer, flat_len),
        ElementType::Float64 => primitive_array::<Float64Type>(buffer, flat_len),
    };
    for &dim in buffer.inner_shape().iter().rev() {
        verify_arg!(dim, dim > 0);
        let field = Arc::new(Field::new("item", array.data_type().clone(), false));
        let list = FixedSizeListArray::try_new(field, dim as i32, array, None)
            .map_err(|e| Error::arrow("build fixed size list", e))?;
        array = Arc::new(list);
    }
    Ok(array)
}

fn primitive_array<T>(buffer: &Buffer, len: usize) -> ArrayRef
where
    T: ArrowPrimitiveType,
{
    let values =
        ScalarBuffer::<T::Native>::new(buffer.values().clone().into_arrow_buffer(), 0, len);
    Arc::new(PrimitiveArray::<T>::new(values, None))
}

impl Buffer {
    /// Converts this buffer into an Arrow array. See [`buffer_to_array`].
    pub fn to_arrow(&self) -> Result<ArrayRef> {
        buffer_to_array(self)
    }
}
