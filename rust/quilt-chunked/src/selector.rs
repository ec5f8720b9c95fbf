//! Global selectors and assigned values.

use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

use quilt_buffer::{Buffer, NativeElement, Scalar, Slice};
use quilt_common::{Result, error::Error};

/// Selects positions of the global index space of a chunked array.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// One global position.
    Index(i64),
    /// A `start:stop:step` range.
    Slice(Slice),
    /// Explicit global positions, in output order. Repeats are allowed.
    Indices(Vec<i64>),
    /// One flag per global position.
    Mask(Vec<bool>),
    /// A buffer interpreted as `Indices` or `Mask` depending on its element type.
    Array(Buffer),
}

impl Selector {
    /// Resolves `Array` selectors into `Indices` or `Mask`; other selectors are
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Fails with an unsupported selector error for buffers with a trailing shape
    /// or a floating point element type, and with an out of bounds error (against
    /// `len`) for unsigned positions that do not fit an `i64`.
    pub fn classify(self, len: usize) -> Result<Selector> {
        let Selector::Array(buffer) = self else {
            return Ok(self);
        };
        let element_type = buffer.element_type();
        if buffer.ndim() != 1 || element_type.is_float() {
            return Err(Error::unsupported_selector(
                &buffer.shape(),
                element_type.name(),
            ));
        }
        if element_type.is_boolean() {
            Ok(Selector::Mask(buffer.to_bools()))
        } else {
            let indices = buffer
                .scalars()
                .map(|s| match s {
                    Scalar::UInt(index) => i64::try_from(index).map_err(|_| {
                        let index = usize::try_from(index).unwrap_or(usize::MAX);
                        Error::out_of_bounds(index, len)
                    }),
                    s => Ok(s.as_i64()),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Selector::Indices(indices))
        }
    }
}

impl From<i64> for Selector {
    fn from(index: i64) -> Self {
        Selector::Index(index)
    }
}

impl From<i32> for Selector {
    fn from(index: i32) -> Self {
        Selector::Index(index as i64)
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Selector::Index(index as i64)
    }
}

impl From<Slice> for Selector {
    fn from(slice: Slice) -> Self {
        Selector::Slice(slice)
    }
}

macro_rules! impl_selector_from_range {
    ($($range:ty),+) => {
        $(
            impl From<$range> for Selector {
                fn from(range: $range) -> Self {
                    Selector::Slice(Slice::from(range))
                }
            }
        )+
    };
}

impl_selector_from_range!(
    Range<usize>,
    RangeInclusive<usize>,
    RangeFrom<usize>,
    RangeTo<usize>,
    RangeToInclusive<usize>,
    RangeFull
);

impl From<Vec<i64>> for Selector {
    fn from(indices: Vec<i64>) -> Self {
        Selector::Indices(indices)
    }
}

impl From<&[i64]> for Selector {
    fn from(indices: &[i64]) -> Self {
        Selector::Indices(indices.to_vec())
    }
}

impl From<Vec<bool>> for Selector {
    fn from(mask: Vec<bool>) -> Self {
        Selector::Mask(mask)
    }
}

impl From<&[bool]> for Selector {
    fn from(mask: &[bool]) -> Self {
        Selector::Mask(mask.to_vec())
    }
}

impl From<Buffer> for Selector {
    fn from(buffer: Buffer) -> Self {
        Selector::Array(buffer)
    }
}

/// A value assigned through a selector.
#[derive(Debug, Clone, PartialEq)]
pub enum Assign {
    /// Broadcast to every selected position.
    Scalar(Scalar),
    /// A sequence: a single element broadcasts, otherwise its leading dimension
    /// is consumed in selection order.
    Array(Buffer),
}

impl Assign {
    /// Length of the leading dimension, `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            Assign::Scalar(_) => None,
            Assign::Array(buffer) => Some(buffer.len()),
        }
    }
}

impl From<Scalar> for Assign {
    fn from(value: Scalar) -> Self {
        Assign::Scalar(value)
    }
}

impl From<bool> for Assign {
    fn from(value: bool) -> Self {
        Assign::Scalar(Scalar::Bool(value))
    }
}

impl From<i32> for Assign {
    fn from(value: i32) -> Self {
        Assign::Scalar(Scalar::Int(value as i64))
    }
}

impl From<i64> for Assign {
    fn from(value: i64) -> Self {
        Assign::Scalar(Scalar::Int(value))
    }
}

impl From<f64> for Assign {
    fn from(value: f64) -> Self {
        Assign::Scalar(Scalar::Float(value))
    }
}

impl From<Buffer> for Assign {
    fn from(buffer: Buffer) -> Self {
        Assign::Array(buffer)
    }
}

impl<T: NativeElement> From<Vec<T>> for Assign {
    fn from(values: Vec<T>) -> Self {
        Assign::Array(Buffer::from_slice(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quilt_common::error::{ErrorCategory, ErrorKind};

    #[test]
    fn test_conversions() {
        assert_eq!(Selector::from(3), Selector::Index(3));
        assert_eq!(Selector::from(1..4), Selector::Slice(Slice::range(1, 4)));
        assert_eq!(Selector::from(..), Selector::Slice(Slice::full()));
        assert_eq!(
            Selector::from(vec![true, false]),
            Selector::Mask(vec![true, false])
        );
        assert_eq!(Assign::from(2.5).len(), None);
        assert_eq!(Assign::from(vec![1u8, 2]).len(), Some(2));
    }

    #[test]
    fn test_classify_arrays() {
        let indices = Selector::from(Buffer::from_slice(&[3u32, 0])).classify(4).unwrap();
        assert_eq!(indices, Selector::Indices(vec![3, 0]));

        let mask = Selector::from(Buffer::from_bools(&[false, true]))
            .classify(2)
            .unwrap();
        assert_eq!(mask, Selector::Mask(vec![false, true]));

        assert_eq!(Selector::Index(1).classify(0).unwrap(), Selector::Index(1));
    }

    #[test]
    fn test_unsupported_arrays() {
        let err = Selector::from(Buffer::from_slice(&[1.0f64]))
            .classify(1)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnsupportedSelector);

        let nested = Buffer::from_slice_shaped(&[1i64, 2, 3, 4], &[2, 2]).unwrap();
        let err = Selector::from(nested).classify(2).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnsupportedSelector);
        assert!(err.to_string().contains("[2, 2]"));
    }

    #[test]
    fn test_large_unsigned_positions() {
        let err = Selector::from(Buffer::from_slice(&[1u64, u64::MAX]))
            .classify(3)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Index);
        assert!(matches!(
            err.kind(),
            ErrorKind::IndexOutOfBounds { index, len: 3 } if *index as u64 == u64::MAX
        ));

        let fits = Selector::from(Buffer::from_slice(&[i64::MAX as u64]))
            .classify(3)
            .unwrap();
        assert_eq!(fits, Selector::Indices(vec![i64::MAX]));
    }

    #[test]
    fn test_inclusive_range_conversions() {
        assert_eq!(
            Selector::from(..=1),
            Selector::Slice(Slice::full().with_stop(2))
        );
        assert_eq!(Selector::from(1..=2), Selector::Slice(Slice::range(1, 3)));
    }
}
