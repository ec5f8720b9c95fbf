//! Broadcasting of assigned values onto a target region.
//!
//! A source of shape `src` broadcasts onto a target of shape `dst` when, after
//! dropping leading dimensions of size 1 that exceed the target rank, the shapes
//! right-align and every source dimension either equals the target dimension or is 1.

use quilt_common::{Result, error::Error};

use crate::tail::row_major_strides;

/// Computes, for every value of the target (in row-major order), the flat index of
/// the source value it receives.
///
/// # Errors
///
/// Returns a shape mismatch error naming both shapes when `src` cannot be broadcast
/// to `dst`.
pub fn broadcast_map(src: &[usize], dst: &[usize]) -> Result<Vec<usize>> {
    let mut trimmed = src;
    while trimmed.len() > dst.len() && trimmed[0] == 1 {
        trimmed = &trimmed[1..];
    }
    if trimmed.len() > dst.len() {
        return Err(Error::shape_mismatch(src, dst));
    }

    let src_strides = row_major_strides(trimmed);
    let lead = dst.len() - trimmed.len();
    let mut strides = vec![0usize; dst.len()];
    for (axis, &dim) in dst.iter().enumerate() {
        if axis < lead {
            continue;
        }
        let src_dim = trimmed[axis - lead];
        if src_dim == dim {
            strides[axis] = src_strides[axis - lead];
        } else if src_dim != 1 {
            return Err(Error::shape_mismatch(src, dst));
        }
    }

    let total: usize = dst.iter().product();
    let mut map = Vec::with_capacity(total);
    if total == 0 {
        return Ok(map);
    }

    let mut index = vec![0usize; dst.len()];
    let mut flat = 0usize;
    loop {
        map.push(flat);
        // Odometer step over the target shape, last axis fastest.
        let mut axis = dst.len();
        loop {
            if axis == 0 {
                return Ok(map);
            }
            axis -= 1;
            index[axis] += 1;
            flat += strides[axis];
            if index[axis] < dst[axis] {
                break;
            }
            flat -= strides[axis] * index[axis];
            index[axis] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quilt_common::error::ErrorCategory;

    #[test]
    fn test_scalar_broadcast() {
        assert_eq!(broadcast_map(&[], &[3]).unwrap(), vec![0, 0, 0]);
        assert_eq!(broadcast_map(&[], &[]).unwrap(), vec![0]);
        assert_eq!(broadcast_map(&[1], &[2, 2]).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_exact_shape() {
        assert_eq!(broadcast_map(&[2, 2], &[2, 2]).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_row_broadcast() {
        // A row of three values repeated over two rows.
        assert_eq!(
            broadcast_map(&[3], &[2, 3]).unwrap(),
            vec![0, 1, 2, 0, 1, 2]
        );
        // A column of two values repeated over three columns.
        assert_eq!(
            broadcast_map(&[2, 1], &[2, 3]).unwrap(),
            vec![0, 0, 0, 1, 1, 1]
        );
    }

    #[test]
    fn test_leading_ones_dropped() {
        assert_eq!(broadcast_map(&[1, 1, 3], &[3]).unwrap(), vec![0, 1, 2]);
        assert_eq!(broadcast_map(&[1, 2], &[2]).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_empty_target() {
        assert!(broadcast_map(&[], &[0]).unwrap().is_empty());
        assert!(broadcast_map(&[0], &[0]).unwrap().is_empty());
    }

    #[test]
    fn test_mismatch() {
        let err = broadcast_map(&[2], &[3]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ShapeMismatch);
        assert!(broadcast_map(&[2, 3], &[3]).is_err());
    }
}
