//! Slice descriptors and trailing sub-index planning.
//!
//! A [`TailIndex`] addresses the dimensions of a single buffer element (everything
//! after the leading dimension). Tail indexing follows the buffer's own rules:
//! negative positions wrap within their dimension and slice bounds are clamped.
//! A [`TailPlan`] resolves a tail against an element shape once, so that row
//! gathers and scatters only deal with flat value offsets.

use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

use quilt_common::{Result, error::Error};

/// A `start:stop:step` range description with optional bounds.
///
/// `None` bounds mean "from the beginning" and "to the end" in the direction of
/// `step`; a `None` step means `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Slice {
        Slice { start, stop, step }
    }

    /// The whole range, `::`.
    pub fn full() -> Slice {
        Slice::default()
    }

    /// `start:stop`.
    pub fn range(start: i64, stop: i64) -> Slice {
        Slice::new(Some(start), Some(stop), None)
    }

    /// `::step`.
    pub fn step_only(step: i64) -> Slice {
        Slice::new(None, None, Some(step))
    }

    pub fn with_start(mut self, start: i64) -> Slice {
        self.start = Some(start);
        self
    }

    pub fn with_stop(mut self, stop: i64) -> Slice {
        self.stop = Some(stop);
        self
    }

    pub fn with_step(mut self, step: i64) -> Slice {
        self.step = Some(step);
        self
    }

    /// The effective step, failing when it is zero.
    pub fn checked_step(&self) -> Result<i64> {
        match self.step {
            None => Ok(1),
            Some(0) => Err(Error::invalid_index("slice step cannot be zero")),
            Some(step) => Ok(step),
        }
    }

    /// Resolves this slice against a dimension of length `len`, wrapping negative
    /// bounds and clamping out-of-range ones.
    pub fn resolve(&self, len: usize) -> Result<ResolvedSlice> {
        let step = self.checked_step()?;
        let len = len as i64;
        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };

        let clamp = |bound: i64| {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };

        let start = self
            .start
            .map(clamp)
            .unwrap_or(if step > 0 { lower } else { upper });
        let stop = self
            .stop
            .map(clamp)
            .unwrap_or(if step > 0 { upper } else { lower });

        let count = if step > 0 && start < stop {
            (stop - start - 1) / step + 1
        } else if step < 0 && stop < start {
            (start - stop - 1) / (-step) + 1
        } else {
            0
        };

        Ok(ResolvedSlice {
            start,
            step,
            count: count as usize,
        })
    }
}

impl From<Range<usize>> for Slice {
    fn from(range: Range<usize>) -> Self {
        Slice::range(range.start as i64, range.end as i64)
    }
}

impl From<RangeInclusive<usize>> for Slice {
    fn from(range: RangeInclusive<usize>) -> Self {
        Slice::range(*range.start() as i64, *range.end() as i64 + 1)
    }
}

impl From<RangeFrom<usize>> for Slice {
    fn from(range: RangeFrom<usize>) -> Self {
        Slice::full().with_start(range.start as i64)
    }
}

impl From<RangeTo<usize>> for Slice {
    fn from(range: RangeTo<usize>) -> Self {
        Slice::full().with_stop(range.end as i64)
    }
}

impl From<RangeToInclusive<usize>> for Slice {
    fn from(range: RangeToInclusive<usize>) -> Self {
        Slice::full().with_stop(range.end as i64 + 1)
    }
}

impl From<RangeFull> for Slice {
    fn from(_: RangeFull) -> Self {
        Slice::full()
    }
}

/// A slice resolved against a concrete dimension length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSlice {
    pub start: i64,
    pub step: i64,
    pub count: usize,
}

impl ResolvedSlice {
    /// The selected positions, in selection order.
    pub fn positions(&self) -> impl ExactSizeIterator<Item = usize> + Clone + use<> {
        let (start, step) = (self.start, self.step);
        (0..self.count).map(move |k| (start + k as i64 * step) as usize)
    }
}

/// One component of a trailing sub-index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailIndex {
    /// Selects one position of the dimension and drops it from the result shape.
    Index(i64),
    /// Selects a range of the dimension.
    Slice(Slice),
}

impl From<i64> for TailIndex {
    fn from(index: i64) -> Self {
        TailIndex::Index(index)
    }
}

impl From<Slice> for TailIndex {
    fn from(slice: Slice) -> Self {
        TailIndex::Slice(slice)
    }
}

/// A trailing sub-index resolved against an element shape.
///
/// `offsets` lists, in output order, the flat value offsets within one source element
/// that make up one output element of shape `out_shape`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailPlan {
    out_shape: Vec<usize>,
    offsets: Vec<usize>,
    identity: bool,
}

impl TailPlan {
    /// The plan that keeps every value of an element of shape `shape`.
    pub fn identity(shape: &[usize]) -> TailPlan {
        let count = shape.iter().product();
        TailPlan {
            out_shape: shape.to_vec(),
            offsets: (0..count).collect(),
            identity: true,
        }
    }

    /// Resolves `tail` against the element shape `shape`.
    ///
    /// # Errors
    ///
    /// Fails with an index error if `tail` has more components than `shape` has
    /// dimensions, if an index is out of range for its dimension (after wrapping
    /// negative values), or if a tail slice has a zero step.
    pub fn new(shape: &[usize], tail: &[TailIndex]) -> Result<TailPlan> {
        if tail.is_empty() {
            return Ok(TailPlan::identity(shape));
        }
        if tail.len() > shape.len() {
            return Err(Error::invalid_index(format!(
                "too many indices for array: array is {}-dimensional, but {} were indexed",
                shape.len() + 1,
                tail.len() + 1
            )));
        }

        let strides = row_major_strides(shape);
        let mut out_shape = Vec::with_capacity(shape.len());
        let mut axes: Vec<(Vec<usize>, usize)> = Vec::with_capacity(shape.len());
        for (axis, &dim) in shape.iter().enumerate() {
            let positions: Vec<usize> = match tail.get(axis) {
                Some(TailIndex::Index(index)) => {
                    let wrapped = if *index < 0 {
                        *index + dim as i64
                    } else {
                        *index
                    };
                    if wrapped < 0 || wrapped >= dim as i64 {
                        return Err(Error::invalid_index(format!(
                            "index {index} is out of bounds for axis {} with size {dim}",
                            axis + 1
                        )));
                    }
                    vec![wrapped as usize]
                }
                Some(TailIndex::Slice(slice)) => {
                    let resolved = slice.resolve(dim)?;
                    out_shape.push(resolved.count);
                    resolved.positions().collect()
                }
                None => {
                    out_shape.push(dim);
                    (0..dim).collect()
                }
            };
            axes.push((positions, strides[axis]));
        }

        let mut offsets = vec![0usize];
        for (positions, stride) in &axes {
            let mut next = Vec::with_capacity(offsets.len() * positions.len());
            for base in &offsets {
                for pos in positions {
                    next.push(base + pos * stride);
                }
            }
            offsets = next;
        }

        Ok(TailPlan {
            out_shape,
            offsets,
            identity: false,
        })
    }

    /// Shape of one output element.
    pub fn out_shape(&self) -> &[usize] {
        &self.out_shape
    }

    /// Number of values in one output element.
    pub fn values_per_element(&self) -> usize {
        self.offsets.len()
    }

    /// Flat value offsets within a source element, in output order.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Returns `true` when the plan keeps whole elements unchanged.
    pub fn is_identity(&self) -> bool {
        self.identity
    }
}

/// Row-major strides (in values) for `shape`.
pub(crate) fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}
