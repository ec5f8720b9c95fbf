//! Translation of a global slice into per-chunk fragments.
//!
//! Planning happens in two passes. [`FragmentPlan`] clips the slice bounds to
//! every chunk and records the overlapping local ranges in traversal order,
//! ignoring the step magnitude. [`StridePlan`] then walks the fragments with a
//! running phase so that every `|step|`-th position of the concatenated
//! fragments is selected exactly once, regardless of where chunk boundaries fall.

use std::ops::Range;

use quilt_buffer::Slice;
use quilt_common::{Result, error::ErrorKind};

/// Global bounds of a slice in increasing-position terms.
///
/// `lo` is inclusive and `hi` exclusive; `None` leaves the side open so that
/// each chunk substitutes its own edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceBounds {
    pub lo: Option<usize>,
    pub hi: Option<usize>,
    pub reverse: bool,
    pub stride: usize,
}

impl SliceBounds {
    /// Interprets a global slice. With a negative step, `start` is the inclusive
    /// upper bound and `stop` the exclusive lower bound.
    ///
    /// # Errors
    ///
    /// Fails with an index error for a zero step or a negative bound.
    pub fn new(slice: &Slice) -> Result<SliceBounds> {
        let step = slice.checked_step()?;
        let start = slice.start.map(non_negative).transpose()?;
        let stop = slice.stop.map(non_negative).transpose()?;
        let stride = step.unsigned_abs() as usize;
        if step > 0 {
            Ok(SliceBounds {
                lo: start,
                hi: stop,
                reverse: false,
                stride,
            })
        } else {
            Ok(SliceBounds {
                lo: stop.map(|stop| stop + 1),
                hi: start.map(|start| start + 1),
                reverse: true,
                stride,
            })
        }
    }
}

fn non_negative(index: i64) -> Result<usize> {
    if index < 0 {
        return Err(ErrorKind::NegativeIndex { index }.into());
    }
    Ok(index as usize)
}

/// The part of one chunk covered by a slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Position of the chunk in the chunk list.
    pub chunk: usize,
    /// Global position of the chunk's first element.
    pub offset: usize,
    /// Covered local rows, ascending.
    pub rows: Range<usize>,
    /// Whether the rows are traversed from the end.
    pub reverse: bool,
}

impl Fragment {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Chunk extent as seen by the planner: chunk position, global offset and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkExtent {
    pub chunk: usize,
    pub offset: usize,
    pub len: usize,
}

/// The fragments a slice covers, in traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentPlan {
    bounds: SliceBounds,
    fragments: Vec<Fragment>,
}

impl FragmentPlan {
    /// Clips `bounds` against chunk extents given in increasing offset order.
    ///
    /// Extents are pulled lazily: the first extent starting at or beyond the
    /// upper bound ends the scan. Zero-length chunks never produce a fragment.
    pub fn build<I>(bounds: SliceBounds, extents: I) -> Result<FragmentPlan>
    where
        I: IntoIterator<Item = Result<ChunkExtent>>,
    {
        let mut fragments = Vec::new();
        for extent in extents {
            let extent = extent?;
            if extent.len == 0 {
                continue;
            }
            if bounds.hi.is_some_and(|hi| hi <= extent.offset) {
                break;
            }
            let end = extent.offset + extent.len;
            let local_lo = match bounds.lo {
                Some(lo) if lo >= end => continue,
                Some(lo) => lo.saturating_sub(extent.offset),
                None => 0,
            };
            let local_hi = bounds
                .hi
                .map_or(extent.len, |hi| (hi - extent.offset).min(extent.len));
            if local_lo < local_hi {
                fragments.push(Fragment {
                    chunk: extent.chunk,
                    offset: extent.offset,
                    rows: local_lo..local_hi,
                    reverse: bounds.reverse,
                });
            }
        }
        if bounds.reverse {
            fragments.reverse();
        }
        Ok(FragmentPlan { bounds, fragments })
    }

    pub fn bounds(&self) -> SliceBounds {
        self.bounds
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Number of covered positions before downsampling.
    pub fn covered(&self) -> usize {
        self.fragments.iter().map(Fragment::len).sum()
    }

    /// Distributes the step over the fragments.
    pub fn strides(&self) -> StridePlan {
        StridePlan::new(&self.fragments, self.bounds.stride)
    }
}

/// The positions of one chunk selected by a strided slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StridedFragment {
    pub chunk: usize,
    /// Global position of the chunk's first element.
    pub offset: usize,
    /// Local row of the first selected position.
    pub first: usize,
    /// Signed local distance between consecutive selected positions.
    pub step: isize,
    pub count: usize,
}

impl StridedFragment {
    /// The selected local rows, in selection order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = usize> + Clone + use<> {
        let (first, step) = (self.first as isize, self.step);
        (0..self.count).map(move |k| (first + k as isize * step) as usize)
    }
}

/// Per-fragment selections of a strided slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StridePlan {
    fragments: Vec<StridedFragment>,
    count: usize,
}

impl StridePlan {
    /// Walks `fragments` in traversal order, carrying the phase: the distance
    /// from the start of the next fragment to the next selected position.
    pub fn new(fragments: &[Fragment], stride: usize) -> StridePlan {
        debug_assert!(stride > 0);
        let mut phase = 0usize;
        let mut selected = Vec::with_capacity(fragments.len());
        let mut total = 0;
        for fragment in fragments {
            let len = fragment.len();
            let count = if phase < len {
                (len - phase - 1) / stride + 1
            } else {
                0
            };
            if count > 0 {
                let (first, step) = if fragment.reverse {
                    (fragment.rows.end - 1 - phase, -(stride as isize))
                } else {
                    (fragment.rows.start + phase, stride as isize)
                };
                selected.push(StridedFragment {
                    chunk: fragment.chunk,
                    offset: fragment.offset,
                    first,
                    step,
                    count,
                });
                total += count;
            }
            phase = (phase as i64 - len as i64).rem_euclid(stride as i64) as usize;
        }
        StridePlan {
            fragments: selected,
            count: total,
        }
    }

    /// Fragments with at least one selected position.
    pub fn fragments(&self) -> &[StridedFragment] {
        &self.fragments
    }

    /// Total number of selected positions.
    pub fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quilt_common::error::ErrorCategory;

    fn extents(lens: &[usize]) -> Vec<Result<ChunkExtent>> {
        let mut offset = 0;
        lens.iter()
            .enumerate()
            .map(|(chunk, &len)| {
                let extent = ChunkExtent { chunk, offset, len };
                offset += len;
                Ok(extent)
            })
            .collect()
    }

    fn plan(lens: &[usize], slice: Slice) -> FragmentPlan {
        let bounds = SliceBounds::new(&slice).unwrap();
        FragmentPlan::build(bounds, extents(lens)).unwrap()
    }

    fn global_positions(plan: &FragmentPlan) -> Vec<usize> {
        plan.strides()
            .fragments()
            .iter()
            .flat_map(|s| s.rows().map(move |row| s.offset + row))
            .collect()
    }

    fn reference(total: usize, slice: Slice) -> Vec<usize> {
        slice.resolve(total).unwrap().positions().collect()
    }

    fn fragment(chunk: usize, offset: usize, rows: Range<usize>, reverse: bool) -> Fragment {
        Fragment {
            chunk,
            offset,
            rows,
            reverse,
        }
    }

    #[test]
    fn test_forward_fragments() {
        let forward = plan(&[3, 0, 2], Slice::range(1, 4));
        assert_eq!(
            forward.fragments(),
            &[
                fragment(0, 0, 1..3, false),
                fragment(2, 3, 0..1, false),
            ]
        );
        assert_eq!(forward.covered(), 3);
    }

    #[test]
    fn test_reverse_fragments() {
        let reversed = plan(&[3, 0, 2], Slice::step_only(-1));
        assert_eq!(
            reversed.fragments(),
            &[
                fragment(2, 3, 0..2, true),
                fragment(0, 0, 0..3, true),
            ]
        );

        // start is inclusive and stop exclusive going down.
        let bounded = plan(&[3, 0, 2], Slice::new(Some(3), Some(0), Some(-1)));
        assert_eq!(global_positions(&bounded), vec![3, 2, 1]);
    }

    #[test]
    fn test_scan_stops_at_upper_bound() {
        let bounds = SliceBounds::new(&Slice::range(0, 2)).unwrap();
        let mut pulled = 0;
        let extents = extents(&[2, 2, 2]).into_iter().inspect(|_| pulled += 1);
        let plan = FragmentPlan::build(bounds, extents).unwrap();
        assert_eq!(plan.fragments().len(), 1);
        assert_eq!(pulled, 2);
    }

    #[test]
    fn test_bounds_beyond_length() {
        assert_eq!(plan(&[2, 2], Slice::range(1, 100)).covered(), 3);
        assert!(plan(&[2, 2], Slice::range(7, 9)).fragments().is_empty());
        assert_eq!(
            global_positions(&plan(&[2, 2], Slice::new(Some(10), None, Some(-1)))),
            vec![3, 2, 1, 0]
        );
    }

    #[test]
    fn test_invalid_bounds() {
        let err = SliceBounds::new(&Slice::step_only(0)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Index);
        let err = SliceBounds::new(&Slice::range(-1, 3)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Index);
        let err = SliceBounds::new(&Slice::full().with_stop(-2)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Index);
    }

    #[test]
    fn test_phase_carry_forward() {
        // Chunk lengths chosen so that the phase is non-zero at most boundaries.
        let every_third = plan(&[3, 1, 4, 2], Slice::step_only(3));
        let strides = every_third.strides();
        assert_eq!(strides.count(), 4);
        assert_eq!(global_positions(&every_third), vec![0, 3, 6, 9]);
        // The one-element chunk holds position 3.
        assert_eq!(
            strides.fragments()[1],
            StridedFragment {
                chunk: 1,
                offset: 3,
                first: 0,
                step: 3,
                count: 1,
            }
        );
    }

    #[test]
    fn test_phase_carry_reverse() {
        let lens = [3, 1, 4, 2];
        assert_eq!(
            global_positions(&plan(&lens, Slice::step_only(-3))),
            vec![9, 6, 3, 0]
        );
        assert_eq!(
            global_positions(&plan(&lens, Slice::new(Some(8), None, Some(-4)))),
            vec![8, 4, 0]
        );
    }

    #[test]
    fn test_stride_matches_reference() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..500 {
            let lens: Vec<usize> = (0..rng.usize(1..6)).map(|_| rng.usize(0..6)).collect();
            let total: usize = lens.iter().sum();
            let maybe = |rng: &mut fastrand::Rng| {
                rng.bool().then(|| rng.i64(0..=total as i64 + 2))
            };
            let start = maybe(&mut rng);
            let stop = maybe(&mut rng);
            let mut step = rng.i64(-4..=4);
            if step == 0 {
                step = 1;
            }
            let slice = Slice::new(start, stop, Some(step));
            assert_eq!(
                global_positions(&plan(&lens, slice)),
                reference(total, slice),
                "lens {lens:?} slice {slice:?}"
            );
        }
    }
}
