use quilt_buffer::{Buffer, Slice, TailIndex};
use quilt_common::Result;

use super::{ChunkedArray, Feed, PendingWrite};
use crate::{
    fragment::{FragmentPlan, SliceBounds},
    selector::Assign,
};

impl ChunkedArray {
    fn fragment_plan(&mut self, slice: &Slice) -> Result<FragmentPlan> {
        let bounds = SliceBounds::new(slice)?;
        let plan = FragmentPlan::build(bounds, self.extents())?;
        log::debug!(
            "slice {:?}:{:?}:{:?} covers {} positions in {} fragments",
            slice.start,
            slice.stop,
            slice.step,
            plan.covered(),
            plan.fragments().len()
        );
        Ok(plan)
    }

    /// Extracts the directional fragments and downsamples their concatenation.
    pub(super) fn get_slice(&mut self, slice: &Slice, tail: &[TailIndex]) -> Result<Buffer> {
        let plan = self.fragment_plan(slice)?;
        let mut parts = Vec::with_capacity(plan.fragments().len());
        for fragment in plan.fragments() {
            let chunk = self.chunk_mut(fragment.chunk)?;
            let tail_plan = chunk.tail_plan(tail)?;
            parts.push(chunk.slice_rows(fragment.rows.clone(), fragment.reverse, &tail_plan));
        }

        let joined = match parts.len() {
            0 => return self.empty_result(tail),
            1 => parts.swap_remove(0),
            _ => {
                log::debug!("concatenating {} slice fragments", parts.len());
                Buffer::concat(&parts)?
            }
        };
        Ok(joined.step_by(plan.bounds().stride))
    }

    /// Writes through the strided fragments of `slice`.
    pub(super) fn set_slice(
        &mut self,
        slice: &Slice,
        tail: &[TailIndex],
        value: &Assign,
    ) -> Result<()> {
        let strides = self.fragment_plan(slice)?.strides();
        let feed = Feed::new(value, strides.count())?;

        let mut writes = Vec::with_capacity(strides.fragments().len());
        let mut consumed = 0;
        for fragment in strides.fragments() {
            let chunk = self.chunk_mut(fragment.chunk)?;
            let source = feed.source(consumed..consumed + fragment.count);
            consumed += fragment.count;
            writes.push(PendingWrite::prepare(
                fragment.chunk,
                chunk,
                fragment.rows().collect(),
                tail,
                source,
            )?);
        }
        self.apply_writes(&writes)
    }
}

#[cfg(test)]
mod tests {
    use quilt_buffer::{ChunkInput, ElementDescriptor, ElementType, Item};
    use quilt_common::error::ErrorCategory;

    use super::*;

    fn sample() -> ChunkedArray {
        ChunkedArray::new(vec![vec![1, 2, 3], vec![], vec![4, 5]])
    }

    fn ints(item: Item) -> Vec<i64> {
        item.as_array().unwrap().as_slice::<i64>().unwrap().to_vec()
    }

    #[test]
    fn test_get_slices() {
        let mut array = sample();
        assert_eq!(ints(array.get(1..4).unwrap()), vec![2, 3, 4]);
        assert_eq!(ints(array.get(Slice::step_only(-1)).unwrap()), vec![5, 4, 3, 2, 1]);
        assert_eq!(ints(array.get(Slice::step_only(2)).unwrap()), vec![1, 3, 5]);
        assert_eq!(ints(array.get(Slice::step_only(-2)).unwrap()), vec![5, 3, 1]);
        assert_eq!(
            ints(array.get(Slice::new(Some(3), Some(0), Some(-2))).unwrap()),
            vec![4, 2]
        );
        assert_eq!(ints(array.get(3..).unwrap()), vec![4, 5]);
        assert_eq!(ints(array.get(..=1).unwrap()), vec![1, 2]);
    }

    #[test]
    fn test_single_fragment_is_not_concatenated() {
        let mut array = sample();
        assert_eq!(ints(array.get(0..2).unwrap()), vec![1, 2]);
    }

    #[test]
    fn test_empty_selection() {
        let mut array = sample();
        let empty = array.get(4..2).unwrap();
        let empty = empty.as_array().unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.element_type(), ElementType::Int64);

        let mut nothing = ChunkedArray::new(vec![Vec::<i64>::new(), Vec::new()]);
        let empty = nothing.get(0..0).unwrap();
        assert_eq!(
            empty.as_array().unwrap().descriptor(),
            ElementDescriptor::default()
        );
    }

    #[test]
    fn test_slice_errors() {
        let mut array = sample();
        let err = array.get(Slice::step_only(0)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Index);
        assert!(err.to_string().contains("slice step cannot be zero"));
        let err = array.get(Slice::full().with_start(-1)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Index);
    }

    #[test]
    fn test_mixed_chunk_types_cast_to_first() {
        let mut array = ChunkedArray::new(vec![
            ChunkInput::from(vec![1, 2]),
            ChunkInput::from(vec![2.5, 3.5]),
        ]);
        let all = array.to_buffer().unwrap();
        assert_eq!(all.element_type(), ElementType::Int64);
        assert_eq!(all.as_slice::<i64>().unwrap(), &[1, 2, 2, 3]);
    }

    #[test]
    fn test_set_broadcast_scalar() {
        let mut array = sample();
        array.set(Slice::step_only(2), 0).unwrap();
        assert_eq!(ints(array.get(..).unwrap()), vec![0, 2, 0, 4, 0]);
    }

    #[test]
    fn test_set_sequence_across_chunks() {
        let mut array = sample();
        array.set(1..5, vec![20i64, 30, 40, 50]).unwrap();
        assert_eq!(ints(array.get(..).unwrap()), vec![1, 20, 30, 40, 50]);

        // Reverse stride: positions 4, 2, 0 receive the values in order.
        array.set(Slice::step_only(-2), vec![-5i64, -3, -1]).unwrap();
        assert_eq!(ints(array.get(..).unwrap()), vec![-1, 20, -3, 40, -5]);
    }

    #[test]
    fn test_set_single_element_broadcasts() {
        let mut array = sample();
        array.set(.., vec![7i64]).unwrap();
        assert_eq!(ints(array.get(..).unwrap()), vec![7; 5]);
    }

    #[test]
    fn test_set_count_mismatch_leaves_array_unchanged() {
        let mut array = sample();
        let err = array.set(0..4, vec![1i64, 2]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ShapeMismatch);
        assert_eq!(ints(array.get(..).unwrap()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_set_with_tail() {
        let mut array = ChunkedArray::new(vec![
            ChunkInput::from(vec![vec![1, 2], vec![3, 4]]),
            ChunkInput::from(vec![vec![5, 6]]),
        ]);
        array
            .set_with(.., &[TailIndex::Index(1)], vec![0i64, 0, 0])
            .unwrap();
        assert_eq!(array.to_buffer().unwrap().to_string(), "[[1 0] [3 0] [5 0]]");

        let column = array
            .get_with(Slice::step_only(-1), &[TailIndex::Index(0)])
            .unwrap();
        assert_eq!(ints(column), vec![5, 3, 1]);
    }
}
