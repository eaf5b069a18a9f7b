use std::{
    fmt::Debug,
    marker::PhantomData,
    ops::{Index, Range},
};

use common::{StreeError, StreeResult};
use derive_more::{From, Into};
use num::NumCast;
use typed_index_collections::TiVec;

use super::{convert, range::RangeExt, Aggregator, Element, QueryFunction, RangeTree, Sum};

/// An index into the node array of a [SegmentTree].
/// The root is `1`, the children of `i` are `2i` and `2i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct NodeIdx(usize);

impl NodeIdx {
    const ROOT: NodeIdx = NodeIdx(1);

    #[inline]
    fn left_child(self) -> Self {
        NodeIdx(self.0 << 1)
    }

    #[inline]
    fn right_child(self) -> Self {
        NodeIdx(self.0 << 1 | 1)
    }

    #[inline]
    fn parent(self) -> Self {
        NodeIdx(self.0 >> 1)
    }
}

/// A segment tree over `n` numeric elements, stored in a flat array of `2n` nodes.
///
/// Slot `0` is unused, the leaves live in `n..2n` in the order of the source
/// and every internal node `i` in `1..n` holds `A::combine(nodes[2i], nodes[2i + 1])`.
/// Both the number of leaves and the aggregator `A` are fixed for the lifetime of the tree.
///
/// # Example
/// ```
/// # use segment_tree::{Min, SegmentTree, Sum};
/// let mut sums = SegmentTree::<i64, Sum>::build(&[1, 2, 3, 4, 5]).unwrap();
/// assert_eq!(sums.query(1, 4).unwrap(), Some(9));
/// sums.update(0, 10).unwrap();
/// assert_eq!(sums.query(0, 3).unwrap(), Some(15));
///
/// let mut minima = SegmentTree::<i64, Min>::build(&[5, 3, 8, 1, 9]).unwrap();
/// assert_eq!(minima.query(0, 5).unwrap(), Some(1));
/// minima.update(3, 20).unwrap();
/// assert_eq!(minima.query(0, 5).unwrap(), Some(3));
///
/// // empty and inverted ranges have no result
/// assert_eq!(minima.query(3, 3).unwrap(), None);
/// assert_eq!(minima.query(4, 2).unwrap(), None);
/// ```
#[derive(Clone)]
pub struct SegmentTree<T, A = Sum> {
    size: usize,
    pub(crate) nodes: TiVec<NodeIdx, T>,
    aggregator: PhantomData<A>,
}

/// The integer instantiation, sums are checked for overflow.
pub type IntSegmentTree<A = Sum> = SegmentTree<i64, A>;

/// The floating point instantiation.
pub type FloatSegmentTree<A = Sum> = SegmentTree<f64, A>;

impl<T: Element, A: Aggregator> SegmentTree<T, A> {
    /// Builds a tree over `source`.
    /// Every element is converted losslessly into `T` (see [convert]).
    /// # Errors
    /// - [StreeError::ConversionError] if an element can not be represented in `T`.
    /// - [StreeError::OverflowError] if a sum of two children leaves the range of `T`.
    ///   No tree is produced in this case.
    /// # Runtime
    /// O(n)
    pub fn build<I>(source: &[I]) -> StreeResult<Self>
    where
        I: NumCast + PartialEq + Copy + Debug,
    {
        let leaves = source
            .iter()
            .map(|value| convert(*value))
            .collect::<StreeResult<Vec<T>>>()?;
        Self::from_leaves(leaves)
    }

    /// Builds a tree whose leaves are exactly `leaves`.
    /// # Errors
    /// [StreeError::OverflowError] if a sum of two children leaves the range of `T`.
    pub fn from_leaves(leaves: Vec<T>) -> StreeResult<Self> {
        let size = leaves.len();
        // The internal slots are placeholders until the pass below overwrites them.
        let nodes: TiVec<NodeIdx, T> = std::iter::repeat(T::zero())
            .take(size)
            .chain(leaves)
            .collect();
        let mut tree = Self {
            size,
            nodes,
            aggregator: PhantomData,
        };

        // Children always have larger indices than their parent,
        // so a single backward pass sees them finalized.
        for idx in (1..size).rev() {
            if let Err(err) = tree.recompute(NodeIdx(idx)) {
                log::warn!("Overflow while building the tree at node {}", idx);
                return Err(err);
            }
        }

        log::debug!(
            "Built {} segment tree over {} {} elements",
            A::FUNCTION,
            size,
            std::any::type_name::<T>()
        );
        Ok(tree)
    }

    /// Gives the aggregate over the positions `start..end`.
    ///
    /// Returns `Ok(None)` if the range is empty or inverted (`end <= start`) or starts
    /// before position `0`. An `end` beyond [len](Self::len) is clamped to `len`.
    ///
    /// The walk accumulates in [Element::Wide], so the order in which nodes are visited
    /// does not matter as long as the result itself fits into `T`.
    /// # Errors
    /// [StreeError::OverflowError] if the sum over the range does not fit into `T`.
    /// # Runtime
    /// O(log n)
    pub fn query(&self, start: isize, end: isize) -> StreeResult<Option<T>> {
        let borders = self.borders();
        let mut range = start..end;
        if range.start < 0 || !range.intersects(&borders) {
            return Ok(None);
        }
        range.clamp_by(&borders);

        // Both bounds are within `0..=size` after clamping.
        let mut left_idx = range.start as usize + self.size;
        let mut right_idx = range.end as usize + self.size;

        // Re-combining the first leaf is a no-op for the idempotent functions.
        let mut result = A::identity().unwrap_or_else(|| self.nodes[NodeIdx(left_idx)].widen());

        while left_idx < right_idx {
            if left_idx % 2 == 1 {
                result = A::combine(result, self.nodes[NodeIdx(left_idx)].widen())?;
                left_idx += 1;
            }

            if right_idx % 2 == 1 {
                right_idx -= 1;
                result = A::combine(result, self.nodes[NodeIdx(right_idx)].widen())?;
            }

            left_idx >>= 1;
            right_idx >>= 1;
        }

        match <T as NumCast>::from(result) {
            Some(result) => Ok(Some(result)),
            None => Err(StreeError::OverflowError(format!(
                "the {} over {}..{} is {:?}, which exceeds the range of {}",
                A::FUNCTION,
                range.start,
                range.end,
                result,
                std::any::type_name::<T>()
            ))),
        }
    }

    /// Sets the element at `index` to `value` and recomputes all of its ancestors.
    /// # Errors
    /// - [StreeError::IndexOutOfRange] if `index` is not in `0..len`. The tree is unchanged.
    /// - [StreeError::OverflowError] if a recomputed sum leaves the range of `T`.
    ///   The walk stops at the failing ancestor: the leaf and all ancestors below it keep
    ///   their new values, the ones above keep their old values.
    /// # Runtime
    /// O(log n)
    pub fn update(&mut self, index: isize, value: T) -> StreeResult<()> {
        let leaf = self.leaf_idx(index)?;
        self.nodes[leaf] = value;

        let mut parent = leaf.parent();
        while parent.0 > 0 {
            if let Err(err) = self.recompute(parent) {
                log::warn!(
                    "Overflow while updating position {} at node {:?}, ancestors above are stale",
                    index,
                    parent
                );
                return Err(err);
            }
            parent = parent.parent();
        }
        Ok(())
    }

    /// Like [update](Self::update), but converts `value` into `T` first.
    /// # Errors
    /// Additionally [StreeError::ConversionError] if `value` can not be represented in `T`.
    pub fn update_from<I>(&mut self, index: isize, value: I) -> StreeResult<()>
    where
        I: NumCast + PartialEq + Copy + Debug,
    {
        let value = convert(value)?;
        self.update(index, value)
    }

    /// The aggregate over all elements, `None` if the tree is empty.
    pub fn total(&self) -> Option<T> {
        // With a single element the root slot is that leaf.
        if self.is_empty() {
            None
        } else {
            Some(self.nodes[NodeIdx::ROOT])
        }
    }

    fn recompute(&mut self, idx: NodeIdx) -> StreeResult<()> {
        self.nodes[idx] = A::combine(self.nodes[idx.left_child()], self.nodes[idx.right_child()])?;
        Ok(())
    }

    /// The internal nodes which do not hold the combination of their children,
    /// including those whose children can not be combined at all.
    #[cfg(test)]
    pub(crate) fn stale_nodes(&self) -> Vec<NodeIdx> {
        (1..self.size)
            .map(NodeIdx)
            .filter(|idx| {
                A::combine(self.nodes[idx.left_child()], self.nodes[idx.right_child()])
                    .map_or(true, |expected| self.nodes[*idx] != expected)
            })
            .collect()
    }

    /// Panics unless every internal node is the combination of its children.
    #[cfg(test)]
    pub(crate) fn assert_invariant(&self) {
        assert_eq!(self.stale_nodes(), Vec::new(), "stale nodes in {:?}", self);
    }
}

impl<T, A> SegmentTree<T, A> {
    /// The number of elements.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the tree holds no element at all.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The current elements in order.
    pub fn leaves(&self) -> impl Iterator<Item = &T> + '_ {
        self.nodes.iter().skip(self.size)
    }

    /// The positions which hold elements.
    fn borders(&self) -> Range<isize> {
        0..self.size as isize
    }

    fn leaf_idx(&self, index: isize) -> StreeResult<NodeIdx> {
        if self.borders().contains(&index) {
            Ok(NodeIdx(index as usize + self.size))
        } else {
            Err(StreeError::IndexOutOfRange {
                index,
                len: self.size,
            })
        }
    }
}

impl<T: Element, A: Aggregator> SegmentTree<T, A> {
    /// The function this tree aggregates with.
    pub fn function(&self) -> QueryFunction {
        A::FUNCTION
    }
}

impl<T, A> Index<usize> for SegmentTree<T, A> {
    type Output = T;

    /// Gives the element at position `index`.
    /// # Panics
    /// If `index >= len`.
    fn index(&self, index: usize) -> &Self::Output {
        assert!(index < self.size, "position {} is not in 0..{}", index, self.size);
        &self.nodes[NodeIdx(index + self.size)]
    }
}

impl<T: Debug, A: Aggregator> Debug for SegmentTree<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentTree")
            .field("function", &A::FUNCTION)
            .field("leaves", &self.leaves().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: Element, A: Aggregator> RangeTree<T> for SegmentTree<T, A> {
    fn len(&self) -> usize {
        self.size
    }

    fn query(&self, start: isize, end: isize) -> StreeResult<Option<T>> {
        SegmentTree::query(self, start, end)
    }

    fn update(&mut self, index: isize, value: T) -> StreeResult<()> {
        SegmentTree::update(self, index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Max, Min};
    use assert_approx_eq::assert_approx_eq;
    use common::logging::init_test_logging;
    use proptest::prelude::*;

    /// Sums `source[start..end]` without any chance to overflow.
    fn wide_sum(source: &[i64], start: usize, end: usize) -> i128 {
        source[start..end].iter().map(|value| *value as i128).sum()
    }

    #[test]
    fn sum_scenario() -> StreeResult<()> {
        let mut tree = IntSegmentTree::<Sum>::build(&[1, 2, 3, 4, 5])?;
        assert_eq!(tree.query(1, 4)?, Some(9));
        tree.update(0, 10)?;
        assert_eq!(tree.query(0, 3)?, Some(15));
        tree.assert_invariant();
        Ok(())
    }

    #[test]
    fn min_scenario() -> StreeResult<()> {
        let mut tree = IntSegmentTree::<Min>::build(&[5, 3, 8, 1, 9])?;
        assert_eq!(tree.query(0, 5)?, Some(1));
        tree.update(3, 20)?;
        assert_eq!(tree.query(0, 5)?, Some(3));
        tree.assert_invariant();
        Ok(())
    }

    #[test]
    fn max_float_scenario() -> StreeResult<()> {
        let tree = FloatSegmentTree::<Max>::build(&[1.5, 2.5, 0.25])?;
        assert_eq!(tree.query(0, 2)?, Some(2.5));
        assert_eq!(tree.query(2, 3)?, Some(0.25));
        assert_eq!(tree.function(), QueryFunction::Max);
        Ok(())
    }

    #[test]
    fn layout_matches_flat_array() -> StreeResult<()> {
        let tree = IntSegmentTree::<Sum>::build(&[1, 2, 3, 4])?;
        let nodes: Vec<i64> = tree.nodes.iter().copied().collect();
        assert_eq!(nodes, vec![0, 10, 3, 7, 1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn queries_on_ten_elements() -> StreeResult<()> {
        let source = [18, 17, 13, 19, 15, 11, 20, 12, 33, 25];
        let mut tree = IntSegmentTree::<Sum>::build(&source)?;
        assert_eq!(tree.query(0, 3)?, Some(48));
        assert_eq!(tree.query(2, 7)?, Some(78));
        assert_eq!(tree.query(6, 7)?, Some(20));
        assert_eq!(tree.query(0, 10)?, Some(183));

        tree.update(0, 20)?;
        tree.update(3, 14)?;
        assert_eq!(tree.query(0, 3)?, Some(50));
        assert_eq!(tree.query(2, 7)?, Some(73));
        tree.update(7, -10)?;
        assert_eq!(tree.query(5, 9)?, Some(54));
        assert_eq!(tree.query(0, 10)?, Some(158));
        tree.assert_invariant();
        Ok(())
    }

    #[test]
    fn degenerate_ranges_have_no_result() -> StreeResult<()> {
        let tree = IntSegmentTree::<Sum>::build(&[1, 2, 3])?;
        assert_eq!(tree.query(1, 1)?, None);
        assert_eq!(tree.query(2, 1)?, None);
        assert_eq!(tree.query(-1, 2)?, None);
        assert_eq!(tree.query(3, 5)?, None);
        Ok(())
    }

    #[test]
    fn end_beyond_len_is_clamped() -> StreeResult<()> {
        let tree = IntSegmentTree::<Sum>::build(&[1, 2, 3])?;
        assert_eq!(tree.query(1, 100)?, Some(5));
        assert_eq!(tree.query(0, isize::MAX)?, Some(6));
        Ok(())
    }

    #[test]
    fn empty_tree() -> StreeResult<()> {
        let mut tree = FloatSegmentTree::<Min>::build::<f64>(&[])?;
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.query(0, 1)?, None);
        assert_eq!(tree.total(), None);
        assert!(matches!(
            tree.update(0, 1.0),
            Err(StreeError::IndexOutOfRange { index: 0, len: 0 })
        ));
        Ok(())
    }

    #[test]
    fn single_element() -> StreeResult<()> {
        let mut tree = IntSegmentTree::<Max>::build(&[7])?;
        assert_eq!(tree.query(0, 1)?, Some(7));
        assert_eq!(tree.total(), Some(7));
        tree.update(0, -3)?;
        assert_eq!(tree.query(0, 1)?, Some(-3));
        assert_eq!(tree[0], -3);
        Ok(())
    }

    #[test]
    fn out_of_range_update_leaves_tree_unchanged() -> StreeResult<()> {
        let mut tree = IntSegmentTree::<Sum>::build(&[1, 2, 3, 4, 5])?;
        let before = tree.nodes.clone();
        let size = tree.len() as isize;

        for index in &[-1, size, size + 10, isize::MIN] {
            assert!(matches!(
                tree.update(*index, 0),
                Err(StreeError::IndexOutOfRange { .. })
            ));
        }
        assert_eq!(tree.nodes, before);
        Ok(())
    }

    #[test]
    fn build_overflow_fails() {
        init_test_logging();
        assert!(matches!(
            IntSegmentTree::<Sum>::build(&[i64::MAX - 1, 1, 2]),
            Err(StreeError::OverflowError(_))
        ));
        assert!(matches!(
            IntSegmentTree::<Sum>::build(&[i64::MIN + 1, -1, -1]),
            Err(StreeError::OverflowError(_))
        ));
    }

    #[test]
    fn min_max_never_overflow() -> StreeResult<()> {
        let source = [i64::MAX, i64::MAX, i64::MIN, i64::MIN];
        let minima = IntSegmentTree::<Min>::build(&source)?;
        let maxima = IntSegmentTree::<Max>::build(&source)?;
        assert_eq!(minima.total(), Some(i64::MIN));
        assert_eq!(maxima.total(), Some(i64::MAX));
        Ok(())
    }

    #[test]
    fn update_overflow_is_not_rolled_back() -> StreeResult<()> {
        init_test_logging();
        // leaves sit at 3, 4, 5. node 2 = leaves 4 + 5, node 1 = node 2 + leaf 3
        let mut tree = IntSegmentTree::<Sum>::build(&[i64::MAX - 2, 1, 1])?;
        assert_eq!(tree.total(), Some(i64::MAX));

        let err = tree.update(2, 2).unwrap_err();
        assert!(err.is_overflow());

        // leaf and node 2 were rewritten before the root overflowed
        assert_eq!(tree[2], 2);
        assert_eq!(tree.nodes[NodeIdx(2)], 3);
        assert_eq!(tree.nodes[NodeIdx(1)], i64::MAX);
        assert_eq!(tree.stale_nodes(), vec![NodeIdx::ROOT]);

        let mut negative = IntSegmentTree::<Sum>::build(&[i64::MIN + 2, -1, -1])?;
        assert!(negative.update(2, -2).unwrap_err().is_overflow());
        Ok(())
    }

    #[test]
    fn query_overflow_is_reported() -> StreeResult<()> {
        // The root is MAX, but the sum of the first two leaves is not representable.
        let tree = IntSegmentTree::<Sum>::build(&[i64::MAX, 1, -1])?;
        assert_eq!(tree.total(), Some(i64::MAX));
        assert!(tree.query(0, 2).unwrap_err().is_overflow());
        assert_eq!(tree.query(1, 3)?, Some(0));
        Ok(())
    }

    #[test]
    fn query_agrees_with_root_for_large_mixed_values() -> StreeResult<()> {
        // n = 5: the walk over 0..5 visits position 0 before positions 1..3, whose sum is 1.
        let source = [i64::MAX, 1, 0, -1, 0];
        let tree = IntSegmentTree::<Sum>::build(&source)?;
        assert_eq!(tree.total(), Some(i64::MAX));
        assert_eq!(tree.query(0, 5)?, tree.total());

        for start in 0..source.len() {
            for end in start + 1..=source.len() {
                let expected = wide_sum(&source, start, end);
                let queried = tree.query(start as isize, end as isize);
                if expected > i64::MAX as i128 {
                    assert!(queried.unwrap_err().is_overflow(), "{}..{}", start, end);
                } else {
                    assert_eq!(queried?, Some(expected as i64), "{}..{}", start, end);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn narrow_query_accumulates_wider() -> StreeResult<()> {
        let tree = SegmentTree::<i8, Sum>::build(&[127, 1, 0, -1, 0])?;
        assert_eq!(tree.query(0, 5)?, Some(127));
        assert!(tree.query(0, 2).unwrap_err().is_overflow());

        let tree = SegmentTree::<i8, Sum>::build(&[100, 100, -100])?;
        assert_eq!(tree.query(0, 3)?, Some(100));
        assert_eq!(tree.query(1, 3)?, Some(0));
        assert!(tree.query(0, 2).unwrap_err().is_overflow());
        Ok(())
    }

    proptest! {
        #[test]
        fn sum_queries_only_fail_if_the_result_overflows(
            source in prop::collection::vec(prop_oneof![
                prop::num::i64::ANY,
                Just(i64::MAX),
                Just(i64::MIN),
                -3i64..3,
            ], 1..24),
            start in 0usize..24,
            end in 0usize..25,
        ) {
            let end = end.min(source.len());
            prop_assume!(start < end);
            // only trees whose internal nodes fit can be built
            if let Ok(tree) = IntSegmentTree::<Sum>::build(&source) {
                let expected = wide_sum(&source, start, end);
                match tree.query(start as isize, end as isize) {
                    Ok(queried) => prop_assert_eq!(queried.map(|value| value as i128), Some(expected)),
                    Err(err) => {
                        prop_assert!(err.is_overflow());
                        prop_assert!(expected > i64::MAX as i128 || expected < i64::MIN as i128);
                    }
                }
            }
        }
    }

    #[test]
    fn conversion_errors() {
        assert!(matches!(
            IntSegmentTree::<Sum>::build(&[1.0, 2.5]),
            Err(StreeError::ConversionError(_))
        ));
        assert!(matches!(
            SegmentTree::<i32, Max>::build(&[i64::MAX]),
            Err(StreeError::ConversionError(_))
        ));
        let mut tree = IntSegmentTree::<Sum>::build(&[1, 2, 3, 4]).unwrap();
        assert!(matches!(
            tree.update_from(0, 10.5),
            Err(StreeError::ConversionError(_))
        ));
        assert_eq!(tree[0], 1);
    }

    #[test]
    fn float_tree_accepts_exact_integers() -> StreeResult<()> {
        let mut tree = FloatSegmentTree::<Sum>::build(&[1.0, 2.0, 3.0, 4.0])?;
        tree.update_from(0, 2i64)?;
        assert_eq!(tree.query(0, 2)?, Some(4.0));
        Ok(())
    }

    #[test]
    fn float_sums_are_close_to_naive_sums() -> StreeResult<()> {
        let source: Vec<f64> = (0..257).map(|i| (i as f64) * 0.37 - 41.3).collect();
        let tree = FloatSegmentTree::<Sum>::build(&source)?;
        for (start, end) in &[(0usize, 257usize), (13, 200), (100, 101), (256, 257)] {
            let naive: f64 = source[*start..*end].iter().sum();
            let queried = tree.query(*start as isize, *end as isize)?.unwrap();
            assert_approx_eq!(queried, naive, 1e-9);
        }
        Ok(())
    }

    #[test]
    fn leaves_and_debug_show_current_values() -> StreeResult<()> {
        let mut tree = IntSegmentTree::<Min>::build(&[4, 5, 6])?;
        tree.update(1, 0)?;
        assert_eq!(tree.leaves().copied().collect::<Vec<_>>(), vec![4, 0, 6]);
        assert_eq!(
            format!("{:?}", tree),
            "SegmentTree { function: Min, leaves: [4, 0, 6] }"
        );
        Ok(())
    }
}
