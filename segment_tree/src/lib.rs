#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
#![cfg_attr(feature = "strict", deny(missing_docs))]

//! This crate contains an array backed segment tree for range sums, minima and maxima
//! over a fixed number of numeric elements.
//!
//! The elements live in the second half of a flat array of `2n` nodes and every internal node
//! `i` aggregates its children `2i` and `2i + 1`. Point updates and range queries walk
//! this array bottom up in O(log n) without recursion.

use common::StreeResult;

/// A trait which abstracts over the segment tree types.
/// Positions are signed so that hosts can hand over negative positions unchecked:
/// queries answer them with `None`, updates with an error.
/// # Example
/// Let's track the best score per round and ask for the best score over some rounds,
/// independent of the tree flavour used.
/// ```
/// # use segment_tree::*;
/// # use common::StreeResult;
/// fn best_of<R: RangeTree<i64>>(scores: &mut R, rounds: std::ops::Range<isize>) -> StreeResult<Option<i64>> {
///     scores.update(0, 3)?;
///     scores.query(rounds.start, rounds.end)
/// }
/// let mut typed = SegmentTree::<i64, Max>::build(&[1, 7, 2]).unwrap();
/// let mut closure = FnSegmentTree::new(vec![1, 7, 2], |a: &i64, b: &i64| *a.max(b));
/// assert_eq!(best_of(&mut typed, 0..1).unwrap(), Some(3));
/// assert_eq!(best_of(&mut closure, 0..3).unwrap(), Some(7));
/// ```
pub trait RangeTree<T> {
    /// The number of elements.
    fn len(&self) -> usize;

    /// Whether the tree holds no element at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregates the elements at `start..end`.
    /// Gives `Ok(None)` if there is no element in this range.
    fn query(&self, start: isize, end: isize) -> StreeResult<Option<T>>;

    /// Sets the element at `index` to `value`.
    fn update(&mut self, index: isize, value: T) -> StreeResult<()>;
}

mod element;
pub use element::{convert, Element};

mod aggregator;
pub use aggregator::{Aggregator, Max, Min, QueryFunction, Sum};

mod tree;
pub use tree::{FloatSegmentTree, IntSegmentTree, NodeIdx, SegmentTree};

mod custom;
pub use custom::FnSegmentTree;

mod dynamic;
pub use dynamic::DynSegmentTree;

mod auto;
pub use auto::{stree, Number, NumericTree};

mod range;
