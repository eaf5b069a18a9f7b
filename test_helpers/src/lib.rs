#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
#![cfg_attr(feature = "strict", deny(missing_docs))]
//! This crate contains stuff that's really helpful for tests.
use std::ops::Range;

use common::{StreeError, StreeResult};
use proptest::prelude::*;

/// A naive range tree, which folds over its elements on every query.
/// Trees can be checked against it.
#[derive(Debug, Clone)]
pub struct VerifyTree<T, F> {
    elements: Vec<T>,
    func: F,
}

impl<T, F> VerifyTree<T, F>
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    /// Creates a naive tree over `elements`, folding with `func`.
    pub fn new(elements: Vec<T>, func: F) -> Self {
        Self { elements, func }
    }

    /// Folds the elements at `start..end` from left to right.
    /// `None` for negative starts and if there is no element in the range.
    /// # Runtime
    /// O(n)
    pub fn query(&self, start: isize, end: isize) -> Option<T> {
        if start < 0 || end <= start {
            return None;
        }
        let end = (end as usize).min(self.elements.len());
        let start = (start as usize).min(end);

        let func = &self.func;
        self.elements[start..end]
            .iter()
            .copied()
            .fold(None, |acc, value| match acc {
                Some(acc) => Some(func(acc, value)),
                None => Some(value),
            })
    }

    /// Sets the element at `index` to `value`.
    /// # Errors
    /// [StreeError::IndexOutOfRange] if `index` is not in `0..len`.
    pub fn update(&mut self, index: isize, value: T) -> StreeResult<()> {
        let len = self.elements.len();
        if index < 0 || index as usize >= len {
            return Err(StreeError::IndexOutOfRange { index, len });
        }
        self.elements[index as usize] = value;
        Ok(())
    }

    /// The current elements in order.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether there are no elements at all.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// The absolute value of elements generated by [small_values].
/// Sums over up to `2^20` of them can not overflow any signed type of at least 32 bits
/// and are exact in `f64`.
pub const SMALL_VALUE_BOUND: i64 = 1000;

/// Gives a strategy generating a single small integer.
pub fn small_value() -> impl Strategy<Value = i64> {
    -SMALL_VALUE_BOUND..=SMALL_VALUE_BOUND
}

/// Gives a strategy generating up to `max_len` many small integers.
pub fn small_values(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(small_value(), 0..=max_len)
}

/// Gives a strategy generating query ranges for a tree with `len` elements.
/// Both bounds may lie a bit outside of `0..len` and the range may be inverted.
pub fn query_range(len: usize) -> impl Strategy<Value = Range<isize>> {
    let len = len as isize;
    (-2..len + 3, -2..len + 3).prop_map(|(start, end)| start..end)
}

prop_compose! {
    /// Gives a strategy generating a source of up to `max_len` small integers
    /// together with `1..queries` many ranges to query it with.
    pub fn source_with_ranges(max_len: usize, queries: usize)
        (source in small_values(max_len))
        (ranges in prop::collection::vec(query_range(source.len()), 1..queries), source in Just(source))
        -> (Vec<i64>, Vec<Range<isize>>) {
        (source, ranges)
    }
}

prop_compose! {
    /// Gives a strategy generating a source of up to `max_len` small integers
    /// together with `1..updates` many updates given as `(index, value)`.
    /// Some indices lie outside of the source.
    pub fn source_with_updates(max_len: usize, updates: usize)
        (source in small_values(max_len))
        (updates in prop::collection::vec((-1..source.len() as isize + 2, small_value()), 1..updates),
         source in Just(source))
        -> (Vec<i64>, Vec<(isize, i64)>) {
        (source, updates)
    }
}
