//! Segment trees whose aggregation function is chosen at runtime.

use std::fmt::Debug;

use common::StreeResult;
use num::NumCast;

use super::{Element, Max, Min, QueryFunction, RangeTree, SegmentTree, Sum};

/// A [SegmentTree] whose aggregation function is picked at runtime.
/// The function is matched once per call, the walks themselves are monomorphized.
#[derive(Debug, Clone)]
pub enum DynSegmentTree<T> {
    /// Aggregates sums.
    Sum(SegmentTree<T, Sum>),
    /// Aggregates minima.
    Min(SegmentTree<T, Min>),
    /// Aggregates maxima.
    Max(SegmentTree<T, Max>),
}

macro_rules! dispatch {
    ($tree:expr, $inner:ident => $body:expr) => {
        match $tree {
            DynSegmentTree::Sum($inner) => $body,
            DynSegmentTree::Min($inner) => $body,
            DynSegmentTree::Max($inner) => $body,
        }
    };
}

impl<T: Element> DynSegmentTree<T> {
    /// Builds a tree over `source` aggregating with `function`.
    /// # Errors
    /// Refer to [SegmentTree::build].
    pub fn build<I>(source: &[I], function: QueryFunction) -> StreeResult<Self>
    where
        I: NumCast + PartialEq + Copy + Debug,
    {
        Ok(match function {
            QueryFunction::Sum => DynSegmentTree::Sum(SegmentTree::build(source)?),
            QueryFunction::Min => DynSegmentTree::Min(SegmentTree::build(source)?),
            QueryFunction::Max => DynSegmentTree::Max(SegmentTree::build(source)?),
        })
    }

    /// Builds a tree over `source` aggregating with the function called `name`.
    /// # Errors
    /// [StreeError::InvalidArgument](common::StreeError::InvalidArgument) if `name` is not one of
    /// `"sum"`, `"min"` or `"max"`, otherwise refer to [SegmentTree::build].
    /// # Example
    /// ```
    /// # use segment_tree::DynSegmentTree;
    /// let tree = DynSegmentTree::<f64>::with_function_name(&[1.5, 2.5, 0.25], "max").unwrap();
    /// assert_eq!(tree.query(0, 2).unwrap(), Some(2.5));
    /// assert!(DynSegmentTree::<f64>::with_function_name(&[1.5], "avg").is_err());
    /// ```
    pub fn with_function_name<I>(source: &[I], name: &str) -> StreeResult<Self>
    where
        I: NumCast + PartialEq + Copy + Debug,
    {
        Self::build(source, name.parse()?)
    }

    /// The function this tree aggregates with.
    pub fn function(&self) -> QueryFunction {
        dispatch!(self, tree => tree.function())
    }

    /// Refer to [SegmentTree::query].
    pub fn query(&self, start: isize, end: isize) -> StreeResult<Option<T>> {
        dispatch!(self, tree => tree.query(start, end))
    }

    /// Refer to [SegmentTree::update].
    pub fn update(&mut self, index: isize, value: T) -> StreeResult<()> {
        dispatch!(self, tree => tree.update(index, value))
    }

    /// Refer to [SegmentTree::update_from].
    pub fn update_from<I>(&mut self, index: isize, value: I) -> StreeResult<()>
    where
        I: NumCast + PartialEq + Copy + Debug,
    {
        dispatch!(self, tree => tree.update_from(index, value))
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        dispatch!(self, tree => tree.len())
    }

    /// Whether the tree holds no element at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Element> RangeTree<T> for DynSegmentTree<T> {
    fn len(&self) -> usize {
        DynSegmentTree::len(self)
    }

    fn query(&self, start: isize, end: isize) -> StreeResult<Option<T>> {
        DynSegmentTree::query(self, start, end)
    }

    fn update(&mut self, index: isize, value: T) -> StreeResult<()> {
        DynSegmentTree::update(self, index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::StreeError;

    #[test]
    fn picks_the_named_function() -> StreeResult<()> {
        let source = [5, 3, 8, 1, 9];
        for (name, expected) in &[("sum", 26), ("min", 1), ("max", 9)] {
            let tree = DynSegmentTree::<i64>::with_function_name(&source, name)?;
            assert_eq!(tree.function().name(), *name);
            assert_eq!(tree.query(0, 5)?, Some(*expected));
            assert_eq!(tree.len(), 5);
        }
        Ok(())
    }

    #[test]
    fn unknown_function_is_invalid_argument() {
        assert!(matches!(
            DynSegmentTree::<i64>::with_function_name(&[1, 2], "median"),
            Err(StreeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn errors_pass_through() {
        assert!(matches!(
            DynSegmentTree::<i64>::build(&[i64::MAX, 1], QueryFunction::Sum),
            Err(StreeError::OverflowError(_))
        ));
        let mut tree = DynSegmentTree::<i64>::build(&[1, 2], QueryFunction::Min).unwrap();
        assert!(matches!(
            tree.update(2, 0),
            Err(StreeError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            tree.update_from(0, 0.5),
            Err(StreeError::ConversionError(_))
        ));
    }

    #[test]
    fn updates_reach_the_inner_tree() -> StreeResult<()> {
        let mut tree = DynSegmentTree::<f64>::build(&[1.0, 2.0, 3.0], QueryFunction::Max)?;
        tree.update(0, 10.0)?;
        assert_eq!(tree.query(0, 3)?, Some(10.0));
        tree.update_from(0, -1i64)?;
        assert_eq!(tree.query(0, 3)?, Some(3.0));
        Ok(())
    }
}
