//! The combining functions a [SegmentTree](crate::SegmentTree) aggregates with.

use std::{fmt::Display, str::FromStr};

use common::{StreeError, StreeResult};
use serde::{Deserialize, Serialize};

use crate::Element;

/// Names the aggregation function of a tree at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryFunction {
    /// Range sums, checked for overflow on integer elements.
    Sum,
    /// Range minima.
    Min,
    /// Range maxima.
    Max,
}

impl Default for QueryFunction {
    fn default() -> Self {
        QueryFunction::Sum
    }
}

impl QueryFunction {
    /// All supported functions.
    pub const ALL: [QueryFunction; 3] = [QueryFunction::Sum, QueryFunction::Min, QueryFunction::Max];

    /// The name this function is parsed from.
    pub fn name(self) -> &'static str {
        match self {
            QueryFunction::Sum => "sum",
            QueryFunction::Min => "min",
            QueryFunction::Max => "max",
        }
    }
}

impl Display for QueryFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.name().fmt(f)
    }
}

impl FromStr for QueryFunction {
    type Err = StreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(QueryFunction::Sum),
            "min" => Ok(QueryFunction::Min),
            "max" => Ok(QueryFunction::Max),
            other => Err(StreeError::InvalidArgument(format!(
                "Invalid function {:?}, must be 'sum', 'min' or 'max'",
                other
            ))),
        }
    }
}

/// A combining strategy which is fixed at compile time.
/// `combine` has to be associative and commutative, as the query walk folds
/// the left and right border nodes into the same accumulator.
pub trait Aggregator: Copy + Default + std::fmt::Debug {
    /// The runtime name of this strategy.
    const FUNCTION: QueryFunction;

    /// Combines the values of two sibling nodes (or an accumulator and a node).
    fn combine<T: Element>(left: T, right: T) -> StreeResult<T>;

    /// The value a query starts from, if the function has one.
    /// Functions without identity start from the leftmost queried leaf instead,
    /// which only works for idempotent functions.
    fn identity<T: Element>() -> Option<T>;
}

/// Aggregates by (checked) addition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sum;

/// Aggregates by taking the minimum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Min;

/// Aggregates by taking the maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Max;

impl Aggregator for Sum {
    const FUNCTION: QueryFunction = QueryFunction::Sum;

    #[inline]
    fn combine<T: Element>(left: T, right: T) -> StreeResult<T> {
        left.checked_sum(right).ok_or_else(|| {
            StreeError::OverflowError(format!(
                "{:?} + {:?} exceeds the range of {}",
                left,
                right,
                std::any::type_name::<T>()
            ))
        })
    }

    #[inline]
    fn identity<T: Element>() -> Option<T> {
        Some(T::zero())
    }
}

impl Aggregator for Min {
    const FUNCTION: QueryFunction = QueryFunction::Min;

    #[inline]
    fn combine<T: Element>(left: T, right: T) -> StreeResult<T> {
        Ok(if right < left { right } else { left })
    }

    #[inline]
    fn identity<T: Element>() -> Option<T> {
        None
    }
}

impl Aggregator for Max {
    const FUNCTION: QueryFunction = QueryFunction::Max;

    #[inline]
    fn combine<T: Element>(left: T, right: T) -> StreeResult<T> {
        Ok(if right > left { right } else { left })
    }

    #[inline]
    fn identity<T: Element>() -> Option<T> {
        None
    }
}
