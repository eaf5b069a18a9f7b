//! Trees over untyped numeric input, as handed over by a host application or a json file.

use std::fmt::Display;

use common::{StreeError, StreeResult};
use num::{BigInt, FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use super::{DynSegmentTree, Element, FnSegmentTree, QueryFunction, RangeTree};

/// A number whose type is only known at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// An integer beyond the range of `i64`, written as a decimal string in json.
    Big(#[serde(with = "decimal_string")] BigInt),
}

mod decimal_string {
    use num::BigInt;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(D::Error::custom)
    }
}

impl Number {
    /// Converts this number losslessly into the element type `T`.
    pub fn convert<T: Element>(&self) -> StreeResult<T> {
        match self {
            Number::Int(value) => super::convert(*value),
            Number::Float(value) => super::convert(*value),
            Number::Big(value) => match value.to_i128() {
                Some(value) => super::convert(value),
                None => Err(StreeError::ConversionError(format!(
                    "{} can not be represented as {}",
                    value,
                    std::any::type_name::<T>()
                ))),
            },
        }
    }

    /// Converts this number into an arbitrary precision integer.
    /// # Errors
    /// [StreeError::ConversionError] for floats with a fractional part or which are not finite.
    pub fn to_big(&self) -> StreeResult<BigInt> {
        match self {
            Number::Int(value) => Ok(BigInt::from(*value)),
            Number::Big(value) => Ok(value.clone()),
            Number::Float(value) if value.fract() == 0.0 => BigInt::from_f64(*value)
                .ok_or_else(|| StreeError::ConversionError(format!("{} is not finite", value))),
            Number::Float(value) => Err(StreeError::ConversionError(format!(
                "{} is not an integer",
                value
            ))),
        }
    }

    /// Gives `Int` if `value` fits into `i64`.
    fn from_big(value: BigInt) -> Self {
        match value.to_i64() {
            Some(small) => Number::Int(small),
            None => Number::Big(value),
        }
    }

    fn is_integral(&self) -> bool {
        !matches!(self, Number::Float(_))
    }
}

// Compares by numeric value, so `Int(2) == Float(2.0)`.
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(left), Number::Int(right)) => left == right,
            (Number::Float(left), Number::Float(right)) => left == right,
            (Number::Int(int), Number::Float(float)) | (Number::Float(float), Number::Int(int)) => {
                float.to_i64() == Some(*int) && *int as f64 == *float
            }
            (left, right) => match (left.to_big(), right.to_big()) {
                (Ok(left), Ok(right)) => left == right,
                _ => false,
            },
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::from_big(value)
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(value) => value.fmt(f),
            Number::Float(value) => value.fmt(f),
            Number::Big(value) => value.fmt(f),
        }
    }
}

type BigCombine = fn(&BigInt, &BigInt) -> BigInt;

fn big_sum(left: &BigInt, right: &BigInt) -> BigInt {
    left + right
}

fn big_min(left: &BigInt, right: &BigInt) -> BigInt {
    left.min(right).clone()
}

fn big_max(left: &BigInt, right: &BigInt) -> BigInt {
    left.max(right).clone()
}

/// A tree whose element type was detected from its source.
#[derive(Debug, Clone)]
pub enum NumericTree {
    /// Holds `i64` elements, sums are checked.
    Int(DynSegmentTree<i64>),
    /// Holds `f64` elements.
    Float(DynSegmentTree<f64>),
    /// Holds arbitrary precision integers, used when an integer source overflows `i64`.
    Big {
        /// The function the tree aggregates with.
        function: QueryFunction,
        /// The tree itself.
        tree: FnSegmentTree<BigInt, BigCombine>,
    },
}

/// Builds the fastest fitting tree for `source`.
///
/// If every element is an integer the tree holds `i64`. Should the source not fit
/// (an element or a sum of the build leaves the range of `i64`) it holds
/// arbitrary precision integers instead, which never overflow but are much slower.
/// If any element is a float the tree holds `f64`.
/// An empty source gives an (empty) `i64` tree.
/// # Errors
/// Refer to [SegmentTree::build](crate::SegmentTree::build). In particular a float tree
/// rejects integers which can not be represented exactly as `f64`.
/// # Example
/// ```
/// # use segment_tree::{stree, Number, NumericTree, QueryFunction, RangeTree};
/// let ints = stree(&[Number::Int(1), Number::Int(2)], QueryFunction::Sum).unwrap();
/// assert!(matches!(ints, NumericTree::Int(_)));
///
/// let mixed = stree(&[Number::Int(1), Number::Float(2.5)], QueryFunction::Max).unwrap();
/// assert_eq!(mixed.query(0, 2).unwrap(), Some(Number::Float(2.5)));
///
/// let huge = stree(&[Number::Int(i64::MAX), Number::Int(1)], QueryFunction::Sum).unwrap();
/// assert_eq!(huge.element_type(), "bigint");
/// assert_eq!(huge.query(0, 2).unwrap().unwrap().to_string(), "9223372036854775808");
/// ```
pub fn stree(source: &[Number], function: QueryFunction) -> StreeResult<NumericTree> {
    let tree = if source.iter().all(Number::is_integral) {
        let ints = source
            .iter()
            .map(Number::convert::<i64>)
            .collect::<StreeResult<Vec<i64>>>();
        match ints.and_then(|ints| DynSegmentTree::build(&ints, function)) {
            Ok(tree) => NumericTree::Int(tree),
            Err(StreeError::OverflowError(_)) | Err(StreeError::ConversionError(_)) => {
                log::info!("Source does not fit into i64, falling back to arbitrary precision");
                NumericTree::big(source, function)?
            }
            Err(err) => return Err(err),
        }
    } else {
        let floats = source
            .iter()
            .map(Number::convert::<f64>)
            .collect::<StreeResult<Vec<f64>>>()?;
        NumericTree::Float(DynSegmentTree::build(&floats, function)?)
    };
    log::debug!(
        "Detected {} elements for {} values",
        tree.element_type(),
        source.len()
    );
    Ok(tree)
}

impl NumericTree {
    fn big(source: &[Number], function: QueryFunction) -> StreeResult<Self> {
        let leaves = source
            .iter()
            .map(Number::to_big)
            .collect::<StreeResult<Vec<BigInt>>>()?;
        let combine: BigCombine = match function {
            QueryFunction::Sum => big_sum,
            QueryFunction::Min => big_min,
            QueryFunction::Max => big_max,
        };
        Ok(NumericTree::Big {
            function,
            tree: FnSegmentTree::new(leaves, combine),
        })
    }

    /// The name of the element type.
    pub fn element_type(&self) -> &'static str {
        match self {
            NumericTree::Int(_) => "int",
            NumericTree::Float(_) => "float",
            NumericTree::Big { .. } => "bigint",
        }
    }

    /// The function this tree aggregates with.
    pub fn function(&self) -> QueryFunction {
        match self {
            NumericTree::Int(tree) => tree.function(),
            NumericTree::Float(tree) => tree.function(),
            NumericTree::Big { function, .. } => *function,
        }
    }

    /// Refer to [SegmentTree::update_from](crate::SegmentTree::update_from).
    /// An arbitrary precision tree accepts every integral value.
    pub fn update_from(&mut self, index: isize, value: Number) -> StreeResult<()> {
        match self {
            NumericTree::Int(tree) => tree.update(index, value.convert()?),
            NumericTree::Float(tree) => tree.update(index, value.convert()?),
            NumericTree::Big { tree, .. } => tree.update(index, value.to_big()?),
        }
    }
}

impl RangeTree<Number> for NumericTree {
    fn len(&self) -> usize {
        match self {
            NumericTree::Int(tree) => tree.len(),
            NumericTree::Float(tree) => tree.len(),
            NumericTree::Big { tree, .. } => tree.len(),
        }
    }

    fn query(&self, start: isize, end: isize) -> StreeResult<Option<Number>> {
        Ok(match self {
            NumericTree::Int(tree) => tree.query(start, end)?.map(Number::Int),
            NumericTree::Float(tree) => tree.query(start, end)?.map(Number::Float),
            NumericTree::Big { tree, .. } => tree.query(start, end).map(Number::from_big),
        })
    }

    fn update(&mut self, index: isize, value: Number) -> StreeResult<()> {
        self.update_from(index, value)
    }
}
