//! Replays scripted queries and updates against an automatically typed tree.
use common::StreeResult;
use segment_tree::{stree, Number, QueryFunction, RangeTree};
use serde::{Deserialize, Serialize};

/// A source to build a tree from and the operations to run on it, in order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Script {
    /// The initial elements.
    pub source: Vec<Number>,
    /// Defaults to sum.
    #[serde(default)]
    pub function: QueryFunction,
    /// The operations to run.
    pub operations: Vec<Operation>,
}

/// A single step of a [Script].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Aggregates `start..end`.
    Query {
        /// First position.
        start: isize,
        /// Position after the last one.
        end: isize,
    },
    /// Sets the element at `index`.
    Update {
        /// The position to set.
        index: isize,
        /// The new element.
        value: Number,
    },
}

/// What an [Operation] resulted in.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// A query finished, `null` if the range held no element.
    Result(Option<Number>),
    /// An update finished.
    Updated,
    /// The operation failed with this message.
    Error(String),
}

/// The output of [replay].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Replay {
    /// `"int"`, `"float"` or `"bigint"`, as detected from the source.
    pub element_type: String,
    /// The aggregation function.
    pub function: QueryFunction,
    /// The number of elements.
    pub len: usize,
    /// One outcome per operation, in order.
    pub outcomes: Vec<Outcome>,
}

/// Builds the tree for `script` and runs all of its operations.
/// A failing operation is recorded as [Outcome::Error] and the replay goes on
/// with the tree in whatever state the operation left it.
/// # Errors
/// If the tree can not be built.
pub fn replay(script: &Script) -> StreeResult<Replay> {
    let mut tree = stree(&script.source, script.function).map_err(|error| {
        log::error!("Could not build the tree: {}", error);
        error
    })?;

    let outcomes = script
        .operations
        .iter()
        .map(|operation| {
            let outcome = match operation {
                Operation::Query { start, end } => tree.query(*start, *end).map(Outcome::Result),
                Operation::Update { index, value } => {
                    tree.update(*index, value.clone()).map(|()| Outcome::Updated)
                }
            };
            outcome.unwrap_or_else(|error| {
                log::warn!("{:?} failed: {}", operation, error);
                Outcome::Error(error.to_string())
            })
        })
        .collect();

    Ok(Replay {
        element_type: tree.element_type().to_string(),
        function: tree.function(),
        len: tree.len(),
        outcomes,
    })
}
