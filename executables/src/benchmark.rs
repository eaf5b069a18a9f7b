//! Timing of build, query and update runs over random trees.
use std::{path::Path, time::Instant};

use common::{StreeError, StreeResult};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use segment_tree::{DynSegmentTree, Element, QueryFunction};
use serde::{Deserialize, Serialize};

/// Must always match config/benchmark/default.dhall
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BenchConfig {
    /// Number of elements of the measured trees.
    pub sizes: Vec<u64>,
    /// `"int"` or `"float"`.
    pub element_types: Vec<String>,
    /// `"sum"`, `"min"` or `"max"`.
    pub functions: Vec<String>,
    /// Number of queries and of updates per run.
    pub operations: u64,
    /// Number of runs per measurement.
    pub repeat: u64,
    /// Seed for the random elements and positions.
    pub seed: u64,
    /// Elements are drawn from `-value_bound..value_bound`.
    pub value_bound: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sizes: vec![1000, 10_000, 100_000],
            element_types: vec!["int".into(), "float".into()],
            functions: QueryFunction::ALL.iter().map(|f| f.name().into()).collect(),
            operations: 1000,
            repeat: 5,
            seed: 42,
            value_bound: 1_000_000,
        }
    }
}

impl BenchConfig {
    /// Config from dhall file
    pub fn from_file<P: AsRef<Path>>(path: P) -> StreeResult<Self> {
        let config: BenchConfig = serde_dhall::from_file(path).parse()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> StreeResult<()> {
        if self.repeat == 0 {
            return Err(StreeError::InvalidArgument(
                "repeat has to be at least 1".into(),
            ));
        }
        if self.value_bound == 0 || self.value_bound > i32::MAX as u64 {
            return Err(StreeError::InvalidArgument(format!(
                "value_bound has to be in 1..={}, got {}",
                i32::MAX,
                self.value_bound
            )));
        }
        for name in &self.element_types {
            ElementType::parse(name)?;
        }
        for name in &self.functions {
            name.parse::<QueryFunction>()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ElementType {
    Int,
    Float,
}

impl ElementType {
    fn parse(name: &str) -> StreeResult<Self> {
        match name {
            "int" => Ok(ElementType::Int),
            "float" => Ok(ElementType::Float),
            other => Err(StreeError::InvalidArgument(format!(
                "Unknown element type {}. Valid options: \"int\", \"float\".",
                other
            ))),
        }
    }
}

/// Summary of repeated time measurements in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Fastest run.
    pub min: f64,
    /// Slowest run.
    pub max: f64,
    /// Average over all runs.
    pub mean: f64,
}

impl Stats {
    /// Summarizes `samples`, `None` if there are none.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        Some(Self { min, max, mean })
    }
}

/// Runs `run` `repeat` times and gives the duration of every run in seconds.
/// Stops at the first failing run.
pub fn time_runs<F>(repeat: u64, mut run: F) -> StreeResult<Vec<f64>>
where
    F: FnMut() -> StreeResult<()>,
{
    (0..repeat)
        .map(|_| {
            let start = Instant::now();
            run()?;
            Ok(start.elapsed().as_secs_f64())
        })
        .collect()
}

/// The measurements for one tree configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchResult {
    /// `"int"` or `"float"`.
    pub element_type: String,
    /// The aggregation function of the measured trees.
    pub function: QueryFunction,
    /// Number of elements.
    pub size: u64,
    /// Building a tree from scratch.
    pub build: Stats,
    /// `operations` many queries on random ranges.
    pub query: Stats,
    /// `operations` many updates at random positions.
    pub update: Stats,
}

/// Measures every combination of size, element type and function in `config`.
/// # Errors
/// - [StreeError::InvalidArgument] on unknown element types or function names.
/// - Any error a tree operation reports during the runs.
pub fn run_benchmark(config: &BenchConfig) -> StreeResult<Vec<BenchResult>> {
    config.validate()?;
    let mut results = Vec::new();

    for size in &config.sizes {
        for element_type in &config.element_types {
            for function in &config.functions {
                let function: QueryFunction = function.parse()?;
                let mut rng = XorShiftRng::seed_from_u64(config.seed);
                let bound = config.value_bound as i64;

                log::info!(
                    "Measuring {} {} tree with {} elements",
                    element_type,
                    function,
                    size
                );
                let (build, query, update) = match ElementType::parse(element_type)? {
                    ElementType::Int => {
                        measure(config, *size, function, &mut rng, |rng| {
                            rng.gen_range(-bound..bound)
                        })?
                    }
                    ElementType::Float => {
                        measure(config, *size, function, &mut rng, |rng| {
                            rng.gen_range(-bound as f64..bound as f64)
                        })?
                    }
                };

                results.push(BenchResult {
                    element_type: element_type.clone(),
                    function,
                    size: *size,
                    build,
                    query,
                    update,
                });
            }
        }
    }
    Ok(results)
}

fn measure<T, G>(
    config: &BenchConfig,
    size: u64,
    function: QueryFunction,
    rng: &mut XorShiftRng,
    mut random_element: G,
) -> StreeResult<(Stats, Stats, Stats)>
where
    T: Element,
    G: FnMut(&mut XorShiftRng) -> T,
{
    let size = size as usize;
    let source: Vec<T> = (0..size).map(|_| random_element(rng)).collect();

    let build = time_runs(config.repeat, || {
        DynSegmentTree::<T>::build(source.as_slice(), function).map(|_| ())
    })?;

    // An empty tree has no positions to pick from, its runs stay empty.
    let operations = if size == 0 { 0 } else { config.operations };
    let ranges: Vec<(isize, isize)> = (0..operations)
        .map(|_| {
            let start = rng.gen_range(0..size);
            let end = rng.gen_range(start + 1..=size);
            (start as isize, end as isize)
        })
        .collect();
    let updates: Vec<(isize, T)> = (0..operations)
        .map(|_| (rng.gen_range(0..size) as isize, random_element(rng)))
        .collect();

    let mut tree = DynSegmentTree::<T>::build(source.as_slice(), function)?;
    let query = time_runs(config.repeat, || {
        for (start, end) in &ranges {
            tree.query(*start, *end)?;
        }
        Ok(())
    })?;
    let update = time_runs(config.repeat, || {
        for (index, value) in &updates {
            tree.update(*index, *value)?;
        }
        Ok(())
    })?;

    Ok((
        summarize(&build)?,
        summarize(&query)?,
        summarize(&update)?,
    ))
}

fn summarize(samples: &[f64]) -> StreeResult<Stats> {
    Stats::from_samples(samples)
        .ok_or_else(|| StreeError::InvalidArgument("No runs were measured".into()))
}
