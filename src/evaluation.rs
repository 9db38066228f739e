//! Parallel evaluation of a model function over independent samples.
//!
//! Each sample is described by a [`SampleInputs`] map. The function is run
//! once per sample on a dedicated worker pool and the results come back in
//! input order. Every invocation receives its own copy of the merged inputs,
//! so no state is shared between samples beyond what the function itself
//! captures immutably.
//!
//! # Examples
//!
//! ```
//! use u_integrity::{evaluate, SampleInputs};
//!
//! let inputs: Vec<SampleInputs> = (0..4)
//!     .map(|i| SampleInputs::from_iter([("x", i as f64)]))
//!     .collect();
//! let squares = evaluate(
//!     |s: &SampleInputs| s.get("x").map(|x| x * x),
//!     &inputs,
//!     Some(2),
//!     None,
//! )
//! .unwrap();
//! assert_eq!(squares, vec![0.0, 1.0, 4.0, 9.0]);
//! ```

use std::collections::BTreeMap;
use std::fmt::Display;
use std::num::NonZeroUsize;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{IntegrityError, Result};

/// Named scalar inputs of one sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleInputs(BTreeMap<String, f64>);

impl SampleInputs {
    /// Creates an empty input map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of input `name`.
    ///
    /// # Errors
    ///
    /// [`IntegrityError::MissingInput`] if the input is absent.
    pub fn get(&self, name: &str) -> Result<f64> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| IntegrityError::MissingInput(name.to_string()))
    }

    /// Value of input `name`, or `default` if absent.
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.0.get(name).copied().unwrap_or(default)
    }

    /// Sets input `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(name.into(), value)
    }

    /// Whether input `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of inputs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map holds no inputs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Copy of `self` with every entry of `fixed` added.
    ///
    /// On a shared key the value from `self` wins.
    pub fn merged_with(&self, fixed: &SampleInputs) -> SampleInputs {
        let mut merged = fixed.clone();
        merged
            .0
            .extend(self.0.iter().map(|(k, &v)| (k.clone(), v)));
        merged
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for SampleInputs {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<K: Into<String>> Extend<(K, f64)> for SampleInputs {
    fn extend<I: IntoIterator<Item = (K, f64)>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
    }
}

/// Worker-pool configuration for [`evaluate`].
///
/// # Examples
///
/// ```
/// use u_integrity::{ParallelEvaluator, SampleInputs};
///
/// let fixed = SampleInputs::from_iter([("offset", 10.0)]);
/// let evaluator = ParallelEvaluator::new().with_workers(2).with_fixed_inputs(fixed);
/// let inputs = vec![SampleInputs::from_iter([("x", 1.0)])];
/// let out = evaluator
///     .evaluate(|s: &SampleInputs| Ok::<_, u_integrity::IntegrityError>(s.get("x")? + s.get("offset")?), &inputs)
///     .unwrap();
/// assert_eq!(out, vec![11.0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParallelEvaluator {
    workers: Option<usize>,
    fixed_inputs: Option<SampleInputs>,
}

impl ParallelEvaluator {
    /// Evaluator using every available core and no fixed inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Sets inputs merged into every sample.
    pub fn with_fixed_inputs(mut self, fixed_inputs: SampleInputs) -> Self {
        self.fixed_inputs = Some(fixed_inputs);
        self
    }

    /// Runs `function` over `inputs`. See [`evaluate`].
    pub fn evaluate<F, T, E>(&self, function: F, inputs: &[SampleInputs]) -> Result<Vec<T>>
    where
        F: Fn(&SampleInputs) -> std::result::Result<T, E> + Sync,
        T: Send,
        E: Display,
    {
        evaluate(function, inputs, self.workers, self.fixed_inputs.as_ref())
    }
}

/// Evaluates `function` once per sample in parallel.
///
/// - `worker_count` defaults to the number of available cores
/// - `fixed_inputs` are merged into each sample's map; a sample's own value
///   takes precedence on a shared key
///
/// Results are returned in the order of `inputs`. An empty `inputs` slice
/// yields an empty result without starting a pool.
///
/// # Errors
///
/// - [`IntegrityError::InvalidWorkerCount`] if `worker_count` is `Some(0)`
/// - [`IntegrityError::WorkerPool`] if the pool cannot be started
/// - [`IntegrityError::Evaluation`] if `function` fails for a sample; the
///   whole call fails and partial results are discarded
pub fn evaluate<F, T, E>(
    function: F,
    inputs: &[SampleInputs],
    worker_count: Option<usize>,
    fixed_inputs: Option<&SampleInputs>,
) -> Result<Vec<T>>
where
    F: Fn(&SampleInputs) -> std::result::Result<T, E> + Sync,
    T: Send,
    E: Display,
{
    let workers = match worker_count {
        Some(0) => return Err(IntegrityError::InvalidWorkerCount(0)),
        Some(n) => n,
        None => std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1),
    };
    if inputs.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| IntegrityError::WorkerPool(e.to_string()))?;

    info!(samples = inputs.len(), workers, "starting parallel evaluation");

    let results = pool.install(|| {
        inputs
            .par_iter()
            .enumerate()
            .map(|(index, sample)| {
                let merged = match fixed_inputs {
                    Some(fixed) => sample.merged_with(fixed),
                    None => sample.clone(),
                };
                function(&merged).map_err(|e| IntegrityError::Evaluation {
                    index,
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<T>>>()
    });

    match &results {
        Ok(values) => info!(samples = values.len(), "parallel evaluation finished"),
        Err(e) => warn!(error = %e, "parallel evaluation failed"),
    }
    results
}
