//! Error type shared by every module of the crate.
//!
//! All validation happens at construction time, so an entity that exists is
//! always physically consistent. Each variant carries enough context (the
//! parameter name, the offending values, the expected length) for a caller
//! to build a user-facing message at its own boundary.

use thiserror::Error;

/// Errors raised while building or evaluating integrity models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrityError {
    /// A parameter value lies outside its declared physical range.
    #[error(
        "{name} values not all within expected bounds: \
         observed [{min}, {max}], allowed [{lower}, {upper}]"
    )]
    BoundsViolation {
        /// Parameter name.
        name: String,
        /// Smallest observed value.
        min: f64,
        /// Largest observed value.
        max: f64,
        /// Inclusive lower bound.
        lower: f64,
        /// Inclusive upper bound.
        upper: f64,
    },

    /// An array-valued input does not have the declared sample count.
    #[error("{name} size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Parameter or input name.
        name: String,
        /// Declared length.
        expected: usize,
        /// Observed length.
        actual: usize,
    },

    /// A sample size of zero was requested.
    #[error("{name}: sample size must be at least 1, got {size}")]
    InvalidSampleSize {
        /// Parameter name.
        name: String,
        /// Requested size.
        size: usize,
    },

    /// The declared bounds themselves are unusable (NaN or inverted).
    #[error("{name}: invalid bounds [{lower}, {upper}]")]
    InvalidBounds {
        /// Parameter name.
        name: String,
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },

    /// A physically impossible combination of otherwise valid geometry.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Pressures or stresses that cannot coexist in one operating state.
    #[error("invalid operating condition: {0}")]
    InvalidOperatingCondition(String),

    /// Non-positive (or non-finite) yield stress or fracture resistance.
    #[error("invalid material property {name}: {value}")]
    InvalidMaterialProperty {
        /// Property name.
        name: String,
        /// Offending value.
        value: f64,
    },

    /// Single-sample extraction outside `[0, len)`.
    #[error("sample index {index} out of range for sample size {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Batch sample size.
        len: usize,
    },

    /// A per-sample input map lacks a required key.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// A worker count of zero was requested.
    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    /// The worker pool could not be created.
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// A parallel-evaluated function failed; the whole batch is abandoned.
    #[error("evaluation of sample {index} failed: {message}")]
    Evaluation {
        /// Index of the failing input.
        index: usize,
        /// Display form of the underlying error.
        message: String,
    },

    /// Distribution parameters are unusable.
    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    /// Uncertainty study setup is inconsistent.
    #[error("invalid study: {0}")]
    InvalidStudy(String),

    /// Crack growth law coefficients are unusable.
    #[error("invalid crack growth model: {0}")]
    InvalidGrowthModel(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, IntegrityError>;

impl From<u_numflow::distributions::DistributionError> for IntegrityError {
    fn from(err: u_numflow::distributions::DistributionError) -> Self {
        IntegrityError::InvalidDistribution(err.to_string())
    }
}
