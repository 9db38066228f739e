//! Input uncertainty characterization and sample generation.
//!
//! Variables are either deterministic, aleatory (irreducible variability,
//! sampled in the inner loop) or epistemic (lack of knowledge, sampled in
//! the outer loop). An [`UncertaintyStudy`] turns them into a
//! [`SampleSheet`] whose rows feed [`evaluate`](crate::evaluate) directly.
//!
//! # Study kinds
//!
//! | Kind | Rows |
//! |------|------|
//! | [`StudyKind::Deterministic`] | 1, all nominal |
//! | [`StudyKind::Probabilistic`] | `max(n_a, 1) * max(n_e, 1)`, Latin hypercube |
//! | [`StudyKind::SensitivityBounds`] | `2 * n_uncertain`, 1st/99th percentiles |
//! | [`StudyKind::SensitivitySamples`] | one sorted sweep per uncertain variable |

mod choices;
mod distribution;
mod study;

pub use choices::{DistributionKind, StudyKind, UncertaintyKind};
pub use distribution::Distribution;
pub use study::{
    SampleColumn, SampleSheet, StudyConfig, UncertainVariable, UncertaintyStudy,
    LOWER_BOUND_PROBABILITY, UPPER_BOUND_PROBABILITY,
};
