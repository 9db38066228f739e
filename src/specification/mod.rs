//! Physical specification entities.
//!
//! Each entity composes several bounded [`Parameter`](crate::Parameter)s
//! that share one sample size into a named physical object, derives
//! dependent quantities element-wise, and can hand out a single-sample copy
//! of itself.
//!
//! # Entities
//!
//! - [`Pipe`]: outer diameter and wall thickness
//! - [`Material`]: yield strength and fracture resistance
//! - [`Defect`]: flaw depth, flaw length, location factor
//! - [`Environment`]: operating pressures, temperature, gas blend
//!
//! # References
//!
//! - API 579-1/ASME FFS-1 (2021), *Fitness-For-Service*, Part 9.
//! - ASME B31.12 (2019), *Hydrogen Piping and Pipelines*.

mod defect;
mod environment;
mod material;
mod pipe;

pub use defect::Defect;
pub use environment::Environment;
pub use material::Material;
pub use pipe::Pipe;

use crate::error::{IntegrityError, Result};

/// Behaviour shared by every batch specification entity.
pub trait Specification: Sized {
    /// Number of samples held by every parameter of the entity.
    fn sample_size(&self) -> usize;

    /// A new entity of sample size 1 holding the values at `index`.
    ///
    /// Fails with [`IntegrityError::IndexOutOfRange`] when `index` is not in
    /// `[0, sample_size)`.
    fn single(&self, index: usize) -> Result<Self>;
}

pub(crate) fn check_index(index: usize, sample_size: usize) -> Result<()> {
    if index >= sample_size {
        return Err(IntegrityError::IndexOutOfRange {
            index,
            len: sample_size,
        });
    }
    Ok(())
}
