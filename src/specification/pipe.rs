//! Pipe geometry.

use tracing::debug;

use super::{check_index, Specification};
use crate::error::{IntegrityError, Result};
use crate::parameter::{Parameter, ParameterValue};

/// Pipe segment geometry for a batch of samples.
///
/// # Invariants
///
/// - `outer_diameter >= 0`, `wall_thickness >= 0`
/// - `wall_thickness < outer_diameter / 2` for every sample (the bore is
///   never closed)
///
/// # Examples
///
/// ```
/// use u_integrity::Pipe;
///
/// let pipe = Pipe::new(5.0, 0.5, 1).unwrap();
/// assert_eq!(pipe.calc_average_radius(), vec![2.25]);
/// assert_eq!(pipe.calc_inner_diameter(), vec![4.0]);
/// assert_eq!(pipe.calc_t_over_r(), vec![0.25]);
///
/// // Wall thicker than the radius
/// assert!(Pipe::new(10.0, 11.0, 1).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    outer_diameter: Parameter,
    wall_thickness: Parameter,
    sample_size: usize,
}

impl Pipe {
    /// Creates a pipe specification.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::SizeMismatch`] / [`IntegrityError::BoundsViolation`]
    ///   from the underlying parameters
    /// - [`IntegrityError::InvalidGeometry`] if any sample has
    ///   `wall_thickness >= outer_diameter / 2`
    pub fn new(
        outer_diameter: impl Into<ParameterValue>,
        wall_thickness: impl Into<ParameterValue>,
        sample_size: usize,
    ) -> Result<Self> {
        let outer_diameter = Parameter::non_negative("outer_diameter", outer_diameter, sample_size)?;
        let wall_thickness = Parameter::non_negative("wall_thickness", wall_thickness, sample_size)?;

        if let Some(i) = outer_diameter
            .iter()
            .zip(wall_thickness.iter())
            .position(|(&d, &t)| t >= d / 2.0)
        {
            return Err(IntegrityError::InvalidGeometry(format!(
                "wall thickness {} must be less than outer radius {} (sample {i})",
                wall_thickness[i],
                outer_diameter[i] / 2.0
            )));
        }

        debug!(sample_size, "pipe specification created");
        Ok(Self {
            outer_diameter,
            wall_thickness,
            sample_size,
        })
    }

    /// Outer diameter D.
    pub fn outer_diameter(&self) -> &Parameter {
        &self.outer_diameter
    }

    /// Wall thickness t.
    pub fn wall_thickness(&self) -> &Parameter {
        &self.wall_thickness
    }

    /// Average (mid-wall) radius `(D - t) / 2`.
    pub fn calc_average_radius(&self) -> Vec<f64> {
        self.zip_map(|d, t| (d - t) / 2.0)
    }

    /// Inner diameter `D - 2t`.
    pub fn calc_inner_diameter(&self) -> Vec<f64> {
        self.zip_map(|d, t| d - 2.0 * t)
    }

    /// Inner radius `D / 2 - t`.
    pub fn calc_inner_radius(&self) -> Vec<f64> {
        self.zip_map(|d, t| d / 2.0 - t)
    }

    /// Outer radius `D / 2`.
    pub fn calc_outer_radius(&self) -> Vec<f64> {
        self.outer_diameter.iter().map(|d| d / 2.0).collect()
    }

    /// Wall thickness over inner radius, `t / (D/2 - t)`.
    pub fn calc_t_over_r(&self) -> Vec<f64> {
        self.zip_map(|d, t| t / (d / 2.0 - t))
    }

    /// Single-sample copy of the pipe at `sample_index`.
    pub fn get_single_pipe(&self, sample_index: usize) -> Result<Self> {
        check_index(sample_index, self.sample_size)?;
        Pipe::new(
            self.outer_diameter[sample_index],
            self.wall_thickness[sample_index],
            1,
        )
    }

    fn zip_map(&self, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
        self.outer_diameter
            .iter()
            .zip(self.wall_thickness.iter())
            .map(|(&d, &t)| f(d, t))
            .collect()
    }
}

impl Specification for Pipe {
    fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn single(&self, index: usize) -> Result<Self> {
        self.get_single_pipe(index)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn derived_quantities_are_consistent(
            d in 0.01_f64..2.0,
            frac in 0.001_f64..0.49,
        ) {
            let t = d * frac;
            let pipe = Pipe::new(d, t, 1).expect("valid geometry");
            let r_avg = pipe.calc_average_radius()[0];
            let d_in = pipe.calc_inner_diameter()[0];
            prop_assert!(d_in > 0.0);
            prop_assert!((r_avg - (d_in / 2.0 + t / 2.0)).abs() < 1e-12);
            prop_assert!(pipe.calc_t_over_r()[0] > 0.0);
        }
    }
}
