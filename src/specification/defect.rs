//! Initial flaw (crack) specification.

use tracing::debug;

use super::{check_index, Pipe, Specification};
use crate::error::{IntegrityError, Result};
use crate::parameter::{at, broadcast_len, Parameter, ParameterValue};

/// Initial defect geometry for a batch of samples.
///
/// - `flaw_depth` is a percentage of the pipe wall thickness, in `[0, 100]`
/// - `flaw_length` is the full surface length 2c, in `[0, +inf)`
/// - `location_factor` scales the allowable stress, in `[0, +inf)`
#[derive(Debug, Clone, PartialEq)]
pub struct Defect {
    flaw_depth: Parameter,
    flaw_length: Parameter,
    location_factor: Parameter,
    sample_size: usize,
}

impl Defect {
    /// Location factor used when the design code imposes none.
    pub const DEFAULT_LOCATION_FACTOR: f64 = 1.0;

    /// Creates a defect specification.
    pub fn new(
        flaw_depth: impl Into<ParameterValue>,
        flaw_length: impl Into<ParameterValue>,
        location_factor: impl Into<ParameterValue>,
        sample_size: usize,
    ) -> Result<Self> {
        let flaw_depth = Parameter::new("flaw_depth", flaw_depth, 0.0, 100.0, sample_size)?;
        let flaw_length = Parameter::non_negative("flaw_length", flaw_length, sample_size)?;
        let location_factor =
            Parameter::non_negative("location_factor", location_factor, sample_size)?;
        debug!(sample_size, "defect specification created");
        Ok(Self {
            flaw_depth,
            flaw_length,
            location_factor,
            sample_size,
        })
    }

    /// Flaw depth, % of wall thickness.
    pub fn flaw_depth(&self) -> &Parameter {
        &self.flaw_depth
    }

    /// Flaw surface length 2c.
    pub fn flaw_length(&self) -> &Parameter {
        &self.flaw_length
    }

    /// Location (design) factor.
    pub fn location_factor(&self) -> &Parameter {
        &self.location_factor
    }

    /// Initial crack depth `a = t * flaw_depth / 100` for the given pipe.
    ///
    /// Fails with [`IntegrityError::SizeMismatch`] if the pipe and defect
    /// batches have different sample sizes.
    pub fn calc_initial_crack_depth(&self, pipe: &Pipe) -> Result<Vec<f64>> {
        if pipe.sample_size() != self.sample_size {
            return Err(IntegrityError::SizeMismatch {
                name: "pipe".to_string(),
                expected: self.sample_size,
                actual: pipe.sample_size(),
            });
        }
        Ok(pipe
            .wall_thickness()
            .iter()
            .zip(self.flaw_depth.iter())
            .map(|(&t, &depth)| t * depth / 100.0)
            .collect())
    }

    /// Depth-to-half-length ratio `a / c` with `c = flaw_length / 2`.
    ///
    /// `crack_depth` may hold one value per sample or a single value.
    /// A zero-depth crack has ratio 0; a non-zero depth on a zero-length
    /// flaw is [`IntegrityError::InvalidGeometry`].
    pub fn calc_a_over_c(&self, crack_depth: &[f64]) -> Result<Vec<f64>> {
        let n = broadcast_len(&[
            ("crack_depth", crack_depth.len()),
            ("flaw_length", self.sample_size),
        ])?;
        (0..n)
            .map(|i| {
                let a = at(crack_depth, i);
                let c = at(&self.flaw_length, i) / 2.0;
                if a == 0.0 {
                    Ok(0.0)
                } else if c > 0.0 {
                    Ok(a / c)
                } else {
                    Err(IntegrityError::InvalidGeometry(format!(
                        "crack depth {a} on a zero-length flaw (sample {i})"
                    )))
                }
            })
            .collect()
    }

    /// Single-sample copy of the defect at `sample_index`.
    pub fn get_single_defect(&self, sample_index: usize) -> Result<Self> {
        check_index(sample_index, self.sample_size)?;
        Defect::new(
            self.flaw_depth[sample_index],
            self.flaw_length[sample_index],
            self.location_factor[sample_index],
            1,
        )
    }
}

impl Specification for Defect {
    fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn single(&self, index: usize) -> Result<Self> {
        self.get_single_defect(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_location_factor() {
        let defect = Defect::new(25.0, 0.04, Defect::DEFAULT_LOCATION_FACTOR, 2).unwrap();
        assert_eq!(defect.location_factor(), &vec![1.0, 1.0]);
        assert_eq!(defect.sample_size(), 2);
    }

    #[test]
    fn test_flaw_depth_above_100_percent() {
        let err = Defect::new(120.0, 0.04, 1.0, 1).unwrap_err();
        match err {
            IntegrityError::BoundsViolation { name, upper, .. } => {
                assert_eq!(name, "flaw_depth");
                assert!((upper - 100.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_flaw_length_must_match_sample_size() {
        let err = Defect::new(vec![10.0, 20.0], vec![0.04], 1.0, 2).unwrap_err();
        assert!(matches!(err, IntegrityError::SizeMismatch { .. }));
    }

    #[test]
    fn test_initial_crack_depth() {
        let pipe = Pipe::new(vec![0.9144, 0.9144], vec![0.02, 0.01], 2).unwrap();
        let defect = Defect::new(vec![25.0, 50.0], 0.04, 1.0, 2).unwrap();
        let a = defect.calc_initial_crack_depth(&pipe).unwrap();
        assert!((a[0] - 0.005).abs() < 1e-15);
        assert!((a[1] - 0.005).abs() < 1e-15);
    }

    #[test]
    fn test_initial_crack_depth_size_mismatch() {
        let pipe = Pipe::new(0.9144, 0.02, 1).unwrap();
        let defect = Defect::new(vec![25.0, 50.0], 0.04, 1.0, 2).unwrap();
        assert!(defect.calc_initial_crack_depth(&pipe).is_err());
    }

    #[test]
    fn test_a_over_c() {
        let defect = Defect::new(25.0, vec![0.04, 0.02], 1.0, 2).unwrap();
        let ratio = defect.calc_a_over_c(&[0.005]).unwrap();
        assert!((ratio[0] - 0.25).abs() < 1e-12);
        assert!((ratio[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_a_over_c_zero_length() {
        let defect = Defect::new(25.0, 0.0, 1.0, 1).unwrap();
        assert!(matches!(
            defect.calc_a_over_c(&[0.005]),
            Err(IntegrityError::InvalidGeometry(_))
        ));
        assert_eq!(defect.calc_a_over_c(&[0.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_single_defect() {
        let defect = Defect::new(vec![10.0, 20.0, 30.0], vec![0.01, 0.02, 0.03], 0.72, 3).unwrap();
        for i in 0..3 {
            let single = defect.get_single_defect(i).unwrap();
            assert_eq!(single.flaw_depth()[0], defect.flaw_depth()[i]);
            assert_eq!(single.flaw_length()[0], defect.flaw_length()[i]);
            assert_eq!(single.location_factor()[0], 0.72);
        }
        assert!(defect.get_single_defect(3).is_err());
    }
}
