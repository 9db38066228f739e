//! Material strength and toughness.

use tracing::debug;

use super::{check_index, Specification};
use crate::error::Result;
use crate::parameter::{Parameter, ParameterValue};

/// Material specification for base metal or weld.
///
/// # Examples
///
/// ```
/// use u_integrity::Material;
///
/// let material = Material::new(vec![100.0, 200.0], vec![55.0, 52.0], 2).unwrap();
/// let second = material.get_single_material(1).unwrap();
/// assert_eq!(second.yield_strength(), &vec![200.0]);
/// assert_eq!(second.fracture_resistance(), &vec![52.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    yield_strength: Parameter,
    fracture_resistance: Parameter,
    sample_size: usize,
}

impl Material {
    /// Creates a material specification. Both properties are bounded to
    /// `[0, +inf)`.
    pub fn new(
        yield_strength: impl Into<ParameterValue>,
        fracture_resistance: impl Into<ParameterValue>,
        sample_size: usize,
    ) -> Result<Self> {
        let yield_strength = Parameter::non_negative("yield_strength", yield_strength, sample_size)?;
        let fracture_resistance =
            Parameter::non_negative("fracture_resistance", fracture_resistance, sample_size)?;
        debug!(sample_size, "material specification created");
        Ok(Self {
            yield_strength,
            fracture_resistance,
            sample_size,
        })
    }

    /// Yield strength (MPa).
    pub fn yield_strength(&self) -> &Parameter {
        &self.yield_strength
    }

    /// Fracture resistance (MPa m^1/2).
    pub fn fracture_resistance(&self) -> &Parameter {
        &self.fracture_resistance
    }

    /// Single-sample copy of the material at `sample_index`.
    pub fn get_single_material(&self, sample_index: usize) -> Result<Self> {
        check_index(sample_index, self.sample_size)?;
        Material::new(
            self.yield_strength[sample_index],
            self.fracture_resistance[sample_index],
            1,
        )
    }
}

impl Specification for Material {
    fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn single(&self, index: usize) -> Result<Self> {
        self.get_single_material(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntegrityError;

    #[test]
    fn test_default_scalar() {
        let material = Material::new(400.0, 55.0, 1).unwrap();
        assert_eq!(material.sample_size(), 1);
        assert_eq!(material.yield_strength(), &vec![400.0]);
    }

    #[test]
    fn test_single_material() {
        let material = Material::new(vec![100.0, 200.0], vec![55.0, 52.0], 2).unwrap();
        let single = material.get_single_material(1).unwrap();
        assert_eq!(single.sample_size(), 1);
        assert!((single.yield_strength()[0] - 200.0).abs() < f64::EPSILON);
        assert!((single.fracture_resistance()[0] - 52.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_single_material_out_of_range() {
        let material = Material::new(vec![100.0, 200.0], vec![55.0, 52.0], 2).unwrap();
        assert!(matches!(
            material.get_single_material(5),
            Err(IntegrityError::IndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_negative_strength_rejected() {
        let err = Material::new(-10.0, 55.0, 1).unwrap_err();
        match err {
            IntegrityError::BoundsViolation { name, .. } => assert_eq!(name, "yield_strength"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_size_mismatch() {
        let err = Material::new(vec![100.0, 200.0], vec![55.0], 2).unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::SizeMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_scalar_broadcast_with_array() {
        let material = Material::new(vec![100.0, 200.0, 300.0], 50.0, 3).unwrap();
        assert_eq!(material.fracture_resistance(), &vec![50.0, 50.0, 50.0]);
    }
}
