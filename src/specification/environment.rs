//! Pipeline interior environment: pressures, temperature, gas blend.
//!
//! Hydrogen fugacity follows the Abel-Noble equation of state:
//!
//! ```text
//! f = P * x_H2 * exp(b * P / (R * T))
//! ```
//!
//! with co-volume b = 15.84 cm³/mol. Pressure in MPa times cm³/mol is
//! J/mol, so the exponent is dimensionless with R in J/(mol K).
//!
//! # Reference
//!
//! San Marchi, C., Somerday, B.P. & Robinson, S.L. (2007), "Permeability,
//! solubility and diffusivity of hydrogen isotopes in stainless steels at
//! high gas pressures", *Int. J. Hydrogen Energy* 32(1), pp. 100-116.

use tracing::debug;

use super::{check_index, Specification};
use crate::error::{IntegrityError, Result};
use crate::parameter::{Parameter, ParameterValue};

/// Molar gas constant, J/(mol K).
pub const GAS_CONSTANT: f64 = 8.314_462_618;

/// Abel-Noble co-volume of hydrogen, cm³/mol.
pub const H2_CO_VOLUME: f64 = 15.84;

/// Operating environment inside the pipe for a batch of samples.
///
/// # Invariants
///
/// - `0 <= min_pressure <= max_pressure` per sample
/// - `230 <= temperature <= 330` K
/// - `0 <= volume_fraction_h2 <= 1`
/// - `reference_pressure > 0`
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    max_pressure: Parameter,
    min_pressure: Parameter,
    temperature: Parameter,
    volume_fraction_h2: Parameter,
    reference_pressure: Parameter,
    sample_size: usize,
}

impl Environment {
    /// Gas temperature used when none is given (K).
    pub const DEFAULT_TEMPERATURE: f64 = 293.0;
    /// Hydrogen volume fraction used when none is given (pure H2).
    pub const DEFAULT_VOLUME_FRACTION_H2: f64 = 1.0;
    /// Reference pressure for the fugacity ratio (MPa).
    pub const DEFAULT_REFERENCE_PRESSURE: f64 = 106.0;

    /// Creates an environment with default temperature, pure hydrogen and
    /// the default reference pressure.
    pub fn new(
        max_pressure: impl Into<ParameterValue>,
        min_pressure: impl Into<ParameterValue>,
        sample_size: usize,
    ) -> Result<Self> {
        Self::with_conditions(
            max_pressure,
            min_pressure,
            Self::DEFAULT_TEMPERATURE,
            Self::DEFAULT_VOLUME_FRACTION_H2,
            Self::DEFAULT_REFERENCE_PRESSURE,
            sample_size,
        )
    }

    /// Creates an environment with every field given explicitly.
    ///
    /// # Errors
    ///
    /// - parameter errors ([`IntegrityError::BoundsViolation`],
    ///   [`IntegrityError::SizeMismatch`])
    /// - [`IntegrityError::InvalidOperatingCondition`] if any sample has
    ///   `min_pressure > max_pressure` or a non-positive reference pressure
    pub fn with_conditions(
        max_pressure: impl Into<ParameterValue>,
        min_pressure: impl Into<ParameterValue>,
        temperature: impl Into<ParameterValue>,
        volume_fraction_h2: impl Into<ParameterValue>,
        reference_pressure: impl Into<ParameterValue>,
        sample_size: usize,
    ) -> Result<Self> {
        let max_pressure = Parameter::non_negative("max_pressure", max_pressure, sample_size)?;
        let min_pressure = Parameter::non_negative("min_pressure", min_pressure, sample_size)?;
        let temperature = Parameter::new("temperature", temperature, 230.0, 330.0, sample_size)?;
        let volume_fraction_h2 =
            Parameter::new("volume_fraction_h2", volume_fraction_h2, 0.0, 1.0, sample_size)?;
        let reference_pressure =
            Parameter::non_negative("reference_pressure", reference_pressure, sample_size)?;

        if let Some(i) = reference_pressure.iter().position(|&p| p <= 0.0) {
            return Err(IntegrityError::InvalidOperatingCondition(format!(
                "reference pressure must be positive, got {} (sample {i})",
                reference_pressure[i]
            )));
        }

        if let Some(i) = min_pressure
            .iter()
            .zip(max_pressure.iter())
            .position(|(&lo, &hi)| lo > hi)
        {
            return Err(IntegrityError::InvalidOperatingCondition(format!(
                "min pressure {} exceeds max pressure {} (sample {i})",
                min_pressure[i], max_pressure[i]
            )));
        }

        debug!(sample_size, "environment specification created");
        Ok(Self {
            max_pressure,
            min_pressure,
            temperature,
            volume_fraction_h2,
            reference_pressure,
            sample_size,
        })
    }

    /// Maximum operating pressure (MPa).
    pub fn max_pressure(&self) -> &Parameter {
        &self.max_pressure
    }

    /// Minimum operating pressure (MPa).
    pub fn min_pressure(&self) -> &Parameter {
        &self.min_pressure
    }

    /// Gas temperature (K).
    pub fn temperature(&self) -> &Parameter {
        &self.temperature
    }

    /// Hydrogen volume fraction.
    pub fn volume_fraction_h2(&self) -> &Parameter {
        &self.volume_fraction_h2
    }

    /// Reference pressure (MPa).
    pub fn reference_pressure(&self) -> &Parameter {
        &self.reference_pressure
    }

    /// Fugacity of the blended gas at maximum pressure (MPa).
    pub fn calc_fugacity(&self) -> Vec<f64> {
        (0..self.sample_size)
            .map(|i| {
                fugacity(
                    self.max_pressure[i],
                    self.temperature[i],
                    self.volume_fraction_h2[i],
                )
            })
            .collect()
    }

    /// Fugacity of pure hydrogen at the reference pressure (MPa).
    pub fn calc_reference_fugacity(&self) -> Vec<f64> {
        (0..self.sample_size)
            .map(|i| fugacity(self.reference_pressure[i], self.temperature[i], 1.0))
            .collect()
    }

    /// `sqrt(fugacity / reference_fugacity)`.
    pub fn calc_fugacity_ratio(&self) -> Vec<f64> {
        self.calc_fugacity()
            .iter()
            .zip(self.calc_reference_fugacity())
            .map(|(f, f_ref)| (f / f_ref).sqrt())
            .collect()
    }

    /// Load ratio R = `min_pressure / max_pressure` (0 for a depressurized
    /// sample).
    pub fn calc_r_ratio(&self) -> Vec<f64> {
        self.min_pressure
            .iter()
            .zip(self.max_pressure.iter())
            .map(|(&lo, &hi)| if hi > 0.0 { lo / hi } else { 0.0 })
            .collect()
    }

    /// Single-sample copy of the environment at `sample_index`.
    pub fn get_single_environment(&self, sample_index: usize) -> Result<Self> {
        check_index(sample_index, self.sample_size)?;
        Self::with_conditions(
            self.max_pressure[sample_index],
            self.min_pressure[sample_index],
            self.temperature[sample_index],
            self.volume_fraction_h2[sample_index],
            self.reference_pressure[sample_index],
            1,
        )
    }
}

impl Specification for Environment {
    fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn single(&self, index: usize) -> Result<Self> {
        self.get_single_environment(index)
    }
}

/// Abel-Noble fugacity coefficient exponent `b P / (R T)`.
fn fugacity_exponent(pressure: f64, temperature: f64) -> f64 {
    H2_CO_VOLUME * pressure / (GAS_CONSTANT * temperature)
}

fn fugacity(pressure: f64, temperature: f64, volume_fraction_h2: f64) -> f64 {
    pressure * volume_fraction_h2 * fugacity_exponent(pressure, temperature).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let env = Environment::new(13.0, 1.3, 1).unwrap();
        assert_eq!(env.temperature(), &vec![293.0]);
        assert_eq!(env.volume_fraction_h2(), &vec![1.0]);
        assert_eq!(env.reference_pressure(), &vec![106.0]);
    }

    #[test]
    fn test_min_above_max_rejected() {
        let err = Environment::new(10.0, 12.0, 1).unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidOperatingCondition(_)));
    }

    #[test]
    fn test_temperature_bounds() {
        let err = Environment::with_conditions(10.0, 1.0, 400.0, 1.0, 106.0, 1).unwrap_err();
        assert!(matches!(err, IntegrityError::BoundsViolation { .. }));
    }

    #[test]
    fn test_zero_reference_pressure_rejected() {
        let err = Environment::with_conditions(10.0, 1.0, 293.0, 1.0, 0.0, 1).unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidOperatingCondition(_)));
        let err = Environment::with_conditions(0.0, 0.0, 293.0, 1.0, vec![106.0, 0.0], 2)
            .unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidOperatingCondition(_)));
    }

    #[test]
    fn test_fugacity_ratio_finite_when_depressurized() {
        let env = Environment::with_conditions(0.0, 0.0, 293.0, 1.0, 106.0, 1).unwrap();
        assert_eq!(env.calc_fugacity_ratio(), vec![0.0]);
    }

    #[test]
    fn test_r_ratio() {
        let env = Environment::new(vec![10.0, 20.0], vec![5.0, 2.0], 2).unwrap();
        let r = env.calc_r_ratio();
        assert!((r[0] - 0.5).abs() < 1e-15);
        assert!((r[1] - 0.1).abs() < 1e-15);
    }

    #[test]
    fn test_fugacity_exceeds_pressure_for_h2() {
        // Abel-Noble gas: fugacity coefficient > 1 for positive pressure
        let env = Environment::new(13.0, 1.3, 1).unwrap();
        let f = env.calc_fugacity()[0];
        let expected = 13.0 * (15.84 * 13.0 / (GAS_CONSTANT * 293.0)).exp();
        assert!(f > 13.0);
        assert!((f - expected).abs() < 1e-12);
    }

    #[test]
    fn test_fugacity_ratio_at_reference_is_one() {
        let env = Environment::with_conditions(106.0, 10.0, 293.0, 1.0, 106.0, 1).unwrap();
        assert!((env.calc_fugacity_ratio()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_blend_lowers_fugacity() {
        let pure = Environment::with_conditions(10.0, 1.0, 293.0, 1.0, 106.0, 1).unwrap();
        let blend = Environment::with_conditions(10.0, 1.0, 293.0, 0.1, 106.0, 1).unwrap();
        assert!(blend.calc_fugacity()[0] < pure.calc_fugacity()[0]);
    }

    #[test]
    fn test_single_environment() {
        let env = Environment::new(vec![10.0, 20.0], vec![1.0, 2.0], 2).unwrap();
        let single = env.get_single_environment(1).unwrap();
        assert_eq!(single.max_pressure(), &vec![20.0]);
        assert_eq!(single.min_pressure(), &vec![2.0]);
        assert!(env.get_single_environment(2).is_err());
    }
}
