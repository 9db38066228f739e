//! Fatigue crack growth rate laws.
//!
//! Every law is a power law in the stress-intensity range:
//!
//! ```text
//! da/dN = C (dK)^m
//! ```
//!
//! The hydrogen design curve of ASME Code Case 2938 combines two branches
//! with the air curve:
//!
//! ```text
//! low dK:   C_1 = 3.5e-14  f_H2 (1 + 0.4286 R) / (1 - R),  m_1 = 6.5
//! high dK:  C_2 = 1.5e-11       (1 + 2 R)      / (1 - R),  m_2 = 3.66
//! air:      C_a = 6.89e-12,                                m_a = 3
//!
//! da/dN = max(min(C_1 dK^m_1, C_2 dK^m_2), C_a dK^m_a)
//! ```
//!
//! with `f_H2` the fugacity ratio and `R` the load ratio of the environment.
//! Branches with `R >= 1` (and the high branch without hydrogen) drop out.
//! Units are m/cycle and MPa m^1/2.
//!
//! # References
//!
//! - ASME BPVC Code Case 2938 (2019), *Alternative rules for the design of
//!   hydrogen pipelines*, fatigue crack growth design curves.
//! - Paris, P. & Erdogan, F. (1963), "A critical analysis of crack
//!   propagation laws", *J. Basic Eng.* 85(4), pp. 528-533.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IntegrityError, Result};
use crate::parameter::{broadcast_len, Parameter, ParameterValue};
use crate::specification::{check_index, Environment, Specification};

/// Coefficient and exponent of `da/dN = C dK^m`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLaw {
    /// Coefficient C, (m/cycle) / (MPa m^1/2)^m.
    pub c: f64,
    /// Exponent m.
    pub m: f64,
}

impl PowerLaw {
    /// Crack growth per cycle at stress-intensity range `delta_k`.
    pub fn growth_rate(&self, delta_k: f64) -> f64 {
        self.c * delta_k.powf(self.m)
    }
}

/// Fatigue crack growth in air.
pub const AIR_CURVE: PowerLaw = PowerLaw { c: 6.89e-12, m: 3.0 };

/// One hydrogen branch of the code case design curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodeCaseBranch {
    /// Coefficient before the load-ratio and fugacity corrections.
    pub coefficient: f64,
    /// Exponent m.
    pub exponent: f64,
    /// Multiplier of R in `(1 + multiplier R) / (1 - R)`.
    pub r_multiplier: f64,
    /// Whether the coefficient scales with the fugacity ratio.
    pub fugacity_scaled: bool,
}

/// Hydrogen-driven branch, governing at low stress-intensity range.
pub const LOW_K_BRANCH: CodeCaseBranch = CodeCaseBranch {
    coefficient: 3.5e-14,
    exponent: 6.5,
    r_multiplier: 0.4286,
    fugacity_scaled: true,
};

/// Stress-driven branch, governing at high stress-intensity range.
pub const HIGH_K_BRANCH: CodeCaseBranch = CodeCaseBranch {
    coefficient: 1.5e-11,
    exponent: 3.66,
    r_multiplier: 2.0,
    fugacity_scaled: false,
};

/// Crack growth rate law.
///
/// # Examples
///
/// ```
/// use u_integrity::GrowthModel;
///
/// let model: GrowthModel =
///     serde_json::from_str(r#"{"model_name":"paris_law","c":1e-11,"m":3.0}"#).unwrap();
/// assert_eq!(model, GrowthModel::ParisLaw { c: 1e-11, m: 3.0 });
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_name", rename_all = "snake_case")]
pub enum GrowthModel {
    /// ASME Code Case 2938 hydrogen design curve with fugacity correction.
    #[default]
    #[serde(rename = "code_case_2938")]
    CodeCase2938,
    /// Generic Paris law `da/dN = c dK^m`.
    ParisLaw { c: f64, m: f64 },
}

impl GrowthModel {
    /// Checks the coefficients of a Paris law.
    pub fn validate(&self) -> Result<()> {
        match *self {
            GrowthModel::CodeCase2938 => Ok(()),
            GrowthModel::ParisLaw { c, m } => {
                if c.is_finite() && c > 0.0 && m.is_finite() && m > 0.0 {
                    Ok(())
                } else {
                    Err(IntegrityError::InvalidGrowthModel(format!(
                        "paris law needs positive finite c and m, got c={c}, m={m}"
                    )))
                }
            }
        }
    }
}

/// Crack growth model bound to the load and fugacity ratios of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CrackGrowth {
    model: GrowthModel,
    r_ratio: Vec<f64>,
    fugacity_ratio: Vec<f64>,
    sample_size: usize,
}

impl CrackGrowth {
    /// Creates a growth model for the samples of `environment`.
    pub fn new(environment: &Environment, model: GrowthModel) -> Result<Self> {
        Self::from_ratios(
            environment.calc_r_ratio(),
            environment.calc_fugacity_ratio(),
            model,
        )
    }

    /// Creates a growth model from explicit load and fugacity ratios.
    ///
    /// A length-1 array broadcasts against the other.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::InvalidGrowthModel`] for bad Paris coefficients
    /// - [`IntegrityError::SizeMismatch`] for incompatible lengths
    /// - [`IntegrityError::BoundsViolation`] for negative ratios
    pub fn from_ratios(
        r_ratio: Vec<f64>,
        fugacity_ratio: Vec<f64>,
        model: GrowthModel,
    ) -> Result<Self> {
        model.validate()?;
        let sample_size = broadcast_len(&[
            ("r_ratio", r_ratio.len()),
            ("fugacity_ratio", fugacity_ratio.len()),
        ])?;
        let r_ratio = per_sample("r_ratio", &r_ratio, sample_size)?;
        let fugacity_ratio = per_sample("fugacity_ratio", &fugacity_ratio, sample_size)?;
        debug!(sample_size, ?model, "crack growth model created");
        Ok(Self {
            model,
            r_ratio: r_ratio.values().to_vec(),
            fugacity_ratio: fugacity_ratio.values().to_vec(),
            sample_size,
        })
    }

    /// Growth law.
    pub fn model(&self) -> GrowthModel {
        self.model
    }

    /// Load ratio R per sample.
    pub fn r_ratio(&self) -> &[f64] {
        &self.r_ratio
    }

    /// Fugacity ratio per sample.
    pub fn fugacity_ratio(&self) -> &[f64] {
        &self.fugacity_ratio
    }

    /// Corrected coefficient of a code case branch per sample.
    ///
    /// Zero where `R >= 1`, and for the stress-driven branch where no
    /// hydrogen is present.
    pub fn calc_fugacity_correction(&self, branch: CodeCaseBranch) -> Vec<f64> {
        (0..self.sample_size)
            .map(|i| branch_coefficient(branch, self.r_ratio[i], self.fugacity_ratio[i]))
            .collect()
    }

    /// Growth rate `da/dN` at `delta_k` per sample.
    pub fn calc_growth_rate(&self, delta_k: &[f64]) -> Result<Vec<f64>> {
        let delta_k = per_sample("delta_k", delta_k, self.sample_size)?;
        Ok((0..self.sample_size)
            .map(|i| self.rate(i, delta_k[i]))
            .collect())
    }

    /// Cycles needed to grow the crack by `delta_a` at `delta_k`.
    ///
    /// Samples with zero `delta_a` or zero `delta_k` take zero cycles.
    pub fn calc_delta_n(&self, delta_a: &[f64], delta_k: &[f64]) -> Result<Vec<f64>> {
        let delta_a = per_sample("delta_a", delta_a, self.sample_size)?;
        let delta_k = per_sample("delta_k", delta_k, self.sample_size)?;
        Ok((0..self.sample_size)
            .map(|i| {
                if delta_a[i] > 0.0 && delta_k[i] > 0.0 {
                    delta_a[i] / self.rate(i, delta_k[i])
                } else {
                    0.0
                }
            })
            .collect())
    }

    /// Crack extension over `delta_n` cycles at `delta_k`.
    pub fn calc_change_in_crack_size(&self, delta_n: &[f64], delta_k: &[f64]) -> Result<Vec<f64>> {
        let delta_n = per_sample("delta_n", delta_n, self.sample_size)?;
        let delta_k = per_sample("delta_k", delta_k, self.sample_size)?;
        Ok((0..self.sample_size)
            .map(|i| {
                if delta_n[i] > 0.0 && delta_k[i] > 0.0 {
                    delta_n[i] * self.rate(i, delta_k[i])
                } else {
                    0.0
                }
            })
            .collect())
    }

    /// Single-sample copy of the growth model at `sample_index`.
    pub fn get_single_crack_growth_model(&self, sample_index: usize) -> Result<Self> {
        check_index(sample_index, self.sample_size)?;
        Ok(Self {
            model: self.model,
            r_ratio: vec![self.r_ratio[sample_index]],
            fugacity_ratio: vec![self.fugacity_ratio[sample_index]],
            sample_size: 1,
        })
    }

    fn rate(&self, i: usize, delta_k: f64) -> f64 {
        match self.model {
            GrowthModel::ParisLaw { c, m } => PowerLaw { c, m }.growth_rate(delta_k),
            GrowthModel::CodeCase2938 => {
                let (r, f) = (self.r_ratio[i], self.fugacity_ratio[i]);
                let low = PowerLaw {
                    c: branch_coefficient(LOW_K_BRANCH, r, f),
                    m: LOW_K_BRANCH.exponent,
                };
                let high = PowerLaw {
                    c: branch_coefficient(HIGH_K_BRANCH, r, f),
                    m: HIGH_K_BRANCH.exponent,
                };
                low.growth_rate(delta_k)
                    .min(high.growth_rate(delta_k))
                    .max(AIR_CURVE.growth_rate(delta_k))
            }
        }
    }
}

impl Specification for CrackGrowth {
    fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn single(&self, index: usize) -> Result<Self> {
        self.get_single_crack_growth_model(index)
    }
}

/// Non-negative per-sample values, broadcasting a single value.
fn per_sample(name: &str, values: &[f64], sample_size: usize) -> Result<Parameter> {
    Parameter::non_negative(name, ParameterValue::per_sample(values), sample_size)
}

fn branch_coefficient(branch: CodeCaseBranch, r: f64, fugacity_ratio: f64) -> f64 {
    if r >= 1.0 {
        return 0.0;
    }
    let load = branch.coefficient * (1.0 + branch.r_multiplier * r) / (1.0 - r);
    if branch.fugacity_scaled {
        fugacity_ratio * load
    } else if fugacity_ratio > 0.0 {
        load
    } else {
        0.0
    }
}

/// Growth rate curve over a range of stress-intensity ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignCurve {
    /// Stress-intensity range, MPa m^1/2.
    pub delta_k: Vec<f64>,
    /// Growth rate, m/cycle.
    pub da_dn: Vec<f64>,
}

/// Growth rate at `dK = 1, 2, ..., samples` for a fixed load ratio and
/// fugacity ratio.
///
/// # Examples
///
/// ```
/// use u_integrity::{design_curve, GrowthModel};
///
/// let curve = design_curve(0.5, 0.0, GrowthModel::CodeCase2938, 10).unwrap();
/// // without hydrogen only the air curve remains
/// assert!((curve.da_dn[1] - 6.89e-12 * 8.0).abs() < 1e-24);
/// ```
pub fn design_curve(
    r_ratio: f64,
    fugacity_ratio: f64,
    model: GrowthModel,
    samples: usize,
) -> Result<DesignCurve> {
    if samples == 0 {
        return Err(IntegrityError::InvalidSampleSize {
            name: "design_curve".to_string(),
            size: samples,
        });
    }
    let growth = CrackGrowth::from_ratios(vec![r_ratio], vec![fugacity_ratio], model)?;
    let delta_k: Vec<f64> = (1..=samples).map(|k| k as f64).collect();
    let da_dn = delta_k.iter().map(|&dk| growth.rate(0, dk)).collect();
    Ok(DesignCurve { delta_k, da_dn })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn growth(r: f64, fugacity: f64, model: GrowthModel) -> CrackGrowth {
        CrackGrowth::from_ratios(vec![r], vec![fugacity], model).unwrap()
    }

    #[test]
    fn test_paris_law_round_trip_counts() {
        let paris = growth(0.1, 1.0, GrowthModel::ParisLaw { c: 1e-11, m: 3.0 });
        let da = paris.calc_change_in_crack_size(&[1000.0], &[10.0]).unwrap();
        assert!((da[0] - 1e-5).abs() < 1e-18);
        let dn = paris.calc_delta_n(&[1e-5], &[10.0]).unwrap();
        assert!((dn[0] - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_increments_take_zero_cycles() {
        let paris = growth(0.1, 1.0, GrowthModel::ParisLaw { c: 1e-11, m: 3.0 });
        assert_eq!(paris.calc_delta_n(&[0.0], &[10.0]).unwrap(), vec![0.0]);
        assert_eq!(paris.calc_delta_n(&[1e-4], &[0.0]).unwrap(), vec![0.0]);
        assert_eq!(
            paris.calc_change_in_crack_size(&[0.0], &[10.0]).unwrap(),
            vec![0.0]
        );
    }

    #[test]
    fn test_negative_increment_rejected() {
        let paris = growth(0.1, 1.0, GrowthModel::ParisLaw { c: 1e-11, m: 3.0 });
        assert!(matches!(
            paris.calc_delta_n(&[-1e-4], &[10.0]),
            Err(IntegrityError::BoundsViolation { .. })
        ));
    }

    #[test]
    fn test_invalid_paris_coefficients() {
        for (c, m) in [(0.0, 3.0), (1e-11, -1.0), (f64::NAN, 3.0)] {
            let err = CrackGrowth::from_ratios(vec![0.1], vec![1.0], GrowthModel::ParisLaw { c, m })
                .unwrap_err();
            assert!(matches!(err, IntegrityError::InvalidGrowthModel(_)), "{c} {m}");
        }
    }

    #[test]
    fn test_fugacity_correction() {
        let model = growth(0.5, 0.8, GrowthModel::CodeCase2938);
        let low = model.calc_fugacity_correction(LOW_K_BRANCH);
        let high = model.calc_fugacity_correction(HIGH_K_BRANCH);
        assert!((low[0] - 0.8 * 3.5e-14 * (1.0 + 0.4286 * 0.5) / 0.5).abs() < 1e-26);
        assert!((high[0] - 1.5e-11 * 2.0 / 0.5).abs() < 1e-23);

        let static_load = growth(1.0, 0.8, GrowthModel::CodeCase2938);
        assert_eq!(static_load.calc_fugacity_correction(LOW_K_BRANCH), vec![0.0]);
        assert_eq!(static_load.calc_fugacity_correction(HIGH_K_BRANCH), vec![0.0]);

        let no_hydrogen = growth(0.5, 0.0, GrowthModel::CodeCase2938);
        assert_eq!(no_hydrogen.calc_fugacity_correction(HIGH_K_BRANCH), vec![0.0]);
    }

    #[test]
    fn test_code_case_branches() {
        let model = growth(0.0, 1.0, GrowthModel::CodeCase2938);
        // dK = 5: low branch 3.5e-14 * 5^6.5 = 1.2225e-9, high 1.5e-11 * 5^3.66 = 5.45e-9
        let rate = model.calc_growth_rate(&[5.0]).unwrap()[0];
        assert!((rate - 3.5e-14 * 5.0_f64.powf(6.5)).abs() < 1e-20);
        // dK = 20: high branch governs
        let rate = model.calc_growth_rate(&[20.0]).unwrap()[0];
        assert!((rate - 1.5e-11 * 20.0_f64.powf(3.66)).abs() < 1e-16);
        // dK = 1: both hydrogen branches fall below air
        let rate = model.calc_growth_rate(&[1.0]).unwrap()[0];
        assert!((rate - 6.89e-12).abs() < 1e-24);
    }

    #[test]
    fn test_delta_n_uses_governing_rate() {
        let model = growth(0.0, 1.0, GrowthModel::CodeCase2938);
        let rate = model.calc_growth_rate(&[20.0]).unwrap()[0];
        let dn = model.calc_delta_n(&[1e-4], &[20.0]).unwrap()[0];
        assert!((dn - 1e-4 / rate).abs() < 1e-9 * dn);
    }

    #[test]
    fn test_from_environment() {
        let env = Environment::new(vec![10.0, 20.0], vec![5.0, 2.0], 2).unwrap();
        let model = CrackGrowth::new(&env, GrowthModel::CodeCase2938).unwrap();
        assert_eq!(model.sample_size(), 2);
        assert_eq!(model.r_ratio(), env.calc_r_ratio().as_slice());
        let single = model.get_single_crack_growth_model(1).unwrap();
        assert_eq!(single.r_ratio(), &[0.1]);
        assert!(model.get_single_crack_growth_model(2).is_err());
    }

    #[test]
    fn test_design_curve_monotone() {
        let curve = design_curve(0.5, 1.0, GrowthModel::CodeCase2938, 99).unwrap();
        assert_eq!(curve.delta_k.len(), 99);
        assert!(curve.da_dn.windows(2).all(|w| w[0] < w[1]));
        assert!(design_curve(0.5, 1.0, GrowthModel::CodeCase2938, 0).is_err());
    }

    #[test]
    fn test_model_serde() {
        let json = serde_json::to_string(&GrowthModel::CodeCase2938).unwrap();
        assert_eq!(json, r#"{"model_name":"code_case_2938"}"#);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn code_case_never_below_air(
            r in 0.0_f64..0.95,
            fugacity in 0.0_f64..2.0,
            dk in 0.5_f64..60.0,
        ) {
            let model = CrackGrowth::from_ratios(vec![r], vec![fugacity], GrowthModel::CodeCase2938)
                .unwrap();
            let rate = model.calc_growth_rate(&[dk]).unwrap()[0];
            prop_assert!(rate >= AIR_CURVE.growth_rate(dk));
        }
    }
}
