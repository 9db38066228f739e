//! Uncertainty studies: turn a set of input variables into a sample sheet.
//!
//! # Probabilistic layout
//!
//! With `n_a` aleatory and `n_e` epistemic samples the sheet has
//! `max(n_a, 1) * max(n_e, 1)` rows. Row `k` pairs aleatory sample
//! `k % n_a` with epistemic sample `k / n_a`, so every epistemic realization
//! sees the full aleatory set (double loop).

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Distribution, StudyKind, UncertaintyKind};
use crate::error::{IntegrityError, Result};
use crate::evaluation::SampleInputs;

/// Lower probability of a bounding sensitivity study.
pub const LOWER_BOUND_PROBABILITY: f64 = 0.01;
/// Upper probability of a bounding sensitivity study.
pub const UPPER_BOUND_PROBABILITY: f64 = 0.99;

/// A named model input and its uncertainty characterization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertainVariable {
    name: String,
    distribution: Distribution,
    uncertainty: UncertaintyKind,
    nominal: f64,
}

impl UncertainVariable {
    /// Creates a variable.
    ///
    /// A [`Distribution::Deterministic`] variable must carry
    /// [`UncertaintyKind::None`] and vice versa a variable without
    /// uncertainty is always held at its nominal value.
    pub fn new(
        name: impl Into<String>,
        distribution: Distribution,
        uncertainty: UncertaintyKind,
        nominal: f64,
    ) -> Result<Self> {
        let name = name.into();
        distribution.validate()?;
        if !nominal.is_finite() {
            return Err(IntegrityError::InvalidDistribution(format!(
                "{name}: nominal value {nominal} is not finite"
            )));
        }
        if matches!(distribution, Distribution::Deterministic { .. })
            && uncertainty != UncertaintyKind::None
        {
            return Err(IntegrityError::InvalidDistribution(format!(
                "{name}: deterministic variable cannot be {uncertainty}"
            )));
        }
        Ok(Self {
            name,
            distribution,
            uncertainty,
            nominal,
        })
    }

    /// A fixed-value variable.
    pub fn deterministic(name: impl Into<String>, value: f64) -> Result<Self> {
        Self::new(
            name,
            Distribution::Deterministic { value },
            UncertaintyKind::None,
            value,
        )
    }

    /// An aleatory variable whose nominal value is the distribution center.
    pub fn aleatory(name: impl Into<String>, distribution: Distribution) -> Result<Self> {
        Self::new(name, distribution, UncertaintyKind::Aleatory, distribution.center())
    }

    /// An epistemic variable whose nominal value is the distribution center.
    pub fn epistemic(name: impl Into<String>, distribution: Distribution) -> Result<Self> {
        Self::new(name, distribution, UncertaintyKind::Epistemic, distribution.center())
    }

    /// Replaces the nominal value.
    pub fn with_nominal(mut self, nominal: f64) -> Result<Self> {
        if !nominal.is_finite() {
            return Err(IntegrityError::InvalidDistribution(format!(
                "{}: nominal value {nominal} is not finite",
                self.name
            )));
        }
        self.nominal = nominal;
        Ok(self)
    }

    /// Input name the sampled values are stored under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sampling distribution.
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// Aleatory, epistemic or none.
    pub fn uncertainty(&self) -> UncertaintyKind {
        self.uncertainty
    }

    /// Value used by deterministic studies and one-at-a-time baselines.
    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    /// Whether the variable is held at its nominal value in every study.
    pub fn is_deterministic(&self) -> bool {
        self.uncertainty == UncertaintyKind::None
    }
}

/// Sampling settings of a study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Analysis type.
    pub kind: StudyKind,
    /// Aleatory (inner loop) sample count.
    pub aleatory_samples: usize,
    /// Epistemic (outer loop) sample count.
    pub epistemic_samples: usize,
    /// Random seed; equal seeds give equal sheets.
    pub seed: u64,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            kind: StudyKind::Probabilistic,
            aleatory_samples: 100,
            epistemic_samples: 0,
            seed: 1234,
        }
    }
}

/// One named input column of a [`SampleSheet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleColumn {
    /// Variable name.
    pub name: String,
    /// Nominal value of the variable.
    pub nominal: f64,
    /// One value per sample.
    pub values: Vec<f64>,
}

/// Generated input samples, one column per variable in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSheet {
    size: usize,
    columns: Vec<SampleColumn>,
}

impl SampleSheet {
    /// Number of rows (samples).
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the sheet has no rows.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// All columns in declaration order.
    pub fn columns(&self) -> &[SampleColumn] {
        &self.columns
    }

    /// Values of column `name`.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Row `index` as an input map.
    pub fn row(&self, index: usize) -> Result<SampleInputs> {
        if index >= self.size {
            return Err(IntegrityError::IndexOutOfRange {
                index,
                len: self.size,
            });
        }
        Ok(self
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.values[index]))
            .collect())
    }

    /// Every row as an input map.
    pub fn to_inputs(&self) -> Vec<SampleInputs> {
        (0..self.size)
            .map(|i| {
                self.columns
                    .iter()
                    .map(|c| (c.name.as_str(), c.values[i]))
                    .collect()
            })
            .collect()
    }

    /// Nominal value of every variable.
    pub fn nominal_inputs(&self) -> SampleInputs {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.nominal))
            .collect()
    }
}

/// An uncertainty study over a set of variables.
///
/// # Examples
///
/// ```
/// use u_integrity::{Distribution, StudyConfig, StudyKind, UncertainVariable, UncertaintyStudy};
///
/// let study = UncertaintyStudy::new(StudyConfig {
///     kind: StudyKind::Probabilistic,
///     aleatory_samples: 10,
///     epistemic_samples: 0,
///     seed: 1,
/// })
/// .with_variable(UncertainVariable::deterministic("outer_diameter", 0.9144).unwrap())
/// .with_variable(
///     UncertainVariable::aleatory(
///         "yield_strength",
///         Distribution::Normal { mean: 400.0, std_dev: 10.0 },
///     )
///     .unwrap(),
/// );
///
/// let sheet = study.generate().unwrap();
/// assert_eq!(sheet.len(), 10);
/// assert!(sheet.column("outer_diameter").unwrap().iter().all(|&d| d == 0.9144));
/// ```
#[derive(Debug, Clone, Default)]
pub struct UncertaintyStudy {
    config: StudyConfig,
    variables: Vec<UncertainVariable>,
}

impl UncertaintyStudy {
    /// Creates a study with no variables.
    pub fn new(config: StudyConfig) -> Self {
        Self {
            config,
            variables: Vec::new(),
        }
    }

    /// Adds a variable.
    pub fn with_variable(mut self, variable: UncertainVariable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Adds several variables.
    pub fn with_variables(mut self, variables: impl IntoIterator<Item = UncertainVariable>) -> Self {
        self.variables.extend(variables);
        self
    }

    /// Sets the analysis type.
    pub fn with_kind(mut self, kind: StudyKind) -> Self {
        self.config.kind = kind;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sampling settings.
    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn variables(&self) -> &[UncertainVariable] {
        &self.variables
    }

    /// Generates the sample sheet for the configured study kind.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::InvalidStudy`] for duplicate names or a
    ///   mismatch between declared variables and sample counts
    /// - [`IntegrityError::InvalidDistribution`] for invalid parameters
    pub fn generate(&self) -> Result<SampleSheet> {
        self.validate()?;
        let sheet = match self.config.kind {
            StudyKind::Deterministic => self.nominal_sheet(),
            StudyKind::Probabilistic => self.probabilistic_sheet()?,
            StudyKind::SensitivityBounds => self.bounds_sheet()?,
            StudyKind::SensitivitySamples => self.one_at_a_time_sheet()?,
        };
        debug!(
            kind = self.config.kind.key(),
            variables = self.variables.len(),
            samples = sheet.len(),
            "sample sheet generated"
        );
        Ok(sheet)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for v in &self.variables {
            if !seen.insert(v.name.as_str()) {
                return Err(IntegrityError::InvalidStudy(format!(
                    "duplicate variable name '{}'",
                    v.name
                )));
            }
        }
        if self.config.kind == StudyKind::Probabilistic {
            for (kind, count) in [
                (UncertaintyKind::Aleatory, self.config.aleatory_samples),
                (UncertaintyKind::Epistemic, self.config.epistemic_samples),
            ] {
                let declared = self.variables.iter().any(|v| v.uncertainty == kind);
                if declared != (count > 0) {
                    return Err(IntegrityError::InvalidStudy(format!(
                        "{count} {kind} samples requested but {kind} variables {}",
                        if declared { "declared" } else { "absent" }
                    )));
                }
            }
        }
        Ok(())
    }

    fn uncertain(&self) -> impl Iterator<Item = (usize, &UncertainVariable)> {
        self.variables
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_deterministic())
    }

    /// Columns holding every variable at its nominal value for `size` rows.
    fn nominal_columns(&self, size: usize) -> Vec<SampleColumn> {
        self.variables
            .iter()
            .map(|v| SampleColumn {
                name: v.name.clone(),
                nominal: v.nominal,
                values: vec![v.nominal; size],
            })
            .collect()
    }

    fn nominal_sheet(&self) -> SampleSheet {
        SampleSheet {
            size: 1,
            columns: self.nominal_columns(1),
        }
    }

    fn probabilistic_sheet(&self) -> Result<SampleSheet> {
        let n_a = self.config.aleatory_samples;
        let n_e = self.config.epistemic_samples;
        let inner = n_a.max(1);
        let size = inner * n_e.max(1);
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut columns = self.nominal_columns(size);
        for (j, v) in self.uncertain() {
            let values: Vec<f64> = match v.uncertainty {
                UncertaintyKind::Aleatory => {
                    let draws = v.distribution.sample_lhs(n_a, &mut rng)?;
                    (0..size).map(|k| draws[k % n_a]).collect()
                }
                UncertaintyKind::Epistemic => {
                    let draws = v.distribution.sample_lhs(n_e, &mut rng)?;
                    (0..size).map(|k| draws[k / inner]).collect()
                }
                UncertaintyKind::None => continue,
            };
            columns[j].values = values;
        }
        Ok(SampleSheet { size, columns })
    }

    fn bounds_sheet(&self) -> Result<SampleSheet> {
        let uncertain: Vec<_> = self.uncertain().collect();
        if uncertain.is_empty() {
            return Err(IntegrityError::InvalidStudy(
                "bounding study needs at least one uncertain variable".to_string(),
            ));
        }
        let size = 2 * uncertain.len();
        let mut columns = self.nominal_columns(size);
        for (row, (j, v)) in uncertain.into_iter().enumerate() {
            columns[j].values[2 * row] = v.distribution.quantile(LOWER_BOUND_PROBABILITY)?;
            columns[j].values[2 * row + 1] = v.distribution.quantile(UPPER_BOUND_PROBABILITY)?;
        }
        Ok(SampleSheet { size, columns })
    }

    fn one_at_a_time_sheet(&self) -> Result<SampleSheet> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut sweeps = Vec::new();
        for (j, v) in self.uncertain() {
            let n = match v.uncertainty {
                UncertaintyKind::Epistemic => self.config.epistemic_samples,
                _ => self.config.aleatory_samples,
            };
            if n == 0 {
                return Err(IntegrityError::InvalidStudy(format!(
                    "no {} samples requested for '{}'",
                    v.uncertainty, v.name
                )));
            }
            sweeps.push((j, v.distribution.sample_sorted(n, &mut rng)?));
        }
        if sweeps.is_empty() {
            return Err(IntegrityError::InvalidStudy(
                "sample sensitivity study needs at least one uncertain variable".to_string(),
            ));
        }

        let size = sweeps.iter().map(|(_, s)| s.len()).sum();
        let mut columns = self.nominal_columns(size);
        let mut offset = 0;
        for (j, sweep) in sweeps {
            columns[j].values[offset..offset + sweep.len()].copy_from_slice(&sweep);
            offset += sweep.len();
        }
        Ok(SampleSheet { size, columns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: StudyKind, aleatory: usize, epistemic: usize) -> StudyConfig {
        StudyConfig {
            kind,
            aleatory_samples: aleatory,
            epistemic_samples: epistemic,
            seed: 42,
        }
    }

    fn pipe_study(kind: StudyKind, aleatory: usize, epistemic: usize) -> UncertaintyStudy {
        UncertaintyStudy::new(config(kind, aleatory, epistemic))
            .with_variable(UncertainVariable::deterministic("wall_thickness", 0.0191).unwrap())
            .with_variable(
                UncertainVariable::aleatory(
                    "yield_strength",
                    Distribution::Normal {
                        mean: 400.0,
                        std_dev: 10.0,
                    },
                )
                .unwrap(),
            )
            .with_variable(
                UncertainVariable::epistemic(
                    "flaw_depth",
                    Distribution::Uniform {
                        lower: 10.0,
                        upper: 30.0,
                    },
                )
                .unwrap(),
            )
    }

    #[test]
    fn test_deterministic_variable_rejects_uncertainty() {
        let err = UncertainVariable::new(
            "x",
            Distribution::Deterministic { value: 1.0 },
            UncertaintyKind::Aleatory,
            1.0,
        )
        .unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidDistribution(_)));
    }

    #[test]
    fn test_nominal_defaults_to_center() {
        let v = UncertainVariable::aleatory(
            "x",
            Distribution::Uniform {
                lower: 2.0,
                upper: 4.0,
            },
        )
        .unwrap();
        assert_eq!(v.nominal(), 3.0);
        assert_eq!(v.with_nominal(2.5).unwrap().nominal(), 2.5);
    }

    #[test]
    fn test_deterministic_study() {
        let sheet = pipe_study(StudyKind::Deterministic, 0, 0).generate().unwrap();
        assert_eq!(sheet.len(), 1);
        let row = sheet.row(0).unwrap();
        assert_eq!(row.get("yield_strength").unwrap(), 400.0);
        assert_eq!(row.get("flaw_depth").unwrap(), 20.0);
        assert_eq!(row, sheet.nominal_inputs());
    }

    #[test]
    fn test_double_loop_layout() {
        let sheet = pipe_study(StudyKind::Probabilistic, 4, 3).generate().unwrap();
        assert_eq!(sheet.len(), 12);

        let ys = sheet.column("yield_strength").unwrap();
        let depth = sheet.column("flaw_depth").unwrap();
        for k in 0..12 {
            // aleatory tiled, epistemic repeated
            assert_eq!(ys[k], ys[k % 4]);
            assert_eq!(depth[k], depth[(k / 4) * 4]);
        }
        assert!(sheet
            .column("wall_thickness")
            .unwrap()
            .iter()
            .all(|&t| t == 0.0191));
    }

    #[test]
    fn test_probabilistic_sample_counts_must_match_variables() {
        let err = pipe_study(StudyKind::Probabilistic, 4, 0)
            .generate()
            .unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidStudy(_)));

        let only_aleatory = UncertaintyStudy::new(config(StudyKind::Probabilistic, 5, 2))
            .with_variable(
                UncertainVariable::aleatory(
                    "x",
                    Distribution::Normal {
                        mean: 0.0,
                        std_dev: 1.0,
                    },
                )
                .unwrap(),
            );
        assert!(only_aleatory.generate().is_err());
    }

    #[test]
    fn test_same_seed_same_sheet() {
        let a = pipe_study(StudyKind::Probabilistic, 8, 2).generate().unwrap();
        let b = pipe_study(StudyKind::Probabilistic, 8, 2).generate().unwrap();
        let c = pipe_study(StudyKind::Probabilistic, 8, 2)
            .with_seed(7)
            .generate()
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_duplicate_names() {
        let study = UncertaintyStudy::new(config(StudyKind::Deterministic, 0, 0))
            .with_variable(UncertainVariable::deterministic("x", 1.0).unwrap())
            .with_variable(UncertainVariable::deterministic("x", 2.0).unwrap());
        assert!(matches!(
            study.generate(),
            Err(IntegrityError::InvalidStudy(_))
        ));
    }

    #[test]
    fn test_bounds_study() {
        let sheet = pipe_study(StudyKind::SensitivityBounds, 0, 0)
            .generate()
            .unwrap();
        assert_eq!(sheet.len(), 4);
        let ys = sheet.column("yield_strength").unwrap();
        let depth = sheet.column("flaw_depth").unwrap();
        assert!((ys[0] - (400.0 - 23.26)).abs() < 0.1);
        assert!((ys[1] - (400.0 + 23.26)).abs() < 0.1);
        assert_eq!(&ys[2..], &[400.0, 400.0]);
        assert_eq!(&depth[..2], &[20.0, 20.0]);
        assert!((depth[2] - 10.2).abs() < 1e-9);
        assert!((depth[3] - 29.8).abs() < 1e-9);
    }

    #[test]
    fn test_one_at_a_time_study() {
        let sheet = pipe_study(StudyKind::SensitivitySamples, 5, 3)
            .generate()
            .unwrap();
        assert_eq!(sheet.len(), 8);
        let ys = sheet.column("yield_strength").unwrap();
        let depth = sheet.column("flaw_depth").unwrap();
        assert!(ys[..5].windows(2).all(|w| w[0] <= w[1]));
        assert!(ys[5..].iter().all(|&v| v == 400.0));
        assert!(depth[..5].iter().all(|&v| v == 20.0));
        assert!(depth[5..].windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_to_inputs() {
        let sheet = pipe_study(StudyKind::Probabilistic, 3, 2).generate().unwrap();
        let inputs = sheet.to_inputs();
        assert_eq!(inputs.len(), 6);
        for (k, row) in inputs.iter().enumerate() {
            assert_eq!(row, &sheet.row(k).unwrap());
            assert_eq!(row.len(), 3);
        }
        assert!(sheet.row(6).is_err());
    }

    #[test]
    fn test_config_from_json() {
        let cfg: StudyConfig =
            serde_json::from_str(r#"{"kind":"prb","aleatory_samples":50,"seed":3}"#).unwrap();
        assert_eq!(cfg.kind, StudyKind::Probabilistic);
        assert_eq!(cfg.aleatory_samples, 50);
        assert_eq!(cfg.epistemic_samples, 0);
        assert_eq!(cfg.seed, 3);
    }
}
