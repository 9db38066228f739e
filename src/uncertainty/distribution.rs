//! Parametric input distributions and Latin hypercube sampling.
//!
//! The normal, lognormal and uniform laws are validated and inverted by
//! [`u_numflow::distributions`]:
//!
//! ```text
//! normal:    x = mu + sigma z_p
//! lognormal: x = exp(mu + sigma z_p)
//! uniform:   x = lower + p (upper - lower)
//! ```
//!
//! # Reference
//!
//! McKay, M.D., Beckman, R.J. & Conover, W.J. (1979), "A comparison of three
//! methods for selecting values of input variables in the analysis of output
//! from a computer code", *Technometrics* 21(2), pp. 239-245.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use u_numflow::distributions as dist;

use super::DistributionKind;
use crate::error::{IntegrityError, Result};

/// Smallest probability handed to the inverse CDF by the sampler.
const MIN_PROBABILITY: f64 = 1e-12;

/// An input distribution with its parameters.
///
/// # Examples
///
/// ```
/// use u_integrity::Distribution;
///
/// let d = Distribution::Uniform { lower: 10.0, upper: 20.0 };
/// assert!((d.quantile(0.25).unwrap() - 12.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Distribution {
    /// A fixed value.
    Deterministic {
        /// The value.
        value: f64,
    },
    /// Normal law with the given mean and standard deviation.
    Normal {
        /// Mean.
        mean: f64,
        /// Standard deviation, positive.
        std_dev: f64,
    },
    /// `ln X ~ N(mu, sigma)`.
    #[serde(rename = "lognormal")]
    LogNormal {
        /// Mean of `ln X`.
        mu: f64,
        /// Standard deviation of `ln X`, positive.
        sigma: f64,
    },
    /// Uniform law on `[lower, upper]`.
    Uniform {
        /// Lower end of the support.
        lower: f64,
        /// Upper end of the support, above `lower`.
        upper: f64,
    },
}

/// Validated form of a [`Distribution`].
enum Law {
    Fixed(f64),
    Normal(dist::Normal),
    LogNormal(dist::LogNormal),
    Uniform(dist::Uniform),
}

impl Law {
    fn quantile(&self, p: f64) -> Option<f64> {
        match self {
            Law::Fixed(value) => Some(*value),
            Law::Normal(d) => d.quantile(p),
            Law::LogNormal(d) => d.quantile(p),
            Law::Uniform(d) => d.quantile(p),
        }
    }

    /// Inverse CDF at a probability clamped into the open unit interval.
    fn clamped_quantile(&self, p: f64) -> Result<f64> {
        let p = p.clamp(MIN_PROBABILITY, 1.0 - MIN_PROBABILITY);
        self.quantile(p).ok_or_else(|| {
            IntegrityError::InvalidDistribution(format!("no quantile at probability {p}"))
        })
    }
}

impl Distribution {
    /// The vocabulary entry of this distribution.
    pub fn kind(&self) -> DistributionKind {
        match self {
            Distribution::Deterministic { .. } => DistributionKind::Deterministic,
            Distribution::Normal { .. } => DistributionKind::Normal,
            Distribution::LogNormal { .. } => DistributionKind::LogNormal,
            Distribution::Uniform { .. } => DistributionKind::Uniform,
        }
    }

    /// Checks the parameters.
    ///
    /// All parameters must be finite, spreads positive and `lower < upper`.
    pub fn validate(&self) -> Result<()> {
        self.law().map(|_| ())
    }

    fn law(&self) -> Result<Law> {
        Ok(match *self {
            Distribution::Deterministic { value } => {
                if !value.is_finite() {
                    return Err(IntegrityError::InvalidDistribution(format!(
                        "deterministic value {value} is not finite"
                    )));
                }
                Law::Fixed(value)
            }
            Distribution::Normal { mean, std_dev } => {
                Law::Normal(dist::Normal::new(mean, std_dev)?)
            }
            Distribution::LogNormal { mu, sigma } => {
                Law::LogNormal(dist::LogNormal::new(mu, sigma)?)
            }
            Distribution::Uniform { lower, upper } => {
                Law::Uniform(dist::Uniform::new(lower, upper)?)
            }
        })
    }

    /// Central value: the fixed value, the mean, the median `exp(mu)` or the
    /// midpoint.
    pub fn center(&self) -> f64 {
        match *self {
            Distribution::Deterministic { value } => value,
            Distribution::Normal { mean, .. } => mean,
            Distribution::LogNormal { mu, .. } => mu.exp(),
            Distribution::Uniform { lower, upper } => 0.5 * (lower + upper),
        }
    }

    /// Inverse CDF at probability `p`, `0 < p < 1`.
    pub fn quantile(&self, p: f64) -> Result<f64> {
        if !(p > 0.0 && p < 1.0) {
            return Err(IntegrityError::InvalidDistribution(format!(
                "probability {p} outside (0, 1)"
            )));
        }
        self.law()?.clamped_quantile(p)
    }

    /// Draws `n` independent random samples.
    pub fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>> {
        let law = self.law()?;
        (0..n)
            .map(|_| law.clamped_quantile(rng.random::<f64>()))
            .collect()
    }

    /// Draws `n` Latin hypercube samples.
    ///
    /// The unit interval is cut into `n` equal strata, one uniform point is
    /// drawn in each, mapped through the inverse CDF, and the results are
    /// shuffled.
    pub fn sample_lhs<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>> {
        let mut values = self.stratified(n, rng)?;
        values.shuffle(rng);
        Ok(values)
    }

    /// Stratified samples in ascending order.
    pub fn sample_sorted<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>> {
        let mut values = self.stratified(n, rng)?;
        values.sort_by(|a, b| a.total_cmp(b));
        Ok(values)
    }

    fn stratified<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>> {
        let law = self.law()?;
        let width = 1.0 / n as f64;
        (0..n)
            .map(|i| law.clamped_quantile((i as f64 + rng.random::<f64>()) * width))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_invalid_parameters_map_to_invalid_distribution() {
        let err = Distribution::Normal { mean: 0.0, std_dev: -2.0 }.validate().unwrap_err();
        match err {
            IntegrityError::InvalidDistribution(message) => {
                assert!(message.contains("Normal"), "{message}")
            }
            other => panic!("unexpected error {other:?}"),
        }
        let bad = Distribution::Uniform { lower: 3.0, upper: 3.0 };
        assert!(bad.quantile(0.5).is_err());
        assert!(bad.sample_lhs(4, &mut StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn test_quantile_matches_numflow() {
        let normal = dist::Normal::new(400.0, 10.0).unwrap();
        let d = Distribution::Normal { mean: 400.0, std_dev: 10.0 };
        for p in [0.01, 0.3, 0.5, 0.9] {
            assert_eq!(d.quantile(p).unwrap(), normal.quantile(p).unwrap());
        }
    }

    #[test]
    fn test_validate() {
        assert!(Distribution::Normal { mean: 1.0, std_dev: 0.0 }.validate().is_err());
        assert!(Distribution::LogNormal { mu: 0.0, sigma: -1.0 }.validate().is_err());
        assert!(Distribution::Uniform { lower: 2.0, upper: 1.0 }.validate().is_err());
        assert!(Distribution::Deterministic { value: f64::NAN }.validate().is_err());
        assert!(Distribution::Uniform { lower: 1.0, upper: 2.0 }.validate().is_ok());
    }

    #[test]
    fn test_quantiles() {
        let normal = Distribution::Normal { mean: 400.0, std_dev: 10.0 };
        assert!((normal.quantile(0.5).unwrap() - 400.0).abs() < 1e-2);
        assert!((normal.quantile(0.975).unwrap() - 419.6).abs() < 0.1);

        let lognormal = Distribution::LogNormal { mu: 1.0, sigma: 0.5 };
        assert!((lognormal.quantile(0.5).unwrap() - 1.0_f64.exp()).abs() < 1e-2);

        let fixed = Distribution::Deterministic { value: 3.0 };
        assert_eq!(fixed.quantile(0.01).unwrap(), 3.0);
    }

    #[test]
    fn test_quantile_probability_range() {
        let d = Distribution::Uniform { lower: 0.0, upper: 1.0 };
        assert!(d.quantile(0.0).is_err());
        assert!(d.quantile(1.0).is_err());
        assert!(d.quantile(f64::NAN).is_err());
    }

    #[test]
    fn test_center() {
        assert_eq!(Distribution::Uniform { lower: 1.0, upper: 3.0 }.center(), 2.0);
        assert_eq!(Distribution::Normal { mean: 5.0, std_dev: 1.0 }.center(), 5.0);
    }

    #[test]
    fn test_lhs_one_point_per_stratum() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 50;
        let d = Distribution::Uniform { lower: 0.0, upper: 1.0 };
        let mut values = d.sample_lhs(n, &mut rng).unwrap();
        values.sort_by(|a, b| a.total_cmp(b));
        for (i, v) in values.iter().enumerate() {
            assert!(*v >= i as f64 / n as f64 - 1e-12, "stratum {i}: {v}");
            assert!(*v <= (i + 1) as f64 / n as f64 + 1e-12, "stratum {i}: {v}");
        }
    }

    #[test]
    fn test_lhs_is_reproducible() {
        let d = Distribution::Normal { mean: 0.0, std_dev: 1.0 };
        let a = d.sample_lhs(20, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = d.sample_lhs(20, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_samples_within_support() {
        let d = Distribution::Uniform { lower: 2.0, upper: 3.0 };
        let values = d.sample(200, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(values.len(), 200);
        assert!(values.iter().all(|&v| (2.0..=3.0).contains(&v)));
        let mean = values.iter().sum::<f64>() / 200.0;
        assert!((mean - 2.5).abs() < 0.1);
    }

    #[test]
    fn test_sorted_samples() {
        let d = Distribution::LogNormal { mu: 0.0, sigma: 1.0 };
        let values = d.sample_sorted(30, &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert!(values.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_serde_tagged() {
        let d = Distribution::LogNormal { mu: 0.5, sigma: 0.1 };
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains(r#""kind":"lognormal""#), "{json}");
        let back: Distribution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
