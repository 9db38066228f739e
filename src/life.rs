//! Pipe life criteria read off a crack history.
//!
//! For each sample the accumulated cycles are interpolated against crack
//! depth:
//!
//! ```text
//! N_c     = N(a_crit)          cycles to the critical crack depth
//! N_1/4   = N(a_crit / 4)      cycles to a quarter of it
//! N_c / 2                      half the cycles to failure
//! ```
//!
//! together with the a/t reached at each of those points. Depths beyond the
//! recorded history take the end values of the history.

use serde::Serialize;
use tracing::debug;

use crate::error::{IntegrityError, Result};
use crate::evolution::CycleHistory;
use crate::parameter::{at, broadcast_len};

/// Life criteria per sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifeCriteria {
    /// Cycles to reach the critical crack depth.
    pub cycles_to_a_crit: Vec<f64>,
    /// Cycles to reach a quarter of the critical crack depth.
    pub cycles_to_quarter_a_crit: Vec<f64>,
    /// Half of the cycles to the critical crack depth.
    pub cycles_to_half_life: Vec<f64>,
    /// a/t at the critical crack depth.
    pub a_over_t_at_a_crit: Vec<f64>,
    /// a/t at a quarter of the critical crack depth.
    pub a_over_t_at_quarter_a_crit: Vec<f64>,
    /// a/t after half the cycles to the critical crack depth.
    pub a_over_t_at_half_life: Vec<f64>,
}

impl LifeCriteria {
    /// Evaluates the criteria on `history` for the given critical depths.
    ///
    /// `a_crit` holds one value per sample or a single value.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_integrity::{
    ///     calc_critical_crack_depth, CrackGrowth, CrackOrientation, CycleEvolution, Defect,
    ///     Environment, FailureCriterion, GrowthModel, LifeCriteria, Material, Pipe, StressState,
    /// };
    ///
    /// let environment = Environment::new(13.0, 1.3, 1).unwrap();
    /// let growth = CrackGrowth::new(&environment, GrowthModel::CodeCase2938).unwrap();
    /// let state = StressState::new(
    ///     Pipe::new(0.9144, 0.0191, 1).unwrap(),
    ///     environment,
    ///     Material::new(358.0, 55.0, 1).unwrap(),
    ///     Defect::new(25.0, 0.04, 1.0, 1).unwrap(),
    ///     CrackOrientation::AxialHoop,
    /// )
    /// .unwrap();
    /// let history = CycleEvolution::new(&state, &growth).unwrap().calc_life_assessment().unwrap();
    /// let a_crit = calc_critical_crack_depth(&state, FailureCriterion::default()).unwrap();
    ///
    /// let life = LifeCriteria::from_history(&history, &a_crit).unwrap();
    /// assert!(life.cycles_to_quarter_a_crit[0] <= life.cycles_to_a_crit[0]);
    /// ```
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::SizeMismatch`] if `a_crit` does not fit the
    ///   sample size of `history`
    /// - [`IntegrityError::InvalidGeometry`] for an empty history
    pub fn from_history(history: &CycleHistory, a_crit: &[f64]) -> Result<Self> {
        let n = history.sample_size();
        let len = broadcast_len(&[("history", n), ("a_crit", a_crit.len())])?;
        if len != n {
            return Err(IntegrityError::SizeMismatch {
                name: "a_crit".to_string(),
                expected: n,
                actual: a_crit.len(),
            });
        }

        let mut life = Self {
            cycles_to_a_crit: Vec::with_capacity(n),
            cycles_to_quarter_a_crit: Vec::with_capacity(n),
            cycles_to_half_life: Vec::with_capacity(n),
            a_over_t_at_a_crit: Vec::with_capacity(n),
            a_over_t_at_quarter_a_crit: Vec::with_capacity(n),
            a_over_t_at_half_life: Vec::with_capacity(n),
        };
        for i in 0..n {
            let depth = history.crack_depth_path(i)?;
            let cycles = history.total_cycles_path(i)?;
            let a_over_t = history.a_over_t_path(i)?;
            let critical = at(a_crit, i);

            let interp = |x: f64, xs: &[f64], ys: &[f64]| {
                interpolate(x, xs, ys).ok_or_else(|| {
                    IntegrityError::InvalidGeometry("crack history is empty".to_string())
                })
            };
            let n_crit = interp(critical, &depth, &cycles)?;
            let half_life = 0.5 * n_crit;
            life.cycles_to_a_crit.push(n_crit);
            life.cycles_to_quarter_a_crit.push(interp(0.25 * critical, &depth, &cycles)?);
            life.cycles_to_half_life.push(half_life);
            life.a_over_t_at_a_crit.push(interp(critical, &depth, &a_over_t)?);
            life.a_over_t_at_quarter_a_crit
                .push(interp(0.25 * critical, &depth, &a_over_t)?);
            life.a_over_t_at_half_life.push(interp(half_life, &cycles, &a_over_t)?);
        }
        debug!(samples = n, "life criteria evaluated");
        Ok(life)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.cycles_to_a_crit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles_to_a_crit.is_empty()
    }
}

/// Piecewise-linear interpolation of `ys` over non-decreasing `xs`.
///
/// Outside the range of `xs` the first or last `y` is returned; a vertical
/// run of equal `xs` resolves to its last `y`. `None` for empty input.
pub(crate) fn interpolate(x: f64, xs: &[f64], ys: &[f64]) -> Option<f64> {
    let (&first_x, &last_x) = (xs.first()?, xs.last()?);
    let (&first_y, &last_y) = (ys.first()?, ys.last()?);
    if x <= first_x {
        return Some(first_y);
    }
    if x >= last_x {
        return Some(last_y);
    }
    let j = xs.partition_point(|&v| v < x);
    let (x0, x1) = (xs[j - 1], xs[j]);
    let (y0, y1) = (ys[j - 1], ys[j]);
    if x1 == x0 {
        return Some(y1);
    }
    Some(y0 + (x - x0) * (y1 - y0) / (x1 - x0))
}
