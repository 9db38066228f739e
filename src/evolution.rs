//! Fatigue crack evolution under pressure cycling.
//!
//! Starting from the initial flaw of a [`StressState`], the crack is grown
//! step by step with a [`CrackGrowth`] law. Each step records crack depth,
//! stress intensity and the accumulated cycle count per sample:
//!
//! ```text
//! dK = K_max (1 - R)
//! crack-depth stepping:  a_(j+1) = a_j + da,   dN = da / (da/dN)(dK)
//! cycle stepping:        dN = 1,               a_(j+1) = a_j + (da/dN)(dK)
//! ```
//!
//! The crack keeps its initial aspect ratio `a/c`; the stress intensity is
//! evaluated with `eta` set to the current crack length `2c`. Growth stops
//! at the configured fraction of the wall thickness.
//!
//! The critical crack depth `a_crit` is the depth at which the failure
//! criterion is first met. With [`FailureCriterion::Toughness`] that is
//! `K_max(a) = K_mat`; with [`FailureCriterion::Diagram`] the toughness
//! ratio reaches the FAD envelope at the load ratio of the uncracked wall.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::crack_growth::CrackGrowth;
use crate::error::{IntegrityError, Result};
use crate::fracture::{FailureAssessment, FailureAssessmentDiagram, FailureAssessmentResult};
use crate::specification::{check_index, Specification};
use crate::stress::{StressIntensity, StressState};

/// Initial a/t step as a fraction of the initial a/t.
const INITIAL_STEP_FRACTION: f64 = 1e-3;
/// Relative a/t change below which the step grows.
const MIN_RELATIVE_CHANGE: f64 = 0.1;
/// Relative a/t change above which the step shrinks.
const MAX_RELATIVE_CHANGE: f64 = 0.5;
/// Fractional step adjustment.
const STEP_ADJUSTMENT: f64 = 0.005;

/// Upper end of the critical depth bracket, as a fraction of the wall
/// thickness.
const THROUGH_WALL_FRACTION: f64 = 1.0 - 1e-9;
/// Bisection stops once the bracket is narrower than this fraction of `t`.
const CRITICAL_DEPTH_TOLERANCE: f64 = 1e-10;
const MAX_BISECTION_STEPS: usize = 200;

/// How a crack history advances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CycleStepping {
    /// Adaptive a/t increments until every sample reaches the depth limit.
    #[default]
    CrackDepth,
    /// One load cycle per step for a fixed number of steps.
    Cycles { count: usize },
}

/// Settings of a crack evolution run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Stepping mode.
    pub stepping: CycleStepping,
    /// Crack depth at which growth stops, as a fraction of the wall
    /// thickness, in `(0, 1)`.
    pub a_over_t_limit: f64,
    /// Step budget; a run that exhausts it ends early with a warning.
    pub max_steps: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            stepping: CycleStepping::CrackDepth,
            a_over_t_limit: 0.8,
            max_steps: 100_000,
        }
    }
}

impl EvolutionConfig {
    fn validate(&self) -> Result<()> {
        if !(self.a_over_t_limit > 0.0 && self.a_over_t_limit < 1.0) {
            return Err(IntegrityError::InvalidGeometry(format!(
                "a/t limit must lie in (0, 1), got {}",
                self.a_over_t_limit
            )));
        }
        if self.max_steps == 0 {
            return Err(IntegrityError::InvalidSampleSize {
                name: "max_steps".to_string(),
                size: 0,
            });
        }
        Ok(())
    }
}

/// Failure condition that defines the critical crack depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureCriterion {
    /// Maximum stress intensity reaches the fracture resistance.
    Toughness,
    /// The assessment point reaches the FAD envelope.
    Diagram(FailureAssessmentDiagram),
}

impl Default for FailureCriterion {
    fn default() -> Self {
        FailureCriterion::Diagram(FailureAssessmentDiagram::default())
    }
}

/// One step of a crack history, one value per sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleStep {
    /// Crack depth over wall thickness.
    pub a_over_t: Vec<f64>,
    /// Crack depth `a` (m).
    pub crack_depth: Vec<f64>,
    /// Depth increase since the previous step (m).
    pub delta_a: Vec<f64>,
    /// Crack length `2c` (m).
    pub crack_length: Vec<f64>,
    /// Maximum stress intensity (MPa m^1/2).
    pub k_max: Vec<f64>,
    pub f: Vec<f64>,
    pub q: Vec<f64>,
    /// Stress-intensity range `K_max (1 - R)`.
    pub delta_k: Vec<f64>,
    /// Cycles spent in this step.
    pub delta_n: Vec<f64>,
    /// Cycles accumulated up to this step.
    pub total_cycles: Vec<f64>,
}

impl CycleStep {
    fn single(&self, i: usize) -> Self {
        Self {
            a_over_t: vec![self.a_over_t[i]],
            crack_depth: vec![self.crack_depth[i]],
            delta_a: vec![self.delta_a[i]],
            crack_length: vec![self.crack_length[i]],
            k_max: vec![self.k_max[i]],
            f: vec![self.f[i]],
            q: vec![self.q[i]],
            delta_k: vec![self.delta_k[i]],
            delta_n: vec![self.delta_n[i]],
            total_cycles: vec![self.total_cycles[i]],
        }
    }
}

/// Crack histories of a batch, starting with the initial flaw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleHistory {
    steps: Vec<CycleStep>,
    sample_size: usize,
}

impl CycleHistory {
    /// Number of recorded steps, the initial flaw included.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of samples per step.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// All steps in order.
    pub fn steps(&self) -> &[CycleStep] {
        &self.steps
    }

    /// Final step.
    pub fn last(&self) -> Option<&CycleStep> {
        self.steps.last()
    }

    /// a/t of sample `index` at every step.
    pub fn a_over_t_path(&self, index: usize) -> Result<Vec<f64>> {
        self.path(index, |s| &s.a_over_t)
    }

    /// Crack depth of sample `index` at every step.
    pub fn crack_depth_path(&self, index: usize) -> Result<Vec<f64>> {
        self.path(index, |s| &s.crack_depth)
    }

    /// Accumulated cycles of sample `index` at every step.
    pub fn total_cycles_path(&self, index: usize) -> Result<Vec<f64>> {
        self.path(index, |s| &s.total_cycles)
    }

    /// Maximum stress intensity of sample `index` at every step.
    pub fn k_max_path(&self, index: usize) -> Result<Vec<f64>> {
        self.path(index, |s| &s.k_max)
    }

    /// History of sample `index` alone.
    pub fn get_single_history(&self, index: usize) -> Result<Self> {
        check_index(index, self.sample_size)?;
        Ok(Self {
            steps: self.steps.iter().map(|s| s.single(index)).collect(),
            sample_size: 1,
        })
    }

    /// FAD point of every sample at every step.
    ///
    /// The load ratio uses the reference stress of the uncracked wall, so
    /// it stays constant along a history while the toughness ratio follows
    /// `K_max`.
    pub fn calc_failure_assessment(
        &self,
        state: &StressState,
    ) -> Result<Vec<FailureAssessmentResult>> {
        if state.sample_size() != self.sample_size {
            return Err(IntegrityError::SizeMismatch {
                name: "stress_state".to_string(),
                expected: self.sample_size,
                actual: state.sample_size(),
            });
        }
        let reference_stress = state.calc_stress_solution(&[0.0])?;
        let assessment = FailureAssessment::from_material(state.material())?;
        self.steps
            .iter()
            .map(|step| {
                assessment.assess_failure_state(
                    &step.k_max,
                    &reference_stress,
                    &step.crack_depth,
                    &step.crack_length,
                    None,
                )
            })
            .collect()
    }

    fn path(&self, index: usize, field: impl Fn(&CycleStep) -> &Vec<f64>) -> Result<Vec<f64>> {
        check_index(index, self.sample_size)?;
        Ok(self.steps.iter().map(|s| field(s)[index]).collect())
    }
}

/// Crack evolution of a stress state under a growth law.
///
/// # Examples
///
/// ```
/// use u_integrity::{
///     CrackGrowth, CrackOrientation, CycleEvolution, Defect, Environment, GrowthModel,
///     Material, Pipe, StressState,
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
///
/// let history = CycleEvolution::new(&state, &growth).unwrap().calc_life_assessment().unwrap();
/// let last = history.last().unwrap();
/// assert!((last.a_over_t[0] - 0.8).abs() < 1e-12);
/// assert!(last.total_cycles[0] > 0.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CycleEvolution<'a> {
    state: &'a StressState,
    growth: &'a CrackGrowth,
    config: EvolutionConfig,
}

impl<'a> CycleEvolution<'a> {
    /// Pairs a stress state with a growth law of the same sample size.
    pub fn new(state: &'a StressState, growth: &'a CrackGrowth) -> Result<Self> {
        if growth.sample_size() != state.sample_size() {
            return Err(IntegrityError::SizeMismatch {
                name: "crack_growth".to_string(),
                expected: state.sample_size(),
                actual: growth.sample_size(),
            });
        }
        Ok(Self {
            state,
            growth,
            config: EvolutionConfig::default(),
        })
    }

    /// Replaces the run settings.
    pub fn with_config(mut self, config: EvolutionConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Critical crack depth per sample. See [`calc_critical_crack_depth`].
    pub fn calc_critical_crack_depth(&self, criterion: FailureCriterion) -> Result<Vec<f64>> {
        calc_critical_crack_depth(self.state, criterion)
    }

    /// Grows every crack from its initial depth and returns the history.
    pub fn calc_life_assessment(&self) -> Result<CycleHistory> {
        let mut steps = vec![self.initial_step()?];
        match self.config.stepping {
            CycleStepping::CrackDepth => loop {
                let step_sizes = self.step_sizes(&steps);
                let limit = self.config.a_over_t_limit;
                let Some(last) = steps.last() else { break };
                let finished = last
                    .a_over_t
                    .iter()
                    .zip(&step_sizes)
                    .all(|(&a_t, &step)| a_t >= limit || step <= 0.0);
                if finished {
                    break;
                }
                if steps.len() > self.config.max_steps {
                    warn!(steps = steps.len(), "crack evolution stopped at step budget");
                    break;
                }
                let next = self.crack_depth_step(last, &step_sizes)?;
                steps.push(next);
            },
            CycleStepping::Cycles { count } => {
                for _ in 0..count.min(self.config.max_steps) {
                    let Some(last) = steps.last() else { break };
                    let next = self.cycle_step(last)?;
                    steps.push(next);
                }
            }
        }
        info!(
            samples = self.state.sample_size(),
            steps = steps.len(),
            "crack evolution finished"
        );
        Ok(CycleHistory {
            steps,
            sample_size: self.state.sample_size(),
        })
    }

    fn initial_step(&self) -> Result<CycleStep> {
        let n = self.state.sample_size();
        let crack_depth = self.state.initial_crack_depth().to_vec();
        let t = self.state.pipe().wall_thickness();
        let a_over_t = crack_depth.iter().zip(t.iter()).map(|(a, t)| a / t).collect();
        self.complete_step(a_over_t, crack_depth, vec![0.0; n], vec![0.0; n], &vec![0.0; n])
    }

    /// Adaptive a/t increment per sample.
    fn step_sizes(&self, steps: &[CycleStep]) -> Vec<f64> {
        let n = self.state.sample_size();
        match steps {
            [.., previous, last] if steps.len() > 3 => (0..n)
                .map(|i| {
                    let current = last.a_over_t[i] - previous.a_over_t[i];
                    let change = if last.a_over_t[i] > 0.0 {
                        current / last.a_over_t[i]
                    } else {
                        0.0
                    };
                    if change < MIN_RELATIVE_CHANGE {
                        current * (1.0 + STEP_ADJUSTMENT)
                    } else if change > MAX_RELATIVE_CHANGE {
                        current * (1.0 - STEP_ADJUSTMENT)
                    } else {
                        current
                    }
                })
                .collect(),
            [first, ..] => first
                .a_over_t
                .iter()
                .map(|a_t| a_t * INITIAL_STEP_FRACTION)
                .collect(),
            [] => vec![0.0; n],
        }
    }

    fn crack_depth_step(&self, last: &CycleStep, step_sizes: &[f64]) -> Result<CycleStep> {
        let t = self.state.pipe().wall_thickness();
        let a_over_t: Vec<f64> = last
            .a_over_t
            .iter()
            .zip(step_sizes)
            .map(|(a_t, step)| (a_t + step).min(self.config.a_over_t_limit))
            .collect();
        let crack_depth: Vec<f64> = a_over_t.iter().zip(t.iter()).map(|(a_t, t)| a_t * t).collect();
        let delta_a: Vec<f64> = crack_depth
            .iter()
            .zip(&last.crack_depth)
            .map(|(a, prev)| (a - prev).max(0.0))
            .collect();
        let (crack_length, sif) = stress_intensity(self.state, &crack_depth)?;
        let delta_k = self.delta_k(&sif.k);
        let delta_n = self.growth.calc_delta_n(&delta_a, &delta_k)?;
        Ok(assemble_step(
            a_over_t,
            crack_depth,
            delta_a,
            crack_length,
            sif,
            delta_k,
            delta_n,
            &last.total_cycles,
        ))
    }

    fn cycle_step(&self, last: &CycleStep) -> Result<CycleStep> {
        let n = self.state.sample_size();
        let t = self.state.pipe().wall_thickness();
        let delta_n = vec![1.0; n];
        let growth = self
            .growth
            .calc_change_in_crack_size(&delta_n, &last.delta_k)?;
        let crack_depth: Vec<f64> = (0..n)
            .map(|i| (last.crack_depth[i] + growth[i]).min(self.config.a_over_t_limit * t[i]))
            .collect();
        let a_over_t = crack_depth.iter().zip(t.iter()).map(|(a, t)| a / t).collect();
        let delta_a = crack_depth
            .iter()
            .zip(&last.crack_depth)
            .map(|(a, prev)| (a - prev).max(0.0))
            .collect();
        self.complete_step(a_over_t, crack_depth, delta_a, delta_n, &last.total_cycles)
    }

    fn complete_step(
        &self,
        a_over_t: Vec<f64>,
        crack_depth: Vec<f64>,
        delta_a: Vec<f64>,
        delta_n: Vec<f64>,
        previous_total: &[f64],
    ) -> Result<CycleStep> {
        let (crack_length, sif) = stress_intensity(self.state, &crack_depth)?;
        let delta_k = self.delta_k(&sif.k);
        Ok(assemble_step(
            a_over_t,
            crack_depth,
            delta_a,
            crack_length,
            sif,
            delta_k,
            delta_n,
            previous_total,
        ))
    }

    fn delta_k(&self, k_max: &[f64]) -> Vec<f64> {
        k_max
            .iter()
            .zip(self.growth.r_ratio())
            .map(|(k, r)| k * (1.0 - r).max(0.0))
            .collect()
    }
}

#[allow(clippy::too_many_arguments)]
fn assemble_step(
    a_over_t: Vec<f64>,
    crack_depth: Vec<f64>,
    delta_a: Vec<f64>,
    crack_length: Vec<f64>,
    sif: StressIntensity,
    delta_k: Vec<f64>,
    delta_n: Vec<f64>,
    previous_total: &[f64],
) -> CycleStep {
    let total_cycles = previous_total
        .iter()
        .zip(&delta_n)
        .map(|(total, dn)| total + dn)
        .collect();
    CycleStep {
        a_over_t,
        crack_depth,
        delta_a,
        crack_length,
        k_max: sif.k,
        f: sif.f,
        q: sif.q,
        delta_k,
        delta_n,
        total_cycles,
    }
}

/// Crack length `2c` at the initial aspect ratio and the stress intensity
/// evaluated with it.
fn stress_intensity(state: &StressState, crack_depth: &[f64]) -> Result<(Vec<f64>, StressIntensity)> {
    let a_over_c = state.a_over_c();
    let flaw_length = state.defect().flaw_length();
    let crack_length: Vec<f64> = (0..state.sample_size())
        .map(|i| {
            if a_over_c[i] > 0.0 {
                2.0 * crack_depth[i] / a_over_c[i]
            } else {
                flaw_length[i]
            }
        })
        .collect();
    let sif = state.calc_stress_intensity_factor(crack_depth, &crack_length)?;
    Ok((crack_length, sif))
}

/// Critical crack depth of every sample, solved in parallel.
///
/// Each sample is solved on its own single-sample stress state by
/// bisection on the crack depth. A sample whose crack reaches the wall
/// before the criterion is met gets the wall thickness; a sample whose
/// uncracked load ratio already lies beyond the FAD cut-off gets zero.
pub fn calc_critical_crack_depth(
    state: &StressState,
    criterion: FailureCriterion,
) -> Result<Vec<f64>> {
    let depths = (0..state.sample_size())
        .into_par_iter()
        .map(|i| critical_depth(&state.get_single_stress_state(i)?, criterion))
        .collect::<Result<Vec<f64>>>()?;
    debug!(samples = depths.len(), ?criterion, "critical crack depth solved");
    Ok(depths)
}

fn critical_depth(single: &StressState, criterion: FailureCriterion) -> Result<f64> {
    let t = single.pipe().wall_thickness()[0];
    let allowable_toughness_ratio = match criterion {
        FailureCriterion::Toughness => 1.0,
        FailureCriterion::Diagram(fad) => {
            let load_ratio =
                single.calc_stress_solution(&[0.0])?[0] / single.material().yield_strength()[0];
            match fad.envelope(load_ratio) {
                Some(boundary) => boundary,
                None => return Ok(0.0),
            }
        }
    };
    let target = allowable_toughness_ratio * single.material().fracture_resistance()[0];
    let k_at = |a: f64| -> Result<f64> { Ok(stress_intensity(single, &[a])?.1.k[0]) };

    let upper = t * THROUGH_WALL_FRACTION;
    if k_at(upper)? < target {
        return Ok(t);
    }
    let (mut lo, mut hi) = (0.0, upper);
    for _ in 0..MAX_BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if k_at(mid)? < target {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= CRITICAL_DEPTH_TOLERANCE * t {
            break;
        }
    }
    Ok(0.5 * (lo + hi))
}
