//! Periodic inspection and mitigation of growing cracks.
//!
//! Inspections happen every `inspection_interval` cycles up to the longest
//! recorded history. At each inspection the crack size a/t is interpolated
//! from the history. A crack is detectable when it is at least the detection
//! resolution and has not yet reached the failure size. A detectable crack
//! is found with the probability of detection, and a sample is mitigated
//! once any inspection finds it.

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::{IntegrityError, Result};
use crate::evolution::CycleHistory;
use crate::life::interpolate;
use crate::parameter::{at, broadcast_len, Parameter};

/// Inspection program settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InspectionMitigation {
    probability_of_detection: f64,
    detection_resolution: f64,
    inspection_interval: f64,
}

impl InspectionMitigation {
    /// Creates an inspection program.
    ///
    /// # Errors
    ///
    /// [`IntegrityError::BoundsViolation`] if the probability of detection
    /// or the resolution (an a/t value) lies outside `[0, 1]`, or the
    /// interval is not positive.
    pub fn new(
        probability_of_detection: f64,
        detection_resolution: f64,
        inspection_interval: f64,
    ) -> Result<Self> {
        let pod = Parameter::new("probability_of_detection", probability_of_detection, 0.0, 1.0, 1)?;
        let resolution = Parameter::new("detection_resolution", detection_resolution, 0.0, 1.0, 1)?;
        let interval = Parameter::new(
            "inspection_interval",
            inspection_interval,
            f64::MIN_POSITIVE,
            f64::INFINITY,
            1,
        )?;
        Ok(Self {
            probability_of_detection: pod[0],
            detection_resolution: resolution[0],
            inspection_interval: interval[0],
        })
    }

    pub fn probability_of_detection(&self) -> f64 {
        self.probability_of_detection
    }

    pub fn detection_resolution(&self) -> f64 {
        self.detection_resolution
    }

    pub fn inspection_interval(&self) -> f64 {
        self.inspection_interval
    }

    /// Inspection times in cycles, `interval * k` up to the largest
    /// accumulated cycle count of `history`.
    pub fn inspection_schedule(&self, history: &CycleHistory) -> Vec<f64> {
        let max_cycles = history
            .last()
            .map(|step| step.total_cycles.iter().copied().fold(0.0, f64::max))
            .unwrap_or(0.0);
        let count = (max_cycles / self.inspection_interval).floor() as usize;
        (1..=count)
            .map(|k| k as f64 * self.inspection_interval)
            .collect()
    }

    /// Runs the inspection program over every sample of `history`.
    ///
    /// `failure_a_over_t` is the a/t at which a sample fails, one value per
    /// sample or a single value. Inspections before the first step or after
    /// the end of a sample's history are skipped without a draw.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::rngs::StdRng;
    /// use rand::SeedableRng;
    /// use u_integrity::{
    ///     CrackGrowth, CrackOrientation, CycleEvolution, Defect, Environment, GrowthModel,
    ///     InspectionMitigation, Material, Pipe, StressState,
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
    ///
    /// let total = history.last().unwrap().total_cycles[0];
    /// let program = InspectionMitigation::new(1.0, 0.0, total / 4.0).unwrap();
    /// let result = program
    ///     .inspect_then_mitigate(&history, &[0.8], &mut StdRng::seed_from_u64(1))
    ///     .unwrap();
    /// assert_eq!(result.mitigated, vec![true]);
    /// ```
    pub fn inspect_then_mitigate<R: Rng>(
        &self,
        history: &CycleHistory,
        failure_a_over_t: &[f64],
        rng: &mut R,
    ) -> Result<MitigationResult> {
        let n = history.sample_size();
        let len = broadcast_len(&[("history", n), ("failure_a_over_t", failure_a_over_t.len())])?;
        if len != n {
            return Err(IntegrityError::SizeMismatch {
                name: "failure_a_over_t".to_string(),
                expected: n,
                actual: failure_a_over_t.len(),
            });
        }

        let inspection_cycles = self.inspection_schedule(history);
        let mut mitigated = Vec::with_capacity(n);
        let mut detections = Vec::with_capacity(n);
        for i in 0..n {
            let cycles = history.total_cycles_path(i)?;
            let a_over_t = history.a_over_t_path(i)?;
            let failure_size = at(failure_a_over_t, i);

            let found: Vec<bool> = inspection_cycles
                .iter()
                .filter_map(|&inspection| {
                    let j = cycles.partition_point(|&c| c < inspection);
                    if j == 0 || j >= cycles.len() {
                        return None;
                    }
                    let size = interpolate(inspection, &cycles[j - 1..=j], &a_over_t[j - 1..=j])?;
                    let detectable = size >= self.detection_resolution && size < failure_size;
                    let draw: f64 = rng.random();
                    Some(detectable && draw < self.probability_of_detection)
                })
                .collect();
            mitigated.push(found.iter().any(|&d| d));
            detections.push(found);
        }
        debug!(
            samples = n,
            inspections = inspection_cycles.len(),
            mitigated = mitigated.iter().filter(|&&m| m).count(),
            "inspection program evaluated"
        );
        Ok(MitigationResult {
            inspection_cycles,
            detections,
            mitigated,
        })
    }
}

/// Outcome of an inspection program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MitigationResult {
    /// Scheduled inspection times in cycles.
    pub inspection_cycles: Vec<f64>,
    /// Per sample, whether each performed inspection found the crack.
    pub detections: Vec<Vec<bool>>,
    /// Per sample, whether any inspection found the crack.
    pub mitigated: Vec<bool>,
}

impl MitigationResult {
    /// Fraction of mitigated samples, `None` for an empty batch.
    pub fn mitigated_fraction(&self) -> Option<f64> {
        if self.mitigated.is_empty() {
            return None;
        }
        let count = self.mitigated.iter().filter(|&&m| m).count();
        Some(count as f64 / self.mitigated.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crack_growth::{CrackGrowth, GrowthModel};
    use crate::evolution::{CycleEvolution, CycleStepping, EvolutionConfig};
    use crate::specification::{Defect, Environment, Material, Pipe};
    use crate::stress::{CrackOrientation, StressState};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cycle_history(sample_size: usize, flaw_depth: Vec<f64>, count: usize) -> CycleHistory {
        let state = StressState::new(
            Pipe::new(0.9144, 0.0191, sample_size).unwrap(),
            Environment::new(13.0, 1.3, sample_size).unwrap(),
            Material::new(358.0, 55.0, sample_size).unwrap(),
            Defect::new(flaw_depth, 0.04, 1.0, sample_size).unwrap(),
            CrackOrientation::AxialHoop,
        )
        .unwrap();
        let growth = CrackGrowth::new(state.environment(), GrowthModel::CodeCase2938).unwrap();
        CycleEvolution::new(&state, &growth)
            .unwrap()
            .with_config(EvolutionConfig {
                stepping: CycleStepping::Cycles { count },
                ..EvolutionConfig::default()
            })
            .unwrap()
            .calc_life_assessment()
            .unwrap()
    }

    #[test]
    fn test_invalid_program() {
        assert!(InspectionMitigation::new(1.5, 0.1, 100.0).is_err());
        assert!(InspectionMitigation::new(0.9, -0.1, 100.0).is_err());
        assert!(InspectionMitigation::new(0.9, 0.1, 0.0).is_err());
        assert!(InspectionMitigation::new(0.9, 0.1, f64::NAN).is_err());
    }

    #[test]
    fn test_schedule() {
        let history = cycle_history(1, vec![25.0], 10);
        let program = InspectionMitigation::new(1.0, 0.0, 3.0).unwrap();
        assert_eq!(program.inspection_schedule(&history), vec![3.0, 6.0, 9.0]);
        let rare = InspectionMitigation::new(1.0, 0.0, 50.0).unwrap();
        assert!(rare.inspection_schedule(&history).is_empty());
    }

    #[test]
    fn test_resolution_gates_detection() {
        // a/t of 0.1 and 0.3 against a resolution of 0.2
        let history = cycle_history(2, vec![10.0, 30.0], 10);
        let program = InspectionMitigation::new(1.0, 0.2, 5.0).unwrap();
        let result = program
            .inspect_then_mitigate(&history, &[0.8], &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(result.mitigated, vec![false, true]);
        assert_eq!(result.detections[1], vec![true, true]);
        assert_eq!(result.mitigated_fraction(), Some(0.5));
    }

    #[test]
    fn test_failed_crack_is_not_mitigated() {
        let history = cycle_history(1, vec![30.0], 10);
        let program = InspectionMitigation::new(1.0, 0.0, 5.0).unwrap();
        let result = program
            .inspect_then_mitigate(&history, &[0.2], &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(result.mitigated, vec![false]);
    }

    #[test]
    fn test_zero_detection_probability() {
        let history = cycle_history(1, vec![30.0], 10);
        let program = InspectionMitigation::new(0.0, 0.0, 2.0).unwrap();
        let result = program
            .inspect_then_mitigate(&history, &[0.8], &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(result.detections[0].len(), 5);
        assert_eq!(result.mitigated, vec![false]);
    }

    #[test]
    fn test_inspection_at_final_step_is_performed() {
        let history = cycle_history(1, vec![30.0], 4);
        let program = InspectionMitigation::new(1.0, 0.0, 4.0).unwrap();
        let result = program
            .inspect_then_mitigate(&history, &[0.8], &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(result.inspection_cycles, vec![4.0]);
        assert_eq!(result.detections[0], vec![true]);
    }

    #[test]
    fn test_failure_size_mismatch() {
        let history = cycle_history(2, vec![25.0, 25.0], 3);
        let program = InspectionMitigation::new(1.0, 0.0, 1.0).unwrap();
        assert!(program
            .inspect_then_mitigate(&history, &[0.8, 0.8, 0.8], &mut StdRng::seed_from_u64(1))
            .is_err());
    }
}
