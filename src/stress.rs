//! Pressure-driven stress state of a cracked pipe.
//!
//! Combines the four specification entities into the quantities the
//! failure assessment needs: the reference stress solution (hoop or
//! longitudinal membrane stress over the remaining ligament) and the
//! stress-intensity factor of an internal surface flaw.
//!
//! # Stress-intensity solutions
//!
//! Axial flaws under hoop stress take the smaller of two solutions:
//!
//! ```text
//! finite length:  K = P (R/t) sqrt(pi a / Q) F
//!                 F = 1.12 + 0.053 eta + 0.0055 eta^2
//!                     + (1 + 0.02 eta + 0.0191 eta^2) (20 - R/t)^2 / 1400
//! long flaw:      K = 2 P Ro^2 / (Ro^2 - Ri^2) sqrt(pi a) F
//!                 F = 1.1 + A (4.951 (a/t)^2 + 1.092 (a/t)^4)
//! ```
//!
//! Circumferential flaws under longitudinal stress:
//!
//! ```text
//! K = sigma_L sqrt(pi a / Q) F
//! F = 1 + (0.02 + eta (0.0103 + 0.00617 eta) + 0.0035 (1 + 0.7 eta) (R/t - 5)^0.7) Q^2
//! ```
//!
//! with the flaw shape factor `Q = 1 + 1.464 (a/c)^1.65`.
//!
//! # References
//!
//! - Anderson, T.L. (2017), *Fracture Mechanics: Fundamentals and
//!   Applications*, 4th ed., Appendix A.
//! - API 579-1/ASME FFS-1 (2021), Annex 9B.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IntegrityError, Result};
use crate::parameter::{at, broadcast_len};
use crate::specification::{Defect, Environment, Material, Pipe, Specification};

/// Crack orientation and the membrane stress that opens it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrackOrientation {
    /// Axial internal surface flaw opened by hoop stress.
    AxialHoop,
    /// Circumferential internal surface flaw opened by longitudinal stress.
    CircumferentialLongitudinal,
}

/// Stress-intensity factor with its geometry and shape factors, per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct StressIntensity {
    /// Stress-intensity factor K (MPa m^1/2).
    pub k: Vec<f64>,
    /// Geometry factor F.
    pub f: Vec<f64>,
    /// Flaw shape factor Q.
    pub q: Vec<f64>,
}

/// Stress state of a batch of cracked, pressurized pipe samples.
///
/// Construction checks that the uncracked wall does not already exceed the
/// allowable stress (yield strength times location factor) for any sample.
#[derive(Debug, Clone)]
pub struct StressState {
    pipe: Pipe,
    environment: Environment,
    material: Material,
    defect: Defect,
    orientation: CrackOrientation,
    sample_size: usize,
    initial_crack_depth: Vec<f64>,
    a_over_c: Vec<f64>,
}

impl StressState {
    /// Builds the stress state.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::SizeMismatch`] if the entities disagree on sample size
    /// - [`IntegrityError::InvalidGeometry`] for a deep crack on a zero-length flaw
    /// - [`IntegrityError::InvalidOperatingCondition`] if the uncracked stress
    ///   exceeds the allowable stress
    pub fn new(
        pipe: Pipe,
        environment: Environment,
        material: Material,
        defect: Defect,
        orientation: CrackOrientation,
    ) -> Result<Self> {
        let sample_size = pipe.sample_size();
        for (name, n) in [
            ("environment", environment.sample_size()),
            ("material", material.sample_size()),
            ("defect", defect.sample_size()),
        ] {
            if n != sample_size {
                return Err(IntegrityError::SizeMismatch {
                    name: name.to_string(),
                    expected: sample_size,
                    actual: n,
                });
            }
        }

        let initial_crack_depth = defect.calc_initial_crack_depth(&pipe)?;
        let a_over_c = defect.calc_a_over_c(&initial_crack_depth)?;

        let state = Self {
            pipe,
            environment,
            material,
            defect,
            orientation,
            sample_size,
            initial_crack_depth,
            a_over_c,
        };
        state.check_initial_stress_criteria()?;
        debug!(sample_size, ?orientation, "stress state created");
        Ok(state)
    }

    /// Number of samples.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Pipe geometry.
    pub fn pipe(&self) -> &Pipe {
        &self.pipe
    }

    /// Operating environment.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Material properties.
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Defect geometry.
    pub fn defect(&self) -> &Defect {
        &self.defect
    }

    /// Crack orientation.
    pub fn orientation(&self) -> CrackOrientation {
        self.orientation
    }

    /// Initial crack depth `a` (m).
    pub fn initial_crack_depth(&self) -> &[f64] {
        &self.initial_crack_depth
    }

    /// Initial crack aspect ratio `a / c`.
    pub fn a_over_c(&self) -> &[f64] {
        &self.a_over_c
    }

    /// Uncracked ligament `t - a`.
    ///
    /// Fails with [`IntegrityError::InvalidGeometry`] if a crack reaches
    /// through the wall.
    pub fn calc_remaining_wall_thickness(&self, crack_depth: &[f64]) -> Result<Vec<f64>> {
        let n = self.broadcast(crack_depth)?;
        let t = self.pipe.wall_thickness();
        (0..n)
            .map(|i| {
                let remaining = t[i] - at(crack_depth, i);
                if remaining > 0.0 {
                    Ok(remaining)
                } else {
                    Err(IntegrityError::InvalidGeometry(format!(
                        "crack depth {} reaches through wall thickness {} (sample {i})",
                        at(crack_depth, i),
                        t[i]
                    )))
                }
            })
            .collect()
    }

    /// Hoop stress `P R_avg / (t - a)` for the given remaining ligament.
    pub fn calc_hoop_stress(&self, remaining_thickness: &[f64]) -> Result<Vec<f64>> {
        self.broadcast(remaining_thickness)?;
        let pressure = self.environment.max_pressure();
        let radius = self.pipe.calc_average_radius();
        Ok((0..self.sample_size)
            .map(|i| pressure[i] * radius[i] / at(remaining_thickness, i))
            .collect())
    }

    /// Longitudinal stress, half the hoop stress.
    pub fn calc_longitudinal_stress(&self, remaining_thickness: &[f64]) -> Result<Vec<f64>> {
        Ok(self
            .calc_hoop_stress(remaining_thickness)?
            .into_iter()
            .map(|s| s / 2.0)
            .collect())
    }

    /// Reference stress solution for the crack orientation at `crack_depth`.
    pub fn calc_stress_solution(&self, crack_depth: &[f64]) -> Result<Vec<f64>> {
        let remaining = self.calc_remaining_wall_thickness(crack_depth)?;
        match self.orientation {
            CrackOrientation::AxialHoop => self.calc_hoop_stress(&remaining),
            CrackOrientation::CircumferentialLongitudinal => {
                self.calc_longitudinal_stress(&remaining)
            }
        }
    }

    /// Allowable stress, yield strength times location factor.
    pub fn calc_allowable_stress(&self) -> Vec<f64> {
        self.material
            .yield_strength()
            .iter()
            .zip(self.defect.location_factor().iter())
            .map(|(&sy, &lf)| sy * lf)
            .collect()
    }

    /// Checks the uncracked stress against the allowable stress.
    pub fn check_initial_stress_criteria(&self) -> Result<()> {
        let allowable = self.calc_allowable_stress();
        let stress = self.calc_stress_solution(&[0.0])?;
        let exceeding: Vec<usize> = (0..self.sample_size)
            .filter(|&i| stress[i] > allowable[i])
            .collect();
        if let Some(&first) = exceeding.first() {
            return Err(IntegrityError::InvalidOperatingCondition(format!(
                "stress solution {} exceeds allowable stress {} in {} sample(s), first at {first}",
                stress[first],
                allowable[first],
                exceeding.len()
            )));
        }
        Ok(())
    }

    /// Flaw shape factor `Q = 1 + 1.464 (a/c)^1.65`.
    pub fn calc_q(&self) -> Vec<f64> {
        self.a_over_c
            .iter()
            .map(|&ratio| 1.0 + 1.464 * ratio.powf(1.65))
            .collect()
    }

    /// Stress-intensity factor at `crack_depth` for the crack orientation.
    ///
    /// `crack_depth` and `eta` hold one value per sample or a single value.
    pub fn calc_stress_intensity_factor(
        &self,
        crack_depth: &[f64],
        eta: &[f64],
    ) -> Result<StressIntensity> {
        self.check_len("crack_depth", crack_depth)?;
        self.check_len("eta", eta)?;
        match self.orientation {
            CrackOrientation::AxialHoop => {
                let finite = self.k_finite_axial(crack_depth, eta);
                let long = self.k_long_axial(crack_depth);
                let k = finite.k.iter().zip(&long).map(|(&a, &b)| a.min(b)).collect();
                Ok(StressIntensity { k, ..finite })
            }
            CrackOrientation::CircumferentialLongitudinal => {
                self.k_circumferential(crack_depth, eta)
            }
        }
    }

    /// Single-sample copy of the stress state at `sample_index`.
    pub fn get_single_stress_state(&self, sample_index: usize) -> Result<Self> {
        Self::new(
            self.pipe.single(sample_index)?,
            self.environment.single(sample_index)?,
            self.material.single(sample_index)?,
            self.defect.single(sample_index)?,
            self.orientation,
        )
    }

    fn broadcast(&self, values: &[f64]) -> Result<usize> {
        self.check_len("values", values)?;
        Ok(self.sample_size)
    }

    /// Per-sample inputs hold one value or one value per sample.
    fn check_len(&self, name: &str, values: &[f64]) -> Result<()> {
        let n = broadcast_len(&[(name, values.len()), ("sample_size", self.sample_size)])?;
        if n != self.sample_size {
            return Err(IntegrityError::SizeMismatch {
                name: name.to_string(),
                expected: self.sample_size,
                actual: values.len(),
            });
        }
        Ok(())
    }

    fn k_finite_axial(&self, crack_depth: &[f64], eta: &[f64]) -> StressIntensity {
        let pressure = self.environment.max_pressure();
        let radius = self.pipe.calc_average_radius();
        let t = self.pipe.wall_thickness();
        let q = self.calc_q();
        let mut k = Vec::with_capacity(self.sample_size);
        let mut f = Vec::with_capacity(self.sample_size);
        for i in 0..self.sample_size {
            let r_t = radius[i] / t[i];
            let e = at(eta, i);
            let term1 = 1.12 + 0.053 * e + 0.0055 * e * e;
            let term2 = 1.0 + 0.02 * e + 0.0191 * e * e;
            let term3 = (20.0 - r_t).powi(2) / 1400.0;
            let f_i = term1 + term2 * term3;
            let a = at(crack_depth, i);
            k.push(pressure[i] * r_t * (std::f64::consts::PI * a / q[i]).sqrt() * f_i);
            f.push(f_i);
        }
        StressIntensity { k, f, q }
    }

    fn k_long_axial(&self, crack_depth: &[f64]) -> Vec<f64> {
        let pressure = self.environment.max_pressure();
        let inner = self.pipe.calc_inner_radius();
        let outer = self.pipe.calc_outer_radius();
        let t = self.pipe.wall_thickness();
        (0..self.sample_size)
            .map(|i| {
                let ri_t = inner[i] / t[i];
                // fitted for Ri/t >= 5; thicker walls clamp at zero
                let coefficient = if (5.0..=10.0).contains(&ri_t) {
                    (0.125 * ri_t - 0.25).max(0.0).powf(0.25)
                } else {
                    (0.2 * ri_t - 1.0).max(0.0).powf(0.25)
                };
                let a = at(crack_depth, i);
                let a_t = a / t[i];
                let f = 1.1 + coefficient * (4.951 * a_t.powi(2) + 1.092 * a_t.powi(4));
                let ro2 = outer[i] * outer[i];
                let ri2 = inner[i] * inner[i];
                let first_term = 2.0 * pressure[i] * ro2 / (ro2 - ri2);
                first_term * (std::f64::consts::PI * a).sqrt() * f
            })
            .collect()
    }

    fn k_circumferential(&self, crack_depth: &[f64], eta: &[f64]) -> Result<StressIntensity> {
        let radius = self.pipe.calc_average_radius();
        let t = self.pipe.wall_thickness();
        let q = self.calc_q();
        let stress = self.calc_stress_solution(crack_depth)?;
        let mut k = Vec::with_capacity(self.sample_size);
        let mut f = Vec::with_capacity(self.sample_size);
        for i in 0..self.sample_size {
            let r_t = radius[i] / t[i];
            let e = at(eta, i);
            let term1 = e * (0.0103 + 0.00617 * e);
            let term2 = 1.0 + 0.7 * e;
            let term3 = (r_t - 5.0).max(0.0).powf(0.7);
            let f_i = 1.0 + (0.02 + term1 + 0.0035 * term2 * term3) * q[i] * q[i];
            let a = at(crack_depth, i);
            k.push(stress[i] * (std::f64::consts::PI * a / q[i]).sqrt() * f_i);
            f.push(f_i);
        }
        Ok(StressIntensity { k, f, q })
    }
}
