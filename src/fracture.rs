//! Fracture failure assessment.
//!
//! Converts stress-intensity and reference-stress arrays into a point on the
//! failure assessment diagram (FAD) per sample:
//!
//! ```text
//! L_r = sigma_ref / sigma_y        (load ratio)
//! K_r = K_I / K_mat                (toughness ratio)
//! ```
//!
//! A secondary (e.g. residual) stress-intensity factor `K_s` is folded into
//! the load ratio as an equivalent membrane stress over the crack:
//!
//! ```text
//! sigma_s = K_s (1 + a / l) / sqrt(pi a)
//! L_r     = (sigma_ref + sigma_s) / sigma_y
//! ```
//!
//! where `a` is the crack depth and `l` the crack length. The combined
//! stress intensity used for `K_r` stays the primary factor.
//!
//! This secondary-stress rule is a reconstructed interaction rule of this
//! crate. It is not taken from API 579 or BS 7910; neither standard
//! converts `K_s` into a membrane stress this way, and both treat secondary
//! stress through a plasticity interaction factor on `K_r` instead. Without
//! a secondary factor the result is the standard primary-only FAD point.
//!
//! The acceptance boundary is the API 579 Level 2 FAD:
//!
//! ```text
//! K_r(L_r) = (1 - 0.14 L_r^2) (0.3 + 0.7 exp(-0.65 L_r^6)),  0 <= L_r <= L_r,max
//! ```
//!
//! # References
//!
//! - API 579-1/ASME FFS-1 (2021), Part 9, Level 2 assessment.
//! - BS 7910 (2019), *Guide to methods for assessing the acceptability of
//!   flaws in metallic structures*, Section 7.

use crate::error::{IntegrityError, Result};
use crate::parameter::{at, broadcast_len};
use crate::specification::Material;

/// Failure assessment over a borrowed set of material properties.
///
/// # Examples
///
/// ```
/// use u_integrity::FailureAssessment;
///
/// let assessment = FailureAssessment::new(&[1.0], &[1.0]).unwrap();
/// let result = assessment
///     .assess_failure_state(&[0.5], &[0.5], &[1.0], &[1.0], None)
///     .unwrap();
/// let (load_ratio, toughness_ratio) = result.into_pair();
/// assert_eq!(load_ratio, vec![0.5]);
/// assert_eq!(toughness_ratio, vec![0.5]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FailureAssessment<'a> {
    fracture_resistance: &'a [f64],
    yield_stress: &'a [f64],
    len: usize,
}

impl<'a> FailureAssessment<'a> {
    /// Creates an assessment from fracture resistance and yield stress.
    ///
    /// The arrays must have equal length or one of them length 1.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::SizeMismatch`] for incompatible or empty arrays
    /// - [`IntegrityError::InvalidMaterialProperty`] for any non-positive or
    ///   non-finite value
    pub fn new(fracture_resistance: &'a [f64], yield_stress: &'a [f64]) -> Result<Self> {
        for (name, values) in [
            ("fracture_resistance", fracture_resistance),
            ("yield_stress", yield_stress),
        ] {
            if values.is_empty() {
                return Err(IntegrityError::SizeMismatch {
                    name: name.to_string(),
                    expected: 1,
                    actual: 0,
                });
            }
            if let Some(&value) = values.iter().find(|&&v| !(v.is_finite() && v > 0.0)) {
                return Err(IntegrityError::InvalidMaterialProperty {
                    name: name.to_string(),
                    value,
                });
            }
        }
        let len = broadcast_len(&[
            ("fracture_resistance", fracture_resistance.len()),
            ("yield_stress", yield_stress.len()),
        ])?;
        Ok(Self {
            fracture_resistance,
            yield_stress,
            len,
        })
    }

    /// Creates an assessment from a material specification.
    pub fn from_material(material: &'a Material) -> Result<Self> {
        Self::new(material.fracture_resistance(), material.yield_strength())
    }

    /// Fracture resistance K_mat.
    pub fn fracture_resistance(&self) -> &[f64] {
        self.fracture_resistance
    }

    /// Yield stress.
    pub fn yield_stress(&self) -> &[f64] {
        self.yield_stress
    }

    /// Computes the FAD point of every sample.
    ///
    /// All inputs hold one value per sample or a single value that is
    /// broadcast.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::SizeMismatch`] for incompatible lengths
    /// - [`IntegrityError::InvalidGeometry`] if a secondary factor is given
    ///   for a sample with non-positive crack depth or length
    pub fn assess_failure_state(
        &self,
        primary_stress_intensity: &[f64],
        reference_stress: &[f64],
        crack_depth: &[f64],
        crack_length: &[f64],
        secondary_stress_intensity: Option<&[f64]>,
    ) -> Result<FailureAssessmentResult> {
        let mut lengths = vec![
            ("material", self.len),
            ("primary_stress_intensity", primary_stress_intensity.len()),
            ("reference_stress", reference_stress.len()),
            ("crack_depth", crack_depth.len()),
            ("crack_length", crack_length.len()),
        ];
        if let Some(secondary) = secondary_stress_intensity {
            lengths.push(("secondary_stress_intensity", secondary.len()));
        }
        let n = broadcast_len(&lengths)?;

        let mut load_ratio = Vec::with_capacity(n);
        let mut toughness_ratio = Vec::with_capacity(n);
        for i in 0..n {
            let mut stress = at(reference_stress, i);
            if let Some(secondary) = secondary_stress_intensity {
                stress += secondary_equivalent_stress(
                    at(secondary, i),
                    at(crack_depth, i),
                    at(crack_length, i),
                    i,
                )?;
            }
            load_ratio.push(stress / at(self.yield_stress, i));
            toughness_ratio.push(at(primary_stress_intensity, i) / at(self.fracture_resistance, i));
        }

        Ok(FailureAssessmentResult {
            load_ratio,
            toughness_ratio,
        })
    }
}

/// Membrane stress equivalent to a secondary stress-intensity factor.
fn secondary_equivalent_stress(k_s: f64, a: f64, length: f64, index: usize) -> Result<f64> {
    if !(a > 0.0 && length > 0.0) {
        return Err(IntegrityError::InvalidGeometry(format!(
            "secondary stress needs positive crack depth and length, got {a} and {length} \
             (sample {index})"
        )));
    }
    Ok(k_s * (1.0 + a / length) / (std::f64::consts::PI * a).sqrt())
}

/// One failure assessment diagram coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssessmentPoint {
    /// L_r, reference stress over yield stress.
    pub load_ratio: f64,
    /// K_r, stress intensity over fracture resistance.
    pub toughness_ratio: f64,
}

/// Per-sample FAD coordinates.
///
/// The canonical pair order is `(load_ratio, toughness_ratio)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureAssessmentResult {
    /// L_r per sample.
    pub load_ratio: Vec<f64>,
    /// K_r per sample.
    pub toughness_ratio: Vec<f64>,
}

impl FailureAssessmentResult {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.load_ratio.len()
    }

    /// Whether the result holds no samples.
    pub fn is_empty(&self) -> bool {
        self.load_ratio.is_empty()
    }

    /// The point of sample `index`.
    pub fn point(&self, index: usize) -> Option<AssessmentPoint> {
        Some(AssessmentPoint {
            load_ratio: *self.load_ratio.get(index)?,
            toughness_ratio: *self.toughness_ratio.get(index)?,
        })
    }

    /// Iterates over the points in sample order.
    pub fn points(&self) -> impl Iterator<Item = AssessmentPoint> + '_ {
        self.load_ratio
            .iter()
            .zip(&self.toughness_ratio)
            .map(|(&load_ratio, &toughness_ratio)| AssessmentPoint {
                load_ratio,
                toughness_ratio,
            })
    }

    /// `(load_ratio, toughness_ratio)`.
    pub fn into_pair(self) -> (Vec<f64>, Vec<f64>) {
        (self.load_ratio, self.toughness_ratio)
    }
}

/// Failure assessment diagram acceptance boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureAssessmentDiagram {
    load_ratio_cutoff: f64,
}

impl Default for FailureAssessmentDiagram {
    fn default() -> Self {
        Self {
            load_ratio_cutoff: Self::DEFAULT_LOAD_RATIO_CUTOFF,
        }
    }
}

impl FailureAssessmentDiagram {
    /// Plastic-collapse cut-off used when none is given.
    pub const DEFAULT_LOAD_RATIO_CUTOFF: f64 = 2.2;

    /// Creates a diagram with the given L_r cut-off.
    ///
    /// Returns `None` if the cut-off is non-positive or non-finite.
    pub fn new(load_ratio_cutoff: f64) -> Option<Self> {
        if !load_ratio_cutoff.is_finite() || load_ratio_cutoff <= 0.0 {
            return None;
        }
        Some(Self { load_ratio_cutoff })
    }

    /// L_r cut-off.
    pub fn load_ratio_cutoff(&self) -> f64 {
        self.load_ratio_cutoff
    }

    /// Boundary K_r at `load_ratio`, or `None` outside `[0, cutoff]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_integrity::FailureAssessmentDiagram;
    ///
    /// let fad = FailureAssessmentDiagram::default();
    /// assert!((fad.envelope(0.0).unwrap() - 1.0).abs() < 1e-15);
    /// assert!(fad.envelope(3.0).is_none());
    /// ```
    pub fn envelope(&self, load_ratio: f64) -> Option<f64> {
        if !(0.0..=self.load_ratio_cutoff).contains(&load_ratio) {
            return None;
        }
        let lr2 = load_ratio * load_ratio;
        Some((1.0 - 0.14 * lr2) * (0.3 + 0.7 * (-0.65 * lr2 * lr2 * lr2).exp()))
    }

    /// Whether a point lies inside the acceptance region.
    pub fn is_acceptable(&self, point: AssessmentPoint) -> bool {
        match self.envelope(point.load_ratio) {
            Some(boundary) => point.toughness_ratio >= 0.0 && point.toughness_ratio <= boundary,
            None => false,
        }
    }

    /// Per-sample acceptance flags.
    pub fn classify(&self, result: &FailureAssessmentResult) -> Vec<bool> {
        result.points().map(|p| self.is_acceptable(p)).collect()
    }

    /// Fraction of samples outside the acceptance region, or `None` for an
    /// empty result.
    pub fn failure_fraction(&self, result: &FailureAssessmentResult) -> Option<f64> {
        if result.is_empty() {
            return None;
        }
        let failed = result.points().filter(|&p| !self.is_acceptable(p)).count();
        Some(failed as f64 / result.len() as f64)
    }
}
