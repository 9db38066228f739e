//! Bounded, vectorized physical parameters.
//!
//! A [`Parameter`] is the container underneath every physical quantity in
//! the crate. It is either a single physical constant or a per-sample
//! array; both cases are stored the same way, as a vector of declared
//! length, and a length of 1 is simply the scalar case.
//!
//! Every element is checked against an inclusive `[lower, upper]` range at
//! construction. There is no lazy validation: a `Parameter` that exists is
//! always in bounds.

use std::ops::Deref;

use crate::error::{IntegrityError, Result};

/// Raw input for a [`Parameter`]: a scalar to broadcast or an explicit
/// per-sample sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// A single value, repeated to the requested size.
    Scalar(f64),
    /// One value per sample; its length must match the requested size.
    Sequence(Vec<f64>),
}

impl ParameterValue {
    /// A length-1 slice becomes a scalar, anything else a sequence.
    pub(crate) fn per_sample(values: &[f64]) -> Self {
        match values {
            [value] => ParameterValue::Scalar(*value),
            _ => ParameterValue::Sequence(values.to_vec()),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Scalar(value)
    }
}

impl From<Vec<f64>> for ParameterValue {
    fn from(values: Vec<f64>) -> Self {
        ParameterValue::Sequence(values)
    }
}

impl From<&[f64]> for ParameterValue {
    fn from(values: &[f64]) -> Self {
        ParameterValue::Sequence(values.to_vec())
    }
}

impl From<&Vec<f64>> for ParameterValue {
    fn from(values: &Vec<f64>) -> Self {
        ParameterValue::Sequence(values.clone())
    }
}

impl<const N: usize> From<[f64; N]> for ParameterValue {
    fn from(values: [f64; N]) -> Self {
        ParameterValue::Sequence(values.to_vec())
    }
}

impl From<&Parameter> for ParameterValue {
    fn from(parameter: &Parameter) -> Self {
        ParameterValue::Sequence(parameter.values.clone())
    }
}

/// A named numeric array whose every element lies in `[lower, upper]`.
///
/// Immutable after construction. Dereferences to `[f64]`, so slicing,
/// indexing, iteration and `len()` behave like the underlying array.
///
/// # Examples
///
/// ```
/// use u_integrity::Parameter;
///
/// // Scalar broadcast to three samples
/// let p = Parameter::new("yield_strength", 400.0, 0.0, f64::INFINITY, 3).unwrap();
/// assert_eq!(p.len(), 3);
/// assert_eq!(p, vec![400.0, 400.0, 400.0]);
///
/// // Out-of-range values are rejected
/// assert!(Parameter::new("flaw_depth", 120.0, 0.0, 100.0, 1).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    values: Vec<f64>,
    lower_bound: f64,
    upper_bound: f64,
}

impl Parameter {
    /// Creates a bounded parameter of exactly `size` elements.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::InvalidSampleSize`] if `size == 0`
    /// - [`IntegrityError::InvalidBounds`] if a bound is NaN or `lower > upper`
    /// - [`IntegrityError::SizeMismatch`] if a sequence is not `size` long
    /// - [`IntegrityError::BoundsViolation`] if any element is out of range
    ///   (NaN is always out of range)
    pub fn new(
        name: impl Into<String>,
        values: impl Into<ParameterValue>,
        lower_bound: f64,
        upper_bound: f64,
        size: usize,
    ) -> Result<Self> {
        let name = name.into();
        if size == 0 {
            return Err(IntegrityError::InvalidSampleSize { name, size });
        }
        if lower_bound.is_nan() || upper_bound.is_nan() || lower_bound > upper_bound {
            return Err(IntegrityError::InvalidBounds {
                name,
                lower: lower_bound,
                upper: upper_bound,
            });
        }

        let values = match values.into() {
            ParameterValue::Scalar(v) => vec![v; size],
            ParameterValue::Sequence(values) => {
                if values.len() != size {
                    return Err(IntegrityError::SizeMismatch {
                        name,
                        expected: size,
                        actual: values.len(),
                    });
                }
                values
            }
        };

        check_bounds(&name, &values, lower_bound, upper_bound)?;

        Ok(Self {
            name,
            values,
            lower_bound,
            upper_bound,
        })
    }

    /// Creates a parameter bounded to `[0, +inf)`.
    pub fn non_negative(
        name: impl Into<String>,
        values: impl Into<ParameterValue>,
        size: usize,
    ) -> Result<Self> {
        Self::new(name, values, 0.0, f64::INFINITY, size)
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The validated values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Inclusive lower bound.
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    /// Inclusive upper bound.
    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Value at `index`, or [`IntegrityError::IndexOutOfRange`].
    pub fn value_at(&self, index: usize) -> Result<f64> {
        self.values
            .get(index)
            .copied()
            .ok_or(IntegrityError::IndexOutOfRange {
                index,
                len: self.values.len(),
            })
    }

    /// A one-element parameter holding the value at `index`, with the same
    /// name and bounds.
    pub fn single(&self, index: usize) -> Result<Self> {
        let value = self.value_at(index)?;
        Ok(Self {
            name: self.name.clone(),
            values: vec![value],
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
        })
    }
}

impl Deref for Parameter {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.values
    }
}

impl AsRef<[f64]> for Parameter {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

impl<'a> IntoIterator for &'a Parameter {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl PartialEq<[f64]> for Parameter {
    fn eq(&self, other: &[f64]) -> bool {
        self.values.as_slice() == other
    }
}

impl PartialEq<Vec<f64>> for Parameter {
    fn eq(&self, other: &Vec<f64>) -> bool {
        &self.values == other
    }
}

impl<const N: usize> PartialEq<[f64; N]> for Parameter {
    fn eq(&self, other: &[f64; N]) -> bool {
        self.values.as_slice() == other.as_slice()
    }
}

fn check_bounds(name: &str, values: &[f64], lower: f64, upper: f64) -> Result<()> {
    if values.iter().all(|&v| lower <= v && v <= upper) {
        return Ok(());
    }
    // f64::min/max skip NaN, so only an all-NaN array reports NaN here.
    let min = values.iter().copied().fold(f64::NAN, f64::min);
    let max = values.iter().copied().fold(f64::NAN, f64::max);
    Err(IntegrityError::BoundsViolation {
        name: name.to_string(),
        min,
        max,
        lower,
        upper,
    })
}

/// Resolves the common length of several arrays under length-1 broadcasting.
///
/// Every length must be either 1 or equal to the longest one.
pub(crate) fn broadcast_len(inputs: &[(&str, usize)]) -> Result<usize> {
    let len = inputs.iter().map(|&(_, n)| n).max().unwrap_or(1);
    for &(name, n) in inputs {
        if n != 1 && n != len {
            return Err(IntegrityError::SizeMismatch {
                name: name.to_string(),
                expected: len,
                actual: n,
            });
        }
    }
    Ok(len)
}

/// Element `i` of a broadcast array (length-1 arrays repeat their value).
#[inline]
pub(crate) fn at(values: &[f64], i: usize) -> f64 {
    if values.len() == 1 {
        values[0]
    } else {
        values[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOWER: f64 = 0.0;
    const UPPER: f64 = 3.0;
    const SIZE: usize = 3;

    #[test]
    fn test_per_sample_broadcasts_single_value() {
        let p = Parameter::new("p", ParameterValue::per_sample(&[2.0]), LOWER, UPPER, SIZE).unwrap();
        assert_eq!(p, vec![2.0, 2.0, 2.0]);
        let p = Parameter::new("p", ParameterValue::per_sample(&[1.0, 2.0, 3.0]), LOWER, UPPER, SIZE)
            .unwrap();
        assert_eq!(p, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_default_scalar() {
        let p = Parameter::new("test_parameter", 1.0, LOWER, UPPER, 1).unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p, [1.0]);
        assert_eq!(p.name(), "test_parameter");
    }

    #[test]
    fn test_scalar_broadcast() {
        let p = Parameter::new("test_parameter", 2.0, LOWER, UPPER, SIZE).unwrap();
        assert_eq!(p.len(), 3);
        assert!(p.iter().all(|&v| (v - 2.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_scalar_below_bounds() {
        let err = Parameter::new("test_parameter", -1.0, LOWER, UPPER, SIZE).unwrap_err();
        assert!(matches!(err, IntegrityError::BoundsViolation { .. }));
    }

    #[test]
    fn test_scalar_above_bounds() {
        let err = Parameter::new("test_parameter", 4.0, LOWER, UPPER, SIZE).unwrap_err();
        match err {
            IntegrityError::BoundsViolation { name, max, .. } => {
                assert_eq!(name, "test_parameter");
                assert!((max - 4.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Parameter::new("p", LOWER, LOWER, UPPER, 1).is_ok());
        assert!(Parameter::new("p", UPPER, LOWER, UPPER, 1).is_ok());
    }

    #[test]
    fn test_sequence_input() {
        let p = Parameter::new("p", vec![1.0, 2.0, 1.5], LOWER, UPPER, SIZE).unwrap();
        assert_eq!(p.len(), 3);
        assert!((p[2] - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sequence_below_bounds() {
        let err = Parameter::new("p", vec![1.0, 2.0, -0.5], LOWER, UPPER, SIZE).unwrap_err();
        match err {
            IntegrityError::BoundsViolation { min, .. } => assert!((min + 0.5).abs() < 1e-15),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_sequence_above_bounds() {
        let err = Parameter::new("p", vec![1.0, 2.0, 3.1], LOWER, UPPER, SIZE).unwrap_err();
        assert!(matches!(err, IntegrityError::BoundsViolation { .. }));
    }

    #[test]
    fn test_bad_size_specification() {
        let err = Parameter::new("p", vec![1.0, 2.0, 3.0], LOWER, UPPER, 4).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::SizeMismatch {
                name: "p".to_string(),
                expected: 4,
                actual: 3,
            }
        );
    }

    #[test]
    fn test_nan_is_out_of_bounds() {
        let err = Parameter::new("p", f64::NAN, LOWER, UPPER, 1).unwrap_err();
        assert!(matches!(err, IntegrityError::BoundsViolation { .. }));
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = Parameter::new("p", 1.0, LOWER, UPPER, 0).unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidSampleSize { size: 0, .. }));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = Parameter::new("p", 1.0, 5.0, 1.0, 1).unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidBounds { .. }));
    }

    #[test]
    fn test_unbounded_above() {
        let p = Parameter::non_negative("p", 1e12, 2).unwrap();
        assert!(p.upper_bound().is_infinite());
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_single_and_value_at() {
        let p = Parameter::new("p", [0.5, 1.5, 2.5], LOWER, UPPER, 3).unwrap();
        let s = p.single(1).unwrap();
        assert_eq!(s, [1.5]);
        assert_eq!(s.name(), "p");
        assert!((p.value_at(2).unwrap() - 2.5).abs() < f64::EPSILON);
        assert_eq!(
            p.value_at(3).unwrap_err(),
            IntegrityError::IndexOutOfRange { index: 3, len: 3 }
        );
    }

    #[test]
    fn test_iteration_and_slices() {
        let p = Parameter::new("p", vec![1.0, 2.0], LOWER, UPPER, 2).unwrap();
        let total: f64 = (&p).into_iter().sum();
        assert!((total - 3.0).abs() < f64::EPSILON);
        assert_eq!(&p[..1], &[1.0]);
        assert_eq!(p.as_ref(), &[1.0, 2.0]);
    }

    #[test]
    fn test_broadcast_len() {
        assert_eq!(broadcast_len(&[("a", 1), ("b", 4), ("c", 1)]).unwrap(), 4);
        assert_eq!(broadcast_len(&[("a", 1)]).unwrap(), 1);
        let err = broadcast_len(&[("a", 2), ("b", 3)]).unwrap_err();
        assert!(matches!(err, IntegrityError::SizeMismatch { .. }));
    }

    #[test]
    fn test_at_broadcasts_length_one() {
        assert!((at(&[7.0], 5) - 7.0).abs() < f64::EPSILON);
        assert!((at(&[1.0, 2.0], 1) - 2.0).abs() < f64::EPSILON);
    }
}
