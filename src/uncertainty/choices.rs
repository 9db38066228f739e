//! Closed vocabularies shared with sampling front ends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IntegrityError;

/// Probability distribution family of an input variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    /// Fixed value.
    Deterministic,
    /// Normal law.
    Normal,
    /// Lognormal law.
    #[serde(rename = "lognormal")]
    LogNormal,
    /// Uniform law.
    Uniform,
}

impl DistributionKind {
    /// Every kind, in display order.
    pub const ALL: [DistributionKind; 4] = [
        DistributionKind::Deterministic,
        DistributionKind::Normal,
        DistributionKind::LogNormal,
        DistributionKind::Uniform,
    ];

    /// Short machine key.
    pub fn key(&self) -> &'static str {
        match self {
            DistributionKind::Deterministic => "deterministic",
            DistributionKind::Normal => "normal",
            DistributionKind::LogNormal => "lognormal",
            DistributionKind::Uniform => "uniform",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            DistributionKind::Deterministic => "Deterministic",
            DistributionKind::Normal => "Normal",
            DistributionKind::LogNormal => "Lognormal",
            DistributionKind::Uniform => "Uniform",
        }
    }
}

/// Whether a variable's uncertainty is inherent variability (aleatory),
/// lack of knowledge (epistemic), or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UncertaintyKind {
    /// Sampled in the inner loop.
    Aleatory,
    /// Sampled in the outer loop.
    Epistemic,
    /// Held at its nominal value.
    None,
}

impl UncertaintyKind {
    /// Every kind, in display order.
    pub const ALL: [UncertaintyKind; 3] = [
        UncertaintyKind::Aleatory,
        UncertaintyKind::Epistemic,
        UncertaintyKind::None,
    ];

    /// Short machine key.
    pub fn key(&self) -> &'static str {
        match self {
            UncertaintyKind::Aleatory => "aleatory",
            UncertaintyKind::Epistemic => "epistemic",
            UncertaintyKind::None => "none",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            UncertaintyKind::Aleatory => "Aleatory",
            UncertaintyKind::Epistemic => "Epistemic",
            UncertaintyKind::None => "N/A",
        }
    }
}

/// Analysis type of an uncertainty study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudyKind {
    /// Every variable at its nominal value.
    #[serde(rename = "det")]
    Deterministic,
    /// Double-loop Latin hypercube sampling.
    #[serde(rename = "prb")]
    Probabilistic,
    /// One variable at a time at its low and high bounds.
    #[serde(rename = "bnd")]
    SensitivityBounds,
    /// One variable at a time over its sorted samples.
    #[serde(rename = "sam")]
    SensitivitySamples,
}

impl StudyKind {
    /// Every kind, in display order.
    pub const ALL: [StudyKind; 4] = [
        StudyKind::Deterministic,
        StudyKind::Probabilistic,
        StudyKind::SensitivityBounds,
        StudyKind::SensitivitySamples,
    ];

    /// Short machine key.
    pub fn key(&self) -> &'static str {
        match self {
            StudyKind::Deterministic => "det",
            StudyKind::Probabilistic => "prb",
            StudyKind::SensitivityBounds => "bnd",
            StudyKind::SensitivitySamples => "sam",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            StudyKind::Deterministic => "Deterministic",
            StudyKind::Probabilistic => "Probabilistic",
            StudyKind::SensitivityBounds => "Sensitivity (bounds)",
            StudyKind::SensitivitySamples => "Sensitivity (samples)",
        }
    }
}

macro_rules! impl_choice {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }

        impl FromStr for $ty {
            type Err = IntegrityError;

            /// Parses a key, case-insensitively.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|c| c.key().eq_ignore_ascii_case(s))
                    .ok_or_else(|| {
                        IntegrityError::InvalidStudy(format!("unknown {} '{s}'", $what))
                    })
            }
        }
    };
}

impl_choice!(DistributionKind, "distribution kind");
impl_choice!(UncertaintyKind, "uncertainty kind");
impl_choice!(StudyKind, "study kind");
