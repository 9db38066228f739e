//! # u-integrity
//!
//! Probabilistic structural-integrity analysis of cracked, pressurized pipe
//! segments.
//!
//! The crate takes batches of input samples (pipe geometry, material
//! properties, flaw geometry, operating environment), derives the
//! pressure-driven stress state and stress-intensity factor of each sample,
//! and places every sample on a failure assessment diagram. Cracks can be
//! grown under pressure cycling to estimate remaining life and the effect of
//! periodic inspection. Batches are evaluated in parallel with results
//! returned in input order.
//!
//! ## Modules
//!
//! - [`parameter`]: Bounded scalar-or-array physical quantities
//! - [`specification`]: Pipe, material, defect and environment entities
//! - [`stress`]: Hoop/longitudinal stress and stress-intensity solutions
//! - [`fracture`]: Load and toughness ratios, FAD envelope
//! - [`crack_growth`]: Hydrogen-assisted and Paris-law fatigue growth rates
//! - [`evolution`]: Cycle-by-cycle crack growth and critical crack depth
//! - [`life`]: Cycles to critical and quarter-critical depth
//! - [`inspection`]: Periodic inspection with probability of detection
//! - [`evaluation`]: Parallel per-sample evaluation driver
//! - [`uncertainty`]: Aleatory/epistemic input sampling and sensitivity studies
//! - [`summary`]: Descriptive statistics of result columns
//!
//! ## Example
//!
//! ```
//! use u_integrity::{
//!     CrackOrientation, Defect, Environment, FailureAssessment, Material, Pipe, StressState,
//! };
//!
//! let pipe = Pipe::new(0.9144, 0.0191, 1).unwrap();
//! let environment = Environment::new(13.0, 1.3, 1).unwrap();
//! let material = Material::new(358.0, 55.0, 1).unwrap();
//! let defect = Defect::new(25.0, 0.04, 1.0, 1).unwrap();
//!
//! let state =
//!     StressState::new(pipe, environment, material, defect, CrackOrientation::AxialHoop).unwrap();
//! let a = state.initial_crack_depth().to_vec();
//! let sigma_ref = state.calc_stress_solution(&a).unwrap();
//! let sif = state.calc_stress_intensity_factor(&a, &[0.25]).unwrap();
//!
//! let assessment = FailureAssessment::from_material(state.material()).unwrap();
//! let result = assessment
//!     .assess_failure_state(&sif.k, &sigma_ref, &a, &[0.04], None)
//!     .unwrap();
//! assert_eq!(result.len(), 1);
//! assert!(result.toughness_ratio[0] > 0.0);
//! ```
//!
//! ## Units
//!
//! Lengths in metres, pressures and stresses in MPa, stress intensity in
//! MPa m^1/2, temperature in kelvin.

pub mod crack_growth;
pub mod error;
pub mod evaluation;
pub mod evolution;
pub mod fracture;
pub mod inspection;
pub mod life;
pub mod parameter;
pub mod specification;
pub mod stress;
pub mod summary;
pub mod uncertainty;

pub use crack_growth::{design_curve, CrackGrowth, DesignCurve, GrowthModel};
pub use error::{IntegrityError, Result};
pub use evaluation::{evaluate, ParallelEvaluator, SampleInputs};
pub use evolution::{
    calc_critical_crack_depth, CycleEvolution, CycleHistory, CycleStep, CycleStepping,
    EvolutionConfig, FailureCriterion,
};
pub use fracture::{
    AssessmentPoint, FailureAssessment, FailureAssessmentDiagram, FailureAssessmentResult,
};
pub use inspection::{InspectionMitigation, MitigationResult};
pub use life::LifeCriteria;
pub use parameter::{Parameter, ParameterValue};
pub use specification::{Defect, Environment, Material, Pipe, Specification};
pub use stress::{CrackOrientation, StressIntensity, StressState};
pub use summary::BatchSummary;
pub use uncertainty::{
    Distribution, DistributionKind, SampleSheet, StudyConfig, StudyKind, UncertainVariable,
    UncertaintyKind, UncertaintyStudy,
};
