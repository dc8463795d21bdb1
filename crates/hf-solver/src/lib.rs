//! Equilibrium solver for closed chemical systems.
//!
//! Given a [`ChemicalSystem`](hf_system::ChemicalSystem) and, per component,
//! either a total concentration or a fixed activity, the solver finds free
//! activities, complex concentrations and which solids are present. Activity
//! coefficients come from an [`ActivityModel`](hf_activity::ActivityModel) and
//! are iterated to self-consistency.
//!
//! The algorithm is the classical HaltaFall scheme:
//! - one-dimensional root finding per component (bracketing, bisection, chord),
//!   nested over the components in order of coupling
//! - solid-phase selection by saturation tests, with the activities of some
//!   components fixed by the solubility products of the present solids
//! - damped activity-coefficient feedback
//!
//! Recoverable anomalies are reported as [`SolveFlags`] on the result; fatal
//! conditions are [`SolveError`]s.

pub mod config;
pub mod constraints;
pub mod error;
pub mod flags;
pub mod linalg;
pub mod mass_balance;
pub mod plan;
pub mod report;
pub mod solids;
pub mod solver;
pub mod state;

pub use config::{DampingSchedule, SolidAdmission, SolverConfig};
pub use constraints::{Constraint, SolveRequest};
pub use error::{SolveError, SolveResult};
pub use flags::{SolveFlag, SolveFlags};
pub use plan::Plan;
pub use report::{ComponentResult, Composition, SolidResult, SpeciesResult};
pub use solver::EquilibriumSolver;
pub use state::SolutionState;
