//! Solver configuration.

use serde::{Deserialize, Serialize};

/// How supersaturated solids are admitted in one solid-phase step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SolidAdmission {
    /// Only the solid with the largest scaled supersaturation.
    #[default]
    MostSupersaturated,
    /// Every supersaturated solid at once.
    AllSupersaturated,
}

/// Relaxation of activity-coefficient updates in concentrated solutions.
///
/// After `warmup_iterations` undamped updates, each update is scaled by
/// `max(min_factor, 1 / (1 + strength·Σm))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DampingSchedule {
    pub warmup_iterations: usize,
    pub strength: f64,
    pub min_factor: f64,
}

impl Default for DampingSchedule {
    fn default() -> Self {
        Self {
            warmup_iterations: 5,
            strength: 0.5,
            min_factor: 0.1,
        }
    }
}

impl DampingSchedule {
    pub fn factor(&self, iteration: usize, sum_molalities: f64) -> f64 {
        if iteration < self.warmup_iterations {
            return 1.0;
        }
        (1.0 / (1.0 + self.strength * sum_molalities.max(0.0))).max(self.min_factor)
    }
}

/// Equilibrium solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Root-search steps per component before giving up on it
    pub max_root_iterations: usize,
    /// Root-search steps over all components in one mass-balance pass
    pub max_mass_balance_steps: usize,
    /// Solid admissions and removals per activity iteration
    pub max_solid_iterations: usize,
    pub max_activity_iterations: usize,
    /// First bracketing step in ln units for a fresh start
    pub initial_step: f64,
    /// First bracketing step when starting near a solution
    pub continuation_step: f64,
    /// Bracket width (ln units) below which bisection gives way to the chord
    pub bisection_width: f64,
    /// A solid is supersaturated when ln(Q·Kf) exceeds this
    pub saturation_tolerance: f64,
    /// Per-species tolerance on ln γ, scaled by (1 + C)
    pub activity_tolerance: f64,
    /// Aqueous concentrations above this raise a warning flag [mol/kg]
    pub plausible_concentration: f64,
    pub solid_admission: SolidAdmission,
    pub damping: DampingSchedule,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_root_iterations: 200,
            max_mass_balance_steps: 200_000,
            max_solid_iterations: 200,
            max_activity_iterations: 100,
            initial_step: 2.0,
            continuation_step: 0.5,
            bisection_width: 0.1,
            saturation_tolerance: 1.0e-5,
            activity_tolerance: 1.0e-4,
            plausible_concentration: 20.0,
            solid_admission: SolidAdmission::MostSupersaturated,
            damping: DampingSchedule::default(),
        }
    }
}
