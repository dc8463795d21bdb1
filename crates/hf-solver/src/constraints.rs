//! Per-solve constraints.

use crate::error::{SolveError, SolveResult};
use hf_activity::IonicStrength;
use serde::{Deserialize, Serialize};

/// What is known about one component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// Total concentration [mol/kg]
    Total(f64),
    /// log10 of the activity
    LogActivity(f64),
}

impl Constraint {
    pub fn is_total(&self) -> bool {
        matches!(self, Constraint::Total(_))
    }

    pub fn value(&self) -> f64 {
        match *self {
            Constraint::Total(v) | Constraint::LogActivity(v) => v,
        }
    }
}

/// Input of one equilibrium calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    /// One per component, in component order
    pub constraints: Vec<Constraint>,
    /// Relative tolerance of the mass balances
    pub tolerance: f64,
    pub ionic_strength: IonicStrength,
    /// Start from the previous converged point when it is safe to
    pub continuation: bool,
}

impl SolveRequest {
    pub const DEFAULT_TOLERANCE: f64 = 1.0e-6;

    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self {
            constraints,
            tolerance: Self::DEFAULT_TOLERANCE,
            ionic_strength: IonicStrength::Ideal,
            continuation: false,
        }
    }

    /// Every component given as a total concentration.
    pub fn from_totals(totals: &[f64]) -> Self {
        Self::new(totals.iter().map(|&t| Constraint::Total(t)).collect())
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_ionic_strength(mut self, ionic_strength: IonicStrength) -> Self {
        self.ionic_strength = ionic_strength;
        self
    }

    pub fn with_continuation(mut self, continuation: bool) -> Self {
        self.continuation = continuation;
        self
    }

    pub(crate) fn validate(&self, components: usize) -> SolveResult<()> {
        hf_core::ensure_len(self.constraints.len(), components, "constraints")?;
        for c in &self.constraints {
            hf_core::ensure_finite(c.value(), "constraint value")?;
        }
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return Err(SolveError::Configuration {
                what: format!("tolerance {} outside (0, 1)", self.tolerance),
            });
        }
        if let IonicStrength::Fixed(v) = self.ionic_strength {
            if !(v.is_finite() && v > 0.0) {
                return Err(SolveError::Configuration {
                    what: format!("fixed ionic strength {v} is not positive"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        let req = SolveRequest::new(vec![Constraint::Total(1e-3), Constraint::LogActivity(-7.0)]);
        assert!(req.validate(2).is_ok());
        assert!(req.validate(3).is_err());

        let bad = SolveRequest::new(vec![Constraint::Total(f64::NAN)]);
        assert!(bad.validate(1).is_err());

        let bad = SolveRequest::new(vec![Constraint::Total(1.0)]).with_tolerance(0.0);
        assert!(matches!(bad.validate(1), Err(SolveError::Configuration { .. })));
    }
}
