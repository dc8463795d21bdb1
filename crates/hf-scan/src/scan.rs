//! Scan definitions and the sequential scan runner.

use crate::error::{ScanError, ScanResult};
use hf_activity::IonicStrength;
use hf_solver::{Composition, Constraint, EquilibriumSolver, SolveError, SolveRequest};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Spacing of the scan points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spacing {
    Linear,
    /// Uniform in ln; needs positive bounds
    Logarithmic,
}

/// The input that varies along a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanVariable {
    /// Total concentration of a component [mol/kg]
    Total { component: usize },
    /// log10 activity of a component
    LogActivity { component: usize },
    /// Fixed ionic strength [mol/kg]; 0 means ideal
    IonicStrength,
}

impl ScanVariable {
    fn component(&self) -> Option<usize> {
        match *self {
            Self::Total { component } | Self::LogActivity { component } => Some(component),
            Self::IonicStrength => None,
        }
    }

    /// Request for one scan point.
    pub fn apply(&self, base: &SolveRequest, value: f64) -> SolveRequest {
        let mut request = base.clone();
        match *self {
            Self::Total { component } => request.constraints[component] = Constraint::Total(value),
            Self::LogActivity { component } => {
                request.constraints[component] = Constraint::LogActivity(value)
            }
            Self::IonicStrength => request.ionic_strength = IonicStrength::from_raw(value),
        }
        request
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanDefinition {
    pub variable: ScanVariable,
    pub start: f64,
    pub end: f64,
    pub num_points: usize,
    pub spacing: Spacing,
}

impl ScanDefinition {
    pub fn new(
        variable: ScanVariable,
        start: f64,
        end: f64,
        num_points: usize,
        spacing: Spacing,
    ) -> ScanResult<Self> {
        let invalid = |what: String| Err(ScanError::InvalidConfiguration { what });
        if !(start.is_finite() && end.is_finite()) {
            return invalid(format!("non-finite bounds {start}..{end}"));
        }
        if num_points < 2 {
            return invalid("a scan needs at least 2 points".into());
        }
        if (start - end).abs() < 1e-12 {
            return invalid("start and end must differ".into());
        }
        if spacing == Spacing::Logarithmic && (start <= 0.0 || end <= 0.0) {
            return invalid(format!("logarithmic spacing needs positive bounds, got {start}..{end}"));
        }
        if variable == ScanVariable::IonicStrength && (start < 0.0 || end < 0.0) {
            return invalid("ionic strength cannot be negative".into());
        }
        Ok(Self {
            variable,
            start,
            end,
            num_points,
            spacing,
        })
    }

    /// All point values, first and last exactly equal to the bounds.
    pub fn generate_points(&self) -> Vec<f64> {
        let n = self.num_points.max(2);
        let mut points: Vec<f64> = match self.spacing {
            Spacing::Linear => {
                let delta = (self.end - self.start) / (n - 1) as f64;
                (0..n).map(|i| self.start + i as f64 * delta).collect()
            }
            Spacing::Logarithmic => {
                let (lo, hi) = (self.start.ln(), self.end.ln());
                let delta = (hi - lo) / (n - 1) as f64;
                (0..n).map(|i| (lo + i as f64 * delta).exp()).collect()
            }
        };
        points[0] = self.start;
        points[n - 1] = self.end;
        points
    }

    fn check_against(&self, components: usize) -> ScanResult<()> {
        if let Some(c) = self.variable.component() {
            if c >= components {
                return Err(ScanError::InvalidConfiguration {
                    what: format!("component {c} out of range for {components} components"),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Logarithmic => write!(f, "logarithmic"),
        }
    }
}

impl fmt::Display for ScanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scan {:?} from {} to {} ({} points, {})",
            self.variable, self.start, self.end, self.num_points, self.spacing
        )
    }
}

/// Points of a finished scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutput {
    pub values: Vec<f64>,
    /// `None` where the point failed
    pub points: Vec<Option<Composition>>,
    pub num_successful: usize,
    pub num_failed: usize,
}

impl ScanOutput {
    /// Values of the successful points.
    pub fn successful_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(&self.points)
            .filter_map(|(v, p)| p.as_ref().map(|_| *v))
            .collect()
    }

    /// One number per successful point.
    pub fn series(&self, f: impl Fn(&Composition) -> f64) -> Vec<f64> {
        self.points.iter().flatten().map(f).collect()
    }
}

/// Solve every point of `definition`, starting from `base`.
///
/// Points after the first warm-start from the previous converged point when
/// `base.continuation` is set. A point without a consistent solid set or with
/// an activity-model failure is recorded as `None`; a malformed request stops
/// the scan. `progress(step, total)` is called after each point.
pub fn run_scan(
    solver: &mut EquilibriumSolver<'_>,
    base: &SolveRequest,
    definition: &ScanDefinition,
    mut progress: impl FnMut(usize, usize),
) -> ScanResult<ScanOutput> {
    definition.check_against(solver.system().component_count())?;
    let values = definition.generate_points();
    let total = values.len();
    let mut points = Vec::with_capacity(total);
    let mut num_failed = 0;

    debug!(%definition, "scan started");
    for (index, &value) in values.iter().enumerate() {
        let request = definition
            .variable
            .apply(base, value)
            .with_continuation(base.continuation && index > 0);
        match solver.solve(&request) {
            Ok(composition) => points.push(Some(composition)),
            Err(SolveError::Cancelled) => return Err(ScanError::Cancelled { completed: index }),
            Err(err @ (SolveError::Inconsistent { .. } | SolveError::Activity(_))) => {
                warn!(index, value, error = %err, "scan point failed");
                points.push(None);
                num_failed += 1;
            }
            Err(source) => return Err(ScanError::Solve { index, source }),
        }
        progress(index + 1, total);
    }

    Ok(ScanOutput {
        num_successful: total - num_failed,
        num_failed,
        values,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_points() {
        let def = ScanDefinition::new(ScanVariable::LogActivity { component: 0 }, -2.0, -12.0, 6, Spacing::Linear)
            .unwrap();
        assert_eq!(def.generate_points(), vec![-2.0, -4.0, -6.0, -8.0, -10.0, -12.0]);
    }

    #[test]
    fn logarithmic_points() {
        let def =
            ScanDefinition::new(ScanVariable::Total { component: 1 }, 1e-4, 1e-1, 4, Spacing::Logarithmic).unwrap();
        let p = def.generate_points();
        assert_eq!(p[0], 1e-4);
        assert_eq!(p[3], 1e-1);
        assert!((p[1] - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn invalid_definitions() {
        let v = ScanVariable::Total { component: 0 };
        assert!(ScanDefinition::new(v, 1.0, 1.0, 5, Spacing::Linear).is_err());
        assert!(ScanDefinition::new(v, 0.0, 1.0, 1, Spacing::Linear).is_err());
        assert!(ScanDefinition::new(v, 0.0, 1.0, 5, Spacing::Logarithmic).is_err());
        assert!(ScanDefinition::new(ScanVariable::IonicStrength, -1.0, 1.0, 5, Spacing::Linear).is_err());
    }

    #[test]
    fn apply_sets_the_variable() {
        let base = SolveRequest::from_totals(&[1e-3, 1e-3]);
        let r = ScanVariable::LogActivity { component: 0 }.apply(&base, -7.0);
        assert_eq!(r.constraints[0], Constraint::LogActivity(-7.0));
        assert_eq!(r.constraints[1], Constraint::Total(1e-3));
        let r = ScanVariable::IonicStrength.apply(&base, 0.5);
        assert_eq!(r.ionic_strength, IonicStrength::Fixed(0.5));
    }

    #[test]
    fn definition_serde_roundtrip() {
        let def =
            ScanDefinition::new(ScanVariable::Total { component: 2 }, 1e-5, 1e-2, 10, Spacing::Logarithmic).unwrap();
        let json = serde_json::to_string(&def).unwrap();
        let back: ScanDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
    }
}
