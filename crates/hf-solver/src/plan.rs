//! Component classification and iteration order.

use crate::constraints::Constraint;
use hf_system::ChemicalSystem;
use tracing::debug;

/// Derived planning data for one pattern of constraints.
///
/// Rebuilt only when the set of total-given or structurally uncalculable
/// components changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Some complex or solid has a positive coefficient for the component
    pub pos: Vec<bool>,
    /// Some complex or solid has a negative coefficient for the component
    pub neg: Vec<bool>,
    /// Every complex coefficient of the component is 0 or 1
    pub mono: Vec<bool>,
    pub total_given: Vec<bool>,
    /// Total given, no negative coefficients and total ≤ 0: the activity is zero
    pub no_calc: Vec<bool>,
    /// Non-component species forced to zero by a `no_calc` component
    pub blocked: Vec<bool>,
    /// `independent[i][j]`: no complex or solid contains both i and j
    pub independent: Vec<Vec<bool>>,
    /// Components solved for, most coupled first
    pub order: Vec<usize>,
    /// Position to continue at after `order[p]` is satisfied (`p + 1`)
    pub next_if_satisfied: Vec<usize>,
    /// Position to re-converge from after `order[p]` takes a step: the first
    /// earlier coupled component, or `p` itself
    pub next_if_violated: Vec<usize>,
}

impl Plan {
    pub fn build(system: &ChemicalSystem, constraints: &[Constraint]) -> Self {
        let na = system.component_count();
        let nx = system.complex_count();
        let nr = system.reaction_count();

        let mut pos = vec![false; na];
        let mut neg = vec![false; na];
        let mut mono = vec![true; na];
        for j in 0..na {
            for i in 0..nr {
                let a = system.coefficient(i, j);
                if a > 0.0 {
                    pos[j] = true;
                } else if a < 0.0 {
                    neg[j] = true;
                }
                if i < nx && a != 0.0 && a != 1.0 {
                    mono[j] = false;
                }
            }
        }

        let total_given: Vec<bool> = constraints.iter().map(Constraint::is_total).collect();
        let no_calc: Vec<bool> = (0..na)
            .map(|j| match constraints[j] {
                Constraint::Total(t) => !neg[j] && t <= 0.0,
                Constraint::LogActivity(_) => false,
            })
            .collect();
        let blocked: Vec<bool> = (0..nr)
            .map(|i| (0..na).any(|j| no_calc[j] && system.coefficient(i, j) > 0.0))
            .collect();

        let mut independent = vec![vec![true; na]; na];
        for i in 0..nr {
            for j in 0..na {
                if system.coefficient(i, j) == 0.0 {
                    continue;
                }
                for k in 0..na {
                    if k != j && system.coefficient(i, k) != 0.0 {
                        independent[j][k] = false;
                    }
                }
            }
        }

        let free: Vec<usize> = (0..na).filter(|&j| total_given[j] && !no_calc[j]).collect();
        let degree = |j: usize| {
            free.iter()
                .filter(|&&k| k != j && !independent[j][k])
                .count()
        };
        let mut order = free.clone();
        order.sort_by(|&a, &b| {
            degree(b)
                .cmp(&degree(a))
                .then(mono[a].cmp(&mono[b]))
                .then(a.cmp(&b))
        });

        let n = order.len();
        let next_if_satisfied: Vec<usize> = (0..n).map(|p| p + 1).collect();
        let next_if_violated: Vec<usize> = (0..n)
            .map(|p| {
                (0..p)
                    .find(|&q| !independent[order[p]][order[q]])
                    .unwrap_or(p)
            })
            .collect();

        debug!(?order, ?next_if_violated, "component plan built");
        Self {
            pos,
            neg,
            mono,
            total_given,
            no_calc,
            blocked,
            independent,
            order,
            next_if_satisfied,
            next_if_violated,
        }
    }

    /// Whether the plan was built for the same constraint pattern.
    pub fn matches(&self, constraints: &[Constraint]) -> bool {
        if constraints.len() != self.total_given.len() {
            return false;
        }
        constraints.iter().enumerate().all(|(j, c)| {
            let no_calc = match *c {
                Constraint::Total(t) => !self.neg[j] && t <= 0.0,
                Constraint::LogActivity(_) => false,
            };
            c.is_total() == self.total_given[j] && no_calc == self.no_calc[j]
        })
    }

    /// Component whose activity is an unknown of the mass balances.
    pub fn is_free(&self, j: usize) -> bool {
        self.total_given[j] && !self.no_calc[j]
    }
}
