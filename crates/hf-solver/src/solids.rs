//! Solid phases: elimination of the components fixed by present solids,
//! saturation tests and the choice of the next solid set.

use crate::config::{SolidAdmission, SolverConfig};
use crate::linalg::{advance_combination, invert_full_pivot};
use crate::mass_balance::Workspace;
use crate::plan::Plan;
use hf_system::ChemicalSystem;
use nalgebra::DMatrix;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Linear elimination for one set of present solids.
///
/// Each present solid fixes the activity of one free component (`ber`). With
/// `M[s][b]` the coefficient of `ber[b]` in solid `s`, `ruta = M⁻¹` gives the
/// fixed activities and the solid amounts, and `pva` folds the mass balances
/// of the fixed components into those of the remaining free ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Elimination {
    /// Present solids (solid index)
    pub solids: Vec<usize>,
    /// Component fixed by each present solid
    pub ber: Vec<usize>,
    /// `M`
    pub rut1: DMatrix<f64>,
    /// `M⁻¹`, indexed `[b][s]`
    pub ruta: DMatrix<f64>,
    /// `pva[k][b] = Σ_s a_sk · ruta[b][s]`, one row per component
    pub pva: DMatrix<f64>,
}

impl Elimination {
    /// No solids present.
    pub fn none(components: usize) -> Self {
        Self {
            solids: Vec::new(),
            ber: Vec::new(),
            rut1: DMatrix::zeros(0, 0),
            ruta: DMatrix::zeros(0, 0),
            pva: DMatrix::zeros(components, 0),
        }
    }

    /// Elimination for the solids marked in `present`, or `None` when every
    /// choice of fixed components gives a singular sub-matrix.
    pub fn build(system: &ChemicalSystem, plan: &Plan, present: &[bool]) -> Option<Self> {
        let na = system.component_count();
        let solids: Vec<usize> = (0..present.len()).filter(|&s| present[s]).collect();
        if solids.is_empty() {
            return Some(Self::none(na));
        }
        let rows: Vec<usize> = solids.iter().map(|&s| system.reaction_of_solid(s)).collect();
        let candidates: Vec<usize> = (0..na)
            .filter(|&j| plan.is_free(j) && rows.iter().any(|&r| system.coefficient(r, j) != 0.0))
            .collect();
        let n = solids.len();
        if candidates.len() < n {
            return None;
        }

        let mut pick: Vec<usize> = (0..n).collect();
        loop {
            let ber: Vec<usize> = pick.iter().map(|&c| candidates[c]).collect();
            let rut1 = DMatrix::from_fn(n, n, |s, b| system.coefficient(rows[s], ber[b]));
            if let Some(ruta) = invert_full_pivot(&rut1) {
                let pva = DMatrix::from_fn(na, n, |k, b| {
                    (0..n)
                        .map(|s| system.coefficient(rows[s], k) * ruta[(b, s)])
                        .sum()
                });
                trace!(?solids, ?ber, "solid elimination built");
                return Some(Self {
                    solids,
                    ber,
                    rut1,
                    ruta,
                    pva,
                });
            }
            if !advance_combination(&mut pick, candidates.len()) {
                return None;
            }
        }
    }

    pub fn fixes(&self, component: usize) -> bool {
        self.ber.contains(&component)
    }

    /// Set the ln activities of the fixed components from the solubility
    /// products: `Σ_b M[s][b]·ln a_b = −ln Kf_s − Σ_{j∉ber} a_sj·ln a_j`.
    pub fn apply_fixed_activities(&self, system: &ChemicalSystem, ln_a: &mut [f64]) {
        let na = system.component_count();
        let n = self.solids.len();
        for bi in 0..n {
            let mut v = 0.0;
            for si in 0..n {
                let r = system.reaction_of_solid(self.solids[si]);
                let mut rhs = -system.ln_k(r);
                for (j, &la) in ln_a.iter().enumerate().take(na) {
                    let a = system.coefficient(r, j);
                    if a != 0.0 && !self.fixes(j) {
                        rhs -= a * la;
                    }
                }
                v += self.ruta[(bi, si)] * rhs;
            }
            ln_a[self.ber[bi]] = v;
        }
    }

    /// Amount of each solid from the fixed components' mass balances; zero for
    /// absent solids.
    pub fn solid_amounts(&self, tot: &[f64], y: &[f64], out: &mut [f64]) {
        out.fill(0.0);
        for (si, &s) in self.solids.iter().enumerate() {
            out[s] = self
                .ber
                .iter()
                .enumerate()
                .map(|(bi, &b)| self.ruta[(bi, si)] * (tot[b] - y[b]))
                .sum();
        }
    }

    /// Scale against which the amount of present solid `si` is judged.
    fn amount_scale(&self, si: usize, ws: &Workspace) -> f64 {
        self.ber
            .iter()
            .enumerate()
            .map(|(bi, &b)| self.ruta[(bi, si)].abs() * ws.tot[b].abs().max(ws.y_abs[b]))
            .sum()
    }
}

pub(crate) fn solid_name(system: &ChemicalSystem, s: usize) -> &str {
    system.name(system.species_of_reaction(system.reaction_of_solid(s)))
}

/// ln of the saturation ratio of solid `s`: `ln Kf + Σ a·ln a`.
pub fn saturation_index(system: &ChemicalSystem, s: usize, ln_a: &[f64]) -> f64 {
    let r = system.reaction_of_solid(s);
    let mut si = system.ln_k(r);
    for (j, &la) in ln_a.iter().enumerate().take(system.component_count()) {
        let a = system.coefficient(r, j);
        if a != 0.0 {
            si += a * la;
        }
    }
    si
}

/// Next move of the solid-phase search.
#[derive(Debug, Clone, PartialEq)]
pub enum SolidPhaseStep {
    /// Present solids are consistent and no absent solid is supersaturated.
    Settled,
    /// Re-solve with this set of present solids.
    Change(Vec<bool>),
    /// Nothing left to try.
    Exhausted,
}

/// Bookkeeping of the solid sets tried within one activity iteration.
#[derive(Debug, Default)]
pub struct SolidSearch {
    visited: HashSet<Vec<bool>>,
    pub iterations: usize,
}

impl SolidSearch {
    pub fn clear(&mut self) {
        self.visited.clear();
        self.iterations = 0;
    }

    pub fn mark(&mut self, present: &[bool]) {
        self.visited.insert(present.to_vec());
    }

    pub fn is_visited(&self, present: &[bool]) -> bool {
        self.visited.contains(present)
    }

    /// Inspect the converged mass balances for `elim.solids`.
    ///
    /// A present solid with a negative amount is dropped (the most negative
    /// one); otherwise supersaturated absent solids are admitted according to
    /// `config.solid_admission`.
    pub fn check(
        &self,
        system: &ChemicalSystem,
        plan: &Plan,
        config: &SolverConfig,
        elim: &Elimination,
        ws: &Workspace,
        tolerance: f64,
    ) -> SolidPhaseStep {
        let mut worst: Option<(usize, f64)> = None;
        for (si, &s) in elim.solids.iter().enumerate() {
            let amount = ws.solid_amount[s];
            let scale = elim.amount_scale(si, ws).max(f64::MIN_POSITIVE);
            if amount < -tolerance * scale {
                let rel = amount / scale;
                if worst.is_none_or(|(_, w)| rel < w) {
                    worst = Some((s, rel));
                }
            }
        }
        if let Some((s, _)) = worst {
            let mut next = ws.present.clone();
            next[s] = false;
            debug!(solid = solid_name(system, s), "dropping solid with negative amount");
            return if self.is_visited(&next) {
                self.reduce(system, plan, &ws.present)
            } else {
                SolidPhaseStep::Change(next)
            };
        }

        let mut candidates: Vec<(usize, f64)> = (0..system.solid_count())
            .filter(|&s| !ws.present[s] && !plan.blocked[system.reaction_of_solid(s)])
            .filter_map(|s| {
                let si = saturation_index(system, s, &ws.ln_a);
                if si > config.saturation_tolerance {
                    let r = system.reaction_of_solid(s);
                    let weight: f64 = (0..system.component_count())
                        .map(|j| system.coefficient(r, j).abs())
                        .sum();
                    Some((s, si / weight.max(1.0)))
                } else {
                    None
                }
            })
            .collect();
        if candidates.is_empty() {
            return SolidPhaseStep::Settled;
        }
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        if config.solid_admission == SolidAdmission::AllSupersaturated {
            let mut next = ws.present.clone();
            for &(s, _) in &candidates {
                next[s] = true;
            }
            if !self.is_visited(&next) {
                debug!(count = candidates.len(), "admitting all supersaturated solids");
                return SolidPhaseStep::Change(next);
            }
        }
        for &(s, score) in &candidates {
            let mut next = ws.present.clone();
            next[s] = true;
            if !self.is_visited(&next) {
                debug!(solid = solid_name(system, s), score, "admitting supersaturated solid");
                return SolidPhaseStep::Change(next);
            }
        }
        let mut widest = ws.present.clone();
        widest[candidates[0].0] = true;
        self.reduce(system, plan, &widest)
    }

    /// Largest unvisited subset of `present` whose elimination is non-singular.
    pub fn reduce(&self, system: &ChemicalSystem, plan: &Plan, present: &[bool]) -> SolidPhaseStep {
        let members: Vec<usize> = (0..present.len()).filter(|&s| present[s]).collect();
        let n = members.len();
        for size in (0..n).rev() {
            let mut pick: Vec<usize> = (0..size).collect();
            loop {
                let mut subset = vec![false; present.len()];
                for &p in &pick {
                    subset[members[p]] = true;
                }
                if !self.is_visited(&subset) && Elimination::build(system, plan, &subset).is_some() {
                    debug!(from = n, to = size, "reduced solid set");
                    return SolidPhaseStep::Change(subset);
                }
                if size == 0 || !advance_combination(&mut pick, n) {
                    break;
                }
            }
        }
        SolidPhaseStep::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::Constraint;

    fn agcl() -> ChemicalSystem {
        ChemicalSystem::builder()
            .component("Ag+", 1.0)
            .component("Cl-", -1.0)
            .complex("AgCl", 0.0, 3.3, &[("Ag+", 1.0), ("Cl-", 1.0)])
            .solid("AgCl(s)", 9.75, &[("Ag+", 1.0), ("Cl-", 1.0)])
            .solid("AgCl(s2)", 9.75, &[("Ag+", 1.0), ("Cl-", 1.0)])
            .build()
            .unwrap()
    }

    fn plan(system: &ChemicalSystem) -> Plan {
        Plan::build(system, &[Constraint::Total(0.01), Constraint::Total(0.01)])
    }

    #[test]
    fn single_solid_elimination() {
        let sys = agcl();
        let plan = plan(&sys);
        let elim = Elimination::build(&sys, &plan, &[true, false]).unwrap();
        assert_eq!(elim.solids, vec![0]);
        assert_eq!(elim.ber, vec![0]);
        assert_eq!(elim.ruta[(0, 0)], 1.0);
        // Cl- balance absorbs the Ag+ balance one for one
        assert_eq!(elim.pva[(1, 0)], 1.0);

        let mut ln_a = vec![0.0, -2.0 * std::f64::consts::LN_10, 0.0];
        elim.apply_fixed_activities(&sys, &mut ln_a);
        assert!((saturation_index(&sys, 0, &ln_a)).abs() < 1e-12);
    }

    #[test]
    fn identical_solids_are_singular() {
        let sys = agcl();
        let plan = plan(&sys);
        assert!(Elimination::build(&sys, &plan, &[true, true]).is_none());

        let search = SolidSearch::default();
        let step = search.reduce(&sys, &plan, &[true, true]);
        assert_eq!(step, SolidPhaseStep::Change(vec![true, false]));
    }

    #[test]
    fn reduce_skips_visited_sets() {
        let sys = agcl();
        let plan = plan(&sys);
        let mut search = SolidSearch::default();
        search.mark(&[true, false]);
        assert_eq!(
            search.reduce(&sys, &plan, &[true, true]),
            SolidPhaseStep::Change(vec![false, true])
        );
        search.mark(&[false, true]);
        search.mark(&[false, false]);
        assert_eq!(search.reduce(&sys, &plan, &[true, true]), SolidPhaseStep::Exhausted);
    }

    #[test]
    fn solids_of_fixed_components_cannot_be_eliminated() {
        let sys = agcl();
        let plan = Plan::build(&sys, &[Constraint::LogActivity(-3.0), Constraint::LogActivity(-3.0)]);
        assert!(Elimination::build(&sys, &plan, &[true, false]).is_none());
    }
}
