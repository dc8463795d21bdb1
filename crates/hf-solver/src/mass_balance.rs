//! Mass balances: concentrations from activities, residuals and the nested
//! per-component root search.

use crate::config::SolverConfig;
use crate::constraints::Constraint;
use crate::error::{SolveError, SolveResult};
use crate::flags::{SolveFlag, SolveFlags};
use crate::plan::Plan;
use crate::solids::Elimination;
use hf_core::numeric::{LN10, exp_conc};
use hf_core::CancelToken;
use hf_system::ChemicalSystem;
use tracing::trace;

/// Bounds on a component's ln activity during the search.
pub const LN_A_MIN: f64 = -230.0;
pub const LN_A_MAX: f64 = 80.0;

/// Starting activity of a component with a non-positive total.
const FALLBACK_LN_A: f64 = -16.118_095_650_958_32; // ln(1e-7)

/// Two proposals closer than this (relative) count as identical.
const ROUNDOFF: f64 = 4.0 * f64::EPSILON;

fn conc_of(ln_c: f64) -> f64 {
    if ln_c == f64::NEG_INFINITY {
        0.0
    } else {
        exp_conc(ln_c)
    }
}

/// Working buffers of one solve.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    /// ln activity per aqueous species
    pub ln_a: Vec<f64>,
    /// Concentration per aqueous species
    pub conc: Vec<f64>,
    /// ln activity coefficient per aqueous species
    pub ln_g: Vec<f64>,
    /// Σ a·C per component (dissolved amount)
    pub y: Vec<f64>,
    /// Σ |a|·C per component
    pub y_abs: Vec<f64>,
    /// Given totals; NaN for activity-given components
    pub tot: Vec<f64>,
    pub present: Vec<bool>,
    pub solid_amount: Vec<f64>,
    pub searches: Vec<RootSearch>,
    /// ln a of water from the activity model, when it overrides the constraint
    pub water_ln_a: Option<f64>,
}

impl Workspace {
    pub fn new(system: &ChemicalSystem) -> Self {
        let n_aq = system.aqueous_count();
        let na = system.component_count();
        let ns = system.solid_count();
        Self {
            ln_a: vec![0.0; n_aq],
            conc: vec![0.0; n_aq],
            ln_g: vec![0.0; n_aq],
            y: vec![0.0; na],
            y_abs: vec![0.0; na],
            tot: vec![f64::NAN; na],
            present: vec![false; ns],
            solid_amount: vec![0.0; ns],
            searches: vec![RootSearch::default(); na],
            water_ln_a: None,
        }
    }

    /// Fresh starting point: ln(total) or ln(1e-7) for free components, the
    /// given activity for the others, unit activity coefficients, no solids.
    pub fn initialise(&mut self, plan: &Plan, constraints: &[Constraint]) {
        self.ln_g.fill(0.0);
        self.present.fill(false);
        self.solid_amount.fill(0.0);
        self.water_ln_a = None;
        self.set_constraints(plan, constraints);
        for (j, c) in constraints.iter().enumerate() {
            if let Constraint::Total(t) = *c {
                if plan.is_free(j) {
                    self.ln_a[j] = if t > 0.0 {
                        t.ln().clamp(LN_A_MIN, LN_A_MAX)
                    } else {
                        FALLBACK_LN_A
                    };
                }
            }
        }
    }

    /// Copy the constraint values in; free components keep their ln a.
    pub fn set_constraints(&mut self, plan: &Plan, constraints: &[Constraint]) {
        for (j, c) in constraints.iter().enumerate() {
            match *c {
                Constraint::Total(t) => {
                    self.tot[j] = t;
                    if plan.no_calc[j] {
                        self.ln_a[j] = f64::NEG_INFINITY;
                    }
                }
                Constraint::LogActivity(la) => {
                    self.tot[j] = f64::NAN;
                    self.ln_a[j] = la * LN10;
                }
            }
        }
    }

    pub fn reset_searches(&mut self, step: f64) {
        for s in &mut self.searches {
            s.reset(step);
        }
    }
}

/// Recompute the activities fixed by solids, every aqueous concentration, the
/// dissolved amounts and the solid amounts from the current free activities.
pub fn update_concentrations(system: &ChemicalSystem, plan: &Plan, elim: &Elimination, ws: &mut Workspace) {
    let na = system.component_count();
    let nx = system.complex_count();

    if let (Some(w), Some(ln_aw)) = (system.water_index(), ws.water_ln_a) {
        if w < na && !plan.total_given[w] {
            ws.ln_a[w] = ln_aw;
        }
    }

    elim.apply_fixed_activities(system, &mut ws.ln_a);

    for j in 0..na {
        let ln_c = if Some(j) == system.water_index() {
            ws.ln_a[j]
        } else {
            ws.ln_a[j] - ws.ln_g[j]
        };
        ws.conc[j] = conc_of(ln_c);
        ws.y[j] = ws.conc[j];
        ws.y_abs[j] = ws.conc[j];
    }

    for i in 0..nx {
        let sp = na + i;
        if plan.blocked[i] {
            ws.ln_a[sp] = f64::NEG_INFINITY;
            ws.conc[sp] = 0.0;
            continue;
        }
        let mut ln_a = system.ln_k(i);
        for j in 0..na {
            let a = system.coefficient(i, j);
            if a != 0.0 {
                ln_a += a * ws.ln_a[j];
            }
        }
        ws.ln_a[sp] = ln_a;
        let c = conc_of(ln_a - ws.ln_g[sp]);
        ws.conc[sp] = c;
        for j in 0..na {
            let a = system.coefficient(i, j);
            if a != 0.0 {
                ws.y[j] += a * c;
                ws.y_abs[j] += a.abs() * c;
            }
        }
    }

    elim.solid_amounts(&ws.tot, &ws.y, &mut ws.solid_amount);
}

/// Scale of component `j`'s mass balance.
#[inline]
fn balance_scale(ws: &Workspace, j: usize) -> f64 {
    let t = if ws.tot[j].is_nan() { 0.0 } else { ws.tot[j].abs() };
    t.max(ws.y_abs[j])
}

/// Reduced residual of free component `k` and its scale. Components fixed by
/// solids are folded in through `pva`, so the residual is the error of `k`'s
/// own balance once the solid amounts are taken from the fixed components.
pub fn residual(elim: &Elimination, ws: &Workspace, k: usize) -> (f64, f64) {
    let mut f = ws.y[k] - ws.tot[k];
    let mut in_solids = 0.0;
    for (bi, &b) in elim.ber.iter().enumerate() {
        let p = elim.pva[(k, bi)];
        if p != 0.0 {
            let d = p * (ws.y[b] - ws.tot[b]);
            f -= d;
            in_solids += d.abs();
        }
    }
    (f, balance_scale(ws, k).max(in_solids).max(f64::MIN_POSITIVE))
}

/// Outcome of one root-search proposal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proposal {
    /// Evaluate at this ln a next.
    Step(f64),
    /// Stop searching; accept the current value with the given flag.
    Accept(SolveFlag),
}

/// Bracketing / bisection / chord search for one component's ln a.
///
/// The residual is assumed to increase with ln a. Brackets persist across
/// visits of the nested traversal and are reset whenever a later component
/// moves. `iterations` counts the steps of the current visit only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootSearch {
    /// (ln a, residual) with residual < 0
    lo: Option<(f64, f64)>,
    /// (ln a, residual) with residual > 0
    hi: Option<(f64, f64)>,
    step: f64,
    last_side: i8,
    stagnant: u8,
    /// Chord steps since the bracket was last checked for shrinkage
    chord_run: u8,
    run_width: f64,
    /// Residual of the previous closed-form step
    last_mono: Option<f64>,
    /// The closed form stopped halving the residual
    mono_stalled: bool,
    pub iterations: usize,
    /// Accepted without meeting the tolerance; counts as satisfied until reset
    pub settled: bool,
}

impl RootSearch {
    pub fn reset(&mut self, step: f64) {
        *self = Self {
            step,
            ..Self::default()
        };
    }

    pub fn is_bracketed(&self) -> bool {
        self.lo.is_some() && self.hi.is_some()
    }

    fn record(&mut self, x: f64, f: f64) -> i8 {
        let side: i8 = if f < 0.0 { -1 } else { 1 };
        if side < 0 {
            self.lo = Some((x, f));
        } else {
            self.hi = Some((x, f));
        }
        side
    }

    /// Chord step, or bisection when three chord steps have not halved the
    /// bracket.
    fn chord(&mut self, l: (f64, f64), h: (f64, f64), width: f64) -> f64 {
        if self.chord_run == 0 {
            self.run_width = width;
        }
        self.chord_run += 1;
        let denom = h.1 - l.1;
        if self.chord_run >= 3 {
            self.chord_run = 0;
            if width > 0.5 * self.run_width {
                return 0.5 * (l.0 + h.0);
            }
        }
        if denom == 0.0 {
            0.5 * (l.0 + h.0)
        } else {
            l.0 - l.1 * (h.0 - l.0) / denom
        }
    }

    /// Closed-form step `ln a + ln(tot / y)` for a component whose species
    /// all carry positive coefficients. Once a step fails to halve the
    /// residual the component is handed to [`propose`](Self::propose) until
    /// the next reset.
    pub fn propose_mono(&mut self, x: f64, f: f64, tot: f64, y: f64, config: &SolverConfig) -> Proposal {
        if !self.mono_stalled {
            if let Some(prev) = self.last_mono {
                self.mono_stalled = f.abs() > 0.5 * prev.abs();
            }
        }
        if self.mono_stalled {
            return self.propose(x, f, config);
        }
        self.iterations += 1;
        if self.iterations > config.max_root_iterations {
            return Proposal::Accept(SolveFlag::MassBalanceIterations);
        }
        self.last_side = self.record(x, f);
        self.last_mono = Some(f);
        Proposal::Step((x + tot.ln() - y.ln()).clamp(LN_A_MIN, LN_A_MAX))
    }

    fn in_chord_phase(&self, config: &SolverConfig) -> bool {
        match (self.lo, self.hi) {
            (Some(l), Some(h)) => (h.0 - l.0).abs() <= config.bisection_width,
            _ => false,
        }
    }

    /// Record `f(x)` and propose the next `x`.
    pub fn propose(&mut self, x: f64, f: f64, config: &SolverConfig) -> Proposal {
        self.iterations += 1;
        if self.iterations > config.max_root_iterations {
            return Proposal::Accept(SolveFlag::MassBalanceIterations);
        }

        let side = self.record(x, f);
        // Illinois: the end that did not move gets its residual halved.
        if side == self.last_side && self.in_chord_phase(config) {
            let stale = if side < 0 { &mut self.hi } else { &mut self.lo };
            if let Some(end) = stale {
                end.1 *= 0.5;
            }
        }
        self.last_side = side;

        let mut next = match (self.lo, self.hi) {
            (Some(l), Some(h)) => {
                let width = (h.0 - l.0).abs();
                if width <= ROUNDOFF * (1.0 + x.abs()) {
                    return Proposal::Accept(SolveFlag::RoundOff);
                }
                if width > config.bisection_width {
                    self.chord_run = 0;
                    0.5 * (l.0 + h.0)
                } else {
                    self.chord(l, h, width)
                }
            }
            (Some(l), None) => {
                let n = l.0 + self.step;
                self.step *= 2.0;
                n
            }
            (None, Some(h)) => {
                let n = h.0 - self.step;
                self.step *= 2.0;
                n
            }
            (None, None) => x,
        };
        next = next.clamp(LN_A_MIN, LN_A_MAX);

        if (next - x).abs() <= ROUNDOFF * (1.0 + x.abs()) {
            if !self.is_bracketed() {
                // At a bound with the residual still on the same side.
                return Proposal::Accept(SolveFlag::MassBalanceIterations);
            }
            self.stagnant += 1;
        } else {
            self.stagnant = 0;
        }
        match self.stagnant {
            0..=2 => Proposal::Step(next),
            3 => match (self.lo, self.hi) {
                (Some(l), Some(h)) => Proposal::Step(0.5 * (l.0 + h.0)),
                _ => Proposal::Step(next),
            },
            _ => Proposal::Accept(SolveFlag::RoundOff),
        }
    }
}

/// Borrowed inputs of a mass-balance pass.
pub struct MassBalance<'a> {
    pub system: &'a ChemicalSystem,
    pub plan: &'a Plan,
    pub elim: &'a Elimination,
    pub config: &'a SolverConfig,
    pub cancel: &'a CancelToken,
    pub tolerance: f64,
}

impl MassBalance<'_> {
    fn satisfied(&self, ws: &Workspace, k: usize) -> bool {
        let (f, scale) = residual(self.elim, ws, k);
        f.abs() <= self.tolerance * scale
    }

    /// Satisfy every free mass balance, re-converging earlier components
    /// after each step of a later coupled one.
    pub fn run(&self, ws: &mut Workspace, flags: &mut SolveFlags) -> SolveResult<()> {
        let order = &self.plan.order;
        let n = order.len();
        let any_solid = !self.elim.solids.is_empty();

        update_concentrations(self.system, self.plan, self.elim, ws);

        let mut p = 0;
        let mut steps = 0usize;
        while p < n {
            if self.cancel.is_cancelled() {
                return Err(SolveError::Cancelled);
            }
            let k = order[p];
            if self.elim.fixes(k) || ws.searches[k].settled || self.satisfied(ws, k) {
                p = self.plan.next_if_satisfied[p];
                continue;
            }

            steps += 1;
            if steps > self.config.max_mass_balance_steps {
                flags.insert(SolveFlag::MassBalanceIterations);
                trace!(steps, "mass-balance step ceiling reached");
                break;
            }

            let x = ws.ln_a[k];
            let (f, _) = residual(self.elim, ws, k);
            let search = &mut ws.searches[k];
            let proposal = if self.plan.mono[k] && !any_solid && ws.tot[k] > 0.0 && ws.y[k] > 0.0 {
                search.propose_mono(x, f, ws.tot[k], ws.y[k], self.config)
            } else {
                search.propose(x, f, self.config)
            };
            let next = match proposal {
                Proposal::Step(next) => next,
                Proposal::Accept(flag) => {
                    trace!(component = k, ?flag, "root search accepted without convergence");
                    flags.insert(flag);
                    search.settled = true;
                    continue;
                }
            };

            ws.ln_a[k] = next;
            update_concentrations(self.system, self.plan, self.elim, ws);

            let back = if any_solid { 0 } else { self.plan.next_if_violated[p] };
            let step = self.config.continuation_step;
            for q in 0..p {
                ws.searches[order[q]].reset(step);
            }
            if back < p {
                // Root ceiling is per visit; the step ceiling bounds the pass.
                ws.searches[k].iterations = 0;
            }
            p = back;
        }
        Ok(())
    }
}
