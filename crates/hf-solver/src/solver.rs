//! The equilibrium solver: a state machine over mass balances, solid phases
//! and activity feedback.

use crate::config::SolverConfig;
use crate::constraints::SolveRequest;
use crate::error::{SolveError, SolveResult};
use crate::flags::{SolveFlag, SolveFlags};
use crate::mass_balance::{MassBalance, Workspace};
use crate::plan::Plan;
use crate::report::Composition;
use crate::solids::{Elimination, SolidPhaseStep, SolidSearch};
use crate::state::SolutionState;
use hf_activity::{ActivityModel, ActivityModelKind, AqueousProperties, IonicStrength};
use hf_core::CancelToken;
use hf_system::ChemicalSystem;
use tracing::{debug, trace};

/// States of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Build the elimination for the current solid set
    Eliminate,
    MassBalance,
    CheckSolids,
    /// Current solid set is singular: fall back to a subset
    DropSolids,
    Activity,
    Finalize,
}

/// Everything one solve works on. Writes go to the scratch workspace only.
struct Context<'s> {
    system: &'s ChemicalSystem,
    plan: &'s Plan,
    config: &'s SolverConfig,
    cancel: &'s CancelToken,
    request: &'s SolveRequest,
    activity: &'s mut ActivityModel,
    ws: &'s mut Workspace,
    search: &'s mut SolidSearch,
    ln_f: &'s mut [f64],
    elim: Elimination,
    flags: SolveFlags,
    activity_iterations: usize,
    properties: AqueousProperties,
}

/// Whether activity coefficients are iterated for this request.
fn activity_active(model: &ActivityModel, request: &SolveRequest) -> bool {
    model.kind() != ActivityModelKind::Ideal && request.ionic_strength != IonicStrength::Ideal
}

/// Water component whose activity follows the activity model.
fn overridable_water(system: &ChemicalSystem, plan: &Plan) -> Option<usize> {
    system
        .water_index()
        .filter(|&w| w < system.component_count() && !plan.total_given[w])
}

impl Context<'_> {
    fn run(&mut self) -> SolveResult<()> {
        let mut step = Step::Eliminate;
        while step != Step::Finalize {
            if self.cancel.is_cancelled() {
                return Err(SolveError::Cancelled);
            }
            trace!(?step, "solver step");
            step = match step {
                Step::Eliminate => self.eliminate(),
                Step::MassBalance => self.mass_balance()?,
                Step::CheckSolids => self.check_solids()?,
                Step::DropSolids => self.drop_solids()?,
                Step::Activity => self.activity_step()?,
                Step::Finalize => Step::Finalize,
            };
        }
        Ok(())
    }

    fn eliminate(&mut self) -> Step {
        match Elimination::build(self.system, self.plan, &self.ws.present) {
            Some(elim) => {
                self.elim = elim;
                self.search.mark(&self.ws.present);
                Step::MassBalance
            }
            None => Step::DropSolids,
        }
    }

    fn mass_balance(&mut self) -> SolveResult<Step> {
        MassBalance {
            system: self.system,
            plan: self.plan,
            elim: &self.elim,
            config: self.config,
            cancel: self.cancel,
            tolerance: self.request.tolerance,
        }
        .run(self.ws, &mut self.flags)?;
        Ok(Step::CheckSolids)
    }

    fn change_solids(&mut self, next: Vec<bool>) {
        self.ws.present = next;
        self.ws.reset_searches(self.config.continuation_step);
    }

    fn inconsistent(&self) -> SolveError {
        let mut flags = self.flags;
        flags.insert(SolveFlag::NoConsistentSolids);
        SolveError::Inconsistent { flags }
    }

    fn check_solids(&mut self) -> SolveResult<Step> {
        if self.system.solid_count() == 0 {
            return Ok(Step::Activity);
        }
        let decision = self.search.check(
            self.system,
            self.plan,
            self.config,
            &self.elim,
            self.ws,
            self.request.tolerance,
        );
        match decision {
            SolidPhaseStep::Settled => Ok(Step::Activity),
            SolidPhaseStep::Change(next) => {
                self.search.iterations += 1;
                if self.search.iterations > self.config.max_solid_iterations {
                    debug!(iterations = self.search.iterations, "solid-phase ceiling reached");
                    self.flags.insert(SolveFlag::SolidIterations);
                    return Ok(Step::Activity);
                }
                self.change_solids(next);
                Ok(Step::Eliminate)
            }
            SolidPhaseStep::Exhausted => Err(self.inconsistent()),
        }
    }

    fn drop_solids(&mut self) -> SolveResult<Step> {
        match self.search.reduce(self.system, self.plan, &self.ws.present) {
            SolidPhaseStep::Change(next) => {
                self.change_solids(next);
                Ok(Step::Eliminate)
            }
            _ => Err(self.inconsistent()),
        }
    }

    fn activity_step(&mut self) -> SolveResult<Step> {
        if !activity_active(self.activity, self.request) {
            self.properties = self.ideal_properties();
            return Ok(Step::Finalize);
        }

        let props = self.activity.ln_activity_coefficients(
            &self.ws.conc,
            self.request.ionic_strength,
            &mut *self.ln_f,
        )?;
        let water = self.system.water_index();
        let water_free = overridable_water(self.system, self.plan);
        let tol = self.config.activity_tolerance;

        let mut converged = true;
        for i in 0..self.ws.ln_g.len() {
            let current = if Some(i) == water {
                match water_free {
                    Some(_) => self.ws.water_ln_a.unwrap_or(self.ws.ln_a[i]),
                    None => continue,
                }
            } else {
                self.ws.ln_g[i]
            };
            if (self.ln_f[i] - current).abs() > tol * (1.0 + self.ws.conc[i]) {
                converged = false;
                break;
            }
        }

        self.activity_iterations += 1;
        trace!(
            iteration = self.activity_iterations,
            ionic_strength = props.ionic_strength,
            converged,
            "activity coefficients evaluated"
        );
        self.properties = props;
        if converged {
            return Ok(Step::Finalize);
        }
        if self.activity_iterations >= self.config.max_activity_iterations {
            debug!(iterations = self.activity_iterations, "activity coefficients did not converge");
            self.flags.insert(SolveFlag::ActivityNotConverged);
            return Ok(Step::Finalize);
        }

        let factor = self
            .config
            .damping
            .factor(self.activity_iterations - 1, props.sum_molalities);
        for i in 0..self.ws.ln_g.len() {
            if Some(i) == water {
                if water_free.is_some() {
                    let current = self.ws.water_ln_a.unwrap_or(self.ws.ln_a[i]);
                    self.ws.water_ln_a = Some(current + factor * (self.ln_f[i] - current));
                }
                continue;
            }
            self.ws.ln_g[i] += factor * (self.ln_f[i] - self.ws.ln_g[i]);
        }

        self.search.clear();
        self.search.mark(&self.ws.present);
        self.ws.reset_searches(self.config.continuation_step);
        Ok(Step::MassBalance)
    }

    fn ideal_properties(&self) -> AqueousProperties {
        let water = self.system.water_index();
        let electric_balance = (0..self.system.aqueous_count())
            .filter(|&i| !self.system.is_excluded(i) && Some(i) != water)
            .map(|i| self.system.charge(i) * self.ws.conc[i])
            .sum();
        AqueousProperties {
            electric_balance,
            ..AqueousProperties::ideal()
        }
    }

    fn finish_flags(&mut self) {
        let water = self.system.water_index();
        let implausible = (0..self.system.aqueous_count()).any(|i| {
            !self.system.is_excluded(i)
                && Some(i) != water
                && self.ws.conc[i] > self.config.plausible_concentration
        });
        if implausible {
            self.flags.insert(SolveFlag::ImplausibleConcentration);
        }
    }
}

/// HaltaFall equilibrium solver bound to one chemical system.
///
/// `solve` may be called repeatedly; each call works on a scratch copy and
/// commits the result only when it succeeds, so a cancelled or failed call
/// leaves [`state`](Self::state) at the last converged point.
pub struct EquilibriumSolver<'a> {
    system: &'a ChemicalSystem,
    activity: ActivityModel,
    config: SolverConfig,
    cancel: CancelToken,
    plan: Option<Plan>,
    committed: Option<SolutionState>,
    scratch: Workspace,
    search: SolidSearch,
    ln_f: Vec<f64>,
}

impl<'a> EquilibriumSolver<'a> {
    pub fn new(system: &'a ChemicalSystem, activity: ActivityModel, config: SolverConfig) -> SolveResult<Self> {
        let n_aq = system.aqueous_count();
        if activity.species_count() != n_aq {
            return Err(SolveError::Configuration {
                what: format!(
                    "activity model has {} species, system has {} aqueous species",
                    activity.species_count(),
                    n_aq
                ),
            });
        }
        if config.max_activity_iterations == 0 || config.max_root_iterations == 0 {
            return Err(SolveError::Configuration {
                what: "iteration ceilings must be positive".into(),
            });
        }
        if !(config.initial_step > 0.0 && config.continuation_step > 0.0 && config.bisection_width > 0.0) {
            return Err(SolveError::Configuration {
                what: "root-search steps must be positive".into(),
            });
        }
        Ok(Self {
            system,
            activity,
            config,
            cancel: CancelToken::new(),
            plan: None,
            committed: None,
            scratch: Workspace::new(system),
            search: SolidSearch::default(),
            ln_f: vec![0.0; n_aq],
        })
    }

    /// Share an externally owned cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn system(&self) -> &'a ChemicalSystem {
        self.system
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn activity_model(&self) -> &ActivityModel {
        &self.activity
    }

    /// Mutable access, e.g. to move temperature or pressure between solves.
    pub fn activity_model_mut(&mut self) -> &mut ActivityModel {
        &mut self.activity
    }

    /// Last converged point, if any.
    pub fn state(&self) -> Option<&SolutionState> {
        self.committed.as_ref()
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// Forget the committed point; the next solve starts fresh.
    pub fn reset(&mut self) {
        self.committed = None;
    }

    /// Solve for the equilibrium composition.
    pub fn solve(&mut self, request: &SolveRequest) -> SolveResult<Composition> {
        request.validate(self.system.component_count())?;

        let replan = self
            .plan
            .as_ref()
            .is_none_or(|p| !p.matches(&request.constraints));
        if replan {
            self.plan = Some(Plan::build(self.system, &request.constraints));
        }
        let Some(plan) = self.plan.as_ref() else {
            return Err(SolveError::Configuration {
                what: "no component plan".into(),
            });
        };

        let continued = request.continuation
            && !replan
            && self.committed.as_ref().is_some_and(SolutionState::is_continuable);
        let ws = &mut self.scratch;
        match self.committed.as_ref().filter(|_| continued) {
            Some(state) => {
                ws.ln_a.clone_from(&state.ln_a);
                ws.ln_g.clone_from(&state.ln_g);
                ws.present.clone_from(&state.present);
                ws.solid_amount.clone_from(&state.solid_amount);
                ws.water_ln_a = match (overridable_water(self.system, plan), activity_active(&self.activity, request)) {
                    (Some(w), true) => Some(state.ln_a[w]),
                    _ => None,
                };
                ws.set_constraints(plan, &request.constraints);
                ws.reset_searches(self.config.continuation_step);
            }
            None => {
                self.activity.reset_cache();
                ws.initialise(plan, &request.constraints);
                ws.reset_searches(self.config.initial_step);
            }
        }
        debug!(continued, replan, "equilibrium solve started");

        self.search.clear();
        let mut ctx = Context {
            system: self.system,
            plan,
            config: &self.config,
            cancel: &self.cancel,
            request,
            activity: &mut self.activity,
            ws,
            search: &mut self.search,
            ln_f: self.ln_f.as_mut_slice(),
            elim: Elimination::none(self.system.component_count()),
            flags: SolveFlags::empty(),
            activity_iterations: 0,
            properties: AqueousProperties::ideal(),
        };
        ctx.run()?;
        ctx.finish_flags();
        let flags = ctx.flags;
        let properties = ctx.properties;

        let state = self
            .committed
            .get_or_insert_with(|| SolutionState::new(self.system.aqueous_count(), self.system.solid_count()));
        state.ln_a.clone_from(&self.scratch.ln_a);
        state.conc.clone_from(&self.scratch.conc);
        state.ln_g.clone_from(&self.scratch.ln_g);
        state.present.clone_from(&self.scratch.present);
        state.solid_amount.clone_from(&self.scratch.solid_amount);
        state.properties = properties;
        state.flags = flags;

        debug!(%flags, ionic_strength = properties.ionic_strength, "equilibrium solve finished");
        Ok(Composition::from_state(self.system, state))
    }
}

impl std::fmt::Debug for EquilibriumSolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EquilibriumSolver")
            .field("components", &self.system.component_count())
            .field("activity", &self.activity.kind())
            .field("config", &self.config)
            .field("committed", &self.committed.is_some())
            .finish()
    }
}
