//! Name-based construction of a [`ChemicalSystem`].

use crate::error::{SystemError, SystemResult};
use crate::name::{is_water_name, normalize_species_name};
use crate::system::ChemicalSystem;
use nalgebra::DMatrix;
use std::collections::HashSet;
use tracing::{debug, warn};

const CHARGE_BALANCE_TOL: f64 = 1e-6;

#[derive(Debug, Clone)]
struct ReactionSpec {
    name: String,
    charge: f64,
    log_k: f64,
    coeffs: Vec<(String, f64)>,
    excluded: bool,
}

#[derive(Debug, Clone)]
struct ComponentSpec {
    name: String,
    charge: f64,
    excluded: bool,
}

/// Collects components, complexes and solids, then validates them into a
/// [`ChemicalSystem`].
///
/// Complexes use formation constants `log β` for `Σ a_j·C_j ⇌ X`. Solids use the
/// same convention, `log Kf` of `Σ a_j·C_j ⇌ S(s)`, so a solid is supersaturated
/// when `ln Kf + Σ a_j·ln A_j > 0`.
#[derive(Debug, Clone, Default)]
pub struct ChemicalSystemBuilder {
    components: Vec<ComponentSpec>,
    complexes: Vec<ReactionSpec>,
    solids: Vec<ReactionSpec>,
}

fn owned(coeffs: &[(&str, f64)]) -> Vec<(String, f64)> {
    coeffs.iter().map(|(n, a)| ((*n).to_string(), *a)).collect()
}

impl ChemicalSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(mut self, name: &str, charge: f64) -> Self {
        self.components.push(ComponentSpec {
            name: name.to_string(),
            charge,
            excluded: false,
        });
        self
    }

    /// A soluble complex with charge `charge` and formation constant `log_beta`.
    pub fn complex(mut self, name: &str, charge: f64, log_beta: f64, coeffs: &[(&str, f64)]) -> Self {
        self.complexes.push(ReactionSpec {
            name: name.to_string(),
            charge,
            log_k: log_beta,
            coeffs: owned(coeffs),
            excluded: false,
        });
        self
    }

    /// A solid with formation constant `log_kf`.
    pub fn solid(mut self, name: &str, log_kf: f64, coeffs: &[(&str, f64)]) -> Self {
        self.solids.push(ReactionSpec {
            name: name.to_string(),
            charge: 0.0,
            log_k: log_kf,
            coeffs: owned(coeffs),
            excluded: true,
        });
        self
    }

    /// Leave an already added component or complex (a gas, a liquid, a solid
    /// written as a soluble species) out of activity bookkeeping.
    pub fn exclude(mut self, name: &str) -> Self {
        let key = normalize_species_name(name);
        for c in &mut self.components {
            if normalize_species_name(&c.name) == key {
                c.excluded = true;
            }
        }
        for x in &mut self.complexes {
            if normalize_species_name(&x.name) == key {
                x.excluded = true;
            }
        }
        self
    }

    pub fn build(self) -> SystemResult<ChemicalSystem> {
        let na = self.components.len();
        let nx = self.complexes.len();
        let n_solids = self.solids.len();

        if na == 0 {
            return Err(SystemError::Configuration {
                what: "at least one component is required".into(),
            });
        }

        let mut seen = HashSet::new();
        let all_names = self
            .components
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.complexes.iter().map(|x| x.name.as_str()))
            .chain(self.solids.iter().map(|s| s.name.as_str()));
        for name in all_names {
            if name.trim().is_empty() {
                return Err(SystemError::Configuration {
                    what: "empty species name".into(),
                });
            }
            let key = normalize_species_name(name);
            if !seen.insert(key.clone()) {
                return Err(SystemError::Duplicate { name: key });
            }
        }

        let component_keys: Vec<String> = self
            .components
            .iter()
            .map(|c| normalize_species_name(&c.name))
            .collect();

        let mut names = Vec::with_capacity(na + nx + n_solids);
        let mut charge = Vec::with_capacity(na + nx + n_solids);
        let mut excluded = Vec::with_capacity(na + nx + n_solids);

        for c in &self.components {
            hf_core::ensure_finite(c.charge, "component charge")?;
            names.push(c.name.clone());
            charge.push(c.charge);
            excluded.push(c.excluded);
        }

        let reactions: Vec<&ReactionSpec> = self.complexes.iter().chain(self.solids.iter()).collect();
        let mut stoich = DMatrix::<f64>::zeros(reactions.len(), na);
        let mut log_k = Vec::with_capacity(reactions.len());

        for (i, r) in reactions.iter().enumerate() {
            hf_core::ensure_finite(r.log_k, "formation constant")?;
            hf_core::ensure_finite(r.charge, "complex charge")?;
            for (comp, a) in &r.coeffs {
                hf_core::ensure_finite(*a, "stoichiometric coefficient")?;
                let key = normalize_species_name(comp);
                let j = component_keys
                    .iter()
                    .position(|k| *k == key)
                    .ok_or_else(|| SystemError::UnknownComponent {
                        species: r.name.clone(),
                        name: comp.clone(),
                    })?;
                stoich[(i, j)] += *a;
            }
            if stoich.row(i).iter().all(|a| *a == 0.0) {
                return Err(SystemError::Configuration {
                    what: format!("reaction of '{}' has no components", r.name),
                });
            }
            log_k.push(r.log_k);
            names.push(r.name.clone());
            charge.push(r.charge);
            excluded.push(r.excluded);
        }

        let water = names[..na + nx].iter().position(|n| is_water_name(n));
        if let Some(w) = water {
            // Water contributes neither to ionic strength nor to Σm.
            excluded[w] = true;
        }

        let system = ChemicalSystem {
            names,
            na,
            nx,
            n_solids,
            stoich,
            log_k,
            charge,
            excluded,
            water,
        };
        check_charge_balance(&system);
        debug!(
            components = na,
            complexes = nx,
            solids = n_solids,
            water = ?water,
            "chemical system built"
        );
        Ok(system)
    }
}

/// Warn about every reaction whose charge does not balance. Never fails.
pub fn check_charge_balance(system: &ChemicalSystem) -> usize {
    let na = system.component_count();
    let mut unbalanced = 0;
    for i in 0..system.reaction_count() {
        let sp = system.species_of_reaction(i);
        let sum: f64 = (0..na)
            .map(|j| system.coefficient(i, j) * system.charge(j))
            .sum();
        if (sum - system.charge(sp)).abs() > CHARGE_BALANCE_TOL {
            unbalanced += 1;
            warn!(
                species = system.name(sp),
                reaction_charge = sum,
                species_charge = system.charge(sp),
                "formation reaction is not charge balanced"
            );
        }
    }
    unbalanced
}
