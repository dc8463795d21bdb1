//! Results handed back from a solve.

use crate::flags::SolveFlags;
use crate::solids::saturation_index;
use crate::state::SolutionState;
use hf_activity::AqueousProperties;
use hf_core::numeric::LN10;
use hf_system::ChemicalSystem;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesResult {
    pub name: String,
    /// mol/kg; for solids the amount formed per kg
    pub concentration: f64,
    pub log10_activity: f64,
    pub log10_activity_coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResult {
    pub name: String,
    /// Given or computed total [mol/kg]
    pub total: f64,
    /// Total in solution, Σ a·C over aqueous species [mol/kg]
    pub dissolved: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidResult {
    pub name: String,
    pub amount: f64,
    /// log10 of the saturation ratio; 0 for present solids
    pub saturation_index: f64,
    pub present: bool,
}

/// Equilibrium composition at one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Every species: components, complexes, then solids
    pub species: Vec<SpeciesResult>,
    pub components: Vec<ComponentResult>,
    pub solids: Vec<SolidResult>,
    pub properties: AqueousProperties,
    pub flags: SolveFlags,
}

impl Composition {
    pub(crate) fn from_state(system: &ChemicalSystem, state: &SolutionState) -> Self {
        let na = system.component_count();
        let n_aq = system.aqueous_count();
        let log10 = |ln: f64| if ln == f64::NEG_INFINITY { ln } else { ln / LN10 };

        let mut species: Vec<SpeciesResult> = (0..n_aq)
            .map(|i| SpeciesResult {
                name: system.name(i).to_string(),
                concentration: state.conc[i],
                log10_activity: log10(state.ln_a[i]),
                log10_activity_coefficient: state.ln_g[i] / LN10,
            })
            .collect();

        let solids: Vec<SolidResult> = (0..system.solid_count())
            .map(|s| {
                let present = state.present[s];
                SolidResult {
                    name: system.name(n_aq + s).to_string(),
                    amount: if present { state.solid_amount[s].max(0.0) } else { 0.0 },
                    saturation_index: if present {
                        0.0
                    } else {
                        log10(saturation_index(system, s, &state.ln_a))
                    },
                    present,
                }
            })
            .collect();
        species.extend(solids.iter().map(|s| SpeciesResult {
            name: s.name.clone(),
            concentration: s.amount,
            log10_activity: s.saturation_index,
            log10_activity_coefficient: 0.0,
        }));

        let components = (0..na)
            .map(|j| {
                let dissolved: f64 = state.conc[j]
                    + (0..system.complex_count())
                        .map(|i| system.coefficient(i, j) * state.conc[na + i])
                        .sum::<f64>();
                let in_solids: f64 = (0..system.solid_count())
                    .map(|s| system.coefficient(system.reaction_of_solid(s), j) * state.solid_amount[s])
                    .sum();
                ComponentResult {
                    name: system.name(j).to_string(),
                    total: dissolved + in_solids,
                    dissolved,
                }
            })
            .collect();

        Self {
            species,
            components,
            solids,
            properties: state.properties,
            flags: state.flags,
        }
    }

    /// Lookup by (normalised) species name.
    pub fn species(&self, name: &str) -> Option<&SpeciesResult> {
        let key = hf_system::normalize_species_name(name);
        self.species
            .iter()
            .find(|s| hf_system::normalize_species_name(&s.name) == key)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentResult> {
        let key = hf_system::normalize_species_name(name);
        self.components
            .iter()
            .find(|c| hf_system::normalize_species_name(&c.name) == key)
    }

    pub fn solid(&self, name: &str) -> Option<&SolidResult> {
        let key = hf_system::normalize_species_name(name);
        self.solids
            .iter()
            .find(|s| hf_system::normalize_species_name(&s.name) == key)
    }
}
