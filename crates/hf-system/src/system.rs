//! Immutable chemical system model.

use hf_core::numeric::LN10;
use nalgebra::DMatrix;

/// Role of a species in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpeciesKind {
    Component,
    Complex,
    Solid,
}

/// Components, soluble complexes and solids of a closed chemical system.
///
/// Built once through [`ChemicalSystemBuilder`](crate::ChemicalSystemBuilder) and
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChemicalSystem {
    pub(crate) names: Vec<String>,
    pub(crate) na: usize,
    pub(crate) nx: usize,
    pub(crate) n_solids: usize,
    /// `(nx + n_solids) x na`
    pub(crate) stoich: DMatrix<f64>,
    /// log10 formation constant per non-component species
    pub(crate) log_k: Vec<f64>,
    /// Charge per species; zero for solids
    pub(crate) charge: Vec<f64>,
    pub(crate) excluded: Vec<bool>,
    pub(crate) water: Option<usize>,
}

impl ChemicalSystem {
    pub fn builder() -> crate::ChemicalSystemBuilder {
        crate::ChemicalSystemBuilder::new()
    }

    /// Number of components (`na`).
    #[inline]
    pub fn component_count(&self) -> usize {
        self.na
    }

    /// Number of soluble complexes (`nx`).
    #[inline]
    pub fn complex_count(&self) -> usize {
        self.nx
    }

    /// Number of solids.
    #[inline]
    pub fn solid_count(&self) -> usize {
        self.n_solids
    }

    /// Total number of species (`ms = na + nx + n_solids`).
    #[inline]
    pub fn species_count(&self) -> usize {
        self.na + self.nx + self.n_solids
    }

    /// Components plus complexes.
    #[inline]
    pub fn aqueous_count(&self) -> usize {
        self.na + self.nx
    }

    /// Number of non-component species (`nx + n_solids`).
    #[inline]
    pub fn reaction_count(&self) -> usize {
        self.nx + self.n_solids
    }

    /// Coefficient of component `ia` in the formation reaction of
    /// non-component species `i_nc` (`0..nx+n_solids`).
    #[inline]
    pub fn coefficient(&self, i_nc: usize, ia: usize) -> f64 {
        self.stoich[(i_nc, ia)]
    }

    /// Full stoichiometric matrix, one row per non-component species.
    pub fn stoichiometry(&self) -> &DMatrix<f64> {
        &self.stoich
    }

    /// log10 formation constant of non-component species `i_nc`.
    #[inline]
    pub fn log_k(&self, i_nc: usize) -> f64 {
        self.log_k[i_nc]
    }

    /// ln formation constant of non-component species `i_nc`.
    #[inline]
    pub fn ln_k(&self, i_nc: usize) -> f64 {
        self.log_k[i_nc] * LN10
    }

    /// Charge of species `i` (species index). Solids are neutral.
    #[inline]
    pub fn charge(&self, i: usize) -> f64 {
        self.charge[i]
    }

    pub fn charges(&self) -> &[f64] {
        &self.charge
    }

    /// Whether species `i` is left out of ionic strength, Σm and activity
    /// bookkeeping. Solids always are.
    #[inline]
    pub fn is_excluded(&self, i: usize) -> bool {
        i >= self.aqueous_count() || self.excluded[i]
    }

    pub fn excluded_flags(&self) -> &[bool] {
        &self.excluded
    }

    /// Species index of liquid water, if the system has it.
    #[inline]
    pub fn water_index(&self) -> Option<usize> {
        self.water
    }

    pub fn name(&self, i: usize) -> &str {
        &self.names[i]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn kind(&self, i: usize) -> SpeciesKind {
        if i < self.na {
            SpeciesKind::Component
        } else if i < self.aqueous_count() {
            SpeciesKind::Complex
        } else {
            SpeciesKind::Solid
        }
    }

    /// Species index of the first species whose name normalises like `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        let key = crate::normalize_species_name(name);
        self.names
            .iter()
            .position(|n| crate::normalize_species_name(n) == key)
    }

    /// Species index of non-component `i_nc`.
    #[inline]
    pub fn species_of_reaction(&self, i_nc: usize) -> usize {
        self.na + i_nc
    }

    /// Solid `s` (`0..n_solids`) as a non-component index.
    #[inline]
    pub fn reaction_of_solid(&self, s: usize) -> usize {
        self.nx + s
    }
}
