//! Converged solution state kept between solves.

use crate::flags::SolveFlags;
use hf_activity::AqueousProperties;

/// Internal state of a converged point.
///
/// The solver keeps the last one it committed and uses it as the starting
/// guess when a request asks for continuation and the point is continuable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolutionState {
    /// ln activity per aqueous species
    pub ln_a: Vec<f64>,
    /// Concentration per aqueous species [mol/kg]
    pub conc: Vec<f64>,
    /// ln activity coefficient per aqueous species
    pub ln_g: Vec<f64>,
    /// Admitted-solid mask
    pub present: Vec<bool>,
    /// Amount of each solid [mol/kg], zero when absent
    pub solid_amount: Vec<f64>,
    pub properties: AqueousProperties,
    pub flags: SolveFlags,
}

impl SolutionState {
    pub fn new(aqueous: usize, solids: usize) -> Self {
        Self {
            ln_a: vec![0.0; aqueous],
            conc: vec![0.0; aqueous],
            ln_g: vec![0.0; aqueous],
            present: vec![false; solids],
            solid_amount: vec![0.0; solids],
            properties: AqueousProperties::ideal(),
            flags: SolveFlags::empty(),
        }
    }

    pub fn is_continuable(&self) -> bool {
        self.flags.is_continuable()
    }

    pub fn present_solids(&self) -> impl Iterator<Item = usize> + '_ {
        self.present
            .iter()
            .enumerate()
            .filter(|(_, p)| **p)
            .map(|(s, _)| s)
    }
}
