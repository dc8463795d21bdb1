//! Warning flags accumulated during a solve.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recoverable anomaly. The discriminant is the conventional error number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SolveFlag {
    /// Round-off stalled the root search of some component; accepted anyway.
    RoundOff = 1,
    MassBalanceIterations = 2,
    NoConsistentSolids = 3,
    SolidIterations = 4,
    /// Some aqueous concentration exceeds the plausibility ceiling.
    ImplausibleConcentration = 5,
    ActivityNotConverged = 6,
    Cancelled = 7,
}

impl SolveFlag {
    pub const ALL: [SolveFlag; 7] = [
        SolveFlag::RoundOff,
        SolveFlag::MassBalanceIterations,
        SolveFlag::NoConsistentSolids,
        SolveFlag::SolidIterations,
        SolveFlag::ImplausibleConcentration,
        SolveFlag::ActivityNotConverged,
        SolveFlag::Cancelled,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    fn bit(self) -> u8 {
        1 << (self.code() - 1)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::RoundOff => "round-off uncertainty in a component",
            Self::MassBalanceIterations => "mass-balance iteration ceiling exceeded",
            Self::NoConsistentSolids => "no consistent solid-phase combination",
            Self::SolidIterations => "solid-phase search ceiling exceeded",
            Self::ImplausibleConcentration => "implausibly large concentration",
            Self::ActivityNotConverged => "activity coefficients did not converge",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Set of [`SolveFlag`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolveFlags(u8);

impl SolveFlags {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, flag: SolveFlag) {
        self.0 |= flag.bit();
    }

    pub fn contains(&self, flag: SolveFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn merge(&mut self, other: SolveFlags) {
        self.0 |= other.0;
    }

    pub fn iter(&self) -> impl Iterator<Item = SolveFlag> + '_ {
        SolveFlag::ALL.into_iter().filter(|f| self.contains(*f))
    }

    /// Safe to warm-start the next point from: none of flags 2, 3, 4, 6, 7.
    pub fn is_continuable(&self) -> bool {
        !(self.contains(SolveFlag::MassBalanceIterations)
            || self.contains(SolveFlag::NoConsistentSolids)
            || self.contains(SolveFlag::SolidIterations)
            || self.contains(SolveFlag::ActivityNotConverged)
            || self.contains(SolveFlag::Cancelled))
    }
}

impl fmt::Display for SolveFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let codes: Vec<String> = self.iter().map(|fl| fl.code().to_string()).collect();
        write!(f, "{}", codes.join(","))
    }
}

impl FromIterator<SolveFlag> for SolveFlags {
    fn from_iter<T: IntoIterator<Item = SolveFlag>>(iter: T) -> Self {
        let mut flags = Self::empty();
        for f in iter {
            flags.insert(f);
        }
        flags
    }
}
