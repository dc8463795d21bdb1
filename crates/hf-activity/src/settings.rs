//! Activity model selection and ionic-strength policy.

use hf_core::units::{Pressure, Temperature, bar, celsius, constants};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Upper bound for a caller-supplied ionic strength [mol/kg].
pub const MAX_IONIC_STRENGTH: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ActivityModelKind {
    /// All activity coefficients are one.
    Ideal,
    #[default]
    Davies,
    /// Specific ion interaction theory.
    Sit,
    /// Simplified Helgeson–Kirkham–Flowers.
    Hkf,
}

impl fmt::Display for ActivityModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ideal => write!(f, "ideal"),
            Self::Davies => write!(f, "Davies"),
            Self::Sit => write!(f, "SIT"),
            Self::Hkf => write!(f, "HKF"),
        }
    }
}

/// How the ionic strength of a solve is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum IonicStrength {
    /// I = 0: every activity coefficient is one.
    #[default]
    Ideal,
    /// Computed from the concentrations and charges.
    Calculated,
    /// Held at the given value [mol/kg].
    Fixed(f64),
}

impl IonicStrength {
    /// Read the conventional single-number encoding: NaN or 0 is ideal,
    /// negative asks for calculation, positive is fixed (at most 200).
    pub fn from_raw(value: f64) -> Self {
        if value.is_nan() || value == 0.0 {
            Self::Ideal
        } else if value < 0.0 {
            Self::Calculated
        } else {
            Self::Fixed(value.min(MAX_IONIC_STRENGTH))
        }
    }

    /// Inverse of [`from_raw`](Self::from_raw).
    pub fn to_raw(self) -> f64 {
        match self {
            Self::Ideal => 0.0,
            Self::Calculated => -1.0,
            Self::Fixed(v) => v,
        }
    }
}

/// Settings for constructing an [`ActivityModel`](crate::ActivityModel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySettings {
    pub kind: ActivityModelKind,
    pub temperature: Temperature,
    pub pressure: Pressure,
    /// Directories searched for the SIT coefficient file, in increasing
    /// priority. At most three are used.
    pub sit_paths: Vec<PathBuf>,
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            kind: ActivityModelKind::Davies,
            temperature: celsius(constants::T_REF_C),
            pressure: bar(constants::P_REF_BAR),
            sit_paths: Vec::new(),
        }
    }
}
