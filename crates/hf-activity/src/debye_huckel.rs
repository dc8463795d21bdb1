//! Debye–Hückel parameters and the HKF correlations.

use crate::error::{ActivityError, ActivityResult};
use crate::water::WaterProperties;
use hf_core::units::{Pressure, Temperature, to_bar, to_celsius, to_g_per_cm3};

/// Envelope of the HKF correlations and of the activity model as a whole.
pub const T_RANGE_C: (f64, f64) = (-35.0, 1000.0);
pub const P_RANGE_BAR: (f64, f64) = (0.0, 5000.0);

/// Distance of closest approach of Na+ and Cl- [Å], before the g correction.
pub const A_DOT_NACL: f64 = 3.72;

/// Debye–Hückel parameters at one temperature and pressure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebyeHuckel {
    /// Water density [g/cm³]
    pub density: f64,
    pub dielectric: f64,
    /// A [kg^½ mol^-½], log10 basis
    pub a: f64,
    /// B [kg^½ mol^-½ Å^-1]
    pub b: f64,
}

impl DebyeHuckel {
    pub fn new(t: Temperature, p: Pressure, water: &dyn WaterProperties) -> ActivityResult<Self> {
        let density = to_g_per_cm3(water.density(t, p)?);
        let dielectric = water.dielectric_constant(t, p)?;
        Ok(Self::from_water(t.value, density, dielectric))
    }

    /// From temperature [K], density [g/cm³] and relative permittivity.
    pub fn from_water(t_k: f64, density: f64, dielectric: f64) -> Self {
        let et = dielectric * t_k;
        let sqrt_rho = density.sqrt();
        Self {
            density,
            dielectric,
            a: 1.824_928e6 * sqrt_rho / et.powf(1.5),
            b: 50.291_58 * sqrt_rho / et.sqrt(),
        }
    }
}

fn check_envelope(t_c: f64, p_bar: f64) -> ActivityResult<()> {
    if !(T_RANGE_C.0..=T_RANGE_C.1).contains(&t_c) {
        return Err(ActivityError::Range {
            what: "temperature (°C)",
            value: t_c,
        });
    }
    if !(P_RANGE_BAR.0..=P_RANGE_BAR.1).contains(&p_bar) {
        return Err(ActivityError::Range {
            what: "pressure (bar)",
            value: p_bar,
        });
    }
    Ok(())
}

/// Extended-term parameter bγ of NaCl solutions [kg/mol].
///
/// Smooth fit of the HKF values: 0.064 at 25 °C, a shallow maximum near
/// 100 °C and a steady decline towards the critical region.
pub fn b_gamma_nacl(t: Temperature, p: Pressure) -> ActivityResult<f64> {
    let t_c = to_celsius(t);
    let p_bar = to_bar(p);
    check_envelope(t_c, p_bar)?;
    let d = t_c - 25.0;
    Ok(0.0642 + 7.0e-5 * d - 1.0e-6 * d * d / (1.0 + d / 600.0) + 1.0e-6 * (p_bar - 1.0))
}

/// Solvent function g [Å] of Shock et al. (1992).
///
/// `density` in g/cm³. Zero for densities of 1 g/cm³ and above.
pub fn g_function(t: Temperature, p: Pressure, density: f64) -> ActivityResult<f64> {
    let t_c = to_celsius(t);
    let p_bar = to_bar(p);
    check_envelope(t_c, p_bar)?;
    if density >= 1.0 {
        return Ok(0.0);
    }

    let a_g = -2.037_662 + 5.747_000e-3 * t_c - 6.557_892e-6 * t_c * t_c;
    let b_g = 6.107_361 - 1.074_377e-2 * t_c + 1.268_348e-5 * t_c * t_c;
    let mut g = a_g * (1.0 - density).powf(b_g);

    if t_c > 155.0 && t_c < 355.0 && p_bar < 1000.0 {
        let x = (t_c - 155.0) / 300.0;
        let dp = 1000.0 - p_bar;
        let f = (x.powf(4.8) + 36.666_66 * x.powi(16))
            * (-1.504_956e-10 * dp.powi(3) + 5.017_997e-14 * dp.powi(4));
        g -= f;
    }
    Ok(g)
}
