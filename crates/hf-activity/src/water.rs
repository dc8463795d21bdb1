//! Density and dielectric constant of liquid water.

use crate::error::{ActivityError, ActivityResult};
use hf_core::units::{Density, Pressure, Temperature, kgm3, to_bar, to_celsius};
use std::fmt::Debug;

/// Water properties consumed by the activity models.
///
/// Implementations are pure functions of temperature and pressure. A value
/// outside the implementation's envelope is an [`ActivityError::Range`].
pub trait WaterProperties: Send + Sync + Debug {
    fn density(&self, t: Temperature, p: Pressure) -> ActivityResult<Density>;

    /// Relative permittivity (dimensionless).
    fn dielectric_constant(&self, t: Temperature, p: Pressure) -> ActivityResult<f64>;
}

/// Liquid water from −35 to 350 °C and 0 to 5000 bar.
///
/// Density: Wagner–Pruß saturated-liquid equation with a linear compressibility
/// correction above the saturation pressure. Dielectric constant:
/// Bradley–Pitzer (1979).
#[derive(Debug, Clone, Copy, Default)]
pub struct LiquidWater;

const T_CRIT_K: f64 = 647.096;
const RHO_CRIT: f64 = 322.0;
const P_CRIT_BAR: f64 = 220.64;
/// Isothermal compressibility [1/bar].
const COMPRESSIBILITY: f64 = 4.5e-5;

const T_MIN_C: f64 = -35.0;
const T_MAX_C: f64 = 350.0;
const P_MAX_BAR: f64 = 5000.0;

const RHO_B: [f64; 6] = [
    1.992_740_64,
    1.099_653_42,
    -0.510_839_303,
    -1.754_934_79,
    -45.517_035_2,
    -6.746_944_50e5,
];
const RHO_EXP: [f64; 6] = [
    1.0 / 3.0,
    2.0 / 3.0,
    5.0 / 3.0,
    16.0 / 3.0,
    43.0 / 3.0,
    110.0 / 3.0,
];

const PSAT_A: [f64; 6] = [
    -7.859_517_83,
    1.844_082_59,
    -11.786_649_7,
    22.680_741_1,
    -15.961_871_9,
    1.801_225_02,
];
const PSAT_EXP: [f64; 6] = [1.0, 1.5, 3.0, 3.5, 4.0, 7.5];

const BP_U: [f64; 9] = [
    3.4279e2, -5.0866e-3, 9.4690e-7, -2.0525, 3.1159e3, -1.8289e2, -8.0325e3, 4.2142e6, 2.1417,
];

impl LiquidWater {
    fn check(&self, t: Temperature, p: Pressure) -> ActivityResult<(f64, f64)> {
        let tc = to_celsius(t);
        let pb = to_bar(p);
        if !(T_MIN_C..=T_MAX_C).contains(&tc) {
            return Err(ActivityError::Range {
                what: "water temperature (°C)",
                value: tc,
            });
        }
        if !(0.0..=P_MAX_BAR).contains(&pb) {
            return Err(ActivityError::Range {
                what: "water pressure (bar)",
                value: pb,
            });
        }
        Ok((t.value, pb))
    }

    /// Saturation pressure [bar].
    pub fn saturation_pressure(t_k: f64) -> f64 {
        if t_k >= T_CRIT_K {
            return P_CRIT_BAR;
        }
        let tau = 1.0 - t_k / T_CRIT_K;
        let sum: f64 = PSAT_A
            .iter()
            .zip(PSAT_EXP)
            .map(|(a, e)| a * tau.powf(e))
            .sum();
        P_CRIT_BAR * (T_CRIT_K / t_k * sum).exp()
    }

    /// Saturated-liquid density [kg/m³].
    pub fn saturated_density(t_k: f64) -> f64 {
        let tau = (1.0 - t_k / T_CRIT_K).max(0.0);
        let sum: f64 = RHO_B
            .iter()
            .zip(RHO_EXP)
            .map(|(b, e)| b * tau.powf(e))
            .sum();
        RHO_CRIT * (1.0 + sum)
    }
}

impl WaterProperties for LiquidWater {
    fn density(&self, t: Temperature, p: Pressure) -> ActivityResult<Density> {
        let (t_k, p_bar) = self.check(t, p)?;
        let excess = (p_bar - Self::saturation_pressure(t_k)).max(0.0);
        Ok(kgm3(
            Self::saturated_density(t_k) * (1.0 + COMPRESSIBILITY * excess),
        ))
    }

    fn dielectric_constant(&self, t: Temperature, p: Pressure) -> ActivityResult<f64> {
        let (t_k, p_bar) = self.check(t, p)?;
        let u = &BP_U;
        let eps_1000 = u[0] * (u[1] * t_k + u[2] * t_k * t_k).exp();
        let c = u[3] + u[4] / (u[5] + t_k);
        let b = u[6] + u[7] / t_k + u[8] * t_k;
        Ok(eps_1000 + c * ((b + p_bar) / (b + 1000.0)).ln())
    }
}
