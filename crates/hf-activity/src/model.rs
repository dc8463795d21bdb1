//! Activity coefficient models.
//!
//! `ln_activity_coefficients` is called once per outer iteration of the
//! equilibrium solver. It does not allocate once the model is built (the SIT
//! table is read on first use).

use crate::debye_huckel::{A_DOT_NACL, DebyeHuckel, P_RANGE_BAR, T_RANGE_C, b_gamma_nacl, g_function};
use crate::error::{ActivityError, ActivityResult};
use crate::settings::{ActivityModelKind, ActivitySettings, IonicStrength, MAX_IONIC_STRENGTH};
use crate::sit::{EpsilonTable, fold, load_epsilon_table};
use crate::water::{LiquidWater, WaterProperties};
use hf_core::numeric::{LN10, clamp_conc};
use hf_core::units::{Pressure, Temperature, constants::MOL_WATER_PER_KG, to_bar, to_celsius};
use hf_system::ChemicalSystem;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

/// Concentration ceiling inside the activity models [mol/kg].
pub const MAX_CONC: f64 = 20.0;

/// Bound on |log10 a_w|.
pub const MAX_LOG_WATER_ACTIVITY: f64 = 3.999;

const T_RECOMPUTE_C: f64 = 0.1;
const P_RECOMPUTE_REL: f64 = 1.0e-3;
const I_RECOMPUTE_REL: f64 = 1.0e-3;

/// SIT ion-size term `ρB` in `1 + ρB·√I`.
const SIT_RHO_B: f64 = 1.5;

/// Bulk properties of the aqueous phase returned with each evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AqueousProperties {
    /// Ionic strength used [mol/kg]
    pub ionic_strength: f64,
    /// Σ z·m over the real species [mol/kg]
    pub electric_balance: f64,
    /// Σ m including the fictive ions [mol/kg]
    pub sum_molalities: f64,
    pub osmotic_coefficient: f64,
    pub log10_water_activity: f64,
}

impl AqueousProperties {
    pub fn ideal() -> Self {
        Self {
            ionic_strength: 0.0,
            electric_balance: 0.0,
            sum_molalities: 0.0,
            osmotic_coefficient: 1.0,
            log10_water_activity: 0.0,
        }
    }
}

impl Default for AqueousProperties {
    fn default() -> Self {
        Self::ideal()
    }
}

/// Temperature and pressure dependent terms.
#[derive(Debug, Clone, Copy)]
struct Conditions {
    t_c: f64,
    p_bar: f64,
    dh: DebyeHuckel,
    /// HKF only
    a_dot_b: f64,
    b_gamma: f64,
}

/// Ionic strength dependent terms, reused while I moves by ≤ 0.1 %.
#[derive(Debug, Clone, Copy)]
struct IonicTerms {
    i: f64,
    /// Davies: √I/(1+√I) − 0.3·I. HKF: √I/(1+åB·√I).
    dh: f64,
    /// HKF: Γ + bγ·I
    extra: f64,
}

#[derive(Debug, Clone)]
pub struct ActivityModel {
    settings: ActivitySettings,
    names: Vec<String>,
    charges: Vec<f64>,
    z2: Vec<f64>,
    /// Left out of I, Σm and coefficients: excluded species and water.
    skip: Vec<bool>,
    water: Option<usize>,
    provider: Arc<dyn WaterProperties>,
    conditions: Option<Conditions>,
    ionic_cache: Option<IonicTerms>,
    sit: Option<EpsilonTable>,
    /// ε at the current temperature, fold order
    eps_now: Vec<f64>,
    eps_t_c: f64,
    /// molalities including the fictive Na+ and Cl-
    m: Vec<f64>,
}

fn check_conditions(t: Temperature, p: Pressure) -> ActivityResult<(f64, f64)> {
    let t_c = to_celsius(t);
    let p_bar = to_bar(p);
    if !(T_RANGE_C.0..=T_RANGE_C.1).contains(&t_c) {
        return Err(ActivityError::Configuration {
            what: format!("temperature {t_c} °C outside {}..{} °C", T_RANGE_C.0, T_RANGE_C.1),
        });
    }
    if !(P_RANGE_BAR.0..=P_RANGE_BAR.1).contains(&p_bar) {
        return Err(ActivityError::Configuration {
            what: format!("pressure {p_bar} bar outside {}..{} bar", P_RANGE_BAR.0, P_RANGE_BAR.1),
        });
    }
    Ok((t_c, p_bar))
}

impl ActivityModel {
    /// Model for the aqueous species (components and complexes) of `system`.
    ///
    /// Water properties come from the bundled [`LiquidWater`], which covers
    /// −35 to 350 °C. Conditions are accepted up to 1000 °C, but above 350 °C
    /// every non-ideal model returns [`ActivityError::Range`] unless a provider
    /// valid there is passed to [`with_provider`](Self::with_provider).
    pub fn new(system: &ChemicalSystem, settings: ActivitySettings) -> ActivityResult<Self> {
        let n = system.aqueous_count();
        Self::from_parts(
            &system.names()[..n],
            &system.charges()[..n],
            &system.excluded_flags()[..n],
            system.water_index(),
            settings,
        )
    }

    pub fn from_parts(
        names: &[String],
        charges: &[f64],
        excluded: &[bool],
        water: Option<usize>,
        settings: ActivitySettings,
    ) -> ActivityResult<Self> {
        Self::with_provider(names, charges, excluded, water, settings, Arc::new(LiquidWater))
    }

    /// Like [`from_parts`](Self::from_parts) with a caller-supplied water
    /// property provider.
    pub fn with_provider(
        names: &[String],
        charges: &[f64],
        excluded: &[bool],
        water: Option<usize>,
        settings: ActivitySettings,
        provider: Arc<dyn WaterProperties>,
    ) -> ActivityResult<Self> {
        let n = names.len();
        if n == 0 {
            return Err(ActivityError::Configuration {
                what: "no aqueous species".into(),
            });
        }
        hf_core::ensure_len(charges.len(), n, "species charges")?;
        hf_core::ensure_len(excluded.len(), n, "exclusion flags")?;
        if let Some(w) = water {
            if w >= n {
                return Err(hf_core::HfError::IndexOob {
                    what: "water species",
                    index: w,
                    len: n,
                }
                .into());
            }
        }
        for &z in charges {
            hf_core::ensure_finite(z, "species charge")?;
        }
        check_conditions(settings.temperature, settings.pressure)?;

        let skip: Vec<bool> = (0..n).map(|i| excluded[i] || Some(i) == water).collect();
        let mut model = Self {
            names: names.to_vec(),
            charges: charges.to_vec(),
            z2: charges.iter().map(|z| z * z).collect(),
            skip,
            water,
            provider,
            conditions: None,
            ionic_cache: None,
            sit: None,
            eps_now: Vec::new(),
            eps_t_c: f64::NAN,
            m: vec![0.0; n + 2],
            settings,
        };
        if model.settings.kind != ActivityModelKind::Ideal {
            model.refresh_conditions()?;
        }
        debug!(kind = %model.settings.kind, species = n, "activity model ready");
        Ok(model)
    }

    pub fn kind(&self) -> ActivityModelKind {
        self.settings.kind
    }

    pub fn settings(&self) -> &ActivitySettings {
        &self.settings
    }

    pub fn species_count(&self) -> usize {
        self.names.len()
    }

    pub fn water_index(&self) -> Option<usize> {
        self.water
    }

    /// Debye–Hückel A at the current conditions (0 for the ideal model).
    pub fn debye_huckel_a(&self) -> f64 {
        self.conditions.map_or(0.0, |c| c.dh.a)
    }

    pub fn epsilon_table(&self) -> Option<&EpsilonTable> {
        self.sit.as_ref()
    }

    /// Install an already loaded ε table instead of reading the search paths.
    pub fn set_epsilon_table(&mut self, table: EpsilonTable) -> ActivityResult<()> {
        hf_core::ensure_len(table.size(), self.names.len() + 2, "SIT table size")?;
        self.sit = Some(table);
        self.eps_t_c = f64::NAN;
        Ok(())
    }

    /// Forget the ionic-strength cache so the next evaluation recomputes
    /// every term.
    pub fn reset_cache(&mut self) {
        self.ionic_cache = None;
    }

    /// Move to new conditions. Water properties are evaluated here, so a
    /// temperature outside the provider's range fails with
    /// [`ActivityError::Range`]. Cached terms are refreshed only when T moved
    /// by more than 0.1 °C or P by more than 0.1 %.
    pub fn set_conditions(&mut self, t: Temperature, p: Pressure) -> ActivityResult<()> {
        let (t_c, p_bar) = check_conditions(t, p)?;
        let moved = match self.conditions {
            None => true,
            Some(c) => {
                (t_c - c.t_c).abs() > T_RECOMPUTE_C
                    || (p_bar - c.p_bar).abs() > P_RECOMPUTE_REL * c.p_bar.abs().max(f64::MIN_POSITIVE)
            }
        };
        self.settings.temperature = t;
        self.settings.pressure = p;
        if moved && self.settings.kind != ActivityModelKind::Ideal {
            self.refresh_conditions()?;
        }
        Ok(())
    }

    fn refresh_conditions(&mut self) -> ActivityResult<()> {
        let t = self.settings.temperature;
        let p = self.settings.pressure;
        let dh = DebyeHuckel::new(t, p, self.provider.as_ref())?;
        let (a_dot_b, b_gamma) = if self.settings.kind == ActivityModelKind::Hkf {
            let g = g_function(t, p, dh.density)?;
            ((A_DOT_NACL + 2.0 * g) * dh.b, b_gamma_nacl(t, p)?)
        } else {
            (0.0, 0.0)
        };
        let cond = Conditions {
            t_c: to_celsius(t),
            p_bar: to_bar(p),
            dh,
            a_dot_b,
            b_gamma,
        };
        trace!(t_c = cond.t_c, p_bar = cond.p_bar, a = dh.a, b = dh.b, "activity conditions refreshed");
        self.conditions = Some(cond);
        self.ionic_cache = None;
        Ok(())
    }

    fn ensure_sit(&mut self, t_c: f64) -> ActivityResult<()> {
        if self.sit.is_none() {
            let table = load_epsilon_table(&self.settings.sit_paths, &self.names, &self.charges)?;
            self.sit = Some(table);
            self.eps_t_c = f64::NAN;
        }
        if self.eps_t_c != t_c {
            if let Some(table) = &self.sit {
                table.evaluate_into(t_c + hf_core::units::ZERO_CELSIUS_K, &mut self.eps_now);
            }
            self.eps_t_c = t_c;
        }
        Ok(())
    }

    /// Natural-log activity coefficients of every aqueous species into `ln_f`.
    ///
    /// The water entry, when present, receives ln a_w itself. Excluded species
    /// get 0.
    pub fn ln_activity_coefficients(
        &mut self,
        conc: &[f64],
        ionic_strength: IonicStrength,
        ln_f: &mut [f64],
    ) -> ActivityResult<AqueousProperties> {
        let n = self.names.len();
        if conc.len() < n || ln_f.len() < n {
            return Err(ActivityError::Configuration {
                what: format!(
                    "buffers shorter than the {n} aqueous species (conc {}, ln_f {})",
                    conc.len(),
                    ln_f.len()
                ),
            });
        }
        let ln_f = &mut ln_f[..n];
        ln_f.fill(0.0);

        let cond = match (self.settings.kind, self.conditions) {
            (ActivityModelKind::Ideal, _) | (_, None) => return Ok(AqueousProperties::ideal()),
            (_, Some(c)) => c,
        };
        if ionic_strength == IonicStrength::Ideal {
            return Ok(AqueousProperties::ideal());
        }

        // Real species
        let mut e = 0.0;
        let mut i2 = 0.0;
        let mut sum_m = 0.0;
        for i in 0..n {
            if self.skip[i] {
                self.m[i] = 0.0;
                continue;
            }
            let m = clamp_conc(conc[i], MAX_CONC);
            self.m[i] = m;
            e += self.charges[i] * m;
            i2 += self.z2[i] * m;
            sum_m += m;
        }

        // Fictive counter-ions restore electroneutrality and carry any
        // background electrolyte of a fixed ionic strength.
        let (mut na_f, mut cl_f) = if e < 0.0 { (-e, 0.0) } else { (0.0, e) };
        let i_calc = 0.5 * (i2 + e.abs());
        let ionic = match ionic_strength {
            IonicStrength::Fixed(v) => {
                let v = v.min(MAX_IONIC_STRENGTH);
                let background = (v - i_calc).max(0.0);
                na_f += background;
                cl_f += background;
                v
            }
            _ => i_calc,
        };
        self.m[n] = na_f;
        self.m[n + 1] = cl_f;
        sum_m += na_f + cl_f;

        if !(ionic > 0.0) {
            return Ok(AqueousProperties {
                electric_balance: e,
                ..AqueousProperties::ideal()
            });
        }

        let a = cond.dh.a;
        let sqrt_i = ionic.sqrt();
        let (rho_b, extra_phi) = match self.settings.kind {
            ActivityModelKind::Davies => {
                let terms = self.ionic_terms(ionic, |i| {
                    let s = i.sqrt();
                    (s / (1.0 + s) - 0.3 * i, 0.0)
                });
                for i in 0..n {
                    if self.skip[i] || self.z2[i] == 0.0 {
                        continue;
                    }
                    let bound = 3.0 * self.z2[i];
                    let log_f = (-a * self.z2[i] * terms.dh).clamp(-bound, bound);
                    ln_f[i] = log_f * LN10;
                }
                (1.0, LN10 * 0.3 * a * ionic * ionic)
            }
            ActivityModelKind::Hkf => {
                let a_dot_b = cond.a_dot_b;
                let b_gamma = cond.b_gamma;
                let terms = self.ionic_terms(ionic, |i| {
                    let s = i.sqrt();
                    (
                        s / (1.0 + a_dot_b * s),
                        -(1.0 + 0.018_015_3 * i).log10() + b_gamma * i,
                    )
                });
                for i in 0..n {
                    if self.skip[i] || self.z2[i] == 0.0 {
                        continue;
                    }
                    let bound = 3.0 * self.z2[i];
                    let log_f = (-a * self.z2[i] * terms.dh + terms.extra).clamp(-bound, bound);
                    ln_f[i] = log_f * LN10;
                }
                (a_dot_b, LN10 * b_gamma * ionic * sum_m / 2.0)
            }
            ActivityModelKind::Sit => {
                self.ensure_sit(cond.t_c)?;
                let dh = sqrt_i / (1.0 + SIT_RHO_B * sqrt_i);
                let size = n + 2;
                let mut pair_sum = 0.0;
                for i in 0..size {
                    let mut eps_m = 0.0;
                    for j in 0..size {
                        eps_m += self.eps_now[fold(i, j)] * self.m[j];
                    }
                    // Σ_{i<j} ε m_i m_j + ½ Σ ε_ii m_i² = ½ Σ_i m_i Σ_j ε_ij m_j
                    pair_sum += 0.5 * self.m[i] * eps_m;
                    if i >= n || self.skip[i] {
                        continue;
                    }
                    let z2 = self.z2[i];
                    let bound = 3.0 * z2.max(1.0);
                    let log_f = (-a * z2 * dh + eps_m).clamp(-bound, bound);
                    ln_f[i] = log_f * LN10;
                }
                (SIT_RHO_B, LN10 * pair_sum)
            }
            ActivityModelKind::Ideal => (1.0, 0.0),
        };

        let osmotic = if sum_m > 0.0 {
            let x = rho_b * sqrt_i;
            let bracket = 1.0 + x - 1.0 / (1.0 + x) - 2.0 * (1.0 + x).ln();
            1.0 - 2.0 * LN10 * a * bracket / (rho_b.powi(3) * sum_m) + extra_phi / sum_m
        } else {
            1.0
        };

        let log_aw = (-osmotic * sum_m / MOL_WATER_PER_KG / LN10)
            .clamp(-MAX_LOG_WATER_ACTIVITY, MAX_LOG_WATER_ACTIVITY);
        if let Some(w) = self.water {
            ln_f[w] = log_aw * LN10;
        }

        Ok(AqueousProperties {
            ionic_strength: ionic,
            electric_balance: e,
            sum_molalities: sum_m,
            osmotic_coefficient: osmotic,
            log10_water_activity: log_aw,
        })
    }

    fn ionic_terms(&mut self, ionic: f64, compute: impl FnOnce(f64) -> (f64, f64)) -> IonicTerms {
        if let Some(c) = self.ionic_cache {
            if (ionic - c.i).abs() <= I_RECOMPUTE_REL * c.i {
                return c;
            }
        }
        let (dh, extra) = compute(ionic);
        let terms = IonicTerms { i: ionic, dh, extra };
        self.ionic_cache = Some(terms);
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_core::units::{bar, celsius};

    fn nacl(kind: ActivityModelKind) -> ActivityModel {
        let names = vec!["Na+".to_string(), "Cl-".to_string(), "H2O".to_string()];
        ActivityModel::from_parts(
            &names,
            &[1.0, -1.0, 0.0],
            &[false, false, false],
            Some(2),
            ActivitySettings {
                kind,
                ..ActivitySettings::default()
            },
        )
        .unwrap()
    }

    fn davies_log_f(a: f64, z: f64, i: f64) -> f64 {
        let s = i.sqrt();
        -a * z * z * (s / (1.0 + s) - 0.3 * i)
    }

    #[test]
    fn ideal_kind_is_all_zero() {
        let mut model = nacl(ActivityModelKind::Ideal);
        let mut ln_f = [9.0; 3];
        let props = model
            .ln_activity_coefficients(&[0.1, 0.1, 1.0], IonicStrength::Calculated, &mut ln_f)
            .unwrap();
        assert_eq!(ln_f, [0.0; 3]);
        assert_eq!(props.osmotic_coefficient, 1.0);
    }

    #[test]
    fn zero_ionic_strength_is_ideal() {
        let mut model = nacl(ActivityModelKind::Davies);
        let mut ln_f = [9.0; 3];
        let props = model
            .ln_activity_coefficients(&[0.1, 0.1, 1.0], IonicStrength::from_raw(0.0), &mut ln_f)
            .unwrap();
        assert_eq!(ln_f, [0.0; 3]);
        assert_eq!(props.osmotic_coefficient, 1.0);
        assert_eq!(props.log10_water_activity, 0.0);
    }

    #[test]
    fn davies_matches_closed_form() {
        let mut model = nacl(ActivityModelKind::Davies);
        let a = model.debye_huckel_a();
        let mut ln_f = [0.0; 3];
        let props = model
            .ln_activity_coefficients(&[0.1, 0.1, 1.0], IonicStrength::Calculated, &mut ln_f)
            .unwrap();
        assert!((props.ionic_strength - 0.1).abs() < 1e-12);
        assert!(props.electric_balance.abs() < 1e-15);
        let expected = davies_log_f(a, 1.0, 0.1);
        assert!((ln_f[0] / LN10 - expected).abs() < 1e-6);
        assert!((ln_f[1] / LN10 - expected).abs() < 1e-6);
        assert!(props.osmotic_coefficient < 1.0 && props.osmotic_coefficient > 0.9);
        assert!(props.log10_water_activity < 0.0);
        assert!((ln_f[2] - props.log10_water_activity * LN10).abs() < 1e-15);
    }

    #[test]
    fn counter_ion_restores_neutrality() {
        let mut model = nacl(ActivityModelKind::Davies);
        let mut ln_f = [0.0; 3];
        let props = model
            .ln_activity_coefficients(&[0.0, 0.2, 1.0], IonicStrength::Calculated, &mut ln_f)
            .unwrap();
        assert!((props.electric_balance + 0.2).abs() < 1e-15);
        assert!((props.ionic_strength - 0.2).abs() < 1e-12);
        assert!((props.sum_molalities - 0.4).abs() < 1e-12);
    }

    #[test]
    fn concentrations_are_clamped() {
        let mut model = nacl(ActivityModelKind::Davies);
        let mut ln_f = [0.0; 3];
        let props = model
            .ln_activity_coefficients(&[1.0e6, 1.0e6, 1.0], IonicStrength::Calculated, &mut ln_f)
            .unwrap();
        assert!((props.ionic_strength - MAX_CONC).abs() < 1e-9);
        assert!(props.log10_water_activity >= -MAX_LOG_WATER_ACTIVITY);
        for v in &ln_f[..2] {
            assert!(v.abs() <= 3.0 * LN10 + 1e-12);
        }
    }

    #[test]
    fn fixed_ionic_strength_is_used() {
        let mut model = nacl(ActivityModelKind::Davies);
        let a = model.debye_huckel_a();
        let mut ln_f = [0.0; 3];
        let props = model
            .ln_activity_coefficients(&[1e-6, 1e-6, 1.0], IonicStrength::from_raw(0.5), &mut ln_f)
            .unwrap();
        assert_eq!(props.ionic_strength, 0.5);
        assert!((props.sum_molalities - 1.0).abs() < 1e-5);
        assert!((ln_f[0] / LN10 - davies_log_f(a, 1.0, 0.5)).abs() < 1e-9);
    }

    #[test]
    fn davies_cache_tolerates_small_moves() {
        let mut model = nacl(ActivityModelKind::Davies);
        let mut first = [0.0; 3];
        let mut second = [0.0; 3];
        model
            .ln_activity_coefficients(&[0.1, 0.1, 1.0], IonicStrength::Fixed(0.1), &mut first)
            .unwrap();
        model
            .ln_activity_coefficients(&[0.1, 0.1, 1.0], IonicStrength::Fixed(0.10005), &mut second)
            .unwrap();
        assert_eq!(first[0], second[0]);
    }

    #[test]
    fn hkf_limits_to_debye_huckel() {
        let mut model = nacl(ActivityModelKind::Hkf);
        let mut ln_f = [0.0; 3];
        model
            .ln_activity_coefficients(&[1e-4, 1e-4, 1.0], IonicStrength::Calculated, &mut ln_f)
            .unwrap();
        let limiting = -model.debye_huckel_a() * 1e-2;
        assert!((ln_f[0] / LN10 - limiting).abs() < 2e-4);
    }

    #[test]
    fn hkf_neutral_species_are_unity() {
        let names = vec!["Na+".to_string(), "Cl-".to_string(), "CO2".to_string()];
        let mut model = ActivityModel::from_parts(
            &names,
            &[1.0, -1.0, 0.0],
            &[false; 3],
            None,
            ActivitySettings {
                kind: ActivityModelKind::Hkf,
                ..ActivitySettings::default()
            },
        )
        .unwrap();
        let mut ln_f = [0.0; 3];
        model
            .ln_activity_coefficients(&[0.5, 0.5, 0.01], IonicStrength::Calculated, &mut ln_f)
            .unwrap();
        assert_eq!(ln_f[2], 0.0);
        assert!(ln_f[0] < 0.0);
    }

    #[test]
    fn sit_uses_installed_table() {
        let mut model = nacl(ActivityModelKind::Sit);
        let names = vec!["Na+".to_string(), "Cl-".to_string(), "H2O".to_string()];
        let table = EpsilonTable::parse(
            "NoDefaults Na+ Cl- 0.03 0 0 END END END",
            &names,
            &[1.0, -1.0, 0.0],
        )
        .unwrap();
        model.set_epsilon_table(table).unwrap();
        let a = model.debye_huckel_a();
        let mut ln_f = [0.0; 3];
        model
            .ln_activity_coefficients(&[1.0, 1.0, 1.0], IonicStrength::Calculated, &mut ln_f)
            .unwrap();
        let expected = -a / 2.5 + 0.03;
        assert!((ln_f[0] / LN10 - expected).abs() < 1e-9, "{}", ln_f[0] / LN10);
        assert!((ln_f[1] / LN10 - expected).abs() < 1e-9);
    }

    #[test]
    fn sit_without_file_is_an_error() {
        let mut model = nacl(ActivityModelKind::Sit);
        let mut ln_f = [0.0; 3];
        let err = model
            .ln_activity_coefficients(&[0.1, 0.1, 1.0], IonicStrength::Calculated, &mut ln_f)
            .unwrap_err();
        assert!(matches!(err, ActivityError::SitData { .. }));
    }

    #[test]
    fn configuration_errors() {
        let names = vec!["Na+".to_string()];
        let hot = ActivitySettings {
            temperature: celsius(1200.0),
            ..ActivitySettings::default()
        };
        assert!(matches!(
            ActivityModel::from_parts(&names, &[1.0], &[false], None, hot),
            Err(ActivityError::Configuration { .. })
        ));
        assert!(matches!(
            ActivityModel::from_parts(&names, &[1.0, 2.0], &[false], None, ActivitySettings::default()),
            Err(ActivityError::Configuration { .. })
        ));
        assert!(matches!(
            ActivityModel::from_parts(&[], &[], &[], None, ActivitySettings::default()),
            Err(ActivityError::Configuration { .. })
        ));
    }

    #[test]
    fn provider_range_surfaces() {
        let names = vec!["Na+".to_string()];
        let settings = ActivitySettings {
            temperature: celsius(500.0),
            pressure: bar(1000.0),
            ..ActivitySettings::default()
        };
        assert!(matches!(
            ActivityModel::from_parts(&names, &[1.0], &[false], None, settings),
            Err(ActivityError::Range { .. })
        ));
    }

    #[test]
    fn bundled_water_stops_at_350_celsius() {
        let mut model = nacl(ActivityModelKind::Davies);
        assert!(model.set_conditions(celsius(340.0), bar(500.0)).is_ok());
        assert!(matches!(
            model.set_conditions(celsius(400.0), bar(500.0)),
            Err(ActivityError::Range { .. })
        ));
        let mut ideal = nacl(ActivityModelKind::Ideal);
        assert!(ideal.set_conditions(celsius(400.0), bar(500.0)).is_ok());
    }

    #[test]
    fn small_condition_changes_keep_cache() {
        let mut model = nacl(ActivityModelKind::Davies);
        let a = model.debye_huckel_a();
        model.set_conditions(celsius(25.05), bar(1.01325)).unwrap();
        assert_eq!(model.debye_huckel_a(), a);
        model.set_conditions(celsius(60.0), bar(1.01325)).unwrap();
        assert!(model.debye_huckel_a() > a);
    }
}
