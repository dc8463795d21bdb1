// hf-core/src/units.rs

use uom::si::f64::{
    MassDensity as UomMassDensity, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Density = UomMassDensity;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

/// Pascal per bar.
pub const PA_PER_BAR: f64 = 1.0e5;

/// 0 °C in kelvin.
pub const ZERO_CELSIUS_K: f64 = 273.15;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn celsius(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn kgm3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

/// Density in g/cm³.
#[inline]
pub fn to_g_per_cm3(rho: Density) -> f64 {
    rho.value / 1000.0
}

/// Temperature in °C.
#[inline]
pub fn to_celsius(t: Temperature) -> f64 {
    t.value - ZERO_CELSIUS_K
}

/// Pressure in bar.
#[inline]
pub fn to_bar(p: Pressure) -> f64 {
    p.value / PA_PER_BAR
}

pub mod constants {
    /// Reference temperature of tabulated equilibrium data [°C].
    pub const T_REF_C: f64 = 25.0;

    /// Reference pressure [bar].
    pub const P_REF_BAR: f64 = 1.01325;

    /// Moles of water per kg (1000 / 18.0153).
    pub const MOL_WATER_PER_KG: f64 = 55.508_44;
}
