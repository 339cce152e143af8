//! Atmosphere - international standard atmosphere
//!
//! Troposphere with a constant lapse rate, isothermal above the tropopause.
//! A temperature bias written to `atmosphere/delta-T` shifts the whole
//! profile.

use super::{settable, Published};
use crate::model::{Model, ModelBase};
use crate::property::{PropertyManager, PropertyNode};
use crate::utils::constants::{
    AIR_GAMMA, AIR_GAS_CONSTANT, ISA_LAPSE_RATE, ISA_SL_PRESSURE, ISA_SL_TEMPERATURE,
    ISA_TROPOPAUSE, SLUG_TO_LB, SUTHERLAND_BETA, SUTHERLAND_CONSTANT,
};

#[derive(Debug, Clone, Default)]
pub struct AtmosphereInputs {
    pub altitude_asl: f64,
}

const PUBLISHED: [&str; 11] = [
    "atmosphere/T-R",
    "atmosphere/P-psf",
    "atmosphere/rho-slugs_ft3",
    "atmosphere/a-fps",
    "atmosphere/viscosity-slug_ft_s",
    "atmosphere/kinematic-viscosity-ft2_s",
    "atmosphere/T-sl-R",
    "atmosphere/rho-sl-slugs_ft3",
    "atmosphere/theta",
    "atmosphere/delta",
    "atmosphere/sigma",
];

/// Thermodynamic state at one altitude
#[derive(Debug, Clone, Copy, PartialEq)]
struct AirState {
    temperature: f64,
    pressure: f64,
    density: f64,
    sound_speed: f64,
}

pub struct Atmosphere {
    base: ModelBase,
    pub inputs: AtmosphereInputs,

    delta_t: PropertyNode,

    // State
    local: AirState,
    sea_level: AirState,
    viscosity: f64,

    published: Published<11>,
}

impl Atmosphere {
    pub fn new(pm: &PropertyManager) -> Self {
        let mut atmosphere = Self {
            base: ModelBase::new("atmosphere"),
            inputs: AtmosphereInputs::default(),
            delta_t: settable(pm, "atmosphere/delta-T", 0.0),
            local: standard(0.0, 0.0),
            sea_level: standard(0.0, 0.0),
            viscosity: 0.0,
            published: Published::bind(pm, PUBLISHED),
        };
        atmosphere.calculate();
        atmosphere
    }

    fn calculate(&mut self) {
        let bias = self.delta_t.get();
        self.sea_level = standard(0.0, bias);
        self.local = standard(self.inputs.altitude_asl, bias);
        let t = self.local.temperature;
        self.viscosity = SUTHERLAND_BETA * t.powf(1.5) / (t + SUTHERLAND_CONSTANT);

        self.published.publish([
            self.local.temperature,
            self.local.pressure,
            self.local.density,
            self.local.sound_speed,
            self.viscosity,
            self.kinematic_viscosity(),
            self.sea_level.temperature,
            self.sea_level.density,
            self.temperature_ratio(),
            self.pressure_ratio(),
            self.density_ratio(),
        ]);
    }

    /// Rankine
    pub fn temperature(&self) -> f64 {
        self.local.temperature
    }

    /// lbf/ft^2
    pub fn pressure(&self) -> f64 {
        self.local.pressure
    }

    /// slug/ft^3
    pub fn density(&self) -> f64 {
        self.local.density
    }

    /// ft/s
    pub fn sound_speed(&self) -> f64 {
        self.local.sound_speed
    }

    pub fn viscosity(&self) -> f64 {
        self.viscosity
    }

    pub fn kinematic_viscosity(&self) -> f64 {
        self.viscosity / self.local.density
    }

    pub fn sl_temperature(&self) -> f64 {
        self.sea_level.temperature
    }

    pub fn sl_pressure(&self) -> f64 {
        self.sea_level.pressure
    }

    pub fn sl_density(&self) -> f64 {
        self.sea_level.density
    }

    pub fn sl_sound_speed(&self) -> f64 {
        self.sea_level.sound_speed
    }

    pub fn temperature_ratio(&self) -> f64 {
        self.local.temperature / self.sea_level.temperature
    }

    pub fn pressure_ratio(&self) -> f64 {
        self.local.pressure / self.sea_level.pressure
    }

    pub fn density_ratio(&self) -> f64 {
        self.local.density / self.sea_level.density
    }
}

/// Standard day at `altitude` (ft) with a temperature bias (Rankine)
fn standard(altitude: f64, bias: f64) -> AirState {
    let exponent = SLUG_TO_LB / (ISA_LAPSE_RATE * AIR_GAS_CONSTANT);
    let h = altitude.max(0.0);
    let t_trop = ISA_SL_TEMPERATURE - ISA_LAPSE_RATE * ISA_TROPOPAUSE;

    let (t_std, pressure) = if h <= ISA_TROPOPAUSE {
        let t = ISA_SL_TEMPERATURE - ISA_LAPSE_RATE * h;
        (t, ISA_SL_PRESSURE * (t / ISA_SL_TEMPERATURE).powf(exponent))
    } else {
        let p_trop = ISA_SL_PRESSURE * (t_trop / ISA_SL_TEMPERATURE).powf(exponent);
        let decay = -SLUG_TO_LB * (h - ISA_TROPOPAUSE) / (AIR_GAS_CONSTANT * t_trop);
        (t_trop, p_trop * decay.exp())
    };

    let temperature = t_std + bias;
    let density = pressure / (AIR_GAS_CONSTANT * temperature);
    AirState {
        temperature,
        pressure,
        density,
        sound_speed: (AIR_GAMMA * AIR_GAS_CONSTANT * temperature).sqrt(),
    }
}

impl Model for Atmosphere {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn run(&mut self, holding: bool) -> bool {
        if self.base.run_gate() {
            return true;
        }
        if holding {
            return false;
        }

        self.calculate();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::ISA_SL_DENSITY;
    use approx::assert_relative_eq;

    #[test]
    fn test_sea_level_values() {
        let atm = Atmosphere::new(&PropertyManager::new());
        assert_relative_eq!(atm.temperature(), ISA_SL_TEMPERATURE);
        assert_relative_eq!(atm.pressure(), ISA_SL_PRESSURE);
        assert_relative_eq!(atm.density(), ISA_SL_DENSITY, epsilon = 1e-6);
        assert_relative_eq!(atm.sound_speed(), 1116.45, epsilon = 0.1);
        assert_relative_eq!(atm.density_ratio(), 1.0);
    }

    #[test]
    fn test_tropopause_isothermal() {
        let mut atm = Atmosphere::new(&PropertyManager::new());
        atm.inputs.altitude_asl = 40_000.0;
        atm.run(false);
        let t40 = atm.temperature();
        atm.inputs.altitude_asl = 50_000.0;
        atm.run(false);
        assert_relative_eq!(atm.temperature(), t40);
        assert!(atm.pressure() < ISA_SL_PRESSURE * 0.2);
        assert_relative_eq!(atm.temperature(), 389.97, epsilon = 0.1);
    }

    #[test]
    fn test_temperature_bias_property() {
        let pm = PropertyManager::new();
        let mut atm = Atmosphere::new(&pm);
        pm.set("atmosphere/delta-T", 10.0);
        atm.run(false);
        assert_relative_eq!(atm.temperature(), ISA_SL_TEMPERATURE + 10.0);
        assert!(atm.density() < ISA_SL_DENSITY);
        assert_eq!(pm.get("atmosphere/T-R"), Some(atm.temperature()));
    }
}
