//! Inertial - planet constants and gravity

use super::Published;
use crate::model::{Model, ModelBase};
use crate::property::PropertyManager;
use crate::utils::constants::{
    PLANET_GM, PLANET_RADIUS_REFERENCE, PLANET_ROTATION_RATE, PLANET_SEMI_MAJOR,
    PLANET_SEMI_MINOR,
};

#[derive(Debug, Clone)]
pub struct InertialInputs {
    /// Distance of the vehicle from the planet centre, ft
    pub radius: f64,
}

impl Default for InertialInputs {
    fn default() -> Self {
        Self {
            radius: PLANET_RADIUS_REFERENCE,
        }
    }
}

pub struct Inertial {
    base: ModelBase,
    pub inputs: InertialInputs,

    // Parameters
    gm: f64,
    omega: f64,
    semi_major: f64,
    semi_minor: f64,
    reference_radius: f64,

    // State
    gravity: f64,

    published: Published<2>,
}

impl Inertial {
    pub fn new(pm: &PropertyManager) -> Self {
        let mut inertial = Self {
            base: ModelBase::new("inertial"),
            inputs: InertialInputs::default(),
            gm: PLANET_GM,
            omega: PLANET_ROTATION_RATE,
            semi_major: PLANET_SEMI_MAJOR,
            semi_minor: PLANET_SEMI_MINOR,
            reference_radius: PLANET_RADIUS_REFERENCE,
            gravity: 0.0,
            published: Published::bind(
                pm,
                ["inertial/gravity-ft_sec2", "inertial/sea-level-gravity-ft_sec2"],
            ),
        };
        inertial.gravity = inertial.sl_gravity();
        inertial
    }

    /// Gravity at the wired radius, ft/s^2
    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    pub fn sl_gravity(&self) -> f64 {
        self.gm / (self.reference_radius * self.reference_radius)
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn semi_major(&self) -> f64 {
        self.semi_major
    }

    pub fn semi_minor(&self) -> f64 {
        self.semi_minor
    }

    pub fn reference_radius(&self) -> f64 {
        self.reference_radius
    }
}

impl Model for Inertial {
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

        let r = self.inputs.radius.max(1.0);
        self.gravity = self.gm / (r * r);
        self.published.publish([self.gravity, self.sl_gravity()]);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sea_level_gravity() {
        let mut inertial = Inertial::new(&PropertyManager::new());
        inertial.run(false);
        assert_relative_eq!(inertial.gravity(), 32.1466, epsilon = 1e-3);
        assert_relative_eq!(inertial.gravity(), inertial.sl_gravity());
    }

    #[test]
    fn test_gravity_drops_with_radius() {
        let mut inertial = Inertial::new(&PropertyManager::new());
        inertial.inputs.radius = PLANET_RADIUS_REFERENCE + 100_000.0;
        inertial.run(false);
        assert!(inertial.gravity() < inertial.sl_gravity());
    }
}
