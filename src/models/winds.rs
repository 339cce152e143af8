//! Winds - steady wind in the local frame
//!
//! The wind vector is read from `atmosphere/wind-{north,east,down}-fps`
//! every frame, so it can be changed by scripts and inputs. Turbulence is
//! not modelled.

use nalgebra::Vector3;

use super::{settable, Published};
use crate::model::{Model, ModelBase};
use crate::property::{PropertyManager, PropertyNode};

pub struct Winds {
    base: ModelBase,

    wind_nodes: [PropertyNode; 3],

    // State
    wind_ned: Vector3<f64>,

    published: Published<2>,
}

impl Winds {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("winds"),
            wind_nodes: [
                settable(pm, "atmosphere/wind-north-fps", 0.0),
                settable(pm, "atmosphere/wind-east-fps", 0.0),
                settable(pm, "atmosphere/wind-down-fps", 0.0),
            ],
            wind_ned: Vector3::zeros(),
            published: Published::bind(
                pm,
                ["atmosphere/psiw-rad", "atmosphere/wind-mag-fps"],
            ),
        }
    }

    pub fn set_wind_ned(&mut self, wind: Vector3<f64>) {
        for (node, v) in self.wind_nodes.iter().zip(wind.iter()) {
            node.set(*v);
        }
        self.update();
    }

    /// Total wind, north-east-down, ft/s
    pub fn wind_ned(&self) -> Vector3<f64> {
        self.wind_ned
    }

    /// Direction the wind blows toward, radians from north
    pub fn wind_psi(&self) -> f64 {
        if self.wind_ned.x == 0.0 && self.wind_ned.y == 0.0 {
            0.0
        } else {
            self.wind_ned.y.atan2(self.wind_ned.x)
        }
    }

    fn update(&mut self) {
        self.wind_ned = Vector3::new(
            self.wind_nodes[0].get(),
            self.wind_nodes[1].get(),
            self.wind_nodes[2].get(),
        );
        self.published.publish([self.wind_psi(), self.wind_ned.norm()]);
    }
}

impl Model for Winds {
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

        self.update();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wind_from_properties() {
        let pm = PropertyManager::new();
        let mut winds = Winds::new(&pm);
        pm.set("atmosphere/wind-east-fps", 10.0);
        winds.run(false);
        assert_eq!(winds.wind_ned(), Vector3::new(0.0, 10.0, 0.0));
        assert_relative_eq!(winds.wind_psi(), std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_set_wind_updates_properties() {
        let pm = PropertyManager::new();
        let mut winds = Winds::new(&pm);
        winds.set_wind_ned(Vector3::new(3.0, 4.0, 0.0));
        assert_eq!(pm.get("atmosphere/wind-north-fps"), Some(3.0));
        assert_eq!(pm.get("atmosphere/wind-mag-fps"), Some(5.0));
    }
}
