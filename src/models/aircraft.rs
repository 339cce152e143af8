//! Aircraft - vehicle metrics and total force and moment summation

use nalgebra::Vector3;
use tracing::info;

use super::Published;
use crate::config::Element;
use crate::error::ModelError;
use crate::model::{LoadContext, Model, ModelBase};
use crate::property::PropertyManager;

#[derive(Debug, Clone, Default)]
pub struct AircraftInputs {
    pub aero_force: Vector3<f64>,
    pub aero_moment: Vector3<f64>,
    pub prop_force: Vector3<f64>,
    pub prop_moment: Vector3<f64>,
    pub ground_force: Vector3<f64>,
    pub ground_moment: Vector3<f64>,
    pub external_force: Vector3<f64>,
    pub external_moment: Vector3<f64>,
    pub buoyant_force: Vector3<f64>,
    pub buoyant_moment: Vector3<f64>,
}

/// Reference geometry read from the `metrics` section
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    /// ft^2
    pub wing_area: f64,
    /// ft
    pub wingspan: f64,
    /// Mean aerodynamic chord, ft
    pub chord: f64,
    /// rad
    pub wing_incidence: f64,
    pub htail_area: f64,
    pub htail_arm: f64,
    pub vtail_area: f64,
    pub vtail_arm: f64,
    /// Aerodynamic reference point, structural inches
    pub rp: Vector3<f64>,
    /// Visual reference point, structural inches
    pub vrp: Vector3<f64>,
    /// Pilot eye point, structural inches
    pub eyepoint: Vector3<f64>,
}

const PUBLISHED: [&str; 10] = [
    "metrics/Sw-sqft",
    "metrics/bw-ft",
    "metrics/cbarw-ft",
    "metrics/iw-rad",
    "forces/fbx-total-lbs",
    "forces/fby-total-lbs",
    "forces/fbz-total-lbs",
    "moments/l-total-lbsft",
    "moments/m-total-lbsft",
    "moments/n-total-lbsft",
];

pub struct Aircraft {
    base: ModelBase,
    pub inputs: AircraftInputs,

    name: String,
    metrics: Metrics,

    // State
    forces: Vector3<f64>,
    moments: Vector3<f64>,

    published: Published<10>,
}

impl Aircraft {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("aircraft"),
            inputs: AircraftInputs::default(),
            name: String::new(),
            metrics: Metrics::default(),
            forces: Vector3::zeros(),
            moments: Vector3::zeros(),
            published: Published::bind(pm, PUBLISHED),
        }
    }

    pub fn aircraft_name(&self) -> &str {
        &self.name
    }

    pub fn set_aircraft_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn wing_area(&self) -> f64 {
        self.metrics.wing_area
    }

    pub fn wingspan(&self) -> f64 {
        self.metrics.wingspan
    }

    pub fn wing_chord(&self) -> f64 {
        self.metrics.chord
    }

    pub fn wing_incidence(&self) -> f64 {
        self.metrics.wing_incidence
    }

    pub fn xyz_rp(&self) -> Vector3<f64> {
        self.metrics.rp
    }

    pub fn xyz_vrp(&self) -> Vector3<f64> {
        self.metrics.vrp
    }

    pub fn xyz_eyepoint(&self) -> Vector3<f64> {
        self.metrics.eyepoint
    }

    /// Total body force, lbs
    pub fn forces(&self) -> Vector3<f64> {
        self.forces
    }

    /// Total moment about the CG, ft*lbs
    pub fn moments(&self) -> Vector3<f64> {
        self.moments
    }

    fn publish(&self) {
        self.published.publish([
            self.metrics.wing_area,
            self.metrics.wingspan,
            self.metrics.chord,
            self.metrics.wing_incidence,
            self.forces.x,
            self.forces.y,
            self.forces.z,
            self.moments.x,
            self.moments.y,
            self.moments.z,
        ]);
    }
}

impl Model for Aircraft {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn init_model(&mut self) -> Result<(), ModelError> {
        self.base.init();
        self.forces = Vector3::zeros();
        self.moments = Vector3::zeros();
        self.publish();
        Ok(())
    }

    fn run(&mut self, holding: bool) -> bool {
        if self.base.run_gate() {
            return true;
        }
        if holding {
            return false;
        }

        let i = &self.inputs;
        self.forces =
            i.aero_force + i.prop_force + i.ground_force + i.external_force + i.buoyant_force;
        self.moments = i.aero_moment
            + i.prop_moment
            + i.ground_moment
            + i.external_moment
            + i.buoyant_moment;
        self.publish();
        false
    }

    fn load(&mut self, el: &Element, ctx: &LoadContext<'_>) -> Result<(), ModelError> {
        let m = &mut self.metrics;
        m.wing_area = el.find_value_as_number_convert_to("wingarea", "FT2")?;
        m.wingspan = el.find_value_as_number_convert_to("wingspan", "FT")?;
        m.chord = el.value_or("chord", "FT", 0.0)?;
        m.wing_incidence = el.value_or("wing_incidence", "RAD", 0.0)?;
        m.htail_area = el.value_or("htailarea", "FT2", 0.0)?;
        m.htail_arm = el.value_or("htailarm", "FT", 0.0)?;
        m.vtail_area = el.value_or("vtailarea", "FT2", 0.0)?;
        m.vtail_arm = el.value_or("vtailarm", "FT", 0.0)?;

        let mut found_rp = false;
        for loc in el.find_all("location") {
            let xyz = loc.triplet_convert_to("IN")?;
            match loc.attr("name") {
                Some("AERORP") => {
                    m.rp = xyz;
                    found_rp = true;
                }
                Some("EYEPOINT") => m.eyepoint = xyz,
                Some("VRP") => m.vrp = xyz,
                _ => {}
            }
        }
        if !found_rp {
            return Err(ModelError::MissingElement("location name=\"AERORP\"".into()));
        }

        self.publish();
        if ctx.debug.startup() {
            let m = &self.metrics;
            info!(
                "    Wing area: {:.2} ft2, span: {:.2} ft, chord: {:.2} ft",
                m.wing_area, m.wingspan, m.chord
            );
            info!("    Ref. point: [{:.2}, {:.2}, {:.2}] in", m.rp.x, m.rp.y, m.rp.z);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AssetPaths;
    use crate::logging::DebugLevel;
    use approx::assert_relative_eq;

    fn ctx<'a>(pm: &'a PropertyManager, paths: &'a AssetPaths) -> LoadContext<'a> {
        LoadContext {
            pm,
            paths,
            dt: 0.01,
            debug: DebugLevel(0),
        }
    }

    fn location(name: &str, x: f64) -> Element {
        Element::new("location")
            .with_attr("name", name)
            .with_attr("unit", "IN")
            .with_child(Element::new("x").with_value(x))
    }

    #[test]
    fn test_load_metrics() {
        let pm = PropertyManager::new();
        let paths = AssetPaths::default();
        let el = Element::new("metrics")
            .with_child(Element::new("wingarea").with_attr("unit", "FT2").with_value(174))
            .with_child(Element::new("wingspan").with_attr("unit", "FT").with_value(35.8))
            .with_child(Element::new("chord").with_attr("unit", "IN").with_value(60))
            .with_child(Element::new("wing_incidence").with_attr("unit", "DEG").with_value(2))
            .with_child(location("AERORP", 43.2))
            .with_child(location("EYEPOINT", 37.0));
        let mut ac = Aircraft::new(&pm);
        ac.load(&el, &ctx(&pm, &paths)).unwrap();

        assert_relative_eq!(ac.wing_area(), 174.0);
        assert_relative_eq!(ac.wing_chord(), 5.0);
        assert_relative_eq!(ac.wing_incidence(), 2f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(ac.xyz_rp().x, 43.2);
        assert_relative_eq!(ac.xyz_eyepoint().x, 37.0);
        assert_eq!(pm.get("metrics/bw-ft"), Some(35.8));
    }

    #[test]
    fn test_missing_reference_point() {
        let pm = PropertyManager::new();
        let paths = AssetPaths::default();
        let el = Element::new("metrics")
            .with_child(Element::new("wingarea").with_value(10))
            .with_child(Element::new("wingspan").with_value(5));
        assert!(Aircraft::new(&pm).load(&el, &ctx(&pm, &paths)).is_err());
    }

    #[test]
    fn test_force_summation() {
        let pm = PropertyManager::new();
        let mut ac = Aircraft::new(&pm);
        ac.inputs.aero_force = Vector3::new(-100.0, 0.0, -2000.0);
        ac.inputs.prop_force = Vector3::new(300.0, 0.0, 0.0);
        ac.inputs.ground_force = Vector3::new(0.0, 0.0, 500.0);
        ac.inputs.prop_moment = Vector3::new(0.0, 50.0, 0.0);
        ac.run(false);
        assert_relative_eq!(ac.forces(), Vector3::new(200.0, 0.0, -1500.0));
        assert_relative_eq!(ac.moments().y, 50.0);
        assert_eq!(pm.get("forces/fbz-total-lbs"), Some(-1500.0));
    }
}
