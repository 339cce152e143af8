//! Aerodynamics - linear coefficient build-up
//!
//! Each axis sums its coefficients, every coefficient being a constant
//! times zero or more property values. Forces are built in wind axes and
//! rotated into body axes; moments are taken about the CG.
//!
//! ```json
//! { "name": "axis", "attributes": { "name": "LIFT" }, "children": [
//!     { "name": "coefficient", "attributes": { "name": "CL0" }, "value": 0.25 },
//!     { "name": "coefficient",
//!       "attributes": { "name": "CLalpha", "multiplier": "aero/alpha-rad" },
//!       "value": 4.6 }
//! ] }
//! ```

use nalgebra::{Matrix3, Vector3};
use tracing::info;

use super::Published;
use crate::config::Element;
use crate::error::ModelError;
use crate::model::{LoadContext, Model, ModelBase};
use crate::property::{signed_reference, PropertyManager, PropertyNode};

#[derive(Debug, Clone)]
pub struct AerodynamicsInputs {
    pub alpha: f64,
    pub beta: f64,
    pub qbar: f64,
    pub vt: f64,
    /// Wind-to-body rotation
    pub tw2b: Matrix3<f64>,
    /// Aerodynamic reference point arm from the CG, body axes, ft
    pub rp_body: Vector3<f64>,
    pub wing_area: f64,
    pub wingspan: f64,
    pub chord: f64,
}

impl Default for AerodynamicsInputs {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            beta: 0.0,
            qbar: 0.0,
            vt: 0.0,
            tw2b: Matrix3::identity(),
            rp_body: Vector3::zeros(),
            wing_area: 0.0,
            wingspan: 0.0,
            chord: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AeroAxis {
    Lift,
    Drag,
    Side,
    Roll,
    Pitch,
    Yaw,
}

impl AeroAxis {
    fn from_name(name: &str) -> Option<Self> {
        let axis = match name {
            "LIFT" => AeroAxis::Lift,
            "DRAG" => AeroAxis::Drag,
            "SIDE" => AeroAxis::Side,
            "ROLL" => AeroAxis::Roll,
            "PITCH" => AeroAxis::Pitch,
            "YAW" => AeroAxis::Yaw,
            _ => return None,
        };
        Some(axis)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A constant scaled by the product of its multiplier properties
#[derive(Debug, Clone)]
pub struct Coefficient {
    pub name: String,
    pub axis: AeroAxis,
    pub value: f64,
    multipliers: Vec<(PropertyNode, f64)>,
}

impl Coefficient {
    fn load(el: &Element, axis: AeroAxis, pm: &PropertyManager) -> Result<Self, ModelError> {
        let mut multipliers = Vec::new();
        if let Some(list) = el.attr("multiplier") {
            for reference in list.split('*').filter(|s| !s.trim().is_empty()) {
                let (name, sign) = signed_reference(reference);
                let node = pm
                    .node(name, false)
                    .ok_or_else(|| ModelError::NoSuchProperty(name.to_string()))?;
                multipliers.push((node, sign));
            }
        }
        Ok(Self {
            name: el.attr("name").unwrap_or("coefficient").to_string(),
            axis,
            value: el.value_as_number()?,
            multipliers,
        })
    }

    pub fn evaluate(&self) -> f64 {
        self.multipliers
            .iter()
            .fold(self.value, |acc, (node, sign)| acc * sign * node.get())
    }
}

const PUBLISHED: [&str; 9] = [
    "forces/fbx-aero-lbs",
    "forces/fby-aero-lbs",
    "forces/fbz-aero-lbs",
    "moments/l-aero-lbsft",
    "moments/m-aero-lbsft",
    "moments/n-aero-lbsft",
    "aero/cl-squared",
    "aero/lod-norm",
    "aero/qbarS-lbs",
];

pub struct Aerodynamics {
    base: ModelBase,
    pub inputs: AerodynamicsInputs,
    pm: PropertyManager,

    coefficients: Vec<Coefficient>,

    // State
    /// Lift, drag and side force coefficients and roll/pitch/yaw moment
    /// coefficients, in axis order
    totals: [f64; 6],
    vfw: Vector3<f64>,
    forces: Vector3<f64>,
    moments: Vector3<f64>,

    published: Published<9>,
}

impl Aerodynamics {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("aerodynamics"),
            inputs: AerodynamicsInputs::default(),
            pm: pm.clone(),
            coefficients: Vec::new(),
            totals: [0.0; 6],
            vfw: Vector3::zeros(),
            forces: Vector3::zeros(),
            moments: Vector3::zeros(),
            published: Published::bind(pm, PUBLISHED),
        }
    }

    pub fn coefficients(&self) -> &[Coefficient] {
        &self.coefficients
    }

    /// Drag, side and lift forces in wind axes, lbs
    pub fn vfw(&self) -> Vector3<f64> {
        self.vfw
    }

    /// Body forces, lbs
    pub fn forces(&self) -> Vector3<f64> {
        self.forces
    }

    /// Moments about the CG, ft*lbs
    pub fn moments(&self) -> Vector3<f64> {
        self.moments
    }

    pub fn coefficient_total(&self, axis: AeroAxis) -> f64 {
        self.totals[axis.index()]
    }

    fn calculate(&mut self) {
        self.totals = [0.0; 6];
        for c in &self.coefficients {
            self.totals[c.axis.index()] += c.evaluate();
        }

        let inp = &self.inputs;
        let qs = inp.qbar * inp.wing_area;
        let [cl, cd, cy, croll, cpitch, cyaw] = self.totals;

        self.vfw = Vector3::new(-cd * qs, cy * qs, -cl * qs);
        self.forces = inp.tw2b * self.vfw;
        self.moments = inp.rp_body.cross(&self.forces)
            + Vector3::new(
                croll * qs * inp.wingspan,
                cpitch * qs * inp.chord,
                cyaw * qs * inp.wingspan,
            );

        let lod = if cd.abs() > f64::EPSILON { cl / cd } else { 0.0 };
        self.published.publish([
            self.forces.x,
            self.forces.y,
            self.forces.z,
            self.moments.x,
            self.moments.y,
            self.moments.z,
            cl * cl,
            lod,
            qs,
        ]);
    }
}

impl Model for Aerodynamics {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn init_model(&mut self) -> Result<(), ModelError> {
        self.base.init();
        self.totals = [0.0; 6];
        self.vfw = Vector3::zeros();
        self.forces = Vector3::zeros();
        self.moments = Vector3::zeros();
        Ok(())
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

    fn load(&mut self, el: &Element, ctx: &LoadContext<'_>) -> Result<(), ModelError> {
        for axis_el in el.find_all("axis") {
            let name = axis_el.attr("name").unwrap_or_default();
            let axis = AeroAxis::from_name(name).ok_or_else(|| ModelError::InvalidValue {
                element: "axis".into(),
                value: name.to_string(),
            })?;
            for c in axis_el.find_all("coefficient") {
                self.coefficients.push(Coefficient::load(c, axis, &self.pm)?);
            }
        }
        if ctx.debug.startup() {
            info!("    Aerodynamics: {} coefficient(s)", self.coefficients.len());
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

    fn coefficient(name: &str, value: f64, multiplier: Option<&str>) -> Element {
        let el = Element::new("coefficient").with_attr("name", name).with_value(value);
        match multiplier {
            Some(m) => el.with_attr("multiplier", m),
            None => el,
        }
    }

    fn loaded(pm: &PropertyManager) -> Aerodynamics {
        let paths = AssetPaths::default();
        let ctx = LoadContext {
            pm,
            paths: &paths,
            dt: 0.01,
            debug: DebugLevel(0),
        };
        let el = Element::new("aerodynamics")
            .with_child(
                Element::new("axis")
                    .with_attr("name", "LIFT")
                    .with_child(coefficient("CL0", 0.2, None))
                    .with_child(coefficient("CLalpha", 5.0, Some("aero/alpha-rad"))),
            )
            .with_child(
                Element::new("axis")
                    .with_attr("name", "DRAG")
                    .with_child(coefficient("CD0", 0.03, None)),
            )
            .with_child(
                Element::new("axis")
                    .with_attr("name", "PITCH")
                    .with_child(coefficient("Cmde", -1.0, Some("fcs/elevator-pos-rad"))),
            );
        let mut aero = Aerodynamics::new(pm);
        aero.load(&el, &ctx).unwrap();
        aero
    }

    #[test]
    fn test_level_forces() {
        let pm = PropertyManager::new();
        pm.bind("aero/alpha-rad", 0.0);
        pm.bind("fcs/elevator-pos-rad", 0.0);
        let mut aero = loaded(&pm);
        aero.inputs.qbar = 100.0;
        aero.inputs.wing_area = 10.0;
        aero.run(false);

        assert_relative_eq!(aero.forces().z, -200.0, epsilon = 1e-9);
        assert_relative_eq!(aero.forces().x, -30.0, epsilon = 1e-9);
        assert_relative_eq!(aero.vfw().z, -200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_multiplier_properties() {
        let pm = PropertyManager::new();
        pm.bind("aero/alpha-rad", 0.1);
        pm.bind("fcs/elevator-pos-rad", 0.05);
        let mut aero = loaded(&pm);
        aero.inputs.qbar = 10.0;
        aero.inputs.wing_area = 2.0;
        aero.inputs.chord = 3.0;
        aero.run(false);

        assert_relative_eq!(aero.coefficient_total(AeroAxis::Lift), 0.7, epsilon = 1e-12);
        assert_relative_eq!(aero.moments().y, -0.05 * 20.0 * 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_multiplier() {
        let pm = PropertyManager::new();
        let paths = AssetPaths::default();
        let ctx = LoadContext {
            pm: &pm,
            paths: &paths,
            dt: 0.01,
            debug: DebugLevel(0),
        };
        let el = Element::new("aerodynamics").with_child(
            Element::new("axis")
                .with_attr("name", "LIFT")
                .with_child(coefficient("CLx", 1.0, Some("nope/none"))),
        );
        let err = Aerodynamics::new(&pm).load(&el, &ctx).unwrap_err();
        assert!(matches!(err, ModelError::NoSuchProperty(_)));
    }
}
