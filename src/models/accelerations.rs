//! Accelerations - rigid-body equations of motion in body axes

use nalgebra::{Matrix3, Vector3};

use super::{settable, Published};
use crate::model::{Model, ModelBase};
use crate::property::{PropertyManager, PropertyNode};

#[derive(Debug, Clone)]
pub struct AccelerationsInputs {
    /// Total body force, lbs
    pub forces: Vector3<f64>,
    /// Total moment about the CG, ft*lbs
    pub moments: Vector3<f64>,
    /// slugs
    pub mass: f64,
    pub j: Matrix3<f64>,
    pub j_inv: Matrix3<f64>,
    pub uvw: Vector3<f64>,
    pub pqr: Vector3<f64>,
    pub tl2b: Matrix3<f64>,
    pub gravity: f64,
}

impl Default for AccelerationsInputs {
    fn default() -> Self {
        Self {
            forces: Vector3::zeros(),
            moments: Vector3::zeros(),
            mass: 0.0,
            j: Matrix3::identity(),
            j_inv: Matrix3::identity(),
            uvw: Vector3::zeros(),
            pqr: Vector3::zeros(),
            tl2b: Matrix3::identity(),
            gravity: 0.0,
        }
    }
}

pub struct Accelerations {
    base: ModelBase,
    pub inputs: AccelerationsInputs,

    hold_down: PropertyNode,

    // State
    uvw_dot: Vector3<f64>,
    pqr_dot: Vector3<f64>,

    published: Published<6>,
}

impl Accelerations {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("accelerations"),
            inputs: AccelerationsInputs::default(),
            hold_down: settable(pm, "forces/hold-down", 0.0),
            uvw_dot: Vector3::zeros(),
            pqr_dot: Vector3::zeros(),
            published: Published::bind(
                pm,
                [
                    "accelerations/udot-ft_sec2",
                    "accelerations/vdot-ft_sec2",
                    "accelerations/wdot-ft_sec2",
                    "accelerations/pdot-rad_sec2",
                    "accelerations/qdot-rad_sec2",
                    "accelerations/rdot-rad_sec2",
                ],
            ),
        }
    }

    pub fn uvw_dot(&self) -> Vector3<f64> {
        self.uvw_dot
    }

    pub fn pqr_dot(&self) -> Vector3<f64> {
        self.pqr_dot
    }

    /// Pin the vehicle in place, as when clamped to a launch rail
    pub fn set_hold_down(&self, hold: bool) {
        self.hold_down.set_bool(hold);
    }

    pub fn hold_down(&self) -> bool {
        self.hold_down.get_bool()
    }

    fn calculate(&mut self) {
        let inp = &self.inputs;
        if self.hold_down.get_bool() {
            self.uvw_dot = Vector3::zeros();
            self.pqr_dot = Vector3::zeros();
        } else {
            let w = inp.pqr;
            self.pqr_dot = inp.j_inv * (inp.moments - w.cross(&(inp.j * w)));
            let specific_force = if inp.mass > 0.0 {
                inp.forces / inp.mass
            } else {
                Vector3::zeros()
            };
            self.uvw_dot = specific_force - w.cross(&inp.uvw)
                + inp.tl2b * Vector3::new(0.0, 0.0, inp.gravity);
        }

        self.published.publish([
            self.uvw_dot.x,
            self.uvw_dot.y,
            self.uvw_dot.z,
            self.pqr_dot.x,
            self.pqr_dot.y,
            self.pqr_dot.z,
        ]);
    }
}

impl Model for Accelerations {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn init_model(&mut self) -> Result<(), crate::error::ModelError> {
        self.base.init();
        self.uvw_dot = Vector3::zeros();
        self.pqr_dot = Vector3::zeros();
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
}
