//! External reactions - named forces applied at structural points
//!
//! Each force has a fixed direction in its frame and a magnitude read from
//! `external_reactions/<name>/magnitude` every frame.

use nalgebra::{Matrix3, Vector3};
use tracing::info;

use super::{settable, structural_to_body, Published};
use crate::config::Element;
use crate::error::ModelError;
use crate::model::{LoadContext, Model, ModelBase};
use crate::property::{PropertyManager, PropertyNode};

#[derive(Debug, Clone)]
pub struct ExternalReactionsInputs {
    pub tl2b: Matrix3<f64>,
    pub tw2b: Matrix3<f64>,
    /// CG, structural inches
    pub cg: Vector3<f64>,
}

impl Default for ExternalReactionsInputs {
    fn default() -> Self {
        Self {
            tl2b: Matrix3::identity(),
            tw2b: Matrix3::identity(),
            cg: Vector3::zeros(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceFrame {
    Body,
    Local,
    Wind,
}

#[derive(Debug, Clone)]
pub struct ExternalForce {
    pub name: String,
    pub frame: ForceFrame,
    /// Structural location, inches
    pub location: Vector3<f64>,
    /// Unit direction in `frame`
    pub direction: Vector3<f64>,
    magnitude: PropertyNode,
}

impl ExternalForce {
    fn load(el: &Element, pm: &PropertyManager) -> Result<Self, ModelError> {
        let name = el
            .attr("name")
            .ok_or_else(|| ModelError::MissingElement("force name".into()))?
            .to_string();
        let frame = match el.attr("frame") {
            None | Some("BODY") => ForceFrame::Body,
            Some("LOCAL") => ForceFrame::Local,
            Some("WIND") => ForceFrame::Wind,
            Some(other) => {
                return Err(ModelError::InvalidValue {
                    element: "force frame".into(),
                    value: other.to_string(),
                })
            }
        };
        let direction = match el.find("direction") {
            Some(d) => d.triplet_convert_to("FT")?,
            None => Vector3::x(),
        };
        let direction = direction.try_normalize(f64::EPSILON).ok_or_else(|| {
            ModelError::InvalidValue {
                element: "direction".into(),
                value: format!("{direction:?}"),
            }
        })?;

        Ok(Self {
            magnitude: settable(pm, &format!("external_reactions/{name}/magnitude"), 0.0),
            location: el.find_triplet_convert_to("location", "IN")?,
            name,
            frame,
            direction,
        })
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude.get()
    }

    pub fn set_magnitude(&self, magnitude: f64) {
        self.magnitude.set(magnitude);
    }

    fn body_force(&self, inp: &ExternalReactionsInputs) -> Vector3<f64> {
        let f = self.direction * self.magnitude();
        match self.frame {
            ForceFrame::Body => f,
            ForceFrame::Local => inp.tl2b * f,
            ForceFrame::Wind => inp.tw2b * f,
        }
    }
}

pub struct ExternalReactions {
    base: ModelBase,
    pub inputs: ExternalReactionsInputs,
    pm: PropertyManager,

    forces_list: Vec<ExternalForce>,

    // State
    forces: Vector3<f64>,
    moments: Vector3<f64>,

    published: Published<6>,
}

impl ExternalReactions {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("external_reactions"),
            inputs: ExternalReactionsInputs::default(),
            pm: pm.clone(),
            forces_list: Vec::new(),
            forces: Vector3::zeros(),
            moments: Vector3::zeros(),
            published: Published::bind(
                pm,
                [
                    "forces/fbx-external-lbs",
                    "forces/fby-external-lbs",
                    "forces/fbz-external-lbs",
                    "moments/l-external-lbsft",
                    "moments/m-external-lbsft",
                    "moments/n-external-lbsft",
                ],
            ),
        }
    }

    pub fn external_forces(&self) -> &[ExternalForce] {
        &self.forces_list
    }

    pub fn forces(&self) -> Vector3<f64> {
        self.forces
    }

    pub fn moments(&self) -> Vector3<f64> {
        self.moments
    }
}

impl Model for ExternalReactions {
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
        Ok(())
    }

    fn run(&mut self, holding: bool) -> bool {
        if self.base.run_gate() {
            return true;
        }
        if holding {
            return false;
        }

        self.forces = Vector3::zeros();
        self.moments = Vector3::zeros();
        for f in &self.forces_list {
            let force = f.body_force(&self.inputs);
            let arm = structural_to_body(&f.location, &self.inputs.cg);
            self.forces += force;
            self.moments += arm.cross(&force);
        }
        self.published.publish([
            self.forces.x,
            self.forces.y,
            self.forces.z,
            self.moments.x,
            self.moments.y,
            self.moments.z,
        ]);
        false
    }

    fn load(&mut self, el: &Element, ctx: &LoadContext<'_>) -> Result<(), ModelError> {
        for force_el in el.find_all("force") {
            let force = ExternalForce::load(force_el, &self.pm)?;
            if ctx.debug.startup() {
                info!("    External force {} ({:?} frame)", force.name, force.frame);
            }
            self.forces_list.push(force);
        }
        Ok(())
    }
}
