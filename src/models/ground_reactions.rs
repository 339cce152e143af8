//! Ground reactions - spring/damper contact points
//!
//! Every contact is a point on the structure. Below the ground plane it
//! produces a normal force from its spring and damper and a friction force
//! opposing its horizontal motion. Retractable gear only touches down when
//! fully extended.

use nalgebra::{Matrix3, Vector3};
use tracing::info;

use super::{structural_to_body, Published};
use crate::config::Element;
use crate::error::ModelError;
use crate::model::{LoadContext, Model, ModelBase};
use crate::property::{PropertyManager, PropertyNode};
use crate::utils::indexed_property_name;

/// Horizontal speed (ft/s) under which friction fades out
const FRICTION_FADE_SPEED: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct GroundReactionsInputs {
    pub tb2l: Matrix3<f64>,
    pub tl2b: Matrix3<f64>,
    pub altitude_agl: f64,
    pub uvw: Vector3<f64>,
    pub pqr: Vector3<f64>,
    /// CG, structural inches
    pub cg: Vector3<f64>,
    pub gear_pos: f64,
    /// Left, right and center brake commands
    pub brakes: Vector3<f64>,
}

impl Default for GroundReactionsInputs {
    fn default() -> Self {
        Self {
            tb2l: Matrix3::identity(),
            tl2b: Matrix3::identity(),
            altitude_agl: 0.0,
            uvw: Vector3::zeros(),
            pqr: Vector3::zeros(),
            cg: Vector3::zeros(),
            gear_pos: 1.0,
            brakes: Vector3::zeros(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactType {
    Bogey,
    Structure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrakeGroup {
    None,
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone)]
pub struct Contact {
    pub name: String,
    pub kind: ContactType,
    /// Structural location, inches
    pub location: Vector3<f64>,
    pub static_friction: f64,
    pub dynamic_friction: f64,
    pub rolling_friction: f64,
    /// lbs/ft
    pub spring: f64,
    /// lbs/ft/s
    pub damping: f64,
    pub retractable: bool,
    pub brake_group: BrakeGroup,

    // State
    wow: bool,
    compression: f64,
    force: Vector3<f64>,

    wow_node: PropertyNode,
    compression_node: PropertyNode,
}

impl Contact {
    fn load(el: &Element, index: usize, pm: &PropertyManager) -> Result<Self, ModelError> {
        let kind = match el.attr("type") {
            Some("STRUCTURE") => ContactType::Structure,
            _ => ContactType::Bogey,
        };
        let brake_group = match el.find_value("brake_group") {
            Some("LEFT") => BrakeGroup::Left,
            Some("RIGHT") => BrakeGroup::Right,
            Some("CENTER") => BrakeGroup::Center,
            _ => BrakeGroup::None,
        };
        let base = indexed_property_name("gear/unit", index);
        let node = |suffix: &str| super::settable(pm, &format!("{base}/{suffix}"), 0.0);

        Ok(Self {
            name: el.attr("name").unwrap_or("contact").to_string(),
            kind,
            location: el.find_triplet_convert_to("location", "IN")?,
            static_friction: el.number_or("static_friction", 0.8)?,
            dynamic_friction: el.number_or("dynamic_friction", 0.5)?,
            rolling_friction: el.number_or("rolling_friction", 0.02)?,
            spring: el.find_value_as_number_convert_to("spring_coeff", "LBS/FT")?,
            damping: el.value_or("damping_coeff", "LBS/FT/SEC", 0.0)?,
            retractable: el.number_or("retractable", 0.0)? != 0.0,
            brake_group,
            wow: false,
            compression: 0.0,
            force: Vector3::zeros(),
            wow_node: node("WOW"),
            compression_node: node("compression-ft"),
        })
    }

    pub fn wow(&self) -> bool {
        self.wow
    }

    /// ft
    pub fn compression(&self) -> f64 {
        self.compression
    }

    /// Body force, lbs
    pub fn force(&self) -> Vector3<f64> {
        self.force
    }

    fn clear(&mut self) {
        self.wow = false;
        self.compression = 0.0;
        self.force = Vector3::zeros();
        self.wow_node.set_bool(false);
        self.compression_node.set(0.0);
    }

    /// Body force and the arm it acts at
    fn calculate(&mut self, inp: &GroundReactionsInputs) -> (Vector3<f64>, Vector3<f64>) {
        let arm = structural_to_body(&self.location, &inp.cg);
        if self.retractable && inp.gear_pos < 0.99 {
            self.clear();
            return (Vector3::zeros(), arm);
        }

        let height = inp.altitude_agl - (inp.tb2l * arm).z;
        if height >= 0.0 {
            self.clear();
            return (Vector3::zeros(), arm);
        }

        self.compression = -height;
        self.wow = true;

        let vel_local = inp.tb2l * (inp.uvw + inp.pqr.cross(&arm));
        let normal = (self.spring * self.compression + self.damping * vel_local.z).max(0.0);

        let mu = match self.kind {
            ContactType::Bogey => {
                let brake = match self.brake_group {
                    BrakeGroup::Left => inp.brakes.x,
                    BrakeGroup::Right => inp.brakes.y,
                    BrakeGroup::Center => inp.brakes.z,
                    BrakeGroup::None => 0.0,
                };
                self.rolling_friction + brake * (self.static_friction - self.rolling_friction)
            }
            ContactType::Structure => self.dynamic_friction,
        };
        let horizontal = Vector3::new(vel_local.x, vel_local.y, 0.0);
        let speed = horizontal.norm();
        let friction = if speed > f64::EPSILON {
            -horizontal / speed * mu * normal * (speed / FRICTION_FADE_SPEED).min(1.0)
        } else {
            Vector3::zeros()
        };

        let force_local = friction + Vector3::new(0.0, 0.0, -normal);
        self.force = inp.tl2b * force_local;
        self.wow_node.set_bool(true);
        self.compression_node.set(self.compression);
        (self.force, arm)
    }
}

pub struct GroundReactions {
    base: ModelBase,
    pub inputs: GroundReactionsInputs,
    pm: PropertyManager,

    contacts: Vec<Contact>,

    // State
    forces: Vector3<f64>,
    moments: Vector3<f64>,

    published: Published<8>,
}

impl GroundReactions {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("ground_reactions"),
            inputs: GroundReactionsInputs::default(),
            pm: pm.clone(),
            contacts: Vec::new(),
            forces: Vector3::zeros(),
            moments: Vector3::zeros(),
            published: Published::bind(
                pm,
                [
                    "gear/num-units",
                    "gear/wow",
                    "forces/fbx-gear-lbs",
                    "forces/fby-gear-lbs",
                    "forces/fbz-gear-lbs",
                    "moments/l-gear-lbsft",
                    "moments/m-gear-lbsft",
                    "moments/n-gear-lbsft",
                ],
            ),
        }
    }

    pub fn num_gear_units(&self) -> usize {
        self.contacts.len()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Weight on wheels of any contact
    pub fn wow(&self) -> bool {
        self.contacts.iter().any(Contact::wow)
    }

    pub fn forces(&self) -> Vector3<f64> {
        self.forces
    }

    pub fn moments(&self) -> Vector3<f64> {
        self.moments
    }

    fn publish(&self) {
        self.published.publish([
            self.contacts.len() as f64,
            if self.wow() { 1.0 } else { 0.0 },
            self.forces.x,
            self.forces.y,
            self.forces.z,
            self.moments.x,
            self.moments.y,
            self.moments.z,
        ]);
    }
}

impl Model for GroundReactions {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn init_model(&mut self) -> Result<(), ModelError> {
        self.base.init();
        self.contacts.iter_mut().for_each(Contact::clear);
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

        self.forces = Vector3::zeros();
        self.moments = Vector3::zeros();
        for contact in &mut self.contacts {
            let (force, arm) = contact.calculate(&self.inputs);
            self.forces += force;
            self.moments += arm.cross(&force);
        }
        self.publish();
        false
    }

    fn load(&mut self, el: &Element, ctx: &LoadContext<'_>) -> Result<(), ModelError> {
        for contact_el in el.find_all("contact") {
            let contact = Contact::load(contact_el, self.contacts.len(), &self.pm)?;
            if ctx.debug.startup() {
                info!(
                    "    Contact {} ({:?}) at [{:.2}, {:.2}, {:.2}] in",
                    contact.name,
                    contact.kind,
                    contact.location.x,
                    contact.location.y,
                    contact.location.z
                );
            }
            self.contacts.push(contact);
        }
        self.publish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AssetPaths;
    use crate::logging::DebugLevel;
    use approx::assert_relative_eq;

    fn contact(name: &str, x: f64, z: f64, retractable: bool) -> Element {
        Element::new("contact")
            .with_attr("type", "BOGEY")
            .with_attr("name", name)
            .with_child(
                Element::new("location")
                    .with_attr("unit", "IN")
                    .with_child(Element::new("x").with_value(x))
                    .with_child(Element::new("z").with_value(z)),
            )
            .with_child(Element::new("spring_coeff").with_attr("unit", "LBS/FT").with_value(1000))
            .with_child(Element::new("retractable").with_value(if retractable { 1 } else { 0 }))
    }

    fn loaded(pm: &PropertyManager, retractable: bool) -> GroundReactions {
        let paths = AssetPaths::default();
        let ctx = LoadContext {
            pm,
            paths: &paths,
            dt: 0.01,
            debug: DebugLevel(0),
        };
        let el = Element::new("ground_reactions").with_child(contact("NOSE", 100.0, -36.0, retractable));
        let mut gr = GroundReactions::new(pm);
        gr.load(&el, &ctx).unwrap();
        gr.init_model().unwrap();
        gr
    }

    #[test]
    fn test_airborne_no_force() {
        let pm = PropertyManager::new();
        let mut gr = loaded(&pm, false);
        gr.inputs.cg = Vector3::new(100.0, 0.0, 0.0);
        gr.inputs.altitude_agl = 10.0;
        gr.run(false);
        assert!(!gr.wow());
        assert_eq!(gr.forces(), Vector3::zeros());
        assert_eq!(pm.get("gear/num-units"), Some(1.0));
    }

    #[test]
    fn test_compression_force() {
        let pm = PropertyManager::new();
        let mut gr = loaded(&pm, false);
        gr.inputs.cg = Vector3::new(100.0, 0.0, 0.0);
        // contact 3 ft below the CG, CG 2.5 ft above the ground
        gr.inputs.altitude_agl = 2.5;
        gr.run(false);
        assert!(gr.wow());
        assert_relative_eq!(gr.contacts()[0].compression(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(gr.forces().z, -500.0, epsilon = 1e-9);
        assert_eq!(pm.get("gear/unit/WOW"), Some(1.0));
    }

    #[test]
    fn test_retracted_gear_does_not_touch() {
        let pm = PropertyManager::new();
        let mut gr = loaded(&pm, true);
        gr.inputs.cg = Vector3::new(100.0, 0.0, 0.0);
        gr.inputs.altitude_agl = 2.5;
        gr.inputs.gear_pos = 0.0;
        gr.run(false);
        assert!(!gr.wow());
        gr.inputs.gear_pos = 1.0;
        gr.run(false);
        assert!(gr.wow());
    }

    #[test]
    fn test_friction_opposes_motion() {
        let pm = PropertyManager::new();
        let mut gr = loaded(&pm, false);
        gr.inputs.cg = Vector3::new(100.0, 0.0, 0.0);
        gr.inputs.altitude_agl = 2.5;
        gr.inputs.uvw = Vector3::new(20.0, 0.0, 0.0);
        gr.inputs.brakes = Vector3::new(1.0, 1.0, 1.0);
        gr.run(false);
        // no brake group: rolling friction only
        assert_relative_eq!(gr.forces().x, -0.02 * 500.0, epsilon = 1e-9);
    }
}
