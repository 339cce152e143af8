//! Mass balance - weight, CG and inertia of the vehicle
//!
//! Sums the empty vehicle, point masses, tank contents and lifting gas into
//! a total weight, a CG in structural inches and an inertia tensor about
//! that CG.

use nalgebra::{Matrix3, Vector3};
use tracing::{info, warn};

use super::Published;
use crate::config::Element;
use crate::error::ModelError;
use crate::model::{LoadContext, Model, ModelBase};
use crate::property::{PropertyManager, PropertyNode};
use crate::utils::constants::{INCH_TO_FT, LB_TO_SLUG, SLUG_TO_LB};
use crate::utils::indexed_property_name;

/// Structural location (inches, x aft, z up) to a body-axes arm about the
/// CG in feet
pub fn structural_to_body(location: &Vector3<f64>, cg: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(
        -(location.x - cg.x),
        location.y - cg.y,
        -(location.z - cg.z),
    ) * INCH_TO_FT
}

/// Inertia of a point mass (slugs) at body arm `arm` (ft)
pub fn point_mass_inertia(mass: f64, arm: &Vector3<f64>) -> Matrix3<f64> {
    let (x, y, z) = (arm.x, arm.y, arm.z);
    Matrix3::new(
        y * y + z * z,
        -x * y,
        -x * z,
        -x * y,
        x * x + z * z,
        -y * z,
        -x * z,
        -y * z,
        x * x + y * y,
    ) * mass
}

#[derive(Debug, Clone, Default)]
pub struct MassBalanceInputs {
    pub tanks_weight: f64,
    /// lbs*in
    pub tanks_moment: Vector3<f64>,
    /// slug*ft^2 about the CG
    pub tanks_inertia: Matrix3<f64>,
    /// slugs
    pub gas_mass: f64,
    /// lbs*in
    pub gas_moment: Vector3<f64>,
    pub gas_inertia: Matrix3<f64>,
}

#[derive(Debug, Clone)]
pub struct PointMass {
    pub name: String,
    pub location: Vector3<f64>,
    /// Own inertia about the mass centre, slug*ft^2
    pub inertia: Matrix3<f64>,
    weight: PropertyNode,
}

impl PointMass {
    pub fn weight(&self) -> f64 {
        self.weight.get()
    }

    pub fn set_weight(&self, weight: f64) {
        self.weight.set(weight);
    }
}

const PUBLISHED: [&str; 12] = [
    "inertia/mass-slugs",
    "inertia/weight-lbs",
    "inertia/empty-weight-lbs",
    "inertia/cg-x-in",
    "inertia/cg-y-in",
    "inertia/cg-z-in",
    "inertia/ixx-slugs_ft2",
    "inertia/iyy-slugs_ft2",
    "inertia/izz-slugs_ft2",
    "inertia/ixy-slugs_ft2",
    "inertia/ixz-slugs_ft2",
    "inertia/iyz-slugs_ft2",
];

pub struct MassBalance {
    base: ModelBase,
    pub inputs: MassBalanceInputs,
    pm: PropertyManager,

    // Parameters
    empty_weight: f64,
    empty_cg: Vector3<f64>,
    base_j: Matrix3<f64>,
    point_masses: Vec<PointMass>,

    // State
    weight: f64,
    mass: f64,
    cg: Vector3<f64>,
    j: Matrix3<f64>,
    j_inv: Matrix3<f64>,

    published: Published<12>,
}

impl MassBalance {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("mass_balance"),
            inputs: MassBalanceInputs::default(),
            pm: pm.clone(),
            empty_weight: 0.0,
            empty_cg: Vector3::zeros(),
            base_j: Matrix3::identity(),
            point_masses: Vec::new(),
            weight: 0.0,
            mass: 0.0,
            cg: Vector3::zeros(),
            j: Matrix3::identity(),
            j_inv: Matrix3::identity(),
            published: Published::bind(pm, PUBLISHED),
        }
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// slugs
    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn empty_weight(&self) -> f64 {
        self.empty_weight
    }

    /// CG in structural inches
    pub fn xyz_cg(&self) -> Vector3<f64> {
        self.cg
    }

    pub fn j(&self) -> Matrix3<f64> {
        self.j
    }

    pub fn j_inv(&self) -> Matrix3<f64> {
        self.j_inv
    }

    pub fn point_masses(&self) -> &[PointMass] {
        &self.point_masses
    }

    pub fn structural_to_body(&self, location: &Vector3<f64>) -> Vector3<f64> {
        structural_to_body(location, &self.cg)
    }

    pub fn mass_properties_report(&self) -> String {
        let mut report = String::from("  Mass properties report:\n");
        report.push_str(&format!(
            "    Empty weight: {:.2} lbs at [{:.2}, {:.2}, {:.2}] in\n",
            self.empty_weight, self.empty_cg.x, self.empty_cg.y, self.empty_cg.z
        ));
        for pm in &self.point_masses {
            report.push_str(&format!(
                "    Point mass {}: {:.2} lbs at [{:.2}, {:.2}, {:.2}] in\n",
                pm.name,
                pm.weight(),
                pm.location.x,
                pm.location.y,
                pm.location.z
            ));
        }
        report.push_str(&format!(
            "    Tanks: {:.2} lbs, gas: {:.2} lbs\n",
            self.inputs.tanks_weight,
            self.inputs.gas_mass * SLUG_TO_LB
        ));
        report.push_str(&format!(
            "    Total: {:.2} lbs, CG [{:.2}, {:.2}, {:.2}] in\n",
            self.weight, self.cg.x, self.cg.y, self.cg.z
        ));
        report.push_str(&format!(
            "    Ixx {:.1}  Iyy {:.1}  Izz {:.1} slug*ft^2\n",
            self.j[(0, 0)],
            self.j[(1, 1)],
            self.j[(2, 2)]
        ));
        report
    }

    fn calculate(&mut self) {
        let point_weight: f64 = self.point_masses.iter().map(PointMass::weight).sum();
        let point_moment: Vector3<f64> = self
            .point_masses
            .iter()
            .map(|p| p.location * p.weight())
            .sum();
        let gas_weight = self.inputs.gas_mass * SLUG_TO_LB;

        self.weight = self.empty_weight + self.inputs.tanks_weight + gas_weight + point_weight;
        self.mass = self.weight * LB_TO_SLUG;

        if self.weight > 0.0 {
            self.cg = (self.empty_cg * self.empty_weight
                + self.inputs.tanks_moment
                + self.inputs.gas_moment
                + point_moment)
                / self.weight;
        }

        let mut j = self.base_j;
        for p in &self.point_masses {
            let arm = structural_to_body(&p.location, &self.cg);
            j += p.inertia + point_mass_inertia(p.weight() * LB_TO_SLUG, &arm);
        }
        j += self.inputs.tanks_inertia + self.inputs.gas_inertia;
        self.j = j;

        match j.try_inverse() {
            Some(inv) => self.j_inv = inv,
            None => warn!("Inertia tensor is singular; keeping the previous inverse"),
        }

        self.published.publish([
            self.mass,
            self.weight,
            self.empty_weight,
            self.cg.x,
            self.cg.y,
            self.cg.z,
            self.j[(0, 0)],
            self.j[(1, 1)],
            self.j[(2, 2)],
            -self.j[(0, 1)],
            self.j[(0, 2)],
            -self.j[(1, 2)],
        ]);
    }
}

/// Inertia tensor from structural-axis moments and products
fn inertia_tensor(el: &Element) -> Result<Matrix3<f64>, ModelError> {
    let get = |name: &str| el.value_or(name, "SLUG*FT2", 0.0);
    let (ixx, iyy, izz) = (get("ixx")?, get("iyy")?, get("izz")?);
    let (ixy, ixz, iyz) = (get("ixy")?, get("ixz")?, get("iyz")?);
    Ok(Matrix3::new(
        ixx, -ixy, ixz, //
        -ixy, iyy, -iyz, //
        ixz, -iyz, izz,
    ))
}

impl Model for MassBalance {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn init_model(&mut self) -> Result<(), ModelError> {
        self.base.init();
        self.calculate();
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
        self.empty_weight = el.find_value_as_number_convert_to("emptywt", "LBS")?;
        self.empty_cg = el.find_triplet_convert_to("location", "IN")?;
        self.base_j = inertia_tensor(el)?;

        for (i, p) in el.find_all("pointmass").enumerate() {
            let name = p.attr("name").unwrap_or("pointmass").to_string();
            let weight = p.find_value_as_number_convert_to("weight", "LBS")?;
            let location = p.find_triplet_convert_to("location", "IN")?;
            let node_name = indexed_property_name("inertia/pointmass-weight-lbs", i);
            let node = self.pm.bind(&node_name, weight).unwrap_or_else(|| {
                warn!(property = %node_name, "Failed to bind point mass weight");
                PropertyNode::new(weight)
            });
            self.point_masses.push(PointMass {
                name,
                location,
                inertia: inertia_tensor(p)?,
                weight: node,
            });
        }

        self.calculate();
        if ctx.debug.startup() {
            info!(
                "    Mass balance: empty weight {} lbs, {} point mass(es)",
                self.empty_weight,
                self.point_masses.len()
            );
        }
        Ok(())
    }
}
