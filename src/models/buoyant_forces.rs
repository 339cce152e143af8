//! Buoyant forces - lifting gas cells
//!
//! A gas cell is an ellipsoid of lifting gas at ambient pressure and
//! temperature. It lifts the weight of the air it displaces and adds the
//! mass of its gas to the mass balance.

use nalgebra::{Matrix3, Vector3};
use tracing::info;

use super::{point_mass_inertia, structural_to_body, Published};
use crate::config::Element;
use crate::error::ModelError;
use crate::model::{LoadContext, Model, ModelBase};
use crate::property::{PropertyManager, PropertyNode};
use crate::utils::constants::{AIR_GAS_CONSTANT, ISA_SL_PRESSURE, ISA_SL_TEMPERATURE, SLUG_TO_LB};
use crate::utils::indexed_property_name;

const AIR_MOLAR_MASS: f64 = 28.9645;

#[derive(Debug, Clone)]
pub struct BuoyantForcesInputs {
    /// psf
    pub pressure: f64,
    /// Rankine
    pub temperature: f64,
    /// slugs/ft^3
    pub density: f64,
    /// ft/s^2
    pub gravity: f64,
    pub tl2b: Matrix3<f64>,
    /// CG, structural inches
    pub cg: Vector3<f64>,
}

impl Default for BuoyantForcesInputs {
    fn default() -> Self {
        Self {
            pressure: ISA_SL_PRESSURE,
            temperature: ISA_SL_TEMPERATURE,
            density: 0.0,
            gravity: 0.0,
            tl2b: Matrix3::identity(),
            cg: Vector3::zeros(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GasType {
    Hydrogen,
    Helium,
    Air,
}

impl GasType {
    fn molar_mass(self) -> f64 {
        match self {
            GasType::Hydrogen => 2.01588,
            GasType::Helium => 4.002602,
            GasType::Air => AIR_MOLAR_MASS,
        }
    }

    /// Specific gas constant, ft*lbs/(slug*R)
    fn gas_constant(self) -> f64 {
        AIR_GAS_CONSTANT * AIR_MOLAR_MASS / self.molar_mass()
    }
}

#[derive(Debug, Clone)]
pub struct GasCell {
    pub gas: GasType,
    /// Structural location, inches
    pub location: Vector3<f64>,
    /// Semi-axes, ft
    pub radii: Vector3<f64>,
    pub volume: f64,

    // State
    mass: f64,
    buoyancy: f64,

    volume_node: PropertyNode,
    mass_node: PropertyNode,
}

impl GasCell {
    fn load(el: &Element, index: usize, pm: &PropertyManager) -> Result<Self, ModelError> {
        let gas = match el.attr("type") {
            Some("HYDROGEN") => GasType::Hydrogen,
            Some("HELIUM") => GasType::Helium,
            Some("AIR") => GasType::Air,
            other => {
                return Err(ModelError::InvalidValue {
                    element: "gas_cell type".into(),
                    value: other.unwrap_or_default().to_string(),
                })
            }
        };
        let radii = Vector3::new(
            el.find_value_as_number_convert_to("x_radius", "FT")?,
            el.find_value_as_number_convert_to("y_radius", "FT")?,
            el.find_value_as_number_convert_to("z_radius", "FT")?,
        );
        let volume = 4.0 / 3.0 * std::f64::consts::PI * radii.x * radii.y * radii.z;

        let base = indexed_property_name("buoyant_forces/gas-cell", index);
        Ok(Self {
            gas,
            location: el.find_triplet_convert_to("location", "IN")?,
            radii,
            volume,
            mass: 0.0,
            buoyancy: 0.0,
            volume_node: super::settable(pm, &format!("{base}/volume-ft3"), volume),
            mass_node: super::settable(pm, &format!("{base}/mass-slug"), 0.0),
        })
    }

    /// slugs
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// lbs
    pub fn buoyancy(&self) -> f64 {
        self.buoyancy
    }

    fn calculate(&mut self, inp: &BuoyantForcesInputs) {
        self.mass = if inp.temperature > 0.0 {
            self.volume * inp.pressure / (self.gas.gas_constant() * inp.temperature)
        } else {
            0.0
        };
        self.buoyancy = self.volume * inp.density * inp.gravity;
        self.mass_node.set(self.mass);
    }

    /// Own inertia of the gas about the cell centre
    fn own_inertia(&self) -> Matrix3<f64> {
        let (a, b, c) = (self.radii.x, self.radii.y, self.radii.z);
        Matrix3::from_diagonal(&Vector3::new(b * b + c * c, a * a + c * c, a * a + b * b))
            * (self.mass / 5.0)
    }
}

pub struct BuoyantForces {
    base: ModelBase,
    pub inputs: BuoyantForcesInputs,
    pm: PropertyManager,

    cells: Vec<GasCell>,

    // State
    forces: Vector3<f64>,
    moments: Vector3<f64>,

    published: Published<7>,
}

impl BuoyantForces {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("buoyant_forces"),
            inputs: BuoyantForcesInputs::default(),
            pm: pm.clone(),
            cells: Vec::new(),
            forces: Vector3::zeros(),
            moments: Vector3::zeros(),
            published: Published::bind(
                pm,
                [
                    "buoyant_forces/gas-mass-slug",
                    "forces/fbx-buoyancy-lbs",
                    "forces/fby-buoyancy-lbs",
                    "forces/fbz-buoyancy-lbs",
                    "moments/l-buoyancy-lbsft",
                    "moments/m-buoyancy-lbsft",
                    "moments/n-buoyancy-lbsft",
                ],
            ),
        }
    }

    pub fn cells(&self) -> &[GasCell] {
        &self.cells
    }

    /// Total gas mass, slugs
    pub fn gas_mass(&self) -> f64 {
        self.cells.iter().map(GasCell::mass).sum()
    }

    /// First moment of the gas weight, lbs*in
    pub fn gas_moment(&self) -> Vector3<f64> {
        self.cells
            .iter()
            .map(|c| c.location * c.mass * SLUG_TO_LB)
            .sum()
    }

    /// Gas inertia about `cg` (structural inches)
    pub fn gas_inertia(&self, cg: &Vector3<f64>) -> Matrix3<f64> {
        self.cells
            .iter()
            .map(|c| c.own_inertia() + point_mass_inertia(c.mass, &structural_to_body(&c.location, cg)))
            .sum()
    }

    pub fn forces(&self) -> Vector3<f64> {
        self.forces
    }

    pub fn moments(&self) -> Vector3<f64> {
        self.moments
    }
}

impl Model for BuoyantForces {
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
        for cell in &mut self.cells {
            cell.volume = cell.volume_node.get();
            cell.calculate(&self.inputs);
            let force = self.inputs.tl2b * Vector3::new(0.0, 0.0, -cell.buoyancy);
            let arm = structural_to_body(&cell.location, &self.inputs.cg);
            self.forces += force;
            self.moments += arm.cross(&force);
        }
        self.published.publish([
            self.gas_mass(),
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
        for cell_el in el.find_all("gas_cell") {
            let cell = GasCell::load(cell_el, self.cells.len(), &self.pm)?;
            if ctx.debug.startup() {
                info!("    Gas cell {:?}: {:.1} ft3", cell.gas, cell.volume);
            }
            self.cells.push(cell);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AssetPaths;
    use crate::logging::DebugLevel;
    use crate::utils::constants::ISA_SL_DENSITY;
    use approx::assert_relative_eq;

    fn cell(gas: &str) -> Element {
        let radius = |axis: &str| Element::new(axis).with_attr("unit", "FT").with_value(10);
        Element::new("gas_cell")
            .with_attr("type", gas)
            .with_child(
                Element::new("location")
                    .with_attr("unit", "IN")
                    .with_child(Element::new("x").with_value(100))
                    .with_child(Element::new("z").with_value(120)),
            )
            .with_child(radius("x_radius"))
            .with_child(radius("y_radius"))
            .with_child(radius("z_radius"))
    }

    fn loaded(pm: &PropertyManager, gas: &str) -> BuoyantForces {
        let paths = AssetPaths::default();
        let ctx = LoadContext {
            pm,
            paths: &paths,
            dt: 0.01,
            debug: DebugLevel(0),
        };
        let mut bf = BuoyantForces::new(pm);
        bf.load(&Element::new("buoyant_forces").with_child(cell(gas)), &ctx)
            .unwrap();
        bf.inputs.density = ISA_SL_DENSITY;
        bf.inputs.gravity = 32.174;
        bf.inputs.cg = Vector3::new(100.0, 0.0, 0.0);
        bf
    }

    #[test]
    fn test_helium_lifts() {
        let pm = PropertyManager::new();
        let mut bf = loaded(&pm, "HELIUM");
        bf.run(false);

        let volume = 4.0 / 3.0 * std::f64::consts::PI * 1000.0;
        assert_relative_eq!(bf.forces().z, -volume * ISA_SL_DENSITY * 32.174, epsilon = 1e-9);
        // helium is about a seventh as dense as air
        let ratio = bf.gas_mass() / (volume * ISA_SL_DENSITY);
        assert_relative_eq!(ratio, 4.002602 / 28.9645, epsilon = 1e-3);
        // cell 10 ft above the CG, no moment from a vertical force
        assert_relative_eq!(bf.moments().norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_air_cell_is_neutral() {
        let pm = PropertyManager::new();
        let mut bf = loaded(&pm, "AIR");
        bf.run(false);
        let gas_weight = bf.gas_mass() * 32.174;
        assert_relative_eq!(gas_weight, -bf.forces().z, max_relative = 1e-3);
    }

    #[test]
    fn test_unknown_gas() {
        let pm = PropertyManager::new();
        let paths = AssetPaths::default();
        let ctx = LoadContext {
            pm: &pm,
            paths: &paths,
            dt: 0.01,
            debug: DebugLevel(0),
        };
        let el = Element::new("buoyant_forces").with_child(cell("NEON"));
        assert!(BuoyantForces::new(&pm).load(&el, &ctx).is_err());
    }
}
