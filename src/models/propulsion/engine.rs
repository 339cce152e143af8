//! Engines and their thrusters
//!
//! An engine is declared in the vehicle's `propulsion` section and refers to
//! two separate documents: the engine definition (maximum thrust, sea-level
//! fuel flow) and the thruster definition. Both are looked up first in the
//! vehicle's `Engines` directory, then in the engine path.
//!
//! ```json
//! { "name": "engine", "attributes": { "file": "J85" }, "children": [
//!     { "name": "location", "attributes": { "unit": "IN" }, "children": [
//!         { "name": "x", "value": 300 } ] },
//!     { "name": "feed", "value": 0 },
//!     { "name": "thruster", "attributes": { "file": "direct" } }
//! ] }
//! ```

use std::path::PathBuf;

use nalgebra::Vector3;
use tracing::{info, warn};

use crate::config::{resolve_document, Element};
use crate::error::ModelError;
use crate::model::LoadContext;
use crate::property::{PropertyManager, PropertyNode};
use crate::utils::indexed_property_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineType {
    Piston,
    Turbine,
    Turboprop,
    Rocket,
    Electric,
    Unknown,
}

impl EngineType {
    fn from_document(name: &str) -> Self {
        match name {
            "piston_engine" => EngineType::Piston,
            "turbine_engine" => EngineType::Turbine,
            "turboprop_engine" => EngineType::Turboprop,
            "rocket_engine" => EngineType::Rocket,
            "electric_engine" => EngineType::Electric,
            _ => EngineType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrusterType {
    Direct,
    Nozzle,
    Propeller,
    Rotor,
}

/// Converts engine output into a body force at its own placement
#[derive(Debug, Clone)]
pub struct Thruster {
    pub name: String,
    pub kind: ThrusterType,
    /// Fraction of engine thrust delivered
    pub efficiency: f64,
    /// Structural location, inches
    pub location: Vector3<f64>,
    /// Roll, pitch and yaw of the thrust line, radians
    pub orientation: Vector3<f64>,
    thrust: f64,
}

impl Thruster {
    fn load(
        el: &Element,
        engine_location: Vector3<f64>,
        engine_orientation: Vector3<f64>,
        search: &[PathBuf],
    ) -> Result<Self, ModelError> {
        let file = el
            .attr("file")
            .ok_or_else(|| ModelError::MissingElement("thruster file".into()))?;
        let path = resolve_document("thruster file", file, search)?;
        let doc = Element::from_file(&path)?;

        let kind = match doc.name.as_str() {
            "direct" => ThrusterType::Direct,
            "nozzle" => ThrusterType::Nozzle,
            "propeller" => ThrusterType::Propeller,
            "rotor" => ThrusterType::Rotor,
            other => {
                return Err(ModelError::InvalidValue {
                    element: "thruster".into(),
                    value: other.to_string(),
                })
            }
        };

        let location = match el.find("location") {
            Some(loc) => loc.triplet_convert_to("IN")?,
            None => engine_location,
        };
        let orientation = match el.find("orient") {
            Some(orient) => orient.triplet_convert_to("RAD")?,
            None => engine_orientation,
        };

        Ok(Self {
            name: doc.attr("name").unwrap_or(file).to_string(),
            kind,
            efficiency: doc.number_or("efficiency", 1.0)?,
            location,
            orientation,
            thrust: 0.0,
        })
    }

    /// Thrust line in body axes
    pub fn direction(&self) -> Vector3<f64> {
        let (sp, cp) = self.orientation.y.sin_cos();
        let (sy, cy) = self.orientation.z.sin_cos();
        Vector3::new(cp * cy, cp * sy, -sp)
    }

    pub fn thrust(&self) -> f64 {
        self.thrust
    }

    pub fn body_force(&self) -> Vector3<f64> {
        self.direction() * self.thrust
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    index: usize,
    name: String,
    kind: EngineType,

    // Parameters
    max_thrust: f64,
    sl_fuel_flow_max: f64,
    min_throttle: f64,
    max_throttle: f64,
    location: Vector3<f64>,
    orientation: Vector3<f64>,
    source_tanks: Vec<usize>,
    thruster: Thruster,

    // State
    starter: bool,
    running: bool,
    starved: bool,
    cranking: bool,
    pct_power: f64,
    fuel_flow_rate: f64,
    fuel_expended: f64,
    fuel_used_lbs: f64,

    set_running_node: PropertyNode,
    thrust_node: PropertyNode,
    fuel_flow_node: PropertyNode,
    fuel_used_node: PropertyNode,
}

impl Engine {
    /// Build engine number `index` from its `engine` element
    pub fn load(el: &Element, index: usize, ctx: &LoadContext<'_>) -> Result<Self, ModelError> {
        let file = el
            .attr("file")
            .ok_or_else(|| ModelError::MissingElement("engine file".into()))?;
        let search = [
            ctx.paths.full_aircraft.join("Engines"),
            ctx.paths.engine.clone(),
        ];
        let path = resolve_document("engine file", file, &search)?;
        let doc = Element::from_file(&path)?;

        let location = match el.find("location") {
            Some(loc) => loc.triplet_convert_to("IN")?,
            None => Vector3::zeros(),
        };
        let orientation = match el.find("orient") {
            Some(orient) => orient.triplet_convert_to("RAD")?,
            None => Vector3::zeros(),
        };

        let thruster = match el.find("thruster") {
            Some(t) => Thruster::load(t, location, orientation, &search)?,
            None => {
                warn!(engine = file, "No thruster definition supplied with engine definition");
                Thruster {
                    name: "direct".into(),
                    kind: ThrusterType::Direct,
                    efficiency: 1.0,
                    location,
                    orientation,
                    thrust: 0.0,
                }
            }
        };

        let mut source_tanks = Vec::new();
        for feed in el.find_all("feed") {
            let id = feed.value_as_number()?;
            if id < 0.0 {
                return Err(ModelError::InvalidValue {
                    element: "feed".into(),
                    value: id.to_string(),
                });
            }
            source_tanks.push(id as usize);
        }

        let mut engine = Self {
            index,
            name: doc
                .attr("name")
                .or_else(|| el.attr("name"))
                .unwrap_or(file)
                .to_string(),
            kind: EngineType::from_document(&doc.name),
            max_thrust: doc.value_or("maxthrust", "LBS", 0.0)?,
            sl_fuel_flow_max: doc.value_or("sl_fuel_flow_max", "LBS/SEC", 0.0)?,
            min_throttle: doc.number_or("min_throttle", 0.0)?,
            max_throttle: doc.number_or("max_throttle", 1.0)?,
            location,
            orientation,
            source_tanks,
            thruster,
            starter: false,
            running: false,
            starved: false,
            cranking: false,
            pct_power: 0.0,
            fuel_flow_rate: 0.0,
            fuel_expended: 0.0,
            fuel_used_lbs: 0.0,
            set_running_node: PropertyNode::default(),
            thrust_node: PropertyNode::default(),
            fuel_flow_node: PropertyNode::default(),
            fuel_used_node: PropertyNode::default(),
        };
        engine.bind(ctx.pm);

        if ctx.debug.startup() {
            engine.echo();
        }
        Ok(engine)
    }

    fn bind(&mut self, pm: &PropertyManager) {
        let base = indexed_property_name("propulsion/engine", self.index);
        let node = |suffix: &str| {
            let name = format!("{base}/{suffix}");
            pm.bind(&name, 0.0).unwrap_or_else(|| {
                warn!(property = %name, "Failed to bind engine property");
                PropertyNode::default()
            })
        };
        self.set_running_node = node("set-running");
        self.thrust_node = node("thrust-lbs");
        self.fuel_flow_node = node("fuel-flow-rate-pps");
        self.fuel_used_node = node("fuel-used-lbs");
    }

    fn echo(&self) {
        info!("    Engine {}: {} ({:?})", self.index, self.name, self.kind);
        info!(
            "      Location: {:.2}, {:.2}, {:.2} in",
            self.location.x, self.location.y, self.location.z
        );
        info!("      Feeds: {:?}", self.source_tanks);
        info!("      Thruster: {} ({:?})", self.thruster.name, self.thruster.kind);
    }

    /// Return every dynamic term to its startup value
    pub fn reset_to_ic(&mut self) {
        self.starter = false;
        self.fuel_expended = 0.0;
        self.starved = false;
        self.running = false;
        self.cranking = false;
        self.pct_power = 0.0;
        self.fuel_flow_rate = 0.0;
        self.fuel_used_lbs = 0.0;
        self.thruster.thrust = 0.0;
        self.publish();
    }

    /// Pick up a write to `set-running`
    pub(crate) fn sync_from_properties(&mut self) {
        let requested = self.set_running_node.get_bool();
        if requested != self.running {
            self.running = requested;
        }
    }

    fn publish(&self) {
        self.set_running_node.set_bool(self.running);
        self.thrust_node.set(self.thruster.thrust);
        self.fuel_flow_node.set(self.fuel_flow_rate);
        self.fuel_used_node.set(self.fuel_used_lbs);
    }

    /// Compute power and thrust for this frame's throttle position
    pub fn calculate(&mut self, throttle: f64) -> f64 {
        let throttle = throttle.clamp(self.min_throttle, self.max_throttle);
        self.pct_power = if self.running && !self.starved {
            throttle
        } else {
            0.0
        };
        self.thruster.thrust = self.max_thrust * self.pct_power * self.thruster.efficiency;
        self.publish();
        self.thruster.thrust
    }

    /// Fuel burnt over `dt`, lbs
    pub fn calc_fuel_need(&mut self, dt: f64) -> f64 {
        self.fuel_flow_rate = self.sl_fuel_flow_max * self.pct_power;
        self.fuel_expended = self.fuel_flow_rate * dt;
        if !self.starved {
            self.fuel_used_lbs += self.fuel_expended;
        }
        self.publish();
        self.fuel_expended
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EngineType {
        self.kind
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
        self.publish();
    }

    /// Start the engine as if it had been running all along
    pub fn init_running(&mut self) {
        self.starter = false;
        self.cranking = false;
        self.starved = false;
        self.set_running(true);
    }

    pub fn starved(&self) -> bool {
        self.starved
    }

    pub fn set_starved(&mut self, starved: bool) {
        self.starved = starved;
    }

    pub fn starter(&self) -> bool {
        self.starter
    }

    pub fn set_starter(&mut self, starter: bool) {
        self.starter = starter;
    }

    pub fn cranking(&self) -> bool {
        self.cranking
    }

    pub fn pct_power(&self) -> f64 {
        self.pct_power
    }

    pub fn thrust(&self) -> f64 {
        self.thruster.thrust
    }

    pub fn fuel_flow_rate(&self) -> f64 {
        self.fuel_flow_rate
    }

    pub fn fuel_expended(&self) -> f64 {
        self.fuel_expended
    }

    pub fn fuel_used_lbs(&self) -> f64 {
        self.fuel_used_lbs
    }

    pub fn source_tanks(&self) -> &[usize] {
        &self.source_tanks
    }

    pub fn location(&self) -> Vector3<f64> {
        self.location
    }

    pub fn orientation(&self) -> Vector3<f64> {
        self.orientation
    }

    pub fn thruster(&self) -> &Thruster {
        &self.thruster
    }
}
