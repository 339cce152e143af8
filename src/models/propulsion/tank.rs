//! Fuel and oxidizer tanks, including solid propellant grains

use nalgebra::Vector3;
use tracing::{info, warn};

use crate::config::Element;
use crate::error::ModelError;
use crate::property::{PropertyManager, PropertyNode};
use crate::utils::constants::LB_TO_SLUG;
use crate::utils::indexed_property_name;

/// Temperature marker for a tank without thermal modelling
const TEMPERATURE_UNSET: f64 = -9999.0;

/// Smallest capacity a tank may have, lbs
const MIN_CAPACITY: f64 = 0.00001;

/// Density used for unknown fuel names, lbs/gal
const DEFAULT_FUEL_DENSITY: f64 = 6.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankType {
    Fuel,
    Oxidizer,
    Unknown,
}

/// Solid propellant grain shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrainType {
    Cylindrical,
    EndBurning,
}

/// Density of a named fuel in lbs/gal; unknown names fall back to 6.6
pub fn fuel_density(name: &str) -> f64 {
    match name {
        "AVGAS" => 6.02,
        "JET-A" | "JET-A1" => 6.74,
        "JET-B" => 6.48,
        "JP-1" => 6.76,
        "JP-2" => 6.38,
        "JP-3" => 6.34,
        "JP-4" => 6.48,
        "JP-5" => 6.81,
        "JP-6" => 6.55,
        "JP-7" => 6.61,
        "JP-8" | "JP-8+100" => 6.66,
        "RP-1" => 6.73,
        "T-1" => 6.88,
        "ETHANOL" => 6.58,
        "HYDRAZINE" => 8.61,
        "F-34" => 6.66,
        "F-35" => 6.74,
        "F-40" => 6.48,
        "F-44" => 6.81,
        "AVTAG" => 6.48,
        "AVCAT" => 6.81,
        other => {
            warn!(fuel = other, "Unknown fuel type specified");
            DEFAULT_FUEL_DENSITY
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tank {
    index: usize,
    tank_type: TankType,
    grain: Option<GrainType>,

    // Parameters
    location: Vector3<f64>,
    drain_location: Vector3<f64>,
    radius: f64,
    inertia_factor: f64,
    capacity: f64,
    area: f64,
    /// lbs/gal for liquids, slug/in^3 for grains
    density: f64,
    length: f64,

    initial_contents: f64,
    initial_temperature: f64,
    initial_standpipe: f64,
    initial_priority: u32,

    // State
    contents: f64,
    pct_full: f64,
    temperature: f64,
    standpipe: f64,
    priority: u32,
    external_flow: f64,
    inner_radius: f64,
    volume: f64,
    ixx: f64,
    iyy: f64,
    izz: f64,

    contents_node: PropertyNode,
    pct_full_node: PropertyNode,
    priority_node: PropertyNode,
    external_flow_node: PropertyNode,
}

impl Tank {
    /// Build tank number `index` from its `tank` element
    pub fn load(el: &Element, index: usize, pm: &PropertyManager) -> Result<Self, ModelError> {
        let tank_type = match el.attr("type") {
            Some("FUEL") => TankType::Fuel,
            Some("OXIDIZER") => TankType::Oxidizer,
            _ => TankType::Unknown,
        };

        let location = match el.find("location") {
            Some(loc) => loc.triplet_convert_to("IN")?,
            None => {
                warn!(tank = index, "No location found for this tank");
                Vector3::zeros()
            }
        };
        let drain_location = match el.find("drain_location") {
            Some(loc) => loc.triplet_convert_to("IN")?,
            None => location,
        };

        let mut capacity = el.value_or("capacity", "LBS", MIN_CAPACITY)?;
        let mut contents = el.value_or("contents", "LBS", 0.0)?;
        if capacity == 0.0 {
            warn!(tank = index, "Tank capacity must not be zero. Reset to 0.00001 lbs!");
            capacity = MIN_CAPACITY;
            contents = 0.0;
        }

        let mut temperature = el.number_or("temperature", TEMPERATURE_UNSET)?;
        if temperature != TEMPERATURE_UNSET {
            temperature = (temperature - 32.0) * 5.0 / 9.0;
        }

        let priority = match el.find("priority") {
            Some(p) => p.value_as_number()?.max(0.0) as u32,
            None => 1,
        };
        let density = el.value_or("density", "LBS/GAL", DEFAULT_FUEL_DENSITY)?;

        let mut tank = Self {
            index,
            tank_type,
            grain: None,
            location,
            drain_location,
            radius: el.value_or("radius", "IN", 0.0)?,
            inertia_factor: el.number_or("inertia_factor", 1.0)?,
            capacity,
            area: 40.0 * (capacity / 1975.0).powf(0.666_666_667),
            density,
            length: 0.0,
            initial_contents: contents,
            initial_temperature: temperature,
            initial_standpipe: el.value_or("standpipe", "LBS", 0.0)?,
            initial_priority: priority,
            contents,
            pct_full: 100.0 * contents / capacity,
            temperature,
            standpipe: 0.0,
            priority,
            external_flow: 0.0,
            inner_radius: 0.0,
            volume: 0.0,
            ixx: 0.0,
            iyy: 0.0,
            izz: 0.0,
            contents_node: PropertyNode::default(),
            pct_full_node: PropertyNode::default(),
            priority_node: PropertyNode::default(),
            external_flow_node: PropertyNode::default(),
        };
        tank.standpipe = tank.initial_standpipe;

        if let Some(grain) = el.find("grain_config") {
            tank.load_grain(grain)?;
        }
        tank.calculate_inertias();

        // a named fuel overrides an explicit density
        if let Some(name) = el.find_value("type") {
            if tank.grain.is_none() {
                tank.density = fuel_density(name);
            }
        }

        tank.bind(pm);
        tank.publish();
        Ok(tank)
    }

    fn load_grain(&mut self, grain: &Element) -> Result<(), ModelError> {
        let grain_type = match grain.attr("type") {
            Some("CYLINDRICAL") => GrainType::Cylindrical,
            Some("ENDBURNING") => GrainType::EndBurning,
            other => {
                return Err(ModelError::InvalidValue {
                    element: "grain_config".into(),
                    value: other.unwrap_or_default().to_string(),
                })
            }
        };
        self.length = grain.value_or("length", "IN", 0.0)?;
        self.inner_radius = grain.value_or("bore_diameter", "IN", 0.0)? / 2.0;

        self.volume = match grain_type {
            GrainType::Cylindrical => {
                if self.radius <= self.inner_radius {
                    return Err(ModelError::InvalidValue {
                        element: "bore_diameter".into(),
                        value: format!("{} (grain radius {})", self.inner_radius * 2.0, self.radius),
                    });
                }
                std::f64::consts::PI
                    * self.length
                    * (self.radius * self.radius - self.inner_radius * self.inner_radius)
            }
            GrainType::EndBurning => std::f64::consts::PI * self.length * self.radius * self.radius,
        };
        if self.volume <= 0.0 {
            return Err(ModelError::InvalidValue {
                element: "grain_config".into(),
                value: "zero grain volume".into(),
            });
        }
        self.density = self.contents * LB_TO_SLUG / self.volume;
        self.grain = Some(grain_type);
        Ok(())
    }

    fn bind(&mut self, pm: &PropertyManager) {
        let base = indexed_property_name("propulsion/tank", self.index);
        let node = |suffix: &str, value: f64| {
            let name = format!("{base}/{suffix}");
            pm.bind(&name, value).unwrap_or_else(|| {
                warn!(property = %name, "Failed to bind tank property");
                PropertyNode::new(value)
            })
        };
        self.contents_node = node("contents-lbs", self.contents);
        self.pct_full_node = node("pct-full", self.pct_full);
        self.priority_node = node("priority", self.priority as f64);
        self.external_flow_node = node("external-flow-rate-pps", 0.0);
    }

    /// Pick up external writes to the tank properties
    fn sync_from_properties(&mut self) {
        let contents = self.contents_node.get();
        if contents != self.contents {
            self.set_contents(contents);
        }
        let priority = self.priority_node.get().max(0.0) as u32;
        if priority != self.priority {
            self.priority = priority;
        }
        self.external_flow = self.external_flow_node.get();
    }

    fn publish(&self) {
        self.contents_node.set(self.contents);
        self.pct_full_node.set(self.pct_full);
        self.priority_node.set(self.priority as f64);
    }

    pub fn reset_to_ic(&mut self) {
        self.temperature = self.initial_temperature;
        self.standpipe = self.initial_standpipe;
        self.set_contents(self.initial_contents);
        self.priority = self.initial_priority;
        self.external_flow = 0.0;
        self.external_flow_node.set(0.0);
        self.publish();
    }

    /// Remove `used` lbs; returns what is left, negative if the tank ran dry
    pub fn drain(&mut self, used: f64) -> f64 {
        let remaining = self.contents - used;
        if remaining >= 0.0 {
            self.contents -= used;
            self.pct_full = 100.0 * self.contents / self.capacity;
        } else {
            self.contents = 0.0;
            self.pct_full = 0.0;
        }
        if self.grain.is_some() {
            self.calculate_inertias();
        }
        self.publish();
        remaining
    }

    /// Add `amount` lbs; returns the overage that did not fit
    pub fn fill(&mut self, amount: f64) -> f64 {
        let mut overage = 0.0;
        self.contents += amount;
        if self.contents > self.capacity {
            overage = self.contents - self.capacity;
            self.contents = self.capacity;
            self.pct_full = 100.0;
        } else {
            self.pct_full = self.contents / self.capacity * 100.0;
        }
        self.publish();
        overage
    }

    pub fn set_contents(&mut self, amount: f64) {
        self.contents = amount.min(self.capacity);
        self.pct_full = if self.contents >= self.capacity {
            100.0
        } else {
            self.contents / self.capacity * 100.0
        };
        self.publish();
    }

    pub fn set_contents_gallons(&mut self, gallons: f64) {
        self.set_contents(gallons * self.density);
    }

    /// Apply the external flow and heat exchange with the air over `dt`
    ///
    /// Returns the tank temperature in Celsius, or zero when the tank has
    /// no temperature.
    pub fn calculate(&mut self, dt: f64, tat_c: f64) -> f64 {
        self.sync_from_properties();
        if self.external_flow < 0.0 {
            self.drain(-self.external_flow * dt);
        } else {
            self.fill(self.external_flow * dt);
        }

        if self.temperature == TEMPERATURE_UNSET {
            return 0.0;
        }
        let heat_capacity = 900.0; // J/lbm/C
        let temp_flow_factor = 1.115; // W/ft^2/C
        let t_diff = tat_c - self.temperature;
        let mut d_temp = 0.0;
        if t_diff.abs() > 0.1 && self.contents > 0.0 {
            d_temp = (temp_flow_factor * self.area * t_diff * dt) / (self.contents * heat_capacity);
        }
        // upper and lower surfaces exchange alike
        self.temperature += d_temp + d_temp;
        self.temperature
    }

    fn calculate_inertias(&mut self) {
        let mass = self.contents * LB_TO_SLUG;
        let rad2 = self.radius * self.radius;

        match self.grain {
            Some(grain) => {
                self.volume = if self.density > 0.0 {
                    mass / self.density
                } else {
                    0.0
                };
                match grain {
                    GrainType::Cylindrical => {
                        let bore2 = (rad2 - self.volume / (std::f64::consts::PI * self.length)).max(0.0);
                        self.inner_radius = bore2.sqrt();
                        let rad_sum_sqr = (rad2 + bore2) / 144.0;
                        self.ixx = 0.5 * mass * rad_sum_sqr;
                        self.iyy = mass * (3.0 * rad_sum_sqr + self.length * self.length / 144.0) / 12.0;
                    }
                    GrainType::EndBurning => {
                        self.length = self.volume / (std::f64::consts::PI * rad2);
                        self.ixx = 0.5 * mass * rad2 / 144.0;
                        self.iyy = mass * (3.0 * rad2 + self.length * self.length) / (144.0 * 12.0);
                    }
                }
                self.izz = self.iyy;
            }
            None => {
                if self.radius > 0.0 {
                    let i = mass * self.inertia_factor * 0.4 * rad2 / 144.0;
                    self.ixx = i;
                    self.iyy = i;
                    self.izz = i;
                }
            }
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn tank_type(&self) -> TankType {
        self.tank_type
    }

    pub fn grain(&self) -> Option<GrainType> {
        self.grain
    }

    pub fn contents(&self) -> f64 {
        self.contents
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn pct_full(&self) -> f64 {
        self.pct_full
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: u32) {
        self.priority = priority;
        self.publish();
    }

    /// Tanks with priority zero are not selected for feeding
    pub fn is_selected(&self) -> bool {
        self.priority > 0
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn temperature_c(&self) -> Option<f64> {
        (self.temperature != TEMPERATURE_UNSET).then_some(self.temperature)
    }

    pub fn standpipe(&self) -> f64 {
        self.standpipe
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn external_flow(&self) -> f64 {
        self.external_flow
    }

    pub fn set_external_flow(&mut self, flow: f64) {
        self.external_flow = flow;
        self.external_flow_node.set(flow);
    }

    /// Structural location of the contents, interpolated toward the drain
    /// as the tank empties
    pub fn xyz(&self) -> Vector3<f64> {
        self.drain_location + (self.location - self.drain_location) * (self.contents / self.capacity)
    }

    /// Principal moments of inertia about the tank centre, slug*ft^2
    pub fn inertias(&self) -> Vector3<f64> {
        Vector3::new(self.ixx, self.iyy, self.izz)
    }

    pub fn echo(&self) {
        info!(
            "      {:?} tank {}: capacity {} lbs, contents {} lbs, priority {}",
            self.tank_type, self.index, self.capacity, self.contents, self.priority
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tank_el() -> Element {
        Element::new("tank")
            .with_attr("type", "FUEL")
            .with_child(
                Element::new("location")
                    .with_attr("unit", "IN")
                    .with_child(Element::new("x").with_value(100))
                    .with_child(Element::new("z").with_value(-10)),
            )
            .with_child(Element::new("capacity").with_attr("unit", "LBS").with_value(500))
            .with_child(Element::new("contents").with_attr("unit", "LBS").with_value(250))
            .with_child(Element::new("radius").with_attr("unit", "IN").with_value(12))
    }

    #[test]
    fn test_load_defaults() {
        let pm = PropertyManager::new();
        let tank = Tank::load(&tank_el(), 0, &pm).unwrap();
        assert_eq!(tank.tank_type(), TankType::Fuel);
        assert_eq!(tank.priority(), 1);
        assert_relative_eq!(tank.pct_full(), 50.0);
        assert_relative_eq!(tank.density(), 6.6);
        assert!(tank.temperature_c().is_none());
        assert_eq!(pm.get("propulsion/tank/contents-lbs"), Some(250.0));
    }

    #[test]
    fn test_drain_and_fill() {
        let pm = PropertyManager::new();
        let mut tank = Tank::load(&tank_el(), 1, &pm).unwrap();
        assert_relative_eq!(tank.drain(50.0), 200.0);
        assert!(tank.drain(300.0) < 0.0);
        assert_eq!(tank.contents(), 0.0);
        assert_relative_eq!(tank.fill(600.0), 100.0);
        assert_relative_eq!(tank.pct_full(), 100.0);
        assert_eq!(pm.get("propulsion/tank[1]/pct-full"), Some(100.0));
    }

    #[test]
    fn test_named_fuel_density() {
        let pm = PropertyManager::new();
        let el = tank_el().with_child(Element::new("type").with_value("JET-A"));
        let tank = Tank::load(&el, 0, &pm).unwrap();
        assert_relative_eq!(tank.density(), 6.74);
        assert_relative_eq!(fuel_density("KEROSENE-X"), 6.6);
    }

    #[test]
    fn test_zero_capacity_reset() {
        let pm = PropertyManager::new();
        let el = Element::new("tank")
            .with_child(Element::new("capacity").with_value(0))
            .with_child(Element::new("contents").with_value(10));
        let tank = Tank::load(&el, 0, &pm).unwrap();
        assert_eq!(tank.capacity(), MIN_CAPACITY);
        assert_eq!(tank.contents(), 0.0);
    }

    #[test]
    fn test_liquid_inertia() {
        let pm = PropertyManager::new();
        let tank = Tank::load(&tank_el(), 0, &pm).unwrap();
        let expected = 250.0 * LB_TO_SLUG * 0.4 * 144.0 / 144.0;
        assert_relative_eq!(tank.inertias().x, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_location_moves_toward_drain() {
        let pm = PropertyManager::new();
        let el = tank_el().with_child(
            Element::new("drain_location")
                .with_attr("unit", "IN")
                .with_child(Element::new("x").with_value(100))
                .with_child(Element::new("z").with_value(-30)),
        );
        let tank = Tank::load(&el, 0, &pm).unwrap();
        assert_relative_eq!(tank.xyz().z, -20.0);
    }

    #[test]
    fn test_external_flow_and_property_write() {
        let pm = PropertyManager::new();
        let mut tank = Tank::load(&tank_el(), 0, &pm).unwrap();
        pm.set("propulsion/tank/external-flow-rate-pps", -10.0);
        tank.calculate(1.0, 15.0);
        assert_relative_eq!(tank.contents(), 240.0);

        pm.set("propulsion/tank/external-flow-rate-pps", 0.0);
        pm.set("propulsion/tank/contents-lbs", 900.0);
        tank.calculate(1.0, 15.0);
        assert_relative_eq!(tank.contents(), 500.0);
    }

    #[test]
    fn test_temperature_exchange() {
        let pm = PropertyManager::new();
        let el = tank_el().with_child(Element::new("temperature").with_value(32.0));
        let mut tank = Tank::load(&el, 0, &pm).unwrap();
        assert_eq!(tank.temperature_c(), Some(0.0));
        let t = tank.calculate(1.0, 20.0);
        assert!(t > 0.0 && t < 20.0);
    }

    #[test]
    fn test_end_burning_grain() {
        let pm = PropertyManager::new();
        let el = tank_el().with_child(
            Element::new("grain_config")
                .with_attr("type", "ENDBURNING")
                .with_child(Element::new("length").with_attr("unit", "IN").with_value(40)),
        );
        let mut tank = Tank::load(&el, 0, &pm).unwrap();
        assert_eq!(tank.grain(), Some(GrainType::EndBurning));
        let iyy_full = tank.inertias().y;
        tank.drain(125.0);
        assert!(tank.inertias().y < iyy_full);
    }

    #[test]
    fn test_bad_bore_rejected() {
        let pm = PropertyManager::new();
        let el = tank_el().with_child(
            Element::new("grain_config")
                .with_attr("type", "CYLINDRICAL")
                .with_child(Element::new("length").with_value(40))
                .with_child(Element::new("bore_diameter").with_value(30)),
        );
        assert!(Tank::load(&el, 0, &pm).is_err());
    }
}
