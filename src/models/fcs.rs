//! Flight control system
//!
//! Owns the pilot command and position channels (throttle, mixture, brakes,
//! steering, gear, primary surfaces) and the component channels loaded from
//! the `system`, `autopilot` and `flight_control` sections.
//!
//! Each frame the positions first follow their commands, then every
//! component channel runs in load order. Components may overwrite any
//! position through the property registry.

use nalgebra::Vector3;
use tracing::{info, warn};

use super::settable;
use crate::components::{load_component, FcsComponent};
use crate::config::{resolve_document, Element};
use crate::error::ModelError;
use crate::model::{LoadContext, Model, ModelBase};
use crate::property::{PropertyManager, PropertyNode};
use crate::utils::indexed_property_name;

/// Section a channel was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelGroup {
    System,
    Autopilot,
    FlightControl,
}

impl ChannelGroup {
    pub fn from_section(section: &str) -> Option<Self> {
        match section {
            "system" => Some(ChannelGroup::System),
            "autopilot" => Some(ChannelGroup::Autopilot),
            "flight_control" => Some(ChannelGroup::FlightControl),
            _ => None,
        }
    }
}

/// Ordered list of components run as one unit
pub struct Channel {
    pub name: String,
    pub group: ChannelGroup,
    components: Vec<Box<dyn FcsComponent>>,
}

impl Channel {
    pub fn components(&self) -> &[Box<dyn FcsComponent>] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FcsInputs {
    /// Set while a trim solver drives the vehicle
    pub trim_status: bool,
}

/// Command and position pair for one engine control
#[derive(Debug, Clone)]
struct EngineControl {
    cmd: PropertyNode,
    pos: PropertyNode,
}

impl EngineControl {
    fn bind(pm: &PropertyManager, base: &str, index: usize) -> Self {
        Self {
            cmd: settable(pm, &indexed_property_name(&format!("fcs/{base}-cmd-norm"), index), 0.0),
            pos: settable(pm, &indexed_property_name(&format!("fcs/{base}-pos-norm"), index), 0.0),
        }
    }
}

pub struct Fcs {
    base: ModelBase,
    pub inputs: FcsInputs,
    pm: PropertyManager,

    throttles: Vec<EngineControl>,
    mixtures: Vec<EngineControl>,

    // Primary surfaces
    aileron_cmd: PropertyNode,
    elevator_cmd: PropertyNode,
    rudder_cmd: PropertyNode,
    flap_cmd: PropertyNode,

    // Ground handling
    left_brake: PropertyNode,
    right_brake: PropertyNode,
    center_brake: PropertyNode,
    steer_cmd: PropertyNode,
    steer_pos_deg: Vec<PropertyNode>,
    gear_cmd: PropertyNode,
    gear_pos: PropertyNode,

    channels: Vec<Channel>,
}

impl Fcs {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("fcs"),
            inputs: FcsInputs::default(),
            pm: pm.clone(),
            throttles: Vec::new(),
            mixtures: Vec::new(),
            aileron_cmd: settable(pm, "fcs/aileron-cmd-norm", 0.0),
            elevator_cmd: settable(pm, "fcs/elevator-cmd-norm", 0.0),
            rudder_cmd: settable(pm, "fcs/rudder-cmd-norm", 0.0),
            flap_cmd: settable(pm, "fcs/flap-cmd-norm", 0.0),
            left_brake: settable(pm, "fcs/left-brake-cmd-norm", 0.0),
            right_brake: settable(pm, "fcs/right-brake-cmd-norm", 0.0),
            center_brake: settable(pm, "fcs/center-brake-cmd-norm", 0.0),
            steer_cmd: settable(pm, "fcs/steer-cmd-norm", 0.0),
            steer_pos_deg: Vec::new(),
            gear_cmd: settable(pm, "gear/gear-cmd-norm", 1.0),
            gear_pos: settable(pm, "gear/gear-pos-norm", 1.0),
            channels: Vec::new(),
        }
    }

    /// Add the throttle and mixture channels of one more engine
    pub fn add_throttle(&mut self) {
        let index = self.throttles.len();
        self.throttles.push(EngineControl::bind(&self.pm, "throttle", index));
        let mixture = EngineControl::bind(&self.pm, "mixture", index);
        // mixture defaults to full rich
        mixture.cmd.set(1.0);
        mixture.pos.set(1.0);
        self.mixtures.push(mixture);
    }

    /// Size the steering channel to `num_gear` contact units
    pub fn add_gear(&mut self, num_gear: usize) {
        self.steer_pos_deg = (0..num_gear)
            .map(|i| settable(&self.pm, &indexed_property_name("fcs/steer-pos-deg", i), 0.0))
            .collect();
    }

    pub fn num_throttles(&self) -> usize {
        self.throttles.len()
    }

    /// Set one throttle command, or every one with a negative index
    pub fn set_throttle_cmd(&self, engine: i32, value: f64) {
        match usize::try_from(engine) {
            Ok(i) => {
                if let Some(t) = self.throttles.get(i) {
                    t.cmd.set(value);
                }
            }
            Err(_) => self.throttles.iter().for_each(|t| t.cmd.set(value)),
        }
    }

    pub fn throttle_cmd(&self, engine: usize) -> f64 {
        self.throttles.get(engine).map_or(0.0, |t| t.cmd.get())
    }

    pub fn throttle_pos(&self, engine: usize) -> f64 {
        self.throttles.get(engine).map_or(0.0, |t| t.pos.get())
    }

    pub fn throttle_positions(&self) -> Vec<f64> {
        self.throttles.iter().map(|t| t.pos.get()).collect()
    }

    pub fn mixture_positions(&self) -> Vec<f64> {
        self.mixtures.iter().map(|m| m.pos.get()).collect()
    }

    /// Left, right and center brake commands
    pub fn brakes(&self) -> Vector3<f64> {
        Vector3::new(
            self.left_brake.get(),
            self.right_brake.get(),
            self.center_brake.get(),
        )
    }

    pub fn steer_pos_deg(&self, gear: usize) -> f64 {
        self.steer_pos_deg.get(gear).map_or(0.0, PropertyNode::get)
    }

    pub fn gear_pos(&self) -> f64 {
        self.gear_pos.get()
    }

    pub fn aileron_cmd(&self) -> f64 {
        self.aileron_cmd.get()
    }

    pub fn elevator_cmd(&self) -> f64 {
        self.elevator_cmd.get()
    }

    pub fn rudder_cmd(&self) -> f64 {
        self.rudder_cmd.get()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn component_count(&self) -> usize {
        self.channels.iter().map(Channel::len).sum()
    }

    /// Reset every component to its unstarted state
    pub fn reset_components(&mut self) {
        for channel in &mut self.channels {
            for component in &mut channel.components {
                component.reset_past_states();
            }
        }
    }

    fn load_channel(
        &mut self,
        name: &str,
        group: ChannelGroup,
        elements: &[Element],
        ctx: &LoadContext<'_>,
    ) -> Result<(), ModelError> {
        let mut components = Vec::new();
        for el in elements {
            if matches!(el.name.as_str(), "property" | "documentation" | "channel") {
                continue;
            }
            match load_component(el, ctx, ctx.dt * self.rate() as f64)? {
                Some(component) => components.push(component),
                None => warn!(component = %el.name, "Unknown FCS component type, skipping"),
            }
        }
        if ctx.debug.startup() {
            info!("    Channel {name}: {} component(s)", components.len());
        }
        if !components.is_empty() {
            self.channels.push(Channel {
                name: name.to_string(),
                group,
                components,
            });
        }
        Ok(())
    }
}

impl Model for Fcs {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn init_model(&mut self) -> Result<(), ModelError> {
        self.base.init();
        for control in self.throttles.iter().chain(self.mixtures.iter()) {
            control.pos.set(0.0);
        }
        for node in [&self.aileron_cmd, &self.elevator_cmd, &self.rudder_cmd, &self.flap_cmd] {
            node.set(0.0);
        }
        for node in &self.steer_pos_deg {
            node.set(0.0);
        }
        self.reset_components();
        Ok(())
    }

    fn run(&mut self, holding: bool) -> bool {
        if self.base.run_gate() {
            return true;
        }
        if holding {
            return false;
        }

        for control in self.throttles.iter().chain(self.mixtures.iter()) {
            control.pos.set(control.cmd.get());
        }
        let steer = self.steer_cmd.get();
        for node in &self.steer_pos_deg {
            node.set(steer);
        }
        self.gear_pos.set(self.gear_cmd.get());

        let trimming = self.inputs.trim_status;
        for channel in &mut self.channels {
            for component in &mut channel.components {
                component.run(trimming);
            }
        }
        false
    }

    /// Load one `system`, `autopilot` or `flight_control` section
    ///
    /// A `file` attribute names a separate document found under the
    /// vehicle's `Systems` directory or the systems path.
    fn load(&mut self, el: &Element, ctx: &LoadContext<'_>) -> Result<(), ModelError> {
        let group = ChannelGroup::from_section(&el.name).unwrap_or(ChannelGroup::System);

        let external;
        let section = match el.attr("file") {
            Some(file) => {
                let search = [
                    ctx.paths.full_aircraft.join("Systems"),
                    ctx.paths.systems.clone(),
                ];
                let path = resolve_document("system file", file, &search)?;
                external = Element::from_file(&path)?;
                &external
            }
            None => el,
        };

        let name = section
            .attr("name")
            .or_else(|| el.attr("name"))
            .unwrap_or(el.name.as_str())
            .to_string();
        if ctx.debug.startup() {
            info!("  Control System Name: {name}");
        }

        for prop in section.find_all("property") {
            let Some(path) = prop.value() else { continue };
            let initial = prop
                .attr("value")
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(0.0);
            if ctx.pm.has(path) {
                continue;
            }
            if ctx.pm.bind(path, initial).is_none() {
                warn!(property = path, "Failed to declare system property");
            }
        }

        for channel in section.find_all("channel") {
            let channel_name = channel.attr("name").unwrap_or("unnamed");
            self.load_channel(channel_name, group, &channel.children, ctx)?;
        }
        self.load_channel(&name, group, &section.children, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AssetPaths;
    use crate::logging::DebugLevel;

    fn ctx<'a>(pm: &'a PropertyManager, paths: &'a AssetPaths) -> LoadContext<'a> {
        LoadContext {
            pm,
            paths,
            dt: 0.01,
            debug: DebugLevel(0),
        }
    }

    #[test]
    fn test_positions_follow_commands() {
        let pm = PropertyManager::new();
        let mut fcs = Fcs::new(&pm);
        fcs.add_throttle();
        fcs.add_throttle();
        fcs.set_throttle_cmd(-1, 0.7);
        pm.set("fcs/throttle-cmd-norm[1]", 0.2);
        fcs.run(false);
        assert_eq!(fcs.throttle_positions(), vec![0.7, 0.2]);
        assert_eq!(pm.get("fcs/throttle-pos-norm"), Some(0.7));
    }

    #[test]
    fn test_init_model_zeroes_positions() {
        let pm = PropertyManager::new();
        let mut fcs = Fcs::new(&pm);
        fcs.add_throttle();
        fcs.set_throttle_cmd(0, 1.0);
        pm.set("fcs/elevator-cmd-norm", 0.5);
        fcs.run(false);
        fcs.init_model().unwrap();
        assert_eq!(fcs.throttle_pos(0), 0.0);
        assert_eq!(fcs.throttle_cmd(0), 1.0);
        assert_eq!(fcs.elevator_cmd(), 0.0);
    }

    #[test]
    fn test_load_channels_with_actuator() {
        let pm = PropertyManager::new();
        let paths = AssetPaths::default();
        let mut fcs = Fcs::new(&pm);
        let section = Element::new("flight_control")
            .with_attr("name", "FCS: test")
            .with_child(
                Element::new("property")
                    .with_attr("value", 2.0)
                    .with_value("fcs/custom-gain"),
            )
            .with_child(
                Element::new("channel").with_attr("name", "Pitch").with_child(
                    Element::new("actuator")
                        .with_attr("name", "fcs/elevator-actuator")
                        .with_child(Element::new("input").with_value("fcs/elevator-cmd-norm"))
                        .with_child(Element::new("output").with_value("fcs/elevator-pos-norm")),
                ),
            );
        fcs.load(&section, &ctx(&pm, &paths)).unwrap();
        assert_eq!(fcs.channels().len(), 1);
        assert_eq!(fcs.channels()[0].group, ChannelGroup::FlightControl);
        assert_eq!(pm.get("fcs/custom-gain"), Some(2.0));

        pm.set("fcs/elevator-cmd-norm", -0.4);
        fcs.run(false);
        assert_eq!(pm.get("fcs/elevator-pos-norm"), Some(-0.4));
    }

    #[test]
    fn test_missing_system_file_is_resource_error() {
        let pm = PropertyManager::new();
        let paths = AssetPaths::default();
        let mut fcs = Fcs::new(&pm);
        let section = Element::new("system").with_attr("file", "no-such-system");
        let err = fcs.load(&section, &ctx(&pm, &paths)).unwrap_err();
        assert!(matches!(err, ModelError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_add_gear_sizes_steering() {
        let pm = PropertyManager::new();
        let mut fcs = Fcs::new(&pm);
        fcs.add_gear(3);
        pm.set("fcs/steer-cmd-norm", 0.5);
        fcs.run(false);
        assert_eq!(fcs.steer_pos_deg(2), 0.5);
        assert!(pm.has("fcs/steer-pos-deg[2]"));
    }
}
