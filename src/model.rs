//! Model contract shared by every scheduled sub-model
//!
//! A model is driven by the executive once per frame through [`Model::run`].
//! Before each call the executive copies the upstream values the model
//! consumes into its typed input record, so a model never reads another
//! model's live state.
//!
//! # Example
//!
//! ```ignore
//! struct Counter { base: ModelBase, runs: u32 }
//!
//! impl Model for Counter {
//!     fn base(&self) -> &ModelBase { &self.base }
//!     fn base_mut(&mut self) -> &mut ModelBase { &mut self.base }
//!
//!     fn run(&mut self, _holding: bool) -> bool {
//!         if self.base.run_gate() { return true; }
//!         self.runs += 1;
//!         false
//!     }
//! }
//! ```

use std::fmt;

use crate::config::Element;
use crate::context::AssetPaths;
use crate::error::ModelError;
use crate::logging::DebugLevel;
use crate::property::PropertyManager;

/// Frame divisor gate
///
/// After [`RateGate::init`] the gate lets frames 1, N+1, 2N+1, ... through
/// and defers every other frame. The counter is per gate and does not
/// follow the executive frame counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateGate {
    rate: u32,
    exe_ctr: u32,
}

impl RateGate {
    pub fn new(rate: u32) -> Self {
        Self {
            rate: rate.max(1),
            exe_ctr: 1,
        }
    }

    pub fn init(&mut self) {
        self.exe_ctr = 1;
    }

    /// Count one frame; `true` means the frame is deferred
    pub fn tick(&mut self) -> bool {
        if self.rate == 1 {
            return false;
        }
        if self.exe_ctr >= self.rate {
            self.exe_ctr = 0;
        }
        let ctr = self.exe_ctr;
        self.exe_ctr += 1;
        ctr != 1
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: u32) {
        self.rate = rate.max(1);
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Name and rate gate common to every model
#[derive(Debug, Clone)]
pub struct ModelBase {
    name: String,
    gate: RateGate,
}

impl ModelBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gate: RateGate::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reset the rate counter so the next frame executes
    pub fn init(&mut self) {
        self.gate.init();
    }

    /// `true` when this frame is deferred by the rate divisor
    #[inline]
    pub fn run_gate(&mut self) -> bool {
        self.gate.tick()
    }

    pub fn rate(&self) -> u32 {
        self.gate.rate()
    }

    pub fn set_rate(&mut self, rate: u32) {
        self.gate.set_rate(rate);
    }
}

/// What a model sees while loading its configuration section
#[derive(Clone, Copy)]
pub struct LoadContext<'a> {
    pub pm: &'a PropertyManager,
    pub paths: &'a AssetPaths,
    /// Executive frame timestep
    pub dt: f64,
    pub debug: DebugLevel,
}

impl fmt::Debug for LoadContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadContext")
            .field("dt", &self.dt)
            .field("debug", &self.debug)
            .finish()
    }
}

/// Lifecycle every scheduled model implements
pub trait Model {
    fn base(&self) -> &ModelBase;

    fn base_mut(&mut self) -> &mut ModelBase;

    fn name(&self) -> &str {
        self.base().name()
    }

    /// Return to the startup condition, including the rate counter
    fn init_model(&mut self) -> Result<(), ModelError> {
        self.base_mut().init();
        Ok(())
    }

    /// Execute one frame
    ///
    /// Returns `true` when the model deferred its work this frame. With
    /// `holding` set, integrating models must not advance their state.
    fn run(&mut self, holding: bool) -> bool;

    fn rate(&self) -> u32 {
        self.base().rate()
    }

    fn set_rate(&mut self, rate: u32) {
        self.base_mut().set_rate(rate);
    }

    /// Read this model's configuration section
    fn load(&mut self, _el: &Element, _ctx: &LoadContext<'_>) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Fixed pipeline positions of the standard models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelRole {
    Propagate,
    Input,
    Inertial,
    Atmosphere,
    Winds,
    Auxiliary,
    Systems,
    Propulsion,
    Aerodynamics,
    GroundReactions,
    ExternalReactions,
    BuoyantForces,
    MassBalance,
    Aircraft,
    Accelerations,
    Output,
}

impl ModelRole {
    /// Execution order
    pub const ALL: [ModelRole; 16] = [
        ModelRole::Propagate,
        ModelRole::Input,
        ModelRole::Inertial,
        ModelRole::Atmosphere,
        ModelRole::Winds,
        ModelRole::Auxiliary,
        ModelRole::Systems,
        ModelRole::Propulsion,
        ModelRole::Aerodynamics,
        ModelRole::GroundReactions,
        ModelRole::ExternalReactions,
        ModelRole::BuoyantForces,
        ModelRole::MassBalance,
        ModelRole::Aircraft,
        ModelRole::Accelerations,
        ModelRole::Output,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelRole::Propagate => "propagate",
            ModelRole::Input => "input",
            ModelRole::Inertial => "inertial",
            ModelRole::Atmosphere => "atmosphere",
            ModelRole::Winds => "winds",
            ModelRole::Auxiliary => "auxiliary",
            ModelRole::Systems => "fcs",
            ModelRole::Propulsion => "propulsion",
            ModelRole::Aerodynamics => "aerodynamics",
            ModelRole::GroundReactions => "ground_reactions",
            ModelRole::ExternalReactions => "external_reactions",
            ModelRole::BuoyantForces => "buoyant_forces",
            ModelRole::MassBalance => "mass_balance",
            ModelRole::Aircraft => "aircraft",
            ModelRole::Accelerations => "accelerations",
            ModelRole::Output => "output",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
