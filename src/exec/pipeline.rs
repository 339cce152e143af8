//! Fixed model pipeline
//!
//! The sixteen standard roles are owned as concrete fields so the wiring
//! table can read each model's outputs by role. Models scheduled at runtime
//! are appended after the standard roles and have no wiring entry.

use crate::model::{Model, ModelRole};
use crate::models::{
    Accelerations, Aerodynamics, Aircraft, Atmosphere, Auxiliary, BuoyantForces,
    ExternalReactions, Fcs, GroundReactions, Inertial, Input, MassBalance, Output, Propagate,
    Propulsion, Winds,
};
use crate::property::PropertyManager;

use super::wiring;

/// Executive values the wiring table copies into models
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameData {
    pub sim_time: f64,
    /// Effective timestep, zero while integration is suspended
    pub dt: f64,
    pub trim_status: bool,
}

/// An ordered set of stages driven once per frame
///
/// [`run_frame`] wires stage `i` and runs it before stage `i + 1` is
/// touched.
pub trait Pipeline {
    fn stages(&self) -> usize;

    /// Copy upstream outputs into the inputs of stage `index`
    fn load_inputs(&mut self, index: usize, frame: &FrameData);

    /// Run stage `index`; returns `true` when the stage deferred its work
    fn run_stage(&mut self, index: usize, holding: bool) -> bool;
}

/// Wire and run every stage in order
pub fn run_frame<P: Pipeline + ?Sized>(pipeline: &mut P, frame: &FrameData, holding: bool) {
    for index in 0..pipeline.stages() {
        pipeline.load_inputs(index, frame);
        pipeline.run_stage(index, holding);
    }
}

/// The standard roles in execution order plus runtime-scheduled models
pub struct StandardModels {
    pub propagate: Propagate,
    pub input: Input,
    pub inertial: Inertial,
    pub atmosphere: Atmosphere,
    pub winds: Winds,
    pub auxiliary: Auxiliary,
    pub fcs: Fcs,
    pub propulsion: Propulsion,
    pub aerodynamics: Aerodynamics,
    pub ground_reactions: GroundReactions,
    pub external_reactions: ExternalReactions,
    pub buoyant_forces: BuoyantForces,
    pub mass_balance: MassBalance,
    pub aircraft: Aircraft,
    pub accelerations: Accelerations,
    pub output: Output,

    extra: Vec<Box<dyn Model>>,
}

impl StandardModels {
    /// Construct every role, binding its properties in `pm`
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            propagate: Propagate::new(pm),
            input: Input::new(pm),
            inertial: Inertial::new(pm),
            atmosphere: Atmosphere::new(pm),
            winds: Winds::new(pm),
            auxiliary: Auxiliary::new(pm),
            fcs: Fcs::new(pm),
            propulsion: Propulsion::new(pm),
            aerodynamics: Aerodynamics::new(pm),
            ground_reactions: GroundReactions::new(pm),
            external_reactions: ExternalReactions::new(pm),
            buoyant_forces: BuoyantForces::new(pm),
            mass_balance: MassBalance::new(pm),
            aircraft: Aircraft::new(pm),
            accelerations: Accelerations::new(pm),
            output: Output::new(pm),
            extra: Vec::new(),
        }
    }

    pub fn model(&self, role: ModelRole) -> &dyn Model {
        match role {
            ModelRole::Propagate => &self.propagate,
            ModelRole::Input => &self.input,
            ModelRole::Inertial => &self.inertial,
            ModelRole::Atmosphere => &self.atmosphere,
            ModelRole::Winds => &self.winds,
            ModelRole::Auxiliary => &self.auxiliary,
            ModelRole::Systems => &self.fcs,
            ModelRole::Propulsion => &self.propulsion,
            ModelRole::Aerodynamics => &self.aerodynamics,
            ModelRole::GroundReactions => &self.ground_reactions,
            ModelRole::ExternalReactions => &self.external_reactions,
            ModelRole::BuoyantForces => &self.buoyant_forces,
            ModelRole::MassBalance => &self.mass_balance,
            ModelRole::Aircraft => &self.aircraft,
            ModelRole::Accelerations => &self.accelerations,
            ModelRole::Output => &self.output,
        }
    }

    pub fn model_mut(&mut self, role: ModelRole) -> &mut dyn Model {
        match role {
            ModelRole::Propagate => &mut self.propagate,
            ModelRole::Input => &mut self.input,
            ModelRole::Inertial => &mut self.inertial,
            ModelRole::Atmosphere => &mut self.atmosphere,
            ModelRole::Winds => &mut self.winds,
            ModelRole::Auxiliary => &mut self.auxiliary,
            ModelRole::Systems => &mut self.fcs,
            ModelRole::Propulsion => &mut self.propulsion,
            ModelRole::Aerodynamics => &mut self.aerodynamics,
            ModelRole::GroundReactions => &mut self.ground_reactions,
            ModelRole::ExternalReactions => &mut self.external_reactions,
            ModelRole::BuoyantForces => &mut self.buoyant_forces,
            ModelRole::MassBalance => &mut self.mass_balance,
            ModelRole::Aircraft => &mut self.aircraft,
            ModelRole::Accelerations => &mut self.accelerations,
            ModelRole::Output => &mut self.output,
        }
    }

    /// Append a model after the standard roles
    pub fn schedule(&mut self, mut model: Box<dyn Model>, rate: u32) {
        model.set_rate(rate);
        self.extra.push(model);
    }

    pub fn extra(&self) -> &[Box<dyn Model>] {
        &self.extra
    }

    pub fn extra_mut(&mut self) -> &mut [Box<dyn Model>] {
        &mut self.extra
    }
}

impl Pipeline for StandardModels {
    fn stages(&self) -> usize {
        ModelRole::ALL.len() + self.extra.len()
    }

    fn load_inputs(&mut self, index: usize, frame: &FrameData) {
        if let Some(role) = ModelRole::ALL.get(index) {
            wiring::load_inputs(self, *role, frame);
        }
    }

    fn run_stage(&mut self, index: usize, holding: bool) -> bool {
        match ModelRole::ALL.get(index) {
            Some(role) => self.model_mut(*role).run(holding),
            None => match self.extra.get_mut(index - ModelRole::ALL.len()) {
                Some(model) => model.run(holding),
                None => true,
            },
        }
    }
}
