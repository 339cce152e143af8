//! Data-wiring table
//!
//! One copy step per pipeline position. Each step reads the outputs of the
//! upstream models a role consumes and writes them into that role's
//! `inputs` record, immediately before the role runs. A step only copies,
//! so applying it twice in a frame is harmless.
//!
//! Models earlier in the order than their data source see the value from
//! the previous frame (Auxiliary reads the accelerations and the
//! aerodynamic force that way).

use crate::model::{Model, ModelRole};

use super::pipeline::{FrameData, StandardModels};

/// Wire the inputs of `role` from its upstream models
pub fn load_inputs(m: &mut StandardModels, role: ModelRole, frame: &FrameData) {
    match role {
        ModelRole::Propagate => {
            let rate = m.propagate.rate() as f64;
            let inp = &mut m.propagate.inputs;
            inp.uvw_dot = m.accelerations.uvw_dot();
            inp.pqr_dot = m.accelerations.pqr_dot();
            inp.delta_t = frame.dt * rate;
        }
        ModelRole::Input => {}
        ModelRole::Inertial => {
            m.inertial.inputs.radius = m.propagate.radius();
        }
        ModelRole::Atmosphere => {
            m.atmosphere.inputs.altitude_asl = m.propagate.altitude_asl();
        }
        ModelRole::Winds => {}
        ModelRole::Auxiliary => {
            let inp = &mut m.auxiliary.inputs;
            inp.pressure = m.atmosphere.pressure();
            inp.density = m.atmosphere.density();
            inp.temperature = m.atmosphere.temperature();
            inp.sound_speed = m.atmosphere.sound_speed();
            inp.sl_pressure = m.atmosphere.sl_pressure();
            inp.sl_density = m.atmosphere.sl_density();

            inp.uvw = m.propagate.uvw();
            inp.pqr = m.propagate.pqr();
            inp.vel_ned = m.propagate.vel_ned();
            inp.tl2b = m.propagate.tl2b();
            inp.tb2l = m.propagate.tb2l();
            inp.altitude_asl = m.propagate.altitude_asl();
            inp.altitude_agl = m.propagate.altitude_agl();

            inp.uvw_dot = m.accelerations.uvw_dot();
            inp.pqr_dot = m.accelerations.pqr_dot();
            inp.wind_ned = m.winds.wind_ned();
            inp.gravity = m.inertial.gravity();
            inp.mass = m.mass_balance.mass();
            inp.vfw = m.aerodynamics.vfw();

            inp.rp_body = m.mass_balance.structural_to_body(&m.aircraft.xyz_rp());
            inp.vrp_body = m.mass_balance.structural_to_body(&m.aircraft.xyz_vrp());
            inp.eye_body = m.mass_balance.structural_to_body(&m.aircraft.xyz_eyepoint());
        }
        ModelRole::Systems => {
            m.fcs.inputs.trim_status = frame.trim_status;
        }
        ModelRole::Propulsion => {
            let rate = m.propulsion.rate() as f64;
            let inp = &mut m.propulsion.inputs;
            inp.pressure = m.atmosphere.pressure();
            inp.temperature = m.atmosphere.temperature();
            inp.density = m.atmosphere.density();
            inp.sound_speed = m.atmosphere.sound_speed();

            inp.qbar = m.auxiliary.qbar();
            inp.vt = m.auxiliary.vt();
            inp.mach = m.auxiliary.mach();
            inp.alpha = m.auxiliary.alpha();
            inp.beta = m.auxiliary.beta();
            inp.tat_c = m.auxiliary.tat_c();
            inp.aero_uvw = m.auxiliary.aero_uvw();

            inp.altitude_asl = m.propagate.altitude_asl();
            inp.altitude_agl = m.propagate.altitude_agl();
            inp.pqr = m.propagate.pqr();

            inp.throttle_pos = m.fcs.throttle_positions();
            inp.mixture_pos = m.fcs.mixture_positions();
            inp.cg = m.mass_balance.xyz_cg();
            inp.total_delta_t = frame.dt * rate;
        }
        ModelRole::Aerodynamics => {
            let inp = &mut m.aerodynamics.inputs;
            inp.alpha = m.auxiliary.alpha();
            inp.beta = m.auxiliary.beta();
            inp.qbar = m.auxiliary.qbar();
            inp.vt = m.auxiliary.vt();
            inp.tw2b = m.auxiliary.tw2b();
            inp.rp_body = m.mass_balance.structural_to_body(&m.aircraft.xyz_rp());
        }
        ModelRole::GroundReactions => {
            let inp = &mut m.ground_reactions.inputs;
            inp.tb2l = m.propagate.tb2l();
            inp.tl2b = m.propagate.tl2b();
            inp.altitude_agl = m.propagate.altitude_agl();
            inp.uvw = m.propagate.uvw();
            inp.pqr = m.propagate.pqr();
            inp.cg = m.mass_balance.xyz_cg();
            inp.gear_pos = m.fcs.gear_pos();
            inp.brakes = m.fcs.brakes();
        }
        ModelRole::ExternalReactions => {
            let inp = &mut m.external_reactions.inputs;
            inp.tl2b = m.propagate.tl2b();
            inp.tw2b = m.auxiliary.tw2b();
            inp.cg = m.mass_balance.xyz_cg();
        }
        ModelRole::BuoyantForces => {
            let inp = &mut m.buoyant_forces.inputs;
            inp.pressure = m.atmosphere.pressure();
            inp.temperature = m.atmosphere.temperature();
            inp.density = m.atmosphere.density();
            inp.gravity = m.inertial.gravity();
            inp.tl2b = m.propagate.tl2b();
            inp.cg = m.mass_balance.xyz_cg();
        }
        ModelRole::MassBalance => {
            let cg = m.mass_balance.xyz_cg();
            let inp = &mut m.mass_balance.inputs;
            inp.tanks_weight = m.propulsion.tanks_weight();
            inp.tanks_moment = m.propulsion.tanks_moment();
            inp.tanks_inertia = m.propulsion.tanks_inertia(&cg);
            inp.gas_mass = m.buoyant_forces.gas_mass();
            inp.gas_moment = m.buoyant_forces.gas_moment();
            inp.gas_inertia = m.buoyant_forces.gas_inertia(&cg);
        }
        ModelRole::Aircraft => {
            let inp = &mut m.aircraft.inputs;
            inp.aero_force = m.aerodynamics.forces();
            inp.aero_moment = m.aerodynamics.moments();
            inp.prop_force = m.propulsion.forces();
            inp.prop_moment = m.propulsion.moments();
            inp.ground_force = m.ground_reactions.forces();
            inp.ground_moment = m.ground_reactions.moments();
            inp.external_force = m.external_reactions.forces();
            inp.external_moment = m.external_reactions.moments();
            inp.buoyant_force = m.buoyant_forces.forces();
            inp.buoyant_moment = m.buoyant_forces.moments();
        }
        ModelRole::Accelerations => {
            let inp = &mut m.accelerations.inputs;
            inp.forces = m.aircraft.forces();
            inp.moments = m.aircraft.moments();
            inp.mass = m.mass_balance.mass();
            inp.j = m.mass_balance.j();
            inp.j_inv = m.mass_balance.j_inv();
            inp.uvw = m.propagate.uvw();
            inp.pqr = m.propagate.pqr();
            inp.tl2b = m.propagate.tl2b();
            inp.gravity = m.inertial.gravity();
        }
        ModelRole::Output => {
            m.output.inputs.sim_time = frame.sim_time;
        }
    }
}

/// Wire every role without running any of them
pub fn load_all_inputs(m: &mut StandardModels, frame: &FrameData) {
    for role in ModelRole::ALL {
        load_inputs(m, role, frame);
    }
}

/// Seed the planet constants consumed before Inertial first runs
pub fn load_planet_constants(m: &mut StandardModels) {
    let g = m.inertial.sl_gravity();
    m.accelerations.inputs.gravity = g;
    m.auxiliary.inputs.gravity = g;
    m.buoyant_forces.inputs.gravity = g;
    m.inertial.inputs.radius = m.inertial.reference_radius();
}

/// Copy the constants that depend on the loaded geometry and mass
pub fn load_model_constants(m: &mut StandardModels) {
    let aero = &mut m.aerodynamics.inputs;
    aero.wing_area = m.aircraft.wing_area();
    aero.wingspan = m.aircraft.wingspan();
    aero.chord = m.aircraft.wing_chord();

    let cg = m.mass_balance.xyz_cg();
    m.propulsion.inputs.cg = cg;
    m.ground_reactions.inputs.cg = cg;
    m.external_reactions.inputs.cg = cg;
    m.buoyant_forces.inputs.cg = cg;
    m.auxiliary.inputs.mass = m.mass_balance.mass();
    m.accelerations.inputs.mass = m.mass_balance.mass();
}
