//! Propagate - 6-DoF state integration
//!
//! Flat-earth equations: position in a local north-east-down frame anchored
//! at the initial latitude/longitude, attitude as a body-to-local
//! quaternion, body velocities and rates integrated from the accelerations
//! wired in every frame.
//!
//! The integration step is the wired `delta_t`. A zero step (integration
//! suspended) refreshes the published values without touching the state or
//! the derivative history.

use std::collections::VecDeque;

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use super::Published;
use crate::initial_conditions::InitialConditions;
use crate::model::{Model, ModelBase};
use crate::property::PropertyManager;
use crate::utils::constants::{DEG_TO_RAD, PLANET_RADIUS_REFERENCE};

/// Integration scheme for one state vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Integrator {
    /// Freeze the state
    None,
    RectEuler,
    Trapezoidal,
    #[default]
    AdamsBashforth2,
    AdamsBashforth3,
}

impl Integrator {
    /// State change over `dt` given the derivative history, newest first
    ///
    /// Falls back to a lower order while the history is too short.
    fn delta(self, history: &VecDeque<Vector3<f64>>, dt: f64) -> Vector3<f64> {
        let d0 = match history.front() {
            Some(d) => *d,
            None => return Vector3::zeros(),
        };
        match (self, history.get(1).copied(), history.get(2).copied()) {
            (Integrator::None, _, _) => Vector3::zeros(),
            (Integrator::AdamsBashforth3, Some(d1), Some(d2)) => {
                (d0 * 23.0 - d1 * 16.0 + d2 * 5.0) * (dt / 12.0)
            }
            (Integrator::AdamsBashforth3 | Integrator::AdamsBashforth2, Some(d1), _) => {
                (d0 * 1.5 - d1 * 0.5) * dt
            }
            (Integrator::Trapezoidal, Some(d1), _) => (d0 + d1) * (0.5 * dt),
            _ => d0 * dt,
        }
    }
}

const HISTORY_LEN: usize = 3;

fn push_history(history: &mut VecDeque<Vector3<f64>>, value: Vector3<f64>) {
    history.push_front(value);
    history.truncate(HISTORY_LEN);
}

/// Integrated vehicle state, transferable to a child vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagateState {
    /// Offset from the origin, north-east-down, ft
    pub position_ned: Vector3<f64>,
    /// Body-to-local rotation
    pub attitude: UnitQuaternion<f64>,
    pub uvw: Vector3<f64>,
    pub pqr: Vector3<f64>,
    /// Geodetic origin of the local frame
    pub origin_latitude_deg: f64,
    pub origin_longitude_deg: f64,
}

impl Default for PropagateState {
    fn default() -> Self {
        Self {
            position_ned: Vector3::zeros(),
            attitude: UnitQuaternion::identity(),
            uvw: Vector3::zeros(),
            pqr: Vector3::zeros(),
            origin_latitude_deg: 0.0,
            origin_longitude_deg: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PropagateInputs {
    pub uvw_dot: Vector3<f64>,
    pub pqr_dot: Vector3<f64>,
    /// Integration step for this frame, zero while suspended
    pub delta_t: f64,
}

const PUBLISHED: [&str; 16] = [
    "position/h-sl-ft",
    "position/h-agl-ft",
    "position/lat-gc-deg",
    "position/long-gc-deg",
    "velocities/u-fps",
    "velocities/v-fps",
    "velocities/w-fps",
    "velocities/p-rad_sec",
    "velocities/q-rad_sec",
    "velocities/r-rad_sec",
    "velocities/v-north-fps",
    "velocities/v-east-fps",
    "velocities/v-down-fps",
    "attitude/phi-rad",
    "attitude/theta-rad",
    "attitude/psi-rad",
];

pub struct Propagate {
    base: ModelBase,
    pub inputs: PropagateInputs,

    // State
    state: PropagateState,
    terrain_elevation: f64,
    uvw_dot_history: VecDeque<Vector3<f64>>,
    pqr_dot_history: VecDeque<Vector3<f64>>,
    vel_ned_history: VecDeque<Vector3<f64>>,

    // Parameters
    rate_integrator: Integrator,
    position_integrator: Integrator,

    published: Published<16>,
}

impl Propagate {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("propagate"),
            inputs: PropagateInputs::default(),
            state: PropagateState::default(),
            terrain_elevation: 0.0,
            uvw_dot_history: VecDeque::with_capacity(HISTORY_LEN),
            pqr_dot_history: VecDeque::with_capacity(HISTORY_LEN),
            vel_ned_history: VecDeque::with_capacity(HISTORY_LEN),
            rate_integrator: Integrator::AdamsBashforth2,
            position_integrator: Integrator::Trapezoidal,
            published: Published::bind(pm, PUBLISHED),
        }
    }

    /// Choose the schemes for body rates and for position
    pub fn set_integrators(&mut self, rates: Integrator, position: Integrator) {
        self.rate_integrator = rates;
        self.position_integrator = position;
    }

    /// Seed the state from an initial-condition holder
    pub fn set_initial_state(&mut self, ic: &InitialConditions) {
        self.state = PropagateState {
            position_ned: Vector3::new(0.0, 0.0, -ic.altitude_ft),
            attitude: ic.attitude(),
            uvw: ic.uvw(),
            pqr: ic.pqr(),
            origin_latitude_deg: ic.latitude_deg,
            origin_longitude_deg: ic.longitude_deg,
        };
        self.terrain_elevation = ic.terrain_elevation_ft;
        self.clear_history();
        self.publish();
    }

    /// Fill the derivative history with the current wired derivatives
    pub fn initialize_derivatives(&mut self) {
        self.clear_history();
        let vel_ned = self.vel_ned();
        for _ in 0..HISTORY_LEN {
            self.uvw_dot_history.push_back(self.inputs.uvw_dot);
            self.pqr_dot_history.push_back(self.inputs.pqr_dot);
            self.vel_ned_history.push_back(vel_ned);
        }
    }

    fn clear_history(&mut self) {
        self.uvw_dot_history.clear();
        self.pqr_dot_history.clear();
        self.vel_ned_history.clear();
    }

    pub fn state(&self) -> PropagateState {
        self.state
    }

    /// Overwrite the state, as done for a child following its parent
    pub fn set_state(&mut self, state: PropagateState) {
        self.state = state;
        self.publish();
    }

    pub fn set_terrain_elevation(&mut self, elevation: f64) {
        self.terrain_elevation = elevation;
    }

    pub fn uvw(&self) -> Vector3<f64> {
        self.state.uvw
    }

    pub fn pqr(&self) -> Vector3<f64> {
        self.state.pqr
    }

    pub fn tb2l(&self) -> Matrix3<f64> {
        self.state.attitude.to_rotation_matrix().into_inner()
    }

    pub fn tl2b(&self) -> Matrix3<f64> {
        self.tb2l().transpose()
    }

    pub fn vel_ned(&self) -> Vector3<f64> {
        self.state.attitude * self.state.uvw
    }

    pub fn altitude_asl(&self) -> f64 {
        -self.state.position_ned.z
    }

    pub fn altitude_agl(&self) -> f64 {
        self.altitude_asl() - self.terrain_elevation
    }

    pub fn terrain_elevation(&self) -> f64 {
        self.terrain_elevation
    }

    /// Distance from the planet centre
    pub fn radius(&self) -> f64 {
        PLANET_RADIUS_REFERENCE + self.altitude_asl()
    }

    /// Roll, pitch and yaw in radians
    pub fn euler(&self) -> Vector3<f64> {
        let (phi, theta, psi) = self.state.attitude.euler_angles();
        Vector3::new(phi, theta, psi)
    }

    pub fn latitude_deg(&self) -> f64 {
        self.state.origin_latitude_deg
            + self.state.position_ned.x / PLANET_RADIUS_REFERENCE / DEG_TO_RAD
    }

    pub fn longitude_deg(&self) -> f64 {
        let cos_lat = (self.state.origin_latitude_deg * DEG_TO_RAD).cos().max(1e-9);
        self.state.origin_longitude_deg
            + self.state.position_ned.y / (PLANET_RADIUS_REFERENCE * cos_lat) / DEG_TO_RAD
    }

    fn publish(&self) {
        let uvw = self.state.uvw;
        let pqr = self.state.pqr;
        let vel = self.vel_ned();
        let euler = self.euler();
        self.published.publish([
            self.altitude_asl(),
            self.altitude_agl(),
            self.latitude_deg(),
            self.longitude_deg(),
            uvw.x,
            uvw.y,
            uvw.z,
            pqr.x,
            pqr.y,
            pqr.z,
            vel.x,
            vel.y,
            vel.z,
            euler.x,
            euler.y,
            euler.z,
        ]);
    }

    fn integrate(&mut self, dt: f64) {
        let vel_ned = self.vel_ned();
        push_history(&mut self.vel_ned_history, vel_ned);
        self.state.position_ned += self.position_integrator.delta(&self.vel_ned_history, dt);

        if self.rate_integrator != Integrator::None {
            let rotation = UnitQuaternion::from_scaled_axis(self.state.pqr * dt);
            self.state.attitude *= rotation;
            self.state.attitude.renormalize();
        }

        push_history(&mut self.uvw_dot_history, self.inputs.uvw_dot);
        push_history(&mut self.pqr_dot_history, self.inputs.pqr_dot);
        self.state.uvw += self.rate_integrator.delta(&self.uvw_dot_history, dt);
        self.state.pqr += self.rate_integrator.delta(&self.pqr_dot_history, dt);
    }
}

impl Model for Propagate {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn init_model(&mut self) -> Result<(), crate::error::ModelError> {
        self.base.init();
        self.inputs = PropagateInputs::default();
        self.clear_history();
        Ok(())
    }

    fn run(&mut self, holding: bool) -> bool {
        if self.base.run_gate() {
            return true;
        }
        if holding {
            return false;
        }

        let dt = self.inputs.delta_t;
        if dt > 0.0 {
            self.integrate(dt);
        }
        self.publish();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn propagate() -> Propagate {
        Propagate::new(&PropertyManager::new())
    }

    #[test]
    fn test_constant_acceleration_euler() {
        let mut p = propagate();
        p.set_integrators(Integrator::RectEuler, Integrator::RectEuler);
        p.inputs.uvw_dot = Vector3::new(2.0, 0.0, 0.0);
        p.inputs.delta_t = 0.1;
        for _ in 0..10 {
            p.run(false);
        }
        assert_relative_eq!(p.uvw().x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_holding_freezes_state() {
        let mut p = propagate();
        p.inputs.uvw_dot = Vector3::new(1.0, 0.0, 0.0);
        p.inputs.delta_t = 0.1;
        assert!(!p.run(true));
        assert_eq!(p.uvw(), Vector3::zeros());
    }

    #[test]
    fn test_zero_delta_keeps_state() {
        let mut p = propagate();
        let ic = InitialConditions {
            altitude_ft: 1000.0,
            u_fps: 100.0,
            ..Default::default()
        };
        p.set_initial_state(&ic);
        p.inputs.uvw_dot = Vector3::new(5.0, 0.0, 0.0);
        p.inputs.delta_t = 0.0;
        p.run(false);
        assert_eq!(p.uvw().x, 100.0);
        assert_eq!(p.altitude_asl(), 1000.0);
    }

    #[test]
    fn test_level_flight_moves_north() {
        let mut p = propagate();
        let ic = InitialConditions {
            altitude_ft: 500.0,
            u_fps: 100.0,
            ..Default::default()
        };
        p.set_initial_state(&ic);
        p.inputs.delta_t = 0.5;
        p.initialize_derivatives();
        p.run(false);
        assert_relative_eq!(p.state().position_ned.x, 50.0, epsilon = 1e-9);
        assert_relative_eq!(p.altitude_asl(), 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_trapezoidal_position_uses_velocity_history() {
        let mut p = propagate();
        p.set_integrators(Integrator::RectEuler, Integrator::Trapezoidal);
        p.inputs.uvw_dot = Vector3::new(10.0, 0.0, 0.0);
        p.inputs.delta_t = 0.1;
        p.initialize_derivatives();

        // position integrates the velocity held before this frame's update
        p.run(false);
        assert_relative_eq!(p.state().position_ned.x, 0.0, epsilon = 1e-12);
        p.run(false);
        assert_relative_eq!(p.state().position_ned.x, 0.05, epsilon = 1e-12);
        p.run(false);
        assert_relative_eq!(p.state().position_ned.x, 0.2, epsilon = 1e-12);
        assert_relative_eq!(p.uvw().x, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_adams_bashforth_falls_back() {
        let mut history = VecDeque::new();
        history.push_front(Vector3::new(1.0, 0.0, 0.0));
        let d = Integrator::AdamsBashforth3.delta(&history, 2.0);
        assert_relative_eq!(d.x, 2.0);

        history.push_front(Vector3::new(3.0, 0.0, 0.0));
        let d = Integrator::AdamsBashforth3.delta(&history, 2.0);
        assert_relative_eq!(d.x, (1.5 * 3.0 - 0.5 * 1.0) * 2.0);
    }

    #[test]
    fn test_published_properties() {
        let pm = PropertyManager::new();
        let mut p = Propagate::new(&pm);
        p.set_initial_state(&InitialConditions {
            altitude_ft: 250.0,
            terrain_elevation_ft: 50.0,
            ..Default::default()
        });
        assert_eq!(pm.get("position/h-sl-ft"), Some(250.0));
        assert_eq!(pm.get("position/h-agl-ft"), Some(200.0));
    }
}
