//! Initial-condition holder
//!
//! Seeds the propagated state, the wind and the engine run state when the
//! executive runs its initial conditions. Stored as JSON:
//!
//! ```json
//! { "altitude_ft": 1500.0, "u_fps": 180.0, "theta_deg": 2.0,
//!   "running_engines": [-1] }
//! ```

use std::path::Path;

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::utils::constants::DEG_TO_RAD;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialConditions {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    /// Altitude above sea level
    pub altitude_ft: f64,
    pub terrain_elevation_ft: f64,

    // Body velocities
    pub u_fps: f64,
    pub v_fps: f64,
    pub w_fps: f64,

    // Body rates
    pub p_rad_sec: f64,
    pub q_rad_sec: f64,
    pub r_rad_sec: f64,

    // Euler angles
    pub phi_deg: f64,
    pub theta_deg: f64,
    pub psi_deg: f64,

    pub wind_north_fps: f64,
    pub wind_east_fps: f64,
    pub wind_down_fps: f64,

    /// Engines started by `run_ic`; `-1` starts every engine
    pub running_engines: Vec<i32>,
}

impl InitialConditions {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Set the body velocities from airspeed and flow angles (radians)
    pub fn set_airspeed(&mut self, vt: f64, alpha: f64, beta: f64) {
        self.u_fps = vt * alpha.cos() * beta.cos();
        self.v_fps = vt * beta.sin();
        self.w_fps = vt * alpha.sin() * beta.cos();
    }

    pub fn uvw(&self) -> Vector3<f64> {
        Vector3::new(self.u_fps, self.v_fps, self.w_fps)
    }

    pub fn pqr(&self) -> Vector3<f64> {
        Vector3::new(self.p_rad_sec, self.q_rad_sec, self.r_rad_sec)
    }

    /// Body-to-local attitude
    pub fn attitude(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_euler_angles(
            self.phi_deg * DEG_TO_RAD,
            self.theta_deg * DEG_TO_RAD,
            self.psi_deg * DEG_TO_RAD,
        )
    }

    pub fn wind_ned(&self) -> Vector3<f64> {
        Vector3::new(self.wind_north_fps, self.wind_east_fps, self.wind_down_fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_airspeed_components() {
        let mut ic = InitialConditions::default();
        ic.set_airspeed(100.0, 0.1, 0.0);
        assert_relative_eq!(ic.uvw().norm(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(ic.w_fps.atan2(ic.u_fps), 0.1, epsilon = 1e-12);
        assert_eq!(ic.v_fps, 0.0);
    }

    #[test]
    fn test_partial_document() {
        let ic: InitialConditions =
            serde_json::from_str(r#"{"altitude_ft": 500, "running_engines": [0]}"#).unwrap();
        assert_eq!(ic.altitude_ft, 500.0);
        assert_eq!(ic.running_engines, vec![0]);
        assert_eq!(ic.u_fps, 0.0);
    }

    #[test]
    fn test_attitude_roundtrip() {
        let ic = InitialConditions {
            phi_deg: 10.0,
            theta_deg: 5.0,
            psi_deg: 90.0,
            ..Default::default()
        };
        let (phi, theta, psi) = ic.attitude().euler_angles();
        assert_relative_eq!(phi, 10.0 * DEG_TO_RAD, epsilon = 1e-12);
        assert_relative_eq!(theta, 5.0 * DEG_TO_RAD, epsilon = 1e-12);
        assert_relative_eq!(psi, 90.0 * DEG_TO_RAD, epsilon = 1e-12);
    }
}
