//! Auxiliary - derived flight quantities
//!
//! Airspeeds, flow angles, dynamic and total pressure, total temperature and
//! the wind-axes transforms, all computed from the atmosphere and the
//! propagated state wired in before each run.

use nalgebra::{Matrix3, Vector3};

use super::Published;
use crate::model::{Model, ModelBase};
use crate::property::PropertyManager;
use crate::utils::constants::{ISA_SL_DENSITY, ISA_SL_PRESSURE, KTS_TO_FPS};

#[derive(Debug, Clone)]
pub struct AuxiliaryInputs {
    pub pressure: f64,
    pub density: f64,
    pub temperature: f64,
    pub sound_speed: f64,
    pub sl_pressure: f64,
    pub sl_density: f64,

    pub uvw: Vector3<f64>,
    pub pqr: Vector3<f64>,
    pub uvw_dot: Vector3<f64>,
    pub pqr_dot: Vector3<f64>,
    pub vel_ned: Vector3<f64>,
    pub tl2b: Matrix3<f64>,
    pub tb2l: Matrix3<f64>,
    pub altitude_asl: f64,
    pub altitude_agl: f64,

    pub wind_ned: Vector3<f64>,
    pub gravity: f64,
    pub mass: f64,
    /// Aerodynamic force in wind axes
    pub vfw: Vector3<f64>,

    // Reference points relative to the CG, body axes, ft
    pub rp_body: Vector3<f64>,
    pub vrp_body: Vector3<f64>,
    pub eye_body: Vector3<f64>,
}

impl Default for AuxiliaryInputs {
    fn default() -> Self {
        Self {
            pressure: ISA_SL_PRESSURE,
            density: ISA_SL_DENSITY,
            temperature: 0.0,
            sound_speed: 0.0,
            sl_pressure: ISA_SL_PRESSURE,
            sl_density: ISA_SL_DENSITY,
            uvw: Vector3::zeros(),
            pqr: Vector3::zeros(),
            uvw_dot: Vector3::zeros(),
            pqr_dot: Vector3::zeros(),
            vel_ned: Vector3::zeros(),
            tl2b: Matrix3::identity(),
            tb2l: Matrix3::identity(),
            altitude_asl: 0.0,
            altitude_agl: 0.0,
            wind_ned: Vector3::zeros(),
            gravity: 0.0,
            mass: 0.0,
            vfw: Vector3::zeros(),
            rp_body: Vector3::zeros(),
            vrp_body: Vector3::zeros(),
            eye_body: Vector3::zeros(),
        }
    }
}

const PUBLISHED: [&str; 13] = [
    "velocities/vt-fps",
    "velocities/vc-kts",
    "velocities/ve-kts",
    "velocities/vg-fps",
    "velocities/mach",
    "aero/alpha-rad",
    "aero/beta-rad",
    "aero/qbar-psf",
    "aero/pt-lbs_sqft",
    "aero/tat-r",
    "propulsion/tat-c",
    "accelerations/n-pilot-z-norm",
    "position/eye-agl-ft",
];

pub struct Auxiliary {
    base: ModelBase,
    pub inputs: AuxiliaryInputs,

    // State
    vt: f64,
    vc: f64,
    ve: f64,
    vground: f64,
    mach: f64,
    alpha: f64,
    beta: f64,
    qbar: f64,
    total_pressure: f64,
    total_temperature: f64,
    nlf: f64,
    aero_uvw: Vector3<f64>,
    tw2b: Matrix3<f64>,

    published: Published<13>,
}

impl Auxiliary {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("auxiliary"),
            inputs: AuxiliaryInputs::default(),
            vt: 0.0,
            vc: 0.0,
            ve: 0.0,
            vground: 0.0,
            mach: 0.0,
            alpha: 0.0,
            beta: 0.0,
            qbar: 0.0,
            total_pressure: 0.0,
            total_temperature: 0.0,
            nlf: 0.0,
            aero_uvw: Vector3::zeros(),
            tw2b: Matrix3::identity(),
            published: Published::bind(pm, PUBLISHED),
        }
    }

    fn calculate(&mut self) {
        let inp = &self.inputs;
        self.aero_uvw = inp.uvw - inp.tl2b * inp.wind_ned;
        let (u, v, w) = (self.aero_uvw.x, self.aero_uvw.y, self.aero_uvw.z);

        self.vt = self.aero_uvw.norm();
        if self.vt > 0.001 {
            self.alpha = if u == 0.0 && w == 0.0 { 0.0 } else { w.atan2(u) };
            self.beta = (v / self.vt).clamp(-1.0, 1.0).asin();
        } else {
            self.alpha = 0.0;
            self.beta = 0.0;
        }
        self.tw2b = wind_to_body(self.alpha, self.beta);

        self.qbar = 0.5 * inp.density * self.vt * self.vt;
        self.mach = if inp.sound_speed > 0.0 {
            self.vt / inp.sound_speed
        } else {
            0.0
        };

        self.total_temperature = inp.temperature * (1.0 + 0.2 * self.mach * self.mach);
        self.total_pressure = pitot_pressure(self.mach, inp.pressure);

        let qc = self.total_pressure - inp.pressure;
        let vc_fps = if inp.sl_density > 0.0 && inp.sl_pressure > 0.0 {
            let ratio = (qc / inp.sl_pressure + 1.0).powf(2.0 / 7.0) - 1.0;
            (7.0 * inp.sl_pressure / inp.sl_density * ratio.max(0.0)).sqrt()
        } else {
            0.0
        };
        self.vc = vc_fps / KTS_TO_FPS;
        self.ve = if inp.sl_density > 0.0 {
            self.vt * (inp.density / inp.sl_density).sqrt() / KTS_TO_FPS
        } else {
            0.0
        };
        self.vground = inp.vel_ned.xy().norm();

        let weight = inp.mass * inp.gravity;
        self.nlf = if weight > 0.0 { -inp.vfw.z / weight } else { 0.0 };
    }

    fn publish(&self) {
        self.published.publish([
            self.vt,
            self.vc,
            self.ve,
            self.vground,
            self.mach,
            self.alpha,
            self.beta,
            self.qbar,
            self.total_pressure,
            self.total_temperature,
            self.tat_c(),
            self.nlf,
            self.eye_altitude_agl(),
        ]);
    }

    /// True airspeed, ft/s
    pub fn vt(&self) -> f64 {
        self.vt
    }

    pub fn vc_kts(&self) -> f64 {
        self.vc
    }

    pub fn ve_kts(&self) -> f64 {
        self.ve
    }

    pub fn vground(&self) -> f64 {
        self.vground
    }

    pub fn mach(&self) -> f64 {
        self.mach
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn qbar(&self) -> f64 {
        self.qbar
    }

    pub fn total_pressure(&self) -> f64 {
        self.total_pressure
    }

    /// Rankine
    pub fn total_temperature(&self) -> f64 {
        self.total_temperature
    }

    /// Total air temperature in Celsius
    pub fn tat_c(&self) -> f64 {
        (self.total_temperature - 491.67) * 5.0 / 9.0
    }

    pub fn nlf(&self) -> f64 {
        self.nlf
    }

    /// Airflow relative velocity in body axes
    pub fn aero_uvw(&self) -> Vector3<f64> {
        self.aero_uvw
    }

    pub fn aero_pqr(&self) -> Vector3<f64> {
        self.inputs.pqr
    }

    pub fn tw2b(&self) -> Matrix3<f64> {
        self.tw2b
    }

    pub fn tb2w(&self) -> Matrix3<f64> {
        self.tw2b.transpose()
    }

    pub fn eye_altitude_agl(&self) -> f64 {
        self.inputs.altitude_agl - (self.inputs.tb2l * self.inputs.eye_body).z
    }
}

/// Wind-to-body rotation for the given flow angles
pub fn wind_to_body(alpha: f64, beta: f64) -> Matrix3<f64> {
    let (sa, ca) = alpha.sin_cos();
    let (sb, cb) = beta.sin_cos();
    Matrix3::new(
        ca * cb, -ca * sb, -sa,
        sb, cb, 0.0,
        sa * cb, -sa * sb, ca,
    )
}

/// Pitot tube total pressure, with the Rayleigh formula past Mach 1
fn pitot_pressure(mach: f64, p: f64) -> f64 {
    if mach < 0.0 {
        return p;
    }
    if mach < 1.0 {
        p * (1.0 + 0.2 * mach * mach).powf(3.5)
    } else {
        let b = 7.0 * mach * mach - 1.0;
        p * 166.921_580_470_408_7 * mach.powi(7) / b.powf(2.5)
    }
}

impl Model for Auxiliary {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn run(&mut self, holding: bool) -> bool {
        if self.base.run_gate() {
            return true;
        }
        if holding {
            return false;
        }

        self.calculate();
        self.publish();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::ISA_SL_TEMPERATURE;
    use approx::assert_relative_eq;

    fn sea_level() -> Auxiliary {
        let mut aux = Auxiliary::new(&PropertyManager::new());
        aux.inputs.temperature = ISA_SL_TEMPERATURE;
        aux.inputs.sound_speed = 1116.45;
        aux
    }

    #[test]
    fn test_flow_angles() {
        let mut aux = sea_level();
        aux.inputs.uvw = Vector3::new(100.0, 0.0, 10.0);
        aux.run(false);
        assert_relative_eq!(aux.alpha(), (0.1f64).atan(), epsilon = 1e-12);
        assert_eq!(aux.beta(), 0.0);
        assert_relative_eq!(aux.vt(), (10100.0f64).sqrt());
    }

    #[test]
    fn test_headwind_adds_airspeed() {
        let mut aux = sea_level();
        aux.inputs.uvw = Vector3::new(100.0, 0.0, 0.0);
        aux.inputs.wind_ned = Vector3::new(-20.0, 0.0, 0.0);
        aux.run(false);
        assert_relative_eq!(aux.vt(), 120.0);
        assert_relative_eq!(aux.qbar(), 0.5 * ISA_SL_DENSITY * 120.0 * 120.0);
    }

    #[test]
    fn test_sea_level_calibrated_equals_true() {
        let mut aux = sea_level();
        aux.inputs.uvw = Vector3::new(200.0, 0.0, 0.0);
        aux.run(false);
        assert_relative_eq!(aux.vc_kts() * KTS_TO_FPS, 200.0, epsilon = 0.5);
        assert_relative_eq!(aux.ve_kts() * KTS_TO_FPS, 200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_wind_axes_orthonormal() {
        let t = wind_to_body(0.2, -0.1);
        let identity = t * t.transpose();
        assert_relative_eq!(identity, Matrix3::identity(), epsilon = 1e-12);
        // relative wind along wind x is the body velocity direction
        let body = t * Vector3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(body.z.atan2(body.x), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_holding_skips_update() {
        let mut aux = sea_level();
        aux.inputs.uvw = Vector3::new(50.0, 0.0, 0.0);
        aux.run(true);
        assert_eq!(aux.vt(), 0.0);
    }
}
