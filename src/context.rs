//! Simulation context and executive settings
//!
//! The context holds the clock, frame counter, hold flag and asset paths of
//! one executive. A child executive owns its own context.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logging::{DebugLevel, LogConfig};
use crate::property::{PropertyManager, PropertyNode};
use crate::utils::constants::SIM_TIMESTEP;

/// Executive settings, loadable from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecSettings {
    /// Fixed frame timestep in seconds
    pub dt: f64,

    /// Directory every asset path is resolved against
    pub root_dir: PathBuf,

    pub aircraft_path: PathBuf,
    pub engine_path: PathBuf,
    pub systems_path: PathBuf,

    /// Debug bitmask; `None` reads `RUSTFDM_DEBUG`
    pub debug_level: Option<u32>,

    pub log: LogConfig,
}

impl Default for ExecSettings {
    fn default() -> Self {
        Self {
            dt: SIM_TIMESTEP,
            root_dir: PathBuf::new(),
            aircraft_path: PathBuf::from("aircraft"),
            engine_path: PathBuf::from("engine"),
            systems_path: PathBuf::from("systems"),
            debug_level: None,
            log: LogConfig::default(),
        }
    }
}

impl ExecSettings {
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

    /// Settings rooted at `root_dir` with default sub-paths
    pub fn rooted(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }
}

/// Where vehicle, engine and system definitions are looked up
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPaths {
    pub root_dir: PathBuf,
    pub aircraft: PathBuf,
    pub engine: PathBuf,
    pub systems: PathBuf,
    /// Directory of the loaded vehicle, set by a successful load
    pub full_aircraft: PathBuf,
}

impl AssetPaths {
    pub fn from_settings(settings: &ExecSettings) -> Self {
        let root = &settings.root_dir;
        Self {
            root_dir: root.clone(),
            aircraft: root.join(&settings.aircraft_path),
            engine: root.join(&settings.engine_path),
            systems: root.join(&settings.systems_path),
            full_aircraft: PathBuf::new(),
        }
    }

    /// Re-root the three search paths under `root_dir`
    pub fn set_paths(&mut self, aircraft: &Path, engine: &Path, systems: &Path) {
        self.aircraft = self.root_dir.join(aircraft);
        self.engine = self.root_dir.join(engine);
        self.systems = self.root_dir.join(systems);
    }

    pub fn is_defined(&self) -> bool {
        !self.aircraft.as_os_str().is_empty()
            && !self.engine.as_os_str().is_empty()
            && !self.systems.as_os_str().is_empty()
    }
}

/// Clock and run-state of one executive
#[derive(Debug, Clone)]
pub struct SimContext {
    sim_time: f64,
    dt: f64,
    saved_dt: f64,
    frame: u64,
    holding: bool,
    debug: DebugLevel,
    pub paths: AssetPaths,

    terminate_node: PropertyNode,
    time_node: PropertyNode,
    frame_node: PropertyNode,
    dt_node: PropertyNode,
    debug_node: PropertyNode,
}

impl SimContext {
    pub fn new(settings: &ExecSettings) -> Self {
        let debug = settings
            .debug_level
            .map(DebugLevel)
            .unwrap_or_else(DebugLevel::from_env);
        let dt = if settings.dt > 0.0 {
            settings.dt
        } else {
            SIM_TIMESTEP
        };
        Self {
            sim_time: 0.0,
            dt,
            saved_dt: dt,
            frame: 0,
            holding: false,
            debug,
            paths: AssetPaths::from_settings(settings),
            terminate_node: PropertyNode::new(0.0),
            time_node: PropertyNode::new(0.0),
            frame_node: PropertyNode::new(0.0),
            dt_node: PropertyNode::new(dt),
            debug_node: PropertyNode::new(debug.0 as f64),
        }
    }

    /// Publish the context values under `simulation/`
    pub fn bind(&self, pm: &PropertyManager) {
        let binds = [
            ("simulation/terminate", &self.terminate_node),
            ("simulation/sim-time-sec", &self.time_node),
            ("simulation/frame", &self.frame_node),
            ("simulation/dt", &self.dt_node),
            ("simulation/debug-level", &self.debug_node),
        ];
        for (name, node) in binds {
            if !pm.tie(name, node) {
                tracing::warn!(property = name, "Failed to bind simulation property");
            }
        }
    }

    #[inline]
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn set_sim_time(&mut self, t: f64) -> f64 {
        self.sim_time = t;
        self.time_node.set(t);
        t
    }

    /// Effective timestep, zero while integration is suspended
    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Change the frame timestep. Non-positive steps are ignored; while
    /// integration is suspended the new step takes effect on resume.
    pub fn set_dt(&mut self, dt: f64) {
        if !(dt > 0.0 && dt.is_finite()) {
            tracing::warn!(dt, "Ignoring non-positive timestep");
            return;
        }
        self.saved_dt = dt;
        if !self.integration_suspended() {
            self.dt = dt;
        }
        self.dt_node.set(dt);
    }

    /// Nominal timestep, unaffected by suspension
    pub fn nominal_dt(&self) -> f64 {
        if self.integration_suspended() {
            self.saved_dt
        } else {
            self.dt
        }
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn holding(&self) -> bool {
        self.holding
    }

    pub fn set_holding(&mut self, holding: bool) {
        self.holding = holding;
    }

    /// Advance the clock by one frame unless held or suspended
    pub fn incr_time(&mut self) -> f64 {
        if !self.holding && !self.integration_suspended() {
            self.sim_time += self.dt;
            self.frame += 1;
        }
        self.time_node.set(self.sim_time);
        self.frame_node.set(self.frame as f64);
        self.sim_time
    }

    /// Zero the clock and frame counter
    pub fn reset_clock(&mut self) {
        self.frame = 0;
        self.frame_node.set(0.0);
        self.set_sim_time(0.0);
    }

    pub fn suspend_integration(&mut self) {
        if !self.integration_suspended() {
            self.saved_dt = self.dt;
        }
        self.dt = 0.0;
    }

    pub fn resume_integration(&mut self) {
        self.dt = self.saved_dt;
    }

    pub fn integration_suspended(&self) -> bool {
        self.dt == 0.0
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate_node.get_bool()
    }

    pub fn set_terminate(&self, terminate: bool) {
        self.terminate_node.set_bool(terminate);
    }

    /// Current debug level, picking up writes to `simulation/debug-level`
    pub fn debug(&self) -> DebugLevel {
        let published = self.debug_node.get();
        if published >= 0.0 {
            DebugLevel(published as u32)
        } else {
            self.debug
        }
    }

    pub fn set_debug(&mut self, level: DebugLevel) {
        self.debug = level;
        self.debug_node.set(level.0 as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn context() -> SimContext {
        SimContext::new(&ExecSettings {
            dt: 0.01,
            debug_level: Some(0),
            ..Default::default()
        })
    }

    #[test]
    fn test_incr_time_and_frame() {
        let mut ctx = context();
        ctx.incr_time();
        ctx.incr_time();
        assert_eq!(ctx.frame(), 2);
        assert_relative_eq!(ctx.sim_time(), 0.02);
    }

    #[test]
    fn test_hold_freezes_clock() {
        let mut ctx = context();
        ctx.set_holding(true);
        ctx.incr_time();
        assert_eq!(ctx.frame(), 0);
        assert_eq!(ctx.sim_time(), 0.0);
    }

    #[test]
    fn test_suspend_and_resume() {
        let mut ctx = context();
        ctx.suspend_integration();
        assert!(ctx.integration_suspended());
        assert_eq!(ctx.dt(), 0.0);
        assert_relative_eq!(ctx.nominal_dt(), 0.01);
        ctx.incr_time();
        assert_eq!(ctx.frame(), 0);

        // suspending twice must not lose the saved step
        ctx.suspend_integration();
        ctx.resume_integration();
        assert_relative_eq!(ctx.dt(), 0.01);
    }

    #[test]
    fn test_set_dt_rejects_non_positive() {
        let mut ctx = context();
        ctx.set_dt(0.0);
        ctx.set_dt(-0.01);
        ctx.set_dt(f64::NAN);
        assert_relative_eq!(ctx.dt(), 0.01);
        assert!(!ctx.integration_suspended());

        ctx.suspend_integration();
        ctx.set_dt(0.02);
        assert_eq!(ctx.dt(), 0.0);
        ctx.resume_integration();
        assert_relative_eq!(ctx.dt(), 0.02);
        ctx.incr_time();
        assert_relative_eq!(ctx.sim_time(), 0.02);
    }

    #[test]
    fn test_bound_properties() {
        let pm = PropertyManager::new();
        let mut ctx = context();
        ctx.bind(&pm);
        ctx.incr_time();
        assert_eq!(pm.get("simulation/frame"), Some(1.0));
        assert!(pm.set("simulation/terminate", 1.0));
        assert!(ctx.terminate_requested());
        pm.set("simulation/debug-level", 8.0);
        assert!(ctx.debug().state());
    }

    #[test]
    fn test_settings_paths() {
        let settings = ExecSettings::rooted("/data");
        let paths = AssetPaths::from_settings(&settings);
        assert_eq!(paths.aircraft, PathBuf::from("/data/aircraft"));
        assert_eq!(paths.engine, PathBuf::from("/data/engine"));
        assert!(paths.is_defined());
    }
}
