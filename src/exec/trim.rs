//! Trim and linearization seams
//!
//! The solvers themselves live outside the executive. They are attached as
//! trait objects and receive the executive, the requested mode and an
//! explicit [`TrimConfig`].

use serde::{Deserialize, Serialize};

use crate::error::{ExecError, ExecResult};

use super::Executive;

/// Trim problem to solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrimMode {
    Longitudinal,
    Full,
    Ground,
    Pullup,
    Custom,
    Turn,
    None,
}

impl TryFrom<i32> for TrimMode {
    type Error = ExecError;

    fn try_from(mode: i32) -> Result<Self, Self::Error> {
        Ok(match mode {
            0 => TrimMode::Longitudinal,
            1 => TrimMode::Full,
            2 => TrimMode::Ground,
            3 => TrimMode::Pullup,
            4 => TrimMode::Custom,
            5 => TrimMode::Turn,
            6 => TrimMode::None,
            other => return Err(ExecError::InvalidTrimMode(other)),
        })
    }
}

impl From<TrimMode> for i32 {
    fn from(mode: TrimMode) -> Self {
        mode as i32
    }
}

/// Initial guess and search bounds for one trim control
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlGuess {
    pub guess: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ControlGuess {
    pub const fn new(guess: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            guess,
            min,
            max,
            step,
        }
    }
}

/// Solver tolerances and control guesses handed to a [`Trimmer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    pub rtol: f64,
    pub speed: f64,
    pub abstol: f64,
    pub max_iterations: u32,
    pub random: f64,
    pub show_convergence: bool,
    pub variable_prop_pitch: bool,

    pub throttle: ControlGuess,
    pub aileron: ControlGuess,
    pub rudder: ControlGuess,
    pub elevator: ControlGuess,
    pub alpha: ControlGuess,
    pub beta: ControlGuess,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-4,
            speed: 2.0,
            abstol: 1e-3,
            max_iterations: 2000,
            random: 0.0,
            show_convergence: true,
            variable_prop_pitch: false,
            throttle: ControlGuess::new(0.5, 0.0, 1.0, 0.1),
            aileron: ControlGuess::new(0.0, -1.0, 1.0, 0.1),
            rudder: ControlGuess::new(0.0, -1.0, 1.0, 0.1),
            elevator: ControlGuess::new(-0.1, -1.0, 1.0, 0.1),
            alpha: ControlGuess::new(0.05, -0.1, 0.18, 0.05),
            beta: ControlGuess::new(0.0, 0.0, 0.0, 0.0),
        }
    }
}

/// A trim solver driven against an executive
///
/// Solvers may run as many frames as they need; the executive restores its
/// clock afterwards.
pub trait Trimmer {
    fn trim(&mut self, exec: &mut Executive, mode: TrimMode, config: &TrimConfig)
        -> ExecResult<()>;
}

/// A linearization solver driven against an executive
pub trait Linearizer {
    fn linearize(&mut self, exec: &mut Executive, mode: i32) -> ExecResult<()>;
}
