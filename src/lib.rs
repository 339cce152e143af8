//! rustfdm - Deterministic multi-rate flight dynamics executive
//!
//! An [`Executive`] owns a fixed pipeline of sixteen models and advances
//! them one frame at a time. Each model runs every N frames according to
//! its rate, with its inputs copied from upstream models immediately before
//! it runs. Vehicles, initial conditions and scenarios are read from JSON
//! documents; every published quantity is reachable by name through the
//! [`PropertyManager`].
//!
//! # Architecture
//!
//! - Models share one contract ([`Model`]) and are addressed by [`ModelRole`]
//! - The pipeline order is fixed; extra models are appended with
//!   [`Executive::schedule`]
//! - Data flows only through the wiring step, never through models reaching
//!   into each other
//! - Child vehicles are complete executives driven by their parent
//!
//! # Example
//!
//! ```rust,ignore
//! use rustfdm::prelude::*;
//!
//! let mut exec = Executive::new(ExecSettings::rooted("data"))?;
//! exec.load_model("c1")?;
//! exec.run_ic()?;
//! while exec.sim_time() < 10.0 && exec.run() {}
//! ```

pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod initial_conditions;
pub mod logging;
pub mod model;
pub mod models;
pub mod property;
pub mod script;
pub mod utils;

pub use context::ExecSettings;
pub use error::{ConfigError, ExecError, ExecResult, LoadError, ModelError};
pub use exec::Executive;
pub use initial_conditions::InitialConditions;
pub use model::{Model, ModelRole};
pub use property::{PropertyManager, PropertyNode};
pub use script::{ScenarioDriver, Script};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::ExecSettings;
    pub use crate::error::{ExecError, ExecResult, LoadError, ModelError};
    pub use crate::exec::{Executive, Linearizer, TrimConfig, TrimMode, Trimmer};
    pub use crate::initial_conditions::InitialConditions;
    pub use crate::logging::{init_logging, DebugLevel, LogConfig};
    pub use crate::model::{Model, ModelBase, ModelRole};
    pub use crate::property::{PropertyManager, PropertyNode};
    pub use crate::script::{ScenarioDriver, Script};
}
