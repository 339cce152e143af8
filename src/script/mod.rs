//! Scenario drivers
//!
//! A scenario driver runs once per frame, before the model pipeline, and
//! may read and write any property. Returning `false` from
//! [`ScenarioDriver::run_script`] ends the run.
//!
//! [`Script`] is the event-driven driver read from a JSON document:
//!
//! ```json
//! { "name": "takeoff", "aircraft": "c1", "initialize": "reset00",
//!   "end_time": 30.0,
//!   "events": [
//!     { "name": "throttle up",
//!       "trigger": { "schedule": { "t_start": 0.5 } },
//!       "set": [ { "property": "fcs/throttle-cmd-norm", "value": 1.0 } ] },
//!     { "name": "gear up",
//!       "trigger": { "condition": { "property": "position/h-agl-ft",
//!                                   "comparison": "gt", "value": 50.0 } },
//!       "set": [ { "property": "gear/gear-cmd-norm", "value": 0.0 } ],
//!       "notify": [ "velocities/vc-kts" ] }
//!   ] }
//! ```

mod condition;
mod event;
mod scenario;
mod schedule;

pub use condition::*;
pub use event::*;
pub use scenario::*;
pub use schedule::*;

use crate::property::PropertyManager;

/// What a driver sees each frame
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    pub pm: &'a PropertyManager,
    pub sim_time: f64,
    pub frame: u64,
}

/// Per-frame scenario hook of an executive
pub trait ScenarioDriver {
    /// Inject this frame's events; `false` means the scenario is complete
    fn run_script(&mut self, ctx: &ScriptContext<'_>) -> bool;

    /// Forget which events have fired
    fn reset_events(&mut self);
}
