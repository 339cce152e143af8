//! Event-driven scenario

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ScenarioDriver, ScriptContext, ScriptEvent};
use crate::error::ConfigError;

/// A scenario read from JSON: optional vehicle and initial conditions, a
/// time window and a list of events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub name: String,
    pub description: Option<String>,
    /// Vehicle to load before the run
    pub aircraft: Option<String>,
    /// Initial-condition document, looked up in the vehicle directory
    pub initialize: Option<String>,
    /// Frame timestep override
    pub dt: Option<f64>,
    /// Events are not evaluated before this time
    pub start_time: f64,
    /// The scenario completes once the clock passes this time
    pub end_time: Option<f64>,
    pub events: Vec<ScriptEvent>,

    #[serde(skip)]
    checked: bool,
}

impl Script {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_end_time(mut self, end_time: f64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_event(mut self, event: ScriptEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let script = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            script = %script.name,
            events = script.events.len(),
            "Loaded script {}",
            path.display()
        );
        Ok(script)
    }

    pub fn events(&self) -> &[ScriptEvent] {
        &self.events
    }
}

impl ScenarioDriver for Script {
    fn run_script(&mut self, ctx: &ScriptContext<'_>) -> bool {
        if !self.checked {
            for event in &self.events {
                for name in event.missing_properties(ctx.pm) {
                    warn!(event = %event.name, property = %name, "Script references an unknown property");
                }
            }
            self.checked = true;
        }

        if let Some(end_time) = self.end_time {
            if ctx.sim_time > end_time {
                debug!(time = ctx.sim_time, "Script end time reached");
                return false;
            }
        }
        if ctx.sim_time < self.start_time {
            return true;
        }

        for event in &mut self.events {
            event.step(ctx);
        }
        true
    }

    fn reset_events(&mut self) {
        for event in &mut self.events {
            event.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyManager;
    use crate::script::{Schedule, Trigger};

    fn run(script: &mut Script, pm: &PropertyManager, t: f64) -> bool {
        script.run_script(&ScriptContext {
            pm,
            sim_time: t,
            frame: 0,
        })
    }

    #[test]
    fn test_end_time_completes() {
        let pm = PropertyManager::new();
        let mut script = Script::new("short").with_end_time(1.0);
        assert!(run(&mut script, &pm, 0.5));
        assert!(run(&mut script, &pm, 1.0));
        assert!(!run(&mut script, &pm, 1.01));
    }

    #[test]
    fn test_start_time_defers_events() {
        let pm = PropertyManager::new();
        pm.bind("flag", 0.0);
        let mut script = Script::new("late").with_event(
            ScriptEvent::new("set", Trigger::Schedule(Schedule::once(0.0))).with_set("flag", 1.0),
        );
        script.start_time = 2.0;
        run(&mut script, &pm, 1.0);
        assert_eq!(pm.get("flag"), Some(0.0));
        run(&mut script, &pm, 2.0);
        assert_eq!(pm.get("flag"), Some(1.0));

        pm.set("flag", 0.0);
        script.reset_events();
        run(&mut script, &pm, 2.5);
        assert_eq!(pm.get("flag"), Some(1.0));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{ "name": "demo", "aircraft": "c1", "end_time": 5.0,
                 "events": [ { "name": "go", "trigger": { "schedule": { "t_start": 1.0 } },
                               "set": [ { "property": "fcs/throttle-cmd-norm", "value": 1.0 } ] } ] }"#,
        )
        .unwrap();
        let script = Script::from_file(&path).unwrap();
        assert_eq!(script.aircraft.as_deref(), Some("c1"));
        assert_eq!(script.events().len(), 1);
        assert_eq!(script.start_time, 0.0);

        assert!(Script::from_file(&dir.path().join("missing.json")).is_err());
    }
}
