//! Script events

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Condition, Schedule, ScriptContext};
use crate::property::PropertyManager;

/// What makes an event fire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Condition(Condition),
    /// Every condition holds
    All(Vec<Condition>),
    /// At least one condition holds
    Any(Vec<Condition>),
    /// Fires at each scheduled time, whatever the persistent flag says
    Schedule(Schedule),
}

/// How a set action applies its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetKind {
    #[default]
    Value,
    Delta,
}

/// Property assignment performed when an event fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetAction {
    pub property: String,
    pub value: f64,
    #[serde(default)]
    pub kind: SetKind,
}

impl SetAction {
    fn apply(&self, pm: &PropertyManager) -> bool {
        let value = match self.kind {
            SetKind::Value => self.value,
            SetKind::Delta => match pm.get(&self.property) {
                Some(current) => current + self.value,
                None => return false,
            },
        };
        pm.set(&self.property, value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEvent {
    pub name: String,
    pub trigger: Trigger,
    /// Fire again on every new false-to-true transition
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub set: Vec<SetAction>,
    /// Properties logged when the event fires
    #[serde(default)]
    pub notify: Vec<String>,

    #[serde(skip)]
    previous: bool,
    #[serde(skip)]
    times: Vec<f64>,
}

impl ScriptEvent {
    pub fn new(name: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            name: name.into(),
            trigger,
            persistent: false,
            set: Vec::new(),
            notify: Vec::new(),
            previous: false,
            times: Vec::new(),
        }
    }

    pub fn with_set(mut self, property: impl Into<String>, value: f64) -> Self {
        self.set.push(SetAction {
            property: property.into(),
            value,
            kind: SetKind::Value,
        });
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Times at which the event fired, oldest first
    pub fn event_times(&self) -> &[f64] {
        &self.times
    }

    pub fn fired(&self) -> bool {
        !self.times.is_empty()
    }

    pub fn reset(&mut self) {
        self.previous = false;
        self.times.clear();
    }

    /// Properties referenced by the trigger or the actions that do not exist
    pub fn missing_properties(&self, pm: &PropertyManager) -> Vec<String> {
        let mut missing: Vec<String> = match &self.trigger {
            Trigger::Condition(c) => c.missing_properties(pm),
            Trigger::All(cs) | Trigger::Any(cs) => {
                cs.iter().flat_map(|c| c.missing_properties(pm)).collect()
            }
            Trigger::Schedule(_) => Vec::new(),
        };
        missing.extend(
            self.set
                .iter()
                .map(|s| &s.property)
                .chain(&self.notify)
                .filter(|name| !pm.has(name))
                .cloned(),
        );
        missing
    }

    /// Evaluate the trigger and fire if due; returns `true` when fired
    pub fn step(&mut self, ctx: &ScriptContext<'_>) -> bool {
        let fire = match &self.trigger {
            Trigger::Schedule(s) => s.due(ctx.sim_time, self.times.len()),
            trigger => {
                let state = match trigger {
                    Trigger::Condition(c) => c.evaluate(ctx.pm),
                    Trigger::All(cs) => cs.iter().all(|c| c.evaluate(ctx.pm)),
                    Trigger::Any(cs) => cs.iter().any(|c| c.evaluate(ctx.pm)),
                    Trigger::Schedule(_) => false,
                };
                let rising = state && !self.previous;
                self.previous = state;
                rising && (self.persistent || self.times.is_empty())
            }
        };
        if !fire {
            return false;
        }

        for action in &self.set {
            if !action.apply(ctx.pm) {
                warn!(event = %self.name, property = %action.property, "Event set target does not exist");
            }
        }
        self.times.push(ctx.sim_time);

        info!(event = %self.name, time = ctx.sim_time, frame = ctx.frame, "Event fired");
        for name in &self.notify {
            match ctx.pm.get(name) {
                Some(value) => info!(event = %self.name, property = %name, value, "Notify"),
                None => warn!(event = %self.name, property = %name, "Notify property does not exist"),
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Comparison;

    fn ctx(pm: &PropertyManager, t: f64) -> ScriptContext<'_> {
        ScriptContext {
            pm,
            sim_time: t,
            frame: 0,
        }
    }

    #[test]
    fn test_fires_once_on_rising_edge() {
        let pm = PropertyManager::new();
        pm.bind("x", 0.0);
        pm.bind("y", 0.0);
        let mut ev = ScriptEvent::new(
            "x high",
            Trigger::Condition(Condition::new("x", Comparison::Gt, 1.0)),
        )
        .with_set("y", 5.0);

        assert!(!ev.step(&ctx(&pm, 0.0)));
        pm.set("x", 2.0);
        assert!(ev.step(&ctx(&pm, 0.1)));
        assert_eq!(pm.get("y"), Some(5.0));
        assert!(!ev.step(&ctx(&pm, 0.2)));

        // falls and rises again, but is not persistent
        pm.set("x", 0.0);
        ev.step(&ctx(&pm, 0.3));
        pm.set("x", 2.0);
        assert!(!ev.step(&ctx(&pm, 0.4)));
        assert_eq!(ev.event_times(), [0.1]);
    }

    #[test]
    fn test_persistent_refires() {
        let pm = PropertyManager::new();
        pm.bind("x", 2.0);
        let mut ev = ScriptEvent::new(
            "x high",
            Trigger::Condition(Condition::new("x", Comparison::Gt, 1.0)),
        )
        .persistent();
        assert!(ev.step(&ctx(&pm, 0.0)));
        pm.set("x", 0.0);
        assert!(!ev.step(&ctx(&pm, 0.1)));
        pm.set("x", 3.0);
        assert!(ev.step(&ctx(&pm, 0.2)));
        assert_eq!(ev.event_times().len(), 2);
    }

    #[test]
    fn test_periodic_schedule_and_delta() {
        let pm = PropertyManager::new();
        pm.bind("count", 0.0);
        let mut ev = ScriptEvent::new(
            "tick",
            Trigger::Schedule(Schedule::periodic(0.0, 1.0, Some(2.0))),
        );
        ev.set.push(SetAction {
            property: "count".into(),
            value: 1.0,
            kind: SetKind::Delta,
        });
        for i in 0..50 {
            ev.step(&ctx(&pm, i as f64 * 0.1));
        }
        assert_eq!(pm.get("count"), Some(3.0));

        ev.reset();
        assert!(!ev.fired());
    }

    #[test]
    fn test_parse_any_trigger() {
        let json = r#"{ "name": "either",
            "trigger": { "any": [
                { "property": "a", "comparison": "lt", "value": 0 },
                { "property": "b", "comparison": "gt", "value": 0 } ] } }"#;
        let ev: ScriptEvent = serde_json::from_str(json).unwrap();
        let pm = PropertyManager::new();
        pm.bind("a", 1.0);
        pm.bind("b", 1.0);
        assert!(ev.clone().step(&ctx(&pm, 0.0)));
        assert!(ev.missing_properties(&pm).is_empty());
    }
}
