//! Input - externally queued property writes
//!
//! Writes queued from outside the frame loop are applied at the Input
//! position of the pipeline, so every later model in the frame sees them.
//! Writes are applied while holding, which lets a held simulation still be
//! commanded.

use std::collections::VecDeque;

use tracing::{info, warn};

use crate::config::Element;
use crate::error::ModelError;
use crate::model::{LoadContext, Model, ModelBase};
use crate::property::PropertyManager;

pub struct Input {
    base: ModelBase,
    pm: PropertyManager,

    /// Names accepted from the queue; empty accepts any existing property
    accepted: Vec<String>,
    pending: VecDeque<(String, f64)>,
    applied: u64,
    rejected: u64,
}

impl Input {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("input"),
            pm: pm.clone(),
            accepted: Vec::new(),
            pending: VecDeque::new(),
            applied: 0,
            rejected: 0,
        }
    }

    /// Queue a write for the next executed frame
    pub fn queue_write(&mut self, name: impl Into<String>, value: f64) {
        self.pending.push_back((name.into(), value));
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn accepts(&self, name: &str) -> bool {
        self.accepted.is_empty() || self.accepted.iter().any(|a| a == name)
    }
}

impl Model for Input {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn run(&mut self, _holding: bool) -> bool {
        if self.base.run_gate() {
            return true;
        }

        while let Some((name, value)) = self.pending.pop_front() {
            if self.accepts(&name) && self.pm.set(&name, value) {
                self.applied += 1;
            } else {
                warn!(property = %name, "Rejected queued input");
                self.rejected += 1;
            }
        }
        false
    }

    fn load(&mut self, el: &Element, ctx: &LoadContext<'_>) -> Result<(), ModelError> {
        if let Some(rate) = el.attr("rate") {
            let rate = rate.parse::<u32>().map_err(|_| ModelError::InvalidValue {
                element: "input".into(),
                value: rate.to_string(),
            })?;
            self.set_rate(rate);
        }
        for prop in el.find_all("property").filter_map(Element::value) {
            if !ctx.pm.has(prop) {
                warn!(property = prop, "Input property does not exist, skipping");
                continue;
            }
            self.accepted.push(prop.to_string());
        }
        if ctx.debug.startup() {
            info!(
                rate = self.rate(),
                accepted = self.accepted.len(),
                "    Input model loaded"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AssetPaths;
    use crate::logging::DebugLevel;

    #[test]
    fn test_applies_while_holding() {
        let pm = PropertyManager::new();
        pm.bind("fcs/elevator-cmd-norm", 0.0);
        let mut input = Input::new(&pm);
        input.queue_write("fcs/elevator-cmd-norm", 0.3);
        assert!(!input.run(true));
        assert_eq!(pm.get("fcs/elevator-cmd-norm"), Some(0.3));
        assert_eq!(input.applied(), 1);
    }

    #[test]
    fn test_whitelist_rejects_other_names() {
        let pm = PropertyManager::new();
        pm.bind("a", 0.0);
        pm.bind("b", 0.0);
        let paths = AssetPaths::default();
        let ctx = LoadContext {
            pm: &pm,
            paths: &paths,
            dt: 0.01,
            debug: DebugLevel(0),
        };
        let el = Element::new("input")
            .with_child(Element::new("property").with_value("a"))
            .with_child(Element::new("property").with_value("missing"));
        let mut input = Input::new(&pm);
        input.load(&el, &ctx).unwrap();

        input.queue_write("a", 1.0);
        input.queue_write("b", 1.0);
        input.run(false);
        assert_eq!(pm.get("a"), Some(1.0));
        assert_eq!(pm.get("b"), Some(0.0));
        assert_eq!(input.rejected(), 1);
    }
}
