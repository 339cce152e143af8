//! Actuator - discrete signal conditioning with fault injection
//!
//! Each frame the command passes through a fixed chain of stages:
//!
//! ```text
//! input * sign -> faults -> lag -> rate limit -> deadband -> hysteresis -> bias -> clip
//! ```
//!
//! Stages that need a previous value (lag, rate limit, hysteresis) pass their
//! input through unchanged until the actuator has completed one frame.
//!
//! # Configuration
//!
//! ```json
//! { "name": "actuator", "attributes": { "name": "elevator" }, "children": [
//!     { "name": "input", "value": "fcs/elevator-cmd-norm" },
//!     { "name": "lag", "value": 60.0 },
//!     { "name": "rate_limit", "value": 2.0 },
//!     { "name": "clipto", "children": [
//!         { "name": "min", "value": -0.35 }, { "name": "max", "value": 0.3 } ] },
//!     { "name": "output", "value": "fcs/elevator-pos-rad" }
//! ] }
//! ```

use tracing::{info, trace};

use super::{FcsComponent, Parameter};
use crate::config::Element;
use crate::error::ModelError;
use crate::model::LoadContext;
use crate::property::{signed_reference, PropertyManager, PropertyNode};
use crate::utils::{make_property_name, sign};

/// Actuator with lag, rate limit, deadband, hysteresis, bias and clipping
#[derive(Debug, Clone)]
pub struct Actuator {
    name: String,
    property_base: String,
    dt: f64,

    // I/O
    input_node: PropertyNode,
    input_sign: f64,
    input_name: String,
    output_nodes: Vec<PropertyNode>,
    value_node: PropertyNode,
    input: f64,
    output: f64,

    // Parameters
    lag: f64,
    ca: f64,
    cb: f64,
    rate_limit_incr: Option<Parameter>,
    rate_limit_decr: Option<Parameter>,
    deadband_width: f64,
    hysteresis_width: f64,
    bias: f64,
    clip: Option<(Parameter, Parameter)>,

    // State
    previous_output: f64,
    previous_hyst_output: f64,
    previous_rate_lim_output: f64,
    previous_lag_input: f64,
    previous_lag_output: f64,
    initialized: bool,
    saturated: bool,

    // Malfunctions, published under <base>/malfunction/
    fail_zero: PropertyNode,
    fail_hardover: PropertyNode,
    fail_stuck: PropertyNode,
    saturated_node: PropertyNode,
}

impl Actuator {
    /// Pass-through actuator reading `input` and running at `dt`
    pub fn new(name: &str, input: &str, pm: &PropertyManager, dt: f64) -> Result<Self, ModelError> {
        let property_base = if name.contains('/') {
            name.to_string()
        } else {
            format!("fcs/{}", make_property_name(name))
        };
        let (input_name, input_sign) = signed_reference(input);
        let input_node = pm
            .node(input_name, true)
            .ok_or_else(|| ModelError::NoSuchProperty(input_name.to_string()))?;

        let actuator = Self {
            name: name.to_string(),
            property_base,
            dt,
            input_node,
            input_sign,
            input_name: input_name.to_string(),
            output_nodes: Vec::new(),
            value_node: PropertyNode::default(),
            input: 0.0,
            output: 0.0,
            lag: 0.0,
            ca: 0.0,
            cb: 0.0,
            rate_limit_incr: None,
            rate_limit_decr: None,
            deadband_width: 0.0,
            hysteresis_width: 0.0,
            bias: 0.0,
            clip: None,
            previous_output: 0.0,
            previous_hyst_output: 0.0,
            previous_rate_lim_output: 0.0,
            previous_lag_input: 0.0,
            previous_lag_output: 0.0,
            initialized: false,
            saturated: false,
            fail_zero: PropertyNode::default(),
            fail_hardover: PropertyNode::default(),
            fail_stuck: PropertyNode::default(),
            saturated_node: PropertyNode::default(),
        };
        actuator.bind(pm);
        Ok(actuator)
    }

    /// Build an actuator from its configuration element
    pub fn load(el: &Element, ctx: &LoadContext<'_>, dt: f64) -> Result<Self, ModelError> {
        let pm = ctx.pm;
        let name = el.attr("name").unwrap_or("actuator");
        let input = el
            .find_value("input")
            .ok_or_else(|| ModelError::MissingElement("input".into()))?;
        let mut act = Self::new(name, input, pm, dt)?;

        for out in el.find_all("output").filter_map(Element::value) {
            let node = pm
                .node(out, true)
                .ok_or_else(|| ModelError::NoSuchProperty(out.to_string()))?;
            act.output_nodes.push(node);
        }

        for limit in el.find_all("rate_limit") {
            let text = limit
                .value()
                .ok_or_else(|| ModelError::MissingElement("rate_limit".into()))?;
            let param = Parameter::parse(text, pm)?;
            let sense = limit.attr("sense").unwrap_or("");
            if sense.starts_with("incr") {
                act.rate_limit_incr = Some(param);
            } else if sense.starts_with("decr") {
                act.rate_limit_decr = Some(param);
            } else {
                act.rate_limit_incr = Some(param.clone());
                act.rate_limit_decr = Some(param);
            }
        }

        if el.find("lag").is_some() {
            act.set_lag(el.find_value_as_number("lag")?);
        }
        if el.find("bias").is_some() {
            act.bias = el.find_value_as_number("bias")?;
        }
        if el.find("deadband_width").is_some() {
            act.deadband_width = el.find_value_as_number("deadband_width")?;
        }
        if el.find("hysteresis_width").is_some() {
            act.hysteresis_width = el.find_value_as_number("hysteresis_width")?;
        }
        if let Some(clipto) = el.find("clipto") {
            let min = clipto.find_value("min").unwrap_or("0");
            let max = clipto.find_value("max").unwrap_or("0");
            act.clip = Some((Parameter::parse(min, pm)?, Parameter::parse(max, pm)?));
        }

        if ctx.debug.startup() {
            act.echo();
        }
        if ctx.debug.instantiation() {
            trace!(actuator = %act.name, "Instantiated: Actuator");
        }
        Ok(act)
    }

    fn bind(&self, pm: &PropertyManager) {
        let base = &self.property_base;
        let nodes = [
            (format!("{base}/malfunction/fail_zero"), &self.fail_zero),
            (format!("{base}/malfunction/fail_hardover"), &self.fail_hardover),
            (format!("{base}/malfunction/fail_stuck"), &self.fail_stuck),
            (format!("{base}/saturated"), &self.saturated_node),
            (base.clone(), &self.value_node),
        ];
        for (path, node) in nodes {
            if !pm.tie(&path, node) {
                tracing::warn!(property = %path, "Failed to bind actuator property");
            }
        }
    }

    fn echo(&self) {
        let sign = if self.input_sign < 0.0 { "-" } else { "" };
        info!("      INPUT: {sign}{}", self.input_name);
        if self.bias != 0.0 {
            info!("      Bias: {}", self.bias);
        }
        if let Some(ref p) = self.rate_limit_incr {
            info!("      Increasing rate limit: {}", describe(p));
        }
        if let Some(ref p) = self.rate_limit_decr {
            info!("      Decreasing rate limit: {}", describe(p));
        }
        if self.lag != 0.0 {
            info!("      Actuator lag: {}", self.lag);
        }
        if self.hysteresis_width != 0.0 {
            info!("      Hysteresis width: {}", self.hysteresis_width);
        }
        if self.deadband_width != 0.0 {
            info!("      Deadband width: {}", self.deadband_width);
        }
    }

    /// Set the lag (1/s) and derive the filter coefficients
    pub fn set_lag(&mut self, lag: f64) {
        self.lag = lag;
        let denom = 2.0 + self.dt * lag;
        self.ca = self.dt * lag / denom;
        self.cb = (2.0 - self.dt * lag) / denom;
    }

    /// Symmetric rate limit in units per second
    pub fn set_rate_limit(&mut self, limit: f64) {
        self.rate_limit_incr = Some(Parameter::Constant(limit));
        self.rate_limit_decr = Some(Parameter::Constant(limit));
    }

    pub fn set_bias(&mut self, bias: f64) {
        self.bias = bias;
    }

    pub fn set_deadband_width(&mut self, width: f64) {
        self.deadband_width = width;
    }

    pub fn set_hysteresis_width(&mut self, width: f64) {
        self.hysteresis_width = width;
    }

    pub fn set_clip(&mut self, min: f64, max: f64) {
        self.clip = Some((Parameter::Constant(min), Parameter::Constant(max)));
    }

    pub fn input(&self) -> f64 {
        self.input
    }

    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    pub fn property_base(&self) -> &str {
        &self.property_base
    }

    pub fn set_fail_zero(&self, fail: bool) {
        self.fail_zero.set_bool(fail);
    }

    pub fn set_fail_hardover(&self, fail: bool) {
        self.fail_hardover.set_bool(fail);
    }

    pub fn set_fail_stuck(&self, fail: bool) {
        self.fail_stuck.set_bool(fail);
    }

    fn clip_bounds(&self) -> (f64, f64) {
        match self.clip {
            Some((ref min, ref max)) => (min.value(), max.value()),
            None => (0.0, 0.0),
        }
    }

    fn lag_stage(&mut self) {
        let input = self.output;
        if self.initialized {
            self.output = self.ca * (input + self.previous_lag_input) + self.cb * self.previous_lag_output;
        }
        self.previous_lag_input = input;
        self.previous_lag_output = self.output;
    }

    fn rate_limit_stage(&mut self) {
        let input = self.output;
        if self.initialized {
            let delta = input - self.previous_rate_lim_output;
            let incr = self
                .rate_limit_incr
                .as_ref()
                .map_or(f64::INFINITY, |p| p.value().abs());
            let decr = self
                .rate_limit_decr
                .as_ref()
                .map_or(f64::NEG_INFINITY, |p| -p.value().abs());
            if delta > self.dt * incr {
                self.output = self.previous_rate_lim_output + incr * self.dt;
            } else if delta < self.dt * decr {
                self.output = self.previous_rate_lim_output + decr * self.dt;
            }
        }
        self.previous_rate_lim_output = self.output;
    }

    fn deadband_stage(&mut self) {
        let half = self.deadband_width / 2.0;
        let input = self.output;
        self.output = if input < -half {
            input + half
        } else if input > half {
            input - half
        } else {
            0.0
        };
    }

    fn hysteresis_stage(&mut self) {
        let input = self.output;
        let half = 0.5 * self.hysteresis_width;
        if self.initialized {
            if input > self.previous_hyst_output {
                self.output = self.previous_hyst_output.max(input - half);
            } else if input < self.previous_hyst_output {
                self.output = self.previous_hyst_output.min(input + half);
            }
        }
        self.previous_hyst_output = self.output;
    }

    fn clip_stage(&mut self) {
        if self.clip.is_none() {
            return;
        }
        let (min, max) = self.clip_bounds();
        if self.output > max {
            self.output = max;
        } else if self.output < min {
            self.output = min;
        }
        self.saturated = (self.output >= max && max != 0.0) || (self.output <= min && min != 0.0);
    }
}

fn describe(p: &Parameter) -> String {
    match p {
        Parameter::Constant(v) => v.to_string(),
        Parameter::Property { name, .. } => name.clone(),
    }
}

impl FcsComponent for Actuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "actuator"
    }

    fn run(&mut self, trimming: bool) {
        self.input = self.input_node.get() * self.input_sign;

        if trimming {
            self.initialized = false;
        }

        if self.fail_zero.get_bool() {
            self.input = 0.0;
        }
        if self.fail_hardover.get_bool() {
            let (min, max) = self.clip_bounds();
            self.input = if sign(self.input) > 0.0 { max } else { min };
        }

        self.output = self.input;

        if self.fail_stuck.get_bool() {
            self.output = self.previous_output;
        } else {
            if self.lag != 0.0 {
                self.lag_stage();
            }
            if self.rate_limit_incr.is_some() || self.rate_limit_decr.is_some() {
                self.rate_limit_stage();
            }
            if self.deadband_width != 0.0 {
                self.deadband_stage();
            }
            if self.hysteresis_width != 0.0 {
                self.hysteresis_stage();
            }
            if self.bias != 0.0 {
                self.output += self.bias;
            }
        }

        self.previous_output = self.output;
        self.initialized = true;

        self.clip_stage();

        self.saturated_node.set_bool(self.saturated);
        self.value_node.set(self.output);
        for node in &self.output_nodes {
            node.set(self.output);
        }
    }

    fn output(&self) -> f64 {
        self.output
    }

    fn reset_past_states(&mut self) {
        self.previous_output = 0.0;
        self.previous_hyst_output = 0.0;
        self.previous_rate_lim_output = 0.0;
        self.previous_lag_input = 0.0;
        self.previous_lag_output = 0.0;
        self.output = 0.0;
        self.initialized = false;
        self.saturated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f64 = 0.01;

    fn actuator(pm: &PropertyManager) -> Actuator {
        Actuator::new("test", "fcs/cmd", pm, DT).unwrap()
    }

    fn step(act: &mut Actuator, pm: &PropertyManager, input: f64) -> f64 {
        pm.set("fcs/cmd", input);
        act.run(false);
        act.output()
    }

    #[test]
    fn test_identity_when_unconfigured() {
        let pm = PropertyManager::new();
        let mut act = actuator(&pm);
        for x in [0.3, -1.2, 5.0, 0.0] {
            assert_eq!(step(&mut act, &pm, x), x);
        }
        assert_eq!(pm.get("fcs/test"), Some(0.0));
    }

    #[test]
    fn test_input_sign() {
        let pm = PropertyManager::new();
        let mut act = Actuator::new("neg", "-fcs/cmd", &pm, DT).unwrap();
        assert_eq!(step(&mut act, &pm, 0.4), -0.4);
    }

    #[test]
    fn test_lag_bypassed_first_frame() {
        let pm = PropertyManager::new();
        let mut act = actuator(&pm);
        act.set_lag(10.0);
        assert_eq!(step(&mut act, &pm, 1.0), 1.0);
    }

    #[test]
    fn test_lag_monotonic_convergence() {
        let pm = PropertyManager::new();
        let mut act = actuator(&pm);
        act.set_lag(10.0);
        step(&mut act, &pm, 0.0);

        let mut prev = 0.0;
        for _ in 0..2000 {
            let y = step(&mut act, &pm, 1.0);
            assert!(y >= prev);
            assert!(y <= 1.0 + 1e-12);
            prev = y;
        }
        assert_relative_eq!(prev, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rate_limit_step() {
        let pm = PropertyManager::new();
        let mut act = actuator(&pm);
        act.set_rate_limit(2.0);
        step(&mut act, &pm, 0.0);
        let y = step(&mut act, &pm, 1.0);
        assert_relative_eq!(y, 2.0 * DT, epsilon = 1e-12);
        let y = step(&mut act, &pm, -1.0);
        assert_relative_eq!(y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rate_limit_reads_property_every_frame() {
        let pm = PropertyManager::new();
        let el = Element::new("actuator")
            .with_attr("name", "thr")
            .with_child(Element::new("input").with_value("fcs/cmd"))
            .with_child(
                Element::new("rate_limit")
                    .with_attr("sense", "incr")
                    .with_value("fcs/rate"),
            );
        let paths = Default::default();
        let ctx = LoadContext {
            pm: &pm,
            paths: &paths,
            dt: DT,
            debug: crate::logging::DebugLevel(0),
        };
        let mut act = Actuator::load(&el, &ctx, DT).unwrap();
        pm.set("fcs/rate", 1.0);
        step(&mut act, &pm, 0.0);
        assert_relative_eq!(step(&mut act, &pm, 1.0), 0.01, epsilon = 1e-12);
        pm.set("fcs/rate", 10.0);
        assert_relative_eq!(step(&mut act, &pm, 1.0), 0.11, epsilon = 1e-12);
        // no decrement limit configured
        assert_eq!(step(&mut act, &pm, -1.0), -1.0);
    }

    #[test]
    fn test_deadband_continuous() {
        let pm = PropertyManager::new();
        let mut act = actuator(&pm);
        act.set_deadband_width(0.2);
        assert_eq!(step(&mut act, &pm, 0.05), 0.0);
        assert_relative_eq!(step(&mut act, &pm, 0.5), 0.4);
        assert_relative_eq!(step(&mut act, &pm, -0.5), -0.4);
    }

    #[test]
    fn test_hysteresis_holds_inside_band() {
        let pm = PropertyManager::new();
        let mut act = actuator(&pm);
        act.set_hysteresis_width(0.4);
        step(&mut act, &pm, 0.0);
        let held = step(&mut act, &pm, 1.0);
        assert_relative_eq!(held, 0.8);
        for x in [0.95, 0.65, 0.9, 0.7, 1.0, 0.61] {
            assert_relative_eq!(step(&mut act, &pm, x), held);
        }
        assert_relative_eq!(step(&mut act, &pm, 0.5), 0.7);
    }

    #[test]
    fn test_bias_and_clip_saturation() {
        let pm = PropertyManager::new();
        let mut act = actuator(&pm);
        act.set_bias(0.1);
        act.set_clip(-0.5, 0.5);
        assert_relative_eq!(step(&mut act, &pm, 0.2), 0.3);
        assert!(!act.is_saturated());
        assert_relative_eq!(step(&mut act, &pm, 0.9), 0.5);
        assert!(act.is_saturated());
        assert_eq!(pm.get("fcs/test/saturated"), Some(1.0));
    }

    #[test]
    fn test_unset_clip_bound_not_saturated() {
        let pm = PropertyManager::new();
        let mut act = actuator(&pm);
        act.set_clip(0.0, 1.0);
        step(&mut act, &pm, -0.3);
        assert_eq!(act.output(), 0.0);
        assert!(!act.is_saturated());
    }

    #[test]
    fn test_faults() {
        let pm = PropertyManager::new();
        let mut act = actuator(&pm);
        act.set_clip(-0.4, 0.6);

        step(&mut act, &pm, 0.2);
        pm.set("fcs/test/malfunction/fail_stuck", 1.0);
        assert_relative_eq!(step(&mut act, &pm, -0.3), 0.2);
        pm.set("fcs/test/malfunction/fail_stuck", 0.0);

        act.set_fail_zero(true);
        assert_eq!(step(&mut act, &pm, 0.3), 0.0);
        act.set_fail_zero(false);

        act.set_fail_hardover(true);
        assert_relative_eq!(step(&mut act, &pm, 0.1), 0.6);
        assert_relative_eq!(step(&mut act, &pm, -0.1), -0.4);
    }

    #[test]
    fn test_trimming_reinitialises() {
        let pm = PropertyManager::new();
        let mut act = actuator(&pm);
        act.set_rate_limit(1.0);
        step(&mut act, &pm, 0.0);
        pm.set("fcs/cmd", 1.0);
        act.run(true);
        assert_eq!(act.output(), 1.0);
    }

    #[test]
    fn test_outputs_published() {
        let pm = PropertyManager::new();
        let el = Element::new("actuator")
            .with_attr("name", "Elevator Actuator")
            .with_child(Element::new("input").with_value("fcs/elevator-cmd-norm"))
            .with_child(Element::new("output").with_value("fcs/elevator-pos-norm"));
        let paths = Default::default();
        let ctx = LoadContext {
            pm: &pm,
            paths: &paths,
            dt: DT,
            debug: crate::logging::DebugLevel(0),
        };
        let mut act = Actuator::load(&el, &ctx, DT).unwrap();
        assert_eq!(act.property_base(), "fcs/elevator-actuator");
        pm.set("fcs/elevator-cmd-norm", 0.25);
        act.run(false);
        assert_eq!(pm.get("fcs/elevator-pos-norm"), Some(0.25));
        assert_eq!(pm.get("fcs/elevator-actuator"), Some(0.25));
    }
}
