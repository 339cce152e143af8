//! Flight control system components
//!
//! Components are owned by the flight control model and run in document
//! order once per flight control frame. Each one reads its input from the
//! property registry and publishes its output back to it.

mod actuator;

pub use actuator::*;

use crate::config::Element;
use crate::error::ModelError;
use crate::model::LoadContext;
use crate::property::{signed_reference, PropertyManager, PropertyNode};

/// One per-frame element of a control channel
pub trait FcsComponent {
    fn name(&self) -> &str;

    /// Component type as written in the configuration document
    fn kind(&self) -> &'static str;

    /// Execute one frame
    ///
    /// `trimming` is set while a trim solver drives the vehicle; stateful
    /// components treat every such frame as their first.
    fn run(&mut self, trimming: bool);

    fn output(&self) -> f64;

    /// Forget all carried state
    fn reset_past_states(&mut self);
}

/// A numeric setting that is either fixed or read from a property
#[derive(Debug, Clone)]
pub enum Parameter {
    Constant(f64),
    Property { node: PropertyNode, sign: f64, name: String },
}

impl Parameter {
    /// Parse a literal number or a (possibly negated) property reference
    pub fn parse(text: &str, pm: &PropertyManager) -> Result<Self, ModelError> {
        let text = text.trim();
        if let Ok(v) = text.parse::<f64>() {
            return Ok(Parameter::Constant(v));
        }
        let (name, sign) = signed_reference(text);
        let node = pm
            .node(name, true)
            .ok_or_else(|| ModelError::NoSuchProperty(name.to_string()))?;
        Ok(Parameter::Property {
            node,
            sign,
            name: name.to_string(),
        })
    }

    #[inline]
    pub fn value(&self) -> f64 {
        match self {
            Parameter::Constant(v) => *v,
            Parameter::Property { node, sign, .. } => node.get() * sign,
        }
    }
}

/// Build the component described by `el`
///
/// Returns `Ok(None)` for component types this build does not model; the
/// caller logs and skips them.
pub fn load_component(
    el: &Element,
    ctx: &LoadContext<'_>,
    dt: f64,
) -> Result<Option<Box<dyn FcsComponent>>, ModelError> {
    match el.name.as_str() {
        "actuator" => Ok(Some(Box::new(Actuator::load(el, ctx, dt)?))),
        _ => Ok(None),
    }
}
