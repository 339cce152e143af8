//! Standard models scheduled by the executive
//!
//! Each model owns a public `inputs` record. Only the executive's wiring
//! table writes to it, immediately before the model runs.

mod accelerations;
mod aerodynamics;
mod aircraft;
mod atmosphere;
mod auxiliary;
mod buoyant_forces;
mod external_reactions;
mod fcs;
mod ground_reactions;
mod inertial;
mod input;
mod mass_balance;
mod output;
mod propagate;
pub mod propulsion;
mod winds;

pub use accelerations::*;
pub use aerodynamics::*;
pub use aircraft::*;
pub use atmosphere::*;
pub use auxiliary::*;
pub use buoyant_forces::*;
pub use external_reactions::*;
pub use fcs::*;
pub use ground_reactions::*;
pub use inertial::*;
pub use input::*;
pub use mass_balance::*;
pub use output::*;
pub use propagate::*;
pub use propulsion::Propulsion;
pub use winds::*;

use crate::property::{PropertyManager, PropertyNode};

/// Fixed set of values a model publishes to the property registry
#[derive(Debug, Clone)]
pub(crate) struct Published<const N: usize> {
    nodes: [PropertyNode; N],
}

impl<const N: usize> Published<N> {
    /// Bind one node per name; failed binds are logged and left detached
    pub fn bind(pm: &PropertyManager, names: [&str; N]) -> Self {
        let nodes = names.map(|name| {
            let node = PropertyNode::default();
            if !pm.tie(name, &node) {
                tracing::warn!(property = name, "Failed to bind model property");
            }
            node
        });
        Self { nodes }
    }

    pub fn publish(&self, values: [f64; N]) {
        for (node, value) in self.nodes.iter().zip(values) {
            node.set(value);
        }
    }
}

/// Resolve a node that may be written from outside, logging a failed bind
pub(crate) fn settable(pm: &PropertyManager, name: &str, initial: f64) -> PropertyNode {
    pm.bind(name, initial).unwrap_or_else(|| {
        tracing::warn!(property = name, "Failed to bind model property");
        PropertyNode::new(initial)
    })
}
