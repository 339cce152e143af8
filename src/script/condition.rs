//! Property conditions

use serde::{Deserialize, Serialize};

use crate::property::PropertyManager;

/// Relational test between a property and an operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    #[serde(alias = "<")]
    Lt,
    #[serde(alias = "<=")]
    Le,
    #[serde(alias = "==")]
    Eq,
    #[serde(alias = "!=")]
    Ne,
    #[default]
    #[serde(alias = ">=")]
    Ge,
    #[serde(alias = ">")]
    Gt,
}

impl Comparison {
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Eq => lhs == rhs,
            Comparison::Ne => lhs != rhs,
            Comparison::Ge => lhs >= rhs,
            Comparison::Gt => lhs > rhs,
        }
    }
}

/// Right-hand side of a condition: a literal or another property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Value(f64),
    Property(String),
}

impl Operand {
    fn resolve(&self, pm: &PropertyManager) -> Option<f64> {
        match self {
            Operand::Value(v) => Some(*v),
            Operand::Property(name) => pm.get(name),
        }
    }
}

/// `property <comparison> value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub property: String,
    #[serde(default)]
    pub comparison: Comparison,
    pub value: Operand,
}

impl Condition {
    pub fn new(property: impl Into<String>, comparison: Comparison, value: f64) -> Self {
        Self {
            property: property.into(),
            comparison,
            value: Operand::Value(value),
        }
    }

    /// Evaluate against the registry; a missing property reads as false
    pub fn evaluate(&self, pm: &PropertyManager) -> bool {
        match (pm.get(&self.property), self.value.resolve(pm)) {
            (Some(lhs), Some(rhs)) => self.comparison.holds(lhs, rhs),
            _ => false,
        }
    }

    /// Names this condition reads that are not in the registry
    pub fn missing_properties(&self, pm: &PropertyManager) -> Vec<String> {
        let mut missing = Vec::new();
        if !pm.has(&self.property) {
            missing.push(self.property.clone());
        }
        if let Operand::Property(name) = &self.value {
            if !pm.has(name) {
                missing.push(name.clone());
            }
        }
        missing
    }
}
