//! Configuration documents
//!
//! Vehicle, engine and script definitions are trees of [`Element`]s stored
//! as JSON. An element has a name, string attributes, an optional scalar
//! value and ordered children:
//!
//! ```json
//! { "name": "metrics", "children": [
//!     { "name": "wingarea", "attributes": { "unit": "FT2" }, "value": 174.0 }
//! ] }
//! ```
//!
//! Numeric lookups accept a `unit` attribute and convert to the unit the
//! caller asks for.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigError, ModelError};

/// One node of a configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(default, deserialize_with = "scalar_map")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "scalar")]
    pub value: Option<String>,
    #[serde(default)]
    pub children: Vec<Element>,
}

fn scalar_to_string(v: serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn scalar<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(scalar_to_string(v))
}

fn scalar_map<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, String>, D::Error> {
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(d)?;
    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k, s)))
        .collect())
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder: add an attribute
    pub fn with_attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Builder: set the scalar value
    pub fn with_value(mut self, value: impl ToString) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Builder: append a child
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Parse a document from a JSON string
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Read and parse a document from disk
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Trimmed scalar value
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().map(str::trim)
    }

    /// First child with the given name
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn count(&self, name: &str) -> usize {
        self.find_all(name).count()
    }

    /// Child that must exist
    pub fn require(&self, name: &str) -> Result<&Element, ModelError> {
        self.find(name)
            .ok_or_else(|| ModelError::MissingElement(name.to_string()))
    }

    /// Scalar value of a child, if present
    pub fn find_value(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(Element::value)
    }

    pub fn value_as_number(&self) -> Result<f64, ModelError> {
        let text = self
            .value()
            .ok_or_else(|| ModelError::MissingElement(self.name.clone()))?;
        text.parse::<f64>().map_err(|_| ModelError::InvalidValue {
            element: self.name.clone(),
            value: text.to_string(),
        })
    }

    /// Value converted from this element's `unit` attribute to `target`
    ///
    /// An element without a unit is taken to be in `target` already.
    pub fn value_as_number_convert_to(&self, target: &str) -> Result<f64, ModelError> {
        let value = self.value_as_number()?;
        match self.attr("unit") {
            Some(unit) => convert(value, unit, target).ok_or_else(|| ModelError::UnknownUnit {
                element: self.name.clone(),
                unit: unit.to_string(),
            }),
            None => Ok(value),
        }
    }

    pub fn find_value_as_number(&self, name: &str) -> Result<f64, ModelError> {
        self.require(name)?.value_as_number()
    }

    pub fn find_value_as_number_convert_to(
        &self,
        name: &str,
        target: &str,
    ) -> Result<f64, ModelError> {
        self.require(name)?.value_as_number_convert_to(target)
    }

    /// Optional numeric child with a fallback
    pub fn value_or(&self, name: &str, target: &str, default: f64) -> Result<f64, ModelError> {
        match self.find(name) {
            Some(e) => e.value_as_number_convert_to(target),
            None => Ok(default),
        }
    }

    /// Optional unitless numeric child with a fallback
    pub fn number_or(&self, name: &str, default: f64) -> Result<f64, ModelError> {
        match self.find(name) {
            Some(e) => e.value_as_number(),
            None => Ok(default),
        }
    }

    /// Child holding `x`/`y`/`z` (or `roll`/`pitch`/`yaw`) components
    ///
    /// The unit attribute sits on the triplet element itself. Missing
    /// components default to zero.
    pub fn find_triplet_convert_to(
        &self,
        name: &str,
        target: &str,
    ) -> Result<Vector3<f64>, ModelError> {
        let triplet = self.require(name)?;
        triplet.triplet_convert_to(target)
    }

    pub fn triplet_convert_to(&self, target: &str) -> Result<Vector3<f64>, ModelError> {
        let unit = self.attr("unit");
        let axes: [[&str; 2]; 3] = [["x", "roll"], ["y", "pitch"], ["z", "yaw"]];
        let mut out = Vector3::zeros();
        for (i, names) in axes.iter().enumerate() {
            let Some(component) = names.iter().find_map(|n| self.find(n)) else {
                continue;
            };
            let raw = component.value_as_number()?;
            out[i] = match unit {
                Some(u) => convert(raw, u, target).ok_or_else(|| ModelError::UnknownUnit {
                    element: self.name.clone(),
                    unit: u.to_string(),
                })?,
                None => raw,
            };
        }
        Ok(out)
    }
}

/// Find the document `name` in the first directory of `search` holding it
///
/// A name without an extension gets `.json` appended.
pub fn resolve_document(
    what: &'static str,
    name: &str,
    search: &[PathBuf],
) -> Result<PathBuf, ModelError> {
    let file = if Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{name}.json")
    };
    let candidates: Vec<PathBuf> = search.iter().map(|dir| dir.join(&file)).collect();
    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| ModelError::ResourceNotFound {
            what,
            name: name.to_string(),
            searched: candidates,
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Length,
    Mass,
    Angle,
    Area,
    Inertia,
    Density,
    Velocity,
    Spring,
    Damping,
    MassFlow,
    Time,
}

/// Dimension and factor to the English base unit of that dimension
fn unit_info(unit: &str) -> Option<(Dimension, f64)> {
    use Dimension::*;
    let info = match unit.trim().to_ascii_uppercase().as_str() {
        "FT" => (Length, 1.0),
        "IN" => (Length, 1.0 / 12.0),
        "M" => (Length, 3.280_839_895),
        "LBS" => (Mass, 1.0),
        "KG" => (Mass, 2.204_622_62),
        "SLUG" => (Mass, 32.174_049),
        "RAD" => (Angle, 1.0),
        "DEG" => (Angle, std::f64::consts::PI / 180.0),
        "FT2" => (Area, 1.0),
        "M2" => (Area, 10.763_910_4),
        "SLUG*FT2" => (Inertia, 1.0),
        "KG*M2" => (Inertia, 0.737_562_149),
        "LBS/GAL" => (Density, 1.0),
        "KG/L" => (Density, 8.345_404_5),
        "FT/SEC" | "FT/S" => (Velocity, 1.0),
        "M/S" | "M/SEC" => (Velocity, 3.280_839_895),
        "KTS" => (Velocity, 1.687_809_857),
        "LBS/FT" => (Spring, 1.0),
        "N/M" => (Spring, 0.068_521_766),
        "LBS/FT/SEC" => (Damping, 1.0),
        "N/M/SEC" => (Damping, 0.068_521_766),
        "LBS/SEC" => (MassFlow, 1.0),
        "KG/SEC" => (MassFlow, 2.204_622_62),
        "SEC" => (Time, 1.0),
        _ => return None,
    };
    Some(info)
}

/// Convert `value` between two units of the same dimension
///
/// Returns `None` for unknown units or mismatched dimensions.
pub fn convert(value: f64, from: &str, to: &str) -> Option<f64> {
    let (from_dim, from_factor) = unit_info(from)?;
    let (to_dim, to_factor) = unit_info(to)?;
    if from_dim != to_dim {
        return None;
    }
    Some(value * from_factor / to_factor)
}
