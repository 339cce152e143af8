//! Child vehicles
//!
//! A child is a complete executive loaded from its own vehicle definition.
//! It shares the parent's property registry under its own `fdm[n]/` scope
//! and is driven by the parent once per frame, after receiving the parent's
//! propagated state.

use std::path::Path;

use nalgebra::Vector3;
use tracing::{info, warn};

use crate::config::Element;
use crate::error::LoadError;

use super::Executive;

/// A sub-vehicle and its placement in the parent's structural frame
pub struct ChildVehicle {
    exec: Box<Executive>,
    /// Structural location, inches
    location: Vector3<f64>,
    /// Roll, pitch and yaw, radians
    orientation: Vector3<f64>,
    mated: bool,
    internal: bool,
}

impl ChildVehicle {
    pub fn exec(&self) -> &Executive {
        &self.exec
    }

    pub fn exec_mut(&mut self) -> &mut Executive {
        &mut self.exec
    }

    pub fn location(&self) -> Vector3<f64> {
        self.location
    }

    pub fn set_location(&mut self, location: Vector3<f64>) {
        self.location = location;
    }

    pub fn orientation(&self) -> Vector3<f64> {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Vector3<f64>) {
        self.orientation = orientation;
    }

    pub fn mated(&self) -> bool {
        self.mated
    }

    pub fn set_mated(&mut self, mated: bool) {
        self.mated = mated;
    }

    pub fn internal(&self) -> bool {
        self.internal
    }
}

/// Build a child from a `child` section of the parent's definition
///
/// The placement is checked before the child's own definition is read.
pub(super) fn read_child(
    parent: &Executive,
    el: &Element,
    file: &Path,
) -> Result<ChildVehicle, LoadError> {
    let name = el.attr("name").unwrap_or_default().to_string();
    let section_error = |source| LoadError::Section {
        section: "child",
        path: file.to_path_buf(),
        source,
    };

    let location = match el.find("location") {
        Some(loc) => loc.triplet_convert_to("IN").map_err(section_error)?,
        None => return Err(LoadError::ChildPlacement(name)),
    };
    let orientation = match el.find("orient") {
        Some(orient) => orient.triplet_convert_to("RAD").map_err(section_error)?,
        None => {
            if parent.debug_level().startup() {
                warn!(child = %name, "No orientation was found for child object, assuming 0,0,0");
            }
            Vector3::zeros()
        }
    };

    let wrap = |source: LoadError| LoadError::Child {
        name: name.clone(),
        source: Box::new(source),
    };
    let mut exec = parent
        .spawn_child()
        .map_err(|e| wrap(LoadError::Allocation(e)))?;
    exec.load_vehicle(&name, true).map_err(wrap)?;

    let child = ChildVehicle {
        exec: Box::new(exec),
        location,
        orientation,
        mated: el.attr("mated") != Some("false"),
        internal: el.attr("internal") == Some("true"),
    };
    if parent.debug_level().startup() {
        info!(
            "    Child {} at [{}, {}, {}] in, mated: {}",
            name, location.x, location.y, location.z, child.mated
        );
    }
    Ok(child)
}
