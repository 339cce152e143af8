//! Vehicle fixtures written into a temporary root directory

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use rustfdm::ExecSettings;

pub const ENGINE: &str = r#"{ "name": "turbine_engine", "attributes": { "name": "test jet" },
  "children": [
    { "name": "maxthrust", "attributes": { "unit": "LBS" }, "value": 1000 },
    { "name": "sl_fuel_flow_max", "attributes": { "unit": "LBS/SEC" }, "value": 0.5 }
  ] }"#;

pub const THRUSTER: &str = r#"{ "name": "direct" }"#;

pub fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

pub fn metrics() -> &'static str {
    r#"{ "name": "metrics", "children": [
        { "name": "wingarea", "attributes": { "unit": "FT2" }, "value": 174 },
        { "name": "wingspan", "attributes": { "unit": "FT" }, "value": 36 },
        { "name": "chord", "attributes": { "unit": "FT" }, "value": 4.9 },
        { "name": "location", "attributes": { "name": "AERORP", "unit": "IN" },
          "children": [ { "name": "x", "value": 43 } ] }
      ] }"#
}

pub fn mass_balance() -> &'static str {
    r#"{ "name": "mass_balance", "children": [
        { "name": "ixx", "attributes": { "unit": "SLUG*FT2" }, "value": 948 },
        { "name": "iyy", "attributes": { "unit": "SLUG*FT2" }, "value": 1346 },
        { "name": "izz", "attributes": { "unit": "SLUG*FT2" }, "value": 1967 },
        { "name": "emptywt", "attributes": { "unit": "LBS" }, "value": 1500 },
        { "name": "location", "attributes": { "unit": "IN" },
          "children": [ { "name": "x", "value": 41 } ] }
      ] }"#
}

pub fn ground_reactions() -> &'static str {
    r#"{ "name": "ground_reactions", "children": [
        { "name": "contact", "attributes": { "type": "BOGEY", "name": "NOSE" }, "children": [
            { "name": "location", "attributes": { "unit": "IN" },
              "children": [ { "name": "x", "value": -7 }, { "name": "z", "value": -20 } ] },
            { "name": "spring_coeff", "attributes": { "unit": "LBS/FT" }, "value": 1800 },
            { "name": "damping_coeff", "attributes": { "unit": "LBS/FT/SEC" }, "value": 600 }
        ] }
      ] }"#
}

/// Propulsion section with `engines` identical engines fed from one tank
pub fn propulsion(engines: usize, thruster: &str) -> String {
    let engine = format!(
        r#"{{ "name": "engine", "attributes": {{ "file": "test_jet" }}, "children": [
            {{ "name": "location", "attributes": {{ "unit": "IN" }},
               "children": [ {{ "name": "x", "value": 50 }} ] }},
            {{ "name": "feed", "value": 0 }},
            {{ "name": "thruster", "attributes": {{ "file": "{thruster}" }} }}
        ] }}"#
    );
    let engines = vec![engine; engines].join(",");
    format!(
        r#"{{ "name": "propulsion", "children": [ {engines},
            {{ "name": "tank", "attributes": {{ "type": "FUEL" }}, "children": [
                {{ "name": "location", "attributes": {{ "unit": "IN" }},
                   "children": [ {{ "name": "x", "value": 48 }} ] }},
                {{ "name": "capacity", "attributes": {{ "unit": "LBS" }}, "value": 200 }},
                {{ "name": "contents", "attributes": {{ "unit": "LBS" }}, "value": 100 }}
            ] }}
        ] }}"#
    )
}

/// Assemble a vehicle document from already-serialised sections
pub fn vehicle(name: &str, sections: &[&str]) -> String {
    format!(
        r#"{{ "name": "fdm_config", "attributes": {{ "name": "{name}", "version": "2.0" }},
             "children": [ {} ] }}"#,
        sections.join(",")
    )
}

/// The standard two-engine test vehicle with optional extra sections
pub fn standard_vehicle(name: &str, extra: &[&str]) -> String {
    let propulsion = propulsion(2, "test_nozzle");
    let mut sections = vec![metrics(), mass_balance(), ground_reactions(), propulsion.as_str()];
    sections.extend_from_slice(extra);
    vehicle(name, &sections)
}

/// Write the engine and thruster documents under `root/engine`
pub fn write_engine_files(root: &Path) {
    write(&root.join("engine/test_jet.json"), ENGINE);
    write(&root.join("engine/test_nozzle.json"), THRUSTER);
}

/// Write `aircraft/<name>/<name>.json`
pub fn write_vehicle(root: &Path, name: &str, text: &str) {
    write(&root.join(format!("aircraft/{name}/{name}.json")), text);
}

/// Quiet settings rooted at `root`
pub fn settings(root: &Path) -> ExecSettings {
    ExecSettings {
        debug_level: Some(0),
        ..ExecSettings::rooted(root)
    }
}
