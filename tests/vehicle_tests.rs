//! Vehicle loading, initial conditions, child vehicles and scenarios

mod common;

use std::path::Path;

use approx::assert_relative_eq;
use rustfdm::prelude::*;

use common::{settings, standard_vehicle, write, write_engine_files, write_vehicle};

const CHILD: &str = r#"{ "name": "child", "attributes": { "name": "drone", "mated": "false" },
  "children": [
    { "name": "location", "attributes": { "unit": "IN" },
      "children": [ { "name": "x", "value": 120 }, { "name": "z", "value": -10 } ] }
  ] }"#;

fn loaded(root: &Path) -> Executive {
    write_engine_files(root);
    write_vehicle(root, "test", &standard_vehicle("Test Vehicle", &[]));
    let mut exec = Executive::new(settings(root)).unwrap();
    exec.load_model("test").unwrap();
    exec
}

#[test]
fn test_load_vehicle() {
    let dir = tempfile::tempdir().unwrap();
    let exec = loaded(dir.path());

    assert!(exec.loaded());
    assert_eq!(exec.aircraft_name(), "Test Vehicle");
    assert_eq!(exec.model_name(), "test");
    assert_eq!(exec.full_aircraft_path(), dir.path().join("aircraft/test"));

    let m = exec.models();
    assert_eq!(m.propulsion.num_engines(), 2);
    assert_eq!(m.fcs.num_throttles(), 2);
    assert_eq!(m.ground_reactions.num_gear_units(), 1);
    assert_relative_eq!(m.aircraft.wing_area(), 174.0);
    // empty weight plus tank contents
    assert_relative_eq!(
        m.mass_balance.mass() * rustfdm::utils::constants::SLUG_TO_LB,
        1600.0,
        epsilon = 1e-6
    );
    assert!(!exec.property_catalog().is_empty());
}

#[test]
fn test_run_ic_starts_requested_engines() {
    let dir = tempfile::tempdir().unwrap();
    let mut exec = loaded(dir.path());

    exec.set_initial_conditions(InitialConditions {
        altitude_ft: 2000.0,
        u_fps: 150.0,
        running_engines: vec![1],
        ..Default::default()
    });
    exec.run_ic().unwrap();

    let propulsion = &exec.models().propulsion;
    assert!(!propulsion.engine(0).unwrap().running());
    assert!(propulsion.engine(1).unwrap().running());
    assert_eq!(exec.sim_time(), 0.0);
    assert_relative_eq!(exec.models().propagate.uvw().x, 150.0, epsilon = 1e-9);

    // -1 starts every engine
    exec.initial_conditions_mut().running_engines = vec![-1];
    exec.reset_to_initial_conditions(0).unwrap();
    let propulsion = &exec.models().propulsion;
    assert!(propulsion.engine(0).unwrap().running());
    assert!(propulsion.engine(1).unwrap().running());
}

#[test]
fn test_run_ic_rejects_unknown_engine() {
    let dir = tempfile::tempdir().unwrap();
    let mut exec = loaded(dir.path());
    exec.initial_conditions_mut().running_engines = vec![5];
    assert!(matches!(exec.run_ic(), Err(ExecError::Model(_))));
}

#[test]
fn test_initial_conditions_from_vehicle_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut exec = loaded(dir.path());
    write(
        &dir.path().join("aircraft/test/cruise.json"),
        r#"{ "altitude_ft": 5000, "u_fps": 200, "running_engines": [0] }"#,
    );

    exec.load_initial_conditions("cruise").unwrap();
    assert_eq!(exec.initial_conditions().altitude_ft, 5000.0);
    assert!(matches!(
        exec.load_initial_conditions("missing"),
        Err(ExecError::Model(ModelError::ResourceNotFound { .. }))
    ));
}

#[test]
fn test_missing_required_section() {
    let dir = tempfile::tempdir().unwrap();
    write_engine_files(dir.path());
    let text = common::vehicle("Broken", &[common::metrics(), common::ground_reactions()]);
    write_vehicle(dir.path(), "broken", &text);

    let mut exec = Executive::new(settings(dir.path())).unwrap();
    let err = exec.load_model("broken").unwrap_err();
    match err {
        ExecError::Load(e) => assert_eq!(e.section(), Some("mass_balance")),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!exec.loaded());
}

#[test]
fn test_version_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    write_vehicle(
        dir.path(),
        "old",
        r#"{ "name": "fdm_config", "attributes": { "version": "1.0" } }"#,
    );
    let mut exec = Executive::new(settings(dir.path())).unwrap();
    assert!(matches!(
        exec.load_model("old"),
        Err(ExecError::Load(LoadError::Version { .. }))
    ));
}

#[test]
fn test_missing_thruster_names_the_resource() {
    let dir = tempfile::tempdir().unwrap();
    write_engine_files(dir.path());
    let propulsion = common::propulsion(1, "no_such_nozzle");
    let text = common::vehicle(
        "NoThruster",
        &[
            common::metrics(),
            common::mass_balance(),
            common::ground_reactions(),
            &propulsion,
        ],
    );
    write_vehicle(dir.path(), "nothruster", &text);

    let mut exec = Executive::new(settings(dir.path())).unwrap();
    let Err(ExecError::Load(err)) = exec.load_model("nothruster") else {
        panic!("load should fail");
    };
    assert_eq!(err.section(), Some("propulsion"));
    let LoadError::Section { source, .. } = err else {
        panic!("expected a section error");
    };
    assert!(matches!(
        source,
        ModelError::ResourceNotFound { what: "thruster file", ref name, .. } if name == "no_such_nozzle"
    ));
}

#[test]
fn test_undefined_paths() {
    let mut exec = Executive::new(ExecSettings {
        aircraft_path: Default::default(),
        debug_level: Some(0),
        ..Default::default()
    })
    .unwrap();
    assert!(matches!(
        exec.load_model("anything"),
        Err(ExecError::Load(LoadError::UndefinedPaths))
    ));
}

#[test]
fn test_reload_replaces_vehicle() {
    let dir = tempfile::tempdir().unwrap();
    let mut exec = loaded(dir.path());
    let first = exec.property_catalog().len();

    let text = common::vehicle(
        "Glider",
        &[common::metrics(), common::mass_balance(), common::ground_reactions()],
    );
    write_vehicle(dir.path(), "glider", &text);
    exec.load_model("glider").unwrap();

    assert_eq!(exec.aircraft_name(), "Glider");
    assert_eq!(exec.models().propulsion.num_engines(), 0);
    assert!(exec.property_catalog().len() < first);
    assert!(exec.get_property_value("propulsion/engine/thrust-lbs").is_none());
}

#[test]
fn test_unmated_child_keeps_placement_and_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_engine_files(dir.path());
    write_vehicle(dir.path(), "drone", &standard_vehicle("Drone", &[]));
    write_vehicle(dir.path(), "carrier", &standard_vehicle("Carrier", &[CHILD]));

    let mut exec = Executive::new(settings(dir.path())).unwrap();
    exec.load_model("carrier").unwrap();
    assert_eq!(exec.enumerate_vehicles(), ["Carrier", "Drone"]);

    let child = exec.child(0).unwrap();
    assert!(!child.mated());
    assert!(!child.internal());
    assert!(child.exec().is_child());
    assert_eq!(child.exec().id(), 1);
    let placement = child.location();
    assert_relative_eq!(placement.x, 120.0);

    exec.run_ic().unwrap();
    let before = exec.child(0).unwrap().exec().frame();
    for _ in 0..3 {
        exec.run();
    }
    let child = exec.child(0).unwrap();
    assert_eq!(child.exec().frame(), before + 3);
    assert_eq!(child.location(), placement);

    // the child's properties live in its own scope of the shared registry
    let frame = exec
        .property_manager()
        .get("fdm[1]/simulation/frame")
        .unwrap();
    assert_eq!(frame, child.exec().frame() as f64);
}

#[test]
fn test_child_without_location_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_engine_files(dir.path());
    let child = r#"{ "name": "child", "attributes": { "name": "drone" } }"#;
    write_vehicle(dir.path(), "carrier", &standard_vehicle("Carrier", &[child]));

    let mut exec = Executive::new(settings(dir.path())).unwrap();
    assert!(matches!(
        exec.load_model("carrier"),
        Err(ExecError::Load(LoadError::ChildPlacement(ref name))) if name == "drone"
    ));
}

#[test]
fn test_script_drives_run() {
    let dir = tempfile::tempdir().unwrap();
    write_engine_files(dir.path());
    write_vehicle(dir.path(), "test", &standard_vehicle("Test", &[]));
    write(
        &dir.path().join("aircraft/test/ground.json"),
        r#"{ "altitude_ft": 1000, "running_engines": [-1] }"#,
    );
    write(
        &dir.path().join("scripts/throttle_up.json"),
        r#"{ "name": "throttle up", "aircraft": "test", "initialize": "ground",
             "dt": 0.01, "end_time": 0.1,
             "events": [
               { "name": "advance throttles",
                 "trigger": { "schedule": { "t_start": 0.05 } },
                 "set": [ { "property": "fcs/throttle-cmd-norm", "value": 1.0 },
                          { "property": "fcs/throttle-cmd-norm[1]", "value": 1.0 } ],
                 "notify": [ "propulsion/engine/thrust-lbs" ] }
             ] }"#,
    );

    let mut exec = Executive::new(settings(dir.path())).unwrap();
    exec.load_script(Path::new("scripts/throttle_up.json")).unwrap();
    assert!(exec.loaded());
    assert_eq!(exec.dt(), 0.01);
    assert_eq!(exec.initial_conditions().altitude_ft, 1000.0);

    exec.run_ic().unwrap();
    let mut frames = 0;
    while exec.run() {
        frames += 1;
        assert!(frames < 1000, "script never completed");
    }

    assert!(exec.sim_time() > 0.1 && exec.sim_time() < 0.125);
    assert_eq!(exec.get_property_value("fcs/throttle-cmd-norm"), Some(1.0));
    assert_eq!(exec.get_property_value("fcs/throttle-cmd-norm[1]"), Some(1.0));
}
