//! Executive - drives the fixed model pipeline one frame at a time
//!
//! ```rust,ignore
//! use rustfdm::prelude::*;
//!
//! let mut exec = Executive::new(ExecSettings::rooted("data"))?;
//! exec.load_model("c1")?;
//! exec.run_ic()?;
//! while exec.run() {}
//! ```
//!
//! A frame advances the children, then the clock, then the scenario
//! driver, then every pipeline stage in order with its inputs wired
//! immediately before it runs. `run` returns `false` once the run should
//! stop.

mod child;
mod pipeline;
mod trim;
mod wiring;

pub use child::ChildVehicle;
pub use pipeline::{run_frame, FrameData, Pipeline, StandardModels};
pub use trim::{ControlGuess, Linearizer, TrimConfig, TrimMode, Trimmer};
pub use wiring::{load_all_inputs, load_inputs, load_model_constants, load_planet_constants};

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, error, info, trace, warn};

use crate::config::{resolve_document, Element};
use crate::context::{ExecSettings, SimContext};
use crate::error::{ExecError, ExecResult, LoadError, ModelError};
use crate::initial_conditions::InitialConditions;
use crate::logging::DebugLevel;
use crate::model::{LoadContext, Model, ModelRole};
use crate::property::{PropertyManager, PropertyNode};
use crate::script::{ScenarioDriver, Script, ScriptContext};
use crate::utils::constants::{CONFIG_VERSION, TRIGGER_IDLE};

/// Properties that request an action at the start of the next frame
///
/// The value written is the action's mode argument.
#[derive(Debug, Clone)]
struct Triggers {
    reset: PropertyNode,
    simple_trim: PropertyNode,
    simplex_trim: PropertyNode,
    linearization: PropertyNode,
}

impl Triggers {
    fn bind(pm: &PropertyManager) -> Self {
        let bind = |name: &str| {
            pm.bind(name, TRIGGER_IDLE).unwrap_or_else(|| {
                warn!(property = name, "Failed to bind trigger property");
                PropertyNode::new(TRIGGER_IDLE)
            })
        };
        Self {
            reset: bind("simulation/reset"),
            simple_trim: bind("simulation/do_simple_trim"),
            simplex_trim: bind("simulation/do_simplex_trim"),
            linearization: bind("simulation/do_linearization"),
        }
    }
}

/// Which attached trim solver to drive
#[derive(Debug, Clone, Copy)]
enum TrimSolver {
    Simple,
    Simplex,
}

pub struct Executive {
    ctx: SimContext,
    settings: ExecSettings,
    pm: PropertyManager,
    root_pm: PropertyManager,
    models: StandardModels,
    ic: InitialConditions,

    children: Vec<ChildVehicle>,
    child_counter: Rc<Cell<u32>>,
    id: u32,
    is_child: bool,

    constructing: bool,
    loaded: bool,
    model_name: String,

    script: Option<Box<dyn ScenarioDriver>>,
    trimmer: Option<Box<dyn Trimmer>>,
    simplex_trimmer: Option<Box<dyn Trimmer>>,
    linearizer: Option<Box<dyn Linearizer>>,
    trim_config: TrimConfig,
    trim_status: bool,

    /// Frames left before entering hold, `None` when off
    steps_until_hold: Option<u32>,

    triggers: Triggers,
    catalog: Vec<String>,
}

impl Executive {
    /// Create a root executive with its own property registry
    pub fn new(settings: ExecSettings) -> ExecResult<Self> {
        let root_pm = PropertyManager::new();
        let exec = Self::build(settings, root_pm, Rc::new(Cell::new(0)), false)?;
        if exec.ctx.debug().startup() {
            info!(
                "rustfdm {} executive, dt {:.6} s",
                env!("CARGO_PKG_VERSION"),
                exec.ctx.dt()
            );
        }
        Ok(exec)
    }

    /// Create a root executive from a JSON settings file
    pub fn from_settings_file(path: &Path) -> ExecResult<Self> {
        let settings = ExecSettings::from_file(path).map_err(LoadError::from)?;
        Self::new(settings)
    }

    fn build(
        settings: ExecSettings,
        root_pm: PropertyManager,
        child_counter: Rc<Cell<u32>>,
        is_child: bool,
    ) -> Result<Self, ModelError> {
        let id = child_counter.get();
        child_counter.set(id + 1);
        let pm = root_pm.instance(id);
        let ctx = SimContext::new(&settings);
        let triggers = Triggers::bind(&pm);
        ctx.bind(&pm);

        let mut exec = Self {
            models: StandardModels::new(&pm),
            ctx,
            settings,
            pm,
            root_pm,
            ic: InitialConditions::default(),
            children: Vec::new(),
            child_counter,
            id,
            is_child,
            constructing: true,
            loaded: false,
            model_name: String::new(),
            script: None,
            trimmer: None,
            simplex_trimmer: None,
            linearizer: None,
            trim_config: TrimConfig::default(),
            trim_status: false,
            steps_until_hold: None,
            triggers,
            catalog: Vec::new(),
        };
        exec.allocate()?;
        exec.constructing = false;
        if exec.ctx.debug().instantiation() {
            trace!(id, is_child, "Instantiated executive");
        }
        Ok(exec)
    }

    /// Construct a child sharing this executive's registry and counter
    fn spawn_child(&self) -> Result<Executive, ModelError> {
        let settings = ExecSettings {
            dt: self.ctx.nominal_dt(),
            debug_level: Some(self.ctx.debug().0),
            ..self.settings.clone()
        };
        let mut child = Self::build(
            settings,
            self.root_pm.clone(),
            Rc::clone(&self.child_counter),
            true,
        )?;
        let paths = &self.ctx.paths;
        child.ctx.paths.root_dir = paths.root_dir.clone();
        child.ctx.paths.aircraft = paths.aircraft.clone();
        child.ctx.paths.engine = paths.engine.clone();
        child.ctx.paths.systems = paths.systems.clone();
        Ok(child)
    }

    fn allocate(&mut self) -> Result<(), ModelError> {
        load_planet_constants(&mut self.models);
        for role in ModelRole::ALL {
            // Output starts logging from run_ic, once initial conditions exist
            if role == ModelRole::Output {
                continue;
            }
            self.models.model_mut(role).init_model()?;
        }
        self.ic = InitialConditions::default();
        Ok(())
    }

    fn deallocate(&mut self) {
        for child in &mut self.children {
            child.exec_mut().deallocate();
        }
        self.children.clear();
        self.pm.untie_all();
        self.loaded = false;
        self.catalog.clear();
        self.model_name.clear();
    }

    fn reallocate(&mut self) -> Result<(), ModelError> {
        self.deallocate();
        self.constructing = true;
        self.ctx.bind(&self.pm);
        self.triggers = Triggers::bind(&self.pm);
        self.models = StandardModels::new(&self.pm);
        let result = self.allocate();
        self.constructing = false;
        result
    }

    // ----------------------------------------------------------------------
    // Loading

    /// Load `<aircraft>/<model>/<model>.json`
    pub fn load_model(&mut self, model: &str) -> ExecResult<()> {
        self.load_vehicle(model, true).map_err(ExecError::from)
    }

    /// Re-root the search paths under the root directory, then load
    ///
    /// Without `add_model_to_path` the definition is read directly from
    /// the aircraft path.
    pub fn load_model_with_paths(
        &mut self,
        aircraft: &Path,
        engine: &Path,
        systems: &Path,
        model: &str,
        add_model_to_path: bool,
    ) -> ExecResult<()> {
        self.ctx.paths.set_paths(aircraft, engine, systems);
        self.load_vehicle(model, add_model_to_path)
            .map_err(ExecError::from)
    }

    fn load_vehicle(&mut self, model: &str, add_model_to_path: bool) -> Result<(), LoadError> {
        if !self.ctx.paths.is_defined() {
            error!("Attempted to load a vehicle with undefined paths");
            return Err(LoadError::UndefinedPaths);
        }
        if self.loaded {
            self.reallocate().map_err(LoadError::Allocation)?;
        }

        let dir = if add_model_to_path {
            self.ctx.paths.aircraft.join(model)
        } else {
            self.ctx.paths.aircraft.clone()
        };
        let file = dir.join(format!("{model}.json"));

        if let Err(e) = self.read_vehicle(model, &dir, &file) {
            error!(file = %file.display(), section = ?e.section(), "{e}");
            self.reallocate().map_err(LoadError::Allocation)?;
            return Err(e);
        }

        // Mass properties with the loaded tanks and gas cells
        let frame = self.frame_data();
        load_inputs(&mut self.models, ModelRole::MassBalance, &frame);
        self.models
            .mass_balance
            .init_model()
            .map_err(|source| LoadError::Section {
                section: "mass_balance",
                path: file.clone(),
                source,
            })?;
        load_model_constants(&mut self.models);
        load_all_inputs(&mut self.models, &frame);

        self.loaded = true;
        self.model_name = model.to_string();
        self.catalog = self.pm.catalog();
        if self.ctx.debug().startup() && !self.is_child {
            info!(
                vehicle = %self.models.aircraft.aircraft_name(),
                properties = self.catalog.len(),
                children = self.children.len(),
                "Vehicle loaded"
            );
        }
        Ok(())
    }

    fn read_vehicle(&mut self, model: &str, dir: &Path, file: &Path) -> Result<(), LoadError> {
        let doc = Element::from_file(file)?;
        let echo = self.ctx.debug().startup() && !self.is_child;

        let version = doc.attr("version").unwrap_or_default();
        if version != CONFIG_VERSION {
            return Err(LoadError::Version {
                found: version.to_string(),
                needed: CONFIG_VERSION,
                path: file.to_path_buf(),
            });
        }
        let name = doc.attr("name").unwrap_or(model).to_string();
        if echo {
            info!("Reading vehicle definition {name}");
            match doc.attr("release") {
                Some("ALPHA") => warn!(
                    "This vehicle model is an early version. It is not fit for \
                     serious use and may not behave as expected"
                ),
                Some("BETA") => warn!(
                    "This vehicle model is a beta version. It may not be fully \
                     verified against test data"
                ),
                _ => {}
            }
        }
        self.models.aircraft.set_aircraft_name(name);
        self.ctx.paths.full_aircraft = dir.to_path_buf();

        if let Some(header) = doc.find("fileheader") {
            if echo {
                read_file_header(header);
            }
        }

        let required = |section: &'static str| {
            doc.find(section).ok_or_else(|| LoadError::MissingSection {
                section,
                path: file.to_path_buf(),
            })
        };
        let metrics = required("metrics")?;
        let mass_balance = required("mass_balance")?;
        let ground_reactions = required("ground_reactions")?;

        let debug = self.ctx.debug();
        let lctx = LoadContext {
            pm: &self.pm,
            paths: &self.ctx.paths,
            dt: self.ctx.nominal_dt(),
            debug: if self.is_child { DebugLevel(0) } else { debug },
        };
        let section = |section: &'static str| {
            move |source| LoadError::Section {
                section,
                path: file.to_path_buf(),
                source,
            }
        };
        let m = &mut self.models;

        m.aircraft.load(metrics, &lctx).map_err(section("metrics"))?;
        m.mass_balance
            .load(mass_balance, &lctx)
            .map_err(section("mass_balance"))?;
        m.ground_reactions
            .load(ground_reactions, &lctx)
            .map_err(section("ground_reactions"))?;
        m.fcs.add_gear(m.ground_reactions.num_gear_units());

        if let Some(el) = doc.find("external_reactions") {
            m.external_reactions
                .load(el, &lctx)
                .map_err(section("external_reactions"))?;
        }
        if let Some(el) = doc.find("buoyant_forces") {
            m.buoyant_forces
                .load(el, &lctx)
                .map_err(section("buoyant_forces"))?;
        }
        if let Some(el) = doc.find("propulsion") {
            m.propulsion.load(el, &lctx).map_err(section("propulsion"))?;
            for _ in 0..m.propulsion.num_engines() {
                m.fcs.add_throttle();
            }
        }
        for el in doc.find_all("system") {
            m.fcs.load(el, &lctx).map_err(section("system"))?;
        }
        if let Some(el) = doc.find("autopilot") {
            m.fcs.load(el, &lctx).map_err(section("autopilot"))?;
        }
        if let Some(el) = doc.find("flight_control") {
            m.fcs.load(el, &lctx).map_err(section("flight_control"))?;
        }
        match doc.find("aerodynamics") {
            Some(el) => m
                .aerodynamics
                .load(el, &lctx)
                .map_err(section("aerodynamics"))?,
            None => warn!("No aerodynamics section was found in {}", file.display()),
        }
        if let Some(el) = doc.find("input") {
            m.input.load(el, &lctx).map_err(section("input"))?;
        }
        for el in doc.find_all("output") {
            m.output.load(el, &lctx).map_err(section("output"))?;
        }

        for el in doc.find_all("child") {
            let child = child::read_child(self, el, file)?;
            self.children.push(child);
        }
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Frame loop

    fn frame_data(&self) -> FrameData {
        FrameData {
            sim_time: self.ctx.sim_time(),
            dt: self.ctx.dt(),
            trim_status: self.trim_status,
        }
    }

    /// Execute one frame
    ///
    /// Returns `false` when the run should stop: termination was requested
    /// or the scenario driver reported completion.
    pub fn run(&mut self) -> bool {
        self.check_incremental_hold();
        self.service_triggers();
        self.step()
    }

    fn step(&mut self) -> bool {
        let mut success = true;

        if !self.children.is_empty() {
            let state = self.models.propagate.state();
            for child in &mut self.children {
                let exec = child.exec_mut();
                exec.models.propagate.set_state(state);
                exec.run();
            }
        }

        self.ctx.incr_time();
        let debug = self.ctx.debug();
        if debug.run() {
            debug!(
                id = self.id,
                frame = self.ctx.frame(),
                time = self.ctx.sim_time(),
                dt = self.ctx.dt(),
                "Executive run"
            );
        }

        if !self.ctx.integration_suspended() {
            if let Some(script) = self.script.as_mut() {
                let sctx = ScriptContext {
                    pm: &self.pm,
                    sim_time: self.ctx.sim_time(),
                    frame: self.ctx.frame(),
                };
                success = script.run_script(&sctx);
            }
        }

        let frame = self.frame_data();
        run_frame(&mut self.models, &frame, self.ctx.holding());

        if debug.state() {
            let s = self.models.propagate.state();
            debug!(
                id = self.id,
                altitude = self.models.propagate.altitude_asl(),
                u = s.uvw.x,
                v = s.uvw.y,
                w = s.uvw.z,
                "Vehicle state"
            );
        }

        if self.ctx.terminate_requested() {
            success = false;
        }
        success
    }

    fn check_incremental_hold(&mut self) {
        match self.steps_until_hold {
            Some(0) => {
                self.ctx.set_holding(true);
                self.steps_until_hold = None;
            }
            Some(n) => self.steps_until_hold = Some(n - 1),
            None => {}
        }
    }

    fn service_triggers(&mut self) {
        let reset = self.triggers.reset.take(TRIGGER_IDLE);
        if reset != TRIGGER_IDLE {
            if let Err(e) = self.reset_to_initial_conditions(reset as i32) {
                error!("Reset failed: {e}");
            }
        }
        let mode = self.triggers.simple_trim.take(TRIGGER_IDLE);
        if mode != TRIGGER_IDLE {
            // errors are logged by the trim entry point
            let _ = self.do_trim(mode as i32);
        }
        let mode = self.triggers.simplex_trim.take(TRIGGER_IDLE);
        if mode != TRIGGER_IDLE {
            let _ = self.do_simplex_trim(mode as i32);
        }
        let mode = self.triggers.linearization.take(TRIGGER_IDLE);
        if mode != TRIGGER_IDLE {
            let _ = self.do_linearization(mode as i32);
        }
    }

    /// Hold after `steps` more frames
    pub fn enable_increment_then_hold(&mut self, steps: u32) {
        self.steps_until_hold = Some(steps);
    }

    pub fn hold(&mut self) {
        self.ctx.set_holding(true);
    }

    pub fn resume(&mut self) {
        self.ctx.set_holding(false);
    }

    pub fn holding(&self) -> bool {
        self.ctx.holding()
    }

    pub fn suspend_integration(&mut self) {
        self.ctx.suspend_integration();
    }

    pub fn resume_integration(&mut self) {
        self.ctx.resume_integration();
    }

    pub fn integration_suspended(&self) -> bool {
        self.ctx.integration_suspended()
    }

    // ----------------------------------------------------------------------
    // Initial conditions

    /// Establish the initial conditions without advancing the clock
    pub fn run_ic(&mut self) -> ExecResult<()> {
        self.models.output.init_model()?;

        let saved_rate = self.models.propagate.rate();
        self.models.propagate.set_rate(1);
        self.ctx.suspend_integration();

        self.initialize();
        self.step();

        self.ctx.resume_integration();
        self.models.propagate.set_rate(saved_rate);

        for &engine in &self.ic.running_engines {
            self.models.propulsion.init_running(engine)?;
        }
        Ok(())
    }

    /// Seed a self-consistent zero-time state from the initial conditions
    pub fn initialize(&mut self) {
        self.ctx.set_sim_time(0.0);
        let frame = self.frame_data();
        let m = &mut self.models;

        m.propagate.set_initial_state(&self.ic);

        load_inputs(m, ModelRole::Accelerations, &frame);
        m.accelerations.run(false);

        load_inputs(m, ModelRole::Propagate, &frame);
        m.propagate.initialize_derivatives();

        load_inputs(m, ModelRole::Atmosphere, &frame);
        m.atmosphere.run(false);

        m.winds.set_wind_ned(self.ic.wind_ned());

        load_inputs(m, ModelRole::Auxiliary, &frame);
        m.auxiliary.run(false);
    }

    /// Reinitialise every model, zero the clock and rerun the initial
    /// conditions
    ///
    /// Mode 1 also starts new output files. Does nothing while the
    /// executive is being constructed.
    pub fn reset_to_initial_conditions(&mut self, mode: i32) -> ExecResult<()> {
        if mode == 1 {
            self.models.output.set_start_new_output();
        }
        if self.constructing {
            return Ok(());
        }

        let frame = self.frame_data();
        for role in ModelRole::ALL {
            if role == ModelRole::Output {
                continue;
            }
            load_inputs(&mut self.models, role, &frame);
            self.models.model_mut(role).init_model()?;
        }

        self.ctx.reset_clock();
        self.run_ic()?;

        if let Some(script) = self.script.as_mut() {
            script.reset_events();
        }
        Ok(())
    }

    pub fn initial_conditions(&self) -> &InitialConditions {
        &self.ic
    }

    pub fn initial_conditions_mut(&mut self) -> &mut InitialConditions {
        &mut self.ic
    }

    pub fn set_initial_conditions(&mut self, ic: InitialConditions) {
        self.ic = ic;
    }

    /// Read initial conditions from the vehicle directory or the root
    pub fn load_initial_conditions(&mut self, name: &str) -> ExecResult<()> {
        let search = [
            self.ctx.paths.full_aircraft.clone(),
            self.ctx.paths.root_dir.clone(),
        ];
        let path = resolve_document("initialization file", name, &search)?;
        self.ic = InitialConditions::from_file(&path).map_err(LoadError::from)?;
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Trim and linearization

    pub fn set_trimmer(&mut self, trimmer: Box<dyn Trimmer>) {
        self.trimmer = Some(trimmer);
    }

    pub fn set_simplex_trimmer(&mut self, trimmer: Box<dyn Trimmer>) {
        self.simplex_trimmer = Some(trimmer);
    }

    pub fn set_linearizer(&mut self, linearizer: Box<dyn Linearizer>) {
        self.linearizer = Some(linearizer);
    }

    pub fn trim_config(&self) -> &TrimConfig {
        &self.trim_config
    }

    pub fn set_trim_config(&mut self, config: TrimConfig) {
        self.trim_config = config;
    }

    /// Set while a trim solver is driving this executive
    pub fn trim_status(&self) -> bool {
        self.trim_status
    }

    pub fn do_trim(&mut self, mode: i32) -> ExecResult<()> {
        self.run_trim(TrimSolver::Simple, mode)
    }

    pub fn do_simplex_trim(&mut self, mode: i32) -> ExecResult<()> {
        self.run_trim(TrimSolver::Simplex, mode)
    }

    fn run_trim(&mut self, which: TrimSolver, mode: i32) -> ExecResult<()> {
        if self.constructing {
            return Ok(());
        }
        let mode = TrimMode::try_from(mode).inspect_err(|e| error!("{e}"))?;
        let (slot, label) = match which {
            TrimSolver::Simple => (&mut self.trimmer, "trim"),
            TrimSolver::Simplex => (&mut self.simplex_trimmer, "simplex trim"),
        };
        let Some(mut solver) = slot.take() else {
            let err = ExecError::NoSolver(label);
            error!("{err}");
            return Err(err);
        };

        let saved_time = self.ctx.sim_time();
        let config = self.trim_config.clone();
        self.trim_status = true;
        let result = solver.trim(self, mode, &config);
        self.trim_status = false;
        self.ctx.set_sim_time(saved_time);

        match which {
            TrimSolver::Simple => self.trimmer = Some(solver),
            TrimSolver::Simplex => self.simplex_trimmer = Some(solver),
        }
        if let Err(e) = &result {
            error!(?mode, "{e}");
        }
        result
    }

    pub fn do_linearization(&mut self, mode: i32) -> ExecResult<()> {
        if self.constructing {
            return Ok(());
        }
        let Some(mut solver) = self.linearizer.take() else {
            let err = ExecError::NoSolver("linearization");
            error!("{err}");
            return Err(err);
        };
        let saved_time = self.ctx.sim_time();
        let result = solver.linearize(self, mode);
        self.ctx.set_sim_time(saved_time);
        self.linearizer = Some(solver);
        if let Err(e) = &result {
            error!("{e}");
        }
        result
    }

    // ----------------------------------------------------------------------
    // Scenario

    /// Read a scenario, loading its vehicle and initial conditions
    pub fn load_script(&mut self, path: &Path) -> ExecResult<()> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.ctx.paths.root_dir.join(path)
        };
        let script = Script::from_file(&path).map_err(LoadError::from)?;

        if let Some(dt) = script.dt.filter(|dt| *dt > 0.0) {
            self.ctx.set_dt(dt);
        }
        if let Some(aircraft) = script.aircraft.as_deref() {
            if !self.loaded || self.model_name != aircraft {
                self.load_model(aircraft)?;
            }
        }
        if let Some(init) = script.initialize.as_deref() {
            self.load_initial_conditions(init)?;
        }
        self.set_scenario(Box::new(script));
        Ok(())
    }

    pub fn set_scenario(&mut self, driver: Box<dyn ScenarioDriver>) {
        self.script = Some(driver);
    }

    pub fn clear_scenario(&mut self) {
        self.script = None;
    }

    // ----------------------------------------------------------------------
    // Scheduling and properties

    /// Run `model` after the standard roles every `rate` frames
    pub fn schedule(&mut self, model: Box<dyn Model>, rate: u32) {
        self.models.schedule(model, rate);
    }

    pub fn property_manager(&self) -> &PropertyManager {
        &self.pm
    }

    pub fn get_property_value(&self, name: &str) -> Option<f64> {
        self.pm.get(name)
    }

    pub fn set_property_value(&self, name: &str, value: f64) -> bool {
        self.pm.set(name, value)
    }

    /// Queue a property write applied at the Input stage of the next frame
    pub fn queue_input(&mut self, name: impl Into<String>, value: f64) {
        self.models.input.queue_write(name, value);
    }

    /// Property names built after the last successful load
    pub fn property_catalog(&self) -> &[String] {
        &self.catalog
    }

    /// Catalog entries containing `check`, one per line
    pub fn query_property_catalog(&self, check: &str) -> String {
        let results: String = self
            .catalog
            .iter()
            .filter(|name| name.contains(check))
            .map(|name| format!("{name}\n"))
            .collect();
        if results.is_empty() {
            "No matches found\n".to_string()
        } else {
            results
        }
    }

    // ----------------------------------------------------------------------
    // Accessors

    pub fn models(&self) -> &StandardModels {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut StandardModels {
        &mut self.models
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn aircraft_name(&self) -> &str {
        self.models.aircraft.aircraft_name()
    }

    /// Names of this vehicle and its children
    pub fn enumerate_vehicles(&self) -> Vec<String> {
        std::iter::once(self.aircraft_name().to_string())
            .chain(self.children.iter().map(|c| c.exec().aircraft_name().to_string()))
            .collect()
    }

    pub fn children(&self) -> &[ChildVehicle] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&ChildVehicle> {
        self.children.get(index)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut ChildVehicle> {
        self.children.get_mut(index)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_child(&self) -> bool {
        self.is_child
    }

    pub fn sim_time(&self) -> f64 {
        self.ctx.sim_time()
    }

    pub fn set_sim_time(&mut self, t: f64) -> f64 {
        self.ctx.set_sim_time(t)
    }

    pub fn dt(&self) -> f64 {
        self.ctx.dt()
    }

    pub fn set_dt(&mut self, dt: f64) {
        self.ctx.set_dt(dt);
    }

    pub fn frame(&self) -> u64 {
        self.ctx.frame()
    }

    pub fn debug_level(&self) -> DebugLevel {
        self.ctx.debug()
    }

    pub fn set_debug_level(&mut self, level: DebugLevel) {
        self.ctx.set_debug(level);
    }

    pub fn terminate_requested(&self) -> bool {
        self.ctx.terminate_requested()
    }

    pub fn set_terminate(&self, terminate: bool) {
        self.ctx.set_terminate(terminate);
    }

    pub fn root_dir(&self) -> &Path {
        &self.ctx.paths.root_dir
    }

    /// Directory of the loaded vehicle
    pub fn full_aircraft_path(&self) -> &Path {
        &self.ctx.paths.full_aircraft
    }

    pub fn aircraft_path(&self) -> &Path {
        &self.ctx.paths.aircraft
    }

    pub fn engine_path(&self) -> PathBuf {
        self.ctx.paths.engine.clone()
    }

    pub fn systems_path(&self) -> PathBuf {
        self.ctx.paths.systems.clone()
    }
}

impl Drop for Executive {
    fn drop(&mut self) {
        if self.ctx.debug().instantiation() {
            trace!(id = self.id, "Destroyed executive");
        }
    }
}

fn read_file_header(header: &Element) {
    for (key, label) in [
        ("author", "Model author"),
        ("filecreationdate", "Creation date"),
        ("version", "File version"),
        ("description", "Description"),
    ] {
        if let Some(value) = header.find_value(key) {
            info!("  {label}: {value}");
        }
    }
    for reference in header.find_all("reference") {
        if let Some(title) = reference.attr("title") {
            info!("  Reference: {title}");
        }
    }
}
