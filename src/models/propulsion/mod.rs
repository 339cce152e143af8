//! Propulsion - engines, thrusters and tanks
//!
//! Each frame the tanks apply their external flows, every engine computes
//! thrust for its wired throttle position, and running engines draw their
//! fuel from their feed tanks. An engine whose feed tanks cannot supply the
//! fuel it needs is starved.

mod engine;
mod tank;

pub use engine::*;
pub use tank::*;

use nalgebra::{Matrix3, Vector3};
use tracing::{info, warn};

use super::{point_mass_inertia, settable, structural_to_body, Published};
use crate::config::Element;
use crate::error::ModelError;
use crate::model::{LoadContext, Model, ModelBase};
use crate::property::{PropertyManager, PropertyNode};
use crate::utils::constants::LB_TO_SLUG;

#[derive(Debug, Clone, Default)]
pub struct PropulsionInputs {
    pub pressure: f64,
    pub temperature: f64,
    pub density: f64,
    pub sound_speed: f64,
    pub qbar: f64,
    pub vt: f64,
    pub mach: f64,
    pub alpha: f64,
    pub beta: f64,
    pub tat_c: f64,
    pub altitude_asl: f64,
    pub altitude_agl: f64,
    pub aero_uvw: Vector3<f64>,
    pub pqr: Vector3<f64>,
    pub throttle_pos: Vec<f64>,
    pub mixture_pos: Vec<f64>,
    /// CG in structural inches
    pub cg: Vector3<f64>,
    /// Step covered by one propulsion frame
    pub total_delta_t: f64,
}

pub struct Propulsion {
    base: ModelBase,
    pub inputs: PropulsionInputs,

    engines: Vec<Engine>,
    tanks: Vec<Tank>,
    fuel_freeze: PropertyNode,

    // State
    forces: Vector3<f64>,
    moments: Vector3<f64>,

    published: Published<2>,
}

impl Propulsion {
    pub fn new(pm: &PropertyManager) -> Self {
        Self {
            base: ModelBase::new("propulsion"),
            inputs: PropulsionInputs::default(),
            engines: Vec::new(),
            tanks: Vec::new(),
            fuel_freeze: settable(pm, "propulsion/fuel_freeze", 0.0),
            forces: Vector3::zeros(),
            moments: Vector3::zeros(),
            published: Published::bind(
                pm,
                ["propulsion/total-fuel-lbs", "forces/fbx-prop-lbs"],
            ),
        }
    }

    pub fn num_engines(&self) -> usize {
        self.engines.len()
    }

    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    pub fn engine(&self, index: usize) -> Option<&Engine> {
        self.engines.get(index)
    }

    pub fn engine_mut(&mut self, index: usize) -> Option<&mut Engine> {
        self.engines.get_mut(index)
    }

    pub fn tanks(&self) -> &[Tank] {
        &self.tanks
    }

    pub fn tank_mut(&mut self, index: usize) -> Option<&mut Tank> {
        self.tanks.get_mut(index)
    }

    /// Body forces, lbs
    pub fn forces(&self) -> Vector3<f64> {
        self.forces
    }

    /// Moments about the CG, ft*lbs
    pub fn moments(&self) -> Vector3<f64> {
        self.moments
    }

    /// Start engine `index` running, or every engine with `-1`
    pub fn init_running(&mut self, index: i32) -> Result<(), ModelError> {
        if index < 0 {
            self.engines.iter_mut().for_each(Engine::init_running);
            return Ok(());
        }
        match self.engines.get_mut(index as usize) {
            Some(engine) => {
                engine.init_running();
                Ok(())
            }
            None => Err(ModelError::InvalidValue {
                element: "engine".into(),
                value: format!("{index} (only {} engines)", self.engines.len()),
            }),
        }
    }

    pub fn tanks_weight(&self) -> f64 {
        self.tanks.iter().map(Tank::contents).sum()
    }

    /// First moment of the tank contents, lbs*in
    pub fn tanks_moment(&self) -> Vector3<f64> {
        self.tanks.iter().map(|t| t.xyz() * t.contents()).sum()
    }

    /// Inertia of the tank contents about `cg` (structural inches)
    pub fn tanks_inertia(&self, cg: &Vector3<f64>) -> Matrix3<f64> {
        self.tanks
            .iter()
            .map(|t| {
                let arm = structural_to_body(&t.xyz(), cg);
                Matrix3::from_diagonal(&t.inertias())
                    + point_mass_inertia(t.contents() * LB_TO_SLUG, &arm)
            })
            .sum()
    }

    /// Human-readable fuel state
    pub fn tank_report(&self) -> String {
        let mut report = String::from("  Fuel tank state:\n");
        for t in &self.tanks {
            let xyz = t.xyz();
            report.push_str(&format!(
                "    Tank {} ({:?}): {:.2} lbs ({:.1}% full) at [{:.2}, {:.2}, {:.2}] in, priority {}\n",
                t.index(),
                t.tank_type(),
                t.contents(),
                t.pct_full(),
                xyz.x,
                xyz.y,
                xyz.z,
                t.priority()
            ));
        }
        report
    }

    /// Draw `needed` lbs equally from the selected feed tanks that hold fuel
    ///
    /// Returns `false` when the tanks could not supply it or none of them
    /// holds any fuel.
    fn consume_fuel(tanks: &mut [Tank], feeds: &[usize], needed: f64) -> bool {
        let available: Vec<usize> = feeds
            .iter()
            .copied()
            .filter(|&i| tanks.get(i).is_some_and(|t| t.is_selected() && t.contents() > 0.0))
            .collect();
        if available.is_empty() {
            return false;
        }
        let share = needed / available.len() as f64;
        let mut supplied = true;
        for i in available {
            if tanks[i].drain(share) < 0.0 {
                supplied = false;
            }
        }
        supplied
    }
}

impl Model for Propulsion {
    fn base(&self) -> &ModelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        &mut self.base
    }

    fn init_model(&mut self) -> Result<(), ModelError> {
        self.base.init();
        self.forces = Vector3::zeros();
        self.moments = Vector3::zeros();
        self.engines.iter_mut().for_each(Engine::reset_to_ic);
        self.tanks.iter_mut().for_each(Tank::reset_to_ic);
        Ok(())
    }

    fn run(&mut self, holding: bool) -> bool {
        if self.base.run_gate() {
            return true;
        }
        if holding {
            return false;
        }

        let dt = self.inputs.total_delta_t;
        for tank in &mut self.tanks {
            tank.calculate(dt, self.inputs.tat_c);
        }

        let freeze = self.fuel_freeze.get_bool();
        self.forces = Vector3::zeros();
        self.moments = Vector3::zeros();
        for (i, engine) in self.engines.iter_mut().enumerate() {
            engine.sync_from_properties();
            let throttle = self.inputs.throttle_pos.get(i).copied().unwrap_or(0.0);
            engine.calculate(throttle);

            if engine.running() && !freeze {
                let needed = engine.calc_fuel_need(dt);
                let fed = Self::consume_fuel(&mut self.tanks, engine.source_tanks(), needed);
                engine.set_starved(!fed);
            }

            let force = engine.thruster().body_force();
            let arm = structural_to_body(&engine.thruster().location, &self.inputs.cg);
            self.forces += force;
            self.moments += arm.cross(&force);
        }

        self.published.publish([self.tanks_weight(), self.forces.x]);
        false
    }

    fn load(&mut self, el: &Element, ctx: &LoadContext<'_>) -> Result<(), ModelError> {
        for (i, tank_el) in el.find_all("tank").enumerate() {
            let tank = Tank::load(tank_el, self.tanks.len() + i, ctx.pm)?;
            if ctx.debug.startup() {
                tank.echo();
            }
            self.tanks.push(tank);
        }

        let first = self.engines.len();
        for (i, engine_el) in el.find_all("engine").enumerate() {
            let engine = Engine::load(engine_el, first + i, ctx)?;
            for &feed in engine.source_tanks() {
                if feed >= self.tanks.len() {
                    warn!(engine = engine.index(), tank = feed, "Engine feeds from a tank that does not exist");
                }
            }
            self.engines.push(engine);
        }

        if ctx.debug.startup() {
            info!(
                "    Propulsion: {} engine(s), {} tank(s)",
                self.engines.len(),
                self.tanks.len()
            );
        }
        Ok(())
    }
}
