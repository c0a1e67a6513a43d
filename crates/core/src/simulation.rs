//! The `Simulation` trait the engine loop drives, and the read-only `Scene`
//! view renderers consume.
//!
//! The trait is object-safe so hosts can hold a `Box<dyn Simulation>` and
//! swap implementations at runtime.

use crate::config::SimConfig;
use crate::entity::Entity;
use crate::error::EngineError;
use crate::field_source::FieldSource;
use crate::grid::WarpGrid;
use crate::world::{TickReport, World};
use glam::DVec2;
use serde_json::Value;

/// Borrowed snapshot of everything a renderer may look at.
///
/// Holding a `Scene` keeps the simulation immutably borrowed, so nothing
/// can tick while a frame is being drawn.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub entities: &'a [Entity],
    pub sources: &'a [FieldSource],
    pub grid: &'a WarpGrid,
    pub tick: u64,
    pub time: f64,
    pub bounds: DVec2,
    pub pointer: Option<DVec2>,
    /// Motes closer than this are linked.
    pub connection_distance: f64,
    /// Only this many motes are considered for links.
    pub connection_cap: usize,
}

/// A step-based simulation that exposes a renderable scene.
pub trait Simulation {
    /// Advance by one tick.
    fn step(&mut self) -> Result<TickReport, EngineError>;

    /// Read-only view of the current state.
    fn scene(&self) -> Scene<'_>;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Schema describing all available parameters, their types, ranges and defaults.
    fn param_schema(&self) -> Value;
}

impl<S: Simulation + ?Sized> Simulation for Box<S> {
    fn step(&mut self) -> Result<TickReport, EngineError> {
        (**self).step()
    }

    fn scene(&self) -> Scene<'_> {
        (**self).scene()
    }

    fn params(&self) -> Value {
        (**self).params()
    }

    fn param_schema(&self) -> Value {
        (**self).param_schema()
    }
}

impl Simulation for World {
    fn step(&mut self) -> Result<TickReport, EngineError> {
        Ok(World::step(self))
    }

    fn scene(&self) -> Scene<'_> {
        let config = self.config();
        Scene {
            entities: self.entities(),
            sources: self.sources(),
            grid: self.grid(),
            tick: self.tick(),
            time: self.time(),
            bounds: self.bounds(),
            pointer: self.pointer(),
            connection_distance: config.connection_distance,
            connection_cap: config.connection_cap,
        }
    }

    fn params(&self) -> Value {
        self.config().params()
    }

    fn param_schema(&self) -> Value {
        SimConfig::param_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::entity::SpawnKind;

    fn world() -> World {
        World::new(SimConfig::quiet(200.0, 100.0)).unwrap()
    }

    #[test]
    fn simulation_trait_is_object_safe() {
        let sim: Box<dyn Simulation> = Box::new(world());
        assert_eq!(sim.scene().bounds, DVec2::new(200.0, 100.0));
        assert_eq!(sim.scene().tick, 0);
    }

    #[test]
    fn dyn_step_advances_the_world() {
        let mut w = world();
        w.enqueue(Command::SpawnBurst {
            origin: DVec2::new(10.0, 10.0),
            count: 3,
            kind: SpawnKind::Energy,
            life: None,
        });
        let sim: &mut dyn Simulation = &mut w;
        let report = sim.step().unwrap();
        assert_eq!(report.tick, 1);
        assert_eq!(sim.scene().entities.len(), 3);
    }

    #[test]
    fn params_match_schema_keys() {
        let w = world();
        let sim: &dyn Simulation = &w;
        let params = sim.params();
        let schema = sim.param_schema();
        for key in params.as_object().unwrap().keys() {
            assert!(schema.get(key).is_some(), "schema missing {key}");
        }
        assert_eq!(params["width"], 200.0);
    }

    #[test]
    fn scene_carries_link_settings() {
        let w = world();
        let scene = w.scene();
        assert_eq!(scene.connection_cap, 150);
        assert_eq!(scene.connection_distance, 100.0);
    }
}
