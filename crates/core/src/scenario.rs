//! Reproducible scripted runs.
//!
//! A [`Scenario`] captures everything needed to replay a run: the world
//! config (including the PRNG seed), the number of ticks, and a script of
//! commands keyed by the tick before which they are enqueued. Two plays of
//! the same scenario produce bit-identical worlds.

use crate::command::Command;
use crate::config::SimConfig;
use crate::engine::EngineLoop;
use crate::error::EngineError;
use crate::render::{Renderer, Surface};
use crate::world::{TickReport, World};
use serde::{Deserialize, Serialize};

/// Longest accepted run, in ticks.
pub const MAX_TICKS: u64 = 1_000_000;

/// A command enqueued when the world has completed `tick` ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCommand {
    pub tick: u64,
    pub command: Command,
}

/// Named, scripted, seeded run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub config: SimConfig,
    pub ticks: u64,
    #[serde(default)]
    pub script: Vec<ScheduledCommand>,
}

/// Aggregate numbers of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub total_spawned: usize,
    pub total_expired: usize,
    pub peak_entities: usize,
    pub final_entities: usize,
    pub final_sources: usize,
    pub dropped_commands: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[TickReport]) -> Self {
        let last = reports.last().cloned().unwrap_or_default();
        Self {
            ticks: last.tick,
            total_spawned: reports.iter().map(|r| r.spawned).sum(),
            total_expired: reports.iter().map(|r| r.expired).sum(),
            peak_entities: reports.iter().map(|r| r.entities).max().unwrap_or(0),
            final_entities: last.entities,
            final_sources: last.sources,
            dropped_commands: reports.iter().map(|r| r.dropped_commands).sum(),
        }
    }
}

/// The world after a run plus one report per tick.
pub struct Playback {
    pub world: World,
    pub reports: Vec<TickReport>,
}

impl Playback {
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_reports(&self.reports)
    }
}

impl Scenario {
    /// A scenario with an empty script.
    pub fn new(name: &str, config: SimConfig, ticks: u64) -> Self {
        Self {
            name: name.to_string(),
            config,
            ticks,
            script: Vec::new(),
        }
    }

    /// Appends `command` to run before tick `tick + 1`.
    pub fn at(mut self, tick: u64, command: Command) -> Self {
        self.script.push(ScheduledCommand { tick, command });
        self
    }

    /// Shortens (or extends) the run to `ticks`, dropping commands that would
    /// no longer fire.
    pub fn truncate(&mut self, ticks: u64) {
        self.ticks = ticks;
        self.script.retain(|e| e.tick < ticks);
    }

    /// Checks the config, the tick count and every scripted command.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.config.validate()?;
        if self.ticks == 0 || self.ticks > MAX_TICKS {
            return Err(EngineError::InvalidScenario(format!(
                "{}: ticks must be in 1..={MAX_TICKS}, got {}",
                self.name, self.ticks
            )));
        }
        for (i, entry) in self.script.iter().enumerate() {
            if entry.tick >= self.ticks {
                return Err(EngineError::InvalidScenario(format!(
                    "{}: command {i} ({}) scheduled at tick {} but the run ends at {}",
                    self.name,
                    entry.command.name(),
                    entry.tick,
                    self.ticks
                )));
            }
            entry.command.validate().map_err(|e| {
                EngineError::InvalidScenario(format!("{}: command {i}: {e}", self.name))
            })?;
        }
        Ok(())
    }

    /// Script entries in execution order; ties keep file order.
    fn schedule(&self) -> Vec<&ScheduledCommand> {
        let mut entries: Vec<_> = self.script.iter().collect();
        entries.sort_by_key(|e| e.tick);
        entries
    }

    /// Runs headless, without rendering.
    pub fn simulate(&self) -> Result<Playback, EngineError> {
        self.validate()?;
        let mut world = World::new(self.config.clone())?;
        let schedule = self.schedule();
        let mut next = schedule.iter().peekable();
        let mut reports = Vec::new();

        for tick in 0..self.ticks {
            while let Some(entry) = next.next_if(|e| e.tick == tick) {
                world.enqueue(entry.command.clone());
            }
            reports.push(world.step());
        }
        tracing::info!(scenario = %self.name, ticks = self.ticks, "scenario simulated");
        Ok(Playback { world, reports })
    }

    /// Runs through an engine loop, rendering every frame onto `surface`.
    pub fn play(
        &self,
        surface: &mut dyn Surface,
        renderer: &Renderer,
    ) -> Result<Playback, EngineError> {
        self.validate()?;
        let mut engine = EngineLoop::new(World::new(self.config.clone())?);
        let schedule = self.schedule();
        let mut next = schedule.iter().peekable();
        let mut reports = Vec::new();

        engine.start();
        for tick in 0..self.ticks {
            while let Some(entry) = next.next_if(|e| e.tick == tick) {
                engine.simulation().enqueue(entry.command.clone());
            }
            match engine.frame(surface, renderer)? {
                Some(report) => reports.push(report),
                None => break,
            }
        }
        engine.stop();
        tracing::info!(scenario = %self.name, frames = engine.frames(), "scenario played");
        Ok(Playback {
            world: engine.into_simulation(),
            reports,
        })
    }
}
