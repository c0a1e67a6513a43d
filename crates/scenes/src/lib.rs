#![deny(unsafe_code)]
//! Preset registry: maps preset names to scripted [`Scenario`]s, plus a CPU
//! raster surface and PNG snapshots.
//!
//! This crate sits between `warpfield-core` (which defines the world, the
//! renderer contract and scenarios) and hosts such as the CLI, so preset
//! dispatch lives in one place.

pub mod raster;

#[cfg(feature = "png")]
pub mod snapshot;

use glam::DVec2;
use warpfield_core::command::Command;
use warpfield_core::config::SimConfig;
use warpfield_core::entity::SpawnKind;
use warpfield_core::error::EngineError;
use warpfield_core::field_source::{SourceParams, SourceTag};
use warpfield_core::scenario::Scenario;

pub use raster::Raster;

/// Default run length of every preset, in ticks.
pub const DEFAULT_TICKS: u64 = 300;

/// Tick at which presets fire their trigger.
const TRIGGER_TICK: u64 = 10;

/// Ticks between the bolts of a lightning volley.
const VOLLEY_GAP: u64 = 12;

/// All available preset names.
const PRESET_NAMES: &[&str] = &["ambient", "explosion", "travel", "calibrate", "storm"];

/// Named demo scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Ambient population only.
    Ambient,
    /// A click burst: sparks, shockwaves and a short warp ripple.
    Explosion,
    /// The composite travel trigger.
    Travel,
    /// Travel, then calibration with a lightning volley.
    Calibrate,
    /// A dense mote cloud around an intense vortex, with lightning.
    Storm,
}

impl Preset {
    /// Looks up a preset by name.
    ///
    /// Returns `EngineError::UnknownPreset` if the name is not recognized.
    pub fn parse(name: &str) -> Result<Self, EngineError> {
        match name {
            "ambient" => Ok(Preset::Ambient),
            "explosion" => Ok(Preset::Explosion),
            "travel" => Ok(Preset::Travel),
            "calibrate" => Ok(Preset::Calibrate),
            "storm" => Ok(Preset::Storm),
            _ => Err(EngineError::UnknownPreset(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Ambient => "ambient",
            Preset::Explosion => "explosion",
            Preset::Travel => "travel",
            Preset::Calibrate => "calibrate",
            Preset::Storm => "storm",
        }
    }

    /// Builds the scripted scenario for this preset on a world of `config`.
    ///
    /// Triggers fire at the center of the world.
    pub fn scenario(self, config: SimConfig) -> Scenario {
        let center = DVec2::new(config.width, config.height) * 0.5;
        let width = config.width;
        let scenario = Scenario::new(self.name(), config, DEFAULT_TICKS);
        match self {
            Preset::Ambient => scenario,
            Preset::Explosion => explosion(scenario, center),
            Preset::Travel => scenario.at(TRIGGER_TICK, Command::Travel { origin: center }),
            Preset::Calibrate => {
                let s = scenario.at(TRIGGER_TICK, Command::Travel { origin: center });
                lightning_volley(s.at(150, Command::Calibrate), 150, width)
            }
            Preset::Storm => {
                let s = scenario
                    .at(
                        TRIGGER_TICK,
                        Command::SpawnFieldSource {
                            origin: center,
                            params: SourceParams::new(SourceTag::IntenseWarp).with_radius(200.0),
                        },
                    )
                    .at(
                        TRIGGER_TICK,
                        burst(center, 100, SpawnKind::Mote),
                    );
                lightning_volley(s, 60, width)
            }
        }
    }
}

/// Constructs a preset scenario by name.
pub fn from_name(name: &str, config: SimConfig) -> Result<Scenario, EngineError> {
    Ok(Preset::parse(name)?.scenario(config))
}

/// Returns a slice of all recognized preset names.
pub fn list_presets() -> &'static [&'static str] {
    PRESET_NAMES
}

fn burst(origin: DVec2, count: i64, kind: SpawnKind) -> Command {
    Command::SpawnBurst {
        origin,
        count,
        kind,
        life: None,
    }
}

fn explosion(scenario: Scenario, at: DVec2) -> Scenario {
    scenario
        .at(TRIGGER_TICK, burst(at, 25, SpawnKind::Spark))
        .at(TRIGGER_TICK, burst(at, 8, SpawnKind::Shockwave))
        .at(
            TRIGGER_TICK,
            Command::SpawnFieldSource {
                origin: at,
                params: SourceParams::new(SourceTag::WarpField)
                    .with_radius(60.0)
                    .with_life(60),
            },
        )
}

/// Three bolts across the top of the world, `VOLLEY_GAP` ticks apart.
fn lightning_volley(scenario: Scenario, start: u64, width: f64) -> Scenario {
    (0..3u64).fold(scenario, |s, i| {
        let x = width * (0.25 + 0.25 * i as f64);
        s.at(
            start + i * VOLLEY_GAP,
            burst(DVec2::new(x, 0.0), 1, SpawnKind::Lightning),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpfield_core::render::{RecordingSurface, Renderer};

    fn small() -> SimConfig {
        let mut config = SimConfig::default();
        config.width = 320.0;
        config.height = 240.0;
        config
    }

    #[test]
    fn every_listed_preset_builds_a_valid_scenario() {
        for name in list_presets() {
            let scenario = from_name(name, small()).unwrap();
            assert_eq!(scenario.name, *name);
            scenario.validate().unwrap();
        }
    }

    #[test]
    fn from_name_unknown_returns_error() {
        let result = from_name("wormhole-party", small());
        assert!(matches!(result, Err(EngineError::UnknownPreset(_))));
    }

    #[test]
    fn preset_names_round_trip() {
        for name in list_presets() {
            assert_eq!(Preset::parse(name).unwrap().name(), *name);
        }
    }

    #[test]
    fn ambient_has_no_script() {
        assert!(from_name("ambient", small()).unwrap().script.is_empty());
    }

    #[test]
    fn explosion_matches_click_burst() {
        let scenario = from_name("explosion", small()).unwrap();
        let count = |kind: SpawnKind| {
            scenario
                .script
                .iter()
                .filter_map(|e| match e.command {
                    Command::SpawnBurst { kind: k, count, .. } if k == kind => Some(count),
                    _ => None,
                })
                .sum::<i64>()
        };
        assert_eq!(count(SpawnKind::Spark), 25);
        assert_eq!(count(SpawnKind::Shockwave), 8);
        assert!(scenario
            .script
            .iter()
            .any(|e| matches!(e.command, Command::SpawnFieldSource { .. })));
    }

    #[test]
    fn calibrate_fires_after_travel() {
        let scenario = from_name("calibrate", small()).unwrap();
        let tick_of = |pred: fn(&Command) -> bool| {
            scenario.script.iter().find(|e| pred(&e.command)).map(|e| e.tick)
        };
        let travel = tick_of(|c| matches!(c, Command::Travel { .. })).unwrap();
        let calibrate = tick_of(|c| matches!(c, Command::Calibrate)).unwrap();
        assert!(travel < calibrate);
    }

    #[test]
    fn triggers_are_centered() {
        let scenario = from_name("travel", small()).unwrap();
        assert_eq!(
            scenario.script[0].command,
            Command::Travel {
                origin: DVec2::new(160.0, 120.0)
            }
        );
    }

    #[test]
    fn presets_are_deterministic() {
        let mut config = small();
        config.ambient.motes = 10;
        config.ambient.energy = 5;
        let mut a = from_name("storm", config.clone()).unwrap();
        let mut b = from_name("storm", config).unwrap();
        a.truncate(80);
        b.truncate(80);
        let pa = a.simulate().unwrap();
        let pb = b.simulate().unwrap();
        assert_eq!(pa.reports, pb.reports);
        assert_eq!(pa.world.entities(), pb.world.entities());
    }

    #[test]
    fn travel_plays_onto_a_surface() {
        let mut scenario = from_name("travel", small()).unwrap();
        scenario.truncate(30);
        let mut surface = RecordingSurface::new();
        let playback = scenario.play(&mut surface, &Renderer::default()).unwrap();
        assert_eq!(surface.frames(), 30);
        assert!(playback.world.sources().len() >= 10);
    }
}
