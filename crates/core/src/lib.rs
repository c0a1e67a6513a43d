#![deny(unsafe_code)]
//! Core of the warpfield particle/field simulation.
//!
//! Provides the `World` (entities, field sources, warp grid, command queue),
//! the `Simulation` trait and `EngineLoop` that drive it, the backend-neutral
//! `Renderer`/`Surface` draw-command contract, reproducible `Scenario`s, the
//! `Xorshift64` PRNG, `Srgb` colors and parameter helpers.

pub mod color;
pub mod command;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod field_source;
pub mod grid;
pub mod lifetime;
pub mod params;
pub mod prng;
pub mod render;
pub mod scenario;
pub mod simulation;
pub mod world;

pub use color::{Rgba, Srgb};
pub use command::{Command, CommandSender};
pub use config::{AmbientConfig, SimConfig};
pub use engine::{EngineLoop, LoopState};
pub use entity::{Entity, EntityKind, SpawnKind};
pub use error::EngineError;
pub use field_source::{FieldSource, Influence, SourceKind, SourceParams, SourceTag};
pub use grid::WarpGrid;
pub use lifetime::Lifetime;
pub use prng::Xorshift64;
pub use render::{
    BlendMode, DrawCommand, Layer, Paint, RecordingSurface, RenderStyle, Renderer, Shape, Surface,
};
pub use scenario::{Playback, RunSummary, Scenario, ScheduledCommand, MAX_TICKS};
pub use simulation::{Scene, Simulation};
pub use world::{TickReport, World, TICK_SECONDS};
