//! Simulation configuration.
//!
//! [`SimConfig`] bundles every tunable constant of a world. It round-trips
//! through JSON (missing keys fall back to defaults) and describes itself via
//! [`SimConfig::param_schema`] the same way the engine params do.

use crate::error::EngineError;
use crate::params::{param_f64, param_u32, param_u64, param_usize};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Largest accepted world width or height.
pub const MAX_DIMENSION: f64 = 16_384.0;

const DEFAULT_WIDTH: f64 = 960.0;
const DEFAULT_HEIGHT: f64 = 540.0;
const DEFAULT_SEED: u64 = 42;
/// Maximum number of entities created in a single tick.
const DEFAULT_SPAWN_CAP: usize = 50;
/// Queued spawn requests beyond this are dropped.
const DEFAULT_MAX_PENDING_SPAWNS: usize = 10_000;
/// Scale from field influence (a displacement) to per-tick velocity change.
const DEFAULT_FIELD_COUPLING: f64 = 0.01;
const DEFAULT_GRAVITY_CLAMP: f64 = 50.0;
const DEFAULT_POINTER_RADIUS: f64 = 100.0;
const DEFAULT_POINTER_FORCE: f64 = 0.002;
const DEFAULT_CONNECTION_DISTANCE: f64 = 100.0;
const DEFAULT_CONNECTION_CAP: usize = 150;
const DEFAULT_SPONTANEOUS_WARP_CHANCE: f64 = 0.005;
const DEFAULT_GRID_SPACING: f64 = 50.0;
const DEFAULT_AMBIENT_LIFE: u32 = 900;
/// Peak velocity change per tick from the background flow.
const DEFAULT_DRIFT_STRENGTH: f64 = 0.02;
/// Spatial frequency of the background flow.
const DEFAULT_DRIFT_SCALE: f64 = 0.004;

/// Target population of ambient (spontaneously replenished) entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub motes: usize,
    pub energy: usize,
    pub fragments: usize,
    /// Lifetime in ticks given to each ambient entity.
    pub life: u32,
}

impl AmbientConfig {
    /// No ambient population at all.
    pub fn none() -> Self {
        Self {
            motes: 0,
            energy: 0,
            fragments: 0,
            life: DEFAULT_AMBIENT_LIFE,
        }
    }

    pub fn total(&self) -> usize {
        self.motes + self.energy + self.fragments
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            motes: 60,
            energy: 30,
            fragments: 8,
            life: DEFAULT_AMBIENT_LIFE,
        }
    }
}

/// All tunables of a simulation world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: f64,
    pub height: f64,
    pub seed: u64,
    pub spawn_cap: usize,
    pub max_pending_spawns: usize,
    pub field_coupling: f64,
    pub gravity_clamp: f64,
    pub pointer_radius: f64,
    pub pointer_force: f64,
    pub connection_distance: f64,
    pub connection_cap: usize,
    pub spontaneous_warp_chance: f64,
    pub grid_spacing: f64,
    pub drift_strength: f64,
    pub drift_scale: f64,
    pub ambient: AmbientConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            seed: DEFAULT_SEED,
            spawn_cap: DEFAULT_SPAWN_CAP,
            max_pending_spawns: DEFAULT_MAX_PENDING_SPAWNS,
            field_coupling: DEFAULT_FIELD_COUPLING,
            gravity_clamp: DEFAULT_GRAVITY_CLAMP,
            pointer_radius: DEFAULT_POINTER_RADIUS,
            pointer_force: DEFAULT_POINTER_FORCE,
            connection_distance: DEFAULT_CONNECTION_DISTANCE,
            connection_cap: DEFAULT_CONNECTION_CAP,
            spontaneous_warp_chance: DEFAULT_SPONTANEOUS_WARP_CHANCE,
            grid_spacing: DEFAULT_GRID_SPACING,
            drift_strength: DEFAULT_DRIFT_STRENGTH,
            drift_scale: DEFAULT_DRIFT_SCALE,
            ambient: AmbientConfig::default(),
        }
    }
}

impl SimConfig {
    /// A config with no ambient population and no spontaneous sources, so
    /// only explicit commands create anything. Used by tests and replays
    /// that need exact counts.
    pub fn quiet(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            spontaneous_warp_chance: 0.0,
            drift_strength: 0.0,
            ambient: AmbientConfig::none(),
            ..Self::default()
        }
    }

    /// Builds a config from a flat JSON params object, falling back to
    /// defaults for missing or mistyped keys. Ambient targets are read from
    /// `ambient_motes`, `ambient_energy`, `ambient_fragments`, `ambient_life`.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            width: param_f64(params, "width", d.width),
            height: param_f64(params, "height", d.height),
            seed: param_u64(params, "seed", d.seed),
            spawn_cap: param_usize(params, "spawn_cap", d.spawn_cap),
            max_pending_spawns: param_usize(params, "max_pending_spawns", d.max_pending_spawns),
            field_coupling: param_f64(params, "field_coupling", d.field_coupling),
            gravity_clamp: param_f64(params, "gravity_clamp", d.gravity_clamp),
            pointer_radius: param_f64(params, "pointer_radius", d.pointer_radius),
            pointer_force: param_f64(params, "pointer_force", d.pointer_force),
            connection_distance: param_f64(params, "connection_distance", d.connection_distance),
            connection_cap: param_usize(params, "connection_cap", d.connection_cap),
            spontaneous_warp_chance: param_f64(
                params,
                "spontaneous_warp_chance",
                d.spontaneous_warp_chance,
            ),
            grid_spacing: param_f64(params, "grid_spacing", d.grid_spacing),
            drift_strength: param_f64(params, "drift_strength", d.drift_strength),
            drift_scale: param_f64(params, "drift_scale", d.drift_scale),
            ambient: AmbientConfig {
                motes: param_usize(params, "ambient_motes", d.ambient.motes),
                energy: param_usize(params, "ambient_energy", d.ambient.energy),
                fragments: param_usize(params, "ambient_fragments", d.ambient.fragments),
                life: param_u32(params, "ambient_life", d.ambient.life),
            },
        }
    }

    /// Current values as a flat JSON object, the inverse of [`SimConfig::from_json`].
    pub fn params(&self) -> Value {
        json!({
            "width": self.width,
            "height": self.height,
            "seed": self.seed,
            "spawn_cap": self.spawn_cap,
            "max_pending_spawns": self.max_pending_spawns,
            "field_coupling": self.field_coupling,
            "gravity_clamp": self.gravity_clamp,
            "pointer_radius": self.pointer_radius,
            "pointer_force": self.pointer_force,
            "connection_distance": self.connection_distance,
            "connection_cap": self.connection_cap,
            "spontaneous_warp_chance": self.spontaneous_warp_chance,
            "grid_spacing": self.grid_spacing,
            "drift_strength": self.drift_strength,
            "drift_scale": self.drift_scale,
            "ambient_motes": self.ambient.motes,
            "ambient_energy": self.ambient.energy,
            "ambient_fragments": self.ambient.fragments,
            "ambient_life": self.ambient.life,
        })
    }

    /// Schema describing every parameter, its type, range and default.
    pub fn param_schema() -> Value {
        json!({
            "width": {"type": "number", "default": DEFAULT_WIDTH, "min": 1.0,
                "description": "World width in surface units"},
            "height": {"type": "number", "default": DEFAULT_HEIGHT, "min": 1.0,
                "description": "World height in surface units"},
            "seed": {"type": "integer", "default": DEFAULT_SEED,
                "description": "PRNG seed; same seed and commands replay identically"},
            "spawn_cap": {"type": "integer", "default": DEFAULT_SPAWN_CAP, "min": 1,
                "description": "Maximum entities created per tick"},
            "max_pending_spawns": {"type": "integer", "default": DEFAULT_MAX_PENDING_SPAWNS,
                "description": "Queued spawns beyond this are dropped"},
            "field_coupling": {"type": "number", "default": DEFAULT_FIELD_COUPLING,
                "min": 0.0, "max": 1.0,
                "description": "Scale from field influence to velocity change"},
            "gravity_clamp": {"type": "number", "default": DEFAULT_GRAVITY_CLAMP, "min": 0.0,
                "description": "Maximum influence magnitude of any field source"},
            "pointer_radius": {"type": "number", "default": DEFAULT_POINTER_RADIUS, "min": 0.0,
                "description": "Radius of pointer attraction"},
            "pointer_force": {"type": "number", "default": DEFAULT_POINTER_FORCE, "min": 0.0,
                "description": "Pointer attraction strength"},
            "connection_distance": {"type": "number", "default": DEFAULT_CONNECTION_DISTANCE,
                "min": 0.0, "description": "Cutoff distance for mote links"},
            "connection_cap": {"type": "integer", "default": DEFAULT_CONNECTION_CAP,
                "description": "Maximum motes considered for pairwise links"},
            "spontaneous_warp_chance": {"type": "number",
                "default": DEFAULT_SPONTANEOUS_WARP_CHANCE, "min": 0.0, "max": 1.0,
                "description": "Per-tick probability of a spontaneous warp field"},
            "grid_spacing": {"type": "number", "default": DEFAULT_GRID_SPACING, "min": 1.0,
                "description": "Spacing of the background warp grid"},
            "drift_strength": {"type": "number", "default": DEFAULT_DRIFT_STRENGTH, "min": 0.0,
                "description": "Peak velocity change from the background Perlin flow"},
            "drift_scale": {"type": "number", "default": DEFAULT_DRIFT_SCALE, "min": 0.0,
                "description": "Spatial frequency of the background flow"},
            "ambient_motes": {"type": "integer", "default": 60,
                "description": "Ambient mote population target"},
            "ambient_energy": {"type": "integer", "default": 30,
                "description": "Ambient energy particle population target"},
            "ambient_fragments": {"type": "integer", "default": 8,
                "description": "Ambient fragment population target"},
            "ambient_life": {"type": "integer", "default": DEFAULT_AMBIENT_LIFE,
                "description": "Lifetime of ambient entities in ticks"}
        })
    }

    /// Checks dimensions and ranges.
    pub fn validate(&self) -> Result<(), EngineError> {
        let dims_ok = |v: f64| v.is_finite() && v > 0.0;
        if !dimension_ok(self.width) || !dimension_ok(self.height) {
            return Err(EngineError::InvalidDimensions);
        }
        if self.spawn_cap == 0 {
            return Err(EngineError::InvalidConfig("spawn_cap must be > 0".into()));
        }
        if !dims_ok(self.grid_spacing) {
            return Err(EngineError::InvalidConfig(format!(
                "grid_spacing must be finite and > 0, got {}",
                self.grid_spacing
            )));
        }
        let non_negative = [
            ("field_coupling", self.field_coupling),
            ("gravity_clamp", self.gravity_clamp),
            ("pointer_radius", self.pointer_radius),
            ("pointer_force", self.pointer_force),
            ("connection_distance", self.connection_distance),
            ("drift_strength", self.drift_strength),
            ("drift_scale", self.drift_scale),
        ];
        if let Some((name, v)) = non_negative
            .iter()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
        {
            return Err(EngineError::InvalidConfig(format!(
                "{name} must be finite and >= 0, got {v}"
            )));
        }
        if !(0.0..=1.0).contains(&self.spontaneous_warp_chance) {
            return Err(EngineError::InvalidConfig(format!(
                "spontaneous_warp_chance must be in [0, 1], got {}",
                self.spontaneous_warp_chance
            )));
        }
        if self.ambient.life == 0 && self.ambient.total() > 0 {
            return Err(EngineError::InvalidConfig(
                "ambient life must be > 0 when an ambient population is set".into(),
            ));
        }
        Ok(())
    }
}

/// Finite, positive and at most [`MAX_DIMENSION`].
pub fn dimension_ok(v: f64) -> bool {
    v.is_finite() && v > 0.0 && v <= MAX_DIMENSION
}
