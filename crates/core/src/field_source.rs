//! Field sources: positioned emitters of 2D influence vectors.
//!
//! A [`FieldSource`] answers "what displacement does this source impose at
//! point P" through the [`Influence`] trait. Sources come in three kinds
//! (gravity well, warp field, wormhole), each with its own falloff and
//! lifecycle. Total influence at a point is the vector sum over sources,
//! which is exactly what the blanket slice impl computes.
//!
//! Every output is clamped to the source's `max_force`, so no query point,
//! however close to a source center, yields an unbounded vector.

use crate::entity::SpawnKind;
use crate::error::EngineError;
use crate::lifetime::Lifetime;
use crate::prng::Xorshift64;
use glam::DVec2;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// A pure function from query point to displacement vector.
///
/// Implementations must not mutate anything when sampled and must return a
/// finite vector for every finite input.
pub trait Influence: Send + Sync {
    fn influence_at(&self, point: DVec2) -> DVec2;
}

impl<T: Influence> Influence for [T] {
    fn influence_at(&self, point: DVec2) -> DVec2 {
        self.iter()
            .fold(DVec2::ZERO, |acc, source| acc + source.influence_at(point))
    }
}

impl<T: Influence + ?Sized> Influence for Box<T> {
    fn influence_at(&self, point: DVec2) -> DVec2 {
        (**self).influence_at(point)
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Distances below this are treated as zero.
const SINGULARITY_EPS: f64 = 1e-10;

/// Below this fraction of its base strength a source is invisible.
const VISIBILITY_THRESHOLD: f64 = 0.01;

/// Warp fields thinner than this are gone.
const MIN_WARP_RADIUS: f64 = 1.0;

/// A closing wormhole narrower than this is gone.
const MIN_WORMHOLE_RADIUS: f64 = 5.0;

const COLLAPSE_STRENGTH_DECAY: f64 = 0.9;
const COLLAPSE_RADIUS_DECAY: f64 = 0.95;

const WELL_SPIN: f64 = 0.01;
const WARP_SPIN: f64 = 0.02;
const WORMHOLE_SPIN: f64 = 0.02;

/// Warp magnitude multiplier applied on top of strength and falloff.
const WARP_GAIN: f64 = 10.0;
const WARP_ARMS: u32 = 6;

const WORMHOLE_OPEN_RATE: f64 = 2.0;
const WORMHOLE_CLOSE_RATE: f64 = 0.95;
/// Fraction of life spent opening (at the start) and closing (at the end).
const WORMHOLE_PHASE: f64 = 0.3;
/// An open wormhole sheds one rift mote every this many ticks.
const WORMHOLE_EMIT_PERIOD: u64 = 8;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle state of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    Active,
    /// Shrinking toward removal after a collapse signal.
    Collapsing,
}

/// Kind-specific geometry and animation state.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Inverse-square attraction toward the source.
    GravityWell {
        /// Beyond this distance the well has no effect.
        reach: f64,
        /// Radius of the drawn core; cosmetic.
        event_horizon: f64,
        rotation: f64,
    },
    /// Tangential spiral distortion with `arms` lobes, zero beyond `radius`.
    WarpField {
        radius: f64,
        arms: u32,
        rotation: f64,
        pulsation: f64,
    },
    /// Spiral pattern that opens, holds, then closes; zero beyond `2 * radius`.
    Wormhole {
        radius: f64,
        max_radius: f64,
        rotation: f64,
    },
}

/// A positioned field emitter.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSource {
    pub position: DVec2,
    pub strength: f64,
    /// Strength at creation; expiry thresholds are relative to it.
    pub base_strength: f64,
    /// Upper bound on the magnitude of any influence vector.
    pub max_force: f64,
    pub life: Lifetime,
    pub state: SourceState,
    pub kind: SourceKind,
}

/// An entity spawn request produced by a source as a side effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub kind: SpawnKind,
    pub origin: DVec2,
    pub count: usize,
}

impl FieldSource {
    /// A gravity well of `strength` (the numerator of `strength / d²`).
    pub fn gravity_well(position: DVec2, strength: f64, max_force: f64, life: u32) -> Self {
        Self {
            position,
            strength,
            base_strength: strength,
            max_force,
            life: Lifetime::new(life),
            state: SourceState::Active,
            kind: SourceKind::GravityWell {
                reach: f64::INFINITY,
                event_horizon: 25.0,
                rotation: 0.0,
            },
        }
    }

    /// A six-armed warp field of the given radius and intensity.
    pub fn warp_field(
        position: DVec2,
        radius: f64,
        intensity: f64,
        max_force: f64,
        life: u32,
    ) -> Self {
        Self {
            position,
            strength: intensity,
            base_strength: intensity,
            max_force,
            life: Lifetime::new(life),
            state: SourceState::Active,
            kind: SourceKind::WarpField {
                radius,
                arms: WARP_ARMS,
                rotation: 0.0,
                pulsation: 1.0,
            },
        }
    }

    /// A wormhole that starts closed and opens toward `max_radius`.
    pub fn wormhole(
        position: DVec2,
        max_radius: f64,
        strength: f64,
        max_force: f64,
        life: u32,
    ) -> Self {
        Self {
            position,
            strength,
            base_strength: strength,
            max_force,
            life: Lifetime::new(life),
            state: SourceState::Active,
            kind: SourceKind::Wormhole {
                radius: 0.0,
                max_radius,
                rotation: 0.0,
            },
        }
    }

    /// Builds a source from serialized parameters. Only a gravity well
    /// without an explicit strength draws from `rng`.
    pub fn from_params(
        origin: DVec2,
        params: &SourceParams,
        max_force: f64,
        rng: &mut Xorshift64,
    ) -> Self {
        let life = params.life.unwrap_or_else(|| params.kind.default_life());
        match params.kind {
            SourceTag::GravityWell | SourceTag::MassiveWell => {
                let massive = params.kind == SourceTag::MassiveWell;
                let strength = params.strength.unwrap_or_else(|| {
                    let mass = if massive {
                        200.0
                    } else {
                        rng.next_range(50.0, 150.0)
                    };
                    mass * 100.0
                });
                let mut well = Self::gravity_well(origin, strength, max_force, life);
                if let SourceKind::GravityWell {
                    reach,
                    event_horizon,
                    ..
                } = &mut well.kind
                {
                    *reach = params.radius.unwrap_or(f64::INFINITY);
                    *event_horizon = if massive { 50.0 } else { 25.0 };
                }
                well
            }
            SourceTag::WarpField | SourceTag::IntenseWarp => {
                let intense = params.kind == SourceTag::IntenseWarp;
                let radius = params
                    .radius
                    .unwrap_or(if intense { 150.0 } else { 80.0 });
                let intensity = params.strength.unwrap_or(if intense { 3.0 } else { 1.0 });
                Self::warp_field(origin, radius, intensity, max_force, life)
            }
            SourceTag::Wormhole => Self::wormhole(
                origin,
                params.radius.unwrap_or(80.0),
                params.strength.unwrap_or(20.0),
                max_force,
                life,
            ),
        }
    }

    /// The serializable tag closest to this source's kind.
    pub fn tag(&self) -> SourceTag {
        match self.kind {
            SourceKind::GravityWell { .. } => SourceTag::GravityWell,
            SourceKind::WarpField { .. } => SourceTag::WarpField,
            SourceKind::Wormhole { .. } => SourceTag::Wormhole,
        }
    }

    /// Effective radius: the falloff extent for warps and wormholes, the
    /// event horizon for gravity wells.
    pub fn radius(&self) -> f64 {
        match self.kind {
            SourceKind::GravityWell { event_horizon, .. } => event_horizon,
            SourceKind::WarpField { radius, .. } | SourceKind::Wormhole { radius, .. } => radius,
        }
    }

    pub fn is_collapsing(&self) -> bool {
        self.state == SourceState::Collapsing
    }

    /// Whether a wormhole is in its closing phase (late life or collapsing).
    fn is_closing(&self) -> bool {
        self.is_collapsing()
            || (self.life.remaining() as f64) < self.life.max() as f64 * WORMHOLE_PHASE
    }

    /// One tick of animation and decay. `time` is the world clock in seconds.
    pub fn advance(&mut self, time: f64) {
        let opening = (self.life.remaining() as f64) > self.life.max() as f64 * (1.0 - WORMHOLE_PHASE);
        let closing = self.is_closing();
        let collapsing = self.is_collapsing();

        match &mut self.kind {
            SourceKind::GravityWell {
                rotation,
                event_horizon,
                ..
            } => {
                *rotation += WELL_SPIN;
                if collapsing {
                    *event_horizon *= COLLAPSE_RADIUS_DECAY;
                }
            }
            SourceKind::WarpField {
                radius,
                rotation,
                pulsation,
                ..
            } => {
                *rotation += WARP_SPIN;
                *pulsation = (time * 2.0).sin() * 0.3 + 0.7;
                if collapsing {
                    *radius *= COLLAPSE_RADIUS_DECAY;
                }
            }
            SourceKind::Wormhole {
                radius,
                max_radius,
                rotation,
            } => {
                *rotation += WORMHOLE_SPIN;
                if closing {
                    *radius *= WORMHOLE_CLOSE_RATE;
                } else if opening {
                    *radius += WORMHOLE_OPEN_RATE;
                }
                *radius = radius.min(*max_radius);
            }
        }

        if collapsing {
            self.strength *= COLLAPSE_STRENGTH_DECAY;
        }
        self.life.tick();
    }

    /// Scales strength by `factor`; position and life are untouched.
    pub fn weaken(&mut self, factor: f64) {
        self.strength *= factor;
    }

    /// Enters the collapsing state. Idempotent.
    pub fn collapse(&mut self) {
        self.state = SourceState::Collapsing;
    }

    /// True once the source should be removed.
    pub fn is_expired(&self) -> bool {
        if self.life.is_expired() {
            return true;
        }
        if self.base_strength > 0.0 && self.strength < self.base_strength * VISIBILITY_THRESHOLD {
            return true;
        }
        match self.kind {
            SourceKind::GravityWell { .. } => false,
            SourceKind::WarpField { radius, .. } => radius < MIN_WARP_RADIUS,
            SourceKind::Wormhole { radius, .. } => self.is_closing() && radius < MIN_WORMHOLE_RADIUS,
        }
    }

    /// Entities this source sheds on `tick`, if any.
    pub fn emission(&self, tick: u64) -> Option<Emission> {
        match self.kind {
            SourceKind::Wormhole { radius, .. }
                if !self.is_closing() && radius > 0.0 && tick % WORMHOLE_EMIT_PERIOD == 0 =>
            {
                Some(Emission {
                    kind: SpawnKind::RiftMote,
                    origin: self.position,
                    count: 1,
                })
            }
            _ => None,
        }
    }

    /// Opacity for rendering, from remaining life and strength.
    pub fn opacity(&self) -> f64 {
        let strength = if self.base_strength > 0.0 {
            (self.strength / self.base_strength).min(1.0)
        } else {
            1.0
        };
        (self.life.fraction() * strength).clamp(0.0, 1.0)
    }

    fn raw_influence(&self, point: DVec2) -> DVec2 {
        let offset = point - self.position;
        let distance = offset.length();

        match self.kind {
            SourceKind::GravityWell { reach, .. } => {
                if distance < SINGULARITY_EPS || distance > reach {
                    return DVec2::ZERO;
                }
                -offset / distance * (self.strength / (distance * distance))
            }
            SourceKind::WarpField {
                radius,
                arms,
                rotation,
                pulsation,
            } => {
                if distance > radius || radius < SINGULARITY_EPS {
                    return DVec2::ZERO;
                }
                let falloff = (1.0 - distance / radius) * self.strength * pulsation;
                let spiral = offset.y.atan2(offset.x) + rotation + distance / radius * PI;
                let magnitude = (spiral * arms as f64).sin() * falloff * WARP_GAIN;
                DVec2::from_angle(spiral + FRAC_PI_2) * magnitude
            }
            SourceKind::Wormhole {
                radius, rotation, ..
            } => {
                if radius < SINGULARITY_EPS || distance > radius * 2.0 {
                    return DVec2::ZERO;
                }
                let magnitude = (1.0 - distance / (radius * 2.0)) * self.strength;
                let spiral = offset.y.atan2(offset.x) + rotation + distance / radius * TAU;
                DVec2::from_angle(spiral) * magnitude
            }
        }
    }
}

impl Influence for FieldSource {
    fn influence_at(&self, point: DVec2) -> DVec2 {
        if !point.is_finite() {
            return DVec2::ZERO;
        }
        let v = self.raw_influence(point);
        if !v.is_finite() {
            return DVec2::ZERO;
        }
        v.clamp_length_max(self.max_force.max(0.0))
    }
}

// ---------------------------------------------------------------------------
// Serializable parameters
// ---------------------------------------------------------------------------

/// Which source a spawn command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    GravityWell,
    /// Heavier, longer-lived gravity well.
    MassiveWell,
    WarpField,
    /// Wider, three times stronger warp field.
    IntenseWarp,
    Wormhole,
}

impl SourceTag {
    pub fn default_life(self) -> u32 {
        match self {
            SourceTag::GravityWell | SourceTag::Wormhole => 400,
            SourceTag::MassiveWell => 800,
            SourceTag::WarpField | SourceTag::IntenseWarp => 500,
        }
    }
}

/// Parameters of a `SpawnFieldSource` command. Missing overrides fall back
/// to the per-kind defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceParams {
    pub kind: SourceTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    /// Warp radius, wormhole max radius, or gravity reach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life: Option<u32>,
}

impl SourceParams {
    pub fn new(kind: SourceTag) -> Self {
        Self {
            kind,
            strength: None,
            radius: None,
            life: None,
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_life(mut self, life: u32) -> Self {
        self.life = Some(life);
        self
    }

    /// Rejects non-finite or non-positive overrides.
    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some(s) = self.strength {
            if !s.is_finite() || s <= 0.0 {
                return Err(EngineError::InvalidCommand(format!(
                    "source strength must be finite and > 0, got {s}"
                )));
            }
        }
        if let Some(r) = self.radius {
            if !r.is_finite() || r <= 0.0 {
                return Err(EngineError::InvalidCommand(format!(
                    "source radius must be finite and > 0, got {r}"
                )));
            }
        }
        if self.life == Some(0) {
            return Err(EngineError::InvalidCommand("source life must be > 0".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ambient drift
// ---------------------------------------------------------------------------

/// Slowly evolving Perlin flow that keeps ambient entities moving when no
/// source is nearby. Output magnitude never exceeds `strength * √2`.
pub struct AmbientDrift {
    noise: Perlin,
    scale: f64,
    strength: f64,
    phase: f64,
}

impl AmbientDrift {
    pub fn new(scale: f64, strength: f64, seed: u32) -> Self {
        Self {
            noise: Perlin::new(seed),
            scale,
            strength,
            phase: 0.0,
        }
    }

    /// Moves the flow along its time axis.
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = phase;
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }
}

impl Influence for AmbientDrift {
    fn influence_at(&self, point: DVec2) -> DVec2 {
        if self.strength == 0.0 || !point.is_finite() {
            return DVec2::ZERO;
        }
        let s = point * self.scale;
        let v = DVec2::new(
            self.noise.get([s.x, s.y, self.phase]),
            self.noise.get([s.x + 100.0, s.y + 100.0, self.phase]),
        ) * self.strength;
        v.clamp_length_max(self.strength.abs() * std::f64::consts::SQRT_2)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
