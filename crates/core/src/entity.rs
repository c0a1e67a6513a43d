//! Entities: transient visual objects with position, velocity and a lifetime.
//!
//! Per-kind behavior is a tagged [`EntityKind`] dispatched by `match`. Every
//! random choice an entity will ever need is made in [`Entity::spawn`]; the
//! per-tick update is a pure function of the entity, the sampled field force
//! and the [`UpdateContext`].

use crate::color::Srgb;
use crate::lifetime::Lifetime;
use crate::prng::Xorshift64;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Velocity damping applied to drifting kinds each tick.
const DRIFT_DAMPING: f64 = 0.99;
/// Downward acceleration of sparks per tick.
const SPARK_GRAVITY: f64 = 0.1;
/// Per-tick size decay of sparks.
const SPARK_SHRINK: f64 = 0.98;
/// Sparks further than this outside the bounds are retired.
const SPARK_ESCAPE_MARGIN: f64 = 50.0;
/// Number of positions remembered by energy particles.
pub const TRAIL_LENGTH: usize = 10;
/// Segments per lightning bolt.
const LIGHTNING_SEGMENTS: usize = 10;
/// Tangential swirl factor of rift motes, giving the inward spiral.
const RIFT_SWIRL: f64 = 0.02;
/// Increase of the rift pull factor per tick.
const RIFT_PULL_GROWTH: f64 = 0.001;
/// Velocity damping of rift motes.
const RIFT_DAMPING: f64 = 0.95;

const MOTE_COLORS: [&str; 4] = ["#00ffff", "#0099ff", "#0066ff", "#ffffff"];
const FRAGMENT_STATES: [&str; 4] = ["#ff00ff", "#00ffff", "#ffff00", "#ff6600"];

/// Serializable tag naming an entity kind in spawn commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnKind {
    Mote,
    Energy,
    Fragment,
    Spark,
    Lightning,
    Shockwave,
    RiftMote,
}

impl SpawnKind {
    pub const ALL: [SpawnKind; 7] = [
        SpawnKind::Mote,
        SpawnKind::Energy,
        SpawnKind::Fragment,
        SpawnKind::Spark,
        SpawnKind::Lightning,
        SpawnKind::Shockwave,
        SpawnKind::RiftMote,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpawnKind::Mote => "mote",
            SpawnKind::Energy => "energy",
            SpawnKind::Fragment => "fragment",
            SpawnKind::Spark => "spark",
            SpawnKind::Lightning => "lightning",
            SpawnKind::Shockwave => "shockwave",
            SpawnKind::RiftMote => "rift_mote",
        }
    }
}

impl fmt::Display for SpawnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpawnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpawnKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown entity kind: {s}"))
    }
}

/// One straight piece of a lightning bolt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: DVec2,
    pub end: DVec2,
    pub intensity: f64,
}

/// Kind-specific state.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// Drifting dust mote: bounces off the bounds, drawn to the pointer.
    Mote { size: f64, color: Srgb, alpha: f64 },
    /// Pulsing drifter that records a short trail of past positions.
    Energy {
        size: f64,
        trail: VecDeque<DVec2>,
        pulse_phase: f64,
        pulse_speed: f64,
    },
    /// Rotating hexagon cycling through colour states on a fixed period.
    Fragment {
        size: f64,
        rotation: f64,
        spin: f64,
        state: usize,
        timer: u32,
        period: u32,
    },
    /// Burst debris falling under gravity.
    Spark { size: f64 },
    /// Static bolt that fades out.
    Lightning { segments: Vec<Segment> },
    /// Expanding ring.
    Shockwave {
        radius: f64,
        max_radius: f64,
        speed: f64,
    },
    /// Mote spiraling into a rift center.
    RiftMote {
        target: DVec2,
        pull: f64,
        size: f64,
        hue: f64,
    },
}

/// Everything an entity update may read besides itself.
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext {
    pub bounds: DVec2,
    pub pointer: Option<DVec2>,
    pub pointer_radius: f64,
    pub pointer_force: f64,
}

/// A single simulated visual object.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Assigned by the world when the entity is added, unique per world.
    /// Zero for entities that were never added.
    pub id: u64,
    pub position: DVec2,
    pub velocity: DVec2,
    pub life: Lifetime,
    pub kind: EntityKind,
}

impl Entity {
    /// Default lifetime of a kind, in ticks.
    pub fn default_life(kind: SpawnKind, rng: &mut Xorshift64) -> u32 {
        match kind {
            SpawnKind::Mote | SpawnKind::Fragment => 600,
            SpawnKind::Energy => 300,
            SpawnKind::Spark => rng.next_range(34.0, 100.0) as u32,
            SpawnKind::Lightning => rng.next_range(30.0, 50.0) as u32,
            SpawnKind::Shockwave => 60,
            SpawnKind::RiftMote => 300,
        }
    }

    /// Creates an entity of `kind` at `origin`, drawing all jitter from `rng`.
    ///
    /// `life` overrides the kind's default lifetime.
    pub fn spawn(kind: SpawnKind, origin: DVec2, life: Option<u32>, rng: &mut Xorshift64) -> Self {
        let max_life = life.unwrap_or_else(|| Self::default_life(kind, rng));
        let drift = |rng: &mut Xorshift64| DVec2::new(rng.next_signed(), rng.next_signed()) * 0.5;

        let (position, velocity, kind) = match kind {
            SpawnKind::Mote => {
                let color = MOTE_COLORS[rng.next_usize(MOTE_COLORS.len())];
                (
                    origin,
                    drift(rng),
                    EntityKind::Mote {
                        size: rng.next_range(1.0, 3.0),
                        color: Srgb::from_hex(color).unwrap_or(Srgb::WHITE),
                        alpha: rng.next_range(0.2, 0.7),
                    },
                )
            }
            SpawnKind::Energy => (
                origin,
                drift(rng),
                EntityKind::Energy {
                    size: rng.next_range(2.0, 6.0),
                    trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
                    pulse_phase: rng.next_angle(),
                    pulse_speed: rng.next_range(0.02, 0.07),
                },
            ),
            SpawnKind::Fragment => (
                origin,
                drift(rng),
                EntityKind::Fragment {
                    size: rng.next_range(3.0, 9.0),
                    rotation: 0.0,
                    spin: rng.next_signed() * 0.1,
                    state: 0,
                    timer: 0,
                    period: rng.next_range(60.0, 180.0) as u32,
                },
            ),
            SpawnKind::Spark => (
                origin,
                DVec2::new(rng.next_signed(), rng.next_signed()) * 8.0,
                EntityKind::Spark {
                    size: rng.next_range(1.0, 4.0),
                },
            ),
            SpawnKind::Lightning => (
                origin,
                DVec2::ZERO,
                EntityKind::Lightning {
                    segments: lightning_segments(origin, rng),
                },
            ),
            SpawnKind::Shockwave => (
                origin,
                DVec2::ZERO,
                EntityKind::Shockwave {
                    radius: 0.0,
                    max_radius: rng.next_range(50.0, 100.0),
                    speed: rng.next_range(2.0, 5.0),
                },
            ),
            SpawnKind::RiftMote => {
                let offset = DVec2::from_angle(rng.next_angle()) * rng.next_range(0.0, 100.0);
                (
                    origin + offset,
                    DVec2::ZERO,
                    EntityKind::RiftMote {
                        target: origin,
                        pull: 0.05,
                        size: rng.next_range(1.0, 4.0),
                        hue: rng.next_range(200.0, 260.0),
                    },
                )
            }
        };

        Self {
            id: 0,
            position,
            velocity,
            life: Lifetime::new(max_life),
            kind,
        }
    }

    /// The tag this entity was spawned with.
    pub fn spawn_kind(&self) -> SpawnKind {
        match self.kind {
            EntityKind::Mote { .. } => SpawnKind::Mote,
            EntityKind::Energy { .. } => SpawnKind::Energy,
            EntityKind::Fragment { .. } => SpawnKind::Fragment,
            EntityKind::Spark { .. } => SpawnKind::Spark,
            EntityKind::Lightning { .. } => SpawnKind::Lightning,
            EntityKind::Shockwave { .. } => SpawnKind::Shockwave,
            EntityKind::RiftMote { .. } => SpawnKind::RiftMote,
        }
    }

    /// Whether field sources push this entity around.
    pub fn is_field_coupled(&self) -> bool {
        !matches!(
            self.kind,
            EntityKind::Lightning { .. } | EntityKind::Shockwave { .. }
        )
    }

    /// Adds an already-scaled field force to the velocity.
    pub fn apply_force(&mut self, force: DVec2) {
        if self.is_field_coupled() && force.is_finite() {
            self.velocity += force;
        }
    }

    /// Kind-specific motion for one tick. Does not touch the lifetime.
    pub fn advance(&mut self, ctx: &UpdateContext) {
        match &mut self.kind {
            EntityKind::Mote { .. } => {
                drift(&mut self.position, &mut self.velocity, ctx);
            }
            EntityKind::Energy {
                trail,
                pulse_phase,
                pulse_speed,
                ..
            } => {
                drift(&mut self.position, &mut self.velocity, ctx);
                trail.push_front(self.position);
                trail.truncate(TRAIL_LENGTH);
                *pulse_phase += *pulse_speed;
            }
            EntityKind::Fragment {
                rotation,
                spin,
                state,
                timer,
                period,
                ..
            } => {
                drift(&mut self.position, &mut self.velocity, ctx);
                *rotation += *spin;
                *timer += 1;
                if *timer >= *period {
                    *state = (*state + 1) % FRAGMENT_STATES.len();
                    *timer = 0;
                }
            }
            EntityKind::Spark { size } => {
                self.position += self.velocity;
                self.velocity.y += SPARK_GRAVITY;
                *size *= SPARK_SHRINK;
            }
            EntityKind::Lightning { .. } => {}
            EntityKind::Shockwave { radius, speed, .. } => {
                *radius += *speed;
            }
            EntityKind::RiftMote { target, pull, .. } => {
                let to_center = *target - self.position;
                self.position += to_center * *pull + to_center.perp() * RIFT_SWIRL;
                self.position += self.velocity;
                self.velocity *= RIFT_DAMPING;
                *pull = (*pull + RIFT_PULL_GROWTH).min(1.0);
            }
        }
    }

    /// Kind-specific termination, checked after the life decrement.
    pub fn is_expired(&self, bounds: DVec2) -> bool {
        if self.life.is_expired() {
            return true;
        }
        match &self.kind {
            EntityKind::Spark { .. } => {
                let p = self.position;
                p.x < -SPARK_ESCAPE_MARGIN
                    || p.y < -SPARK_ESCAPE_MARGIN
                    || p.x > bounds.x + SPARK_ESCAPE_MARGIN
                    || p.y > bounds.y + SPARK_ESCAPE_MARGIN
            }
            EntityKind::Shockwave {
                radius, max_radius, ..
            } => radius >= max_radius,
            _ => !self.position.is_finite(),
        }
    }

    /// Current colour.
    pub fn color(&self) -> Srgb {
        let hex = match &self.kind {
            EntityKind::Mote { color, .. } => return *color,
            EntityKind::RiftMote { hue, .. } => return Srgb::from_hsl(*hue, 1.0, 0.5),
            EntityKind::Energy { .. } => "#00ffaa",
            EntityKind::Fragment { state, .. } => FRAGMENT_STATES[*state % FRAGMENT_STATES.len()],
            EntityKind::Spark { .. } => "#ffaa00",
            EntityKind::Lightning { .. } => "#ffffff",
            EntityKind::Shockwave { .. } => "#00ffff",
        };
        Srgb::from_hex(hex).unwrap_or(Srgb::WHITE)
    }

    /// Current opacity in [0, 1], derived from the remaining life.
    pub fn opacity(&self) -> f64 {
        let fade = self.life.fraction();
        let alpha = match &self.kind {
            EntityKind::Mote { alpha, .. } => alpha * ambient_fade(fade),
            EntityKind::Energy { pulse_phase, .. } => {
                (pulse_phase.sin() * 0.3 + 0.7) * ambient_fade(fade)
            }
            EntityKind::Fragment { .. } => 0.8 * ambient_fade(fade),
            EntityKind::Shockwave { .. } => fade * 0.6,
            _ => fade,
        };
        alpha.clamp(0.0, 1.0)
    }
}

/// Ambient kinds keep full opacity for most of their life and fade over
/// the last tenth instead of dimming linearly.
fn ambient_fade(fraction: f64) -> f64 {
    (fraction * 10.0).min(1.0)
}

/// Shared motion of the drifting kinds: pointer attraction, integration,
/// boundary bounce with clamping, damping.
fn drift(position: &mut DVec2, velocity: &mut DVec2, ctx: &UpdateContext) {
    if let Some(pointer) = ctx.pointer {
        let to_pointer = pointer - *position;
        let distance = to_pointer.length();
        if distance < ctx.pointer_radius && ctx.pointer_radius > 0.0 {
            let force = (ctx.pointer_radius - distance) / ctx.pointer_radius * ctx.pointer_force;
            *velocity += to_pointer * force;
        }
    }

    *position += *velocity;

    if position.x < 0.0 || position.x > ctx.bounds.x {
        velocity.x = -velocity.x;
    }
    if position.y < 0.0 || position.y > ctx.bounds.y {
        velocity.y = -velocity.y;
    }
    *position = position.clamp(DVec2::ZERO, ctx.bounds);
    *velocity *= DRIFT_DAMPING;
}

fn lightning_segments(origin: DVec2, rng: &mut Xorshift64) -> Vec<Segment> {
    let length = rng.next_range(50.0, 150.0);
    let step = length / LIGHTNING_SEGMENTS as f64;
    let mut direction = rng.next_angle();
    let mut cursor = origin;
    (0..LIGHTNING_SEGMENTS)
        .map(|_| {
            let jitter = rng.next_signed() * 0.5;
            let end = cursor + DVec2::from_angle(direction + jitter) * step;
            let segment = Segment {
                start: cursor,
                end,
                intensity: rng.next_range(0.2, 1.0),
            };
            cursor = end;
            direction += jitter;
            segment
        })
        .collect()
}

/// A connection between two nearby motes, by index into the entity slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    /// `(cutoff - distance) / cutoff`, in (0, 1].
    pub strength: f64,
}

/// Pairwise links among motes closer than `cutoff`.
///
/// Only the first `cap` motes (in collection order) are considered, so the
/// quadratic scan is bounded by `cap²` regardless of population.
pub fn neighbor_links(entities: &[Entity], cap: usize, cutoff: f64) -> Vec<Link> {
    if cutoff <= 0.0 {
        return Vec::new();
    }
    let motes: Vec<(usize, DVec2)> = entities
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e.kind, EntityKind::Mote { .. }))
        .map(|(i, e)| (i, e.position))
        .take(cap)
        .collect();

    let mut links = Vec::new();
    for (n, &(a, pa)) in motes.iter().enumerate() {
        for &(b, pb) in &motes[n + 1..] {
            let distance = pa.distance(pb);
            if distance < cutoff {
                links.push(Link {
                    a,
                    b,
                    strength: (cutoff - distance) / cutoff,
                });
            }
        }
    }
    links
}

/// Angle helper for renderers: vertex `i` of a regular `n`-gon.
pub fn polygon_vertex(center: DVec2, radius: f64, rotation: f64, i: usize, n: usize) -> DVec2 {
    center + DVec2::from_angle(rotation + i as f64 / n as f64 * TAU) * radius
}
