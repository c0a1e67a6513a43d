//! The simulation world: sole owner of entities, field sources and the grid.
//!
//! A tick runs strictly in this order:
//!
//! 1. drain and apply queued commands (invalid ones are logged and dropped),
//! 2. spawn phase under the per-tick cap: queued bursts in FIFO order, then
//!    source side effects, then the spontaneous warp roll, then ambient
//!    replenishment,
//! 3. advance field sources and drop the finished ones,
//! 4. update every entity against that source snapshot,
//! 5. drop expired entities,
//! 6. recompute the background grid,
//! 7. advance the tick counter.
//!
//! Spawn requests beyond the cap stay queued for later ticks. Queued spawns
//! beyond `max_pending_spawns` are dropped with a warning.

use crate::command::{Command, CommandQueue, CommandSender};
use crate::config::SimConfig;
use crate::entity::{Entity, SpawnKind, UpdateContext};
use crate::error::EngineError;
use crate::field_source::{
    AmbientDrift, FieldSource, Influence, SourceKind, SourceParams, SourceTag,
};
use crate::grid::WarpGrid;
use crate::prng::Xorshift64;
use glam::DVec2;
use serde::Serialize;
use std::collections::VecDeque;
use std::f64::consts::TAU;

/// Logical seconds per tick; drives source pulsation.
pub const TICK_SECONDS: f64 = 0.016;

/// Distance of the travel warp ring from its origin.
const TRAVEL_RING_DISTANCE: f64 = 150.0;
const TRAVEL_RING_SIZE: usize = 8;
const TRAVEL_RIFTS: usize = 3;
const TRAVEL_RIFT_MOTES: usize = 30;
/// Rift centers land within this box around the travel origin.
const TRAVEL_RIFT_SPREAD: f64 = 200.0;

const CALIBRATE_FACTOR: f64 = 0.3;

/// Spontaneous warps live this long, in ticks.
const SPONTANEOUS_WARP_LIFE: (f64, f64) = (200.0, 500.0);

/// Speed of the ambient drift along its time axis, relative to the clock.
const DRIFT_TIME_SCALE: f64 = 0.1;

/// A queued burst not yet fully created.
#[derive(Debug, Clone, PartialEq)]
struct PendingSpawn {
    kind: SpawnKind,
    origin: DVec2,
    remaining: usize,
    life: Option<u32>,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Tick number that just completed, starting at 1.
    pub tick: u64,
    /// Entities created this tick. Never exceeds the spawn cap.
    pub spawned: usize,
    /// Entities removed this tick.
    pub expired: usize,
    /// Live field sources after the tick.
    pub sources: usize,
    /// Live entities after the tick.
    pub entities: usize,
    /// Spawns still queued for later ticks.
    pub pending: usize,
    /// Commands rejected by validation or spawns dropped for overflow.
    pub dropped_commands: usize,
}

/// Owns every live entity and field source and advances them tick by tick.
pub struct World {
    config: SimConfig,
    bounds: DVec2,
    entities: Vec<Entity>,
    sources: Vec<FieldSource>,
    grid: WarpGrid,
    drift: AmbientDrift,
    rng: Xorshift64,
    queue: CommandQueue,
    pending: VecDeque<PendingSpawn>,
    pointer: Option<DVec2>,
    next_id: u64,
    tick: u64,
    time: f64,
}

impl World {
    /// Builds an empty world. Nothing exists until the first tick's spawn
    /// phase runs.
    pub fn new(config: SimConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let bounds = DVec2::new(config.width, config.height);
        let grid = WarpGrid::new(bounds, config.grid_spacing)?;
        let drift = AmbientDrift::new(
            config.drift_scale,
            config.drift_strength,
            // Perlin seeds are 32-bit; fold the high half in.
            (config.seed ^ (config.seed >> 32)) as u32,
        );
        tracing::debug!(
            width = config.width,
            height = config.height,
            seed = config.seed,
            "world created"
        );
        Ok(Self {
            rng: Xorshift64::new(config.seed),
            config,
            bounds,
            entities: Vec::new(),
            sources: Vec::new(),
            grid,
            drift,
            queue: CommandQueue::new(),
            pending: VecDeque::new(),
            pointer: None,
            next_id: 1,
            tick: 0,
            time: 0.0,
        })
    }

    /// A cloneable handle hosts use to enqueue commands.
    pub fn sender(&self) -> CommandSender {
        self.queue.sender()
    }

    /// Enqueues a command for the next tick.
    pub fn enqueue(&self, command: Command) {
        // The world holds its own sender, so the queue cannot be closed here.
        let _ = self.queue.sender().send(command);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn sources(&self) -> &[FieldSource] {
        &self.sources
    }

    pub fn grid(&self) -> &WarpGrid {
        &self.grid
    }

    /// Number of completed ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Logical clock in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn bounds(&self) -> DVec2 {
        self.bounds
    }

    pub fn pointer(&self) -> Option<DVec2> {
        self.pointer
    }

    /// Total entities still queued for creation.
    pub fn pending_spawns(&self) -> usize {
        self.pending.iter().map(|p| p.remaining).sum()
    }

    /// Total influence of all live sources at `point`.
    pub fn influence_at(&self, point: DVec2) -> DVec2 {
        self.sources.as_slice().influence_at(point)
    }

    /// Runs one full tick.
    pub fn step(&mut self) -> TickReport {
        let mut report = TickReport::default();

        for command in self.queue.drain() {
            if let Err(e) = command.validate() {
                tracing::warn!(command = command.name(), error = %e, "dropping invalid command");
                report.dropped_commands += 1;
                continue;
            }
            report.dropped_commands += self.apply(command);
        }

        report.spawned = self.spawn_phase();

        self.time += TICK_SECONDS;
        let time = self.time;
        for source in &mut self.sources {
            source.advance(time);
        }
        self.sources.retain(|s| !s.is_expired());

        self.drift.set_phase(time * DRIFT_TIME_SCALE);
        self.update_entities();

        let before = self.entities.len();
        let bounds = self.bounds;
        self.entities.retain(|e| !e.is_expired(bounds));
        report.expired = before - self.entities.len();

        self.grid.update(self.sources.as_slice());
        self.tick += 1;

        report.tick = self.tick;
        report.sources = self.sources.len();
        report.entities = self.entities.len();
        report.pending = self.pending_spawns();
        tracing::trace!(
            tick = report.tick,
            spawned = report.spawned,
            expired = report.expired,
            entities = report.entities,
            sources = report.sources,
            "tick"
        );
        report
    }

    /// Applies one validated command. Returns how many spawn requests it had
    /// to drop for queue overflow (0 or 1).
    fn apply(&mut self, command: Command) -> usize {
        tracing::debug!(command = command.name(), tick = self.tick, "applying command");
        match command {
            Command::SpawnBurst {
                origin,
                count,
                kind,
                life,
            } => {
                let count = usize::try_from(count).unwrap_or(0);
                self.queue_spawn(kind, origin, count, life)
            }
            Command::SpawnFieldSource { origin, params } => {
                self.add_source(origin, &params);
                0
            }
            Command::WeakenAllSources { factor } => {
                for source in &mut self.sources {
                    source.weaken(factor);
                }
                0
            }
            Command::CollapseAllSources => {
                for source in &mut self.sources {
                    source.collapse();
                }
                0
            }
            Command::Resize { width, height } => {
                let bounds = DVec2::new(width, height);
                match WarpGrid::new(bounds, self.config.grid_spacing) {
                    Ok(grid) => {
                        self.grid = grid;
                        self.bounds = bounds;
                        self.config.width = width;
                        self.config.height = height;
                        0
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "resize rejected");
                        1
                    }
                }
            }
            Command::PointerMoved { position } => {
                self.pointer = position;
                0
            }
            Command::Travel { origin } => self.travel(origin),
            Command::Calibrate => {
                for source in &mut self.sources {
                    source.weaken(CALIBRATE_FACTOR);
                    if matches!(source.kind, SourceKind::Wormhole { .. }) {
                        source.collapse();
                    }
                }
                0
            }
        }
    }

    fn push_entity(&mut self, mut entity: Entity) {
        entity.id = self.next_id;
        self.next_id += 1;
        self.entities.push(entity);
    }

    fn add_source(&mut self, origin: DVec2, params: &SourceParams) {
        let source =
            FieldSource::from_params(origin, params, self.config.gravity_clamp, &mut self.rng);
        tracing::debug!(kind = ?params.kind, x = origin.x, y = origin.y, "field source spawned");
        self.sources.push(source);
    }

    /// Queues `count` spawns, truncating at `max_pending_spawns`.
    fn queue_spawn(
        &mut self,
        kind: SpawnKind,
        origin: DVec2,
        count: usize,
        life: Option<u32>,
    ) -> usize {
        if count == 0 {
            return 0;
        }
        let room = self
            .config
            .max_pending_spawns
            .saturating_sub(self.pending_spawns());
        let accepted = count.min(room);
        if accepted < count {
            tracing::warn!(
                kind = %kind,
                requested = count,
                dropped = count - accepted,
                limit = self.config.max_pending_spawns,
                "spawn queue full, dropping excess"
            );
        }
        if accepted > 0 {
            self.pending.push_back(PendingSpawn {
                kind,
                origin,
                remaining: accepted,
                life,
            });
        }
        usize::from(accepted < count)
    }

    fn travel(&mut self, origin: DVec2) -> usize {
        self.add_source(origin, &SourceParams::new(SourceTag::MassiveWell));
        self.add_source(origin, &SourceParams::new(SourceTag::Wormhole));
        for i in 0..TRAVEL_RING_SIZE {
            let angle = i as f64 / TRAVEL_RING_SIZE as f64 * TAU;
            let at = origin + DVec2::from_angle(angle) * TRAVEL_RING_DISTANCE;
            self.add_source(at, &SourceParams::new(SourceTag::IntenseWarp));
        }
        let mut dropped = 0;
        for _ in 0..TRAVEL_RIFTS {
            let jitter = DVec2::new(self.rng.next_signed(), self.rng.next_signed());
            let center = origin + jitter * TRAVEL_RIFT_SPREAD;
            dropped += self.queue_spawn(SpawnKind::RiftMote, center, TRAVEL_RIFT_MOTES, None);
        }
        dropped
    }

    /// Creates at most `spawn_cap` entities. Returns how many were created.
    fn spawn_phase(&mut self) -> usize {
        let cap = self.config.spawn_cap;
        let mut spawned = 0;

        while spawned < cap {
            let Some(front) = self.pending.front_mut() else {
                break;
            };
            let n = front.remaining.min(cap - spawned);
            let (kind, origin, life) = (front.kind, front.origin, front.life);
            front.remaining -= n;
            if front.remaining == 0 {
                self.pending.pop_front();
            }
            for _ in 0..n {
                let entity = Entity::spawn(kind, origin, life, &mut self.rng);
                self.push_entity(entity);
            }
            spawned += n;
        }

        let emissions: Vec<_> = self
            .sources
            .iter()
            .filter_map(|s| s.emission(self.tick))
            .collect();
        for emission in emissions {
            let n = emission.count.min(cap - spawned);
            for _ in 0..n {
                let entity = Entity::spawn(emission.kind, emission.origin, None, &mut self.rng);
                self.push_entity(entity);
            }
            spawned += n;
        }

        if self.rng.chance(self.config.spontaneous_warp_chance) {
            let at = self.rng.next_point(self.bounds);
            let life = self
                .rng
                .next_range(SPONTANEOUS_WARP_LIFE.0, SPONTANEOUS_WARP_LIFE.1) as u32;
            self.add_source(at, &SourceParams::new(SourceTag::WarpField).with_life(life));
        }

        let ambient = self.config.ambient;
        for (kind, target) in [
            (SpawnKind::Mote, ambient.motes),
            (SpawnKind::Energy, ambient.energy),
            (SpawnKind::Fragment, ambient.fragments),
        ] {
            if target == 0 {
                continue;
            }
            let live = self
                .entities
                .iter()
                .filter(|e| e.spawn_kind() == kind)
                .count();
            let n = target.saturating_sub(live).min(cap - spawned);
            for _ in 0..n {
                let at = self.rng.next_point(self.bounds);
                let entity = Entity::spawn(kind, at, Some(ambient.life), &mut self.rng);
                self.push_entity(entity);
            }
            spawned += n;
        }

        spawned
    }

    fn update_entities(&mut self) {
        let ctx = UpdateContext {
            bounds: self.bounds,
            pointer: self.pointer,
            pointer_radius: self.config.pointer_radius,
            pointer_force: self.config.pointer_force,
        };
        let sources = self.sources.as_slice();
        let coupling = self.config.field_coupling;
        let drift = &self.drift;

        for entity in &mut self.entities {
            if entity.is_field_coupled() {
                let force =
                    sources.influence_at(entity.position) * coupling + drift.influence_at(entity.position);
                entity.apply_force(force);
            }
            entity.advance(&ctx);
            entity.life.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    fn quiet() -> World {
        World::new(SimConfig::quiet(400.0, 300.0)).unwrap()
    }

    fn burst(count: i64, kind: SpawnKind, life: Option<u32>) -> Command {
        Command::SpawnBurst {
            origin: DVec2::new(200.0, 150.0),
            count,
            kind,
            life,
        }
    }

    #[test]
    fn new_rejects_invalid_config() {
        assert!(matches!(
            World::new(SimConfig::quiet(0.0, 100.0)),
            Err(EngineError::InvalidDimensions)
        ));
    }

    #[test]
    fn commands_apply_at_next_tick_start() {
        let mut world = quiet();
        world.enqueue(burst(5, SpawnKind::Mote, None));
        assert!(world.entities().is_empty(), "nothing happens before a tick");
        let report = world.step();
        assert_eq!(report.spawned, 5);
        assert_eq!(world.entities().len(), 5);
        assert_eq!(world.tick(), 1);
    }

    #[test]
    fn burst_beyond_cap_carries_over() {
        let mut world = quiet();
        world.enqueue(burst(1000, SpawnKind::Mote, None));
        let report = world.step();
        assert_eq!(report.spawned, 50);
        assert_eq!(world.entities().len(), 50);
        assert_eq!(world.pending_spawns(), 950);
        assert_eq!(report.pending, 950);

        let report = world.step();
        assert_eq!(report.spawned, 50);
        assert_eq!(world.pending_spawns(), 900);
    }

    #[test]
    fn pending_queue_overflow_is_dropped() {
        let mut config = SimConfig::quiet(400.0, 300.0);
        config.max_pending_spawns = 100;
        let mut world = World::new(config).unwrap();
        world.enqueue(burst(80, SpawnKind::Mote, None));
        world.enqueue(burst(80, SpawnKind::Mote, None));
        let report = world.step();
        assert_eq!(report.dropped_commands, 1);
        assert_eq!(report.spawned, 50);
        assert_eq!(world.pending_spawns(), 50);
    }

    #[test]
    fn entities_expire_after_max_life() {
        let mut world = quiet();
        world.enqueue(burst(10, SpawnKind::Mote, Some(5)));
        for tick in 1..=4 {
            world.step();
            assert_eq!(world.entities().len(), 10, "tick {tick}");
        }
        let report = world.step();
        assert_eq!(report.expired, 10);
        assert!(world.entities().is_empty());
    }

    #[test]
    fn invalid_commands_are_dropped_and_the_tick_proceeds() {
        let mut world = quiet();
        world.enqueue(burst(-1, SpawnKind::Mote, None));
        world.enqueue(Command::WeakenAllSources { factor: f64::NAN });
        world.enqueue(burst(2, SpawnKind::Mote, None));
        let report = world.step();
        assert_eq!(report.dropped_commands, 2);
        assert_eq!(report.spawned, 2);
    }

    #[test]
    fn weaken_halves_strength_without_touching_position_or_life() {
        let mut world = quiet();
        let origin = DVec2::new(100.0, 100.0);
        world.enqueue(Command::SpawnFieldSource {
            origin,
            params: SourceParams::new(SourceTag::GravityWell).with_strength(100.0),
        });
        world.step();
        let life = world.sources()[0].life;
        world.enqueue(Command::WeakenAllSources { factor: 0.5 });
        // Apply the command without advancing anything else.
        for command in world.queue.drain() {
            world.apply(command);
        }
        let well = &world.sources()[0];
        assert_eq!(well.strength, 50.0);
        assert_eq!(well.position, origin);
        assert_eq!(well.life, life);
    }

    #[test]
    fn collapse_eventually_removes_all_sources() {
        let mut world = quiet();
        world.enqueue(Command::Travel {
            origin: DVec2::new(200.0, 150.0),
        });
        world.step();
        assert_eq!(world.sources().len(), 2 + TRAVEL_RING_SIZE);
        world.enqueue(Command::CollapseAllSources);
        for _ in 0..200 {
            world.step();
        }
        assert!(world.sources().is_empty());
    }

    #[test]
    fn travel_queues_rift_motes() {
        let mut world = quiet();
        world.enqueue(Command::Travel {
            origin: DVec2::new(200.0, 150.0),
        });
        let report = world.step();
        assert_eq!(report.spawned, 50);
        let total = TRAVEL_RIFTS * TRAVEL_RIFT_MOTES;
        assert_eq!(world.pending_spawns(), total - 50);
        assert!(world
            .entities()
            .iter()
            .all(|e| matches!(e.kind, EntityKind::RiftMote { .. })));
    }

    #[test]
    fn calibrate_weakens_and_closes_wormholes() {
        let mut world = quiet();
        let origin = DVec2::new(200.0, 150.0);
        world.enqueue(Command::SpawnFieldSource {
            origin,
            params: SourceParams::new(SourceTag::WarpField),
        });
        world.enqueue(Command::SpawnFieldSource {
            origin,
            params: SourceParams::new(SourceTag::Wormhole),
        });
        for _ in 0..30 {
            world.step();
        }
        world.enqueue(Command::Calibrate);
        world.step();
        assert_eq!(world.sources().len(), 2);
        let warp = &world.sources()[0];
        assert!((warp.strength - 0.3).abs() < 1e-12);
        assert!(!warp.is_collapsing());
        assert!(world.sources()[1].is_collapsing());
    }

    #[test]
    fn resize_rebuilds_grid() {
        let mut world = quiet();
        world.enqueue(Command::Resize {
            width: 100.0,
            height: 50.0,
        });
        world.step();
        assert_eq!(world.bounds(), DVec2::new(100.0, 50.0));
        assert_eq!(world.grid().cols(), 4);
        assert_eq!(world.grid().rows(), 3);
    }

    #[test]
    fn oversized_resize_is_dropped_not_fatal() {
        let mut world = quiet();
        for width in [1e300, 1e15] {
            world.enqueue(Command::Resize {
                width,
                height: 10.0,
            });
            let report = world.step();
            assert_eq!(report.dropped_commands, 1);
        }
        assert_eq!(world.bounds(), DVec2::new(400.0, 300.0));
        assert_eq!(world.tick(), 2);
    }

    #[test]
    fn pointer_attracts_motes() {
        let mut world = quiet();
        world.enqueue(burst(1, SpawnKind::Mote, None));
        world.step();
        let before = world.entities()[0].position;
        world.enqueue(Command::PointerMoved {
            position: Some(before + DVec2::new(50.0, 0.0)),
        });
        for _ in 0..20 {
            world.step();
        }
        assert_eq!(world.pointer(), Some(before + DVec2::new(50.0, 0.0)));
        assert!(world.entities()[0].velocity.x > 0.0);
    }

    #[test]
    fn ambient_population_is_replenished_under_cap() {
        let mut config = SimConfig::quiet(400.0, 300.0);
        config.ambient.motes = 70;
        config.ambient.energy = 5;
        let mut world = World::new(config).unwrap();
        let first = world.step();
        assert_eq!(first.spawned, 50);
        let second = world.step();
        assert_eq!(second.spawned, 25);
        assert_eq!(world.entities().len(), 75);
        assert_eq!(world.step().spawned, 0);
    }

    #[test]
    fn spontaneous_warp_appears_with_certain_chance() {
        let mut config = SimConfig::quiet(400.0, 300.0);
        config.spontaneous_warp_chance = 1.0;
        let mut world = World::new(config).unwrap();
        world.step();
        assert_eq!(world.sources().len(), 1);
        assert_eq!(world.sources()[0].tag(), SourceTag::WarpField);
    }

    #[test]
    fn sources_displace_the_grid() {
        let mut world = quiet();
        world.enqueue(Command::SpawnFieldSource {
            origin: DVec2::new(25.0, 25.0),
            params: SourceParams::new(SourceTag::GravityWell).with_strength(1000.0),
        });
        world.step();
        let d = world.grid().displacement(0, 0).unwrap();
        assert!(d.x > 0.0 && d.y > 0.0, "node at origin pulled toward well, got {d}");
    }

    #[test]
    fn sender_delivers_from_another_thread() {
        let mut world = quiet();
        let sender = world.sender();
        std::thread::spawn(move || {
            sender
                .spawn_burst(DVec2::new(1.0, 1.0), 3, SpawnKind::Spark)
                .unwrap();
        })
        .join()
        .unwrap();
        assert_eq!(world.step().spawned, 3);
    }

    fn run(config: SimConfig, ticks: usize) -> Vec<(DVec2, DVec2, u32)> {
        let mut world = World::new(config).unwrap();
        world.enqueue(Command::Travel {
            origin: DVec2::new(300.0, 200.0),
        });
        world.enqueue(burst(40, SpawnKind::Spark, None));
        for t in 0..ticks {
            if t == 20 {
                world.enqueue(Command::Calibrate);
            }
            world.step();
        }
        world
            .entities()
            .iter()
            .map(|e| (e.position, e.velocity, e.life.remaining()))
            .collect()
    }

    #[test]
    fn identical_seed_and_commands_replay_identically() {
        let config = SimConfig::default();
        assert_eq!(run(config.clone(), 60), run(config, 60));
    }

    #[test]
    fn different_seeds_diverge() {
        let mut other = SimConfig::default();
        other.seed = 7;
        assert_ne!(run(SimConfig::default(), 10), run(other, 10));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashMap;

        fn any_command() -> impl Strategy<Value = Command> {
            let point = (0.0_f64..400.0, 0.0_f64..300.0).prop_map(|(x, y)| DVec2::new(x, y));
            let kind = prop::sample::select(SpawnKind::ALL.to_vec());
            prop_oneof![
                (point.clone(), -10i64..300, kind).prop_map(|(origin, count, kind)| {
                    Command::SpawnBurst {
                        origin,
                        count,
                        kind,
                        life: None,
                    }
                }),
                point.clone().prop_map(|origin| Command::SpawnFieldSource {
                    origin,
                    params: SourceParams::new(SourceTag::GravityWell),
                }),
                point.clone().prop_map(|origin| Command::Travel { origin }),
                (0.1_f64..1.0).prop_map(|factor| Command::WeakenAllSources { factor }),
                Just(Command::CollapseAllSources),
                Just(Command::Calibrate),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn spawns_per_tick_never_exceed_cap(
                commands in prop::collection::vec(any_command(), 0..12),
                cap in 1usize..80,
            ) {
                let mut config = SimConfig::quiet(400.0, 300.0);
                config.spawn_cap = cap;
                config.ambient.motes = 40;
                let mut world = World::new(config).unwrap();
                for command in commands {
                    world.enqueue(command);
                }
                for _ in 0..10 {
                    let before = world.entities().len();
                    let report = world.step();
                    prop_assert!(report.spawned <= cap);
                    prop_assert_eq!(world.entities().len(), before + report.spawned - report.expired);
                }
            }

            #[test]
            fn life_is_monotone_and_expired_entities_are_gone(
                commands in prop::collection::vec(any_command(), 1..8),
            ) {
                let mut world = World::new(SimConfig::quiet(400.0, 300.0)).unwrap();
                for command in commands {
                    world.enqueue(command);
                }
                let mut previous: HashMap<u64, u32> = HashMap::new();
                for _ in 0..30 {
                    world.step();
                    let mut current = HashMap::new();
                    for e in world.entities() {
                        prop_assert!(e.life.remaining() > 0, "expired entity still present");
                        prop_assert!(e.life.remaining() < e.life.max());
                        if let Some(&before) = previous.get(&e.id) {
                            prop_assert!(
                                e.life.remaining() < before,
                                "entity {} went from {} to {}", e.id, before, e.life.remaining()
                            );
                        }
                        prop_assert!(e.id > 0);
                        prop_assert!(
                            current.insert(e.id, e.life.remaining()).is_none(),
                            "duplicate id {}", e.id
                        );
                    }
                    previous = current;
                }
            }
        }
    }
}
