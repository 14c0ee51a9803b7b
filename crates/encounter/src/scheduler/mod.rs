mod curve;
mod placement;
mod selection;

use std::collections::BTreeSet;

use engine::{EntityId, EntityLifecycle, SpatialQuery, TaskId, Tasks, Wait};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, trace, warn};

pub use self::curve::{CurveKey, RateCurve};
pub use self::placement::{resolve_spawn_transform, scatter_around};
pub use self::selection::{pick_weighted, pick_with_roll, total_weight};
use crate::config::{PrefabEntry, SpawnMode, SpawnerConfig};
use crate::events::{SpawnerEvent, SpawnerEventBus, SpawnerEventCounts};
use crate::pool::SpawnPool;

pub const MIN_SPAWN_INTERVAL_SECONDS: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaveStage {
    Announce,
    Spawning,
    Settle,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WaveCursor {
    wave_index: usize,
    spawned_in_wave: u32,
    stage: WaveStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpawnRoutine {
    Continuous,
    Waves(WaveCursor),
}

/// Decides when and what to spawn, and owns the pool its instances come from.
#[derive(Debug)]
pub struct SpawnScheduler {
    config: SpawnerConfig,
    selectable: Vec<PrefabEntry>,
    pool: SpawnPool,
    rng: StdRng,
    running: bool,
    elapsed_seconds: f32,
    total_spawned: u32,
    active: BTreeSet<EntityId>,
    routines: Tasks<SpawnRoutine>,
    events: SpawnerEventBus,
    zero_weight_warned: bool,
}

impl SpawnScheduler {
    /// Registers every configured prefab with a fresh pool. Entries the world has
    /// no template for are skipped with a warning.
    pub fn new<L>(config: SpawnerConfig, rng: StdRng, lifecycle: &mut L) -> Self
    where
        L: EntityLifecycle + ?Sized,
    {
        let mut pool = SpawnPool::default();
        let mut selectable = Vec::with_capacity(config.prefabs.len());
        for entry in &config.prefabs {
            if pool.register_prefab(entry, lifecycle) {
                selectable.push(entry.clone());
            }
        }
        if total_weight(&selectable) <= 0.0 && config.mode != SpawnMode::Manual {
            warn!(prefab_count = selectable.len(), "spawner_has_no_selectable_prefab");
        }
        Self {
            config,
            selectable,
            pool,
            rng,
            running: false,
            elapsed_seconds: 0.0,
            total_spawned: 0,
            active: BTreeSet::new(),
            routines: Tasks::default(),
            events: SpawnerEventBus::default(),
            zero_weight_warned: false,
        }
    }

    pub fn start(&mut self) {
        if self.running {
            debug!("spawner_already_running");
            return;
        }
        self.running = true;
        self.elapsed_seconds = 0.0;
        match self.config.mode {
            SpawnMode::Continuous => {
                self.routines.spawn(SpawnRoutine::Continuous, Wait::NextTick);
            }
            SpawnMode::Waves => {
                let cursor = WaveCursor {
                    wave_index: 0,
                    spawned_in_wave: 0,
                    stage: WaveStage::Announce,
                };
                self.routines.spawn(
                    SpawnRoutine::Waves(cursor),
                    Wait::Seconds(self.config.waves.start_delay),
                );
            }
            SpawnMode::Manual => {}
        }
        info!(mode = ?self.config.mode, "spawner_started");
    }

    /// Drops every pending routine immediately. Spawned entities stay alive.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        let cancelled = self.routines.cancel_all();
        self.running = false;
        info!(
            cancelled_routines = cancelled,
            total_spawned = self.total_spawned,
            "spawner_stopped"
        );
    }

    pub fn should_spawn_next(&self) -> bool {
        let max_alive = self.config.max_alive;
        let limit = self.config.total_spawn_limit;
        self.running
            && (max_alive <= 0 || self.active.len() < max_alive as usize)
            && (limit <= 0 || self.total_spawned < limit as u32)
    }

    pub fn try_spawn_one<W>(&mut self, world: &mut W) -> Option<EntityId>
    where
        W: EntityLifecycle + SpatialQuery + ?Sized,
    {
        if !self.should_spawn_next() {
            trace!(active = self.active.len(), "spawn_suppressed");
            return None;
        }
        let Some(entry) = pick_weighted(&self.selectable, &mut self.rng) else {
            if !self.zero_weight_warned {
                self.zero_weight_warned = true;
                warn!("spawn_skipped_zero_total_weight");
            }
            return None;
        };
        let key = entry.key.clone();
        let transform = resolve_spawn_transform(&self.config, &*world, &mut self.rng);

        match self.pool.acquire(&key, transform, world) {
            Ok(entity) => {
                self.active.insert(entity);
                self.total_spawned = self.total_spawned.saturating_add(1);
                debug!(
                    entity = entity.0,
                    key = %key,
                    active = self.active.len(),
                    total_spawned = self.total_spawned,
                    "entity_spawned"
                );
                self.events.emit(SpawnerEvent::EntitySpawned {
                    entity,
                    key,
                    position: transform.position,
                });
                Some(entity)
            }
            Err(error) => {
                warn!(key = %key, %error, "spawn_failed");
                None
            }
        }
    }

    pub fn tick<W>(&mut self, dt_seconds: f32, world: &mut W)
    where
        W: EntityLifecycle + SpatialQuery + ?Sized,
    {
        if !self.running || !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return;
        }
        self.elapsed_seconds += dt_seconds;

        for (id, routine) in self.routines.advance(dt_seconds) {
            let (next, wait) = match routine {
                SpawnRoutine::Continuous => {
                    self.try_spawn_one(world);
                    (
                        SpawnRoutine::Continuous,
                        Wait::Seconds(self.next_continuous_interval()),
                    )
                }
                SpawnRoutine::Waves(cursor) => {
                    let (cursor, wait) = self.step_waves(cursor, world);
                    (SpawnRoutine::Waves(cursor), wait)
                }
            };
            if self.routines.resume(id, next, wait) && wait == Wait::Done {
                self.finish_plan(id);
            }
        }
    }

    fn finish_plan(&mut self, id: TaskId) {
        if !self.routines.is_empty() {
            return;
        }
        self.running = false;
        info!(
            routine = ?id,
            total_spawned = self.total_spawned,
            "spawner_plan_complete"
        );
    }

    fn next_continuous_interval(&mut self) -> f32 {
        let continuous = &self.config.continuous;
        let normalized_time = if continuous.difficulty_time > 0.0 {
            (self.elapsed_seconds / continuous.difficulty_time).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let rate = continuous
            .rate_curve
            .evaluate(normalized_time)
            .max(MIN_SPAWN_INTERVAL_SECONDS);
        let interval = continuous.base_interval * rate;
        let spread = continuous.interval_variance.max(0.0) * interval;
        let jitter = if spread > 0.0 {
            self.rng.gen_range(-spread..=spread)
        } else {
            0.0
        };
        (interval + jitter).max(MIN_SPAWN_INTERVAL_SECONDS)
    }

    fn step_waves<W>(&mut self, mut cursor: WaveCursor, world: &mut W) -> (WaveCursor, Wait)
    where
        W: EntityLifecycle + SpatialQuery + ?Sized,
    {
        loop {
            match cursor.stage {
                WaveStage::Announce => {
                    let Some(&enemy_count) = self.config.waves.counts.get(cursor.wave_index) else {
                        cursor.stage = WaveStage::Complete;
                        return (cursor, Wait::Done);
                    };
                    info!(wave_index = cursor.wave_index, enemy_count, "wave_started");
                    self.events.emit(SpawnerEvent::WaveStarted {
                        wave_index: cursor.wave_index,
                        enemy_count,
                    });
                    cursor.spawned_in_wave = 0;
                    cursor.stage = WaveStage::Spawning;
                }
                WaveStage::Spawning => {
                    let enemy_count = self
                        .config
                        .waves
                        .counts
                        .get(cursor.wave_index)
                        .copied()
                        .unwrap_or(0);
                    if cursor.spawned_in_wave < enemy_count {
                        if self.try_spawn_one(world).is_none() {
                            return (cursor, Wait::NextTick);
                        }
                        cursor.spawned_in_wave = cursor.spawned_in_wave.saturating_add(1);
                    }
                    if cursor.spawned_in_wave >= enemy_count {
                        cursor.stage = WaveStage::Settle;
                        return (cursor, Wait::Seconds(self.config.waves.time_between_waves));
                    }
                    return (cursor, Wait::Seconds(self.config.waves.spawn_interval));
                }
                WaveStage::Settle => {
                    info!(wave_index = cursor.wave_index, "wave_completed");
                    self.events.emit(SpawnerEvent::WaveCompleted {
                        wave_index: cursor.wave_index,
                    });
                    cursor.wave_index = cursor.wave_index.saturating_add(1);
                    cursor.stage = WaveStage::Announce;
                }
                WaveStage::Complete => return (cursor, Wait::Done),
            }
        }
    }

    /// Returns a spawned (or pool-acquired) instance to the pool. `false` when
    /// the entity is not one of ours. Only instances this scheduler spawned
    /// emit `EntityDespawned`; other pool users report their own.
    pub fn notify_despawned<L>(&mut self, entity: EntityId, lifecycle: &mut L) -> bool
    where
        L: EntityLifecycle + ?Sized,
    {
        let tracked = self.active.remove(&entity);
        if !tracked && !self.pool.is_active(entity) {
            return false;
        }
        let outcome = self.pool.release(entity, lifecycle);
        debug!(entity = entity.0, tracked, ?outcome, "entity_despawned");
        if tracked {
            self.events.emit(SpawnerEvent::EntityDespawned { entity });
        }
        true
    }

    fn emit_tracked_despawns(&mut self) {
        for entity in std::mem::take(&mut self.active) {
            self.events.emit(SpawnerEvent::EntityDespawned { entity });
        }
    }

    /// Stops spawning and returns every active instance to the pool.
    pub fn release_all<L>(&mut self, lifecycle: &mut L) -> usize
    where
        L: EntityLifecycle + ?Sized,
    {
        self.stop();
        self.emit_tracked_despawns();
        let released = self.pool.force_release_all(lifecycle);
        info!(released, "spawner_released_all");
        released
    }

    /// Stops and destroys everything the pool owns.
    pub fn despawn_all<L>(&mut self, lifecycle: &mut L) -> usize
    where
        L: EntityLifecycle + ?Sized,
    {
        self.stop();
        self.emit_tracked_despawns();
        let destroyed = self.pool.despawn_all(lifecycle);
        info!(destroyed, "spawner_despawned_all");
        destroyed
    }

    pub fn drain_events(&mut self) -> Vec<SpawnerEvent> {
        self.events.drain()
    }

    pub fn last_event_counts(&self) -> SpawnerEventCounts {
        self.events.last_drain_counts()
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    pub fn mode(&self) -> SpawnMode {
        self.config.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    pub fn total_spawned(&self) -> u32 {
        self.total_spawned
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_tracked(&self, entity: EntityId) -> bool {
        self.active.contains(&entity)
    }

    pub fn active_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.active.iter().copied()
    }

    pub fn pending_routines(&self) -> usize {
        self.routines.len()
    }

    /// Shortest remaining wait among pending routines.
    pub fn next_wait_seconds(&self) -> Option<f32> {
        let mut shortest: Option<f32> = None;
        for id in self.routines.ids() {
            if let Some(remaining) = self.routines.remaining_seconds(id) {
                shortest = Some(shortest.map_or(remaining, |current| current.min(remaining)));
            }
        }
        shortest
    }

    pub fn pool(&self) -> &SpawnPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut SpawnPool {
        &mut self.pool
    }
}

#[cfg(test)]
mod tests {
    use engine::{EntityTemplate, PrefabKey, SceneWorld};
    use rand::SeedableRng;

    use super::*;
    use crate::config::{ContinuousConfig, WaveConfig};
    use crate::events::SpawnerEventKind;

    const DT: f32 = 0.1;

    fn grunt_world() -> SceneWorld {
        let mut world = SceneWorld::with_ground(0.0);
        world.register_template(PrefabKey::new("grunt"), EntityTemplate::default());
        world
    }

    fn base_config(mode: SpawnMode) -> SpawnerConfig {
        SpawnerConfig {
            mode,
            prefabs: vec![PrefabEntry::new("grunt", 1.0).with_pool(2, 8)],
            max_alive: 0,
            continuous: ContinuousConfig {
                base_interval: 1.0,
                interval_variance: 0.0,
                ..ContinuousConfig::default()
            },
            ..SpawnerConfig::default()
        }
    }

    fn scheduler(config: SpawnerConfig, world: &mut SceneWorld) -> SpawnScheduler {
        SpawnScheduler::new(config, StdRng::seed_from_u64(11), world)
    }

    #[test]
    fn max_alive_caps_concurrent_spawns() {
        let mut world = grunt_world();
        let mut scheduler = scheduler(
            SpawnerConfig {
                max_alive: 2,
                ..base_config(SpawnMode::Manual)
            },
            &mut world,
        );
        scheduler.start();

        assert!(scheduler.try_spawn_one(&mut world).is_some());
        assert!(scheduler.try_spawn_one(&mut world).is_some());
        assert!(scheduler.try_spawn_one(&mut world).is_none());
        assert_eq!(scheduler.active_count(), 2);
        assert_eq!(scheduler.total_spawned(), 2);
    }

    #[test]
    fn total_limit_is_respected_after_despawns() {
        let mut world = grunt_world();
        let mut scheduler = scheduler(
            SpawnerConfig {
                total_spawn_limit: 1,
                ..base_config(SpawnMode::Manual)
            },
            &mut world,
        );
        scheduler.start();

        let first = scheduler.try_spawn_one(&mut world).expect("first spawn");
        assert!(scheduler.notify_despawned(first, &mut world));
        assert!(!scheduler.should_spawn_next());
        assert!(scheduler.try_spawn_one(&mut world).is_none());
    }

    #[test]
    fn idle_scheduler_never_spawns() {
        let mut world = grunt_world();
        let mut scheduler = scheduler(base_config(SpawnMode::Manual), &mut world);
        assert!(scheduler.try_spawn_one(&mut world).is_none());
    }

    #[test]
    fn continuous_mode_spawns_on_interval() {
        let mut world = grunt_world();
        let mut scheduler = scheduler(base_config(SpawnMode::Continuous), &mut world);
        scheduler.start();

        scheduler.tick(DT, &mut world);
        assert_eq!(scheduler.total_spawned(), 1);

        for _ in 0..9 {
            scheduler.tick(DT, &mut world);
        }
        assert_eq!(scheduler.total_spawned(), 1);
        scheduler.tick(DT, &mut world);
        assert_eq!(scheduler.total_spawned(), 2);
    }

    #[test]
    fn paused_ticks_do_not_advance_spawn_interval() {
        let mut world = grunt_world();
        let mut scheduler = scheduler(base_config(SpawnMode::Continuous), &mut world);
        scheduler.start();
        scheduler.tick(DT, &mut world);
        let remaining = scheduler.next_wait_seconds();
        let elapsed = scheduler.elapsed_seconds();

        for _ in 0..100 {
            scheduler.tick(0.0, &mut world);
        }
        assert_eq!(scheduler.next_wait_seconds(), remaining);
        assert_eq!(scheduler.elapsed_seconds(), elapsed);
        assert_eq!(scheduler.total_spawned(), 1);
    }

    #[test]
    fn start_is_noop_when_running_and_stop_cancels_routines() {
        let mut world = grunt_world();
        let mut scheduler = scheduler(base_config(SpawnMode::Continuous), &mut world);
        scheduler.start();
        scheduler.start();
        assert_eq!(scheduler.pending_routines(), 1);

        scheduler.tick(DT, &mut world);
        let spawned = scheduler.active_entities().collect::<Vec<_>>();
        scheduler.stop();
        assert_eq!(scheduler.pending_routines(), 0);
        for _ in 0..50 {
            scheduler.tick(DT, &mut world);
        }
        assert_eq!(scheduler.total_spawned(), 1);
        assert!(spawned.iter().all(|entity| world.is_active(*entity)));
    }

    #[test]
    fn interval_follows_rate_curve() {
        let mut world = grunt_world();
        let mut config = base_config(SpawnMode::Continuous);
        config.continuous.base_interval = 2.0;
        config.continuous.difficulty_time = 10.0;
        config.continuous.rate_curve = RateCurve::new(vec![
            CurveKey {
                time: 0.0,
                value: 1.0,
            },
            CurveKey {
                time: 1.0,
                value: 0.25,
            },
        ]);
        let mut scheduler = scheduler(config, &mut world);
        scheduler.start();
        scheduler.elapsed_seconds = 10.0;
        assert!((scheduler.next_continuous_interval() - 0.5).abs() < 1e-6);
        scheduler.elapsed_seconds = 0.0;
        assert!((scheduler.next_continuous_interval() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn waves_run_in_order_and_finish_idle() {
        let mut world = grunt_world();
        let config = SpawnerConfig {
            waves: WaveConfig {
                counts: vec![2, 1],
                start_delay: 1.0,
                spawn_interval: 0.5,
                time_between_waves: 2.0,
            },
            ..base_config(SpawnMode::Waves)
        };
        let mut scheduler = scheduler(config, &mut world);
        scheduler.start();

        let mut kinds = Vec::new();
        for _ in 0..11 {
            scheduler.tick(0.5, &mut world);
            kinds.extend(scheduler.drain_events().iter().map(SpawnerEvent::kind));
        }

        assert_eq!(
            kinds,
            vec![
                SpawnerEventKind::WaveStarted,
                SpawnerEventKind::EntitySpawned,
                SpawnerEventKind::EntitySpawned,
                SpawnerEventKind::WaveCompleted,
                SpawnerEventKind::WaveStarted,
                SpawnerEventKind::EntitySpawned,
                SpawnerEventKind::WaveCompleted,
            ]
        );
        assert_eq!(scheduler.total_spawned(), 3);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn wave_waits_for_capacity() {
        let mut world = grunt_world();
        let config = SpawnerConfig {
            max_alive: 1,
            waves: WaveConfig {
                counts: vec![2],
                start_delay: 0.0,
                spawn_interval: 0.0,
                time_between_waves: 5.0,
            },
            ..base_config(SpawnMode::Waves)
        };
        let mut scheduler = scheduler(config, &mut world);
        scheduler.start();

        scheduler.tick(DT, &mut world);
        assert_eq!(scheduler.total_spawned(), 1);
        for _ in 0..5 {
            scheduler.tick(DT, &mut world);
        }
        assert_eq!(scheduler.total_spawned(), 1);

        let first = scheduler.active_entities().next().expect("first");
        scheduler.notify_despawned(first, &mut world);
        scheduler.tick(DT, &mut world);
        assert_eq!(scheduler.total_spawned(), 2);
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn despawn_notification_recycles_instance() {
        let mut world = grunt_world();
        let mut scheduler = scheduler(base_config(SpawnMode::Manual), &mut world);
        scheduler.start();
        let entity = scheduler.try_spawn_one(&mut world).expect("spawn");
        scheduler.drain_events();

        assert!(scheduler.notify_despawned(entity, &mut world));
        assert!(!scheduler.notify_despawned(entity, &mut world));
        assert!(!world.is_active(entity));
        assert_eq!(
            scheduler.drain_events(),
            vec![SpawnerEvent::EntityDespawned { entity }]
        );
        assert_eq!(scheduler.last_event_counts().entity_despawned, 1);
    }

    #[test]
    fn stop_mid_wave_restarts_plan_from_first_wave() {
        let mut world = grunt_world();
        let config = SpawnerConfig {
            waves: WaveConfig {
                counts: vec![3, 2],
                start_delay: 0.0,
                spawn_interval: 1.0,
                time_between_waves: 2.0,
            },
            ..base_config(SpawnMode::Waves)
        };
        let mut scheduler = scheduler(config, &mut world);
        scheduler.start();
        scheduler.tick(DT, &mut world);
        assert_eq!(scheduler.total_spawned(), 1);

        scheduler.stop();
        scheduler.drain_events();
        for _ in 0..30 {
            scheduler.tick(DT, &mut world);
        }
        assert_eq!(scheduler.total_spawned(), 1);

        scheduler.start();
        scheduler.tick(DT, &mut world);
        let events = scheduler.drain_events();
        assert_eq!(
            events.first(),
            Some(&SpawnerEvent::WaveStarted {
                wave_index: 0,
                enemy_count: 3,
            })
        );
        assert_eq!(scheduler.total_spawned(), 2);
    }

    #[test]
    fn total_limit_caps_continuous_ticks() {
        let mut world = grunt_world();
        let mut scheduler = scheduler(
            SpawnerConfig {
                total_spawn_limit: 3,
                ..base_config(SpawnMode::Continuous)
            },
            &mut world,
        );
        scheduler.start();
        for _ in 0..100 {
            scheduler.tick(DT, &mut world);
        }
        assert_eq!(scheduler.total_spawned(), 3);

        let first = scheduler.active_entities().next().expect("spawned");
        scheduler.notify_despawned(first, &mut world);
        for _ in 0..50 {
            scheduler.tick(DT, &mut world);
        }
        assert_eq!(scheduler.total_spawned(), 3);
        assert_eq!(scheduler.active_count(), 2);
    }

    #[test]
    fn total_limit_holds_wave_short_of_its_count() {
        let mut world = grunt_world();
        let config = SpawnerConfig {
            total_spawn_limit: 2,
            waves: WaveConfig {
                counts: vec![5],
                start_delay: 0.0,
                spawn_interval: 0.0,
                time_between_waves: 1.0,
            },
            ..base_config(SpawnMode::Waves)
        };
        let mut scheduler = scheduler(config, &mut world);
        scheduler.start();
        for _ in 0..50 {
            scheduler.tick(DT, &mut world);
        }
        assert_eq!(scheduler.total_spawned(), 2);
        let completed = scheduler
            .drain_events()
            .iter()
            .filter(|event| event.kind() == SpawnerEventKind::WaveCompleted)
            .count();
        assert_eq!(completed, 0);
    }

    #[test]
    fn foreign_pool_instances_recycle_without_spawner_events() {
        let mut world = grunt_world();
        world.register_template(PrefabKey::new("imp"), EntityTemplate::default());
        let mut scheduler = scheduler(base_config(SpawnMode::Manual), &mut world);
        scheduler
            .pool_mut()
            .register_prefab(&PrefabEntry::new("imp", 0.0), &mut world);
        let summon = scheduler
            .pool_mut()
            .acquire(&PrefabKey::new("imp"), engine::Transform::default(), &mut world)
            .expect("summon");

        assert!(scheduler.notify_despawned(summon, &mut world));
        assert!(!world.is_active(summon));
        assert!(scheduler.drain_events().is_empty());
        assert_eq!(scheduler.pool().active_count(), 0);
    }

    #[test]
    fn release_all_stops_and_pools_everything() {
        let mut world = grunt_world();
        world.register_template(PrefabKey::new("imp"), EntityTemplate::default());
        let mut scheduler = scheduler(base_config(SpawnMode::Continuous), &mut world);
        scheduler
            .pool_mut()
            .register_prefab(&PrefabEntry::new("imp", 0.0), &mut world);
        scheduler
            .pool_mut()
            .acquire(&PrefabKey::new("imp"), engine::Transform::default(), &mut world)
            .expect("summon");
        scheduler.start();
        scheduler.tick(DT, &mut world);
        let spawned = scheduler.active_entities().collect::<Vec<_>>();
        scheduler.drain_events();

        assert_eq!(scheduler.release_all(&mut world), 2);
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.active_count(), 0);
        assert_eq!(scheduler.pool().active_count(), 0);
        assert!(spawned.iter().all(|entity| !world.is_active(*entity)));
        assert_eq!(
            scheduler.drain_events(),
            vec![SpawnerEvent::EntityDespawned { entity: spawned[0] }]
        );
    }

    #[test]
    fn despawn_all_stops_and_destroys() {
        let mut world = grunt_world();
        let mut scheduler = scheduler(base_config(SpawnMode::Continuous), &mut world);
        scheduler.start();
        scheduler.tick(DT, &mut world);

        assert_eq!(scheduler.despawn_all(&mut world), 2);
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.active_count(), 0);
        assert_eq!(world.entity_count(), 0);
    }
}
