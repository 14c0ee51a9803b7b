use std::collections::{BTreeMap, BTreeSet};

use engine::{
    DamageType, EntityId, EntityLifecycle, HealthRegistry, KinematicAgent, NavAgent, SceneWorld,
    SimClock, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::boss::{BossController, BossEvent, BossPhase};
use crate::config::{EncounterConfig, EnemyConfig, PrefabEntry};
use crate::enemy::{EnemyController, EnemyEvent};
use crate::events::SpawnerEvent;
use crate::scheduler::SpawnScheduler;

const SUMMON_POOL_SIZE: u32 = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum EncounterEvent {
    Spawner(SpawnerEvent),
    Boss(BossEvent),
    Enemy { entity: EntityId, event: EnemyEvent },
    /// Pairs with `BossEvent::Summoned` once the summon leaves play.
    SummonDespawned { entity: EntityId },
    TargetDown { entity: EntityId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncounterSnapshot {
    pub tick_count: u64,
    pub elapsed_seconds: f64,
    pub paused: bool,
    pub spawner_running: bool,
    pub alive_enemies: usize,
    pub total_spawned: u32,
    pub boss_phase: Option<BossPhase>,
    pub boss_health_fraction: Option<f32>,
    pub boss_defeated: bool,
}

/// One playable encounter over the headless world: clock, spawner, optional
/// boss and a controller per live enemy.
#[derive(Debug)]
pub struct Encounter {
    world: SceneWorld,
    clock: SimClock,
    scheduler: SpawnScheduler,
    enemy_config: EnemyConfig,
    enemies: BTreeMap<EntityId, EnemyController<KinematicAgent>>,
    boss: Option<BossController<KinematicAgent>>,
    summons: BTreeSet<EntityId>,
    events: Vec<EncounterEvent>,
}

impl Encounter {
    pub fn new(config: EncounterConfig, mut world: SceneWorld) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let auto_start = config.spawner.auto_start;
        let mut scheduler = SpawnScheduler::new(
            config.spawner,
            StdRng::seed_from_u64(rng.gen()),
            &mut world,
        );

        let boss = config.boss.map(|boss_config| {
            if let Some(key) = &boss_config.summon_key {
                if !scheduler.pool().is_registered(key) {
                    let entry = PrefabEntry {
                        key: key.clone(),
                        weight: 0.0,
                        initial_pool_size: 0,
                        max_pool_size: SUMMON_POOL_SIZE,
                    };
                    scheduler.pool_mut().register_prefab(&entry, &mut world);
                }
            }
            let body = world.spawn_actor(boss_config.spawn, boss_config.body_radius);
            let nav = KinematicAgent::new(boss_config.spawn.position);
            BossController::new(body, boss_config, nav, StdRng::seed_from_u64(rng.gen()))
        });

        if auto_start {
            scheduler.start();
        }
        info!(
            seed = ?config.seed,
            boss = boss.is_some(),
            auto_start,
            "encounter_ready"
        );

        Self {
            world,
            clock: SimClock::default(),
            scheduler,
            enemy_config: config.enemy,
            enemies: BTreeMap::new(),
            boss,
            summons: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    /// Advances one frame of real time. Returns the scaled step that was
    /// simulated; zero while paused.
    pub fn tick(&mut self, real_dt_seconds: f32) -> f32 {
        let dt = self.clock.advance(real_dt_seconds);
        if dt <= 0.0 {
            return 0.0;
        }

        self.scheduler.tick(dt, &mut self.world);
        self.tick_boss(dt);
        self.collect_spawner_events();
        self.tick_enemies(dt);
        self.recycle_dead();
        self.collect_spawner_events();
        dt
    }

    fn tick_boss(&mut self, dt: f32) {
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        boss.tick(dt, &mut self.world, Some(self.scheduler.pool_mut()));
        boss.nav_mut().step(dt);
        self.world.set_position(boss.entity(), boss.nav().position());

        for event in boss.drain_events() {
            match &event {
                BossEvent::Summoned { entity, position } => {
                    self.summons.insert(*entity);
                    self.enemies.insert(
                        *entity,
                        EnemyController::new(
                            *entity,
                            self.enemy_config.clone(),
                            KinematicAgent::new(*position),
                        ),
                    );
                }
                BossEvent::Defeated => {
                    if let Err(error) = self.world.deactivate(boss.entity()) {
                        warn!(%error, "boss_body_missing");
                    }
                }
                _ => {}
            }
            self.events.push(EncounterEvent::Boss(event));
        }
    }

    fn tick_enemies(&mut self, dt: f32) {
        for (entity, enemy) in self.enemies.iter_mut() {
            enemy.tick(dt, &mut self.world);
            enemy.nav_mut().step(dt);
            self.world.set_position(*entity, enemy.nav().position());
            for event in enemy.drain_events() {
                self.events.push(EncounterEvent::Enemy {
                    entity: *entity,
                    event,
                });
            }
        }
    }

    fn recycle_dead(&mut self) {
        for entity in self.world.drain_deaths() {
            let had_controller = self.enemies.remove(&entity).is_some();
            if self.scheduler.notify_despawned(entity, &mut self.world) {
                if self.summons.remove(&entity) {
                    self.events.push(EncounterEvent::SummonDespawned { entity });
                }
                continue;
            }
            if had_controller {
                debug!(entity = entity.0, "enemy_died_outside_pool");
                continue;
            }
            info!(entity = entity.0, "target_down");
            self.events.push(EncounterEvent::TargetDown { entity });
        }
    }

    fn collect_spawner_events(&mut self) {
        for event in self.scheduler.drain_events() {
            if let SpawnerEvent::EntitySpawned {
                entity, position, ..
            } = &event
            {
                self.enemies.insert(
                    *entity,
                    EnemyController::new(
                        *entity,
                        self.enemy_config.clone(),
                        KinematicAgent::new(*position),
                    ),
                );
            }
            self.events.push(EncounterEvent::Spawner(event));
        }
    }

    /// Routes damage to the boss (through its resistances) or to the world's
    /// health registry. Returns `false` when nothing could take the hit.
    pub fn apply_damage(&mut self, entity: EntityId, amount: f32, kind: DamageType) -> bool {
        if let Some(boss) = self.boss.as_mut().filter(|boss| boss.entity() == entity) {
            boss.take_damage(amount, kind);
            return true;
        }
        let Some(sink) = self.world.health_sink(entity) else {
            warn!(entity = entity.0, "damage_target_without_health");
            return false;
        };
        sink.apply_damage(amount, kind);
        true
    }

    pub fn apply_freeze(
        &mut self,
        entity: EntityId,
        slow_fraction: f32,
        duration_seconds: f32,
    ) -> bool {
        if let Some(boss) = self.boss.as_mut().filter(|boss| boss.entity() == entity) {
            boss.apply_freeze(slow_fraction, duration_seconds);
            return true;
        }
        let Some(enemy) = self.enemies.get_mut(&entity) else {
            return false;
        };
        enemy.apply_freeze(slow_fraction, duration_seconds);
        true
    }

    /// Stops spawning and returns every live enemy, summons included, to the
    /// pool. Pooled instances stay warm for a later `start`.
    pub fn clear_field(&mut self) -> usize {
        self.enemies.clear();
        let released = self.scheduler.release_all(&mut self.world);
        self.report_summons_gone();
        self.collect_spawner_events();
        released
    }

    /// Stops spawning and destroys every pooled instance.
    pub fn shutdown(&mut self) -> usize {
        self.enemies.clear();
        let destroyed = self.scheduler.despawn_all(&mut self.world);
        self.report_summons_gone();
        self.collect_spawner_events();
        destroyed
    }

    fn report_summons_gone(&mut self) {
        for entity in std::mem::take(&mut self.summons) {
            self.events.push(EncounterEvent::SummonDespawned { entity });
        }
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.clock.set_time_scale(time_scale);
    }

    pub fn drain_events(&mut self) -> Vec<EncounterEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            tick_count: self.clock.tick_count(),
            elapsed_seconds: self.clock.elapsed_seconds(),
            paused: self.clock.is_paused(),
            spawner_running: self.scheduler.is_running(),
            alive_enemies: self.enemies.len(),
            total_spawned: self.scheduler.total_spawned(),
            boss_phase: self.boss.as_ref().map(BossController::phase),
            boss_health_fraction: self.boss.as_ref().map(|boss| boss.health().fraction()),
            boss_defeated: self.boss.as_ref().is_some_and(BossController::is_defeated),
        }
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub fn scheduler(&self) -> &SpawnScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut SpawnScheduler {
        &mut self.scheduler
    }

    pub fn boss(&self) -> Option<&BossController<KinematicAgent>> {
        self.boss.as_ref()
    }

    pub fn enemy(&self, entity: EntityId) -> Option<&EnemyController<KinematicAgent>> {
        self.enemies.get(&entity)
    }

    pub fn enemy_ids(&self) -> Vec<EntityId> {
        self.enemies.keys().copied().collect()
    }

    pub fn enemy_positions(&self) -> Vec<(EntityId, Vec3)> {
        self.enemies
            .iter()
            .map(|(entity, enemy)| (*entity, enemy.nav().position()))
            .collect()
    }
}
