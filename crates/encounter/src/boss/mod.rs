//! Health-driven boss controller.
//!
//! The phase is re-evaluated once per tick from the health fraction. Each phase
//! owns an attack routine (and phase 3 a summon routine) on the controller's
//! task runner; leaving a phase cancels its routines synchronously.

mod phase;

use engine::{
    Countdown, DamageType, EntityId, EntityLifecycle, Health, HealthRegistry, HealthSink,
    NavAgent, SimWorld, SpatialQuery, TargetInfo, TaskId, Tasks, Transform, Vec3, Wait,
};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

pub use self::phase::BossPhase;
use crate::config::BossConfig;
use crate::pool::SpawnPool;
use crate::resistance::apply_resistance;
use crate::scheduler::scatter_around;
use crate::status::{effective_speed, StatusEffect};

#[derive(Debug, Clone, Copy, PartialEq)]
enum RangedStage {
    Ready,
    Resolving { point: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BossRoutine {
    Ranged(RangedStage),
    Melee,
    Summon,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BossEvent {
    PhaseChanged { from: BossPhase, to: BossPhase },
    ProjectileFired { target: EntityId, hit: bool },
    StrikeTelegraphed { point: Vec3 },
    StrikeResolved { point: Vec3, hit: bool },
    MeleeHit { target: EntityId },
    Dodged { from: Vec3, to: Vec3 },
    Summoned { entity: EntityId, position: Vec3 },
    DamageTaken { kind: DamageType, raw: f32, applied: f32 },
    Defeated,
}

#[derive(Debug)]
pub struct BossController<N: NavAgent> {
    entity: EntityId,
    config: BossConfig,
    nav: N,
    rng: StdRng,
    health: Health,
    phase: BossPhase,
    phase_speed_multiplier: f32,
    status: StatusEffect,
    tasks: Tasks<BossRoutine>,
    attack_task: Option<TaskId>,
    summon_task: Option<TaskId>,
    dodge_cooldown: Countdown,
    target: Option<TargetInfo>,
    defeated: bool,
    events: Vec<BossEvent>,
}

impl<N: NavAgent> BossController<N> {
    pub fn new(entity: EntityId, mut config: BossConfig, nav: N, rng: StdRng) -> Self {
        sanitize_cadence(entity, &mut config);
        let health = Health::new(config.max_health);
        let mut boss = Self {
            entity,
            config,
            nav,
            rng,
            health,
            phase: BossPhase::Phase1Ranged,
            phase_speed_multiplier: 1.0,
            status: StatusEffect::default(),
            tasks: Tasks::default(),
            attack_task: None,
            summon_task: None,
            dodge_cooldown: Countdown::default(),
            target: None,
            defeated: false,
            events: Vec::new(),
        };
        boss.initialize_phase(BossPhase::Phase1Ranged);
        info!(
            entity = entity.0,
            max_health = boss.health.max(),
            "boss_spawned"
        );
        boss
    }

    pub fn tick<W>(
        &mut self,
        dt_seconds: f32,
        world: &mut W,
        mut summon_pool: Option<&mut SpawnPool>,
    ) where
        W: SimWorld + ?Sized,
    {
        if self.defeated || !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return;
        }
        self.status.tick(dt_seconds);
        self.dodge_cooldown.tick(dt_seconds);
        self.evaluate_phase();

        let Some(target) = world.locate_target(self.nav.position(), self.config.detection_radius)
        else {
            if self.target.take().is_some() {
                debug!(entity = self.entity.0, "boss_target_lost");
            }
            self.nav.hold_position();
            return;
        };
        self.target = Some(target);
        self.nav.set_destination(target.position, self.current_speed());

        if self.phase == BossPhase::Phase3MeleeSummon {
            self.try_dodge(target);
        }

        for (id, routine) in self.tasks.advance(dt_seconds) {
            let (next, wait) = match routine {
                BossRoutine::Ranged(stage) => {
                    let (stage, wait) = self.run_ranged(stage, target, world);
                    (BossRoutine::Ranged(stage), wait)
                }
                BossRoutine::Melee => (BossRoutine::Melee, self.run_melee(target, world)),
                BossRoutine::Summon => (
                    BossRoutine::Summon,
                    self.run_summon(world, summon_pool.as_deref_mut()),
                ),
            };
            self.tasks.resume(id, next, wait);
        }
    }

    /// Applies the transition rule for the current health fraction. Returns
    /// `true` when the phase changed.
    pub fn evaluate_phase(&mut self) -> bool {
        let target = BossPhase::for_health_fraction(
            self.health.fraction(),
            self.config.phase2_threshold,
            self.config.phase3_threshold,
        );
        self.enter_phase(target)
    }

    /// Entering the current phase is a no-op.
    fn enter_phase(&mut self, next: BossPhase) -> bool {
        if next == self.phase || self.defeated {
            return false;
        }
        if let Some(task) = self.attack_task.take() {
            self.tasks.cancel(task);
        }
        if self.phase == BossPhase::Phase3MeleeSummon {
            if let Some(task) = self.summon_task.take() {
                self.tasks.cancel(task);
            }
        }
        let previous = self.phase;
        self.phase = next;
        self.initialize_phase(next);
        info!(
            entity = self.entity.0,
            from = %previous,
            to = %next,
            health_fraction = self.health.fraction(),
            "boss_phase_changed"
        );
        self.events.push(BossEvent::PhaseChanged {
            from: previous,
            to: next,
        });
        true
    }

    fn initialize_phase(&mut self, phase: BossPhase) {
        if phase.is_ranged() {
            self.nav
                .set_stopping_distance(self.config.ranged_stopping_distance);
            self.phase_speed_multiplier = 1.0;
            self.attack_task = Some(
                self.tasks
                    .spawn(BossRoutine::Ranged(RangedStage::Ready), Wait::NextTick),
            );
            return;
        }

        self.nav
            .set_stopping_distance(self.config.melee_stopping_distance);
        self.phase_speed_multiplier = self.config.melee_speed_multiplier;
        self.attack_task = Some(self.tasks.spawn(BossRoutine::Melee, Wait::NextTick));
        if self.config.summon_key.is_some() {
            self.summon_task = Some(self.tasks.spawn(
                BossRoutine::Summon,
                Wait::Seconds(self.config.summon_interval),
            ));
        }
    }

    fn run_ranged<W>(
        &mut self,
        stage: RangedStage,
        target: TargetInfo,
        world: &mut W,
    ) -> (RangedStage, Wait)
    where
        W: SpatialQuery + HealthRegistry + ?Sized,
    {
        let attack_interval = 1.0 / self.config.fire_rate;
        match stage {
            RangedStage::Ready => {
                if self.nav.position().distance(target.position) > self.config.attack_range {
                    return (RangedStage::Ready, Wait::NextTick);
                }
                if self.phase == BossPhase::Phase1Ranged {
                    self.fire_projectile(target, world);
                    return (RangedStage::Ready, Wait::Seconds(attack_interval));
                }
                let point = target.position;
                debug!(x = point.x, z = point.z, "boss_strike_telegraphed");
                self.events.push(BossEvent::StrikeTelegraphed { point });
                (
                    RangedStage::Resolving { point },
                    Wait::Seconds(self.config.lightning_cast_delay),
                )
            }
            RangedStage::Resolving { point } => {
                let hit = world
                    .entities_within(point, self.config.lightning_hit_radius)
                    .contains(&target.entity);
                if hit {
                    deal_damage(
                        world,
                        target.entity,
                        self.config.lightning_damage,
                        DamageType::Lightning,
                    );
                }
                self.events.push(BossEvent::StrikeResolved { point, hit });
                (
                    RangedStage::Ready,
                    Wait::Seconds(self.config.lightning_cooldown.max(attack_interval)),
                )
            }
        }
    }

    fn fire_projectile<W>(&mut self, target: TargetInfo, world: &mut W)
    where
        W: SpatialQuery + HealthRegistry + ?Sized,
    {
        let line_of_fire = world.raycast(self.nav.position(), target.position, Some(self.entity));
        let hit = match line_of_fire {
            Some(ray_hit) => ray_hit.entity == Some(target.entity),
            None => true,
        };
        if hit {
            deal_damage(
                world,
                target.entity,
                self.config.projectile_damage,
                DamageType::Fire,
            );
        }
        self.events.push(BossEvent::ProjectileFired {
            target: target.entity,
            hit,
        });
    }

    fn run_melee<W>(&mut self, target: TargetInfo, world: &mut W) -> Wait
    where
        W: SpatialQuery + HealthRegistry + ?Sized,
    {
        let in_reach = world
            .entities_within(self.nav.position(), self.config.melee_range)
            .contains(&target.entity);
        if !in_reach {
            return Wait::NextTick;
        }
        deal_damage(
            world,
            target.entity,
            self.config.melee_damage,
            DamageType::Physical,
        );
        self.events.push(BossEvent::MeleeHit {
            target: target.entity,
        });
        Wait::Seconds(self.config.melee_interval)
    }

    fn run_summon<W>(&mut self, world: &mut W, pool: Option<&mut SpawnPool>) -> Wait
    where
        W: EntityLifecycle + ?Sized,
    {
        let next = Wait::Seconds(self.config.summon_interval);
        let Some(key) = self.config.summon_key.clone() else {
            return Wait::Done;
        };
        let Some(pool) = pool else {
            warn!(entity = self.entity.0, key = %key, "boss_summon_without_pool");
            return next;
        };
        let position =
            scatter_around(self.nav.position(), self.config.summon_radius, &mut self.rng);
        let transform = Transform {
            position,
            yaw_radians: self.rng.gen_range(0.0..std::f32::consts::TAU),
        };
        match pool.acquire(&key, transform, world) {
            Ok(entity) => {
                info!(boss = self.entity.0, entity = entity.0, key = %key, "boss_summoned");
                self.events.push(BossEvent::Summoned { entity, position });
            }
            Err(error) => warn!(key = %key, %error, "boss_summon_failed"),
        }
        next
    }

    fn try_dodge(&mut self, target: TargetInfo) {
        if self.dodge_cooldown.is_running()
            || self.status.multiplier() < self.config.dodge_min_speed_multiplier
        {
            return;
        }
        let position = self.nav.position();
        let to_boss = (position - target.position).horizontal().normalized_or_zero();
        let facing = target.forward.horizontal().normalized_or_zero();
        if to_boss == Vec3::ZERO || facing == Vec3::ZERO {
            return;
        }
        let cone_cos = self.config.dodge_aim_cone_degrees.to_radians().cos();
        if facing.dot(to_boss) < cone_cos {
            return;
        }
        if !self.rng.gen_bool(f64::from(self.config.dodge_chance.clamp(0.0, 1.0))) {
            return;
        }

        let axis = -to_boss;
        let side = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let sideways = Vec3::new(-axis.z, 0.0, axis.x) * side;
        let destination = position + sideways * self.config.dodge_distance;
        self.nav.warp(destination);
        self.dodge_cooldown.start(self.config.dodge_cooldown);
        debug!(entity = self.entity.0, "boss_dodged");
        self.events.push(BossEvent::Dodged {
            from: position,
            to: destination,
        });
    }

    /// Applies resistance, reduces health and returns the amount removed.
    pub fn take_damage(&mut self, amount: f32, kind: DamageType) -> f32 {
        if self.defeated {
            return 0.0;
        }
        let applied = apply_resistance(self.phase, kind, amount);
        let removed = self.health.reduce(applied);
        self.events.push(BossEvent::DamageTaken {
            kind,
            raw: amount,
            applied: removed,
        });
        if self.health.is_depleted() {
            self.defeat();
        }
        removed
    }

    fn defeat(&mut self) {
        self.defeated = true;
        let cancelled = self.tasks.cancel_all();
        self.attack_task = None;
        self.summon_task = None;
        self.status.clear();
        self.dodge_cooldown.clear();
        self.nav.hold_position();
        info!(
            entity = self.entity.0,
            phase = %self.phase,
            cancelled_routines = cancelled,
            "boss_defeated"
        );
        self.events.push(BossEvent::Defeated);
    }

    pub fn apply_freeze(&mut self, slow_fraction: f32, duration_seconds: f32) {
        if self.defeated {
            return;
        }
        self.status.apply_freeze(slow_fraction, duration_seconds);
    }

    pub fn current_speed(&self) -> f32 {
        effective_speed(
            self.config.move_speed,
            self.status.multiplier(),
            self.phase_speed_multiplier,
        )
    }

    pub fn drain_events(&mut self) -> Vec<BossEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn config(&self) -> &BossConfig {
        &self.config
    }

    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub fn attack_task(&self) -> Option<TaskId> {
        self.attack_task
    }

    pub fn summon_task(&self) -> Option<TaskId> {
        self.summon_task
    }

    pub fn attack_remaining_seconds(&self) -> Option<f32> {
        self.attack_task
            .and_then(|task| self.tasks.remaining_seconds(task))
    }

    pub fn dodge_cooldown_remaining(&self) -> Option<f32> {
        self.dodge_cooldown.remaining_seconds()
    }

    pub fn phase_speed_multiplier(&self) -> f32 {
        self.phase_speed_multiplier
    }

    pub fn status(&self) -> &StatusEffect {
        &self.status
    }

    pub fn target(&self) -> Option<TargetInfo> {
        self.target
    }

    pub fn nav(&self) -> &N {
        &self.nav
    }

    pub fn nav_mut(&mut self) -> &mut N {
        &mut self.nav
    }
}

impl<N: NavAgent> HealthSink for BossController<N> {
    fn apply_damage(&mut self, amount: f32, kind: DamageType) {
        self.take_damage(amount, kind);
    }
}

/// Attack and summon cadences must be positive; anything else falls back to
/// the default so a routine can never fire every tick.
fn sanitize_cadence(entity: EntityId, config: &mut BossConfig) {
    let defaults = BossConfig::default();
    let fields = [
        ("fire_rate", &mut config.fire_rate, defaults.fire_rate),
        ("melee_interval", &mut config.melee_interval, defaults.melee_interval),
        ("summon_interval", &mut config.summon_interval, defaults.summon_interval),
    ];
    for (field, value, fallback) in fields {
        if value.is_finite() && *value > 0.0 {
            continue;
        }
        warn!(entity = entity.0, field, value = *value, fallback, "boss_cadence_replaced");
        *value = fallback;
    }
}

fn deal_damage<W>(world: &mut W, target: EntityId, amount: f32, kind: DamageType) -> bool
where
    W: HealthRegistry + ?Sized,
{
    let Some(sink) = world.health_sink(target) else {
        warn!(target = target.0, kind = kind.as_token(), "damage_target_without_health");
        return false;
    };
    sink.apply_damage(amount, kind);
    true
}
