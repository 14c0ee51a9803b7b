use engine::{
    Countdown, DamageType, EntityId, HealthRegistry, NavAgent, SpatialQuery, TargetInfo,
};
use tracing::{debug, warn};

use crate::config::EnemyConfig;
use crate::status::{effective_speed, StatusEffect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyState {
    Idle,
    Chase,
    Contact,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnemyEvent {
    TargetAcquired { target: EntityId },
    TargetLost,
    ContactHit { target: EntityId, damage: f32 },
}

/// Regular spawned enemy: chase the nearest target, deal contact damage.
#[derive(Debug)]
pub struct EnemyController<N: NavAgent> {
    entity: EntityId,
    config: EnemyConfig,
    nav: N,
    state: EnemyState,
    status: StatusEffect,
    contact_cooldown: Countdown,
    events: Vec<EnemyEvent>,
}

impl<N: NavAgent> EnemyController<N> {
    pub fn new(entity: EntityId, config: EnemyConfig, mut nav: N) -> Self {
        nav.set_stopping_distance(config.contact_range * 0.5);
        Self {
            entity,
            config,
            nav,
            state: EnemyState::Idle,
            status: StatusEffect::default(),
            contact_cooldown: Countdown::default(),
            events: Vec::new(),
        }
    }

    pub fn tick<W>(&mut self, dt_seconds: f32, world: &mut W)
    where
        W: SpatialQuery + HealthRegistry + ?Sized,
    {
        if !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return;
        }
        self.status.tick(dt_seconds);
        self.contact_cooldown.tick(dt_seconds);

        let Some(target) = world.locate_target(self.nav.position(), self.config.aggro_radius)
        else {
            if self.state != EnemyState::Idle {
                self.events.push(EnemyEvent::TargetLost);
            }
            self.state = EnemyState::Idle;
            self.contact_cooldown.clear();
            self.nav.hold_position();
            return;
        };
        if self.state == EnemyState::Idle {
            self.events.push(EnemyEvent::TargetAcquired {
                target: target.entity,
            });
        }

        self.nav.set_destination(target.position, self.current_speed());
        if self.nav.position().distance(target.position) > self.config.contact_range {
            if self.state == EnemyState::Contact {
                self.contact_cooldown.clear();
            }
            self.state = EnemyState::Chase;
            return;
        }

        self.state = EnemyState::Contact;
        if !self.contact_cooldown.is_running() {
            self.hit(target, world);
            self.contact_cooldown.start(self.config.contact_interval);
        }
    }

    fn hit<W>(&mut self, target: TargetInfo, world: &mut W)
    where
        W: HealthRegistry + ?Sized,
    {
        let Some(sink) = world.health_sink(target.entity) else {
            warn!(
                entity = self.entity.0,
                target = target.entity.0,
                "contact_target_without_health"
            );
            return;
        };
        sink.apply_damage(self.config.contact_damage, DamageType::Physical);
        debug!(entity = self.entity.0, target = target.entity.0, "enemy_contact_hit");
        self.events.push(EnemyEvent::ContactHit {
            target: target.entity,
            damage: self.config.contact_damage,
        });
    }

    pub fn apply_freeze(&mut self, slow_fraction: f32, duration_seconds: f32) {
        self.status.apply_freeze(slow_fraction, duration_seconds);
    }

    pub fn current_speed(&self) -> f32 {
        effective_speed(self.config.move_speed, self.status.multiplier(), 1.0)
    }

    pub fn drain_events(&mut self) -> Vec<EnemyEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn status(&self) -> &StatusEffect {
        &self.status
    }

    pub fn contact_cooldown_remaining(&self) -> Option<f32> {
        self.contact_cooldown.remaining_seconds()
    }

    pub fn nav(&self) -> &N {
        &self.nav
    }

    pub fn nav_mut(&mut self) -> &mut N {
        &mut self.nav
    }
}
