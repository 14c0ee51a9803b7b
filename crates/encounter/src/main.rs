use encounter::{
    resolve_config_path, BossEvent, BossPhase, ConfigError, Encounter, EncounterConfig,
    EncounterEvent, SpawnerEvent,
};
use engine::{
    run_headless_with_metrics, Countdown, DamageType, EntityId, EntityTemplate, LoopConfig,
    MetricsHandle, NavAgent, SceneWorld, SimControl, Simulation, Transform, Vec3,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const BUNDLED_CONFIG: &str = include_str!("../../../config/encounter.json");
const DEMO_MAX_TICKS: u64 = 60 * 180;
const PLAYER_MAX_HEALTH: f32 = 2500.0;
const PLAYER_RADIUS: f32 = 0.5;
const PLAYER_ATTACK_RANGE: f32 = 14.0;
const PLAYER_ATTACK_INTERVAL_SECONDS: f32 = 0.4;
const PLAYER_ATTACK_DAMAGE: f32 = 45.0;
const FREEZE_EVERY_NTH_ATTACK: u32 = 4;
const FREEZE_SLOW_FRACTION: f32 = 0.6;
const FREEZE_DURATION_SECONDS: f32 = 2.0;

/// Scripted player that auto-attacks the nearest hostile.
struct EncounterDemo {
    encounter: Encounter,
    player: EntityId,
    attack_cooldown: Countdown,
    attacks: u32,
    finished: bool,
    metrics: MetricsHandle,
}

impl EncounterDemo {
    fn new(config: EncounterConfig) -> Self {
        let mut world = SceneWorld::with_ground(0.0);
        for entry in &config.spawner.prefabs {
            world.register_template(entry.key.clone(), EntityTemplate::default());
        }
        if let Some(key) = config.boss.as_ref().and_then(|boss| boss.summon_key.clone()) {
            world.register_template(key, EntityTemplate::default());
        }
        let player = world.spawn_target(
            Transform::at(config.spawner.origin),
            PLAYER_RADIUS,
            PLAYER_MAX_HEALTH,
        );
        Self {
            encounter: Encounter::new(config, world),
            player,
            attack_cooldown: Countdown::default(),
            attacks: 0,
            finished: false,
            metrics: MetricsHandle::default(),
        }
    }

    fn player_position(&self) -> Option<Vec3> {
        self.encounter
            .world()
            .find_entity(self.player)
            .map(|entity| entity.transform.position)
    }

    fn nearest_hostile(&self, from: Vec3) -> Option<EntityId> {
        let boss = self
            .encounter
            .boss()
            .filter(|boss| !boss.is_defeated())
            .map(|boss| (boss.entity(), boss.nav().position()));
        nearest_within(
            from,
            PLAYER_ATTACK_RANGE,
            self.encounter.enemy_positions().into_iter().chain(boss),
        )
    }

    fn player_attack(&mut self, dt: f32) {
        self.attack_cooldown.tick(dt);
        if self.attack_cooldown.is_running() {
            return;
        }
        let Some(from) = self.player_position() else {
            return;
        };
        let Some(target) = self.nearest_hostile(from) else {
            return;
        };
        self.attacks = self.attacks.saturating_add(1);
        let kind = DamageType::ALL[self.attacks as usize % DamageType::ALL.len()];
        self.encounter
            .apply_damage(target, PLAYER_ATTACK_DAMAGE, kind);
        if self.attacks % FREEZE_EVERY_NTH_ATTACK == 0 {
            self.encounter
                .apply_freeze(target, FREEZE_SLOW_FRACTION, FREEZE_DURATION_SECONDS);
        }
        self.attack_cooldown.start(PLAYER_ATTACK_INTERVAL_SECONDS);
    }

    fn report(&mut self) {
        for event in self.encounter.drain_events() {
            match event {
                EncounterEvent::Spawner(SpawnerEvent::WaveStarted {
                    wave_index,
                    enemy_count,
                }) => info!(
                    wave_index,
                    enemy_count,
                    loop_tps = self.metrics.snapshot().tps,
                    "demo_wave_started"
                ),
                EncounterEvent::Boss(BossEvent::PhaseChanged { to, .. }) => {
                    let loop_metrics = self.metrics.snapshot();
                    info!(
                        phase = %to,
                        total_ticks = loop_metrics.total_ticks,
                        loop_tps = loop_metrics.tps,
                        "demo_boss_phase"
                    )
                }
                EncounterEvent::Boss(BossEvent::Defeated) => {
                    let recalled = self.encounter.clear_field();
                    info!(recalled, "demo_boss_defeated");
                    self.finished = true;
                }
                EncounterEvent::TargetDown { entity } if entity == self.player => {
                    info!("demo_player_down");
                    self.finished = true;
                }
                _ => {}
            }
        }
    }
}

impl Simulation for EncounterDemo {
    fn update(&mut self, fixed_dt_seconds: f32) -> SimControl {
        let dt = self.encounter.tick(fixed_dt_seconds);
        if dt > 0.0 {
            self.player_attack(dt);
        }
        self.report();
        if self.finished {
            SimControl::Stop
        } else {
            SimControl::Continue
        }
    }
}

fn nearest_within(
    from: Vec3,
    range: f32,
    candidates: impl IntoIterator<Item = (EntityId, Vec3)>,
) -> Option<EntityId> {
    candidates
        .into_iter()
        .map(|(entity, position)| (entity, position.distance(from)))
        .filter(|(_, distance)| *distance <= range)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(entity, _)| entity)
}

fn main() {
    init_tracing();
    info!("=== Encounter Sim Startup ===");

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "config_load_failed");
            std::process::exit(1);
        }
    };

    let mut demo = EncounterDemo::new(config);
    let loop_config = LoopConfig {
        max_ticks: Some(DEMO_MAX_TICKS),
        ..LoopConfig::default()
    };
    let metrics = demo.metrics.clone();
    match run_headless_with_metrics(loop_config, &mut demo, metrics) {
        Ok(metrics) => {
            let snapshot = demo.encounter.snapshot();
            info!(
                total_ticks = metrics.total_ticks,
                sim_seconds = snapshot.elapsed_seconds,
                total_spawned = snapshot.total_spawned,
                alive_enemies = snapshot.alive_enemies,
                boss_phase = ?snapshot.boss_phase.map(BossPhase::as_token),
                boss_defeated = snapshot.boss_defeated,
                "encounter_finished"
            );
        }
        Err(err) => {
            error!(error = %err, "runner_failed");
            std::process::exit(1);
        }
    }
}

fn load_config() -> Result<EncounterConfig, ConfigError> {
    match resolve_config_path(std::env::args().nth(1)) {
        Some(path) => EncounterConfig::load(&path),
        None => {
            info!("config_bundled_default");
            EncounterConfig::from_json_str(BUNDLED_CONFIG)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> EncounterConfig {
        EncounterConfig::from_json_str(BUNDLED_CONFIG).expect("bundled config")
    }

    #[test]
    fn nearest_within_ignores_out_of_range() {
        let candidates = vec![
            (EntityId(1), Vec3::new(20.0, 0.0, 0.0)),
            (EntityId(2), Vec3::new(3.0, 0.0, 0.0)),
            (EntityId(3), Vec3::new(0.0, 0.0, 5.0)),
        ];
        assert_eq!(nearest_within(Vec3::ZERO, 10.0, candidates), Some(EntityId(2)));
        assert_eq!(nearest_within(Vec3::ZERO, 1.0, Vec::new()), None);
    }

    #[test]
    fn demo_runs_headless_within_tick_budget() {
        let mut demo = EncounterDemo::new(bundled());
        let config = LoopConfig {
            max_ticks: Some(600),
            ..LoopConfig::default()
        };
        let handle = demo.metrics.clone();
        let metrics = run_headless_with_metrics(config, &mut demo, handle).expect("loop runs");
        assert!(metrics.total_ticks <= 600);
        assert!(demo.encounter.snapshot().total_spawned > 0);
        assert_eq!(demo.metrics.snapshot().total_ticks, metrics.total_ticks);
    }

    #[test]
    fn player_is_registered_as_target() {
        let demo = EncounterDemo::new(bundled());
        assert!(demo.player_position().is_some());
        assert!(demo.encounter.world().is_active(demo.player));
    }
}
