mod boss;
mod config;
mod encounter;
mod enemy;
mod events;
mod pool;
mod resistance;
mod scheduler;
mod status;

pub use boss::{BossController, BossEvent, BossPhase};
pub use config::{
    resolve_config_path, BossConfig, ConfigError, ContinuousConfig, EncounterConfig, EnemyConfig,
    FallbackArea, PrefabEntry, SpawnMode, SpawnerConfig, WaveConfig, CONFIG_ENV_VAR,
};
pub use encounter::{Encounter, EncounterEvent, EncounterSnapshot};
pub use enemy::{EnemyController, EnemyEvent, EnemyState};
pub use events::{SpawnerEvent, SpawnerEventBus, SpawnerEventCounts, SpawnerEventKind};
pub use pool::{InstanceState, PoolError, PooledInstance, ReleaseOutcome, SpawnPool};
pub use resistance::{apply_resistance, resistance_multiplier};
pub use scheduler::{
    pick_weighted, pick_with_roll, resolve_spawn_transform, scatter_around, total_weight,
    CurveKey, RateCurve, SpawnScheduler, MIN_SPAWN_INTERVAL_SECONDS,
};
pub use status::{
    effective_speed, StatusEffect, SPEED_MULTIPLIER_MAX, SPEED_MULTIPLIER_MIN,
    SPEED_MULTIPLIER_NEUTRAL,
};
