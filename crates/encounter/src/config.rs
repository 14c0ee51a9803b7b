use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use engine::{PrefabKey, Transform, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::scheduler::RateCurve;

pub const CONFIG_ENV_VAR: &str = "ENCOUNTER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value at {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnMode {
    Manual,
    #[default]
    Continuous,
    Waves,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefabEntry {
    pub key: PrefabKey,
    pub weight: f32,
    pub initial_pool_size: u32,
    pub max_pool_size: u32,
}

impl Default for PrefabEntry {
    fn default() -> Self {
        Self {
            key: PrefabKey::default(),
            weight: 1.0,
            initial_pool_size: 0,
            max_pool_size: 16,
        }
    }
}

impl PrefabEntry {
    pub fn new(key: impl Into<String>, weight: f32) -> Self {
        Self {
            key: PrefabKey::new(key),
            weight,
            ..Self::default()
        }
    }

    pub fn with_pool(mut self, initial_pool_size: u32, max_pool_size: u32) -> Self {
        self.initial_pool_size = initial_pool_size;
        self.max_pool_size = max_pool_size;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackArea {
    /// Defaults to the spawner origin.
    pub center: Option<Vec3>,
    pub radius: f32,
    pub probe_height: f32,
    pub max_probe_distance: f32,
}

impl Default for FallbackArea {
    fn default() -> Self {
        Self {
            center: None,
            radius: 8.0,
            probe_height: 10.0,
            max_probe_distance: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuousConfig {
    pub base_interval: f32,
    /// Fraction of the computed interval used as symmetric jitter.
    pub interval_variance: f32,
    pub difficulty_time: f32,
    pub rate_curve: RateCurve,
}

impl Default for ContinuousConfig {
    fn default() -> Self {
        Self {
            base_interval: 2.0,
            interval_variance: 0.2,
            difficulty_time: 120.0,
            rate_curve: RateCurve::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub counts: Vec<u32>,
    pub start_delay: f32,
    pub spawn_interval: f32,
    pub time_between_waves: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            counts: vec![3, 5, 8],
            start_delay: 2.0,
            spawn_interval: 0.5,
            time_between_waves: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub mode: SpawnMode,
    pub auto_start: bool,
    pub origin: Vec3,
    pub prefabs: Vec<PrefabEntry>,
    /// Zero or negative means unlimited.
    pub max_alive: i32,
    /// Zero or negative means unlimited.
    pub total_spawn_limit: i32,
    pub spawn_points: Vec<Transform>,
    pub fallback: FallbackArea,
    pub continuous: ContinuousConfig,
    pub waves: WaveConfig,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            mode: SpawnMode::Continuous,
            auto_start: true,
            origin: Vec3::ZERO,
            prefabs: Vec::new(),
            max_alive: 10,
            total_spawn_limit: 0,
            spawn_points: Vec::new(),
            fallback: FallbackArea::default(),
            continuous: ContinuousConfig::default(),
            waves: WaveConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub move_speed: f32,
    pub aggro_radius: f32,
    pub contact_range: f32,
    pub contact_damage: f32,
    pub contact_interval: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            aggro_radius: 20.0,
            contact_range: 1.2,
            contact_damage: 10.0,
            contact_interval: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub spawn: Transform,
    pub body_radius: f32,
    pub max_health: f32,
    pub phase2_threshold: f32,
    pub phase3_threshold: f32,
    pub move_speed: f32,
    pub detection_radius: f32,
    pub ranged_stopping_distance: f32,
    pub melee_stopping_distance: f32,
    pub melee_speed_multiplier: f32,

    pub attack_range: f32,
    /// Ranged attacks per second.
    pub fire_rate: f32,
    pub projectile_damage: f32,
    pub lightning_damage: f32,
    pub lightning_cast_delay: f32,
    pub lightning_hit_radius: f32,
    pub lightning_cooldown: f32,

    pub melee_range: f32,
    pub melee_damage: f32,
    pub melee_interval: f32,

    pub dodge_cooldown: f32,
    pub dodge_distance: f32,
    pub dodge_chance: f32,
    pub dodge_aim_cone_degrees: f32,
    /// Dodging is skipped while slowed below this speed multiplier.
    pub dodge_min_speed_multiplier: f32,

    pub summon_key: Option<PrefabKey>,
    pub summon_interval: f32,
    pub summon_radius: f32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            spawn: Transform::default(),
            body_radius: 1.0,
            max_health: 1000.0,
            phase2_threshold: 0.7,
            phase3_threshold: 0.4,
            move_speed: 3.5,
            detection_radius: 30.0,
            ranged_stopping_distance: 8.0,
            melee_stopping_distance: 0.5,
            melee_speed_multiplier: 1.5,
            attack_range: 15.0,
            fire_rate: 0.5,
            projectile_damage: 20.0,
            lightning_damage: 30.0,
            lightning_cast_delay: 1.0,
            lightning_hit_radius: 2.0,
            lightning_cooldown: 3.0,
            melee_range: 2.5,
            melee_damage: 25.0,
            melee_interval: 1.2,
            dodge_cooldown: 4.0,
            dodge_distance: 3.0,
            dodge_chance: 0.5,
            dodge_aim_cone_degrees: 20.0,
            dodge_min_speed_multiplier: 0.5,
            summon_key: None,
            summon_interval: 8.0,
            summon_radius: 4.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Fixed seed for reproducible runs; entropy when absent.
    pub seed: Option<u64>,
    pub spawner: SpawnerConfig,
    pub enemy: EnemyConfig,
    pub boss: Option<BossConfig>,
}

impl EncounterConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config = match serde_path_to_error::deserialize::<_, EncounterConfig>(&mut deserializer)
        {
            Ok(config) => config,
            Err(error) => {
                let path = error.path().to_string();
                let path = if path.is_empty() { ".".to_string() } else { path };
                return Err(ConfigError::Parse {
                    path,
                    source: error.into_inner(),
                });
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            prefab_count = config.spawner.prefabs.len(),
            boss = config.boss.is_some(),
            "config_loaded"
        );
        Ok(config)
    }

    /// Rejects values the simulation cannot run with. Soft problems such as a
    /// negative prefab weight are only warned about and handled where used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let spawner = &self.spawner;
        require_positive("spawner.continuous.base_interval", spawner.continuous.base_interval)?;
        require_non_negative("spawner.waves.start_delay", spawner.waves.start_delay)?;
        require_non_negative("spawner.waves.spawn_interval", spawner.waves.spawn_interval)?;
        require_non_negative(
            "spawner.waves.time_between_waves",
            spawner.waves.time_between_waves,
        )?;
        for entry in &spawner.prefabs {
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                warn!(key = %entry.key, weight = entry.weight, "prefab_weight_not_selectable");
            }
        }

        require_positive("enemy.contact_interval", self.enemy.contact_interval)?;

        if let Some(boss) = &self.boss {
            require_positive("boss.max_health", boss.max_health)?;
            require_fraction("boss.phase2_threshold", boss.phase2_threshold)?;
            require_fraction("boss.phase3_threshold", boss.phase3_threshold)?;
            if boss.phase3_threshold > boss.phase2_threshold {
                return Err(ConfigError::Invalid {
                    field: "boss.phase3_threshold",
                    message: format!(
                        "expected at most phase2_threshold ({}), got {}",
                        boss.phase2_threshold, boss.phase3_threshold
                    ),
                });
            }
            require_positive("boss.fire_rate", boss.fire_rate)?;
            require_non_negative("boss.lightning_cast_delay", boss.lightning_cast_delay)?;
            require_positive("boss.melee_interval", boss.melee_interval)?;
            require_positive("boss.summon_interval", boss.summon_interval)?;
            require_fraction("boss.dodge_chance", boss.dodge_chance)?;
        }
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        return Ok(());
    }
    Err(ConfigError::Invalid {
        field,
        message: format!("expected a positive number, got {value}"),
    })
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(ConfigError::Invalid {
        field,
        message: format!("expected a non-negative number, got {value}"),
    })
}

fn require_fraction(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        return Ok(());
    }
    Err(ConfigError::Invalid {
        field,
        message: format!("expected a value in [0, 1], got {value}"),
    })
}

/// First CLI argument wins over the environment variable.
pub fn resolve_config_path(cli_arg: Option<String>) -> Option<PathBuf> {
    if let Some(arg) = cli_arg.filter(|arg| !arg.trim().is_empty()) {
        return Some(PathBuf::from(arg));
    }
    env::var(CONFIG_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}
