use engine::{EntityId, PrefabKey, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnerEvent {
    EntitySpawned {
        entity: EntityId,
        key: PrefabKey,
        position: Vec3,
    },
    EntityDespawned {
        entity: EntityId,
    },
    WaveStarted {
        wave_index: usize,
        enemy_count: u32,
    },
    WaveCompleted {
        wave_index: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerEventKind {
    EntitySpawned,
    EntityDespawned,
    WaveStarted,
    WaveCompleted,
}

impl SpawnerEvent {
    pub fn kind(&self) -> SpawnerEventKind {
        match self {
            Self::EntitySpawned { .. } => SpawnerEventKind::EntitySpawned,
            Self::EntityDespawned { .. } => SpawnerEventKind::EntityDespawned,
            Self::WaveStarted { .. } => SpawnerEventKind::WaveStarted,
            Self::WaveCompleted { .. } => SpawnerEventKind::WaveCompleted,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnerEventCounts {
    pub total: u32,
    pub entity_spawned: u32,
    pub entity_despawned: u32,
    pub wave_started: u32,
    pub wave_completed: u32,
}

impl SpawnerEventCounts {
    fn record(&mut self, kind: SpawnerEventKind) {
        self.total = self.total.saturating_add(1);
        match kind {
            SpawnerEventKind::EntitySpawned => {
                self.entity_spawned = self.entity_spawned.saturating_add(1)
            }
            SpawnerEventKind::EntityDespawned => {
                self.entity_despawned = self.entity_despawned.saturating_add(1)
            }
            SpawnerEventKind::WaveStarted => {
                self.wave_started = self.wave_started.saturating_add(1)
            }
            SpawnerEventKind::WaveCompleted => {
                self.wave_completed = self.wave_completed.saturating_add(1)
            }
        }
    }
}

/// Notifications collected since the last drain. Subscribers are whoever drains.
#[derive(Debug, Default)]
pub struct SpawnerEventBus {
    pending: Vec<SpawnerEvent>,
    last_drain_counts: SpawnerEventCounts,
}

impl SpawnerEventBus {
    pub fn emit(&mut self, event: SpawnerEvent) {
        self.pending.push(event);
    }

    pub fn pending(&self) -> &[SpawnerEvent] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<SpawnerEvent> {
        let mut counts = SpawnerEventCounts::default();
        for event in &self.pending {
            counts.record(event.kind());
        }
        self.last_drain_counts = counts;
        std::mem::take(&mut self.pending)
    }

    pub fn last_drain_counts(&self) -> SpawnerEventCounts {
        self.last_drain_counts
    }
}
