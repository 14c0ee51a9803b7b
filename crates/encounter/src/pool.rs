use std::collections::HashMap;

use engine::{EntityId, EntityLifecycle, LifecycleError, PrefabKey, Transform};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PrefabEntry;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("prefab '{key}' is not registered with the pool")]
    UnknownPrefab { key: PrefabKey },
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PooledInstance {
    pub entity: EntityId,
    pub key: PrefabKey,
    pub state: InstanceState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Deactivated and returned to its free list.
    Pooled,
    /// Free list was full; the instance was destroyed.
    Destroyed,
    /// Not owned by this pool; deactivated only.
    Unpooled,
    AlreadyReleased,
    /// The world no longer knows the entity; bookkeeping dropped.
    Lost,
}

#[derive(Debug, Default)]
struct FreeList {
    free: Vec<EntityId>,
    max_pool_size: usize,
}

/// Reusable instances per prefab key. Instances are deactivated and recycled
/// rather than destroyed, except on [`SpawnPool::despawn_all`].
#[derive(Debug, Default)]
pub struct SpawnPool {
    free_lists: HashMap<PrefabKey, FreeList>,
    instances: HashMap<EntityId, PooledInstance>,
}

impl SpawnPool {
    /// Returns `false` when the entry was skipped or already registered.
    pub fn register_prefab<L>(&mut self, entry: &PrefabEntry, lifecycle: &mut L) -> bool
    where
        L: EntityLifecycle + ?Sized,
    {
        if entry.key.is_empty() || !lifecycle.has_template(&entry.key) {
            warn!(key = %entry.key, "prefab_template_missing");
            return false;
        }
        if self.free_lists.contains_key(&entry.key) {
            debug!(key = %entry.key, "prefab_already_registered");
            return false;
        }

        let max_pool_size = if entry.max_pool_size == 0 {
            warn!(key = %entry.key, "prefab_max_pool_size_zero_raised_to_one");
            1
        } else {
            entry.max_pool_size as usize
        };
        let warm_count = (entry.initial_pool_size as usize).min(max_pool_size);

        let mut free_list = FreeList {
            free: Vec::with_capacity(warm_count),
            max_pool_size,
        };
        for _ in 0..warm_count {
            match lifecycle.create(&entry.key) {
                Ok(entity) => {
                    free_list.free.push(entity);
                    self.instances.insert(
                        entity,
                        PooledInstance {
                            entity,
                            key: entry.key.clone(),
                            state: InstanceState::Inactive,
                        },
                    );
                }
                Err(error) => {
                    warn!(key = %entry.key, %error, "prefab_warmup_failed");
                    break;
                }
            }
        }

        info!(
            key = %entry.key,
            warmed = free_list.free.len(),
            max_pool_size,
            "prefab_registered"
        );
        self.free_lists.insert(entry.key.clone(), free_list);
        true
    }

    pub fn acquire<L>(
        &mut self,
        key: &PrefabKey,
        at: Transform,
        lifecycle: &mut L,
    ) -> Result<EntityId, PoolError>
    where
        L: EntityLifecycle + ?Sized,
    {
        let Some(free_list) = self.free_lists.get_mut(key) else {
            return Err(PoolError::UnknownPrefab { key: key.clone() });
        };

        let entity = match free_list.free.pop() {
            Some(entity) => entity,
            None => {
                let entity = lifecycle.create(key)?;
                self.instances.insert(
                    entity,
                    PooledInstance {
                        entity,
                        key: key.clone(),
                        state: InstanceState::Inactive,
                    },
                );
                entity
            }
        };

        if let Err(error) = lifecycle.activate(entity, at) {
            self.instances.remove(&entity);
            if let Err(destroy_error) = lifecycle.destroy(entity) {
                debug!(entity = entity.0, error = %destroy_error, "failed_instance_already_gone");
            }
            return Err(error.into());
        }
        if let Some(instance) = self.instances.get_mut(&entity) {
            instance.state = InstanceState::Active;
        }
        Ok(entity)
    }

    pub fn release<L>(&mut self, entity: EntityId, lifecycle: &mut L) -> ReleaseOutcome
    where
        L: EntityLifecycle + ?Sized,
    {
        let Some(instance) = self.instances.get(&entity) else {
            warn!(entity = entity.0, "release_unpooled_instance");
            return match lifecycle.deactivate(entity) {
                Ok(()) => ReleaseOutcome::Unpooled,
                Err(_) => ReleaseOutcome::Lost,
            };
        };
        if instance.state == InstanceState::Inactive {
            return ReleaseOutcome::AlreadyReleased;
        }

        let key = instance.key.clone();
        let Some(free_list) = self.free_lists.get_mut(&key) else {
            self.instances.remove(&entity);
            return match lifecycle.deactivate(entity) {
                Ok(()) => ReleaseOutcome::Unpooled,
                Err(_) => ReleaseOutcome::Lost,
            };
        };

        if free_list.free.len() >= free_list.max_pool_size {
            self.instances.remove(&entity);
            return match lifecycle.destroy(entity) {
                Ok(()) => {
                    debug!(entity = entity.0, key = %key, "pool_full_instance_destroyed");
                    ReleaseOutcome::Destroyed
                }
                Err(_) => ReleaseOutcome::Lost,
            };
        }

        if let Err(error) = lifecycle.deactivate(entity) {
            warn!(entity = entity.0, %error, "release_missing_entity");
            self.instances.remove(&entity);
            return ReleaseOutcome::Lost;
        }
        free_list.free.push(entity);
        if let Some(instance) = self.instances.get_mut(&entity) {
            instance.state = InstanceState::Inactive;
        }
        ReleaseOutcome::Pooled
    }

    pub fn force_release_all<L>(&mut self, lifecycle: &mut L) -> usize
    where
        L: EntityLifecycle + ?Sized,
    {
        let active = self.active_entities();
        for entity in &active {
            self.release(*entity, lifecycle);
        }
        active.len()
    }

    /// Destroys every instance the pool owns, active or pooled.
    pub fn despawn_all<L>(&mut self, lifecycle: &mut L) -> usize
    where
        L: EntityLifecycle + ?Sized,
    {
        let mut entities = self.instances.keys().copied().collect::<Vec<_>>();
        entities.sort();
        for entity in &entities {
            if let Err(error) = lifecycle.destroy(*entity) {
                warn!(entity = entity.0, %error, "despawn_missing_entity");
            }
        }
        self.instances.clear();
        for free_list in self.free_lists.values_mut() {
            free_list.free.clear();
        }
        entities.len()
    }

    pub fn is_registered(&self, key: &PrefabKey) -> bool {
        self.free_lists.contains_key(key)
    }

    pub fn owns(&self, entity: EntityId) -> bool {
        self.instances.contains_key(&entity)
    }

    pub fn is_active(&self, entity: EntityId) -> bool {
        self.instances
            .get(&entity)
            .is_some_and(|instance| instance.state == InstanceState::Active)
    }

    pub fn owner_of(&self, entity: EntityId) -> Option<&PrefabKey> {
        self.instances.get(&entity).map(|instance| &instance.key)
    }

    pub fn free_count(&self, key: &PrefabKey) -> usize {
        self.free_lists
            .get(key)
            .map_or(0, |free_list| free_list.free.len())
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn active_count(&self) -> usize {
        self.instances
            .values()
            .filter(|instance| instance.state == InstanceState::Active)
            .count()
    }

    pub fn active_entities(&self) -> Vec<EntityId> {
        let mut active = self
            .instances
            .values()
            .filter(|instance| instance.state == InstanceState::Active)
            .map(|instance| instance.entity)
            .collect::<Vec<_>>();
        active.sort();
        active
    }
}

#[cfg(test)]
mod tests {
    use engine::{EntityTemplate, SceneWorld, Vec3};

    use super::*;

    fn world_with(keys: &[&str]) -> SceneWorld {
        let mut world = SceneWorld::with_ground(0.0);
        for key in keys {
            world.register_template(PrefabKey::new(*key), EntityTemplate::default());
        }
        world
    }

    fn here() -> Transform {
        Transform::at(Vec3::new(1.0, 0.0, 1.0))
    }

    /// Creates and destroys through the world but refuses every activation.
    struct RefusingLifecycle {
        world: SceneWorld,
    }

    impl EntityLifecycle for RefusingLifecycle {
        fn has_template(&self, key: &PrefabKey) -> bool {
            self.world.has_template(key)
        }

        fn create(&mut self, key: &PrefabKey) -> Result<EntityId, LifecycleError> {
            self.world.create(key)
        }

        fn destroy(&mut self, entity: EntityId) -> Result<(), LifecycleError> {
            self.world.destroy(entity)
        }

        fn activate(&mut self, entity: EntityId, _: Transform) -> Result<(), LifecycleError> {
            Err(LifecycleError::UnknownEntity(entity))
        }

        fn deactivate(&mut self, entity: EntityId) -> Result<(), LifecycleError> {
            self.world.deactivate(entity)
        }
    }

    #[test]
    fn failed_activation_destroys_fresh_instance() {
        let mut lifecycle = RefusingLifecycle {
            world: world_with(&["grunt"]),
        };
        let mut pool = SpawnPool::default();
        let entry = PrefabEntry::new("grunt", 1.0).with_pool(0, 4);
        assert!(pool.register_prefab(&entry, &mut lifecycle));

        let result = pool.acquire(&PrefabKey::new("grunt"), here(), &mut lifecycle);
        assert!(matches!(result, Err(PoolError::Lifecycle(_))));
        assert_eq!(pool.instance_count(), 0);
        assert_eq!(lifecycle.world.entity_count(), 0);
    }

    #[test]
    fn register_warms_inactive_instances_once() {
        let mut world = world_with(&["grunt"]);
        let mut pool = SpawnPool::default();
        let entry = PrefabEntry::new("grunt", 1.0).with_pool(3, 8);

        assert!(pool.register_prefab(&entry, &mut world));
        assert!(!pool.register_prefab(&entry, &mut world));
        assert_eq!(pool.free_count(&entry.key), 3);
        assert_eq!(world.entity_count(), 3);
        assert_eq!(world.active_count(), 0);
    }

    #[test]
    fn register_skips_unknown_template() {
        let mut world = world_with(&[]);
        let mut pool = SpawnPool::default();
        assert!(!pool.register_prefab(&PrefabEntry::new("ghost", 1.0), &mut world));
        assert!(!pool.is_registered(&PrefabKey::new("ghost")));
    }

    #[test]
    fn acquire_release_acquire_reuses_instance() {
        let mut world = world_with(&["grunt"]);
        let mut pool = SpawnPool::default();
        let key = PrefabKey::new("grunt");
        pool.register_prefab(&PrefabEntry::new("grunt", 1.0), &mut world);

        let first = pool.acquire(&key, here(), &mut world).expect("acquire");
        assert!(world.is_active(first));
        assert_eq!(pool.release(first, &mut world), ReleaseOutcome::Pooled);
        assert!(!world.is_active(first));

        let second = pool.acquire(&key, here(), &mut world).expect("reacquire");
        assert_eq!(first, second);
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn double_release_is_ignored() {
        let mut world = world_with(&["grunt"]);
        let mut pool = SpawnPool::default();
        let key = PrefabKey::new("grunt");
        pool.register_prefab(&PrefabEntry::new("grunt", 1.0), &mut world);

        let entity = pool.acquire(&key, here(), &mut world).expect("acquire");
        assert_eq!(pool.release(entity, &mut world), ReleaseOutcome::Pooled);
        assert_eq!(pool.release(entity, &mut world), ReleaseOutcome::AlreadyReleased);
        assert_eq!(pool.free_count(&key), 1);
    }

    #[test]
    fn unknown_key_is_an_error() {
        let mut world = world_with(&["grunt"]);
        let mut pool = SpawnPool::default();
        let key = PrefabKey::new("grunt");
        assert_eq!(
            pool.acquire(&key, here(), &mut world),
            Err(PoolError::UnknownPrefab { key })
        );
    }

    #[test]
    fn unowned_release_only_deactivates() {
        let mut world = world_with(&[]);
        let mut pool = SpawnPool::default();
        let stray = world.spawn_actor(here(), 0.5);
        assert_eq!(pool.release(stray, &mut world), ReleaseOutcome::Unpooled);
        assert!(!world.is_active(stray));
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn release_over_capacity_destroys_surplus() {
        let mut world = world_with(&["grunt"]);
        let mut pool = SpawnPool::default();
        let key = PrefabKey::new("grunt");
        pool.register_prefab(&PrefabEntry::new("grunt", 1.0).with_pool(0, 1), &mut world);

        let a = pool.acquire(&key, here(), &mut world).expect("a");
        let b = pool.acquire(&key, here(), &mut world).expect("b");
        assert_eq!(pool.release(a, &mut world), ReleaseOutcome::Pooled);
        assert_eq!(pool.release(b, &mut world), ReleaseOutcome::Destroyed);
        assert_eq!(world.entity_count(), 1);
        assert!(!pool.owns(b));
    }

    #[test]
    fn force_release_and_despawn_all() {
        let mut world = world_with(&["grunt"]);
        let mut pool = SpawnPool::default();
        let key = PrefabKey::new("grunt");
        pool.register_prefab(&PrefabEntry::new("grunt", 1.0).with_pool(1, 4), &mut world);
        pool.acquire(&key, here(), &mut world).expect("a");
        pool.acquire(&key, here(), &mut world).expect("b");

        assert_eq!(pool.force_release_all(&mut world), 2);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(world.active_count(), 0);

        assert_eq!(pool.despawn_all(&mut world), 2);
        assert_eq!(world.entity_count(), 0);
        assert_eq!(pool.free_count(&key), 0);
    }
}
