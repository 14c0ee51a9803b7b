//! Collaborator interfaces the simulation consumes but never implements itself.

use super::scene::{DamageType, EntityId, LifecycleError, PrefabKey, Transform, Vec3};

/// Pathfinding agent owned by one controller. The controller only issues intents.
pub trait NavAgent {
    fn set_destination(&mut self, destination: Vec3, speed: f32);
    fn hold_position(&mut self);
    fn set_stopping_distance(&mut self, distance: f32);
    /// Instant displacement, bypassing steering.
    fn warp(&mut self, position: Vec3);
    fn position(&self) -> Vec3;
    fn velocity(&self) -> Vec3;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Option<EntityId>,
    pub point: Vec3,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    pub entity: EntityId,
    pub position: Vec3,
    pub forward: Vec3,
}

pub trait SpatialQuery {
    fn surface_below(&self, point: Vec3, max_distance: f32) -> Option<Vec3>;
    /// Active entities whose position lies within `radius`, sorted by id.
    fn entities_within(&self, center: Vec3, radius: f32) -> Vec<EntityId>;
    fn raycast(&self, from: Vec3, to: Vec3, ignore: Option<EntityId>) -> Option<RayHit>;
    fn locate_target(&self, from: Vec3, radius: f32) -> Option<TargetInfo>;
}

pub trait HealthSink {
    fn apply_damage(&mut self, amount: f32, kind: DamageType);
}

pub trait HealthRegistry {
    fn health_sink(&mut self, entity: EntityId) -> Option<&mut dyn HealthSink>;
    /// Entities whose health reached zero since the last call.
    fn drain_deaths(&mut self) -> Vec<EntityId>;
}

pub trait EntityLifecycle {
    fn has_template(&self, key: &PrefabKey) -> bool;
    fn create(&mut self, key: &PrefabKey) -> Result<EntityId, LifecycleError>;
    fn destroy(&mut self, entity: EntityId) -> Result<(), LifecycleError>;
    fn activate(&mut self, entity: EntityId, transform: Transform) -> Result<(), LifecycleError>;
    fn deactivate(&mut self, entity: EntityId) -> Result<(), LifecycleError>;
}

pub trait SimWorld: EntityLifecycle + SpatialQuery + HealthRegistry {}

impl<T: EntityLifecycle + SpatialQuery + HealthRegistry + ?Sized> SimWorld for T {}
