use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::capabilities::{
    EntityLifecycle, HealthRegistry, HealthSink, RayHit, SpatialQuery, TargetInfo,
};

const RAY_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Opaque handle to a spawnable template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabKey(pub String);

impl PrefabKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PrefabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Physical,
    Fire,
    Lightning,
    Ice,
}

impl DamageType {
    pub const ALL: [DamageType; 4] = [Self::Physical, Self::Fire, Self::Lightning, Self::Ice];

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Fire => "fire",
            Self::Lightning => "lightning",
            Self::Ice => "ice",
        }
    }
}

/// World-space vector, y is up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (other - self).length()
    }

    /// Projection onto the ground plane.
    pub fn horizontal(self) -> Vec3 {
        Vec3 {
            x: self.x,
            y: 0.0,
            z: self.z,
        }
    }

    pub fn normalized_or_zero(self) -> Vec3 {
        let length = self.length();
        if !length.is_finite() || length <= f32::EPSILON {
            return Vec3::ZERO;
        }
        self * (1.0 / length)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub yaw_radians: f32,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            yaw_radians: 0.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw_radians.sin(), 0.0, self.yaw_radians.cos())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };
        Self { current: max, max }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn fraction(&self) -> f32 {
        (self.current / self.max).clamp(0.0, 1.0)
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    /// Returns the amount actually removed.
    pub fn reduce(&mut self, amount: f32) -> f32 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current - amount).max(0.0);
        before - self.current
    }

    pub fn restore_full(&mut self) {
        self.current = self.max;
    }
}

impl HealthSink for Health {
    fn apply_damage(&mut self, amount: f32, _kind: DamageType) {
        self.reduce(amount);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityTemplate {
    pub max_health: Option<f32>,
    pub radius: f32,
}

impl Default for EntityTemplate {
    fn default() -> Self {
        Self {
            max_health: Some(100.0),
            radius: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRole {
    Pooled,
    Actor,
    Target,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub prefab: Option<PrefabKey>,
    pub role: EntityRole,
    pub transform: Transform,
    pub radius: f32,
    pub active: bool,
    pub health: Option<Health>,
    death_reported: bool,
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("no template registered for prefab '{key}'")]
    UnknownTemplate { key: PrefabKey },
    #[error("entity {0:?} does not exist")]
    UnknownEntity(EntityId),
}

/// Headless in-memory world: flat ground, sphere colliders, one health pool per entity.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    templates: HashMap<PrefabKey, EntityTemplate>,
    ground_height: Option<f32>,
}

impl SceneWorld {
    pub fn with_ground(ground_height: f32) -> Self {
        Self {
            ground_height: Some(ground_height),
            ..Self::default()
        }
    }

    pub fn ground_height(&self) -> Option<f32> {
        self.ground_height
    }

    pub fn register_template(&mut self, key: PrefabKey, template: EntityTemplate) {
        self.templates.insert(key, template);
    }

    /// Spawns an active, health-less actor such as a boss body.
    pub fn spawn_actor(&mut self, transform: Transform, radius: f32) -> EntityId {
        self.push_entity(None, EntityRole::Actor, transform, radius, true, None)
    }

    /// Spawns an active entity that hostile controllers may acquire.
    pub fn spawn_target(&mut self, transform: Transform, radius: f32, max_health: f32) -> EntityId {
        self.push_entity(
            None,
            EntityRole::Target,
            transform,
            radius,
            true,
            Some(Health::new(max_health)),
        )
    }

    fn push_entity(
        &mut self,
        prefab: Option<PrefabKey>,
        role: EntityRole,
        transform: Transform,
        radius: f32,
        active: bool,
        health: Option<Health>,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.entities.push(Entity {
            id,
            prefab,
            role,
            transform,
            radius: radius.max(0.0),
            active,
            health,
            death_reported: false,
        });
        id
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn active_count(&self) -> usize {
        self.entities.iter().filter(|entity| entity.active).count()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        let Some(entity) = self.find_entity_mut(id) else {
            return false;
        };
        entity.transform.position = position;
        true
    }

    pub fn set_yaw(&mut self, id: EntityId, yaw_radians: f32) -> bool {
        let Some(entity) = self.find_entity_mut(id) else {
            return false;
        };
        entity.transform.yaw_radians = yaw_radians;
        true
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        self.find_entity(id).is_some_and(|entity| entity.active)
    }
}

impl EntityLifecycle for SceneWorld {
    fn has_template(&self, key: &PrefabKey) -> bool {
        self.templates.contains_key(key)
    }

    fn create(&mut self, key: &PrefabKey) -> Result<EntityId, LifecycleError> {
        let Some(template) = self.templates.get(key).copied() else {
            return Err(LifecycleError::UnknownTemplate { key: key.clone() });
        };
        let id = self.push_entity(
            Some(key.clone()),
            EntityRole::Pooled,
            Transform::default(),
            template.radius,
            false,
            template.max_health.map(Health::new),
        );
        debug!(entity = id.0, key = %key, "entity_created");
        Ok(id)
    }

    fn destroy(&mut self, id: EntityId) -> Result<(), LifecycleError> {
        let before = self.entities.len();
        self.entities.retain(|entity| entity.id != id);
        if self.entities.len() == before {
            return Err(LifecycleError::UnknownEntity(id));
        }
        debug!(entity = id.0, "entity_destroyed");
        Ok(())
    }

    fn activate(&mut self, id: EntityId, transform: Transform) -> Result<(), LifecycleError> {
        let Some(entity) = self.find_entity_mut(id) else {
            return Err(LifecycleError::UnknownEntity(id));
        };
        entity.transform = transform;
        entity.active = true;
        entity.death_reported = false;
        if let Some(health) = entity.health.as_mut() {
            health.restore_full();
        }
        Ok(())
    }

    fn deactivate(&mut self, id: EntityId) -> Result<(), LifecycleError> {
        let Some(entity) = self.find_entity_mut(id) else {
            return Err(LifecycleError::UnknownEntity(id));
        };
        entity.active = false;
        Ok(())
    }
}

impl SpatialQuery for SceneWorld {
    fn surface_below(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        let ground = self.ground_height?;
        let drop = point.y - ground;
        if drop < 0.0 || drop > max_distance {
            return None;
        }
        Some(Vec3::new(point.x, ground, point.z))
    }

    fn entities_within(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let radius_sq = radius * radius;
        let mut ids = self
            .entities
            .iter()
            .filter(|entity| entity.active)
            .filter(|entity| (entity.transform.position - center).length_sq() <= radius_sq)
            .map(|entity| entity.id)
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    fn raycast(&self, from: Vec3, to: Vec3, ignore: Option<EntityId>) -> Option<RayHit> {
        let segment = to - from;
        let length = segment.length();
        if length <= RAY_EPSILON {
            return None;
        }
        let direction = segment * (1.0 / length);

        let mut best: Option<RayHit> = None;
        for entity in &self.entities {
            if !entity.active || Some(entity.id) == ignore || entity.radius <= 0.0 {
                continue;
            }
            let offset = from - entity.transform.position;
            let b = offset.dot(direction);
            let c = offset.length_sq() - entity.radius * entity.radius;
            if c > 0.0 && b > 0.0 {
                continue;
            }
            let discriminant = b * b - c;
            if discriminant < 0.0 {
                continue;
            }
            let distance = (-b - discriminant.sqrt()).max(0.0);
            if distance > length {
                continue;
            }
            if best.is_some_and(|hit| hit.distance <= distance) {
                continue;
            }
            best = Some(RayHit {
                entity: Some(entity.id),
                point: from + direction * distance,
                distance,
            });
        }
        best
    }

    fn locate_target(&self, from: Vec3, radius: f32) -> Option<TargetInfo> {
        let radius_sq = radius * radius;
        self.entities
            .iter()
            .filter(|entity| entity.active && entity.role == EntityRole::Target)
            .filter(|entity| !entity.health.is_some_and(|health| health.is_depleted()))
            .map(|entity| {
                let distance_sq = (entity.transform.position - from).length_sq();
                (entity, distance_sq)
            })
            .filter(|(_, distance_sq)| *distance_sq <= radius_sq)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(entity, _)| TargetInfo {
                entity: entity.id,
                position: entity.transform.position,
                forward: entity.transform.forward(),
            })
    }
}

impl HealthRegistry for SceneWorld {
    fn health_sink(&mut self, id: EntityId) -> Option<&mut dyn HealthSink> {
        let entity = self
            .entities
            .iter_mut()
            .find(|entity| entity.id == id && entity.active)?;
        entity
            .health
            .as_mut()
            .map(|health| health as &mut dyn HealthSink)
    }

    fn drain_deaths(&mut self) -> Vec<EntityId> {
        let mut deaths = Vec::new();
        for entity in &mut self.entities {
            if !entity.active || entity.death_reported {
                continue;
            }
            if entity.health.is_some_and(|health| health.is_depleted()) {
                entity.death_reported = true;
                deaths.push(entity.id);
            }
        }
        deaths
    }
}
