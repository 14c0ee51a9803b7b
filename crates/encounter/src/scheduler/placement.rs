use std::f32::consts::TAU;

use engine::{SpatialQuery, Transform, Vec3};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use crate::config::SpawnerConfig;

/// Picks where the next spawn goes. Always resolves: explicit spawn point, else a
/// probed surface near the fallback center, else the center height itself.
pub fn resolve_spawn_transform<S, R>(config: &SpawnerConfig, world: &S, rng: &mut R) -> Transform
where
    S: SpatialQuery + ?Sized,
    R: Rng + ?Sized,
{
    if let Some(point) = config.spawn_points.choose(rng) {
        return *point;
    }

    let fallback = &config.fallback;
    let center = fallback.center.unwrap_or(config.origin);
    let sample = scatter_around(center, fallback.radius, rng);
    let yaw_radians = rng.gen_range(0.0..TAU);

    let probe_start = sample + Vec3::new(0.0, fallback.probe_height.max(0.0), 0.0);
    if let Some(surface) = world.surface_below(probe_start, fallback.max_probe_distance.max(0.0)) {
        return Transform {
            position: surface,
            yaw_radians,
        };
    }

    trace!(x = sample.x, z = sample.z, "spawn_surface_not_found");
    Transform {
        position: sample,
        yaw_radians,
    }
}

/// Uniform point on the horizontal disk around `center`, keeping its height.
pub fn scatter_around<R: Rng + ?Sized>(center: Vec3, radius: f32, rng: &mut R) -> Vec3 {
    let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
    if radius <= 0.0 {
        return center;
    }
    let angle = rng.gen_range(0.0..TAU);
    let distance = radius * rng.gen::<f32>().sqrt();
    center + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance)
}
