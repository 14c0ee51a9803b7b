mod capabilities;
mod clock;
mod loop_runner;
mod metrics;
mod nav;
mod scene;
mod tasks;

pub use capabilities::{
    EntityLifecycle, HealthRegistry, HealthSink, NavAgent, RayHit, SimWorld, SpatialQuery,
    TargetInfo,
};
pub use clock::{SimClock, TIME_SCALE_DEFAULT, TIME_SCALE_MAX};
pub use loop_runner::{
    run_headless, run_headless_with_metrics, LoopConfig, RunnerError, SimControl, Simulation,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use nav::KinematicAgent;
pub use scene::{
    DamageType, Entity, EntityId, EntityIdAllocator, EntityRole, EntityTemplate, Health,
    LifecycleError, PrefabKey, SceneWorld, Transform, Vec3,
};
pub use tasks::{Countdown, TaskId, Tasks, Wait, TIME_EPSILON};
