pub mod app;

pub use app::{
    run_headless, run_headless_with_metrics, Countdown, DamageType, Entity, EntityId,
    EntityIdAllocator, EntityLifecycle, EntityRole, EntityTemplate, Health, HealthRegistry,
    HealthSink, KinematicAgent, LifecycleError, LoopConfig, LoopMetricsSnapshot, MetricsHandle,
    NavAgent, PrefabKey, RayHit, RunnerError, SceneWorld, SimClock, SimControl, SimWorld,
    Simulation, SpatialQuery, TargetInfo, TaskId, Tasks, Transform, Vec3, Wait, TIME_EPSILON,
    TIME_SCALE_DEFAULT, TIME_SCALE_MAX,
};
