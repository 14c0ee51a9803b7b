use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use super::metrics::MetricsAccumulator;
use super::{LoopMetricsSnapshot, MetricsHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimControl {
    Continue,
    Stop,
}

pub trait Simulation {
    fn update(&mut self, fixed_dt_seconds: f32) -> SimControl;
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    /// Hard stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Pace ticks against the wall clock instead of stepping as fast as possible.
    pub realtime: bool,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_ticks: None,
            realtime: false,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunnerError {
    #[error("target_tps must be greater than zero")]
    ZeroTickRate,
}

pub fn run_headless(
    config: LoopConfig,
    sim: &mut dyn Simulation,
) -> Result<LoopMetricsSnapshot, RunnerError> {
    run_headless_with_metrics(config, sim, MetricsHandle::default())
}

pub fn run_headless_with_metrics(
    config: LoopConfig,
    sim: &mut dyn Simulation,
    metrics_handle: MetricsHandle,
) -> Result<LoopMetricsSnapshot, RunnerError> {
    if config.target_tps == 0 {
        return Err(RunnerError::ZeroTickRate);
    }
    let fixed_dt = Duration::from_secs_f64(1.0 / f64::from(config.target_tps));
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));

    info!(
        target_tps = config.target_tps,
        max_ticks = ?config.max_ticks,
        realtime = config.realtime,
        max_ticks_per_frame,
        "loop_config"
    );

    let mut metrics = MetricsAccumulator::new(metrics_log_interval);
    if config.max_ticks == Some(0) {
        let snapshot = metrics.flush(Instant::now());
        metrics_handle.publish(snapshot);
        return Ok(snapshot);
    }

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    loop {
        let ticks_to_run = if config.realtime {
            let now = Instant::now();
            let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
            last_frame_instant = now;
            accumulator =
                accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
            let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
            accumulator = step_plan.remaining_accumulator;
            if step_plan.dropped_backlog > Duration::ZERO {
                warn!(
                    dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                    max_ticks_per_frame, "sim_clamp_triggered"
                );
            }
            step_plan.ticks_to_run
        } else {
            1
        };

        for _ in 0..ticks_to_run {
            let tick_start = Instant::now();
            let control = sim.update(fixed_dt_seconds);
            metrics.record_tick(tick_start.elapsed());

            let tick_limit_hit = config
                .max_ticks
                .is_some_and(|max_ticks| metrics.total_ticks() >= max_ticks);
            if control == SimControl::Stop || tick_limit_hit {
                let snapshot = metrics.flush(Instant::now());
                metrics_handle.publish(snapshot);
                info!(
                    total_ticks = snapshot.total_ticks,
                    reason = if control == SimControl::Stop {
                        "simulation_stop"
                    } else {
                        "tick_limit"
                    },
                    "loop_finished"
                );
                return Ok(snapshot);
            }
        }

        if let Some(snapshot) = metrics.maybe_snapshot(Instant::now()) {
            metrics_handle.publish(snapshot);
            info!(
                tps = snapshot.tps,
                tick_time_ms = snapshot.tick_time_ms,
                total_ticks = snapshot.total_ticks,
                "loop_metrics"
            );
        }

        if config.realtime && ticks_to_run == 0 {
            thread::sleep(fixed_dt.saturating_sub(accumulator));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
