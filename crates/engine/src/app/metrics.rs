use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub tps: f32,
    pub tick_time_ms: f32,
    pub total_ticks: u64,
}

#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(LoopMetricsSnapshot::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    ticks: u32,
    total_ticks: u64,
    tick_time_sum: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            ticks: 0,
            total_ticks: 0,
            tick_time_sum: Duration::ZERO,
        }
    }

    pub(crate) fn record_tick(&mut self, tick_time: Duration) {
        self.ticks = self.ticks.saturating_add(1);
        self.total_ticks = self.total_ticks.saturating_add(1);
        self.tick_time_sum = self.tick_time_sum.saturating_add(tick_time);
    }

    pub(crate) fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }
        Some(self.snapshot_and_reset(now, elapsed))
    }

    /// Final snapshot regardless of interval, used when the loop exits.
    pub(crate) fn flush(&mut self, now: Instant) -> LoopMetricsSnapshot {
        let elapsed = now.saturating_duration_since(self.interval_start);
        self.snapshot_and_reset(now, elapsed)
    }

    fn snapshot_and_reset(&mut self, now: Instant, elapsed: Duration) -> LoopMetricsSnapshot {
        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let tick_time_ms = if self.ticks == 0 {
            0.0
        } else {
            (self.tick_time_sum.as_secs_f32() / self.ticks as f32) * 1000.0
        };

        let snapshot = LoopMetricsSnapshot {
            tps: self.ticks as f32 / elapsed_seconds,
            tick_time_ms,
            total_ticks: self.total_ticks,
        };

        self.interval_start = now;
        self.ticks = 0;
        self.tick_time_sum = Duration::ZERO;

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use std::sync::RwLock;
    use std::thread;

    use super::*;

    fn poison_lock(lock: &RwLock<LoopMetricsSnapshot>) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = lock.write().expect("write guard");
                    panic!("poison metrics lock");
                })
                .join();
        });
    }

    #[test]
    fn snapshot_computes_expected_values() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let base = Instant::now();

        for _ in 0..4 {
            accumulator.record_tick(Duration::from_millis(2));
        }

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(1))
            .expect("snapshot should be emitted");

        assert!((snapshot.tps - 4.0).abs() < 0.05);
        assert!((snapshot.tick_time_ms - 2.0).abs() < 0.001);
        assert_eq!(snapshot.total_ticks, 4);
    }

    #[test]
    fn snapshot_not_emitted_before_interval() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_secs(1));
        let base = Instant::now();
        accumulator.record_tick(Duration::from_millis(2));

        assert!(accumulator
            .maybe_snapshot(base + Duration::from_millis(500))
            .is_none());
    }

    #[test]
    fn total_ticks_survive_interval_reset() {
        let mut accumulator = MetricsAccumulator::new(Duration::from_millis(1));
        let base = Instant::now();
        accumulator.record_tick(Duration::ZERO);
        accumulator.flush(base + Duration::from_secs(1));
        accumulator.record_tick(Duration::ZERO);

        let snapshot = accumulator.flush(base + Duration::from_secs(2));
        assert_eq!(snapshot.total_ticks, 2);
        assert_eq!(accumulator.total_ticks(), 2);
    }

    #[test]
    fn publish_recovers_after_poison_without_panic() {
        let handle = MetricsHandle::default();
        poison_lock(handle.snapshot.as_ref());

        let expected = LoopMetricsSnapshot {
            tps: 60.0,
            tick_time_ms: 1.5,
            total_ticks: 42,
        };
        handle.publish(expected);

        assert_eq!(handle.snapshot(), expected);
    }
}
