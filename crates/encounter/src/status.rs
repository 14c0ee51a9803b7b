use engine::{TaskId, Tasks, Wait};
use tracing::{debug, warn};

pub const SPEED_MULTIPLIER_MIN: f32 = 0.1;
pub const SPEED_MULTIPLIER_MAX: f32 = 2.0;
pub const SPEED_MULTIPLIER_NEUTRAL: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreezeExpiry;

/// Single-slot movement-speed modifier. A new freeze replaces the running one,
/// including its remaining duration.
#[derive(Debug, Clone)]
pub struct StatusEffect {
    multiplier: f32,
    timer: Option<TaskId>,
    tasks: Tasks<FreezeExpiry>,
}

impl Default for StatusEffect {
    fn default() -> Self {
        Self {
            multiplier: SPEED_MULTIPLIER_NEUTRAL,
            timer: None,
            tasks: Tasks::default(),
        }
    }
}

impl StatusEffect {
    pub fn apply_freeze(&mut self, slow_fraction: f32, duration_seconds: f32) {
        if !slow_fraction.is_finite() || !duration_seconds.is_finite() {
            warn!(slow_fraction, duration_seconds, "freeze_ignored_non_finite");
            return;
        }
        self.multiplier =
            (1.0 - slow_fraction).clamp(SPEED_MULTIPLIER_MIN, SPEED_MULTIPLIER_MAX);
        if let Some(previous) = self.timer.take() {
            self.tasks.cancel(previous);
        }
        self.timer = Some(
            self.tasks
                .spawn(FreezeExpiry, Wait::Seconds(duration_seconds.max(0.0))),
        );
        debug!(
            multiplier = self.multiplier,
            duration_seconds, "freeze_applied"
        );
    }

    /// Returns `true` on the tick the effect expires.
    pub fn tick(&mut self, dt_seconds: f32) -> bool {
        let Some(timer) = self.timer else {
            return false;
        };
        let mut expired = false;
        for (id, routine) in self.tasks.advance(dt_seconds) {
            self.tasks.resume(id, routine, Wait::Done);
            if id == timer {
                expired = true;
            }
        }
        if expired {
            self.reset();
            debug!("freeze_expired");
        }
        expired
    }

    pub fn clear(&mut self) {
        self.tasks.cancel_all();
        self.reset();
    }

    fn reset(&mut self) {
        self.multiplier = SPEED_MULTIPLIER_NEUTRAL;
        self.timer = None;
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    pub fn timer(&self) -> Option<TaskId> {
        self.timer
    }

    pub fn remaining_seconds(&self) -> Option<f32> {
        self.timer.and_then(|id| self.tasks.remaining_seconds(id))
    }
}

pub fn effective_speed(base_speed: f32, status_multiplier: f32, phase_multiplier: f32) -> f32 {
    (base_speed * status_multiplier * phase_multiplier).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.1;

    fn run_ticks(status: &mut StatusEffect, ticks: u32) -> bool {
        let mut expired = false;
        for _ in 0..ticks {
            expired |= status.tick(DT);
        }
        expired
    }

    #[test]
    fn multiplier_is_clamped() {
        let mut status = StatusEffect::default();
        status.apply_freeze(0.95, 1.0);
        assert_eq!(status.multiplier(), SPEED_MULTIPLIER_MIN);
        status.apply_freeze(-3.0, 1.0);
        assert_eq!(status.multiplier(), SPEED_MULTIPLIER_MAX);
    }

    #[test]
    fn reapplying_restarts_instead_of_extending() {
        // Timeline starts at t = 10.
        let mut status = StatusEffect::default();
        status.apply_freeze(0.6, 4.0);
        assert!((status.multiplier() - 0.4).abs() < 1e-6);
        let first_timer = status.timer();

        // t = 12
        assert!(!run_ticks(&mut status, 20));
        assert!((status.multiplier() - 0.4).abs() < 1e-6);
        status.apply_freeze(0.5, 3.0);
        assert!((status.multiplier() - 0.5).abs() < 1e-6);
        assert_ne!(status.timer(), first_timer);

        // t = 14.9: the superseded timer would have expired at 14.
        assert!(!run_ticks(&mut status, 29));
        assert!((status.multiplier() - 0.5).abs() < 1e-6);

        // t = 15
        assert!(run_ticks(&mut status, 1));
        assert_eq!(status.multiplier(), SPEED_MULTIPLIER_NEUTRAL);
        assert!(status.timer().is_none());
    }

    #[test]
    fn paused_ticks_do_not_consume_duration() {
        let mut status = StatusEffect::default();
        status.apply_freeze(0.5, 1.0);
        for _ in 0..500 {
            assert!(!status.tick(0.0));
        }
        assert_eq!(status.remaining_seconds(), Some(1.0));
        assert!(run_ticks(&mut status, 10));
    }

    #[test]
    fn clear_resets_to_neutral() {
        let mut status = StatusEffect::default();
        status.apply_freeze(0.5, 5.0);
        status.clear();
        assert!(!status.is_active());
        assert_eq!(status.multiplier(), SPEED_MULTIPLIER_NEUTRAL);
        assert!(!run_ticks(&mut status, 60));
    }

    #[test]
    fn effective_speed_combines_multipliers() {
        assert!((effective_speed(4.0, 0.5, 1.5) - 3.0).abs() < 1e-6);
        assert_eq!(effective_speed(4.0, 1.0, 1.0), 4.0);
    }
}
