use tracing::debug;

pub const TIME_SCALE_DEFAULT: f32 = 1.0;
pub const TIME_SCALE_MAX: f32 = 8.0;

/// Scaled simulation clock. A paused clock hands out zero-length steps.
#[derive(Debug, Clone)]
pub struct SimClock {
    time_scale: f32,
    paused: bool,
    elapsed_seconds: f64,
    tick_count: u64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            time_scale: TIME_SCALE_DEFAULT,
            paused: false,
            elapsed_seconds: 0.0,
            tick_count: 0,
        }
    }
}

impl SimClock {
    /// Advances by one tick of `real_dt_seconds` and returns the scaled step.
    pub fn advance(&mut self, real_dt_seconds: f32) -> f32 {
        self.tick_count = self.tick_count.saturating_add(1);
        if self.paused || !real_dt_seconds.is_finite() || real_dt_seconds <= 0.0 {
            return 0.0;
        }
        let dt = real_dt_seconds * self.time_scale;
        self.elapsed_seconds += f64::from(dt);
        dt
    }

    pub fn pause(&mut self) {
        if !self.paused {
            debug!(elapsed_seconds = self.elapsed_seconds, "sim_paused");
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            debug!(elapsed_seconds = self.elapsed_seconds, "sim_resumed");
        }
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = clamp_time_scale(time_scale);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

fn clamp_time_scale(time_scale: f32) -> f32 {
    if !time_scale.is_finite() {
        return TIME_SCALE_DEFAULT;
    }
    time_scale.clamp(0.0, TIME_SCALE_MAX)
}
