//! Cooperative routines driven by the owner's tick.
//!
//! A routine is plain data (usually an enum of stages) owned by a [`Tasks`] runner.
//! Each tick the owner calls [`Tasks::advance`], runs every due routine with full
//! access to its own state, then hands the routine back with [`Tasks::resume`]
//! together with the next suspension point. Cancelling a task removes it
//! immediately; a routine that was cancelled while it ran is dropped on resume.

/// Waits shorter than this count as elapsed. Absorbs f32 drift from fixed steps.
pub const TIME_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wait {
    /// Resume on the next tick that advances time.
    NextTick,
    /// A non-finite duration parks the task until it is cancelled.
    Seconds(f32),
    Done,
}

#[derive(Debug, Clone)]
struct TaskSlot<R> {
    id: TaskId,
    routine: R,
    remaining_seconds: f32,
}

#[derive(Debug, Clone)]
pub struct Tasks<R> {
    next_task_id: u64,
    slots: Vec<TaskSlot<R>>,
}

impl<R> Default for Tasks<R> {
    fn default() -> Self {
        Self {
            next_task_id: 0,
            slots: Vec::new(),
        }
    }
}

impl<R: Clone> Tasks<R> {
    pub fn spawn(&mut self, routine: R, first: Wait) -> TaskId {
        let id = TaskId(self.next_task_id);
        self.next_task_id = self.next_task_id.saturating_add(1);
        if let Some(remaining_seconds) = wait_seconds(first) {
            self.slots.push(TaskSlot {
                id,
                routine,
                remaining_seconds,
            });
        }
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != id);
        self.slots.len() != before
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.slots.len();
        self.slots.clear();
        cancelled
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Pending task ids in spawn order.
    pub fn ids(&self) -> Vec<TaskId> {
        self.slots.iter().map(|slot| slot.id).collect()
    }

    pub fn remaining_seconds(&self, id: TaskId) -> Option<f32> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.remaining_seconds.max(0.0))
    }

    pub fn routine(&self, id: TaskId) -> Option<&R> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| &slot.routine)
    }

    /// Counts down every wait by `dt_seconds` and returns the routines that are due,
    /// in spawn order. A zero or negative step (paused clock) touches nothing.
    pub fn advance(&mut self, dt_seconds: f32) -> Vec<(TaskId, R)> {
        if !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return Vec::new();
        }
        let mut due = Vec::new();
        for slot in &mut self.slots {
            slot.remaining_seconds -= dt_seconds;
            if slot.remaining_seconds <= TIME_EPSILON {
                due.push((slot.id, slot.routine.clone()));
            }
        }
        due
    }

    /// Returns `false` when the task was cancelled in the meantime.
    pub fn resume(&mut self, id: TaskId, routine: R, wait: Wait) -> bool {
        let Some(index) = self.slots.iter().position(|slot| slot.id == id) else {
            return false;
        };
        match wait_seconds(wait) {
            Some(remaining_seconds) => {
                let slot = &mut self.slots[index];
                slot.routine = routine;
                slot.remaining_seconds = remaining_seconds;
            }
            None => {
                self.slots.remove(index);
            }
        }
        true
    }
}

fn wait_seconds(wait: Wait) -> Option<f32> {
    match wait {
        Wait::NextTick => Some(0.0),
        Wait::Seconds(seconds) if seconds.is_finite() => Some(seconds.max(0.0)),
        Wait::Seconds(_) => Some(f32::INFINITY),
        Wait::Done => None,
    }
}

/// Single restartable countdown for cooldowns that need no routine state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Countdown {
    remaining_seconds: Option<f32>,
}

impl Countdown {
    /// A non-finite duration never elapses; `clear` stops it.
    pub fn start(&mut self, seconds: f32) {
        self.remaining_seconds = Some(if seconds.is_finite() {
            seconds.max(0.0)
        } else {
            f32::INFINITY
        });
    }

    pub fn clear(&mut self) {
        self.remaining_seconds = None;
    }

    pub fn is_running(&self) -> bool {
        self.remaining_seconds.is_some()
    }

    pub fn remaining_seconds(&self) -> Option<f32> {
        self.remaining_seconds
    }

    /// Returns `true` on the tick the countdown elapses.
    pub fn tick(&mut self, dt_seconds: f32) -> bool {
        if !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return false;
        }
        let Some(remaining) = self.remaining_seconds else {
            return false;
        };
        let remaining = remaining - dt_seconds;
        if remaining <= TIME_EPSILON {
            self.remaining_seconds = None;
            true
        } else {
            self.remaining_seconds = Some(remaining);
            false
        }
    }
}
