use super::capabilities::NavAgent;
use super::scene::Vec3;

/// Straight-line agent used by the headless world. No obstacle avoidance.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicAgent {
    position: Vec3,
    velocity: Vec3,
    destination: Option<Vec3>,
    speed: f32,
    stopping_distance: f32,
}

impl KinematicAgent {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            destination: None,
            speed: 0.0,
            stopping_distance: 0.0,
        }
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    pub fn step(&mut self, dt_seconds: f32) {
        if dt_seconds <= 0.0 {
            return;
        }
        let Some(destination) = self.destination else {
            self.velocity = Vec3::ZERO;
            return;
        };
        let offset = (destination - self.position).horizontal();
        let distance = offset.length();
        let travel = distance - self.stopping_distance;
        if travel <= 0.0 || self.speed <= 0.0 {
            self.velocity = Vec3::ZERO;
            return;
        }
        let direction = offset.normalized_or_zero();
        let step = (self.speed * dt_seconds).min(travel);
        self.position = self.position + direction * step;
        self.velocity = direction * (step / dt_seconds);
    }
}

impl NavAgent for KinematicAgent {
    fn set_destination(&mut self, destination: Vec3, speed: f32) {
        self.destination = Some(destination);
        self.speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
    }

    fn hold_position(&mut self) {
        self.destination = None;
        self.velocity = Vec3::ZERO;
    }

    fn set_stopping_distance(&mut self, distance: f32) {
        self.stopping_distance = distance.max(0.0);
    }

    fn warp(&mut self, position: Vec3) {
        self.position = position;
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_toward_destination_and_stops_short() {
        let mut agent = KinematicAgent::new(Vec3::ZERO);
        agent.set_stopping_distance(1.0);
        agent.set_destination(Vec3::new(0.0, 0.0, 5.0), 2.0);

        agent.step(1.0);
        assert!((agent.position().z - 2.0).abs() < 1e-5);
        assert!((agent.velocity().z - 2.0).abs() < 1e-5);

        agent.step(10.0);
        assert!((agent.position().z - 4.0).abs() < 1e-5);

        agent.step(1.0);
        assert_eq!(agent.velocity(), Vec3::ZERO);
    }

    #[test]
    fn zero_dt_and_hold_do_not_move() {
        let mut agent = KinematicAgent::new(Vec3::ZERO);
        agent.set_destination(Vec3::new(3.0, 0.0, 0.0), 1.0);
        agent.step(0.0);
        assert_eq!(agent.position(), Vec3::ZERO);

        agent.hold_position();
        agent.step(1.0);
        assert_eq!(agent.position(), Vec3::ZERO);
        assert_eq!(agent.destination(), None);
    }
}
