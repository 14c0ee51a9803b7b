use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

/// Piecewise-linear curve over normalized time. Values outside the key range
/// clamp to the nearest key; an empty curve is constant 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct RateCurve {
    keys: Vec<CurveKey>,
}

impl From<Vec<CurveKey>> for RateCurve {
    fn from(keys: Vec<CurveKey>) -> Self {
        Self::new(keys)
    }
}

impl From<RateCurve> for Vec<CurveKey> {
    fn from(curve: RateCurve) -> Self {
        curve.keys
    }
}

impl RateCurve {
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.retain(|key| key.time.is_finite() && key.value.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 1.0;
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if time > b.time {
                continue;
            }
            let span = b.time - a.time;
            if span <= f32::EPSILON {
                return b.value;
            }
            let t = (time - a.time) / span;
            return a.value + (b.value - a.value) * t;
        }
        last.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(time: f32, value: f32) -> CurveKey {
        CurveKey { time, value }
    }

    #[test]
    fn empty_curve_is_neutral() {
        assert_eq!(RateCurve::default().evaluate(0.3), 1.0);
    }

    #[test]
    fn interpolates_between_keys_and_clamps_outside() {
        let curve = RateCurve::new(vec![key(1.0, 0.25), key(0.0, 1.0)]);
        assert_eq!(curve.evaluate(-1.0), 1.0);
        assert!((curve.evaluate(0.5) - 0.625).abs() < 1e-6);
        assert_eq!(curve.evaluate(2.0), 0.25);
    }

    #[test]
    fn deserializes_from_key_list() {
        let curve: RateCurve =
            serde_json::from_str(r#"[{ "time": 1.0, "value": 0.5 }, { "time": 0.0, "value": 1.0 }]"#)
                .expect("curve json");
        assert_eq!(curve.keys()[0].time, 0.0);
        assert!((curve.evaluate(0.5) - 0.75).abs() < 1e-6);
    }
}
