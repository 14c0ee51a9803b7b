use engine::DamageType;

use crate::boss::BossPhase;

/// Stateless lookup shared by every boss instance.
pub fn resistance_multiplier(phase: BossPhase, kind: DamageType) -> f32 {
    match (phase, kind) {
        (BossPhase::Phase1Ranged, DamageType::Fire) => 0.5,
        (BossPhase::Phase2Ranged, DamageType::Fire) => 1.25,
        (BossPhase::Phase2Ranged, DamageType::Lightning) => 0.5,
        _ => 1.0,
    }
}

pub fn apply_resistance(phase: BossPhase, kind: DamageType, raw_amount: f32) -> f32 {
    if !raw_amount.is_finite() || raw_amount <= 0.0 {
        return 0.0;
    }
    raw_amount * resistance_multiplier(phase, kind)
}
