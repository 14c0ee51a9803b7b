use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BossPhase {
    Phase1Ranged,
    Phase2Ranged,
    Phase3MeleeSummon,
}

impl BossPhase {
    /// Thresholds are inclusive: a fraction equal to a threshold already
    /// belongs to the later phase.
    pub fn for_health_fraction(
        fraction: f32,
        phase2_threshold: f32,
        phase3_threshold: f32,
    ) -> Self {
        if fraction <= phase3_threshold {
            Self::Phase3MeleeSummon
        } else if fraction <= phase2_threshold {
            Self::Phase2Ranged
        } else {
            Self::Phase1Ranged
        }
    }

    pub fn is_ranged(self) -> bool {
        !matches!(self, Self::Phase3MeleeSummon)
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Phase1Ranged => "phase1_ranged",
            Self::Phase2Ranged => "phase2_ranged",
            Self::Phase3MeleeSummon => "phase3_melee_summon",
        }
    }
}

impl fmt::Display for BossPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(BossPhase::for_health_fraction(1.0, 0.7, 0.4), BossPhase::Phase1Ranged);
        assert_eq!(BossPhase::for_health_fraction(0.71, 0.7, 0.4), BossPhase::Phase1Ranged);
        assert_eq!(BossPhase::for_health_fraction(0.70, 0.7, 0.4), BossPhase::Phase2Ranged);
        assert_eq!(BossPhase::for_health_fraction(0.41, 0.7, 0.4), BossPhase::Phase2Ranged);
        assert_eq!(BossPhase::for_health_fraction(0.40, 0.7, 0.4), BossPhase::Phase3MeleeSummon);
        assert_eq!(BossPhase::for_health_fraction(0.0, 0.7, 0.4), BossPhase::Phase3MeleeSummon);
    }
}
