use rand::Rng;

use crate::config::PrefabEntry;

fn selectable_weight(entry: &PrefabEntry) -> f64 {
    if entry.weight.is_finite() && entry.weight > 0.0 {
        f64::from(entry.weight)
    } else {
        0.0
    }
}

/// Summed in f64 so any number of finite f32 weights stays finite.
pub fn total_weight(entries: &[PrefabEntry]) -> f64 {
    entries.iter().map(selectable_weight).sum()
}

/// Weighted pick. `None` when no entry has positive weight.
pub fn pick_weighted<'a, R: Rng + ?Sized>(
    entries: &'a [PrefabEntry],
    rng: &mut R,
) -> Option<&'a PrefabEntry> {
    let total = total_weight(entries);
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    let roll = rng.gen_range(0.0..total);
    pick_with_roll(entries, roll)
}

/// Walks the cumulative weights and returns the first entry reaching `roll`.
/// Accumulation drift past the end falls back to the first positive entry.
pub fn pick_with_roll(entries: &[PrefabEntry], roll: f64) -> Option<&PrefabEntry> {
    let mut cumulative = 0.0;
    for entry in entries {
        let weight = selectable_weight(entry);
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        if cumulative >= roll {
            return Some(entry);
        }
    }
    entries.iter().find(|entry| selectable_weight(entry) > 0.0)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn frequencies_follow_weights() {
        let entries = vec![PrefabEntry::new("light", 1.0), PrefabEntry::new("heavy", 3.0)];
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let draws = 10_000;
        let mut heavy = 0u32;
        for _ in 0..draws {
            let entry = pick_weighted(&entries, &mut rng).expect("selectable");
            if entry.key.as_str() == "heavy" {
                heavy += 1;
            }
        }
        let heavy_share = heavy as f32 / draws as f32;
        assert!((heavy_share - 0.75).abs() <= 0.03, "heavy share {heavy_share}");
        assert!(((1.0 - heavy_share) - 0.25).abs() <= 0.03);
    }

    #[test]
    fn zero_total_weight_selects_nothing() {
        let entries = vec![PrefabEntry::new("a", 0.0), PrefabEntry::new("b", -2.0)];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_weighted(&entries, &mut rng).is_none());
        assert!(pick_weighted(&[], &mut rng).is_none());
    }

    #[test]
    fn huge_weights_do_not_overflow_the_roll() {
        let entries = vec![
            PrefabEntry::new("a", f32::MAX),
            PrefabEntry::new("b", f32::MAX),
        ];
        assert!(total_weight(&entries).is_finite());
        let mut rng = StdRng::seed_from_u64(9);
        let mut seen_b = false;
        for _ in 0..64 {
            let entry = pick_weighted(&entries, &mut rng).expect("selectable");
            seen_b |= entry.key.as_str() == "b";
        }
        assert!(seen_b);
    }

    #[test]
    fn zero_weight_entries_are_skipped() {
        let entries = vec![
            PrefabEntry::new("never", 0.0),
            PrefabEntry::new("a", 1.0),
            PrefabEntry::new("b", 1.0),
        ];
        assert_eq!(pick_with_roll(&entries, 0.0).map(|e| e.key.as_str()), Some("a"));
        assert_eq!(pick_with_roll(&entries, 1.5).map(|e| e.key.as_str()), Some("b"));
    }

    #[test]
    fn overshooting_roll_falls_back_to_first_positive() {
        let entries = vec![PrefabEntry::new("never", 0.0), PrefabEntry::new("a", 1.0)];
        assert_eq!(pick_with_roll(&entries, 5.0).map(|e| e.key.as_str()), Some("a"));
    }
}
