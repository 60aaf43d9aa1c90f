//! Proptest generators for Pawlink value types.

use proptest::prelude::*;

use pawlink_core::{Effect, Stats, STAT_MAX, STAT_MIN};

/// Any in-bounds stats value.
pub fn arb_stats() -> impl Strategy<Value = Stats> {
    (
        STAT_MIN..=STAT_MAX,
        STAT_MIN..=STAT_MAX,
        STAT_MIN..=STAT_MAX,
    )
        .prop_map(|(energy, fullness, happiness)| Stats::new(energy, fullness, happiness))
}

/// Any sparse effect, with deltas well beyond the stat bounds.
pub fn arb_effect() -> impl Strategy<Value = Effect> {
    let delta = proptest::option::of(-500i32..=500);
    (delta.clone(), delta.clone(), delta).prop_map(|(energy, fullness, happiness)| Effect {
        energy,
        fullness,
        happiness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_generated_stats_are_in_bounds(stats in arb_stats()) {
            prop_assert!(stats.in_bounds());
        }

        #[test]
        fn prop_effects_preserve_bounds(stats in arb_stats(), effect in arb_effect()) {
            let mut stats = stats;
            stats.apply(&effect);
            prop_assert!(stats.in_bounds());
        }
    }
}
