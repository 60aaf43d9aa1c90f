//! The sleep cycle: what one decay tick does and when it ends.
//!
//! The timer that drives ticks lives in the facade crate; this module is
//! the pure half of the state machine so the boundary conditions are
//! unit-testable without a runtime.

use serde::{Deserialize, Serialize};

use crate::stats::{Effect, Stats, STAT_MAX, STAT_MIN};

/// Per-device behavioral mode of the active pet.
///
/// Not part of the canonical roster entry: each device tracks it locally
/// and resets it to `Idle` whenever a pet is freshly loaded or selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorMode {
    #[default]
    Idle,
    Sleeping,
}

/// The fixed delta applied on every sleep tick.
pub const SLEEP_EFFECT: Effect = Effect {
    energy: Some(1),
    fullness: Some(-1),
    happiness: None,
};

/// Outcome of a single sleep tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The pet is still asleep.
    Resting,
    /// A bound was reached; the pet wakes and the tick source must stop.
    Woke,
}

/// Apply one sleep tick to `stats`.
///
/// Returns [`TickOutcome::Woke`] once energy is full or fullness is
/// drained; the caller then transitions back to [`BehaviorMode::Idle`]
/// and cancels its timer.
pub fn sleep_tick(stats: &mut Stats) -> TickOutcome {
    stats.apply(&SLEEP_EFFECT);

    if stats.energy >= STAT_MAX || stats.fullness <= STAT_MIN {
        TickOutcome::Woke
    } else {
        TickOutcome::Resting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_applies_sleep_effect() {
        let mut stats = Stats::new(50, 50, 80);
        assert_eq!(sleep_tick(&mut stats), TickOutcome::Resting);
        assert_eq!(stats, Stats::new(51, 49, 80));
    }

    #[test]
    fn test_tick_wakes_on_full_energy() {
        let mut stats = Stats::new(99, 50, 10);
        assert_eq!(sleep_tick(&mut stats), TickOutcome::Woke);
        assert_eq!(stats.energy, 100);
    }

    #[test]
    fn test_tick_wakes_on_empty_fullness() {
        let mut stats = Stats::new(10, 1, 10);
        assert_eq!(sleep_tick(&mut stats), TickOutcome::Woke);
        assert_eq!(stats.fullness, 0);
    }

    #[test]
    fn test_reference_scenario_ten_ticks() {
        // energy 50, fullness 10: fullness hits 0 on the tenth tick.
        let mut stats = Stats::new(50, 10, 70);
        for _ in 0..9 {
            assert_eq!(sleep_tick(&mut stats), TickOutcome::Resting);
        }
        assert_eq!(sleep_tick(&mut stats), TickOutcome::Woke);
        assert_eq!(stats.energy, 60);
        assert_eq!(stats.fullness, 0);
        assert_eq!(stats.happiness, 70);
    }

    #[test]
    fn test_repeated_ticks_always_terminate_in_bounds() {
        // From any start, ticking must reach a bound without overshooting.
        for e in [0, 1, 50, 99] {
            for f in [1, 2, 50, 100] {
                let mut stats = Stats::new(e, f, 42);
                let mut guard = 0;
                while sleep_tick(&mut stats) == TickOutcome::Resting {
                    assert!(stats.in_bounds());
                    guard += 1;
                    assert!(guard <= 200, "sleep cycle failed to terminate");
                }
                assert!(stats.in_bounds());
                assert!(stats.energy == STAT_MAX || stats.fullness == STAT_MIN);
            }
        }
    }
}
