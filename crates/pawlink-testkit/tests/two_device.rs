//! Cross-device scenarios: selection, handoff, decay, tier fallback.

use std::collections::BTreeMap;
use std::time::Duration;

use pawlink::{BehaviorMode, DeviceConfig, Effect, Stats};
use pawlink_sync::ContextPurpose;
use pawlink_testkit::DevicePair;

fn fast_decay() -> DeviceConfig {
    let mut config = DeviceConfig::default();
    config.decay.tick_period = Duration::from_millis(5);
    config
}

#[tokio::test]
async fn select_pushes_full_state_to_companion() {
    pawlink_testkit::init_tracing();
    let pair = DevicePair::new().await;
    let pet = pair.primary.add_pet("Mochi", "sprite-1").await;

    pair.primary.select(&pet.id).await;
    pair.companion.drain().await;

    assert_eq!(pair.companion.active_pet(), Some(pet));
    assert_eq!(pair.companion.mode(), BehaviorMode::Idle);
}

#[tokio::test]
async fn handoff_flushes_mutated_stats_before_switch() {
    let pair = DevicePair::new().await;
    let a = pair.primary.add_pet("A", "sprite-1").await;
    let b = pair.primary.add_pet("B", "sprite-2").await;

    // A starts at {80, 80, 80} on the roster.
    pair.primary
        .apply_effect(
            &a.id,
            &Effect {
                energy: Some(-20),
                fullness: Some(-20),
                happiness: Some(-20),
            },
        )
        .await;

    pair.primary.select(&a.id).await;
    pair.companion.drain().await;

    // The companion owns A now and mutates it to {60, 90, 70}.
    pair.companion
        .apply_effect(&Effect {
            energy: Some(-20),
            fullness: Some(10),
            happiness: Some(-10),
        })
        .await;

    pair.primary.select(&b.id).await;
    pair.settle().await;

    // The roster entry for A reflects the companion's mutations, not the
    // pre-mutation values, and B is active on the companion.
    let roster = pair.primary.pets();
    let entry_a = roster.iter().find(|p| p.id == a.id).unwrap();
    assert_eq!(entry_a.stats, Stats::new(60, 90, 70));
    assert_eq!(pair.companion.active_pet().map(|p| p.id), Some(b.id));
}

#[tokio::test]
async fn repeated_select_is_idempotent() {
    let pair = DevicePair::new().await;
    let pet = pair.primary.add_pet("Mochi", "sprite-1").await;

    pair.primary.select(&pet.id).await;
    pair.settle().await;
    let once = (
        pair.companion.active_pet(),
        pair.primary.pets(),
        pair.primary.selected_id(),
    );

    pair.primary.select(&pet.id).await;
    pair.settle().await;

    assert_eq!(
        (
            pair.companion.active_pet(),
            pair.primary.pets(),
            pair.primary.selected_id(),
        ),
        once
    );
}

#[tokio::test]
async fn sleep_cycle_runs_to_the_fullness_bound() {
    let pair = DevicePair::with_configs(DeviceConfig::default(), fast_decay()).await;
    let pet = pair.primary.add_pet("Mochi", "sprite-1").await;

    // Start the companion at {50, 10, 70}.
    pair.primary
        .apply_effect(
            &pet.id,
            &Effect {
                energy: Some(-50),
                fullness: Some(-90),
                happiness: Some(-30),
            },
        )
        .await;
    pair.primary.select(&pet.id).await;
    pair.companion.drain().await;

    pair.companion.start_rest();
    assert_eq!(pair.companion.mode(), BehaviorMode::Sleeping);

    // Ten ticks drain fullness to zero and auto-wake the pet.
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(pair.companion.mode(), BehaviorMode::Idle);
    let stats = pair.companion.active_pet().unwrap().stats;
    assert_eq!(stats, Stats::new(60, 0, 70));
}

#[tokio::test]
async fn offline_companion_catches_up_via_context_tier() {
    let pair = DevicePair::new().await;
    let a = pair.primary.add_pet("A", "sprite-1").await;
    let b = pair.primary.add_pet("B", "sprite-2").await;

    pair.companion_end.set_reachable(false);
    assert!(!pair.primary.session().is_reachable());

    // Sends are still attempted; they park in the replace-context slot,
    // and only the latest assignment survives.
    pair.primary.select(&a.id).await;
    pair.primary.select(&b.id).await;
    assert!(pair
        .companion_end
        .pending_context(ContextPurpose::Assignment)
        .is_some());

    pair.companion_end.set_reachable(true);
    pair.companion_end.deliver_pending().await;
    pair.companion.drain().await;

    assert_eq!(pair.companion.active_pet().map(|p| p.id), Some(b.id));
}

#[tokio::test]
async fn deleting_the_selected_pet_clears_the_companion() {
    let pair = DevicePair::new().await;
    let pet = pair.primary.add_pet("Mochi", "sprite-1").await;

    pair.primary.select(&pet.id).await;
    pair.companion.drain().await;
    assert!(pair.companion.active_pet().is_some());

    pair.primary.delete_pet(&pet.id).await;
    pair.settle().await;

    assert_eq!(pair.companion.active_pet(), None);
    assert_eq!(pair.primary.selected_id(), None);
    // The companion's parting stats flush hit a deleted id and was
    // silently ignored.
    assert!(pair.primary.pets().is_empty());
}

#[tokio::test]
async fn inventory_mirror_is_whole_value_replaced() {
    let pair = DevicePair::new().await;

    pair.companion.add_item("apple", 3).await;
    pair.companion.add_item("ball", 1).await;
    pair.primary.drain().await;

    let mut expected = BTreeMap::new();
    expected.insert("apple".to_string(), 3);
    expected.insert("ball".to_string(), 1);
    assert_eq!(pair.primary.inventory(), expected);

    // Consuming the last ball removes the entry on both sides.
    pair.companion.use_item("ball").await;
    pair.primary.drain().await;

    expected.remove("ball");
    assert_eq!(pair.primary.inventory(), expected);
}

#[tokio::test]
async fn stats_survive_a_round_trip_through_reselect() {
    let pair = DevicePair::new().await;
    let a = pair.primary.add_pet("A", "sprite-1").await;
    let b = pair.primary.add_pet("B", "sprite-2").await;

    pair.primary.select(&a.id).await;
    pair.settle().await;
    pair.companion.apply_effect(&Effect::happiness(-35)).await;

    pair.primary.select(&b.id).await;
    pair.settle().await;

    // Handing A back to the companion must deliver the mutated stats.
    pair.primary.select(&a.id).await;
    pair.settle().await;

    let active = pair.companion.active_pet().unwrap();
    assert_eq!(active.id, a.id);
    assert_eq!(active.stats, Stats::new(100, 100, 65));
}
