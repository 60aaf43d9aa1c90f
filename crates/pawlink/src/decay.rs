//! Timer-driven decay engine for the resting pet.
//!
//! The pure tick logic lives in `pawlink_core::decay`; this module owns
//! the tokio task that drives it. At most one tick source exists per
//! engine instance: starting a timer always cancels any prior one first,
//! since overlapping timers would double-apply decay.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::warn;

use pawlink_core::{sleep_tick, BehaviorMode, Pet, TickOutcome};
use pawlink_store::RosterStore;

use crate::events::{DeviceEvent, EventBus};

/// Default tick period: one decay unit per real-time second.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Decay engine settings.
#[derive(Debug, Clone)]
pub struct DecayConfig {
    /// Interval between sleep ticks.
    pub tick_period: Duration,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }
}

/// The companion's view of its active pet, shared with the tick task.
#[derive(Debug, Default)]
pub(crate) struct ActiveState {
    pub pet: Option<Pet>,
    pub mode: BehaviorMode,
}

/// Per-device decay state machine (idle/sleeping).
///
/// Runs only on the device that currently owns the pet; the peer is a
/// pure stats display for pets it does not own.
pub struct DecayEngine<S: RosterStore + 'static> {
    state: Arc<Mutex<ActiveState>>,
    store: Arc<S>,
    events: EventBus,
    config: DecayConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<S: RosterStore + 'static> DecayEngine<S> {
    pub(crate) fn new(
        state: Arc<Mutex<ActiveState>>,
        store: Arc<S>,
        events: EventBus,
        config: DecayConfig,
    ) -> Self {
        Self {
            state,
            store,
            events,
            config,
            task: Mutex::new(None),
        }
    }

    /// Current behavioral mode.
    pub fn mode(&self) -> BehaviorMode {
        self.state.lock().unwrap().mode
    }

    /// Begin resting. No-op unless a pet is assigned and the mode is
    /// `Idle`.
    pub fn start_rest(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if state.pet.is_none() || state.mode != BehaviorMode::Idle {
                return;
            }
            state.mode = BehaviorMode::Sleeping;
        }
        self.spawn_ticker();
    }

    /// Wake up. Unconditional transition to `Idle`; cancels the timer.
    /// Safe to call from any state.
    pub fn wake(&self) {
        self.state.lock().unwrap().mode = BehaviorMode::Idle;
        self.cancel();
    }

    /// Cancel the tick task if one is running.
    pub(crate) fn cancel(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }

    fn spawn_ticker(&self) {
        let mut slot = self.task.lock().unwrap();

        // Never allow two outstanding tick sources.
        if let Some(prev) = slot.take() {
            prev.abort();
        }

        let state = Arc::clone(&self.state);
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let period = self.config.tick_period;

        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick completes immediately; the first
            // decay unit lands one full period after start_rest().
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let (snapshot, outcome) = {
                    let mut st = state.lock().unwrap();
                    if st.mode != BehaviorMode::Sleeping {
                        break;
                    }
                    let Some(pet) = st.pet.as_mut() else { break };
                    let outcome = sleep_tick(&mut pet.stats);
                    let snapshot = pet.clone();
                    if outcome == TickOutcome::Woke {
                        st.mode = BehaviorMode::Idle;
                    }
                    (snapshot, outcome)
                };

                if let Err(e) = store.save_active_pet(Some(&snapshot)).await {
                    warn!(error = %e, "sleep tick not persisted; in-memory state remains authoritative");
                }
                events.publish(DeviceEvent::StatsChanged {
                    id: snapshot.id,
                    stats: snapshot.stats,
                });

                if outcome == TickOutcome::Woke {
                    events.publish(DeviceEvent::Woke(snapshot.id));
                    break;
                }
            }
        }));
    }
}

impl<S: RosterStore + 'static> Drop for DecayEngine<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}
