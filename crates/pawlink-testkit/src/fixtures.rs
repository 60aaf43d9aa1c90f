//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use pawlink::{CompanionDevice, DeviceConfig, PrimaryDevice};
use pawlink_store::MemoryStore;
use pawlink_sync::{MemoryEndpoint, MemoryLink};

/// Initialize tracing output for a test run. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A wired primary/companion pair over an in-memory link.
///
/// `primary_end` is the endpoint the primary sends through; failure
/// injection for traffic *toward* a device goes on that device's own
/// endpoint (e.g. `companion_end.set_fail_direct(true)` makes the
/// primary's direct sends fail).
pub struct DevicePair {
    pub primary: PrimaryDevice<MemoryStore, MemoryEndpoint>,
    pub companion: CompanionDevice<MemoryStore, MemoryEndpoint>,
    pub primary_end: Arc<MemoryEndpoint>,
    pub companion_end: Arc<MemoryEndpoint>,
}

impl DevicePair {
    /// Create a pair with default configuration.
    pub async fn new() -> Self {
        Self::with_configs(DeviceConfig::default(), DeviceConfig::default()).await
    }

    /// Create a pair with per-device configuration (e.g. a fast decay
    /// tick on the companion).
    pub async fn with_configs(primary: DeviceConfig, companion: DeviceConfig) -> Self {
        let (primary_end, companion_end) = MemoryLink::pair();
        let primary_end = Arc::new(primary_end);
        let companion_end = Arc::new(companion_end);

        let primary = PrimaryDevice::open(
            Arc::new(MemoryStore::new()),
            Arc::clone(&primary_end),
            primary,
        )
        .await
        .expect("open primary");

        let companion = CompanionDevice::open(
            Arc::new(MemoryStore::new()),
            Arc::clone(&companion_end),
            companion,
        )
        .await
        .expect("open companion");

        Self {
            primary,
            companion,
            primary_end,
            companion_end,
        }
    }

    /// Let both devices process everything currently inbound.
    pub async fn settle(&self) {
        self.companion.drain().await;
        self.primary.drain().await;
    }
}
