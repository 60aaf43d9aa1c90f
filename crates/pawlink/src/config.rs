//! Device configuration.

use crate::decay::DecayConfig;

/// Configuration for a device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Decay engine settings (companion side).
    pub decay: DecayConfig,
    /// Capacity of the device event broadcast channel. Lagging
    /// subscribers miss events rather than block the core.
    pub event_capacity: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            decay: DecayConfig::default(),
            event_capacity: 64,
        }
    }
}
