use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by every transform sync channel
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Minimum time between two updates sent for the same object. Receivers
    /// interpolate over the same interval.
    pub sync_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_millis(100),
        }
    }
}
