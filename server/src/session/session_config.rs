use std::default::Default;

use colocate_shared::RetryPolicy;

/// Contains Config properties which will be used by the SessionCoordinator
#[derive(Clone)]
pub struct SessionConfig {
    /// Number of remote peers after which advertisement stops
    pub capacity: usize,
    /// Address joining peers should connect to, advertised with the session
    pub host_address: String,
    /// Budget for creating, saving and sharing the session's reference anchor
    pub anchor_retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            host_address: "127.0.0.1".to_string(),
            anchor_retry: RetryPolicy::default(),
        }
    }
}
