use thiserror::Error;

/// Errors raised by discovery and advertisement channels
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// A channel could not start advertising
    #[error("Failed to start {channel} advertisement: {reason}")]
    AdvertiseFailed {
        channel: &'static str,
        reason: String,
    },

    /// A channel could not start listening for advertisements
    #[error("Failed to start {channel} discovery: {reason}")]
    DiscoveryFailed {
        channel: &'static str,
        reason: String,
    },

    /// The platform stopped delivering advertisements
    #[error("{channel} discovery stream closed")]
    Closed { channel: &'static str },

    /// Every channel failed before any session was found
    #[error("No discovery channel could find a session")]
    Exhausted,

    /// Discovery was cancelled before a session was found
    #[error("Discovery cancelled")]
    Cancelled,
}
