use colocate_serde::SerdeErr;
use thiserror::Error;

/// Errors that can occur while turning a datagram into a message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The payload did not decode
    #[error("Failed to decode {direction} message: {source}")]
    Decode {
        direction: &'static str,
        #[source]
        source: SerdeErr,
    },

    /// A complete message was read but whole bytes were left over
    #[error("{direction} message has {trailing_bits} unread trailing bits")]
    TrailingData {
        direction: &'static str,
        trailing_bits: usize,
    },
}
