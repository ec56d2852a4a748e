use thiserror::Error;

use colocate_shared::{MessageError, PeerId};

/// Faults detected while handling a peer's traffic. They never stop the
/// session: the offending message is dropped and the error surfaced as an
/// `ErrorEvent`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    #[error("Dropping undecodable message from {peer}: {source}")]
    Decode {
        peer: PeerId,
        #[source]
        source: MessageError,
    },

    #[error("Received a message from unknown {peer}")]
    UnknownPeer { peer: PeerId },

    #[error("{peer} requested unknown prefab '{prefab}'")]
    UnknownPrefab { peer: PeerId, prefab: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("Session is full ({capacity} peers), refusing {peer}")]
    SessionFull { peer: PeerId, capacity: usize },
}
