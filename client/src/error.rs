use thiserror::Error;

use colocate_shared::{
    AlignmentError, AnchorError, DiscoveryError, GroupId, MessageError, RetryError,
};

/// Faults in the coordinator's traffic. The message is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Dropping undecodable message: {0}")]
    Decode(#[from] MessageError),

    #[error("Cannot re-root on marker: {0}")]
    ReRoot(#[from] AlignmentError),
}

/// Why joining a session failed. Shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("No session found: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Cannot load anchors of group {group}: {source}")]
    LoadAnchors {
        group: GroupId,
        #[source]
        source: RetryError<AnchorError>,
    },

    #[error("Group {group} has no shared anchor")]
    NoAnchors { group: GroupId },

    #[error("None of the {attempted} anchors of group {group} could be localized")]
    NotLocalized { group: GroupId, attempted: usize },

    #[error("Joining was cancelled")]
    Cancelled,
}
