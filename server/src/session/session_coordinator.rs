use std::{collections::HashSet, sync::Arc};

use log::{error, info, warn};
use thiserror::Error;

use colocate_shared::{
    AnchorError, AnchorHandle, AnchorRepository, DiscoveryRace, GroupId, PeerId, ReferencePose,
    ResetManager, RetryError, SessionDescriptor,
};

use crate::session::SessionConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The reference anchor could not be published within the retry budget.
    /// A full reset has been triggered.
    #[error("Failed to publish the session anchor: {0}")]
    AnchorPublish(#[source] RetryError<AnchorError>),

    #[error("Session start was cancelled")]
    Cancelled,

    #[error("Session {group} is already started")]
    AlreadyStarted { group: GroupId },
}

/// Host-side orchestration of a session: owns the session descriptor,
/// publishes the shared reference anchor, advertises the session and stops
/// advertising once enough peers joined.
pub struct SessionCoordinator {
    config: SessionConfig,
    anchors: Arc<dyn AnchorRepository>,
    discovery: DiscoveryRace,
    reset: Arc<ResetManager>,
    descriptor: Option<SessionDescriptor>,
    anchor: Option<AnchorHandle>,
    peers: HashSet<PeerId>,
}

impl SessionCoordinator {
    /// `discovery` should be bound to `reset`'s current session token so that
    /// a full reset stops advertisement.
    pub fn new(
        config: SessionConfig,
        anchors: Arc<dyn AnchorRepository>,
        discovery: DiscoveryRace,
        reset: Arc<ResetManager>,
    ) -> Self {
        Self {
            config,
            anchors,
            discovery,
            reset,
            descriptor: None,
            anchor: None,
            peers: HashSet::new(),
        }
    }

    /// Create a fresh group, publish a reference pose at the origin for it
    /// and start advertising. Publishing is retried under the configured
    /// policy; running out of attempts triggers a full reset.
    pub async fn start_session(&mut self) -> Result<SessionDescriptor, SessionError> {
        if let Some(descriptor) = &self.descriptor {
            return Err(SessionError::AlreadyStarted {
                group: descriptor.group_id,
            });
        }

        let group = GroupId::generate();
        info!("Starting session {}", group);

        let handle = match self.publish_anchor(group).await {
            Ok(handle) => handle,
            Err(RetryError::Cancelled { operation }) => {
                info!("Session start cancelled during {}", operation);
                return Err(SessionError::Cancelled);
            }
            Err(exhausted) => {
                error!("Cannot publish anchor for session {}: {}", group, exhausted);
                self.reset.trigger().await;
                return Err(SessionError::AnchorPublish(exhausted));
            }
        };

        let descriptor = SessionDescriptor::new(group, self.config.host_address.clone());
        self.discovery.advertise(descriptor.clone());
        self.anchor = Some(handle);
        self.descriptor = Some(descriptor.clone());
        Ok(descriptor)
    }

    /// Create, save and share the reference anchor. A failure at any step
    /// starts over from a fresh anchor; every step shares one attempt budget.
    async fn publish_anchor(&self, group: GroupId) -> Result<AnchorHandle, RetryError<AnchorError>> {
        let cancel = self.reset.session_token();
        let anchors = self.anchors.as_ref();

        let handle = self
            .config
            .anchor_retry
            .run("publish anchor", &cancel, move |_| async move {
                let handle = anchors.create(ReferencePose::origin()).await?;
                anchors.save(&handle).await?;
                anchors.share(&handle, group).await?;
                Ok::<_, AnchorError>(handle)
            })
            .await?;

        info!("Shared anchor {} with group {}", handle.id, group);
        Ok(handle)
    }

    /// Count a newly connected peer. Reaching capacity stops advertisement;
    /// later discoveries are refused by the server's admission gate.
    /// Returns `false` if the peer was already counted.
    pub fn admit_peer(&mut self, peer: PeerId) -> bool {
        if !self.peers.insert(peer) {
            warn!("{} is already admitted", peer);
            return false;
        }
        info!(
            "Admitted {} ({}/{})",
            peer,
            self.peers.len(),
            self.config.capacity
        );
        if self.peers.len() >= self.config.capacity && self.discovery.is_advertising() {
            info!("Session is at capacity");
            self.stop_advertising();
        }
        true
    }

    /// Forget a peer. Advertisement is not resumed.
    pub fn peer_left(&mut self, peer: &PeerId) -> bool {
        self.peers.remove(peer)
    }

    pub fn stop_advertising(&mut self) -> bool {
        self.discovery.stop_advertising()
    }

    pub fn is_advertising(&self) -> bool {
        self.discovery.is_advertising()
    }

    pub fn descriptor(&self) -> Option<&SessionDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn anchor(&self) -> Option<&AnchorHandle> {
        self.anchor.as_ref()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }
}
