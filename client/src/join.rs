use std::sync::Arc;

use log::{info, warn};

use colocate_shared::{
    AnchorRepository, CancellationToken, DiscoveryError, DiscoveryRace, RetryError, RetryPolicy,
    SessionDescriptor,
};

use crate::{error::JoinError, FrameAligner};

/// Peer-side join workflow: find a session, load the anchors shared with
/// its group, localize one of them and align to it. The caller then connects
/// to the returned host address.
pub struct SessionJoiner {
    discovery: DiscoveryRace,
    anchors: Arc<dyn AnchorRepository>,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl SessionJoiner {
    /// `cancel` should be the session token, so that a full reset abandons
    /// a join in flight
    pub fn new(
        discovery: DiscoveryRace,
        anchors: Arc<dyn AnchorRepository>,
        retry: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            discovery,
            anchors,
            retry,
            cancel,
        }
    }

    pub async fn join(&self, aligner: &mut FrameAligner) -> Result<SessionDescriptor, JoinError> {
        let descriptor = match self.discovery.discover().await {
            Ok(descriptor) => descriptor,
            Err(DiscoveryError::Cancelled) => return Err(JoinError::Cancelled),
            Err(error) => return Err(JoinError::Discovery(error)),
        };
        let group = descriptor.group_id;
        info!(
            "Joining session {} hosted at {}",
            group, descriptor.host_address
        );

        let anchors = self.anchors.as_ref();
        let unbound = self
            .retry
            .run("load anchors", &self.cancel, move |_| anchors.load_by_group(group))
            .await
            .map_err(|error| match error {
                RetryError::Cancelled { .. } => JoinError::Cancelled,
                exhausted => JoinError::LoadAnchors {
                    group,
                    source: exhausted,
                },
            })?;
        if unbound.is_empty() {
            warn!("Group {} shares no anchor", group);
            return Err(JoinError::NoAnchors { group });
        }

        for anchor in &unbound {
            let localized = tokio::select! {
                _ = self.cancel.cancelled() => return Err(JoinError::Cancelled),
                result = anchors.localize(anchor) => result,
            };
            match localized {
                Ok(reference) => {
                    aligner.align_to(&reference);
                    info!("Localized anchor {}", anchor.id);
                    return Ok(descriptor);
                }
                Err(error) => warn!("{}", error),
            }
        }

        Err(JoinError::NotLocalized {
            group,
            attempted: unbound.len(),
        })
    }
}
