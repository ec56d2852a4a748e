use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::discovery::{
    decode_payload, encode_payload, DiscoveryChannel, DiscoveryError, GroupId, SessionDescriptor,
};

/// An advertisement seen by the platform's proximity primitive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advertisement {
    pub group_id: GroupId,
    pub metadata: Vec<u8>,
}

/// The platform's nearby-device primitive (colocation advertisement)
#[async_trait]
pub trait ProximityService: Send + Sync {
    async fn start_advertisement(
        &self,
        group_id: GroupId,
        metadata: Vec<u8>,
    ) -> Result<(), DiscoveryError>;

    fn stop_advertisement(&self);

    /// Starts listening; every advertisement seen from now on is delivered on
    /// the returned receiver.
    async fn start_discovery(&self) -> Result<mpsc::UnboundedReceiver<Advertisement>, DiscoveryError>;

    fn stop_discovery(&self);
}

struct AdvertisementGuard<'a>(&'a dyn ProximityService);

impl Drop for AdvertisementGuard<'_> {
    fn drop(&mut self) {
        self.0.stop_advertisement();
    }
}

struct DiscoveryGuard<'a>(&'a dyn ProximityService);

impl Drop for DiscoveryGuard<'_> {
    fn drop(&mut self) {
        self.0.stop_discovery();
    }
}

/// Discovery through anchor-metadata advertisements. The payload carries the
/// host address behind a fixed protocol tag; the group id travels as the
/// advertisement's own identifier.
pub struct ProximityChannel {
    service: Arc<dyn ProximityService>,
    protocol_tag: String,
}

impl ProximityChannel {
    pub fn new(service: Arc<dyn ProximityService>, protocol_tag: impl Into<String>) -> Self {
        Self {
            service,
            protocol_tag: protocol_tag.into(),
        }
    }
}

#[async_trait]
impl DiscoveryChannel for ProximityChannel {
    fn name(&self) -> &'static str {
        "proximity"
    }

    async fn advertise(
        &self,
        descriptor: SessionDescriptor,
        cancel: CancellationToken,
    ) -> Result<(), DiscoveryError> {
        let payload = encode_payload(&self.protocol_tag, &descriptor.host_address);
        self.service
            .start_advertisement(descriptor.group_id, payload)
            .await?;
        let _guard = AdvertisementGuard(self.service.as_ref());

        cancel.cancelled().await;
        Ok(())
    }

    async fn discover(
        &self,
        cancel: CancellationToken,
    ) -> Result<SessionDescriptor, DiscoveryError> {
        let mut advertisements = self.service.start_discovery().await?;
        let _guard = DiscoveryGuard(self.service.as_ref());

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(DiscoveryError::Cancelled),
                advertisement = advertisements.recv() => {
                    let Some(advertisement) = advertisement else {
                        return Err(DiscoveryError::Closed { channel: self.name() });
                    };
                    match decode_payload(&self.protocol_tag, &advertisement.metadata) {
                        Some(host_address) => {
                            return Ok(SessionDescriptor::new(advertisement.group_id, host_address));
                        }
                        None => debug!(
                            "Ignoring advertisement from group {}: foreign payload",
                            advertisement.group_id
                        ),
                    }
                }
            }
        }
    }
}
