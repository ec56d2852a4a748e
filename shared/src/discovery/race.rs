use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::discovery::{DiscoveryError, SessionDescriptor};

/// One rendezvous mechanism. Both operations observe `cancel` at every
/// suspension point.
#[async_trait]
pub trait DiscoveryChannel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Advertise `descriptor` until `cancel` fires.
    async fn advertise(
        &self,
        descriptor: SessionDescriptor,
        cancel: CancellationToken,
    ) -> Result<(), DiscoveryError>;

    /// Resolve with the first session found.
    async fn discover(&self, cancel: CancellationToken)
        -> Result<SessionDescriptor, DiscoveryError>;
}

/// Runs a primary channel and a fallback channel and accepts whichever
/// resolves first. The fallback only starts after `fallback_after`, or at
/// once if the primary fails. When one channel wins the other is cancelled.
pub struct DiscoveryRace {
    primary: Arc<dyn DiscoveryChannel>,
    fallback: Arc<dyn DiscoveryChannel>,
    fallback_after: Duration,
    cancel: CancellationToken,
    advertisement: Option<CancellationToken>,
}

impl DiscoveryRace {
    /// `cancel` is the session token: cancelling it stops advertisement and
    /// any discovery in flight.
    pub fn new(
        primary: Arc<dyn DiscoveryChannel>,
        fallback: Arc<dyn DiscoveryChannel>,
        fallback_after: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            primary,
            fallback,
            fallback_after,
            cancel,
            advertisement: None,
        }
    }

    /// Start advertising on both channels. Must be called from within a tokio
    /// runtime. Failures are logged and do not affect the other channel.
    pub fn advertise(&mut self, descriptor: SessionDescriptor) {
        self.stop_advertising();

        let token = self.cancel.child_token();
        for channel in [self.primary.clone(), self.fallback.clone()] {
            let descriptor = descriptor.clone();
            let token = token.child_token();
            tokio::spawn(async move {
                match channel.advertise(descriptor, token).await {
                    Ok(()) => debug!("{} advertisement stopped", channel.name()),
                    Err(error) => warn!("{} advertisement failed: {}", channel.name(), error),
                }
            });
        }
        info!(
            "Advertising session {} at {}",
            descriptor.group_id, descriptor.host_address
        );
        self.advertisement = Some(token);
    }

    /// Returns whether an advertisement was running
    pub fn stop_advertising(&mut self) -> bool {
        match self.advertisement.take() {
            Some(token) => {
                token.cancel();
                info!("Stopped advertising");
                true
            }
            None => false,
        }
    }

    pub fn is_advertising(&self) -> bool {
        self.advertisement
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    pub async fn discover(&self) -> Result<SessionDescriptor, DiscoveryError> {
        let race = self.cancel.child_token();
        // whichever way this returns, the losing channel stops listening
        let _stop_channels = race.clone().drop_guard();

        let mut primary = Some(self.primary.discover(race.child_token()));
        let mut fallback = None;
        let mut fallback_started = false;
        let fallback_timer = tokio::time::sleep(self.fallback_after);
        tokio::pin!(fallback_timer);

        loop {
            tokio::select! {
                _ = race.cancelled() => {
                    debug!("Discovery cancelled");
                    return Err(DiscoveryError::Cancelled);
                }
                result = poll_slot(&mut primary), if primary.is_some() => {
                    primary = None;
                    match result {
                        Ok(descriptor) => {
                            info!("Found session {} via {}", descriptor.group_id, self.primary.name());
                            return Ok(descriptor);
                        }
                        Err(error) => {
                            warn!("{} discovery failed: {}", self.primary.name(), error);
                            if !fallback_started {
                                fallback_started = true;
                                fallback = Some(self.fallback.discover(race.child_token()));
                            }
                        }
                    }
                }
                _ = &mut fallback_timer, if !fallback_started => {
                    info!(
                        "No session found via {} after {:?}, starting {}",
                        self.primary.name(),
                        self.fallback_after,
                        self.fallback.name()
                    );
                    fallback_started = true;
                    fallback = Some(self.fallback.discover(race.child_token()));
                }
                result = poll_slot(&mut fallback), if fallback.is_some() => {
                    fallback = None;
                    match result {
                        Ok(descriptor) => {
                            info!("Found session {} via {}", descriptor.group_id, self.fallback.name());
                            return Ok(descriptor);
                        }
                        Err(error) => warn!("{} discovery failed: {}", self.fallback.name(), error),
                    }
                }
            }

            if primary.is_none() && fallback_started && fallback.is_none() {
                return Err(DiscoveryError::Exhausted);
            }
        }
    }
}

async fn poll_slot<F>(slot: &mut Option<F>) -> F::Output
where
    F: Future + Unpin,
{
    match slot {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}
