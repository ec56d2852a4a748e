use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use colocate_shared::{
    async_trait,
    discovery::{DiscoveryChannel, DiscoveryError},
    CancellationToken, SessionDescriptor,
};
use tokio::time::Instant;

/// What a scripted channel did, with times relative to its creation
#[derive(Clone, Debug, Default)]
pub struct ChannelStats {
    pub discover_started: Vec<Duration>,
    /// Tokens handed to `discover`, to check that losers were cancelled
    pub discover_tokens: Vec<CancellationToken>,
    pub discover_resolved: u32,
    pub discover_cancelled: u32,
    pub advertised: Vec<SessionDescriptor>,
    pub advertise_stopped: u32,
}

/// A discovery channel that resolves with a fixed outcome after a fixed
/// delay, observing cancellation while it waits
pub struct ScriptedChannel {
    name: &'static str,
    epoch: Instant,
    delay: Duration,
    outcome: Option<Result<SessionDescriptor, DiscoveryError>>,
    advertise_error: Option<DiscoveryError>,
    stats: Arc<Mutex<ChannelStats>>,
}

impl ScriptedChannel {
    fn new(
        name: &'static str,
        delay: Duration,
        outcome: Option<Result<SessionDescriptor, DiscoveryError>>,
    ) -> Self {
        Self {
            name,
            epoch: Instant::now(),
            delay,
            outcome,
            advertise_error: None,
            stats: Arc::new(Mutex::new(ChannelStats::default())),
        }
    }

    /// Finds `descriptor` once `delay` has passed since discovery started
    pub fn resolving(name: &'static str, delay: Duration, descriptor: SessionDescriptor) -> Self {
        Self::new(name, delay, Some(Ok(descriptor)))
    }

    pub fn failing(name: &'static str, delay: Duration, error: DiscoveryError) -> Self {
        Self::new(name, delay, Some(Err(error)))
    }

    /// Never finds anything
    pub fn silent(name: &'static str) -> Self {
        Self::new(name, Duration::ZERO, None)
    }

    pub fn with_advertise_error(mut self, error: DiscoveryError) -> Self {
        self.advertise_error = Some(error);
        self
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, update: impl FnOnce(&mut ChannelStats)) {
        update(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

#[async_trait]
impl DiscoveryChannel for ScriptedChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn advertise(
        &self,
        descriptor: SessionDescriptor,
        cancel: CancellationToken,
    ) -> Result<(), DiscoveryError> {
        if let Some(error) = &self.advertise_error {
            return Err(error.clone());
        }
        self.record(|stats| stats.advertised.push(descriptor));
        cancel.cancelled().await;
        self.record(|stats| stats.advertise_stopped += 1);
        Ok(())
    }

    async fn discover(
        &self,
        cancel: CancellationToken,
    ) -> Result<SessionDescriptor, DiscoveryError> {
        let started = self.epoch.elapsed();
        self.record(|stats| {
            stats.discover_started.push(started);
            stats.discover_tokens.push(cancel.clone());
        });

        let Some(outcome) = self.outcome.clone() else {
            cancel.cancelled().await;
            self.record(|stats| stats.discover_cancelled += 1);
            return Err(DiscoveryError::Cancelled);
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                self.record(|stats| stats.discover_cancelled += 1);
                Err(DiscoveryError::Cancelled)
            }
            _ = tokio::time::sleep(self.delay) => {
                self.record(|stats| stats.discover_resolved += 1);
                outcome
            }
        }
    }
}
