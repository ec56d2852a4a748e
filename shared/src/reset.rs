use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Hooks into the host application for a full reset
#[async_trait]
pub trait FullReset: Send + Sync {
    /// Close the transport: the server, the client connection, or both
    async fn shutdown_transport(&self);

    /// Bring the application back to its initial state
    async fn restart(&self);
}

/// "Panic reset" used when the session cannot be recovered. Cancels every
/// discovery, advertisement and retry loop tied to the current session
/// token, lets the host application tear down and restart, then hands out a
/// fresh token.
pub struct ResetManager {
    hooks: Arc<dyn FullReset>,
    shutdown_grace: Duration,
    session: Mutex<CancellationToken>,
    resetting: AtomicBool,
    completed: watch::Sender<u64>,
}

impl ResetManager {
    pub fn new(hooks: Arc<dyn FullReset>, shutdown_grace: Duration) -> Self {
        let (completed, _) = watch::channel(0);
        Self {
            hooks,
            shutdown_grace,
            session: Mutex::new(CancellationToken::new()),
            resetting: AtomicBool::new(false),
            completed,
        }
    }

    /// Token of the current session. Long-running work should observe it.
    pub fn session_token(&self) -> CancellationToken {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_resetting(&self) -> bool {
        self.resetting.load(Ordering::SeqCst)
    }

    /// Receives the number of completed resets
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.completed.subscribe()
    }

    /// Returns `false` without doing anything if a reset is already running
    pub async fn trigger(&self) -> bool {
        if self.resetting.swap(true, Ordering::SeqCst) {
            warn!("Full reset already in progress");
            return false;
        }
        info!("Starting full reset");

        info!("Stopping discovery and advertisement");
        self.session_token().cancel();

        info!("Shutting down transport");
        self.hooks.shutdown_transport().await;
        tokio::time::sleep(self.shutdown_grace).await;

        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = CancellationToken::new();

        info!("Restarting");
        self.hooks.restart().await;

        self.completed.send_modify(|count| *count += 1);
        self.resetting.store(false, Ordering::SeqCst);
        true
    }
}
