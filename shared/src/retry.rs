use std::{fmt::Display, future::Future, time::Duration};

use log::{error, info};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Contains Config properties for retrying a transient operation
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Fixed delay between two attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError<E> {
    #[error("{operation} failed after {attempts} attempts: {last}")]
    Exhausted {
        operation: &'static str,
        attempts: u32,
        last: E,
    },

    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },
}

/// Progress of one retried operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState<T, E> {
    Attempting(u32),
    Retrying { attempt: u32, error: E },
    Succeeded(T),
    Failed { attempts: u32, error: E },
}

impl RetryPolicy {
    /// Run `operation` until it succeeds, the attempt budget is spent, or
    /// `cancel` fires. `operation` receives the 1-based attempt number.
    /// A cancelled run returns without producing a value.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &'static str,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut state = RetryState::Attempting(1);

        loop {
            state = match state {
                RetryState::Attempting(attempt) => {
                    let result = tokio::select! {
                        _ = cancel.cancelled() => return Err(RetryError::Cancelled { operation: label }),
                        result = operation(attempt) => result,
                    };
                    match result {
                        Ok(value) => RetryState::Succeeded(value),
                        Err(error) if attempt >= max_attempts => RetryState::Failed {
                            attempts: attempt,
                            error,
                        },
                        Err(error) => RetryState::Retrying { attempt, error },
                    }
                }
                RetryState::Retrying { attempt, error } => {
                    info!(
                        "{} attempt {}/{} failed: {}. Retrying in {:?}",
                        label, attempt, max_attempts, error, self.delay
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(RetryError::Cancelled { operation: label }),
                        _ = tokio::time::sleep(self.delay) => {}
                    }
                    RetryState::Attempting(attempt + 1)
                }
                RetryState::Succeeded(value) => {
                    return Ok(value);
                }
                RetryState::Failed { attempts, error } => {
                    error!("{} failed after {} attempts: {}", label, attempts, error);
                    return Err(RetryError::Exhausted {
                        operation: label,
                        attempts,
                        last: error,
                    });
                }
            };
        }
    }
}
