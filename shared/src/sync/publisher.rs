use std::time::Duration;

/// Sender side of a sync channel. At most one value leaves per interval;
/// values published in between replace the queued one, so only the latest
/// is ever sent.
pub struct SyncPublisher<T> {
    interval: Duration,
    timer: Duration,
    queued: Option<T>,
}

impl<T> SyncPublisher<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timer: Duration::ZERO,
            queued: None,
        }
    }

    /// Queue `value`, replacing anything not yet sent. Returns `true` if an
    /// earlier value was coalesced away.
    pub fn publish(&mut self, value: T) -> bool {
        self.queued.replace(value).is_some()
    }

    /// Advance the send timer. The timer only runs while a value is queued.
    pub fn tick(&mut self, delta: Duration) -> Option<T> {
        self.queued.as_ref()?;

        self.timer = self.timer.saturating_add(delta);
        if self.timer < self.interval {
            return None;
        }
        self.timer = Duration::ZERO;
        self.queued.take()
    }

    /// Take the queued value now, regardless of the timer
    pub fn flush(&mut self) -> Option<T> {
        self.timer = Duration::ZERO;
        self.queued.take()
    }

    pub fn has_queued(&self) -> bool {
        self.queued.is_some()
    }

    /// Drop anything queued, e.g. when authority is lost
    pub fn clear(&mut self) {
        self.queued = None;
        self.timer = Duration::ZERO;
    }
}
