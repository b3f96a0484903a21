//! Repeating-timer abstraction.
//!
//! The reconciliation loop never sleeps on its own; it asks a
//! [`Scheduler`] for a repeating timer and keeps the returned
//! [`TimerHandle`] for exactly as long as polling should continue.
//! Dropping or cancelling the handle stops the timer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Work run on every timer tick.
pub type Tick = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Source of repeating timers.
pub trait Scheduler: Send + Sync {
    /// Run `tick` every `interval`, first after one full interval, until the
    /// returned handle is cancelled or dropped.
    ///
    /// Must not invoke `tick` synchronously: callers schedule while holding
    /// their own state lock.
    fn schedule(&self, interval: Duration, tick: Tick) -> TimerHandle;
}

/// Ownership of one running timer.
#[derive(Debug)]
pub struct TimerHandle {
    cancel: CancellationToken,
}

impl TimerHandle {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// TokioScheduler
// ---------------------------------------------------------------------------

/// [`Scheduler`] on the ambient tokio runtime.
///
/// Each tick's future is spawned as its own task so a slow tick never
/// delays the next one. Cancelling the handle also abandons any tick work
/// still in flight.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, interval: Duration, tick: Tick) -> TimerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let work = tick();
                        let token = token.clone();
                        tokio::spawn(async move {
                            tokio::select! {
                                _ = token.cancelled() => {}
                                _ = work => {}
                            }
                        });
                    }
                }
            }
            tracing::trace!("Timer stopped");
        });

        TimerHandle::new(cancel)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
