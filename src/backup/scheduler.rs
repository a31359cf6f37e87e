//! Auto-save scheduler
//!
//! A single cancellable periodic task. Starting it again replaces the
//! running task under one lock, so at most one ticker is ever live.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{VaultError, VaultResult};

struct Ticker {
    period: Duration,
    cancel: CancellationToken,
    // Kept so the task is not detached from its owner; never awaited
    _handle: JoinHandle<()>,
}

/// Owner of the one periodic auto-save task
#[derive(Default)]
pub struct AutoSaveScheduler {
    ticker: Mutex<Option<Ticker>>,
}

impl AutoSaveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `tick` every `period`, replacing any running ticker
    ///
    /// The first tick fires one full period after start; missed ticks are
    /// skipped rather than bunched. The task ends when `tick` breaks or the
    /// scheduler is stopped. A tick already in flight when the ticker is
    /// replaced runs to completion but never ticks again.
    pub fn start<F, Fut>(&self, period: Duration, tick: F) -> VaultResult<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        if period.is_zero() {
            return Err(VaultError::SchedulerMisconfigured(
                "auto-save period must be greater than zero".into(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            VaultError::SchedulerMisconfigured("auto-save requires a tokio runtime".into())
        })?;

        let mut slot = self
            .ticker
            .lock()
            .map_err(|e| VaultError::SchedulerMisconfigured(format!("Failed to acquire lock: {}", e)))?;

        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if tick().await.is_break() {
                            token.cancel();
                            break;
                        }
                    }
                }
            }
            tracing::debug!(?period, "auto-save ticker stopped");
        });

        tracing::debug!(?period, "auto-save ticker started");
        *slot = Some(Ticker {
            period,
            cancel,
            _handle: handle,
        });
        Ok(())
    }

    /// Stop the ticker; stopping a stopped scheduler is a no-op
    pub fn stop(&self) {
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(ticker) = slot.take() {
                ticker.cancel.cancel();
            }
        }
    }

    /// Whether a ticker is live
    pub fn is_running(&self) -> bool {
        self.ticker
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|t| !t.cancel.is_cancelled()))
            .unwrap_or(false)
    }

    /// Period of the live ticker
    pub fn period(&self) -> Option<Duration> {
        self.ticker
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|t| t.period))
    }
}

impl Drop for AutoSaveScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
