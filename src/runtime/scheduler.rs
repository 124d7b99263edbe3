//! Deferred work on the host's tokio runtime.
//!
//! Animation playback and queue timers never block the caller; they are spawned here and
//! resume after their delay. Timers carry a [`CancellationToken`] so a superseding
//! dismissal can retire them deterministically.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::error::OverlayError;

/// Cheaply cloneable handle to the runtime that drives overlay timing.
#[derive(Clone, Debug)]
pub struct Scheduler {
    handle: Handle,
}

impl Scheduler {
    /// Captures the runtime of the calling thread.
    pub fn current() -> Result<Self, OverlayError> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(OverlayError::NoRuntime)
    }

    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub(crate) fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        drop(self.handle.spawn(future));
    }

    /// Runs `f` once `delay` has elapsed. Returns immediately.
    pub(crate) fn defer<F>(&self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            f();
        });
    }

    /// Like [`Scheduler::defer`], but `f` is skipped if the returned handle is cancelled
    /// before the delay elapses.
    pub(crate) fn timer<F>(&self, delay: Duration, f: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        self.spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if !child.is_cancelled() {
                        f();
                    }
                }
            }
        });
        TimerHandle { token }
    }
}

/// One outstanding timer. Dropping the handle does not cancel it.
#[derive(Debug)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn current_outside_runtime_is_an_error() {
        let err = Scheduler::current().expect_err("no runtime on a plain test thread");
        assert!(matches!(err, OverlayError::NoRuntime(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_delay() {
        let scheduler = Scheduler::current().expect("runtime");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let _timer = scheduler.timer(Duration::from_millis(200), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(199)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let scheduler = Scheduler::current().expect("runtime");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let timer = scheduler.timer(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        timer.cancel();
        assert!(timer.is_cancelled());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn defer_with_zero_delay_runs_on_next_poll() {
        let scheduler = Scheduler::current().expect("runtime");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        scheduler.defer(Duration::ZERO, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
