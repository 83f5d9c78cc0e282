//! Cancellable one-shot timers on the tokio runtime.

use core::time::Duration;

use tokio::task::AbortHandle;

/// Handle to a scheduled callback.
///
/// Dropping the handle cancels the callback if it has not run yet.
#[derive(Debug)]
#[must_use = "dropping a TimerHandle cancels the scheduled callback"]
pub struct TimerHandle {
    /// Abort handle of the sleeping task.
    task: AbortHandle,
}

impl TimerHandle {
    /// Cancels the callback. Has no effect once it has run.
    #[inline]
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Returns `true` once the callback has run or the timer was cancelled.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    #[inline]
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Runs `callback` once after `delay`.
///
/// # Panics
///
/// Panics if called outside of a tokio runtime.
#[inline]
pub fn schedule<F>(delay: Duration, callback: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    let join = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        callback();
    });
    TimerHandle {
        task: join.abort_handle(),
    }
}
