//! Debounced values.
//!
//! A [`Debounced`] value lags behind its input: every [`Debounced::set`]
//! re-arms a timer, and the value only settles once the input has been
//! left alone for the whole delay. Intermediate inputs are dropped.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;

use tokio::sync::watch;

use crate::timer::{self, TimerHandle};

/// State shared with the pending timer callback.
#[derive(Debug)]
struct Shared<T> {
    /// Publishes the settled value.
    settled: watch::Sender<T>,
    /// Bumped on every re-arm or cancel; a callback only publishes if its
    /// generation is still current.
    generation: AtomicU64,
}

impl<T: PartialEq> Shared<T> {
    /// Publishes `value`, notifying subscribers only if it differs from
    /// the settled value. Returns `true` if it did.
    fn publish(&self, value: T) -> bool {
        self.settled.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    /// Publishes `value` only if `generation` is still current. The check
    /// runs under the channel lock, so a concurrent `flush` or `cancel`
    /// either happens first and wins, or happens after and overwrites.
    fn publish_if_current(&self, generation: u64, value: T) -> bool {
        self.settled.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation || *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}

/// A value that follows its input only after the input has been stable
/// for a fixed delay.
///
/// Dropping the `Debounced` cancels any pending update.
#[derive(Debug)]
pub struct Debounced<T> {
    /// Quiet period required before an input settles.
    delay: Duration,
    /// Settled value and generation counter.
    shared: Arc<Shared<T>>,
    /// Timer for the most recent input, if still pending.
    pending: Option<TimerHandle>,
}

impl<T> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates a debounced value that starts settled at `initial`.
    #[inline]
    #[must_use]
    pub fn new(initial: T, delay: Duration) -> Self {
        let (settled, _receiver) = watch::channel(initial);
        Self {
            delay,
            shared: Arc::new(Shared {
                settled,
                generation: AtomicU64::new(0),
            }),
            pending: None,
        }
    }

    /// Returns the configured delay.
    #[inline]
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Feeds a new input. Any pending input is discarded and `value`
    /// settles after the delay unless another input arrives first.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[inline]
    pub fn set(&mut self, value: T) {
        let generation = self.bump_generation();
        let shared = Arc::clone(&self.shared);
        self.pending = Some(timer::schedule(self.delay, move || {
            _ = shared.publish_if_current(generation, value);
        }));
    }

    /// Settles `value` immediately, discarding any pending input.
    ///
    /// Returns `true` if the settled value changed.
    #[inline]
    pub fn flush(&mut self, value: T) -> bool {
        self.cancel();
        self.shared.publish(value)
    }

    /// Discards the pending input, if any. The settled value is unchanged.
    #[inline]
    pub fn cancel(&mut self) {
        _ = self.bump_generation();
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
    }

    /// Returns `true` if an input is waiting to settle.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }

    /// Returns a copy of the settled value.
    #[inline]
    #[must_use]
    pub fn get(&self) -> T {
        self.shared.settled.borrow().clone()
    }

    /// Subscribes to settled values. The receiver is notified only when
    /// the settled value actually changes.
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.shared.settled.subscribe()
    }

    /// Invalidates outstanding callbacks and returns the new generation.
    fn bump_generation(&self) -> u64 {
        self.shared
            .generation
            .fetch_add(1, Ordering::SeqCst)
            .wrapping_add(1)
    }
}

impl<T> Drop for Debounced<T> {
    #[inline]
    fn drop(&mut self) {
        _ = self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Debounce delay used by the tests.
    const DELAY: Duration = Duration::from_millis(500);

    /// Sleeps for `millis` of (paused) tokio time.
    async fn advance(millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn settles_after_quiet_period() {
        let mut search = Debounced::new(String::new(), DELAY);
        search.set("coffee".to_owned());
        assert!(search.is_pending());

        advance(499).await;
        assert_eq!(search.get(), "");

        advance(10).await;
        assert_eq!(search.get(), "coffee");
        assert!(!search.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_inputs_settle_once_on_last_value() {
        let mut search = Debounced::new(String::new(), DELAY);
        let mut settled = search.subscribe();

        for input in ["c", "co", "cof"] {
            search.set(input.to_owned());
            advance(100).await;
        }
        assert!(!settled.has_changed().unwrap());

        advance(450).await;
        assert!(settled.has_changed().unwrap());
        assert_eq!(*settled.borrow_and_update(), "cof");

        advance(1_000).await;
        assert!(!settled.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_value_does_not_notify() {
        let mut search = Debounced::new("tea".to_owned(), DELAY);
        let settled = search.subscribe();

        search.set("teas".to_owned());
        advance(100).await;
        search.set("tea".to_owned());
        advance(600).await;

        assert!(!settled.has_changed().unwrap());
        assert_eq!(search.get(), "tea");
    }

    #[tokio::test(start_paused = true)]
    async fn flush_bypasses_delay_and_cancels_pending() {
        let mut search = Debounced::new(String::new(), DELAY);
        let mut settled = search.subscribe();

        search.set("cof".to_owned());
        advance(100).await;
        assert!(search.flush("coffee".to_owned()));
        assert_eq!(*settled.borrow_and_update(), "coffee");

        advance(1_000).await;
        assert!(!settled.has_changed().unwrap());
        assert_eq!(search.get(), "coffee");
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_timer_cannot_publish_after_flush() {
        let mut search = Debounced::new(String::new(), DELAY);
        let mut settled = search.subscribe();
        search.set("stale".to_owned());
        let stale_generation = search.shared.generation.load(Ordering::SeqCst);

        assert!(search.flush("fresh".to_owned()));
        drop(settled.borrow_and_update());
        assert!(
            !search
                .shared
                .publish_if_current(stale_generation, "stale".to_owned())
        );

        assert_eq!(search.get(), "fresh");
        assert!(!settled.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_keeps_settled_value() {
        let mut search = Debounced::new("tea".to_owned(), DELAY);
        search.set("coffee".to_owned());
        search.cancel();
        assert!(!search.is_pending());

        advance(1_000).await;
        assert_eq!(search.get(), "tea");
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending_update() {
        let mut search = Debounced::new(String::new(), DELAY);
        let settled = search.subscribe();
        search.set("late".to_owned());
        drop(search);

        advance(1_000).await;
        assert_eq!(*settled.borrow(), "");
    }
}
