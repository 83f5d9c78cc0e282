//! Debounced, filterable perk listing.
//!
//! [`ControllerHandle::spawn`] starts a task that owns the listing state
//! and reacts to a fixed set of triggers:
//!
//! - the search text settling after the debounce delay,
//! - the merchant filter changing (no debounce),
//! - an explicit submit, which settles the typed text immediately,
//! - a reset, which clears both filters and the error,
//! - a retry, which repeats the fetch with the current filters.
//!
//! Each trigger issues one fetch. Snapshots of [`ListingState`] are
//! published through a `watch` channel after every change.

mod state;

use alloc::sync::Arc;
use core::time::Duration;
use std::collections::HashMap;

use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinError, JoinSet};

use crate::debounce::Debounced;
use crate::error::{FALLBACK_ERROR_MESSAGE, PerksError, Result};
use crate::models::{PerkQuery, PerksResponse};
use crate::source::PerkSource;

pub use state::{ListingState, unique_merchants};

/// Delay after the last keystroke before the search text settles.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Tuning knobs for the listing controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Quiet period before typed search text triggers a fetch.
    pub debounce: Duration,
    /// Apply only the response of the most recently issued fetch.
    ///
    /// When `false`, whichever response resolves last wins, even if it
    /// belongs to an older request.
    pub discard_stale_responses: bool,
}

impl Default for ControllerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            discard_stale_responses: true,
        }
    }
}

impl ControllerConfig {
    /// Sets the debounce delay.
    #[inline]
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets whether responses of superseded fetches are dropped.
    #[inline]
    #[must_use]
    pub const fn with_discard_stale_responses(mut self, discard: bool) -> Self {
        self.discard_stale_responses = discard;
        self
    }
}

/// Messages from handles to the controller task.
#[derive(Debug)]
enum Command {
    /// Search text was edited.
    SetSearch(String),
    /// Merchant filter was selected.
    SetMerchant(String),
    /// Search was submitted explicitly.
    Submit,
    /// Filters were cleared.
    Reset,
    /// The last fetch should be repeated.
    Retry,
    /// The controller should stop.
    Shutdown,
}

/// Handle to a running listing controller.
///
/// Handles are cheap to clone. The controller stops when
/// [`ControllerHandle::shutdown`] is called or every handle is dropped;
/// its pending debounce timer and in-flight fetches are aborted then.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    /// Command channel into the controller task.
    commands: mpsc::UnboundedSender<Command>,
    /// Latest published snapshot.
    state: watch::Receiver<ListingState>,
}

impl ControllerHandle {
    /// Spawns a controller on the current tokio runtime and starts the
    /// initial, unfiltered fetch.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[inline]
    pub fn spawn<S: PerkSource>(source: Arc<S>, config: ControllerConfig) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let mut controller = ListingController::new(source, config);
        controller.fetch();
        controller.publish();
        let state = controller.publisher.subscribe();
        let _controller_task = tokio::spawn(controller.run(receiver));
        Self { commands, state }
    }

    /// Updates the search text. A fetch follows once the text has been
    /// left unchanged for the debounce delay.
    ///
    /// # Errors
    ///
    /// Returns [`PerksError::ControllerClosed`] if the controller stopped.
    #[inline]
    pub fn set_search<T: Into<String>>(&self, text: T) -> Result<()> {
        self.send(Command::SetSearch(text.into()))
    }

    /// Updates the merchant filter and fetches immediately if it changed.
    ///
    /// # Errors
    ///
    /// Returns [`PerksError::ControllerClosed`] if the controller stopped.
    #[inline]
    pub fn set_merchant<T: Into<String>>(&self, merchant: T) -> Result<()> {
        self.send(Command::SetMerchant(merchant.into()))
    }

    /// Fetches with the latest typed text without waiting for the
    /// debounce delay.
    ///
    /// # Errors
    ///
    /// Returns [`PerksError::ControllerClosed`] if the controller stopped.
    #[inline]
    pub fn submit(&self) -> Result<()> {
        self.send(Command::Submit)
    }

    /// Clears the search text, merchant filter, and error, then fetches
    /// the full list.
    ///
    /// # Errors
    ///
    /// Returns [`PerksError::ControllerClosed`] if the controller stopped.
    #[inline]
    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    /// Repeats the fetch with the current filters.
    ///
    /// # Errors
    ///
    /// Returns [`PerksError::ControllerClosed`] if the controller stopped.
    #[inline]
    pub fn retry(&self) -> Result<()> {
        self.send(Command::Retry)
    }

    /// Stops the controller.
    ///
    /// # Errors
    ///
    /// Returns [`PerksError::ControllerClosed`] if it already stopped.
    #[inline]
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Returns `true` once the controller task has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Returns the latest snapshot.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ListingState {
        self.state.borrow().clone()
    }

    /// Returns a receiver notified on every published change.
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListingState> {
        self.state.clone()
    }

    /// Waits for the next published change and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`PerksError::ControllerClosed`] if the controller stopped.
    #[inline]
    pub async fn changed(&mut self) -> Result<ListingState> {
        self.state
            .changed()
            .await
            .map_err(|_closed| PerksError::ControllerClosed)?;
        Ok(self.state.borrow_and_update().clone())
    }

    /// Sends a command to the controller task.
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_closed| PerksError::ControllerClosed)
    }
}

/// Request number paired with its result.
type FetchOutcome = (u64, Result<PerksResponse>);

/// State owned by the controller task.
#[derive(Debug)]
struct ListingController<S> {
    /// Where perks come from.
    source: Arc<S>,
    /// Behavior switches.
    config: ControllerConfig,
    /// Current listing state.
    state: ListingState,
    /// Publishes snapshots of `state`.
    publisher: watch::Sender<ListingState>,
    /// Debounced search text.
    search: Debounced<String>,
    /// Notified when the debounced search text changes.
    settled: watch::Receiver<String>,
    /// In-flight fetches.
    fetches: JoinSet<FetchOutcome>,
    /// Request number of each in-flight fetch task, so a task that panics
    /// can still be matched to its request.
    requests: HashMap<task::Id, u64>,
    /// Number of the most recently issued fetch.
    latest_request: u64,
}

impl<S: PerkSource> ListingController<S> {
    /// Creates an idle controller with empty filters.
    fn new(source: Arc<S>, config: ControllerConfig) -> Self {
        let search = Debounced::new(String::new(), config.debounce);
        let settled = search.subscribe();
        let (publisher, _receiver) = watch::channel(ListingState::default());
        Self {
            source,
            config,
            state: ListingState::default(),
            publisher,
            search,
            settled,
            fetches: JoinSet::new(),
            requests: HashMap::new(),
            latest_request: 0,
        }
    }

    /// Event loop: runs until shutdown or until every handle is dropped.
    #[tracing::instrument(name = "listing_controller", skip_all)]
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!("listing controller started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::SetSearch(text)) => self.set_search(text),
                    Some(Command::SetMerchant(merchant)) => self.set_merchant(merchant),
                    Some(Command::Submit) => self.submit(),
                    Some(Command::Reset) => self.reset(),
                    Some(Command::Retry) => self.fetch(),
                    Some(Command::Shutdown) | None => break,
                },
                changed = self.settled.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let text = self.settled.borrow_and_update().clone();
                    self.on_search_settled(text);
                }
                Some(joined) = self.fetches.join_next_with_id(), if !self.fetches.is_empty() => {
                    self.on_fetch_settled(joined);
                }
            }
            self.publish();
        }

        self.search.cancel();
        let in_flight = self.fetches.len();
        self.fetches.abort_all();
        self.requests.clear();
        tracing::debug!(in_flight, "listing controller stopped");
    }

    /// Records typed text and re-arms the debounce timer.
    fn set_search(&mut self, text: String) {
        tracing::trace!(len = text.len(), "search text edited");
        self.state.set_search_query(text.clone());
        self.search.set(text);
    }

    /// Applies a merchant selection, fetching if the effective filter
    /// changed. Whitespace-only edits update the state without a fetch.
    fn set_merchant(&mut self, merchant: String) {
        if merchant == self.state.merchant_filter() {
            return;
        }
        let unchanged = merchant.trim() == self.state.merchant_filter().trim();
        self.state.set_merchant_filter(merchant);
        if !unchanged {
            self.fetch();
        }
    }

    /// Settles the typed text without waiting and fetches.
    fn submit(&mut self) {
        let text = self.state.search_query().to_owned();
        self.settle_search(text);
        self.fetch();
    }

    /// Clears filters and error, then fetches the full list.
    fn reset(&mut self) {
        self.state.reset_filters();
        self.settle_search(String::new());
        self.fetch();
    }

    /// Settles `text` as the debounced search without triggering the
    /// settled-search branch of the event loop.
    fn settle_search(&mut self, text: String) {
        _ = self.search.flush(text.clone());
        drop(self.settled.borrow_and_update());
        self.state.set_debounced_search_query(text);
    }

    /// Handles the debounced search text changing.
    fn on_search_settled(&mut self, text: String) {
        if text == self.state.debounced_search_query() {
            return;
        }
        self.state.set_debounced_search_query(text);
        self.fetch();
    }

    /// Starts a fetch with the current filters.
    fn fetch(&mut self) {
        self.latest_request = self.latest_request.wrapping_add(1);
        let request = self.latest_request;
        let query = PerkQuery::new(
            self.state.debounced_search_query(),
            self.state.merchant_filter(),
        );
        tracing::debug!(
            request,
            search = query.search().unwrap_or_default(),
            merchant = query.merchant().unwrap_or_default(),
            "fetching perks"
        );
        self.state.begin_fetch();

        let source = Arc::clone(&self.source);
        let fetch_task = self.fetches.spawn(async move {
            let result = source.fetch_perks(&query).await;
            (request, result)
        });
        _ = self.requests.insert(fetch_task.id(), request);
    }

    /// Applies the outcome of a finished fetch.
    ///
    /// A fetch task that panicked is reported with the fallback message.
    fn on_fetch_settled(
        &mut self,
        joined: core::result::Result<(task::Id, FetchOutcome), JoinError>,
    ) {
        let (request, result) = match joined {
            Ok((id, (request, result))) => {
                _ = self.requests.remove(&id);
                (Some(request), Some(result))
            }
            Err(err) => {
                let request = self.requests.remove(&err.id());
                tracing::warn!(?request, error = %err, "fetch task failed");
                (request, None)
            }
        };

        if self.config.discard_stale_responses && request != Some(self.latest_request) {
            tracing::debug!(
                ?request,
                latest = self.latest_request,
                "discarding stale response"
            );
            return;
        }

        match result {
            Some(Ok(response)) => {
                tracing::debug!(?request, count = response.perks.len(), "perks loaded");
                self.state.replace_perks(response.perks);
            }
            Some(Err(err)) => {
                tracing::warn!(?request, error = %err, "failed to load perks");
                self.state.fail(err.user_message());
            }
            None => self.state.fail(FALLBACK_ERROR_MESSAGE.to_owned()),
        }
        self.state.end_fetch();
    }

    /// Publishes the current state if it changed.
    fn publish(&self) {
        let state = &self.state;
        _ = self.publisher.send_if_modified(|current| {
            if *current == *state {
                false
            } else {
                current.clone_from(state);
                true
            }
        });
    }
}
