use crate::{
    api::ReportApi,
    events::{ClientEvent, EventSink},
    model::filter::TimeFilter,
    store::{self, ReplaceSummary, SharedStore},
    Result,
};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

/// The filter a request was issued under.
///
/// `generation` increments on every filter change, so a response for a
/// filter that was left and later re-selected is still recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterTag {
    pub filter: TimeFilter,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Applied(ReplaceSummary),
    /// The response belonged to a superseded filter and was dropped
    Discarded { requested: TimeFilter, current: TimeFilter },
    /// A response to a later request for the same filter was already applied
    Outdated { filter: TimeFilter },
}

impl PollOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Keeps the [`ReportStore`](crate::store::ReportStore) in step with the backend.
///
/// Cloning is cheap; clones share the store, the filter state and the
/// event sink, which is how the poller task and the mutation client drive
/// the same engine.
/// Selected filter plus the newest request whose response reached the store
#[derive(Debug)]
struct FilterState {
    tag: FilterTag,
    last_applied_seq: u64,
}

#[derive(Clone)]
pub struct SyncEngine {
    api: Arc<dyn ReportApi>,
    store: SharedStore,
    state: Arc<Mutex<FilterState>>,
    /// Issue order of fetches, starting at 1
    next_seq: Arc<AtomicU64>,
    events: EventSink,
}

impl SyncEngine {
    pub fn new(api: Arc<dyn ReportApi>, store: SharedStore, filter: TimeFilter) -> Self {
        Self {
            api,
            store,
            state: Arc::new(Mutex::new(FilterState {
                tag: FilterTag {
                    filter,
                    generation: 0,
                },
                last_applied_seq: 0,
            })),
            next_seq: Arc::new(AtomicU64::new(0)),
            events: EventSink::none(),
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn time_filter(&self) -> TimeFilter {
        self.lock_state().tag.filter
    }

    pub fn current_tag(&self) -> FilterTag {
        self.lock_state().tag
    }

    /// Fetch a snapshot for the current filter
    pub async fn poll(&self) -> Result<PollOutcome> {
        let tag = self.current_tag();
        self.poll_tagged(tag).await
    }

    /// Fetch a snapshot for `filter`. It is applied only if `filter` is
    /// still the selected one when the response arrives and no later
    /// request has been applied in the meantime.
    pub async fn poll_filter(&self, filter: TimeFilter) -> Result<PollOutcome> {
        let generation = self.current_tag().generation;
        self.poll_tagged(FilterTag { filter, generation }).await
    }

    /// Select a new time window and fetch it. Requests still in flight for
    /// the old window are not cancelled; their responses are discarded.
    pub async fn set_time_filter(&self, filter: TimeFilter) -> Result<PollOutcome> {
        {
            let mut state = self.lock_state();
            if state.tag.filter != filter {
                state.tag.filter = filter;
                state.tag.generation += 1;
                log::info!(
                    "time filter changed to {} (generation {})",
                    filter,
                    state.tag.generation
                );
            }
        }
        self.poll().await
    }

    async fn poll_tagged(&self, tag: FilterTag) -> Result<PollOutcome> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!(
            "polling reports for {} (generation {}, request {})",
            tag.filter,
            tag.generation,
            seq
        );

        let snapshot = match self.api.fetch_reports(tag.filter).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("poll for {} failed: {}", tag.filter, e);
                self.events.emit(ClientEvent::PollFailed {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let summary = {
            // Held while writing so a concurrent filter change or a newer
            // response cannot slip between the check and the swap.
            let mut state = self.lock_state();
            if state.tag != tag {
                log::info!(
                    "discarding {} snapshot, {} is now selected",
                    tag.filter,
                    state.tag.filter
                );
                let outcome = PollOutcome::Discarded {
                    requested: tag.filter,
                    current: state.tag.filter,
                };
                drop(state);
                self.events.emit(ClientEvent::PollDiscarded { filter: tag.filter });
                return Ok(outcome);
            }
            if seq <= state.last_applied_seq {
                log::info!(
                    "discarding {} snapshot from request {}, request {} already applied",
                    tag.filter,
                    seq,
                    state.last_applied_seq
                );
                drop(state);
                self.events.emit(ClientEvent::PollDiscarded { filter: tag.filter });
                return Ok(PollOutcome::Outdated { filter: tag.filter });
            }
            state.last_applied_seq = seq;
            store::write(&self.store).replace_all(snapshot)
        };

        log::info!(
            "applied {} snapshot: {} reports ({} pending kept, {} dropped)",
            tag.filter,
            summary.total,
            summary.retained,
            summary.dropped
        );
        self.events.emit(ClientEvent::ReportsUpdated {
            count: summary.total,
            filter: tag.filter,
        });
        Ok(PollOutcome::Applied(summary))
    }

    fn lock_state(&self) -> MutexGuard<'_, FilterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
