//! Per-client materialized view of the visible report set.
//!
//! Kept current by two cooperating strategies, both required: the store's
//! change feed marks the view dirty (new reports show up within one
//! propagation cycle), and a time-driven re-filter ages reports out even
//! when the store stays quiet. Neither alone is enough.

use crate::error::StoreError;
use crate::model::{Report, visibility_window};
use crate::store::{ReportStore, SubscriptionId};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Default interval between unconditional re-queries.
#[must_use]
pub fn default_refilter_interval() -> Duration {
    Duration::seconds(60)
}

/// The live, per-client list of currently visible reports.
///
/// One logical actor per connected client: the view is read and refreshed
/// from a single context, while change signals may arrive from other
/// clients' writer threads. The view is always rebuilt from store state,
/// never mutated directly by callers.
pub struct ClientView {
    store: Arc<dyn ReportStore>,
    subscription: Option<SubscriptionId>,
    dirty: Arc<AtomicBool>,
    reports: Vec<Report>,
    refreshed_at: Option<DateTime<Utc>>,
    refilter_interval: Duration,
}

impl ClientView {
    /// Subscribe to the store's change feed and return an empty view. The
    /// first [`visible`](Self::visible) call performs the initial query.
    #[must_use]
    pub fn connect(store: Arc<dyn ReportStore>) -> Self {
        Self::with_refilter_interval(store, default_refilter_interval())
    }

    /// [`connect`](Self::connect) with an explicit re-filter interval.
    #[must_use]
    pub fn with_refilter_interval(store: Arc<dyn ReportStore>, interval: Duration) -> Self {
        let dirty = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&dirty);
        let subscription = store.subscribe(Arc::new(move || {
            // Change signals carry no payload; remember only that a
            // re-query is due. The store is re-queried, never trusted
            // incrementally.
            flag.store(true, Ordering::SeqCst);
        }));

        Self {
            store,
            subscription: Some(subscription),
            dirty,
            reports: Vec::new(),
            refreshed_at: None,
            refilter_interval: interval,
        }
    }

    /// The currently visible reports, newest first.
    ///
    /// Re-queries the store when a change signal has arrived or when the
    /// re-filter interval has elapsed; otherwise the 2-hour window is
    /// re-applied to the cached list so quiet reports still age out.
    /// Assumes `now` does not move backwards between calls.
    ///
    /// # Errors
    ///
    /// Returns the store's error when the re-query fails; the view stays
    /// dirty and the next call retries.
    pub fn visible(&mut self, now: DateTime<Utc>) -> Result<&[Report], StoreError> {
        let signaled = self.dirty.swap(false, Ordering::SeqCst);
        let stale = self
            .refreshed_at
            .is_none_or(|at| now - at >= self.refilter_interval);

        if signaled || stale {
            match self.store.query_range(now - visibility_window()) {
                Ok(reports) => {
                    debug!(count = reports.len(), signaled, stale, "view refreshed");
                    self.reports = reports;
                    self.refreshed_at = Some(now);
                }
                Err(err) => {
                    self.dirty.store(true, Ordering::SeqCst);
                    return Err(err);
                }
            }
        }

        self.reports.retain(|report| report.is_visible(now));
        Ok(&self.reports)
    }

    /// Number of currently visible reports without forcing a refresh.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.reports.len()
    }

    /// Detach from the change feed. Also happens on drop; safe to call
    /// more than once.
    pub fn disconnect(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.store.unsubscribe(subscription);
        }
    }
}

impl Drop for ClientView {
    fn drop(&mut self) {
        self.disconnect();
    }
}
