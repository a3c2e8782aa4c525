//! Report store contract and the SQLite adapter.
//!
//! The store is the single source of truth: no client-local write counts
//! until the store has acknowledged it, and every connected client rebuilds
//! its visible set from store state rather than mutating it locally.

pub mod migrations;
pub mod schema;
pub mod sqlite;

use crate::error::StoreError;
use crate::model::{Category, Comment, Location, Report, ReportId};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub use sqlite::SqliteReportStore;

/// Change-feed callback. Fired on any insert or update touching the reports
/// collection, with no payload: subscribers must re-query rather than trust
/// a delta.
///
/// Callbacks run while the store's notification lock is held, which is what
/// lets [`ReportStore::unsubscribe`] guarantee no delivery after teardown.
/// They must be cheap and must not reenter the store; flipping a dirty flag
/// is the intended use.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`ReportStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Fields for a report about to be persisted. The store assigns the id and
/// starts the record with zero confirmations, no voters, and no comments.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub location: Location,
    pub category: Category,
    pub description: Option<String>,
    pub author_token: String,
    pub created_at: DateTime<Utc>,
}

/// Partial update keyed by report id. Exactly the two mutations the domain
/// allows: grow the voter set or append one comment.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportPatch {
    /// Add `token` to the voter set and bump the confirmation count.
    ///
    /// The membership check and the write happen in one transaction against
    /// the current stored voter set; a repeat token is reported as
    /// `changed: false` with no write. Never a blind increment.
    Confirm { token: String },
    /// Append one comment. Prior comments are never reordered or removed.
    AppendComment { comment: Comment },
}

/// Result of [`ReportStore::update`]: the post-update record and whether
/// anything was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Patched {
    pub report: Report,
    pub changed: bool,
}

/// Durable record storage with a time-range query and a change feed.
///
/// Implementations must serialize updates at least per record so that two
/// concurrent `Confirm` patches for the same token cannot both pass the
/// membership check. A failed update leaves the record exactly as it was.
pub trait ReportStore: Send + Sync {
    /// Persist a new report and return it with its store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] or [`StoreError::Rejected`] when
    /// the write fails; nothing is buffered for retry.
    fn insert(&self, new: NewReport) -> Result<Report, StoreError>;

    /// Apply a partial update to one report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record with `id` exists.
    fn update(&self, id: &ReportId, patch: ReportPatch) -> Result<Patched, StoreError>;

    /// Fetch a single report by id.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, StoreError>;

    /// All reports with `created_at >= min_created_at`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    fn query_range(&self, min_created_at: DateTime<Utc>) -> Result<Vec<Report>, StoreError>;

    /// Register a change-feed callback. See [`ChangeCallback`] for the
    /// delivery contract.
    fn subscribe(&self, on_change: ChangeCallback) -> SubscriptionId;

    /// Remove a subscription. Safe to call during teardown, safe to call
    /// twice, and no callback fires after it returns.
    fn unsubscribe(&self, id: SubscriptionId);
}
