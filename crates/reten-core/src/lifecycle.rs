//! Report lifecycle rules: submission, vote deduplication, append-only
//! comments, and the time-windowed visible projection.
//!
//! Every operation takes explicit `now` and identity parameters; the core
//! never reads a clock or a device token from ambient state. All writes go
//! through the shared [`ReportStore`]; nothing here is authoritative until
//! the store acknowledges it.

use crate::error::{ErrorCode, LifecycleError, StoreError};
use crate::model::{
    Category, Comment, Heat, Location, MAX_COMMENT_CHARS, MAX_DESCRIPTION_CHARS, Report,
    ReportId, token_prefix, visibility_window,
};
use crate::store::{NewReport, ReportPatch, ReportStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// A report submission before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub lat: f64,
    pub lng: f64,
    pub category: Category,
    pub description: Option<String>,
    pub author_token: String,
}

/// Result of a confirm command. A repeat confirm from the same token is a
/// successful no-op, never an error and never a duplicate increment.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    /// The token was added and the count incremented by exactly one.
    Applied(Report),
    /// The token had already confirmed; the report is returned unchanged.
    AlreadyConfirmed(Report),
}

impl ConfirmOutcome {
    #[must_use]
    pub const fn report(&self) -> &Report {
        match self {
            Self::Applied(report) | Self::AlreadyConfirmed(report) => report,
        }
    }

    #[must_use]
    pub fn into_report(self) -> Report {
        match self {
            Self::Applied(report) | Self::AlreadyConfirmed(report) => report,
        }
    }

    /// True on the duplicate-vote path. Callers show no notification here;
    /// the vote is treated as already satisfied.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::AlreadyConfirmed(_))
    }
}

/// Derived presentation hint: corroborated once three distinct tokens have
/// confirmed. A policy constant, not stored state.
#[must_use]
pub const fn classify_heat(report: &Report) -> Heat {
    report.heat()
}

/// The lifecycle manager for one connected client context.
///
/// Not internally multi-threaded; concurrency comes from independent
/// clients holding their own `Lifecycle` over one shared store.
pub struct Lifecycle {
    store: Arc<dyn ReportStore>,
}

impl Lifecycle {
    #[must_use]
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    /// The shared store behind this manager.
    #[must_use]
    pub fn store(&self) -> Arc<dyn ReportStore> {
        Arc::clone(&self.store)
    }

    /// Validate and persist a new report.
    ///
    /// On success the report reaches every connected client's visible set
    /// within one propagation cycle of the store's change feed. On failure
    /// nothing is buffered; resubmission is the caller's decision
    /// (at-most-once per user action).
    ///
    /// # Errors
    ///
    /// `Validation` for malformed input (rejected before any store call),
    /// `Persistence` when the store write fails.
    pub fn submit(
        &self,
        request: SubmitRequest,
        now: DateTime<Utc>,
    ) -> Result<Report, LifecycleError> {
        let location = Location::new(request.lat, request.lng).map_err(|err| {
            LifecycleError::Validation {
                code: ErrorCode::InvalidCoordinates,
                reason: err.to_string(),
            }
        })?;
        let author_token = validated_token(&request.author_token)?;
        let description = normalized_description(request.description)?;

        let report = self.store.insert(NewReport {
            location,
            category: request.category,
            description,
            author_token,
            created_at: now,
        })?;

        info!(id = %report.id, category = %report.category, "report submitted");
        Ok(report)
    }

    /// Record one corroboration for `(id, token)`.
    ///
    /// Idempotent per pair: the membership check runs against the current
    /// stored voter set inside the store's per-record transaction, so two
    /// racing confirms from the same token cannot both count.
    ///
    /// # Errors
    ///
    /// `NotFound` when the report is missing or already past its visibility
    /// window (confirming an expired report is rejected, not silently
    /// accepted); `Validation` for an empty token; `Persistence` on store
    /// failure.
    pub fn confirm(
        &self,
        id: &ReportId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ConfirmOutcome, LifecycleError> {
        let token = validated_token(token)?;
        self.fetch_visible(id, now)?;

        let patched = self
            .store
            .update(id, ReportPatch::Confirm { token })
            .map_err(not_found_as_lifecycle)?;

        if patched.changed {
            debug!(id = %id, confirmations = patched.report.confirmations, "confirm applied");
            Ok(ConfirmOutcome::Applied(patched.report))
        } else {
            debug!(id = %id, "confirm was a repeat; no-op");
            Ok(ConfirmOutcome::AlreadyConfirmed(patched.report))
        }
    }

    /// Append a comment to a visible report.
    ///
    /// The body is trimmed and must be 1..=120 characters afterwards; empty
    /// submissions are rejected without a store write. Attribution is the
    /// first 6 characters of the token, never the full token. A retry after
    /// an ambiguous failure may duplicate the comment (accepted
    /// at-least-once risk for this one operation).
    ///
    /// # Errors
    ///
    /// `Validation` for an empty or oversized body or empty token,
    /// `NotFound` for a missing or expired report, `Persistence` on store
    /// failure.
    pub fn add_comment(
        &self,
        id: &ReportId,
        text: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Report, LifecycleError> {
        let token = validated_token(token)?;
        let text = validated_comment(text)?;
        self.fetch_visible(id, now)?;

        let patched = self
            .store
            .update(
                id,
                ReportPatch::AppendComment {
                    comment: Comment {
                        text,
                        author_prefix: token_prefix(&token),
                        created_at: now,
                    },
                },
            )
            .map_err(not_found_as_lifecycle)?;

        debug!(id = %id, comments = patched.report.comments.len(), "comment appended");
        Ok(patched.report)
    }

    /// All reports with `now - created_at < 2h`, newest first.
    ///
    /// A pure, repeatable projection over current store contents: the same
    /// store state and the same `now` always produce the same sequence.
    ///
    /// # Errors
    ///
    /// `Persistence` when the store cannot be read.
    pub fn visible_reports(&self, now: DateTime<Utc>) -> Result<Vec<Report>, LifecycleError> {
        let reports = self.store.query_range(now - visibility_window())?;
        Ok(reports
            .into_iter()
            .filter(|report| report.is_visible(now))
            .collect())
    }

    fn fetch_visible(&self, id: &ReportId, now: DateTime<Utc>) -> Result<Report, LifecycleError> {
        match self.store.fetch(id)? {
            None => Err(LifecycleError::NotFound {
                id: id.clone(),
                expired: false,
            }),
            Some(report) if !report.is_visible(now) => Err(LifecycleError::NotFound {
                id: id.clone(),
                expired: true,
            }),
            Some(report) => Ok(report),
        }
    }
}

fn validated_token(token: &str) -> Result<String, LifecycleError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::Validation {
            code: ErrorCode::EmptyAuthorToken,
            reason: "device token must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn normalized_description(description: Option<String>) -> Result<Option<String>, LifecycleError> {
    let Some(description) = description else {
        return Ok(None);
    };

    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_DESCRIPTION_CHARS {
        return Err(LifecycleError::Validation {
            code: ErrorCode::DescriptionTooLong,
            reason: format!(
                "description must be <= {MAX_DESCRIPTION_CHARS} characters (got {chars})"
            ),
        });
    }

    Ok(Some(trimmed.to_string()))
}

fn validated_comment(text: &str) -> Result<String, LifecycleError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::Validation {
            code: ErrorCode::EmptyComment,
            reason: "comment must not be empty after trimming".to_string(),
        });
    }

    let chars = trimmed.chars().count();
    if chars > MAX_COMMENT_CHARS {
        return Err(LifecycleError::Validation {
            code: ErrorCode::CommentTooLong,
            reason: format!("comment must be <= {MAX_COMMENT_CHARS} characters (got {chars})"),
        });
    }

    Ok(trimmed.to_string())
}

fn not_found_as_lifecycle(err: StoreError) -> LifecycleError {
    match err {
        StoreError::NotFound { id } => LifecycleError::NotFound { id, expired: false },
        other => LifecycleError::Persistence(other),
    }
}
