//! Error taxonomy for the report lifecycle core.
//!
//! Commands either succeed, no-op explicitly (repeat confirm), or return one
//! typed failure. Nothing is retried inside the core and no write is ever
//! silently dropped.

use crate::model::ReportId;
use std::fmt;
use thiserror::Error;

/// Machine-readable error codes for client-side decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidCoordinates,
    DescriptionTooLong,
    EmptyAuthorToken,
    UnknownCategory,
    EmptyComment,
    CommentTooLong,
    ReportNotFound,
    ReportExpired,
    StoreUnavailable,
    WriteRejected,
    CorruptRecord,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidCoordinates => "E1001",
            Self::DescriptionTooLong => "E1002",
            Self::EmptyAuthorToken => "E1003",
            Self::UnknownCategory => "E1004",
            Self::EmptyComment => "E1005",
            Self::CommentTooLong => "E1006",
            Self::ReportNotFound => "E2001",
            Self::ReportExpired => "E2002",
            Self::StoreUnavailable => "E3001",
            Self::WriteRejected => "E3002",
            Self::CorruptRecord => "E3003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidCoordinates => "Coordinates out of range",
            Self::DescriptionTooLong => "Description too long",
            Self::EmptyAuthorToken => "Missing device token",
            Self::UnknownCategory => "Unknown report category",
            Self::EmptyComment => "Empty comment",
            Self::CommentTooLong => "Comment too long",
            Self::ReportNotFound => "Report not found",
            Self::ReportExpired => "Report expired",
            Self::StoreUnavailable => "Report store unavailable",
            Self::WriteRejected => "Store rejected the write",
            Self::CorruptRecord => "Corrupt report record",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidCoordinates => {
                Some("Latitude must be within [-90, 90] and longitude within [-180, 180].")
            }
            Self::DescriptionTooLong => Some("Shorten the description to 200 characters."),
            Self::EmptyAuthorToken => Some("Run `reten token` to generate a device token."),
            Self::UnknownCategory => {
                Some("Use one of: vehicular-control, sobriety-check, document-check, fines, unspecified.")
            }
            Self::EmptyComment => None,
            Self::CommentTooLong => Some("Shorten the comment to 120 characters."),
            Self::ReportNotFound => None,
            Self::ReportExpired => Some("Reports disappear 2 hours after creation."),
            Self::StoreUnavailable => Some("Check connectivity and retry."),
            Self::WriteRejected => Some("Retry once. If persistent, report a bug with logs."),
            Self::CorruptRecord => Some("The stored record is inconsistent; report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failures surfaced by a [`ReportStore`](crate::store::ReportStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("report {id} not found")]
    NotFound { id: ReportId },

    #[error("report store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("store rejected the write: {reason}")]
    Rejected { reason: String },

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: ReportId, reason: String },
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::ReportNotFound,
            Self::Unavailable { .. } => ErrorCode::StoreUnavailable,
            Self::Rejected { .. } => ErrorCode::WriteRejected,
            Self::Corrupt { .. } => ErrorCode::CorruptRecord,
        }
    }
}

/// Failures surfaced by lifecycle commands.
///
/// `Validation` is rejected before any store call; `NotFound` covers both a
/// missing report and one past its visibility window (confirming or
/// commenting on an expired report is rejected, not silently accepted).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("validation failed: {reason}")]
    Validation { code: ErrorCode, reason: String },

    #[error("report {id} missing or expired")]
    NotFound { id: ReportId, expired: bool },

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl LifecycleError {
    /// The machine-readable code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::NotFound { expired: true, .. } => ErrorCode::ReportExpired,
            Self::NotFound { expired: false, .. } => ErrorCode::ReportNotFound,
            Self::Persistence(err) => err.code(),
        }
    }
}
