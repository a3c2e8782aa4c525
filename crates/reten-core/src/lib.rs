//! Report lifecycle core for citizen checkpoint alerts.
//!
//! Defines the report shape, the 2-hour visibility window, the
//! dedup-by-token voting rule, the append-only comment rule, and the
//! per-client view projection over a shared store with a change feed.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums ([`error::LifecycleError`],
//!   [`error::StoreError`]); nothing is retried inside the core.
//! - **Logging**: `tracing` macros (`info!`, `debug!`); subscribers are the
//!   binary's concern.
//! - **Time and identity**: always explicit parameters, never ambient.

pub mod error;
pub mod lifecycle;
pub mod model;
pub mod store;
pub mod view;

pub use error::{ErrorCode, LifecycleError, StoreError};
pub use lifecycle::{ConfirmOutcome, Lifecycle, SubmitRequest, classify_heat};
pub use model::{Category, Comment, Heat, Location, Report, ReportId};
pub use store::{ReportStore, SqliteReportStore};
pub use view::ClientView;
