//! SQLite-backed report store.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` to allow concurrent readers while writers commit
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON` kept on for parity with future relational tables
//!
//! Every update runs as one transaction against the current stored record,
//! which is what makes the confirm patch an atomic conditional update rather
//! than a blind increment.

use super::migrations;
use super::{ChangeCallback, NewReport, Patched, ReportPatch, ReportStore, SubscriptionId};
use crate::error::StoreError;
use crate::model::{Category, Comment, Location, Report, ReportId};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "report_id, lat, lng, category, description, author_token, \
     confirmations, voter_tokens, comments, created_at_us";

/// Shared, serialized SQLite store. Clients share one instance behind an
/// `Arc`; the connection mutex serializes writes per store, which satisfies
/// the per-record serialization the contract requires.
pub struct SqliteReportStore {
    conn: Mutex<Connection>,
    subscribers: Mutex<BTreeMap<u64, ChangeCallback>>,
    next_subscription: AtomicU64,
}

impl SqliteReportStore {
    /// Open (or create) the store at `path`, apply runtime pragmas, and
    /// migrate the schema to the latest version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if opening, configuring, or
    /// migrating the database fails.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| StoreError::Unavailable {
                reason: format!("create store directory {}: {err}", parent.display()),
            })?;
        }

        let conn = Connection::open(path).map_err(|err| StoreError::Unavailable {
            reason: format!("open store database {}: {err}", path.display()),
        })?;

        Self::from_connection(conn)
    }

    /// Open an in-memory store. Used by tests and simulations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if SQLite setup fails.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(map_sqlite)?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, StoreError> {
        configure_connection(&conn).map_err(map_sqlite)?;
        migrations::migrate(&mut conn).map_err(map_sqlite)?;

        Ok(Self {
            conn: Mutex::new(conn),
            subscribers: Mutex::new(BTreeMap::new()),
            next_subscription: AtomicU64::new(1),
        })
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fire the wildcard change signal. Delivery happens under the
    /// subscriber lock so that `unsubscribe` never races a late callback.
    fn notify(&self) {
        let subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        debug!(subscribers = subscribers.len(), "reports changed");
        for callback in subscribers.values() {
            callback();
        }
    }
}

impl ReportStore for SqliteReportStore {
    fn insert(&self, new: NewReport) -> Result<Report, StoreError> {
        let report = Report {
            id: ReportId::generate(),
            location: new.location,
            category: new.category,
            description: new.description,
            created_at: new.created_at,
            author_token: new.author_token,
            confirmations: 0,
            voter_tokens: BTreeSet::new(),
            comments: Vec::new(),
        };

        {
            let conn = self.lock_conn();
            conn.execute(
                "INSERT INTO reports (
                    report_id, lat, lng, category, description, author_token,
                    confirmations, voter_tokens, comments, created_at_us
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, '[]', '[]', ?7)",
                params![
                    report.id.as_str(),
                    report.location.lat,
                    report.location.lng,
                    report.category.as_str(),
                    report.description,
                    report.author_token,
                    report.created_at.timestamp_micros(),
                ],
            )
            .map_err(map_sqlite)?;
        }

        debug!(id = %report.id, category = %report.category, "report inserted");
        self.notify();
        Ok(report)
    }

    fn update(&self, id: &ReportId, patch: ReportPatch) -> Result<Patched, StoreError> {
        let (report, changed) = {
            let mut conn = self.lock_conn();
            let tx = conn.transaction().map_err(map_sqlite)?;

            let raw = query_raw(&tx, id)?.ok_or_else(|| StoreError::NotFound {
                id: id.clone(),
            })?;
            let mut current = report_from_raw(raw)?;

            let changed = match patch {
                ReportPatch::Confirm { token } => {
                    if current.voter_tokens.contains(&token) {
                        false
                    } else {
                        current.voter_tokens.insert(token);
                        current.confirmations = voter_count(&current.voter_tokens)?;
                        tx.execute(
                            "UPDATE reports
                             SET confirmations = ?1, voter_tokens = ?2
                             WHERE report_id = ?3",
                            params![
                                current.confirmations,
                                encode_json(&current.voter_tokens)?,
                                id.as_str(),
                            ],
                        )
                        .map_err(map_sqlite)?;
                        true
                    }
                }
                ReportPatch::AppendComment { comment } => {
                    current.comments.push(comment);
                    tx.execute(
                        "UPDATE reports SET comments = ?1 WHERE report_id = ?2",
                        params![encode_json(&current.comments)?, id.as_str()],
                    )
                    .map_err(map_sqlite)?;
                    true
                }
            };

            if changed {
                tx.commit().map_err(map_sqlite)?;
            }
            (current, changed)
        };

        if changed {
            debug!(id = %id, "report updated");
            self.notify();
        }
        Ok(Patched { report, changed })
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        let conn = self.lock_conn();
        let raw = query_raw(&conn, id)?;
        raw.map(report_from_raw).transpose()
    }

    fn query_range(&self, min_created_at: DateTime<Utc>) -> Result<Vec<Report>, StoreError> {
        let conn = self.lock_conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS}
                 FROM reports
                 WHERE created_at_us >= ?1
                 ORDER BY created_at_us DESC, report_id ASC"
            ))
            .map_err(map_sqlite)?;

        let rows = stmt
            .query_map(params![min_created_at.timestamp_micros()], raw_from_row)
            .map_err(map_sqlite)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sqlite)?;

        rows.into_iter().map(report_from_raw).collect()
    }

    fn subscribe(&self, on_change: ChangeCallback) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, on_change);
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id.0);
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

fn map_sqlite(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Rejected {
                reason: err.to_string(),
            }
        }
        _ => StoreError::Unavailable {
            reason: err.to_string(),
        },
    }
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|err| StoreError::Rejected {
        reason: format!("encode record field: {err}"),
    })
}

fn voter_count(voters: &BTreeSet<String>) -> Result<u32, StoreError> {
    u32::try_from(voters.len()).map_err(|_| StoreError::Rejected {
        reason: "voter set exceeds u32::MAX".to_string(),
    })
}

/// Raw column values before domain decoding. Kept separate so rusqlite row
/// mapping stays infallible with respect to domain rules.
struct RawRow {
    report_id: String,
    lat: f64,
    lng: f64,
    category: String,
    description: Option<String>,
    author_token: String,
    confirmations: i64,
    voter_tokens: String,
    comments: String,
    created_at_us: i64,
}

fn raw_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        report_id: row.get(0)?,
        lat: row.get(1)?,
        lng: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        author_token: row.get(5)?,
        confirmations: row.get(6)?,
        voter_tokens: row.get(7)?,
        comments: row.get(8)?,
        created_at_us: row.get(9)?,
    })
}

fn query_raw(conn: &Connection, id: &ReportId) -> Result<Option<RawRow>, StoreError> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM reports WHERE report_id = ?1"),
        params![id.as_str()],
        raw_from_row,
    )
    .optional()
    .map_err(map_sqlite)
}

fn report_from_raw(raw: RawRow) -> Result<Report, StoreError> {
    let id = ReportId::new(raw.report_id);

    let corrupt = |reason: String| StoreError::Corrupt {
        id: id.clone(),
        reason,
    };

    let location =
        Location::new(raw.lat, raw.lng).map_err(|err| corrupt(err.to_string()))?;
    let category =
        Category::from_str(&raw.category).map_err(|err| corrupt(err.to_string()))?;
    let created_at = DateTime::<Utc>::from_timestamp_micros(raw.created_at_us)
        .ok_or_else(|| corrupt(format!("bad timestamp {}", raw.created_at_us)))?;

    let voter_tokens: BTreeSet<String> = serde_json::from_str(&raw.voter_tokens)
        .map_err(|err| corrupt(format!("bad voter_tokens json: {err}")))?;
    let comments: Vec<Comment> = serde_json::from_str(&raw.comments)
        .map_err(|err| corrupt(format!("bad comments json: {err}")))?;

    let confirmations = u32::try_from(raw.confirmations)
        .map_err(|_| corrupt(format!("bad confirmation count {}", raw.confirmations)))?;
    let expected = u32::try_from(voter_tokens.len())
        .map_err(|_| corrupt("voter set exceeds u32::MAX".to_string()))?;
    if confirmations != expected {
        return Err(corrupt(format!(
            "confirmations {} disagrees with {} voter tokens",
            confirmations,
            voter_tokens.len()
        )));
    }

    Ok(Report {
        id,
        location,
        category,
        description: raw.description,
        created_at,
        author_token: raw.author_token,
        confirmations,
        voter_tokens,
        comments,
    })
}
