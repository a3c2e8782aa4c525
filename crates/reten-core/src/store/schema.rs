//! Canonical SQLite schema for the shared reports store.
//!
//! One row per report. `voter_tokens` and `comments` are JSON text columns;
//! the wire shape of those fields is an external-interface detail, the
//! domain model decodes them into a set and an ordered sequence.

/// Migration v1: the reports table plus the range-query index.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS reports (
    report_id TEXT PRIMARY KEY CHECK (report_id LIKE 'rt-%'),
    lat REAL NOT NULL CHECK (lat BETWEEN -90.0 AND 90.0),
    lng REAL NOT NULL CHECK (lng BETWEEN -180.0 AND 180.0),
    category TEXT NOT NULL CHECK (category IN (
        'vehicular-control', 'sobriety-check', 'document-check', 'fines', 'unspecified'
    )),
    description TEXT,
    author_token TEXT NOT NULL CHECK (length(author_token) > 0),
    confirmations INTEGER NOT NULL DEFAULT 0 CHECK (confirmations >= 0),
    voter_tokens TEXT NOT NULL DEFAULT '[]',
    comments TEXT NOT NULL DEFAULT '[]',
    created_at_us INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reports_created_at
    ON reports(created_at_us DESC, report_id ASC);
";

/// Indexes expected by the visible-range read path.
pub const REQUIRED_INDEXES: &[&str] = &["idx_reports_created_at"];
