//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: readable text for humans, stable JSON for scripts.

use chrono::{DateTime, Utc};
use reten_core::{ErrorCode, LifecycleError, Report};
use serde::Serialize;
use std::io::{self, Write};

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per result, or a JSON array).
    Json,
}

impl OutputMode {
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a serializable value: JSON to stdout in JSON mode, otherwise the
/// provided human formatter.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
    } else {
        human(value, &mut out)?;
    }

    Ok(())
}

/// Structured failure shown to the user. Mirrors the core's error codes so
/// scripts can branch without parsing prose.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliError {
    pub fn from_lifecycle(err: &LifecycleError) -> Self {
        let code: ErrorCode = err.code();
        Self {
            code: code.code().to_string(),
            message: code.message().to_string(),
            detail: err.to_string(),
            hint: code.hint().map(str::to_string),
        }
    }
}

/// Render a structured error to stderr (text) or stdout (JSON).
pub fn render_error(mode: OutputMode, err: &CliError) -> anyhow::Result<()> {
    if mode.is_json() {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, err)?;
        writeln!(out)?;
    } else {
        eprintln!("error[{}]: {}", err.code, err.detail);
        if let Some(hint) = &err.hint {
            eprintln!("hint: {hint}");
        }
    }

    Ok(())
}

/// One comment in CLI output.
#[derive(Debug, Clone, Serialize)]
pub struct CommentRow {
    pub author: String,
    pub text: String,
    pub at: String,
}

/// One report in CLI output. The author token never appears here, in any
/// form beyond comment attribution prefixes.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
    pub expires_at: String,
    pub confirmations: u32,
    pub heat: String,
    pub confirmed_by_me: bool,
    pub comments: Vec<CommentRow>,
}

impl ReportRow {
    pub fn new(report: &Report, device_token: &str) -> Self {
        Self {
            id: report.id.to_string(),
            lat: report.location.lat,
            lng: report.location.lng,
            category: report.category.to_string(),
            description: report.description.clone(),
            created_at: report.created_at.to_rfc3339(),
            expires_at: report.expires_at().to_rfc3339(),
            confirmations: report.confirmations,
            heat: report.heat().to_string(),
            confirmed_by_me: report.has_voted(device_token),
            comments: report
                .comments
                .iter()
                .map(|comment| CommentRow {
                    author: comment.author_prefix.clone(),
                    text: comment.text.clone(),
                    at: comment.created_at.to_rfc3339(),
                })
                .collect(),
        }
    }
}

/// Human rendering for a single report, including the last few comments.
pub fn write_report(row: &ReportRow, w: &mut dyn Write) -> io::Result<()> {
    let marker = if row.heat == "corroborated" { "!" } else { " " };
    let voted = if row.confirmed_by_me { " [confirmed by you]" } else { "" };

    writeln!(
        w,
        "{marker} {}  {}  ({:.4}, {:.4})  {} confirmation(s){voted}",
        row.id, row.category, row.lat, row.lng, row.confirmations
    )?;
    if let Some(description) = &row.description {
        writeln!(w, "    {description}")?;
    }
    writeln!(w, "    reported {}  expires {}", row.created_at, row.expires_at)?;

    let tail_start = row.comments.len().saturating_sub(3);
    for comment in &row.comments[tail_start..] {
        writeln!(w, "    #{} {}", comment.author, comment.text)?;
    }

    Ok(())
}

/// Human rendering for a list of reports with the active-count header.
pub fn write_report_list(rows: &[ReportRow], w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{} active report(s)", rows.len())?;
    for row in rows {
        write_report(row, w)?;
    }
    Ok(())
}

/// Timestamp helper shared by the watch header.
pub fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}
