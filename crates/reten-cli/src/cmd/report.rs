//! `reten report` — publish a new checkpoint report.

use super::AppContext;
use crate::output::{ReportRow, render, write_report};
use chrono::Utc;
use clap::Args;
use reten_core::{Category, ErrorCode, LifecycleError, SubmitRequest};
use std::io::Write as _;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Latitude of the checkpoint.
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude of the checkpoint.
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,

    /// Category: vehicular-control, sobriety-check, document-check, fines,
    /// or unspecified.
    #[arg(long, default_value = "unspecified")]
    pub category: String,

    /// Optional description (max 200 characters).
    #[arg(long)]
    pub description: Option<String>,
}

pub fn run(args: &ReportArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let category: Category =
        args.category
            .parse()
            .map_err(|err: reten_core::model::report::UnknownCategory| {
                LifecycleError::Validation {
                    code: ErrorCode::UnknownCategory,
                    reason: err.to_string(),
                }
            })?;

    let report = ctx.lifecycle.submit(
        SubmitRequest {
            lat: args.lat,
            lng: args.lng,
            category,
            description: args.description.clone(),
            author_token: ctx.device_token.clone(),
        },
        Utc::now(),
    )?;

    let row = ReportRow::new(&report, &ctx.device_token);
    render(ctx.mode, &row, |row, w| {
        writeln!(w, "Report published. It disappears automatically in 2 hours.")?;
        write_report(row, w)
    })
}
