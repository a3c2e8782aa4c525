//! `reten list` — print all currently visible reports.

use super::AppContext;
use crate::output::{ReportRow, render, write_report_list};
use chrono::Utc;
use clap::Args;
use reten_core::{Category, ErrorCode, LifecycleError};
use std::str::FromStr as _;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show reports of this category.
    #[arg(long)]
    pub category: Option<String>,
}

pub fn run(args: &ListArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let filter = args
        .category
        .as_deref()
        .map(Category::from_str)
        .transpose()
        .map_err(|err| LifecycleError::Validation {
            code: ErrorCode::UnknownCategory,
            reason: err.to_string(),
        })?;

    let mut reports = ctx.lifecycle.visible_reports(Utc::now())?;
    if let Some(category) = filter {
        reports.retain(|report| report.category == category);
    }

    let rows: Vec<ReportRow> = reports
        .iter()
        .map(|report| ReportRow::new(report, &ctx.device_token))
        .collect();
    render(ctx.mode, &rows, |rows, w| write_report_list(rows, w))
}
