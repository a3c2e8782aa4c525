//! `reten watch` — live view of the active reports.
//!
//! Keeps a [`ClientView`] connected to the store's change feed and reprints
//! the list whenever the visible set actually changes, including when a
//! report quietly ages past the 2-hour window.

use super::AppContext;
use crate::output::{ReportRow, rfc3339, render, write_report_list};
use chrono::{Duration, Utc};
use clap::Args;
use reten_core::{ClientView, LifecycleError, Report};
use serde::Serialize;
use std::io::Write as _;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between unconditional re-queries. Defaults to the config
    /// value (60 when unset).
    #[arg(long)]
    pub interval: Option<u64>,

    /// Print the current view once and exit instead of watching.
    #[arg(long)]
    pub once: bool,
}

#[derive(Serialize)]
struct Snapshot {
    at: String,
    reports: Vec<ReportRow>,
}

/// What makes two renderings of the view distinguishable to the reader.
fn fingerprint(reports: &[Report]) -> Vec<(String, u32, usize)> {
    reports
        .iter()
        .map(|report| {
            (
                report.id.to_string(),
                report.confirmations,
                report.comments.len(),
            )
        })
        .collect()
}

fn print_snapshot(ctx: &AppContext, reports: &[Report]) -> anyhow::Result<()> {
    let snapshot = Snapshot {
        at: rfc3339(Utc::now()),
        reports: reports
            .iter()
            .map(|report| ReportRow::new(report, &ctx.device_token))
            .collect(),
    };
    render(ctx.mode, &snapshot, |snapshot, w| {
        writeln!(w, "-- {} --", snapshot.at)?;
        write_report_list(&snapshot.reports, w)
    })
}

fn refresh(view: &mut ClientView) -> Result<Vec<Report>, LifecycleError> {
    view.visible(Utc::now())
        .map(<[Report]>::to_vec)
        .map_err(LifecycleError::Persistence)
}

pub fn run(args: &WatchArgs, ctx: &AppContext, refilter_seconds: u64) -> anyhow::Result<()> {
    let seconds = args.interval.unwrap_or(refilter_seconds);
    let interval = Duration::seconds(i64::try_from(seconds.max(1))?);
    let mut view = ClientView::with_refilter_interval(ctx.lifecycle.store(), interval);

    let reports = refresh(&mut view)?;
    let mut last = fingerprint(&reports);
    print_snapshot(ctx, &reports)?;

    if args.once {
        return Ok(());
    }

    tracing::info!(interval_seconds = seconds, "watching for changes");
    loop {
        std::thread::sleep(std::time::Duration::from_secs(1));

        let reports = refresh(&mut view)?;
        let current = fingerprint(&reports);
        if current != last {
            print_snapshot(ctx, &reports)?;
            last = current;
        }
    }
}
