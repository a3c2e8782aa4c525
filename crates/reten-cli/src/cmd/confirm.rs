//! `reten confirm` — add this device's confirmation to a report.

use super::AppContext;
use crate::output::{ReportRow, render, write_report};
use chrono::Utc;
use clap::Args;
use reten_core::ReportId;
use serde::Serialize;
use std::io::Write as _;

#[derive(Args, Debug)]
pub struct ConfirmArgs {
    /// Report id, e.g. rt-0123456789ab.
    pub id: String,
}

#[derive(Serialize)]
struct ConfirmOutput {
    already_confirmed: bool,
    report: ReportRow,
}

pub fn run(args: &ConfirmArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let id = ReportId::new(&args.id);
    let outcome = ctx
        .lifecycle
        .confirm(&id, &ctx.device_token, Utc::now())?;

    let output = ConfirmOutput {
        already_confirmed: outcome.is_noop(),
        report: ReportRow::new(outcome.report(), &ctx.device_token),
    };
    render(ctx.mode, &output, |output, w| {
        if output.already_confirmed {
            writeln!(w, "You already confirmed this report. Nothing changed.")?;
        } else {
            writeln!(w, "Confirmation recorded.")?;
        }
        write_report(&output.report, w)
    })
}
