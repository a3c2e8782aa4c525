//! `reten comment` — append a comment to a report's thread.

use super::AppContext;
use crate::output::{ReportRow, render, write_report};
use chrono::Utc;
use clap::Args;
use reten_core::ReportId;
use std::io::Write as _;

#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Report id, e.g. rt-0123456789ab.
    pub id: String,

    /// Comment text (max 120 characters).
    pub text: String,
}

pub fn run(args: &CommentArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let id = ReportId::new(&args.id);
    let report = ctx
        .lifecycle
        .add_comment(&id, &args.text, &ctx.device_token, Utc::now())?;

    let row = ReportRow::new(&report, &ctx.device_token);
    render(ctx.mode, &row, |row, w| {
        writeln!(w, "Comment added.")?;
        write_report(row, w)
    })
}
