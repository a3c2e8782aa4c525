//! `reten token` — show or rotate the device identity token.

use crate::identity;
use crate::output::{OutputMode, render};
use clap::Args;
use serde::Serialize;
use std::io::Write as _;
use std::path::Path;

#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Discard the current token and generate a new one. Past votes made
    /// with the old token stay counted.
    #[arg(long)]
    pub rotate: bool,
}

#[derive(Serialize)]
struct TokenOutput {
    token: String,
    rotated: bool,
}

pub fn run(args: &TokenArgs, path: &Path, mode: OutputMode) -> anyhow::Result<()> {
    let token = if args.rotate {
        identity::rotate(path)?
    } else {
        identity::load_or_create(path)?
    };

    let output = TokenOutput {
        token,
        rotated: args.rotate,
    };
    render(mode, &output, |output, w| {
        if output.rotated {
            writeln!(w, "New device token: {}", output.token)
        } else {
            writeln!(w, "Device token: {}", output.token)
        }
    })
}
