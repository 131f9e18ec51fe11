//! Refresh command implementation.

use anyhow::{Result, bail};
use clap::Args;

use jwtpipe::RenewalOutcome;

use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(_args: RefreshArgs, ctx: &AppContext) -> Result<()> {
    let session = ctx.logged_in()?;

    output::progress("Renewing access token...");

    match session.pipeline().renewal().renew().await {
        RenewalOutcome::Renewed(_) => {
            output::success("Access token renewed");
            Ok(())
        }
        RenewalOutcome::Failed => {
            bail!("Renewal failed and credentials were cleared. Run 'jwtpipe login' again.")
        }
    }
}
