//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, ctx: &AppContext) -> Result<()> {
    let session = ctx.session()?;

    if !session.is_authenticated() {
        output::warning("Not logged in");
    }

    // Never fails; local credentials are removed either way.
    session.logout().await;

    output::success("Logged out");
    Ok(())
}
