//! Status command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::commands::failure;
use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also ask the server whether the stored token is accepted
    #[arg(long)]
    pub check: bool,
}

pub async fn run(args: StatusArgs, ctx: &AppContext) -> Result<()> {
    let session = ctx.session()?;

    output::field("API", ctx.api_url.as_str());
    output::field("Store", &ctx.store_path.display().to_string());

    if !session.is_authenticated() {
        output::field("Session", &"not logged in".yellow().to_string());
        return Ok(());
    }
    output::field("Session", &"logged in".green().to_string());

    if args.check {
        let protected = session
            .accounts()
            .protected()
            .await
            .map_err(|e| failure(e, "Token check failed"))?;
        output::field("User", &format!("{} ({})", protected.user_email, protected.user_id));
        output::success(&protected.message);
    }

    Ok(())
}
