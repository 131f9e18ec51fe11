//! Login command implementation.

use anyhow::Result;
use clap::Args;

use jwtpipe::Credentials;

use crate::commands::failure;
use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username
    #[arg(short, long)]
    pub username: String,

    /// Account password
    #[arg(short, long, env = "JWTPIPE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, ctx: &AppContext) -> Result<()> {
    let session = ctx.session()?;
    let credentials = Credentials::new(&args.username, &args.password);

    output::progress("Logging in...");

    session
        .login(&credentials)
        .await
        .map_err(|e| failure(e, "Failed to login"))?;

    output::success("Logged in successfully");
    println!();
    output::field("Username", credentials.username());
    output::field("API", ctx.api_url.as_str());

    Ok(())
}
