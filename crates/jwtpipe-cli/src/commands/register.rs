//! Register command implementation.

use anyhow::Result;
use clap::Args;

use jwtpipe::endpoints::NewAccount;

use crate::commands::{failure, profile};
use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Username for the new account
    #[arg(short, long)]
    pub username: String,

    /// Email address
    #[arg(short, long)]
    pub email: String,

    /// Password for the new account
    #[arg(short, long, env = "JWTPIPE_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long, default_value = "")]
    pub first_name: String,

    #[arg(long, default_value = "")]
    pub last_name: String,
}

pub async fn run(args: RegisterArgs, ctx: &AppContext) -> Result<()> {
    let session = ctx.session()?;

    let mut account = NewAccount::new(args.username, args.email, args.password);
    account.first_name = args.first_name;
    account.last_name = args.last_name;

    let created = session
        .register(&account)
        .await
        .map_err(|e| failure(e, "Failed to register"))?;

    output::success(&created.message);
    println!();
    profile::print_user(&created.user);
    println!();
    output::progress("Run 'jwtpipe login' to start a session.");

    Ok(())
}
