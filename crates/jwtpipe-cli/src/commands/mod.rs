//! Subcommand implementations.

pub mod login;
pub mod logout;
pub mod profile;
pub mod refresh;
pub mod register;
pub mod request;
pub mod status;
pub mod weather;

use anyhow::{Result, anyhow};

use jwtpipe::Error;

use crate::cli::Commands;
use crate::context::AppContext;

pub async fn handle(command: Commands, ctx: &AppContext) -> Result<()> {
    match command {
        Commands::Login(args) => login::run(args, ctx).await,
        Commands::Logout(args) => logout::run(args, ctx).await,
        Commands::Register(args) => register::run(args, ctx).await,
        Commands::Status(args) => status::run(args, ctx).await,
        Commands::Refresh(args) => refresh::run(args, ctx).await,
        Commands::Request(args) => request::run(args, ctx).await,
        Commands::Profile(args) => profile::run(args, ctx).await,
        Commands::Weather(args) => weather::run(args, ctx).await,
    }
}

/// Turn a library error into a user-facing one.
///
/// An expired session gets a hint instead of the raw cause.
pub(crate) fn failure(err: Error, action: &str) -> anyhow::Error {
    if err.is_session_expired() {
        anyhow!("{}: session expired. Run 'jwtpipe login' again.", action)
    } else {
        anyhow::Error::new(err).context(action.to_string())
    }
}
