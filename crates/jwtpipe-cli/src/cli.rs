//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{
    login::LoginArgs, logout::LogoutArgs, profile::ProfileArgs, refresh::RefreshArgs,
    register::RegisterArgs, request::RequestArgs, status::StatusArgs, weather::WeatherArgs,
};

/// Talk to a JWT-protected API with automatic token renewal.
#[derive(Parser, Debug)]
#[command(name = "jwtpipe")]
#[command(author, version = env!("JWTPIPE_VERSION"), about, long_about = None)]
pub struct Cli {
    /// API base URL
    #[arg(
        long,
        env = "JWTPIPE_API_URL",
        default_value = "http://localhost:8000/api",
        global = true
    )]
    pub api_url: String,

    /// Credentials file (defaults to the user data directory)
    #[arg(long, env = "JWTPIPE_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, env = "JWTPIPE_TIMEOUT", default_value_t = 30, global = true)]
    pub timeout: u64,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the token pair
    Login(LoginArgs),

    /// Log out and forget stored credentials
    Logout(LogoutArgs),

    /// Create a new account
    Register(RegisterArgs),

    /// Show whether credentials are stored
    Status(StatusArgs),

    /// Renew the access token now
    Refresh(RefreshArgs),

    /// Send an arbitrary authenticated request
    Request(RequestArgs),

    /// Show or update the account profile
    Profile(ProfileArgs),

    /// Weather lookups
    Weather(WeatherArgs),
}
