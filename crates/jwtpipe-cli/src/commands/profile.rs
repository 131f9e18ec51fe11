//! Profile command implementation.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use jwtpipe::endpoints::{ProfileUpdate, User};

use crate::commands::failure;
use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Print the raw JSON response
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<ProfileCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Change profile fields
    Update {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },

    /// Show the account dashboard
    Dashboard,
}

pub async fn run(args: ProfileArgs, ctx: &AppContext) -> Result<()> {
    let session = ctx.logged_in()?;
    let accounts = session.accounts();

    match args.command {
        None => {
            let user = accounts
                .profile()
                .await
                .map_err(|e| failure(e, "Failed to fetch profile"))?;
            if args.json {
                output::json_pretty(&user)?;
            } else {
                print_user(&user);
            }
        }
        Some(ProfileCommand::Update {
            email,
            first_name,
            last_name,
        }) => {
            let update = ProfileUpdate {
                email,
                first_name,
                last_name,
            };
            if update.email.is_none() && update.first_name.is_none() && update.last_name.is_none()
            {
                bail!("Nothing to update. Pass --email, --first-name or --last-name.");
            }

            let response = accounts
                .update_profile(&update)
                .await
                .map_err(|e| failure(e, "Failed to update profile"))?;
            output::success(&response.message);
            println!();
            print_user(&response.user);
        }
        Some(ProfileCommand::Dashboard) => {
            let dashboard = accounts
                .dashboard()
                .await
                .map_err(|e| failure(e, "Failed to fetch dashboard"))?;
            println!("{}", dashboard.message);
            println!();
            let data = &dashboard.dashboard_data;
            output::field("Account status", &data.account_status);
            output::field("Total logins", &data.total_logins.to_string());
            if let Some(last_login) = data.last_login {
                output::field("Last login", &last_login.format("%Y-%m-%d %H:%M UTC").to_string());
            }
        }
    }

    Ok(())
}

pub(crate) fn print_user(user: &User) {
    output::field("ID", &user.id.to_string());
    output::field("Username", &user.username);
    if !user.email.is_empty() {
        output::field("Email", &user.email);
    }
    let name = format!("{} {}", user.first_name, user.last_name);
    if !name.trim().is_empty() {
        output::field("Name", name.trim());
    }
    if let Some(joined) = user.date_joined {
        output::field("Joined", &joined.format("%Y-%m-%d").to_string());
    }
}
