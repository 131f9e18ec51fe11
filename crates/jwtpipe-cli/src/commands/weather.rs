//! Weather command implementation.

use anyhow::Result;
use clap::{Args, Subcommand};

use jwtpipe::endpoints::Weather;

use crate::commands::failure;
use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct WeatherArgs {
    /// Print the raw JSON response
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: WeatherCommand,
}

#[derive(Subcommand, Debug)]
pub enum WeatherCommand {
    /// Current weather for a city
    Current {
        /// City name (e.g. London)
        city: String,
    },

    /// Your past searches
    History {
        /// Show at most this many entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

pub async fn run(args: WeatherArgs, ctx: &AppContext) -> Result<()> {
    let session = ctx.logged_in()?;
    let weather = session.weather();

    match args.command {
        WeatherCommand::Current { city } => {
            let current = weather
                .current(&city)
                .await
                .map_err(|e| failure(e, "Failed to fetch weather"))?;
            if args.json {
                output::json_pretty(&current)?;
            } else {
                print_weather(&current);
            }
        }
        WeatherCommand::History { limit } => {
            let mut history = weather
                .history()
                .await
                .map_err(|e| failure(e, "Failed to fetch history"))?;
            if let Some(limit) = limit {
                history.truncate(limit);
            }

            if args.json {
                output::json_pretty(&history)?;
            } else if history.is_empty() {
                output::progress("No searches yet");
            } else {
                for search in &history {
                    println!(
                        "{}  {:<20} {:>6.1} °C  {}",
                        search.searched_at.format("%Y-%m-%d %H:%M"),
                        search.city,
                        search.temperature,
                        search.description
                    );
                }
            }
        }
    }

    Ok(())
}

fn print_weather(weather: &Weather) {
    let place = if weather.country.is_empty() {
        weather.city.clone()
    } else {
        format!("{}, {}", weather.city, weather.country)
    };
    output::field("City", &place);
    output::field("Temperature", &format!("{:.1} °C", weather.temperature));
    if !weather.description.is_empty() {
        output::field("Conditions", &weather.description);
    }
    output::field("Humidity", &format!("{}%", weather.humidity));
    output::field("Wind", &format!("{} m/s", weather.wind_speed));
    output::field("Pressure", &format!("{} hPa", weather.pressure));
}
