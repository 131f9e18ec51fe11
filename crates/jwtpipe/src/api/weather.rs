use tracing::instrument;
use url::form_urlencoded;

use jwtpipe_core::Result;

use crate::endpoints::{WEATHER, WEATHER_HISTORY, Weather, WeatherSearch};
use crate::pipeline::RequestPipeline;

/// Weather lookups, recorded server-side per user.
#[derive(Debug, Clone, Copy)]
pub struct WeatherApi<'a> {
    pipeline: &'a RequestPipeline,
}

impl<'a> WeatherApi<'a> {
    pub fn new(pipeline: &'a RequestPipeline) -> Self {
        Self { pipeline }
    }

    /// Current weather for `city`.
    #[instrument(skip(self))]
    pub async fn current(&self, city: &str) -> Result<Weather> {
        self.pipeline.get(&current_path(city)).await
    }

    /// Past searches of the logged-in user, newest first.
    #[instrument(skip(self))]
    pub async fn history(&self) -> Result<Vec<WeatherSearch>> {
        self.pipeline.get(WEATHER_HISTORY).await
    }
}

fn current_path(city: &str) -> String {
    let city: String = form_urlencoded::byte_serialize(city.as_bytes()).collect();
    format!("{}?city={}", WEATHER, city)
}
