//! Typed services over the request pipeline.
//!
//! These only shape requests and responses. Authentication, renewal and
//! retries all happen in [`RequestPipeline`](crate::RequestPipeline).

mod accounts;
mod weather;

pub use accounts::AccountsApi;
pub use weather::WeatherApi;
