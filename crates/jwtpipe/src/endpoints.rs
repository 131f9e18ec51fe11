//! Endpoint paths and request/response types.
//!
//! Paths are relative to the configured [`ApiUrl`](jwtpipe_core::ApiUrl).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Exchange username and password for a token pair.
pub const LOGIN: &str = "/auth/login/";

/// Exchange a refresh token for a new access token.
pub const TOKEN_REFRESH: &str = "/auth/token/refresh/";

/// Best-effort server-side logout.
pub const LOGOUT: &str = "/auth/logout/";

/// Create an account.
pub const REGISTER: &str = "/auth/register/";

/// Current user's profile.
pub const PROFILE: &str = "/auth/profile/";

/// Partial profile update.
pub const PROFILE_UPDATE: &str = "/auth/profile/update/";

/// Greeting for authenticated users.
pub const PROTECTED: &str = "/auth/protected/";

/// Per-user dashboard.
pub const DASHBOARD: &str = "/auth/dashboard/";

/// Current weather for a city (`?city=`).
pub const WEATHER: &str = "/weather/";

/// Recent weather searches of the current user.
pub const WEATHER_HISTORY: &str = "/weather/history/";

// ============================================================================
// Session Types
// ============================================================================

/// Request body for login.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response from login. Extra fields sent by the server are ignored.
#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub access: String,
    pub refresh: String,
}

/// Request body for token refresh.
#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response from token refresh.
///
/// `refresh` is present when the server rotates refresh tokens.
#[derive(Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

// ============================================================================
// Account Types
// ============================================================================

/// A user account as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
}

/// Request body for registration.
#[derive(Clone, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    pub password: String,
    pub password_confirm: String,
}

impl NewAccount {
    /// A new account whose password confirmation matches the password.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            username: username.into(),
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            password_confirm: password.clone(),
            password,
        }
    }
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Response from registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

/// Partial profile update; unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Response from a profile update.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: User,
}

/// Response from the protected greeting endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtectedResponse {
    pub message: String,
    pub user_id: u64,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Response from the dashboard endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Dashboard {
    pub message: String,
    pub user: User,
    pub dashboard_data: DashboardData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub total_logins: u64,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub account_status: String,
}

// ============================================================================
// Weather Types
// ============================================================================

/// Current weather for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub temperature: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub humidity: i64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub pressure: f64,
}

/// A past weather search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSearch {
    pub id: u64,
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub temperature: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub humidity: i64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub pressure: f64,
    pub searched_at: DateTime<Utc>,
}
