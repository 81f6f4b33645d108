//! Building API and weather API clients.
//!
//! The gateway logs in once with the configured credentials, keeps the access
//! token, and on every poll asks the room data endpoint for the reading of the
//! current second. There is no retry and no token refresh: a failed call is
//! logged by the caller and that cycle is skipped.

extern crate alloc;

use alloc::{
    format,
    string::{String, ToString},
};

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{
    config::{GatewayConfig, WeatherConfig},
    connection::http::{HttpRequest, HttpTransport},
    schedule::WallClock,
    sources::{json::extract_reading, SourceError, ValueSource},
};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "accessToken", alias = "token")]
    access_token: String,
}

/// What the gateway remembers between polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayState {
    pub access_token: Option<String>,
}

/// `YYYY-MM-DD HH:MM:SS` at `offset_secs` from UTC.
pub fn format_query_time(
    epoch_secs: i64,
    offset_secs: i32,
) -> Option<String> {
    let offset = FixedOffset::east_opt(offset_secs)?;
    let utc = DateTime::<Utc>::from_timestamp(epoch_secs, 0)?;
    Some(
        utc.with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    )
}

/// Client for the building sensor API.
pub struct Gateway<T, C> {
    transport: T,
    clock: C,
    config: GatewayConfig,
    state: GatewayState,
}

impl<T, C> Gateway<T, C>
where
    T: HttpTransport,
    C: WallClock,
{
    pub fn new(
        transport: T,
        clock: C,
        config: GatewayConfig,
    ) -> Self {
        Self {
            transport,
            clock,
            config,
            state: GatewayState::default(),
        }
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.access_token.is_some()
    }

    /// Post the credentials and keep the returned access token.
    pub async fn login(&mut self) -> Result<(), SourceError> {
        if !self.transport.is_connected() {
            tracing::warn!("Wi-Fi not connected, skipping login");
            return Err(SourceError::NotConnected);
        }

        let body = serde_json::to_string(&LoginRequest {
            username: &self.config.username,
            password: &self.config.password,
        })
        .map_err(|_| SourceError::InvalidJson)?;

        let response = self
            .transport
            .send(&HttpRequest::post_json(&self.config.login_url, &body))
            .await?;
        tracing::info!(status = response.status, "login response");
        if !response.is_success() {
            return Err(SourceError::Http(response.status));
        }

        let login: LoginResponse =
            serde_json::from_str(&response.body).map_err(|_| SourceError::MissingToken)?;
        if login.access_token.is_empty() {
            return Err(SourceError::MissingToken);
        }
        self.state.access_token = Some(login.access_token);
        tracing::info!("access token stored");
        Ok(())
    }

    /// Room data URL covering the single second `epoch_secs`.
    pub fn sensor_data_url(
        &self,
        epoch_secs: i64,
    ) -> Option<String> {
        let time = format_query_time(epoch_secs, self.config.utc_offset_secs)?;
        let time = time.replace(' ', "%20");
        Some(format!(
            "{}{}/data?startTime={}&endTime={}",
            self.config.data_endpoint, self.config.room_id, time, time
        ))
    }

    /// Fetch the room reading for the current second.
    pub async fn fetch_reading(&mut self) -> Result<f32, SourceError> {
        if !self.transport.is_connected() {
            return Err(SourceError::NotConnected);
        }
        let token = self
            .state
            .access_token
            .as_deref()
            .ok_or(SourceError::NotAuthenticated)?;
        let url = self
            .clock
            .epoch_secs()
            .and_then(|now| self.sensor_data_url(now))
            .ok_or(SourceError::ClockNotSet)?;
        tracing::info!(%url, "fetching room data");

        let response = self
            .transport
            .send(&HttpRequest::get(&url).with_bearer(token))
            .await?;
        tracing::info!(status = response.status, body = %response.body, "room data response");
        if !response.is_success() {
            return Err(SourceError::Http(response.status));
        }
        extract_reading(&response.body, &self.config.reading_pointer)
    }
}

impl<T, C> ValueSource for Gateway<T, C>
where
    T: HttpTransport,
    C: WallClock,
{
    async fn sample(&mut self) -> Result<f32, SourceError> {
        self.fetch_reading().await
    }
}

/// Client for an open weather API; no authentication.
pub struct WeatherClient<T> {
    transport: T,
    config: WeatherConfig,
}

impl<T: HttpTransport> WeatherClient<T> {
    pub fn new(
        transport: T,
        config: WeatherConfig,
    ) -> Self {
        Self { transport, config }
    }

    pub async fn fetch(&mut self) -> Result<f32, SourceError> {
        if !self.transport.is_connected() {
            return Err(SourceError::NotConnected);
        }
        let response = self
            .transport
            .send(&HttpRequest::get(&self.config.url))
            .await?;
        tracing::info!(status = response.status, "weather response");
        if !response.is_success() {
            return Err(SourceError::Http(response.status));
        }
        extract_reading(&response.body, &self.config.pointer)
    }
}

impl<T: HttpTransport> ValueSource for WeatherClient<T> {
    async fn sample(&mut self) -> Result<f32, SourceError> {
        self.fetch().await
    }
}
