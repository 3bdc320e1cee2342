// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Heater configuration.
//!
//! [`HeaterConfig`] deserializes the accessory's JSON configuration block
//! using the key names hosts already store (`pullInterval`, `maxTemp`,
//! `userid`, ...), and can also be assembled in code with the `with_*`
//! builders.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
#[cfg(feature = "http")]
use crate::protocol::HttpConfig;
use crate::protocol::AltTokenPolicy;
use crate::response::lenient_string;
use crate::types::TemperatureRange;

/// Configuration of one heater accessory.
///
/// # Examples
///
/// ```
/// use tesy_heater::HeaterConfig;
///
/// let config = HeaterConfig::from_json(r#"{
///     "name": "Bedroom",
///     "device_id": "D1",
///     "username": "user@example.com",
///     "password": "secret",
///     "pullInterval": 30000
/// }"#).unwrap();
///
/// assert_eq!(config.manufacturer, "Tesy");
/// assert_eq!(config.pull_interval().as_secs(), 30);
/// assert!(config.has_login());
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaterConfig {
    /// Display name of the accessory.
    pub name: String,
    /// Manufacturer shown in accessory information.
    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,
    /// Model shown in accessory information.
    #[serde(default = "default_model")]
    pub model: String,
    /// Vendor device id commands are addressed to.
    ///
    /// When absent, the id of the first reported device is adopted.
    #[serde(default, deserialize_with = "lenient_string")]
    pub device_id: Option<String>,
    /// Poll interval in milliseconds. Zero selects the default.
    #[serde(rename = "pullInterval", default = "default_pull_interval_ms")]
    pub pull_interval_ms: u64,
    /// Upper temperature bound in °C.
    #[serde(rename = "maxTemp", default = "default_max_temp")]
    pub max_temp: f64,
    /// Lower temperature bound in °C.
    #[serde(rename = "minTemp", default = "default_min_temp")]
    pub min_temp: f64,
    /// Numeric account id, required by some accounts.
    #[serde(rename = "userid", default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    /// Account email.
    #[serde(default)]
    pub username: Option<String>,
    /// Account password.
    #[serde(default)]
    pub password: Option<String>,
    /// Vendor cloud base URL.
    #[serde(rename = "baseUrl", default)]
    pub base_url: Option<String>,
    /// Request timeout in milliseconds.
    #[serde(rename = "requestTimeout", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Whether session tokens may be read from response cookies.
    #[serde(rename = "cookieFallback", default = "default_true")]
    pub cookie_fallback: bool,
    /// Whether device requests need the ALT token.
    #[serde(rename = "altToken", default)]
    pub alt_token: AltTokenPolicy,
    /// Language tag sent with every request.
    #[serde(default = "default_lang")]
    pub lang: String,
}

impl HeaterConfig {
    /// Default manufacturer.
    pub const DEFAULT_MANUFACTURER: &'static str = "Tesy";
    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "Convector (Heater)";
    /// Default poll interval.
    pub const DEFAULT_PULL_INTERVAL: Duration = Duration::from_secs(10);
    /// Default request timeout.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration with defaults and no login.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manufacturer: default_manufacturer(),
            model: default_model(),
            device_id: None,
            pull_interval_ms: default_pull_interval_ms(),
            max_temp: default_max_temp(),
            min_temp: default_min_temp(),
            user_id: None,
            username: None,
            password: None,
            base_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            cookie_fallback: true,
            alt_token: AltTokenPolicy::default(),
            lang: default_lang(),
        }
    }

    /// Parses a JSON configuration block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the JSON is malformed or `name` is
    /// missing.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Sets the vendor device id.
    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Sets the account email and password.
    #[must_use]
    pub fn with_login(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the numeric account id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_pull_interval(mut self, interval: Duration) -> Self {
        self.pull_interval_ms = duration_millis(interval);
        self
    }

    /// Sets the temperature bounds in °C.
    #[must_use]
    pub fn with_temperature_range(mut self, min: f64, max: f64) -> Self {
        self.min_temp = min;
        self.max_temp = max;
        self
    }

    /// Overrides the vendor cloud base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = duration_millis(timeout);
        self
    }

    /// Enables or disables reading tokens from response cookies.
    #[must_use]
    pub fn with_cookie_fallback(mut self, enabled: bool) -> Self {
        self.cookie_fallback = enabled;
        self
    }

    /// Sets the ALT token policy.
    #[must_use]
    pub fn with_alt_policy(mut self, policy: AltTokenPolicy) -> Self {
        self.alt_token = policy;
        self
    }

    /// Sets the accessory manufacturer and model.
    #[must_use]
    pub fn with_model(mut self, manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self.model = model.into();
        self
    }

    /// Returns the poll interval, falling back to the default for zero.
    #[must_use]
    pub fn pull_interval(&self) -> Duration {
        match self.pull_interval_ms {
            0 => Self::DEFAULT_PULL_INTERVAL,
            ms => Duration::from_millis(ms),
        }
    }

    /// Returns the request timeout, falling back to the default for zero.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_ms {
            0 => Self::DEFAULT_REQUEST_TIMEOUT,
            ms => Duration::from_millis(ms),
        }
    }

    /// Returns `true` if both username and password are set and non-empty.
    #[must_use]
    pub fn has_login(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.username) && present(&self.password)
    }

    /// Returns the validated temperature range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] if the bounds are not finite or inverted.
    pub fn temperature_range(&self) -> Result<TemperatureRange> {
        Ok(TemperatureRange::new(self.min_temp, self.max_temp)?)
    }

    /// Builds the transport settings for a [`TesyClient`](crate::protocol::TesyClient).
    #[cfg(feature = "http")]
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        let mut http = HttpConfig::new()
            .with_timeout(self.request_timeout())
            .with_lang(&self.lang)
            .with_cookie_fallback(self.cookie_fallback)
            .with_alt_policy(self.alt_token);

        if let Some(base_url) = &self.base_url {
            http = http.with_base_url(base_url);
        }
        if let (Some(username), Some(password)) = (&self.username, &self.password)
            && self.has_login()
        {
            http = http.with_login(username, password);
        }
        if let Some(user_id) = &self.user_id {
            http = http.with_user_id(user_id);
        }
        http
    }
}

impl fmt::Debug for HeaterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaterConfig")
            .field("name", &self.name)
            .field("manufacturer", &self.manufacturer)
            .field("model", &self.model)
            .field("device_id", &self.device_id)
            .field("pull_interval_ms", &self.pull_interval_ms)
            .field("min_temp", &self.min_temp)
            .field("max_temp", &self.max_temp)
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("cookie_fallback", &self.cookie_fallback)
            .field("alt_token", &self.alt_token)
            .field("lang", &self.lang)
            .finish()
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn default_manufacturer() -> String {
    HeaterConfig::DEFAULT_MANUFACTURER.to_string()
}

fn default_model() -> String {
    HeaterConfig::DEFAULT_MODEL.to_string()
}

fn default_pull_interval_ms() -> u64 {
    duration_millis(HeaterConfig::DEFAULT_PULL_INTERVAL)
}

fn default_request_timeout_ms() -> u64 {
    duration_millis(HeaterConfig::DEFAULT_REQUEST_TIMEOUT)
}

fn default_max_temp() -> f64 {
    TemperatureRange::DEFAULT_MAX
}

fn default_min_temp() -> f64 {
    TemperatureRange::DEFAULT_MIN
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_uses_defaults() {
        let config = HeaterConfig::from_json(r#"{"name":"Heater"}"#).unwrap();
        assert_eq!(config, HeaterConfig::new("Heater"));
        assert_eq!(config.model, "Convector (Heater)");
        assert_eq!(config.pull_interval(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.temperature_range().unwrap(), TemperatureRange::default());
        assert!(config.cookie_fallback);
        assert!(!config.has_login());
    }

    #[test]
    fn original_keys_are_read() {
        let config = HeaterConfig::from_json(
            r#"{
                "name": "Office",
                "manufacturer": "ACME",
                "model": "CN 04",
                "device_id": 12345,
                "pullInterval": 5000,
                "maxTemp": 28,
                "minTemp": 12.5,
                "userid": 77,
                "username": "user@example.com",
                "password": "secret",
                "altToken": "required",
                "cookieFallback": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.manufacturer, "ACME");
        assert_eq!(config.device_id.as_deref(), Some("12345"));
        assert_eq!(config.user_id.as_deref(), Some("77"));
        assert_eq!(config.pull_interval(), Duration::from_secs(5));
        let range = config.temperature_range().unwrap();
        assert!((range.min() - 12.5).abs() < f64::EPSILON);
        assert!((range.max() - 28.0).abs() < f64::EPSILON);
        assert_eq!(config.alt_token, AltTokenPolicy::Required);
        assert!(!config.cookie_fallback);
        assert!(config.has_login());
    }

    #[test]
    fn missing_name_is_a_config_error() {
        let err = HeaterConfig::from_json("{}").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = HeaterConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn zero_pull_interval_selects_default() {
        let config = HeaterConfig::from_json(r#"{"name":"H","pullInterval":0}"#).unwrap();
        assert_eq!(config.pull_interval(), HeaterConfig::DEFAULT_PULL_INTERVAL);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let config = HeaterConfig::new("H").with_temperature_range(30.0, 10.0);
        assert!(matches!(config.temperature_range(), Err(Error::Value(_))));
    }

    #[test]
    fn empty_password_is_not_a_login() {
        let config = HeaterConfig::new("H").with_login("user", "");
        assert!(!config.has_login());
    }

    #[test]
    fn debug_redacts_password() {
        let config = HeaterConfig::new("H").with_login("user", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_config_carries_transport_settings() {
        let config = HeaterConfig::new("H")
            .with_login("user@example.com", "secret")
            .with_user_id("42")
            .with_base_url("http://127.0.0.1:9000/")
            .with_request_timeout(Duration::from_millis(1500))
            .with_alt_policy(AltTokenPolicy::Required);

        let http = config.http_config();
        assert_eq!(http.base_url(), "http://127.0.0.1:9000");
        assert_eq!(http.timeout(), Duration::from_millis(1500));
        assert_eq!(http.alt_policy(), AltTokenPolicy::Required);
        let login = http.login().unwrap();
        assert_eq!(login.username(), "user@example.com");
        assert_eq!(login.user_id(), Some("42"));
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_config_without_login() {
        let http = HeaterConfig::new("H").http_config();
        assert!(http.login().is_none());
        assert_eq!(http.base_url(), HttpConfig::DEFAULT_BASE_URL);
    }
}
