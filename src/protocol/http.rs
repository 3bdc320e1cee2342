// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the Tesy cloud.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Url};
use serde::Serialize;

use super::request::{LoginRequest, SessionRequest, SetStatusRequest};
use super::{AltTokenPolicy, Credentials, VendorApi};
use crate::command::DeviceCommand;
use crate::error::{Error, ParseError, ProtocolError, Result};
use crate::response::{DeviceReport, DevicesResponse, LoginResponse};

const LOGIN_PATH: &str = "/rest/old-app-login";
const DEVICES_PATH: &str = "/rest/old-app-devices";
const SET_STATUS_PATH: &str = "/rest/old-app-set-device-status";

const SESSION_COOKIE: &str = "PHPSESSID";
const ALT_COOKIE: &str = "ALT";

// ============================================================================
// Login - account credentials
// ============================================================================

/// Account credentials used to log in to the vendor cloud.
#[derive(Clone, PartialEq, Eq)]
pub struct Login {
    username: String,
    password: String,
    user_id: Option<String>,
}

impl Login {
    /// Creates login credentials from an account email and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            user_id: None,
        }
    }

    /// Sets the numeric account id some vendor endpoints expect.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into()).filter(|id| !id.is_empty());
        self
    }

    /// Returns the account email.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the account password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the account id, if configured.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

// ============================================================================
// HttpConfig - connection settings
// ============================================================================

/// Connection settings for a [`TesyClient`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tesy_heater::protocol::{AltTokenPolicy, HttpConfig};
///
/// let config = HttpConfig::new()
///     .with_login("user@example.com", "secret")
///     .with_timeout(Duration::from_secs(5))
///     .with_alt_policy(AltTokenPolicy::Required);
///
/// assert_eq!(config.base_url(), "https://ad.mytesy.com");
/// assert!(config.login().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    base_url: String,
    timeout: Duration,
    login: Option<Login>,
    lang: String,
    cookie_fallback: bool,
    alt_policy: AltTokenPolicy,
}

impl HttpConfig {
    /// Production endpoint of the vendor cloud.
    pub const DEFAULT_BASE_URL: &'static str = "https://ad.mytesy.com";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default language tag sent with every request.
    pub const DEFAULT_LANG: &'static str = "en";

    /// Creates a configuration pointing at the production cloud.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            login: None,
            lang: Self::DEFAULT_LANG.to_string(),
            cookie_fallback: true,
            alt_policy: AltTokenPolicy::default(),
        }
    }

    /// Overrides the base URL, e.g. to point at a test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the account email and password.
    #[must_use]
    pub fn with_login(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let user_id = self.login.take().and_then(|login| login.user_id);
        let mut login = Login::new(username, password);
        login.user_id = user_id;
        self.login = Some(login);
        self
    }

    /// Sets the account id. Has no effect without a login.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.login = self.login.map(|login| login.with_user_id(user_id));
        self
    }

    /// Sets the language tag.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
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
        self.alt_policy = policy;
        self
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the login credentials, if configured.
    #[must_use]
    pub fn login(&self) -> Option<&Login> {
        self.login.as_ref()
    }

    /// Returns the language tag.
    #[must_use]
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Returns whether tokens may be read from cookies.
    #[must_use]
    pub fn cookie_fallback(&self) -> bool {
        self.cookie_fallback
    }

    /// Returns the ALT token policy.
    #[must_use]
    pub fn alt_policy(&self) -> AltTokenPolicy {
        self.alt_policy
    }

    /// Creates a [`TesyClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot be
    /// created.
    pub fn into_client(self) -> std::result::Result<TesyClient, ProtocolError> {
        let endpoints = Endpoints::new(&self.base_url)?;

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .timeout(self.timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(TesyClient {
            http,
            jar,
            endpoints,
            config: self,
            credentials: Credentials::default(),
        })
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Absolute URLs of the vendor endpoints.
#[derive(Debug)]
struct Endpoints {
    login: Url,
    devices: Url,
    set_status: Url,
}

impl Endpoints {
    fn new(base_url: &str) -> std::result::Result<Self, ProtocolError> {
        let parse = |path: &str| {
            let url = format!("{base_url}{path}");
            Url::parse(&url).map_err(|e| ProtocolError::InvalidAddress(format!("{url}: {e}")))
        };
        Ok(Self {
            login: parse(LOGIN_PATH)?,
            devices: parse(DEVICES_PATH)?,
            set_status: parse(SET_STATUS_PATH)?,
        })
    }
}

// ============================================================================
// TesyClient - session-authenticated vendor client
// ============================================================================

/// Client for the Tesy cloud "old-app" REST endpoints.
///
/// Holds the session [`Credentials`] and a private cookie jar. Credentials
/// are acquired lazily before the first device request and cleared when the
/// vendor answers 401 or 403, so the next request logs in again.
///
/// # Examples
///
/// ```no_run
/// use tesy_heater::protocol::{HttpConfig, VendorApi};
///
/// # async fn example() -> tesy_heater::Result<()> {
/// let mut client = HttpConfig::new()
///     .with_login("user@example.com", "secret")
///     .into_client()?;
/// let report = client.fetch_device_status().await?;
/// println!("{}: {:?}", report.device_id, report.status.current_temperature());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TesyClient {
    http: Client,
    jar: Arc<Jar>,
    endpoints: Endpoints,
    config: HttpConfig,
    credentials: Credentials,
}

impl TesyClient {
    /// Creates a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot be
    /// created.
    pub fn new(config: HttpConfig) -> std::result::Result<Self, ProtocolError> {
        config.into_client()
    }

    /// Returns the configuration this client was built from.
    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn login(&self) -> Result<&Login> {
        self.config
            .login
            .as_ref()
            .ok_or_else(|| Error::Auth("username and password are not configured".to_string()))
    }

    /// Posts a JSON body and returns the response text.
    async fn post<B: Serialize + Sync>(&self, url: &Url, body: &B) -> Result<String> {
        tracing::debug!(url = %url, "Sending vendor request");

        let response = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ProtocolError::AuthenticationFailed { body: text }.into());
        }

        if !(status.is_success() || status.is_redirection()) {
            return Err(ProtocolError::Status {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        tracing::trace!(body = %text, "Received vendor response");

        Ok(text)
    }

    fn transport_error(&self, err: reqwest::Error) -> ProtocolError {
        if err.is_timeout() {
            let millis = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);
            ProtocolError::Timeout(millis)
        } else {
            ProtocolError::Http(err)
        }
    }

    /// Reads a token from the cookies the jar would send to `url`, so
    /// cookies scoped to the endpoint's path are found.
    fn cookie(&self, url: &Url, name: &str) -> Option<String> {
        if !self.config.cookie_fallback {
            return None;
        }
        let header = self.jar.cookies(url)?;
        find_cookie(header.to_str().ok()?, name)
    }

    async fn ensure_session(&mut self) -> Result<()> {
        if self.credentials.is_usable(self.config.alt_policy) {
            return Ok(());
        }
        tracing::warn!("No usable session; authenticating");
        self.authenticate().await.map(|_| ())
    }

    fn forget_rejected_session(&mut self, err: &Error) {
        if err.is_unauthorized() {
            tracing::warn!("Vendor rejected the session; credentials cleared");
            self.credentials.clear();
        }
    }
}

impl VendorApi for TesyClient {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    async fn authenticate(&mut self) -> Result<Credentials> {
        let text = {
            let request = LoginRequest::new(self.login()?, &self.config.lang);
            self.post(&self.endpoints.login, &request)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "Login request failed"))?
        };

        let response = serde_json::from_str::<LoginResponse>(&text).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Login response is not JSON; relying on cookies");
            LoginResponse::default()
        });

        let session = response
            .session()
            .map(str::to_string)
            .or_else(|| self.cookie(&self.endpoints.login, SESSION_COOKIE));
        let alt = response
            .alt()
            .map(str::to_string)
            .or_else(|| self.cookie(&self.endpoints.login, ALT_COOKIE));

        let Some(session) = session else {
            tracing::error!("Login response carried no session token");
            return Err(Error::Auth("no session token in login response".to_string()));
        };
        if alt.is_none() {
            tracing::warn!("Login response carried no ALT token");
        }

        self.credentials = Credentials::new(session, alt);
        tracing::info!(alt = self.credentials.has_alt(), "Authenticated to Tesy cloud");

        Ok(self.credentials.clone())
    }

    async fn fetch_device_status(&mut self) -> Result<DeviceReport> {
        self.ensure_session().await?;

        let result = {
            let request = SessionRequest::new(&self.credentials, self.login()?, &self.config.lang);
            self.post(&self.endpoints.devices, &request).await
        };
        let text = result.inspect_err(|e| self.forget_rejected_session(e))?;

        let response: DevicesResponse = serde_json::from_str(&text).map_err(ParseError::Json)?;

        if !self.credentials.has_alt()
            && let Some(alt) = response
                .alt()
                .map(str::to_string)
                .or_else(|| self.cookie(&self.endpoints.devices, ALT_COOKIE))
        {
            tracing::info!("Captured ALT token from device list");
            self.credentials.set_alt(alt);
        }

        let (device_id, record) = response.into_first().ok_or(Error::NoDevices)?;
        let status = record.into_status().ok_or_else(|| Error::MissingStatus {
            device_id: device_id.clone(),
        })?;

        Ok(DeviceReport::new(device_id, status))
    }

    async fn set_command(&mut self, device_id: &str, command: DeviceCommand) -> Result<()> {
        self.ensure_session().await?;

        if self.config.alt_policy == AltTokenPolicy::Required && !self.credentials.has_alt() {
            return Err(Error::MissingAltToken);
        }

        let result = {
            let session = SessionRequest::new(&self.credentials, self.login()?, &self.config.lang);
            let request = SetStatusRequest::new(session, device_id, command);
            self.post(&self.endpoints.set_status, &request).await
        };
        result.inspect_err(|e| self.forget_rejected_session(e))?;

        tracing::debug!(%command, device_id, "Command accepted");
        Ok(())
    }
}

/// Finds a cookie value in a `Cookie` header, matching the name
/// case-insensitively. Empty values count as absent.
fn find_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
