// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `tesy_heater` library.
//!
//! Vendor calls fail with [`Error::Auth`], [`Error::Protocol`],
//! [`Error::NoDevices`] or [`Error::MissingStatus`]. Caller-supplied values
//! fail with [`Error::Value`]. None of these escape the poll loop: the
//! [`Heater`](crate::Heater) logs them and degrades its cached state instead.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Login did not yield a usable session.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Error occurred during communication with the vendor cloud.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a vendor response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The device list returned by the vendor was empty.
    #[error("no devices in response")]
    NoDevices,

    /// The selected device carried no status record.
    #[error("device {device_id} has no DeviceStatus")]
    MissingStatus {
        /// Identifier of the device without status.
        device_id: String,
    },

    /// A command was refused because no ALT token could be obtained.
    #[error("missing ALT token required for device commands")]
    MissingAltToken,

    /// The adapter configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` if the vendor rejected the current session.
    ///
    /// Credentials must be re-acquired before the next request.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Protocol(ProtocolError::AuthenticationFailed { .. })
        )
    }

    /// Returns `true` if the request timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Protocol(ProtocolError::Timeout(_)))
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A temperature was NaN or infinite.
    #[error("temperature {0} is not a finite number")]
    NotFinite(f64),

    /// Temperature bounds are inverted or not finite.
    #[error("invalid temperature range [{min}, {max}]")]
    InvalidRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// An invalid power switch string was provided.
    #[error("invalid power switch value: {0}")]
    InvalidPowerSwitch(String),
}

/// Errors related to HTTP communication with the vendor cloud.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP transport failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The vendor rejected the session or credentials.
    #[error("authentication rejected by vendor: {body}")]
    AuthenticationFailed {
        /// Response body returned by the vendor.
        body: String,
    },

    /// The vendor answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body returned by the vendor.
        body: String,
    },

    /// Invalid base URL.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to parsing vendor responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
