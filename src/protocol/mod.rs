// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with the Tesy cloud.
//!
//! The [`VendorApi`] trait is the seam between the
//! [`Heater`](crate::Heater) facade and the network. [`TesyClient`] is the
//! production implementation speaking the vendor's JSON-over-HTTPS "old-app"
//! endpoints; tests substitute their own.
//!
//! # Session handling
//!
//! A client holds [`Credentials`]: a session token and, for most accounts, a
//! secondary ALT token. Implementations log in lazily when no usable
//! credentials are held and clear them when the vendor rejects the session,
//! so callers never drive authentication explicitly after startup.

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
mod request;
mod session;

#[cfg(feature = "http")]
pub use http::{HttpConfig, Login, TesyClient};
pub use session::{AltTokenPolicy, Credentials};

use std::future::Future;

use crate::command::DeviceCommand;
use crate::error::Result;
use crate::response::DeviceReport;

/// Operations a vendor cloud client must provide.
///
/// Methods take `&mut self` because they may replace the held credentials.
/// Callers serialize access, so at most one request is in flight per client.
pub trait VendorApi: Send + 'static {
    /// Returns the credentials currently held.
    fn credentials(&self) -> &Credentials;

    /// Logs in and replaces the held credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`](crate::Error::Auth) if no login is configured
    /// or the response carries no session token, or a protocol error if the
    /// request fails.
    fn authenticate(&mut self) -> impl Future<Output = Result<Credentials>> + Send;

    /// Fetches the status of the first device on the account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDevices`](crate::Error::NoDevices) for an empty
    /// device list, [`Error::MissingStatus`](crate::Error::MissingStatus) if
    /// the device carries no status, or a protocol or parse error.
    fn fetch_device_status(&mut self) -> impl Future<Output = Result<DeviceReport>> + Send;

    /// Sends a command to the device with the given id.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the vendor does not accept the command.
    fn set_command(
        &mut self,
        device_id: &str,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<()>> + Send;
}
