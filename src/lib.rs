// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `tesy_heater` - An async adapter for Tesy cloud-connected heaters.
//!
//! This library logs in to the Tesy cloud, polls the heater's status on an
//! interval and exposes it as a small set of characteristics that a
//! smart-home host can read and write.
//!
//! # Features
//!
//! - **Session handling**: lazy login, token capture from JSON or cookies,
//!   automatic re-login after the vendor rejects a session
//! - **Polling**: a restartable timer that never overlaps a command
//! - **Normalization**: vendor strings mapped to power, temperatures and a
//!   coarse operating state, with out-of-range readings rejected
//! - **Commands**: power and target temperature, applied to the cache once
//!   the vendor accepts them
//! - **State tracking**: watch the cached state or receive every change via
//!   broadcast channels
//!
//! # Quick Start
//!
//! ```no_run
//! use tesy_heater::{Heater, HeaterConfig};
//!
//! #[tokio::main]
//! async fn main() -> tesy_heater::Result<()> {
//!     let config = HeaterConfig::from_json(r#"{
//!         "name": "Bedroom",
//!         "device_id": "12345",
//!         "username": "user@example.com",
//!         "password": "secret",
//!         "pullInterval": 10000,
//!         "minTemp": 10,
//!         "maxTemp": 30
//!     }"#)?;
//!
//!     // Logs in, starts polling and runs the first refresh
//!     let heater = Heater::connect(&config).await?;
//!
//!     heater.set_active(true).await?;
//!     let submitted = heater.set_target_temperature(35.0).await?;
//!     assert_eq!(submitted, 30.0);
//!
//!     let mut changes = heater.subscribe_changes();
//!     while let Ok(change) = changes.recv().await {
//!         println!("{change}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Testing without the cloud
//!
//! [`Heater`] is generic over [`VendorApi`](protocol::VendorApi), so tests
//! and alternative transports can supply their own client and drive the
//! facade with [`Heater::new`] and [`Heater::start`].
//!
//! # Feature flags
//!
//! - `http` (default): the reqwest-based [`TesyClient`](protocol::TesyClient)
//!   and [`Heater::connect`].

pub mod accessory;
pub mod command;
pub mod config;
mod device;
pub mod error;
pub mod poll;
pub mod protocol;
pub mod response;
pub mod state;
pub mod telemetry;
pub mod types;

pub use accessory::{AccessoryInfo, Service, TargetHeatingMode};
pub use command::DeviceCommand;
pub use config::HeaterConfig;
pub use device::Heater;
#[cfg(feature = "http")]
pub use device::TesyHeater;
pub use error::{Error, ParseError, ProtocolError, Result, ValueError};
pub use poll::TimerState;
#[cfg(feature = "http")]
pub use protocol::{HttpConfig, TesyClient};
pub use protocol::{AltTokenPolicy, Credentials, VendorApi};
pub use state::{HeaterState, StateChange};
pub use types::{OperatingState, PowerSwitch, TemperatureRange};
