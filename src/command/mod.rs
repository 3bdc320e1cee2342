// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Heater command definitions.
//!
//! The vendor's set-device-status endpoint takes a command name and a
//! value. Only two commands are used by this library:
//!
//! | Command | Name | Value |
//! |---------|------|-------|
//! | [`DeviceCommand::Power`] | `power_sw` | `"on"` / `"off"` |
//! | [`DeviceCommand::TargetTemperature`] | `tmpT` | number in °C |
//!
//! # Examples
//!
//! ```
//! use tesy_heater::command::DeviceCommand;
//! use tesy_heater::types::PowerSwitch;
//!
//! let cmd = DeviceCommand::Power(PowerSwitch::On);
//! assert_eq!(cmd.name(), "power_sw");
//! assert_eq!(cmd.value(), serde_json::json!("on"));
//!
//! let cmd = DeviceCommand::TargetTemperature(22.5);
//! assert_eq!(cmd.name(), "tmpT");
//! assert_eq!(cmd.value(), serde_json::json!(22.5));
//! ```

use std::fmt;

use serde_json::Value;

use crate::types::PowerSwitch;

/// A command that can be sent to the heater.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    /// Switch the heater on or off.
    Power(PowerSwitch),
    /// Set the target temperature in °C.
    ///
    /// The value must already be clamped to the configured range.
    TargetTemperature(f64),
}

impl DeviceCommand {
    /// Returns the vendor command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Power(_) => "power_sw",
            Self::TargetTemperature(_) => "tmpT",
        }
    }

    /// Returns the JSON value sent with the command.
    #[must_use]
    pub fn value(&self) -> Value {
        match self {
            Self::Power(switch) => Value::from(switch.as_str()),
            Self::TargetTemperature(t) => Value::from(*t),
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name(), self.value())
    }
}
