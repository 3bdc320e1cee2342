// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Services a heater exposes to its host.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::TemperatureRange;

/// Step of the target temperature control in °C.
pub const TARGET_TEMPERATURE_STEP: f64 = 0.5;

/// Resolution of the current temperature reading in °C.
pub const CURRENT_TEMPERATURE_STEP: f64 = 0.1;

/// Heating mode a host may request.
///
/// The heater only heats; hosts that model heater-coolers get a single valid
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetHeatingMode {
    /// Heat to the target temperature.
    #[default]
    Heat,
}

impl fmt::Display for TargetHeatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("heat")
    }
}

/// Identification of the physical accessory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryInfo {
    /// Manufacturer name.
    pub manufacturer: String,
    /// Model name.
    pub model: String,
    /// Serial number; the vendor device id.
    pub serial_number: String,
}

/// A service description handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Service {
    /// Accessory identification.
    AccessoryInformation(AccessoryInfo),
    /// The heater itself.
    HeaterCooler {
        /// Display name.
        name: String,
        /// Lower temperature bound.
        min_temperature: f64,
        /// Upper temperature bound.
        max_temperature: f64,
        /// Target temperature step.
        target_step: f64,
        /// Current temperature resolution.
        current_step: f64,
        /// Heating modes the host may request.
        valid_modes: Vec<TargetHeatingMode>,
    },
}

impl Service {
    /// Describes the heater-cooler service for `name` and `range`.
    #[must_use]
    pub fn heater_cooler(name: impl Into<String>, range: TemperatureRange) -> Self {
        Self::HeaterCooler {
            name: name.into(),
            min_temperature: range.min(),
            max_temperature: range.max(),
            target_step: TARGET_TEMPERATURE_STEP,
            current_step: CURRENT_TEMPERATURE_STEP,
            valid_modes: vec![TargetHeatingMode::Heat],
        }
    }
}
