// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power switch type for the heater.
//!
//! The vendor reports and accepts the heater's power state as the
//! `power_sw` field, with the lowercase strings `"on"` and `"off"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Represents the power switch of the heater.
///
/// # Examples
///
/// ```
/// use tesy_heater::types::PowerSwitch;
///
/// assert_eq!(PowerSwitch::On.as_str(), "on");
/// assert_eq!(PowerSwitch::from(false), PowerSwitch::Off);
///
/// // Numeric values follow the accessory convention: 0 is off.
/// assert_eq!(PowerSwitch::from(0u8), PowerSwitch::Off);
/// assert_eq!(PowerSwitch::from(1u8), PowerSwitch::On);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSwitch {
    /// Heater is switched off.
    Off,
    /// Heater is switched on.
    On,
}

impl PowerSwitch {
    /// Returns the vendor command value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }

    /// Returns the numeric value used by accessory hosts (0 or 1).
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }

    /// Returns `true` if the switch is on.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }

    /// Interprets a vendor `power_sw` value.
    ///
    /// Only `"on"` (any case) means on. Every other value, including an
    /// absent field, means off.
    #[must_use]
    pub fn from_vendor(value: Option<&str>) -> Self {
        match value {
            Some(s) if s.eq_ignore_ascii_case("on") => Self::On,
            _ => Self::Off,
        }
    }
}

impl fmt::Display for PowerSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerSwitch {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "1" | "true" => Ok(Self::On),
            "off" | "0" | "false" => Ok(Self::Off),
            _ => Err(ValueError::InvalidPowerSwitch(s.to_string())),
        }
    }
}

impl From<bool> for PowerSwitch {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl From<u8> for PowerSwitch {
    fn from(value: u8) -> Self {
        Self::from(value != 0)
    }
}

impl From<PowerSwitch> for bool {
    fn from(value: PowerSwitch) -> Self {
        value.is_on()
    }
}
