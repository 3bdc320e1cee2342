// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coarse operating state derived from the vendor `heater_state` field.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Three-valued summary of what the heater is doing.
///
/// # Examples
///
/// ```
/// use tesy_heater::types::OperatingState;
///
/// assert_eq!(OperatingState::from_vendor(Some("READY")), OperatingState::Idle);
/// assert_eq!(OperatingState::from_vendor(Some("boost")), OperatingState::Heating);
/// assert_eq!(OperatingState::from_vendor(None), OperatingState::Inactive);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatingState {
    /// No state reported.
    #[default]
    Inactive,
    /// Reached the target temperature.
    Idle,
    /// Actively heating.
    Heating,
}

impl OperatingState {
    /// Interprets a vendor `heater_state` value.
    ///
    /// `"READY"` in any case maps to [`Idle`](Self::Idle), any other
    /// non-empty value to [`Heating`](Self::Heating), and an empty or
    /// missing value to [`Inactive`](Self::Inactive). The value is compared
    /// as sent; whitespace is not trimmed.
    #[must_use]
    pub fn from_vendor(value: Option<&str>) -> Self {
        match value {
            None | Some("") => Self::Inactive,
            Some(s) if s.eq_ignore_ascii_case("ready") => Self::Idle,
            Some(_) => Self::Heating,
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "INACTIVE",
            Self::Idle => "IDLE",
            Self::Heating => "HEATING",
        }
    }

    /// Returns the current-heater-cooler-state number used by accessory hosts.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Inactive => 0,
            Self::Idle => 1,
            Self::Heating => 2,
        }
    }
}

impl fmt::Display for OperatingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
