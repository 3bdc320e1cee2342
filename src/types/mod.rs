// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for heater control.
//!
//! # Types
//!
//! - [`PowerSwitch`] - On/Off power switch (`power_sw`)
//! - [`OperatingState`] - Inactive/Idle/Heating summary (`heater_state`)
//! - [`TemperatureRange`] - Inclusive bounds for temperatures in °C

mod operating_state;
mod power;
mod temperature;

pub use operating_state::OperatingState;
pub use power::PowerSwitch;
pub use temperature::TemperatureRange;
