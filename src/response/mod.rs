// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response parsing for the vendor's JSON responses.
//!
//! Only the fields needed to establish a session and read the heater status
//! are modelled; everything else in the vendor payloads is ignored.

mod devices;
mod login;

pub(crate) use devices::lenient_string;
pub use devices::{DeviceRecord, DeviceReport, DeviceStatus, DevicesResponse};
pub use login::LoginResponse;
