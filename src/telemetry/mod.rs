// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status normalization.
//!
//! Every poll cycle hands the raw [`DeviceStatus`](crate::response::DeviceStatus)
//! of the heater to [`normalize`], which derives the next
//! [`HeaterState`](crate::state::HeaterState) and the list of characteristic
//! changes it implies.

mod normalizer;

pub use normalizer::{normalize, parse_temperature};
