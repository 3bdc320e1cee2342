// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Heater state management types.
//!
//! [`HeaterState`] holds the cached, normalized view of the heater, while
//! [`StateChange`] represents one applied overwrite of a characteristic.
//!
//! # Examples
//!
//! ```
//! use tesy_heater::state::{HeaterState, StateChange};
//! use tesy_heater::types::TemperatureRange;
//!
//! let mut state = HeaterState::new(TemperatureRange::default());
//!
//! let change = StateChange::CurrentTemperature { from: 10.0, to: 21.5 };
//! state.apply(&change);
//!
//! assert_eq!(state.current_temperature(), 21.5);
//! ```

mod heater_state;
mod state_change;

pub use heater_state::HeaterState;
pub use state_change::StateChange;
