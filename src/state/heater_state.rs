// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalized heater state.

use serde::{Deserialize, Serialize};

use crate::types::{OperatingState, TemperatureRange};

use super::StateChange;

/// Cached, normalized state of the heater.
///
/// This is the single source of truth read by the host framework. Both
/// temperatures start at the lower bound of the configured range and only
/// ever take values inside it.
///
/// # Examples
///
/// ```
/// use tesy_heater::state::HeaterState;
/// use tesy_heater::types::{OperatingState, TemperatureRange};
///
/// let state = HeaterState::new(TemperatureRange::default());
/// assert!(!state.is_active());
/// assert_eq!(state.operating_state(), OperatingState::Inactive);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaterState {
    active: bool,
    current_temperature: f64,
    target_temperature: f64,
    operating_state: OperatingState,
}

impl HeaterState {
    /// Creates the initial state shown before the first successful poll.
    #[must_use]
    pub fn new(range: TemperatureRange) -> Self {
        Self {
            active: false,
            current_temperature: range.min(),
            target_temperature: range.min(),
            operating_state: OperatingState::Inactive,
        }
    }

    /// Returns `true` if the heater is switched on.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the measured room temperature in °C.
    #[must_use]
    pub fn current_temperature(&self) -> f64 {
        self.current_temperature
    }

    /// Returns the target temperature in °C.
    #[must_use]
    pub fn target_temperature(&self) -> f64 {
        self.target_temperature
    }

    /// Returns the coarse operating state.
    #[must_use]
    pub fn operating_state(&self) -> OperatingState {
        self.operating_state
    }

    /// Applies a state change.
    ///
    /// Returns `true` if the state was modified.
    pub fn apply(&mut self, change: &StateChange) -> bool {
        match *change {
            StateChange::Active { to, .. } => replace(&mut self.active, to),
            StateChange::CurrentTemperature { to, .. } => {
                replace_temperature(&mut self.current_temperature, to)
            }
            StateChange::TargetTemperature { to, .. } => {
                replace_temperature(&mut self.target_temperature, to)
            }
            StateChange::OperatingState { to, .. } => replace(&mut self.operating_state, to),
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn replace_temperature(slot: &mut f64, value: f64) -> bool {
    if (*slot - value).abs() < f64::EPSILON {
        return false;
    }
    *slot = value;
    true
}
