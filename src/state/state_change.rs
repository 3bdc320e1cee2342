// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! A [`StateChange`] records one applied overwrite of a heater
//! characteristic, with the value it replaced. Changes are produced by the
//! status normalizer, by successful write commands, and by the failure
//! handler that forces the heater inactive.
//!
//! # Examples
//!
//! ```
//! use tesy_heater::state::{HeaterState, StateChange};
//! use tesy_heater::types::TemperatureRange;
//!
//! let mut state = HeaterState::new(TemperatureRange::default());
//!
//! // Apply returns true if state actually changed
//! assert!(state.apply(&StateChange::Active { from: false, to: true }));
//! assert!(state.is_active());
//!
//! // Applying the same target again returns false
//! assert!(!state.apply(&StateChange::Active { from: false, to: true }));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::OperatingState;

/// Represents a change of one heater characteristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateChange {
    /// Power switch changed.
    Active {
        /// Previous value.
        from: bool,
        /// New value.
        to: bool,
    },

    /// Measured room temperature changed.
    CurrentTemperature {
        /// Previous value in °C.
        from: f64,
        /// New value in °C.
        to: f64,
    },

    /// Target (heating threshold) temperature changed.
    TargetTemperature {
        /// Previous value in °C.
        from: f64,
        /// New value in °C.
        to: f64,
    },

    /// Coarse operating state changed.
    OperatingState {
        /// Previous value.
        from: OperatingState,
        /// New value.
        to: OperatingState,
    },
}

impl StateChange {
    /// Returns the name of the characteristic this change applies to.
    #[must_use]
    pub const fn characteristic(&self) -> &'static str {
        match self {
            Self::Active { .. } => "Active",
            Self::CurrentTemperature { .. } => "CurrentTemperature",
            Self::TargetTemperature { .. } => "HeatingThresholdTemperature",
            Self::OperatingState { .. } => "CurrentHeaterCoolerState",
        }
    }

    /// Returns `true` if this is a power switch change.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Returns `true` if this is a temperature change.
    #[must_use]
    pub fn is_temperature(&self) -> bool {
        matches!(
            self,
            Self::CurrentTemperature { .. } | Self::TargetTemperature { .. }
        )
    }
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.characteristic();
        match self {
            Self::Active { from, to } => write!(f, "{name} from {from} to {to}"),
            Self::CurrentTemperature { from, to } | Self::TargetTemperature { from, to } => {
                write!(f, "{name} from {from} to {to}")
            }
            Self::OperatingState { from, to } => write!(f, "{name} from {from} to {to}"),
        }
    }
}
