// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature bounds for the heater.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Inclusive temperature bounds in °C.
///
/// Vendor readings outside the range are rejected; user-requested targets
/// are clamped into it.
///
/// # Examples
///
/// ```
/// use tesy_heater::types::TemperatureRange;
///
/// let range = TemperatureRange::new(10.0, 30.0).unwrap();
/// assert!(range.contains(21.5));
/// assert!(!range.contains(35.0));
/// assert_eq!(range.clamp(35.0).unwrap(), 30.0);
///
/// assert!(TemperatureRange::new(30.0, 10.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct TemperatureRange {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct RawRange {
    min: f64,
    max: f64,
}

impl TryFrom<RawRange> for TemperatureRange {
    type Error = ValueError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max)
    }
}

impl TemperatureRange {
    /// Default lower bound.
    pub const DEFAULT_MIN: f64 = 10.0;
    /// Default upper bound.
    pub const DEFAULT_MAX: f64 = 30.0;

    /// Creates a new range.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidRange` if either bound is not finite or
    /// `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, ValueError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ValueError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Returns the lower bound.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Returns the upper bound.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Returns `true` if `value` lies within the bounds.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamps `value` into the bounds.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::NotFinite` for NaN or infinite input.
    pub fn clamp(&self, value: f64) -> Result<f64, ValueError> {
        if !value.is_finite() {
            return Err(ValueError::NotFinite(value));
        }
        Ok(value.clamp(self.min, self.max))
    }
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

impl fmt::Display for TemperatureRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
