// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Maps raw vendor status onto [`HeaterState`].

use crate::response::DeviceStatus;
use crate::state::{HeaterState, StateChange};
use crate::types::{OperatingState, PowerSwitch, TemperatureRange};

/// Normalizes a vendor status report against the previous state.
///
/// Each field is handled independently, so a rejected temperature does not
/// block the other fields:
///
/// - temperatures are accepted only when they start with a finite number,
///   differ from the previous value and lie inside `range`; otherwise the
///   previous value is kept;
/// - `power_sw` is on only for `"on"` in any case;
/// - `heater_state` maps `"READY"` to idle, other non-empty values to
///   heating and empty or missing values to inactive.
///
/// Returns the new state and one [`StateChange`] per overwritten field.
///
/// # Examples
///
/// ```
/// use tesy_heater::response::DeviceStatus;
/// use tesy_heater::state::HeaterState;
/// use tesy_heater::telemetry::normalize;
/// use tesy_heater::types::{OperatingState, TemperatureRange};
///
/// let status: DeviceStatus = serde_json::from_str(
///     r#"{"gradus":"21.5","ref_gradus":"22.0","power_sw":"on","heater_state":"READY"}"#,
/// ).unwrap();
/// let range = TemperatureRange::default();
///
/// let (state, changes) = normalize(&status, &HeaterState::new(range), range);
/// assert!(state.is_active());
/// assert_eq!(state.current_temperature(), 21.5);
/// assert_eq!(state.target_temperature(), 22.0);
/// assert_eq!(state.operating_state(), OperatingState::Idle);
/// assert_eq!(changes.len(), 4);
/// ```
#[must_use]
pub fn normalize(
    status: &DeviceStatus,
    previous: &HeaterState,
    range: TemperatureRange,
) -> (HeaterState, Vec<StateChange>) {
    let current = previous.current_temperature();
    let target = previous.target_temperature();

    let candidates = [
        accepted_temperature(status.current_temperature(), current, range)
            .map(|to| StateChange::CurrentTemperature { from: current, to }),
        accepted_temperature(status.target_temperature(), target, range)
            .map(|to| StateChange::TargetTemperature { from: target, to }),
        Some(StateChange::Active {
            from: previous.is_active(),
            to: PowerSwitch::from_vendor(status.power_switch()).is_on(),
        }),
        Some(StateChange::OperatingState {
            from: previous.operating_state(),
            to: OperatingState::from_vendor(status.heater_state()),
        }),
    ];

    let mut next = previous.clone();
    let changes = candidates
        .into_iter()
        .flatten()
        .filter(|change| next.apply(change))
        .collect();

    (next, changes)
}

/// Parses a vendor temperature string.
///
/// Leading whitespace is skipped and the longest numeric prefix is read,
/// so `"21.5 C"` gives `21.5`. Returns `None` for missing values, values
/// without a numeric prefix and non-finite values.
///
/// # Examples
///
/// ```
/// use tesy_heater::telemetry::parse_temperature;
///
/// assert_eq!(parse_temperature(Some("21.5 C")), Some(21.5));
/// assert_eq!(parse_temperature(Some("-2e1x")), Some(-20.0));
/// assert_eq!(parse_temperature(Some("C 21.5")), None);
/// ```
#[must_use]
pub fn parse_temperature(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim_start();
    raw[..numeric_prefix_len(raw)]
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
}

/// Length of the leading `[+-]digits[.digits][e[+-]digits]` run, or zero
/// when it holds no digit.
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let integer = digits_from(end);
    end += integer;

    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if integer + fraction > 0 {
            end += 1 + fraction;
        }
    }
    if integer + fraction == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent = digits_from(end + 1 + sign);
        if exponent > 0 {
            end += 1 + sign + exponent;
        }
    }

    end
}

fn accepted_temperature(
    raw: Option<&str>,
    previous: f64,
    range: TemperatureRange,
) -> Option<f64> {
    parse_temperature(raw).filter(|t| (t - previous).abs() >= f64::EPSILON && range.contains(*t))
}
