// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device list response parsing.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::login::first_present;

/// Response from the device list endpoint.
///
/// Devices are kept in the order the vendor sent them. An empty device map
/// may arrive as `{}`, `[]` or `null`. Records are decoded on demand, so a
/// malformed entry behind the first one does not fail the response.
///
/// # Examples
///
/// ```
/// use tesy_heater::response::DevicesResponse;
///
/// let json = r#"{
///     "device": {
///         "D1": {"DeviceStatus": {"gradus": "21.5", "power_sw": "on"}}
///     }
/// }"#;
/// let response: DevicesResponse = serde_json::from_str(json).unwrap();
/// let (id, record) = response.into_first().unwrap();
/// assert_eq!(id, "D1");
/// assert_eq!(record.status().unwrap().current_temperature(), Some("21.5"));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevicesResponse {
    #[serde(default, deserialize_with = "device_map")]
    device: IndexMap<String, Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    acc_alt: Option<String>,
    #[serde(rename = "ALT", default, deserialize_with = "lenient_string")]
    alt: Option<String>,
}

impl DevicesResponse {
    /// Iterates over device identifiers in response order.
    pub fn device_ids(&self) -> impl Iterator<Item = &str> {
        self.device.keys().map(String::as_str)
    }

    /// Returns the number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.device.len()
    }

    /// Returns `true` if the response lists no devices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.device.is_empty()
    }

    /// Decodes and returns the first device. The others are discarded.
    #[must_use]
    pub fn into_first(self) -> Option<(String, DeviceRecord)> {
        self.device
            .into_iter()
            .next()
            .map(|(id, record)| (id, DeviceRecord::from_value(record)))
    }

    /// Returns the secondary (ALT) token, if the vendor sent one.
    #[must_use]
    pub fn alt(&self) -> Option<&str> {
        first_present(self.acc_alt.as_deref(), self.alt.as_deref())
    }
}

/// One entry of the device map.
#[derive(Debug, Clone, Default)]
pub struct DeviceRecord {
    status: Option<DeviceStatus>,
}

impl DeviceRecord {
    /// Reads the `DeviceStatus` sub-record. Anything other than an object
    /// (PHP sends `[]` for an empty one) counts as no status.
    fn from_value(record: Value) -> Self {
        let status = match record {
            Value::Object(mut fields) => fields.remove("DeviceStatus"),
            _ => None,
        };
        Self {
            status: status
                .filter(Value::is_object)
                .and_then(|status| DeviceStatus::deserialize(status).ok()),
        }
    }

    /// Returns the status sub-record, if present.
    #[must_use]
    pub fn status(&self) -> Option<&DeviceStatus> {
        self.status.as_ref()
    }

    /// Consumes the record and returns the status sub-record.
    #[must_use]
    pub fn into_status(self) -> Option<DeviceStatus> {
        self.status
    }
}

/// Raw status fields reported by the heater.
///
/// Values are kept as vendor strings; numbers are stringified on the way
/// in. Interpretation happens in [`normalize`](crate::telemetry::normalize).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceStatus {
    #[serde(default, deserialize_with = "lenient_string")]
    gradus: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    ref_gradus: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    power_sw: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    heater_state: Option<String>,
}

impl DeviceStatus {
    /// Returns the measured temperature (`gradus`).
    #[must_use]
    pub fn current_temperature(&self) -> Option<&str> {
        self.gradus.as_deref()
    }

    /// Returns the target temperature (`ref_gradus`).
    #[must_use]
    pub fn target_temperature(&self) -> Option<&str> {
        self.ref_gradus.as_deref()
    }

    /// Returns the power switch (`power_sw`).
    #[must_use]
    pub fn power_switch(&self) -> Option<&str> {
        self.power_sw.as_deref()
    }

    /// Returns the coarse heater state (`heater_state`).
    #[must_use]
    pub fn heater_state(&self) -> Option<&str> {
        self.heater_state.as_deref()
    }
}

/// The status of the first device in a device list response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReport {
    /// Vendor identifier of the reporting device.
    pub device_id: String,
    /// Raw status fields.
    pub status: DeviceStatus,
}

impl DeviceReport {
    /// Creates a report.
    #[must_use]
    pub fn new(device_id: impl Into<String>, status: DeviceStatus) -> Self {
        Self {
            device_id: device_id.into(),
            status,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDeviceMap {
    Map(IndexMap<String, Value>),
    List(Vec<Value>),
}

// Deserialized directly into an `IndexMap`: a `serde_json::Value` object
// would reorder the keys.
fn device_map<'de, D>(deserializer: D) -> Result<IndexMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawDeviceMap>::deserialize(deserializer)? {
        Some(RawDeviceMap::Map(devices)) => Ok(devices),
        Some(RawDeviceMap::List(items)) if !items.is_empty() => Err(serde::de::Error::custom(
            "expected device map, found non-empty list",
        )),
        Some(RawDeviceMap::List(_)) | None => Ok(IndexMap::new()),
    }
}

/// Accepts a string, number or boolean and keeps it as a string.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_vendor_order() {
        let json = r#"{"device":{"Z9":{"DeviceStatus":{}},"A1":{"DeviceStatus":{}}}}"#;
        let response: DevicesResponse = serde_json::from_str(json).unwrap();
        let ids: Vec<&str> = response.device_ids().collect();
        assert_eq!(ids, ["Z9", "A1"]);
        assert_eq!(response.into_first().unwrap().0, "Z9");
    }

    #[test]
    fn malformed_later_device_is_ignored() {
        let json = r#"{"device":{
            "D1":{"DeviceStatus":{"gradus":"21.5","power_sw":"on"}},
            "D2":{"DeviceStatus":"offline"},
            "D3":"garbage"
        }}"#;
        let response: DevicesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.len(), 3);

        let (id, record) = response.into_first().unwrap();
        assert_eq!(id, "D1");
        let status = record.into_status().unwrap();
        assert_eq!(status.current_temperature(), Some("21.5"));
        assert_eq!(status.power_switch(), Some("on"));
    }

    #[test]
    fn non_object_status_counts_as_missing() {
        for json in [
            r#"{"device":{"D1":{"DeviceStatus":[]}}}"#,
            r#"{"device":{"D1":{"DeviceStatus":"offline"}}}"#,
            r#"{"device":{"D1":{"DeviceStatus":null}}}"#,
            r#"{"device":{"D1":[]}}"#,
        ] {
            let response: DevicesResponse = serde_json::from_str(json).unwrap();
            let (_, record) = response.into_first().unwrap();
            assert!(record.status().is_none(), "{json}");
        }
    }

    #[test]
    fn empty_device_variants() {
        for json in [r#"{"device":{}}"#, r#"{"device":[]}"#, r#"{"device":null}"#, "{}"] {
            let response: DevicesResponse = serde_json::from_str(json).unwrap();
            assert!(response.is_empty(), "{json}");
        }
    }

    #[test]
    fn rejects_non_map_device_field() {
        let result = serde_json::from_str::<DevicesResponse>(r#"{"device":"nope"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn numeric_fields_are_stringified() {
        let json = r#"{"gradus": 21.5, "ref_gradus": 22, "power_sw": "on", "heater_state": null}"#;
        let status: DeviceStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.current_temperature(), Some("21.5"));
        assert_eq!(status.target_temperature(), Some("22"));
        assert_eq!(status.power_switch(), Some("on"));
        assert_eq!(status.heater_state(), None);
    }

    #[test]
    fn missing_status_record() {
        let json = r#"{"device":{"D1":{"name":"Living room"}}}"#;
        let response: DevicesResponse = serde_json::from_str(json).unwrap();
        let (_, record) = response.into_first().unwrap();
        assert!(record.into_status().is_none());
    }

    #[test]
    fn alt_token_in_device_response() {
        let response: DevicesResponse =
            serde_json::from_str(r#"{"device":{},"ALT":"A2"}"#).unwrap();
        assert_eq!(response.alt(), Some("A2"));
    }

    #[test]
    fn numeric_alt_token_is_stringified() {
        let json = r#"{"device":{"D1":{"DeviceStatus":{}}},"ALT":12345}"#;
        let response: DevicesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.alt(), Some("12345"));

        let response: DevicesResponse =
            serde_json::from_str(r#"{"device":{},"acc_alt":7,"ALT":null}"#).unwrap();
        assert_eq!(response.alt(), Some("7"));
    }
}
