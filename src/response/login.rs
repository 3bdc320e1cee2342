// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Login response parsing.

use serde::Deserialize;

use super::devices::lenient_string;

/// Response from the login endpoint.
///
/// The vendor has used two spellings for both tokens over time:
/// `acc_session`/`PHPSESSID` for the session and `acc_alt`/`ALT` for the
/// secondary token. The `acc_*` names take precedence. Numbers are taken as
/// their decimal text and empty strings are treated as absent.
///
/// # Examples
///
/// ```
/// use tesy_heater::response::LoginResponse;
///
/// let json = r#"{"acc_session": "S1", "acc_alt": "A1"}"#;
/// let response: LoginResponse = serde_json::from_str(json).unwrap();
/// assert_eq!(response.session(), Some("S1"));
/// assert_eq!(response.alt(), Some("A1"));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    acc_session: Option<String>,
    #[serde(rename = "PHPSESSID", default, deserialize_with = "lenient_string")]
    phpsessid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    acc_alt: Option<String>,
    #[serde(rename = "ALT", default, deserialize_with = "lenient_string")]
    alt: Option<String>,
}

impl LoginResponse {
    /// Returns the session token, if present.
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        first_present(self.acc_session.as_deref(), self.phpsessid.as_deref())
    }

    /// Returns the secondary (ALT) token, if present.
    #[must_use]
    pub fn alt(&self) -> Option<&str> {
        first_present(self.acc_alt.as_deref(), self.alt.as_deref())
    }
}

/// Returns the first non-empty value.
pub(crate) fn first_present<'a>(
    primary: Option<&'a str>,
    fallback: Option<&'a str>,
) -> Option<&'a str> {
    primary
        .filter(|s| !s.is_empty())
        .or_else(|| fallback.filter(|s| !s.is_empty()))
}
