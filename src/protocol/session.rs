// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session credentials held by a vendor client.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether device requests need the secondary (ALT) token.
///
/// Some accounts never receive an ALT token at login. With
/// [`Optional`](Self::Optional) a session token alone is enough; with
/// [`Required`](Self::Required) a missing ALT token triggers
/// re-authentication before device requests, and commands are refused if it
/// is still missing afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltTokenPolicy {
    /// A session token alone makes credentials usable.
    #[default]
    Optional,
    /// Both tokens are needed.
    Required,
}

/// Tokens proving an authenticated vendor session.
///
/// Created empty, replaced as a whole by a successful login and cleared
/// when the vendor rejects the session. Empty strings are never stored.
///
/// # Examples
///
/// ```
/// use tesy_heater::protocol::{AltTokenPolicy, Credentials};
///
/// let creds = Credentials::new("S1", None);
/// assert!(creds.is_usable(AltTokenPolicy::Optional));
/// assert!(!creds.is_usable(AltTokenPolicy::Required));
/// assert!(!Credentials::default().is_usable(AltTokenPolicy::Optional));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    session: Option<String>,
    alt: Option<String>,
}

impl Credentials {
    /// Creates credentials from a session token and an optional ALT token.
    #[must_use]
    pub fn new(session: impl Into<String>, alt: Option<String>) -> Self {
        Self {
            session: Some(session.into()).filter(|s| !s.is_empty()),
            alt: alt.filter(|s| !s.is_empty()),
        }
    }

    /// Returns the session token.
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Returns the secondary (ALT) token.
    #[must_use]
    pub fn alt(&self) -> Option<&str> {
        self.alt.as_deref()
    }

    /// Returns `true` if a session token is held.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Returns `true` if an ALT token is held.
    #[must_use]
    pub fn has_alt(&self) -> bool {
        self.alt.is_some()
    }

    /// Returns `true` if these credentials can be used for device requests.
    #[must_use]
    pub fn is_usable(&self, policy: AltTokenPolicy) -> bool {
        match policy {
            AltTokenPolicy::Optional => self.has_session(),
            AltTokenPolicy::Required => self.has_session() && self.has_alt(),
        }
    }

    /// Stores an ALT token captured after login.
    pub fn set_alt(&mut self, alt: impl Into<String>) {
        self.alt = Some(alt.into()).filter(|s| !s.is_empty());
    }

    /// Forgets both tokens.
    pub fn clear(&mut self) {
        self.session = None;
        self.alt = None;
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("session", &self.session.as_ref().map(|_| "<redacted>"))
            .field("alt", &self.alt.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
