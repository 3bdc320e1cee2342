// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON request bodies of the vendor's "old-app" endpoints.

use serde::Serialize;
use serde_json::Value;

use crate::command::DeviceCommand;

use super::Credentials;
use super::http::Login;

/// Body of the login request.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "userID")]
    user_id: Option<&'a str>,
    #[serde(rename = "userEmail")]
    user_email: &'a str,
    #[serde(rename = "userPass")]
    user_pass: &'a str,
    lang: &'a str,
}

impl<'a> LoginRequest<'a> {
    pub(crate) fn new(login: &'a Login, lang: &'a str) -> Self {
        Self {
            email: login.username(),
            password: login.password(),
            user_id: login.user_id(),
            user_email: login.username(),
            user_pass: login.password(),
            lang,
        }
    }
}

/// Session and account fields sent with every device request.
#[derive(Debug, Serialize)]
pub(crate) struct SessionRequest<'a> {
    #[serde(rename = "ALT")]
    alt: &'a str,
    #[serde(rename = "CURRENT_SESSION")]
    current_session: Option<&'a str>,
    #[serde(rename = "PHPSESSID")]
    session: &'a str,
    last_login_username: &'a str,
    #[serde(rename = "userID")]
    user_id: Option<&'a str>,
    #[serde(rename = "userEmail")]
    user_email: &'a str,
    #[serde(rename = "userPass")]
    user_pass: &'a str,
    lang: &'a str,
}

impl<'a> SessionRequest<'a> {
    pub(crate) fn new(credentials: &'a Credentials, login: &'a Login, lang: &'a str) -> Self {
        Self {
            alt: credentials.alt().unwrap_or_default(),
            current_session: None,
            session: credentials.session().unwrap_or_default(),
            last_login_username: login.username(),
            user_id: login.user_id(),
            user_email: login.username(),
            user_pass: login.password(),
            lang,
        }
    }
}

/// Body of the set-device-status request.
#[derive(Debug, Serialize)]
pub(crate) struct SetStatusRequest<'a> {
    #[serde(flatten)]
    session: SessionRequest<'a>,
    id: &'a str,
    #[serde(rename = "apiVersion")]
    api_version: &'static str,
    command: &'static str,
    value: Value,
}

impl<'a> SetStatusRequest<'a> {
    pub(crate) fn new(session: SessionRequest<'a>, device_id: &'a str, command: DeviceCommand) -> Self {
        Self {
            session,
            id: device_id,
            api_version: "apiv1",
            command: command.name(),
            value: command.value(),
        }
    }
}
