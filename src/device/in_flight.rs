// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exclusive access to the vendor client.

use std::ops::{Deref, DerefMut};

use tokio::sync::{Mutex, MutexGuard};

use crate::poll::{PauseGuard, PollTimer};

/// The in-flight slot: exclusive use of the client with the poll timer
/// paused.
///
/// Fields drop in declaration order, so an enabled timer is re-armed before
/// the client lock is released.
pub(crate) struct InFlight<'a, C> {
    _pause: PauseGuard<'a>,
    client: MutexGuard<'a, C>,
}

impl<'a, C> InFlight<'a, C> {
    /// Waits for the client, then pauses the timer.
    pub(crate) async fn acquire(client: &'a Mutex<C>, timer: &'a PollTimer) -> Self {
        let client = client.lock().await;
        let pause = timer.pause();
        Self {
            _pause: pause,
            client,
        }
    }
}

impl<C> Deref for InFlight<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.client
    }
}

impl<C> DerefMut for InFlight<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.client
    }
}
