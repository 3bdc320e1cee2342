// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The heater facade.
//!
//! [`Heater`] owns the vendor client, the poll timer and the cached
//! [`HeaterState`]. Hosts read characteristics from the cache without
//! waiting on the network and relay user commands through it.
//!
//! Every vendor interaction (poll cycle, background refresh, command,
//! initial login) runs in the same in-flight slot: the client sits behind a
//! single-permit lock and the poll timer is paused while the lock is held.
//! A poll therefore never overlaps a command, and the countdown to the next
//! poll starts over after each interaction.
//!
//! # Examples
//!
//! ```no_run
//! use tesy_heater::{Heater, HeaterConfig};
//!
//! #[tokio::main]
//! async fn main() -> tesy_heater::Result<()> {
//!     let config = HeaterConfig::new("Living Room")
//!         .with_device_id("12345")
//!         .with_login("user@example.com", "secret");
//!
//!     let heater = Heater::connect(&config).await?;
//!
//!     heater.set_active(true).await?;
//!     heater.set_target_temperature(21.5).await?;
//!
//!     let mut state_rx = heater.subscribe();
//!     while state_rx.changed().await.is_ok() {
//!         let state = state_rx.borrow().clone();
//!         println!("{}: {:.1} °C", heater.name(), state.current_temperature());
//!     }
//!     Ok(())
//! }
//! ```

mod in_flight;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;

use crate::accessory::{AccessoryInfo, Service, TargetHeatingMode};
use crate::command::DeviceCommand;
use crate::config::HeaterConfig;
use crate::error::{Error, Result};
use crate::poll::{PollTarget, PollTimer, TimerState, spawn_poll_loop};
#[cfg(feature = "http")]
use crate::protocol::TesyClient;
use crate::protocol::VendorApi;
use crate::response::DeviceReport;
use crate::state::{HeaterState, StateChange};
use crate::telemetry::normalize;
use crate::types::{OperatingState, PowerSwitch, TemperatureRange};

use in_flight::InFlight;

/// Capacity of the state change broadcast channel.
const CHANGE_CAPACITY: usize = 64;

/// A heater backed by the Tesy cloud.
#[cfg(feature = "http")]
pub type TesyHeater = Heater<TesyClient>;

/// Handle to one heater.
///
/// Cloning is cheap; all clones share the same client, timer and cache. The
/// poll task stops when the last handle is dropped or [`shutdown`] is
/// called.
///
/// Reads of the live characteristics ([`active`], [`current_temperature`],
/// [`target_temperature`], [`operating_state`]) return the cached value at
/// once and queue a background refresh. At most one background refresh is
/// queued at a time, and none is queued outside a tokio runtime.
///
/// [`shutdown`]: Heater::shutdown
/// [`active`]: Heater::active
/// [`current_temperature`]: Heater::current_temperature
/// [`target_temperature`]: Heater::target_temperature
/// [`operating_state`]: Heater::operating_state
pub struct Heater<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for Heater<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<C> {
    name: String,
    range: TemperatureRange,
    info: AccessoryInfo,
    has_login: bool,
    device_id: RwLock<Option<String>>,
    client: Mutex<C>,
    timer: PollTimer,
    state: RwLock<HeaterState>,
    state_tx: watch::Sender<HeaterState>,
    changes: broadcast::Sender<StateChange>,
    refresh_pending: AtomicBool,
    last_refreshed: RwLock<Option<DateTime<Utc>>>,
    poll_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

#[cfg(feature = "http")]
impl Heater<TesyClient> {
    /// Builds a heater talking to the Tesy cloud and starts it.
    ///
    /// Authentication failures are logged, not returned: the heater keeps
    /// polling and reports itself inactive until the vendor answers.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub async fn connect(config: &HeaterConfig) -> Result<Self> {
        let client = config.http_config().into_client()?;
        let heater = Self::new(config, client)?;
        heater.start().await;
        Ok(heater)
    }
}

impl<C: VendorApi> Heater<C> {
    /// Creates a stopped heater around `client`.
    ///
    /// The cache starts inactive with both temperatures at the lower bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] if the configured temperature range is
    /// invalid.
    pub fn new(config: &HeaterConfig, client: C) -> Result<Self> {
        let range = config.temperature_range()?;
        let state = HeaterState::new(range);
        let (state_tx, _) = watch::channel(state.clone());
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

        let info = AccessoryInfo {
            manufacturer: config.manufacturer.clone(),
            model: config.model.clone(),
            serial_number: config.device_id.clone().unwrap_or_default(),
        };

        let inner = Inner {
            name: config.name.clone(),
            range,
            info,
            has_login: config.has_login(),
            device_id: RwLock::new(config.device_id.clone().filter(|id| !id.is_empty())),
            client: Mutex::new(client),
            timer: PollTimer::new(config.pull_interval()),
            state: RwLock::new(state),
            state_tx,
            changes,
            refresh_pending: AtomicBool::new(false),
            last_refreshed: RwLock::new(None),
            poll_task: parking_lot::Mutex::new(None),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Logs in, starts polling and runs the first refresh.
    ///
    /// Without a configured login the heater warns and keeps polling; it
    /// stays inactive until a login succeeds. Calling `start` on a running
    /// heater does not spawn a second poll task.
    pub async fn start(&self) {
        let inner = &self.inner;

        let authenticated = if inner.has_login {
            let mut slot = inner.acquire().await;
            match slot.authenticate().await {
                Ok(_) => true,
                Err(e) => {
                    tracing::error!(heater = %inner.name, error = %e, "Initial authentication failed");
                    false
                }
            }
        } else {
            tracing::warn!(
                heater = %inner.name,
                "No username/password configured; the heater will stay inactive"
            );
            false
        };

        inner.timer.start();
        self.ensure_poll_task();

        if authenticated {
            let _ = inner.refresh().await;
        }
    }

    /// Stops polling. Commands and explicit refreshes keep working but do
    /// not re-arm the timer; only [`start`](Self::start) does.
    pub fn shutdown(&self) {
        self.inner.timer.stop();
        if let Some(task) = self.inner.poll_task.lock().take() {
            task.abort();
        }
        tracing::info!(heater = %self.inner.name, "Polling stopped");
    }

    fn ensure_poll_task(&self) {
        let mut task = self.inner.poll_task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        *task = Some(spawn_poll_loop(&self.inner));
    }

    /// Runs one poll cycle now.
    ///
    /// On success the cache is updated and the applied changes are
    /// returned. On failure `active` is forced to `false`, temperatures are
    /// kept and the error is returned after being logged.
    ///
    /// # Errors
    ///
    /// Returns any error of [`VendorApi::fetch_device_status`].
    pub async fn refresh(&self) -> Result<Vec<StateChange>> {
        self.inner.refresh().await
    }

    /// Switches the heater on or off.
    ///
    /// Accepts a [`PowerSwitch`], a `bool` or a number (`0` is off). The
    /// cache is updated only after the vendor accepts the command.
    ///
    /// # Errors
    ///
    /// Returns the vendor error; the cache is left unchanged.
    pub async fn set_active(&self, value: impl Into<PowerSwitch>) -> Result<PowerSwitch> {
        let switch = value.into();
        self.inner.send_command(DeviceCommand::Power(switch)).await?;
        Ok(switch)
    }

    /// Sets the target temperature, clamped to the configured range.
    ///
    /// Returns the value actually submitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] for a non-finite value, or the vendor error;
    /// the cache is left unchanged in both cases.
    pub async fn set_target_temperature(&self, value: f64) -> Result<f64> {
        let target = self.inner.range.clamp(value)?;
        if (target - value).abs() > f64::EPSILON {
            tracing::debug!(
                heater = %self.inner.name,
                requested = value,
                submitted = target,
                "Target temperature clamped to range"
            );
        }
        self.inner
            .send_command(DeviceCommand::TargetTemperature(target))
            .await?;
        Ok(target)
    }

    /// Returns whether the heater is on.
    #[must_use]
    pub fn active(&self) -> bool {
        self.refresh_in_background();
        self.inner.state.read().is_active()
    }

    /// Returns the measured temperature in °C.
    #[must_use]
    pub fn current_temperature(&self) -> f64 {
        self.refresh_in_background();
        self.inner.state.read().current_temperature()
    }

    /// Returns the target temperature in °C.
    #[must_use]
    pub fn target_temperature(&self) -> f64 {
        self.refresh_in_background();
        self.inner.state.read().target_temperature()
    }

    /// Returns the coarse operating state.
    #[must_use]
    pub fn operating_state(&self) -> OperatingState {
        self.refresh_in_background();
        self.inner.state.read().operating_state()
    }

    /// Returns the target heating mode, which is always heat.
    #[must_use]
    pub fn target_heating_mode(&self) -> TargetHeatingMode {
        TargetHeatingMode::Heat
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the configured temperature bounds.
    #[must_use]
    pub fn temperature_range(&self) -> TemperatureRange {
        self.inner.range
    }

    /// Returns the device id commands are addressed to, once known.
    #[must_use]
    pub fn device_id(&self) -> Option<String> {
        self.inner.device_id.read().clone()
    }

    /// Returns a snapshot of the cache without triggering a refresh.
    #[must_use]
    pub fn state(&self) -> HeaterState {
        self.inner.state.read().clone()
    }

    /// Returns when the last successful refresh finished.
    #[must_use]
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_refreshed.read()
    }

    /// Returns the state of the poll timer.
    #[must_use]
    pub fn timer_state(&self) -> TimerState {
        self.inner.timer.state()
    }

    /// Watches the cached state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HeaterState> {
        self.inner.state_tx.subscribe()
    }

    /// Receives every change applied to the cache.
    #[must_use]
    pub fn subscribe_changes(&self) -> broadcast::Receiver<StateChange> {
        self.inner.changes.subscribe()
    }

    /// Answers an identify request from the host.
    pub fn identify(&self) {
        tracing::info!(heater = %self.inner.name, "Hi, I'm {}", self.inner.name);
    }

    /// Describes the services exposed to the host and queues a refresh.
    #[must_use]
    pub fn services(&self) -> Vec<Service> {
        self.refresh_in_background();
        vec![
            Service::AccessoryInformation(self.inner.info.clone()),
            Service::heater_cooler(&self.inner.name, self.inner.range),
        ]
    }

    fn refresh_in_background(&self) {
        let inner = &self.inner;
        if inner.refresh_pending.swap(true, Ordering::AcqRel) {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            inner.refresh_pending.store(false, Ordering::Release);
            tracing::trace!(heater = %inner.name, "No runtime; background refresh skipped");
            return;
        };

        let inner = Arc::clone(inner);
        runtime.spawn(async move {
            let _ = inner.refresh().await;
            inner.refresh_pending.store(false, Ordering::Release);
        });
    }
}

impl<C: VendorApi> Inner<C> {
    async fn acquire(&self) -> InFlight<'_, C> {
        InFlight::acquire(&self.client, &self.timer).await
    }

    async fn refresh(&self) -> Result<Vec<StateChange>> {
        let mut slot = self.acquire().await;
        match slot.fetch_device_status().await {
            Ok(report) => Ok(self.apply_report(&report)),
            Err(e) => {
                tracing::error!(heater = %self.name, error = %e, "Status refresh failed");
                let from = self.state.read().is_active();
                self.apply_changes([StateChange::Active { from, to: false }]);
                Err(e)
            }
        }
    }

    async fn send_command(&self, command: DeviceCommand) -> Result<()> {
        let mut slot = self.acquire().await;
        let result = match self.known_device_id() {
            Ok(device_id) => slot.set_command(&device_id, command).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            tracing::error!(heater = %self.name, %command, error = %e, "Command failed");
            return result;
        }

        tracing::debug!(heater = %self.name, %command, "Command applied");
        let change = self.optimistic_change(command);
        self.apply_changes([change]);
        Ok(())
    }

    fn known_device_id(&self) -> Result<String> {
        self.device_id.read().clone().ok_or_else(|| {
            Error::Config("device_id is not configured and no device has reported yet".to_string())
        })
    }

    fn optimistic_change(&self, command: DeviceCommand) -> StateChange {
        let state = self.state.read();
        match command {
            DeviceCommand::Power(switch) => StateChange::Active {
                from: state.is_active(),
                to: switch.is_on(),
            },
            DeviceCommand::TargetTemperature(to) => StateChange::TargetTemperature {
                from: state.target_temperature(),
                to,
            },
        }
    }

    fn apply_report(&self, report: &DeviceReport) -> Vec<StateChange> {
        self.note_device_id(&report.device_id);

        let (_, changes) = normalize(&report.status, &self.state.read(), self.range);
        let applied = self.apply_changes(changes);

        *self.last_refreshed.write() = Some(Utc::now());
        applied
    }

    fn note_device_id(&self, reported: &str) {
        let mut device_id = self.device_id.write();
        if let Some(configured) = device_id.as_deref() {
            if configured != reported {
                tracing::debug!(
                    heater = %self.name,
                    configured,
                    reported,
                    "Status belongs to a different device than configured"
                );
            }
            return;
        }
        tracing::info!(heater = %self.name, device_id = reported, "Using reported device id");
        *device_id = Some(reported.to_string());
    }

    /// Applies changes to the cache and notifies subscribers.
    ///
    /// Returns the changes that modified the cache.
    fn apply_changes(&self, changes: impl IntoIterator<Item = StateChange>) -> Vec<StateChange> {
        let (applied, snapshot): (Vec<_>, _) = {
            let mut state = self.state.write();
            let applied = changes.into_iter().filter(|c| state.apply(c)).collect();
            (applied, state.clone())
        };

        if applied.is_empty() {
            return applied;
        }

        for change in &applied {
            tracing::info!(heater = %self.name, %change, "Characteristic updated");
            // Ignore send errors (no receivers)
            let _ = self.changes.send(change.clone());
        }
        self.state_tx.send_replace(snapshot);

        applied
    }
}

impl<C: VendorApi> PollTarget for Inner<C> {
    fn timer(&self) -> &PollTimer {
        &self.timer
    }

    async fn poll_cycle(&self) {
        let _ = self.refresh().await;
    }
}

impl<C> Drop for Inner<C> {
    fn drop(&mut self) {
        if let Some(task) = self.poll_task.get_mut().take() {
            task.abort();
        }
    }
}

impl<C> fmt::Debug for Heater<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heater")
            .field("name", &self.inner.name)
            .field("range", &self.inner.range)
            .field("state", &*self.inner.state.read())
            .field("timer", &self.inner.timer.state())
            .finish_non_exhaustive()
    }
}
