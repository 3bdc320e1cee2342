// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Behaviour of the heater facade against a scripted vendor.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use tesy_heater::protocol::{Credentials, VendorApi};
use tesy_heater::response::{DeviceReport, DeviceStatus};
use tesy_heater::{
    DeviceCommand, Error, Heater, HeaterConfig, OperatingState, PowerSwitch, ProtocolError,
    Result, Service, StateChange, TimerState,
};

// ============================================================================
// Scripted vendor
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Failure {
    Timeout,
    NoDevices,
}

#[derive(Debug)]
struct Script {
    log: Vec<String>,
    commands: Vec<(String, DeviceCommand)>,
    device_id: String,
    status: DeviceStatus,
    fetch_failure: Option<Failure>,
    reject_auth: bool,
    reject_commands: bool,
    delay: Duration,
}

impl Script {
    fn count(&self, entry: &str) -> usize {
        self.log.iter().filter(|e| *e == entry).count()
    }
}

#[derive(Debug, Clone)]
struct ScriptHandle(Arc<Mutex<Script>>);

impl ScriptHandle {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Script {
            log: Vec::new(),
            commands: Vec::new(),
            device_id: "D1".to_string(),
            status: status(json!({
                "gradus": "21.5",
                "ref_gradus": "22.0",
                "power_sw": "on",
                "heater_state": "READY"
            })),
            fetch_failure: None,
            reject_auth: false,
            reject_commands: false,
            delay: Duration::ZERO,
        })))
    }

    fn edit(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.0.lock());
    }

    fn log(&self) -> Vec<String> {
        self.0.lock().log.clone()
    }

    fn fetches(&self) -> usize {
        self.0.lock().count("fetch:start")
    }

    fn commands(&self) -> Vec<(String, DeviceCommand)> {
        self.0.lock().commands.clone()
    }
}

struct FakeVendor {
    script: ScriptHandle,
    credentials: Credentials,
}

impl VendorApi for FakeVendor {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    async fn authenticate(&mut self) -> Result<Credentials> {
        let reject = {
            let mut script = self.script.0.lock();
            script.log.push("auth".to_string());
            script.reject_auth
        };
        if reject {
            return Err(Error::Auth("rejected".to_string()));
        }
        self.credentials = Credentials::new("S1", Some("A1".to_string()));
        Ok(self.credentials.clone())
    }

    async fn fetch_device_status(&mut self) -> Result<DeviceReport> {
        let (delay, failure, report) = {
            let mut script = self.script.0.lock();
            script.log.push("fetch:start".to_string());
            let report = DeviceReport::new(script.device_id.clone(), script.status.clone());
            (script.delay, script.fetch_failure, report)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.script.0.lock().log.push("fetch:end".to_string());

        match failure {
            Some(Failure::Timeout) => Err(ProtocolError::Timeout(10_000).into()),
            Some(Failure::NoDevices) => Err(Error::NoDevices),
            None => Ok(report),
        }
    }

    async fn set_command(&mut self, device_id: &str, command: DeviceCommand) -> Result<()> {
        let mut script = self.script.0.lock();
        script.log.push(format!("set:{}", command.name()));
        if script.reject_commands {
            return Err(ProtocolError::Status {
                status: 500,
                body: "busy".to_string(),
            }
            .into());
        }
        script.commands.push((device_id.to_string(), command));
        Ok(())
    }
}

fn status(value: serde_json::Value) -> DeviceStatus {
    serde_json::from_value(value).unwrap()
}

fn config() -> HeaterConfig {
    HeaterConfig::new("Bedroom")
        .with_device_id("D1")
        .with_login("user@example.com", "secret")
        .with_pull_interval(Duration::from_secs(10))
}

fn heater_with(config: &HeaterConfig) -> (Heater<FakeVendor>, ScriptHandle) {
    let script = ScriptHandle::new();
    let vendor = FakeVendor {
        script: script.clone(),
        credentials: Credentials::default(),
    };
    (Heater::new(config, vendor).unwrap(), script)
}

fn heater() -> (Heater<FakeVendor>, ScriptHandle) {
    heater_with(&config())
}

fn assert_temp(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn start_authenticates_then_refreshes() {
        let (heater, script) = heater();
        heater.start().await;

        assert_eq!(script.log(), ["auth", "fetch:start", "fetch:end"]);
        let state = heater.state();
        assert!(state.is_active());
        assert_temp(state.current_temperature(), 21.5);
        assert_temp(state.target_temperature(), 22.0);
        assert_eq!(state.operating_state(), OperatingState::Idle);
        assert_eq!(heater.timer_state(), TimerState::Scheduled);

        heater.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn initial_state_before_first_refresh() {
        let config = config().with_temperature_range(12.0, 28.0);
        let (heater, _script) = heater_with(&config);

        let state = heater.state();
        assert!(!state.is_active());
        assert_temp(state.current_temperature(), 12.0);
        assert_temp(state.target_temperature(), 12.0);
        assert_eq!(state.operating_state(), OperatingState::Inactive);
        assert_eq!(heater.timer_state(), TimerState::Stopped);
        assert!(heater.last_refreshed().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn start_without_login_only_polls() {
        let config = HeaterConfig::new("Bedroom").with_device_id("D1");
        let (heater, script) = heater_with(&config);
        heater.start().await;

        assert!(script.log().is_empty());
        assert!(!heater.state().is_active());
        assert_eq!(heater.timer_state(), TimerState::Scheduled);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(script.fetches(), 1);

        heater.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_login_skips_first_refresh() {
        let (heater, script) = heater();
        script.edit(|s| s.reject_auth = true);
        heater.start().await;

        assert_eq!(script.log(), ["auth"]);
        assert_eq!(heater.timer_state(), TimerState::Scheduled);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(script.fetches(), 1);

        heater.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval() {
        let (heater, script) = heater();
        heater.start().await;

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(script.fetches(), 3);

        heater.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_keeps_one_poll_task() {
        let (heater, script) = heater();
        heater.start().await;
        heater.start().await;
        assert_eq!(script.fetches(), 2);

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(script.fetches(), 3);

        heater.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_polling() {
        let (heater, script) = heater();
        heater.start().await;
        heater.shutdown();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(script.fetches(), 1);
        assert_eq!(heater.timer_state(), TimerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_after_shutdown_do_not_rearm_the_timer() {
        let (heater, script) = heater();
        heater.start().await;
        heater.shutdown();

        heater.set_active(true).await.unwrap();
        heater.refresh().await.unwrap();
        let _ = heater.current_temperature();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(heater.timer_state(), TimerState::Stopped);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(script.fetches(), 3);
        assert_eq!(heater.timer_state(), TimerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_heater_stops_polling() {
        let (heater, script) = heater();
        heater.start().await;
        drop(heater);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(script.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn services_describe_accessory() {
        let config = config().with_model("Tesy", "CN 052");
        let (heater, script) = heater_with(&config);

        let services = heater.services();
        assert_eq!(services.len(), 2);
        let Service::AccessoryInformation(info) = &services[0] else {
            panic!("expected accessory information first");
        };
        assert_eq!(info.manufacturer, "Tesy");
        assert_eq!(info.model, "CN 052");
        assert_eq!(info.serial_number, "D1");
        assert_eq!(services[1], Service::heater_cooler("Bedroom", heater.temperature_range()));

        heater.identify();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(script.fetches(), 1, "services queue a refresh");
    }
}

// ============================================================================
// Refresh
// ============================================================================

mod refresh {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn repeated_status_yields_no_changes() {
        let (heater, _script) = heater();

        let first = heater.refresh().await.unwrap();
        assert_eq!(first.len(), 4);
        let second = heater.refresh().await.unwrap();
        assert!(second.is_empty());
        assert!(heater.last_refreshed().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_forces_inactive_and_keeps_temperatures() {
        let (heater, script) = heater();
        heater.start().await;

        script.edit(|s| s.fetch_failure = Some(Failure::Timeout));
        let err = heater.refresh().await.unwrap_err();
        assert!(err.is_timeout());

        let state = heater.state();
        assert!(!state.is_active());
        assert_temp(state.current_temperature(), 21.5);
        assert_temp(state.target_temperature(), 22.0);
        assert_eq!(heater.timer_state(), TimerState::Scheduled);

        heater.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_before_start_leaves_timer_stopped() {
        let (heater, script) = heater();
        heater.refresh().await.unwrap();
        assert_eq!(heater.timer_state(), TimerState::Stopped);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(script.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_device_map_forces_inactive() {
        let (heater, script) = heater();
        heater.refresh().await.unwrap();

        script.edit(|s| s.fetch_failure = Some(Failure::NoDevices));
        let err = heater.refresh().await.unwrap_err();
        assert!(matches!(err, Error::NoDevices));
        assert!(!heater.state().is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_reading_is_ignored() {
        let (heater, script) = heater();
        heater.refresh().await.unwrap();

        script.edit(|s| {
            s.status = status(json!({"gradus": "45", "ref_gradus": "5", "power_sw": "on"}));
        });
        heater.refresh().await.unwrap();

        let state = heater.state();
        assert_temp(state.current_temperature(), 21.5);
        assert_temp(state.target_temperature(), 22.0);
        assert_eq!(state.operating_state(), OperatingState::Inactive);
    }

    #[tokio::test(start_paused = true)]
    async fn changes_are_published() {
        let (heater, _script) = heater();
        let mut changes = heater.subscribe_changes();
        let mut state_rx = heater.subscribe();

        heater.refresh().await.unwrap();

        assert!(state_rx.has_changed().unwrap());
        assert!(state_rx.borrow_and_update().is_active());
        assert_eq!(
            changes.recv().await.unwrap(),
            StateChange::CurrentTemperature { from: 10.0, to: 21.5 }
        );
        assert_eq!(
            changes.recv().await.unwrap(),
            StateChange::TargetTemperature { from: 10.0, to: 22.0 }
        );
        assert_eq!(
            changes.recv().await.unwrap(),
            StateChange::Active { from: false, to: true }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reads_queue_one_background_refresh() {
        let (heater, script) = heater();
        script.edit(|s| s.delay = Duration::from_secs(1));

        assert!(!heater.active());
        assert_temp(heater.current_temperature(), 10.0);
        assert_temp(heater.target_temperature(), 10.0);
        assert_eq!(heater.operating_state(), OperatingState::Inactive);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(script.fetches(), 1);
        assert!(heater.state().is_active());

        assert!(heater.active());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(script.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn plain_accessors_do_not_refresh() {
        let (heater, script) = heater();

        assert_eq!(heater.name(), "Bedroom");
        let _ = heater.state();
        let _ = heater.target_heating_mode();
        let _ = heater.last_refreshed();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(script.fetches(), 0);
    }

    #[test]
    fn reads_outside_runtime_do_not_panic() {
        let (heater, script) = heater();
        assert!(!heater.active());
        assert_eq!(script.fetches(), 0);
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn set_active_applies_optimistically() {
        let (heater, script) = heater();

        assert_eq!(heater.set_active(true).await.unwrap(), PowerSwitch::On);
        assert!(heater.state().is_active());
        assert_eq!(
            script.commands(),
            [("D1".to_string(), DeviceCommand::Power(PowerSwitch::On))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn numeric_power_values() {
        let (heater, script) = heater();

        assert_eq!(heater.set_active(0_u8).await.unwrap(), PowerSwitch::Off);
        assert_eq!(heater.set_active(5_u8).await.unwrap(), PowerSwitch::On);

        let sent: Vec<_> = script.commands().into_iter().map(|(_, c)| c).collect();
        assert_eq!(
            sent,
            [
                DeviceCommand::Power(PowerSwitch::Off),
                DeviceCommand::Power(PowerSwitch::On)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn target_temperature_is_clamped() {
        let (heater, script) = heater();

        assert_temp(heater.set_target_temperature(35.0).await.unwrap(), 30.0);
        assert_temp(heater.set_target_temperature(4.0).await.unwrap(), 10.0);
        assert_temp(heater.set_target_temperature(21.5).await.unwrap(), 21.5);

        let sent: Vec<_> = script.commands().into_iter().map(|(_, c)| c).collect();
        assert_eq!(
            sent,
            [
                DeviceCommand::TargetTemperature(30.0),
                DeviceCommand::TargetTemperature(10.0),
                DeviceCommand::TargetTemperature(21.5)
            ]
        );
        assert_temp(heater.state().target_temperature(), 21.5);
    }

    #[tokio::test(start_paused = true)]
    async fn non_finite_target_is_rejected() {
        let (heater, script) = heater();

        let err = heater.set_target_temperature(f64::NAN).await.unwrap_err();
        assert!(matches!(err, Error::Value(_)));
        assert!(script.commands().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_command_leaves_state_unchanged() {
        let (heater, script) = heater();
        heater.start().await;
        script.edit(|s| s.reject_commands = true);
        let mut changes = heater.subscribe_changes();
        let before = heater.state();

        assert!(heater.set_active(true).await.is_err());
        assert!(heater.set_target_temperature(25.0).await.is_err());

        assert_eq!(heater.state(), before);
        assert!(changes.try_recv().is_err());
        assert_eq!(heater.timer_state(), TimerState::Scheduled);

        heater.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn next_poll_reconciles_optimistic_update() {
        let (heater, script) = heater();
        heater.refresh().await.unwrap();

        heater.set_active(false).await.unwrap();
        heater.set_target_temperature(25.0).await.unwrap();
        assert!(!heater.state().is_active());
        assert_temp(heater.state().target_temperature(), 25.0);

        // The vendor still reports the old values
        let changes = heater.refresh().await.unwrap();
        assert_eq!(changes.len(), 2);
        assert!(heater.state().is_active());
        assert_temp(heater.state().target_temperature(), 22.0);

        assert_eq!(script.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn command_waits_for_refresh_in_flight() {
        let (heater, script) = heater();
        script.edit(|s| s.delay = Duration::from_secs(1));

        let refresher = heater.clone();
        let refresh = tokio::spawn(async move { refresher.refresh().await });
        tokio::task::yield_now().await;

        heater.set_active(false).await.unwrap();
        refresh.await.unwrap().unwrap();

        assert_eq!(script.log(), ["fetch:start", "fetch:end", "set:power_sw"]);
        assert!(!heater.state().is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_never_overlaps_command() {
        let (heater, script) = heater();
        heater.start().await;
        script.edit(|s| s.delay = Duration::from_secs(3));

        tokio::time::sleep(Duration::from_secs(9)).await;
        heater.set_active(false).await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        let log = script.log();
        let mut open_fetch = false;
        for entry in &log {
            match entry.as_str() {
                "fetch:start" => {
                    assert!(!open_fetch, "overlapping fetches: {log:?}");
                    open_fetch = true;
                }
                "fetch:end" => open_fetch = false,
                "set:power_sw" => assert!(!open_fetch, "command during fetch: {log:?}"),
                _ => {}
            }
        }

        heater.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn reported_device_id_is_adopted() {
        let config = HeaterConfig::new("Bedroom").with_login("user@example.com", "secret");
        let (heater, script) = heater_with(&config);
        assert_eq!(heater.device_id(), None);

        let err = heater.set_active(true).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        script.edit(|s| s.device_id = "D7".to_string());
        heater.refresh().await.unwrap();
        assert_eq!(heater.device_id().as_deref(), Some("D7"));

        heater.set_active(true).await.unwrap();
        assert_eq!(script.commands()[0].0, "D7");
    }

    #[tokio::test(start_paused = true)]
    async fn configured_device_id_wins() {
        let (heater, script) = heater();
        script.edit(|s| s.device_id = "OTHER".to_string());

        heater.refresh().await.unwrap();
        heater.set_active(true).await.unwrap();

        assert_eq!(heater.device_id().as_deref(), Some("D1"));
        assert_eq!(script.commands()[0].0, "D1");
    }
}
