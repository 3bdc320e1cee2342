// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic status polling.
//!
//! A [`PollTimer`] is a restartable one-shot timer: once started it fires
//! after its interval, and each firing runs one poll cycle that re-arms it
//! when finished. Any operation that talks to the vendor pauses the timer
//! with [`PollTimer::pause`] so a poll never overlaps it, and the countdown
//! starts over when the operation ends.
//!
//! The timer's state lives in a [`tokio::sync::watch`] channel. The loop
//! started by [`spawn_poll_loop`] watches that channel and holds only a weak
//! reference to its target, so it ends by itself once the target is dropped.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// State of a [`PollTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    /// Not armed. No poll will happen until the timer is started.
    #[default]
    Stopped,
    /// Armed. A poll cycle runs when the interval elapses.
    Scheduled,
    /// A poll cycle is in progress.
    Running,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stopped => "stopped",
            Self::Scheduled => "scheduled",
            Self::Running => "running",
        };
        f.write_str(s)
    }
}

/// Restartable poll timer.
///
/// [`start`](Self::start) and [`stop`](Self::stop) enable and disable
/// polling. A pause only suspends an enabled timer, so a timer that was
/// stopped stays stopped when the pause ends.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tesy_heater::poll::{PollTimer, TimerState};
///
/// let timer = PollTimer::new(Duration::from_secs(10));
/// assert_eq!(timer.state(), TimerState::Stopped);
///
/// timer.start();
/// {
///     let _pause = timer.pause();
///     assert_eq!(timer.state(), TimerState::Stopped);
/// }
/// assert_eq!(timer.state(), TimerState::Scheduled);
///
/// timer.stop();
/// drop(timer.pause());
/// assert_eq!(timer.state(), TimerState::Stopped);
/// ```
#[derive(Debug)]
pub struct PollTimer {
    interval: Duration,
    enabled: AtomicBool,
    state: watch::Sender<TimerState>,
}

impl PollTimer {
    /// Creates a stopped timer firing `interval` after each (re)start.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let (state, _) = watch::channel(TimerState::Stopped);
        Self {
            interval,
            enabled: AtomicBool::new(false),
            state,
        }
    }

    /// Returns the poll interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TimerState {
        *self.state.borrow()
    }

    /// Enables polling and arms a stopped timer.
    ///
    /// Returns `false` if the timer was already scheduled or a cycle is
    /// running, in which case the state does not change.
    pub fn start(&self) -> bool {
        self.enabled.store(true, Ordering::SeqCst);
        self.arm()
    }

    /// Disables polling and disarms the timer. Returns `false` if it was
    /// already stopped.
    pub fn stop(&self) -> bool {
        self.enabled.store(false, Ordering::SeqCst);
        self.disarm()
    }

    /// Returns `true` between [`start`](Self::start) and
    /// [`stop`](Self::stop), including while paused.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Stops the timer until the returned guard is dropped.
    ///
    /// Dropping the guard re-arms the timer with a full interval, unless
    /// polling was disabled in the meantime or never enabled.
    #[must_use = "the timer restarts as soon as the guard is dropped"]
    pub fn pause(&self) -> PauseGuard<'_> {
        self.disarm();
        PauseGuard { timer: self }
    }

    fn arm(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == TimerState::Stopped {
                *state = TimerState::Scheduled;
                true
            } else {
                false
            }
        })
    }

    fn disarm(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == TimerState::Stopped {
                false
            } else {
                *state = TimerState::Stopped;
                true
            }
        })
    }

    /// Marks a scheduled timer as running a cycle.
    ///
    /// Returns `None` if the timer is not scheduled. Dropping the returned
    /// guard re-arms the timer if it is still running; a timer stopped during
    /// the cycle stays stopped.
    pub fn begin_cycle(&self) -> Option<CycleGuard<'_>> {
        let began = self.state.send_if_modified(|state| {
            if *state == TimerState::Scheduled {
                *state = TimerState::Running;
                true
            } else {
                false
            }
        });
        began.then_some(CycleGuard { timer: self })
    }

    /// Subscribes to state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state.subscribe()
    }

    fn finish_cycle(&self) {
        self.state.send_if_modified(|state| {
            if *state == TimerState::Running {
                *state = TimerState::Scheduled;
                true
            } else {
                false
            }
        });
    }
}

/// Keeps a [`PollTimer`] stopped while alive.
#[derive(Debug)]
pub struct PauseGuard<'a> {
    timer: &'a PollTimer,
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        if self.timer.is_enabled() {
            self.timer.arm();
        }
    }
}

/// Marks a poll cycle in progress.
#[derive(Debug)]
pub struct CycleGuard<'a> {
    timer: &'a PollTimer,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.timer.finish_cycle();
    }
}

/// Something that can be polled by [`spawn_poll_loop`].
pub trait PollTarget: Send + Sync + 'static {
    /// Returns the timer driving this target.
    fn timer(&self) -> &PollTimer;

    /// Runs one poll cycle. Failures are handled by the target.
    fn poll_cycle(&self) -> impl Future<Output = ()> + Send;
}

/// Spawns the poll loop for `target` on the current tokio runtime.
///
/// The loop waits until the timer is scheduled, sleeps for the interval and
/// runs one cycle. A state change during the sleep restarts the wait. The
/// loop exits once `target` has been dropped.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn spawn_poll_loop<T: PollTarget>(target: &Arc<T>) -> JoinHandle<()> {
    let timer = target.timer();
    let interval = timer.interval();
    let rx = timer.subscribe();
    let weak = Arc::downgrade(target);

    tokio::spawn(poll_loop(weak, interval, rx))
}

async fn poll_loop<T: PollTarget>(
    weak: Weak<T>,
    interval: Duration,
    mut rx: watch::Receiver<TimerState>,
) {
    tracing::debug!(?interval, "Poll loop started");

    loop {
        if rx.wait_for(|state| *state == TimerState::Scheduled).await.is_err() {
            break;
        }

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        let Some(target) = weak.upgrade() else {
            break;
        };
        let Some(_cycle) = target.timer().begin_cycle() else {
            continue;
        };
        target.poll_cycle().await;
    }

    tracing::debug!("Poll loop stopped");
}
