//! Fixed-rate throttle on top of a host's per-refresh callback.
//!
//! The host fires at its display rate. The scheduler accepts at most one
//! pipeline pass per `min_interval` and always re-requests the next
//! callback, so skipped frames never stall the loop.

use std::thread;
use std::time::{Duration, Instant};

/// One callback per display refresh, supplied by the host
pub trait FrameScheduler {
    /// Ask for a callback on the next refresh. Repeated requests coalesce.
    fn request_callback(&mut self);

    /// Drop any pending callback
    fn cancel(&mut self);

    fn is_pending(&self) -> bool;
}

/// What happened on one host callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A pipeline pass ran
    Ran,
    /// Too soon after the last accepted tick; rescheduled only
    Skipped,
    /// The scheduler is stopped; nothing ran and nothing was rescheduled
    Stopped,
}

pub struct AnimationScheduler<H> {
    host: H,
    min_interval: Duration,
    last_accepted: Option<Duration>,
    running: bool,
    ticks: u64,
}

impl<H: FrameScheduler> AnimationScheduler<H> {
    pub fn new(host: H, min_interval: Duration) -> Self {
        Self {
            host,
            min_interval,
            last_accepted: None,
            running: false,
            ticks: 0,
        }
    }

    /// Install the callback loop. No-op while already running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.host.request_callback();
    }

    /// Cancel the pending callback. No-op while already stopped.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.host.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Host callback body: run `pass` if the interval has elapsed, then reschedule
    pub fn on_frame(&mut self, now: Duration, pass: impl FnOnce(Duration)) -> TickOutcome {
        if !self.running {
            return TickOutcome::Stopped;
        }

        if let Some(last) = self.last_accepted {
            if now.saturating_sub(last) < self.min_interval {
                self.host.request_callback();
                return TickOutcome::Skipped;
            }
        }

        self.last_accepted = Some(now);
        self.ticks += 1;
        pass(now);
        self.host.request_callback();
        TickOutcome::Ran
    }

    /// Accepted ticks since construction
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn last_accepted(&self) -> Option<Duration> {
        self.last_accepted
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

/// Thread-sleep host emulating a fixed display refresh for terminal use
#[derive(Debug)]
pub struct SleepFrameHost {
    refresh: Duration,
    pending: bool,
    next_frame: Instant,
}

impl SleepFrameHost {
    pub fn new(refresh: Duration) -> Self {
        Self {
            refresh,
            pending: false,
            next_frame: Instant::now(),
        }
    }

    /// ~60 Hz
    pub fn display_rate() -> Self {
        Self::new(Duration::from_micros(16_667))
    }

    /// Sleep until the next refresh and consume the pending callback.
    ///
    /// Returns `false` immediately when nothing is pending.
    pub fn wait_for_frame(&mut self) -> bool {
        if !self.pending {
            return false;
        }

        let now = Instant::now();
        if self.next_frame > now {
            thread::sleep(self.next_frame - now);
        }
        // Late frames don't queue up a burst of catch-up refreshes
        self.next_frame = self.next_frame.max(now) + self.refresh;
        self.pending = false;
        true
    }
}

impl FrameScheduler for SleepFrameHost {
    fn request_callback(&mut self) {
        self.pending = true;
    }

    fn cancel(&mut self) {
        self.pending = false;
    }

    fn is_pending(&self) -> bool {
        self.pending
    }
}
