//! Caller-side busy flag for the scan loop.
//!
//! The engine assumes one scan in flight at a time. The front end enforces
//! that with a gate: a scan may begin only while no result is on screen, and a
//! shown result releases the gate after the display timeout or on dismissal.

use std::fmt;
use std::time::{Duration, Instant};

use crate::config::ScanConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateBusy {
    /// Time left until the gate reopens; `None` while a scan is in flight.
    pub remaining: Option<Duration>,
}

impl fmt::Display for GateBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.remaining {
            Some(d) => write!(f, "scanner busy, result shown for another {} ms", d.as_millis()),
            None => write!(f, "scanner busy, a scan is being processed"),
        }
    }
}

impl std::error::Error for GateBusy {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Processing,
    Showing { until: Instant },
}

#[derive(Debug, Clone)]
pub struct ScanGate {
    display_timeout: Duration,
    state: State,
}

impl ScanGate {
    pub fn new(display_timeout: Duration) -> Self {
        Self { display_timeout, state: State::Idle }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.gate.display_timeout())
    }

    pub fn is_open(&self, now: Instant) -> bool {
        self.busy(now).is_none()
    }

    /// Claim the gate for one scan.
    pub fn try_begin(&mut self, now: Instant) -> Result<(), GateBusy> {
        if let Some(busy) = self.busy(now) {
            return Err(busy);
        }
        self.state = State::Processing;
        Ok(())
    }

    /// The scan is done and its result is on screen.
    pub fn finish(&mut self, now: Instant) {
        self.state = State::Showing { until: now + self.display_timeout };
    }

    /// The operator closed the result early.
    pub fn dismiss(&mut self) {
        self.state = State::Idle;
    }

    fn busy(&self, now: Instant) -> Option<GateBusy> {
        match self.state {
            State::Idle => None,
            State::Processing => Some(GateBusy { remaining: None }),
            State::Showing { until } if now < until => Some(GateBusy {
                remaining: Some(until - now),
            }),
            State::Showing { .. } => None,
        }
    }
}
