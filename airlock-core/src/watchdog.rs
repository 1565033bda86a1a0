//! Edge-detecting heartbeat watchdog, independent of the per-byte
//! packet pipeline.

/// Countdown timer armed by heartbeat edges; once it reaches zero the
/// watchdog latches `violation_heartbeat` until `rst_lock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatWatchdog {
    timeout: u32,
    timer: u32,
    last_heartbeat: bool,
    fired: bool,
}

impl HeartbeatWatchdog {
    pub fn new(timeout: u32) -> Self {
        HeartbeatWatchdog {
            timeout,
            timer: timeout,
            last_heartbeat: false,
            fired: false,
        }
    }

    pub fn fired(&self) -> bool {
        self.fired
    }

    /// Run one cycle: edge-detect `heartbeat_in`, reload or decrement
    /// the timer, latch on expiry.
    pub fn step(&mut self, heartbeat_in: bool) {
        if heartbeat_in != self.last_heartbeat {
            self.timer = self.timeout;
        } else if self.timer > 0 {
            self.timer -= 1;
        }
        self.last_heartbeat = heartbeat_in;
        if self.timer == 0 {
            self.fired = true;
        }
    }

    pub fn reset(&mut self) {
        self.timer = self.timeout;
        self.fired = false;
    }
}
