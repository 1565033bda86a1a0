//! The aggregate driver: wires the per-byte parser, the policy rule
//! table, the two rate limiters, the watchdog, the lock decision and
//! the egress gate into a single `step` function.

use crate::arp_bucket::ArpLeakyBucket;
use crate::config::AirlockLimits;
use crate::gate::{self, GateInputs};
use crate::lock::{self, LockInputs};
use crate::parser::ParserState;
use crate::policy::{self, PolicyInputs};
use crate::resync::{FlushOutcome, ResyncController};
use crate::stream::{Input, Output};
use crate::violation::ViolationLatches;
use crate::volume::VolumeCounter;
use crate::watchdog::HeartbeatWatchdog;

/// The complete streaming filter. Single owner of all state, driven one
/// cycle at a time by [`SecurityAirlock::step`].
#[derive(Debug, Clone)]
pub struct SecurityAirlock {
    limits: AirlockLimits,
    parser: ParserState,
    latches: ViolationLatches,
    locked: bool,
    drop_current: bool,
    watchdog: HeartbeatWatchdog,
    arp_bucket: ArpLeakyBucket,
    volume: VolumeCounter,
    resync: ResyncController,
}

impl SecurityAirlock {
    pub fn new(limits: AirlockLimits) -> Self {
        SecurityAirlock {
            watchdog: HeartbeatWatchdog::new(limits.heartbeat_timeout_cycles),
            arp_bucket: ArpLeakyBucket::new(limits.arp_burst_limit, limits.arp_leak_interval_cycles),
            volume: VolumeCounter::new(limits.volume_limit_bytes),
            limits,
            parser: ParserState::default(),
            latches: ViolationLatches::default(),
            locked: false,
            drop_current: false,
            resync: ResyncController::default(),
        }
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn violation_latches(&self) -> ViolationLatches {
        self.latches
    }

    pub fn violation_heartbeat(&self) -> bool {
        self.watchdog.fired()
    }

    pub fn volume_count(&self) -> u32 {
        self.volume.count()
    }

    pub fn arp_bucket_level(&self) -> u16 {
        self.arp_bucket.bucket()
    }

    fn rst_lock_cycle(&mut self, input: &Input) -> Output {
        self.locked = false;
        self.drop_current = false;
        self.latches.clear_all();
        self.watchdog.reset();
        self.arp_bucket.reset();
        self.volume.reset();
        self.parser = ParserState::default();
        self.resync.arm();

        let rx_valid = input.rx_valid();
        let gate = gate::compute(&GateInputs {
            rx_data: input.rx_data.unwrap_or(0),
            rx_valid,
            rx_last: input.rx_last,
            tx_ready: input.tx_ready,
            locked: false,
            drop_current: false,
            rst_lock: true,
            flush_state: true,
            traffic_violation: false,
            violation_heartbeat: false,
            violation_now: false,
        });
        Output {
            tx: gate.tx_valid.then_some((gate.tx_data, gate.tx_last)),
            rx_ready: gate.rx_ready,
            status_led: true,
        }
    }

    fn flush_cycle(&mut self, input: &Input) -> Output {
        let rx_valid = input.rx_valid();
        if let FlushOutcome::Discarding { frame_boundary } =
            self.resync.step(rx_valid, input.rx_last)
        {
            if !self.locked {
                self.volume.increment();
            }
            if frame_boundary {
                self.parser = ParserState::default();
                self.latches.clear_per_frame();
            }
        }

        // Leak timer advances every cycle regardless of flush state; no
        // byte is classified as ARP while discarding, so it never adds
        // tokens to the bucket here.
        self.arp_bucket.step(false);

        let violation_heartbeat = self.watchdog.fired();
        let lock_out = lock::decide(
            self.locked,
            self.drop_current,
            &LockInputs {
                rst_lock: false,
                violation_heartbeat,
                any_violation: false,
                egress_mode: input.egress_mode,
                rx_last: input.rx_last,
                byte_ptr: self.parser.byte_ptr,
            },
        );
        self.locked = lock_out.locked;
        self.drop_current = if input.rx_last {
            false
        } else {
            lock_out.drop_current
        };

        let gate = gate::compute(&GateInputs {
            rx_data: input.rx_data.unwrap_or(0),
            rx_valid,
            rx_last: input.rx_last,
            tx_ready: input.tx_ready,
            locked: self.locked,
            drop_current: self.drop_current,
            rst_lock: false,
            flush_state: true,
            traffic_violation: false,
            violation_heartbeat,
            violation_now: false,
        });
        Output {
            tx: gate.tx_valid.then_some((gate.tx_data, gate.tx_last)),
            rx_ready: gate.rx_ready,
            status_led: !self.locked,
        }
    }

    /// Run one cycle of the filter. `prev_state` is implicit (`self`);
    /// this function is pure given `(self, input)`.
    pub fn step(&mut self, input: Input) -> Output {
        self.watchdog.step(input.heartbeat_in);

        if input.rst_lock {
            return self.rst_lock_cycle(&input);
        }

        if self.resync.is_flushing() {
            return self.flush_cycle(&input);
        }

        let rx_valid = input.rx_valid();
        let rx_data = input.rx_data.unwrap_or(0);

        let arp_byte_fired = rx_valid && self.parser.is_arp;

        let violation_now = if rx_valid {
            policy::evaluate(&PolicyInputs {
                parser: &self.parser,
                rx_data,
                rx_last: input.rx_last,
                volume_at_or_over_limit: self.volume.at_or_over_limit(),
                arp_bucket_at_or_over_limit: self.arp_bucket.at_or_over_limit(),
                plaintext_threshold: self.limits.plaintext_threshold,
            })
        } else {
            Default::default()
        };

        let traffic_violation = self.latches.any();
        let any_violation = traffic_violation || violation_now.any();
        let violation_heartbeat = self.watchdog.fired();

        let lock_out = lock::decide(
            self.locked,
            self.drop_current,
            &LockInputs {
                rst_lock: false,
                violation_heartbeat,
                any_violation,
                egress_mode: input.egress_mode,
                rx_last: input.rx_last,
                byte_ptr: self.parser.byte_ptr,
            },
        );

        let gate = gate::compute(&GateInputs {
            rx_data,
            rx_valid,
            rx_last: input.rx_last,
            tx_ready: input.tx_ready,
            locked: lock_out.locked,
            drop_current: lock_out.drop_current,
            rst_lock: false,
            flush_state: false,
            traffic_violation,
            violation_heartbeat,
            violation_now: violation_now.any(),
        });

        self.locked = lock_out.locked;
        self.drop_current = if input.rx_last {
            false
        } else {
            lock_out.drop_current
        };

        // Fold this cycle's violation_now into the sticky per-rule
        // latches (visible to traffic_violation on the NEXT byte).
        self.latches.merge(&violation_now.0);

        // ArpLeakyBucket/VolumeCounter run every cycle independent of
        // this byte's policy outcome.
        self.arp_bucket.step(arp_byte_fired);
        if rx_valid && !self.locked {
            self.volume.increment();
        }

        // Parser register updates: capture this byte's fields, then
        // either advance the pointer or reset at frame end.
        if rx_valid {
            self.parser.capture(rx_data);
            if input.rx_last {
                self.parser.reset_frame();
                self.latches.clear_per_frame();
            } else {
                self.parser.advance();
            }
        }

        Output {
            tx: gate.tx_valid.then_some((gate.tx_data, gate.tx_last)),
            rx_ready: gate.rx_ready,
            status_led: !self.locked,
        }
    }
}
