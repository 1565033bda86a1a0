use std::sync::atomic::Ordering;
use std::sync::Arc;

use airlock_core::{Input, SecurityAirlock};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use tracing::{info, warn};

use crate::config::RunnerConfig;
use crate::error::{AirlockError, Result};
use crate::heartbeat::{self, HeartbeatLine};
use crate::reset::{self, ResetLine};
use crate::telemetry::Metrics;

/// Drives `SecurityAirlock::step` over a real ingress/egress TCP pair.
///
/// Frame boundaries over the stream are established with a
/// length-delimited adapter; this is purely a transport-layer stand-in
/// for the PHY/MAC's notion of frame start/end and carries no policy
/// weight of its own (see the transport runner notes for why).
pub struct AirlockRunner {
    config: Arc<RunnerConfig>,
    metrics: Arc<Metrics>,
    locked_flag: Arc<std::sync::atomic::AtomicBool>,
}

/// Per-connection bookkeeping threaded through both the frame arm and
/// the idle-tick arm of the drive loop's `select!`.
struct ConnState {
    prev_locked: bool,
    prev_volume: i64,
    prev_arp: i64,
    seen_violations: airlock_core::ViolationLatches,
}

impl AirlockRunner {
    pub fn new(
        config: Arc<RunnerConfig>,
        metrics: Arc<Metrics>,
        locked_flag: Arc<std::sync::atomic::AtomicBool>,
    ) -> Self {
        Self {
            config,
            metrics,
            locked_flag,
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let heartbeat_line = HeartbeatLine::default();
        let reset_line = ResetLine::default();

        if let Some(addr) = self.config.heartbeat_listen {
            let line = heartbeat_line.clone();
            tokio::spawn(async move {
                if let Err(e) = heartbeat::run(addr, line).await {
                    warn!(error = %e, "heartbeat listener exited");
                }
            });
        }
        if let Some(addr) = self.config.reset_listen {
            let line = reset_line.clone();
            tokio::spawn(async move {
                if let Err(e) = reset::run(addr, line).await {
                    warn!(error = %e, "reset listener exited");
                }
            });
        }

        let listener = TcpListener::bind(self.config.ingress_listen)
            .await
            .map_err(AirlockError::Io)?;
        info!(addr = ?self.config.ingress_listen, "ingress listener bound");

        loop {
            let accept_fut = listener.accept();
            let (ingress, peer) = tokio::select! {
                res = accept_fut => res.map_err(AirlockError::Io)?,
                res = shutdown.changed() => {
                    if res.is_ok() {
                        info!("shutdown signal received, stopping accept loop");
                        return Ok(());
                    }
                    continue;
                }
            };
            info!(%peer, "ingress connection accepted");

            let egress = TcpStream::connect(self.config.egress_connect)
                .await
                .map_err(AirlockError::Io)?;
            info!(addr = ?self.config.egress_connect, "egress connection established");

            if let Err(e) = self
                .drive_connection(ingress, egress, heartbeat_line.clone(), reset_line.clone(), peer)
                .await
            {
                warn!(%peer, error = %e, "connection ended with error");
            }
        }
    }

    async fn drive_connection(
        &self,
        ingress: TcpStream,
        egress: TcpStream,
        heartbeat_line: HeartbeatLine,
        reset_line: ResetLine,
        peer: std::net::SocketAddr,
    ) -> Result<()> {
        let mut reader = FramedRead::new(ingress, LengthDelimitedCodec::new());
        let mut writer = FramedWrite::new(egress, LengthDelimitedCodec::new());

        let mut core = SecurityAirlock::new(self.config.limits.clone());
        let egress_mode = self.config.egress_mode;

        // UpDownCounters track absolute gauges; these locals let us emit
        // the delta against what we last reported instead of the raw
        // level every time.
        let mut state = ConnState {
            prev_locked: false,
            prev_volume: 0,
            prev_arp: 0,
            seen_violations: airlock_core::ViolationLatches::default(),
        };

        // The core advances one logical cycle per tick regardless of
        // whether a byte is waiting; without this, an idle ingress
        // stream would never step the watchdog or the leaky buckets.
        let period = std::time::Duration::from_micros(self.config.cycle_period_micros.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                frame = reader.next() => {
                    let Some(frame) = frame else { break; };
                    let frame = frame.map_err(AirlockError::Io)?;
                    self.metrics.frames_total.add(1, &[]);

                    let mut out = Vec::with_capacity(frame.len());
                    let last = frame.len().saturating_sub(1);
                    for (i, byte) in frame.iter().enumerate() {
                        let output = core.step(Input {
                            rx_data: Some(*byte),
                            rx_last: i == last,
                            heartbeat_in: heartbeat_line.sample(),
                            rst_lock: reset_line.take(),
                            egress_mode,
                            ingress: true,
                            tx_ready: true,
                        });
                        if let Some((data, _tx_last)) = output.tx {
                            out.push(data);
                            self.metrics.bytes_forwarded_total.add(1, &[]);
                        }
                        self.note_lock_transition(&core, &mut state.prev_locked, peer, Some(i));
                    }

                    self.report_violations(&core, &mut state.seen_violations, peer);
                    self.report_gauges(&core, &mut state.prev_volume, &mut state.prev_arp);

                    if out.len() < frame.len() {
                        self.metrics.frames_dropped_total.add(1, &[]);
                        warn!(%peer, kept = out.len(), total = frame.len(), "frame partially dropped");
                    }
                    if !out.is_empty() {
                        writer.send(out.into()).await.map_err(AirlockError::Io)?;
                    }
                }
                _ = ticker.tick() => {
                    let output = core.step(Input {
                        rx_data: None,
                        rx_last: false,
                        heartbeat_in: heartbeat_line.sample(),
                        rst_lock: reset_line.take(),
                        egress_mode,
                        ingress: true,
                        tx_ready: true,
                    });
                    self.note_lock_transition(&core, &mut state.prev_locked, peer, None);
                    self.report_violations(&core, &mut state.seen_violations, peer);
                    self.report_gauges(&core, &mut state.prev_volume, &mut state.prev_arp);
                    if let Some((data, _tx_last)) = output.tx {
                        writer.send(vec![data].into()).await.map_err(AirlockError::Io)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn note_lock_transition(
        &self,
        core: &SecurityAirlock,
        prev_locked: &mut bool,
        peer: std::net::SocketAddr,
        byte_offset: Option<usize>,
    ) {
        let now_locked = core.locked();
        if now_locked != *prev_locked {
            self.metrics.locked.add(if now_locked { 1 } else { -1 }, &[]);
            if now_locked {
                warn!(%peer, ?byte_offset, "airlock locked");
            } else {
                info!(%peer, "airlock unlocked");
            }
            *prev_locked = now_locked;
        }
        self.locked_flag.store(now_locked, Ordering::Relaxed);
    }

    fn report_gauges(&self, core: &SecurityAirlock, prev_volume: &mut i64, prev_arp: &mut i64) {
        let volume_now = core.volume_count() as i64;
        self.metrics.volume_count.add(volume_now - *prev_volume, &[]);
        *prev_volume = volume_now;

        let arp_now = core.arp_bucket_level() as i64;
        self.metrics.arp_bucket_level.add(arp_now - *prev_arp, &[]);
        *prev_arp = arp_now;
    }

    /// Report every violation that became newly latched this frame,
    /// tracking `seen` across frames so a sticky latch isn't re-counted
    /// on every subsequent byte while it remains set.
    fn report_violations(
        &self,
        core: &SecurityAirlock,
        seen: &mut airlock_core::ViolationLatches,
        peer: std::net::SocketAddr,
    ) {
        use airlock_core::ViolationKind;
        let latches = core.violation_latches();
        for kind in ViolationKind::ALL {
            let (hit, already_seen) = match kind {
                ViolationKind::Volume => (latches.volume, seen.volume),
                ViolationKind::Ttl => (latches.ttl, seen.ttl),
                ViolationKind::WgSize => (latches.wg_size, seen.wg_size),
                ViolationKind::Plaintext => (latches.plaintext, seen.plaintext),
                ViolationKind::Heartbeat => (core.violation_heartbeat(), false),
                ViolationKind::Ethertype => (latches.ethertype, seen.ethertype),
                ViolationKind::ArpRate => (latches.arp_rate, seen.arp_rate),
                ViolationKind::IpProto => (latches.ip_proto, seen.ip_proto),
                ViolationKind::ArpSize => (latches.arp_size, seen.arp_size),
                ViolationKind::Frag => (latches.frag, seen.frag),
                ViolationKind::IpOptions => (latches.ip_options, seen.ip_options),
                ViolationKind::ArpOpcode => (latches.arp_opcode, seen.arp_opcode),
                ViolationKind::Land => (latches.land, seen.land),
                ViolationKind::Loopback => (latches.loopback, seen.loopback),
                ViolationKind::TcpFlags => (latches.tcp_flags, seen.tcp_flags),
                ViolationKind::TcpOptions => (latches.tcp_options, seen.tcp_options),
                ViolationKind::UdpLen => (latches.udp_len, seen.udp_len),
            };
            if hit && !already_seen {
                self.metrics.record_violation(kind.as_str());
                warn!(%peer, rule = kind.as_str(), "policy violation latched");
            }
        }
        *seen = latches;
    }
}
