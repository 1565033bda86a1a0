//! The ready/valid/last byte-stream handshake contract (C1).

/// One cycle's worth of sampled inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Input {
    /// `Some(data)` when `rx_valid` is asserted this cycle.
    pub rx_data: Option<u8>,
    /// High on the final byte of a frame; must be false whenever
    /// `rx_data` is `None`.
    pub rx_last: bool,
    pub heartbeat_in: bool,
    pub rst_lock: bool,
    /// `false` = ingress/strict, `true` = egress/drop-only.
    pub egress_mode: bool,
    /// Direction label; carried for interface completeness only (see
    /// the design ledger's Open Question resolution) — it does not
    /// participate in any decision.
    pub ingress: bool,
    pub tx_ready: bool,
}

impl Input {
    pub fn rx_valid(&self) -> bool {
        self.rx_data.is_some()
    }
}

/// One cycle's worth of produced outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Output {
    /// `Some((data, last))` when `tx_valid` is asserted this cycle.
    pub tx: Option<(u8, bool)>,
    pub rx_ready: bool,
    pub status_led: bool,
}
