//! EgressGate: masks the output handshake and synthesizes a terminator
//! byte for frames cut short by a drop.

pub struct GateInputs {
    pub rx_data: u8,
    pub rx_valid: bool,
    pub rx_last: bool,
    pub tx_ready: bool,
    pub locked: bool,
    pub drop_current: bool,
    pub rst_lock: bool,
    pub flush_state: bool,
    pub traffic_violation: bool,
    pub violation_heartbeat: bool,
    pub violation_now: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateOutputs {
    pub tx_data: u8,
    pub tx_valid: bool,
    pub tx_last: bool,
    pub rx_ready: bool,
}

pub fn compute(inputs: &GateInputs) -> GateOutputs {
    let gate_tx = inputs.locked
        || inputs.drop_current
        || inputs.rst_lock
        || inputs.flush_state
        || inputs.traffic_violation
        || inputs.violation_heartbeat
        || inputs.violation_now;

    let force_terminate = (inputs.drop_current || inputs.violation_now)
        && inputs.rx_last
        && !inputs.locked;

    GateOutputs {
        tx_data: if force_terminate { 0x00 } else { inputs.rx_data },
        tx_valid: (inputs.rx_valid && !gate_tx) || force_terminate,
        tx_last: inputs.rx_last,
        rx_ready: inputs.tx_ready || gate_tx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> GateInputs {
        GateInputs {
            rx_data: 0xAB,
            rx_valid: true,
            rx_last: false,
            tx_ready: true,
            locked: false,
            drop_current: false,
            rst_lock: false,
            flush_state: false,
            traffic_violation: false,
            violation_heartbeat: false,
            violation_now: false,
        }
    }

    #[test]
    fn clean_byte_forwards_unchanged() {
        let out = compute(&base());
        assert_eq!(out.tx_data, 0xAB);
        assert!(out.tx_valid);
        assert!(out.rx_ready);
    }

    #[test]
    fn locked_suppresses_output() {
        let mut i = base();
        i.locked = true;
        let out = compute(&i);
        assert!(!out.tx_valid);
        assert!(out.rx_ready); // sink-or-swallow
    }

    #[test]
    fn drop_current_emits_terminator_at_rx_last() {
        let mut i = base();
        i.drop_current = true;
        i.rx_last = true;
        let out = compute(&i);
        assert!(out.tx_valid);
        assert_eq!(out.tx_data, 0x00);
        assert!(out.tx_last);
    }

    #[test]
    fn no_terminator_once_locked() {
        let mut i = base();
        i.drop_current = true;
        i.rx_last = true;
        i.locked = true;
        let out = compute(&i);
        assert!(!out.tx_valid);
    }

    #[test]
    fn gated_mid_frame_byte_is_swallowed_not_terminated() {
        let mut i = base();
        i.drop_current = true;
        let out = compute(&i);
        assert!(!out.tx_valid);
        assert!(out.rx_ready);
    }
}
