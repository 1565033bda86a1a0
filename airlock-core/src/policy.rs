//! Combinatorial per-byte policy predicates.
//!
//! Each rule is expressed as a `(active, allowed)` pair evaluated on the
//! currently-fired byte; a violation fires when `active ∧ ¬allowed`. The
//! 21 rule rows collapse onto the 16 traffic-latch kinds (heartbeat is
//! tracked separately by the watchdog) as documented in the project's
//! design ledger.

use crate::parser::{printable, ParserState};
use crate::violation::{ViolationKind, ViolationNow};

/// Everything a rule needs to see besides the byte itself.
pub struct PolicyInputs<'a> {
    pub parser: &'a ParserState,
    pub rx_data: u8,
    pub rx_last: bool,
    pub volume_at_or_over_limit: bool,
    pub arp_bucket_at_or_over_limit: bool,
    pub plaintext_threshold: u8,
}

/// Evaluate every applicable rule for the current byte and return the
/// set of traffic violations it produced.
///
/// On the `rx_last` cycle every rule except the truncation and runt
/// checks is suppressed outright (end-of-frame bookkeeping takes over);
/// those two checks only ever evaluate on `rx_last`.
pub fn evaluate(inputs: &PolicyInputs) -> ViolationNow {
    let mut now = ViolationNow::default();
    let p = inputs.parser;
    let byte_ptr = p.byte_ptr;
    let rx_data = inputs.rx_data;

    if inputs.rx_last {
        // C-trunc: Active when is_ip ∧ rx_last.
        if p.is_ip {
            let allowed = byte_ptr >= p.ip_len as u32 + 14 - 1
                && p.ip_len >= 28
                && (p.ip_proto != 6 || p.ip_len >= 40);
            if !allowed {
                now.mark(ViolationKind::WgSize);
            }
        }
        // C-runt: Active when rx_last ∧ byte_ptr<14; never allowed.
        if byte_ptr < 14 {
            now.mark(ViolationKind::WgSize);
        }
        return now;
    }

    // A EtherType: Active at byte_ptr=13.
    if byte_ptr == 13 {
        let allowed = p.is_ip && matches!(rx_data, 0x00 | 0x06);
        if !allowed {
            now.mark(ViolationKind::Ethertype);
        }
    }

    // A' IP version + G IP options: both active at byte_ptr=14 when is_ip.
    // G is the stricter check (full byte must be 0x45) and subsumes A'
    // (version nibble = 4); both collapse onto the same latch.
    if p.is_ip && byte_ptr == 14 {
        if rx_data >> 4 != 4 {
            now.mark(ViolationKind::IpOptions);
        } else if rx_data != 0x45 {
            now.mark(ViolationKind::IpOptions);
        }
    }

    // B TTL: Active when is_ip ∧ byte_ptr=22.
    if p.is_ip && byte_ptr == 22 && rx_data < 60 {
        now.mark(ViolationKind::Ttl);
    }

    // C Min-size: Active when is_ip ∧ byte_ptr = 14+4*ip_hdr_len-1 ∧ byte_ptr>14.
    let header_last_byte = p.ip_header_end().saturating_sub(1);
    if p.is_ip && byte_ptr == header_last_byte && byte_ptr > 14 {
        let allowed = p.ip_len >= 28 && (p.ip_proto != 6 || p.ip_len >= 40);
        if !allowed {
            now.mark(ViolationKind::WgSize);
        }
    }

    // C-trail Trailing-garbage: Active when is_ip ∧ byte_ptr>17 ∧
    // byte_ptr ≥ 14+ip_len ∧ byte_ptr≥64; never allowed.
    if p.is_ip
        && byte_ptr > 17
        && byte_ptr >= 14 + p.ip_len as u32
        && byte_ptr >= 64
    {
        now.mark(ViolationKind::WgSize);
    }

    // D Plaintext: Active when (is_ip ∨ is_arp) ∧ printable(rx_data).
    if (p.is_ip || p.is_arp) && printable(rx_data) && p.plaintext_cnt >= inputs.plaintext_threshold
    {
        now.mark(ViolationKind::Plaintext);
    }

    // E Volume: always active.
    if inputs.volume_at_or_over_limit {
        now.mark(ViolationKind::Volume);
    }

    // F Frag-flags: Active when is_ip ∧ byte_ptr=20.
    if p.is_ip && byte_ptr == 20 && rx_data & 0xBF != 0 {
        now.mark(ViolationKind::Frag);
    }

    // F' Frag-offset: Active when is_ip ∧ byte_ptr=21.
    if p.is_ip && byte_ptr == 21 && rx_data != 0 {
        now.mark(ViolationKind::Frag);
    }

    // H Protocol: Active when is_ip ∧ byte_ptr=23.
    if p.is_ip && byte_ptr == 23 && !matches!(rx_data, 6 | 17) {
        now.mark(ViolationKind::IpProto);
    }

    // I ARP opcode: Active when is_arp ∧ byte_ptr=21.
    if p.is_arp && byte_ptr == 21 {
        let allowed = p.arp_opcode_high == 0 && matches!(rx_data, 1 | 2);
        if !allowed {
            now.mark(ViolationKind::ArpOpcode);
        }
    }

    // J ARP size: Active when is_arp ∧ byte_ptr>63; never allowed.
    if p.is_arp && byte_ptr > 63 {
        now.mark(ViolationKind::ArpSize);
    }

    // K ARP rate: Active when is_arp.
    if p.is_arp && inputs.arp_bucket_at_or_over_limit {
        now.mark(ViolationKind::ArpRate);
    }

    // L LAND: Active when is_ip ∧ byte_ptr=33.
    if p.is_ip && byte_ptr == 33 {
        let dst_ip = (p.dst_ip << 8) | rx_data as u32;
        if p.src_ip == dst_ip & 0xFFFF_FFFF {
            now.mark(ViolationKind::Land);
        }
    }

    // M Loopback: Active when is_ip ∧ byte_ptr ∈ {26, 30}.
    if p.is_ip && matches!(byte_ptr, 26 | 30) && rx_data == 127 {
        now.mark(ViolationKind::Loopback);
    }

    // N TCP options: Active when is_ip ∧ ip_proto=6 ∧ byte_ptr=46.
    if p.is_ip && p.ip_proto == 6 && byte_ptr == 46 && rx_data != 0x50 {
        now.mark(ViolationKind::TcpOptions);
    }

    // O TCP flags: Active when is_ip ∧ ip_proto=6 ∧ byte_ptr=47.
    if p.is_ip && p.ip_proto == 6 && byte_ptr == 47 {
        let high = if p.tcp_flags_high_bit { 0x100 } else { 0 };
        let full = high | rx_data as u16;
        let allowed = matches!(
            full,
            0x002 | 0x012 | 0x010 | 0x018 | 0x001 | 0x011 | 0x004 | 0x014
        );
        if !allowed {
            now.mark(ViolationKind::TcpFlags);
        }
    }

    // P UDP length: Active when is_ip ∧ ip_proto=17 ∧ byte_ptr=39.
    if p.is_ip && p.ip_proto == 17 && byte_ptr == 39 {
        let full_udp_len = ((p.udp_len_high as u16) << 8) | rx_data as u16;
        let allowed = full_udp_len >= 8
            && (p.ip_len as u32)
                .checked_sub(20)
                .is_some_and(|expected| full_udp_len as u32 == expected);
        if !allowed {
            now.mark(ViolationKind::UdpLen);
        }
    }

    now
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_parser() -> ParserState {
        let mut p = ParserState::default();
        p.is_ip = true;
        p.ip_hdr_len = 5;
        p.ip_proto = 6;
        p.ip_len = 40;
        p
    }

    fn eval(p: &ParserState, rx_data: u8, rx_last: bool) -> ViolationNow {
        evaluate(&PolicyInputs {
            parser: p,
            rx_data,
            rx_last,
            volume_at_or_over_limit: false,
            arp_bucket_at_or_over_limit: false,
            plaintext_threshold: 127,
        })
    }

    #[test]
    fn low_ttl_is_a_violation() {
        let mut p = base_parser();
        p.byte_ptr = 22;
        let v = eval(&p, 50, false);
        assert!(v.0.ttl);
    }

    #[test]
    fn ttl_60_is_allowed() {
        let mut p = base_parser();
        p.byte_ptr = 22;
        let v = eval(&p, 60, false);
        assert!(!v.any());
    }

    #[test]
    fn land_attack_detected() {
        let mut p = base_parser();
        p.byte_ptr = 33;
        p.src_ip = 0x0A00_0001;
        p.dst_ip = 0x0A_0000; // top 24 bits of dst captured so far
        let v = eval(&p, 0x01, false); // last dst byte = 0x01 -> 10.0.0.1
        assert!(v.0.land);
    }

    #[test]
    fn loopback_source_detected() {
        let mut p = base_parser();
        p.byte_ptr = 26;
        let v = eval(&p, 127, false);
        assert!(v.0.loopback);
    }

    #[test]
    fn rx_last_suppresses_everything_but_trunc_and_runt() {
        let mut p = base_parser();
        p.byte_ptr = 22; // would fail TTL mid-frame
        let v = eval(&p, 50, true);
        assert!(!v.0.ttl);
    }

    #[test]
    fn runt_frame_flagged_at_rx_last() {
        let p = base_parser();
        let v = eval(&p, 0, true);
        // byte_ptr defaults to 0 < 14
        assert!(v.0.wg_size);
    }

    #[test]
    fn xmas_scan_flags_rejected() {
        let mut p = base_parser();
        p.byte_ptr = 47;
        p.tcp_flags_high_bit = true;
        let v = eval(&p, 0x3F, false);
        assert!(v.0.tcp_flags);
    }

    #[test]
    fn syn_allowed() {
        let mut p = base_parser();
        p.byte_ptr = 47;
        let v = eval(&p, 0x02, false);
        assert!(!v.any());
    }
}
