//! The 17 named violation kinds and the latch set that tracks them.

/// One named class of policy violation, matching the taxonomy the
/// airlock exposes for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    Volume,
    Ttl,
    WgSize,
    Plaintext,
    Heartbeat,
    Ethertype,
    ArpRate,
    IpProto,
    ArpSize,
    Frag,
    IpOptions,
    ArpOpcode,
    Land,
    Loopback,
    TcpFlags,
    TcpOptions,
    UdpLen,
}

impl ViolationKind {
    /// All 17 kinds, in the order they're listed in the taxonomy.
    pub const ALL: [ViolationKind; 17] = [
        ViolationKind::Volume,
        ViolationKind::Ttl,
        ViolationKind::WgSize,
        ViolationKind::Plaintext,
        ViolationKind::Heartbeat,
        ViolationKind::Ethertype,
        ViolationKind::ArpRate,
        ViolationKind::IpProto,
        ViolationKind::ArpSize,
        ViolationKind::Frag,
        ViolationKind::IpOptions,
        ViolationKind::ArpOpcode,
        ViolationKind::Land,
        ViolationKind::Loopback,
        ViolationKind::TcpFlags,
        ViolationKind::TcpOptions,
        ViolationKind::UdpLen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::Volume => "volume",
            ViolationKind::Ttl => "ttl",
            ViolationKind::WgSize => "wg_size",
            ViolationKind::Plaintext => "plaintext",
            ViolationKind::Heartbeat => "heartbeat",
            ViolationKind::Ethertype => "ethertype",
            ViolationKind::ArpRate => "arp_rate",
            ViolationKind::IpProto => "ip_proto",
            ViolationKind::ArpSize => "arp_size",
            ViolationKind::Frag => "frag",
            ViolationKind::IpOptions => "ip_options",
            ViolationKind::ArpOpcode => "arp_opcode",
            ViolationKind::Land => "land",
            ViolationKind::Loopback => "loopback",
            ViolationKind::TcpFlags => "tcp_flags",
            ViolationKind::TcpOptions => "tcp_options",
            ViolationKind::UdpLen => "udp_len",
        }
    }
}

/// The 16 per-rule traffic latches, excluding heartbeat (which the
/// watchdog tracks on its own independent clock, see
/// [`crate::watchdog::HeartbeatWatchdog`]).
///
/// All are cleared per-frame at `rx_last`, except `volume`, which only
/// clears on `rst_lock`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViolationLatches {
    pub volume: bool,
    pub ttl: bool,
    pub wg_size: bool,
    pub plaintext: bool,
    pub ethertype: bool,
    pub arp_rate: bool,
    pub ip_proto: bool,
    pub arp_size: bool,
    pub frag: bool,
    pub ip_options: bool,
    pub arp_opcode: bool,
    pub land: bool,
    pub loopback: bool,
    pub tcp_flags: bool,
    pub tcp_options: bool,
    pub udp_len: bool,
}

impl ViolationLatches {
    pub fn set(&mut self, kind: ViolationKind) {
        match kind {
            ViolationKind::Volume => self.volume = true,
            ViolationKind::Ttl => self.ttl = true,
            ViolationKind::WgSize => self.wg_size = true,
            ViolationKind::Plaintext => self.plaintext = true,
            ViolationKind::Ethertype => self.ethertype = true,
            ViolationKind::ArpRate => self.arp_rate = true,
            ViolationKind::IpProto => self.ip_proto = true,
            ViolationKind::ArpSize => self.arp_size = true,
            ViolationKind::Frag => self.frag = true,
            ViolationKind::IpOptions => self.ip_options = true,
            ViolationKind::ArpOpcode => self.arp_opcode = true,
            ViolationKind::Land => self.land = true,
            ViolationKind::Loopback => self.loopback = true,
            ViolationKind::TcpFlags => self.tcp_flags = true,
            ViolationKind::TcpOptions => self.tcp_options = true,
            ViolationKind::UdpLen => self.udp_len = true,
            ViolationKind::Heartbeat => unreachable!("heartbeat is tracked by the watchdog"),
        }
    }

    /// OR over every latch, i.e. `traffic_violation` in the spec's terms.
    pub fn any(&self) -> bool {
        self.volume
            || self.ttl
            || self.wg_size
            || self.plaintext
            || self.ethertype
            || self.arp_rate
            || self.ip_proto
            || self.arp_size
            || self.frag
            || self.ip_options
            || self.arp_opcode
            || self.land
            || self.loopback
            || self.tcp_flags
            || self.tcp_options
            || self.udp_len
    }

    /// Clear everything but `volume`, which is lifecycle-scoped.
    pub fn clear_per_frame(&mut self) {
        let volume = self.volume;
        *self = ViolationLatches::default();
        self.volume = volume;
    }

    /// Clear unconditionally, for `rst_lock`.
    pub fn clear_all(&mut self) {
        *self = ViolationLatches::default();
    }

    /// OR another latch set's bits into this one (folding this cycle's
    /// `violation_now` into the sticky per-frame latches).
    pub fn merge(&mut self, other: &ViolationLatches) {
        self.volume |= other.volume;
        self.ttl |= other.ttl;
        self.wg_size |= other.wg_size;
        self.plaintext |= other.plaintext;
        self.ethertype |= other.ethertype;
        self.arp_rate |= other.arp_rate;
        self.ip_proto |= other.ip_proto;
        self.arp_size |= other.arp_size;
        self.frag |= other.frag;
        self.ip_options |= other.ip_options;
        self.arp_opcode |= other.arp_opcode;
        self.land |= other.land;
        self.loopback |= other.loopback;
        self.tcp_flags |= other.tcp_flags;
        self.tcp_options |= other.tcp_options;
        self.udp_len |= other.udp_len;
    }
}

/// A bitmask of the rule-level violations observed on a single byte,
/// collapsed onto the 16 traffic kinds (heartbeat is never produced
/// here; see [`ViolationLatches`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViolationNow(pub ViolationLatches);

impl ViolationNow {
    pub fn mark(&mut self, kind: ViolationKind) {
        self.0.set(kind);
    }

    pub fn any(&self) -> bool {
        self.0.any()
    }
}
