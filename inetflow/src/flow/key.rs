use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
};

use serde::{Deserialize, Serialize};

/// Address family of a flow. Carried alongside the key, never encoded in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowFamily {
    #[default]
    Ipv4,
    Ipv6,
}

impl FlowFamily {
    /// Renders a raw 128-bit key address in this family.
    ///
    /// IPv4 addresses live in the low 32 bits, so the upper bits are ignored.
    pub fn addr(self, raw: u128) -> IpAddr {
        match self {
            FlowFamily::Ipv4 => IpAddr::V4(Ipv4Addr::from(raw as u32)),
            FlowFamily::Ipv6 => IpAddr::V6(Ipv6Addr::from(raw)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowFamily::Ipv4 => "ipv4",
            FlowFamily::Ipv6 => "ipv6",
        }
    }
}

impl fmt::Display for FlowFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction-independent identity of a bidirectional conversation.
///
/// Addresses and ports are ordered independently by numeric value, so both
/// directions of a conversation build the same key. The only way to obtain a
/// `FlowKey` is through the canonicalizing constructors, and it has no setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlowKey {
    protocol: u16,
    lower_ip: u128,
    upper_ip: u128,
    lower_port: u16,
    upper_port: u16,
}

impl FlowKey {
    /// Builds a canonical key from the two endpoints of a packet, in either order.
    pub fn new(protocol: u16, (ip_a, port_a): (u128, u16), (ip_b, port_b): (u128, u16)) -> Self {
        let (lower_ip, upper_ip) = if ip_a < ip_b { (ip_a, ip_b) } else { (ip_b, ip_a) };
        let (lower_port, upper_port) = if port_a < port_b {
            (port_a, port_b)
        } else {
            (port_b, port_a)
        };

        Self {
            protocol,
            lower_ip,
            upper_ip,
            lower_port,
            upper_port,
        }
    }

    pub fn from_ipv4(
        protocol: u16,
        (src, src_port): (Ipv4Addr, u16),
        (dst, dst_port): (Ipv4Addr, u16),
    ) -> Self {
        Self::new(
            protocol,
            (u128::from(u32::from(src)), src_port),
            (u128::from(u32::from(dst)), dst_port),
        )
    }

    pub fn protocol(&self) -> u16 {
        self.protocol
    }

    pub fn lower_ip(&self) -> u128 {
        self.lower_ip
    }

    pub fn upper_ip(&self) -> u128 {
        self.upper_ip
    }

    pub fn lower_port(&self) -> u16 {
        self.lower_port
    }

    pub fn upper_port(&self) -> u16 {
        self.upper_port
    }
}
