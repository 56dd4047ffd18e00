//! Synthetic frame construction for tests, benchmarks and replay fixtures.

use std::net::Ipv4Addr;

use network_types::{
    eth::{ETH_LEN, ETH_TYPE_OFFSET, EtherType},
    ip::{
        IpProto,
        ipv4::{DST_ADDR_OFFSET, IPV4_LEN, PROTOCOL_OFFSET, SRC_ADDR_OFFSET},
    },
    tcp::TCP_LEN,
};

const SRC_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
const DST_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x02];
const TCP_SYN: u8 = 0x02;

/// Builds an Ethernet + IPv4 + TCP frame with no payload.
///
/// The header fields that identify a flow can be overridden to produce frames
/// the parser must reject.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    src: (Ipv4Addr, u16),
    dst: (Ipv4Addr, u16),
    ether_type: u16,
    protocol: u8,
    truncate: Option<usize>,
}

impl FrameBuilder {
    pub fn tcp(src: Ipv4Addr, src_port: u16, dst: Ipv4Addr, dst_port: u16) -> Self {
        Self {
            src: (src, src_port),
            dst: (dst, dst_port),
            ether_type: EtherType::Ipv4.into(),
            protocol: IpProto::Tcp as u8,
            truncate: None,
        }
    }

    pub fn ether_type(mut self, ether_type: u16) -> Self {
        self.ether_type = ether_type;
        self
    }

    pub fn protocol(mut self, protocol: u8) -> Self {
        self.protocol = protocol;
        self
    }

    /// Cuts the finished frame down to `len` bytes.
    pub fn truncate(mut self, len: usize) -> Self {
        self.truncate = Some(len);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut frame = vec![0u8; ETH_LEN + IPV4_LEN + TCP_LEN];

        // Ethernet
        frame[0..6].copy_from_slice(&DST_MAC);
        frame[6..12].copy_from_slice(&SRC_MAC);
        frame[ETH_TYPE_OFFSET..ETH_LEN].copy_from_slice(&self.ether_type.to_be_bytes());

        // IPv4, no options
        let ip = &mut frame[ETH_LEN..ETH_LEN + IPV4_LEN];
        ip[0] = 0x45;
        ip[2..4].copy_from_slice(&((IPV4_LEN + TCP_LEN) as u16).to_be_bytes());
        ip[8] = 64; // ttl
        ip[PROTOCOL_OFFSET] = self.protocol;
        ip[SRC_ADDR_OFFSET..SRC_ADDR_OFFSET + 4].copy_from_slice(&self.src.0.octets());
        ip[DST_ADDR_OFFSET..DST_ADDR_OFFSET + 4].copy_from_slice(&self.dst.0.octets());

        // TCP
        let tcp = &mut frame[ETH_LEN + IPV4_LEN..];
        tcp[0..2].copy_from_slice(&self.src.1.to_be_bytes());
        tcp[2..4].copy_from_slice(&self.dst.1.to_be_bytes());
        tcp[12] = 0x50; // data offset
        tcp[13] = TCP_SYN;

        if let Some(len) = self.truncate {
            frame.truncate(len);
        }
        frame
    }

    /// Builder for the same flow seen from the other endpoint.
    pub fn reversed(&self) -> Self {
        Self {
            src: self.dst,
            dst: self.src,
            ..self.clone()
        }
    }
}
