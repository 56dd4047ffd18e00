//! ## IPv4 Header
//!
//! Fixed IPv4 header, which is present after the Ethernet header.
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |ip_ver | h_len |  ip_dscp  |ecn|        ip_total_length        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       ip_identification       |flags|   ip_fragment_offset    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |    ip_ttl     |  ip_protocol  |          ip_checksum          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         source_ipaddr                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      destination_ipaddr                       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

pub mod ipv4 {
    use crate::{Error, read_array};

    /// The length of the IPv4 header without options.
    pub const IPV4_LEN: usize = 20;

    pub const PROTOCOL_OFFSET: usize = 9;
    pub const SRC_ADDR_OFFSET: usize = 12;
    pub const DST_ADDR_OFFSET: usize = 16;

    pub type SrcAddr = [u8; 4];
    pub type DstAddr = [u8; 4];

    /// Fields of a fixed IPv4 header needed to identify a flow.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ipv4Fields {
        pub protocol: u8,
        pub src_addr: SrcAddr,
        pub dst_addr: DstAddr,
    }

    /// Reads the fixed 20-byte header at `offset`. Options are not interpreted.
    pub fn read_fields(buf: &[u8], offset: usize) -> Result<Ipv4Fields, Error> {
        if buf.len() < offset.saturating_add(IPV4_LEN) {
            return Err(Error::OutOfBounds);
        }
        let [protocol] = read_array::<1>(buf, offset + PROTOCOL_OFFSET)?;
        Ok(Ipv4Fields {
            protocol,
            src_addr: read_array(buf, offset + SRC_ADDR_OFFSET)?,
            dst_addr: read_array(buf, offset + DST_ADDR_OFFSET)?,
        })
    }
}

/// Protocol which is encapsulated in the IPv4 packet. Only TCP is tracked.
/// <https://www.iana.org/assignments/protocol-numbers/protocol-numbers.xhtml>
#[repr(u8)]
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum IpProto {
    /// Transmission Control
    Tcp = 6,
}

impl IpProto {
    pub fn try_from_u8(value: u8) -> Option<Self> {
        match value {
            6 => Some(IpProto::Tcp),
            _ => None,
        }
    }
}
