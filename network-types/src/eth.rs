//! Ethernet II header, the first 14 bytes of every captured frame.
//!
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                     destination_mac_addr                      |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  | destination_mac_addr (con't)  |        source_mac_addr        |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                    source_mac_addr (con't)                    |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |           eth_type            |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

use crate::{Error, read_array};

/// The length of the Ethernet header.
pub const ETH_LEN: usize = 14;

/// Offset of the EtherType field inside the Ethernet header.
pub const ETH_TYPE_OFFSET: usize = 12;

pub type EthType = [u8; 2];

/// Protocol encapsulated in the payload of the Ethernet frame. Only IPv4 is
/// decoded; every other value stays a raw `u16`.
/// Discriminants are the IEEE assigned numbers in host byte order.
#[repr(u16)]
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum EtherType {
    Ipv4 = 0x0800,
}

impl TryFrom<u16> for EtherType {
    type Error = u16; // the unknown value itself

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0800 => Ok(EtherType::Ipv4),
            _ => Err(value),
        }
    }
}

impl From<EtherType> for u16 {
    fn from(ether_type: EtherType) -> Self {
        ether_type as u16
    }
}

/// Returns the raw EtherType (host byte order) from the wire field.
#[inline]
pub fn ether_type(eth_type: EthType) -> u16 {
    u16::from_be_bytes(eth_type)
}

/// Reads the raw EtherType of the frame starting at `offset`.
///
/// Requires the whole Ethernet header to be present, not only the type field.
#[inline]
pub fn read_ether_type(frame: &[u8], offset: usize) -> Result<u16, Error> {
    if frame.len() < offset.saturating_add(ETH_LEN) {
        return Err(Error::OutOfBounds);
    }
    read_array::<2>(frame, offset + ETH_TYPE_OFFSET).map(ether_type)
}
