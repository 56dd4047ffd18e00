//! TCP header, which is present after the IP header.
//!    0                   1                   2                   3
//!    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!   |          Source Port          |       Destination Port        |
//!   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!   |                        Sequence Number                        |
//!   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!   |                             ...                               |
//!
//! Flow identification only needs the port pair, so only the first
//! [`TCP_PORTS_LEN`] bytes of the header are ever read.

use crate::{Error, read_array};

/// The length of the TCP header base structure.
pub const TCP_LEN: usize = 20;

/// Bytes covering the source and destination ports.
pub const TCP_PORTS_LEN: usize = 4;

pub type SrcPort = [u8; 2];
pub type DstPort = [u8; 2];

/// Returns the source port from network byte order.
#[inline]
pub fn src_port(src: SrcPort) -> u16 {
    u16::from_be_bytes(src)
}

/// Returns the destination port from network byte order.
#[inline]
pub fn dst_port(dst: DstPort) -> u16 {
    u16::from_be_bytes(dst)
}

/// Reads `(source, destination)` ports from the header at `offset`.
#[inline]
pub fn read_ports(buf: &[u8], offset: usize) -> Result<(u16, u16), Error> {
    let src = read_array::<2>(buf, offset)?;
    let dst = read_array::<2>(buf, offset.saturating_add(2))?;
    Ok((src_port(src), dst_port(dst)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_accessors() {
        assert_eq!(src_port([0x01, 0xBB]), 443);
        assert_eq!(dst_port([0xC7, 0x38]), 51000);
    }

    #[test]
    fn test_read_ports() {
        let buf = [0x01, 0xBB, 0xC7, 0x38, 0xFF];
        assert_eq!(read_ports(&buf, 0), Ok((443, 51000)));
    }

    #[test]
    fn test_read_ports_needs_four_bytes() {
        let buf = [0x01, 0xBB, 0xC7];
        assert_eq!(read_ports(&buf, 0), Err(Error::OutOfBounds));
        assert_eq!(read_ports(&[0u8; TCP_PORTS_LEN], 1), Err(Error::OutOfBounds));
    }
}
