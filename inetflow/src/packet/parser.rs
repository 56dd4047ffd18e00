//! Ethernet / IPv4 / TCP tuple parser.
//!
//! Layout assumptions are fixed: a 14-byte Ethernet header, a 20-byte IPv4
//! header whose options (if any) are not honoured, then the TCP port pair.

use network_types::{
    eth::{ETH_LEN, EtherType, read_ether_type},
    ip::{
        IpProto,
        ipv4::{self, IPV4_LEN},
    },
    tcp,
};

use crate::{
    flow::{FlowFamily, FlowKey},
    packet::types::{Layer, ParseError, ParsedTuple},
};

/// Parses the first `length` bytes of `frame` into a canonical flow tuple.
///
/// `length` is clamped to the bytes actually present in `frame`.
/// `external_hash` is copied into the result untouched.
pub fn parse(frame: &[u8], length: usize, external_hash: u16) -> Result<ParsedTuple, ParseError> {
    let data = &frame[..length.min(frame.len())];
    let mut offset = 0;

    parse_ethernet(data, &mut offset)?;

    let (protocol, src_ip, dst_ip) = parse_ipv4(data, &mut offset)?;
    if IpProto::try_from_u8(protocol) != Some(IpProto::Tcp) {
        return Err(ParseError::UnsupportedTransportProtocol(protocol));
    }

    let (src_port, dst_port) = parse_tcp_ports(data, offset)?;

    Ok(ParsedTuple {
        key: FlowKey::new(
            u16::from(protocol),
            (u128::from(src_ip), src_port),
            (u128::from(dst_ip), dst_port),
        ),
        family: FlowFamily::Ipv4,
        hash: external_hash,
    })
}

/// Accepts only frames carrying IPv4.
fn parse_ethernet(data: &[u8], offset: &mut usize) -> Result<(), ParseError> {
    let raw = read_ether_type(data, *offset).map_err(|_| ParseError::Truncated(Layer::Link))?;
    *offset += ETH_LEN;
    match EtherType::try_from(raw) {
        Ok(EtherType::Ipv4) => Ok(()),
        Err(raw) => Err(ParseError::UnsupportedLinkProtocol(raw)),
    }
}

fn parse_ipv4(data: &[u8], offset: &mut usize) -> Result<(u8, u32, u32), ParseError> {
    let fields =
        ipv4::read_fields(data, *offset).map_err(|_| ParseError::Truncated(Layer::Network))?;
    *offset += IPV4_LEN;
    Ok((
        fields.protocol,
        u32::from_be_bytes(fields.src_addr),
        u32::from_be_bytes(fields.dst_addr),
    ))
}

fn parse_tcp_ports(data: &[u8], offset: usize) -> Result<(u16, u16), ParseError> {
    tcp::read_ports(data, offset).map_err(|_| ParseError::Truncated(Layer::Transport))
}
