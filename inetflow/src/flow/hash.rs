//! 16-bit flow hash.
//!
//! Three CRC-16/CCITT registers run over disjoint parts of the key: the lower
//! endpoint, the upper endpoint and the protocol. Each register starts from
//! `0xFFFF` and the results are XORed together. Every field is fed as a 64-bit
//! big-endian word, so a port contributes `port << 48` and the protocol
//! contributes `protocol << 56`.
//!
//! Addresses are fed as the two halves of the 128-bit key field. An IPv4
//! address is stored as its numeric value in the low 32 bits, so it lands in
//! the second word and the first word is zero. Hashers that copy the address
//! bytes in network order into the first word produce different values, and
//! theirs also vary with host byte order: the key 10.0.0.1:443 <-> 10.0.0.2:51000
//! over TCP hashes to `0x6450` here but `0x1011` with that layout on a
//! little-endian host. Anything sharding on this hash must not assume the two
//! agree.

use crate::flow::key::FlowKey;

const CRC16_POLY: u16 = 0x1021;
const CRC16_INIT: u16 = 0xFFFF;

/// Bitwise CRC-16/CCITT, most significant bit first, no reflection, no final XOR.
fn crc16(mut crc: u16, bytes: &[u8]) -> u16 {
    for &byte in bytes {
        for bit in (0..8).rev() {
            let feedback = ((crc >> 15) & 1) ^ u16::from((byte >> bit) & 1);
            crc = (crc << 1) ^ if feedback != 0 { CRC16_POLY } else { 0 };
        }
    }
    crc
}

#[inline]
fn crc16_word(crc: u16, word: u64) -> u16 {
    crc16(crc, &word.to_be_bytes())
}

fn endpoint_crc(addr: u128, port: u16) -> u16 {
    let crc = crc16_word(CRC16_INIT, (addr >> 64) as u64);
    let crc = crc16_word(crc, addr as u64);
    crc16_word(crc, u64::from(port) << 48)
}

/// Hashes a canonical key. Pure: equal keys always hash identically.
pub fn flow_hash(key: &FlowKey) -> u16 {
    let lower = endpoint_crc(key.lower_ip(), key.lower_port());
    let upper = endpoint_crc(key.upper_ip(), key.upper_port());
    let protocol = crc16_word(CRC16_INIT, u64::from(key.protocol()) << 56);
    lower ^ upper ^ protocol
}
