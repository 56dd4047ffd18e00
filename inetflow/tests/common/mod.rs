#![allow(dead_code)]

use std::{net::Ipv4Addr, path::Path, time::Duration};

use inetflow::packet::FrameBuilder;
use pcap_file::pcap::{PcapPacket, PcapWriter};

/// TCP frame between two hosts of 10.0.0.0/24.
pub fn tcp_frame(src: u8, src_port: u16, dst: u8, dst_port: u16) -> Vec<u8> {
    FrameBuilder::tcp(host(src), src_port, host(dst), dst_port).build()
}

pub fn host(last: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, last)
}

/// Writes `frames` as a classic Ethernet pcap, one record per second starting at `start`.
pub fn write_capture(path: &Path, start: Duration, frames: &[Vec<u8>]) {
    let file = std::fs::File::create(path).expect("create capture file");
    let mut writer = PcapWriter::new(file).expect("write pcap header");
    for (i, frame) in frames.iter().enumerate() {
        let timestamp = start + Duration::from_secs(i as u64);
        let packet = PcapPacket::new(timestamp, frame.len() as u32, frame);
        writer.write_packet(&packet).expect("write pcap record");
    }
}
