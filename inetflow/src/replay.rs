//! Offline replay of classic pcap captures into a [`FlowTable`].

use std::{
    fs::File,
    io::{self, BufReader, Read},
    ops::AddAssign,
    path::{Path, PathBuf},
    time::Duration,
};

use pcap_file::{
    DataLink, PcapError,
    pcap::PcapReader,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{flow::FlowTable, runtime::conf::Conf};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to open capture '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid pcap data: {0}")]
    Pcap(#[from] PcapError),

    #[error("unsupported link type {0:?}, only ethernet captures can be replayed")]
    UnsupportedDataLink(DataLink),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayOptions {
    /// Use each record's capture time as the flow timestamp.
    pub capture_timestamps: bool,
    /// Capture time between progress lines. Zero disables them.
    pub stats_interval: Duration,
}

impl From<&Conf> for ReplayOptions {
    fn from(conf: &Conf) -> Self {
        Self {
            capture_timestamps: conf.capture_timestamps,
            stats_interval: conf.stats_interval,
        }
    }
}

/// Packet counts of one or more replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReplaySummary {
    pub packets: u64,
    /// Packets that resolved to a flow record.
    pub accepted: u64,
    /// Packets the parser rejected.
    pub rejected: u64,
}

impl AddAssign for ReplaySummary {
    fn add_assign(&mut self, other: Self) {
        self.packets += other.packets;
        self.accepted += other.accepted;
        self.rejected += other.rejected;
    }
}

/// Feeds every record of a pcap stream to `table`.
///
/// Each record contributes its captured bytes and its original wire length.
/// A capture that ends in the middle of a record is logged and treated as
/// ending at the last complete record.
pub fn replay_pcap<R: Read, C>(
    reader: R,
    table: &mut FlowTable<C>,
    options: &ReplayOptions,
) -> Result<ReplaySummary, ReplayError> {
    let mut reader = PcapReader::new(reader)?;
    let datalink = reader.header().datalink;
    if datalink != DataLink::ETHERNET {
        return Err(ReplayError::UnsupportedDataLink(datalink));
    }

    let mut summary = ReplaySummary::default();
    let mut progress = ProgressSchedule::new(options.stats_interval);

    while let Some(packet) = reader.next_packet() {
        let packet = match packet {
            Ok(packet) => packet,
            Err(e) if is_truncated_record(&e) => {
                warn!(
                    event.name = "replay.truncated_record",
                    packets = summary.packets,
                    error = %e,
                    "capture ends mid-record, ignoring the remainder"
                );
                break;
            }
            Err(e) => return Err(e.into()),
        };

        summary.packets += 1;
        let timestamp = if options.capture_timestamps {
            packet.timestamp.as_micros() as u64
        } else {
            0
        };

        match table.get_or_create(&packet.data, packet.orig_len as usize, 0, timestamp) {
            Some(_) => summary.accepted += 1,
            None => summary.rejected += 1,
        }

        if progress.due(packet.timestamp) {
            info!(
                event.name = "replay.progress",
                packets = summary.packets,
                accepted = summary.accepted,
                rejected = summary.rejected,
                flows = table.len(),
                hits = table.hits(),
                misses = table.misses(),
                "replay progress"
            );
        }
    }

    Ok(summary)
}

/// Decides when a progress line is due, in capture time.
///
/// The first record arms the schedule. After that a line is due once capture
/// time reaches the armed deadline, which then moves one interval past the
/// reporting record. A deadline past `Duration::MAX` ends reporting.
#[derive(Debug)]
struct ProgressSchedule {
    interval: Duration,
    next: Option<Duration>,
    armed: bool,
}

impl ProgressSchedule {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
            armed: false,
        }
    }

    fn due(&mut self, timestamp: Duration) -> bool {
        if self.interval.is_zero() {
            return false;
        }
        if !self.armed {
            self.armed = true;
            self.next = timestamp.checked_add(self.interval);
            return false;
        }
        match self.next {
            Some(at) if timestamp >= at => {
                self.next = timestamp.checked_add(self.interval);
                true
            }
            _ => false,
        }
    }
}

fn is_truncated_record(e: &PcapError) -> bool {
    match e {
        PcapError::IncompleteBuffer => true,
        PcapError::IoError(e) => e.kind() == io::ErrorKind::UnexpectedEof,
        _ => false,
    }
}

/// Opens `path` and replays it with [`replay_pcap`].
pub fn replay_file<C>(
    path: &Path,
    table: &mut FlowTable<C>,
    options: &ReplayOptions,
) -> Result<ReplaySummary, ReplayError> {
    let file = File::open(path).map_err(|source| ReplayError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let summary = replay_pcap(BufReader::new(file), table, options)?;

    info!(
        event.name = "replay.file_completed",
        path = %path.display(),
        packets = summary.packets,
        accepted = summary.accepted,
        rejected = summary.rejected,
        "capture replayed"
    );
    Ok(summary)
}
