use std::net::IpAddr;

use serde::Serialize;

use crate::flow::key::{FlowFamily, FlowKey};

/// State kept for one bidirectional flow.
///
/// Records are created by [`FlowTable`](crate::flow::FlowTable) on the first
/// packet of a flow and only ever have their timestamp refreshed afterwards.
/// The key never changes once the record exists.
///
/// `C` is caller-attached data. The table never reads it.
#[derive(Debug, Clone)]
pub struct FlowRecord<C = ()> {
    key: FlowKey,
    family: FlowFamily,
    hash: u16,
    timestamp: u64,
    context: Option<C>,
}

impl<C> FlowRecord<C> {
    pub(crate) fn new(key: FlowKey, family: FlowFamily, hash: u16, timestamp: u64) -> Self {
        Self {
            key,
            family,
            hash,
            timestamp,
            context: None,
        }
    }

    pub(crate) fn touch(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Sets the cached hash if it is still unset. A non-zero hash is kept.
    pub(crate) fn cache_hash(&mut self, hash: u16) {
        if self.hash == 0 {
            self.hash = hash;
        }
    }

    /// Cached flow hash, 0 when never computed.
    pub fn hash(&self) -> u16 {
        self.hash
    }

    pub fn protocol(&self) -> u16 {
        self.key.protocol()
    }

    pub fn lower_port(&self) -> u16 {
        self.key.lower_port()
    }

    pub fn upper_port(&self) -> u16 {
        self.key.upper_port()
    }

    pub fn lower_ip(&self) -> IpAddr {
        self.family.addr(self.key.lower_ip())
    }

    pub fn upper_ip(&self) -> IpAddr {
        self.family.addr(self.key.upper_ip())
    }

    /// Numerically lower address in the record's family notation, e.g. `10.0.0.1`.
    pub fn lower_ip_string(&self) -> String {
        self.lower_ip().to_string()
    }

    /// Numerically upper address in the record's family notation.
    pub fn upper_ip_string(&self) -> String {
        self.upper_ip().to_string()
    }

    pub fn family(&self) -> FlowFamily {
        self.family
    }

    /// Last time the flow was seen, in microseconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn key(&self) -> &FlowKey {
        &self.key
    }

    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut C> {
        self.context.as_mut()
    }

    /// Attaches caller data, returning what was attached before.
    pub fn set_context(&mut self, context: C) -> Option<C> {
        self.context.replace(context)
    }
}

/// Serializable snapshot of a [`FlowRecord`], used by the exporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSummary {
    pub hash: u16,
    pub protocol: u16,
    pub family: FlowFamily,
    pub lower_ip: IpAddr,
    pub lower_port: u16,
    pub upper_ip: IpAddr,
    pub upper_port: u16,
    pub timestamp_us: u64,
}

impl<C> From<&FlowRecord<C>> for FlowSummary {
    fn from(record: &FlowRecord<C>) -> Self {
        Self {
            hash: record.hash(),
            protocol: record.protocol(),
            family: record.family(),
            lower_ip: record.lower_ip(),
            lower_port: record.lower_port(),
            upper_ip: record.upper_ip(),
            upper_port: record.upper_port(),
            timestamp_us: record.timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn record() -> FlowRecord<&'static str> {
        let key = FlowKey::from_ipv4(
            6,
            (Ipv4Addr::new(10, 0, 0, 2), 51000),
            (Ipv4Addr::new(10, 0, 0, 1), 443),
        );
        FlowRecord::new(key, FlowFamily::Ipv4, 0, 42)
    }

    #[test]
    fn test_record_accessors() {
        let record = record();
        assert_eq!(record.protocol(), 6);
        assert_eq!(record.lower_ip_string(), "10.0.0.1");
        assert_eq!(record.upper_ip_string(), "10.0.0.2");
        assert_eq!(record.lower_port(), 443);
        assert_eq!(record.upper_port(), 51000);
        assert_eq!(record.timestamp(), 42);
        assert_eq!(record.family(), FlowFamily::Ipv4);
    }

    #[test]
    fn test_cache_hash_only_fills_unset_hash() {
        let mut record = record();
        record.cache_hash(0x1234);
        assert_eq!(record.hash(), 0x1234);
        record.cache_hash(0x5678);
        assert_eq!(record.hash(), 0x1234);
    }

    #[test]
    fn test_context_round_trip() {
        let mut record = record();
        assert_eq!(record.context(), None);
        assert_eq!(record.set_context("first"), None);
        assert_eq!(record.set_context("second"), Some("first"));
        if let Some(ctx) = record.context_mut() {
            *ctx = "third";
        }
        assert_eq!(record.context(), Some(&"third"));
    }

    #[test]
    fn test_summary_serializes_addresses_as_strings() {
        let summary = FlowSummary::from(&record());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["lower_ip"], "10.0.0.1");
        assert_eq!(json["upper_ip"], "10.0.0.2");
        assert_eq!(json["family"], "ipv4");
        assert_eq!(json["timestamp_us"], 42);
    }
}
