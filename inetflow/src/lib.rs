//! Direction-independent flow identification for captured packets.
//!
//! [`FlowTable::get_or_create`] parses an Ethernet frame, reduces it to a
//! canonical [`FlowKey`] and returns the record shared by both directions of
//! the conversation, keeping every record in recency order.

pub mod error;
pub mod exporters;
pub mod flow;
pub mod packet;
pub mod replay;
pub mod runtime;

pub use error::{InetflowError, Result};
pub use flow::{FlowFamily, FlowKey, FlowRecord, FlowSummary, FlowTable, FlowTableStats, flow_hash};
pub use packet::{ParseError, ParsedTuple, parse};
