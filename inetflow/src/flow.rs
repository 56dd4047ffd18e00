//! Flow identification and the flow table.

pub mod hash;
pub mod key;
pub mod record;
pub mod table;

pub use hash::flow_hash;
pub use key::{FlowFamily, FlowKey};
pub use record::{FlowRecord, FlowSummary};
pub use table::{FlowTable, FlowTableStats, Iter};
