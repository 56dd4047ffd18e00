//! Packet tuple parsing.
//!
//! Turns a raw Ethernet frame into the canonical tuple used to key the flow
//! table. Only TCP over IPv4 is accepted; anything else is rejected with a
//! [`ParseError`](types::ParseError) and never reaches the table.

pub mod builder;
pub mod parser;
pub mod types;

pub use builder::FrameBuilder;
pub use parser::parse;
pub use types::{Layer, ParseError, ParsedTuple};
