use std::fmt;

use thiserror::Error;

use crate::flow::{FlowFamily, FlowKey};

/// Output of a successful parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTuple {
    pub key: FlowKey,
    pub family: FlowFamily,
    /// Hash supplied by the caller, 0 when unset. Never checked against `key`.
    pub hash: u16,
}

/// Header layer at which a frame ran out of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Link,
    Network,
    Transport,
}

impl Layer {
    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Link => "link",
            Layer::Network => "network",
            Layer::Transport => "transport",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a frame was not turned into a flow tuple. None of these are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{0} header truncated")]
    Truncated(Layer),

    #[error("unsupported link protocol: ethertype {0:#06x}")]
    UnsupportedLinkProtocol(u16),

    #[error("unsupported transport protocol: {0}")]
    UnsupportedTransportProtocol(u8),
}

impl ParseError {
    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::Truncated(_) => "truncated",
            ParseError::UnsupportedLinkProtocol(_) => "unsupported_link_protocol",
            ParseError::UnsupportedTransportProtocol(_) => "unsupported_transport_protocol",
        }
    }
}
