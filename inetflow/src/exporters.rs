use std::io;

use thiserror::Error;

use crate::flow::{FlowSummary, FlowTable};

pub mod stdout;

pub use stdout::StdoutExporter;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write flows: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize flows: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Sink for the flows of a table.
pub trait FlowExporter {
    /// Writes `flows`, ordered from most to least recently seen.
    fn export(&mut self, flows: &[FlowSummary]) -> Result<(), ExportError>;
}

/// Snapshots `table` in recency order and hands it to `exporter`.
pub fn export_table<C, E>(table: &FlowTable<C>, exporter: &mut E) -> Result<usize, ExportError>
where
    E: FlowExporter + ?Sized,
{
    let flows: Vec<FlowSummary> = table.iter().map(FlowSummary::from).collect();
    exporter.export(&flows)?;
    Ok(flows.len())
}
