use std::{
    io::{self, Write},
    net::SocketAddr,
};

use crate::{
    exporters::{ExportError, FlowExporter},
    flow::FlowSummary,
    runtime::conf::{ExportConf, ExportFormat},
};

/// Prints flows as text or JSON. Writes to stdout unless built with
/// [`StdoutExporter::with_writer`].
pub struct StdoutExporter<W = io::Stdout> {
    format: ExportFormat,
    limit: Option<usize>,
    out: W,
}

impl StdoutExporter {
    pub fn new(conf: &ExportConf) -> Self {
        Self::with_writer(conf, io::stdout())
    }
}

impl<W: Write> StdoutExporter<W> {
    pub fn with_writer(conf: &ExportConf, out: W) -> Self {
        Self {
            format: conf.format,
            limit: conf.limit,
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_text(&mut self, flows: &[FlowSummary]) -> io::Result<()> {
        writeln!(
            self.out,
            "{:<6} {:<6} {:<47} {:<47} {}",
            "HASH", "PROTO", "LOWER", "UPPER", "LAST_SEEN_US"
        )?;
        for flow in flows {
            writeln!(
                self.out,
                "{:<6} {:<6} {:<47} {:<47} {}",
                format!("{:04x}", flow.hash),
                flow.protocol,
                SocketAddr::new(flow.lower_ip, flow.lower_port).to_string(),
                SocketAddr::new(flow.upper_ip, flow.upper_port).to_string(),
                flow.timestamp_us
            )?;
        }
        Ok(())
    }
}

impl<W: Write> FlowExporter for StdoutExporter<W> {
    fn export(&mut self, flows: &[FlowSummary]) -> Result<(), ExportError> {
        let flows = match self.limit {
            Some(limit) => &flows[..limit.min(flows.len())],
            None => flows,
        };

        match self.format {
            ExportFormat::Text => self.write_text(flows)?,
            ExportFormat::Json => {
                serde_json::to_writer_pretty(&mut self.out, flows)?;
                writeln!(self.out)?;
            }
            ExportFormat::JsonCompact => {
                serde_json::to_writer(&mut self.out, flows)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}
