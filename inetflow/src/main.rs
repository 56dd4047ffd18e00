use inetflow::{
    InetflowError,
    exporters::{StdoutExporter, export_table},
    flow::FlowTable,
    replay::{ReplayOptions, ReplaySummary, replay_file},
    runtime::{Runtime, conf::Conf, logging},
};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let runtime = Runtime::new()?;
    logging::init_tracing(runtime.conf.log_level)?;

    run(&runtime.conf)?;
    Ok(())
}

fn run(conf: &Conf) -> Result<(), InetflowError> {
    if conf.inputs.is_empty() {
        return Err(InetflowError::NoInputs);
    }

    info!(
        event.name = "inetflow.starting",
        inputs = conf.inputs.len(),
        config_path = ?conf.config_path,
        "replaying captures"
    );

    let options = ReplayOptions::from(conf);
    let mut table = FlowTable::<()>::new();
    let mut total = ReplaySummary::default();

    for path in &conf.inputs {
        total += replay_file(path, &mut table, &options)?;
    }

    let mut exporter = StdoutExporter::new(&conf.export);
    let exported = export_table(&table, &mut exporter)?;

    let stats = table.stats();
    info!(
        event.name = "inetflow.completed",
        packets = total.packets,
        accepted = total.accepted,
        rejected = total.rejected,
        flows = stats.flows,
        hits = stats.hits,
        misses = stats.misses,
        exported,
        "replay completed"
    );
    Ok(())
}
