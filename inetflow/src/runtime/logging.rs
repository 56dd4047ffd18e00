use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::Layer,
    prelude::__tracing_subscriber_SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Builds the env filter for `level`: this crate at `level`, dependencies at `warn`.
pub fn filter(level: Level) -> EnvFilter {
    EnvFilter::new(format!("warn,inetflow={level}"))
}

/// Installs the global subscriber. Logs go to stderr so the flow listing on
/// stdout stays machine readable.
///
/// Source locations are added at `debug`, thread ids and names at `trace`.
/// ANSI colours are disabled when `NO_COLOR` is set.
pub fn init_tracing(level: Level) -> Result<(), TryInitError> {
    let mut fmt_layer = Layer::new()
        .with_writer(std::io::stderr)
        .with_ansi(std::env::var("NO_COLOR").is_err());

    match level {
        Level::DEBUG => fmt_layer = fmt_layer.with_file(true).with_line_number(true),
        Level::TRACE => {
            fmt_layer = fmt_layer
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
        }
        _ => {}
    }

    tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt_layer)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn filter_max_level_follows_requested_level() {
        assert_eq!(filter(Level::TRACE).max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(filter(Level::ERROR).max_level_hint(), Some(LevelFilter::WARN));
    }
}
