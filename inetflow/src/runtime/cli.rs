use std::{path::PathBuf, time::Duration};

use clap::Parser;
use serde::Serialize;
use tracing::Level;

use crate::runtime::conf::{
    ExportFormat,
    conf_serde::{duration, level},
};

/// Replay pcap captures through the flow table and print the flows found.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Set the path to the configuration file (e.g., "inetflow.yaml").
    #[arg(short, long, value_name = "FILE", env = "INETFLOW_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Set the application's log level (e.g., "debug", "warn").
    #[arg(short, long, value_name = "LEVEL", env = "INETFLOW_LOG_LEVEL")]
    pub log_level: Option<Level>,

    /// Output format for the flow listing.
    #[arg(short, long, value_enum, env = "INETFLOW_EXPORT_FORMAT")]
    pub format: Option<ExportFormat>,

    /// Use capture timestamps as flow timestamps instead of the wall clock.
    #[arg(
        long,
        value_name = "BOOL",
        env = "INETFLOW_CAPTURE_TIMESTAMPS",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub capture_timestamps: Option<bool>,

    /// Print at most N flows, most recently seen first.
    #[arg(long, value_name = "N", env = "INETFLOW_EXPORT_LIMIT")]
    pub limit: Option<usize>,

    /// Log replay progress every DURATION of capture time (e.g., "10s").
    #[arg(
        long,
        value_name = "DURATION",
        env = "INETFLOW_STATS_INTERVAL",
        value_parser = humantime::parse_duration
    )]
    pub stats_interval: Option<Duration>,

    /// Classic pcap files to replay, in order.
    #[arg(value_name = "INPUT", env = "INETFLOW_INPUTS", value_delimiter = ',')]
    pub inputs: Vec<PathBuf>,
}

/// Values given on the command line or through the environment, in the shape
/// of [`Conf`](crate::runtime::conf::Conf). Unset values are left out so they
/// do not mask the configuration file.
#[derive(Debug, Default, Serialize)]
pub(crate) struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none", with = "level::option")]
    log_level: Option<Level>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    inputs: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    capture_timestamps: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", with = "duration::option")]
    stats_interval: Option<Duration>,
    #[serde(skip_serializing_if = "ExportOverrides::is_empty")]
    export: ExportOverrides,
}

#[derive(Debug, Default, Serialize)]
struct ExportOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<ExportFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
}

impl ExportOverrides {
    fn is_empty(&self) -> bool {
        self.format.is_none() && self.limit.is_none()
    }
}

impl Cli {
    pub(crate) fn overrides(&self) -> CliOverrides {
        CliOverrides {
            log_level: self.log_level,
            inputs: self.inputs.clone(),
            capture_timestamps: self.capture_timestamps,
            stats_interval: self.stats_interval,
            export: ExportOverrides {
                format: self.format,
                limit: self.limit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use clap::Parser as _;
    use figment::Jail;
    use tracing::Level;

    use super::Cli;
    use crate::runtime::conf::ExportFormat;

    #[test]
    fn parses_long_flags() {
        Jail::expect_with(|jail| {
            jail.set_env("INETFLOW_LOG_LEVEL", "debug");

            let cli = Cli::parse_from([
                "inetflow",
                "--config",
                "/path/to/conf.yaml",
                "--log-level",
                "warn",
                "--format",
                "json-compact",
                "--capture-timestamps",
                "false",
                "--limit",
                "10",
                "--stats-interval",
                "1m 30s",
                "a.pcap",
                "b.pcap",
            ]);
            assert_eq!(cli.config, Some(PathBuf::from("/path/to/conf.yaml")));
            assert_eq!(cli.log_level, Some(Level::WARN));
            assert_eq!(cli.format, Some(ExportFormat::JsonCompact));
            assert_eq!(cli.capture_timestamps, Some(false));
            assert_eq!(cli.limit, Some(10));
            assert_eq!(cli.stats_interval, Some(Duration::from_secs(90)));
            assert_eq!(
                cli.inputs,
                vec![PathBuf::from("a.pcap"), PathBuf::from("b.pcap")]
            );

            Ok(())
        });
    }

    #[test]
    fn bare_capture_timestamps_flag_means_true() {
        Jail::expect_with(|_| {
            let cli = Cli::parse_from(["inetflow", "--capture-timestamps"]);
            assert_eq!(cli.capture_timestamps, Some(true));

            Ok(())
        });
    }

    #[test]
    fn parses_from_env_when_no_args() {
        Jail::expect_with(|jail| {
            jail.set_env("INETFLOW_CONFIG_PATH", "/tmp/inetflow.yaml");
            jail.set_env("INETFLOW_LOG_LEVEL", "debug");
            jail.set_env("INETFLOW_EXPORT_FORMAT", "json");
            jail.set_env("INETFLOW_INPUTS", "one.pcap,two.pcap");

            let cli = Cli::parse_from(["inetflow"]);
            assert_eq!(cli.config, Some(PathBuf::from("/tmp/inetflow.yaml")));
            assert_eq!(cli.log_level, Some(Level::DEBUG));
            assert_eq!(cli.format, Some(ExportFormat::Json));
            assert_eq!(cli.inputs.len(), 2);

            Ok(())
        });
    }

    #[test]
    fn unset_flags_produce_empty_overrides() {
        Jail::expect_with(|_| {
            let cli = Cli::parse_from(["inetflow"]);
            let json = serde_json::to_string(&cli.overrides()).unwrap();
            assert_eq!(json, "{}");

            Ok(())
        });
    }

    #[test]
    fn set_flags_serialize_in_conf_shape() {
        Jail::expect_with(|_| {
            let cli = Cli::parse_from(["inetflow", "-l", "trace", "--limit", "3"]);
            let json = serde_json::to_value(cli.overrides()).unwrap();
            assert_eq!(json["log_level"], "TRACE");
            assert_eq!(json["export"]["limit"], 3);
            assert!(json["export"].get("format").is_none());

            Ok(())
        });
    }
}
