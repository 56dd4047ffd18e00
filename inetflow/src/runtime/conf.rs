use std::{
    error::Error,
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::ValueEnum;
use figment::{
    Figment,
    providers::{Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::runtime::{
    cli::Cli,
    conf::conf_serde::{duration, level},
};

/// How the flow listing is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// One aligned line per flow.
    #[default]
    Text,
    /// Pretty-printed JSON array.
    Json,
    /// JSON array on a single line.
    JsonCompact,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ExportConf {
    #[serde(default)]
    pub format: ExportFormat,
    /// Maximum number of flows to print, most recently seen first.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Application configuration.
///
/// Layered with `figment`: defaults, then the YAML file named by `--config`,
/// then values given on the command line or through `INETFLOW_*` variables.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Conf {
    /// Path of the file this configuration was read from, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(with = "level")]
    pub log_level: Level,

    /// Capture files replayed in order into a single flow table.
    #[serde(default)]
    pub inputs: Vec<PathBuf>,

    /// Stamp flows with the capture time of their last packet rather than the
    /// time the packet was replayed.
    /// - Default: true
    #[serde(default = "defaults::capture_timestamps")]
    pub capture_timestamps: bool,

    /// Log a progress line each time this much capture time has been replayed.
    /// - Default: 0s (disabled)
    #[serde(default = "defaults::stats_interval", with = "duration")]
    pub stats_interval: Duration,

    #[serde(default)]
    pub export: ExportConf,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            config_path: None,
            log_level: Level::INFO,
            inputs: Vec::new(),
            capture_timestamps: defaults::capture_timestamps(),
            stats_interval: defaults::stats_interval(),
            export: ExportConf::default(),
        }
    }
}

mod defaults {
    use std::time::Duration;

    pub fn capture_timestamps() -> bool {
        true
    }

    pub fn stats_interval() -> Duration {
        Duration::ZERO
    }
}

impl Conf {
    /// Builds the configuration from `cli`.
    ///
    /// Priority, lowest first: defaults < configuration file < environment
    /// variables and CLI arguments.
    ///
    /// # Errors
    /// * `ConfigError::NoConfigFile` - `--config` names a path that does not exist.
    /// * `ConfigError::InvalidConfigPath` - the path is not a regular file.
    /// * `ConfigError::InvalidExtension` - the file is not `.yaml` or `.yml`.
    /// * `ConfigError::Extraction` - the merged values do not form a valid `Conf`.
    pub fn new(cli: Cli) -> Result<(Self, Cli), ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Conf::default()));

        let config_path_to_store = if let Some(config_path) = &cli.config {
            validate_config_path(config_path)?;
            figment = figment.merge(Yaml::file(config_path));
            Some(config_path.clone())
        } else {
            None
        };

        figment = figment.merge(Serialized::defaults(cli.overrides()));

        let mut conf: Conf = figment.extract()?;

        conf.config_path = config_path_to_store;
        Ok((conf, cli))
    }

    /// Re-reads the configuration file on top of the current values.
    ///
    /// CLI arguments and environment variables are not consulted again; the
    /// current configuration already reflects them.
    pub fn reload(&self) -> Result<Self, ConfigError> {
        if let Some(path) = &self.config_path {
            let mut conf: Conf = Figment::from(Serialized::defaults(self))
                .merge(Yaml::file(path))
                .extract()?;
            conf.config_path = self.config_path.clone();

            Ok(conf)
        } else {
            Err(ConfigError::NoConfigFile)
        }
    }
}

/// Checks that `path` is an existing file with a `yaml` or `yml` extension.
fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if !path.is_file() {
        if path.exists() {
            return Err(ConfigError::InvalidConfigPath(
                path.to_string_lossy().into_owned(),
            ));
        } else {
            return Err(ConfigError::NoConfigFile);
        }
    }

    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => Ok(()),
        Some(ext) => Err(ConfigError::InvalidExtension(ext.to_string())),
        None => Err(ConfigError::InvalidExtension("none".to_string())),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// The specified configuration file does not exist.
    NoConfigFile,
    /// The path exists but is not a file.
    InvalidConfigPath(String),
    /// The file has an unsupported extension.
    InvalidExtension(String),
    /// The merged configuration could not be deserialized.
    Extraction(Box<figment::Error>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoConfigFile => write!(f, "no config file provided"),
            ConfigError::InvalidConfigPath(p) => write!(f, "path '{p}' is not a valid file"),
            ConfigError::InvalidExtension(ext) => {
                write!(
                    f,
                    "invalid file extension '.{ext}', expected 'yaml' or 'yml'"
                )
            }
            ConfigError::Extraction(e) => write!(f, "configuration error: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Extraction(e) => Some(e),
            _ => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Extraction(Box::from(e))
    }
}

pub mod conf_serde {
    pub mod level {
        use serde::{self, Deserialize, Deserializer, Serializer};
        use tracing::Level;

        pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(level.as_str())
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            s.parse::<Level>().map_err(serde::de::Error::custom)
        }

        pub mod option {
            use serde::Serializer;
            use tracing::Level;

            pub fn serialize<S>(level: &Option<Level>, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                match level {
                    Some(l) => serializer.serialize_str(l.as_str()),
                    None => serializer.serialize_none(),
                }
            }
        }
    }

    pub mod duration {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(&humantime::format_duration(*duration).to_string())
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            humantime::parse_duration(&s).map_err(serde::de::Error::custom)
        }

        pub mod option {
            use std::time::Duration;

            use serde::Serializer;

            pub fn serialize<S>(
                duration: &Option<Duration>,
                serializer: S,
            ) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                match duration {
                    Some(d) => super::serialize(d, serializer),
                    None => serializer.serialize_none(),
                }
            }
        }
    }
}
