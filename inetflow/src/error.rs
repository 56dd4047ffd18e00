use thiserror::Error;

use crate::{exporters::ExportError, replay::ReplayError, runtime::RuntimeError};

/// Top-level error of the `inetflow` binary.
#[derive(Debug, Error)]
pub enum InetflowError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("replay failed: {0}")]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("no capture files to replay, pass INPUT arguments or set `inputs` in the config file")]
    NoInputs,
}

pub type Result<T, E = InetflowError> = std::result::Result<T, E>;
